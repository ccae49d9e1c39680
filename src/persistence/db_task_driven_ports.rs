use crate::domain;
use crate::domain::DrivenPortError;
use crate::domain::task::{
    NewTask, SortDirection, Task, TaskFilter, TaskQuery, TaskSortField, TaskUpdate,
};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, Postgres, QueryBuilder, query_as};

pub struct DbTaskReader;

#[derive(FromRow)]
struct TaskRow {
    id: i32,
    title: String,
    description: Option<String>,
    deadline: DateTime<Utc>,
    published: bool,
    user_id: i32,
    priority_id: i32,
}

impl From<TaskRow> for Task {
    fn from(value: TaskRow) -> Self {
        Task {
            id: value.id,
            title: value.title,
            description: value.description,
            deadline: value.deadline,
            published: value.published,
            owner_user_id: value.user_id,
            priority_id: value.priority_id,
        }
    }
}

fn sort_column(field: TaskSortField) -> &'static str {
    match field {
        TaskSortField::Id => "id",
        TaskSortField::Deadline => "deadline",
        TaskSortField::Title => "title",
    }
}

/// Builds the SELECT for a [TaskQuery]. The cursor row is located with a row-value comparison on
/// (sort column, id) so it works for every ordering.
fn build_task_query(query: &TaskQuery) -> QueryBuilder<'static, Postgres> {
    let column = sort_column(query.order.field);
    let (cursor_cmp, direction) = match query.order.direction {
        SortDirection::Ascending => (">=", "ASC"),
        SortDirection::Descending => ("<=", "DESC"),
    };

    let mut builder = QueryBuilder::new("SELECT t.* FROM task t WHERE TRUE");
    match query.filter {
        Some(TaskFilter::Published) => {
            builder.push(" AND t.published = TRUE");
        }
        Some(TaskFilter::TextContains(ref needle)) => {
            builder
                .push(" AND (strpos(t.title, ")
                .push_bind(needle.clone())
                .push(") > 0 OR strpos(t.description, ")
                .push_bind(needle.clone())
                .push(") > 0)");
        }
        None => {}
    }

    if let Some(cursor) = query.cursor {
        builder
            .push(format!(
                " AND (t.{column}, t.id) {cursor_cmp} (SELECT c.{column}, c.id FROM task c WHERE c.id = "
            ))
            .push_bind(cursor)
            .push(")");
    }

    builder.push(format!(" ORDER BY t.{column} {direction}"));
    if query.order.field != TaskSortField::Id {
        builder.push(format!(", t.id {direction}"));
    }

    if let Some(take) = query.take {
        builder.push(" LIMIT ").push_bind(i64::from(take));
    }
    if let Some(skip) = query.skip {
        builder.push(" OFFSET ").push_bind(i64::from(skip));
    }

    builder
}

impl domain::task::driven_ports::TaskReader for DbTaskReader {
    async fn task_by_id(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<Task>, DrivenPortError> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let task = query_as::<_, TaskRow>("SELECT t.* FROM task t WHERE t.id = $1")
            .bind(task_id)
            .fetch_optional(cxn.borrow_connection())
            .await
            .map_err(|err| super::port_error(err, "fetch a task by ID"))?
            .map(Task::from);

        Ok(task)
    }

    async fn tasks(
        &self,
        query: &TaskQuery,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Vec<Task>, DrivenPortError> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let mut builder = build_task_query(query);
        let tasks: Vec<Task> = builder
            .build_query_as::<TaskRow>()
            .fetch_all(cxn.borrow_connection())
            .await
            .map_err(|err| super::port_error(err, "list tasks"))?
            .into_iter()
            .map(Task::from)
            .collect();

        Ok(tasks)
    }
}

pub struct DbTaskWriter;

impl domain::task::driven_ports::TaskWriter for DbTaskWriter {
    async fn create_task(
        &self,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, DrivenPortError> {
        let mut cxn = ext_cxn.database_cxn().await?;

        // Zero rows come back when either lookup misses
        let created = query_as::<_, TaskRow>(
            "INSERT INTO task(title, description, deadline, user_id, priority_id) \
             SELECT $1, $2, $3, u.id, p.id FROM app_user u, priority p \
             WHERE u.username = $4 AND p.value = $5 \
             RETURNING task.*",
        )
        .bind(&new_task.title)
        .bind(&new_task.description)
        .bind(new_task.deadline)
        .bind(&new_task.owner_username)
        .bind(new_task.priority_value)
        .fetch_optional(cxn.borrow_connection())
        .await
        .map_err(|err| super::port_error(err, "insert a new task into the database"))?;

        created.map(Task::from).ok_or_else(|| {
            DrivenPortError::ConstraintViolation(format!(
                "no user named \"{}\" or no priority with value {}",
                new_task.owner_username, new_task.priority_value
            ))
        })
    }

    async fn update_task(
        &self,
        task_id: i32,
        update: &TaskUpdate,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, DrivenPortError> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let updated = query_as::<_, TaskRow>(
            "UPDATE task SET \
             title = COALESCE($1, title), \
             description = COALESCE($2, description), \
             deadline = COALESCE($3, deadline), \
             published = COALESCE($4, published) \
             WHERE id = $5 RETURNING *",
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.deadline)
        .bind(update.published)
        .bind(task_id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .map_err(|err| super::port_error(err, "update a task in the database"))?;

        updated.map(Task::from).ok_or(DrivenPortError::DoesNotExist)
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Task, DrivenPortError> {
        let mut cxn = ext_cxn.database_cxn().await?;

        let deleted = query_as::<_, TaskRow>("DELETE FROM task WHERE id = $1 RETURNING *")
            .bind(task_id)
            .fetch_optional(cxn.borrow_connection())
            .await
            .map_err(|err| super::port_error(err, "remove a task from the database"))?;

        deleted.map(Task::from).ok_or(DrivenPortError::DoesNotExist)
    }
}
