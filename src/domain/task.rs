use crate::domain::Error;
use crate::domain::task::driven_ports::{TaskReader, TaskWriter};
use crate::external_connections::ExternalConnectivity;
use chrono::{DateTime, Utc};

/// A task as it is stored, including the resolved owner and priority keys
#[derive(PartialEq, Eq, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct Task {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub published: bool,
    pub owner_user_id: i32,
    pub priority_id: i32,
}

/// Payload for creating a task. The owner and priority are "connected" by their lookup keys,
/// so creation fails if either one does not resolve to an existing record.
#[derive(Debug)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub owner_username: String,
    pub priority_value: i32,
}

/// Partial update for a task. Fields left as [None] keep their stored value.
#[derive(Debug, Default)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub published: Option<bool>,
}

impl TaskUpdate {
    /// An update which only marks the task as published
    pub fn publish() -> TaskUpdate {
        TaskUpdate {
            published: Some(true),
            ..Default::default()
        }
    }
}

#[derive(Debug)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub enum TaskFilter {
    /// Only tasks with the published flag set
    Published,
    /// Tasks whose title or description contains the string verbatim
    TextContains(String),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortField {
    #[default]
    Id,
    Deadline,
    Title,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TaskOrder {
    pub field: TaskSortField,
    pub direction: SortDirection,
}

/// Parameters for listing tasks. Everything here is handed to the datastore as-is.
///
/// [cursor] names the id of the first task on the page (inclusive) within the requested ordering,
/// and [skip] is applied after the cursor. Ties in the ordering are always broken by task id.
#[derive(Debug, Default)]
#[cfg_attr(test, derive(Clone, PartialEq))]
pub struct TaskQuery {
    pub filter: Option<TaskFilter>,
    pub skip: Option<u32>,
    pub take: Option<u32>,
    pub cursor: Option<i32>,
    pub order: TaskOrder,
}

impl TaskQuery {
    pub fn with_filter(filter: TaskFilter) -> TaskQuery {
        TaskQuery {
            filter: Some(filter),
            ..Default::default()
        }
    }
}

pub mod driven_ports {
    use super::*;
    use crate::domain::DrivenPortError;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskReader: Sync {
        async fn task_by_id(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<Task>, DrivenPortError>;

        async fn tasks(
            &self,
            query: &TaskQuery,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<Task>, DrivenPortError>;
    }

    pub trait TaskWriter: Sync {
        /// Creates the task, failing with [DrivenPortError::ConstraintViolation] if the owner or
        /// priority could not be connected
        async fn create_task(
            &self,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, DrivenPortError>;

        async fn update_task(
            &self,
            task_id: i32,
            update: &TaskUpdate,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, DrivenPortError>;

        /// Removes the task and hands back what was removed
        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Task, DrivenPortError>;
    }
}

pub mod driving_ports {
    use super::*;
    use crate::external_connections::ExternalConnectivity;

    pub trait TaskPort {
        async fn task_by_id(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Option<Task>, Error>;
        async fn tasks(
            &self,
            query: &TaskQuery,
            ext_cxn: &mut impl ExternalConnectivity,
            task_read: &impl driven_ports::TaskReader,
        ) -> Result<Vec<Task>, Error>;
        async fn create_task(
            &self,
            new_task: &NewTask,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, Error>;
        async fn update_task(
            &self,
            task_id: i32,
            update: &TaskUpdate,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, Error>;
        async fn delete_task(
            &self,
            task_id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
            task_write: &impl driven_ports::TaskWriter,
        ) -> Result<Task, Error>;
    }
}

pub struct TaskService {}

impl driving_ports::TaskPort for TaskService {
    async fn task_by_id(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Option<Task>, Error> {
        task_read
            .task_by_id(task_id, &mut *ext_cxn)
            .await
            .map_err(|err| err.into_error_trying_to("fetch a task"))
    }

    async fn tasks(
        &self,
        query: &TaskQuery,
        ext_cxn: &mut impl ExternalConnectivity,
        task_read: &impl TaskReader,
    ) -> Result<Vec<Task>, Error> {
        task_read
            .tasks(query, &mut *ext_cxn)
            .await
            .map_err(|err| err.into_error_trying_to("list tasks"))
    }

    async fn create_task(
        &self,
        new_task: &NewTask,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<Task, Error> {
        task_write
            .create_task(new_task, &mut *ext_cxn)
            .await
            .map_err(|err| err.into_error_trying_to("create a task"))
    }

    async fn update_task(
        &self,
        task_id: i32,
        update: &TaskUpdate,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<Task, Error> {
        task_write
            .update_task(task_id, update, &mut *ext_cxn)
            .await
            .map_err(|err| err.into_error_trying_to("update a task"))
    }

    async fn delete_task(
        &self,
        task_id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
        task_write: &impl TaskWriter,
    ) -> Result<Task, Error> {
        task_write
            .delete_task(task_id, &mut *ext_cxn)
            .await
            .map_err(|err| err.into_error_trying_to("delete a task"))
    }
}

#[cfg(test)]
mod tests {
    use super::test_util::*;
    use super::*;
    use crate::domain::task::driving_ports::TaskPort;
    use crate::domain::test_util::Connectivity;
    use crate::external_connections;
    use speculoos::prelude::*;
    use std::sync::RwLock;

    fn seeded_persistence() -> RwLock<InMemoryTaskPersistence> {
        let mut persistence = InMemoryTaskPersistence::new_with_owners(&["alice", "bob"]);
        for new_task in [
            task_create("Sweep", Some("the floor"), "alice"),
            task_create("Cook", Some("Soup for dinner"), "bob"),
            task_create("Read", None, "alice"),
        ] {
            persistence.insert(new_task).expect("seeding tasks should succeed");
        }
        persistence.tasks[1].published = true;

        RwLock::new(persistence)
    }

    mod task_by_id {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let task_persist = seeded_persistence();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let fetch_result = TaskService {}
                .task_by_id(2, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(fetch_result)
                .is_ok()
                .is_some()
                .matches(|task| {
                    matches!(task, Task {
                        id: 2,
                        owner_user_id: 2,
                        published: true,
                        title,
                        ..
                    } if title == "Cook")
                });
        }

        #[tokio::test]
        async fn missing_task_is_none() {
            let task_persist = seeded_persistence();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let fetch_result = TaskService {}
                .task_by_id(42, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(fetch_result).is_ok().is_none();
        }

        #[tokio::test]
        async fn propagates_port_error() {
            let mut raw_persistence = InMemoryTaskPersistence::new();
            raw_persistence.connected = Connectivity::Disconnected;
            let task_persist = RwLock::new(raw_persistence);
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let fetch_result = TaskService {}
                .task_by_id(1, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(fetch_result)
                .is_err()
                .matches(|err| matches!(err, Error::RetrieveFailure { .. }));
        }
    }

    mod tasks {
        use super::*;

        #[tokio::test]
        async fn feed_only_contains_published_tasks() {
            let task_persist = seeded_persistence();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let feed = TaskService {}
                .tasks(
                    &TaskQuery::with_filter(TaskFilter::Published),
                    &mut ext_cxn,
                    &task_persist,
                )
                .await;
            assert_that!(feed).is_ok().matches(|tasks| {
                matches!(tasks.as_slice(), [Task { id: 2, published: true, .. }])
            });
        }

        #[tokio::test]
        async fn search_matches_title_or_description_once() {
            let task_persist = seeded_persistence();
            {
                let mut locked = task_persist.write().expect("task persist rw lock poisoned");
                locked
                    .insert(task_create("Shop", Some("Soap"), "bob"))
                    .expect("seeding a task should succeed");
            }
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let found = TaskService {}
                .tasks(
                    &TaskQuery::with_filter(TaskFilter::TextContains("S".to_owned())),
                    &mut ext_cxn,
                    &task_persist,
                )
                .await;
            let found_ids: Vec<i32> = match found {
                Ok(tasks) => tasks.iter().map(|task| task.id).collect(),
                Err(err) => panic!("Search should have succeeded but failed: {err}"),
            };

            assert_eq!(vec![1, 2, 4], found_ids);
        }

        #[tokio::test]
        async fn search_is_case_sensitive() {
            let task_persist = seeded_persistence();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let found = TaskService {}
                .tasks(
                    &TaskQuery::with_filter(TaskFilter::TextContains("soup".to_owned())),
                    &mut ext_cxn,
                    &task_persist,
                )
                .await;
            assert_that!(found).is_ok().is_empty();
        }

        #[tokio::test]
        async fn pages_from_cursor() {
            let task_persist = seeded_persistence();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let query = TaskQuery {
                cursor: Some(2),
                take: Some(1),
                ..Default::default()
            };

            let page = TaskService {}
                .tasks(&query, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(page)
                .is_ok()
                .matches(|tasks| matches!(tasks.as_slice(), [Task { id: 2, .. }]));
        }

        #[tokio::test]
        async fn orders_descending_by_title() {
            let task_persist = seeded_persistence();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let query = TaskQuery {
                order: TaskOrder {
                    field: TaskSortField::Title,
                    direction: SortDirection::Descending,
                },
                skip: Some(1),
                ..Default::default()
            };

            let page = TaskService {}
                .tasks(&query, &mut ext_cxn, &task_persist)
                .await;
            let titles: Vec<String> = match page {
                Ok(tasks) => tasks.into_iter().map(|task| task.title).collect(),
                Err(err) => panic!("Listing should have succeeded but failed: {err}"),
            };

            assert_eq!(vec!["Read".to_owned(), "Cook".to_owned()], titles);
        }
    }

    mod create_task {
        use super::*;

        #[tokio::test]
        async fn happy_path() {
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_owners(&["alice"]));
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let new_task = task_create("T1", None, "alice");

            let create_result = TaskService {}
                .create_task(&new_task, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(create_result).is_ok().matches(|task| {
                matches!(task, Task {
                    id: 1,
                    owner_user_id: 1,
                    priority_id: 1,
                    published: false,
                    title,
                    ..
                } if title == "T1")
            });
        }

        #[tokio::test]
        async fn fails_for_unknown_owner() {
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_owners(&["alice"]));
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let new_task = task_create("T1", None, "mallory");

            let create_result = TaskService {}
                .create_task(&new_task, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(create_result)
                .is_err()
                .matches(|err| matches!(err, Error::ConstraintViolation(_)));

            let locked = task_persist.read().expect("task persist rw lock poisoned");
            assert_that!(locked.tasks).is_empty();
        }

        #[tokio::test]
        async fn fails_for_unknown_priority() {
            let task_persist = RwLock::new(InMemoryTaskPersistence::new_with_owners(&["alice"]));
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let mut new_task = task_create("T1", None, "alice");
            new_task.priority_value = 99;

            let create_result = TaskService {}
                .create_task(&new_task, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(create_result)
                .is_err()
                .matches(|err| matches!(err, Error::ConstraintViolation(_)));
        }
    }

    mod update_task {
        use super::*;

        #[tokio::test]
        async fn publishing_twice_is_idempotent() {
            let task_persist = seeded_persistence();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let service = TaskService {};

            for _ in 0..2 {
                let publish_result = service
                    .update_task(1, &TaskUpdate::publish(), &mut ext_cxn, &task_persist)
                    .await;
                assert_that!(publish_result)
                    .is_ok()
                    .matches(|task| task.published && task.title == "Sweep");
            }
        }

        #[tokio::test]
        async fn partial_update_keeps_other_fields() {
            let task_persist = seeded_persistence();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let update = TaskUpdate {
                title: Some("Mop".to_owned()),
                ..Default::default()
            };

            let update_result = TaskService {}
                .update_task(1, &update, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(update_result).is_ok().matches(|task| {
                task.title == "Mop" && task.description.as_deref() == Some("the floor")
            });
        }

        #[tokio::test]
        async fn missing_task_does_not_exist() {
            let task_persist = seeded_persistence();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let update_result = TaskService {}
                .update_task(12, &TaskUpdate::publish(), &mut ext_cxn, &task_persist)
                .await;
            assert_that!(update_result)
                .is_err()
                .matches(|err| matches!(err, Error::DoesNotExist));
        }
    }

    mod delete_task {
        use super::*;

        #[tokio::test]
        async fn deleted_task_can_no_longer_be_fetched() {
            let task_persist = seeded_persistence();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();
            let service = TaskService {};

            let delete_result = service.delete_task(3, &mut ext_cxn, &task_persist).await;
            assert_that!(delete_result)
                .is_ok()
                .matches(|task| task.id == 3 && task.title == "Read");

            let fetch_result = service.task_by_id(3, &mut ext_cxn, &task_persist).await;
            assert_that!(fetch_result).is_ok().is_none();
        }

        #[tokio::test]
        async fn missing_task_does_not_exist() {
            let task_persist = InMemoryTaskPersistence::new_locked();
            let mut ext_cxn = external_connections::test_util::FakeExternalConnectivity::new();

            let delete_result = TaskService {}
                .delete_task(5, &mut ext_cxn, &task_persist)
                .await;
            assert_that!(delete_result)
                .is_err()
                .matches(|err| matches!(err, Error::DoesNotExist));
        }
    }
}
