use crate::domain::task::driving_ports::TaskPort;
use crate::domain::task::{TaskFilter, TaskUpdate};
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{
    BasicErrorResponse, DomainErrorResponse, Json, Path, Query, ValidationErrorResponse,
};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{delete, get, post, put};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(
    get_task,
    get_published_tasks,
    get_filtered_tasks,
    create_task,
    publish_task,
    update_task,
    delete_task,
))]
/// Defines the OpenAPI documentation for the task API
pub struct TaskApi;

/// Adds the task routes to the application router
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/task/:id",
            get(
                |State(app_state): AppState, Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    get_task(task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/feed",
            get(
                |State(app_state): AppState, Query(params): Query<dto::TaskListParams>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    get_published_tasks(params, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/filtered-tasks/:search_string",
            get(
                |State(app_state): AppState,
                 Path(search_string): Path<String>,
                 Query(params): Query<dto::TaskListParams>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    get_filtered_tasks(search_string, params, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/task",
            post(
                |State(app_state): AppState, Json(task_data): Json<dto::NewTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    create_task(task_data, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/publish/:id",
            put(
                |State(app_state): AppState, Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    publish_task(task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/task/update/:id",
            put(
                |State(app_state): AppState,
                 Path(task_id): Path<i32>,
                 Json(update): Json<dto::UpdateTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    update_task(task_id, update, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/task/:id",
            delete(
                |State(app_state): AppState, Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    delete_task(task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
}

#[utoipa::path(
    get,
    path = "/api/task/{id}",
    tag = "Tasks",
    params(("id" = i32, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "The task with the given ID", body = dto::Task),
        (status = 400, description = "The ID was not a number", body = BasicErrorResponse),
        (status = 404, description = "No task has the given ID", body = BasicErrorResponse),
        (status = 500, description = "Data could not be read", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
/// Returns the task with the specified ID
async fn get_task(
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::Task>, ErrorResponse> {
    info!("Fetching task {task_id}");
    let task_reader = persistence::db_task_driven_ports::DbTaskReader;

    let task = task_service
        .task_by_id(task_id, &mut *ext_cxn, &task_reader)
        .await
        .map_err(DomainErrorResponse::from)?
        .ok_or(DomainErrorResponse(domain::Error::DoesNotExist))?;

    Ok(Json(task.into()))
}

#[utoipa::path(
    get,
    path = "/api/feed",
    tag = "Tasks",
    params(dto::TaskListParams),
    responses(
        (status = 200, description = "Published tasks", body = Vec<dto::Task>),
        (status = 400, description = "A paging parameter was malformed", body = BasicErrorResponse),
        (status = 500, description = "Data could not be read", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
/// Returns all published tasks
async fn get_published_tasks(
    params: dto::TaskListParams,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<Vec<dto::Task>>, ErrorResponse> {
    info!("Fetching the published task feed");
    let task_reader = persistence::db_task_driven_ports::DbTaskReader;
    let query = params.into_query(TaskFilter::Published);

    let tasks = task_service
        .tasks(&query, &mut *ext_cxn, &task_reader)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(tasks.into_iter().map(dto::Task::from).collect()))
}

#[utoipa::path(
    get,
    path = "/api/filtered-tasks/{search_string}",
    tag = "Tasks",
    params(
        ("search_string" = String, Path, description = "Substring to look for in the title or description"),
        dto::TaskListParams,
    ),
    responses(
        (status = 200, description = "Tasks containing the substring", body = Vec<dto::Task>),
        (status = 400, description = "A paging parameter or the search string was malformed", body = BasicErrorResponse),
        (status = 500, description = "Data could not be read", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
/// Returns all tasks whose title or description contains the search string
async fn get_filtered_tasks(
    search_string: String,
    params: dto::TaskListParams,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<Vec<dto::Task>>, ErrorResponse> {
    info!("Searching tasks for \"{search_string}\"");
    let task_reader = persistence::db_task_driven_ports::DbTaskReader;
    let query = params.into_query(TaskFilter::TextContains(search_string));

    let tasks = task_service
        .tasks(&query, &mut *ext_cxn, &task_reader)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(tasks.into_iter().map(dto::Task::from).collect()))
}

#[utoipa::path(
    post,
    path = "/api/task",
    tag = "Tasks",
    request_body = dto::NewTask,
    responses(
        (status = 201, description = "The created task", body = dto::Task),
        (status = 400, description = "The request body was invalid", body = BasicErrorResponse),
        (status = 409, description = "The owner or priority does not exist", body = BasicErrorResponse),
        (status = 500, description = "Data could not be written", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all)]
/// Adds a new task, connecting it to its owner and priority
async fn create_task(
    task_data: dto::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<(StatusCode, Json<dto::Task>), ErrorResponse> {
    info!("Creating task for {}", task_data.user_username);
    let new_task =
        domain::task::NewTask::try_from(task_data).map_err(ValidationErrorResponse::from)?;
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter;

    let created = task_service
        .create_task(&new_task, &mut *ext_cxn, &task_writer)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    put,
    path = "/api/publish/{id}",
    tag = "Tasks",
    params(("id" = i32, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "The published task", body = dto::Task),
        (status = 404, description = "No task has the given ID", body = BasicErrorResponse),
        (status = 500, description = "Data could not be written", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
/// Marks a task as published. Publishing an already published task changes nothing.
async fn publish_task(
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::Task>, ErrorResponse> {
    info!("Publishing task {task_id}");
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter;

    let published = task_service
        .update_task(task_id, &TaskUpdate::publish(), &mut *ext_cxn, &task_writer)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(published.into()))
}

#[utoipa::path(
    put,
    path = "/api/task/update/{id}",
    tag = "Tasks",
    params(("id" = i32, Path, description = "Task identifier")),
    request_body = dto::UpdateTask,
    responses(
        (status = 200, description = "The updated task", body = dto::Task),
        (status = 400, description = "The request body was invalid", body = BasicErrorResponse),
        (status = 404, description = "No task has the given ID", body = BasicErrorResponse),
        (status = 500, description = "Data could not be written", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
/// Updates the title, description, or deadline of a task
async fn update_task(
    task_id: i32,
    task_data: dto::UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::Task>, ErrorResponse> {
    info!("Updating task {task_id}");
    let update = TaskUpdate::try_from(task_data).map_err(ValidationErrorResponse::from)?;
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter;

    let updated = task_service
        .update_task(task_id, &update, &mut *ext_cxn, &task_writer)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/task/{id}",
    tag = "Tasks",
    params(("id" = i32, Path, description = "Task identifier")),
    responses(
        (status = 200, description = "The deleted task", body = dto::Task),
        (status = 404, description = "No task has the given ID", body = BasicErrorResponse),
        (status = 500, description = "Data could not be written", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, task_service))]
/// Deletes a task
async fn delete_task(
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<Json<dto::Task>, ErrorResponse> {
    info!("Deleting task {task_id}");
    let task_writer = persistence::db_task_driven_ports::DbTaskWriter;

    let deleted = task_service
        .delete_task(task_id, &mut *ext_cxn, &task_writer)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(deleted.into()))
}
