use crate::domain::user::driving_ports::UserPort;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{BasicErrorResponse, DomainErrorResponse, Json, Path};
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
#[openapi(paths(get_user, create_user, create_user_route, update_user, delete_user))]
/// Defines the OpenAPI documentation for the user API
pub struct UsersApi;

/// Adds the user routes to the application router
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route("/user", post(create_user_route))
        .route("/user/create", post(create_user_route))
        .route(
            "/user/:id",
            get(
                |State(app_state): AppState, Path(user_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    get_user(user_id, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/user/update/:id",
            put(
                |State(app_state): AppState,
                 Path(user_id): Path<i32>,
                 Json(update): Json<dto::UpdateUser>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    update_user(user_id, update, &mut ext_cxn, &user_service).await
                },
            ),
        )
        .route(
            "/user/delete/:id",
            delete(
                |State(app_state): AppState, Path(user_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let user_service = domain::user::UserService {};

                    delete_user(user_id, &mut ext_cxn, &user_service).await
                },
            ),
        )
}

#[utoipa::path(
    post,
    path = "/api/user/create",
    tag = "Users",
    request_body = dto::NewUser,
    responses(
        (status = 201, description = "The registered user", body = dto::User),
        (status = 400, description = "The request body was invalid", body = BasicErrorResponse),
        (status = 409, description = "The username is taken", body = BasicErrorResponse),
        (status = 500, description = "Data could not be written", body = BasicErrorResponse),
    ),
)]
/// Registers a new user. Serves both `/api/user` and `/api/user/create`.
async fn create_user_route(
    State(app_state): AppState,
    Json(new_user): Json<dto::NewUser>,
) -> Result<(StatusCode, Json<dto::User>), ErrorResponse> {
    let mut ext_cxn = app_state.ext_cxn.clone();
    let user_service = domain::user::UserService {};

    create_user(new_user, &mut ext_cxn, &user_service).await
}

#[utoipa::path(
    get,
    path = "/api/user/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User identifier")),
    responses(
        (status = 200, description = "The user with the given ID", body = dto::User),
        (status = 400, description = "The ID was not a number", body = BasicErrorResponse),
        (status = 404, description = "No user has the given ID", body = BasicErrorResponse),
        (status = 500, description = "Data could not be read", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, user_service))]
/// Retrieves a user by ID
async fn get_user(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Json<dto::User>, ErrorResponse> {
    info!("Fetching user {user_id}");
    let user_reader = persistence::db_user_driven_ports::DbReadUsers;

    let user = user_service
        .user_by_id(user_id, &mut *ext_cxn, &user_reader)
        .await
        .map_err(DomainErrorResponse::from)?
        .ok_or(DomainErrorResponse(domain::Error::DoesNotExist))?;

    Ok(Json(user.into()))
}

#[utoipa::path(
    post,
    path = "/api/user",
    tag = "Users",
    request_body = dto::NewUser,
    responses(
        (status = 201, description = "The registered user", body = dto::User),
        (status = 400, description = "The request body was invalid", body = BasicErrorResponse),
        (status = 409, description = "The username is taken", body = BasicErrorResponse),
        (status = 500, description = "Data could not be written", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(username = %new_user))]
/// Registers a new user
async fn create_user(
    new_user: dto::NewUser,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<(StatusCode, Json<dto::User>), ErrorResponse> {
    info!("Registering user");
    let user_writer = persistence::db_user_driven_ports::DbWriteUsers;

    let created = user_service
        .create_user(&new_user.into(), &mut *ext_cxn, &user_writer)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    put,
    path = "/api/user/update/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User identifier")),
    request_body = dto::UpdateUser,
    responses(
        (status = 200, description = "The updated user", body = dto::User),
        (status = 404, description = "No user has the given ID", body = BasicErrorResponse),
        (status = 409, description = "The new username is taken", body = BasicErrorResponse),
        (status = 500, description = "Data could not be written", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(update, ext_cxn, user_service))]
async fn update_user(
    user_id: i32,
    update: dto::UpdateUser,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Json<dto::User>, ErrorResponse> {
    info!("Updating user {user_id}");
    let user_writer = persistence::db_user_driven_ports::DbWriteUsers;

    let updated = user_service
        .update_user(user_id, &update.into(), &mut *ext_cxn, &user_writer)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(updated.into()))
}

#[utoipa::path(
    delete,
    path = "/api/user/delete/{id}",
    tag = "Users",
    params(("id" = i32, Path, description = "User identifier")),
    responses(
        (status = 200, description = "The deleted user", body = dto::User),
        (status = 404, description = "No user has the given ID", body = BasicErrorResponse),
        (status = 409, description = "The user still owns tasks", body = BasicErrorResponse),
        (status = 500, description = "Data could not be written", body = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip(ext_cxn, user_service))]
async fn delete_user(
    user_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<Json<dto::User>, ErrorResponse> {
    info!("Deleting user {user_id}");
    let user_writer = persistence::db_user_driven_ports::DbWriteUsers;

    let deleted = user_service
        .delete_user(user_id, &mut *ext_cxn, &user_writer)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(Json(deleted.into()))
}
