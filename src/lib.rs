use axum::Router;
use axum::extract::State;
use std::sync::Arc;

pub mod api;
pub mod app_env;
pub mod db;
pub mod domain;
pub mod dto;
pub mod external_connections;
pub mod logging;
pub mod persistence;
pub mod routing_utils;

/// Data every request handler can reach through the router state
pub struct SharedData {
    pub ext_cxn: persistence::ExternalConnectivity,
}

pub type AppState = State<Arc<SharedData>>;

/// Assembles the whole HTTP surface: the task and user APIs under `/api`, the Swagger UI,
/// and request tracing around all of it
pub fn build_router(ext_cxn: persistence::ExternalConnectivity) -> Router {
    let shared_data = Arc::new(SharedData { ext_cxn });

    let router = Router::new()
        .nest(
            "/api",
            Router::new()
                .merge(api::user::user_routes())
                .merge(api::task::task_routes()),
        )
        .merge(api::swagger_main::build_documentation())
        .with_state(shared_data);

    logging::attach_tracing_http(router)
}
