use crate::{build_router, persistence};
use axum::{Router, body};
use serde::de::DeserializeOwned;
use sqlx::postgres::PgPoolOptions;

/// Used in tests to both extract the raw bytes from the HTTP response body and then deserialize them into the
/// requested type. Will panic and fail the test if either step fails somehow.
pub async fn deserialize_body<T: DeserializeOwned>(response_body: body::Body) -> T {
    let bytes = body::to_bytes(response_body, usize::MAX)
        .await
        .expect("Could not read data from response body!");

    serde_json::from_slice(&bytes).unwrap_or_else(|err| {
        panic!(
            "Could not parse body content into data structure! Error: {}, Received body: {:?}",
            err, bytes
        )
    })
}

/// Builds the full application router on top of a pool that never connects. Good for exercising
/// request parsing, which fails before any query runs.
pub fn lazy_app() -> Router {
    let pool = PgPoolOptions::new()
        .connect_lazy("postgres://localhost/never_connected")
        .expect("lazy pool should accept a well-formed URL");

    build_router(persistence::ExternalConnectivity::new(pool))
}
