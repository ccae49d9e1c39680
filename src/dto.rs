use utoipa::OpenApi;

mod task;
mod user;

pub use task::*;
pub use user::*;

use crate::routing_utils::{BasicErrorResponse, ExtraInfo, ValidationErrorSchema};

/// Collects the schemas of every request/response body so the API documentation can reference them
#[derive(OpenApi)]
#[openapi(components(schemas(
    Task,
    NewTask,
    UpdateTask,
    TaskSortField,
    SortDirection,
    User,
    NewUser,
    UpdateUser,
    BasicErrorResponse,
    ExtraInfo,
    ValidationErrorSchema,
)))]
pub struct OpenApiSchemas;
