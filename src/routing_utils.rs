use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::{FromRequest, FromRequestParts};
use serde::Serialize;
use tracing::error;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{ToSchema, openapi};
use validator::ValidationErrors;

use crate::domain;

/// Contains diagnostic information about an API failure
#[derive(Serialize, Debug, ToSchema)]
#[schema(example = json!({
    "error_code": "not_found",
    "error_description": "The requested entity could not be found.",
    "extra_info": null
}))]
pub struct BasicErrorResponse {
    pub error_code: String,
    pub error_description: String,
    pub extra_info: Option<ExtraInfo>,
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors] which just provides an empty object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(ValidationErrors);

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

fn error_body(
    status: StatusCode,
    error_code: &str,
    error_description: &str,
    extra_info: Option<ExtraInfo>,
) -> Response {
    (
        status,
        axum::Json(BasicErrorResponse {
            error_code: error_code.into(),
            error_description: error_description.into(),
            extra_info,
        }),
    )
        .into_response()
}

/// Response type that turns errors from the domain layer into [BasicErrorResponse]s
#[derive(Debug)]
pub struct DomainErrorResponse(pub domain::Error);

impl IntoResponse for DomainErrorResponse {
    fn into_response(self) -> Response {
        match self.0 {
            domain::Error::DoesNotExist => error_body(
                StatusCode::NOT_FOUND,
                "not_found",
                "The requested entity could not be found.",
                None,
            ),
            domain::Error::ConstraintViolation(detail) => error_body(
                StatusCode::CONFLICT,
                "constraint_violation",
                "The change conflicts with existing data.",
                Some(ExtraInfo::Message(detail)),
            ),
            domain::Error::InvalidInput(detail) => error_body(
                StatusCode::BAD_REQUEST,
                "invalid_input",
                "Submitted data was invalid.",
                Some(ExtraInfo::Message(detail)),
            ),
            domain::Error::RetrieveFailure { .. } => {
                error!("Request failed: {}", self.0);
                error_body(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "Could not access data to complete your request",
                    None,
                )
            }
        }
    }
}

impl From<domain::Error> for DomainErrorResponse {
    fn from(value: domain::Error) -> Self {
        Self(value)
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        error_body(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "Submitted data was invalid.",
            Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
        )
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest, Debug)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        error_body(
            StatusCode::BAD_REQUEST,
            "invalid_json",
            "The passed request body contained malformed or unreadable JSON.",
            Some(ExtraInfo::Message(self.parse_problem)),
        )
    }
}

/// Wrapper for [axum::extract::Path] so a non-numeric ID in the URL is reported with our error
/// body instead of axum's plain text rejection
#[derive(FromRequestParts, Debug)]
#[from_request(via(axum::extract::Path), rejection(PathErrorResponse))]
pub struct Path<T>(pub T);

/// Response type representing path parameters which could not be parsed
pub struct PathErrorResponse {
    parse_problem: String,
}

impl From<PathRejection> for PathErrorResponse {
    fn from(value: PathRejection) -> Self {
        PathErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for PathErrorResponse {
    fn into_response(self) -> Response {
        error_body(
            StatusCode::BAD_REQUEST,
            "invalid_path",
            "A parameter in the request path was malformed.",
            Some(ExtraInfo::Message(self.parse_problem)),
        )
    }
}

/// Wrapper for [axum::extract::Query] so bad paging parameters get our error body too
#[derive(FromRequestParts, Debug)]
#[from_request(via(axum::extract::Query), rejection(QueryErrorResponse))]
pub struct Query<T>(pub T);

/// Response type representing a query string which could not be parsed
pub struct QueryErrorResponse {
    parse_problem: String,
}

impl From<QueryRejection> for QueryErrorResponse {
    fn from(value: QueryRejection) -> Self {
        QueryErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for QueryErrorResponse {
    fn into_response(self) -> Response {
        error_body(
            StatusCode::BAD_REQUEST,
            "invalid_query",
            "The query string contained an unknown or malformed parameter.",
            Some(ExtraInfo::Message(self.parse_problem)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::deserialize_body;
    use anyhow::anyhow;
    use serde_json::Value;

    #[tokio::test]
    async fn missing_data_is_404() {
        let response = DomainErrorResponse(domain::Error::DoesNotExist).into_response();
        assert_eq!(StatusCode::NOT_FOUND, response.status());

        let body: Value = deserialize_body(response.into_body()).await;
        assert_eq!("not_found", body["error_code"]);
    }

    #[tokio::test]
    async fn constraint_violation_is_409_with_detail() {
        let response = DomainErrorResponse(domain::Error::ConstraintViolation(
            "duplicate key".to_owned(),
        ))
        .into_response();
        assert_eq!(StatusCode::CONFLICT, response.status());

        let body: Value = deserialize_body(response.into_body()).await;
        assert_eq!("constraint_violation", body["error_code"]);
        assert_eq!("duplicate key", body["extra_info"]);
    }

    #[tokio::test]
    async fn invalid_input_is_400() {
        let response = DomainErrorResponse(domain::Error::InvalidInput(
            "invalid byte sequence for encoding \"UTF8\": 0x00".to_owned(),
        ))
        .into_response();
        assert_eq!(StatusCode::BAD_REQUEST, response.status());

        let body: Value = deserialize_body(response.into_body()).await;
        assert_eq!("invalid_input", body["error_code"]);
    }

    #[tokio::test]
    async fn retrieve_failure_hides_cause() {
        let response = DomainErrorResponse(domain::Error::RetrieveFailure {
            action: "fetch a task".to_owned(),
            cause: anyhow!("connection refused on 10.0.0.3"),
        })
        .into_response();
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, response.status());

        let body: Value = deserialize_body(response.into_body()).await;
        assert_eq!("internal_error", body["error_code"]);
        assert_eq!(Value::Null, body["extra_info"]);
    }
}
