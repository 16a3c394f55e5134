use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use packsched_core::PackschedError;
use packsched_scheduler::SchedulerError;
use serde_json::json;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    /// Node named in the request is unknown (404)
    NotFound(String),

    /// Malformed request body or object (400)
    BadRequest(String),

    /// Internal server error (500)
    Internal(String),
}

/// Result type for API operations
pub type Result<T> = std::result::Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(json!({
            "apiVersion": "v1",
            "kind": "Status",
            "status": "Failure",
            "message": message,
            "code": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<PackschedError> for ApiError {
    fn from(err: PackschedError) -> Self {
        match err {
            PackschedError::InvalidQuantity { .. }
            | PackschedError::MissingField { .. }
            | PackschedError::SerializationError { .. } => ApiError::BadRequest(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<SchedulerError> for ApiError {
    fn from(err: SchedulerError) -> Self {
        match err {
            SchedulerError::NodeNotFound { .. } => ApiError::NotFound(err.to_string()),
            SchedulerError::CoreError(inner) => inner.into(),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::BadRequest(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_bad_request() {
        let err: ApiError =
            SchedulerError::from(PackschedError::invalid_quantity("2x", "bad suffix")).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = PackschedError::missing_field("Node", "metadata.name").into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn test_status_body() {
        let response = ApiError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::from(SchedulerError::node_not_found("node1")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
