/// Error handling for the API server
///
/// Every handler returns `Result<T, ApiError>`; the error side becomes a
/// JSON body `{error, message, details?}` with the matching status code.
/// Permission denials and unknown IDs are always 403/404/400, never 500.
///
/// # Example
///
/// ```
/// use kanmind_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler(found: bool) -> ApiResult<Json<Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Board not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use kanmind_shared::auth::{
    authorization::AuthzError, jwt::JwtError, middleware::AuthError, password::PasswordError,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400): malformed body, path or query
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Field-level validation failures (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl ApiError {
    /// Single-field validation failure
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        ApiError::ValidationError(vec![ValidationErrorDetail::new(field, message)])
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "unauthorized")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Field-level validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg, None),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg, None),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InternalError(msg) => {
                // Logged here, never sent to the client
                tracing::error!(error = %msg, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Resource not found".to_string()),
            _ => ApiError::InternalError(format!("Database error: {}", err)),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingCredentials => {
                ApiError::Unauthorized("Authentication credentials were not provided".to_string())
            }
            AuthError::InvalidFormat(msg) | AuthError::InvalidToken(msg) => {
                ApiError::Unauthorized(msg)
            }
            AuthError::DatabaseError(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::CreateError(msg) => ApiError::InternalError(msg),
            JwtError::Expired => ApiError::Unauthorized("Token expired".to_string()),
            JwtError::InvalidIssuer => ApiError::Unauthorized("Invalid token issuer".to_string()),
            JwtError::ValidationError(_) => ApiError::Unauthorized("Invalid token".to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;
    use validator::Validate;

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");
    }

    #[test]
    fn test_status_codes() {
        let cases = [
            (ApiError::BadRequest(String::new()), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized(String::new()), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden(String::new()), StatusCode::FORBIDDEN),
            (ApiError::NotFound(String::new()), StatusCode::NOT_FOUND),
            (ApiError::invalid_field("board", "required"), StatusCode::BAD_REQUEST),
            (ApiError::InternalError(String::new()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn test_authz_error_is_forbidden() {
        let err: ApiError = AuthzError::NotBoardOwner(Uuid::new_v4()).into();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn test_row_not_found_is_not_found() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[derive(Validate)]
    struct Input {
        #[validate(length(min = 1, message = "This field may not be blank."))]
        title: String,
    }

    #[test]
    fn test_validator_errors_become_field_details() {
        let errors = Input {
            title: String::new(),
        }
        .validate()
        .unwrap_err();

        match ApiError::from(errors) {
            ApiError::ValidationError(details) => {
                assert_eq!(
                    details,
                    vec![ValidationErrorDetail::new("title", "This field may not be blank.")]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
