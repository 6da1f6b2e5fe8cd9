/// Bearer authentication for Axum
///
/// [`authenticate`] turns an `Authorization: Bearer <token>` header into an
/// [`AuthContext`]: the token must validate and its subject must still be a
/// registered user. The API crate runs it as middleware and stores the
/// context in request extensions; handlers take `AuthContext` as an
/// extractor.
///
/// # Example
///
/// ```
/// use kanmind_shared::auth::middleware::AuthContext;
///
/// async fn handler(auth: AuthContext) -> String {
///     format!("Hello, user {}!", auth.user_id)
/// }
/// ```

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::PgPool;
use tracing::{debug, error};
use uuid::Uuid;

use super::jwt::{validate_token, JwtError};
use crate::models::user::User;

/// Identity of the requester, added to request extensions after a
/// successful [`authenticate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
}

impl AuthContext {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }
}

/// Error type for bearer authentication
#[derive(Debug)]
pub enum AuthError {
    /// No Authorization header
    MissingCredentials,

    /// Header present but not `Bearer <token>`
    InvalidFormat(String),

    /// Signature, expiry or issuer check failed, or the user is gone
    InvalidToken(String),

    DatabaseError(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingCredentials => (
                StatusCode::UNAUTHORIZED,
                "Authentication credentials were not provided".to_string(),
            ),
            AuthError::InvalidFormat(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::InvalidToken(msg) => (StatusCode::UNAUTHORIZED, msg),
            AuthError::DatabaseError(msg) => {
                error!(error = %msg, "Database error during authentication");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let code = if status == StatusCode::UNAUTHORIZED {
            "unauthorized"
        } else {
            "internal_error"
        };

        (status, Json(json!({ "error": code, "message": message }))).into_response()
    }
}

/// Pulls the token out of `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AuthError::InvalidFormat("Expected Bearer token".to_string()))
}

/// Resolves the request's bearer token to a live user
pub async fn authenticate(
    pool: &PgPool,
    secret: &str,
    headers: &HeaderMap,
) -> Result<AuthContext, AuthError> {
    let token = bearer_token(headers)?;

    let claims = validate_token(token, secret).map_err(|e| match e {
        JwtError::Expired => AuthError::InvalidToken("Token expired".to_string()),
        JwtError::InvalidIssuer => AuthError::InvalidToken("Invalid issuer".to_string()),
        _ => AuthError::InvalidToken("Invalid token".to_string()),
    })?;

    let exists = User::exists(pool, claims.sub)
        .await
        .map_err(|e| AuthError::DatabaseError(e.to_string()))?;

    if !exists {
        debug!(user_id = %claims.sub, "Token subject no longer exists");
        return Err(AuthError::InvalidToken("User not found".to_string()));
    }

    Ok(AuthContext::new(claims.sub))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext>()
            .copied()
            .ok_or(AuthError::MissingCredentials)
    }
}
