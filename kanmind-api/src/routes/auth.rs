/// Account endpoints
///
/// # Endpoints
///
/// - `POST /registration/` - Create an account and get a token (public)
/// - `POST /login/` - Exchange email and password for a token (public)
/// - `GET /email-check/?email=` - Look up a user by email (authenticated)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{not_blank, ValidatedJson},
};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use kanmind_shared::{
    auth::{jwt, password},
    models::user::{is_duplicate_email, CreateUser, User, UserDetail},
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;
use validator::Validate;

/// Registration request
#[derive(Debug, Deserialize, Validate)]
pub struct RegistrationRequest {
    /// "First Last"; split at the first space
    #[validate(
        custom(function = "not_blank"),
        length(max = 150, message = "Ensure this field has no more than 150 characters.")
    )]
    pub fullname: String,

    #[validate(
        email(message = "Enter a valid email address."),
        length(max = 254, message = "Ensure this field has no more than 254 characters.")
    )]
    pub email: String,

    #[validate(length(min = 1, message = "This field may not be blank."))]
    pub password: String,

    pub repeated_password: String,
}

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Enter a valid email address."))]
    pub email: String,

    pub password: String,
}

/// Token response shared by registration and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub fullname: String,
    pub email: String,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: Option<String>,
}

fn auth_response(state: &AppState, user: &User) -> ApiResult<AuthResponse> {
    let token = jwt::create_token(&jwt::Claims::new(user.id), state.jwt_secret())?;

    Ok(AuthResponse {
        token,
        fullname: user.full_name(),
        email: user.email.clone(),
        user_id: user.id,
    })
}

/// Registers a new user
///
/// ```text
/// POST /registration/
///
/// {
///   "fullname": "Ada Lovelace",
///   "email": "ada@example.com",
///   "password": "analytical",
///   "repeated_password": "analytical"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: validation failed, passwords differ, or the email
///   is already registered
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegistrationRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    if req.password != req.repeated_password {
        return Err(ApiError::invalid_field(
            "repeated_password",
            "Passwords do not match.",
        ));
    }

    let email = req.email.trim();

    if User::email_exists(&state.db, email).await? {
        return Err(ApiError::invalid_field(
            "email",
            "A user with this email already exists.",
        ));
    }

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser::from_fullname(email, &req.fullname, password_hash),
    )
    .await
    .map_err(|e| {
        // Lost a race with a concurrent registration of the same address
        if is_duplicate_email(&e) {
            ApiError::invalid_field("email", "A user with this email already exists.")
        } else {
            e.into()
        }
    })?;

    info!(user_id = %user.id, "User registered");

    Ok((StatusCode::CREATED, Json(auth_response(&state, &user)?)))
}

/// Logs a user in
///
/// ```text
/// POST /login/
///
/// { "email": "ada@example.com", "password": "analytical" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: malformed email
/// - `401 Unauthorized`: unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = User::find_by_email(&state.db, req.email.trim())
        .await?
        .ok_or_else(invalid)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        debug!(user_id = %user.id, "Login rejected: wrong password");
        return Err(invalid());
    }

    info!(user_id = %user.id, "User logged in");

    Ok(Json(auth_response(&state, &user)?))
}

/// Looks up a registered user by email
///
/// ```text
/// GET /email-check/?email=ada@example.com
/// ```
///
/// Returns `{id, email, fullname}`; 400 without the parameter, 404 for an
/// unknown address.
pub async fn email_check(
    State(state): State<AppState>,
    Query(query): Query<EmailQuery>,
) -> ApiResult<Json<UserDetail>> {
    let email = query
        .email
        .as_deref()
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email parameter is required.".to_string()))?;

    let user = User::find_by_email(&state.db, email)
        .await?
        .ok_or_else(|| ApiError::NotFound("Email not found.".to_string()))?;

    Ok(Json(user.detail()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration(fullname: &str, email: &str) -> RegistrationRequest {
        RegistrationRequest {
            fullname: fullname.to_string(),
            email: email.to_string(),
            password: "analytical".to_string(),
            repeated_password: "analytical".to_string(),
        }
    }

    #[test]
    fn test_registration_accepts_normal_input() {
        assert!(registration("Ada Lovelace", "ada@example.com").validate().is_ok());
    }

    #[test]
    fn test_registration_rejects_blank_or_long_fullname() {
        assert!(registration("   ", "ada@example.com").validate().is_err());

        let long = "A".repeat(151);
        let errors = registration(&long, "ada@example.com").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("fullname"));

        assert!(registration(&"A".repeat(150), "ada@example.com").validate().is_ok());
    }

    #[test]
    fn test_registration_rejects_bad_email() {
        let errors = registration("Ada Lovelace", "not-an-email").validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }
}
