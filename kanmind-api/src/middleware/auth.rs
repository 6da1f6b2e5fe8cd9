/// Bearer authentication layer
///
/// Validates the `Authorization: Bearer <token>` header against the JWT
/// secret and the users table, then injects `AuthContext` into request
/// extensions. Any failure is a 401.

use crate::{app::AppState, error::ApiError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use kanmind_shared::auth::middleware::authenticate;

pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_context = authenticate(&state.db, state.jwt_secret(), req.headers()).await?;

    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
