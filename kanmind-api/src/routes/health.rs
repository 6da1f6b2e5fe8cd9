/// Health check endpoint
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "database": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use kanmind_shared::db::pool;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `healthy` or `degraded`
    pub status: String,

    pub version: String,

    /// `connected` or `disconnected`
    pub database: String,
}

pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let connected = match pool::health_check(&state.db).await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database health check failed");
            false
        }
    };

    Ok(Json(HealthResponse {
        status: if connected { "healthy" } else { "degraded" }.to_string(),
        version: kanmind_shared::VERSION.to_string(),
        database: if connected { "connected" } else { "disconnected" }.to_string(),
    }))
}
