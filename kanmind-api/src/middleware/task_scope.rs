/// Task resolution for nested comment routes
///
/// Runs as a route layer on `/tasks/:task_id/comments/...`, after routing
/// and after authentication. It loads the task and its board's current
/// owner/members once, checks comment access, and hands the result to the
/// handler as a [`TaskScope`] extension.
///
/// An unknown or malformed task ID is a 404 and a task on a board the
/// requester can't see is a 403. Neither surfaces as a 500.

use crate::{app::AppState, error::ApiError};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use kanmind_shared::{
    auth::{
        authorization::can_access_task_comments,
        middleware::AuthContext,
    },
    models::task::Task,
};
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Task named in the request path, already checked for comment access
#[derive(Debug, Clone, Copy)]
pub struct TaskScope {
    pub task_id: Uuid,
}

pub async fn resolve_task(
    State(state): State<AppState>,
    auth: AuthContext,
    axum::extract::Path(params): axum::extract::Path<HashMap<String, String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let task_id = params
        .get("task_id")
        .and_then(|raw| Uuid::parse_str(raw).ok());

    let task = match task_id {
        Some(id) => Task::load_access(&state.db, id).await?,
        None => None,
    };

    if !can_access_task_comments(auth.user_id, task.as_ref()) {
        return Err(match task {
            None => ApiError::NotFound("Task not found".to_string()),
            Some(task) => {
                warn!(
                    user_id = %auth.user_id,
                    task_id = %task.task_id,
                    "Comment access denied"
                );
                ApiError::Forbidden("You do not have access to this task".to_string())
            }
        });
    }

    if let Some(task) = task {
        req.extensions_mut().insert(TaskScope {
            task_id: task.task_id,
        });
    }

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for TaskScope
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TaskScope>()
            .cloned()
            .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
    }
}
