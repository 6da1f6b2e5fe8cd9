/// Comment endpoints, nested under a task
///
/// The task-scope middleware has already resolved the task and checked
/// that the requester can see its board, so handlers start from a
/// [`TaskScope`]. Changing or deleting a comment additionally requires
/// being its author.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{not_blank, Path, ValidatedJson},
    middleware::task_scope::TaskScope,
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use kanmind_shared::{
    auth::{authorization::require_comment_author, middleware::AuthContext},
    models::comment::{Comment, CreateComment},
    scope,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Serialize, Deserialize)]
pub struct CommentResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,

    /// "First Last", or the login handle when either name is missing
    pub author: String,

    pub content: String,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            created_at: comment.created_at,
            author: comment.author_name(),
            content: comment.content,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CommentRequest {
    #[validate(custom(function = "not_blank"))]
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentPath {
    pub comment_id: Uuid,
}

async fn find_comment(state: &AppState, task: &TaskScope, comment_id: Uuid) -> ApiResult<Comment> {
    Comment::find_in_task(&state.db, task.task_id, comment_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))
}

pub async fn list_comments(
    State(state): State<AppState>,
    task: TaskScope,
) -> ApiResult<Json<Vec<CommentResponse>>> {
    let comments = scope::comments_of(&state.db, task.task_id).await?;
    Ok(Json(comments.into_iter().map(CommentResponse::from).collect()))
}

pub async fn create_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    task: TaskScope,
    ValidatedJson(req): ValidatedJson<CommentRequest>,
) -> ApiResult<(StatusCode, Json<CommentResponse>)> {
    let comment = Comment::create(
        &state.db,
        CreateComment {
            task_id: task.task_id,
            author_id: auth.user_id,
            content: req.content.trim().to_string(),
        },
    )
    .await?;

    info!(user_id = %auth.user_id, task_id = %task.task_id, comment_id = %comment.id, "Comment created");

    Ok((StatusCode::CREATED, Json(comment.into())))
}

pub async fn get_comment(
    State(state): State<AppState>,
    task: TaskScope,
    Path(path): Path<CommentPath>,
) -> ApiResult<Json<CommentResponse>> {
    let comment = find_comment(&state, &task, path.comment_id).await?;
    Ok(Json(comment.into()))
}

/// Replaces the content (PUT and PATCH); author only
pub async fn update_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    task: TaskScope,
    Path(path): Path<CommentPath>,
    ValidatedJson(req): ValidatedJson<CommentRequest>,
) -> ApiResult<Json<CommentResponse>> {
    let comment = find_comment(&state, &task, path.comment_id).await?;

    if let Err(e) = require_comment_author(auth.user_id, &comment.access()) {
        warn!(user_id = %auth.user_id, comment_id = %comment.id, "Comment update denied");
        return Err(e.into());
    }

    let updated = Comment::update_content(&state.db, comment.id, req.content.trim())
        .await?
        .ok_or_else(|| ApiError::NotFound("Comment not found".to_string()))?;

    info!(user_id = %auth.user_id, comment_id = %comment.id, "Comment updated");

    Ok(Json(updated.into()))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    auth: AuthContext,
    task: TaskScope,
    Path(path): Path<CommentPath>,
) -> ApiResult<StatusCode> {
    let comment = find_comment(&state, &task, path.comment_id).await?;

    if let Err(e) = require_comment_author(auth.user_id, &comment.access()) {
        warn!(user_id = %auth.user_id, comment_id = %comment.id, "Comment delete denied");
        return Err(e.into());
    }

    Comment::delete(&state.db, comment.id).await?;

    info!(user_id = %auth.user_id, comment_id = %comment.id, "Comment deleted");

    Ok(StatusCode::NO_CONTENT)
}
