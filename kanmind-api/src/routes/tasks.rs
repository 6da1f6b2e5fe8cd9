/// Task endpoints
///
/// # Endpoints
///
/// - `GET /tasks/` - Tasks on boards the requester owns or belongs to
/// - `POST /tasks/` - Create a task on a board the requester can access
/// - `GET /tasks/assigned-to-me/` - Tasks assigned to the requester
/// - `GET /tasks/reviewing/` - Tasks the requester reviews
/// - `GET /tasks/:task_id/` - Task detail
/// - `PUT|PATCH /tasks/:task_id/` - Update a task (the board can't change)
/// - `DELETE /tasks/:task_id/` - Delete (creator or board owner)
///
/// Every task response carries `comments_count` and embeds the assignee
/// and reviewer as `{id, username, first_name, last_name}`.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{double_option, from_value, JsonBody, Path, ValidatedJson},
};
use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, NaiveDate, Utc};
use kanmind_shared::{
    auth::{
        authorization::{require_board_access, require_task_access, require_task_delete, TaskAccess},
        middleware::AuthContext,
    },
    models::{
        board::Board,
        task::{CreateTask, Task, TaskPriority, TaskStatus, TaskWithCounts, UpdateTask},
        user::{User, UserSummary},
    },
    scope,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::PgPool;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Task as returned by every task endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: Uuid,
    pub board: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub created_by: Option<Uuid>,
    pub assignee: Option<UserSummary>,
    pub reviewer: Option<UserSummary>,
    pub comments_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create payload; `board` has already been checked when this is parsed
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTaskRequest {
    pub board: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters."))]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub status: TaskStatus,

    #[serde(default)]
    pub priority: TaskPriority,

    pub due_date: Option<NaiveDate>,

    pub assignee_id: Option<Uuid>,

    pub reviewer_id: Option<Uuid>,
}

/// Update payload shared by PUT and PATCH
///
/// Absent fields are left alone; `null` clears `due_date`, `assignee_id`
/// and `reviewer_id`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTaskRequest {
    /// Accepted only when equal to the task's current board
    pub board: Option<Uuid>,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters."))]
    pub title: Option<String>,

    pub description: Option<String>,

    pub status: Option<TaskStatus>,

    pub priority: Option<TaskPriority>,

    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<NaiveDate>>,

    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "double_option")]
    pub reviewer_id: Option<Option<Uuid>>,
}

impl From<UpdateTaskRequest> for UpdateTask {
    fn from(req: UpdateTaskRequest) -> Self {
        UpdateTask {
            title: req.title.map(|t| t.trim().to_string()),
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            assignee_id: req.assignee_id,
            reviewer_id: req.reviewer_id,
        }
    }
}

/// Attaches assignee/reviewer summaries with one batched user lookup
pub async fn render_tasks(pool: &PgPool, rows: Vec<TaskWithCounts>) -> ApiResult<Vec<TaskResponse>> {
    let mut user_ids: Vec<Uuid> = rows
        .iter()
        .flat_map(|row| [row.task.assignee_id, row.task.reviewer_id])
        .flatten()
        .collect();
    user_ids.sort_unstable();
    user_ids.dedup();

    let users = User::summaries(pool, &user_ids).await?;
    let lookup = |id: Option<Uuid>| id.and_then(|id| users.get(&id).cloned());

    Ok(rows
        .into_iter()
        .map(|row| {
            let task = row.task;
            TaskResponse {
                id: task.id,
                board: task.board_id,
                assignee: lookup(task.assignee_id),
                reviewer: lookup(task.reviewer_id),
                title: task.title,
                description: task.description,
                status: task.status,
                priority: task.priority,
                due_date: task.due_date,
                created_by: task.created_by,
                comments_count: row.comments_count,
                created_at: task.created_at,
                updated_at: task.updated_at,
            }
        })
        .collect())
}

async fn render_task(pool: &PgPool, row: TaskWithCounts) -> ApiResult<TaskResponse> {
    render_tasks(pool, vec![row])
        .await?
        .pop()
        .ok_or_else(|| ApiError::InternalError("Rendered task missing".to_string()))
}

/// 400 naming the first field whose user doesn't exist; one lookup for all
/// fields
async fn ensure_users_exist(pool: &PgPool, candidates: &[(&str, Option<Uuid>)]) -> ApiResult<()> {
    let ids: Vec<Uuid> = candidates.iter().filter_map(|(_, id)| *id).collect();
    let missing = User::missing_ids(pool, &ids).await?;

    match first_missing(candidates, &missing) {
        Some((field, id)) => Err(ApiError::invalid_field(
            field,
            format!("User {} does not exist.", id),
        )),
        None => Ok(()),
    }
}

fn first_missing<'a>(
    candidates: &[(&'a str, Option<Uuid>)],
    missing: &[Uuid],
) -> Option<(&'a str, Uuid)> {
    candidates.iter().find_map(|(field, id)| {
        id.filter(|id| missing.contains(id)).map(|id| (*field, id))
    })
}

async fn load_task_access(state: &AppState, task_id: Uuid) -> ApiResult<TaskAccess> {
    Task::load_access(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))
}

/// Lists tasks on boards visible to the requester
pub async fn list_tasks(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let rows = scope::visible_tasks(&state.db, auth.user_id).await?;
    Ok(Json(render_tasks(&state.db, rows).await?))
}

/// Tasks assigned to the requester, regardless of board membership
pub async fn assigned_to_me(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let rows = scope::tasks_assigned_to(&state.db, auth.user_id).await?;
    Ok(Json(render_tasks(&state.db, rows).await?))
}

/// Tasks the requester reviews, regardless of board membership
pub async fn reviewing(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<TaskResponse>>> {
    let rows = scope::tasks_reviewing(&state.db, auth.user_id).await?;
    Ok(Json(render_tasks(&state.db, rows).await?))
}

/// Creates a task
///
/// ```text
/// POST /tasks/
///
/// {
///   "board": "uuid",
///   "title": "Fix bug",
///   "priority": "high",
///   "assignee_id": "uuid"
/// }
/// ```
///
/// The board is checked first: a missing or malformed `board` is 400, an
/// unknown board 404, a board the requester can't access 403. Only then is
/// the rest of the payload validated.
pub async fn create_task(
    State(state): State<AppState>,
    auth: AuthContext,
    JsonBody(body): JsonBody<Value>,
) -> ApiResult<(StatusCode, Json<TaskResponse>)> {
    let board_id = match body.get("board") {
        None | Some(Value::Null) => {
            return Err(ApiError::invalid_field("board", "This field is required."));
        }
        Some(raw) => serde_json::from_value::<Uuid>(raw.clone())
            .map_err(|_| ApiError::invalid_field("board", "Invalid board id."))?,
    };

    let board = Board::load_access(&state.db, board_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))?;

    if let Err(e) = require_board_access(auth.user_id, &board) {
        warn!(user_id = %auth.user_id, board_id = %board_id, "Task create denied");
        return Err(e.into());
    }

    let req: CreateTaskRequest = from_value(body)?;

    if req.title.trim().is_empty() {
        return Err(ApiError::invalid_field("title", "This field may not be blank."));
    }

    ensure_users_exist(
        &state.db,
        &[("assignee_id", req.assignee_id), ("reviewer_id", req.reviewer_id)],
    )
    .await?;

    let mut tx = state.db.begin().await?;

    let task = Task::create(
        &mut *tx,
        CreateTask {
            board_id,
            created_by: auth.user_id,
            title: req.title.trim().to_string(),
            description: req.description,
            status: req.status,
            priority: req.priority,
            due_date: req.due_date,
            assignee_id: req.assignee_id,
            reviewer_id: req.reviewer_id,
        },
    )
    .await?;

    let row = scope::task_with_counts(&mut *tx, task.id)
        .await?
        .ok_or_else(|| ApiError::InternalError("Created task vanished".to_string()))?;

    tx.commit().await?;

    info!(user_id = %auth.user_id, board_id = %board_id, task_id = %task.id, "Task created");

    Ok((StatusCode::CREATED, Json(render_task(&state.db, row).await?)))
}

pub async fn get_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
) -> ApiResult<Json<TaskResponse>> {
    let access = load_task_access(&state, task_id).await?;
    require_task_access(auth.user_id, &access)?;

    let row = scope::task_with_counts(&state.db, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    Ok(Json(render_task(&state.db, row).await?))
}

/// PUT: `title` is required, other fields as in PATCH
pub async fn replace_task(
    state: State<AppState>,
    auth: AuthContext,
    task_id: Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    if req.title.is_none() {
        return Err(ApiError::invalid_field("title", "This field is required."));
    }

    apply_task_update(state, auth, task_id, req).await
}

pub async fn patch_task(
    state: State<AppState>,
    auth: AuthContext,
    task_id: Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<Json<TaskResponse>> {
    apply_task_update(state, auth, task_id, req).await
}

async fn apply_task_update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
    req: UpdateTaskRequest,
) -> ApiResult<Json<TaskResponse>> {
    let access = load_task_access(&state, task_id).await?;
    require_task_access(auth.user_id, &access)?;

    if let Some(board) = req.board {
        if board != access.board.board_id {
            return Err(ApiError::invalid_field(
                "board",
                "Tasks cannot be moved to another board.",
            ));
        }
    }

    if req.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(ApiError::invalid_field("title", "This field may not be blank."));
    }

    let update = UpdateTask::from(req);

    ensure_users_exist(
        &state.db,
        &[
            ("assignee_id", update.assignee_id.flatten()),
            ("reviewer_id", update.reviewer_id.flatten()),
        ],
    )
    .await?;

    if update.is_empty() {
        debug!(task_id = %task_id, "Empty task update");
    }

    let mut tx = state.db.begin().await?;

    Task::update(&mut *tx, task_id, update)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    let row = scope::task_with_counts(&mut *tx, task_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Task not found".to_string()))?;

    tx.commit().await?;

    info!(user_id = %auth.user_id, task_id = %task_id, "Task updated");

    Ok(Json(render_task(&state.db, row).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(task_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let access = load_task_access(&state, task_id).await?;

    if let Err(e) = require_task_delete(auth.user_id, &access) {
        warn!(user_id = %auth.user_id, task_id = %task_id, "Task delete denied");
        return Err(e.into());
    }

    Task::delete(&state.db, task_id).await?;

    info!(user_id = %auth.user_id, task_id = %task_id, "Task deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_request_absent_vs_null() {
        let req: UpdateTaskRequest =
            serde_json::from_value(json!({ "assignee_id": null, "status": "done" })).unwrap();

        let update = UpdateTask::from(req);
        assert_eq!(update.assignee_id, Some(None));
        assert_eq!(update.reviewer_id, None);
        assert_eq!(update.status, Some(TaskStatus::Done));
        assert!(update.title.is_none());
    }

    #[test]
    fn test_create_request_defaults() {
        let req: CreateTaskRequest = serde_json::from_value(json!({
            "board": Uuid::new_v4(),
            "title": "Fix bug"
        }))
        .unwrap();

        assert_eq!(req.status, TaskStatus::ToDo);
        assert_eq!(req.priority, TaskPriority::Medium);
        assert_eq!(req.description, "");
        assert!(req.assignee_id.is_none());
    }

    #[test]
    fn test_create_request_rejects_unknown_status() {
        let result = serde_json::from_value::<CreateTaskRequest>(json!({
            "board": Uuid::new_v4(),
            "title": "Fix bug",
            "status": "blocked"
        }));

        assert!(result.is_err());
    }

    #[test]
    fn test_first_missing_reports_field_in_order() {
        let assignee = Uuid::new_v4();
        let reviewer = Uuid::new_v4();
        let candidates = [("assignee_id", Some(assignee)), ("reviewer_id", Some(reviewer))];

        assert_eq!(first_missing(&candidates, &[]), None);
        assert_eq!(
            first_missing(&candidates, &[reviewer]),
            Some(("reviewer_id", reviewer))
        );
        assert_eq!(
            first_missing(&candidates, &[reviewer, assignee]),
            Some(("assignee_id", assignee))
        );
        assert_eq!(first_missing(&[("assignee_id", None)], &[assignee]), None);
    }
}
