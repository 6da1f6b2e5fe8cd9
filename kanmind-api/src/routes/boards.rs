/// Board endpoints
///
/// # Endpoints
///
/// - `GET /boards/` - Boards the requester owns or belongs to, with counters
/// - `POST /boards/` - Create a board owned by the requester
/// - `GET /boards/:board_id/` - Board with owner, members and tasks
/// - `PUT|PATCH /boards/:board_id/` - Change title and/or replace members
/// - `DELETE /boards/:board_id/` - Delete (owner only); tasks and comments
///   go with it

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{Path, ValidatedJson},
    routes::tasks::{render_tasks, TaskResponse},
};
use axum::{extract::State, http::StatusCode, Json};
use kanmind_shared::{
    auth::{
        authorization::{require_board_access, require_board_owner, BoardAccess},
        middleware::AuthContext,
    },
    models::{
        board::{Board, CreateBoard, UpdateBoard},
        user::{User, UserDetail},
    },
    scope::{self, BoardSummary},
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateBoardRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters."))]
    pub title: String,

    /// User IDs to add; the requester is always added
    #[serde(default)]
    pub members: Vec<Uuid>,
}

/// Update payload shared by PUT and PATCH
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateBoardRequest {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters."))]
    pub title: Option<String>,

    /// Replaces the whole member set when present
    pub members: Option<Vec<Uuid>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BoardDetailResponse {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub owner_data: UserDetail,
    pub members: Vec<UserDetail>,
    pub tasks: Vec<TaskResponse>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BoardUpdateResponse {
    pub id: Uuid,
    pub title: String,
    pub owner_data: UserDetail,
    pub members_data: Vec<UserDetail>,
}

async fn load_board_access(pool: &PgPool, board_id: Uuid) -> ApiResult<BoardAccess> {
    Board::load_access(pool, board_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))
}

async fn ensure_members_exist(pool: &PgPool, members: &[Uuid]) -> ApiResult<()> {
    let missing = User::missing_ids(pool, members).await?;

    if let Some(id) = missing.first() {
        return Err(ApiError::invalid_field(
            "members",
            format!("User {} does not exist.", id),
        ));
    }

    Ok(())
}

async fn owner_detail(pool: &PgPool, owner_id: Uuid) -> ApiResult<UserDetail> {
    User::find_by_id(pool, owner_id)
        .await?
        .map(|owner| owner.detail())
        .ok_or_else(|| ApiError::InternalError(format!("Board owner {} missing", owner_id)))
}

async fn member_details(pool: &PgPool, board_id: Uuid) -> ApiResult<Vec<UserDetail>> {
    Ok(Board::members(pool, board_id)
        .await?
        .iter()
        .map(User::detail)
        .collect())
}

pub async fn list_boards(
    State(state): State<AppState>,
    auth: AuthContext,
) -> ApiResult<Json<Vec<BoardSummary>>> {
    Ok(Json(scope::visible_boards(&state.db, auth.user_id).await?))
}

/// Creates a board
///
/// ```text
/// POST /boards/
///
/// { "title": "Sprint 1", "members": ["uuid", "uuid"] }
/// ```
///
/// The board and its member rows are written in one transaction.
pub async fn create_board(
    State(state): State<AppState>,
    auth: AuthContext,
    ValidatedJson(req): ValidatedJson<CreateBoardRequest>,
) -> ApiResult<(StatusCode, Json<BoardSummary>)> {
    let title = req.title.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::invalid_field("title", "This field may not be blank."));
    }

    ensure_members_exist(&state.db, &req.members).await?;

    let mut tx = state.db.begin().await?;

    let board = Board::create(
        &mut tx,
        CreateBoard {
            title,
            owner_id: auth.user_id,
            member_ids: req.members,
        },
    )
    .await?;

    let summary = scope::board_summary(&mut *tx, board.id)
        .await?
        .ok_or_else(|| ApiError::InternalError("Created board vanished".to_string()))?;

    tx.commit().await?;

    info!(user_id = %auth.user_id, board_id = %board.id, "Board created");

    Ok((StatusCode::CREATED, Json(summary)))
}

pub async fn get_board(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(board_id): Path<Uuid>,
) -> ApiResult<Json<BoardDetailResponse>> {
    let access = load_board_access(&state.db, board_id).await?;
    require_board_access(auth.user_id, &access)?;

    let board = Board::find_by_id(&state.db, board_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))?;

    let tasks = scope::tasks_on_board(&state.db, board_id).await?;

    Ok(Json(BoardDetailResponse {
        id: board.id,
        title: board.title,
        owner_id: board.owner_id,
        owner_data: owner_detail(&state.db, board.owner_id).await?,
        members: member_details(&state.db, board_id).await?,
        tasks: render_tasks(&state.db, tasks).await?,
    }))
}

/// PUT: `title` is required, `members` replaces the set when present
pub async fn replace_board(
    state: State<AppState>,
    auth: AuthContext,
    board_id: Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateBoardRequest>,
) -> ApiResult<Json<BoardUpdateResponse>> {
    if req.title.is_none() {
        return Err(ApiError::invalid_field("title", "This field is required."));
    }

    apply_board_update(state, auth, board_id, req).await
}

pub async fn patch_board(
    state: State<AppState>,
    auth: AuthContext,
    board_id: Path<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateBoardRequest>,
) -> ApiResult<Json<BoardUpdateResponse>> {
    apply_board_update(state, auth, board_id, req).await
}

async fn apply_board_update(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(board_id): Path<Uuid>,
    req: UpdateBoardRequest,
) -> ApiResult<Json<BoardUpdateResponse>> {
    let access = load_board_access(&state.db, board_id).await?;
    require_board_access(auth.user_id, &access)?;

    let title = req.title.map(|t| t.trim().to_string());
    if title.as_deref().is_some_and(str::is_empty) {
        return Err(ApiError::invalid_field("title", "This field may not be blank."));
    }

    if let Some(members) = &req.members {
        ensure_members_exist(&state.db, members).await?;
    }

    let mut tx = state.db.begin().await?;

    let board = Board::update(
        &mut tx,
        board_id,
        UpdateBoard {
            title,
            member_ids: req.members,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Board not found".to_string()))?;

    tx.commit().await?;

    info!(user_id = %auth.user_id, board_id = %board_id, "Board updated");

    Ok(Json(BoardUpdateResponse {
        id: board.id,
        title: board.title,
        owner_data: owner_detail(&state.db, board.owner_id).await?,
        members_data: member_details(&state.db, board_id).await?,
    }))
}

pub async fn delete_board(
    State(state): State<AppState>,
    auth: AuthContext,
    Path(board_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    let access = load_board_access(&state.db, board_id).await?;

    if let Err(e) = require_board_owner(auth.user_id, &access) {
        warn!(user_id = %auth.user_id, board_id = %board_id, "Board delete denied");
        return Err(e.into());
    }

    Board::delete(&state.db, board_id).await?;

    info!(user_id = %auth.user_id, board_id = %board_id, "Board deleted");

    Ok(StatusCode::NO_CONTENT)
}
