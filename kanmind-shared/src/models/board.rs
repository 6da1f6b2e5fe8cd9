/// Board model and database operations
///
/// A board has exactly one owner and any number of members. Ownership and
/// membership are stored separately: the owner is added to `board_members`
/// on creation, but a later member replacement may drop them without
/// affecting their owner rights.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE board_members (
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     PRIMARY KEY (board_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::board::{Board, CreateBoard};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(pool: PgPool, owner: Uuid) -> Result<(), sqlx::Error> {
/// let mut tx = pool.begin().await?;
/// let board = Board::create(&mut tx, CreateBoard {
///     title: "Sprint 1".to_string(),
///     owner_id: owner,
///     member_ids: vec![],
/// }).await?;
/// tx.commit().await?;
///
/// let access = Board::load_access(&pool, board.id).await?.unwrap();
/// assert_eq!(access.member_ids, vec![owner]);
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

use super::user::User;
use crate::auth::authorization::BoardAccess;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Board {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new board
#[derive(Debug, Clone)]
pub struct CreateBoard {
    pub title: String,
    pub owner_id: Uuid,

    /// Requested members; the owner is always added on top
    pub member_ids: Vec<Uuid>,
}

/// Changes to a board's mutable fields
#[derive(Debug, Clone, Default)]
pub struct UpdateBoard {
    pub title: Option<String>,

    /// Full replacement of the member set when present
    pub member_ids: Option<Vec<Uuid>>,
}

impl Board {
    /// Inserts the board and its initial member set
    ///
    /// Both statements run on `conn`; pass a transaction so a failure in
    /// the second leaves no half-created board behind.
    pub async fn create(conn: &mut PgConnection, data: CreateBoard) -> Result<Self, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (title, owner_id)
            VALUES ($1, $2)
            RETURNING id, title, owner_id, created_at, updated_at
            "#,
        )
        .bind(data.title)
        .bind(data.owner_id)
        .fetch_one(&mut *conn)
        .await?;

        let mut member_ids = data.member_ids;
        member_ids.push(data.owner_id);
        Self::add_members(&mut *conn, board.id, &member_ids).await?;

        Ok(board)
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Board>(
            r#"
            SELECT id, title, owner_id, created_at, updated_at
            FROM boards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Current owner and member IDs of a board
    pub async fn load_access<'e, E>(executor: E, id: Uuid) -> Result<Option<BoardAccess>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, BoardAccess>(
            r#"
            SELECT b.id AS board_id, b.owner_id,
                   ARRAY(SELECT bm.user_id FROM board_members bm WHERE bm.board_id = b.id)
                       AS member_ids
            FROM boards b
            WHERE b.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Updates title and/or replaces the member set
    ///
    /// Returns `None` if the board doesn't exist.
    pub async fn update(
        conn: &mut PgConnection,
        id: Uuid,
        data: UpdateBoard,
    ) -> Result<Option<Self>, sqlx::Error> {
        let board = sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET title = COALESCE($2, title), updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.title)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(board) = board else {
            return Ok(None);
        };

        if let Some(member_ids) = data.member_ids {
            sqlx::query("DELETE FROM board_members WHERE board_id = $1")
                .bind(id)
                .execute(&mut *conn)
                .await?;

            Self::add_members(&mut *conn, id, &member_ids).await?;
        }

        Ok(Some(board))
    }

    /// Adds users to a board, ignoring ones already present
    pub async fn add_members<'e, E>(
        executor: E,
        board_id: Uuid,
        user_ids: &[Uuid],
    ) -> Result<(), sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        if user_ids.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO board_members (board_id, user_id)
            SELECT $1, member.id FROM UNNEST($2::uuid[]) AS member(id)
            ON CONFLICT (board_id, user_id) DO NOTHING
            "#,
        )
        .bind(board_id)
        .bind(user_ids)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Members of a board as full user records, oldest account first
    pub async fn members<'e, E>(executor: E, board_id: Uuid) -> Result<Vec<User>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
                   u.created_at, u.updated_at
            FROM board_members bm
            JOIN users u ON u.id = bm.user_id
            WHERE bm.board_id = $1
            ORDER BY u.created_at, u.id
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await
    }

    /// Deletes a board; tasks and their comments cascade in the database
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
