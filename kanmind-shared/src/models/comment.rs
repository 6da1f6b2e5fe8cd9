/// Comment model and database operations
///
/// Comments belong to a task and an author. Reads always come back joined
/// with the author's name fields so the display label can be rendered
/// without another query.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     task_id UUID NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
///     author_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     content TEXT NOT NULL CHECK (content <> ''),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;
use uuid::Uuid;

use super::user::display_name;
use crate::auth::authorization::CommentAccess;

/// Comment joined with its author's name fields
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_username: String,
    pub author_first_name: String,
    pub author_last_name: String,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub task_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
}

impl Comment {
    /// Author label: "First Last" when both names are set, else the login
    /// handle
    pub fn author_name(&self) -> String {
        display_name(
            &self.author_first_name,
            &self.author_last_name,
            &self.author_username,
        )
    }

    pub fn access(&self) -> CommentAccess {
        CommentAccess {
            comment_id: self.id,
            author_id: self.author_id,
        }
    }

    pub async fn create<'e, E>(executor: E, data: CreateComment) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (task_id, author_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, task_id, author_id, content, created_at
            )
            SELECT i.id, i.task_id, i.author_id, i.content, i.created_at,
                   u.username AS author_username,
                   u.first_name AS author_first_name,
                   u.last_name AS author_last_name
            FROM inserted i
            JOIN users u ON u.id = i.author_id
            "#,
        )
        .bind(data.task_id)
        .bind(data.author_id)
        .bind(data.content)
        .fetch_one(executor)
        .await
    }

    /// Finds a comment by ID, only if it belongs to `task_id`
    pub async fn find_in_task<'e, E>(
        executor: E,
        task_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.task_id, c.author_id, c.content, c.created_at,
                   u.username AS author_username,
                   u.first_name AS author_first_name,
                   u.last_name AS author_last_name
            FROM comments c
            JOIN users u ON u.id = c.author_id
            WHERE c.task_id = $1 AND c.id = $2
            "#,
        )
        .bind(task_id)
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Replaces the content; `created_at` and authorship never change
    pub async fn update_content<'e, E>(
        executor: E,
        id: Uuid,
        content: &str,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH updated AS (
                UPDATE comments
                SET content = $2
                WHERE id = $1
                RETURNING id, task_id, author_id, content, created_at
            )
            SELECT c.id, c.task_id, c.author_id, c.content, c.created_at,
                   u.username AS author_username,
                   u.first_name AS author_first_name,
                   u.last_name AS author_last_name
            FROM updated c
            JOIN users u ON u.id = c.author_id
            "#,
        )
        .bind(id)
        .bind(content)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
