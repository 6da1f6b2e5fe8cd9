//! Visibility-scoped list queries
//!
//! Every list endpoint reads through here. A board is visible to its owner
//! and its members; a task is visible when its board is. The assignee and
//! reviewer views are equality filters on purpose and ignore board
//! visibility.
//!
//! Counters are computed in the same statement as the rows they annotate
//! (`COUNT … GROUP BY` / `COUNT(*) FILTER`), never per row.

use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::models::{comment::Comment, task::TaskWithCounts};

/// Board row with its live counters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct BoardSummary {
    pub id: Uuid,
    pub title: String,
    pub owner_id: Uuid,
    pub member_count: i64,
    pub ticket_count: i64,
    pub tasks_to_do_count: i64,
    pub tasks_high_prio_count: i64,
}

/// Builds the summary query over the boards matched by `filter`
///
/// `filter` is a WHERE clause over `boards b` using `$1`.
fn board_summary_sql(filter: &str) -> String {
    format!(
        r#"
        WITH visible AS (
            SELECT b.id, b.title, b.owner_id, b.created_at
            FROM boards b
            WHERE {filter}
        ),
        member_counts AS (
            SELECT bm.board_id, COUNT(*) AS member_count
            FROM board_members bm
            JOIN visible v ON v.id = bm.board_id
            GROUP BY bm.board_id
        ),
        task_counts AS (
            SELECT t.board_id,
                   COUNT(*) AS ticket_count,
                   COUNT(*) FILTER (WHERE t.status = 'to-do') AS tasks_to_do_count,
                   COUNT(*) FILTER (WHERE t.priority = 'high') AS tasks_high_prio_count
            FROM tasks t
            JOIN visible v ON v.id = t.board_id
            GROUP BY t.board_id
        )
        SELECT v.id, v.title, v.owner_id,
               COALESCE(mc.member_count, 0) AS member_count,
               COALESCE(tc.ticket_count, 0) AS ticket_count,
               COALESCE(tc.tasks_to_do_count, 0) AS tasks_to_do_count,
               COALESCE(tc.tasks_high_prio_count, 0) AS tasks_high_prio_count
        FROM visible v
        LEFT JOIN member_counts mc ON mc.board_id = v.id
        LEFT JOIN task_counts tc ON tc.board_id = v.id
        ORDER BY v.created_at, v.id
        "#
    )
}

/// Builds the annotated task query over the tasks matched by `filter`
///
/// `filter` is a WHERE clause over `tasks t` using `$1`.
fn task_sql(filter: &str) -> String {
    format!(
        r#"
        SELECT t.id, t.board_id, t.title, t.description, t.status, t.priority, t.due_date,
               t.created_by, t.assignee_id, t.reviewer_id, t.created_at, t.updated_at,
               COUNT(c.id) AS comments_count
        FROM tasks t
        LEFT JOIN comments c ON c.task_id = t.id
        WHERE {filter}
        GROUP BY t.id
        ORDER BY t.created_at, t.id
        "#
    )
}

// EXISTS keeps a board that the user both owns and is a member of to one row.
const VISIBLE_BOARD: &str = "b.owner_id = $1 \
     OR EXISTS (SELECT 1 FROM board_members bm WHERE bm.board_id = b.id AND bm.user_id = $1)";

/// Boards owned by or shared with `user_id`, with counters
pub async fn visible_boards(pool: &PgPool, user_id: Uuid) -> Result<Vec<BoardSummary>, sqlx::Error> {
    sqlx::query_as::<_, BoardSummary>(&board_summary_sql(VISIBLE_BOARD))
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Counters for a single board, regardless of who asks
pub async fn board_summary<'e, E>(executor: E, board_id: Uuid) -> Result<Option<BoardSummary>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, BoardSummary>(&board_summary_sql("b.id = $1"))
        .bind(board_id)
        .fetch_optional(executor)
        .await
}

/// Tasks on boards visible to `user_id`
pub async fn visible_tasks(pool: &PgPool, user_id: Uuid) -> Result<Vec<TaskWithCounts>, sqlx::Error> {
    let filter = format!(
        "EXISTS (SELECT 1 FROM boards b WHERE b.id = t.board_id AND ({VISIBLE_BOARD}))"
    );

    sqlx::query_as::<_, TaskWithCounts>(&task_sql(&filter))
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Tasks assigned to `user_id`, on any board
pub async fn tasks_assigned_to(pool: &PgPool, user_id: Uuid) -> Result<Vec<TaskWithCounts>, sqlx::Error> {
    sqlx::query_as::<_, TaskWithCounts>(&task_sql("t.assignee_id = $1"))
        .bind(user_id)
        .fetch_all(pool)
        .await
}

/// Tasks `user_id` reviews, on any board
pub async fn tasks_reviewing(pool: &PgPool, user_id: Uuid) -> Result<Vec<TaskWithCounts>, sqlx::Error> {
    sqlx::query_as::<_, TaskWithCounts>(&task_sql("t.reviewer_id = $1"))
        .bind(user_id)
        .fetch_all(pool)
        .await
}

pub async fn tasks_on_board(pool: &PgPool, board_id: Uuid) -> Result<Vec<TaskWithCounts>, sqlx::Error> {
    sqlx::query_as::<_, TaskWithCounts>(&task_sql("t.board_id = $1"))
        .bind(board_id)
        .fetch_all(pool)
        .await
}

/// Re-reads one task through the annotated path
pub async fn task_with_counts<'e, E>(executor: E, task_id: Uuid) -> Result<Option<TaskWithCounts>, sqlx::Error>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, TaskWithCounts>(&task_sql("t.id = $1"))
        .bind(task_id)
        .fetch_optional(executor)
        .await
}

/// Comments on a task, oldest first
pub async fn comments_of(pool: &PgPool, task_id: Uuid) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT c.id, c.task_id, c.author_id, c.content, c.created_at,
               u.username AS author_username,
               u.first_name AS author_first_name,
               u.last_name AS author_last_name
        FROM comments c
        JOIN users u ON u.id = c.author_id
        WHERE c.task_id = $1
        ORDER BY c.created_at, c.id
        "#,
    )
    .bind(task_id)
    .fetch_all(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_summary_sql_embeds_filter_once() {
        let sql = board_summary_sql("b.id = $1");
        assert_eq!(sql.matches("b.id = $1").count(), 1);
        assert!(sql.contains("FILTER (WHERE t.status = 'to-do')"));
    }

    #[test]
    fn test_task_sql_groups_for_comment_count() {
        let sql = task_sql("t.assignee_id = $1");
        assert!(sql.contains("LEFT JOIN comments"));
        assert!(sql.contains("GROUP BY t.id"));
        assert!(sql.contains("WHERE t.assignee_id = $1"));
    }
}
