/// Task model and database operations
///
/// A task is a unit of work on exactly one board. The board is fixed at
/// creation; there is no operation that moves a task to another board.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('to-do', 'in-progress', 'review', 'done');
/// CREATE TYPE task_priority AS ENUM ('low', 'medium', 'high');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     status task_status NOT NULL DEFAULT 'to-do',
///     priority task_priority NOT NULL DEFAULT 'medium',
///     due_date DATE,
///     created_by UUID REFERENCES users(id) ON DELETE SET NULL,
///     assignee_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     reviewer_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Comment counts are never stored; see [`crate::scope`] for the annotated
/// read path.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::auth::authorization::{BoardAccess, TaskAccess};

/// Workflow column of a task
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    #[default]
    ToDo,
    InProgress,
    Review,
    Done,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Task row
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,

    /// Owning board (immutable)
    pub board_id: Uuid,

    pub title: String,

    /// Free text, empty by default
    pub description: String,

    pub status: TaskStatus,

    pub priority: TaskPriority,

    pub due_date: Option<NaiveDate>,

    /// Creator; NULL once that user is deleted
    pub created_by: Option<Uuid>,

    pub assignee_id: Option<Uuid>,

    pub reviewer_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Task row annotated with its live comment count
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TaskWithCounts {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub task: Task,

    pub comments_count: i64,
}

/// Input for creating a new task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub board_id: Uuid,
    pub created_by: Uuid,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub due_date: Option<NaiveDate>,
    pub assignee_id: Option<Uuid>,
    pub reviewer_id: Option<Uuid>,
}

/// Changes to apply to a task
///
/// `None` leaves a column untouched. For the nullable columns the inner
/// `Option` is the new value, so `Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub assignee_id: Option<Option<Uuid>>,
    pub reviewer_id: Option<Option<Uuid>>,
}

impl UpdateTask {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.assignee_id.is_none()
            && self.reviewer_id.is_none()
    }
}

const TASK_COLUMNS: &str = "id, board_id, title, description, status, priority, due_date, \
     created_by, assignee_id, reviewer_id, created_at, updated_at";

impl Task {
    /// Inserts a task
    ///
    /// Takes any executor so board validation, insert and the annotated
    /// re-read can share one transaction.
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!(
            r#"
            INSERT INTO tasks (board_id, created_by, title, description, status, priority,
                               due_date, assignee_id, reviewer_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {TASK_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Task>(&sql)
            .bind(data.board_id)
            .bind(data.created_by)
            .bind(data.title)
            .bind(data.description)
            .bind(data.status)
            .bind(data.priority)
            .bind(data.due_date)
            .bind(data.assignee_id)
            .bind(data.reviewer_id)
            .fetch_one(executor)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");

        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Loads the task's creator together with its board's current owner and
    /// members, in one round trip
    pub async fn load_access<'e, E>(executor: E, id: Uuid) -> Result<Option<TaskAccess>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let row = sqlx::query_as::<_, (Uuid, Option<Uuid>, Uuid, Uuid, Vec<Uuid>)>(
            r#"
            SELECT t.id, t.created_by, b.id, b.owner_id,
                   ARRAY(SELECT bm.user_id FROM board_members bm WHERE bm.board_id = b.id)
            FROM tasks t
            JOIN boards b ON b.id = t.board_id
            WHERE t.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(row.map(|(task_id, created_by, board_id, owner_id, member_ids)| TaskAccess {
            task_id,
            created_by,
            board: BoardAccess {
                board_id,
                owner_id,
                member_ids,
            },
        }))
    }

    /// Applies the set fields of `data` and bumps `updated_at`
    ///
    /// Returns `None` if the task doesn't exist. The board column is never
    /// written.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = NOW()");

        if let Some(title) = data.title {
            query.push(", title = ").push_bind(title);
        }
        if let Some(description) = data.description {
            query.push(", description = ").push_bind(description);
        }
        if let Some(status) = data.status {
            query.push(", status = ").push_bind(status);
        }
        if let Some(priority) = data.priority {
            query.push(", priority = ").push_bind(priority);
        }
        if let Some(due_date) = data.due_date {
            query.push(", due_date = ").push_bind(due_date);
        }
        if let Some(assignee_id) = data.assignee_id {
            query.push(", assignee_id = ").push_bind(assignee_id);
        }
        if let Some(reviewer_id) = data.reviewer_id {
            query.push(", reviewer_id = ").push_bind(reviewer_id);
        }

        query.push(" WHERE id = ").push_bind(id);
        query.push(" RETURNING ").push(TASK_COLUMNS);

        query.build_query_as::<Task>().fetch_optional(executor).await
    }

    /// Deletes a task; its comments cascade
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_wire_format() {
        assert_eq!(serde_json::to_value(TaskStatus::ToDo).unwrap(), json!("to-do"));
        assert_eq!(
            serde_json::to_value(TaskStatus::InProgress).unwrap(),
            json!("in-progress")
        );
        assert_eq!(
            serde_json::from_value::<TaskStatus>(json!("review")).unwrap(),
            TaskStatus::Review
        );
        assert!(serde_json::from_value::<TaskStatus>(json!("todo")).is_err());
    }

    #[test]
    fn test_priority_wire_format() {
        assert_eq!(serde_json::to_value(TaskPriority::High).unwrap(), json!("high"));
        assert_eq!(
            serde_json::from_value::<TaskPriority>(json!("low")).unwrap(),
            TaskPriority::Low
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::ToDo);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_update_task_is_empty() {
        assert!(UpdateTask::default().is_empty());

        let clear_due = UpdateTask {
            due_date: Some(None),
            ..Default::default()
        };
        assert!(!clear_due.is_empty());
    }

    #[test]
    fn test_task_with_counts_serializes_flat() {
        let now = Utc::now();
        let row = TaskWithCounts {
            task: Task {
                id: Uuid::new_v4(),
                board_id: Uuid::new_v4(),
                title: "Fix bug".to_string(),
                description: String::new(),
                status: TaskStatus::ToDo,
                priority: TaskPriority::High,
                due_date: None,
                created_by: None,
                assignee_id: None,
                reviewer_id: None,
                created_at: now,
                updated_at: now,
            },
            comments_count: 2,
        };

        let value = serde_json::to_value(&row).unwrap();
        assert_eq!(value["title"], "Fix bug");
        assert_eq!(value["comments_count"], 2);
        assert!(value.get("task").is_none());
    }
}
