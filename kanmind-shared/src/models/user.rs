/// User model and database operations
///
/// Users are the identities every board, task and comment hangs off. The
/// login handle (`username`) is the email address a user registered with.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(150) NOT NULL UNIQUE,
///     email VARCHAR(254) NOT NULL,
///     first_name VARCHAR(150) NOT NULL DEFAULT '',
///     last_name VARCHAR(150) NOT NULL DEFAULT '',
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX users_email_lower_idx ON users (LOWER(email));
/// ```
///
/// # Example
///
/// ```no_run
/// use kanmind_shared::models::user::{CreateUser, User};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), sqlx::Error> {
/// let user = User::create(&pool, CreateUser::from_fullname(
///     "ada@example.com",
///     "Ada Lovelace",
///     "$argon2id$...".to_string(),
/// )).await?;
///
/// assert_eq!(user.display_name(), "Ada Lovelace");
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Login handle
    pub username: String,

    /// Email address (unique, compared case-insensitively)
    pub email: String,

    /// Given name, empty when unknown
    pub first_name: String,

    /// Family name, empty when unknown
    pub last_name: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
}

impl CreateUser {
    /// Builds a user whose login handle is the email address, splitting the
    /// full name at the first run of whitespace into given and family name.
    pub fn from_fullname(email: &str, fullname: &str, password_hash: String) -> Self {
        let (first_name, last_name) = split_fullname(fullname);

        Self {
            username: email.to_string(),
            email: email.to_string(),
            first_name,
            last_name,
            password_hash,
        }
    }
}

/// Splits "Ada King Lovelace" into ("Ada", "King Lovelace")
pub fn split_fullname(fullname: &str) -> (String, String) {
    let trimmed = fullname.trim();

    match trimmed.split_once(char::is_whitespace) {
        Some((first, rest)) => (first.to_string(), rest.trim().to_string()),
        None => (trimmed.to_string(), String::new()),
    }
}

/// Compact user shape embedded in task payloads (assignee/reviewer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
}

/// User shape embedded in board payloads (owner/members)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDetail {
    pub id: Uuid,
    pub email: String,
    pub fullname: String,
}

impl User {
    /// "First Last" with surrounding whitespace removed
    pub fn full_name(&self) -> String {
        full_name(&self.first_name, &self.last_name)
    }

    /// Name shown as a comment author
    ///
    /// Both given and family name must be present; otherwise the login
    /// handle is used.
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.last_name, &self.username)
    }

    pub fn detail(&self) -> UserDetail {
        UserDetail {
            id: self.id,
            email: self.email.clone(),
            fullname: self.full_name(),
        }
    }

    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the username or email is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, username, email, first_name, last_name, password_hash,
                      created_at, updated_at
            "#,
        )
        .bind(data.username)
        .bind(data.email)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.password_hash)
        .fetch_one(pool)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash,
                   created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn exists(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
            .bind(id)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by email address, ignoring case
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, first_name, last_name, password_hash,
                   created_at, updated_at
            FROM users
            WHERE LOWER(email) = LOWER($1)
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await
    }

    /// Checks whether an email address is already registered
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1))")
            .bind(email)
            .fetch_one(pool)
            .await
    }

    /// Batched summary lookup keyed by user ID (used to embed assignees and
    /// reviewers without a query per task)
    pub async fn summaries(
        pool: &PgPool,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, UserSummary>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, username, first_name, last_name
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|u| (u.id, u)).collect())
    }

    /// Returns the IDs in `ids` that don't belong to any user
    pub async fn missing_ids(pool: &PgPool, ids: &[Uuid]) -> Result<Vec<Uuid>, sqlx::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_scalar(
            r#"
            SELECT requested.id
            FROM UNNEST($1::uuid[]) AS requested(id)
            WHERE NOT EXISTS (SELECT 1 FROM users u WHERE u.id = requested.id)
            "#,
        )
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    /// Deletes a user
    ///
    /// Owned boards and authored comments cascade; tasks keep existing with
    /// `created_by`/`assignee_id`/`reviewer_id` set to NULL.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// "First Last" with surrounding whitespace removed
/// Whether `err` is a unique-index violation on insert, i.e. the email (or
/// the username derived from it) is already taken
pub fn is_duplicate_email(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => db.code().as_deref() == Some("23505"),
        _ => false,
    }
}

pub fn full_name(first_name: &str, last_name: &str) -> String {
    format!("{} {}", first_name, last_name).trim().to_string()
}

/// Author label: "First Last" when both names are set, else the login handle
pub fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
    let first = first_name.trim();
    let last = last_name.trim();

    if !first.is_empty() && !last.is_empty() {
        format!("{} {}", first, last)
    } else {
        username.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(first: &str, last: &str) -> User {
        User {
            id: Uuid::new_v4(),
            username: "ada@example.com".to_string(),
            email: "ada@example.com".to_string(),
            first_name: first.to_string(),
            last_name: last.to_string(),
            password_hash: "hash".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_uses_both_names() {
        assert_eq!(user("Ada", "Lovelace").display_name(), "Ada Lovelace");
    }

    #[test]
    fn test_display_name_falls_back_to_username() {
        assert_eq!(user("", "").display_name(), "ada@example.com");
        assert_eq!(user("Ada", "").display_name(), "ada@example.com");
        assert_eq!(user("", "Lovelace").display_name(), "ada@example.com");
        assert_eq!(user("  ", "Lovelace").display_name(), "ada@example.com");
    }

    #[test]
    fn test_full_name_trims() {
        assert_eq!(user("Ada", "").full_name(), "Ada");
        assert_eq!(user("", "").full_name(), "");
        assert_eq!(user("Ada", "Lovelace").full_name(), "Ada Lovelace");
    }

    #[test]
    fn test_split_fullname() {
        assert_eq!(
            split_fullname("Ada Lovelace"),
            ("Ada".to_string(), "Lovelace".to_string())
        );
        assert_eq!(
            split_fullname("  Ada   King Lovelace "),
            ("Ada".to_string(), "King Lovelace".to_string())
        );
        assert_eq!(split_fullname("Ada"), ("Ada".to_string(), String::new()));
    }

    #[test]
    fn test_create_user_from_fullname() {
        let data = CreateUser::from_fullname("ada@example.com", "Ada Lovelace", "h".to_string());
        assert_eq!(data.username, "ada@example.com");
        assert_eq!(data.email, "ada@example.com");
        assert_eq!(data.first_name, "Ada");
        assert_eq!(data.last_name, "Lovelace");
    }

    #[test]
    fn test_is_duplicate_email_ignores_other_errors() {
        assert!(!is_duplicate_email(&sqlx::Error::RowNotFound));
        assert!(!is_duplicate_email(&sqlx::Error::PoolTimedOut));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_string(&user("Ada", "Lovelace")).unwrap();
        assert!(!json.contains("password_hash"));
    }
}
