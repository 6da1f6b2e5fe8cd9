/// Database models for KanMind
///
/// Each model owns its table's CRUD queries. Cross-entity list reads with
/// visibility rules and aggregate counts live in [`crate::scope`].
///
/// # Models
///
/// - `user`: accounts and display-name rules
/// - `board`: boards and their member set
/// - `task`: tasks with status/priority enums
/// - `comment`: task comments joined with author names

pub mod board;
pub mod comment;
pub mod task;
pub mod user;
