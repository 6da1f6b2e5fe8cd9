/// API route handlers, organized by resource:
///
/// - `health`: health check
/// - `auth`: registration, login and email lookup
/// - `boards`: boards with member management and counters
/// - `tasks`: tasks and the assignee/reviewer views
/// - `comments`: comments nested under a task

pub mod auth;
pub mod boards;
pub mod comments;
pub mod health;
pub mod tasks;
