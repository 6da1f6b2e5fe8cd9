/// Middleware for the API server
///
/// - `auth`: bearer authentication for every non-public route
/// - `task_scope`: resolves the task in `/tasks/:task_id/comments/...` once
///   and checks comment access before the handler runs

pub mod auth;
pub mod task_scope;
