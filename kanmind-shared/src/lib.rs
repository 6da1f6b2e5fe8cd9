//! # KanMind Shared Library
//!
//! Types, persistence and authorization rules used by the KanMind API
//! server.
//!
//! ## Module Organization
//!
//! - `auth`: password hashing, bearer tokens, auth context and the
//!   board/task/comment permission predicates
//! - `db`: connection pool and embedded migrations
//! - `models`: users, boards, tasks and comments with their queries
//! - `scope`: visibility-scoped list reads with aggregate counters

pub mod auth;
pub mod db;
pub mod models;
pub mod scope;

/// Current version of the KanMind shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
