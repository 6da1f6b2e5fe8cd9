//! # KanMind API Server Library
//!
//! HTTP surface of KanMind: boards, tasks and comments scoped by board
//! ownership and membership, plus account endpoints.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Request extractors with JSON rejections
//! - `middleware`: Bearer authentication and task scoping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
