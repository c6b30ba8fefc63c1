/// Post Service
///
/// Social posting backend: accounts with JWT sessions, text/image posts and
/// like/dislike reactions recorded through a pure toggle engine and saved
/// with optimistic locking.
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod openapi;
pub mod services;

pub use config::Config;
pub use error::{AppError, Result};
