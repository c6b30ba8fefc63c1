//! # Actix Middleware Library
//!
//! Middleware shared by the post service's HTTP surface.
//!
//! ## Modules
//! - `jwt_auth`: bearer-token authentication and the `UserId` extractor

pub mod jwt_auth;

pub use jwt_auth::{JwtAuthMiddleware, UserId};
