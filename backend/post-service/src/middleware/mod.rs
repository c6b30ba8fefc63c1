/// Request guards for post-service
pub mod permissions;

pub use actix_middleware::{JwtAuthMiddleware, UserId};
pub use permissions::check_post_ownership;
