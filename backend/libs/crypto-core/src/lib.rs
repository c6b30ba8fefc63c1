//! Session-layer primitives shared by the post service
//!
//! - `jwt`: RS256 access tokens and the `IdentityResolver` seam
//! - `password`: Argon2id password hashing

pub mod jwt;
pub mod password;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use jwt::{AuthError, Claims, IdentityResolver, JwtError, JwtKeys, TokenResponse};
