/// S3 client for the post service's media host
///
/// Stores uploaded images (post media, user avatars) in a single bucket and
/// hands back public URLs for them.
pub mod config;
pub mod operations;

pub use config::S3Config;
pub use operations::S3Operations;

#[derive(Debug, thiserror::Error)]
pub enum S3Error {
    #[error("invalid S3 configuration: {0}")]
    Config(String),

    #[error("S3 request failed: {0}")]
    Request(String),
}
