/// Media host access for post images and avatars
use crate::error::{AppError, Result};
use crate::models::MediaRef;
use async_trait::async_trait;
use dashmap::DashMap;
use s3_utils::S3Operations;
use uuid::Uuid;

/// An image received in a multipart upload
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// File extension for the image types the media host accepts
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        _ => None,
    }
}

fn check_upload(file: &UploadedFile) -> Result<&'static str> {
    if file.bytes.is_empty() {
        return Err(AppError::BadRequest("uploaded file is empty".to_string()));
    }

    image_extension(&file.content_type).ok_or_else(|| {
        AppError::BadRequest(format!(
            "unsupported media type '{}', expected jpeg, png, gif or webp",
            file.content_type
        ))
    })
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Store `file` under a fresh key owned by `owner`
    async fn upload(&self, owner: Uuid, file: UploadedFile) -> Result<MediaRef>;

    async fn delete(&self, key: &str) -> Result<()>;
}

/// Delete `key`, logging instead of failing. Used after the record that
/// referenced the object has already changed.
pub async fn delete_quietly(media: &dyn MediaStore, key: &str) {
    if let Err(e) = media.delete(key).await {
        tracing::warn!(key = %key, error = %e, "Failed to delete media object");
    }
}

/// S3-compatible media host
#[derive(Clone)]
pub struct S3MediaStore {
    ops: S3Operations,
}

impl S3MediaStore {
    pub fn new(ops: S3Operations) -> Self {
        Self { ops }
    }
}

#[async_trait]
impl MediaStore for S3MediaStore {
    async fn upload(&self, owner: Uuid, file: UploadedFile) -> Result<MediaRef> {
        let extension = check_upload(&file)?;
        let key = self.ops.config().object_key(
            &owner.to_string(),
            &Uuid::new_v4().to_string(),
            extension,
        );

        let url = self
            .ops
            .put_object(&key, file.bytes, &file.content_type)
            .await?;

        tracing::info!(owner = %owner, key = %key, "Uploaded media");
        Ok(MediaRef { key, url })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.ops.delete_object(key).await?;
        Ok(())
    }
}

/// Media host kept in process memory (`MEDIA_BACKEND=memory`)
#[derive(Debug, Default)]
pub struct InMemoryMediaStore {
    objects: DashMap<String, (String, Vec<u8>)>,
}

impl InMemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(&self, owner: Uuid, file: UploadedFile) -> Result<MediaRef> {
        let extension = check_upload(&file)?;
        let key = format!("uploads/{owner}/{}.{extension}", Uuid::new_v4());
        let url = format!("memory://{key}");

        self.objects
            .insert(key.clone(), (file.content_type, file.bytes));
        Ok(MediaRef { key, url })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.objects.remove(key);
        Ok(())
    }
}
