/// Buffered reading of `multipart/form-data` bodies
use crate::error::{AppError, Result};
use crate::services::UploadedFile;
use actix_multipart::Multipart;
use actix_web::http::header::{ContentDisposition, CONTENT_DISPOSITION};
use futures_util::StreamExt;
use std::collections::HashMap;

/// Text fields are small (post content, email); anything larger is rejected
const MAX_TEXT_FIELD_BYTES: usize = 64 * 1024;

/// Per-request upload limit, registered as app data
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    pub max_file_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Default)]
pub struct MultipartForm {
    texts: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl MultipartForm {
    pub fn take_text(&mut self, name: &str) -> Option<String> {
        self.texts.remove(name)
    }

    pub fn take_file(&mut self, name: &str) -> Option<UploadedFile> {
        self.files.remove(name)
    }
}

fn malformed(e: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("invalid multipart payload: {e}"))
}

/// Read every part of `payload`. Parts named in `file_fields` are kept as
/// files (bounded by `limits`); every other part is read as UTF-8 text.
pub async fn read_form(
    mut payload: Multipart,
    file_fields: &[&str],
    limits: UploadLimits,
) -> Result<MultipartForm> {
    let mut form = MultipartForm::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(malformed)?;

        let disposition = field
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|value| ContentDisposition::from_raw(value).ok());
        let (name, filename) = match &disposition {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(str::to_string),
            ),
            None => (String::new(), None),
        };
        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

        let is_file = file_fields.contains(&name.as_str());
        let limit = if is_file {
            limits.max_file_bytes
        } else {
            MAX_TEXT_FIELD_BYTES
        };

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(malformed)?;
            if bytes.len() + chunk.len() > limit {
                return Err(AppError::PayloadTooLarge(format!(
                    "field '{name}' exceeds {limit} bytes"
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        if is_file {
            // Browsers send an empty part when no file was chosen
            if bytes.is_empty() && filename.as_deref().unwrap_or_default().is_empty() {
                continue;
            }
            tracing::debug!(field = %name, size = bytes.len(), content_type = %content_type, "Received file part");
            form.files.insert(
                name,
                UploadedFile {
                    filename,
                    content_type,
                    bytes,
                },
            );
        } else if !name.is_empty() {
            let text = String::from_utf8(bytes)
                .map_err(|_| AppError::BadRequest(format!("field '{name}' is not valid UTF-8")))?;
            form.texts.insert(name, text);
        }
    }

    Ok(form)
}
