use axum::extract::Multipart;
use std::path::Path;

use crate::handlers::ApiError;

/// What an upload endpoint accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Image,
    Document,
}

impl UploadKind {
    fn allowed_extensions(&self) -> &'static [&'static str] {
        match self {
            UploadKind::Image => &["jpg", "jpeg", "png", "gif", "webp"],
            UploadKind::Document => &["jpg", "jpeg", "png", "webp", "pdf"],
        }
    }

    fn rejection(&self) -> &'static str {
        match self {
            UploadKind::Image => "Only image files are allowed",
            UploadKind::Document => "Only image or PDF files are allowed",
        }
    }
}

/// Lower-cased extension of an uploaded file name, if it is an accepted one
pub fn accepted_extension(file_name: &str, kind: UploadKind) -> Option<String> {
    let ext = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    kind.allowed_extensions()
        .contains(&ext.as_str())
        .then_some(ext)
}

/// Save the multipart field named `field` under `<uploads_dir>/<subdir>/`
/// with a random file name. Returns the public `/uploads/...` URL.
pub async fn save_upload(
    multipart: &mut Multipart,
    field: &str,
    kind: UploadKind,
    uploads_dir: &str,
    subdir: &str,
) -> Result<String, ApiError> {
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid upload: {}", e)))?
    {
        if part.name() != Some(field) {
            continue;
        }

        let file_name = part.file_name().unwrap_or_default().to_string();
        let ext = accepted_extension(&file_name, kind)
            .ok_or_else(|| ApiError::bad_request(kind.rejection()))?;

        let data = part
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Invalid upload: {}", e)))?;
        if data.is_empty() {
            return Err(ApiError::bad_request("Uploaded file is empty"));
        }

        let dir = Path::new(uploads_dir).join(subdir);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create upload directory: {}", e))?;

        let stored = format!("{}.{}", uuid::Uuid::new_v4(), ext);
        tokio::fs::write(dir.join(&stored), &data)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to write upload: {}", e))?;

        tracing::debug!("Stored upload {}/{} ({} bytes)", subdir, stored, data.len());
        return Ok(format!("/uploads/{}/{}", subdir, stored));
    }

    Err(ApiError::bad_request("No file uploaded"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepted_extension() {
        assert_eq!(accepted_extension("me.JPG", UploadKind::Image).as_deref(), Some("jpg"));
        assert_eq!(accepted_extension("licence.pdf", UploadKind::Document).as_deref(), Some("pdf"));
        assert_eq!(accepted_extension("licence.pdf", UploadKind::Image), None);
        assert_eq!(accepted_extension("script.sh", UploadKind::Document), None);
        assert_eq!(accepted_extension("noext", UploadKind::Image), None);
    }
}
