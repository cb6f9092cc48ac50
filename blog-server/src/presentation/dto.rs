use crate::domain::error::DomainError;
use crate::domain::post::{CoverImage, PostInput};
use actix_multipart::form::{MultipartForm, tempfile::TempFile, text::Text};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Raw multipart submission shared by the create and edit forms.
#[derive(Debug, MultipartForm)]
pub struct PostForm {
    pub title: Text<String>,
    pub content: Text<String>,
    pub author: Option<Text<String>>,
    pub cover_image: Option<TempFile>,
}

impl PostForm {
    pub async fn into_input(self) -> Result<PostInput, DomainError> {
        let cover_image = match self.cover_image {
            Some(file) => read_cover(file).await?,
            None => None,
        };

        PostInput::new(
            self.title.into_inner(),
            self.content.into_inner(),
            self.author.map(Text::into_inner),
            cover_image,
        )
    }
}

/// Browsers send an empty, unnamed file part when no file was chosen; that is "no image".
async fn read_cover(file: TempFile) -> Result<Option<CoverImage>, DomainError> {
    let file_name = match file.file_name.as_deref() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Ok(None),
    };
    if file.size == 0 {
        return Ok(None);
    }

    let content_type = file
        .content_type
        .as_ref()
        .map(|mime| mime.to_string())
        .unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
    let body = tokio::fs::read(file.file.path())
        .await
        .map_err(|e| DomainError::Internal(format!("failed to read upload: {}", e)))?;

    Ok(Some(CoverImage {
        file_name,
        content_type,
        body: Bytes::from(body),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
}
