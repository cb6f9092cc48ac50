use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::error::DomainError;

/// Author stored when the form leaves the field out.
pub const DEFAULT_AUTHOR: &str = "N/A";

/// Width of the `cover_image_url` column.
pub const MAX_COVER_URL_LEN: usize = 200;

const MAX_TITLE_CHARS: usize = 100;
const MAX_AUTHOR_CHARS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub author: String,
    pub date_posted: DateTime<Utc>,
    pub cover_image_url: Option<String>,
}

/// Fields of a post about to be inserted. `id` and `date_posted` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub author: String,
    pub cover_image_url: Option<String>,
}

/// Replacement values applied by an edit. `cover_image_url: None` keeps the current image.
#[derive(Debug, Clone)]
pub struct PostChanges {
    pub title: String,
    pub content: String,
    pub author: String,
    pub cover_image_url: Option<String>,
}

/// An uploaded cover image as received from the form.
#[derive(Debug, Clone)]
pub struct CoverImage {
    pub file_name: String,
    pub content_type: String,
    pub body: bytes::Bytes,
}

/// A create or edit submission that passed validation.
#[derive(Debug, Clone)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub author: String,
    pub cover_image: Option<CoverImage>,
}

impl PostInput {
    pub fn new(
        title: String,
        content: String,
        author: Option<String>,
        cover_image: Option<CoverImage>,
    ) -> Result<Self, DomainError> {
        if title.trim().is_empty() {
            return Err(DomainError::InvalidInput("title must not be empty".into()));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(DomainError::InvalidInput(format!(
                "title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }
        if content.trim().is_empty() {
            return Err(DomainError::InvalidInput("content must not be empty".into()));
        }

        let author = match author {
            Some(author) if !author.trim().is_empty() => author,
            _ => DEFAULT_AUTHOR.to_string(),
        };
        if author.chars().count() > MAX_AUTHOR_CHARS {
            return Err(DomainError::InvalidInput(format!(
                "author must be at most {} characters",
                MAX_AUTHOR_CHARS
            )));
        }

        Ok(Self {
            title,
            content,
            author,
            cover_image,
        })
    }
}
