use std::sync::Arc;

use crate::data::post_repository::PostRepository;
use crate::domain::{
    error::DomainError,
    post::{CoverImage, MAX_COVER_URL_LEN, NewPost, Post, PostChanges, PostInput},
};
use crate::infrastructure::storage::{ImageStore, storage_key};
use tracing::{info, instrument};

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    images: Arc<dyn ImageStore>,
}

impl PostService {
    pub fn new(repo: Arc<dyn PostRepository>, images: Arc<dyn ImageStore>) -> Self {
        Self { repo, images }
    }

    pub async fn get_post(&self, id: i32) -> Result<Post, DomainError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    /// Every post, oldest first.
    pub async fn list_posts(&self) -> Result<Vec<Post>, DomainError> {
        self.repo.list_by_date().await
    }

    /// Same ordering as [`list_posts`](Self::list_posts) minus the most recent post.
    pub async fn list_managed_posts(&self) -> Result<Vec<Post>, DomainError> {
        let mut posts = self.repo.list_by_date().await?;
        posts.pop();
        Ok(posts)
    }

    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_post(&self, input: PostInput) -> Result<Post, DomainError> {
        let cover_image_url = match input.cover_image {
            Some(image) => Some(self.upload_cover(image).await?),
            None => None,
        };

        // An upload that succeeded stays in the bucket even if this insert fails.
        self.repo
            .create(NewPost {
                title: input.title,
                content: input.content,
                author: input.author,
                cover_image_url,
            })
            .await
    }

    #[instrument(skip(self, input))]
    pub async fn edit_post(&self, id: i32, input: PostInput) -> Result<Post, DomainError> {
        self.get_post(id).await?;

        // Every upload problem on edit is a server error, missing credentials included.
        let cover_image_url = match input.cover_image {
            Some(image) => Some(self.upload_cover(image).await.map_err(|e| match e {
                DomainError::CredentialsMissing => DomainError::Upload(e.to_string()),
                other => other,
            })?),
            None => None,
        };

        self.repo
            .update(
                id,
                PostChanges {
                    title: input.title,
                    content: input.content,
                    author: input.author,
                    cover_image_url,
                },
            )
            .await?
            .ok_or(DomainError::PostNotFound(id))
    }

    #[instrument(skip(self))]
    pub async fn delete_post(&self, id: i32) -> Result<(), DomainError> {
        self.get_post(id).await?;
        if !self.repo.delete(id).await? {
            return Err(DomainError::PostNotFound(id));
        }
        Ok(())
    }

    async fn upload_cover(&self, image: CoverImage) -> Result<String, DomainError> {
        let key_budget = MAX_COVER_URL_LEN.saturating_sub(self.images.public_url("").len());
        let key = storage_key(&image.file_name, key_budget);
        self.images
            .put(&key, &image.content_type, image.body)
            .await?;
        let url = self.images.public_url(&key);
        info!(%key, %url, "cover image stored");
        Ok(url)
    }
}
