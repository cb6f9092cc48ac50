use crate::domain::error::DomainError;
use crate::domain::post::{NewPost, Post, PostChanges};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{error, info};

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// All posts, oldest first.
    async fn list_by_date(&self) -> Result<Vec<Post>, DomainError>;
    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, DomainError>;
    async fn create(&self, post: NewPost) -> Result<Post, DomainError>;
    /// Returns `None` when the row no longer exists.
    async fn update(&self, id: i32, changes: PostChanges) -> Result<Option<Post>, DomainError>;
    /// Returns whether a row was removed.
    async fn delete(&self, id: i32) -> Result<bool, DomainError>;
}

#[derive(Clone)]
pub struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list_by_date(&self) -> Result<Vec<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, content, author, date_posted, cover_image_url
            FROM posts
            ORDER BY date_posted ASC, id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("db error while fetching posts: {}", e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Post>, DomainError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT id, title, content, author, date_posted, cover_image_url
            FROM posts WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("db error find_by_id {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })
    }

    async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (title, content, author, cover_image_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, title, content, author, date_posted, cover_image_url
            "#,
        )
        .bind(&post.title)
        .bind(&post.content)
        .bind(&post.author)
        .bind(&post.cover_image_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to create post: {}", e);
            DomainError::Internal(format!("database error: {}", e))
        })?;

        info!(post_id = post.id, author = %post.author, "post created");
        Ok(post)
    }

    async fn update(&self, id: i32, changes: PostChanges) -> Result<Option<Post>, DomainError> {
        let post = sqlx::query_as::<_, Post>(
            r#"
            UPDATE posts
            SET
                title = $1,
                content = $2,
                author = $3,
                cover_image_url = COALESCE($4, cover_image_url)
            WHERE id = $5
            RETURNING id, title, content, author, date_posted, cover_image_url
            "#,
        )
        .bind(&changes.title)
        .bind(&changes.content)
        .bind(&changes.author)
        .bind(&changes.cover_image_url)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("failed to update post {}: {}", id, e);
            DomainError::Internal(e.to_string())
        })?;

        if post.is_some() {
            info!(post_id = id, "post updated");
        }

        Ok(post)
    }

    async fn delete(&self, id: i32) -> Result<bool, DomainError> {
        let deleted = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                error!("failed to delete post {}: {}", id, e);
                DomainError::Internal(e.to_string())
            })?;

        let removed = deleted.rows_affected() > 0;
        if removed {
            info!(post_id = id, "post deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
pub mod memory {
    use super::*;
    use chrono::{Duration, Utc};
    use std::sync::Mutex;

    /// Vec-backed repository with strictly increasing `date_posted` per insert.
    #[derive(Default)]
    pub struct InMemoryPostRepository {
        posts: Mutex<Vec<Post>>,
        next_id: Mutex<i32>,
    }

    impl InMemoryPostRepository {
        pub fn snapshot(&self) -> Vec<Post> {
            self.posts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PostRepository for InMemoryPostRepository {
        async fn list_by_date(&self) -> Result<Vec<Post>, DomainError> {
            let mut posts = self.snapshot();
            posts.sort_by(|a, b| (a.date_posted, a.id).cmp(&(b.date_posted, b.id)));
            Ok(posts)
        }

        async fn find_by_id(&self, id: i32) -> Result<Option<Post>, DomainError> {
            Ok(self.snapshot().into_iter().find(|p| p.id == id))
        }

        async fn create(&self, post: NewPost) -> Result<Post, DomainError> {
            let mut next_id = self.next_id.lock().unwrap();
            *next_id += 1;
            let created = Post {
                id: *next_id,
                title: post.title,
                content: post.content,
                author: post.author,
                date_posted: Utc::now() + Duration::milliseconds(*next_id as i64),
                cover_image_url: post.cover_image_url,
            };
            self.posts.lock().unwrap().push(created.clone());
            Ok(created)
        }

        async fn update(
            &self,
            id: i32,
            changes: PostChanges,
        ) -> Result<Option<Post>, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            let Some(post) = posts.iter_mut().find(|p| p.id == id) else {
                return Ok(None);
            };
            post.title = changes.title;
            post.content = changes.content;
            post.author = changes.author;
            if let Some(url) = changes.cover_image_url {
                post.cover_image_url = Some(url);
            }
            Ok(Some(post.clone()))
        }

        async fn delete(&self, id: i32) -> Result<bool, DomainError> {
            let mut posts = self.posts.lock().unwrap();
            let before = posts.len();
            posts.retain(|p| p.id != id);
            Ok(posts.len() < before)
        }
    }
}

/// Runs against a live database: `DATABASE_URL=... cargo test --features postgres-tests`.
#[cfg(all(test, feature = "postgres-tests"))]
mod postgres_tests {
    use super::*;

    fn new_post(title: &str, cover_image_url: Option<&str>) -> NewPost {
        NewPost {
            title: title.to_string(),
            content: "body".to_string(),
            author: "Alice".to_string(),
            cover_image_url: cover_image_url.map(str::to_string),
        }
    }

    fn changes(title: &str, cover_image_url: Option<&str>) -> PostChanges {
        PostChanges {
            title: title.to_string(),
            content: "edited".to_string(),
            author: "Bob".to_string(),
            cover_image_url: cover_image_url.map(str::to_string),
        }
    }

    #[sqlx::test]
    async fn update_without_url_keeps_cover_and_date(pool: PgPool) -> sqlx::Result<()> {
        let repo = PostgresPostRepository::new(pool);
        let created = repo
            .create(new_post("Hello", Some("https://b.s3.amazonaws.com/k_a.png")))
            .await
            .unwrap();

        let edited = repo
            .update(created.id, changes("Renamed", None))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.title, "Renamed");
        assert_eq!(edited.author, "Bob");
        assert_eq!(edited.cover_image_url, created.cover_image_url);
        assert_eq!(edited.date_posted, created.date_posted);

        let new_cover = "https://b.s3.amazonaws.com/k_b.png";
        let replaced = repo
            .update(created.id, changes("Renamed", Some(new_cover)))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(replaced.cover_image_url.as_deref(), Some(new_cover));
        Ok(())
    }

    #[sqlx::test]
    async fn missing_rows_are_reported(pool: PgPool) -> sqlx::Result<()> {
        let repo = PostgresPostRepository::new(pool);

        assert!(repo.update(999, changes("x", None)).await.unwrap().is_none());
        assert!(!repo.delete(999).await.unwrap());
        assert!(repo.find_by_id(999).await.unwrap().is_none());

        let created = repo.create(new_post("Hello", None)).await.unwrap();
        assert_eq!(created.cover_image_url, None);
        assert!(repo.delete(created.id).await.unwrap());
        assert!(repo.find_by_id(created.id).await.unwrap().is_none());
        Ok(())
    }

    #[sqlx::test]
    async fn listing_orders_by_date_then_id(pool: PgPool) -> sqlx::Result<()> {
        let repo = PostgresPostRepository::new(pool.clone());
        let first = repo.create(new_post("first", None)).await.unwrap();
        let second = repo.create(new_post("second", None)).await.unwrap();
        let third = repo.create(new_post("third", None)).await.unwrap();

        // Tie the first two, push the third back in time.
        sqlx::query("UPDATE posts SET date_posted = '2024-01-02T00:00:00Z' WHERE id IN ($1, $2)")
            .bind(first.id)
            .bind(second.id)
            .execute(&pool)
            .await?;
        sqlx::query("UPDATE posts SET date_posted = '2024-01-01T00:00:00Z' WHERE id = $1")
            .bind(third.id)
            .execute(&pool)
            .await?;

        let ids: Vec<i32> = repo
            .list_by_date()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![third.id, first.id, second.id]);
        Ok(())
    }
}
