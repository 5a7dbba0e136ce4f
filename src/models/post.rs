use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::comment::CommentWithAuthor;

/// Represents a blog post.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Post {
    /// The unique identifier for the post.
    pub id: Uuid,
    /// The ID of the user who authored the post.
    pub user_id: Uuid,
    /// The title of the post.
    pub title: String,
    /// The body of the post.
    pub body: String,
    /// The category of the post.
    pub category: String,
    /// Public URL of the cover image.
    pub cover_image: String,
    /// The timestamp when the post was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the post was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Post {
    type Error = AppError;

    fn try_from(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
            user_id: row.try_get("user_id").map_err(|_| AppError::MissingData("user_id".to_string()))?,
            title: row.try_get("title").map_err(|_| AppError::MissingData("title".to_string()))?,
            body: row.try_get("body").map_err(|_| AppError::MissingData("body".to_string()))?,
            category: row.try_get("category").map_err(|_| AppError::MissingData("category".to_string()))?,
            cover_image: row.try_get("cover_image").map_err(|_| AppError::MissingData("cover_image".to_string()))?,
            created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
            updated_at: row.try_get("updated_at").map_err(|_| AppError::MissingData("updated_at".to_string()))?,
        })
    }
}

/// The fields needed to insert a post.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub user_id: Uuid,
    pub title: String,
    pub body: String,
    pub category: String,
    pub cover_image: String,
}

/// A partial post update. `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub body: Option<String>,
    pub category: Option<String>,
    pub cover_image: Option<String>,
}

impl PostUpdate {
    /// Applies the update to a post in place.
    pub fn apply(self, post: &mut Post) {
        if let Some(title) = self.title {
            post.title = title;
        }
        if let Some(body) = self.body {
            post.body = body;
        }
        if let Some(category) = self.category {
            post.category = category;
        }
        if let Some(cover_image) = self.cover_image {
            post.cover_image = cover_image;
        }
        post.updated_at = Utc::now();
    }
}

/// The author fields shown next to a post in listings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorSummary {
    pub id: Uuid,
    pub name: String,
}

/// The author fields shown on a single post page.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthorDetail {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// A post together with its author's name.
#[derive(Debug, Clone, Serialize)]
pub struct PostWithAuthor {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorSummary,
}

/// A single post with its author and comments.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    #[serde(flatten)]
    pub post: Post,
    pub author: AuthorDetail,
    pub comments: Vec<CommentWithAuthor>,
}
