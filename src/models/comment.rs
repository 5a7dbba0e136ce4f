use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_postgres::Row;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::post::AuthorSummary;

/// Represents a comment on a post.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Comment {
    /// The unique identifier for the comment.
    pub id: Uuid,
    /// The post the comment belongs to.
    pub post_id: Uuid,
    /// The user who wrote the comment.
    pub user_id: Uuid,
    /// The comment text.
    pub body: String,
    /// The timestamp when the comment was created.
    pub created_at: DateTime<Utc>,
    /// The timestamp when the comment was last updated.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<&Row> for Comment {
    type Error = AppError;

    fn try_from(row: &Row) -> Result<Self> {
        Ok(Self {
            id: row.try_get("id").map_err(|_| AppError::MissingData("id".to_string()))?,
            post_id: row.try_get("post_id").map_err(|_| AppError::MissingData("post_id".to_string()))?,
            user_id: row.try_get("user_id").map_err(|_| AppError::MissingData("user_id".to_string()))?,
            body: row.try_get("body").map_err(|_| AppError::MissingData("body".to_string()))?,
            created_at: row.try_get("created_at").map_err(|_| AppError::MissingData("created_at".to_string()))?,
            updated_at: row.try_get("updated_at").map_err(|_| AppError::MissingData("updated_at".to_string()))?,
        })
    }
}

/// The fields needed to insert a comment.
#[derive(Debug, Clone)]
pub struct NewComment {
    pub post_id: Uuid,
    pub user_id: Uuid,
    pub body: String,
}

/// A comment together with its author's name.
#[derive(Debug, Clone, Serialize)]
pub struct CommentWithAuthor {
    #[serde(flatten)]
    pub comment: Comment,
    pub author: AuthorSummary,
}
