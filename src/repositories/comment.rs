use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        comment::{Comment, CommentWithAuthor, NewComment},
        post::AuthorSummary,
    },
    repositories::CommentRepository,
};

/// Comments stored in the `comments` table.
#[derive(Clone)]
pub struct PgCommentRepository {
    pool: Pool,
}

impl PgCommentRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentRepository for PgCommentRepository {
    async fn create(&self, comment: NewComment) -> Result<Comment> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO comments (id, post_id, user_id, body)
                VALUES ($1, $2, $3, $4)
                RETURNING id, post_id, user_id, body, created_at, updated_at
                "#,
                &[&Uuid::new_v4(), &comment.post_id, &comment.user_id, &comment.body],
            )
            .await?;
        Comment::try_from(&row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                SELECT id, post_id, user_id, body, created_at, updated_at
                FROM comments
                WHERE id = $1
                "#,
                &[&id],
            )
            .await?;
        row.as_ref().map(Comment::try_from).transpose()
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT c.id, c.post_id, c.user_id, c.body, c.created_at, c.updated_at,
                       u.name AS author_name
                FROM comments c
                JOIN users u ON u.id = c.user_id
                WHERE c.post_id = $1
                ORDER BY c.created_at ASC
                "#,
                &[&post_id],
            )
            .await?;

        rows.iter()
            .map(|row| {
                let comment = Comment::try_from(row)?;
                let name: String = row
                    .try_get("author_name")
                    .map_err(|_| AppError::MissingData("author_name".to_string()))?;
                Ok(CommentWithAuthor {
                    author: AuthorSummary { id: comment.user_id, name },
                    comment,
                })
            })
            .collect()
    }

    async fn update_body(&self, id: Uuid, body: String) -> Result<Comment> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                UPDATE comments
                SET body = $2, updated_at = NOW()
                WHERE id = $1
                RETURNING id, post_id, user_id, body, created_at, updated_at
                "#,
                &[&id, &body],
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        Comment::try_from(&row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM comments WHERE id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }
}
