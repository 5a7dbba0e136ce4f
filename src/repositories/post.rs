use async_trait::async_trait;
use deadpool_postgres::Pool;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        comment::{Comment, CommentWithAuthor},
        post::{AuthorDetail, AuthorSummary, NewPost, Post, PostDetail, PostUpdate, PostWithAuthor},
    },
    repositories::PostRepository,
};

const POST_COLUMNS: &str =
    "p.id, p.user_id, p.title, p.body, p.category, p.cover_image, p.created_at, p.updated_at";

/// Posts stored in the `posts` table.
#[derive(Clone)]
pub struct PgPostRepository {
    pool: Pool,
}

impl PgPostRepository {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, post: NewPost) -> Result<Post> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                r#"
                INSERT INTO posts (id, user_id, title, body, category, cover_image)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING id, user_id, title, body, category, cover_image, created_at, updated_at
                "#,
                &[
                    &Uuid::new_v4(),
                    &post.user_id,
                    &post.title,
                    &post.body,
                    &post.category,
                    &post.cover_image,
                ],
            )
            .await?;
        Post::try_from(&row)
    }

    async fn list(&self) -> Result<Vec<PostWithAuthor>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!(
                    r#"
                    SELECT {POST_COLUMNS}, u.name AS author_name
                    FROM posts p
                    JOIN users u ON u.id = p.user_id
                    ORDER BY p.created_at DESC
                    "#
                ),
                &[],
            )
            .await?;

        rows.iter()
            .map(|row| {
                let post = Post::try_from(row)?;
                let name: String = row
                    .try_get("author_name")
                    .map_err(|_| AppError::MissingData("author_name".to_string()))?;
                Ok(PostWithAuthor {
                    author: AuthorSummary { id: post.user_id, name },
                    post,
                })
            })
            .collect()
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                &format!(
                    r#"
                    SELECT {POST_COLUMNS}
                    FROM posts p
                    WHERE p.user_id = $1
                    ORDER BY p.created_at DESC
                    "#
                ),
                &[&user_id],
            )
            .await?;
        rows.iter().map(Post::try_from).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                &format!("SELECT {POST_COLUMNS} FROM posts p WHERE p.id = $1"),
                &[&id],
            )
            .await?;
        row.as_ref().map(Post::try_from).transpose()
    }

    async fn find_detail(&self, id: Uuid) -> Result<Option<PostDetail>> {
        let client = self.pool.get().await?;
        let Some(row) = client
            .query_opt(
                &format!(
                    r#"
                    SELECT {POST_COLUMNS}, u.name AS author_name, u.email AS author_email
                    FROM posts p
                    JOIN users u ON u.id = p.user_id
                    WHERE p.id = $1
                    "#
                ),
                &[&id],
            )
            .await?
        else {
            return Ok(None);
        };

        let post = Post::try_from(&row)?;
        let author = AuthorDetail {
            id: post.user_id,
            name: row
                .try_get("author_name")
                .map_err(|_| AppError::MissingData("author_name".to_string()))?,
            email: row
                .try_get("author_email")
                .map_err(|_| AppError::MissingData("author_email".to_string()))?,
        };

        let comment_rows = client
            .query(
                r#"
                SELECT c.id, c.post_id, c.user_id, c.body, c.created_at, c.updated_at,
                       u.name AS author_name
                FROM comments c
                JOIN users u ON u.id = c.user_id
                WHERE c.post_id = $1
                ORDER BY c.created_at ASC
                "#,
                &[&id],
            )
            .await?;

        let comments = comment_rows
            .iter()
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
            .collect::<Result<Vec<_>>>()?;

        Ok(Some(PostDetail { post, author, comments }))
    }

    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Post> {
        let client = self.pool.get().await?;
        let row = client
            .query_opt(
                r#"
                UPDATE posts
                SET
                    title = COALESCE($2, title),
                    body = COALESCE($3, body),
                    category = COALESCE($4, category),
                    cover_image = COALESCE($5, cover_image),
                    updated_at = NOW()
                WHERE id = $1
                RETURNING id, user_id, title, body, category, cover_image, created_at, updated_at
                "#,
                &[
                    &id,
                    &update.title,
                    &update.body,
                    &update.category,
                    &update.cover_image,
                ],
            )
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        Post::try_from(&row)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let client = self.pool.get().await?;
        let deleted = client
            .execute("DELETE FROM posts WHERE id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }
}
