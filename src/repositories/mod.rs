//! Persistence seams.
//!
//! Each trait has a Postgres implementation for production and shares one
//! in-memory implementation ([`memory::MemoryStore`]) for `memory://`
//! deployments and tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        comment::{Comment, CommentWithAuthor, NewComment},
        post::{NewPost, Post, PostDetail, PostUpdate, PostWithAuthor},
        user::{NewUser, ProfileUpdate, User},
    },
};

pub mod comment;
pub mod memory;
pub mod post;
pub mod user;

/// The credential store: user records keyed by id, email and name.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Inserts a user. A duplicate email or name is a [`AppError::Conflict`].
    async fn create(&self, user: NewUser) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Applies a profile update and returns the stored user.
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, post: NewPost) -> Result<Post>;

    /// All posts, newest first, with author names.
    async fn list(&self) -> Result<Vec<PostWithAuthor>>;

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>>;

    /// A post with its author and comments, oldest comment first.
    async fn find_detail(&self, id: Uuid) -> Result<Option<PostDetail>>;

    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Post>;

    /// Deletes a post and its comments. Returns `false` if nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, comment: NewComment) -> Result<Comment>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>>;

    /// Comments on a post, oldest first, with author names.
    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>>;

    async fn update_body(&self, id: Uuid, body: String) -> Result<Comment>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Maps a Postgres unique violation to a conflict with `message`.
pub(crate) fn conflict_on_unique(e: tokio_postgres::Error, message: &str) -> AppError {
    if e.code() == Some(&tokio_postgres::error::SqlState::UNIQUE_VIOLATION) {
        AppError::Conflict(message.to_string())
    } else {
        AppError::Database(e)
    }
}
