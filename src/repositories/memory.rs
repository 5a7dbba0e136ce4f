use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        comment::{Comment, CommentWithAuthor, NewComment},
        post::{AuthorDetail, AuthorSummary, NewPost, Post, PostDetail, PostUpdate, PostWithAuthor},
        user::{NewUser, Profile, ProfileUpdate, User},
    },
    repositories::{CommentRepository, PostRepository, UserRepository},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    /// Insertion order, oldest first.
    posts: Vec<Post>,
    /// Insertion order, oldest first.
    comments: Vec<Comment>,
}

impl Tables {
    fn author_summary(&self, user_id: Uuid) -> AuthorSummary {
        let name = self
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.name.clone())
            .unwrap_or_default();
        AuthorSummary { id: user_id, name }
    }

    fn comments_for(&self, post_id: Uuid) -> Vec<CommentWithAuthor> {
        self.comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| CommentWithAuthor {
                author: self.author_summary(c.user_id),
                comment: c.clone(),
            })
            .collect()
    }
}

/// An in-process implementation of every repository trait.
///
/// Uniqueness and cascade rules match the Postgres schema.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.email == user.email || u.name == user.name)
        {
            return Err(AppError::Conflict("User already exists".to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            profile: Profile::default(),
            created_at: now,
            updated_at: now,
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> Result<User> {
        let mut tables = self.tables.write().await;

        if let Some(name) = &update.name {
            if tables.users.iter().any(|u| u.id != id && &u.name == name) {
                return Err(AppError::Conflict("Name is already taken".to_string()));
            }
        }

        let user = tables
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        update.apply(user);
        Ok(user.clone())
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: NewPost) -> Result<Post> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            user_id: post.user_id,
            title: post.title,
            body: post.body,
            category: post.category,
            cover_image: post.cover_image,
            created_at: now,
            updated_at: now,
        };
        tables.posts.push(post.clone());
        Ok(post)
    }

    async fn list(&self) -> Result<Vec<PostWithAuthor>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .rev()
            .map(|p| PostWithAuthor {
                author: tables.author_summary(p.user_id),
                post: p.clone(),
            })
            .collect())
    }

    async fn list_by_user(&self, user_id: Uuid) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .iter()
            .rev()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn find_detail(&self, id: Uuid) -> Result<Option<PostDetail>> {
        let tables = self.tables.read().await;
        let Some(post) = tables.posts.iter().find(|p| p.id == id) else {
            return Ok(None);
        };

        let author = tables
            .users
            .iter()
            .find(|u| u.id == post.user_id)
            .map(|u| AuthorDetail {
                id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
            })
            .ok_or_else(|| AppError::Internal("Post without author".to_string()))?;

        Ok(Some(PostDetail {
            post: post.clone(),
            author,
            comments: tables.comments_for(id),
        }))
    }

    async fn update(&self, id: Uuid, update: PostUpdate) -> Result<Post> {
        let mut tables = self.tables.write().await;
        let post = tables
            .posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
        update.apply(post);
        Ok(post.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.posts.len();
        tables.posts.retain(|p| p.id != id);
        let deleted = tables.posts.len() < before;
        if deleted {
            tables.comments.retain(|c| c.post_id != id);
        }
        Ok(deleted)
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: NewComment) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.iter().any(|p| p.id == comment.post_id) {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let now = Utc::now();
        let comment = Comment {
            id: Uuid::new_v4(),
            post_id: comment.post_id,
            user_id: comment.user_id,
            body: comment.body,
            created_at: now,
            updated_at: now,
        };
        tables.comments.push(comment.clone());
        Ok(comment)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn list_for_post(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let tables = self.tables.read().await;
        Ok(tables.comments_for(post_id))
    }

    async fn update_body(&self, id: Uuid, body: String) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        let comment = tables
            .comments
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
        comment.body = body;
        comment.updated_at = Utc::now();
        Ok(comment.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.comments.len();
        tables.comments.retain(|c| c.id != id);
        Ok(tables.comments.len() < before)
    }
}
