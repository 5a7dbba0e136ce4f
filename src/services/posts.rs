use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::identity::Identity;
use crate::models::post::{NewPost, Post, PostDetail, PostUpdate, PostWithAuthor};
use crate::services::images::ImageFolder;
use crate::state::AppState;
use crate::validation::content::{PostInput, PostPatch};

const NOT_OWNER: &str = "Forbidden. You are not the owner of this post.";

fn not_found() -> AppError {
    AppError::NotFound("Post not found".to_string())
}

/// All posts, newest first.
pub async fn list(state: &AppState) -> Result<Vec<PostWithAuthor>> {
    state.posts.list().await
}

/// A single post with its author and comments.
pub async fn detail(state: &AppState, post_id: Uuid) -> Result<PostDetail> {
    state.posts.find_detail(post_id).await?.ok_or_else(not_found)
}

/// Fetches a post and checks the caller owns it.
async fn owned_post(state: &AppState, identity: &Identity, post_id: Uuid) -> Result<Post> {
    let post = state.posts.find_by_id(post_id).await?.ok_or_else(not_found)?;
    identity.ensure_owner(post.user_id, NOT_OWNER)?;
    Ok(post)
}

/// Creates a post.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `identity` - The authenticated author.
/// * `input` - Validated, sanitized text fields.
/// * `cover` - The raw cover image upload.
///
/// # Returns
///
/// A `Result` containing the created `Post`.
pub async fn create(
    state: &AppState,
    identity: &Identity,
    input: PostInput,
    cover: &[u8],
) -> Result<Post> {
    let cover_image = state
        .images
        .save(ImageFolder::BlogPosts, "coverImage", cover)
        .await?;

    let created = state
        .posts
        .create(NewPost {
            user_id: identity.user_id,
            title: input.title,
            body: input.body,
            category: input.category,
            cover_image: cover_image.clone(),
        })
        .await;

    match created {
        Ok(post) => {
            tracing::info!("✅ Post {} created by user: {}", post.id, identity.user_id);
            Ok(post)
        }
        Err(e) => {
            state.images.discard(&cover_image).await;
            Err(e)
        }
    }
}

/// Applies a partial update. Only the author may edit a post.
pub async fn update(
    state: &AppState,
    identity: &Identity,
    post_id: Uuid,
    patch: PostPatch,
    cover: Option<&[u8]>,
) -> Result<Post> {
    let existing = owned_post(state, identity, post_id).await?;

    let cover_image = match cover {
        Some(bytes) => Some(
            state
                .images
                .save(ImageFolder::BlogPosts, "coverImage", bytes)
                .await?,
        ),
        None => None,
    };

    let updated = state
        .posts
        .update(
            post_id,
            PostUpdate {
                title: patch.title,
                body: patch.body,
                category: patch.category,
                cover_image: cover_image.clone(),
            },
        )
        .await;

    match (updated, cover_image) {
        (Ok(post), Some(_)) => {
            state.images.discard(&existing.cover_image).await;
            Ok(post)
        }
        (Ok(post), None) => Ok(post),
        (Err(e), Some(new_cover)) => {
            state.images.discard(&new_cover).await;
            Err(e)
        }
        (Err(e), None) => Err(e),
    }
}

/// Deletes a post and, through the store, its comments.
pub async fn delete(state: &AppState, identity: &Identity, post_id: Uuid) -> Result<()> {
    let existing = owned_post(state, identity, post_id).await?;

    if !state.posts.delete(post_id).await? {
        return Err(not_found());
    }
    state.images.discard(&existing.cover_image).await;

    tracing::info!("🗑️ Post {} deleted by user: {}", post_id, identity.user_id);
    Ok(())
}
