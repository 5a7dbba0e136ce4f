use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::comment::{Comment, CommentWithAuthor, NewComment};
use crate::models::identity::Identity;
use crate::state::AppState;
use crate::validation::content::CommentInput;

const NOT_OWNER: &str = "Forbidden. You are not the owner of this comment.";

async fn ensure_post_exists(state: &AppState, post_id: Uuid) -> Result<()> {
    match state.posts.find_by_id(post_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound("Post not found".to_string())),
    }
}

async fn owned_comment(state: &AppState, identity: &Identity, comment_id: Uuid) -> Result<Comment> {
    let comment = state
        .comments
        .find_by_id(comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;
    identity.ensure_owner(comment.user_id, NOT_OWNER)?;
    Ok(comment)
}

pub async fn list_for_post(state: &AppState, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
    ensure_post_exists(state, post_id).await?;
    state.comments.list_for_post(post_id).await
}

pub async fn create(
    state: &AppState,
    identity: &Identity,
    post_id: Uuid,
    input: CommentInput,
) -> Result<Comment> {
    ensure_post_exists(state, post_id).await?;

    let comment = state
        .comments
        .create(NewComment {
            post_id,
            user_id: identity.user_id,
            body: input.text,
        })
        .await?;

    tracing::info!("✅ Comment {} added to post {}", comment.id, post_id);
    Ok(comment)
}

pub async fn update(
    state: &AppState,
    identity: &Identity,
    comment_id: Uuid,
    input: CommentInput,
) -> Result<Comment> {
    owned_comment(state, identity, comment_id).await?;
    state.comments.update_body(comment_id, input.text).await
}

pub async fn delete(state: &AppState, identity: &Identity, comment_id: Uuid) -> Result<()> {
    owned_comment(state, identity, comment_id).await?;

    if !state.comments.delete(comment_id).await? {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    tracing::info!("🗑️ Comment {} deleted by user: {}", comment_id, identity.user_id);
    Ok(())
}
