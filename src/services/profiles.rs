use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::identity::Identity;
use crate::models::post::Post;
use crate::models::user::{ProfileUpdate, User};
use crate::services::images::ImageFolder;
use crate::state::AppState;
use crate::validation::content::ProfilePatch;

fn user_not_found() -> AppError {
    AppError::NotFound("User not found".to_string())
}

/// Fails with `403` unless the caller is `user_id`.
pub fn ensure_self(identity: &Identity, user_id: Uuid) -> Result<()> {
    identity.ensure_owner(user_id, "Forbidden. You can only change your own profile.")
}

pub async fn get(state: &AppState, user_id: Uuid) -> Result<User> {
    state.users.find_by_id(user_id).await?.ok_or_else(user_not_found)
}

/// Posts written by `user_id`, newest first.
pub async fn posts(state: &AppState, user_id: Uuid) -> Result<Vec<Post>> {
    get(state, user_id).await?;
    state.posts.list_by_user(user_id).await
}

/// Updates the caller's own profile.
///
/// # Arguments
///
/// * `state` - The application state.
/// * `identity` - The authenticated caller.
/// * `user_id` - The profile being changed; must be the caller's.
/// * `patch` - Validated, sanitized text fields.
/// * `photo` - An optional new profile photo.
///
/// # Returns
///
/// A `Result` containing the updated `User`.
pub async fn update(
    state: &AppState,
    identity: &Identity,
    user_id: Uuid,
    patch: ProfilePatch,
    photo: Option<&[u8]>,
) -> Result<User> {
    ensure_self(identity, user_id)?;
    let existing = get(state, user_id).await?;

    let photo_ref = match photo {
        Some(bytes) => Some(
            state
                .images
                .save(ImageFolder::UserProfiles, "profilePhoto", bytes)
                .await?,
        ),
        None => None,
    };

    let updated = state
        .users
        .update_profile(
            user_id,
            ProfileUpdate {
                name: patch.name,
                bio: patch.bio,
                education: patch.education,
                work: patch.work,
                photo_ref: photo_ref.clone(),
            },
        )
        .await;

    match (updated, photo_ref) {
        (Ok(user), Some(_)) => {
            if let Some(old) = existing.profile.photo_ref.as_deref() {
                state.images.discard(old).await;
            }
            tracing::info!("✅ Profile updated for user: {}", user_id);
            Ok(user)
        }
        (Ok(user), None) => {
            tracing::info!("✅ Profile updated for user: {}", user_id);
            Ok(user)
        }
        (Err(e), Some(new_photo)) => {
            state.images.discard(&new_photo).await;
            Err(e)
        }
        (Err(e), None) => Err(e),
    }
}
