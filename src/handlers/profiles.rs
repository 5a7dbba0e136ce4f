use axum::{
    extract::State,
    Extension, Json,
};
use garde::Validate;

use crate::{
    error::Result,
    handlers::extract::{parse_id, read_form, Data, Envelope, PathParams, Upload},
    models::{identity::Identity, post::Post, user::PublicUser},
    services::profiles as profile_service,
    state::AppState,
    validation::content::ProfilePatch,
};

const PHOTO_FIELD: &str = "profilePhoto";
const USER_NOT_FOUND: &str = "User not found";

pub async fn get_profile(
    State(state): State<AppState>,
    PathParams(user_id): PathParams<String>,
) -> Result<Json<Data<PublicUser>>> {
    let user_id = parse_id(&user_id, USER_NOT_FOUND)?;
    let user = profile_service::get(&state, user_id).await?;
    Ok(Json(Data {
        data: PublicUser::from(&user),
    }))
}

pub async fn get_profile_posts(
    State(state): State<AppState>,
    PathParams(user_id): PathParams<String>,
) -> Result<Json<Data<Vec<Post>>>> {
    let user_id = parse_id(&user_id, USER_NOT_FOUND)?;
    let posts = profile_service::posts(&state, user_id).await?;
    Ok(Json(Data { data: posts }))
}

/// Updates the caller's own profile from a multipart form.
#[axum::debug_handler]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(user_id): PathParams<String>,
    Upload(multipart): Upload,
) -> Result<Json<Envelope<PublicUser>>> {
    let user_id = parse_id(&user_id, USER_NOT_FOUND)?;
    profile_service::ensure_self(&identity, user_id)?;
    tracing::info!("✏️ Update profile for user: {}", user_id);

    let form = read_form(multipart, &[PHOTO_FIELD]).await?;
    let patch = ProfilePatch {
        name: form.text("name"),
        bio: form.text("bio"),
        education: form.text("education"),
        work: form.text("work"),
    }
    .sanitized();
    patch.validate()?;

    let user = profile_service::update(
        &state,
        &identity,
        user_id,
        patch,
        form.file(PHOTO_FIELD),
    )
    .await?;

    Ok(Json(Envelope {
        message: "User profile updated successfully",
        data: PublicUser::from(&user),
    }))
}
