use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use garde::Validate;

use crate::{
    error::{AppError, Result},
    handlers::extract::{parse_id, read_form, Data, Envelope, FormData, PathParams, Upload},
    models::{
        identity::Identity,
        post::{Post, PostDetail, PostWithAuthor},
    },
    services::posts as post_service,
    state::AppState,
    validation::content::{PostInput, PostPatch},
};

const COVER_FIELD: &str = "coverImage";
const POST_NOT_FOUND: &str = "Post not found";

/// Lists every post, newest first.
pub async fn list_posts(State(state): State<AppState>) -> Result<Json<Data<Vec<PostWithAuthor>>>> {
    let posts = post_service::list(&state).await?;
    Ok(Json(Data { data: posts }))
}

/// Returns one post with its author and comments.
pub async fn get_post(
    State(state): State<AppState>,
    PathParams(post_id): PathParams<String>,
) -> Result<Json<Data<PostDetail>>> {
    let post_id = parse_id(&post_id, POST_NOT_FOUND)?;
    let post = post_service::detail(&state, post_id).await?;
    Ok(Json(Data { data: post }))
}

/// Creates a post from a multipart form.
#[axum::debug_handler]
pub async fn create_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Upload(multipart): Upload,
) -> Result<Json<Envelope<Post>>> {
    tracing::info!("📝 Create post from user: {}", identity.user_id);

    let form = read_form(multipart, &[COVER_FIELD]).await?;
    let input = PostInput {
        title: form.text_or_empty("title"),
        body: form.text_or_empty("body"),
        category: form.text_or_empty("category"),
    }
    .sanitized();
    input.validate()?;

    let cover = form
        .file(COVER_FIELD)
        .ok_or_else(|| AppError::field(COVER_FIELD, "Image is required"))?;

    let post = post_service::create(&state, &identity, input, cover).await?;

    Ok(Json(Envelope {
        message: "Post created successfully",
        data: post,
    }))
}

/// Length limits apply to the escaped text, as stored.
fn post_patch(form: &FormData) -> Result<PostPatch> {
    let patch = PostPatch {
        title: form.text("title"),
        body: form.text("body"),
        category: form.text("category"),
    }
    .sanitized();
    patch.validate()?;
    Ok(patch)
}

/// Partially updates a post. Blank fields keep their stored value.
#[axum::debug_handler]
pub async fn update_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(post_id): PathParams<String>,
    Upload(multipart): Upload,
) -> Result<Json<Envelope<Post>>> {
    let post_id = parse_id(&post_id, POST_NOT_FOUND)?;
    tracing::info!("✏️ Update post {} from user: {}", post_id, identity.user_id);

    let form = read_form(multipart, &[COVER_FIELD]).await?;
    let patch = post_patch(&form)?;

    let post =
        post_service::update(&state, &identity, post_id, patch, form.file(COVER_FIELD)).await?;

    Ok(Json(Envelope {
        message: "Post updated successfully",
        data: post,
    }))
}

/// The same update, addressed through the author's profile.
#[axum::debug_handler]
pub async fn update_profile_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams((user_id, post_id)): PathParams<(String, String)>,
    Upload(multipart): Upload,
) -> Result<Json<Envelope<Post>>> {
    let user_id = parse_id(&user_id, "User not found")?;
    let post_id = parse_id(&post_id, POST_NOT_FOUND)?;
    crate::services::profiles::ensure_self(&identity, user_id)?;

    let form = read_form(multipart, &[COVER_FIELD]).await?;
    let patch = post_patch(&form)?;

    let post =
        post_service::update(&state, &identity, post_id, patch, form.file(COVER_FIELD)).await?;

    Ok(Json(Envelope {
        message: "Post updated successfully",
        data: post,
    }))
}

/// Deletes a post and its comments.
pub async fn delete_post(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(post_id): PathParams<String>,
) -> Result<StatusCode> {
    let post_id = parse_id(&post_id, POST_NOT_FOUND)?;
    post_service::delete(&state, &identity, post_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
