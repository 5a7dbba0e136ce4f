use axum::{
    extract::State,
    http::StatusCode,
    Extension, Json,
};
use garde::Validate;

use crate::{
    error::Result,
    handlers::extract::{parse_id, Data, Envelope, JsonBody, PathParams},
    models::{
        comment::{Comment, CommentWithAuthor},
        identity::Identity,
    },
    services::comments as comment_service,
    state::AppState,
    validation::content::CommentInput,
};

const POST_NOT_FOUND: &str = "Post not found";
const COMMENT_NOT_FOUND: &str = "Comment not found";

fn checked(payload: CommentInput) -> Result<CommentInput> {
    let payload = payload.normalized().sanitized();
    payload.validate()?;
    Ok(payload)
}

pub async fn list_comments(
    State(state): State<AppState>,
    PathParams(post_id): PathParams<String>,
) -> Result<Json<Data<Vec<CommentWithAuthor>>>> {
    let post_id = parse_id(&post_id, POST_NOT_FOUND)?;
    let comments = comment_service::list_for_post(&state, post_id).await?;
    Ok(Json(Data { data: comments }))
}

#[axum::debug_handler]
pub async fn create_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(post_id): PathParams<String>,
    JsonBody(payload): JsonBody<CommentInput>,
) -> Result<Json<Envelope<Comment>>> {
    let post_id = parse_id(&post_id, POST_NOT_FOUND)?;
    let comment = comment_service::create(&state, &identity, post_id, checked(payload)?).await?;

    Ok(Json(Envelope {
        message: "Comment created",
        data: comment,
    }))
}

#[axum::debug_handler]
pub async fn update_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(comment_id): PathParams<String>,
    JsonBody(payload): JsonBody<CommentInput>,
) -> Result<Json<Envelope<Comment>>> {
    let comment_id = parse_id(&comment_id, COMMENT_NOT_FOUND)?;
    let comment =
        comment_service::update(&state, &identity, comment_id, checked(payload)?).await?;

    Ok(Json(Envelope {
        message: "Comment updated",
        data: comment,
    }))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    PathParams(comment_id): PathParams<String>,
) -> Result<StatusCode> {
    let comment_id = parse_id(&comment_id, COMMENT_NOT_FOUND)?;
    comment_service::delete(&state, &identity, comment_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
