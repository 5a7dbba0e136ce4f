use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    middleware::{from_fn, from_fn_with_state},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Router,
};
use http::{header, HeaderName, HeaderValue, Method};
use tower_cookies::CookieManagerLayer;
use tower_governor::{governor::GovernorConfigBuilder, GovernorError, GovernorLayer};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{
    config::Config,
    error::AppError,
    handlers,
    middleware_layer::{auth::require_auth, csrf::verify_csrf, csrf::CSRF_HEADER},
    services::images::PUBLIC_PREFIX,
    state::AppState,
};

/// Upper bound on a whole request body. Single files are capped lower.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Milliseconds between replenished requests for a per-minute budget.
fn replenish_ms(per_minute: u32) -> u64 {
    (60_000 / u64::from(per_minute.max(1))).max(1)
}

/// Renders governor rejections in the same JSON shape as every other error.
fn rate_limited(error: GovernorError) -> Response {
    match error {
        GovernorError::TooManyRequests { wait_time, .. } => {
            let mut response =
                AppError::TooManyRequests("Too many requests, please try again later".into())
                    .into_response();
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(wait_time));
            response
        }
        GovernorError::UnableToExtractKey => {
            AppError::Internal("Unable to identify the client".into()).into_response()
        }
        GovernorError::Other { msg, .. } => {
            AppError::Internal(msg.unwrap_or_else(|| "Rate limiter failure".into())).into_response()
        }
    }
}

fn cors(config: &Config) -> anyhow::Result<CorsLayer> {
    let origins = config
        .cors_origins
        .iter()
        .map(|origin| origin.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid CORS_ORIGINS")?;

    let csrf_header = HeaderName::from_static(CSRF_HEADER);

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::COOKIE,
            csrf_header.clone(),
        ])
        .allow_credentials(true)
        .expose_headers([csrf_header])
        .max_age(Duration::from_secs(86400)))
}

/// Builds the full application router.
///
/// # Arguments
///
/// * `state` - The application state.
///
/// # Returns
///
/// The `Router`, or an error if the CORS or rate limit settings are invalid.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let config = state.config.clone();
    let upload_root = state.images.root().to_path_buf();

    // Keyed by peer IP, so the server must run with connect info.
    let auth_governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_ms(config.auth_rate_limit_per_minute))
            .burst_size(config.auth_rate_limit_per_minute)
            .finish()
            .context("Invalid AUTH_RATE_LIMIT_PER_MINUTE")?,
    );
    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_millisecond(replenish_ms(config.rate_limit_per_minute))
            .burst_size(config.rate_limit_per_minute)
            .finish()
            .context("Invalid RATE_LIMIT_PER_MINUTE")?,
    );

    let auth_routes = Router::new()
        .route("/api/auth/signup", post(handlers::auth::signup))
        .route("/api/auth/login", post(handlers::auth::login))
        .layer(GovernorLayer::new(auth_governor_conf).error_handler(rate_limited));

    let public_routes = Router::new()
        .route("/", get(handlers::root::index))
        .route("/api/posts", get(handlers::posts::list_posts))
        .route("/api/posts/{post_id}", get(handlers::posts::get_post))
        .route("/api/profile/{user_id}", get(handlers::profiles::get_profile))
        .route(
            "/api/profile/{user_id}/posts",
            get(handlers::profiles::get_profile_posts),
        );

    let protected_routes = Router::new()
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route("/api/auth/me", get(handlers::auth::me))
        .route("/api/posts", post(handlers::posts::create_post))
        .route(
            "/api/posts/{post_id}",
            put(handlers::posts::update_post).delete(handlers::posts::delete_post),
        )
        .route(
            "/api/posts/{post_id}/comments",
            get(handlers::comments::list_comments).post(handlers::comments::create_comment),
        )
        .route(
            "/api/comments/{comment_id}",
            put(handlers::comments::update_comment).delete(handlers::comments::delete_comment),
        )
        .route("/api/profile/{user_id}", put(handlers::profiles::update_profile))
        .route(
            "/api/profile/{user_id}/posts/{post_id}",
            put(handlers::posts::update_profile_post),
        )
        .route_layer(from_fn(verify_csrf))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    let app = Router::new()
        .merge(auth_routes)
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service(PUBLIC_PREFIX, ServeDir::new(upload_root))
        .fallback(handlers::root::not_found)
        .with_state(state)
        .layer(CookieManagerLayer::new())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static("default-src 'self'"),
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::REFERRER_POLICY,
            HeaderValue::from_static("no-referrer"),
        ))
        // Inside compression so the error handler sees the router's body type.
        .layer(GovernorLayer::new(governor_conf).error_handler(rate_limited))
        .layer(CompressionLayer::new())
        .layer(cors(&config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        );

    Ok(app)
}
