use std::net::SocketAddr;

use axum::{body::Body, extract::ConnectInfo, Router};
use http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use etlog::{config::Config, routes::build_router, state::AppState};

const PNG_1X1: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52,
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4,
    0x89, 0x00, 0x00, 0x00, 0x0A, 0x49, 0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00,
    0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00, 0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE,
    0x42, 0x60, 0x82,
];

const BOUNDARY: &str = "etlog-test-boundary";
const PASSWORD: &str = "correct horse battery";

struct Response {
    status: StatusCode,
    headers: http::HeaderMap,
    body: Value,
}

/// Credentials for a logged-in test user.
struct Login {
    user_id: String,
    token: String,
    cookie: String,
    csrf: String,
}

fn config(overrides: &[(&str, &str)]) -> Config {
    let upload_dir = std::env::temp_dir().join(format!("etlog-api-{}", Uuid::new_v4()));
    let upload_dir = upload_dir.to_string_lossy().to_string();

    let mut pairs: Vec<(String, String)> = vec![
        ("DATABASE_URL", "memory://"),
        ("JWT_SECRET", "0123456789abcdef0123456789abcdef"),
        ("SESSION_SECRET", "fedcba9876543210fedcba9876543210"),
        ("AUTH_MODE", "both"),
        ("COOKIE_SECURE", "false"),
        ("RATE_LIMIT_PER_MINUTE", "10000"),
        ("AUTH_RATE_LIMIT_PER_MINUTE", "10000"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();
    pairs.push(("UPLOAD_DIR".to_string(), upload_dir));
    for (k, v) in overrides {
        pairs.retain(|(key, _)| key != k);
        pairs.push((k.to_string(), v.to_string()));
    }

    Config::from_vars(move |key| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    })
    .unwrap()
}

fn app_with(overrides: &[(&str, &str)]) -> Router {
    build_router(AppState::in_memory(config(overrides))).unwrap()
}

fn app() -> Router {
    app_with(&[])
}

async fn send(app: &Router, mut request: Request<Body>) -> Response {
    request
        .extensions_mut()
        .insert(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 40000))));

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    Response {
        status,
        headers,
        body,
    }
}

fn json_request(method: &str, uri: &str) -> http::request::Builder {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
}

async fn post_json(app: &Router, uri: &str, body: Value) -> Response {
    let request = json_request("POST", uri)
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

fn multipart_body(texts: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in texts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"cover.png\"\r\nContent-Type: image/png\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn multipart_request(method: &str, uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::from(body))
        .unwrap()
}

fn cookie_pair(headers: &http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with(&format!("{name}=")))
        .map(str::to_string)
}

async fn signup(app: &Router, name: &str, email: &str) -> Response {
    post_json(
        app,
        "/api/auth/signup",
        json!({ "name": name, "email": email, "password": PASSWORD }),
    )
    .await
}

async fn signup_and_login(app: &Router, name: &str) -> Login {
    let email = format!("{name}@example.com");
    let created = signup(app, name, &email).await;
    assert_eq!(created.status, StatusCode::OK);

    let res = post_json(
        app,
        "/api/auth/login",
        json!({ "email": email, "password": PASSWORD }),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);

    Login {
        user_id: res.body["user"]["id"].as_str().unwrap().to_string(),
        token: res.body["token"].as_str().unwrap().to_string(),
        cookie: cookie_pair(&res.headers, "session_id").unwrap(),
        csrf: res.body["csrf_token"].as_str().unwrap().to_string(),
    }
}

async fn create_post(app: &Router, login: &Login, title: &str) -> Response {
    let body = multipart_body(
        &[("title", title), ("body", "Hello world"), ("category", "rust")],
        Some(("coverImage", PNG_1X1)),
    );
    send(app, multipart_request("POST", "/api/posts", &login.token, body)).await
}

#[tokio::test]
async fn root_greets_and_unknown_routes_are_json_404() {
    let app = app();

    let root = send(&app, Request::get("/").body(Body::empty()).unwrap()).await;
    assert_eq!(root.status, StatusCode::OK);
    assert_eq!(
        root.headers.get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let missing = send(&app, Request::get("/nope").body(Body::empty()).unwrap()).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.body["message"], "Not found");
}

#[tokio::test]
async fn signup_hides_the_hash_and_rejects_duplicates() {
    let app = app();

    let res = signup(&app, "ada", "ada@example.com").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body["message"], "User created successfully");
    assert_eq!(res.body["user"]["email"], "ada@example.com");
    assert!(res.body["user"].get("password_hash").is_none());
    assert!(res.body["user"].get("password").is_none());

    let again = signup(&app, "ada2", "ada@example.com").await;
    assert_eq!(again.status, StatusCode::BAD_REQUEST);
    assert_eq!(again.body["error"], "User already exists");
}

#[tokio::test]
async fn signup_validation_reports_fields() {
    let app = app();

    let res = post_json(
        &app,
        "/api/auth/signup",
        json!({ "name": "al", "email": "not-an-email", "password": "short" }),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);

    let fields: Vec<&str> = res.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"email"));
    assert!(fields.contains(&"password"));
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = app();
    signup(&app, "ada", "ada@example.com").await;

    let wrong_password = post_json(
        &app,
        "/api/auth/login",
        json!({ "email": "ada@example.com", "password": "not the password" }),
    )
    .await;
    let unknown_email = post_json(
        &app,
        "/api/auth/login",
        json!({ "email": "nobody@example.com", "password": "not the password" }),
    )
    .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(wrong_password.body["message"], "Authentication failed");
}

#[tokio::test]
async fn gated_routes_need_a_valid_credential() {
    let app = app();
    let login = signup_and_login(&app, "ada").await;

    let anonymous = send(&app, Request::get("/api/auth/me").body(Body::empty()).unwrap()).await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
    assert_eq!(anonymous.body["message"], "Unauthorized");

    let mut tampered = login.token.clone();
    tampered.push('x');
    let forged = send(
        &app,
        Request::get("/api/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {tampered}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);

    let by_token = send(
        &app,
        Request::get("/api/auth/me")
            .header(header::AUTHORIZATION, format!("Bearer {}", login.token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(by_token.status, StatusCode::OK);
    assert_eq!(by_token.body["data"]["id"], login.user_id.as_str());

    let by_cookie = send(
        &app,
        Request::get("/api/auth/me")
            .header(header::COOKIE, &login.cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(by_cookie.status, StatusCode::OK);
}

#[tokio::test]
async fn session_writes_need_the_csrf_header() {
    let app = app();
    let login = signup_and_login(&app, "ada").await;

    let without = send(
        &app,
        Request::post("/api/auth/logout")
            .header(header::COOKIE, &login.cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(without.status, StatusCode::FORBIDDEN);
    assert_eq!(without.body["message"], "Invalid CSRF token");

    let with = send(
        &app,
        Request::post("/api/auth/logout")
            .header(header::COOKIE, &login.cookie)
            .header("x-csrf-token", &login.csrf)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(with.status, StatusCode::OK);
    assert_eq!(with.body["message"], "Logout successful");

    let after = send(
        &app,
        Request::get("/api/auth/me")
            .header(header::COOKIE, &login.cookie)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn posts_and_comments_lifecycle() {
    let app = app();
    let ada = signup_and_login(&app, "ada").await;
    let bob = signup_and_login(&app, "bob").await;

    let empty = send(&app, Request::get("/api/posts").body(Body::empty()).unwrap()).await;
    assert_eq!(empty.status, StatusCode::OK);
    assert_eq!(empty.body["data"], json!([]));

    let created = create_post(&app, &ada, "First <post>").await;
    assert_eq!(created.status, StatusCode::OK);
    assert_eq!(created.body["message"], "Post created successfully");
    assert_eq!(created.body["data"]["title"], "First &lt;post&gt;");
    let post_id = created.body["data"]["id"].as_str().unwrap().to_string();
    let cover = created.body["data"]["cover_image"].as_str().unwrap().to_string();
    assert!(cover.starts_with("/uploads/blog-posts/"));

    let served = send(&app, Request::get(cover.as_str()).body(Body::empty()).unwrap()).await;
    assert_eq!(served.status, StatusCode::OK);

    let listed = send(&app, Request::get("/api/posts").body(Body::empty()).unwrap()).await;
    assert_eq!(listed.body["data"].as_array().unwrap().len(), 1);

    let stolen = send(
        &app,
        multipart_request(
            "PUT",
            &format!("/api/posts/{post_id}"),
            &bob.token,
            multipart_body(&[("title", "Mine now")], None),
        ),
    )
    .await;
    assert_eq!(stolen.status, StatusCode::FORBIDDEN);

    let renamed = send(
        &app,
        multipart_request(
            "PUT",
            &format!("/api/posts/{post_id}"),
            &ada.token,
            multipart_body(&[("title", "Renamed"), ("body", "")], None),
        ),
    )
    .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.body["data"]["title"], "Renamed");
    assert_eq!(renamed.body["data"]["body"], "Hello world");

    let comment = send(
        &app,
        json_request("POST", &format!("/api/posts/{post_id}/comments"))
            .header(header::AUTHORIZATION, format!("Bearer {}", bob.token))
            .body(Body::from(json!({ "text": "Nice post" }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(comment.status, StatusCode::OK);
    assert_eq!(comment.body["message"], "Comment created");
    let comment_id = comment.body["data"]["id"].as_str().unwrap().to_string();

    let edit_by_author = send(
        &app,
        json_request("PUT", &format!("/api/comments/{comment_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {}", ada.token))
            .body(Body::from(json!({ "text": "Hijacked" }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(edit_by_author.status, StatusCode::FORBIDDEN);

    let detail = send(
        &app,
        Request::get(format!("/api/posts/{post_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.body["data"]["comments"].as_array().unwrap().len(), 1);

    let deleted = send(
        &app,
        Request::delete(format!("/api/posts/{post_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {}", ada.token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let gone = send(
        &app,
        Request::get(format!("/api/posts/{post_id}"))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
    assert_eq!(gone.body["message"], "Post not found");
}

#[tokio::test]
async fn post_without_cover_is_rejected() {
    let app = app();
    let ada = signup_and_login(&app, "ada").await;

    let body = multipart_body(
        &[("title", "No cover"), ("body", "Text"), ("category", "misc")],
        None,
    );
    let res = send(&app, multipart_request("POST", "/api/posts", &ada.token, body)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0]["field"], "coverImage");
}

#[tokio::test]
async fn malformed_ids_are_not_found() {
    let app = app();

    let res = send(
        &app,
        Request::get("/api/posts/not-a-uuid").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profiles_can_only_be_edited_by_their_owner() {
    let app = app();
    let ada = signup_and_login(&app, "ada").await;
    let bob = signup_and_login(&app, "bob").await;

    let profile = send(
        &app,
        Request::get(format!("/api/profile/{}", ada.user_id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(profile.status, StatusCode::OK);
    assert_eq!(profile.body["data"]["name"], "ada");

    let hijack = send(
        &app,
        multipart_request(
            "PUT",
            &format!("/api/profile/{}", ada.user_id),
            &bob.token,
            multipart_body(&[("bio", "pwned")], None),
        ),
    )
    .await;
    assert_eq!(hijack.status, StatusCode::FORBIDDEN);

    let own = send(
        &app,
        multipart_request(
            "PUT",
            &format!("/api/profile/{}", ada.user_id),
            &ada.token,
            multipart_body(&[("bio", "Writes about Rust"), ("work", "Analyst")], None),
        ),
    )
    .await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.body["message"], "User profile updated successfully");
    assert_eq!(own.body["data"]["profile"]["bio"], "Writes about Rust");

    let posts = send(
        &app,
        Request::get(format!("/api/profile/{}/posts", ada.user_id))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(posts.status, StatusCode::OK);
    assert_eq!(posts.body["data"], json!([]));
}

#[tokio::test]
async fn auth_endpoints_are_rate_limited() {
    let app = app_with(&[("AUTH_RATE_LIMIT_PER_MINUTE", "2")]);

    let body = json!({ "email": "nobody@example.com", "password": "whatever1" });
    let first = post_json(&app, "/api/auth/login", body.clone()).await;
    let second = post_json(&app, "/api/auth/login", body.clone()).await;
    let third = post_json(&app, "/api/auth/login", body).await;

    assert_eq!(first.status, StatusCode::UNAUTHORIZED);
    assert_eq!(second.status, StatusCode::UNAUTHORIZED);
    assert_eq!(third.status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(third.body["message"], "Too many requests, please try again later");
    assert!(third.headers.contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn body_rejections_are_json_errors() {
    let app = app();

    let malformed = send(
        &app,
        json_request("POST", "/api/auth/signup")
            .body(Body::from("{not json"))
            .unwrap(),
    )
    .await;
    assert_eq!(malformed.status, StatusCode::BAD_REQUEST);
    assert_eq!(malformed.body["message"], "Invalid JSON body");

    let wrong_shape = post_json(&app, "/api/auth/login", json!({ "email": 42 })).await;
    assert_eq!(wrong_shape.status, StatusCode::BAD_REQUEST);
    assert_eq!(wrong_shape.body["message"], "Request body has the wrong shape");

    let untyped = send(
        &app,
        Request::post("/api/auth/login")
            .body(Body::from(
                json!({ "email": "a@b.com", "password": PASSWORD }).to_string(),
            ))
            .unwrap(),
    )
    .await;
    assert_eq!(untyped.status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(untyped.body["message"], "Expected a JSON request body");

    let ada = signup_and_login(&app, "ada").await;
    let not_a_form = send(
        &app,
        json_request("PUT", &format!("/api/profile/{}", ada.user_id))
            .header(header::AUTHORIZATION, format!("Bearer {}", ada.token))
            .body(Body::from(json!({ "bio": "hi" }).to_string()))
            .unwrap(),
    )
    .await;
    assert!(not_a_form.status.is_client_error());
    assert!(not_a_form.body["message"].is_string());
}

#[tokio::test]
async fn profile_scoped_post_update_checks_the_path_user() {
    let app = app();
    let ada = signup_and_login(&app, "ada").await;
    let bob = signup_and_login(&app, "bob").await;
    let created = create_post(&app, &ada, "Draft").await;
    let post_id = created.body["data"]["id"].as_str().unwrap().to_string();

    let impersonated = send(
        &app,
        multipart_request(
            "PUT",
            &format!("/api/profile/{}/posts/{post_id}", ada.user_id),
            &bob.token,
            multipart_body(&[("title", "Mine now")], None),
        ),
    )
    .await;
    assert_eq!(impersonated.status, StatusCode::FORBIDDEN);
    assert!(impersonated.body["message"].is_string());

    let updated = send(
        &app,
        multipart_request(
            "PUT",
            &format!("/api/profile/{}/posts/{post_id}", ada.user_id),
            &ada.token,
            multipart_body(&[("title", "Published")], None),
        ),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["message"], "Post updated successfully");
    assert_eq!(updated.body["data"]["title"], "Published");
    assert_eq!(updated.body["data"]["body"], "Hello world");
}

#[tokio::test]
async fn comments_list_and_owner_only_delete() {
    let app = app();
    let ada = signup_and_login(&app, "ada").await;
    let bob = signup_and_login(&app, "bob").await;
    let created = create_post(&app, &ada, "Discuss").await;
    let post_id = created.body["data"]["id"].as_str().unwrap().to_string();

    let comment = send(
        &app,
        json_request("POST", &format!("/api/posts/{post_id}/comments"))
            .header(header::AUTHORIZATION, format!("Bearer {}", bob.token))
            .body(Body::from(json!({ "text": "First!" }).to_string()))
            .unwrap(),
    )
    .await;
    assert_eq!(comment.status, StatusCode::OK);
    let comment_id = comment.body["data"]["id"].as_str().unwrap().to_string();

    let listed = send(
        &app,
        Request::get(format!("/api/posts/{post_id}/comments"))
            .header(header::AUTHORIZATION, format!("Bearer {}", ada.token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(listed.status, StatusCode::OK);
    let comments = listed.body["data"].as_array().unwrap();
    assert_eq!(comments.len(), 1);
    assert_eq!(comments[0]["id"], comment_id.as_str());

    let by_post_author = send(
        &app,
        Request::delete(format!("/api/comments/{comment_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {}", ada.token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(by_post_author.status, StatusCode::FORBIDDEN);

    let by_comment_author = send(
        &app,
        Request::delete(format!("/api/comments/{comment_id}"))
            .header(header::AUTHORIZATION, format!("Bearer {}", bob.token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(by_comment_author.status, StatusCode::NO_CONTENT);

    let after = send(
        &app,
        Request::get(format!("/api/posts/{post_id}/comments"))
            .header(header::AUTHORIZATION, format!("Bearer {}", ada.token))
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(after.body["data"], json!([]));
}

#[tokio::test]
async fn replacing_a_cover_discards_the_old_file() {
    let app = app();
    let ada = signup_and_login(&app, "ada").await;
    let created = create_post(&app, &ada, "Covered").await;
    let post_id = created.body["data"]["id"].as_str().unwrap().to_string();
    let old_cover = created.body["data"]["cover_image"].as_str().unwrap().to_string();

    let updated = send(
        &app,
        multipart_request(
            "PUT",
            &format!("/api/posts/{post_id}"),
            &ada.token,
            multipart_body(&[], Some(("coverImage", PNG_1X1))),
        ),
    )
    .await;
    assert_eq!(updated.status, StatusCode::OK);
    let new_cover = updated.body["data"]["cover_image"].as_str().unwrap().to_string();
    assert_ne!(new_cover, old_cover);

    let old = send(&app, Request::get(old_cover.as_str()).body(Body::empty()).unwrap()).await;
    assert_eq!(old.status, StatusCode::NOT_FOUND);
    let new = send(&app, Request::get(new_cover.as_str()).body(Body::empty()).unwrap()).await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn replacing_a_profile_photo_discards_the_old_file() {
    let app = app();
    let ada = signup_and_login(&app, "ada").await;
    let uri = format!("/api/profile/{}", ada.user_id);

    let first = send(
        &app,
        multipart_request(
            "PUT",
            &uri,
            &ada.token,
            multipart_body(&[], Some(("profilePhoto", PNG_1X1))),
        ),
    )
    .await;
    assert_eq!(first.status, StatusCode::OK);
    let old_photo = first.body["data"]["profile"]["photo_ref"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(old_photo.starts_with("/uploads/user-profiles/"));

    let second = send(
        &app,
        multipart_request(
            "PUT",
            &uri,
            &ada.token,
            multipart_body(&[], Some(("profilePhoto", PNG_1X1))),
        ),
    )
    .await;
    assert_eq!(second.status, StatusCode::OK);
    let new_photo = second.body["data"]["profile"]["photo_ref"]
        .as_str()
        .unwrap()
        .to_string();
    assert_ne!(new_photo, old_photo);

    let old = send(&app, Request::get(old_photo.as_str()).body(Body::empty()).unwrap()).await;
    assert_eq!(old.status, StatusCode::NOT_FOUND);
    let new = send(&app, Request::get(new_photo.as_str()).body(Body::empty()).unwrap()).await;
    assert_eq!(new.status, StatusCode::OK);
}

#[tokio::test]
async fn length_limits_apply_to_escaped_text() {
    let app = app();
    let ada = signup_and_login(&app, "ada").await;
    let bio = "<".repeat(30);

    let res = send(
        &app,
        multipart_request(
            "PUT",
            &format!("/api/profile/{}", ada.user_id),
            &ada.token,
            multipart_body(&[("bio", bio.as_str())], None),
        ),
    )
    .await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body["errors"][0]["field"], "bio");
}
