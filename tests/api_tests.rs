//! HTTP-level tests for the auth, article, review and like flows.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use newsbin::config::Config;
use tower::ServiceExt;

async fn spawn_app() -> Router {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    // A pooled in-memory sqlite would give every connection its own database.
    config.general.max_db_connections = 1;
    config.general.min_db_connections = 1;
    config.server.secure_cookies = false;

    let state = newsbin::api::create_app_state_from_config(config)
        .await
        .expect("failed to create app state");
    newsbin::api::router(state).await
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert(header::COOKIE, cookie.parse().unwrap());
    request
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Register an account and return the session cookie.
async fn register(app: &Router, username: &str, email: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "first_name": "Test",
                "last_name": "User",
                "email": email,
                "username": username,
                "password": password,
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("register should start a session")
        .to_str()
        .unwrap();
    cookie.split(';').next().unwrap().to_string()
}

async fn post_article(app: &Router, cookie: &str, title: &str, body_text: &str) -> i32 {
    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "POST",
                "/api/articles",
                serde_json::json!({ "title": title, "body": body_text }),
            ),
            cookie,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    body["data"]["id"].as_i64().unwrap() as i32
}

#[tokio::test]
async fn register_login_logout_flow() {
    let app = spawn_app().await;

    let cookie = register(&app, "alice", "alice@example.com", "hunter22").await;

    // Session from registration is immediately usable.
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/auth/me")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["username"], "alice");

    // Fresh login issues its own session.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "username": "alice", "password": "hunter22" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Logged in as Test User.");

    // Wrong password is rejected with the generic message.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/login",
            serde_json::json!({ "username": "alice", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Please enter valid credentials.");
}

#[tokio::test]
async fn register_rejects_duplicates() {
    let app = spawn_app().await;

    register(&app, "bob", "bob@example.com", "password1").await;

    // Same username, different email: username conflict wins.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "first_name": "Other",
                "last_name": "Bob",
                "email": "other@example.com",
                "username": "bob",
                "password": "password2",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"], "The entered username is already taken.");

    // Fresh username, reused email.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/register",
            serde_json::json!({
                "first_name": "Other",
                "last_name": "Bob",
                "email": "bob@example.com",
                "username": "bob2",
                "password": "password2",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = json_body(response).await;
    assert_eq!(body["error"], "The entered email address is already in use.");
}

#[tokio::test]
async fn protected_routes_require_session() {
    let app = spawn_app().await;

    // Posting resolves the session user in the handler itself.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/articles",
            serde_json::json!({ "title": "t", "body": "b" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    for (method, uri) in [
        ("GET", "/api/articles/favourites"),
        ("PUT", "/api/users/me"),
        ("DELETE", "/api/users/me"),
        ("GET", "/api/news"),
    ] {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::UNAUTHORIZED,
            "{method} {uri} should require a session"
        );
    }

    // The listing stays public.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/articles")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn article_crud_and_listing() {
    let app = spawn_app().await;
    let cookie = register(&app, "carol", "carol@example.com", "password1").await;

    let long_body = "y".repeat(600);
    let id = post_article(&app, &cookie, "First post", &long_body).await;

    // Listing truncates the body to the excerpt length.
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/articles")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(response).await;
    let excerpt = body["data"][0]["excerpt"].as_str().unwrap();
    assert_eq!(excerpt.chars().count(), 475 + 8);
    assert!(excerpt.ends_with("........"));

    // Detail view carries the full body.
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri(format!("/api/articles/{id}"))
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["content"].as_str().unwrap().len(), 600);
    assert_eq!(body["data"]["is_owner"], true);
    assert_eq!(body["data"]["owner_name"], "Test User");

    // Edit, then delete.
    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PUT",
                &format!("/api/articles/{id}"),
                serde_json::json!({ "title": "Edited", "body": "new body" }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/articles/{id}"))
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri(format!("/api/articles/{id}"))
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_owner_may_edit_or_delete() {
    let app = spawn_app().await;
    let owner = register(&app, "dave", "dave@example.com", "password1").await;
    let other = register(&app, "erin", "erin@example.com", "password2").await;

    let id = post_article(&app, &owner, "Dave's post", "content").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PUT",
                &format!("/api/articles/{id}"),
                serde_json::json!({ "title": "Hijacked", "body": "nope" }),
            ),
            &other,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/articles/{id}"))
                .body(Body::empty())
                .unwrap(),
            &other,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn like_toggle_is_an_involution() {
    let app = spawn_app().await;
    let owner = register(&app, "frank", "frank@example.com", "password1").await;
    let liker = register(&app, "grace", "grace@example.com", "password2").await;

    let id = post_article(&app, &owner, "Likeable", "content").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("POST")
                .uri(format!("/api/articles/{id}/like"))
                .body(Body::empty())
                .unwrap(),
            &liker,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["message"], "Post added to your favourites.");

    // Liked article shows up in favourites.
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/articles/favourites")
                .body(Body::empty())
                .unwrap(),
            &liker,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Second toggle removes it again.
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("POST")
                .uri(format!("/api/articles/{id}/like"))
                .body(Body::empty())
                .unwrap(),
            &liker,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["message"], "Post removed from your favourites.");

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri("/api/articles/favourites")
                .body(Body::empty())
                .unwrap(),
            &liker,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn reviews_attach_and_detach() {
    let app = spawn_app().await;
    let owner = register(&app, "heidi", "heidi@example.com", "password1").await;
    let reviewer = register(&app, "ivan", "ivan@example.com", "password2").await;

    let id = post_article(&app, &owner, "Reviewable", "content").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "POST",
                &format!("/api/articles/{id}/reviews"),
                serde_json::json!({ "rating": 4, "comment": "Nice read" }),
            ),
            &reviewer,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Your comment has been added");
    let review_id = body["data"]["id"].as_i64().unwrap();

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri(format!("/api/articles/{id}"))
                .body(Body::empty())
                .unwrap(),
            &owner,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["reviews"][0]["author"], "ivan");
    assert_eq!(body["data"]["reviews"][0]["rating"], 4);

    // Any logged-in user can delete; the owner removes it here.
    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("DELETE")
                .uri(format!("/api/articles/{id}/reviews/{review_id}"))
                .body(Body::empty())
                .unwrap(),
            &owner,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .uri(format!("/api/articles/{id}"))
                .body(Body::empty())
                .unwrap(),
            &owner,
        ))
        .await
        .unwrap();
    let body = json_body(response).await;
    assert_eq!(body["data"]["reviews"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn review_rejects_bad_rating_and_missing_article() {
    let app = spawn_app().await;
    let cookie = register(&app, "judy", "judy@example.com", "password1").await;
    let id = post_article(&app, &cookie, "Post", "content").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "POST",
                &format!("/api/articles/{id}/reviews"),
                serde_json::json!({ "rating": 9, "comment": "too high" }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "POST",
                "/api/articles/9999/reviews",
                serde_json::json!({ "rating": 3, "comment": "ghost" }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn search_matches_title_owner_and_body() {
    let app = spawn_app().await;
    let cookie = register(&app, "mallory", "mallory@example.com", "password1").await;

    post_article(&app, &cookie, "Rust ownership explained", "borrow checker basics").await;
    post_article(&app, &cookie, "Cooking tips", "how to sharpen knives").await;

    let cases = [
        ("ownership", 1), // title
        ("mallory", 2),   // owner
        ("knives", 1),    // body
        ("rust", 1),      // case-insensitive: title says "Rust"
        ("MALLORY", 2),   // case-insensitive: owner is "mallory"
        ("zzzz", 0),
    ];

    for (term, expected) in cases {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri(format!("/api/articles/search?q={term}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(
            body["data"].as_array().unwrap().len(),
            expected,
            "query {term:?}"
        );
    }
}

#[tokio::test]
async fn profile_page_uses_short_excerpts() {
    let app = spawn_app().await;
    let cookie = register(&app, "nick", "nick@example.com", "password1").await;

    post_article(&app, &cookie, "Long one", &"z".repeat(400)).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/nick")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["user"]["username"], "nick");
    // Profile excerpts use the short three-dot marker, not the listing run.
    let excerpt = body["data"]["posts"][0]["excerpt"].as_str().unwrap();
    assert_eq!(excerpt.chars().count(), 175 + 3);
    assert!(excerpt.ends_with("z..."));
}

#[tokio::test]
async fn profile_update_requires_current_password() {
    let app = spawn_app().await;
    let cookie = register(&app, "olivia", "olivia@example.com", "password1").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PUT",
                "/api/users/me",
                serde_json::json!({
                    "name": "Olivia Renamed",
                    "username": "olivia",
                    "bio": "",
                    "password": "not-the-password",
                }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PUT",
                "/api/users/me",
                serde_json::json!({
                    "name": "Olivia Renamed",
                    "username": "olivia",
                    "bio": "",
                    "password": "password1",
                }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["name"], "Olivia Renamed");
}

#[tokio::test]
async fn rename_to_taken_username_conflicts() {
    let app = spawn_app().await;
    register(&app, "peggy", "peggy@example.com", "password1").await;
    let cookie = register(&app, "quentin", "quentin@example.com", "password2").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            json_request(
                "PUT",
                "/api/users/me",
                serde_json::json!({
                    "name": "Quentin",
                    "username": "peggy",
                    "bio": "",
                    "password": "password2",
                }),
            ),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn account_deletion_removes_profile() {
    let app = spawn_app().await;
    let cookie = register(&app, "rupert", "rupert@example.com", "password1").await;

    let response = app
        .clone()
        .oneshot(with_cookie(
            Request::builder()
                .method("DELETE")
                .uri("/api/users/me")
                .body(Body::empty())
                .unwrap(),
            &cookie,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/rupert")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn forgot_password_rejects_unknown_and_mismatched() {
    let app = spawn_app().await;
    register(&app, "sybil", "sybil@example.com", "password1").await;

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/forgot-password",
            serde_json::json!({
                "username": "nobody",
                "new_password": "a",
                "confirm_password": "a",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/forgot-password",
            serde_json::json!({
                "username": "sybil",
                "new_password": "newpass1",
                "confirm_password": "different",
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Verify without a pending request.
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/auth/verify-reset",
            serde_json::json!({ "username": "sybil", "code": 1234 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn file_backed_database_survives_restart() {
    let db_path = std::env::temp_dir().join(format!("newsbin-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.secure_cookies = false;

    let state = newsbin::api::create_app_state_from_config(config.clone())
        .await
        .expect("failed to create app state");
    let app = newsbin::api::router(state).await;
    register(&app, "walter", "walter@example.com", "password1").await;
    drop(app);

    // A second app over the same file sees the account.
    let state = newsbin::api::create_app_state_from_config(config)
        .await
        .expect("failed to reopen app state");
    let app = newsbin::api::router(state).await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/users/walter")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let _ = std::fs::remove_file(&db_path);
}

#[tokio::test]
async fn system_status_is_public() {
    let app = spawn_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/system/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["database"], "ok");
}
