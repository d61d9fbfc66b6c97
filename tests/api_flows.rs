// End-to-end flows through the full router: registration, login, nested
// resource resolution, authorization denials, cascades.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use openfeed::{
    api,
    app_state::AppState,
    config::{AuthConfig, Config, DatabaseConfig, ServerConfig},
    store::Store,
};

async fn test_app() -> Router {
    let config = Config {
        database: DatabaseConfig {
            url: "sqlite::memory:".to_string(),
        },
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
        },
        auth: AuthConfig {
            token_secret: "test-secret".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 86400,
        },
    };
    let store = Store::in_memory().await.unwrap();
    api::app(AppState { store, config })
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(value) => builder
            .header("content-type", "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, username: &str) {
    let (status, _) = send(
        app,
        "POST",
        "/api/users",
        None,
        Some(json!({
            "username": username,
            "email": format!("{}@example.com", username),
            "password": "password123",
            "profile": { "description": format!("I am {}", username) }
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

async fn login(app: &Router, username: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/users/token",
        None,
        Some(json!({ "username": username, "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], username);
    body["access"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn register_login_post_and_read_back() {
    let app = test_app().await;
    register(&app, "alice").await;
    let token = login(&app, "alice").await;

    let (status, post) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&token),
        Some(json!({ "description": "hi", "tags": ["intro"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["author"], "alice");
    assert_eq!(post["tags"], json!(["intro"]));

    let post_id = post["id"].as_str().unwrap();
    let (status, fetched) = send(&app, "GET", &format!("/api/posts/{}", post_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["author"], "alice");
    assert_eq!(fetched["tags"], json!(["intro"]));
    assert_eq!(fetched["likes_number"], 0);

    // The scoped path resolves too.
    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/users/alice/posts/{}", post_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // User detail carries the profile created at registration.
    let (status, user) = send(&app, "GET", "/api/users/alice", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(user["profile"]["description"], "I am alice");
    assert_eq!(user["profile"]["privacy"], "public");
}

#[tokio::test]
async fn foreign_patch_is_forbidden_with_reason_and_id() {
    let app = test_app().await;
    register(&app, "alice").await;
    register(&app, "bob").await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    let (_, post) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&alice),
        Some(json!({ "description": "mine" })),
    )
    .await;
    let post_id = post["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "PATCH",
        &format!("/api/posts/{}", post_id),
        Some(&bob),
        Some(json!({ "description": "hijacked" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["id"], *post_id);
    assert!(body["message"].as_str().unwrap().contains("permission"));
}

#[tokio::test]
async fn cross_user_scoped_lookup_is_not_found_not_forbidden() {
    let app = test_app().await;
    register(&app, "alice").await;
    register(&app, "bob").await;
    let bob = login(&app, "bob").await;

    let (_, post) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&bob),
        Some(json!({ "description": "bobs" })),
    )
    .await;
    let post_id = post["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "GET",
        &format!("/api/users/alice/posts/{}", post_id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn follow_list_and_followee_removal() {
    let app = test_app().await;
    register(&app, "alice").await;
    register(&app, "bob").await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    let (status, edge) = send(&app, "POST", "/api/users/bob/followers", Some(&alice), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(edge["follower"], "alice");
    assert_eq!(edge["followee"], "bob");

    let (status, followers) = send(&app, "GET", "/api/users/bob/followers", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(followers[0]["follower"], "alice");

    let (status, following) = send(&app, "GET", "/api/users/alice/following", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(following[0]["followee"], "bob");

    // The followee removes an unwanted follower.
    let (status, _) = send(
        &app,
        "DELETE",
        "/api/users/bob/followers/alice",
        Some(&bob),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, followers) = send(&app, "GET", "/api/users/bob/followers", None, None).await;
    assert_eq!(followers, json!([]));
}

#[tokio::test]
async fn self_follow_and_duplicate_follow_are_rejected() {
    let app = test_app().await;
    register(&app, "alice").await;
    register(&app, "bob").await;
    let alice = login(&app, "alice").await;

    let (status, _) = send(&app, "POST", "/api/users/alice/followers", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "POST", "/api/users/bob/followers", Some(&alice), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = send(&app, "POST", "/api/users/bob/followers", Some(&alice), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn likes_are_idempotent_and_visible_only_to_the_author() {
    let app = test_app().await;
    register(&app, "alice").await;
    register(&app, "bob").await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    let (_, post) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&alice),
        Some(json!({ "description": "likeable" })),
    )
    .await;
    let post_id = post["id"].as_str().unwrap();
    let likes_uri = format!("/api/posts/{}/likes", post_id);

    let (status, like) = send(&app, "POST", &likes_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(like["username"], "bob");

    // Second like: absorbed, not duplicated and not an error.
    let (status, _) = send(&app, "POST", &likes_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::OK);

    // Only the post's author may list likes.
    let (status, _) = send(&app, "GET", &likes_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "GET", &likes_uri, None, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, likes) = send(&app, "GET", &likes_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(likes, json!([{ "username": "bob" }]));

    // Not even the post author may remove bob's like.
    let unlike_uri = format!("/api/posts/{}/likes/bob", post_id);
    let (status, _) = send(&app, "DELETE", &unlike_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "DELETE", &unlike_uri, Some(&bob), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, likes) = send(&app, "GET", &likes_uri, Some(&alice), None).await;
    assert_eq!(likes, json!([]));
}

#[tokio::test]
async fn post_owner_moderates_comments() {
    let app = test_app().await;
    register(&app, "alice").await;
    register(&app, "bob").await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    let (_, post) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&alice),
        Some(json!({ "description": "open thread" })),
    )
    .await;
    let post_id = post["id"].as_str().unwrap();

    let (status, comment) = send(
        &app,
        "POST",
        &format!("/api/posts/{}/comments", post_id),
        Some(&bob),
        Some(json!({ "body": "spam" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(comment["author"], "bob");
    // Nested comment representation has no post back-reference.
    assert!(comment.get("post_id").is_none());

    let comment_id = comment["id"].as_str().unwrap();
    let comment_uri = format!("/api/posts/{}/comments/{}", post_id, comment_id);

    // The post's author may delete a comment they did not write.
    let (status, _) = send(&app, "DELETE", &comment_uri, Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, "GET", &comment_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_reads_allowed_writes_unauthorized() {
    let app = test_app().await;
    register(&app, "alice").await;

    let (status, _) = send(&app, "GET", "/api/users", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "GET", "/api/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        "POST",
        "/api/posts",
        None,
        Some(json!({ "description": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        "PATCH",
        "/api/users/alice",
        None,
        Some(json!({ "email": "new@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn deleting_an_account_cascades_through_the_api() {
    let app = test_app().await;
    register(&app, "alice").await;
    register(&app, "bob").await;
    let alice = login(&app, "alice").await;
    let bob = login(&app, "bob").await;

    let (_, post) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&alice),
        Some(json!({ "description": "fleeting", "tags": ["bye"] })),
    )
    .await;
    let post_id = post["id"].as_str().unwrap().to_string();
    send(&app, "POST", "/api/users/bob/followers", Some(&alice), None).await;

    let (status, _) = send(&app, "DELETE", "/api/users/alice", Some(&alice), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/api/users/alice", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, "GET", &format!("/api/posts/{}", post_id), None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, followers) = send(&app, "GET", "/api/users/bob/followers", Some(&bob), None).await;
    assert_eq!(followers, json!([]));
}

#[tokio::test]
async fn duplicate_username_is_rejected() {
    let app = test_app().await;
    register(&app, "alice").await;

    let (status, body) = send(
        &app,
        "POST",
        "/api/users",
        None,
        Some(json!({
            "username": "alice",
            "email": "other@example.com",
            "password": "password123"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("taken"));
}

#[tokio::test]
async fn refresh_token_mints_a_working_access_token() {
    let app = test_app().await;
    register(&app, "alice").await;

    let (_, tokens) = send(
        &app,
        "POST",
        "/api/users/token",
        None,
        Some(json!({ "username": "alice", "password": "password123" })),
    )
    .await;
    let refresh = tokens["refresh"].as_str().unwrap();

    let (status, refreshed) = send(
        &app,
        "POST",
        "/api/users/token/refresh",
        None,
        Some(json!({ "refresh": refresh })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let access = refreshed["access"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        "POST",
        "/api/posts",
        Some(&access),
        Some(json!({ "description": "via refresh" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    // A refresh token is not an access token.
    let (status, _) = send(
        &app,
        "POST",
        "/api/posts",
        Some(refresh),
        Some(json!({ "description": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn tags_are_shared_listed_and_read_only() {
    let app = test_app().await;
    register(&app, "alice").await;
    let alice = login(&app, "alice").await;

    for desc in ["one", "two"] {
        let (status, _) = send(
            &app,
            "POST",
            "/api/posts",
            Some(&alice),
            Some(json!({ "description": desc, "tags": ["shared"] })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, tags) = send(&app, "GET", "/api/tags", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tags.as_array().unwrap().len(), 1);
    assert_eq!(tags[0]["name"], "shared");

    let (status, tag) = send(&app, "GET", "/api/tags/shared", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tag["name"], "shared");

    let (status, _) = send(&app, "GET", "/api/tags/missing", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
