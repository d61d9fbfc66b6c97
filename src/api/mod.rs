// REST surface. Routes mirror the nested resource paths; every handler
// follows the same sequence: resolve the target through the Resolver,
// check the viewer against the authorization gate, then touch the store
// and map the result through the representation layer.

use axum::{middleware, routing::get, Json, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::{app_state::AppState, auth, viewer};

pub mod comments;
pub mod follows;
pub mod likes;
pub mod posts;
pub mod tags;
pub mod users;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_routes))
        .route("/users", get(users::list).post(users::register))
        .route(
            "/users/{username}",
            get(users::detail).patch(users::update).delete(users::remove),
        )
        .route(
            "/users/{username}/followers",
            get(follows::list_followers).post(follows::follow),
        )
        .route(
            "/users/{username}/followers/{follower}",
            get(follows::follower_detail).delete(follows::unfollow),
        )
        .route("/users/{username}/following", get(follows::list_following))
        .route(
            "/users/{username}/following/{followee}",
            get(follows::following_detail),
        )
        .route(
            "/users/{username}/posts",
            get(posts::list_scoped).post(posts::create_scoped),
        )
        .route(
            "/users/{username}/posts/{post}",
            get(posts::detail_scoped)
                .patch(posts::update_scoped)
                .delete(posts::remove_scoped),
        )
        .route(
            "/users/{username}/posts/{post}/comments",
            get(comments::list_scoped).post(comments::create_scoped),
        )
        .route(
            "/users/{username}/posts/{post}/comments/{comment}",
            get(comments::detail_scoped)
                .patch(comments::update_scoped)
                .delete(comments::remove_scoped),
        )
        .route(
            "/users/{username}/posts/{post}/likes",
            get(likes::list_scoped).post(likes::create_scoped),
        )
        .route(
            "/users/{username}/posts/{post}/likes/{liker}",
            get(likes::detail_scoped).delete(likes::remove_scoped),
        )
        .route("/posts", get(posts::list).post(posts::create))
        .route(
            "/posts/{post}",
            get(posts::detail).patch(posts::update).delete(posts::remove),
        )
        .route(
            "/posts/{post}/comments",
            get(comments::list).post(comments::create),
        )
        .route(
            "/posts/{post}/comments/{comment}",
            get(comments::detail)
                .patch(comments::update)
                .delete(comments::remove),
        )
        .route("/posts/{post}/likes", get(likes::list).post(likes::create))
        .route(
            "/posts/{post}/likes/{liker}",
            get(likes::detail).delete(likes::remove),
        )
        .route("/tags", get(tags::list))
        .route("/tags/{name}", get(tags::detail))
}

/// Full application with auth routes, viewer middleware and CORS.
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api", router().merge(auth::router()))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            viewer::viewer_context_middleware,
        ))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn get_routes() -> Json<serde_json::Value> {
    Json(serde_json::json!([
        { "GET": "/api/users" },
        { "POST": "/api/users" },
        { "POST": "/api/users/token" },
        { "POST": "/api/users/token/refresh" },
        { "GET": "/api/users/{username}" },
        { "GET": "/api/users/{username}/followers" },
        { "GET": "/api/users/{username}/following" },
        { "GET": "/api/users/{username}/posts" },
        { "POST": "/api/users/{username}/posts" },
        { "GET": "/api/posts" },
        { "GET": "/api/posts/{post}/comments" },
        { "GET": "/api/posts/{post}/likes" },
        { "GET": "/api/tags" },
        { "GET": "/api/tags/{name}" },
    ]))
}
