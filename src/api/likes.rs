use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::{
    app_state::AppState,
    error::AppResult,
    gate::{self, Operation, Target},
    models::Like,
    repr::LikeRepr,
    resolver::Resolver,
    viewer::Vc,
};

use super::{follows::current_user, posts::resolve_post};

/// Who liked a post is visible only to the post's author.
pub async fn list(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<Json<Vec<LikeRepr>>> {
    list_inner(state, vc, None, post_id).await
}

pub async fn list_scoped(
    State(state): State<AppState>,
    vc: Vc,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<LikeRepr>>> {
    list_inner(state, vc, Some(username), post_id).await
}

async fn list_inner(
    state: AppState,
    vc: Vc,
    username: Option<String>,
    post_id: String,
) -> AppResult<Json<Vec<LikeRepr>>> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    gate::enforce(&vc, Operation::Read, &Target::Likes(&post))?;
    let likes = state.store.list_likes(post.id).await?;
    Ok(Json(likes.iter().map(LikeRepr::from).collect()))
}

/// The viewer likes the post. Liking twice is a no-op against the stored
/// row, not a duplicate and not an error.
pub async fn create(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<(StatusCode, Json<LikeRepr>)> {
    create_inner(state, vc, None, post_id).await
}

pub async fn create_scoped(
    State(state): State<AppState>,
    vc: Vc,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<(StatusCode, Json<LikeRepr>)> {
    create_inner(state, vc, Some(username), post_id).await
}

async fn create_inner(
    state: AppState,
    vc: Vc,
    username: Option<String>,
    post_id: String,
) -> AppResult<(StatusCode, Json<LikeRepr>)> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    let actor = current_user(&state, &vc).await?;

    let candidate = Like {
        post_id: post.id,
        user_id: actor.id,
        username: actor.username.clone(),
        created: Utc::now(),
    };
    gate::enforce(&vc, Operation::Create, &Target::Like { like: &candidate, post: &post })?;

    let (like, created) = state.store.create_like(post.id, actor.id).await?;
    let status = if created {
        info!(username = %like.username, post = %post.id, "created like");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(LikeRepr::from(&like))))
}

pub async fn detail(
    State(state): State<AppState>,
    vc: Vc,
    Path((post_id, liker)): Path<(String, String)>,
) -> AppResult<Json<LikeRepr>> {
    detail_inner(state, vc, None, post_id, liker).await
}

pub async fn detail_scoped(
    State(state): State<AppState>,
    vc: Vc,
    Path((username, post_id, liker)): Path<(String, String, String)>,
) -> AppResult<Json<LikeRepr>> {
    detail_inner(state, vc, Some(username), post_id, liker).await
}

async fn detail_inner(
    state: AppState,
    vc: Vc,
    username: Option<String>,
    post_id: String,
    liker: String,
) -> AppResult<Json<LikeRepr>> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    let like = Resolver::new(&state.store).like(&post, &liker).await?;
    gate::enforce(&vc, Operation::Read, &Target::Like { like: &like, post: &post })?;
    Ok(Json(LikeRepr::from(&like)))
}

pub async fn remove(
    State(state): State<AppState>,
    vc: Vc,
    Path((post_id, liker)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    remove_inner(state, vc, None, post_id, liker).await
}

pub async fn remove_scoped(
    State(state): State<AppState>,
    vc: Vc,
    Path((username, post_id, liker)): Path<(String, String, String)>,
) -> AppResult<StatusCode> {
    remove_inner(state, vc, Some(username), post_id, liker).await
}

async fn remove_inner(
    state: AppState,
    vc: Vc,
    username: Option<String>,
    post_id: String,
    liker: String,
) -> AppResult<StatusCode> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    let like = Resolver::new(&state.store).like(&post, &liker).await?;

    gate::enforce(&vc, Operation::Delete, &Target::Like { like: &like, post: &post })?;
    state.store.delete_like(post.id, like.user_id).await?;
    info!(username = %like.username, post = %post.id, "removed like");
    Ok(StatusCode::NO_CONTENT)
}
