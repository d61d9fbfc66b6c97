use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::{
    app_state::AppState,
    error::AppResult,
    gate::{self, Operation, Target},
    models::Comment,
    repr::{CommentInput, CommentRepr},
    resolver::{parse_id, Resolver},
    viewer::Vc,
};

use super::{follows::current_user, posts::resolve_post};

pub async fn list(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<Vec<CommentRepr>>> {
    list_inner(state, None, post_id).await
}

pub async fn list_scoped(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<CommentRepr>>> {
    list_inner(state, Some(username), post_id).await
}

async fn list_inner(
    state: AppState,
    username: Option<String>,
    post_id: String,
) -> AppResult<Json<Vec<CommentRepr>>> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    let comments = state.store.list_comments(post.id).await?;
    Ok(Json(comments.iter().map(CommentRepr::from).collect()))
}

pub async fn create(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
    Json(input): Json<CommentInput>,
) -> AppResult<(StatusCode, Json<CommentRepr>)> {
    create_inner(state, vc, None, post_id, input).await
}

pub async fn create_scoped(
    State(state): State<AppState>,
    vc: Vc,
    Path((username, post_id)): Path<(String, String)>,
    Json(input): Json<CommentInput>,
) -> AppResult<(StatusCode, Json<CommentRepr>)> {
    create_inner(state, vc, Some(username), post_id, input).await
}

async fn create_inner(
    state: AppState,
    vc: Vc,
    username: Option<String>,
    post_id: String,
    input: CommentInput,
) -> AppResult<(StatusCode, Json<CommentRepr>)> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    // The author is forced to the viewer, never taken from the body.
    let actor = current_user(&state, &vc).await?;
    input.validate()?;

    let candidate = Comment {
        id: Uuid::nil(),
        post_id: post.id,
        author_id: actor.id,
        author: actor.username.clone(),
        body: input.body.trim().to_string(),
        created: Utc::now(),
    };
    gate::enforce(&vc, Operation::Create, &Target::Comment { comment: &candidate, post: &post })?;

    let comment = state
        .store
        .create_comment(post.id, actor.id, input.body.trim())
        .await?;

    info!(author = %comment.author, post = %post.id, "created comment");
    Ok((StatusCode::CREATED, Json(CommentRepr::from(&comment))))
}

pub async fn detail(
    State(state): State<AppState>,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<Json<CommentRepr>> {
    detail_inner(state, None, post_id, comment_id).await
}

pub async fn detail_scoped(
    State(state): State<AppState>,
    Path((username, post_id, comment_id)): Path<(String, String, String)>,
) -> AppResult<Json<CommentRepr>> {
    detail_inner(state, Some(username), post_id, comment_id).await
}

async fn detail_inner(
    state: AppState,
    username: Option<String>,
    post_id: String,
    comment_id: String,
) -> AppResult<Json<CommentRepr>> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    let comment = Resolver::new(&state.store)
        .comment(&post, parse_id(&comment_id, "comment")?)
        .await?;
    Ok(Json(CommentRepr::from(&comment)))
}

pub async fn update(
    State(state): State<AppState>,
    vc: Vc,
    Path((post_id, comment_id)): Path<(String, String)>,
    Json(input): Json<CommentInput>,
) -> AppResult<Json<CommentRepr>> {
    update_inner(state, vc, None, post_id, comment_id, input).await
}

pub async fn update_scoped(
    State(state): State<AppState>,
    vc: Vc,
    Path((username, post_id, comment_id)): Path<(String, String, String)>,
    Json(input): Json<CommentInput>,
) -> AppResult<Json<CommentRepr>> {
    update_inner(state, vc, Some(username), post_id, comment_id, input).await
}

async fn update_inner(
    state: AppState,
    vc: Vc,
    username: Option<String>,
    post_id: String,
    comment_id: String,
    input: CommentInput,
) -> AppResult<Json<CommentRepr>> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    let resolver = Resolver::new(&state.store);
    let comment = resolver.comment(&post, parse_id(&comment_id, "comment")?).await?;

    gate::enforce(&vc, Operation::Update, &Target::Comment { comment: &comment, post: &post })?;
    input.validate()?;
    state.store.update_comment(comment.id, input.body.trim()).await?;

    let updated = resolver.comment(&post, comment.id).await?;
    Ok(Json(CommentRepr::from(&updated)))
}

pub async fn remove(
    State(state): State<AppState>,
    vc: Vc,
    Path((post_id, comment_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    remove_inner(state, vc, None, post_id, comment_id).await
}

pub async fn remove_scoped(
    State(state): State<AppState>,
    vc: Vc,
    Path((username, post_id, comment_id)): Path<(String, String, String)>,
) -> AppResult<StatusCode> {
    remove_inner(state, vc, Some(username), post_id, comment_id).await
}

async fn remove_inner(
    state: AppState,
    vc: Vc,
    username: Option<String>,
    post_id: String,
    comment_id: String,
) -> AppResult<StatusCode> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    let comment = Resolver::new(&state.store)
        .comment(&post, parse_id(&comment_id, "comment")?)
        .await?;

    gate::enforce(&vc, Operation::Delete, &Target::Comment { comment: &comment, post: &post })?;
    state.store.delete_comment(comment.id).await?;
    info!(comment = %comment.id, post = %post.id, "deleted comment");
    Ok(StatusCode::NO_CONTENT)
}
