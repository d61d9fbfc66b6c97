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
    models::{Post, User},
    repr::{self, PostInput, PostPatch, PostRepr, Projection},
    resolver::{parse_id, Resolver},
    viewer::Vc,
};

use super::follows::current_user;

// Every post handler exists in two addressing modes: globally-scoped
// (/posts/...) and user-scoped (/users/{username}/posts/...). The scoped
// wrappers resolve the owner first and pass it down so the resolver can
// verify ownership, not just existence.

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<PostRepr>>> {
    list_inner(state, None).await
}

pub async fn list_scoped(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<PostRepr>>> {
    let owner = Resolver::new(&state.store).user(&username).await?;
    list_inner(state, Some(owner)).await
}

async fn list_inner(state: AppState, scope: Option<User>) -> AppResult<Json<Vec<PostRepr>>> {
    let posts = match &scope {
        Some(owner) => state.store.list_posts_by(owner.id).await?,
        None => state.store.list_posts().await?,
    };
    let mut reprs = Vec::with_capacity(posts.len());
    for post in &posts {
        reprs.push(repr::post_repr(&state.store, post, Projection::Summary).await?);
    }
    Ok(Json(reprs))
}

pub async fn create(
    State(state): State<AppState>,
    vc: Vc,
    Json(input): Json<PostInput>,
) -> AppResult<(StatusCode, Json<PostRepr>)> {
    create_inner(state, vc, input).await
}

pub async fn create_scoped(
    State(state): State<AppState>,
    vc: Vc,
    Path(username): Path<String>,
    Json(input): Json<PostInput>,
) -> AppResult<(StatusCode, Json<PostRepr>)> {
    // The path segment must resolve, but the author is still forced to the
    // viewer; a request body or path naming someone else cannot impersonate.
    Resolver::new(&state.store).user(&username).await?;
    create_inner(state, vc, input).await
}

async fn create_inner(
    state: AppState,
    vc: Vc,
    input: PostInput,
) -> AppResult<(StatusCode, Json<PostRepr>)> {
    let actor = current_user(&state, &vc).await?;

    let candidate = Post {
        id: Uuid::nil(),
        author_id: actor.id,
        author: actor.username.clone(),
        description: input.description.clone(),
        created: Utc::now(),
    };
    gate::enforce(&vc, Operation::Create, &Target::Post(&candidate))?;

    let tags = repr::resolve_tag_names(&state.store, &input.tags).await?;
    let tag_names: Vec<String> = tags.into_iter().map(|t| t.name).collect();
    let post = state
        .store
        .create_post(actor.id, input.description.as_deref(), &tag_names)
        .await?;

    info!(author = %post.author, post = %post.id, "created post");
    let body = repr::post_repr(&state.store, &post, Projection::Full).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Json<PostRepr>> {
    detail_inner(state, None, post_id).await
}

pub async fn detail_scoped(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<Json<PostRepr>> {
    detail_inner(state, Some(username), post_id).await
}

async fn detail_inner(
    state: AppState,
    username: Option<String>,
    post_id: String,
) -> AppResult<Json<PostRepr>> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    let body = repr::post_repr(&state.store, &post, Projection::Full).await?;
    Ok(Json(body))
}

pub async fn update(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
    Json(patch): Json<PostPatch>,
) -> AppResult<Json<PostRepr>> {
    update_inner(state, vc, None, post_id, patch).await
}

pub async fn update_scoped(
    State(state): State<AppState>,
    vc: Vc,
    Path((username, post_id)): Path<(String, String)>,
    Json(patch): Json<PostPatch>,
) -> AppResult<Json<PostRepr>> {
    update_inner(state, vc, Some(username), post_id, patch).await
}

async fn update_inner(
    state: AppState,
    vc: Vc,
    username: Option<String>,
    post_id: String,
    patch: PostPatch,
) -> AppResult<Json<PostRepr>> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    gate::enforce(&vc, Operation::Update, &Target::Post(&post))?;

    let tag_names = match &patch.tags {
        Some(names) => {
            let tags = repr::resolve_tag_names(&state.store, names).await?;
            Some(tags.into_iter().map(|t| t.name).collect::<Vec<_>>())
        }
        None => None,
    };
    state
        .store
        .update_post(post.id, patch.description.as_deref(), tag_names.as_deref())
        .await?;

    let updated = Resolver::new(&state.store).post(None, post.id).await?;
    let body = repr::post_repr(&state.store, &updated, Projection::Full).await?;
    Ok(Json(body))
}

pub async fn remove(
    State(state): State<AppState>,
    vc: Vc,
    Path(post_id): Path<String>,
) -> AppResult<StatusCode> {
    remove_inner(state, vc, None, post_id).await
}

pub async fn remove_scoped(
    State(state): State<AppState>,
    vc: Vc,
    Path((username, post_id)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    remove_inner(state, vc, Some(username), post_id).await
}

async fn remove_inner(
    state: AppState,
    vc: Vc,
    username: Option<String>,
    post_id: String,
) -> AppResult<StatusCode> {
    let post = resolve_post(&state, username.as_deref(), &post_id).await?;
    gate::enforce(&vc, Operation::Delete, &Target::Post(&post))?;
    state.store.delete_post(post.id).await?;
    info!(post = %post.id, "deleted post");
    Ok(StatusCode::NO_CONTENT)
}

pub(crate) async fn resolve_post(
    state: &AppState,
    username: Option<&str>,
    post_id: &str,
) -> AppResult<Post> {
    let resolver = Resolver::new(&state.store);
    let id = parse_id(post_id, "post")?;
    match username {
        Some(username) => {
            let owner = resolver.user(username).await?;
            resolver.post(Some(&owner), id).await
        }
        None => resolver.post(None, id).await,
    }
}
