use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::info;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    gate::{self, Operation, Target},
    models::{FollowEdge, User},
    repr::FollowRepr,
    resolver::Resolver,
    viewer::Vc,
};

/// The acting identity as a stored user. Tokens outlive accounts, so the
/// row is re-read rather than trusted from the claims alone.
pub(crate) async fn current_user(state: &AppState, vc: &Vc) -> AppResult<User> {
    let user_id = vc
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_string()))?;
    state
        .store
        .get_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))
}

pub async fn list_followers(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<FollowRepr>>> {
    let user = Resolver::new(&state.store).user(&username).await?;
    let edges = state.store.followers_of(user.id).await?;
    Ok(Json(edges.iter().map(FollowRepr::from).collect()))
}

/// The viewer starts following `{username}`. The follower side of the edge
/// is always the actor; there is no way to create an edge on someone
/// else's behalf.
pub async fn follow(
    State(state): State<AppState>,
    vc: Vc,
    Path(username): Path<String>,
) -> AppResult<(StatusCode, Json<FollowRepr>)> {
    let followee = Resolver::new(&state.store).user(&username).await?;
    let actor = current_user(&state, &vc).await?;

    if actor.id == followee.id {
        return Err(AppError::Validation("cannot follow yourself".to_string()));
    }

    let candidate = FollowEdge {
        id: 0,
        follower_id: actor.id,
        follower: actor.username.clone(),
        followee_id: followee.id,
        followee: followee.username.clone(),
        created: Utc::now(),
    };
    gate::enforce(&vc, Operation::Create, &Target::Follow(&candidate))?;

    let edge = state.store.create_follow(actor.id, followee.id).await?;
    info!(follower = %edge.follower, followee = %edge.followee, "created follow edge");
    Ok((StatusCode::CREATED, Json(FollowRepr::from(&edge))))
}

pub async fn follower_detail(
    State(state): State<AppState>,
    Path((username, follower)): Path<(String, String)>,
) -> AppResult<Json<FollowRepr>> {
    let resolver = Resolver::new(&state.store);
    let followee = resolver.user(&username).await?;
    let follower = resolver.user(&follower).await?;
    let edge = resolver.follow_edge(&follower, &followee).await?;
    Ok(Json(FollowRepr::from(&edge)))
}

pub async fn unfollow(
    State(state): State<AppState>,
    vc: Vc,
    Path((username, follower)): Path<(String, String)>,
) -> AppResult<StatusCode> {
    let resolver = Resolver::new(&state.store);
    let followee = resolver.user(&username).await?;
    let follower = resolver.user(&follower).await?;
    let edge = resolver.follow_edge(&follower, &followee).await?;

    gate::enforce(&vc, Operation::Delete, &Target::Follow(&edge))?;
    state.store.delete_follow(edge.id).await?;
    info!(follower = %edge.follower, followee = %edge.followee, "removed follow edge");
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_following(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<Vec<FollowRepr>>> {
    let user = Resolver::new(&state.store).user(&username).await?;
    let edges = state.store.following_of(user.id).await?;
    Ok(Json(edges.iter().map(FollowRepr::from).collect()))
}

pub async fn following_detail(
    State(state): State<AppState>,
    Path((username, followee)): Path<(String, String)>,
) -> AppResult<Json<FollowRepr>> {
    let resolver = Resolver::new(&state.store);
    let follower = resolver.user(&username).await?;
    let followee = resolver.user(&followee).await?;
    let edge = resolver.follow_edge(&follower, &followee).await?;
    Ok(Json(FollowRepr::from(&edge)))
}
