use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::info;

use crate::{
    app_state::AppState,
    auth::password,
    error::AppResult,
    gate::{self, Operation, Target},
    models::Visibility,
    repr::{self, Projection, RegisterInput, UserPatch, UserRepr},
    resolver::Resolver,
    store::users::UserChanges,
    viewer::Vc,
};

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<UserRepr>>> {
    let users = state.store.list_users().await?;
    let mut reprs = Vec::with_capacity(users.len());
    for user in &users {
        reprs.push(repr::user_repr(&state.store, user, Projection::Summary).await?);
    }
    Ok(Json(reprs))
}

/// Registration is open to anonymous viewers; the profile row is created in
/// the same transaction as the account.
pub async fn register(
    State(state): State<AppState>,
    Json(input): Json<RegisterInput>,
) -> AppResult<(StatusCode, Json<UserRepr>)> {
    input.validate()?;
    let hash = password::hash_password(&input.password)?;
    let (description, privacy) = match &input.profile {
        Some(p) => (p.description.as_deref(), p.privacy.unwrap_or(Visibility::Public)),
        None => (None, Visibility::Public),
    };

    let user = state
        .store
        .create_user(
            &input.username,
            &input.email,
            input.first_name.as_deref(),
            input.last_name.as_deref(),
            &hash,
            description,
            privacy,
        )
        .await?;

    info!(username = %user.username, "registered user");
    let body = repr::user_repr(&state.store, &user, Projection::Full).await?;
    Ok((StatusCode::CREATED, Json(body)))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Json<UserRepr>> {
    let user = Resolver::new(&state.store).user(&username).await?;
    let body = repr::user_repr(&state.store, &user, Projection::Full).await?;
    Ok(Json(body))
}

pub async fn update(
    State(state): State<AppState>,
    vc: Vc,
    Path(username): Path<String>,
    Json(patch): Json<UserPatch>,
) -> AppResult<Json<UserRepr>> {
    let user = Resolver::new(&state.store).user(&username).await?;
    gate::enforce(&vc, Operation::Update, &Target::User(&user))?;
    patch.validate()?;

    let password_hash = match &patch.password {
        Some(password) => Some(password::hash_password(password)?),
        None => None,
    };
    let (description, privacy) = match &patch.profile {
        Some(p) => (p.description.clone(), p.privacy),
        None => (None, None),
    };
    state
        .store
        .update_user(
            user.id,
            UserChanges {
                email: patch.email,
                first_name: patch.first_name,
                last_name: patch.last_name,
                password_hash,
                description,
                privacy,
            },
        )
        .await?;

    let updated = Resolver::new(&state.store).user(&username).await?;
    let body = repr::user_repr(&state.store, &updated, Projection::Full).await?;
    Ok(Json(body))
}

/// Removes the account and, in the same transaction, everything it owns.
pub async fn remove(
    State(state): State<AppState>,
    vc: Vc,
    Path(username): Path<String>,
) -> AppResult<StatusCode> {
    let user = Resolver::new(&state.store).user(&username).await?;
    gate::enforce(&vc, Operation::Delete, &Target::User(&user))?;
    state.store.delete_user(user.id).await?;
    info!(username = %username, "deleted user");
    Ok(StatusCode::NO_CONTENT)
}
