// Login and token refresh. Mirrors the conventional token-pair flow:
// POST /users/token with credentials returns a refresh+access pair,
// POST /users/token/refresh exchanges a refresh token for a new access
// token. Everything else authenticates via `Authorization: Bearer`.

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
};

pub mod password;
pub mod tokens;

#[derive(Debug, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub refresh: String,
    pub access: String,
    pub username: String,
    pub is_staff: bool,
}

#[derive(Debug, Deserialize)]
pub struct RefreshInput {
    pub refresh: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users/token", post(login))
        .route("/users/token/refresh", post(refresh))
}

async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let user = state
        .store
        .get_user(&input.username)
        .await?
        .ok_or_else(|| AppError::Unauthorized("invalid credentials".to_string()))?;

    if !password::verify_password(&user.password_hash, &input.password) {
        return Err(AppError::Unauthorized("invalid credentials".to_string()));
    }

    tracing::info!(username = %user.username, "login");
    let pair = tokens::issue_pair(&user, &state.config.auth)?;
    Ok(Json(LoginResponse {
        refresh: pair.refresh,
        access: pair.access,
        username: user.username,
        is_staff: user.is_staff,
    }))
}

async fn refresh(
    State(state): State<AppState>,
    Json(input): Json<RefreshInput>,
) -> AppResult<Json<RefreshResponse>> {
    let claims = tokens::verify(&input.refresh, tokens::REFRESH, &state.config.auth)?;

    // Re-read the account so a deleted or role-changed user cannot keep
    // minting access tokens from an old refresh token.
    let user = state
        .store
        .get_user_by_id(claims.user_id()?)
        .await?
        .ok_or_else(|| AppError::Unauthorized("account no longer exists".to_string()))?;

    let access = tokens::issue(
        &user,
        tokens::ACCESS,
        state.config.auth.access_ttl_secs,
        &state.config.auth,
    )?;
    Ok(Json(RefreshResponse { access }))
}
