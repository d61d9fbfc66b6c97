use axum::{
    extract::{Path, State},
    Json,
};

use crate::{app_state::AppState, error::AppResult, models::Tag, resolver::Resolver};

// Tags are read-only through the API; they come into existence lazily when
// posts reference them.

pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Tag>>> {
    Ok(Json(state.store.list_tags().await?))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> AppResult<Json<Tag>> {
    let tag = Resolver::new(&state.store).tag(&name).await?;
    Ok(Json(tag))
}
