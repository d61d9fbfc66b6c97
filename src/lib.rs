// openfeed - social media REST backend
//
// The interesting layer is authorization and resource resolution: nested
// URL paths resolve to concrete entities with ownership verified at every
// link (resolver), and a single gate decides allow/deny for every
// (viewer, operation, entity) triple (gate). Persistence, routing and
// token crypto are delegated to sqlx, axum and jsonwebtoken.

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod models;
pub mod repr;
pub mod resolver;
pub mod store;
pub mod viewer;

pub use app_state::AppState;
pub use error::{AppError, AppResult};
