// Stored entity types. Rows carry the owning user's username alongside the
// foreign key so representations never need a second lookup to render it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: String,
    pub is_staff: bool,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[sqlx(rename = "PUBL")]
    Public,
    #[sqlx(rename = "PRIV")]
    Private,
}

/// Exactly one per user, created in the same transaction as the account.
#[derive(Debug, Clone, FromRow)]
pub struct Profile {
    pub user_id: i64,
    pub description: Option<String>,
    pub privacy: Visibility,
}

#[derive(Debug, Clone, FromRow)]
pub struct FollowEdge {
    pub id: i64,
    pub follower_id: i64,
    pub follower: String,
    pub followee_id: i64,
    pub followee: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Post {
    pub id: Uuid,
    pub author_id: i64,
    pub author: String,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: i64,
    pub author: String,
    pub body: String,
    pub created: DateTime<Utc>,
}

/// At most one per (post, user) pair, enforced by a UNIQUE constraint.
#[derive(Debug, Clone, FromRow)]
pub struct Like {
    pub post_id: Uuid,
    pub user_id: i64,
    pub username: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Tag {
    pub name: String,
    pub created: DateTime<Utc>,
}
