// Representation mapper: converts stored entities to and from their wire
// shapes. Foreign keys render as usernames, nested collections flatten to
// arrays, and a comment nested inside a post drops its redundant post
// back-reference. Projections are static: detail endpoints use Full, list
// endpoints Summary — there is no runtime field-set subtraction.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Comment, FollowEdge, Like, Post, Tag, User, Visibility};
use crate::store::Store;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Projection {
    Full,
    Summary,
}

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Za-z0-9_]{3,30}$").unwrap());
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new("^[A-Za-z0-9][A-Za-z0-9_-]{0,49}$").unwrap());

// ---- outbound representations ----

#[derive(Debug, Serialize)]
pub struct ProfileRepr {
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privacy: Option<Visibility>,
}

#[derive(Debug, Serialize)]
pub struct UserRepr {
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub profile: ProfileRepr,
}

/// Comment as rendered inside any response. The parent post id is omitted:
/// the comment is only ever reachable through its post.
#[derive(Debug, Serialize)]
pub struct CommentRepr {
    pub id: Uuid,
    pub author: String,
    pub body: String,
    pub created: DateTime<Utc>,
}

impl From<&Comment> for CommentRepr {
    fn from(comment: &Comment) -> Self {
        CommentRepr {
            id: comment.id,
            author: comment.author.clone(),
            body: comment.body.clone(),
            created: comment.created,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LikeRepr {
    pub username: String,
}

impl From<&Like> for LikeRepr {
    fn from(like: &Like) -> Self {
        LikeRepr {
            username: like.username.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FollowRepr {
    pub follower: String,
    pub followee: String,
}

impl From<&FollowEdge> for FollowRepr {
    fn from(edge: &FollowEdge) -> Self {
        FollowRepr {
            follower: edge.follower.clone(),
            followee: edge.followee.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PostRepr {
    pub id: Uuid,
    pub author: String,
    pub description: Option<String>,
    pub created: DateTime<Utc>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentRepr>>,
    pub comments_count: i64,
    pub likes_number: i64,
}

pub async fn user_repr(store: &Store, user: &User, projection: Projection) -> AppResult<UserRepr> {
    let profile = store.get_profile(user.id).await?;
    let full = projection == Projection::Full;
    Ok(UserRepr {
        username: user.username.clone(),
        email: full.then(|| user.email.clone()),
        first_name: if full { user.first_name.clone() } else { None },
        last_name: if full { user.last_name.clone() } else { None },
        // Summary keeps only the username and the profile description.
        profile: ProfileRepr {
            description: profile.description,
            privacy: full.then_some(profile.privacy),
        },
    })
}

pub async fn post_repr(store: &Store, post: &Post, projection: Projection) -> AppResult<PostRepr> {
    let tags = store.tags_of_post(post.id).await?;
    let likes_number = store.likes_count(post.id).await?;
    let comments_count = store.comments_count(post.id).await?;
    let comments = match projection {
        Projection::Full => {
            let comments = store.list_comments(post.id).await?;
            Some(comments.iter().map(CommentRepr::from).collect())
        }
        Projection::Summary => None,
    };

    Ok(PostRepr {
        id: post.id,
        author: post.author.clone(),
        description: post.description.clone(),
        created: post.created,
        tags,
        comments,
        comments_count,
        likes_number,
    })
}

// ---- inbound representations ----

#[derive(Debug, Deserialize)]
pub struct ProfileInput {
    pub description: Option<String>,
    pub privacy: Option<Visibility>,
}

#[derive(Debug, Deserialize)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile: Option<ProfileInput>,
}

impl RegisterInput {
    pub fn validate(&self) -> AppResult<()> {
        if !USERNAME_RE.is_match(&self.username) {
            return Err(AppError::Validation(
                "username must be 3-30 characters of letters, digits or underscores".to_string(),
            ));
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(AppError::Validation("email is not valid".to_string()));
        }
        if self.password.len() < 8 {
            return Err(AppError::Validation(
                "password must be at least 8 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct UserPatch {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub profile: Option<ProfileInput>,
}

impl UserPatch {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(email) = &self.email {
            if !EMAIL_RE.is_match(email) {
                return Err(AppError::Validation("email is not valid".to_string()));
            }
        }
        if let Some(password) = &self.password {
            if password.len() < 8 {
                return Err(AppError::Validation(
                    "password must be at least 8 characters".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Post input takes tags as plain names; the mapper resolves or lazily
/// creates the Tag rows before the post is constructed.
#[derive(Debug, Deserialize)]
pub struct PostInput {
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct PostPatch {
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CommentInput {
    pub body: String,
}

impl CommentInput {
    pub fn validate(&self) -> AppResult<()> {
        if self.body.trim().is_empty() {
            return Err(AppError::Validation("comment body must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Get-or-create by name for every requested tag, idempotently. Returns the
/// stored rows so callers can attach them by canonical name.
pub async fn resolve_tag_names(store: &Store, names: &[String]) -> AppResult<Vec<Tag>> {
    let mut tags = Vec::with_capacity(names.len());
    for name in names {
        if !TAG_RE.is_match(name) {
            return Err(AppError::Validation(format!("invalid tag name '{}'", name)));
        }
        tags.push(store.get_or_create_tag(name).await?);
    }
    Ok(tags)
}
