// Resource resolver: maps a chain of nested path segments to a concrete
// stored entity, validating at each step that the child truly belongs to
// its claimed parent. Any broken link is NotFound. An id that exists but
// belongs to a different owner is also NotFound, never Forbidden, so a
// failed probe discloses nothing about other users' resources.

use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Comment, FollowEdge, Like, Post, Tag, User};
use crate::store::Store;

/// Parses a raw path segment as an entity id. A malformed id cannot name
/// any entity, so it resolves the same way as an absent one.
pub fn parse_id(raw: &str, what: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(format!("{} not found", what)))
}

pub struct Resolver<'a> {
    store: &'a Store,
}

impl<'a> Resolver<'a> {
    pub fn new(store: &'a Store) -> Self {
        Resolver { store }
    }

    pub async fn user(&self, username: &str) -> AppResult<User> {
        self.store
            .get_user(username)
            .await?
            .ok_or_else(|| AppError::NotFound("user not found".to_string()))
    }

    /// Globally-scoped when `scope` is None; otherwise restricted to the
    /// given owner's posts, so ownership is verified, not merely existence.
    pub async fn post(&self, scope: Option<&User>, id: Uuid) -> AppResult<Post> {
        let post = match scope {
            Some(owner) => self.store.get_post_of_author(owner.id, id).await?,
            None => self.store.get_post(id).await?,
        };
        post.ok_or_else(|| AppError::NotFound("post not found".to_string()))
    }

    pub async fn comment(&self, post: &Post, id: Uuid) -> AppResult<Comment> {
        self.store
            .get_comment(post.id, id)
            .await?
            .ok_or_else(|| AppError::NotFound("comment not found".to_string()))
    }

    pub async fn like(&self, post: &Post, username: &str) -> AppResult<Like> {
        let liker = self.user(username).await?;
        self.store
            .get_like(post.id, liker.id)
            .await?
            .ok_or_else(|| AppError::NotFound("like not found".to_string()))
    }

    pub async fn tag(&self, name: &str) -> AppResult<Tag> {
        self.store
            .get_tag(name)
            .await?
            .ok_or_else(|| AppError::NotFound("tag not found".to_string()))
    }

    pub async fn follow_edge(&self, follower: &User, followee: &User) -> AppResult<FollowEdge> {
        self.store
            .get_follow(follower.id, followee.id)
            .await?
            .ok_or_else(|| AppError::NotFound("follow relationship not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Visibility;

    async fn seed_user(store: &Store, username: &str) -> User {
        store
            .create_user(username, &format!("{}@example.com", username), None, None, "x", None, Visibility::Public)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn scoped_post_of_other_owner_is_not_found() {
        let store = Store::in_memory().await.unwrap();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let post = store.create_post(bob.id, Some("hi"), &[]).await.unwrap();

        let resolver = Resolver::new(&store);
        // Globally scoped: resolves.
        assert!(resolver.post(None, post.id).await.is_ok());
        // Scoped to bob: resolves.
        assert!(resolver.post(Some(&bob), post.id).await.is_ok());
        // Scoped to alice: the id exists but is not hers.
        let err = resolver.post(Some(&alice), post.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn comment_must_belong_to_claimed_post() {
        let store = Store::in_memory().await.unwrap();
        let alice = seed_user(&store, "alice").await;
        let p1 = store.create_post(alice.id, Some("one"), &[]).await.unwrap();
        let p2 = store.create_post(alice.id, Some("two"), &[]).await.unwrap();
        let comment = store.create_comment(p1.id, alice.id, "hello").await.unwrap();

        let resolver = Resolver::new(&store);
        assert!(resolver.comment(&p1, comment.id).await.is_ok());
        let err = resolver.comment(&p2, comment.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn malformed_ids_resolve_as_not_found() {
        let err = parse_id("not-a-uuid", "post").unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_links_resolve_as_not_found() {
        let store = Store::in_memory().await.unwrap();
        let alice = seed_user(&store, "alice").await;
        let post = store.create_post(alice.id, None, &[]).await.unwrap();
        let resolver = Resolver::new(&store);

        assert!(matches!(
            resolver.user("ghost").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            resolver.post(None, Uuid::new_v4()).await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            resolver.like(&post, "alice").await.unwrap_err(),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            resolver.tag("missing").await.unwrap_err(),
            AppError::NotFound(_)
        ));
    }
}
