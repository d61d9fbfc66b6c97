// Authorization gate: every allow/deny decision for (viewer, operation,
// entity) lives here, instead of being inlined per endpoint. Handlers
// resolve the target first, then call `enforce` before touching the store.

use crate::error::{AppError, AppResult};
use crate::models::{Comment, FollowEdge, Like, Post, Tag, User};
use crate::viewer::ViewerContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn is_write(self) -> bool {
        !matches!(self, Operation::Read)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Allow,
    Deny(&'static str),
}

/// The resolved entity a decision is being made about. Comments and likes
/// carry their parent post because the post's author holds moderation and
/// visibility rights over them.
pub enum Target<'a> {
    User(&'a User),
    Follow(&'a FollowEdge),
    Post(&'a Post),
    Comment { comment: &'a Comment, post: &'a Post },
    Like { like: &'a Like, post: &'a Post },
    /// The like collection of a post, for list access.
    Likes(&'a Post),
    Tag(&'a Tag),
}

impl Target<'_> {
    /// Identifier included in Forbidden responses.
    pub fn entity_id(&self) -> String {
        match self {
            Target::User(user) => user.username.clone(),
            Target::Follow(edge) => format!("{}->{}", edge.follower, edge.followee),
            Target::Post(post) => post.id.to_string(),
            Target::Comment { comment, .. } => comment.id.to_string(),
            Target::Like { like, .. } => format!("{}:{}", like.post_id, like.username),
            Target::Likes(post) => post.id.to_string(),
            Target::Tag(tag) => tag.name.clone(),
        }
    }
}

pub fn can(vc: &ViewerContext, op: Operation, target: &Target<'_>) -> Verdict {
    if op.is_write() && !vc.is_authenticated() {
        return Verdict::Deny("authentication required");
    }

    match target {
        Target::User(user) => match op {
            Operation::Read | Operation::Create => Verdict::Allow,
            Operation::Update | Operation::Delete => {
                if acts_as(vc, user.id) || vc.is_staff() {
                    Verdict::Allow
                } else {
                    Verdict::Deny("only the account owner may modify this user")
                }
            }
        },
        Target::Follow(edge) => match op {
            Operation::Read => Verdict::Allow,
            // An actor may only create edges where they are the follower.
            Operation::Create => {
                if acts_as(vc, edge.follower_id) {
                    Verdict::Allow
                } else {
                    Verdict::Deny("a follow edge can only be created by its follower")
                }
            }
            Operation::Delete => {
                if acts_as(vc, edge.follower_id) || acts_as(vc, edge.followee_id) || vc.is_staff()
                {
                    Verdict::Allow
                } else {
                    Verdict::Deny("only the follower or the followee may remove this edge")
                }
            }
            Operation::Update => Verdict::Deny("follow edges cannot be updated"),
        },
        Target::Post(post) => match op {
            Operation::Read => Verdict::Allow,
            // Author is forced to the viewer at creation; any
            // authenticated actor may create their own post.
            Operation::Create => Verdict::Allow,
            Operation::Update | Operation::Delete => {
                if acts_as(vc, post.author_id) || vc.is_staff() {
                    Verdict::Allow
                } else {
                    Verdict::Deny("you do not have permission to modify this post")
                }
            }
        },
        Target::Comment { comment, post } => match op {
            Operation::Read => Verdict::Allow,
            Operation::Create => Verdict::Allow,
            // Post owners may moderate comments on their posts.
            Operation::Update | Operation::Delete => {
                if acts_as(vc, comment.author_id)
                    || acts_as(vc, post.author_id)
                    || vc.is_staff()
                {
                    Verdict::Allow
                } else {
                    Verdict::Deny("you do not have permission to modify this comment")
                }
            }
        },
        Target::Like { like, post } => match op {
            Operation::Read => {
                if acts_as(vc, post.author_id) || vc.is_staff() {
                    Verdict::Allow
                } else {
                    Verdict::Deny("only the post's author may view its likes")
                }
            }
            Operation::Create => Verdict::Allow,
            Operation::Delete => {
                if acts_as(vc, like.user_id) || vc.is_staff() {
                    Verdict::Allow
                } else {
                    Verdict::Deny("a like can only be removed by the identity that created it")
                }
            }
            Operation::Update => Verdict::Deny("likes cannot be updated"),
        },
        Target::Likes(post) => match op {
            Operation::Read => {
                if acts_as(vc, post.author_id) || vc.is_staff() {
                    Verdict::Allow
                } else {
                    Verdict::Deny("only the post's author may view its likes")
                }
            }
            _ => Verdict::Deny("likes are created and removed individually"),
        },
        Target::Tag(_) => match op {
            Operation::Read => Verdict::Allow,
            _ => Verdict::Deny("tags are read-only"),
        },
    }
}

/// Gate check that maps outcomes onto the error taxonomy: missing
/// authentication on a write is Unauthorized, an entity-rule denial is
/// Forbidden with the entity id and the reason. Never a silent no-op.
pub fn enforce(vc: &ViewerContext, op: Operation, target: &Target<'_>) -> AppResult<()> {
    if op.is_write() && !vc.is_authenticated() {
        return Err(AppError::Unauthorized("authentication required".to_string()));
    }
    match can(vc, op, target) {
        Verdict::Allow => Ok(()),
        Verdict::Deny(reason) => Err(AppError::Forbidden {
            id: target.entity_id(),
            reason: reason.to_string(),
        }),
    }
}

fn acts_as(vc: &ViewerContext, user_id: i64) -> bool {
    vc.user_id() == Some(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn user(id: i64, username: &str, is_staff: bool) -> User {
        User {
            id,
            username: username.to_string(),
            email: format!("{}@example.com", username),
            first_name: None,
            last_name: None,
            password_hash: String::new(),
            is_staff,
            created: Utc::now(),
        }
    }

    fn post_by(author: &User) -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id: author.id,
            author: author.username.clone(),
            description: Some("hi".to_string()),
            created: Utc::now(),
        }
    }

    fn comment_by(author: &User, post: &Post) -> Comment {
        Comment {
            id: Uuid::new_v4(),
            post_id: post.id,
            author_id: author.id,
            author: author.username.clone(),
            body: "nice".to_string(),
            created: Utc::now(),
        }
    }

    fn like_by(liker: &User, post: &Post) -> Like {
        Like {
            post_id: post.id,
            user_id: liker.id,
            username: liker.username.clone(),
            created: Utc::now(),
        }
    }

    fn edge(follower: &User, followee: &User) -> FollowEdge {
        FollowEdge {
            id: 1,
            follower_id: follower.id,
            follower: follower.username.clone(),
            followee_id: followee.id,
            followee: followee.username.clone(),
            created: Utc::now(),
        }
    }

    #[test]
    fn owner_may_delete_others_may_not() {
        let alice = user(1, "alice", false);
        let bob = user(2, "bob", false);
        let post = post_by(&alice);

        assert_eq!(
            can(&ViewerContext::for_user(&alice), Operation::Delete, &Target::Post(&post)),
            Verdict::Allow
        );
        assert!(matches!(
            can(&ViewerContext::for_user(&bob), Operation::Delete, &Target::Post(&post)),
            Verdict::Deny(_)
        ));
    }

    #[test]
    fn staff_overrides_ownership() {
        let alice = user(1, "alice", false);
        let admin = user(3, "root", true);
        let post = post_by(&alice);

        assert_eq!(
            can(&ViewerContext::for_user(&admin), Operation::Update, &Target::Post(&post)),
            Verdict::Allow
        );
        assert_eq!(
            can(&ViewerContext::for_user(&admin), Operation::Delete, &Target::User(&alice)),
            Verdict::Allow
        );
    }

    #[test]
    fn anonymous_reads_allowed_writes_denied() {
        let alice = user(1, "alice", false);
        let post = post_by(&alice);
        let anon = ViewerContext::anonymous();

        assert_eq!(can(&anon, Operation::Read, &Target::Post(&post)), Verdict::Allow);
        assert_eq!(can(&anon, Operation::Read, &Target::User(&alice)), Verdict::Allow);
        assert!(matches!(can(&anon, Operation::Create, &Target::Post(&post)), Verdict::Deny(_)));
        assert!(matches!(can(&anon, Operation::Update, &Target::User(&alice)), Verdict::Deny(_)));
    }

    #[test]
    fn enforce_maps_anonymous_write_to_unauthorized() {
        let alice = user(1, "alice", false);
        let post = post_by(&alice);
        let err = enforce(&ViewerContext::anonymous(), Operation::Update, &Target::Post(&post))
            .unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn enforce_carries_entity_id_on_denial() {
        let alice = user(1, "alice", false);
        let bob = user(2, "bob", false);
        let post = post_by(&alice);

        let err = enforce(&ViewerContext::for_user(&bob), Operation::Update, &Target::Post(&post))
            .unwrap_err();
        match err {
            AppError::Forbidden { id, reason } => {
                assert_eq!(id, post.id.to_string());
                assert!(reason.contains("permission"));
            }
            other => panic!("expected Forbidden, got {:?}", other),
        }
    }

    #[test]
    fn follow_edge_only_creatable_by_follower() {
        let alice = user(1, "alice", false);
        let bob = user(2, "bob", false);
        let e = edge(&alice, &bob);

        assert_eq!(
            can(&ViewerContext::for_user(&alice), Operation::Create, &Target::Follow(&e)),
            Verdict::Allow
        );
        assert!(matches!(
            can(&ViewerContext::for_user(&bob), Operation::Create, &Target::Follow(&e)),
            Verdict::Deny(_)
        ));
    }

    #[test]
    fn followee_may_remove_unwanted_follower() {
        let alice = user(1, "alice", false);
        let bob = user(2, "bob", false);
        let carol = user(3, "carol", false);
        let e = edge(&alice, &bob);

        assert_eq!(
            can(&ViewerContext::for_user(&bob), Operation::Delete, &Target::Follow(&e)),
            Verdict::Allow
        );
        assert_eq!(
            can(&ViewerContext::for_user(&alice), Operation::Delete, &Target::Follow(&e)),
            Verdict::Allow
        );
        assert!(matches!(
            can(&ViewerContext::for_user(&carol), Operation::Delete, &Target::Follow(&e)),
            Verdict::Deny(_)
        ));
    }

    #[test]
    fn post_owner_moderates_comments() {
        let alice = user(1, "alice", false);
        let bob = user(2, "bob", false);
        let carol = user(3, "carol", false);
        let post = post_by(&alice);
        let comment = comment_by(&bob, &post);
        let target = Target::Comment { comment: &comment, post: &post };

        assert_eq!(can(&ViewerContext::for_user(&bob), Operation::Update, &target), Verdict::Allow);
        assert_eq!(can(&ViewerContext::for_user(&alice), Operation::Delete, &target), Verdict::Allow);
        assert!(matches!(
            can(&ViewerContext::for_user(&carol), Operation::Delete, &target),
            Verdict::Deny(_)
        ));
    }

    #[test]
    fn likes_visible_only_to_post_author() {
        let alice = user(1, "alice", false);
        let bob = user(2, "bob", false);
        let post = post_by(&alice);

        assert_eq!(
            can(&ViewerContext::for_user(&alice), Operation::Read, &Target::Likes(&post)),
            Verdict::Allow
        );
        assert!(matches!(
            can(&ViewerContext::for_user(&bob), Operation::Read, &Target::Likes(&post)),
            Verdict::Deny(_)
        ));
        assert!(matches!(
            can(&ViewerContext::anonymous(), Operation::Read, &Target::Likes(&post)),
            Verdict::Deny(_)
        ));
    }

    #[test]
    fn like_removable_only_by_its_creator() {
        let alice = user(1, "alice", false);
        let bob = user(2, "bob", false);
        let post = post_by(&alice);
        let like = like_by(&bob, &post);
        let target = Target::Like { like: &like, post: &post };

        assert_eq!(can(&ViewerContext::for_user(&bob), Operation::Delete, &target), Verdict::Allow);
        // Not even the post author may remove someone else's like.
        assert!(matches!(
            can(&ViewerContext::for_user(&alice), Operation::Delete, &target),
            Verdict::Deny(_)
        ));
    }

    #[test]
    fn tags_are_read_only() {
        let tag = Tag { name: "intro".to_string(), created: Utc::now() };
        let admin = user(3, "root", true);

        assert_eq!(
            can(&ViewerContext::anonymous(), Operation::Read, &Target::Tag(&tag)),
            Verdict::Allow
        );
        assert!(matches!(
            can(&ViewerContext::for_user(&admin), Operation::Delete, &Target::Tag(&tag)),
            Verdict::Deny(_)
        ));
    }
}
