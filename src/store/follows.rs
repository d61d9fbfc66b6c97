use chrono::Utc;

use super::Store;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::FollowEdge;

const EDGE_COLUMNS: &str = "f.id, f.follower_id, fu.username AS follower, \
     f.followee_id, eu.username AS followee, f.created";

impl Store {
    /// Inserts a (follower, followee) edge. The pair is unique; inserting it
    /// twice is a Conflict, not a second row.
    pub async fn create_follow(&self, follower_id: i64, followee_id: i64) -> AppResult<FollowEdge> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO follows (follower_id, followee_id, created) VALUES (?, ?, ?)",
        )
        .bind(follower_id)
        .bind(followee_id)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict("already following this user".to_string()))
            }
            Err(e) => return Err(e.into()),
        }

        self.get_follow(follower_id, followee_id).await?.ok_or_else(|| {
            AppError::Internal("follow edge vanished after insert".to_string())
        })
    }

    pub async fn get_follow(
        &self,
        follower_id: i64,
        followee_id: i64,
    ) -> AppResult<Option<FollowEdge>> {
        let edge = sqlx::query_as::<_, FollowEdge>(&format!(
            "SELECT {EDGE_COLUMNS} FROM follows f
             JOIN users fu ON fu.id = f.follower_id
             JOIN users eu ON eu.id = f.followee_id
             WHERE f.follower_id = ? AND f.followee_id = ?"
        ))
        .bind(follower_id)
        .bind(followee_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(edge)
    }

    /// Edges where the given user is the followee.
    pub async fn followers_of(&self, user_id: i64) -> AppResult<Vec<FollowEdge>> {
        let edges = sqlx::query_as::<_, FollowEdge>(&format!(
            "SELECT {EDGE_COLUMNS} FROM follows f
             JOIN users fu ON fu.id = f.follower_id
             JOIN users eu ON eu.id = f.followee_id
             WHERE f.followee_id = ? ORDER BY f.created"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(edges)
    }

    /// Edges where the given user is the follower.
    pub async fn following_of(&self, user_id: i64) -> AppResult<Vec<FollowEdge>> {
        let edges = sqlx::query_as::<_, FollowEdge>(&format!(
            "SELECT {EDGE_COLUMNS} FROM follows f
             JOIN users fu ON fu.id = f.follower_id
             JOIN users eu ON eu.id = f.followee_id
             WHERE f.follower_id = ? ORDER BY f.created"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(edges)
    }

    pub async fn delete_follow(&self, edge_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM follows WHERE id = ?")
            .bind(edge_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
