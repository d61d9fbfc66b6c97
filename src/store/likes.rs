use chrono::Utc;
use uuid::Uuid;

use super::Store;
use crate::error::{AppError, AppResult};
use crate::models::Like;

const LIKE_COLUMNS: &str = "l.post_id, l.user_id, u.username, l.created";

impl Store {
    /// Get-or-create: the (post, user) pair is unique, and a concurrent
    /// duplicate insert is absorbed by INSERT OR IGNORE. Returns the stored
    /// like and whether this call created it.
    pub async fn create_like(&self, post_id: Uuid, user_id: i64) -> AppResult<(Like, bool)> {
        let now = Utc::now();
        let result =
            sqlx::query("INSERT OR IGNORE INTO likes (post_id, user_id, created) VALUES (?, ?, ?)")
                .bind(post_id)
                .bind(user_id)
                .bind(now)
                .execute(&self.pool)
                .await?;
        let created = result.rows_affected() > 0;

        let like = self
            .get_like(post_id, user_id)
            .await?
            .ok_or_else(|| AppError::Internal("like vanished after insert".to_string()))?;
        Ok((like, created))
    }

    pub async fn get_like(&self, post_id: Uuid, user_id: i64) -> AppResult<Option<Like>> {
        let like = sqlx::query_as::<_, Like>(&format!(
            "SELECT {LIKE_COLUMNS} FROM likes l JOIN users u ON u.id = l.user_id
             WHERE l.post_id = ? AND l.user_id = ?"
        ))
        .bind(post_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(like)
    }

    pub async fn list_likes(&self, post_id: Uuid) -> AppResult<Vec<Like>> {
        let likes = sqlx::query_as::<_, Like>(&format!(
            "SELECT {LIKE_COLUMNS} FROM likes l JOIN users u ON u.id = l.user_id
             WHERE l.post_id = ? ORDER BY l.created"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(likes)
    }

    pub async fn delete_like(&self, post_id: Uuid, user_id: i64) -> AppResult<()> {
        sqlx::query("DELETE FROM likes WHERE post_id = ? AND user_id = ?")
            .bind(post_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
