use chrono::Utc;
use uuid::Uuid;

use super::Store;
use crate::error::{AppError, AppResult};
use crate::models::Comment;

const COMMENT_COLUMNS: &str =
    "c.id, c.post_id, c.author_id, u.username AS author, c.body, c.created";

impl Store {
    pub async fn create_comment(
        &self,
        post_id: Uuid,
        author_id: i64,
        body: &str,
    ) -> AppResult<Comment> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO comments (id, post_id, author_id, body, created) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(post_id)
        .bind(author_id)
        .bind(body)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.get_comment(post_id, id)
            .await?
            .ok_or_else(|| AppError::Internal("comment vanished after insert".to_string()))
    }

    /// Scoped to the parent post: a comment id under a different post is None.
    pub async fn get_comment(&self, post_id: Uuid, id: Uuid) -> AppResult<Option<Comment>> {
        let comment = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON u.id = c.author_id
             WHERE c.id = ? AND c.post_id = ?"
        ))
        .bind(id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(comment)
    }

    pub async fn list_comments(&self, post_id: Uuid) -> AppResult<Vec<Comment>> {
        let comments = sqlx::query_as::<_, Comment>(&format!(
            "SELECT {COMMENT_COLUMNS} FROM comments c JOIN users u ON u.id = c.author_id
             WHERE c.post_id = ? ORDER BY c.created"
        ))
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    pub async fn update_comment(&self, id: Uuid, body: &str) -> AppResult<()> {
        sqlx::query("UPDATE comments SET body = ? WHERE id = ?")
            .bind(body)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn delete_comment(&self, id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
