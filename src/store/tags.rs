use chrono::Utc;

use super::Store;
use crate::error::{AppError, AppResult};
use crate::models::Tag;

impl Store {
    /// Idempotent by name: INSERT OR IGNORE absorbs the concurrent
    /// double-create race at the unique constraint, then the row is fetched
    /// whichever writer won.
    pub async fn get_or_create_tag(&self, name: &str) -> AppResult<Tag> {
        sqlx::query("INSERT OR IGNORE INTO tags (name, created) VALUES (?, ?)")
            .bind(name)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        self.get_tag(name)
            .await?
            .ok_or_else(|| AppError::Internal(format!("tag '{}' vanished after insert", name)))
    }

    pub async fn get_tag(&self, name: &str) -> AppResult<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT * FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(tag)
    }

    pub async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>("SELECT * FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(tags)
    }
}
