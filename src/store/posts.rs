use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::Store;
use crate::error::{AppError, AppResult};
use crate::models::Post;

const POST_COLUMNS: &str =
    "p.id, p.author_id, u.username AS author, p.description, p.created";

impl Store {
    /// Inserts the post and its tag attachments in one transaction,
    /// materializing any tag rows that do not exist yet. A post can never
    /// reference a tag name absent from the tags table.
    pub async fn create_post(
        &self,
        author_id: i64,
        description: Option<&str>,
        tag_names: &[String],
    ) -> AppResult<Post> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT INTO posts (id, author_id, description, created) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(author_id)
            .bind(description)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        for name in tag_names {
            sqlx::query("INSERT OR IGNORE INTO tags (name, created) VALUES (?, ?)")
                .bind(name)
                .bind(now)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_name) VALUES (?, ?)")
                .bind(id)
                .bind(name)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        self.get_post(id)
            .await?
            .ok_or_else(|| AppError::Internal("post vanished after insert".to_string()))
    }

    pub async fn get_post(&self, id: Uuid) -> AppResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.author_id WHERE p.id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    /// Lookup restricted to a single author. An id that exists under a
    /// different author comes back as None.
    pub async fn get_post_of_author(&self, author_id: i64, id: Uuid) -> AppResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.author_id
             WHERE p.id = ? AND p.author_id = ?"
        ))
        .bind(id)
        .bind(author_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(post)
    }

    pub async fn list_posts(&self) -> AppResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.author_id
             ORDER BY p.created DESC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    pub async fn list_posts_by(&self, author_id: i64) -> AppResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts p JOIN users u ON u.id = p.author_id
             WHERE p.author_id = ? ORDER BY p.created DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    /// Updates the body and, when `tag_names` is given, replaces the tag set.
    pub async fn update_post(
        &self,
        id: Uuid,
        description: Option<&str>,
        tag_names: Option<&[String]>,
    ) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(description) = description {
            sqlx::query("UPDATE posts SET description = ? WHERE id = ?")
                .bind(description)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(names) = tag_names {
            sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            let now = Utc::now();
            for name in names {
                sqlx::query("INSERT OR IGNORE INTO tags (name, created) VALUES (?, ?)")
                    .bind(name)
                    .bind(now)
                    .execute(&mut *tx)
                    .await?;
                sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_name) VALUES (?, ?)")
                    .bind(id)
                    .bind(name)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(())
    }

    /// Removes the post and its children (comments, likes, tag attachments).
    pub async fn delete_post(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM likes WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM comments WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM post_tags WHERE post_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn tags_of_post(&self, post_id: Uuid) -> AppResult<Vec<String>> {
        let rows = sqlx::query(
            "SELECT tag_name FROM post_tags WHERE post_id = ? ORDER BY tag_name",
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|r| r.get("tag_name")).collect())
    }

    pub async fn likes_count(&self, post_id: Uuid) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM likes WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }

    pub async fn comments_count(&self, post_id: Uuid) -> AppResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS n FROM comments WHERE post_id = ?")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get("n"))
    }
}
