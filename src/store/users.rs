use chrono::Utc;

use super::Store;
use crate::error::{is_unique_violation, AppError, AppResult};
use crate::models::{Profile, User, Visibility};

/// Field-level changes for a PATCH. `None` leaves the column untouched.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password_hash: Option<String>,
    pub description: Option<String>,
    pub privacy: Option<Visibility>,
}

impl Store {
    /// Creates the account and its profile atomically. Every identity has
    /// exactly one profile from the moment it exists.
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        password_hash: &str,
        description: Option<&str>,
        privacy: Visibility,
    ) -> AppResult<User> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO users (username, email, first_name, last_name, password_hash, is_staff, created)
             VALUES (?, ?, ?, ?, ?, 0, ?)",
        )
        .bind(username)
        .bind(email)
        .bind(first_name)
        .bind(last_name)
        .bind(password_hash)
        .bind(now)
        .execute(&mut *tx)
        .await;

        let user_id = match result {
            Ok(done) => done.last_insert_rowid(),
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::Conflict(format!(
                    "username '{}' is already taken",
                    username
                )))
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query("INSERT INTO profiles (user_id, description, privacy) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(description)
            .bind(privacy)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(User {
            id: user_id,
            username: username.to_string(),
            email: email.to_string(),
            first_name: first_name.map(str::to_string),
            last_name: last_name.map(str::to_string),
            password_hash: password_hash.to_string(),
            is_staff: false,
            created: now,
        })
    }

    pub async fn get_user(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_user_by_id(&self, id: i64) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn list_users(&self) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY username")
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    pub async fn get_profile(&self, user_id: i64) -> AppResult<Profile> {
        let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(profile)
    }

    pub async fn update_user(&self, user_id: i64, changes: UserChanges) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        if let Some(email) = &changes.email {
            sqlx::query("UPDATE users SET email = ? WHERE id = ?")
                .bind(email)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(first_name) = &changes.first_name {
            sqlx::query("UPDATE users SET first_name = ? WHERE id = ?")
                .bind(first_name)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(last_name) = &changes.last_name {
            sqlx::query("UPDATE users SET last_name = ? WHERE id = ?")
                .bind(last_name)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(password_hash) = &changes.password_hash {
            sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
                .bind(password_hash)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(description) = &changes.description {
            sqlx::query("UPDATE profiles SET description = ? WHERE user_id = ?")
                .bind(description)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        if let Some(privacy) = changes.privacy {
            sqlx::query("UPDATE profiles SET privacy = ? WHERE user_id = ?")
                .bind(privacy)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Removes the account and everything it owns in one transaction:
    /// likes by the user and on the user's posts, comments likewise,
    /// tag attachments of the user's posts, the posts themselves, follow
    /// edges in both directions, the profile, and finally the account row.
    pub async fn delete_user(&self, user_id: i64) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "DELETE FROM likes WHERE user_id = ?
             OR post_id IN (SELECT id FROM posts WHERE author_id = ?)",
        )
        .bind(user_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "DELETE FROM comments WHERE author_id = ?
             OR post_id IN (SELECT id FROM posts WHERE author_id = ?)",
        )
        .bind(user_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM post_tags WHERE post_id IN (SELECT id FROM posts WHERE author_id = ?)")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM posts WHERE author_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM follows WHERE follower_id = ? OR followee_id = ?")
            .bind(user_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
