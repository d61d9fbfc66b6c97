// Async store over a SQLite connection pool. One table per entity kind;
// uniqueness invariants (usernames, follow pairs, like pairs, tag names)
// live in the schema so concurrent double-creates resolve at the database.

use anyhow::Result;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

pub mod comments;
pub mod follows;
pub mod likes;
pub mod posts;
pub mod tags;
pub mod users;

#[derive(Clone)]
pub struct Store {
    pub pool: SqlitePool,
}

impl Store {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url).await?;
        Ok(Store { pool })
    }

    /// Single-connection in-memory database for tests. More than one
    /// connection would each see a separate empty :memory: database.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        let store = Store { pool };
        store.init().await?;
        Ok(store)
    }

    pub async fn init(&self) -> Result<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                first_name TEXT,
                last_name TEXT,
                password_hash TEXT NOT NULL,
                is_staff INTEGER NOT NULL DEFAULT 0,
                created TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS profiles (
                user_id INTEGER PRIMARY KEY,
                description TEXT,
                privacy TEXT NOT NULL DEFAULT 'PUBL'
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                follower_id INTEGER NOT NULL,
                followee_id INTEGER NOT NULL,
                created TEXT NOT NULL,
                UNIQUE(follower_id, followee_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS posts (
                id BLOB PRIMARY KEY,
                author_id INTEGER NOT NULL,
                description TEXT,
                created TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS tags (
                name TEXT PRIMARY KEY,
                created TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS post_tags (
                post_id BLOB NOT NULL,
                tag_name TEXT NOT NULL,
                UNIQUE(post_id, tag_name)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS comments (
                id BLOB PRIMARY KEY,
                post_id BLOB NOT NULL,
                author_id INTEGER NOT NULL,
                body TEXT NOT NULL,
                created TEXT NOT NULL
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS likes (
                post_id BLOB NOT NULL,
                user_id INTEGER NOT NULL,
                created TEXT NOT NULL,
                UNIQUE(post_id, user_id)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_follows_followee ON follows(followee_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
