//! Table creation on startup
//!
//! Creates any missing table. Existing tables are left alone; column
//! changes require a manual migration.

use sqlx::SqlitePool;
use tracing::{debug, info};

const TABLES: &[(&str, &str)] = &[
    (
        "users",
        r#"CREATE TABLE IF NOT EXISTS users (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  email TEXT NOT NULL UNIQUE,
  password TEXT NOT NULL,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
)"#,
    ),
    (
        "posts",
        r#"CREATE TABLE IF NOT EXISTS posts (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL UNIQUE,
  content TEXT,
  author_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
)"#,
    ),
    (
        "comments",
        r#"CREATE TABLE IF NOT EXISTS comments (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  comment TEXT NOT NULL,
  post_id INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
  user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
  created_at TEXT NOT NULL,
  updated_at TEXT NOT NULL
)"#,
    ),
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_posts_author_id ON posts(author_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_post_id ON comments(post_id)",
    "CREATE INDEX IF NOT EXISTS idx_comments_user_id ON comments(user_id)",
];

/// Check if a table exists in the database
async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

/// Names of the tables that do not exist yet.
pub async fn missing_tables(pool: &SqlitePool) -> Result<Vec<&'static str>, sqlx::Error> {
    let mut missing = Vec::new();
    for (table, _) in TABLES {
        if !table_exists(pool, table).await? {
            missing.push(*table);
        }
    }
    Ok(missing)
}

/// Create every missing table and index. Returns the names of the tables
/// that were created.
pub async fn sync_schema(pool: &SqlitePool) -> Result<Vec<String>, sqlx::Error> {
    let mut created = Vec::new();

    for (table, ddl) in TABLES {
        if table_exists(pool, table).await? {
            debug!(table = %table, "Table already exists");
            continue;
        }
        sqlx::query(ddl).execute(pool).await?;
        info!(table = %table, "Created table");
        created.push(table.to_string());
    }

    for ddl in INDEXES {
        sqlx::query(ddl).execute(pool).await?;
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    #[tokio::test]
    async fn test_sync_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        // Database::connect already ran the first sync
        let created = sync_schema(db.pool()).await.unwrap();
        assert!(created.is_empty());
        assert!(missing_tables(db.pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_tables_on_fresh_pool() {
        let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
        assert_eq!(
            missing_tables(&pool).await.unwrap(),
            vec!["users", "posts", "comments"]
        );
    }
}
