//! Database connection and storage access
//!
//! The core talks to SQLite through the [`EntityQuery`] builder and the
//! per-table record types declared in the submodules.

pub mod comments;
pub mod entity;
pub mod posts;
pub mod query;
pub mod schema;
pub mod users;

use std::str::FromStr;

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

pub use comments::{CommentRecord, CreateComment, UpdateComment};
pub use entity::DatabaseEntity;
pub use posts::{CreatePost, PostRecord, UpdatePost};
pub use query::{EntityQuery, SortDirection, SqlValue};
pub use users::{CreateUser, UpdateUser, UserRecord};

/// Database wrapper providing connection pool access
#[derive(Clone, Debug)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    fn connect_options(url: &str) -> Result<SqliteConnectOptions> {
        Ok(SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true))
    }

    /// Create a new connection pool and make sure the tables exist
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(Self::connect_options(url)?)
            .await?;

        let db = Self { pool };
        schema::sync_schema(db.pool()).await?;
        Ok(db)
    }

    /// Private in-memory database. A single connection keeps every query on
    /// the same SQLite memory instance.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Current UTC time as RFC 3339 with millisecond precision (sortable as text)
pub fn now_iso8601() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
