//! Post records

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;

use super::entity::{DatabaseEntity, FromSqlRow, column_or_default};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub author_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreatePost {
    pub title: String,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdatePost {
    pub title: Option<String>,
    pub content: Option<String>,
}

impl DatabaseEntity for PostRecord {
    const TABLE_NAME: &'static str = "posts";
    const ENTITY_NAME: &'static str = "Post";

    fn column_names() -> &'static [&'static str] {
        &["id", "title", "content", "author_id", "created_at", "updated_at"]
    }
}

impl FromSqlRow for PostRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: column_or_default(row, "id")?,
            title: column_or_default(row, "title")?,
            content: column_or_default(row, "content")?,
            author_id: column_or_default(row, "author_id")?,
            created_at: column_or_default(row, "created_at")?,
            updated_at: column_or_default(row, "updated_at")?,
        })
    }
}
