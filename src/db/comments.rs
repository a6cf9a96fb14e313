//! Comment records

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;

use super::entity::{DatabaseEntity, FromSqlRow, column_or_default};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: i64,
    pub comment: String,
    pub post_id: i64,
    pub user_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateComment {
    pub comment: String,
    pub post_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateComment {
    pub comment: Option<String>,
}

impl CommentRecord {
    /// Newest first: later `created_at` wins, ties broken by the higher id.
    pub fn newest_first(a: &Self, b: &Self) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    }
}

impl DatabaseEntity for CommentRecord {
    const TABLE_NAME: &'static str = "comments";
    const ENTITY_NAME: &'static str = "Comment";

    fn column_names() -> &'static [&'static str] {
        &["id", "comment", "post_id", "user_id", "created_at", "updated_at"]
    }
}

impl FromSqlRow for CommentRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: column_or_default(row, "id")?,
            comment: column_or_default(row, "comment")?,
            post_id: column_or_default(row, "post_id")?,
            user_id: column_or_default(row, "user_id")?,
            created_at: column_or_default(row, "created_at")?,
            updated_at: column_or_default(row, "updated_at")?,
        })
    }
}
