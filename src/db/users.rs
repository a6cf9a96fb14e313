//! User records

use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqliteRow;

use super::entity::{DatabaseEntity, FromSqlRow, column_or_default};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// bcrypt digest, never exposed through GraphQL
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    /// Plaintext; hashed by the accessor before insert
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl DatabaseEntity for UserRecord {
    const TABLE_NAME: &'static str = "users";
    const ENTITY_NAME: &'static str = "User";

    fn column_names() -> &'static [&'static str] {
        &["id", "name", "email", "password", "created_at", "updated_at"]
    }
}

impl FromSqlRow for UserRecord {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: column_or_default(row, "id")?,
            name: column_or_default(row, "name")?,
            email: column_or_default(row, "email")?,
            password: column_or_default(row, "password")?,
            created_at: column_or_default(row, "created_at")?,
            updated_at: column_or_default(row, "updated_at")?,
        })
    }
}
