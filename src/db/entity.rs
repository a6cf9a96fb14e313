//! Table metadata and row decoding traits

use sqlx::Row;
use sqlx::sqlite::SqliteRow;

/// Metadata about a database entity (table).
pub trait DatabaseEntity: Sized + Send + Sync + Unpin {
    /// The SQL table name (e.g., "posts")
    const TABLE_NAME: &'static str;

    /// Human readable name used in error messages (e.g., "Post")
    const ENTITY_NAME: &'static str;

    /// The primary key column name
    const PRIMARY_KEY: &'static str = "id";

    /// List of all column names in the table
    fn column_names() -> &'static [&'static str];
}

/// Decode a row into a record.
///
/// Rows produced by a projected SELECT only carry some columns, so
/// implementations read every column through [`column_or_default`].
pub trait FromSqlRow: Sized {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error>;
}

/// Read a column, falling back to the type's default when the column was not
/// part of the projection.
pub fn column_or_default<T>(row: &SqliteRow, column: &str) -> Result<T, sqlx::Error>
where
    T: Default + for<'r> sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    match row.try_get::<T, _>(column) {
        Ok(value) => Ok(value),
        Err(sqlx::Error::ColumnNotFound(_)) => Ok(T::default()),
        Err(e) => Err(e),
    }
}
