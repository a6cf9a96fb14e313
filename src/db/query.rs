//! SQL query builder for the storage collaborator
//!
//! Builds parameterized SELECT/COUNT/DELETE statements for a
//! [`DatabaseEntity`] with an optional column projection, and provides the
//! insert and keyed-update helpers the accessors use. Column names are only
//! ever taken from the entity's declared column list, so projected names
//! coming from a query shape cannot inject SQL.

use std::marker::PhantomData;

use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use super::entity::{DatabaseEntity, FromSqlRow};
use crate::graphql::pagination::Window;

/// A SQL value bound to a query placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Int(i64),
    Text(String),
    Null,
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

type SqliteQuery<'q> = sqlx::query::Query<'q, Sqlite, SqliteArguments<'q>>;

fn bind_all<'q>(mut query: SqliteQuery<'q>, values: &'q [SqlValue]) -> SqliteQuery<'q> {
    for value in values {
        query = match value {
            SqlValue::Int(i) => query.bind(*i),
            SqlValue::Text(s) => query.bind(s.as_str()),
            SqlValue::Null => query.bind(None::<String>),
        };
    }
    query
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// A query builder for database entities.
pub struct EntityQuery<E: DatabaseEntity> {
    _phantom: PhantomData<E>,
    columns: Vec<&'static str>,
    where_clauses: Vec<String>,
    values: Vec<SqlValue>,
    order_by: Vec<String>,
    window: Option<Window>,
}

impl<E: DatabaseEntity + FromSqlRow> EntityQuery<E> {
    /// Create a new query builder for the entity type.
    pub fn new() -> Self {
        Self {
            _phantom: PhantomData,
            columns: Vec::new(),
            where_clauses: Vec::new(),
            values: Vec::new(),
            order_by: Vec::new(),
            window: None,
        }
    }

    /// Restrict the SELECT to the given columns. Names that are not columns
    /// of the entity are dropped; an empty projection selects everything.
    pub fn select<S: AsRef<str>>(mut self, columns: &[S]) -> Self {
        for column in columns {
            let known = E::column_names()
                .iter()
                .find(|c| **c == column.as_ref());
            if let Some(known) = known {
                if !self.columns.contains(known) {
                    self.columns.push(known);
                }
            }
        }
        self
    }

    /// Add a `column = ?` condition.
    pub fn where_eq(mut self, column: &'static str, value: impl Into<SqlValue>) -> Self {
        self.where_clauses.push(format!("{} = ?", column));
        self.values.push(value.into());
        self
    }

    /// Add a `column IN (...)` condition. An empty list matches nothing.
    pub fn where_in(mut self, column: &'static str, keys: &[i64]) -> Self {
        if keys.is_empty() {
            self.where_clauses.push("1 = 0".to_string());
            return self;
        }
        let placeholders = vec!["?"; keys.len()].join(", ");
        self.where_clauses
            .push(format!("{} IN ({})", column, placeholders));
        self.values.extend(keys.iter().copied().map(SqlValue::Int));
        self
    }

    /// Add sorting to the query.
    pub fn order_by(mut self, column: &'static str, direction: SortDirection) -> Self {
        self.order_by
            .push(format!("{} {}", column, direction.to_sql()));
        self
    }

    /// Apply an offset/limit window.
    pub fn window(mut self, window: Window) -> Self {
        self.window = Some(window);
        self
    }

    fn where_sql(&self) -> String {
        if self.where_clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.where_clauses.join(" AND "))
        }
    }

    /// Build the SQL query string.
    fn build_sql(&self) -> String {
        let columns = if self.columns.is_empty() {
            E::column_names().join(", ")
        } else {
            self.columns.join(", ")
        };
        let mut sql = format!("SELECT {} FROM {}", columns, E::TABLE_NAME);
        sql.push_str(&self.where_sql());

        if !self.order_by.is_empty() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&self.order_by.join(", "));
        }

        if let Some(window) = self.window {
            sql.push_str(&format!(" LIMIT {} OFFSET {}", window.limit, window.offset));
        }

        sql
    }

    /// Build a COUNT query string.
    fn build_count_sql(&self) -> String {
        format!("SELECT COUNT(*) FROM {}{}", E::TABLE_NAME, self.where_sql())
    }

    /// Build a DELETE query string.
    fn build_delete_sql(&self) -> String {
        format!("DELETE FROM {}{}", E::TABLE_NAME, self.where_sql())
    }

    /// Execute the query and return all matching entities.
    pub async fn fetch_all(self, pool: &SqlitePool) -> Result<Vec<E>, sqlx::Error> {
        let sql = self.build_sql();
        tracing::debug!(sql = %sql, "Executing entity query");

        let rows: Vec<SqliteRow> = bind_all(sqlx::query(&sql), &self.values)
            .fetch_all(pool)
            .await?;
        rows.iter().map(E::from_row).collect()
    }

    /// Execute the query and return at most one entity.
    pub async fn fetch_optional(self, pool: &SqlitePool) -> Result<Option<E>, sqlx::Error> {
        let sql = self.build_sql();
        tracing::debug!(sql = %sql, "Executing entity query (one)");

        match bind_all(sqlx::query(&sql), &self.values)
            .fetch_optional(pool)
            .await?
        {
            Some(row) => Ok(Some(E::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Execute a COUNT query with the current conditions.
    pub async fn count(&self, pool: &SqlitePool) -> Result<i64, sqlx::Error> {
        let sql = self.build_count_sql();
        tracing::debug!(sql = %sql, "Executing count query");

        let row = bind_all(sqlx::query(&sql), &self.values)
            .fetch_one(pool)
            .await?;
        row.try_get(0)
    }

    /// Delete every row matching the current conditions; returns rows affected.
    pub async fn delete(self, pool: &SqlitePool) -> Result<u64, sqlx::Error> {
        let sql = self.build_delete_sql();
        tracing::debug!(sql = %sql, "Executing delete");

        let result = bind_all(sqlx::query(&sql), &self.values)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}

impl<E: DatabaseEntity + FromSqlRow> Default for EntityQuery<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Insert a row and return its generated primary key.
pub async fn insert<E: DatabaseEntity>(
    pool: &SqlitePool,
    values: &[(&'static str, SqlValue)],
) -> Result<i64, sqlx::Error> {
    let columns: Vec<&str> = values.iter().map(|(c, _)| *c).collect();
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        E::TABLE_NAME,
        columns.join(", "),
        vec!["?"; columns.len()].join(", ")
    );
    tracing::debug!(sql = %sql, "Executing insert");

    let binds: Vec<SqlValue> = values.iter().map(|(_, v)| v.clone()).collect();
    let result = bind_all(sqlx::query(&sql), &binds).execute(pool).await?;
    Ok(result.last_insert_rowid())
}

/// Update the given columns of the row with primary key `key`; returns rows
/// affected. An empty change set touches nothing.
pub async fn update_by_key<E: DatabaseEntity>(
    pool: &SqlitePool,
    key: i64,
    values: &[(&'static str, SqlValue)],
) -> Result<u64, sqlx::Error> {
    if values.is_empty() {
        return Ok(0);
    }
    let assignments: Vec<String> = values.iter().map(|(c, _)| format!("{} = ?", c)).collect();
    let sql = format!(
        "UPDATE {} SET {} WHERE {} = ?",
        E::TABLE_NAME,
        assignments.join(", "),
        E::PRIMARY_KEY
    );
    tracing::debug!(sql = %sql, "Executing update");

    let mut binds: Vec<SqlValue> = values.iter().map(|(_, v)| v.clone()).collect();
    binds.push(SqlValue::Int(key));
    let result = bind_all(sqlx::query(&sql), &binds).execute(pool).await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::PostRecord;

    #[test]
    fn test_select_drops_unknown_columns() {
        let query = EntityQuery::<PostRecord>::new().select(&["title", "bogus; DROP TABLE", "id"]);
        assert_eq!(query.build_sql(), "SELECT title, id FROM posts");
    }

    #[test]
    fn test_empty_projection_selects_all_columns() {
        let sql = EntityQuery::<PostRecord>::new().build_sql();
        assert_eq!(
            sql,
            "SELECT id, title, content, author_id, created_at, updated_at FROM posts"
        );
    }

    #[test]
    fn test_conditions_order_and_window() {
        let query = EntityQuery::<PostRecord>::new()
            .select(&["id"])
            .where_in("author_id", &[1, 2])
            .order_by("created_at", SortDirection::Desc)
            .window(Window {
                offset: 20,
                limit: 10,
            });
        assert_eq!(
            query.build_sql(),
            "SELECT id FROM posts WHERE author_id IN (?, ?) ORDER BY created_at DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(query.values, vec![SqlValue::Int(1), SqlValue::Int(2)]);
    }

    #[test]
    fn test_empty_in_list_matches_nothing() {
        let query = EntityQuery::<PostRecord>::new().where_in("id", &[]);
        assert_eq!(query.build_count_sql(), "SELECT COUNT(*) FROM posts WHERE 1 = 0");
    }

    #[test]
    fn test_delete_sql_keeps_every_condition() {
        let query = EntityQuery::<PostRecord>::new()
            .where_eq("id", 4_i64)
            .where_eq("author_id", 9_i64);
        assert_eq!(
            query.build_delete_sql(),
            "DELETE FROM posts WHERE id = ? AND author_id = ?"
        );
    }
}
