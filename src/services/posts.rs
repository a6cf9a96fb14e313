//! Post accessor

use crate::db::{
    CreatePost, Database, DatabaseEntity, EntityQuery, PostRecord, SortDirection, SqlValue, UpdatePost,
    now_iso8601, query,
};
use crate::error::{AppError, AppResult};
use crate::graphql::pagination::Window;
use crate::graphql::projection::Projection;

use super::guard::{Capability, authorize};
use super::projected_columns;

const DUPLICATE_TITLE: &str = "Title already used";

/// Columns every post fetch needs besides the projection.
const POST_KEYS: &[&str] = &["author_id"];

#[derive(Clone)]
pub struct PostService {
    db: Database,
}

impl PostService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Create a post owned by `author_id`. Titles are unique across all
    /// authors.
    pub async fn create(&self, author_id: i64, input: CreatePost) -> AppResult<PostRecord> {
        let existing = EntityQuery::<PostRecord>::new()
            .where_eq("title", input.title.as_str())
            .count(self.db.pool())
            .await?;
        if existing > 0 {
            return Err(AppError::DuplicateKey(DUPLICATE_TITLE.to_string()));
        }

        let now = now_iso8601();
        let content = input.content.map_or(SqlValue::Null, SqlValue::from);
        let id = query::insert::<PostRecord>(
            self.db.pool(),
            &[
                ("title", SqlValue::from(input.title)),
                ("content", content),
                ("author_id", SqlValue::from(author_id)),
                ("created_at", SqlValue::from(now.clone())),
                ("updated_at", SqlValue::from(now)),
            ],
        )
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_TITLE))?;

        tracing::info!(post_id = id, author_id, "Post created");
        self.find_one(id, None).await
    }

    pub async fn find_many(
        &self,
        window: Window,
        projection: Option<&Projection>,
    ) -> AppResult<Vec<PostRecord>> {
        Ok(EntityQuery::<PostRecord>::new()
            .select(&projected_columns(projection, POST_KEYS))
            .order_by("id", SortDirection::Asc)
            .window(window)
            .fetch_all(self.db.pool())
            .await?)
    }

    pub async fn find_many_by_author(
        &self,
        author_id: i64,
        window: Window,
        projection: Option<&Projection>,
    ) -> AppResult<Vec<PostRecord>> {
        Ok(EntityQuery::<PostRecord>::new()
            .select(&projected_columns(projection, POST_KEYS))
            .where_eq("author_id", author_id)
            .order_by("id", SortDirection::Asc)
            .window(window)
            .fetch_all(self.db.pool())
            .await?)
    }

    pub async fn find_all_by_ids(
        &self,
        ids: &[i64],
        projection: Option<&Projection>,
    ) -> AppResult<Vec<PostRecord>> {
        Ok(EntityQuery::<PostRecord>::new()
            .select(&projected_columns(projection, POST_KEYS))
            .where_in("id", ids)
            .fetch_all(self.db.pool())
            .await?)
    }

    pub async fn find_all_by_author_ids(
        &self,
        author_ids: &[i64],
        projection: Option<&Projection>,
    ) -> AppResult<Vec<PostRecord>> {
        Ok(EntityQuery::<PostRecord>::new()
            .select(&projected_columns(projection, POST_KEYS))
            .where_in("author_id", author_ids)
            .order_by("id", SortDirection::Asc)
            .fetch_all(self.db.pool())
            .await?)
    }

    pub async fn find_one(&self, id: i64, projection: Option<&Projection>) -> AppResult<PostRecord> {
        EntityQuery::<PostRecord>::new()
            .select(&projected_columns(projection, POST_KEYS))
            .where_eq("id", id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::not_found(PostRecord::ENTITY_NAME, id))
    }

    /// Apply the supplied fields to a post the actor owns. The returned
    /// record is the stored row with the changes merged in.
    pub async fn update(&self, id: i64, actor_id: i64, input: UpdatePost) -> AppResult<PostRecord> {
        let mut post = self.find_one(id, None).await?;
        authorize(
            actor_id,
            Capability::Update {
                entity: "post",
                owner_id: post.author_id,
            },
        )?;

        let now = now_iso8601();
        let mut values: Vec<(&'static str, SqlValue)> = Vec::new();
        if let Some(title) = &input.title {
            values.push(("title", title.as_str().into()));
        }
        if let Some(content) = &input.content {
            values.push(("content", content.as_str().into()));
        }
        values.push(("updated_at", now.as_str().into()));

        let affected = query::update_by_key::<PostRecord>(self.db.pool(), id, &values)
            .await
            .map_err(|e| AppError::from_write(e, DUPLICATE_TITLE))?;
        if affected == 0 {
            return Err(AppError::not_found(PostRecord::ENTITY_NAME, id));
        }

        if let Some(title) = input.title {
            post.title = title;
        }
        if input.content.is_some() {
            post.content = input.content;
        }
        post.updated_at = now;
        Ok(post)
    }

    /// Delete a post the actor owns.
    ///
    /// An id with no row is not an error: it returns `Ok(false)` rather than
    /// `NotFound`, so removing the same post twice yields `true` then
    /// `false`. Only `update` reports a missing post as `NotFound`.
    pub async fn remove(&self, id: i64, actor_id: i64) -> AppResult<bool> {
        let post = match self.find_one(id, None).await {
            Ok(post) => post,
            Err(AppError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        authorize(
            actor_id,
            Capability::Remove {
                entity: "post",
                owner_id: post.author_id,
            },
        )?;

        let removed = EntityQuery::<PostRecord>::new()
            .where_eq("id", id)
            .where_eq("author_id", actor_id)
            .delete(self.db.pool())
            .await?;
        Ok(removed == 1)
    }
}
