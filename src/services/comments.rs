//! Comment accessor

use crate::db::{
    CommentRecord, CreateComment, Database, DatabaseEntity, EntityQuery, PostRecord,
    SortDirection, SqlValue, UpdateComment, now_iso8601, query,
};
use crate::error::{AppError, AppResult};
use crate::graphql::pagination::Window;
use crate::graphql::projection::Projection;

use super::guard::{Capability, authorize};
use super::projected_columns;

/// Columns every comment fetch needs besides the projection.
const COMMENT_KEYS: &[&str] = &["user_id", "post_id"];

#[derive(Clone)]
pub struct CommentService {
    db: Database,
}

impl CommentService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Comment on an existing post as `user_id`.
    pub async fn create(&self, user_id: i64, input: CreateComment) -> AppResult<CommentRecord> {
        let post_exists = EntityQuery::<PostRecord>::new()
            .where_eq("id", input.post_id)
            .count(self.db.pool())
            .await?;
        if post_exists == 0 {
            return Err(AppError::not_found(PostRecord::ENTITY_NAME, input.post_id));
        }

        let now = now_iso8601();
        let id = query::insert::<CommentRecord>(
            self.db.pool(),
            &[
                ("comment", SqlValue::from(input.comment)),
                ("post_id", SqlValue::from(input.post_id)),
                ("user_id", SqlValue::from(user_id)),
                ("created_at", SqlValue::from(now.clone())),
                ("updated_at", SqlValue::from(now)),
            ],
        )
        .await?;

        tracing::info!(comment_id = id, post_id = input.post_id, user_id, "Comment created");
        self.find_one(id, None).await
    }

    pub async fn find_many(
        &self,
        window: Window,
        projection: Option<&Projection>,
    ) -> AppResult<Vec<CommentRecord>> {
        Ok(EntityQuery::<CommentRecord>::new()
            .select(&projected_columns(projection, COMMENT_KEYS))
            .order_by("id", SortDirection::Asc)
            .window(window)
            .fetch_all(self.db.pool())
            .await?)
    }

    pub async fn find_many_by_post(
        &self,
        post_id: i64,
        window: Window,
        projection: Option<&Projection>,
    ) -> AppResult<Vec<CommentRecord>> {
        Ok(EntityQuery::<CommentRecord>::new()
            .select(&projected_columns(projection, COMMENT_KEYS))
            .where_eq("post_id", post_id)
            .order_by("id", SortDirection::Asc)
            .window(window)
            .fetch_all(self.db.pool())
            .await?)
    }

    pub async fn find_all_by_ids(
        &self,
        ids: &[i64],
        projection: Option<&Projection>,
    ) -> AppResult<Vec<CommentRecord>> {
        Ok(EntityQuery::<CommentRecord>::new()
            .select(&projected_columns(projection, COMMENT_KEYS))
            .where_in("id", ids)
            .fetch_all(self.db.pool())
            .await?)
    }

    /// Comments for several posts, newest first. `created_at` is always
    /// fetched so callers can re-sort after grouping.
    pub async fn find_all_by_post_ids(
        &self,
        post_ids: &[i64],
        projection: Option<&Projection>,
    ) -> AppResult<Vec<CommentRecord>> {
        let mut required = COMMENT_KEYS.to_vec();
        required.push("created_at");
        Ok(EntityQuery::<CommentRecord>::new()
            .select(&projected_columns(projection, &required))
            .where_in("post_id", post_ids)
            .order_by("created_at", SortDirection::Desc)
            .order_by("id", SortDirection::Desc)
            .fetch_all(self.db.pool())
            .await?)
    }

    pub async fn find_one(&self, id: i64, projection: Option<&Projection>) -> AppResult<CommentRecord> {
        EntityQuery::<CommentRecord>::new()
            .select(&projected_columns(projection, COMMENT_KEYS))
            .where_eq("id", id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::not_found(CommentRecord::ENTITY_NAME, id))
    }

    /// Edit a comment the actor wrote.
    pub async fn update(
        &self,
        id: i64,
        actor_id: i64,
        input: UpdateComment,
    ) -> AppResult<CommentRecord> {
        let mut comment = self.find_one(id, None).await?;
        authorize(
            actor_id,
            Capability::Update {
                entity: "comment",
                owner_id: comment.user_id,
            },
        )?;

        let now = now_iso8601();
        let mut values: Vec<(&'static str, SqlValue)> = Vec::new();
        if let Some(text) = &input.comment {
            values.push(("comment", text.as_str().into()));
        }
        values.push(("updated_at", now.as_str().into()));

        let affected = query::update_by_key::<CommentRecord>(self.db.pool(), id, &values).await?;
        if affected == 0 {
            return Err(AppError::not_found(CommentRecord::ENTITY_NAME, id));
        }

        if let Some(text) = input.comment {
            comment.comment = text;
        }
        comment.updated_at = now;
        Ok(comment)
    }

    /// Delete a comment the actor wrote.
    ///
    /// An id with no row is not an error: it returns `Ok(false)` rather than
    /// `NotFound`, so removing the same comment twice yields `true` then
    /// `false`. Only `update` reports a missing comment as `NotFound`.
    pub async fn remove(&self, id: i64, actor_id: i64) -> AppResult<bool> {
        let comment = match self.find_one(id, None).await {
            Ok(comment) => comment,
            Err(AppError::NotFound { .. }) => return Ok(false),
            Err(e) => return Err(e),
        };
        authorize(
            actor_id,
            Capability::Remove {
                entity: "comment",
                owner_id: comment.user_id,
            },
        )?;

        let removed = EntityQuery::<CommentRecord>::new()
            .where_eq("id", id)
            .where_eq("user_id", actor_id)
            .delete(self.db.pool())
            .await?;
        Ok(removed == 1)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::db::CreatePost;
    use crate::services::{Services, testing};

    async fn post(services: &Services, author_id: i64) -> PostRecord {
        services
            .posts
            .create(
                author_id,
                CreatePost {
                    title: "On batching".into(),
                    content: None,
                },
            )
            .await
            .unwrap()
    }

    fn reply(post_id: i64, text: &str) -> CreateComment {
        CreateComment {
            comment: text.to_string(),
            post_id,
        }
    }

    #[tokio::test]
    async fn test_comment_on_missing_post() {
        let services = testing::services().await;
        let u1 = testing::user(&services, "U1").await;

        let err = services.comments.create(u1.id, reply(77, "hi")).await.unwrap_err();
        assert_matches!(err, AppError::NotFound { entity: "Post", id: Some(77) });
    }

    #[tokio::test]
    async fn test_only_author_may_edit_or_delete() {
        let services = testing::services().await;
        let u1 = testing::user(&services, "U1").await;
        let u2 = testing::user(&services, "U2").await;
        let post = post(&services, u1.id).await;
        let comment = services.comments.create(u2.id, reply(post.id, "first")).await.unwrap();

        let err = services
            .comments
            .update(
                comment.id,
                u1.id,
                UpdateComment {
                    comment: Some("edited".into()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "You are not authorized to update this comment");

        let err = services.comments.remove(comment.id, u1.id).await.unwrap_err();
        assert_eq!(err.to_string(), "You are not authorized to delete this comment");

        let edited = services
            .comments
            .update(
                comment.id,
                u2.id,
                UpdateComment {
                    comment: Some("edited".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(edited.comment, "edited");
        assert_eq!(edited.post_id, post.id);

        assert!(services.comments.remove(comment.id, u2.id).await.unwrap());
        assert!(!services.comments.remove(comment.id, u2.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_find_all_by_post_ids_newest_first() {
        let services = testing::services().await;
        let u1 = testing::user(&services, "U1").await;
        let post = post(&services, u1.id).await;
        for text in ["one", "two", "three"] {
            services.comments.create(u1.id, reply(post.id, text)).await.unwrap();
        }

        let texts: Vec<String> = services
            .comments
            .find_all_by_post_ids(&[post.id], None)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.comment)
            .collect();
        assert_eq!(texts, vec!["three", "two", "one"]);
    }

    #[tokio::test]
    async fn test_find_many_by_post_window() {
        let services = testing::services().await;
        let u1 = testing::user(&services, "U1").await;
        let post = post(&services, u1.id).await;
        for text in ["one", "two", "three"] {
            services.comments.create(u1.id, reply(post.id, text)).await.unwrap();
        }

        let page = services
            .comments
            .find_many_by_post(post.id, Window { offset: 2, limit: 10 }, None)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].comment, "three");
    }
}
