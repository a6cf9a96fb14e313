//! Request-scoped loaders for every relation edge
//!
//! Relation resolvers never query storage directly. They fetch the
//! request's `Arc<RequestLoaders>` from the context and `load_with` the
//! parent's key and their projected selection, so resolving
//! `allPosts { author { name } }` over N posts costs one
//! `SELECT ... FROM users WHERE id IN (...)`.
//!
//! A fresh [`RequestLoaders`] is built by the HTTP handler for every
//! request, so nothing cached here outlives the request that loaded it.

mod batch;

use std::collections::HashMap;

use async_trait::async_trait;

pub use batch::{BatchLoader, Loader};

use crate::db::{CommentRecord, DatabaseEntity, PostRecord, UserRecord};
use crate::error::{AppError, AppResult};
use crate::graphql::projection::{EntityKind, Projection};
use crate::services::{CommentService, PostService, Services, UserService};

/// Key one-to-one rows by primary key.
fn by_id<T>(rows: Vec<T>, id: impl Fn(&T) -> i64) -> HashMap<i64, T> {
    rows.into_iter().map(|row| (id(&row), row)).collect()
}

/// Group one-to-many rows by foreign key. Every requested key gets an entry
/// so parents without children resolve to an empty list.
fn group_by<T>(keys: &[i64], rows: Vec<T>, fk: impl Fn(&T) -> i64) -> HashMap<i64, Vec<T>> {
    let mut grouped: HashMap<i64, Vec<T>> = keys.iter().map(|k| (*k, Vec::new())).collect();
    for row in rows {
        if let Some(children) = grouped.get_mut(&fk(&row)) {
            children.push(row);
        }
    }
    grouped
}

// ============================================================================
// One-to-one edges
// ============================================================================

/// Post -> author
pub struct PostAuthorLoader {
    users: UserService,
}

#[async_trait]
impl Loader for PostAuthorLoader {
    type Key = i64;
    type Value = UserRecord;
    const NAME: &'static str = "post_author";

    async fn load(
        &self,
        keys: &[i64],
        shape: Option<&Projection>,
    ) -> AppResult<HashMap<i64, UserRecord>> {
        let users = self.users.find_all_by_ids(keys, shape).await?;
        Ok(by_id(users, |u| u.id))
    }

    fn on_missing(&self, key: i64) -> AppResult<UserRecord> {
        Err(AppError::not_found(UserRecord::ENTITY_NAME, key))
    }
}

/// Comment -> user
pub struct CommentUserLoader {
    users: UserService,
}

#[async_trait]
impl Loader for CommentUserLoader {
    type Key = i64;
    type Value = UserRecord;
    const NAME: &'static str = "comment_user";

    async fn load(
        &self,
        keys: &[i64],
        shape: Option<&Projection>,
    ) -> AppResult<HashMap<i64, UserRecord>> {
        let users = self.users.find_all_by_ids(keys, shape).await?;
        Ok(by_id(users, |u| u.id))
    }

    fn on_missing(&self, key: i64) -> AppResult<UserRecord> {
        Err(AppError::not_found(UserRecord::ENTITY_NAME, key))
    }
}

/// Comment -> post
pub struct CommentPostLoader {
    posts: PostService,
}

#[async_trait]
impl Loader for CommentPostLoader {
    type Key = i64;
    type Value = PostRecord;
    const NAME: &'static str = "comment_post";

    async fn load(
        &self,
        keys: &[i64],
        shape: Option<&Projection>,
    ) -> AppResult<HashMap<i64, PostRecord>> {
        let posts = self.posts.find_all_by_ids(keys, shape).await?;
        Ok(by_id(posts, |p| p.id))
    }

    fn on_missing(&self, key: i64) -> AppResult<PostRecord> {
        Err(AppError::not_found(PostRecord::ENTITY_NAME, key))
    }
}

// ============================================================================
// One-to-many edges
// ============================================================================

/// Post -> comments, newest first
pub struct PostCommentsLoader {
    comments: CommentService,
}

#[async_trait]
impl Loader for PostCommentsLoader {
    type Key = i64;
    type Value = Vec<CommentRecord>;
    const NAME: &'static str = "post_comments";

    async fn load(
        &self,
        keys: &[i64],
        shape: Option<&Projection>,
    ) -> AppResult<HashMap<i64, Vec<CommentRecord>>> {
        let comments = self.comments.find_all_by_post_ids(keys, shape).await?;
        let total_loaded = comments.len();

        let mut grouped = group_by(keys, comments, |c| c.post_id);
        for children in grouped.values_mut() {
            children.sort_by(CommentRecord::newest_first);
        }

        tracing::debug!(
            loader = Self::NAME,
            parent_count = keys.len(),
            total_loaded,
            "Batch load complete"
        );
        Ok(grouped)
    }

    fn on_missing(&self, _key: i64) -> AppResult<Vec<CommentRecord>> {
        Ok(Vec::new())
    }
}

/// User -> posts, in storage order
pub struct UserPostsLoader {
    posts: PostService,
}

#[async_trait]
impl Loader for UserPostsLoader {
    type Key = i64;
    type Value = Vec<PostRecord>;
    const NAME: &'static str = "user_posts";

    async fn load(
        &self,
        keys: &[i64],
        shape: Option<&Projection>,
    ) -> AppResult<HashMap<i64, Vec<PostRecord>>> {
        let posts = self.posts.find_all_by_author_ids(keys, shape).await?;
        let total_loaded = posts.len();
        let grouped = group_by(keys, posts, |p| p.author_id);

        tracing::debug!(
            loader = Self::NAME,
            parent_count = keys.len(),
            total_loaded,
            "Batch load complete"
        );
        Ok(grouped)
    }

    fn on_missing(&self, _key: i64) -> AppResult<Vec<PostRecord>> {
        Ok(Vec::new())
    }
}

// ============================================================================
// Per-request set
// ============================================================================

/// One loader per relation edge, owned by a single request.
pub struct RequestLoaders {
    pub post_author: BatchLoader<PostAuthorLoader>,
    pub post_comments: BatchLoader<PostCommentsLoader>,
    pub user_posts: BatchLoader<UserPostsLoader>,
    pub comment_user: BatchLoader<CommentUserLoader>,
    pub comment_post: BatchLoader<CommentPostLoader>,
}

impl RequestLoaders {
    pub fn new(services: &Services) -> Self {
        Self {
            post_author: BatchLoader::new(PostAuthorLoader {
                users: services.users.clone(),
            }),
            post_comments: BatchLoader::new(PostCommentsLoader {
                comments: services.comments.clone(),
            }),
            user_posts: BatchLoader::new(UserPostsLoader {
                posts: services.posts.clone(),
            }),
            comment_user: BatchLoader::new(CommentUserLoader {
                users: services.users.clone(),
            }),
            comment_post: BatchLoader::new(CommentPostLoader {
                posts: services.posts.clone(),
            }),
        }
    }

    /// Add every relation a root selection asked for to the matching
    /// loader's shape. Root fields run before any relation batch goes out,
    /// so sibling and aliased root fields all land in the first dispatch.
    pub fn prime(&self, parent: EntityKind, projection: &Projection) {
        for relation in &projection.relations {
            let shape = Projection {
                columns: relation.sub_columns.clone(),
                relations: Vec::new(),
            };
            match (parent, relation.name.as_str()) {
                (EntityKind::Post, "author") => self.post_author.set_shape(&shape),
                (EntityKind::Post, "comments") => self.post_comments.set_shape(&shape),
                (EntityKind::User, "posts") => self.user_posts.set_shape(&shape),
                (EntityKind::Comment, "user") => self.comment_user.set_shape(&shape),
                (EntityKind::Comment, "post") => self.comment_post.set_shape(&shape),
                _ => tracing::trace!(
                    relation = %relation.name,
                    target = ?relation.target,
                    "No loader for relation"
                ),
            }
        }
    }
}
