//! GraphQL object types
//!
//! Scalar fields come straight from the stored record. Relation fields go
//! through the request's loaders, passing the nested selection so the loader
//! fetches at least the columns asked for.

use std::sync::Arc;

use async_graphql::{ComplexObject, Context, Result, ResultExt, SimpleObject};

use crate::db::{CommentRecord, PostRecord, UserRecord};
use crate::graphql::loaders::RequestLoaders;
use crate::graphql::projection::{EntityKind, project_selection};

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: String,
    pub updated_at: String,
}

#[ComplexObject]
impl User {
    /// Posts written by this user
    async fn posts(&self, ctx: &Context<'_>) -> Result<Vec<Post>> {
        let loaders = ctx.data::<Arc<RequestLoaders>>()?;
        let projection = project_selection(ctx.field(), EntityKind::Post);
        let posts = loaders.user_posts.load_with(self.id, &projection).await.extend()?;
        Ok(posts.into_iter().map(Post::from).collect())
    }
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            name: record.name,
            email: record.email,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Post {
    pub id: i64,
    pub title: String,
    pub content: Option<String>,
    pub created_at: String,
    pub updated_at: String,

    #[graphql(skip)]
    pub author_id: i64,
}

#[ComplexObject]
impl Post {
    async fn author(&self, ctx: &Context<'_>) -> Result<User> {
        let loaders = ctx.data::<Arc<RequestLoaders>>()?;
        let projection = project_selection(ctx.field(), EntityKind::User);
        Ok(loaders.post_author.load_with(self.author_id, &projection).await.extend()?.into())
    }

    /// Comments on this post, newest first
    async fn comments(&self, ctx: &Context<'_>) -> Result<Vec<Comment>> {
        let loaders = ctx.data::<Arc<RequestLoaders>>()?;
        let projection = project_selection(ctx.field(), EntityKind::Comment);
        let comments = loaders.post_comments.load_with(self.id, &projection).await.extend()?;
        Ok(comments.into_iter().map(Comment::from).collect())
    }
}

impl From<PostRecord> for Post {
    fn from(record: PostRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            content: record.content,
            created_at: record.created_at,
            updated_at: record.updated_at,
            author_id: record.author_id,
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Comment {
    pub id: i64,
    pub comment: String,
    pub created_at: String,
    pub updated_at: String,

    #[graphql(skip)]
    pub post_id: i64,
    #[graphql(skip)]
    pub user_id: i64,
}

#[ComplexObject]
impl Comment {
    async fn user(&self, ctx: &Context<'_>) -> Result<User> {
        let loaders = ctx.data::<Arc<RequestLoaders>>()?;
        let projection = project_selection(ctx.field(), EntityKind::User);
        Ok(loaders.comment_user.load_with(self.user_id, &projection).await.extend()?.into())
    }

    async fn post(&self, ctx: &Context<'_>) -> Result<Post> {
        let loaders = ctx.data::<Arc<RequestLoaders>>()?;
        let projection = project_selection(ctx.field(), EntityKind::Post);
        Ok(loaders.comment_post.load_with(self.post_id, &projection).await.extend()?.into())
    }
}

impl From<CommentRecord> for Comment {
    fn from(record: CommentRecord) -> Self {
        Self {
            id: record.id,
            comment: record.comment,
            created_at: record.created_at,
            updated_at: record.updated_at,
            post_id: record.post_id,
            user_id: record.user_id,
        }
    }
}
