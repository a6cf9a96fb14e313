use crate::db::{CreatePost, UpdatePost};

use super::prelude::*;

#[derive(Debug, InputObject)]
pub struct CreatePostInput {
    pub title: String,
    pub content: Option<String>,
}

#[derive(Debug, InputObject)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
}

#[derive(Default)]
pub struct PostMutations;

#[Object]
impl PostMutations {
    #[graphql(guard = "AuthGuard")]
    async fn create_post(
        &self,
        ctx: &Context<'_>,
        create_post_input: CreatePostInput,
    ) -> Result<Post> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        let post = services
            .posts
            .create(
                auth.user_id,
                CreatePost {
                    title: create_post_input.title,
                    content: create_post_input.content,
                },
            )
            .await
            .extend()?;
        Ok(post.into())
    }

    /// Update a post owned by the current user
    #[graphql(guard = "AuthGuard")]
    async fn update_post(
        &self,
        ctx: &Context<'_>,
        id: i64,
        update_post_input: UpdatePostInput,
    ) -> Result<Post> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        let post = services
            .posts
            .update(
                id,
                auth.user_id,
                UpdatePost {
                    title: update_post_input.title,
                    content: update_post_input.content,
                },
            )
            .await
            .extend()?;
        Ok(post.into())
    }

    /// Delete a post owned by the current user
    #[graphql(guard = "AuthGuard")]
    async fn remove_post(&self, ctx: &Context<'_>, id: i64) -> Result<bool> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        services.posts.remove(id, auth.user_id).await.extend()
    }
}
