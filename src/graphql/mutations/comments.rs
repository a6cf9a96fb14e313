use crate::db::{CreateComment, UpdateComment};

use super::prelude::*;

#[derive(Debug, InputObject)]
pub struct CreateCommentInput {
    pub comment: String,
    pub post_id: i64,
}

#[derive(Debug, InputObject)]
pub struct UpdateCommentInput {
    pub comment: Option<String>,
}

#[derive(Default)]
pub struct CommentMutations;

#[Object]
impl CommentMutations {
    #[graphql(guard = "AuthGuard")]
    async fn create_comment(
        &self,
        ctx: &Context<'_>,
        create_comment_input: CreateCommentInput,
    ) -> Result<Comment> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        let comment = services
            .comments
            .create(
                auth.user_id,
                CreateComment {
                    comment: create_comment_input.comment,
                    post_id: create_comment_input.post_id,
                },
            )
            .await
            .extend()?;
        Ok(comment.into())
    }

    #[graphql(guard = "AuthGuard")]
    async fn update_comment(
        &self,
        ctx: &Context<'_>,
        id: i64,
        update_comment_input: UpdateCommentInput,
    ) -> Result<Comment> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        let comment = services
            .comments
            .update(
                id,
                auth.user_id,
                UpdateComment {
                    comment: update_comment_input.comment,
                },
            )
            .await
            .extend()?;
        Ok(comment.into())
    }

    #[graphql(guard = "AuthGuard")]
    async fn remove_comment(&self, ctx: &Context<'_>, id: i64) -> Result<bool> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        services.comments.remove(id, auth.user_id).await.extend()
    }
}
