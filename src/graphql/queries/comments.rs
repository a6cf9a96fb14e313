use super::prelude::*;

#[derive(Default)]
pub struct CommentQueries;

#[Object]
impl CommentQueries {
    async fn all_comments(
        &self,
        ctx: &Context<'_>,
        pagination: Option<PaginationInput>,
    ) -> Result<Vec<Comment>> {
        let services = ctx.data::<Services>()?;
        let projection = requested(ctx, EntityKind::Comment);
        let comments = services
            .comments
            .find_many(normalize(pagination.as_ref()), Some(&projection))
            .await
            .extend()?;
        Ok(comments.into_iter().map(Comment::from).collect())
    }

    async fn comment(&self, ctx: &Context<'_>, id: i64) -> Result<Comment> {
        let services = ctx.data::<Services>()?;
        let projection = requested(ctx, EntityKind::Comment);
        let comment = services.comments.find_one(id, Some(&projection)).await.extend()?;
        Ok(comment.into())
    }

    /// Comments on one post, one page at a time
    async fn comments_by_post_id(
        &self,
        ctx: &Context<'_>,
        post_id: i64,
        pagination: Option<PaginationInput>,
    ) -> Result<Vec<Comment>> {
        let services = ctx.data::<Services>()?;
        let projection = requested(ctx, EntityKind::Comment);
        let comments = services
            .comments
            .find_many_by_post(post_id, normalize(pagination.as_ref()), Some(&projection))
            .await
            .extend()?;
        Ok(comments.into_iter().map(Comment::from).collect())
    }
}
