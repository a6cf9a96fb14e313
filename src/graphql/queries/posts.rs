use super::prelude::*;

#[derive(Default)]
pub struct PostQueries;

#[Object]
impl PostQueries {
    /// List posts, one page at a time
    async fn all_posts(
        &self,
        ctx: &Context<'_>,
        pagination: Option<PaginationInput>,
    ) -> Result<Vec<Post>> {
        let services = ctx.data::<Services>()?;
        let projection = requested(ctx, EntityKind::Post);
        let posts = services
            .posts
            .find_many(normalize(pagination.as_ref()), Some(&projection))
            .await
            .extend()?;
        Ok(posts.into_iter().map(Post::from).collect())
    }

    /// Posts written by the current user
    #[graphql(guard = "AuthGuard")]
    async fn all_posts_by_author(
        &self,
        ctx: &Context<'_>,
        pagination: Option<PaginationInput>,
    ) -> Result<Vec<Post>> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        let projection = requested(ctx, EntityKind::Post);
        let posts = services
            .posts
            .find_many_by_author(auth.user_id, normalize(pagination.as_ref()), Some(&projection))
            .await
            .extend()?;
        Ok(posts.into_iter().map(Post::from).collect())
    }

    async fn post(&self, ctx: &Context<'_>, id: i64) -> Result<Post> {
        let services = ctx.data::<Services>()?;
        let projection = requested(ctx, EntityKind::Post);
        let post = services.posts.find_one(id, Some(&projection)).await.extend()?;
        Ok(post.into())
    }
}
