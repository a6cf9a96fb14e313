use super::prelude::*;

#[derive(Default)]
pub struct UserQueries;

#[Object]
impl UserQueries {
    /// List users, one page at a time
    async fn all_users(
        &self,
        ctx: &Context<'_>,
        pagination: Option<PaginationInput>,
    ) -> Result<Vec<User>> {
        let services = ctx.data::<Services>()?;
        let projection = requested(ctx, EntityKind::User);
        let users = services
            .users
            .find_many(normalize(pagination.as_ref()), Some(&projection))
            .await
            .extend()?;
        Ok(users.into_iter().map(User::from).collect())
    }

    async fn user(&self, ctx: &Context<'_>, id: i64) -> Result<User> {
        let services = ctx.data::<Services>()?;
        let projection = requested(ctx, EntityKind::User);
        let user = services.users.find_one(id, Some(&projection)).await.extend()?;
        Ok(user.into())
    }

    /// Get the current authenticated user
    #[graphql(guard = "AuthGuard")]
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        let projection = requested(ctx, EntityKind::User);
        let user = services
            .users
            .find_one(auth.user_id, Some(&projection))
            .await
            .extend()?;
        Ok(user.into())
    }
}
