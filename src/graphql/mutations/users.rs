use crate::db::{CreateUser, UpdateUser};

use super::prelude::*;

#[derive(Debug, InputObject)]
pub struct CreateUserInput {
    pub name: String,
    pub email: String,
    /// Plaintext; stored hashed
    pub password: String,
}

#[derive(Debug, InputObject)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, InputObject)]
pub struct UpdateUserPasswordInput {
    pub password: String,
}

#[derive(Default)]
pub struct UserMutations;

#[Object]
impl UserMutations {
    /// Register a new user
    ///
    /// No authentication required.
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        create_user_input: CreateUserInput,
    ) -> Result<User> {
        let services = ctx.data::<Services>()?;
        let user = services
            .users
            .create(CreateUser {
                name: create_user_input.name,
                email: create_user_input.email,
                password: create_user_input.password,
            })
            .await
            .extend()?;
        Ok(user.into())
    }

    /// Update the current user's profile
    #[graphql(guard = "AuthGuard")]
    async fn update_user(
        &self,
        ctx: &Context<'_>,
        update_user_input: UpdateUserInput,
    ) -> Result<User> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        let user = services
            .users
            .update(
                auth.user_id,
                UpdateUser {
                    name: update_user_input.name,
                    email: update_user_input.email,
                },
            )
            .await
            .extend()?;
        Ok(user.into())
    }

    /// Change the current user's password
    #[graphql(guard = "AuthGuard")]
    async fn update_user_password(
        &self,
        ctx: &Context<'_>,
        update_user_password_input: UpdateUserPasswordInput,
    ) -> Result<bool> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        services
            .users
            .update_password(auth.user_id, &update_user_password_input.password)
            .await
            .extend()
    }

    /// Delete the current user along with their posts and comments
    #[graphql(guard = "AuthGuard")]
    async fn remove_user(&self, ctx: &Context<'_>) -> Result<bool> {
        let auth = ctx.auth_user()?;
        let services = ctx.data::<Services>()?;
        services.users.remove(auth.user_id).await.extend()
    }
}
