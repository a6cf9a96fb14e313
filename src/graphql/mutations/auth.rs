//! Login
//!
//! Token verification on incoming requests happens in the HTTP handler;
//! this is the only operation that issues tokens.

use async_graphql::SimpleObject;

use super::prelude::*;

/// Input for user login
#[derive(Debug, InputObject)]
pub struct AuthInput {
    pub email: String,
    pub password: String,
}

/// Token returned after successful authentication
#[derive(Debug, SimpleObject)]
pub struct AuthResponse {
    /// Access token (JWT)
    #[graphql(name = "access_token")]
    pub access_token: String,
}

#[derive(Default)]
pub struct AuthMutations;

#[Object]
impl AuthMutations {
    /// Authenticate with email and password
    ///
    /// No authentication required.
    async fn login(&self, ctx: &Context<'_>, auth_input: AuthInput) -> Result<AuthResponse> {
        let services = ctx.data::<Services>()?;
        let access_token = services
            .auth
            .login(&auth_input.email, &auth_input.password)
            .await
            .extend()?;
        Ok(AuthResponse { access_token })
    }
}
