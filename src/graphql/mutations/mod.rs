pub mod auth;
pub mod comments;
pub mod posts;
pub mod users;

pub use auth::AuthMutations;
pub use comments::CommentMutations;
pub use posts::PostMutations;
pub use users::UserMutations;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, InputObject, Object, Result, ResultExt};

    pub(crate) use crate::graphql::auth::{AuthExt, AuthGuard};
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::Services;
}
