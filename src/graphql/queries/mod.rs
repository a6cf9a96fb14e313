pub mod comments;
pub mod posts;
pub mod users;

pub use comments::CommentQueries;
pub use posts::PostQueries;
pub use users::UserQueries;

pub(crate) mod prelude {
    pub(crate) use async_graphql::{Context, Object, Result, ResultExt};

    pub(crate) use crate::graphql::auth::{AuthExt, AuthGuard};
    pub(crate) use crate::graphql::pagination::{PaginationInput, normalize};
    pub(crate) use crate::graphql::projection::EntityKind;
    pub(crate) use crate::graphql::types::*;
    pub(crate) use crate::services::Services;

    pub(crate) use super::requested;
}

use std::sync::Arc;

use async_graphql::Context;

use crate::graphql::loaders::RequestLoaders;
use crate::graphql::projection::{EntityKind, Projection, project_selection};

/// Columns the current root field selected. Relation shapes are handed to
/// the request's loaders on the way.
pub(crate) fn requested(ctx: &Context<'_>, kind: EntityKind) -> Projection {
    let projection = project_selection(ctx.field(), kind);
    if let Ok(loaders) = ctx.data::<Arc<RequestLoaders>>() {
        loaders.prime(kind, &projection);
    }
    projection
}
