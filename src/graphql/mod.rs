//! GraphQL API
//!
//! Resolvers translate between the wire and the entity accessors. Relation
//! fields are resolved through request-scoped batch loaders, and every
//! fetch is narrowed to the columns the query selected.

pub mod auth;
pub mod loaders;
pub mod mutations;
pub mod pagination;
pub mod projection;
pub mod queries;
mod schema;
pub mod types;

pub use loaders::RequestLoaders;
pub use schema::{BlogSchema, build_schema};
