//! Entity accessors and authentication
//!
//! Accessors own the data rules (uniqueness, ownership, partial updates);
//! resolvers and loaders only translate between GraphQL and these calls.

pub mod auth;
pub mod comments;
pub mod guard;
pub mod posts;
pub mod users;

pub use auth::{AuthConfig, AuthService, PasswordHasher};
pub use comments::CommentService;
pub use posts::PostService;
pub use users::UserService;

use crate::db::Database;
use crate::graphql::projection::Projection;

/// Every service the API needs, sharing one pool.
#[derive(Clone)]
pub struct Services {
    pub users: UserService,
    pub posts: PostService,
    pub comments: CommentService,
    pub auth: AuthService,
}

impl Services {
    pub fn new(db: Database, auth_config: AuthConfig) -> Self {
        let users = UserService::new(db.clone(), PasswordHasher::new(auth_config.bcrypt_cost));
        Self {
            posts: PostService::new(db.clone()),
            comments: CommentService::new(db),
            auth: AuthService::new(users.clone(), auth_config),
            users,
        }
    }
}

/// Columns to select for a projection plus the keys an accessor always
/// needs. No projection selects every column.
pub(crate) fn projected_columns(projection: Option<&Projection>, required: &[&str]) -> Vec<String> {
    projection
        .map(|p| p.columns_with(required))
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::db::{CreateUser, UserRecord};

    pub(crate) fn auth_config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_lifetime: 3600,
            bcrypt_cost: 4,
        }
    }

    /// Services over a fresh in-memory database.
    pub(crate) async fn services() -> Services {
        let db = Database::in_memory().await.expect("in-memory database");
        Services::new(db, auth_config())
    }

    pub(crate) async fn user(services: &Services, name: &str) -> UserRecord {
        services
            .users
            .create(CreateUser {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
                password: "hunter22".to_string(),
            })
            .await
            .expect("create user")
    }
}
