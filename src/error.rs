//! Error taxonomy shared by accessors, loaders and resolvers
//!
//! `AppError` is `Clone` so a failed batch can hand the same failure to
//! every key that was waiting on it.

use std::sync::Arc;

use async_graphql::ErrorExtensions;

/// Errors surfaced by the core. Each kind maps to a distinct GraphQL `code`.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AppError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str, id: Option<i64> },

    #[error("{0}")]
    DuplicateKey(String),

    #[error("You are not authorized to {action} this {entity}")]
    Unauthorized {
        action: &'static str,
        entity: &'static str,
    },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("batch load for {loader} failed: {source}")]
    BatchDispatch {
        loader: &'static str,
        #[source]
        source: Arc<AppError>,
    },

    #[error("database error: {0}")]
    Database(#[source] Arc<sqlx::Error>),

    #[error("password hashing failed: {0}")]
    Hash(#[source] Arc<bcrypt::BcryptError>),

    #[error("token error: {0}")]
    Token(#[source] Arc<jsonwebtoken::errors::Error>),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound {
            entity,
            id: Some(id),
        }
    }

    pub fn batch(loader: &'static str, source: AppError) -> Self {
        Self::BatchDispatch {
            loader,
            source: Arc::new(source),
        }
    }

    /// Stable machine-readable code exposed in the GraphQL error extensions.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::DuplicateKey(_) => "DUPLICATE_KEY",
            Self::Unauthorized { .. } => "UNAUTHORIZED",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::BatchDispatch { .. } => "BATCH_DISPATCH_FAILURE",
            Self::Database(_) | Self::Hash(_) | Self::Token(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    /// Translate a write failure, turning unique-constraint violations into
    /// `DuplicateKey` with the given message.
    pub fn from_write(err: sqlx::Error, duplicate_message: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return Self::DuplicateKey(duplicate_message.to_string());
            }
        }
        err.into()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(Arc::new(err))
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(err: bcrypt::BcryptError) -> Self {
        Self::Hash(Arc::new(err))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        Self::Token(Arc::new(err))
    }
}

impl ErrorExtensions for AppError {
    fn extend(&self) -> async_graphql::Error {
        if matches!(self.code(), "INTERNAL_SERVER_ERROR") {
            tracing::error!(error = %self, "Internal error while resolving request");
        }
        async_graphql::Error::new(self.to_string()).extend_with(|_, e| {
            e.set("code", self.code());
            if let Self::NotFound { id: Some(id), .. } = self {
                e.set("id", *id);
            }
        })
    }
}
