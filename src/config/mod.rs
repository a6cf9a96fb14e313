//! Application configuration management

use std::env;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,

    /// SQLite connection URL (e.g. `sqlite:./data/blog.db` or `sqlite::memory:`)
    pub database_url: String,

    /// Maximum size of the connection pool
    pub database_max_connections: u32,

    /// JWT secret for token signing and verification
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub jwt_expires_in: i64,

    /// Bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:./data/blog.db".to_string());

        // JWT_SECRET should be set explicitly in production; a throwaway one keeps dev usable
        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            use std::collections::hash_map::DefaultHasher;
            use std::hash::{Hash, Hasher};
            let mut hasher = DefaultHasher::new();
            std::time::SystemTime::now().hash(&mut hasher);
            tracing::warn!("JWT_SECRET not set, using a generated development secret");
            format!("dev-secret-{}", hasher.finish())
        });

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "3001".to_string())
                .parse()
                .context("Invalid PORT")?,

            database_url,

            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("Invalid DATABASE_MAX_CONNECTIONS")?,

            jwt_secret: jwt_secret.trim().to_string(),

            jwt_expires_in: env::var("JWT_EXPIRES_IN")
                .unwrap_or_else(|_| (365 * 24 * 60 * 60).to_string())
                .parse()
                .context("Invalid JWT_EXPIRES_IN")?,

            bcrypt_cost: env::var("BCRYPT_COST")
                .ok()
                .map(|s| s.parse().context("Invalid BCRYPT_COST"))
                .transpose()?
                .unwrap_or(bcrypt::DEFAULT_COST),
        })
    }
}
