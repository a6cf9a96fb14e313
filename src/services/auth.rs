//! Authentication service: credential checks and JWT handling
//!
//! Provides:
//! - Password hashing with bcrypt
//! - Login by email and password
//! - Access token generation and validation

use bcrypt::{hash, verify};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::db::UserRecord;
use crate::error::{AppError, AppResult};
use crate::graphql::auth::AuthUser;

use super::users::UserService;

// ============================================================================
// JWT Claims
// ============================================================================

/// Claims carried by an access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// User ID (subject)
    pub sub: String,
    pub name: String,
    pub email: String,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

// ============================================================================
// Configuration
// ============================================================================

/// Auth service configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT signing secret
    pub jwt_secret: String,
    /// Access token lifetime in seconds
    pub token_lifetime: i64,
    /// Bcrypt cost factor
    pub bcrypt_cost: u32,
}

impl From<&Config> for AuthConfig {
    fn from(config: &Config) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            token_lifetime: config.jwt_expires_in,
            bcrypt_cost: config.bcrypt_cost,
        }
    }
}

// ============================================================================
// Password Hashing
// ============================================================================

/// bcrypt with a fixed cost factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn hash(&self, password: &str) -> AppResult<String> {
        Ok(hash(password, self.cost)?)
    }

    pub fn verify(&self, password: &str, digest: &str) -> AppResult<bool> {
        Ok(verify(password, digest)?)
    }
}

// ============================================================================
// Auth Service
// ============================================================================

#[derive(Clone)]
pub struct AuthService {
    users: UserService,
    hasher: PasswordHasher,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(users: UserService, config: AuthConfig) -> Self {
        Self {
            users,
            hasher: PasswordHasher::new(config.bcrypt_cost),
            config,
        }
    }

    /// Check an email/password pair. Unknown emails and wrong passwords
    /// fail the same way.
    pub async fn validate_user(&self, email: &str, password: &str) -> AppResult<UserRecord> {
        let Some(user) = self.users.find_by_email(email).await? else {
            tracing::debug!("Login attempt for unknown email");
            return Err(AppError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password)? {
            tracing::debug!(user_id = user.id, "Login attempt with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Validate credentials and issue an access token.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<String> {
        let user = self.validate_user(email, password).await?;
        let token = self.issue_token(&user)?;
        tracing::info!(user_id = user.id, "User logged in");
        Ok(token)
    }

    pub fn issue_token(&self, user: &UserRecord) -> AppResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user.id.to_string(),
            name: user.name.clone(),
            email: user.email.clone(),
            exp: (now + Duration::seconds(self.config.token_lifetime)).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.config.jwt_secret.as_bytes()),
        )?)
    }

    /// Verify a bearer token and extract the principal.
    pub fn verify_token(&self, token: &str) -> AppResult<AuthUser> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.config.jwt_secret.as_bytes()),
            &validation,
        )?;

        let claims = token_data.claims;
        let user_id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| AppError::Unauthenticated)?;

        Ok(AuthUser {
            user_id,
            name: claims.name,
            email: claims.email,
        })
    }
}
