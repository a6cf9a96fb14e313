//! User accessor

use crate::db::{
    CreateUser, Database, DatabaseEntity, EntityQuery, SortDirection, SqlValue, UpdateUser, UserRecord,
    now_iso8601, query,
};
use crate::error::{AppError, AppResult};
use crate::graphql::pagination::Window;
use crate::graphql::projection::Projection;

use super::auth::PasswordHasher;
use super::projected_columns;

const DUPLICATE_EMAIL: &str = "User already exists";

#[derive(Clone)]
pub struct UserService {
    db: Database,
    hasher: PasswordHasher,
}

impl UserService {
    pub fn new(db: Database, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    /// Register a user. Emails are unique; the password is stored as a
    /// bcrypt digest.
    pub async fn create(&self, input: CreateUser) -> AppResult<UserRecord> {
        let existing = EntityQuery::<UserRecord>::new()
            .where_eq("email", input.email.as_str())
            .count(self.db.pool())
            .await?;
        if existing > 0 {
            return Err(AppError::DuplicateKey(DUPLICATE_EMAIL.to_string()));
        }

        let digest = self.hasher.hash(&input.password)?;
        let now = now_iso8601();
        let id = query::insert::<UserRecord>(
            self.db.pool(),
            &[
                ("name", SqlValue::from(input.name)),
                ("email", SqlValue::from(input.email)),
                ("password", SqlValue::from(digest)),
                ("created_at", SqlValue::from(now.clone())),
                ("updated_at", SqlValue::from(now)),
            ],
        )
        .await
        .map_err(|e| AppError::from_write(e, DUPLICATE_EMAIL))?;

        tracing::info!(user_id = id, "User created");
        self.get(id).await
    }

    pub async fn find_many(
        &self,
        window: Window,
        projection: Option<&Projection>,
    ) -> AppResult<Vec<UserRecord>> {
        Ok(EntityQuery::<UserRecord>::new()
            .select(&projected_columns(projection, &[]))
            .order_by("id", SortDirection::Asc)
            .window(window)
            .fetch_all(self.db.pool())
            .await?)
    }

    /// Batch fetch for loaders. Missing ids are simply absent.
    pub async fn find_all_by_ids(
        &self,
        ids: &[i64],
        projection: Option<&Projection>,
    ) -> AppResult<Vec<UserRecord>> {
        Ok(EntityQuery::<UserRecord>::new()
            .select(&projected_columns(projection, &[]))
            .where_in("id", ids)
            .fetch_all(self.db.pool())
            .await?)
    }

    pub async fn find_one(&self, id: i64, projection: Option<&Projection>) -> AppResult<UserRecord> {
        EntityQuery::<UserRecord>::new()
            .select(&projected_columns(projection, &[]))
            .where_eq("id", id)
            .fetch_optional(self.db.pool())
            .await?
            .ok_or_else(|| AppError::not_found(UserRecord::ENTITY_NAME, id))
    }

    /// Full row, password digest included.
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<UserRecord>> {
        Ok(EntityQuery::<UserRecord>::new()
            .where_eq("email", email)
            .fetch_optional(self.db.pool())
            .await?)
    }

    async fn get(&self, id: i64) -> AppResult<UserRecord> {
        self.find_one(id, None).await
    }

    /// Apply the supplied fields to the user's own row and return it.
    pub async fn update(&self, id: i64, input: UpdateUser) -> AppResult<UserRecord> {
        let mut values: Vec<(&'static str, SqlValue)> = Vec::new();
        if let Some(name) = input.name {
            values.push(("name", name.into()));
        }
        if let Some(email) = input.email {
            values.push(("email", email.into()));
        }
        values.push(("updated_at", now_iso8601().into()));

        let affected = query::update_by_key::<UserRecord>(self.db.pool(), id, &values)
            .await
            .map_err(|e| AppError::from_write(e, DUPLICATE_EMAIL))?;
        if affected == 0 {
            return Err(AppError::not_found(UserRecord::ENTITY_NAME, id));
        }

        self.get(id).await
    }

    /// Hash and store a new password. Returns whether the row was updated.
    pub async fn update_password(&self, id: i64, password: &str) -> AppResult<bool> {
        let digest = self.hasher.hash(password)?;
        let affected = query::update_by_key::<UserRecord>(
            self.db.pool(),
            id,
            &[
                ("password", SqlValue::from(digest)),
                ("updated_at", SqlValue::from(now_iso8601())),
            ],
        )
        .await?;
        Ok(affected == 1)
    }

    /// Delete the user; their posts and comments cascade. A user that is
    /// already gone yields `Ok(false)`, not `NotFound`.
    pub async fn remove(&self, id: i64) -> AppResult<bool> {
        let removed = EntityQuery::<UserRecord>::new()
            .where_eq("id", id)
            .delete(self.db.pool())
            .await?;
        if removed == 1 {
            tracing::info!(user_id = id, "User removed");
        }
        Ok(removed == 1)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::graphql::projection::{RequestedFields, USER_COLUMNS, project};
    use crate::services::testing;

    #[tokio::test]
    async fn test_create_hashes_password() {
        let services = testing::services().await;
        let user = testing::user(&services, "Ada").await;

        assert_eq!(user.email, "ada@example.com");
        assert_ne!(user.password, "hunter22");
        assert!(bcrypt::verify("hunter22", &user.password).unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let services = testing::services().await;
        testing::user(&services, "Ada").await;

        let err = services
            .users
            .create(CreateUser {
                name: "Other Ada".into(),
                email: "ada@example.com".into(),
                password: "secret".into(),
            })
            .await
            .unwrap_err();
        assert_matches!(err, AppError::DuplicateKey(ref msg) if msg == "User already exists");
    }

    #[tokio::test]
    async fn test_find_one_respects_projection() {
        let services = testing::services().await;
        let ada = testing::user(&services, "Ada").await;

        let projection = project(&RequestedFields::leaves(&["name"]), &USER_COLUMNS);
        let found = services.users.find_one(ada.id, Some(&projection)).await.unwrap();

        assert_eq!(found.id, ada.id);
        assert_eq!(found.name, "Ada");
        assert_eq!(found.email, "");
        assert_eq!(found.password, "");
    }

    #[tokio::test]
    async fn test_find_one_missing() {
        let services = testing::services().await;
        let err = services.users.find_one(42, None).await.unwrap_err();
        assert_matches!(err, AppError::NotFound { entity: "User", id: Some(42) });
    }

    #[tokio::test]
    async fn test_find_many_window() {
        let services = testing::services().await;
        for name in ["A", "B", "C"] {
            testing::user(&services, name).await;
        }

        let page = services
            .users
            .find_many(Window { offset: 1, limit: 1 }, None)
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "B");
    }

    #[tokio::test]
    async fn test_update_keeps_unspecified_fields() {
        let services = testing::services().await;
        let ada = testing::user(&services, "Ada").await;

        let updated = services
            .users
            .update(
                ada.id,
                UpdateUser {
                    name: Some("Ada L.".into()),
                    email: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Ada L.");
        assert_eq!(updated.email, "ada@example.com");
    }

    #[tokio::test]
    async fn test_update_to_taken_email_is_duplicate() {
        let services = testing::services().await;
        testing::user(&services, "Ada").await;
        let bob = testing::user(&services, "Bob").await;

        let err = services
            .users
            .update(
                bob.id,
                UpdateUser {
                    name: None,
                    email: Some("ada@example.com".into()),
                },
            )
            .await
            .unwrap_err();
        assert_matches!(err, AppError::DuplicateKey(_));
    }

    #[tokio::test]
    async fn test_update_password_stores_digest() {
        let services = testing::services().await;
        let ada = testing::user(&services, "Ada").await;

        assert!(services.users.update_password(ada.id, "n3w-pass").await.unwrap());

        let stored = services
            .users
            .find_by_email("ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_ne!(stored.password, "n3w-pass");
        assert!(bcrypt::verify("n3w-pass", &stored.password).unwrap());
    }

    #[tokio::test]
    async fn test_update_password_unknown_user() {
        let services = testing::services().await;
        assert!(!services.users.update_password(99, "whatever").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_twice() {
        let services = testing::services().await;
        let ada = testing::user(&services, "Ada").await;

        assert!(services.users.remove(ada.id).await.unwrap());
        assert!(!services.users.remove(ada.id).await.unwrap());
    }
}
