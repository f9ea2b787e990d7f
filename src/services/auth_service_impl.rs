//! `SeaORM` implementation of the `AuthService` trait.

use async_trait::async_trait;
use tracing::info;

use crate::config::SecurityConfig;
use crate::db::repositories::user::{hash_password, verify_password};
use crate::db::{NewUser, Store, User};
use crate::services::auth_service::{AuthError, AuthService, LoginResult, Registration};

pub struct SeaOrmAuthService {
    store: Store,
    security: SecurityConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub const fn new(store: Store, security: SecurityConfig) -> Self {
        Self { store, security }
    }

    fn normalize_email(email: &str) -> String {
        email.trim().to_lowercase()
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(&self, registration: Registration) -> Result<LoginResult, AuthError> {
        let email = Self::normalize_email(&registration.email);

        if registration.password.len() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "Password must be at least {} characters",
                self.security.min_password_length
            )));
        }

        if self.store.users().get_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken(email));
        }

        let password_hash = hash_password(&registration.password, &self.security).await?;

        let user = self
            .store
            .users()
            .create(NewUser {
                email,
                password_hash,
                firstname: registration.firstname.trim().to_string(),
                lastname: registration
                    .lastname
                    .map(|l| l.trim().to_string())
                    .filter(|l| !l.is_empty()),
            })
            .await?;

        info!(user_id = user.id, "Registered new user");

        Ok(LoginResult {
            api_key: user.api_key.clone(),
            user,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResult, AuthError> {
        let email = Self::normalize_email(email);

        let user = self
            .store
            .users()
            .verify_credentials(&email, password)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        Ok(LoginResult {
            api_key: user.api_key.clone(),
            user,
        })
    }

    async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>, AuthError> {
        Ok(self.store.users().verify_api_key(api_key).await?)
    }

    async fn get_user(&self, user_id: i32) -> Result<User, AuthError> {
        self.store
            .users()
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        if new_password.len() < self.security.min_password_length {
            return Err(AuthError::Validation(format!(
                "New password must be at least {} characters",
                self.security.min_password_length
            )));
        }

        if current_password == new_password {
            return Err(AuthError::Validation(
                "New password must be different from current password".to_string(),
            ));
        }

        let (_, stored_hash) = self
            .store
            .users()
            .get_with_password(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&stored_hash, current_password).await? {
            return Err(AuthError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        let new_hash = hash_password(new_password, &self.security).await?;
        self.store
            .users()
            .update_password_hash(user_id, new_hash)
            .await?;

        Ok(())
    }

    async fn get_api_key(&self, user_id: i32) -> Result<String, AuthError> {
        let user = self.get_user(user_id).await?;
        Ok(user.api_key)
    }

    async fn regenerate_api_key(&self, user_id: i32) -> Result<String, AuthError> {
        let new_api_key = self.store.users().regenerate_api_key(user_id).await?;
        info!(user_id, "API key regenerated");
        Ok(new_api_key)
    }
}
