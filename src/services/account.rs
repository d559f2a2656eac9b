use std::sync::Arc;

use crate::{
    config::Config,
    database::{InventoryStore, StoreError},
    error::AppError,
    models::{NewUser, Role, User},
    utils::{hash_password, secrets_match, verify_password},
};

const MIN_PASSWORD_LEN: usize = 6;

/// Registration and credential checks. Token issuing stays with the caller.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn InventoryStore>,
    admin_secret: Option<String>,
    bcrypt_cost: u32,
}

impl AccountService {
    pub fn new(store: Arc<dyn InventoryStore>, admin_secret: Option<String>, bcrypt_cost: u32) -> Self {
        Self {
            store,
            admin_secret,
            bcrypt_cost,
        }
    }

    pub fn from_config(store: Arc<dyn InventoryStore>, config: &Config) -> Self {
        Self::new(store, config.admin_secret.clone(), config.bcrypt_cost)
    }

    /// Creates a user. A wrong `admin_secret` is not an error: the caller is
    /// registered as a plain user and gets the same success response, so the
    /// endpoint cannot be used to probe the secret.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        admin_secret: Option<&str>,
    ) -> Result<User, AppError> {
        let name = name.trim();
        let email = normalize_email(email);

        if name.is_empty() || email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Please provide name, email and password".into(),
            ));
        }
        if !email.contains('@') {
            return Err(AppError::Validation("Please provide a valid email".into()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        let role = self.resolve_role(&email, admin_secret);
        let password_hash = self.hash(password).await?;

        let user = self
            .store
            .create_user(NewUser {
                name: name.to_string(),
                email,
                password_hash,
                role,
            })
            .await?;

        tracing::info!(user_id = %user.id, role = %user.role, "User registered");
        Ok(user)
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AppError> {
        let email = normalize_email(email);
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Please provide email and password".into(),
            ));
        }

        let user = match self.store.find_user_by_email(&email).await {
            Ok(user) => user,
            Err(StoreError::NotFound { .. }) => return Err(invalid_credentials()),
            Err(e) => return Err(e.into()),
        };

        if !self.verify(password, &user.password_hash).await? {
            return Err(invalid_credentials());
        }

        Ok(user)
    }

    fn resolve_role(&self, email: &str, candidate: Option<&str>) -> Role {
        let Some(candidate) = candidate.filter(|s| !s.is_empty()) else {
            return Role::User;
        };

        match &self.admin_secret {
            Some(expected) if secrets_match(candidate, expected) => {
                tracing::warn!(email, "Admin registered");
                Role::Admin
            }
            _ => {
                tracing::warn!(email, "Failed admin attempt, registering as user");
                Role::User
            }
        }
    }

    async fn hash(&self, password: &str) -> Result<String, AppError> {
        let password = password.to_string();
        let cost = self.bcrypt_cost;
        tokio::task::spawn_blocking(move || hash_password(&password, cost))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Internal(format!("Failed to hash password: {e}")))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let password = password.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(e.to_string()))?
            .map_err(|e| AppError::Internal(format!("Failed to verify password: {e}")))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn invalid_credentials() -> AppError {
    AppError::Unauthenticated("Invalid credentials".into())
}
