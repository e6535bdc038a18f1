use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::error::ServiceError;
use crate::api::requests::RegisterRequest;
use crate::auth::password::{self, PasswordError};
use crate::auth::{Identity, TokenService};
use crate::database::{DocumentStore, FilterData, Repository, StoreError};
use crate::models::{Profile, User, UserView};

/// Registration, login and account lifecycle.
#[derive(Clone)]
pub struct AccountService {
    users: Repository<User>,
    profiles: Repository<Profile>,
    tokens: TokenService,
}

impl AccountService {
    pub fn new(store: Arc<dyn DocumentStore>, tokens: TokenService) -> Self {
        Self {
            users: Repository::new(store.clone()),
            profiles: Repository::new(store),
            tokens,
        }
    }

    /// Create an account and return a token for it.
    #[instrument(name = "accounts.register", skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: RegisterRequest) -> Result<String, ServiceError> {
        let email = normalize_email(&request.email);

        if self.find_by_email(&email).await?.is_some() {
            warn!("Registration rejected: account already exists");
            return Err(ServiceError::DuplicateAccount);
        }

        let user = User {
            id: Uuid::new_v4(),
            name: request.name,
            avatar: gravatar_url(&email),
            email,
            password_hash: hash_off_thread(request.password).await?,
            date: Utc::now(),
        };

        self.users.insert(&user).await.map_err(|e| match e {
            // Lost the race against a concurrent registration for the same email
            StoreError::Conflict(_) => ServiceError::DuplicateAccount,
            other => ServiceError::Store(other),
        })?;

        info!(user_id = %user.id, "Registered new user");
        Ok(self.tokens.issue(Identity::new(user.id))?)
    }

    /// Exchange credentials for a token. Every failure is `InvalidCredentials`.
    #[instrument(name = "accounts.login", skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<String, ServiceError> {
        let email = normalize_email(email);

        let Some(user) = self.find_by_email(&email).await? else {
            warn!("Login failed");
            return Err(ServiceError::InvalidCredentials);
        };

        if !verify_off_thread(password.to_string(), user.password_hash.clone()).await? {
            warn!("Login failed");
            return Err(ServiceError::InvalidCredentials);
        }

        info!(user_id = %user.id, "User logged in");
        Ok(self.tokens.issue(Identity::new(user.id))?)
    }

    pub async fn whoami(&self, identity: &Identity) -> Result<UserView, ServiceError> {
        self.users
            .find_by_id(identity.id)
            .await?
            .map(|found| UserView::from(found.doc))
            .ok_or(ServiceError::NotFound("User not found"))
    }

    /// Remove the caller's profile and account. Posts they authored are kept.
    #[instrument(name = "accounts.delete", skip(self), fields(user_id = %identity.id))]
    pub async fn delete_account(&self, identity: &Identity) -> Result<(), ServiceError> {
        // TODO: cascade to the user's posts once orphaned posts have a display policy
        let profiles = self
            .profiles
            .remove_where(&FilterData::eq("user", identity.id.to_string()))
            .await?;
        let removed = self.users.remove(identity.id).await?;

        info!(profiles_removed = profiles, user_removed = removed, "Deleted account");
        Ok(())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ServiceError> {
        Ok(self
            .users
            .find_one(&FilterData::eq("email", email))
            .await?
            .map(|found| found.doc))
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Gravatar URL for an email: 200px, PG rated, mystery-person fallback.
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(normalize_email(email).as_bytes());
    format!("https://www.gravatar.com/avatar/{:x}?s=200&r=pg&d=mm", digest)
}

async fn hash_off_thread(password: String) -> Result<String, ServiceError> {
    let hashed = tokio::task::spawn_blocking(move || password::hash_password(&password))
        .await
        .map_err(|e| PasswordError::Hash(e.to_string()))??;
    Ok(hashed)
}

async fn verify_off_thread(password: String, stored_hash: String) -> Result<bool, ServiceError> {
    let matched = tokio::task::spawn_blocking(move || password::verify_password(&password, &stored_hash))
        .await
        .map_err(|e| PasswordError::Hash(e.to_string()))??;
    Ok(matched)
}
