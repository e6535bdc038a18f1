use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::DocumentStore;
use crate::services::{AccountService, GithubClient, PostService, ProfileService, ServiceError};

/// Shared handler state. Cheap to clone; everything inside is reference counted.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub tokens: TokenService,
    pub store: Arc<dyn DocumentStore>,
    pub accounts: AccountService,
    pub profiles: ProfileService,
    pub posts: PostService,
    pub github: GithubClient,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn DocumentStore>) -> Result<Self, ServiceError> {
        let tokens = TokenService::new(&config.security.jwt_secret, config.security.token_ttl_secs)?;
        let retries = config.database.max_write_retries;

        Ok(Self {
            accounts: AccountService::new(store.clone(), tokens.clone()),
            profiles: ProfileService::new(store.clone(), retries),
            posts: PostService::new(store.clone(), retries),
            github: GithubClient::new(&config.github)?,
            tokens,
            store,
            config: Arc::new(config),
        })
    }
}
