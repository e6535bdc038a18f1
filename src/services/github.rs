use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use super::error::ServiceError;
use crate::config::GithubConfig;

/// Read-only client for a user's public repositories.
#[derive(Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubClient {
    pub fn new(config: &GithubConfig) -> Result<Self, ServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        if let Some(token) = &config.token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ServiceError::Upstream(format!("invalid GitHub token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        Ok(Self {
            http,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// The user's five oldest-created repositories, passed through unchanged.
    #[instrument(name = "github.repos", skip(self))]
    pub async fn repos(&self, username: &str) -> Result<Value, ServiceError> {
        let url = self.repos_url(username)?;
        debug!(%url, "Fetching GitHub repositories");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;

        if response.status() != StatusCode::OK {
            return Err(ServiceError::Upstream(format!("GitHub responded {}", response.status())));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| ServiceError::Upstream(e.to_string()))
    }

    pub fn repos_url(&self, username: &str) -> Result<Url, ServiceError> {
        if !is_valid_username(username) {
            return Err(ServiceError::Upstream(format!("invalid username {:?}", username)));
        }

        let mut url = Url::parse(&format!("{}/users/{}/repos", self.api_base, username))
            .map_err(|e| ServiceError::Upstream(e.to_string()))?;
        url.query_pairs_mut()
            .append_pair("per_page", "5")
            .append_pair("sort", "created:asc");
        Ok(url)
    }
}

/// GitHub logins: 1-39 alphanumerics or single hyphens, not at either end.
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= 39
        && !username.starts_with('-')
        && !username.ends_with('-')
        && !username.contains("--")
        && username.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn client() -> GithubClient {
        GithubClient::new(&AppConfig::development().github).unwrap()
    }

    #[test]
    fn test_repos_url() {
        let url = client().repos_url("octocat").unwrap();
        assert_eq!(url.path(), "/users/octocat/repos");
        let query: Vec<_> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(
            query,
            vec![
                ("per_page".to_string(), "5".to_string()),
                ("sort".to_string(), "created:asc".to_string())
            ]
        );
    }

    #[test]
    fn test_rejects_path_injection() {
        for bad in ["", "../orgs", "a/b", "-lead", "trail-", "a--b", "name?x=1"] {
            assert!(client().repos_url(bad).is_err(), "accepted {:?}", bad);
        }
        assert!(client().repos_url("rust-lang").is_ok());
    }
}
