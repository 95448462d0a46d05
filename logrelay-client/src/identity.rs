//! Identity provider (Auth0 Management API) client
//!
//! Obtains a management API token with the client-credentials grant and
//! pages through the tenant's logs starting from a checkpoint.

use chrono::{DateTime, Duration, Utc};
use logrelay_core::domain::checkpoint::Checkpoint;
use logrelay_core::domain::log::LogEntry;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::error::{ClientError, Result};
use crate::handle_response;

/// Refresh the token this long before it actually expires
const TOKEN_GRACE_SECONDS: i64 = 60;

/// Upper bound for any single management API request
const API_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

/// Connection settings for the identity provider
#[derive(Debug, Clone)]
pub struct IdentitySettings {
    /// Tenant domain (e.g. "tenant.eu.auth0.com")
    pub domain: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    grant_type: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    audience: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_expired(&self) -> bool {
        Utc::now() + Duration::seconds(TOKEN_GRACE_SECONDS) >= self.expires_at
    }
}

/// HTTP client for the identity provider's management API
#[derive(Debug)]
pub struct IdentityClient {
    /// Base URL of the tenant (e.g., "https://tenant.eu.auth0.com")
    base_url: String,
    /// Management API audience the token is requested for
    audience: String,
    settings: IdentitySettings,
    client: Client,
    token: RwLock<Option<CachedToken>>,
}

impl IdentityClient {
    /// Create a client for the tenant named in `settings.domain`
    pub fn new(settings: IdentitySettings) -> Self {
        let base_url = if settings.domain.starts_with("http://")
            || settings.domain.starts_with("https://")
        {
            settings.domain.clone()
        } else {
            format!("https://{}", settings.domain)
        };
        Self::with_base_url(settings, base_url)
    }

    /// Create a client that talks to an explicit base URL
    ///
    /// The token audience is still derived from the tenant domain.
    pub fn with_base_url(settings: IdentitySettings, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let domain = settings
            .domain
            .trim_start_matches("https://")
            .trim_start_matches("http://")
            .trim_end_matches('/');
        let audience = format!("https://{}/api/v2/", domain);

        Self {
            base_url,
            audience,
            settings,
            client: build_client(API_TIMEOUT),
            token: RwLock::new(None),
        }
    }

    /// Replace the per-request timeout
    pub fn with_timeout(mut self, timeout: std::time::Duration) -> Self {
        self.client = build_client(timeout);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// Get a valid management API token, requesting a new one if needed
    #[instrument(skip(self), fields(domain = %self.settings.domain))]
    pub async fn access_token(&self) -> Result<String> {
        {
            let cache = self.token.read().await;
            if let Some(token) = cache.as_ref().filter(|t| !t.is_expired()) {
                debug!("Using cached management API token");
                return Ok(token.access_token.clone());
            }
        }

        debug!("Requesting management API token");
        let token = self.request_token().await?;
        let access_token = token.access_token.clone();
        *self.token.write().await = Some(token);

        Ok(access_token)
    }

    async fn request_token(&self) -> Result<CachedToken> {
        let url = format!("{}/oauth/token", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&TokenRequest {
                grant_type: "client_credentials",
                client_id: &self.settings.client_id,
                client_secret: &self.settings.client_secret,
                audience: &self.audience,
            })
            .send()
            .await?;

        let token: TokenResponse = handle_response(response).await.map_err(|e| match e {
            ClientError::ApiError { status, message } => {
                ClientError::AuthFailed(format!("token endpoint returned {}: {}", status, message))
            }
            other => other,
        })?;

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: Utc::now() + Duration::seconds(token.expires_in),
        })
    }

    /// Fetch the next page of tenant logs
    ///
    /// With a checkpoint, returns up to `take` entries logged after it, oldest
    /// first. Without one, returns the oldest `take` entries still retained.
    ///
    /// # Arguments
    /// * `from` - Id of the last acknowledged entry
    /// * `take` - Page size (the API caps this at 100)
    pub async fn fetch_logs(&self, from: Option<&Checkpoint>, take: usize) -> Result<Vec<LogEntry>> {
        if take == 0 {
            return Err(ClientError::InvalidRequest(
                "page size must be greater than 0".to_string(),
            ));
        }

        let token = self.access_token().await?;
        let url = format!("{}/api/v2/logs", self.base_url);
        let take = take.to_string();

        let request = match from {
            Some(checkpoint) => self
                .client
                .get(&url)
                .query(&[("from", checkpoint.as_str()), ("take", take.as_str())]),
            None => self.client.get(&url).query(&[
                ("sort", "date:1"),
                ("per_page", take.as_str()),
                ("page", "0"),
            ]),
        };

        let response = request.bearer_auth(token).send().await?;
        let entries: Vec<LogEntry> = handle_response(response).await?;

        debug!(
            "Fetched {} log entries from {}",
            entries.len(),
            from.map(Checkpoint::as_str).unwrap_or("the beginning")
        );

        Ok(entries)
    }
}

fn build_client(timeout: std::time::Duration) -> Client {
    Client::builder()
        .timeout(timeout)
        .build()
        .unwrap_or_default()
}
