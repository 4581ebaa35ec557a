//! Tag purges over a CDN's HTTP API.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::error::CacheError;
use crate::traits::EdgePurger;

#[derive(Debug, Serialize)]
struct PurgeRequest<'a> {
    tags: &'a [String],
}

/// Purger that POSTs tag lists to a CDN purge endpoint.
///
/// The request body is `{"tags": [...]}`; authentication, when configured,
/// is a bearer token. Matches the purge-by-tag APIs of the common CDNs
/// fronting this layer.
pub struct HttpPurger {
    client: reqwest::Client,
    endpoint: String,
    auth_token: Option<String>,
}

impl HttpPurger {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            auth_token: None,
        }
    }

    /// Attach a bearer token to every purge request.
    #[must_use]
    pub fn with_auth(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Use a preconfigured client (custom timeouts, proxies).
    #[must_use]
    pub fn with_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }
}

#[async_trait]
impl EdgePurger for HttpPurger {
    async fn purge(&self, tags: &[String]) -> Result<(), CacheError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&PurgeRequest { tags });
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|err| CacheError::purge(tags.len(), err))?;
        response
            .error_for_status()
            .map_err(|err| CacheError::purge(tags.len(), err))?;

        debug!(tag_count = tags.len(), "edge purge request accepted");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
