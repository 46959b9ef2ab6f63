//! # Tenant Client
//!
//! The two tenant API calls the engine needs:
//!
//! | Call | Request | Purpose |
//! |------|---------|---------|
//! | [`TenantClient::latest_agent_version`] | `GET <apiUrl>/v1/deployment/installer/agent/unix/default/latest/metainfo` | reachability |
//! | [`TenantClient::token_scopes`] | `POST <apiUrl>/v1/tokens/lookup` | scope discovery |
//!
//! Both authenticate with `Authorization: Api-Token <token>`. A successful
//! version call proves DNS, TLS, the proxy path and the token's minimal
//! scopes in one round-trip.

use crate::constants::{LATEST_AGENT_VERSION_PATH, TOKEN_AUTH_FAILED_MARKER, TOKEN_LOOKUP_PATH};
use crate::error::{Error, Result};
use crate::transport::{HttpRequest, HttpResponse, HttpTransport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use url::Url;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatestAgentVersion {
    #[serde(default)]
    latest_agent_version: String,
}

#[derive(Debug, Serialize)]
struct TokenLookupRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenLookupResponse {
    #[serde(default)]
    scopes: Vec<String>,
}

/// Client for a single tenant.
#[derive(Clone)]
pub struct TenantClient {
    api_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl TenantClient {
    /// Creates a client for `api_url` (ending in `/api`).
    pub fn new(api_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            transport,
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let raw = format!("{}{}", self.api_url, path);
        Url::parse(&raw).map_err(|e| Error::InvalidApiUrl {
            url: self.api_url.clone(),
            reason: e.to_string(),
        })
    }

    async fn exchange(&self, request: HttpRequest, token: &str) -> Result<HttpResponse> {
        let url = request.url.to_string();
        let request = request.header("Authorization", format!("Api-Token {}", token));
        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| Error::TenantUnreachable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        if response.is_success() {
            return Ok(response);
        }
        let body = response.text();
        if response.is_unauthorized() || body.contains(TOKEN_AUTH_FAILED_MARKER) {
            return Err(Error::TenantUnauthorized {
                url,
                reason: format!("status {}: {}", response.status, body.trim()),
            });
        }
        Err(Error::UnexpectedHttp {
            url,
            reason: format!("status {}: {}", response.status, body.trim()),
        })
    }

    /// Latest unix agent version known to the tenant.
    ///
    /// # Errors
    ///
    /// - [`Error::TenantUnreachable`] on transport failure
    /// - [`Error::TenantUnauthorized`] when the token is rejected
    /// - [`Error::UnexpectedHttp`] on other statuses, bad JSON or an empty version
    pub async fn latest_agent_version(&self, token: &str) -> Result<String> {
        let url = self.endpoint(LATEST_AGENT_VERSION_PATH)?;
        let response = self.exchange(HttpRequest::get(url.clone()), token).await?;
        let parsed: LatestAgentVersion =
            serde_json::from_slice(&response.body).map_err(|e| Error::UnexpectedHttp {
                url: url.to_string(),
                reason: format!("invalid JSON: {}", e),
            })?;
        if parsed.latest_agent_version.trim().is_empty() {
            return Err(Error::UnexpectedHttp {
                url: url.to_string(),
                reason: "empty agent version".to_string(),
            });
        }
        Ok(parsed.latest_agent_version)
    }

    /// Scopes granted to `token`, looked up with `auth_token`.
    ///
    /// # Errors
    ///
    /// Same as [`TenantClient::latest_agent_version`].
    pub async fn token_scopes(&self, auth_token: &str, token: &str) -> Result<BTreeSet<String>> {
        let url = self.endpoint(TOKEN_LOOKUP_PATH)?;
        let request = HttpRequest::post_json(url.clone(), &TokenLookupRequest { token })?;
        let response = self.exchange(request, auth_token).await?;
        let parsed: TokenLookupResponse =
            serde_json::from_slice(&response.body).map_err(|e| Error::UnexpectedHttp {
                url: url.to_string(),
                reason: format!("invalid JSON: {}", e),
            })?;
        Ok(parsed.scopes.into_iter().collect())
    }
}
