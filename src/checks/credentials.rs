//! Tokens secret, token scopes and tenant reachability.
//!
//! | Token | Required when | Scopes |
//! |-------|---------------|--------|
//! | `apiToken` | always | `DataExport`; `InstallerDownload` without a PaaS token and with a OneAgent; `entities.read`, `settings.read`, `settings.write` with kubernetes monitoring |
//! | `paasToken` | optional | `InstallerDownload` |
//! | `dataIngestToken` | metrics ingest enabled | `metrics.ingest` |
//!
//! Scope lookups for every token authenticate with the API token.

use crate::check::CheckAction;
use crate::cluster::{ObjectData, ObjectKind};
use crate::constants::{
    API_TOKEN_KEY, DATA_INGEST_TOKEN_KEY, PAAS_TOKEN_KEY, SCOPE_DATA_EXPORT,
    SCOPE_ENTITIES_READ, SCOPE_INSTALLER_DOWNLOAD, SCOPE_METRICS_INGEST, SCOPE_SETTINGS_READ,
    SCOPE_SETTINGS_WRITE,
};
use crate::context::RunContext;
use crate::dynakube::DynaKube;
use crate::error::{Error, Result};
use crate::log;
use async_trait::async_trait;

/// A token to validate and the scopes it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRequirement {
    /// Secret key holding the token.
    pub key: &'static str,
    /// Scopes the token must carry.
    pub scopes: Vec<&'static str>,
}

/// Scopes each configured token needs for the DynaKube's features.
///
/// `has_paas_token` moves `InstallerDownload` from the API token to the PaaS
/// token.
pub fn required_scopes(
    dynakube: &DynaKube,
    has_paas_token: bool,
    has_data_ingest_token: bool,
) -> Vec<TokenRequirement> {
    let mut api_scopes = vec![SCOPE_DATA_EXPORT];
    if dynakube.has_one_agent() && !has_paas_token {
        api_scopes.push(SCOPE_INSTALLER_DOWNLOAD);
    }
    if dynakube.kubernetes_monitoring_enabled() {
        api_scopes.extend([SCOPE_ENTITIES_READ, SCOPE_SETTINGS_READ, SCOPE_SETTINGS_WRITE]);
    }

    let mut requirements = vec![TokenRequirement {
        key: API_TOKEN_KEY,
        scopes: api_scopes,
    }];
    if has_paas_token {
        requirements.push(TokenRequirement {
            key: PAAS_TOKEN_KEY,
            scopes: vec![SCOPE_INSTALLER_DOWNLOAD],
        });
    }
    if has_data_ingest_token && dynakube.metrics_ingest_enabled() {
        requirements.push(TokenRequirement {
            key: DATA_INGEST_TOKEN_KEY,
            scopes: vec![SCOPE_METRICS_INGEST],
        });
    }
    requirements
}

/// Raw token value; `None` if the key is absent.
fn token<'a>(secret: &'a ObjectData, key: &str) -> Option<&'a str> {
    secret.get_str(key)
}

/// Token value with surrounding whitespace rejected.
fn clean_token<'a>(secret: &'a ObjectData, key: &str) -> Result<&'a str> {
    let value = token(secret, key).ok_or_else(|| Error::MissingSecretField {
        secret: secret.name.clone(),
        field: key.to_string(),
    })?;
    if value.trim() != value {
        return Err(Error::TokenMalformed {
            secret: secret.name.clone(),
            token: key.to_string(),
        });
    }
    Ok(value)
}

fn require_non_empty(secret: &ObjectData, key: &str) -> Result<()> {
    match token(secret, key) {
        Some(value) if !value.trim().is_empty() => Ok(()),
        _ => Err(Error::MissingSecretField {
            secret: secret.name.clone(),
            field: key.to_string(),
        }),
    }
}

/// The tokens secret exists. Populates it.
pub struct CredentialsSecretExists;

#[async_trait]
impl CheckAction for CredentialsSecretExists {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let name = ctx.dynakube()?.tokens_secret_name();
        log::detail(format!("reading tokens from secret '{}'", name));
        let secret = ctx
            .get_data(ObjectKind::Secret, &name)
            .await?
            .ok_or_else(|| Error::CredentialsSecretMissing {
                namespace: ctx.namespace.clone(),
                name: name.clone(),
            })?;
        ctx.credentials = Some(secret);
        Ok(())
    }
}

/// `apiToken` is set; `paasToken` is non-empty if present; `dataIngestToken`
/// is set when metrics ingest is enabled.
pub struct CredentialsSecretHasApiToken;

#[async_trait]
impl CheckAction for CredentialsSecretHasApiToken {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let secret = ctx.credentials()?;
        require_non_empty(secret, API_TOKEN_KEY)?;

        if token(secret, PAAS_TOKEN_KEY).is_some() {
            require_non_empty(secret, PAAS_TOKEN_KEY)?;
        } else {
            log::detail("no PaaS token, the API token is used for downloads");
        }

        if ctx.dynakube()?.metrics_ingest_enabled() {
            require_non_empty(secret, DATA_INGEST_TOKEN_KEY)?;
        }
        Ok(())
    }
}

/// Every token carries the scopes its features need.
pub struct TokenScopesValid;

#[async_trait]
impl CheckAction for TokenScopesValid {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let secret = ctx.credentials()?.clone();
        let dynakube = ctx.dynakube()?.clone();
        let api_token = clean_token(&secret, API_TOKEN_KEY)?;

        let requirements = required_scopes(
            &dynakube,
            token(&secret, PAAS_TOKEN_KEY).is_some(),
            token(&secret, DATA_INGEST_TOKEN_KEY).is_some(),
        );
        for requirement in &requirements {
            clean_token(&secret, requirement.key)?;
        }

        let client = ctx.tenant_client().await?;
        for requirement in requirements {
            let value = clean_token(&secret, requirement.key)?;
            let granted = ctx.bounded(client.token_scopes(api_token, value)).await??;
            let missing: Vec<String> = requirement
                .scopes
                .iter()
                .filter(|scope| !granted.contains(**scope))
                .map(|scope| scope.to_string())
                .collect();
            if !missing.is_empty() {
                return Err(Error::TokenScopeMissing {
                    token: requirement.key.to_string(),
                    missing,
                });
            }
            log::detail(format!(
                "{} has {}",
                requirement.key,
                requirement.scopes.join(", ")
            ));
        }
        Ok(())
    }
}

/// The tenant answers the latest-agent-version call.
pub struct TenantReachable;

#[async_trait]
impl CheckAction for TenantReachable {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let secret = ctx.credentials()?.clone();
        let key = if token(&secret, PAAS_TOKEN_KEY).is_some() {
            PAAS_TOKEN_KEY
        } else {
            API_TOKEN_KEY
        };
        let value = clean_token(&secret, key)?;

        let client = ctx.tenant_client().await?;
        let version = ctx.bounded(client.latest_agent_version(value)).await??;
        log::detail(format!("tenant reachable, latest agent version {}", version));
        Ok(())
    }
}
