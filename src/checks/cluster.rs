//! Cluster object checks: namespace, CRD, DynaKube instance and its API URL.

use crate::check::CheckAction;
use crate::cluster::{ObjectKind, ReadError};
use crate::constants::{API_URL_SUFFIX, DYNAKUBE_KIND};
use crate::context::RunContext;
use crate::dynakube::DynaKube;
use crate::error::{Error, Result};
use crate::log;
use async_trait::async_trait;
use url::Url;

/// The target namespace exists. Read failures other than absence are
/// cardinal.
pub struct NamespaceExists;

#[async_trait]
impl CheckAction for NamespaceExists {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        log::detail(format!("looking up namespace '{}'", ctx.namespace));
        match ctx.get_object(ObjectKind::Namespace, &ctx.namespace).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(Error::NamespaceMissing {
                namespace: ctx.namespace.clone(),
            }),
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => Err(err.cardinal()),
        }
    }
}

/// The DynaKube kind is served by the API server.
pub struct CrdRegistered;

#[async_trait]
impl CheckAction for CrdRegistered {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let listed = ctx
            .bounded(ctx.cluster().list(ObjectKind::DynaKube, &ctx.namespace))
            .await?;
        match listed {
            Ok(objects) => {
                log::detail(format!(
                    "{} {} object(s) in namespace '{}'",
                    objects.len(),
                    DYNAKUBE_KIND,
                    ctx.namespace
                ));
                Ok(())
            }
            Err(ReadError::KindNotRegistered) => Err(Error::CrdMissing {
                kind: DYNAKUBE_KIND.to_string(),
            }
            .cardinal()),
            Err(err) => Err(Error::CrdUnqueryable {
                kind: DYNAKUBE_KIND.to_string(),
                reason: err.to_string(),
            }),
        }
    }
}

/// The selected DynaKube exists and reads as a DynaKube. Populates the
/// snapshot.
pub struct CustomResourceExists;

#[async_trait]
impl CheckAction for CustomResourceExists {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let name = ctx.dynakube_name.clone();
        let document = ctx
            .get_object(ObjectKind::DynaKube, &name)
            .await?
            .and_then(|object| object.into_custom())
            .ok_or_else(|| Error::CrNotFound {
                namespace: ctx.namespace.clone(),
                name: name.clone(),
            })?;

        let dynakube = DynaKube::from_document(&name, &document)?;
        dynakube.validate()?;
        log::detail(format!("using DynaKube '{}/{}'", ctx.namespace, dynakube.name));
        ctx.dynakube = Some(dynakube);
        Ok(())
    }
}

/// `apiUrl` is an absolute http(s) URL ending in `/api`.
pub struct ApiUrlWellFormed;

#[async_trait]
impl CheckAction for ApiUrlWellFormed {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let api_url = ctx.dynakube()?.api_url();
        validate_api_url(api_url)?;
        log::detail(format!("API URL '{}'", api_url));
        Ok(())
    }
}

/// Validates a tenant API URL.
///
/// # Errors
///
/// Returns [`Error::InvalidApiUrl`] with the first violated rule.
pub fn validate_api_url(api_url: &str) -> Result<()> {
    let invalid = |reason: &str| Error::InvalidApiUrl {
        url: api_url.to_string(),
        reason: reason.to_string(),
    };
    if api_url.trim().is_empty() {
        return Err(invalid("empty"));
    }
    let url = Url::parse(api_url).map_err(|e| invalid(&e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    if !api_url.ends_with(API_URL_SUFFIX) {
        return Err(invalid("must end with /api"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_rules() {
        assert!(validate_api_url("https://tenant.example.com/api").is_ok());
        assert!(validate_api_url("https://tenant.example.com:8443/e/abc/api").is_ok());
        assert!(validate_api_url("https://tenant.example.com/").is_err());
        assert!(validate_api_url("https://tenant.example.com/api/").is_err());
        assert!(validate_api_url("ftp://tenant.example.com/api").is_err());
        assert!(validate_api_url("tenant.example.com/api").is_err());
        assert!(validate_api_url("").is_err());
    }

    #[test]
    fn api_url_error_kind() {
        let err = validate_api_url("https://tenant.example.com/").unwrap_err();
        assert_eq!(err.kind(), "InvalidApiUrl");
    }
}
