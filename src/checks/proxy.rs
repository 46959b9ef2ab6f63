//! Proxy declaration check.

use crate::check::CheckAction;
use crate::cluster::ObjectKind;
use crate::constants::PROXY_KEY;
use crate::context::RunContext;
use crate::dynakube::ProxySource;
use crate::error::{Error, Result};
use crate::log;
use crate::transport::{parse_proxy_url, redact};
use async_trait::async_trait;

/// The declared proxy parses. For `proxy.valueFrom` the referenced secret
/// must exist with a non-empty `proxy` key; it is populated for the
/// transport.
///
/// Passes without reading anything when no proxy is declared.
pub struct ProxySecretWellFormed;

#[async_trait]
impl CheckAction for ProxySecretWellFormed {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let name = match ctx.dynakube()?.proxy_source() {
            None => {
                log::detail("no proxy configured");
                return Ok(());
            }
            Some(ProxySource::Inline(value)) => {
                let url = parse_proxy_url(&value)?;
                log::detail(format!("inline proxy {}", redact(&url)));
                return Ok(());
            }
            Some(ProxySource::SecretRef(name)) => name,
        };

        let secret = ctx
            .get_data(ObjectKind::Secret, &name)
            .await?
            .ok_or_else(|| Error::ProxySecretMissing {
                namespace: ctx.namespace.clone(),
                name: name.clone(),
            })?;
        let value = secret
            .get_str(PROXY_KEY)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::MissingSecretField {
                secret: name.clone(),
                field: PROXY_KEY.to_string(),
            })?;
        let url = parse_proxy_url(value)?;
        log::detail(format!("proxy {} from secret '{}'", redact(&url), name));

        ctx.proxy_secret = Some(secret);
        Ok(())
    }
}
