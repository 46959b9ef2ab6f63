//! Transport assembly.

use crate::check::CheckAction;
use crate::context::RunContext;
use crate::error::Result;
use crate::log;
use crate::transport::redact;
use async_trait::async_trait;

/// Builds the registry transport from the DynaKube's proxy and TLS settings
/// and stores it in the context. Read-only afterwards.
pub struct TransportAssembled;

#[async_trait]
impl CheckAction for TransportAssembled {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let settings = ctx.resolve_transport_settings().await?;

        match &settings.proxy {
            Some(proxy) => log::detail(format!("proxy {}", redact(proxy))),
            None => log::detail("direct connection"),
        }
        if let Some(trusted) = &settings.trusted_certs {
            log::detail(format!("trusting CAs from config map '{}'", trusted.config_map));
        }
        if settings.skip_cert_check {
            log::warning("certificate validation disabled (skipCertCheck)");
        }

        let transport = ctx.build_transport(&settings)?;
        ctx.transport = Some(transport);
        Ok(())
    }
}
