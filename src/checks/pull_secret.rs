//! Pull secret checks.

use crate::check::CheckAction;
use crate::cluster::ObjectKind;
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::keychain::Keychain;
use crate::log;
use async_trait::async_trait;

/// The effective pull secret exists. Populates it.
pub struct PullSecretExists;

#[async_trait]
impl CheckAction for PullSecretExists {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let name = ctx.dynakube()?.pull_secret_name();
        log::detail(format!("using pull secret '{}'", name));
        let secret = ctx
            .get_data(ObjectKind::Secret, &name)
            .await?
            .ok_or_else(|| Error::PullSecretMissing {
                namespace: ctx.namespace.clone(),
                name: name.clone(),
            })?;
        ctx.pull_secret = Some(secret);
        Ok(())
    }
}

/// The pull secret holds a docker config. Populates the keychain.
pub struct PullSecretWellFormed;

#[async_trait]
impl CheckAction for PullSecretWellFormed {
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        let keychain = Keychain::from_secret(ctx.pull_secret()?)?;
        let registries: Vec<&str> = keychain.registries().collect();
        if registries.is_empty() {
            log::warning("pull secret has no registry entries, probes go out anonymously");
        } else {
            log::detail(format!("credentials for {}", registries.join(", ")));
        }
        ctx.keychain = Some(keychain);
        Ok(())
    }
}
