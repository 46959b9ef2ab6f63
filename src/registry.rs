//! # Registry Probe
//!
//! Verifies that an image is pullable without pulling it:
//!
//! 1. Resolve credentials for the registry from the [`Keychain`].
//! 2. `HEAD https://<registry>/v2/`: must be 2xx.
//! 3. `HEAD https://<registry>/v2/<repository>/manifests/<tag>`: must be 2xx.
//!
//! Credentials go out on the first request; there is no 401 challenge
//! round-trip. A 401/403 on either request is reported as
//! [`Error::RegistryUnauthorized`] so the user checks the pull secret rather
//! than the network.
//!
//! `HEAD` is used throughout so no manifest or layer content is transferred.

use crate::constants::{MANIFEST_ACCEPT, REGISTRY_API_BASE, REGISTRY_SCHEME};
use crate::error::{Error, Result};
use crate::image::ImageReference;
use crate::keychain::{Keychain, basic_authorization};
use crate::transport::{HttpRequest, HttpTransport};
use std::sync::Arc;
use tracing::debug;
use url::Url;

/// Probes registries through a shared transport.
#[derive(Clone)]
pub struct RegistryProbe {
    transport: Arc<dyn HttpTransport>,
    keychain: Keychain,
}

impl RegistryProbe {
    /// Creates a probe.
    pub fn new(transport: Arc<dyn HttpTransport>, keychain: Keychain) -> Self {
        Self {
            transport,
            keychain,
        }
    }

    fn url(&self, reference: &ImageReference, path: &str) -> Result<Url> {
        let raw = format!("{}://{}{}", REGISTRY_SCHEME, reference.registry, path);
        Url::parse(&raw).map_err(|e| Error::InvalidImage {
            image: reference.to_string(),
            reason: format!("cannot build registry URL '{}': {}", raw, e),
        })
    }

    /// URL of the registry API base for a reference.
    pub fn base_url(&self, reference: &ImageReference) -> Result<Url> {
        self.url(reference, REGISTRY_API_BASE)
    }

    /// URL of the manifest endpoint for a reference.
    pub fn manifest_url(&self, reference: &ImageReference) -> Result<Url> {
        self.url(reference, &reference.manifest_path())
    }

    /// Returns `Ok(())` if the image exists and the credentials may pull it.
    ///
    /// # Errors
    ///
    /// - [`Error::RegistryUnreachable`]: transport failure or non-2xx on `/v2/`
    /// - [`Error::RegistryUnauthorized`]: 401/403 on either request
    /// - [`Error::ImageNotFound`]: non-2xx on the manifest
    pub async fn probe(&self, reference: &ImageReference) -> Result<()> {
        let authorization = basic_authorization(&self.keychain.resolve(&reference.registry));
        if authorization.is_none() {
            debug!("no credentials for {}, probing anonymously", reference.registry);
        }

        let mut base = HttpRequest::head(self.base_url(reference)?);
        if let Some(value) = &authorization {
            base = base.header("Authorization", value.clone());
        }
        let response = self
            .transport
            .send(base)
            .await
            .map_err(|e| Error::RegistryUnreachable {
                registry: reference.registry.clone(),
                reason: e.to_string(),
            })?;
        if response.is_unauthorized() {
            return Err(Error::RegistryUnauthorized {
                registry: reference.registry.clone(),
                status: response.status,
            });
        }
        if !response.is_success() {
            return Err(Error::RegistryUnreachable {
                registry: reference.registry.clone(),
                reason: format!("status {}", response.status),
            });
        }

        let mut manifest =
            HttpRequest::head(self.manifest_url(reference)?).header("Accept", MANIFEST_ACCEPT);
        if let Some(value) = authorization {
            manifest = manifest.header("Authorization", value);
        }
        let response = self
            .transport
            .send(manifest)
            .await
            .map_err(|e| Error::RegistryUnreachable {
                registry: reference.registry.clone(),
                reason: e.to_string(),
            })?;
        if response.is_unauthorized() {
            return Err(Error::RegistryUnauthorized {
                registry: reference.registry.clone(),
                status: response.status,
            });
        }
        if !response.is_success() {
            return Err(Error::ImageNotFound {
                image: reference.to_string(),
                status: response.status,
            });
        }
        Ok(())
    }
}
