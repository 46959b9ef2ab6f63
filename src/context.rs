//! # Run Context
//!
//! Per-run state shared by the checks. Created once per invocation and
//! passed by `&mut` through the sequential pipeline; later checks read what
//! earlier ones resolved, and `Check::prerequisites` guarantees the order.
//!
//! ## Resolved State
//!
//! | Field | Populated by |
//! |-------|--------------|
//! | `dynakube` | `customResourceExists` |
//! | `credentials` | `credentialsSecretExists` |
//! | `pull_secret`, `keychain` | `pullSecretExists`, `pullSecretWellFormed` |
//! | `proxy_secret` | `proxySecretWellFormed` |
//! | `transport` | `transportAssembled` |
//!
//! ## Cancellation
//!
//! The context owns one deadline and one cancellation token. Every cluster
//! read and HTTP call is wrapped in [`RunContext::bounded`] and aborts with
//! [`Error::Cancelled`] when either fires.

use crate::cluster::{ClusterObject, ClusterReader, ObjectData, ObjectKind, ReadError};
use crate::config::TroubleshootConfig;
use crate::constants::{MAX_RUN_TIMEOUT, PROXY_KEY, TRUSTED_CERTS_KEY};
use crate::dynakube::{DynaKube, ProxySource};
use crate::error::{Error, Result};
use crate::keychain::Keychain;
use crate::tenant::TenantClient;
use crate::transport::{
    HttpTransport, TransportFactory, TransportSettings, TrustedCerts, parse_proxy_url,
};
use std::future::Future;
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Mutable state of one troubleshoot run.
pub struct RunContext {
    /// Namespace under inspection.
    pub namespace: String,
    /// Name of the DynaKube under inspection.
    pub dynakube_name: String,

    cluster: Arc<dyn ClusterReader>,
    transport_factory: Arc<dyn TransportFactory>,
    cancel: CancellationToken,
    deadline: Instant,

    /// DynaKube snapshot.
    pub dynakube: Option<DynaKube>,
    /// Tokens secret.
    pub credentials: Option<ObjectData>,
    /// Pull secret.
    pub pull_secret: Option<ObjectData>,
    /// Secret referenced by `proxy.valueFrom`.
    pub proxy_secret: Option<ObjectData>,
    /// Registry credentials derived from the pull secret.
    pub keychain: Option<Keychain>,
    /// Transport settings resolved from the DynaKube.
    pub transport_settings: Option<TransportSettings>,
    /// Transport for registry probes; read-only once assembled.
    pub transport: Option<Arc<dyn HttpTransport>>,

    tenant: Option<TenantClient>,
}

impl RunContext {
    /// Creates a context whose deadline starts now. A timeout too large to
    /// add to the clock is capped at [`MAX_RUN_TIMEOUT`].
    pub fn new(
        config: &TroubleshootConfig,
        cluster: Arc<dyn ClusterReader>,
        transport_factory: Arc<dyn TransportFactory>,
    ) -> Self {
        let now = Instant::now();
        let deadline = now
            .checked_add(config.timeout)
            .unwrap_or_else(|| now + MAX_RUN_TIMEOUT);
        Self {
            namespace: config.namespace.clone(),
            dynakube_name: config.dynakube.clone(),
            cluster,
            transport_factory,
            cancel: CancellationToken::new(),
            deadline,
            dynakube: None,
            credentials: None,
            pull_secret: None,
            proxy_secret: None,
            keychain: None,
            transport_settings: None,
            transport: None,
            tenant: None,
        }
    }

    /// Uses an externally owned cancellation token.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels this run.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The cluster read view.
    pub fn cluster(&self) -> &dyn ClusterReader {
        self.cluster.as_ref()
    }

    /// Runs `fut` under the run's deadline and cancellation token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the token fires or the deadline passes
    /// first; `fut` is dropped, aborting any in-flight request.
    pub async fn bounded<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = T>,
    {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled("run cancelled".to_string()));
        }
        tokio::select! {
            _ = self.cancel.cancelled() => Err(Error::Cancelled("run cancelled".to_string())),
            result = tokio::time::timeout_at(self.deadline, fut) => {
                result.map_err(|_| Error::Cancelled("run deadline exceeded".to_string()))
            }
        }
    }

    /// Reads an object in the run's namespace. `Ok(None)` means NotFound.
    ///
    /// # Errors
    ///
    /// [`Error::ClusterRead`] for any other read failure, or
    /// [`Error::Cancelled`].
    pub async fn get_object(&self, kind: ObjectKind, name: &str) -> Result<Option<ClusterObject>> {
        match self.bounded(self.cluster.get(kind, &self.namespace, name)).await? {
            Ok(object) => Ok(Some(object)),
            Err(ReadError::NotFound) => Ok(None),
            Err(err) => Err(Error::ClusterRead {
                kind: kind.to_string(),
                namespace: self.namespace.clone(),
                name: name.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    /// Reads a secret or config map's data. `Ok(None)` means NotFound.
    pub async fn get_data(&self, kind: ObjectKind, name: &str) -> Result<Option<ObjectData>> {
        Ok(self
            .get_object(kind, name)
            .await?
            .and_then(ClusterObject::into_data))
    }

    /// The DynaKube snapshot.
    pub fn dynakube(&self) -> Result<&DynaKube> {
        self.dynakube
            .as_ref()
            .ok_or(Error::MissingContext("DynaKube snapshot"))
    }

    /// The tokens secret.
    pub fn credentials(&self) -> Result<&ObjectData> {
        self.credentials
            .as_ref()
            .ok_or(Error::MissingContext("credentials secret"))
    }

    /// The pull secret.
    pub fn pull_secret(&self) -> Result<&ObjectData> {
        self.pull_secret
            .as_ref()
            .ok_or(Error::MissingContext("pull secret"))
    }

    /// The registry keychain.
    pub fn keychain(&self) -> Result<&Keychain> {
        self.keychain
            .as_ref()
            .ok_or(Error::MissingContext("registry keychain"))
    }

    /// The assembled transport.
    pub fn transport(&self) -> Result<Arc<dyn HttpTransport>> {
        self.transport
            .clone()
            .ok_or(Error::MissingContext("HTTP transport"))
    }

    /// Builds a transport from settings through the configured factory.
    pub fn build_transport(&self, settings: &TransportSettings) -> Result<Arc<dyn HttpTransport>> {
        self.transport_factory.build(settings)
    }

    /// Resolves proxy and TLS settings from the DynaKube, reading the proxy
    /// secret and trusted CAs config map as needed. Cached after first use.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidProxyUrl`], [`Error::ProxySecretMissing`],
    ///   [`Error::MissingSecretField`] for proxy problems
    /// - [`Error::MissingTrustedCerts`] for a missing config map or `certs` key
    pub async fn resolve_transport_settings(&mut self) -> Result<TransportSettings> {
        if let Some(settings) = &self.transport_settings {
            return Ok(settings.clone());
        }
        let dk = self.dynakube()?.clone();

        let proxy = match dk.proxy_source() {
            None => None,
            Some(ProxySource::Inline(value)) => Some(parse_proxy_url(&value)?),
            Some(ProxySource::SecretRef(name)) => {
                let secret = match self.proxy_secret.clone() {
                    Some(secret) => secret,
                    None => self
                        .get_data(ObjectKind::Secret, &name)
                        .await?
                        .ok_or_else(|| Error::ProxySecretMissing {
                            namespace: self.namespace.clone(),
                            name: name.clone(),
                        })?,
                };
                let value = secret
                    .get_str(PROXY_KEY)
                    .map(str::trim)
                    .filter(|v| !v.is_empty())
                    .ok_or_else(|| Error::MissingSecretField {
                        secret: name.clone(),
                        field: PROXY_KEY.to_string(),
                    })?;
                Some(parse_proxy_url(value)?)
            }
        };

        let trusted_certs = match dk.trusted_cas_config_map() {
            None => None,
            Some(name) => {
                let missing = || Error::MissingTrustedCerts {
                    config_map: name.to_string(),
                };
                let config_map = self
                    .get_data(ObjectKind::ConfigMap, name)
                    .await?
                    .ok_or_else(missing)?;
                let pem = config_map
                    .get_str(TRUSTED_CERTS_KEY)
                    .filter(|v| !v.trim().is_empty())
                    .ok_or_else(missing)?;
                Some(TrustedCerts {
                    config_map: name.to_string(),
                    pem: pem.to_string(),
                })
            }
        };

        let settings = TransportSettings {
            proxy,
            trusted_certs,
            skip_cert_check: dk.skip_cert_check(),
        };
        self.transport_settings = Some(settings.clone());
        Ok(settings)
    }

    /// Tenant client using the DynaKube's proxy and TLS settings.
    pub async fn tenant_client(&mut self) -> Result<TenantClient> {
        if let Some(client) = &self.tenant {
            return Ok(client.clone());
        }
        let settings = self.resolve_transport_settings().await?;
        let transport = self.build_transport(&settings)?;
        let client = TenantClient::new(self.dynakube()?.api_url(), transport);
        self.tenant = Some(client.clone());
        Ok(client)
    }
}
