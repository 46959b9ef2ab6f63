//! # DynaKube View
//!
//! Read-only snapshot of the workload custom resource. Only the fields the
//! checks query are modeled; everything else in the document is ignored.
//!
//! ## Effective Names
//!
//! | Query | Rule |
//! |-------|------|
//! | [`DynaKube::tokens_secret_name`] | `spec.tokens`, else the DynaKube name |
//! | [`DynaKube::pull_secret_name`] | `spec.customPullSecret`, else `<name>-pull-secret` |
//! | [`DynaKube::proxy_source`] | `spec.proxy.value` or `spec.proxy.valueFrom`, at most one |

use crate::constants::{
    CAPABILITY_KUBERNETES_MONITORING, CAPABILITY_METRICS_INGEST, PULL_SECRET_SUFFIX,
};
use crate::error::{Error, Result};
use serde::Deserialize;

/// Where the proxy URL comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProxySource {
    /// Literal URL in the DynaKube.
    Inline(String),
    /// Name of a secret whose `proxy` key holds the URL.
    SecretRef(String),
}

/// OneAgent deployment mode with its image overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneAgentModeSpec {
    /// Custom fullstack image.
    #[serde(default)]
    pub image: Option<String>,
    /// Fullstack image version (tag).
    #[serde(default)]
    pub version: Option<String>,
    /// Custom code-modules image.
    #[serde(default)]
    pub code_modules_image: Option<String>,
}

/// `spec.oneAgent`: at most one mode is expected to be set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneAgentSpec {
    #[serde(default)]
    pub classic_full_stack: Option<OneAgentModeSpec>,
    #[serde(default)]
    pub cloud_native_full_stack: Option<OneAgentModeSpec>,
    #[serde(default)]
    pub host_monitoring: Option<OneAgentModeSpec>,
    #[serde(default)]
    pub application_monitoring: Option<OneAgentModeSpec>,
}

/// `spec.activeGate`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveGateSpec {
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// `spec.proxy`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProxySpec {
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub value_from: Option<String>,
}

/// `spec` of the DynaKube.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynaKubeSpec {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub tokens: Option<String>,
    #[serde(default)]
    pub custom_pull_secret: Option<String>,
    #[serde(default)]
    pub proxy: Option<ProxySpec>,
    #[serde(default, rename = "trustedCAs")]
    pub trusted_cas: Option<String>,
    #[serde(default)]
    pub skip_cert_check: bool,
    #[serde(default)]
    pub one_agent: OneAgentSpec,
    #[serde(default)]
    pub active_gate: Option<ActiveGateSpec>,
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Document {
    metadata: Metadata,
    #[serde(default)]
    spec: DynaKubeSpec,
}

/// A DynaKube snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynaKube {
    /// `metadata.name`.
    pub name: String,
    /// `spec`.
    pub spec: DynaKubeSpec,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl DynaKube {
    /// Creates a snapshot from parts.
    pub fn new(name: impl Into<String>, spec: DynaKubeSpec) -> Self {
        Self {
            name: name.into(),
            spec,
        }
    }

    /// Reads a snapshot from the full custom resource document.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedCustomResource`] if the document lacks
    /// `metadata.name` or `spec` has the wrong shape.
    pub fn from_document(name: &str, document: &serde_json::Value) -> Result<Self> {
        let doc: Document =
            serde_json::from_value(document.clone()).map_err(|e| Error::MalformedCustomResource {
                name: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self {
            name: doc.metadata.name,
            spec: doc.spec,
        })
    }

    /// Checks invariants that span fields.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConflictingProxySources`] when both proxy sources are set.
    pub fn validate(&self) -> Result<()> {
        if let Some(proxy) = &self.spec.proxy {
            if non_empty(&proxy.value).is_some() && non_empty(&proxy.value_from).is_some() {
                return Err(Error::ConflictingProxySources {
                    name: self.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// `spec.apiUrl`.
    pub fn api_url(&self) -> &str {
        &self.spec.api_url
    }

    /// Name of the secret holding the tenant tokens.
    pub fn tokens_secret_name(&self) -> String {
        non_empty(&self.spec.tokens)
            .map(str::to_string)
            .unwrap_or_else(|| self.name.clone())
    }

    /// Name of the pull secret used for image probes.
    pub fn pull_secret_name(&self) -> String {
        non_empty(&self.spec.custom_pull_secret)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}{}", self.name, PULL_SECRET_SUFFIX))
    }

    /// Declared proxy source, if any. Inline wins if both are set; call
    /// [`DynaKube::validate`] to reject that case.
    pub fn proxy_source(&self) -> Option<ProxySource> {
        let proxy = self.spec.proxy.as_ref()?;
        if let Some(value) = non_empty(&proxy.value) {
            return Some(ProxySource::Inline(value.to_string()));
        }
        non_empty(&proxy.value_from).map(|name| ProxySource::SecretRef(name.to_string()))
    }

    /// Name of the trusted CAs config map, if any.
    pub fn trusted_cas_config_map(&self) -> Option<&str> {
        non_empty(&self.spec.trusted_cas)
    }

    /// Whether TLS certificate validation is disabled.
    pub fn skip_cert_check(&self) -> bool {
        self.spec.skip_cert_check
    }

    /// The mode that deploys the fullstack (host) agent, if any.
    fn fullstack_mode(&self) -> Option<&OneAgentModeSpec> {
        let one_agent = &self.spec.one_agent;
        one_agent
            .classic_full_stack
            .as_ref()
            .or(one_agent.cloud_native_full_stack.as_ref())
            .or(one_agent.host_monitoring.as_ref())
    }

    /// The mode that injects code modules, if any.
    fn code_modules_mode(&self) -> Option<&OneAgentModeSpec> {
        let one_agent = &self.spec.one_agent;
        one_agent
            .cloud_native_full_stack
            .as_ref()
            .or(one_agent.application_monitoring.as_ref())
    }

    /// Whether any OneAgent mode is declared.
    pub fn has_one_agent(&self) -> bool {
        self.fullstack_mode().is_some() || self.code_modules_mode().is_some()
    }

    /// Whether a fullstack agent is declared.
    pub fn has_fullstack(&self) -> bool {
        self.fullstack_mode().is_some()
    }

    /// Custom fullstack image.
    pub fn fullstack_image(&self) -> Option<&str> {
        self.fullstack_mode().and_then(|m| non_empty(&m.image))
    }

    /// Fullstack image version.
    pub fn fullstack_version(&self) -> Option<&str> {
        self.fullstack_mode().and_then(|m| non_empty(&m.version))
    }

    /// Whether code-modules injection is declared.
    pub fn has_code_modules(&self) -> bool {
        self.code_modules_mode().is_some()
    }

    /// Custom code-modules image.
    pub fn code_modules_image(&self) -> Option<&str> {
        self.code_modules_mode()
            .and_then(|m| non_empty(&m.code_modules_image))
    }

    /// Whether the gateway is enabled (has at least one capability).
    pub fn has_gateway(&self) -> bool {
        self.spec
            .active_gate
            .as_ref()
            .is_some_and(|ag| !ag.capabilities.is_empty())
    }

    /// Custom gateway image.
    pub fn gateway_image(&self) -> Option<&str> {
        self.spec
            .active_gate
            .as_ref()
            .and_then(|ag| non_empty(&ag.image))
    }

    /// Whether the gateway has a capability.
    pub fn has_capability(&self, capability: &str) -> bool {
        self.spec
            .active_gate
            .as_ref()
            .is_some_and(|ag| ag.capabilities.iter().any(|c| c == capability))
    }

    /// Whether metrics ingest is enabled, which requires a data ingest token.
    pub fn metrics_ingest_enabled(&self) -> bool {
        self.has_capability(CAPABILITY_METRICS_INGEST)
    }

    /// Whether kubernetes monitoring is enabled.
    pub fn kubernetes_monitoring_enabled(&self) -> bool {
        self.has_capability(CAPABILITY_KUBERNETES_MONITORING)
    }
}
