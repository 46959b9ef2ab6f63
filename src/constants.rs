//! # Troubleshoot Constants
//!
//! Defaults, recognized object keys, API paths and token scopes. These are
//! the single source of truth for names shared between the check library,
//! the probes and the tests.
//!
//! ## Cross-References
//!
//! - [`crate::checks`]: uses the secret keys and scope names
//! - [`crate::tenant`]: uses the tenant API paths
//! - [`crate::registry`]: uses the registry API paths
//! - [`crate::config`]: uses the CLI defaults and name limits

use std::time::Duration;

// =============================================================================
// CLI Defaults
// =============================================================================

/// Namespace inspected when `--namespace` is not given.
pub const DEFAULT_NAMESPACE: &str = "dynatrace";

/// DynaKube inspected when `--dynakube` is not given.
pub const DEFAULT_DYNAKUBE: &str = "dynakube";

/// Overall deadline for one troubleshoot run.
///
/// Every cluster read and HTTP call inherits this deadline; no check sets
/// its own timeout.
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(120);

/// Longest accepted run deadline.
pub const MAX_RUN_TIMEOUT: Duration = Duration::from_secs(3600);

/// Maximum namespace length (DNS-1123 label).
pub const MAX_NAMESPACE_LEN: usize = 63;

/// Maximum object name length (DNS-1123 subdomain).
pub const MAX_OBJECT_NAME_LEN: usize = 253;

// =============================================================================
// DynaKube Custom Resource
// =============================================================================

/// Kind of the workload custom resource.
pub const DYNAKUBE_KIND: &str = "DynaKube";

/// API group of the workload custom resource.
pub const DYNAKUBE_GROUP: &str = "dynatrace.com";

/// API version of the workload custom resource.
pub const DYNAKUBE_VERSION: &str = "v1beta1";

/// Plural resource name of the workload custom resource.
pub const DYNAKUBE_PLURAL: &str = "dynakubes";

/// Suffix appended to the DynaKube name when no custom pull secret is set.
pub const PULL_SECRET_SUFFIX: &str = "-pull-secret";

/// Required suffix of `spec.apiUrl`.
pub const API_URL_SUFFIX: &str = "/api";

// =============================================================================
// Secret and Config Map Keys
// =============================================================================

/// API token key in the tokens secret.
pub const API_TOKEN_KEY: &str = "apiToken";

/// PaaS token key in the tokens secret.
pub const PAAS_TOKEN_KEY: &str = "paasToken";

/// Data ingest token key in the tokens secret.
pub const DATA_INGEST_TOKEN_KEY: &str = "dataIngestToken";

/// Docker config key in the pull secret.
pub const DOCKER_CONFIG_JSON_KEY: &str = ".dockerconfigjson";

/// Proxy URL key in the proxy secret.
pub const PROXY_KEY: &str = "proxy";

/// PEM bundle key in the trusted CAs config map.
pub const TRUSTED_CERTS_KEY: &str = "certs";

// =============================================================================
// Tenant API
// =============================================================================

/// Path (relative to `apiUrl`) returning the latest unix agent version.
pub const LATEST_AGENT_VERSION_PATH: &str = "/v1/deployment/installer/agent/unix/default/latest/metainfo";

/// Path (relative to `apiUrl`) returning the scopes of a token.
pub const TOKEN_LOOKUP_PATH: &str = "/v1/tokens/lookup";

/// Marker in tenant error bodies for rejected tokens.
pub const TOKEN_AUTH_FAILED_MARKER: &str = "Token Authentication failed";

// =============================================================================
// Token Scopes
// =============================================================================

/// Scope needed to download OneAgent installers and images.
pub const SCOPE_INSTALLER_DOWNLOAD: &str = "InstallerDownload";

/// Scope needed for the operator's API reads.
pub const SCOPE_DATA_EXPORT: &str = "DataExport";

/// Scope needed to ingest metrics.
pub const SCOPE_METRICS_INGEST: &str = "metrics.ingest";

/// Scope needed by kubernetes monitoring to read entities.
pub const SCOPE_ENTITIES_READ: &str = "entities.read";

/// Scope needed by kubernetes monitoring to read settings.
pub const SCOPE_SETTINGS_READ: &str = "settings.read";

/// Scope needed by kubernetes monitoring to write settings.
pub const SCOPE_SETTINGS_WRITE: &str = "settings.write";

// =============================================================================
// Gateway Capabilities
// =============================================================================

/// Capability that routes agent traffic through the gateway.
pub const CAPABILITY_ROUTING: &str = "routing";

/// Capability that monitors the kubernetes API.
pub const CAPABILITY_KUBERNETES_MONITORING: &str = "kubernetes-monitoring";

/// Capability that accepts metrics from the cluster.
pub const CAPABILITY_METRICS_INGEST: &str = "metrics-ingest";

// =============================================================================
// Registry
// =============================================================================

/// Maximum image reference length in bytes.
///
/// Registry implementations may have lower limits; anything longer is
/// rejected before a request is built from it.
pub const MAX_IMAGE_REF_LEN: usize = 512;

/// Tag assumed when an image reference has none.
pub const DEFAULT_IMAGE_TAG: &str = "latest";

/// Fixed interior segment of vendor image paths.
pub const VENDOR_IMAGE_SEGMENT: &str = "linux";

/// Vendor repository of the fullstack agent image.
pub const FULLSTACK_COMPONENT: &str = "oneagent";

/// Vendor repository of the gateway image.
pub const GATEWAY_COMPONENT: &str = "activegate";

/// Scheme used for registry probes.
pub const REGISTRY_SCHEME: &str = "https";

/// Registry API base checked before any manifest.
pub const REGISTRY_API_BASE: &str = "/v2/";

/// Accept header sent on manifest HEAD requests.
pub const MANIFEST_ACCEPT: &str = "application/vnd.docker.distribution.manifest.v2+json, \
application/vnd.docker.distribution.manifest.list.v2+json, \
application/vnd.oci.image.manifest.v1+json, \
application/vnd.oci.image.index.v1+json";

// =============================================================================
// Environment
// =============================================================================

/// Environment variables observed (never applied) for proxy warnings.
pub const PROXY_ENV_VARS: [&str; 6] = [
    "HTTP_PROXY",
    "http_proxy",
    "HTTPS_PROXY",
    "https_proxy",
    "NO_PROXY",
    "no_proxy",
];
