//! Error types for the troubleshoot engine.
//!
//! Every check returns the first [`Error`] it hits. The executor collects
//! failures into an [`AggregatedError`], preserving the order in which the
//! failing checks ran.

use std::fmt;

/// Result type alias for troubleshoot operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while diagnosing a DynaKube.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Shape Errors
    // =========================================================================
    /// The API URL is not a valid tenant URL.
    #[error("invalid API URL '{url}': {reason}")]
    InvalidApiUrl { url: String, reason: String },

    /// The declared proxy cannot be parsed.
    #[error("invalid proxy URL: {reason}")]
    InvalidProxyUrl { reason: String },

    /// An image reference does not match the expected syntax.
    #[error("invalid image '{image}': {reason}")]
    InvalidImage { image: String, reason: String },

    /// The pull secret's docker config is not valid JSON of the expected shape.
    #[error("pull secret '{secret}' is malformed: {reason}")]
    MalformedPullSecret { secret: String, reason: String },

    /// The trusted CA config map holds no usable PEM certificates.
    #[error("trusted CAs in config map '{config_map}' are invalid: {reason}")]
    InvalidTrustedCerts { config_map: String, reason: String },

    /// A token carries leading or trailing whitespace.
    #[error("token '{token}' in secret '{secret}' has leading or trailing whitespace")]
    TokenMalformed { secret: String, token: String },

    /// The DynaKube object cannot be read as a DynaKube.
    #[error("DynaKube '{name}' is malformed: {reason}")]
    MalformedCustomResource { name: String, reason: String },

    /// Both an inline proxy value and a proxy secret are declared.
    #[error("DynaKube '{name}' declares both proxy.value and proxy.valueFrom")]
    ConflictingProxySources { name: String },

    /// Command-line configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    // =========================================================================
    // Missing-Resource Errors
    // =========================================================================
    /// The target namespace does not exist.
    #[error("namespace '{namespace}' not found")]
    NamespaceMissing { namespace: String },

    /// The DynaKube CRD is not registered with the API server.
    #[error("custom resource definition for '{kind}' is not registered")]
    CrdMissing { kind: String },

    /// The DynaKube instance does not exist.
    #[error("DynaKube '{name}' not found in namespace '{namespace}'")]
    CrNotFound { namespace: String, name: String },

    /// The tokens secret does not exist.
    #[error("credentials secret '{name}' not found in namespace '{namespace}'")]
    CredentialsSecretMissing { namespace: String, name: String },

    /// The pull secret does not exist.
    #[error("pull secret '{name}' not found in namespace '{namespace}'")]
    PullSecretMissing { namespace: String, name: String },

    /// The secret referenced by `proxy.valueFrom` does not exist.
    #[error("proxy secret '{name}' not found in namespace '{namespace}'")]
    ProxySecretMissing { namespace: String, name: String },

    /// The pull secret lacks the docker config field.
    #[error("pull secret '{secret}' has no '{field}' field")]
    MissingPullSecretField { secret: String, field: String },

    /// A secret lacks a required field, or the field is empty.
    #[error("secret '{secret}' has no non-empty '{field}' field")]
    MissingSecretField { secret: String, field: String },

    /// The trusted CA config map or its `certs` field is missing.
    #[error("config map '{config_map}' has no trusted certificates")]
    MissingTrustedCerts { config_map: String },

    // =========================================================================
    // Semantic Errors
    // =========================================================================
    /// A token lacks scopes the declared features need.
    #[error("token '{token}' is missing scopes: {}", missing.join(", "))]
    TokenScopeMissing { token: String, missing: Vec<String> },

    // =========================================================================
    // Reachability Errors
    // =========================================================================
    /// The tenant cannot be reached over the network.
    #[error("tenant at '{url}' is unreachable: {reason}")]
    TenantUnreachable { url: String, reason: String },

    /// The tenant rejected the token.
    #[error("tenant at '{url}' rejected the token: {reason}")]
    TenantUnauthorized { url: String, reason: String },

    /// The registry's `/v2/` endpoint is unreachable or answered non-2xx.
    #[error("registry '{registry}' is unreachable: {reason}")]
    RegistryUnreachable { registry: String, reason: String },

    /// The registry rejected the pull secret's credentials.
    #[error("registry '{registry}' rejected credentials with status {status}")]
    RegistryUnauthorized { registry: String, status: u16 },

    /// The manifest of the image cannot be found.
    #[error("image '{image}' not found (status {status})")]
    ImageNotFound { image: String, status: u16 },

    // =========================================================================
    // Infrastructure Errors
    // =========================================================================
    /// A cluster read failed for a reason other than absence.
    #[error("failed to read {kind} '{namespace}/{name}': {reason}")]
    ClusterRead {
        kind: String,
        namespace: String,
        name: String,
        reason: String,
    },

    /// Listing DynaKubes failed for a reason other than a missing CRD.
    #[error("failed to list '{kind}': {reason}")]
    CrdUnqueryable { kind: String, reason: String },

    /// The HTTP exchange produced something the engine cannot interpret.
    #[error("unexpected response from '{url}': {reason}")]
    UnexpectedHttp { url: String, reason: String },

    /// A check ran without the state its prerequisites should have resolved.
    #[error("run context has no {0}; a prerequisite check did not populate it")]
    MissingContext(&'static str),

    /// The run context was cancelled or its deadline passed.
    #[error("run cancelled: {0}")]
    Cancelled(String),

    // =========================================================================
    // Control Flow
    // =========================================================================
    /// An error after which no further check is attempted.
    #[error("{0}")]
    Cardinal(Box<Error>),

    /// The failures collected by the executor.
    #[error("{0}")]
    ChecksFailed(AggregatedError),
}

impl Error {
    /// Tags this error as cardinal. Tagging twice is a no-op.
    pub fn cardinal(self) -> Self {
        match self {
            Self::Cardinal(_) => self,
            other => Self::Cardinal(Box::new(other)),
        }
    }

    /// Returns true if the error carries the cardinal tag.
    pub fn is_cardinal(&self) -> bool {
        matches!(self, Self::Cardinal(_))
    }

    /// Returns true if the error reports run cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), Self::Cancelled(_))
    }

    /// Returns the underlying error with any cardinal tag removed.
    pub fn root(&self) -> &Error {
        match self {
            Self::Cardinal(inner) => inner.root(),
            other => other,
        }
    }

    /// Stable kind name shown on failure lines.
    pub fn kind(&self) -> &'static str {
        match self.root() {
            Self::InvalidApiUrl { .. } => "InvalidApiUrl",
            Self::InvalidProxyUrl { .. } => "InvalidProxyURL",
            Self::InvalidImage { .. } => "InvalidImage",
            Self::MalformedPullSecret { .. } => "MalformedPullSecret",
            Self::InvalidTrustedCerts { .. } => "InvalidTrustedCerts",
            Self::TokenMalformed { .. } => "TokenMalformed",
            Self::MalformedCustomResource { .. } => "MalformedCustomResource",
            Self::ConflictingProxySources { .. } => "ConflictingProxySources",
            Self::InvalidConfig(_) => "InvalidConfig",
            Self::NamespaceMissing { .. } => "NamespaceMissing",
            Self::CrdMissing { .. } => "CRDMissing",
            Self::CrNotFound { .. } => "CRNotFound",
            Self::CredentialsSecretMissing { .. } => "CredentialsSecretMissing",
            Self::PullSecretMissing { .. } => "PullSecretMissing",
            Self::ProxySecretMissing { .. } => "ProxySecretMissing",
            Self::MissingPullSecretField { .. } => "MissingPullSecretField",
            Self::MissingSecretField { .. } => "MissingSecretField",
            Self::MissingTrustedCerts { .. } => "MissingTrustedCerts",
            Self::TokenScopeMissing { .. } => "TokenScopeMissing",
            Self::TenantUnreachable { .. } => "TenantUnreachable",
            Self::TenantUnauthorized { .. } => "TenantUnauthorized",
            Self::RegistryUnreachable { .. } => "RegistryUnreachable",
            Self::RegistryUnauthorized { .. } => "RegistryUnauthorized",
            Self::ImageNotFound { .. } => "ImageNotFound",
            Self::ClusterRead { .. } => "ClusterReadError",
            Self::CrdUnqueryable { .. } => "CRDUnqueryable",
            Self::UnexpectedHttp { .. } => "UnexpectedHTTPError",
            Self::MissingContext(_) => "MissingRunContext",
            Self::Cancelled(_) => "Cancelled",
            Self::ChecksFailed(_) => "ChecksFailed",
            // root() never yields a Cardinal
            Self::Cardinal(_) => "Cardinal",
        }
    }
}

/// A single failed check and its error.
#[derive(Debug)]
pub struct CheckFailure {
    /// Name of the check that failed.
    pub check: String,
    /// Error returned by the check.
    pub error: Error,
}

/// Failures collected over one run, in the order the checks ran.
#[derive(Debug, Default)]
pub struct AggregatedError {
    /// Failed checks in run order.
    pub failures: Vec<CheckFailure>,
}

impl AggregatedError {
    /// Appends a failure.
    pub fn push(&mut self, check: impl Into<String>, error: Error) {
        self.failures.push(CheckFailure {
            check: check.into(),
            error,
        });
    }

    /// Returns true when nothing failed.
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of collected failures.
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if any collected failure is cardinal.
    pub fn has_cardinal(&self) -> bool {
        self.failures.iter().any(|f| f.error.is_cardinal())
    }

    /// Names of the failed checks in run order.
    pub fn checks(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.check.as_str()).collect()
    }

    /// Kind names of the collected errors in run order.
    pub fn kinds(&self) -> Vec<&'static str> {
        self.failures.iter().map(|f| f.error.kind()).collect()
    }
}

impl fmt::Display for AggregatedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} check(s) failed", self.failures.len())?;
        for failure in &self.failures {
            write!(
                f,
                "; {}: [{}] {}",
                failure.check,
                failure.error.kind(),
                failure.error
            )?;
        }
        Ok(())
    }
}

impl std::error::Error for AggregatedError {}
