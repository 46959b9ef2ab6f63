//! # Check Library
//!
//! The concrete checks, declared once in dependency order. Each check reads
//! the [`RunContext`], may populate it for later checks, and returns the
//! first error it meets.
//!
//! ```text
//! namespaceExists
//! crdRegistered
//! └── customResourceExists
//!     ├── apiUrlWellFormed ─────────────┐
//!     ├── credentialsSecretExists       │
//!     │   └── credentialsSecretHasApiToken
//!     │       └── tokenScopesValid ◄────┘
//!     │           └── tenantReachable
//!     ├── pullSecretExists
//!     │   └── pullSecretWellFormed ─────┐
//!     └── proxySecretWellFormed ────────┤
//!                                       └── transportAssembled
//!                                           ├── fullstackImagePullable
//!                                           ├── codeModulesImagePullable
//!                                           └── gatewayImagePullable
//! ```

pub mod cluster;
pub mod credentials;
pub mod images;
pub mod proxy;
pub mod pull_secret;
pub mod transport;

use crate::check::{Check, CheckResults};
use crate::context::RunContext;
use crate::error::Result;
use crate::{executor, log};

pub use images::{Component, resolve_image};

pub const NAMESPACE_EXISTS: &str = "namespaceExists";
pub const CRD_REGISTERED: &str = "crdRegistered";
pub const CUSTOM_RESOURCE_EXISTS: &str = "customResourceExists";
pub const API_URL_WELL_FORMED: &str = "apiUrlWellFormed";
pub const CREDENTIALS_SECRET_EXISTS: &str = "credentialsSecretExists";
pub const CREDENTIALS_SECRET_HAS_API_TOKEN: &str = "credentialsSecretHasApiToken";
pub const TOKEN_SCOPES_VALID: &str = "tokenScopesValid";
pub const TENANT_REACHABLE: &str = "tenantReachable";
pub const PULL_SECRET_EXISTS: &str = "pullSecretExists";
pub const PULL_SECRET_WELL_FORMED: &str = "pullSecretWellFormed";
pub const PROXY_SECRET_WELL_FORMED: &str = "proxySecretWellFormed";
pub const TRANSPORT_ASSEMBLED: &str = "transportAssembled";
pub const FULLSTACK_IMAGE_PULLABLE: &str = "fullstackImagePullable";
pub const CODE_MODULES_IMAGE_PULLABLE: &str = "codeModulesImagePullable";
pub const GATEWAY_IMAGE_PULLABLE: &str = "gatewayImagePullable";

/// Every check, in declared order.
pub fn all() -> Vec<Check> {
    vec![
        Check::new(NAMESPACE_EXISTS, &[], cluster::NamespaceExists),
        Check::new(CRD_REGISTERED, &[], cluster::CrdRegistered),
        Check::new(
            CUSTOM_RESOURCE_EXISTS,
            &[CRD_REGISTERED],
            cluster::CustomResourceExists,
        ),
        Check::new(
            API_URL_WELL_FORMED,
            &[CUSTOM_RESOURCE_EXISTS],
            cluster::ApiUrlWellFormed,
        ),
        Check::new(
            CREDENTIALS_SECRET_EXISTS,
            &[CUSTOM_RESOURCE_EXISTS],
            credentials::CredentialsSecretExists,
        ),
        Check::new(
            CREDENTIALS_SECRET_HAS_API_TOKEN,
            &[CREDENTIALS_SECRET_EXISTS],
            credentials::CredentialsSecretHasApiToken,
        ),
        Check::new(
            TOKEN_SCOPES_VALID,
            &[API_URL_WELL_FORMED, CREDENTIALS_SECRET_HAS_API_TOKEN],
            credentials::TokenScopesValid,
        ),
        Check::new(
            TENANT_REACHABLE,
            &[TOKEN_SCOPES_VALID],
            credentials::TenantReachable,
        ),
        Check::new(
            PULL_SECRET_EXISTS,
            &[CUSTOM_RESOURCE_EXISTS],
            pull_secret::PullSecretExists,
        ),
        Check::new(
            PULL_SECRET_WELL_FORMED,
            &[PULL_SECRET_EXISTS],
            pull_secret::PullSecretWellFormed,
        ),
        Check::new(
            PROXY_SECRET_WELL_FORMED,
            &[CUSTOM_RESOURCE_EXISTS],
            proxy::ProxySecretWellFormed,
        ),
        Check::new(
            TRANSPORT_ASSEMBLED,
            &[PULL_SECRET_WELL_FORMED, PROXY_SECRET_WELL_FORMED],
            transport::TransportAssembled,
        ),
        Check::new(
            FULLSTACK_IMAGE_PULLABLE,
            &[TRANSPORT_ASSEMBLED],
            images::ImagePullable(Component::Fullstack),
        ),
        Check::new(
            CODE_MODULES_IMAGE_PULLABLE,
            &[TRANSPORT_ASSEMBLED],
            images::ImagePullable(Component::CodeModules),
        ),
        Check::new(
            GATEWAY_IMAGE_PULLABLE,
            &[TRANSPORT_ASSEMBLED],
            images::ImagePullable(Component::Gateway),
        ),
    ]
}

/// Runs the full library and logs the summary line.
///
/// # Errors
///
/// Same as [`executor::run`], plus [`crate::Error::InvalidConfig`] if the
/// library's declarations are inconsistent.
pub async fn troubleshoot(ctx: &mut RunContext, results: &mut CheckResults) -> Result<()> {
    let checks = all();
    executor::validate_declarations(&checks)?;
    let outcome = executor::run(ctx, results, &checks).await;
    log::summary(&results.summary());
    outcome
}
