//! # dynakube-troubleshoot
//!
//! **Read-only diagnostics for a DynaKube and everything it depends on**
//!
//! Given a namespace and a DynaKube name, the engine verifies end to end that
//! the workload can operate: the namespace and CRD exist, the custom resource
//! is well formed, its secrets carry the required fields, the tenant is
//! reachable through the declared proxy, and every image the workload will
//! pull resolves with the configured pull secret. Nothing is ever written to
//! the cluster.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       dynakube-troubleshoot                         │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────────┐    │
//! │  │                    Pipeline Executor                        │    │
//! │  │   gate on prerequisites → run → record → cardinal stop      │    │
//! │  └─────────────────────────────────────────────────────────────┘    │
//! │                              │                                      │
//! │  ┌───────────────────────────┼───────────────────────────────┐      │
//! │  │                     Check Library                         │      │
//! │  │  cluster │ credentials │ pull secret │ proxy │ images     │      │
//! │  └───────────────────────────┼───────────────────────────────┘      │
//! │                              │  &mut RunContext                     │
//! │  ┌───────────────────────────┼───────────────────────────────┐      │
//! │  │                       Run Context                         │      │
//! │  │  DynaKube snapshot │ secrets │ keychain │ transport       │      │
//! │  └───────────────────────────┼───────────────────────────────┘      │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌──────────────┐  ┌───────────────┐  ┌──────────────┐              │
//! │  │ClusterReader │  │ HttpTransport │  │ Image parsers│              │
//! │  │ Get / List   │  │ proxy + CAs   │  │ vendor/custom│              │
//! │  └──────────────┘  └───────┬───────┘  └──────────────┘              │
//! │                    ┌───────┴────────┐                               │
//! │                    │ Tenant │Registry│                              │
//! │                    └────────────────┘                               │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Outcomes
//!
//! | Outcome | Meaning |
//! |---------|---------|
//! | `PASSED` | ran, returned no error |
//! | `FAILED` | ran, returned an error (aggregated) |
//! | `SKIPPED` | a prerequisite did not pass |
//!
//! A cardinal failure (see [`Error::cardinal`]) stops the run: later checks
//! get no outcome at all. Cancellation of the [`RunContext`] also stops the
//! run and is returned as-is rather than aggregated.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynakube_troubleshoot::{
//!     CheckResults, Error, KubeReader, ReqwestTransportFactory, RunContext, TroubleshootConfig,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> dynakube_troubleshoot::Result<()> {
//!     let config = TroubleshootConfig::new("dynatrace", "dynakube");
//!     let cluster = KubeReader::try_default()
//!         .await
//!         .map_err(|e| Error::InvalidConfig(e.to_string()))?;
//!     let cluster = Arc::new(cluster);
//!     let factory = Arc::new(ReqwestTransportFactory::from_env());
//!
//!     let mut ctx = RunContext::new(&config, cluster, factory);
//!     let mut results = CheckResults::new();
//!     dynakube_troubleshoot::checks::troubleshoot(&mut ctx, &mut results).await
//! }
//! ```

pub mod check;
pub mod checks;
pub mod cluster;
pub mod config;
pub mod constants;
pub mod context;
pub mod dynakube;
pub mod error;
pub mod executor;
pub mod image;
pub mod keychain;
pub mod kube_reader;
pub mod log;
pub mod registry;
pub mod tenant;
pub mod transport;

// Re-exports
pub use check::{Check, CheckAction, CheckResults, Outcome, Summary};
pub use cluster::{ClusterObject, ClusterReader, MemoryCluster, ObjectData, ObjectKind, ReadError};
pub use config::TroubleshootConfig;
pub use context::RunContext;
pub use dynakube::{DynaKube, ProxySource};
pub use error::{AggregatedError, CheckFailure, Error, Result};
pub use image::{ImageReference, parse_custom_image, parse_vendor_image};
pub use keychain::{DockerConfig, Keychain};
pub use kube_reader::KubeReader;
pub use registry::RegistryProbe;
pub use tenant::TenantClient;
pub use transport::{
    EnvProxies, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport,
    ReqwestTransportFactory, TransportError, TransportFactory, TransportSettings, TrustedCerts,
};
