//! troubleshoot - DynaKube diagnostics CLI
//!
//! Runs the check library against a live cluster and prints one line per
//! event.
//!
//! ## Usage
//!
//! ```sh
//! troubleshoot troubleshoot [--namespace dynatrace] [--dynakube dynakube] [--timeout 120]
//! ```
//!
//! Exit status is 0 when no check failed (passed or skipped only), 1
//! otherwise. `RUST_LOG` adjusts verbosity; the default shows check lines.

use clap::{Parser, Subcommand};
use dynakube_troubleshoot::checks;
use dynakube_troubleshoot::constants::{DEFAULT_DYNAKUBE, DEFAULT_NAMESPACE, DEFAULT_RUN_TIMEOUT};
use dynakube_troubleshoot::{
    CheckResults, Error, KubeReader, ReqwestTransportFactory, RunContext, TroubleshootConfig,
};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

// =============================================================================
// CLI Parsing
// =============================================================================

#[derive(Parser)]
#[command(name = "troubleshoot")]
#[command(about = "Read-only diagnostics for a DynaKube")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a DynaKube and everything it depends on.
    Troubleshoot {
        /// Namespace of the DynaKube.
        #[arg(long, default_value = DEFAULT_NAMESPACE)]
        namespace: String,
        /// Name of the DynaKube.
        #[arg(long, default_value = DEFAULT_DYNAKUBE)]
        dynakube: String,
        /// Run deadline in seconds.
        #[arg(long, default_value_t = DEFAULT_RUN_TIMEOUT.as_secs())]
        timeout: u64,
    },
}

// =============================================================================
// Commands
// =============================================================================

async fn cmd_troubleshoot(config: TroubleshootConfig) -> dynakube_troubleshoot::Result<()> {
    config.validate()?;

    let cluster = KubeReader::try_default()
        .await
        .map_err(|e| Error::InvalidConfig(e.to_string()))?;
    let factory = ReqwestTransportFactory::from_env();
    let mut ctx = RunContext::new(&config, Arc::new(cluster), Arc::new(factory));

    let token = ctx.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, cancelling run");
            token.cancel();
        }
    });

    let mut results = CheckResults::new();
    checks::troubleshoot(&mut ctx, &mut results).await
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .with_level(false)
        .init();
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Command::Troubleshoot {
            namespace,
            dynakube,
            timeout,
        } => {
            let config = TroubleshootConfig::new(namespace, dynakube)
                .with_timeout(Duration::from_secs(timeout));
            cmd_troubleshoot(config).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        // Failure lines and the summary are already logged.
        Err(Error::ChecksFailed(_)) => ExitCode::FAILURE,
        Err(e) => {
            error!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
