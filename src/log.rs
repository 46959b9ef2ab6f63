//! Human-readable status lines.
//!
//! Every event of a run is one line emitted through `tracing`:
//!
//! ```text
//! --- crdRegistered
//!   listing DynaKube in namespace 'dynatrace'
//! √ crdRegistered
//! × customResourceExists: [CRNotFound] DynaKube 'dynakube' not found in namespace 'dynatrace'
//! ```

use crate::check::Summary;
use crate::error::Error;
use tracing::{error, info, warn};

/// Marker printed when a check starts.
pub const NEW_CHECK_MARKER: &str = "---";

/// Marker printed when a check passes.
pub const PASS_MARKER: &str = "√";

/// Marker printed when a check fails.
pub const FAIL_MARKER: &str = "×";

/// Indentation of informational detail lines.
pub const DETAIL_INDENT: &str = "  ";

pub fn check_started(name: &str) {
    info!("{} {}", NEW_CHECK_MARKER, name);
}

pub fn check_passed(name: &str) {
    info!("{} {}", PASS_MARKER, name);
}

pub fn check_failed(name: &str, err: &Error) {
    error!("{} {}: [{}] {}", FAIL_MARKER, name, err.kind(), err);
}

pub fn check_skipped(name: &str, unmet: &[&str]) {
    warn!(
        "{} {} skipped, prerequisites not passed: {}",
        NEW_CHECK_MARKER,
        name,
        unmet.join(", ")
    );
}

/// Informational detail under the current check.
pub fn detail(message: impl AsRef<str>) {
    info!("{}{}", DETAIL_INDENT, message.as_ref());
}

/// Warning under the current check.
pub fn warning(message: impl AsRef<str>) {
    warn!("{}{}", DETAIL_INDENT, message.as_ref());
}

pub fn summary(summary: &Summary) {
    if summary.success() {
        info!("{} troubleshoot finished: {}", PASS_MARKER, summary);
    } else {
        error!("{} troubleshoot finished: {}", FAIL_MARKER, summary);
    }
}
