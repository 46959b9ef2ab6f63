//! # Pipeline Executor
//!
//! Walks a check list in declared order:
//!
//! ```text
//! for check in checks:
//!     unmet prerequisite?  -> SKIPPED, continue
//!     run                  -> PASSED | FAILED (error aggregated)
//!     cardinal error?      -> stop, later checks get no outcome
//!     cancelled?           -> stop, cancellation returned as-is
//! ```
//!
//! The executor never sorts. Prerequisites are names looked up in the shared
//! [`CheckResults`], so a prerequisite declared (and recorded) earlier in the
//! list or in an earlier run over the same store satisfies the gate.

use crate::check::{Check, CheckResults, Outcome};
use crate::context::RunContext;
use crate::error::{AggregatedError, Error, Result};
use crate::log;
use std::collections::HashSet;
use tracing::debug;

/// Runs `checks` against `ctx`, recording outcomes in `results`.
///
/// # Errors
///
/// - [`Error::ChecksFailed`] with every failure in run order
/// - [`Error::Cancelled`] as soon as a check reports cancellation; outcomes
///   recorded so far stay in `results`
pub async fn run(ctx: &mut RunContext, results: &mut CheckResults, checks: &[Check]) -> Result<()> {
    let mut aggregated = AggregatedError::default();

    for check in checks {
        let unmet = results.unmet(check);
        if !unmet.is_empty() {
            log::check_skipped(check.name, &unmet);
            results.record(check.name, Outcome::Skipped);
            continue;
        }

        log::check_started(check.name);
        let err = match check.run(ctx).await {
            Ok(()) => {
                log::check_passed(check.name);
                results.record(check.name, Outcome::Passed);
                continue;
            }
            Err(err) => err,
        };

        log::check_failed(check.name, &err);
        results.record(check.name, Outcome::Failed);

        if err.is_cancelled() {
            return Err(err);
        }
        let cardinal = err.is_cardinal();
        aggregated.push(check.name, err);
        if cardinal {
            debug!("cardinal failure in {}, stopping", check.name);
            break;
        }
    }

    if aggregated.is_empty() {
        Ok(())
    } else {
        Err(Error::ChecksFailed(aggregated))
    }
}

/// Verifies that names are unique and every prerequisite is declared before
/// the check that needs it. Declaration order then rules out cycles.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] naming the first offending check.
pub fn validate_declarations(checks: &[Check]) -> Result<()> {
    let mut declared = HashSet::new();
    for check in checks {
        for prerequisite in &check.prerequisites {
            if *prerequisite == check.name {
                return Err(Error::InvalidConfig(format!(
                    "check '{}' lists itself as a prerequisite",
                    check.name
                )));
            }
            if !declared.contains(prerequisite) {
                return Err(Error::InvalidConfig(format!(
                    "check '{}' depends on '{}', which is not declared before it",
                    check.name, prerequisite
                )));
            }
        }
        if !declared.insert(check.name) {
            return Err(Error::InvalidConfig(format!(
                "check '{}' is declared twice",
                check.name
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop(name: &'static str, prerequisites: &[&'static str]) -> Check {
        Check::from_fn(name, prerequisites, |_| Ok(()))
    }

    #[test]
    fn accepts_ordered_declarations() {
        let checks = vec![noop("a", &[]), noop("b", &["a"]), noop("c", &["a", "b"])];
        assert!(validate_declarations(&checks).is_ok());
    }

    #[test]
    fn rejects_forward_reference() {
        let checks = vec![noop("b", &["a"]), noop("a", &[])];
        assert!(matches!(
            validate_declarations(&checks),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_duplicates_and_self_reference() {
        assert!(validate_declarations(&[noop("a", &[]), noop("a", &[])]).is_err());
        assert!(validate_declarations(&[noop("a", &["a"])]).is_err());
    }
}
