//! Check definitions and the per-run results store.
//!
//! A [`Check`] is a name, the names of the checks it depends on, and an
//! action. Prerequisites are plain names resolved against [`CheckResults`]
//! at gate time, so a check may depend on any check that ran before it.

use crate::context::RunContext;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Outcome of a check in one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Ran and returned no error.
    Passed,
    /// Ran and returned an error.
    Failed,
    /// At least one prerequisite did not pass.
    Skipped,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "PASSED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// The work a check performs.
///
/// Actions read the run context and may enrich it (resolved secrets,
/// transport) for later checks.
#[async_trait]
pub trait CheckAction: Send + Sync {
    /// Runs the check. `Ok(())` passes, an error fails.
    async fn run(&self, ctx: &mut RunContext) -> Result<()>;
}

struct FnAction<F>(F);

#[async_trait]
impl<F> CheckAction for FnAction<F>
where
    F: Fn(&mut RunContext) -> Result<()> + Send + Sync,
{
    async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        (self.0)(ctx)
    }
}

/// A named unit of diagnosis.
#[derive(Clone)]
pub struct Check {
    /// Unique name within a run.
    pub name: &'static str,
    /// Names of checks that must have passed.
    pub prerequisites: Vec<&'static str>,
    action: Arc<dyn CheckAction>,
}

impl Check {
    /// Creates a check.
    pub fn new(
        name: &'static str,
        prerequisites: &[&'static str],
        action: impl CheckAction + 'static,
    ) -> Self {
        Self {
            name,
            prerequisites: prerequisites.to_vec(),
            action: Arc::new(action),
        }
    }

    /// Creates a check from a synchronous closure.
    pub fn from_fn<F>(name: &'static str, prerequisites: &[&'static str], f: F) -> Self
    where
        F: Fn(&mut RunContext) -> Result<()> + Send + Sync + 'static,
    {
        Self::new(name, prerequisites, FnAction(f))
    }

    /// Runs the action.
    pub async fn run(&self, ctx: &mut RunContext) -> Result<()> {
        self.action.run(ctx).await
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("prerequisites", &self.prerequisites)
            .finish_non_exhaustive()
    }
}

/// Per-run mapping from check name to outcome.
///
/// Outcomes are terminal: the first write for a name wins.
#[derive(Debug, Clone, Default)]
pub struct CheckResults {
    outcomes: HashMap<String, Outcome>,
    order: Vec<String>,
}

impl CheckResults {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome. Returns false if one was already recorded.
    pub fn record(&mut self, check: &str, outcome: Outcome) -> bool {
        if self.outcomes.contains_key(check) {
            return false;
        }
        self.outcomes.insert(check.to_string(), outcome);
        self.order.push(check.to_string());
        true
    }

    /// Outcome of a check; `None` means it has not run.
    pub fn get(&self, check: &str) -> Option<Outcome> {
        self.outcomes.get(check).copied()
    }

    /// Whether a check ran and passed. Unknown names have not passed.
    pub fn passed(&self, check: &str) -> bool {
        self.get(check) == Some(Outcome::Passed)
    }

    /// Prerequisites of `check` that have not passed, in declared order.
    pub fn unmet<'a>(&self, check: &'a Check) -> Vec<&'a str> {
        check
            .prerequisites
            .iter()
            .copied()
            .filter(|p| !self.passed(p))
            .collect()
    }

    /// Recorded outcomes in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Outcome)> {
        self.order
            .iter()
            .filter_map(|name| self.outcomes.get(name).map(|o| (name.as_str(), *o)))
    }

    /// Number of recorded outcomes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Counts per outcome.
    pub fn summary(&self) -> Summary {
        let mut summary = Summary::default();
        for outcome in self.outcomes.values() {
            match outcome {
                Outcome::Passed => summary.passed += 1,
                Outcome::Failed => summary.failed += 1,
                Outcome::Skipped => summary.skipped += 1,
            }
        }
        summary
    }
}

/// Outcome counts of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl Summary {
    /// A run succeeds when nothing failed.
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} passed, {} failed, {} skipped",
            self.passed, self.failed, self.skipped
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcomes_are_terminal() {
        let mut results = CheckResults::new();
        assert!(results.record("a", Outcome::Failed));
        assert!(!results.record("a", Outcome::Passed));
        assert_eq!(results.get("a"), Some(Outcome::Failed));
    }

    #[test]
    fn unknown_checks_have_not_passed() {
        let results = CheckResults::new();
        assert!(!results.passed("never-ran"));
        assert_eq!(results.get("never-ran"), None);
    }

    #[test]
    fn summary_counts() {
        let mut results = CheckResults::new();
        results.record("a", Outcome::Passed);
        results.record("b", Outcome::Failed);
        results.record("c", Outcome::Skipped);
        results.record("d", Outcome::Passed);
        let summary = results.summary();
        assert_eq!(summary.to_string(), "2 passed, 1 failed, 1 skipped");
        assert!(!summary.success());
    }
}
