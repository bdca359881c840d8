//! Which registered checks has the test session actually exercised?

use std::{
    collections::BTreeSet,
    fmt::{self, Display},
};

use log::trace;
use parking_lot::Mutex;

use crate::{check::CheckId, registry::Registry};

/// Session-wide record of exercised checks.
///
/// Create one when the session starts, share it (it is `Sync`) with
/// everything that runs checks, and ask for a [CoverageReport] at the end.
#[derive(Debug, Default)]
pub struct CoverageTracker {
    exercised: Mutex<BTreeSet<CheckId>>,
}

impl CoverageTracker {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn record(&self, id: &CheckId) {
        trace!("Exercised {id}");
        self.exercised.lock().insert(id.clone());
    }

    /// Forget everything recorded so far
    pub fn reset(&self) {
        self.exercised.lock().clear();
    }

    pub fn exercised(&self) -> BTreeSet<CheckId> {
        self.exercised.lock().clone()
    }

    pub fn report(&self, registry: &Registry) -> CoverageReport {
        CoverageReport {
            registered: registry.check_ids().cloned().collect(),
            exercised: self.exercised(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoverageReport {
    pub registered: BTreeSet<CheckId>,
    pub exercised: BTreeSet<CheckId>,
}

impl CoverageReport {
    /// Registered checks no test exercised, in id order
    pub fn untested(&self) -> Vec<&CheckId> {
        self.registered.difference(&self.exercised).collect()
    }

    /// Share of registered checks that are untested, 0.0 when nothing is registered
    pub fn untested_percentage(&self) -> f64 {
        if self.registered.is_empty() {
            return 0.0;
        }
        100.0 * self.untested().len() as f64 / self.registered.len() as f64
    }

    pub fn is_complete(&self) -> bool {
        self.untested().is_empty()
    }
}

impl Display for CoverageReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let untested = self.untested();
        write!(
            f,
            "{} checks / {} ({:.1}%) are untested:",
            untested.len(),
            self.registered.len(),
            self.untested_percentage()
        )?;
        for id in untested {
            write!(f, "\n  - {id}")?;
        }
        Ok(())
    }
}
