//! Records of what happened when checks ran.

use std::{collections::BTreeMap, fmt::Display, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    check::CheckId,
    status::{worst_status, Status, Subresult},
};

/// Where a failing font stands with respect to its check's hotfix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Hotfix {
    /// The check can repair this font but nobody asked it to
    Available,
    Applied,
    /// The hotfix ran and found nothing to change
    NotApplied,
    Failed(String),
}

impl Display for Hotfix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Hotfix::Available => f.write_str(
                "This issue can be fixed automatically. Run with --hotfix to apply the fix.",
            ),
            Hotfix::Applied => f.write_str("Hotfix applied"),
            Hotfix::NotApplied => f.write_str("Hotfix not applied"),
            Hotfix::Failed(e) => write!(f, "Hotfix failed: {e}"),
        }
    }
}

/// One check invocation against one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub check_id: CheckId,
    pub title: String,
    pub section: String,
    /// None for checks that looked at the whole family
    pub filename: Option<PathBuf>,
    pub subresults: Vec<Subresult>,
    /// Set when the check failed on this font and knows how to fix it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hotfix: Option<Hotfix>,
}

impl CheckOutcome {
    pub fn worst_status(&self) -> Status {
        worst_status(&self.subresults)
    }
}

/// Counts of outcomes by their worst status.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub counts: BTreeMap<Status, usize>,
}

impl Summary {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a CheckOutcome>) -> Summary {
        let mut counts = BTreeMap::new();
        for outcome in outcomes {
            *counts.entry(outcome.worst_status()).or_default() += 1;
        }
        Summary { counts }
    }

    pub fn count(&self, status: Status) -> usize {
        self.counts.get(&status).copied().unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// The worst status seen, Pass for an empty run
    pub fn worst(&self) -> Status {
        self.counts.keys().max().copied().unwrap_or(Status::Pass)
    }
}
