//! Severity levels and the individual diagnostics a check emits.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use skrifa::raw::ReadError;
use smol_str::SmolStr;

use crate::error::Error;

/// How bad is it?
///
/// The derived ordering is the severity lattice: a [Status::Skip] is more
/// interesting than an [Status::Info], and an [Status::Error] trumps everything
/// because it means the check itself could not complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Info,
    Skip,
    Warn,
    Fail,
    Error,
}

impl Status {
    /// All statuses, most severe first
    pub fn all() -> &'static [Status; 6] {
        &[
            Status::Error,
            Status::Fail,
            Status::Warn,
            Status::Skip,
            Status::Info,
            Status::Pass,
        ]
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Status::Pass => "PASS",
            Status::Info => "INFO",
            Status::Skip => "SKIP",
            Status::Warn => "WARN",
            Status::Fail => "FAIL",
            Status::Error => "ERROR",
        };
        f.write_str(s)
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Status::all()
            .iter()
            .find(|status| status.to_string().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("Unrecognized status '{s}'"))
    }
}

/// One diagnostic emitted by a check.
///
/// The code is the stable handle tests and tooling key on. It only has to be
/// unique within the emitting check. The message is for humans and may change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subresult {
    pub status: Status,
    pub code: SmolStr,
    pub message: String,
}

impl Subresult {
    pub fn new(status: Status, code: impl Into<SmolStr>, message: impl Into<String>) -> Self {
        Subresult {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn pass() -> Self {
        Self::new(Status::Pass, "pass", "")
    }

    pub fn info(code: &str, message: &str) -> Self {
        Self::new(Status::Info, code, message)
    }

    pub fn skip(code: &str, message: &str) -> Self {
        Self::new(Status::Skip, code, message)
    }

    pub fn warn(code: &str, message: &str) -> Self {
        Self::new(Status::Warn, code, message)
    }

    pub fn fail(code: &str, message: &str) -> Self {
        Self::new(Status::Fail, code, message)
    }

    pub fn error(code: &str, message: &str) -> Self {
        Self::new(Status::Error, code, message)
    }
}

impl Display for Subresult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.status, self.code)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        Ok(())
    }
}

/// The worst status in a sequence of subresults, [Status::Pass] if there are none.
pub fn worst_status<'a>(subresults: impl IntoIterator<Item = &'a Subresult>) -> Status {
    subresults
        .into_iter()
        .map(|s| s.status)
        .max()
        .unwrap_or(Status::Pass)
}

/// An early return from a check body.
///
/// Expected rule violations are *not* errors; report them as FAIL or WARN
/// subresults. This is for the check that cannot proceed at all.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckError {
    /// Something the check relied on but did not declare as a condition was missing.
    Error(String),
    /// The check decided on its own that it does not apply.
    Skip { code: SmolStr, message: String },
}

impl CheckError {
    pub fn skip(code: &str, message: &str) -> Self {
        CheckError::Skip {
            code: code.into(),
            message: message.to_string(),
        }
    }
}

impl Display for CheckError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckError::Error(e) => f.write_str(e),
            CheckError::Skip { code, message } => write!(f, "skipped [{code}]: {message}"),
        }
    }
}

impl From<ReadError> for CheckError {
    fn from(e: ReadError) -> Self {
        CheckError::Error(e.to_string())
    }
}

impl From<Error> for CheckError {
    fn from(e: Error) -> Self {
        CheckError::Error(e.to_string())
    }
}

pub type CheckFnResult = Result<Vec<Subresult>, CheckError>;

/// The rewritten font from a hotfix, or None if there was nothing it could fix
pub type FixFnResult = Result<Option<Vec<u8>>, CheckError>;

/// Wrap up a list of problems; no problems means a single pass.
pub fn return_result(problems: Vec<Subresult>) -> CheckFnResult {
    if problems.is_empty() {
        Ok(vec![Subresult::pass()])
    } else {
        Ok(problems)
    }
}
