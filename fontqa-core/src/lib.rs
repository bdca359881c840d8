//! The engine of fontqa: checks, the conditions gating them, the profiles
//! selecting them and the runner executing them.

pub mod check;
pub mod codetesting;
pub mod condition;
pub mod coverage;
mod error;
pub mod outcome;
pub mod profile;
pub mod registry;
pub mod runner;
pub mod status;
pub mod testable;
pub mod utils;

pub use check::{Check, CheckFlags, CheckId, Context};
pub use condition::Condition;
pub use coverage::{CoverageReport, CoverageTracker};
pub use error::Error;
pub use outcome::{CheckOutcome, Hotfix, Summary};
pub use profile::{Override, Profile, ProfileBuilder, ResolvedProfile};
pub use registry::{Plugin, Registry, RegistryBuilder};
pub use runner::{RunOptions, Runner};
pub use status::{return_result, CheckError, CheckFnResult, FixFnResult, Status, Subresult};
pub use testable::{Testable, TestableCollection, TestableType};

/// Return early from a check body with a SKIP of its own.
///
/// `skip!(code, message)` always skips, `skip!(condition, code, message)`
/// skips when the condition holds.
#[macro_export]
macro_rules! skip {
    ($code:expr, $message:expr) => {
        return Err($crate::CheckError::skip($code, $message))
    };
    ($condition:expr, $code:expr, $message:expr) => {
        if $condition {
            return Err($crate::CheckError::skip($code, $message));
        }
    };
}

/// What check authors usually need
pub mod prelude {
    pub use crate::{
        return_result, skip, utils::bullet_list, Check, CheckError, CheckFnResult, Condition,
        Context, FixFnResult, Status, Subresult, Testable, TestableCollection,
    };
}
