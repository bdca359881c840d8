use std::{io, path::PathBuf};

use skrifa::raw::ReadError;
use thiserror::Error;

use crate::{check::CheckId, testable::Arity};

#[derive(Debug, Error)]
pub enum Error {
    #[error("io failed for '{path}': '{source}'")]
    FileIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("'{path}' is not a font we can decode: {source}")]
    MalformedResource {
        path: PathBuf,
        #[source]
        source: ReadError,
    },
    #[error("Invalid check id '{0}'")]
    InvalidCheckId(String),
    #[error("A check with id {0} is already registered")]
    DuplicateCheck(CheckId),
    #[error("Check {0} looks at a whole family so it cannot carry a hotfix")]
    FamilyHotfix(CheckId),
    #[error("A condition named '{0}' is already registered")]
    DuplicateCondition(String),
    #[error("Check {check} requires unknown condition '{condition}'")]
    UnknownCondition { check: CheckId, condition: String },
    #[error("Check {check} looks at a single font but '{condition}' is a family condition")]
    ConditionArity { check: CheckId, condition: String },
    #[error("A profile named '{0}' is already registered")]
    DuplicateProfile(String),
    #[error("Unknown profile '{0}'")]
    UnknownProfile(String),
    #[error("Profile '{profile}' refers to unknown check {check}")]
    UnknownCheck { profile: String, check: String },
    #[error("Profile '{0}' includes itself")]
    ProfileCycle(String),
    #[error("Unable to parse profile: {0}")]
    ProfileParse(#[from] serde_yaml::Error),
    #[error("Check {check} runs on {expected} but was given {actual}")]
    ArityMismatch {
        check: CheckId,
        expected: Arity,
        actual: Arity,
    },
}
