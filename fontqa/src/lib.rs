//! A font quality checker: runs profiles of checks over fonts and reports
//! what they find.

#[cfg(feature = "cli")]
mod args;
mod config;
mod error;
pub mod report;
pub mod scaffold;

#[cfg(feature = "cli")]
pub use args::{Args, CheckArgs, Command, ScaffoldArgs};
pub use config::Config;
pub use error::Error;

use std::{fs, path::PathBuf};

use fontqa_core::{
    CheckOutcome, Registry, RunOptions, Runner, Status, Summary, TestableCollection,
};
use fontqa_opentype::OpenType;
use log::info;

/// Every check, condition and profile fontqa knows about
pub fn registry() -> Result<Registry, Error> {
    Ok(Registry::from_plugins(&[&OpenType])?)
}

/// What happened when a profile ran over some fonts
#[derive(Debug, Clone, PartialEq)]
pub struct CheckRun {
    pub outcomes: Vec<CheckOutcome>,
    pub summary: Summary,
    /// Fonts rewritten by hotfixes
    pub fixed: Vec<PathBuf>,
}

impl CheckRun {
    /// True if the run is bad enough that the process should exit with an error
    pub fn fails_on(&self, error_code_on: Status) -> bool {
        self.summary.total() > 0 && self.summary.worst() >= error_code_on
    }
}

/// Run a profile from the registry over the fonts at `paths`.
///
/// With `hotfix` set, fonts that a check knows how to repair are repaired
/// and written back in place. The summary describes the fonts as they were
/// before repair.
pub fn check_fonts(
    registry: &Registry,
    profile: &str,
    paths: &[PathBuf],
    options: &RunOptions,
    hotfix: bool,
) -> Result<CheckRun, Error> {
    if paths.is_empty() {
        return Err(Error::NoInputs);
    }
    let profile = registry.resolve_profile(profile)?;
    let fonts = TestableCollection::from_paths(paths)?;
    info!(
        "Checking {} fonts against {} checks of profile '{}'",
        fonts.len(),
        profile.checks.len(),
        profile.name
    );
    let runner = Runner::new(registry);
    let mut outcomes = runner.run_profile(&profile, &fonts, options);
    let summary = Summary::from_outcomes(&outcomes);

    let mut fixed = Vec::new();
    if hotfix {
        for font in runner.apply_hotfixes(&profile, &fonts, &mut outcomes, options) {
            let path = font.filename().to_path_buf();
            fs::write(&path, font.data()).map_err(|source| Error::FileIo {
                path: path.clone(),
                source,
            })?;
            info!("Hotfixed {}", path.display());
            fixed.push(path);
        }
    }
    Ok(CheckRun {
        outcomes,
        summary,
        fixed,
    })
}
