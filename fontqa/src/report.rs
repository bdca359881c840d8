//! Telling people what the checks found

use std::{
    fs,
    io::{self, Write},
    path::Path,
};

use fontqa_core::{CheckOutcome, Registry, ResolvedProfile, Status, Summary};
use indexmap::IndexMap;
use serde::Serialize;

use crate::Error;

/// Label used in place of a filename for checks that look at the whole family
const FAMILY: &str = "Family checks";

/// Human readable output, grouped by section then by file.
///
/// Only subresults at or above `threshold` are shown. The summary counts
/// every outcome regardless.
pub fn write_terminal(
    out: &mut impl Write,
    outcomes: &[CheckOutcome],
    summary: &Summary,
    threshold: Status,
    quiet: bool,
) -> io::Result<()> {
    if !quiet {
        write_details(out, outcomes, threshold)?;
    }
    write_summary(out, summary)
}

fn write_details(
    out: &mut impl Write,
    outcomes: &[CheckOutcome],
    threshold: Status,
) -> io::Result<()> {
    // section => file => outcomes, in the order the runner produced them
    let mut grouped: IndexMap<&str, IndexMap<String, Vec<&CheckOutcome>>> = IndexMap::new();
    for outcome in outcomes {
        if outcome.worst_status() < threshold {
            continue;
        }
        let file = outcome
            .filename
            .as_ref()
            .map(|f| f.display().to_string())
            .unwrap_or_else(|| FAMILY.to_string());
        grouped
            .entry(outcome.section.as_str())
            .or_default()
            .entry(file)
            .or_default()
            .push(outcome);
    }

    for (section, files) in grouped {
        writeln!(out, "{section}")?;
        for (file, outcomes) in files {
            writeln!(out, "  {file}")?;
            for outcome in outcomes {
                writeln!(out, "    >> {}: {}", outcome.check_id, outcome.title)?;
                for subresult in outcome.subresults.iter() {
                    if subresult.status < threshold {
                        continue;
                    }
                    // continuation lines line up under the first
                    let text = subresult.to_string().replace('\n', "\n       ");
                    writeln!(out, "       {text}")?;
                }
                if let Some(hotfix) = &outcome.hotfix {
                    writeln!(out, "       {hotfix}")?;
                }
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

pub fn write_summary(out: &mut impl Write, summary: &Summary) -> io::Result<()> {
    writeln!(out, "Summary:")?;
    for status in Status::all() {
        writeln!(out, "  {status}: {}", summary.count(*status))?;
    }
    writeln!(out, "  Total: {}", summary.total())
}

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a Summary,
    worst_status: Status,
    outcomes: &'a [CheckOutcome],
}

pub fn to_json(outcomes: &[CheckOutcome], summary: &Summary) -> Result<String, Error> {
    Ok(serde_json::to_string_pretty(&JsonReport {
        summary,
        worst_status: summary.worst(),
        outcomes,
    })?)
}

pub fn write_json(path: &Path, outcomes: &[CheckOutcome], summary: &Summary) -> Result<(), Error> {
    let json = to_json(outcomes, summary)?;
    fs::write(path, json).map_err(|source| Error::FileIo {
        path: path.to_path_buf(),
        source,
    })
}

/// The checks a profile would run, by section
pub fn write_check_list(
    out: &mut impl Write,
    registry: &Registry,
    profile: &ResolvedProfile,
) -> io::Result<()> {
    for section in profile.section_names() {
        writeln!(out, "{section}")?;
        for (_, id) in profile.checks.iter().filter(|(s, _)| s == section) {
            let Some(check) = registry.check(id) else {
                continue;
            };
            let experimental = if check.is_experimental() {
                " [experimental]"
            } else {
                ""
            };
            writeln!(out, "  {id}: {}{experimental}", check.title)?;
        }
    }
    Ok(())
}
