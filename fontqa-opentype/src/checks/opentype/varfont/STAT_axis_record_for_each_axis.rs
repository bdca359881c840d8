use std::collections::HashSet;

use fontqa_core::{prelude::*, Error};
use skrifa::{raw::TableProvider, Tag};

pub fn check() -> Result<Check, Error> {
    Ok(Check::one(
        "opentype/varfont/STAT_axis_record_for_each_axis",
        "All fvar axes have a correspondent Axis Record on STAT table?",
        stat_axis_record_for_each_axis,
    )?
    .rationale(
        "According to the OpenType spec, there must be an Axis Record \
         for every axis defined in the fvar table.\n\
         \n\
         https://docs.microsoft.com/en-us/typography/opentype/spec/stat#axis-records",
    )
    .proposal("https://github.com/fonttools/fontbakery/pull/3017")
    .build())
}

fn stat_axis_record_for_each_axis(t: &Testable, context: &Context) -> CheckFnResult {
    skip!(!t.is_variable_font(), "not-variable", "Not a variable font");
    let font = t.font()?;
    let stat = font
        .stat()
        .map_err(|_| CheckError::skip("no-stat", "No STAT table"))?;
    let stat_axes: HashSet<Tag> = stat
        .design_axes()?
        .iter()
        .map(|record| record.axis_tag())
        .collect();
    // fvar order, so the report is stable
    let missing: Vec<String> = font
        .fvar()?
        .axes()?
        .iter()
        .map(|axis| axis.axis_tag())
        .filter(|tag| !stat_axes.contains(tag))
        .map(|tag| tag.to_string())
        .collect();
    if missing.is_empty() {
        return return_result(vec![]);
    }
    return_result(vec![Subresult::fail(
        "missing-axis-records",
        &format!(
            "STAT table is missing Axis Records for the following axes:\n\n{}",
            bullet_list(context, &missing)
        ),
    )])
}
