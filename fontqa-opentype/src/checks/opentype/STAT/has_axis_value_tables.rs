use std::collections::HashSet;

use fontqa_core::{prelude::*, Error};
use skrifa::{
    raw::{tables::stat::AxisValue, TableProvider},
    Tag,
};

pub fn check() -> Result<Check, Error> {
    Ok(Check::one(
        "opentype/STAT/has_axis_value_tables",
        "STAT table has Axis Value tables?",
        has_axis_value_tables,
    )?
    .rationale(
        "According to the OpenType spec, in a variable font, it is strongly \
         recommended that axis value tables be included for every element of \
         typographic subfamily names for all of the named instances defined \
         in the 'fvar' table.\n\
         \n\
         Axis value tables are particularly important for variable fonts, but \
         can also be used in non-variable fonts. When used in non-variable \
         fonts, axis value tables for particular values should be implemented \
         consistently across fonts in the family.",
    )
    .proposal("https://github.com/fonttools/fontbakery/pull/3090")
    .condition("is_variable_font")
    .build())
}

// A variable font without STAT is left to STAT_axis_record_for_each_axis;
// reaching for the table here anyway makes that an ERROR.
fn has_axis_value_tables(t: &Testable, _context: &Context) -> CheckFnResult {
    let font = t.font()?;
    let stat = font.stat()?;
    let design_axes = stat.design_axes()?;
    let values = match stat.offset_to_axis_values().transpose()? {
        Some(array) => array
            .axis_values()
            .iter()
            .collect::<Result<Vec<AxisValue>, _>>()?,
        None => vec![],
    };
    if values.is_empty() {
        return return_result(vec![Subresult::fail(
            "no-axis-value-tables",
            "STAT table has no Axis Value tables.",
        )]);
    }

    let tag_of = |index: u16| design_axes.get(index as usize).map(|a| a.axis_tag());
    let mut covered: HashSet<Tag> = HashSet::new();
    for value in values.iter() {
        match value {
            AxisValue::Format1(v) => covered.extend(tag_of(v.axis_index())),
            AxisValue::Format2(v) => covered.extend(tag_of(v.axis_index())),
            AxisValue::Format3(v) => covered.extend(tag_of(v.axis_index())),
            AxisValue::Format4(v) => covered.extend(
                v.axis_values()
                    .iter()
                    .filter_map(|record| tag_of(record.axis_index())),
            ),
        }
    }

    let problems = font
        .fvar()?
        .axes()?
        .iter()
        .map(|axis| axis.axis_tag())
        .filter(|tag| !covered.contains(tag))
        .map(|tag| {
            Subresult::fail(
                "missing-axis-value",
                &format!("STAT table has no Axis Value table for the '{tag}' axis."),
            )
        })
        .collect();
    return_result(problems)
}
