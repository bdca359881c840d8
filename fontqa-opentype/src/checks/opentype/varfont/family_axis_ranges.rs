use fontqa_core::{prelude::*, Error};
use indexmap::IndexMap;
use skrifa::raw::TableProvider;

pub fn check() -> Result<Check, Error> {
    Ok(Check::all(
        "opentype/varfont/family_axis_ranges",
        "Check that family axis ranges are identical",
        family_axis_ranges,
    )?
    .rationale(
        "Between members of a family (such as Roman & Italic), \
         the ranges of variable axes must be identical.",
    )
    .proposal("https://github.com/fonttools/fontbakery/issues/4445")
    .build())
}

/// `wght=100.00:400.00:900.00, ...` in fvar order
fn axis_ranges(t: &Testable) -> Result<String, CheckError> {
    let font = t.font()?;
    let ranges: Vec<String> = font
        .fvar()?
        .axes()?
        .iter()
        .map(|axis| {
            format!(
                "{}={:.2}:{:.2}:{:.2}",
                axis.axis_tag(),
                axis.min_value().to_f64(),
                axis.default_value().to_f64(),
                axis.max_value().to_f64()
            )
        })
        .collect();
    Ok(ranges.join(", "))
}

fn family_axis_ranges(fonts: &TestableCollection, context: &Context) -> CheckFnResult {
    let variable: Vec<&Testable> = fonts.iter().filter(|t| t.is_variable_font()).collect();
    skip!(
        variable.len() < 2,
        "not-enough-fonts",
        "Not enough variable fonts to compare"
    );

    // ranges => the fonts that have them
    let mut groups: IndexMap<String, Vec<String>> = IndexMap::new();
    for t in variable {
        groups.entry(axis_ranges(t)?).or_default().push(t.basename());
    }
    if groups.len() == 1 {
        return return_result(vec![]);
    }
    let items: Vec<String> = groups
        .iter()
        .map(|(ranges, files)| format!("{}: {ranges}", files.join(", ")))
        .collect();
    return_result(vec![Subresult::fail(
        "axis-range-mismatch",
        &format!(
            "Variable axis ranges not matching between font files:\n\n{}",
            bullet_list(context, &items)
        ),
    )])
}
