use fontqa_core::{prelude::*, Error};
use skrifa::{
    raw::{
        tables::stat::{AxisValue, AxisValueTableFlags},
        types::Fixed,
        TableProvider,
    },
    Tag,
};

const ITAL: Tag = Tag::new(b"ital");

pub fn check() -> Result<Check, Error> {
    Ok(Check::all(
        "opentype/STAT/ital_axis",
        "Ensure VFs have 'ital' STAT axis.",
        ital_axis,
    )?
    .rationale(
        "Check that related Upright and Italic VFs have an \
         'ital' axis in the STAT table.\n\
         \n\
         Since the STAT table can be used to create new instances, it is \
         important to ensure that such an 'ital' axis be the last one \
         declared in the STAT table so that the eventual naming of new \
         instances follows the subfamily traditional scheme (RIBBI / WWS) \
         where \"Italic\" is always last.\n\
         \n\
         The 'ital' axis should also be strictly boolean, only accepting \
         values of 0 (for Uprights) or 1 (for Italics). This usually works \
         as a mechanism for selecting between two linked variable font files.\n\
         \n\
         Also, the axis value name for uprights must be set as elidable.",
    )
    .proposal("https://github.com/fonttools/fontbakery/issues/2934")
    .proposal("https://github.com/fonttools/fontbakery/issues/3668")
    .proposal("https://github.com/fonttools/fontbakery/issues/3669")
    .build())
}

fn path(t: &Testable) -> String {
    t.filename().to_string_lossy().to_string()
}

/// Match each `Family-Italic[axes].ttf` with its `Family[axes].ttf`.
///
/// Unmatched fonts come back paired with None, italics first.
fn pair_up(fonts: &TestableCollection) -> Vec<(Option<&Testable>, Option<&Testable>)> {
    let (italics, mut romans): (Vec<&Testable>, Vec<&Testable>) =
        fonts.iter().partition(|t| path(t).contains("-Italic["));
    let mut pairs = Vec::new();
    for italic in italics {
        let expected_roman = path(italic).replace("-Italic[", "[");
        match romans.iter().position(|r| path(r) == expected_roman) {
            Some(index) => pairs.push((Some(romans.swap_remove(index)), Some(italic))),
            None => pairs.push((None, Some(italic))),
        }
    }
    pairs.extend(romans.into_iter().map(|roman| (Some(roman), None)));
    pairs
}

fn has_ital(t: &Testable) -> Result<Option<Subresult>, CheckError> {
    let font = t.font()?;
    let Ok(stat) = font.stat() else {
        return Ok(Some(Subresult::fail(
            "no-stat",
            &format!("Font {} has no STAT table", t.basename()),
        )));
    };
    if stat.design_axes()?.iter().any(|axis| axis.axis_tag() == ITAL) {
        return Ok(None);
    }
    Ok(Some(Subresult::fail(
        "missing-ital-axis",
        &format!("Font {} lacks an 'ital' axis in the STAT table.", t.basename()),
    )))
}

/// The 'ital' axis must come last, and its values must be 0 (roman) or 1 (italic).
fn ital_is_binary_and_last(t: &Testable, is_italic: bool) -> Result<Vec<Subresult>, CheckError> {
    let font = t.font()?;
    let Ok(stat) = font.stat() else {
        return Ok(vec![]);
    };
    let axes = stat.design_axes()?;
    let Some(ital_pos) = axes.iter().position(|axis| axis.axis_tag() == ITAL) else {
        return Ok(vec![]);
    };

    let mut problems = vec![];
    if ital_pos != axes.len() - 1 {
        problems.push(Subresult::warn(
            "ital-axis-not-last",
            &format!(
                "Font {} has 'ital' axis in position {} of {}.",
                t.basename(),
                ital_pos + 1,
                axes.len()
            ),
        ));
    }

    let (expected_value, expected_flags) = if is_italic {
        (1.0, AxisValueTableFlags::empty())
    } else {
        (0.0, AxisValueTableFlags::ELIDABLE_AXIS_VALUE_NAME)
    };
    let Some(values) = stat.offset_to_axis_values().transpose()? else {
        return Ok(problems);
    };
    for value in values.axis_values().iter() {
        let value = value?;
        // (axis index, value, linked value)
        let (axis_index, actual, linked): (u16, Fixed, Option<Fixed>) = match &value {
            AxisValue::Format1(v) => (v.axis_index(), v.value(), None),
            AxisValue::Format2(v) => (v.axis_index(), v.nominal_value(), None),
            AxisValue::Format3(v) => (v.axis_index(), v.value(), Some(v.linked_value())),
            AxisValue::Format4(_) => continue,
        };
        if axis_index as usize != ital_pos {
            continue;
        }
        if actual.to_f64() != expected_value {
            problems.push(Subresult::warn(
                "wrong-ital-axis-value",
                &format!(
                    "{} has STAT table 'ital' axis with wrong value. Expected: {}, got '{}'",
                    t.basename(),
                    expected_value,
                    actual.to_f64()
                ),
            ));
        }
        if value.flags() != expected_flags {
            problems.push(Subresult::warn(
                "wrong-ital-axis-flag",
                &format!(
                    "{} has STAT table 'ital' axis with wrong flags. Expected: {:?}, got '{:?}'",
                    t.basename(),
                    expected_flags,
                    value.flags()
                ),
            ));
        }
        if let Some(linked) = linked.filter(|_| !is_italic) {
            if linked.to_f64() != 1.0 {
                problems.push(Subresult::warn(
                    "wrong-ital-axis-linkedvalue",
                    &format!(
                        "{} has STAT table 'ital' axis with wrong linked value. Expected: 1.0, got '{}'",
                        t.basename(),
                        linked.to_f64()
                    ),
                ));
            }
        }
    }
    Ok(problems)
}

fn ital_axis(fonts: &TestableCollection, _context: &Context) -> CheckFnResult {
    let mut problems = vec![];
    for pair in pair_up(fonts) {
        match pair {
            (Some(roman), Some(italic)) => {
                problems.extend(has_ital(roman)?);
                problems.extend(has_ital(italic)?);
                problems.extend(ital_is_binary_and_last(roman, false)?);
                problems.extend(ital_is_binary_and_last(italic, true)?);
            }
            (None, Some(italic)) => problems.push(Subresult::fail(
                "missing-roman",
                &format!("Italic font {} has no matching Roman font.", italic.basename()),
            )),
            (Some(roman), None) => problems.extend(ital_is_binary_and_last(roman, false)?),
            (None, None) => {}
        }
    }
    return_result(problems)
}
