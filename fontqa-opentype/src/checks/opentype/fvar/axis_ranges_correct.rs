use fontqa_core::{prelude::*, Error};
use skrifa::{MetadataProvider, Tag};

pub fn check() -> Result<Check, Error> {
    Ok(Check::one(
        "opentype/fvar/axis_ranges_correct",
        "Axes and named instances fall within correct ranges?",
        axis_ranges_correct,
    )?
    .rationale(
        "According to the OpenType spec's registered design-variation tags, \
         instances in a variable font should have certain prescribed values.\n\
         \n\
         If a variable font has a 'wght' (Weight) axis, the valid coordinate \
         range is 1-1000.\n\
         \n\
         If a variable font has a 'wdth' (Width) axis, the valid numeric range \
         is strictly greater than zero.\n\
         \n\
         If a variable font has a 'ital' (Italic) axis, its range must be 0 to 1.\n\
         \n\
         If a variable font has a 'slnt' (Slant) axis, it normally slants \
         forwards, which means negative coordinates.",
    )
    .proposal("https://github.com/fonttools/fontbakery/issues/2572")
    .condition("is_variable_font")
    .build())
}

fn axis_ranges_correct(t: &Testable, _context: &Context) -> CheckFnResult {
    let font = t.font()?;
    let axes = font.axes();
    let mut problems = vec![];

    for (i, instance) in font.named_instances().iter().enumerate() {
        let name = format!(
            "#{} (name ID {})",
            i + 1,
            instance.subfamily_name_id().to_u16()
        );
        for (axis, coordinate) in axes.iter().zip(instance.user_coords()) {
            if axis.tag() == Tag::new(b"wght") && !(1.0..=1000.0).contains(&coordinate) {
                problems.push(Subresult::fail(
                    "wght-out-of-range",
                    &format!(
                        "Instance {name} has wght coordinate of {coordinate}, expected between 1 and 1000"
                    ),
                ));
            }
            if axis.tag() == Tag::new(b"wdth") {
                if coordinate < 1.0 {
                    problems.push(Subresult::fail(
                        "wdth-out-of-range",
                        &format!(
                            "Instance {name} has wdth coordinate of {coordinate}, expected at least 1"
                        ),
                    ));
                }
                if coordinate > 1000.0 {
                    problems.push(Subresult::warn(
                        "wdth-greater-than-1000",
                        &format!(
                            "Instance {name} has wdth coordinate of {coordinate}, which is valid but unusual"
                        ),
                    ));
                }
            }
        }
    }

    if let Some(ital) = axes.iter().find(|axis| axis.tag() == Tag::new(b"ital")) {
        if !(ital.min_value() == 0.0 && ital.max_value() == 1.0) {
            problems.push(Subresult::fail(
                "invalid-ital-range",
                &format!(
                    "The range of values for the \"ital\" axis in this font is {} to {}. \
                     The italic axis range must be 0 to 1, where Roman is 0 and Italic 1. \
                     If you prefer a bigger variation range consider using the \"Slant\" \
                     axis instead of \"Italic\".",
                    ital.min_value(),
                    ital.max_value()
                ),
            ));
        }
    }

    if let Some(slnt) = axes.iter().find(|axis| axis.tag() == Tag::new(b"slnt")) {
        if !(slnt.min_value() < 0.0 && slnt.max_value() >= 0.0) {
            problems.push(Subresult::warn(
                "unusual-slnt-range",
                &format!(
                    "The range of values for the \"slnt\" axis in this font only allows \
                     positive coordinates (from {} to {}), indicating that this may be a \
                     back slanted design, which is rare. If that's not the case, then the \
                     \"slnt\" axis should be a range of negative values instead.",
                    slnt.min_value(),
                    slnt.max_value()
                ),
            ));
        }
    }
    return_result(problems)
}
