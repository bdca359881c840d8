use fontqa_core::{prelude::*, Error};
use log::warn;
use skrifa::Tag;
use write_fonts::FontBuilder;

/// Tables left behind by font editors and hinting tools
const DEBUGGING_TABLES: &[&str] = &[
    "FFTM", "TTFA", "TSI0", "TSI1", "TSI2", "TSI3", "TSI4", "TSI5", "TSIV", "TSIP", "TSIS", "TSIB",
    "TSIJ", "TSIC",
];

pub fn check() -> Result<Check, Error> {
    Ok(Check::one(
        "no_debugging_tables",
        "Ensure fonts do not contain any pre-production tables.",
        no_debugging_tables,
    )?
    .rationale(
        "Tables such as `Debg` are useful in the pre-production stages of font \
         development, but add unnecessary bloat to a production font and should \
         be removed before release.\n\
         \n\
         Extra tags can be listed under `extra_tables` in the check's \
         configuration.",
    )
    .proposal("https://github.com/fonttools/fontbakery/issues/3357")
    .hotfix(drop_debugging_tables)
    .build())
}

fn configured_tables(context: &Context) -> Vec<String> {
    context
        .configuration
        .get("extra_tables")
        .and_then(|v| v.as_array())
        .map(|tables| {
            tables
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// The debugging tables present in the font, in the order they are looked for
fn debugging_tables(t: &Testable, context: &Context) -> Vec<(String, Tag)> {
    let candidates = DEBUGGING_TABLES
        .iter()
        .map(|s| s.to_string())
        .chain(configured_tables(context));
    let mut found = vec![];
    for candidate in candidates {
        match Tag::new_checked(candidate.as_bytes()) {
            Ok(tag) if t.has_table(tag) => found.push((candidate, tag)),
            Ok(_) => (),
            Err(e) => warn!("Ignoring configured table '{candidate}': {e}"),
        }
    }
    found
}

fn no_debugging_tables(t: &Testable, context: &Context) -> CheckFnResult {
    let found = debugging_tables(t, context);
    if found.is_empty() {
        return return_result(vec![]);
    }
    let names: Vec<_> = found.into_iter().map(|(name, _)| name).collect();
    return_result(vec![Subresult::warn(
        "has-debugging-tables",
        &format!(
            "This font file contains the following pre-production tables: {}",
            names.join(", ")
        ),
    )])
}

/// Rebuild the font from every table but the debugging ones
fn drop_debugging_tables(t: &Testable, context: &Context) -> FixFnResult {
    let unwanted: Vec<Tag> = debugging_tables(t, context)
        .into_iter()
        .map(|(_, tag)| tag)
        .collect();
    if unwanted.is_empty() {
        return Ok(None);
    }
    let font = t.font()?;
    let mut builder = FontBuilder::new();
    for record in font.table_directory.table_records() {
        let tag = record.tag();
        if unwanted.contains(&tag) {
            continue;
        }
        if let Some(data) = font.table_data(tag) {
            builder.add_raw(tag, data.as_bytes());
        }
    }
    Ok(Some(builder.build()))
}
