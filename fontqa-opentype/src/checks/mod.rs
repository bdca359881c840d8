pub mod no_debugging_tables;
pub mod opentype;

use fontqa_core::{Check, Error};

/// Every check in this crate, in registration order
pub fn all() -> Result<Vec<Check>, Error> {
    Ok(vec![
        opentype::fvar::axis_ranges_correct::check()?,
        opentype::varfont::STAT_axis_record_for_each_axis::check()?,
        opentype::varfont::family_axis_ranges::check()?,
        opentype::STAT::has_axis_value_tables::check()?,
        opentype::STAT::ital_axis::check()?,
        no_debugging_tables::check()?,
    ])
}
