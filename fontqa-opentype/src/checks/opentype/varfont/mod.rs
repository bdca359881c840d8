#[allow(non_snake_case)]
pub mod STAT_axis_record_for_each_axis;
pub mod family_axis_ranges;
