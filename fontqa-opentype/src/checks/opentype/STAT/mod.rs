pub mod has_axis_value_tables;
pub mod ital_axis;
