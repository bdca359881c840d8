pub mod axis_ranges_correct;
