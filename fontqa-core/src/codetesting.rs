//! Support for testing checks: synthetic fonts, a harness and assertions.
//!
//! Everything here panics rather than returning errors; it is meant to be
//! called from tests.

use skrifa::Tag;
use write_fonts::{
    dump_table,
    tables::{
        fvar::{AxisInstanceArrays, Fvar, InstanceRecord, VariationAxisRecord},
        stat::{AxisRecord, AxisValue, AxisValueTableFlags, Stat},
    },
    types::{Fixed, NameId},
    FontBuilder, NullableOffsetMarker, OffsetMarker,
};

use crate::{
    check::{CheckId, Context},
    coverage::CoverageTracker,
    profile::ResolvedProfile,
    registry::Registry,
    runner::Runner,
    status::{worst_status, Status, Subresult},
    testable::{Testable, TestableCollection, TestableType},
};

/// A version 3 post table, the smallest table that makes a parseable font
const POST_V3: [u8; 32] = [
    0x00, 0x03, 0x00, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0,
    0, 0, 0, 0,
];

fn tag(tag: &str) -> Tag {
    Tag::new_checked(tag.as_bytes()).unwrap_or_else(|e| panic!("bad tag '{tag}': {e}"))
}

#[derive(Debug, Clone)]
enum StatValue {
    Format1 {
        axis: Tag,
        value: f64,
    },
    Format2 {
        axis: Tag,
        nominal: f64,
        min: f64,
        max: f64,
    },
    Format3 {
        axis: Tag,
        value: f64,
        linked: f64,
    },
}

#[derive(Debug, Clone, Default)]
struct StatSpec {
    axes: Vec<Tag>,
    values: Vec<(StatValue, bool)>,
}

/// Assembles a minimal font in memory.
///
/// Fonts with axes get an fvar and, unless told otherwise, a STAT whose
/// design axes mirror the fvar axes.
#[derive(Debug, Clone)]
pub struct TestFontBuilder {
    filename: String,
    axes: Vec<(Tag, f64, f64, f64)>,
    instances: Vec<Vec<f64>>,
    stat: Option<StatSpec>,
    explicit_stat: bool,
    raw: Vec<(Tag, Vec<u8>)>,
}

impl TestFontBuilder {
    pub fn new(filename: &str) -> Self {
        TestFontBuilder {
            filename: filename.to_string(),
            axes: Vec::new(),
            instances: Vec::new(),
            stat: None,
            explicit_stat: false,
            raw: Vec::new(),
        }
    }

    /// Add a variation axis
    pub fn axis(mut self, axis: &str, min: f64, default: f64, max: f64) -> Self {
        self.axes.push((tag(axis), min, default, max));
        self
    }

    /// Add a named instance, one coordinate per axis in the order they were added
    pub fn instance(mut self, coordinates: &[f64]) -> Self {
        self.instances.push(coordinates.to_vec());
        self
    }

    /// Give the STAT table exactly these design axes, in this order
    pub fn stat_axes(mut self, axes: &[&str]) -> Self {
        let stat = self.explicit_stat();
        stat.axes = axes.iter().map(|a| tag(a)).collect();
        self
    }

    /// A format 1 axis value
    pub fn stat_value(mut self, axis: &str, value: f64, elidable: bool) -> Self {
        let axis = tag(axis);
        self.explicit_stat()
            .values
            .push((StatValue::Format1 { axis, value }, elidable));
        self
    }

    /// A format 2 axis value
    pub fn stat_range_value(
        mut self,
        axis: &str,
        nominal: f64,
        min: f64,
        max: f64,
        elidable: bool,
    ) -> Self {
        let axis = tag(axis);
        self.explicit_stat().values.push((
            StatValue::Format2 {
                axis,
                nominal,
                min,
                max,
            },
            elidable,
        ));
        self
    }

    /// A format 3 axis value
    pub fn stat_linked_value(
        mut self,
        axis: &str,
        value: f64,
        linked: f64,
        elidable: bool,
    ) -> Self {
        let axis = tag(axis);
        self.explicit_stat()
            .values
            .push((StatValue::Format3 { axis, value, linked }, elidable));
        self
    }

    /// Leave out the STAT table even if the font has axes
    pub fn without_stat(mut self) -> Self {
        self.explicit_stat = true;
        self.stat = None;
        self
    }

    /// Add a table with arbitrary contents
    pub fn table(mut self, table: &str, data: &[u8]) -> Self {
        self.raw.push((tag(table), data.to_vec()));
        self
    }

    fn explicit_stat(&mut self) -> &mut StatSpec {
        self.explicit_stat = true;
        self.stat.get_or_insert_with(Default::default)
    }

    fn fvar(&self) -> Fvar {
        let axes = self
            .axes
            .iter()
            .enumerate()
            .map(|(i, (axis_tag, min, default, max))| VariationAxisRecord {
                axis_tag: *axis_tag,
                min_value: Fixed::from_f64(*min),
                default_value: Fixed::from_f64(*default),
                max_value: Fixed::from_f64(*max),
                axis_name_id: NameId::new(256 + i as u16),
                ..Default::default()
            })
            .collect();
        let instances = self
            .instances
            .iter()
            .enumerate()
            .map(|(i, coordinates)| InstanceRecord {
                subfamily_name_id: NameId::new(400 + i as u16),
                coordinates: coordinates.iter().map(|c| Fixed::from_f64(*c)).collect(),
                ..Default::default()
            })
            .collect();
        Fvar::new(AxisInstanceArrays::new(axes, instances))
    }

    fn stat_table(spec: &StatSpec) -> Stat {
        let axis_index = |axis: &Tag| {
            spec.axes
                .iter()
                .position(|a| a == axis)
                .unwrap_or_else(|| panic!("axis value for {axis} which is not a STAT axis"))
                as u16
        };
        let values: Vec<OffsetMarker<AxisValue>> = spec
            .values
            .iter()
            .enumerate()
            .map(|(i, (value, elidable))| {
                let flags = if *elidable {
                    AxisValueTableFlags::ELIDABLE_AXIS_VALUE_NAME
                } else {
                    AxisValueTableFlags::empty()
                };
                let name = NameId::new(300 + i as u16);
                let value = match value {
                    StatValue::Format1 { axis, value } => {
                        AxisValue::format_1(axis_index(axis), flags, name, Fixed::from_f64(*value))
                    }
                    StatValue::Format2 {
                        axis,
                        nominal,
                        min,
                        max,
                    } => AxisValue::format_2(
                        axis_index(axis),
                        flags,
                        name,
                        Fixed::from_f64(*nominal),
                        Fixed::from_f64(*min),
                        Fixed::from_f64(*max),
                    ),
                    StatValue::Format3 {
                        axis,
                        value,
                        linked,
                    } => AxisValue::format_3(
                        axis_index(axis),
                        flags,
                        name,
                        Fixed::from_f64(*value),
                        Fixed::from_f64(*linked),
                    ),
                };
                OffsetMarker::new(value)
            })
            .collect();
        Stat {
            design_axes: spec
                .axes
                .iter()
                .enumerate()
                .map(|(i, axis_tag)| AxisRecord {
                    axis_tag: *axis_tag,
                    axis_name_id: NameId::new(256 + i as u16),
                    axis_ordering: i as u16,
                })
                .collect::<Vec<_>>()
                .into(),
            offset_to_axis_values: NullableOffsetMarker::new(
                (!values.is_empty()).then_some(values),
            ),
            elided_fallback_name_id: Some(NameId::SUBFAMILY_NAME),
            ..Default::default()
        }
    }

    pub fn build_bytes(&self) -> Vec<u8> {
        let mut builder = FontBuilder::default();
        builder.add_raw(Tag::new(b"post"), POST_V3.to_vec());
        if !self.axes.is_empty() {
            builder.add_raw(Tag::new(b"fvar"), dump_table(&self.fvar()).unwrap());
        }
        let implicit_stat = (!self.explicit_stat && !self.axes.is_empty()).then(|| StatSpec {
            axes: self.axes.iter().map(|(t, ..)| *t).collect(),
            values: Vec::new(),
        });
        if let Some(spec) = self.stat.as_ref().or(implicit_stat.as_ref()) {
            builder.add_raw(
                Tag::new(b"STAT"),
                dump_table(&Self::stat_table(spec)).unwrap(),
            );
        }
        for (tag, data) in self.raw.iter() {
            builder.add_raw(*tag, data.clone());
        }
        builder.build()
    }

    pub fn build(&self) -> Testable {
        Testable::from_bytes(&self.filename, self.build_bytes()).unwrap()
    }
}

/// Runs checks by id, recording each id it is asked about.
pub struct CheckTester<'a> {
    registry: &'a Registry,
    tracker: Option<&'a CoverageTracker>,
    profile: Option<ResolvedProfile>,
    context: Context,
}

impl<'a> CheckTester<'a> {
    pub fn new(registry: &'a Registry) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        CheckTester {
            registry,
            tracker: None,
            profile: None,
            context: Context::default(),
        }
    }

    pub fn with_tracker(mut self, tracker: &'a CoverageTracker) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Use a profile's configuration defaults and status overrides
    pub fn with_profile(mut self, name: &str) -> Self {
        self.profile = Some(self.registry.resolve_profile(name).unwrap());
        self
    }

    pub fn with_context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }

    pub fn run(&self, id: &str, target: TestableType<'_>) -> Vec<Subresult> {
        let id = CheckId::new(id).unwrap();
        if let Some(tracker) = self.tracker {
            tracker.record(&id);
        }
        let check = self
            .registry
            .check(&id)
            .unwrap_or_else(|| panic!("no check {id}"));
        let mut context = self.context.clone();
        if let Some(profile) = &self.profile {
            let mut configuration = profile.defaults(&id);
            configuration.extend(context.configuration);
            context.configuration = configuration;
        }
        let mut subresults = Runner::new(self.registry)
            .run(check, target, &context)
            .unwrap();
        if let Some(profile) = &self.profile {
            profile.apply_overrides(&id, &mut subresults);
        }
        subresults
    }

    pub fn run_font(&self, id: &str, font: &Testable) -> Vec<Subresult> {
        self.run(id, TestableType::Single(font))
    }

    pub fn run_family(&self, id: &str, fonts: Vec<Testable>) -> Vec<Subresult> {
        self.run(id, TestableType::Collection(&TestableCollection::new(fonts)))
    }
}

pub fn assert_pass(subresults: &[Subresult]) {
    assert_eq!(
        Status::Pass,
        worst_status(subresults),
        "expected a pass, got {subresults:#?}"
    );
}

/// Assert some subresult has the status and code; returns the first such
pub fn assert_results_contain<'a>(
    subresults: &'a [Subresult],
    status: Status,
    code: &str,
) -> &'a Subresult {
    subresults
        .iter()
        .find(|s| s.status == status && s.code == code)
        .unwrap_or_else(|| panic!("no {status} [{code}] in {subresults:#?}"))
}

/// Assert there is exactly one subresult and it has the status and code
pub fn assert_only<'a>(subresults: &'a [Subresult], status: Status, code: &str) -> &'a Subresult {
    assert_eq!(1, subresults.len(), "expected one result, got {subresults:#?}");
    assert_results_contain(subresults, status, code)
}

#[cfg(test)]
mod tests {
    use skrifa::raw::{tables::stat::AxisValue, TableProvider};

    use super::*;

    #[test]
    fn variable_font_gets_matching_stat() {
        let font = TestFontBuilder::new("Family[wdth,wght].ttf")
            .axis("wdth", 75.0, 100.0, 100.0)
            .axis("wght", 100.0, 400.0, 900.0)
            .build();
        let font = font.font().unwrap();
        let fvar_tags: Vec<Tag> = font
            .fvar()
            .unwrap()
            .axes()
            .unwrap()
            .iter()
            .map(|a| a.axis_tag())
            .collect();
        let stat_tags: Vec<Tag> = font
            .stat()
            .unwrap()
            .design_axes()
            .unwrap()
            .iter()
            .map(|a| a.axis_tag())
            .collect();
        assert_eq!(vec![Tag::new(b"wdth"), Tag::new(b"wght")], fvar_tags);
        assert_eq!(fvar_tags, stat_tags);
    }

    #[test]
    fn explicit_stat_values() {
        let font = TestFontBuilder::new("Family[wght].ttf")
            .axis("wght", 100.0, 400.0, 900.0)
            .stat_axes(&["wght", "ital"])
            .stat_linked_value("ital", 0.0, 1.0, true)
            .build();
        let font = font.font().unwrap();
        let stat = font.stat().unwrap();
        let values = stat.offset_to_axis_values().unwrap().unwrap();
        let values: Vec<_> = values.axis_values().iter().flatten().collect();
        assert_eq!(1, values.len());
        let AxisValue::Format3(v) = &values[0] else {
            panic!("wrong format");
        };
        assert_eq!(1, v.axis_index());
        assert_eq!(1.0, v.linked_value().to_f64());
    }

    #[test]
    fn without_stat_drops_the_table() {
        let font = TestFontBuilder::new("Family[wght].ttf")
            .axis("wght", 100.0, 400.0, 900.0)
            .without_stat()
            .build();
        assert!(font.is_variable_font());
        assert!(!font.has_table(Tag::new(b"STAT")));
    }

    #[test]
    fn raw_tables() {
        let font = TestFontBuilder::new("Family-Regular.ttf")
            .table("FFTM", &[0; 28])
            .build();
        assert!(font.has_table(Tag::new(b"FFTM")));
        assert!(!font.is_variable_font());
    }

    #[test]
    #[should_panic(expected = "no FAIL [nope]")]
    fn missing_result_panics() {
        assert_results_contain(&[Subresult::pass()], Status::Fail, "nope");
    }
}
