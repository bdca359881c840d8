use fontqa_core::{Error, Profile, ProfileBuilder};

pub(crate) fn opentype() -> Profile {
    ProfileBuilder::new()
        .section(
            "OpenType Specification Checks",
            &[
                "opentype/fvar/axis_ranges_correct",
                "opentype/varfont/STAT_axis_record_for_each_axis",
                "opentype/varfont/family_axis_ranges",
            ],
        )
        .section("OpenType STAT table", &["opentype/STAT"])
        .build()
}

pub(crate) fn universal() -> Result<Profile, Error> {
    Profile::from_yaml(include_str!("../profiles/universal.yaml"))
}
