//! Named selections of checks.
//!
//! A profile lists checks in named sections, may layer itself on top of other
//! profiles, and may exclude checks, override result statuses and provide
//! default configuration. Profiles are written in code with [ProfileBuilder]
//! or loaded from yaml.

use indexmap::IndexMap;
use log::trace;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::{
    check::CheckId,
    error::Error,
    registry::Registry,
    status::{Status, Subresult},
};

/// Replace the status of results with a given code.
///
/// For vendors who disagree with how severe a particular problem is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Override {
    pub code: SmolStr,
    pub status: Status,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    /// Section name => entries; an entry is a check id or a namespace prefix
    pub sections: IndexMap<String, Vec<String>>,
    /// Profiles whose checks come before ours
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub include_profiles: Vec<String>,
    /// Check ids or prefixes removed from the result, whichever layer named them
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub exclude_checks: Vec<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub overrides: IndexMap<String, Vec<Override>>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub configuration_defaults: IndexMap<String, Map<String, Value>>,
}

impl Profile {
    pub fn from_yaml(yaml: &str) -> Result<Profile, Error> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn to_yaml(&self) -> Result<String, Error> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Builds a [Profile] in code.
#[derive(Debug, Default)]
pub struct ProfileBuilder {
    profile: Profile,
}

impl ProfileBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    /// Append entries to a section, creating it if need be
    pub fn section(mut self, name: &str, entries: &[&str]) -> Self {
        self.profile
            .sections
            .entry(name.to_string())
            .or_default()
            .extend(entries.iter().map(|e| e.to_string()));
        self
    }

    pub fn include_profile(mut self, name: &str) -> Self {
        self.profile.include_profiles.push(name.to_string());
        self
    }

    pub fn exclude_check(mut self, entry: &str) -> Self {
        self.profile.exclude_checks.push(entry.to_string());
        self
    }

    pub fn with_override(
        mut self,
        check_id: &str,
        code: &str,
        status: Status,
        reason: &str,
    ) -> Self {
        self.profile
            .overrides
            .entry(check_id.to_string())
            .or_default()
            .push(Override {
                code: code.into(),
                status,
                reason: reason.to_string(),
            });
        self
    }

    pub fn with_configuration_default(mut self, check_id: &str, key: &str, value: Value) -> Self {
        self.profile
            .configuration_defaults
            .entry(check_id.to_string())
            .or_default()
            .insert(key.to_string(), value);
        self
    }

    pub fn build(self) -> Profile {
        self.profile
    }
}

/// A profile with its layers flattened against a registry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedProfile {
    pub name: String,
    /// (section, check), deduplicated, in run order
    pub checks: Vec<(String, CheckId)>,
    overrides: IndexMap<CheckId, Vec<Override>>,
    configuration_defaults: IndexMap<CheckId, Map<String, Value>>,
}

impl ResolvedProfile {
    pub fn check_ids(&self) -> impl Iterator<Item = &CheckId> {
        self.checks.iter().map(|(_, id)| id)
    }

    pub fn contains(&self, id: &CheckId) -> bool {
        self.check_ids().any(|c| c == id)
    }

    /// Section names in the order they first appear
    pub fn section_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (section, _) in self.checks.iter() {
            if !names.contains(&section.as_str()) {
                names.push(section);
            }
        }
        names
    }

    /// Configuration the profile supplies for a check
    pub fn defaults(&self, id: &CheckId) -> Map<String, Value> {
        self.configuration_defaults
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// Rewrite the status of any subresult whose code the profile overrides.
    pub fn apply_overrides(&self, id: &CheckId, subresults: &mut [Subresult]) {
        let Some(overrides) = self.overrides.get(id) else {
            return;
        };
        for subresult in subresults.iter_mut() {
            let Some(o) = overrides.iter().find(|o| o.code == subresult.code) else {
                continue;
            };
            trace!(
                "{id}: {} {} overridden to {}",
                subresult.code,
                subresult.status,
                o.status
            );
            subresult.status = o.status;
            subresult.message = if subresult.message.is_empty() {
                format!("Overridden: {}", o.reason)
            } else {
                format!("{} (Overridden: {})", subresult.message, o.reason)
            };
        }
    }
}

/// What one layer contributes before exclusions are applied
#[derive(Default)]
struct Layer {
    checks: Vec<(String, CheckId)>,
    excluded: Vec<CheckId>,
    overrides: IndexMap<CheckId, Vec<Override>>,
    configuration_defaults: IndexMap<CheckId, Map<String, Value>>,
}

impl Layer {
    fn push(&mut self, section: &str, id: CheckId) {
        if !self.checks.iter().any(|(_, existing)| *existing == id) {
            self.checks.push((section.to_string(), id));
        }
    }

    /// Lay other on top of self
    fn absorb(&mut self, other: Layer) {
        for (section, id) in other.checks {
            self.push(&section, id);
        }
        self.excluded.extend(other.excluded);
        for (id, overrides) in other.overrides {
            self.overrides.insert(id, overrides);
        }
        for (id, defaults) in other.configuration_defaults {
            self.configuration_defaults
                .entry(id)
                .or_default()
                .extend(defaults);
        }
    }
}

impl Registry {
    /// Flatten a profile and everything it includes into an ordered check list.
    ///
    /// Included profiles resolve first, in the order listed. Our own sections
    /// are appended after them; a check already present keeps its first
    /// position. Exclusions from every layer are applied last.
    pub fn resolve_profile(&self, name: &str) -> Result<ResolvedProfile, Error> {
        let mut stack = Vec::new();
        let layer = self.resolve_layer(name, &mut stack)?;
        let Layer {
            checks,
            excluded,
            overrides,
            configuration_defaults,
        } = layer;
        let checks = checks
            .into_iter()
            .filter(|(_, id)| !excluded.iter().any(|prefix| id.is_under(prefix)))
            .collect();
        Ok(ResolvedProfile {
            name: name.to_string(),
            checks,
            overrides,
            configuration_defaults,
        })
    }

    fn resolve_layer(&self, name: &str, stack: &mut Vec<String>) -> Result<Layer, Error> {
        if stack.iter().any(|n| n == name) {
            return Err(Error::ProfileCycle(name.to_string()));
        }
        let profile = self
            .profile(name)
            .ok_or_else(|| Error::UnknownProfile(name.to_string()))?;
        stack.push(name.to_string());

        let mut layer = Layer::default();
        for included in profile.include_profiles.iter() {
            let base = self.resolve_layer(included, stack)?;
            layer.absorb(base);
        }

        let mut own = Layer::default();
        for (section, entries) in profile.sections.iter() {
            for entry in entries {
                for id in self.expand_entry(name, entry)? {
                    own.push(section, id);
                }
            }
        }
        for entry in profile.exclude_checks.iter() {
            own.excluded.push(CheckId::new(entry)?);
        }
        for (id, overrides) in profile.overrides.iter() {
            own.overrides.insert(CheckId::new(id)?, overrides.clone());
        }
        for (id, defaults) in profile.configuration_defaults.iter() {
            own.configuration_defaults
                .insert(CheckId::new(id)?, defaults.clone());
        }
        layer.absorb(own);

        stack.pop();
        Ok(layer)
    }

    /// A check id names itself, anything else must be a populated namespace prefix
    fn expand_entry(&self, profile: &str, entry: &str) -> Result<Vec<CheckId>, Error> {
        let id = CheckId::new(entry)?;
        if self.check(&id).is_some() {
            return Ok(vec![id]);
        }
        let under: Vec<CheckId> = self.checks_under(&id).cloned().collect();
        if under.is_empty() {
            return Err(Error::UnknownCheck {
                profile: profile.to_string(),
                check: entry.to_string(),
            });
        }
        Ok(under)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::{check::Check, registry::RegistryBuilder, status::return_result};

    fn builder_with_checks(ids: &[&str]) -> RegistryBuilder {
        let mut builder = RegistryBuilder::new();
        for id in ids {
            builder
                .register_check(
                    Check::one(id, id, |_, _| return_result(vec![]))
                        .unwrap()
                        .build(),
                )
                .unwrap();
        }
        builder
    }

    fn ids(resolved: &ResolvedProfile) -> Vec<String> {
        resolved.check_ids().map(|c| c.to_string()).collect()
    }

    const CHECKS: &[&str] = &[
        "opentype/STAT/ital_axis",
        "opentype/STAT/has_axis_value_tables",
        "opentype/fvar/axis_ranges_correct",
        "no_debugging_tables",
    ];

    #[test]
    fn parse_yaml_profile() {
        let profile = Profile::from_yaml(
            r#"
            sections:
              STAT:
                - opentype/STAT/ital_axis
            include_profiles: [base]
            exclude_checks: [opentype/fvar]
            overrides:
              opentype/STAT/ital_axis:
                - code: missing-roman
                  status: WARN
                  reason: We ship italics alone
            configuration_defaults:
              no_debugging_tables:
                extra_tables: [TSID]
            "#,
        )
        .unwrap();
        assert_eq!(vec!["base"], profile.include_profiles);
        assert_eq!(
            Status::Warn,
            profile.overrides["opentype/STAT/ital_axis"][0].status
        );
        assert_eq!(
            json!(["TSID"]),
            profile.configuration_defaults["no_debugging_tables"]["extra_tables"]
        );
        assert_eq!(profile, Profile::from_yaml(&profile.to_yaml().unwrap()).unwrap());
    }

    #[test]
    fn bad_yaml_is_a_parse_error() {
        assert!(matches!(
            Profile::from_yaml("sections: 7"),
            Err(Error::ProfileParse(..))
        ));
    }

    #[test]
    fn layers_resolve_base_first() {
        let mut builder = builder_with_checks(CHECKS);
        builder
            .register_profile(
                "base",
                ProfileBuilder::new()
                    .section("STAT", &["opentype/STAT/ital_axis"])
                    .section("fvar", &["opentype/fvar/axis_ranges_correct"])
                    .build(),
            )
            .unwrap();
        builder
            .register_profile(
                "top",
                ProfileBuilder::new()
                    .include_profile("base")
                    .section("Universal", &["no_debugging_tables"])
                    .section("STAT again", &["opentype/STAT/ital_axis"])
                    .build(),
            )
            .unwrap();
        let registry = builder.build().unwrap();
        let resolved = registry.resolve_profile("top").unwrap();
        assert_eq!(
            vec![
                "opentype/STAT/ital_axis",
                "opentype/fvar/axis_ranges_correct",
                "no_debugging_tables"
            ],
            ids(&resolved)
        );
        assert_eq!(vec!["STAT", "fvar", "Universal"], resolved.section_names());
    }

    #[test]
    fn namespace_prefix_includes_everything_under_it() {
        let mut builder = builder_with_checks(CHECKS);
        builder
            .register_profile(
                "stat",
                ProfileBuilder::new().section("STAT", &["opentype/STAT"]).build(),
            )
            .unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(
            vec![
                "opentype/STAT/ital_axis",
                "opentype/STAT/has_axis_value_tables"
            ],
            ids(&registry.resolve_profile("stat").unwrap())
        );
    }

    #[test]
    fn exclusion_from_any_layer_wins() {
        let mut builder = builder_with_checks(CHECKS);
        builder
            .register_profile(
                "base",
                ProfileBuilder::new()
                    .section("All", &["opentype"])
                    .exclude_check("opentype/fvar")
                    .build(),
            )
            .unwrap();
        builder
            .register_profile(
                "top",
                ProfileBuilder::new()
                    .include_profile("base")
                    .section("Again", &["opentype/fvar/axis_ranges_correct"])
                    .exclude_check("opentype/STAT/ital_axis")
                    .build(),
            )
            .unwrap();
        let registry = builder.build().unwrap();
        assert_eq!(
            vec!["opentype/STAT/has_axis_value_tables"],
            ids(&registry.resolve_profile("top").unwrap())
        );
    }

    #[test]
    fn include_cycle_is_an_error() {
        let mut builder = builder_with_checks(CHECKS);
        builder
            .register_profile("a", ProfileBuilder::new().include_profile("b").build())
            .unwrap();
        builder
            .register_profile("b", ProfileBuilder::new().include_profile("a").build())
            .unwrap();
        assert!(matches!(builder.build(), Err(Error::ProfileCycle(..))));
    }

    #[test]
    fn unknown_references_are_errors() {
        let mut builder = builder_with_checks(CHECKS);
        builder
            .register_profile(
                "a",
                ProfileBuilder::new().include_profile("nonesuch").build(),
            )
            .unwrap();
        assert!(matches!(builder.build(), Err(Error::UnknownProfile(p)) if p == "nonesuch"));

        let mut builder = builder_with_checks(CHECKS);
        builder
            .register_profile(
                "a",
                ProfileBuilder::new().section("S", &["opentype/nope"]).build(),
            )
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(Error::UnknownCheck { check, .. }) if check == "opentype/nope"
        ));
    }

    #[test]
    fn overrides_and_defaults_follow_the_top_layer() {
        let mut builder = builder_with_checks(CHECKS);
        builder
            .register_profile(
                "base",
                ProfileBuilder::new()
                    .section("STAT", &["opentype/STAT/ital_axis"])
                    .with_configuration_default("opentype/STAT/ital_axis", "a", json!(1))
                    .with_configuration_default("opentype/STAT/ital_axis", "b", json!(1))
                    .build(),
            )
            .unwrap();
        builder
            .register_profile(
                "top",
                ProfileBuilder::new()
                    .include_profile("base")
                    .with_configuration_default("opentype/STAT/ital_axis", "b", json!(2))
                    .with_override(
                        "opentype/STAT/ital_axis",
                        "missing-roman",
                        Status::Warn,
                        "italic-only families are fine here",
                    )
                    .build(),
            )
            .unwrap();
        let registry = builder.build().unwrap();
        let resolved = registry.resolve_profile("top").unwrap();
        let id = CheckId::new("opentype/STAT/ital_axis").unwrap();

        let defaults = resolved.defaults(&id);
        assert_eq!(Some(&json!(1)), defaults.get("a"));
        assert_eq!(Some(&json!(2)), defaults.get("b"));

        let mut subresults = vec![
            Subresult::fail("missing-roman", "No roman"),
            Subresult::fail("missing-ital-axis", "No ital"),
        ];
        resolved.apply_overrides(&id, &mut subresults);
        assert_eq!(
            vec![
                Subresult::warn(
                    "missing-roman",
                    "No roman (Overridden: italic-only families are fine here)"
                ),
                Subresult::fail("missing-ital-axis", "No ital"),
            ],
            subresults
        );
    }
}
