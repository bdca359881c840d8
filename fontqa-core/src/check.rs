//! Identifiers, metadata and bodies of checks.

use std::{
    fmt::{Debug, Display},
    str::FromStr,
    sync::Arc,
};

use bitflags::bitflags;
use glob_match::glob_match;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use smol_str::SmolStr;

use crate::{
    condition::ConditionRef,
    error::Error,
    status::{CheckFnResult, FixFnResult},
    testable::{Arity, Testable, TestableCollection},
};

/// A `/`-separated hierarchical check identifier, e.g. `opentype/STAT/ital_axis`.
///
/// Every segment but the last names a group, the last names the check.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CheckId(Vec<SmolStr>);

impl CheckId {
    pub fn new(id: &str) -> Result<CheckId, Error> {
        let segments: Vec<SmolStr> = id.split('/').map(SmolStr::new).collect();
        let valid_segment = |s: &SmolStr| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        };
        if !segments.iter().all(valid_segment) {
            return Err(Error::InvalidCheckId(id.to_string()));
        }
        Ok(CheckId(segments))
    }

    pub fn segments(&self) -> &[SmolStr] {
        &self.0
    }

    /// The name of the check itself, without its groups
    pub fn leaf(&self) -> &str {
        // construction guarantees at least one segment
        self.0.last().map(|s| s.as_str()).unwrap_or_default()
    }

    /// The groups this check lives in, outermost first
    pub fn groups(&self) -> &[SmolStr] {
        &self.0[..self.0.len() - 1]
    }

    /// True if self is prefix or lives somewhere underneath it
    pub fn is_under(&self, prefix: &CheckId) -> bool {
        self.0.starts_with(&prefix.0)
    }

    /// The nested module path this check's code lives at.
    ///
    /// One module per segment, sanitized to a valid Rust identifier.
    pub fn module_path(&self) -> Vec<String> {
        self.0.iter().map(|s| module_name(s)).collect()
    }
}

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "break", "const", "continue", "crate", "dyn", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "true", "type", "unsafe", "use",
    "where", "while",
];

/// Make a path segment usable as a module name.
pub fn module_name(segment: &str) -> String {
    let mut name: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if RUST_KEYWORDS.contains(&name.as_str()) {
        name.push('_');
    }
    name
}

impl FromStr for CheckId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CheckId::new(s)
    }
}

impl TryFrom<String> for CheckId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CheckId::new(&value)
    }
}

impl From<CheckId> for String {
    fn from(value: CheckId) -> Self {
        value.to_string()
    }
}

impl Display for CheckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl Debug for CheckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct CheckFlags: u32 {
        /// Not run unless explicitly asked for
        const EXPERIMENTAL = 0b0001;
    }
}

/// Per-invocation information handed to a check body.
#[derive(Debug, Clone, Default)]
pub struct Context {
    /// Check specific settings, profile defaults overlaid with user configuration
    pub configuration: Map<String, Value>,
    /// Report every item rather than truncating long lists
    pub full_lists: bool,
}

pub type CheckOneFn = dyn Fn(&Testable, &Context) -> CheckFnResult + Send + Sync;
pub type CheckAllFn = dyn Fn(&TestableCollection, &Context) -> CheckFnResult + Send + Sync;
/// Repairs what a check complained about in one font.
pub type HotfixFn = dyn Fn(&Testable, &Context) -> FixFnResult + Send + Sync;

/// The body of a check, for one font or for a whole family.
#[derive(Clone)]
pub enum CheckImplementation {
    One(Arc<CheckOneFn>),
    All(Arc<CheckAllFn>),
}

impl CheckImplementation {
    pub fn arity(&self) -> Arity {
        match self {
            CheckImplementation::One(..) => Arity::Single,
            CheckImplementation::All(..) => Arity::Collection,
        }
    }
}

/// A self-describing validation rule.
#[derive(Clone)]
pub struct Check {
    pub id: CheckId,
    pub title: String,
    pub rationale: String,
    pub proposal: Vec<String>,
    /// Conditions that must hold, in the order they are evaluated
    pub conditions: Vec<ConditionRef>,
    /// Glob on the file basename deciding which files this check looks at
    pub applies_to: String,
    pub flags: CheckFlags,
    pub implementation: CheckImplementation,
    /// Rewrites a font so it no longer fails; only single-font checks have one
    pub hotfix: Option<Arc<HotfixFn>>,
}

impl Check {
    /// Start describing a check that looks at one font at a time.
    pub fn one<F>(id: &str, title: &str, body: F) -> Result<CheckBuilder, Error>
    where
        F: Fn(&Testable, &Context) -> CheckFnResult + Send + Sync + 'static,
    {
        CheckBuilder::new(id, title, CheckImplementation::One(Arc::new(body)))
    }

    /// Start describing a check that looks at a whole family at once.
    pub fn all<F>(id: &str, title: &str, body: F) -> Result<CheckBuilder, Error>
    where
        F: Fn(&TestableCollection, &Context) -> CheckFnResult + Send + Sync + 'static,
    {
        CheckBuilder::new(id, title, CheckImplementation::All(Arc::new(body)))
    }

    pub fn runs_on_collection(&self) -> bool {
        matches!(self.implementation, CheckImplementation::All(..))
    }

    pub fn arity(&self) -> Arity {
        self.implementation.arity()
    }

    pub fn has_hotfix(&self) -> bool {
        self.hotfix.is_some()
    }

    pub fn is_experimental(&self) -> bool {
        self.flags.contains(CheckFlags::EXPERIMENTAL)
    }

    /// Does this check want to look at the given file?
    pub fn applies(&self, testable: &Testable) -> bool {
        glob_match(&self.applies_to, &testable.basename())
    }
}

impl Debug for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Check")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("conditions", &self.conditions)
            .field("arity", &self.arity())
            .field("hotfix", &self.has_hotfix())
            .finish()
    }
}

/// Assembles a [Check]
pub struct CheckBuilder {
    check: Check,
}

impl CheckBuilder {
    fn new(id: &str, title: &str, implementation: CheckImplementation) -> Result<Self, Error> {
        Ok(CheckBuilder {
            check: Check {
                id: CheckId::new(id)?,
                title: title.to_string(),
                rationale: String::new(),
                proposal: Vec::new(),
                conditions: Vec::new(),
                applies_to: DEFAULT_APPLIES_TO.to_string(),
                flags: CheckFlags::default(),
                implementation,
                hotfix: None,
            },
        })
    }

    pub fn rationale(mut self, rationale: &str) -> Self {
        self.check.rationale = rationale.to_string();
        self
    }

    pub fn proposal(mut self, proposal: &str) -> Self {
        self.check.proposal.push(proposal.to_string());
        self
    }

    /// Require a condition, `not <name>` requires that it does not hold.
    pub fn condition(mut self, requirement: &str) -> Self {
        self.check.conditions.push(ConditionRef::parse(requirement));
        self
    }

    pub fn applies_to(mut self, pattern: &str) -> Self {
        self.check.applies_to = pattern.to_string();
        self
    }

    /// A repair for fonts this check fails on
    pub fn hotfix<F>(mut self, fix: F) -> Self
    where
        F: Fn(&Testable, &Context) -> FixFnResult + Send + Sync + 'static,
    {
        self.check.hotfix = Some(Arc::new(fix));
        self
    }

    pub fn experimental(mut self) -> Self {
        self.check.flags |= CheckFlags::EXPERIMENTAL;
        self
    }

    pub fn build(self) -> Check {
        self.check
    }
}

const DEFAULT_APPLIES_TO: &str = "*.{ttf,otf}";

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{codetesting::TestFontBuilder, status::return_result};

    #[test]
    fn check_id_segments() {
        let id = CheckId::new("opentype/STAT/ital_axis").unwrap();
        assert_eq!("ital_axis", id.leaf());
        assert_eq!(
            vec!["opentype", "STAT"],
            id.groups().iter().map(|s| s.as_str()).collect::<Vec<_>>()
        );
        assert_eq!("opentype/STAT/ital_axis", id.to_string());
        assert!(id.is_under(&CheckId::new("opentype/STAT").unwrap()));
        assert!(id.is_under(&id));
        assert!(!id.is_under(&CheckId::new("opentype/ST").unwrap()));
    }

    #[rstest]
    #[case("")]
    #[case("opentype//ital_axis")]
    #[case("/leading")]
    #[case("trailing/")]
    #[case("has space")]
    fn bad_check_ids(#[case] id: &str) {
        assert!(matches!(CheckId::new(id), Err(Error::InvalidCheckId(..))));
    }

    #[test]
    fn check_id_yaml_is_a_string() {
        let id = CheckId::new("opentype/fvar/axis_ranges_correct").unwrap();
        let yml = serde_yaml::to_string(&id).unwrap();
        assert_eq!("opentype/fvar/axis_ranges_correct", yml.trim());
        assert_eq!(id, serde_yaml::from_str::<CheckId>(&yml).unwrap());
    }

    #[rstest]
    #[case("opentype/STAT/ital_axis", &["opentype", "STAT", "ital_axis"])]
    #[case("googlefonts/name/type", &["googlefonts", "name", "type_"])]
    #[case("opentype/2nd-pass", &["opentype", "_2nd_pass"])]
    fn module_paths(#[case] id: &str, #[case] expected: &[&str]) {
        assert_eq!(expected, CheckId::new(id).unwrap().module_path());
    }

    #[rstest]
    #[case("*.{ttf,otf}", "Foo-Regular.ttf", true)]
    #[case("*.{ttf,otf}", "Foo-Regular.otf", true)]
    #[case("*.{ttf,otf}", "Foo-Regular.OTF", false)]
    #[case("*.{ttf,otf}", "METADATA.pb", false)]
    #[case("*.ttf", "Foo[wght].ttf", true)]
    #[case("*.ttf", "Fönt-Régular.ttf", true)]
    #[case("Foo-?.ttf", "Foo-B.ttf", true)]
    #[case("Foo-?.ttf", "Foo-Bold.ttf", false)]
    #[case("*-{Bold,{Light,Thin}Italic}.ttf", "Foo-ThinItalic.ttf", true)]
    #[case("*-{Bold,{Light,Thin}Italic}.ttf", "Foo-BoldItalic.ttf", false)]
    fn applies_to_matching_basenames(
        #[case] pattern: &str,
        #[case] filename: &str,
        #[case] expected: bool,
    ) {
        let check = Check::one("a/b", "A check", |_, _| return_result(vec![]))
            .unwrap()
            .applies_to(pattern)
            .build();
        let font = TestFontBuilder::new(&format!("some/dir/{filename}")).build();
        assert_eq!(expected, check.applies(&font), "{pattern} vs {filename}");
    }

    #[test]
    fn default_applies_to_fonts() {
        let check = Check::one("a/b", "A check", |_, _| return_result(vec![]))
            .unwrap()
            .build();
        assert!(check.applies(&TestFontBuilder::new("Foo.ttf").build()));
        assert!(check.applies(&TestFontBuilder::new("Foo.otf").build()));
        assert!(!check.applies(&TestFontBuilder::new("Foo.woff2").build()));
    }

    #[test]
    fn builder_collects_metadata() {
        let check = Check::all("opentype/family/thing", "Family thing", |_, _| {
            return_result(vec![])
        })
        .unwrap()
        .proposal("https://example.com/1")
        .proposal("https://example.com/2")
        .condition("is_variable_font")
        .condition("not is_cff")
        .experimental()
        .build();
        assert!(check.runs_on_collection());
        assert!(check.is_experimental());
        assert_eq!(2, check.proposal.len());
        assert_eq!(
            vec!["is_variable_font", "not is_cff"],
            check
                .conditions
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
        );
    }
}
