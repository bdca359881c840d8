//! The catalogue of checks, conditions and profiles.
//!
//! Built once at startup through a [RegistryBuilder], then frozen into an
//! immutable [Registry] that is shared freely between threads.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use indexmap::IndexMap;
use log::{debug, trace};
use smol_str::SmolStr;

use crate::{
    check::{Check, CheckId},
    condition::Condition,
    error::Error,
    profile::Profile,
    testable::Arity,
};

/// Something that contributes checks, conditions and profiles.
pub trait Plugin {
    fn register(&self, registry: &mut RegistryBuilder) -> Result<(), Error>;
}

/// One level of the check namespace.
///
/// A node may name a check, hold children, or both.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Namespace {
    pub check: Option<CheckId>,
    pub children: BTreeMap<SmolStr, Namespace>,
}

impl Namespace {
    /// Walk to the node at `path`, creating any missing levels on the way.
    ///
    /// Calling this again with the same (or a longer) path reuses the nodes
    /// created the first time.
    pub fn ensure(&mut self, path: &[SmolStr]) -> &mut Namespace {
        let mut node = self;
        for segment in path {
            node = node.children.entry(segment.clone()).or_default();
        }
        node
    }

    pub fn get(&self, path: &[SmolStr]) -> Option<&Namespace> {
        let mut node = self;
        for segment in path {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    /// Every check at or below this node, in namespace order
    pub fn check_ids(&self) -> Vec<&CheckId> {
        let mut ids = Vec::new();
        self.collect(&mut ids);
        ids
    }

    fn collect<'a>(&'a self, ids: &mut Vec<&'a CheckId>) {
        ids.extend(self.check.iter());
        for child in self.children.values() {
            child.collect(ids);
        }
    }
}

/// The append-only phase of a registry.
#[derive(Default)]
pub struct RegistryBuilder {
    checks: IndexMap<CheckId, Arc<Check>>,
    conditions: HashMap<SmolStr, Condition>,
    profiles: IndexMap<String, Profile>,
    namespace: Namespace,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn register_check(&mut self, check: Check) -> Result<(), Error> {
        if self.checks.contains_key(&check.id) {
            return Err(Error::DuplicateCheck(check.id));
        }
        if check.has_hotfix() && check.runs_on_collection() {
            return Err(Error::FamilyHotfix(check.id));
        }
        trace!("Register check {}", check.id);
        let node = self.namespace.ensure(check.id.segments());
        node.check = Some(check.id.clone());
        self.checks.insert(check.id.clone(), Arc::new(check));
        Ok(())
    }

    pub fn register_condition(&mut self, condition: Condition) -> Result<(), Error> {
        if self.conditions.contains_key(&condition.name) {
            return Err(Error::DuplicateCondition(condition.name.to_string()));
        }
        trace!("Register condition {}", condition.name);
        self.conditions.insert(condition.name.clone(), condition);
        Ok(())
    }

    pub fn register_profile(&mut self, name: &str, profile: Profile) -> Result<(), Error> {
        if self.profiles.contains_key(name) {
            return Err(Error::DuplicateProfile(name.to_string()));
        }
        trace!("Register profile {name}");
        self.profiles.insert(name.to_string(), profile);
        Ok(())
    }

    /// Register everything a plugin provides
    pub fn load(&mut self, plugin: &dyn Plugin) -> Result<(), Error> {
        plugin.register(self)
    }

    /// Freeze the registry, validating cross references.
    ///
    /// Every condition a check requires must exist and match the check's
    /// arity, and every profile must resolve.
    pub fn build(self) -> Result<Registry, Error> {
        for check in self.checks.values() {
            for requirement in check.conditions.iter() {
                let Some(condition) = self.conditions.get(&requirement.name) else {
                    return Err(Error::UnknownCondition {
                        check: check.id.clone(),
                        condition: requirement.name.to_string(),
                    });
                };
                if check.arity() == Arity::Single && condition.arity() == Arity::Collection {
                    return Err(Error::ConditionArity {
                        check: check.id.clone(),
                        condition: requirement.name.to_string(),
                    });
                }
            }
        }
        let registry = Registry {
            checks: self.checks,
            conditions: self.conditions,
            profiles: self.profiles,
            namespace: self.namespace,
        };
        for name in registry.profiles.keys() {
            registry.resolve_profile(name)?;
        }
        debug!(
            "Registry frozen with {} checks, {} conditions and {} profiles",
            registry.checks.len(),
            registry.conditions.len(),
            registry.profiles.len()
        );
        Ok(registry)
    }
}

/// A frozen catalogue; read-only and safe to share between threads.
#[derive(Debug)]
pub struct Registry {
    checks: IndexMap<CheckId, Arc<Check>>,
    conditions: HashMap<SmolStr, Condition>,
    profiles: IndexMap<String, Profile>,
    namespace: Namespace,
}

impl Registry {
    /// Convenience for building a registry from a set of plugins.
    pub fn from_plugins(plugins: &[&dyn Plugin]) -> Result<Registry, Error> {
        let mut builder = RegistryBuilder::new();
        for plugin in plugins {
            builder.load(*plugin)?;
        }
        builder.build()
    }

    pub fn check(&self, id: &CheckId) -> Option<&Arc<Check>> {
        self.checks.get(id)
    }

    /// Look up by the string form of an id
    pub fn check_by_name(&self, id: &str) -> Option<&Arc<Check>> {
        CheckId::new(id).ok().and_then(|id| self.checks.get(&id))
    }

    /// All checks, in registration order
    pub fn checks(&self) -> impl Iterator<Item = &Arc<Check>> {
        self.checks.values()
    }

    pub fn check_ids(&self) -> impl Iterator<Item = &CheckId> {
        self.checks.keys()
    }

    pub fn condition(&self, name: &str) -> Option<&Condition> {
        self.conditions.get(name)
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn profile_names(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(|k| k.as_str())
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Every check id at or under `prefix`, in registration order.
    pub fn checks_under<'a>(&'a self, prefix: &'a CheckId) -> impl Iterator<Item = &'a CheckId> {
        self.checks.keys().filter(move |id| id.is_under(prefix))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{condition::Condition, status::return_result};

    fn noop_check(id: &str) -> Check {
        Check::one(id, id, |_, _| return_result(vec![]))
            .unwrap()
            .build()
    }

    #[test]
    fn duplicate_check_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.register_check(noop_check("a/b")).unwrap();
        let result = builder.register_check(noop_check("a/b"));
        assert!(
            matches!(&result, Err(Error::DuplicateCheck(id)) if id.to_string() == "a/b"),
            "{result:?}"
        );
    }

    #[test]
    fn family_check_cannot_have_a_hotfix() {
        let mut builder = RegistryBuilder::new();
        let check = Check::all("a/family", "family", |_, _| return_result(vec![]))
            .unwrap()
            .hotfix(|_, _| Ok(None))
            .build();
        assert!(matches!(
            builder.register_check(check),
            Err(Error::FamilyHotfix(..))
        ));
    }

    #[test]
    fn duplicate_condition_rejected() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_condition(Condition::one("is_ttf", |_| Ok(true)))
            .unwrap();
        assert!(matches!(
            builder.register_condition(Condition::one("is_ttf", |_| Ok(false))),
            Err(Error::DuplicateCondition(..))
        ));
    }

    #[test]
    fn unknown_condition_fails_build() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_check(
                Check::one("a/b", "b", |_, _| return_result(vec![]))
                    .unwrap()
                    .condition("not is_nonsense")
                    .build(),
            )
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(Error::UnknownCondition { condition, .. }) if condition == "is_nonsense"
        ));
    }

    #[test]
    fn family_condition_on_single_check_fails_build() {
        let mut builder = RegistryBuilder::new();
        builder
            .register_condition(Condition::all("has_italic", |_| Ok(true)))
            .unwrap();
        builder
            .register_check(
                Check::one("a/b", "b", |_, _| return_result(vec![]))
                    .unwrap()
                    .condition("has_italic")
                    .build(),
            )
            .unwrap();
        assert!(matches!(
            builder.build(),
            Err(Error::ConditionArity { .. })
        ));
    }

    #[test]
    fn namespace_nodes_are_reused() {
        let mut builder = RegistryBuilder::new();
        for id in [
            "opentype/STAT/ital_axis",
            "opentype/STAT/has_axis_value_tables",
            "opentype/fvar/axis_ranges_correct",
            "no_debugging_tables",
        ] {
            builder.register_check(noop_check(id)).unwrap();
        }
        let registry = builder.build().unwrap();
        let root = registry.namespace();
        assert_eq!(
            vec!["no_debugging_tables", "opentype"],
            root.children.keys().map(|k| k.as_str()).collect::<Vec<_>>()
        );
        let opentype = &root.children["opentype"];
        assert_eq!(2, opentype.children.len());
        assert!(opentype.check.is_none());
        let stat = &opentype.children["STAT"];
        assert_eq!(
            vec!["has_axis_value_tables", "ital_axis"],
            stat.children.keys().map(|k| k.as_str()).collect::<Vec<_>>()
        );
        assert_eq!(
            Some("opentype/STAT/ital_axis".to_string()),
            stat.children["ital_axis"].check.as_ref().map(|c| c.to_string())
        );
    }

    #[test]
    fn ensure_is_idempotent() {
        let mut namespace = Namespace::default();
        let path: Vec<SmolStr> = vec!["a".into(), "b".into()];
        namespace.ensure(&path).check = Some(CheckId::new("a/b").unwrap());
        let again = namespace.ensure(&path);
        assert!(again.check.is_some());
        namespace.ensure(&path[..1]);
        assert_eq!(1, namespace.children.len());
        assert_eq!(1, namespace.get(&path[..1]).unwrap().children.len());
    }

    #[test]
    fn checks_under_prefix() {
        let mut builder = RegistryBuilder::new();
        for id in [
            "opentype/STAT/ital_axis",
            "opentype/fvar/axis_ranges_correct",
            "opentype/STAT/has_axis_value_tables",
            "universal/thing",
        ] {
            builder.register_check(noop_check(id)).unwrap();
        }
        let registry = builder.build().unwrap();
        let prefix = CheckId::new("opentype/STAT").unwrap();
        assert_eq!(
            vec![
                "opentype/STAT/ital_axis",
                "opentype/STAT/has_axis_value_tables"
            ],
            registry
                .checks_under(&prefix)
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
        );
        assert_eq!(
            3,
            registry
                .namespace()
                .get(&[SmolStr::new("opentype")])
                .unwrap()
                .check_ids()
                .len()
        );
    }

    #[test]
    fn registry_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Registry>();
    }
}
