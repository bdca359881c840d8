//! Named predicates gating whether a check runs.

use std::{collections::HashMap, fmt::Display, sync::Arc};

use parking_lot::RwLock;
use smol_str::SmolStr;

use crate::{
    status::CheckError,
    testable::{Arity, Testable, TestableCollection},
};

pub type ConditionOneFn = dyn Fn(&Testable) -> Result<bool, CheckError> + Send + Sync;
pub type ConditionAllFn = dyn Fn(&TestableCollection) -> Result<bool, CheckError> + Send + Sync;

#[derive(Clone)]
pub enum Predicate {
    One(Arc<ConditionOneFn>),
    All(Arc<ConditionAllFn>),
}

/// A named, side-effect free predicate.
///
/// Predicates return `Err` only when they cannot decide; `Ok(false)` is the
/// normal way of saying the condition does not hold.
#[derive(Clone)]
pub struct Condition {
    pub name: SmolStr,
    pub predicate: Predicate,
}

impl Condition {
    pub fn one<F>(name: &str, predicate: F) -> Condition
    where
        F: Fn(&Testable) -> Result<bool, CheckError> + Send + Sync + 'static,
    {
        Condition {
            name: name.into(),
            predicate: Predicate::One(Arc::new(predicate)),
        }
    }

    pub fn all<F>(name: &str, predicate: F) -> Condition
    where
        F: Fn(&TestableCollection) -> Result<bool, CheckError> + Send + Sync + 'static,
    {
        Condition {
            name: name.into(),
            predicate: Predicate::All(Arc::new(predicate)),
        }
    }

    pub fn arity(&self) -> Arity {
        match self.predicate {
            Predicate::One(..) => Arity::Single,
            Predicate::All(..) => Arity::Collection,
        }
    }
}

impl std::fmt::Debug for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Condition")
            .field("name", &self.name)
            .field("arity", &self.arity())
            .finish()
    }
}

/// A check's reference to a condition, possibly negated (`not is_variable_font`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConditionRef {
    pub name: SmolStr,
    pub negated: bool,
}

impl ConditionRef {
    pub fn parse(requirement: &str) -> ConditionRef {
        let requirement = requirement.trim();
        match requirement.strip_prefix("not ") {
            Some(name) => ConditionRef {
                name: name.trim().into(),
                negated: true,
            },
            None => ConditionRef {
                name: requirement.into(),
                negated: false,
            },
        }
    }

    /// Is the requirement met given the condition's value?
    pub fn is_met(&self, value: bool) -> bool {
        value != self.negated
    }
}

impl Display for ConditionRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negated {
            f.write_str("not ")?;
        }
        f.write_str(&self.name)
    }
}

/// Identifies what a condition was evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Target {
    Font(usize),
    Family(usize),
}

impl Target {
    pub(crate) fn font(testable: &Testable) -> Target {
        Target::Font(testable as *const Testable as usize)
    }

    pub(crate) fn family(collection: &TestableCollection) -> Target {
        Target::Family(collection as *const TestableCollection as usize)
    }
}

/// Remembers condition values by (condition, testable identity).
///
/// Keys are addresses, so a cache must not outlive the testables it was
/// filled from. [crate::Runner::run] makes one per call and
/// [crate::Runner::run_profile] shares one across its whole batch.
#[derive(Debug, Default)]
pub struct ConditionCache {
    values: RwLock<HashMap<(SmolStr, Target), bool>>,
}

impl ConditionCache {
    pub fn new() -> Self {
        Default::default()
    }

    pub(crate) fn get(&self, name: &SmolStr, target: Target) -> Option<bool> {
        self.values.read().get(&(name.clone(), target)).copied()
    }

    pub(crate) fn set(&self, name: &SmolStr, target: Target, value: bool) {
        self.values.write().insert((name.clone(), target), value);
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_negation() {
        let plain = ConditionRef::parse("is_ttf");
        let negated = ConditionRef::parse("not   is_variable_font");
        assert_eq!(("is_ttf", false), (plain.name.as_str(), plain.negated));
        assert_eq!(
            ("is_variable_font", true),
            (negated.name.as_str(), negated.negated)
        );
        assert_eq!("not is_variable_font", negated.to_string());
    }

    #[test]
    fn negation_flips_requirement() {
        assert!(ConditionRef::parse("x").is_met(true));
        assert!(!ConditionRef::parse("x").is_met(false));
        assert!(ConditionRef::parse("not x").is_met(false));
        assert!(!ConditionRef::parse("not x").is_met(true));
    }

    #[test]
    fn cache_is_keyed_by_name_and_target() {
        let cache = ConditionCache::new();
        let name = SmolStr::new("is_ttf");
        cache.set(&name, Target::Font(1), true);
        assert_eq!(Some(true), cache.get(&name, Target::Font(1)));
        assert_eq!(None, cache.get(&name, Target::Font(2)));
        assert_eq!(None, cache.get(&name, Target::Family(1)));
        assert_eq!(None, cache.get(&SmolStr::new("is_cff"), Target::Font(1)));
    }
}
