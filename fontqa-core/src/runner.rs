//! Runs checks, gating them on their conditions and containing their failures.
//!
//! Whatever a check body or a condition predicate does, including panic, a
//! run never aborts: the misbehaviour becomes a single ERROR subresult.

use std::{
    borrow::Cow,
    panic::{catch_unwind, AssertUnwindSafe},
};

use log::{debug, trace, warn};
use rayon::prelude::*;
use serde_json::{Map, Value};

use crate::{
    check::{Check, CheckImplementation, Context},
    condition::{Condition, ConditionCache, Predicate, Target},
    error::Error,
    outcome::{CheckOutcome, Hotfix},
    profile::ResolvedProfile,
    registry::Registry,
    status::{worst_status, CheckError, Status, Subresult},
    testable::{Testable, TestableCollection, TestableType},
};

/// What to run out of a profile, and how.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Keep only checks whose id contains one of these
    pub include_checks: Vec<String>,
    /// Drop checks whose id contains one of these
    pub exclude_checks: Vec<String>,
    pub include_experimental: bool,
    pub full_lists: bool,
    /// Check id => settings, overlaid on the profile's defaults
    pub configuration: Map<String, Value>,
}

impl RunOptions {
    fn selects(&self, check_id: &str) -> bool {
        if !self.include_checks.is_empty()
            && !self.include_checks.iter().any(|i| check_id.contains(i.as_str()))
        {
            return false;
        }
        !self
            .exclude_checks
            .iter()
            .any(|e| check_id.contains(e.as_str()))
    }
}

pub struct Runner<'r> {
    registry: &'r Registry,
}

/// One unit of work in a batch
struct Invocation<'a> {
    section: &'a str,
    check: &'a Check,
    target: InvocationTarget<'a>,
}

enum InvocationTarget<'a> {
    Font(&'a Testable),
    Family(Cow<'a, TestableCollection>),
}

impl<'r> Runner<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Runner { registry }
    }

    /// Run one check against one target.
    ///
    /// The returned sequence is never empty. The only errors are misuse: the
    /// wrong kind of target, or a check the registry cannot satisfy.
    pub fn run(
        &self,
        check: &Check,
        target: TestableType<'_>,
        context: &Context,
    ) -> Result<Vec<Subresult>, Error> {
        self.run_cached(check, target, context, &ConditionCache::new())
    }

    /// [Runner::run], remembering condition values in `cache`.
    ///
    /// The cache must not outlive the testables in `target`.
    fn run_cached(
        &self,
        check: &Check,
        target: TestableType<'_>,
        context: &Context,
        cache: &ConditionCache,
    ) -> Result<Vec<Subresult>, Error> {
        if check.arity() != target.arity() {
            return Err(Error::ArityMismatch {
                check: check.id.clone(),
                expected: check.arity(),
                actual: target.arity(),
            });
        }

        let mut unmet = Vec::new();
        for requirement in check.conditions.iter() {
            let condition = self.registry.condition(&requirement.name).ok_or_else(|| {
                Error::UnknownCondition {
                    check: check.id.clone(),
                    condition: requirement.name.to_string(),
                }
            })?;
            match evaluate(condition, target, cache) {
                Ok(value) => {
                    trace!("{}: {} is {value}", check.id, requirement.name);
                    if !requirement.is_met(value) {
                        unmet.push(requirement.to_string());
                    }
                }
                Err(error) => return Ok(vec![error]),
            }
        }
        if !unmet.is_empty() {
            return Ok(vec![Subresult::skip(
                "unfulfilled-conditions",
                &format!("Unfulfilled Conditions: {}", unmet.join(", ")),
            )]);
        }

        trace!("Run {} on {target:?}", check.id);
        let result = catch_unwind(AssertUnwindSafe(|| {
            match (&check.implementation, target) {
                (CheckImplementation::One(body), TestableType::Single(t)) => body(t, context),
                (CheckImplementation::All(body), TestableType::Collection(c)) => body(c, context),
                // arity was verified above
                _ => Err(CheckError::Error("arity mismatch".to_string())),
            }
        }));
        Ok(match result {
            Ok(Ok(subresults)) if subresults.is_empty() => vec![Subresult::pass()],
            Ok(Ok(subresults)) => subresults,
            Ok(Err(CheckError::Skip { code, message })) => {
                vec![Subresult::new(Status::Skip, code, message)]
            }
            Ok(Err(CheckError::Error(message))) => vec![Subresult::error(
                "check-error",
                &format!("Failed with error: {message}"),
            )],
            Err(panic) => vec![Subresult::error(
                "check-panicked",
                &format!("Check panicked: {}", get_panic_message(panic)),
            )],
        })
    }

    /// Run every selected check of a profile over a set of fonts.
    ///
    /// Single-font checks run once per font they apply to, family checks
    /// once over the fonts they apply to. Invocations run in parallel but
    /// outcomes come back in profile order, then font order.
    pub fn run_profile(
        &self,
        profile: &ResolvedProfile,
        fonts: &TestableCollection,
        options: &RunOptions,
    ) -> Vec<CheckOutcome> {
        for term in options.include_checks.iter() {
            if !profile
                .check_ids()
                .any(|id| id.to_string().contains(term.as_str()))
            {
                warn!("No check in profile '{}' matches '{term}'", profile.name);
            }
        }

        let invocations = self.plan(profile, fonts, options);
        debug!(
            "Running {} invocations from profile '{}' over {} fonts",
            invocations.len(),
            profile.name,
            fonts.len()
        );

        // every target below borrows from `fonts` or `invocations`, both of
        // which outlive the batch
        let cache = ConditionCache::new();
        let outcomes = invocations
            .par_iter()
            .map(|invocation| {
                let check = invocation.check;
                let context = context_for(profile, options, check);
                let (target, filename) = match &invocation.target {
                    InvocationTarget::Font(t) => {
                        (TestableType::Single(t), Some(t.filename().to_path_buf()))
                    }
                    InvocationTarget::Family(c) => (TestableType::Collection(c.as_ref()), None),
                };
                let mut subresults = self
                    .run_cached(check, target, &context, &cache)
                    .unwrap_or_else(|e| vec![Subresult::error("check-error", &e.to_string())]);
                profile.apply_overrides(&check.id, &mut subresults);
                let fixable = check.has_hotfix()
                    && filename.is_some()
                    && matches!(worst_status(&subresults), Status::Warn | Status::Fail);
                CheckOutcome {
                    check_id: check.id.clone(),
                    title: check.title.clone(),
                    section: invocation.section.to_string(),
                    filename,
                    subresults,
                    hotfix: fixable.then_some(Hotfix::Available),
                }
            })
            .collect();
        debug!("{} condition values computed", cache.len());
        outcomes
    }

    /// Run one check's hotfix over one font.
    ///
    /// Like a check body, a hotfix that panics or errors is contained.
    /// Returns the repaired font if anything changed.
    pub fn hotfix(
        &self,
        check: &Check,
        testable: &Testable,
        context: &Context,
    ) -> (Hotfix, Option<Testable>) {
        let Some(fix) = check.hotfix.as_ref() else {
            return (Hotfix::NotApplied, None);
        };
        trace!("Hotfix {} on {testable:?}", check.id);
        let fixed = match catch_unwind(AssertUnwindSafe(|| fix(testable, context))) {
            Ok(Ok(Some(data))) => data,
            Ok(Ok(None)) | Ok(Err(CheckError::Skip { .. })) => {
                return (Hotfix::NotApplied, None)
            }
            Ok(Err(CheckError::Error(message))) => return (Hotfix::Failed(message), None),
            Err(panic) => return (Hotfix::Failed(get_panic_message(panic)), None),
        };
        match Testable::from_bytes(testable.filename(), fixed) {
            Ok(fixed) => (Hotfix::Applied, Some(fixed)),
            Err(e) => (Hotfix::Failed(e.to_string()), None),
        }
    }

    /// Apply the hotfix of every outcome marked [Hotfix::Available].
    ///
    /// Fixes for the same font are applied one after another in outcome
    /// order, each seeing the font the previous one produced. Outcomes are
    /// updated to say what happened. Returns the fonts that changed; saving
    /// them is up to the caller.
    pub fn apply_hotfixes(
        &self,
        profile: &ResolvedProfile,
        fonts: &TestableCollection,
        outcomes: &mut [CheckOutcome],
        options: &RunOptions,
    ) -> Vec<Testable> {
        let mut fixed_fonts = Vec::new();
        for font in fonts.iter() {
            let mut current: Option<Testable> = None;
            for outcome in outcomes.iter_mut() {
                if outcome.hotfix != Some(Hotfix::Available)
                    || outcome.filename.as_deref() != Some(font.filename())
                {
                    continue;
                }
                let Some(check) = self.registry.check(&outcome.check_id) else {
                    continue;
                };
                let context = context_for(profile, options, check);
                let target = current.as_ref().unwrap_or(font);
                let (status, fixed) = self.hotfix(check, target, &context);
                debug!("{} on {}: {status}", check.id, font.filename().display());
                outcome.hotfix = Some(status);
                if fixed.is_some() {
                    current = fixed;
                }
            }
            fixed_fonts.extend(current);
        }
        fixed_fonts
    }

    fn plan<'a>(
        &'a self,
        profile: &'a ResolvedProfile,
        fonts: &'a TestableCollection,
        options: &RunOptions,
    ) -> Vec<Invocation<'a>> {
        let mut invocations = Vec::new();
        for (section, id) in profile.checks.iter() {
            let Some(check) = self.registry.check(id) else {
                warn!("Profile '{}' names unknown check {id}", profile.name);
                continue;
            };
            if !options.selects(&id.to_string()) {
                continue;
            }
            if check.is_experimental() && !options.include_experimental {
                trace!("Skip experimental check {id}");
                continue;
            }
            let applicable: Vec<&Testable> = fonts.iter().filter(|t| check.applies(t)).collect();
            if applicable.is_empty() {
                continue;
            }
            if check.runs_on_collection() {
                let family = if applicable.len() == fonts.len() {
                    Cow::Borrowed(fonts)
                } else {
                    Cow::Owned(TestableCollection::new(
                        applicable.into_iter().cloned().collect(),
                    ))
                };
                invocations.push(Invocation {
                    section,
                    check,
                    target: InvocationTarget::Family(family),
                });
            } else {
                invocations.extend(applicable.into_iter().map(|t| Invocation {
                    section,
                    check,
                    target: InvocationTarget::Font(t),
                }));
            }
        }
        invocations
    }
}

fn context_for(profile: &ResolvedProfile, options: &RunOptions, check: &Check) -> Context {
    Context {
        configuration: configuration_for(profile, options, check),
        full_lists: options.full_lists,
    }
}

/// Profile defaults for a check with the user's settings laid on top
fn configuration_for(
    profile: &ResolvedProfile,
    options: &RunOptions,
    check: &Check,
) -> Map<String, Value> {
    let mut configuration = profile.defaults(&check.id);
    if let Some(Value::Object(user)) = options.configuration.get(&check.id.to_string()) {
        configuration.extend(user.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    configuration
}

/// The value of a condition for a target, or the ERROR that replaces the run.
///
/// A single-font condition asked about a family holds only if it holds for
/// every member.
fn evaluate(
    condition: &Condition,
    target: TestableType<'_>,
    cache: &ConditionCache,
) -> Result<bool, Subresult> {
    match (&condition.predicate, target) {
        (Predicate::One(predicate), TestableType::Single(t)) => {
            cached(condition, Target::font(t), cache, || predicate(t))
        }
        (Predicate::One(predicate), TestableType::Collection(c)) => {
            for t in c.iter() {
                if !cached(condition, Target::font(t), cache, || predicate(t))? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Predicate::All(predicate), TestableType::Collection(c)) => {
            cached(condition, Target::family(c), cache, || predicate(c))
        }
        (Predicate::All(..), TestableType::Single(..)) => Err(Subresult::error(
            "condition-error",
            &format!(
                "Condition {} needs a collection of fonts",
                condition.name
            ),
        )),
    }
}

fn cached(
    condition: &Condition,
    target: Target,
    cache: &ConditionCache,
    predicate: impl FnOnce() -> Result<bool, CheckError>,
) -> Result<bool, Subresult> {
    if let Some(value) = cache.get(&condition.name, target) {
        return Ok(value);
    }
    let value = match catch_unwind(AssertUnwindSafe(predicate)) {
        Ok(Ok(value)) => value,
        // a condition that chooses to skip simply does not hold
        Ok(Err(CheckError::Skip { .. })) => false,
        Ok(Err(CheckError::Error(message))) => {
            return Err(Subresult::error(
                "condition-error",
                &format!("Condition {} failed with error: {message}", condition.name),
            ))
        }
        Err(panic) => {
            return Err(Subresult::error(
                "condition-panicked",
                &format!(
                    "Condition {} panicked: {}",
                    condition.name,
                    get_panic_message(panic)
                ),
            ))
        }
    };
    cache.set(&condition.name, target, value);
    Ok(value)
}

// taken from std:
// <https://github.com/rust-lang/rust/blob/d5a82bbd26e1ad8b7401f6a718a9c57c96905483/library/std/src/panicking.rs#L247-L253>
pub fn get_panic_message(msg: Box<dyn std::any::Any + Send + 'static>) -> String {
    match msg.downcast_ref::<&'static str>() {
        Some(s) => s.to_string(),
        None => match msg.downcast_ref::<String>() {
            Some(s) => s.to_owned(),
            None => "Box<dyn Any>".to_owned(),
        },
    }
}
