//! Checks that fonts follow the OpenType specification.
//!
//! Check code lives in a module tree mirroring check ids, so
//! `opentype/STAT/ital_axis` is [checks::opentype::STAT::ital_axis].

pub mod checks;
pub mod conditions;
mod profiles;

use fontqa_core::{Error, Plugin, Registry, RegistryBuilder};
use log::debug;

/// Registers the conditions, checks and profiles of this crate.
pub struct OpenType;

impl Plugin for OpenType {
    fn register(&self, registry: &mut RegistryBuilder) -> Result<(), Error> {
        for condition in conditions::all() {
            registry.register_condition(condition)?;
        }
        let checks = checks::all()?;
        debug!("Registering {} opentype checks", checks.len());
        for check in checks {
            registry.register_check(check)?;
        }
        registry.register_profile("opentype", profiles::opentype())?;
        registry.register_profile("universal", profiles::universal()?)?;
        Ok(())
    }
}

/// A frozen registry holding everything in this crate
pub fn registry() -> Result<Registry, Error> {
    Registry::from_plugins(&[&OpenType])
}
