//! Per-check settings supplied by the user

use std::{fs, path::Path};

use fontqa_core::Registry;
use indexmap::IndexMap;
use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::Error;

/// Check id => setting => value, read from YAML.
///
/// ```yaml
/// no_debugging_tables:
///   extra_tables: [Debg]
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(transparent)]
pub struct Config {
    pub checks: IndexMap<String, Map<String, Value>>,
}

impl Config {
    pub fn from_yaml(yml: &str) -> Result<Config, serde_yaml::Error> {
        // an empty file is an empty config, not a parse error
        if yml.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(yml)
    }

    pub fn load(path: &Path) -> Result<Config, Error> {
        let yml = fs::read_to_string(path).map_err(|source| Error::FileIo {
            path: path.to_path_buf(),
            source,
        })?;
        Config::from_yaml(&yml).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Complain about settings for checks that don't exist, they are likely typos
    pub fn warn_unknown(&self, registry: &Registry) {
        for id in self.checks.keys() {
            if registry.check_by_name(id).is_none() {
                warn!("Configuration given for unknown check '{id}'");
            }
        }
    }

    /// The shape [fontqa_core::RunOptions::configuration] wants
    pub fn into_configuration(self) -> Map<String, Value> {
        self.checks
            .into_iter()
            .map(|(id, settings)| (id, Value::Object(settings)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_config() {
        let config = Config::from_yaml(
            "no_debugging_tables:\n  extra_tables: [Debg, TSI9]\n\
             opentype/STAT/ital_axis:\n  strict: true\n",
        )
        .unwrap();
        assert_eq!(
            json!({
                "no_debugging_tables": { "extra_tables": ["Debg", "TSI9"] },
                "opentype/STAT/ital_axis": { "strict": true },
            }),
            Value::Object(config.into_configuration())
        );
    }

    #[test]
    fn empty_config() {
        assert_eq!(Config::default(), Config::from_yaml("\n").unwrap());
    }

    #[test]
    fn settings_must_be_a_mapping() {
        assert!(Config::from_yaml("no_debugging_tables: [Debg]").is_err());
    }

    #[test]
    fn load_reports_the_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("config.yaml");
        fs::write(&path, "no_debugging_tables: 7").unwrap();
        let Err(Error::ConfigParse { path: reported, .. }) = Config::load(&path) else {
            panic!("should fail to parse");
        };
        assert_eq!(path, reported);
    }
}
