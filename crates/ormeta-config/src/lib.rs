//! TOML configuration of a mapping build.
//!
//! ```toml
//! [naming]
//! strategy = "improved"
//!
//! [imports]
//! reject_conflicting_auto_imports = false
//! ```
//!
//! Every section is optional; missing keys take their defaults.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("could not parse mapping configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

///
/// MappingConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MappingConfig {
    pub naming: NamingConfig,
    pub imports: ImportConfig,
}

impl MappingConfig {
    // from_toml_str
    /// Parse a configuration document. Unknown sections, keys and
    /// strategy names are rejected.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}

///
/// NamingConfig
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub strategy: NamingStrategyKind,
}

///
/// NamingStrategyKind
///
/// Which naming strategy derives physical table and column names.
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[remain::sorted]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategyKind {
    #[default]
    #[display("default")]
    Default,

    /// Mixed-case names become snake case.
    #[display("improved")]
    Improved,
}

///
/// ImportConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// Fail when two auto-imported classes share an unqualified name.
    pub reject_conflicting_auto_imports: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            reject_conflicting_auto_imports: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = MappingConfig::from_toml_str("").unwrap();

        assert_eq!(config, MappingConfig::default());
        assert_eq!(config.naming.strategy, NamingStrategyKind::Default);
        assert!(config.imports.reject_conflicting_auto_imports);
    }

    #[test]
    fn sections_override_defaults() {
        let config = MappingConfig::from_toml_str(
            r#"
            [naming]
            strategy = "improved"

            [imports]
            reject_conflicting_auto_imports = false
            "#,
        )
        .unwrap();

        assert_eq!(config.naming.strategy, NamingStrategyKind::Improved);
        assert_eq!(config.naming.strategy.to_string(), "improved");
        assert!(!config.imports.reject_conflicting_auto_imports);
    }

    #[test]
    fn unknown_keys_sections_and_strategies_fail_to_parse() {
        for source in [
            "[naming]\nstrategy = \"legacy\"\n",
            "[imports]\nreject = true\n",
            "[binder]\nmax_extends_rounds = 3\n",
        ] {
            let err = MappingConfig::from_toml_str(source).unwrap_err();
            assert!(matches!(err, ConfigError::Parse(_)), "{source}");
            assert!(err.to_string().starts_with("could not parse mapping configuration"));
        }
    }

    proptest! {
        #[test]
        fn import_policy_round_trips_through_toml(reject in any::<bool>()) {
            let config = MappingConfig::from_toml_str(
                &format!("[imports]\nreject_conflicting_auto_imports = {reject}\n"),
            ).unwrap();

            prop_assert_eq!(config.imports.reject_conflicting_auto_imports, reject);
            prop_assert_eq!(config.naming.strategy, NamingStrategyKind::Default);
        }
    }
}
