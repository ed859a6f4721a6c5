use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tracing::warn;

use crate::core::marking::{classify, ClassifiedMarking};
use crate::core::types::ComponentKind;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read association config: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse association config: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Config version for compatibility checking
pub const CONFIG_VERSION: &str = "1.0.0";

/// Alias and ignore tables applied to markings before matching
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssociationConfig {
    #[serde(default = "default_version")]
    pub version: String,

    /// Canonical marking -> equivalent markings seen in practice
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,

    /// Markings that never map to a feeder
    #[serde(default)]
    pub ignore: Vec<String>,
}

fn default_version() -> String {
    CONFIG_VERSION.to_string()
}

impl AssociationConfig {
    /// Load the embedded default config
    pub fn load_embedded() -> Result<Self, ConfigError> {
        // Validated at compile time by build.rs
        const EMBEDDED_CONFIG: &str = include_str!("../../config/associations.json");
        Self::from_json(EMBEDDED_CONFIG)
    }

    /// Load config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Load from `path` if given, otherwise the embedded default
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => Self::load_embedded(),
        }
    }

    /// Parse config from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Version check (warn but don't fail)
        if config.version != CONFIG_VERSION {
            warn!(
                "Association config version mismatch (expected {}, found {})",
                CONFIG_VERSION, config.version
            );
        }

        Ok(config)
    }

    /// Export config to JSON
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[must_use]
    pub fn with_alias_group(
        mut self,
        canonical: impl Into<String>,
        aliases: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.aliases.insert(
            canonical.into(),
            aliases.into_iter().map(Into::into).collect(),
        );
        self
    }

    #[must_use]
    pub fn with_ignored(mut self, marking: impl Into<String>) -> Self {
        self.ignore.push(marking.into());
        self
    }
}

/// Result of resolving a raw marking
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The part is deliberately not sourced from a station
    Ignore,
    /// Marking to classify and match
    Marking(String),
}

/// How one raw marking resolves and classifies
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkingReport {
    pub marking: String,
    pub ignored: bool,
    /// Marking after alias substitution (absent when ignored)
    pub resolved: Option<String>,
    pub classification: Option<ClassifiedMarking>,
}

/// Applies the alias and ignore tables to raw markings
#[derive(Debug, Clone)]
pub struct MarkingResolver {
    /// Uppercased ignore literals
    ignore: HashSet<String>,

    /// Uppercased alias -> canonical marking as written in the config
    alias_to_canonical: HashMap<String, String>,
}

impl MarkingResolver {
    pub fn new(config: &AssociationConfig) -> Self {
        let ignore = config.ignore.iter().map(|m| m.to_uppercase()).collect();

        let mut alias_to_canonical: HashMap<String, String> = HashMap::new();
        for (canonical, aliases) in &config.aliases {
            for alias in aliases {
                let key = alias.to_uppercase();
                if let Some(existing) = alias_to_canonical.get(&key) {
                    warn!(
                        "Alias '{}' listed under both '{}' and '{}'; using '{}'",
                        alias, existing, canonical, existing
                    );
                    continue;
                }
                alias_to_canonical.insert(key, canonical.clone());
            }
        }

        Self {
            ignore,
            alias_to_canonical,
        }
    }

    /// Check whether an (uppercased) marking is on the ignore list
    #[must_use]
    pub fn is_ignored(&self, upper: &str) -> bool {
        self.ignore.contains(upper)
    }

    /// Resolve a raw marking to the ignore sentinel or the marking to match.
    ///
    /// Comparison is case-insensitive. An aliased marking is replaced by its
    /// canonical name exactly as the config spells it; other markings come
    /// back uppercased.
    #[must_use]
    pub fn resolve(&self, raw: &str) -> Resolution {
        let upper = raw.to_uppercase();
        if self.is_ignored(&upper) {
            return Resolution::Ignore;
        }

        let resolved = self
            .alias_to_canonical
            .get(&upper)
            .cloned()
            .unwrap_or(upper);

        // Some ignorable names only surface once the numeric grammar has failed
        let info = classify(&resolved);
        if info.kind == ComponentKind::Other {
            if let Some(name) = &info.raw_name {
                if self.is_ignored(&name.to_uppercase()) {
                    return Resolution::Ignore;
                }
            }
        }

        Resolution::Marking(resolved)
    }

    /// Resolve and classify `raw` for display
    #[must_use]
    pub fn describe(&self, raw: &str) -> MarkingReport {
        match self.resolve(raw) {
            Resolution::Ignore => MarkingReport {
                marking: raw.to_string(),
                ignored: true,
                resolved: None,
                classification: None,
            },
            Resolution::Marking(resolved) => MarkingReport {
                marking: raw.to_string(),
                ignored: false,
                classification: Some(classify(&resolved)),
                resolved: Some(resolved),
            },
        }
    }
}

impl Default for MarkingResolver {
    fn default() -> Self {
        Self::new(&AssociationConfig::default())
    }
}
