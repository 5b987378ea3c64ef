//! Dispatch configuration.
//!
//! Loads an optional `pathwise.toml`; every key has a default, so an empty
//! or missing file behaves like `DispatchConfig::default()`.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// File name looked up by [`DispatchConfig::load`].
pub const CONFIG_FILE: &str = "pathwise.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Match literals and command labels exactly instead of ignoring ASCII case.
    pub case_sensitive_literals: bool,
    /// Let the matcher skip an optional positional whose token belongs to a
    /// later position.
    pub optional_skipping: bool,
    /// Offer `-x` / `--name` completions.
    pub suggest_flags: bool,
    /// When completing an optional position, also offer candidates for the
    /// optional positions after it.
    pub overlapping_optional_suggestions: bool,
    /// Cap on returned suggestions; 0 means unlimited.
    pub max_suggestions: usize,
    /// Levenshtein threshold for "did you mean" hints.
    pub typo_distance: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            case_sensitive_literals: false,
            optional_skipping: true,
            suggest_flags: true,
            overlapping_optional_suggestions: false,
            max_suggestions: 0,
            typo_distance: 2,
        }
    }
}

impl DispatchConfig {
    /// Load `pathwise.toml` from the given directory.
    /// Returns defaults if the file doesn't exist or is invalid.
    pub fn load(dir: &Path) -> Self {
        Self::load_from_path(&dir.join(CONFIG_FILE))
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to parse config");
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read config");
                Self::default()
            }
        }
    }
}
