//! Deferral configuration.
//!
//! # Responsibility
//! - Read the eager-mode switch and the startup watch list from the
//!   environment, once per process.
//!
//! # Invariants
//! - `global()` never re-reads the environment after its first call.
//! - Only the exact value `1` enables eager mode.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// Environment switch forcing every new deferred reference to resolve at
/// construction. Intended for debugging load-order problems.
pub const EAGER_ENV_VAR: &str = "LAZYUNIT_EAGER";
/// Comma-separated list of top-level unit names to defer at startup.
pub const WATCH_ENV_VAR: &str = "LAZYUNIT_WATCH";

static GLOBAL_CONFIG: OnceCell<DeferralConfig> = OnceCell::new();

/// When a deferred reference acquires its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// Acquire on first forwarded operation.
    #[default]
    Lazy,
    /// Acquire immediately at construction.
    Eager,
}

/// Process-level deferral settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeferralConfig {
    pub load_mode: LoadMode,
    /// Top-level unit names registered for interception on startup.
    pub watch: Vec<String>,
}

impl DeferralConfig {
    /// Builds config from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let load_mode = match lookup(EAGER_ENV_VAR).as_deref().map(str::trim) {
            Some("1") => LoadMode::Eager,
            _ => LoadMode::Lazy,
        };
        let watch = lookup(WATCH_ENV_VAR)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self { load_mode, watch }
    }

    pub fn is_eager(&self) -> bool {
        self.load_mode == LoadMode::Eager
    }
}

/// Returns the process-wide config, reading the environment on first use.
pub fn global() -> &'static DeferralConfig {
    GLOBAL_CONFIG.get_or_init(DeferralConfig::from_env)
}

#[cfg(test)]
mod tests {
    use super::{DeferralConfig, LoadMode, EAGER_ENV_VAR, WATCH_ENV_VAR};
    use std::collections::BTreeMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: BTreeMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_to_lazy_with_nothing_watched() {
        let config = DeferralConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, DeferralConfig::default());
        assert!(!config.is_eager());
    }

    #[test]
    fn only_exact_one_enables_eager_mode() {
        let eager = DeferralConfig::from_lookup(lookup_from(&[(EAGER_ENV_VAR, " 1 ")]));
        assert_eq!(eager.load_mode, LoadMode::Eager);

        for value in ["0", "true", "yes", ""] {
            let config = DeferralConfig::from_lookup(lookup_from(&[(EAGER_ENV_VAR, value)]));
            assert_eq!(config.load_mode, LoadMode::Lazy, "value `{value}`");
        }
    }

    #[test]
    fn splits_watch_list_and_skips_blanks() {
        let config =
            DeferralConfig::from_lookup(lookup_from(&[(WATCH_ENV_VAR, "http, json,,  ,xml")]));
        assert_eq!(config.watch, vec!["http", "json", "xml"]);
    }

    #[test]
    fn deserializes_partial_documents() {
        let config: DeferralConfig =
            serde_json::from_str(r#"{"load_mode":"eager"}"#).expect("config json");
        assert!(config.is_eager());
        assert!(config.watch.is_empty());

        let json = serde_json::to_value(&DeferralConfig {
            load_mode: LoadMode::Lazy,
            watch: vec!["demo".to_string()],
        })
        .expect("serialize config");
        assert_eq!(json["load_mode"], "lazy");
        assert_eq!(json["watch"][0], "demo");
    }
}
