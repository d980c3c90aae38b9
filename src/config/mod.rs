//! Configuration loading
//!
//! Settings come from an optional project config file; CLI flags override
//! individual values after loading.

pub mod loader;

pub use loader::load_config;

use crate::scan::normalize_extension;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scope storage, relative to the repository root.
    pub storage_dir: String,
    /// Project ignore file whose rules extend the defaults.
    pub ignore_file: String,
    /// Extra ignore rules.
    #[serde(deserialize_with = "string_or_list")]
    pub ignore: Vec<String>,
    /// File extension allow-list; empty means every extension.
    #[serde(deserialize_with = "extension_list")]
    pub extensions: Vec<String>,
    pub model: String,
    pub max_tokens: u32,
    pub tokens_per_minute: u32,
    pub refill_interval_secs: u64,
    pub chars_to_tokens: f64,
    pub request_timeout_secs: u64,
    pub max_rate_limit_attempts: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: ".coderunner".to_string(),
            ignore_file: ".gitignore".to_string(),
            ignore: Vec::new(),
            extensions: Vec::new(),
            model: "sonnet".to_string(),
            max_tokens: 2000,
            tokens_per_minute: 80_000,
            refill_interval_secs: 60,
            chars_to_tokens: 0.5,
            request_timeout_secs: 30,
            max_rate_limit_attempts: 5,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrList {
    String(String),
    List(Vec<String>),
}

/// Accept `"a, b"` or `["a", "b"]`.
fn string_or_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let items = match StringOrList::deserialize(deserializer)? {
        StringOrList::String(s) => s.split(',').map(str::to_string).collect(),
        StringOrList::List(list) => list,
    };
    Ok(items.into_iter().map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
}

fn extension_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(string_or_list(deserializer)?.iter().map(|e| normalize_extension(e)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.storage_dir, ".coderunner");
        assert_eq!(cfg.model, "sonnet");
        assert_eq!(cfg.tokens_per_minute, 80_000);
        assert_eq!(cfg.chars_to_tokens, 0.5);
        assert!(cfg.extensions.is_empty());
    }
}
