//! Config file loading

use super::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Section name honored when the settings are nested in a shared file.
const SECTION: &str = "coderunner";

const CANDIDATES: &[&str] = &[
    "coderunner.toml",
    ".coderunner.toml",
    "coderunner.yml",
    "coderunner.yaml",
    ".coderunner.yml",
    ".coderunner.yaml",
];

/// Load the config for `repo_root`.
///
/// With an explicit `config_path` every failure is an error. An
/// auto-discovered file that cannot be parsed only logs a warning and yields
/// the defaults.
pub fn load_config(repo_root: &Path, config_path: Option<&Path>) -> Result<Config> {
    let explicit = config_path.is_some();

    let discovered = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(repo_root),
    };

    let Some(config_file) = discovered else {
        return Ok(Config::default());
    };

    let content = match fs::read_to_string(&config_file) {
        Ok(content) => content,
        Err(err) if explicit && err.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::NotFound(format!(
                "Config file {} doesn't exist",
                config_file.display()
            )));
        }
        Err(err) => return Err(Error::io("Failed reading config file", &config_file, err)),
    };

    let ext = config_file.extension().and_then(|e| e.to_str()).unwrap_or("").to_ascii_lowercase();
    let parsed = match ext.as_str() {
        "toml" => parse_toml_config(&content, &config_file),
        "yaml" | "yml" => parse_yaml_config(&content, &config_file),
        other => Err(Error::Invalid(format!(
            "Unsupported config extension '.{}' for file {}",
            other,
            config_file.display()
        ))),
    };

    match parsed {
        Ok(cfg) => {
            tracing::debug!("loaded config from {}", config_file.display());
            Ok(cfg)
        }
        Err(e) if explicit => Err(e),
        Err(e) => {
            tracing::warn!("Ignoring auto-discovered config {}: {}", config_file.display(), e);
            Ok(Config::default())
        }
    }
}

/// Parse TOML, using the `[coderunner]` table when present.
fn parse_toml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: toml::Value = toml::from_str(content).map_err(|e| {
        Error::Invalid(format!("Invalid TOML syntax in {}: {e}", config_file.display()))
    })?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    config_val.try_into().map_err(|e| {
        Error::Invalid(format!("Invalid TOML config {}: {e}", config_file.display()))
    })
}

/// Parse YAML, using the `coderunner:` mapping when present.
fn parse_yaml_config(content: &str, config_file: &Path) -> Result<Config> {
    let raw: serde_yaml::Value = serde_yaml::from_str(content).map_err(|e| {
        Error::Invalid(format!("Invalid YAML syntax in {}: {e}", config_file.display()))
    })?;

    let config_val = match raw.get(SECTION) {
        Some(nested) => nested.clone(),
        None => raw,
    };

    // An empty file parses to null.
    if config_val.is_null() {
        return Ok(Config::default());
    }

    serde_yaml::from_value(config_val).map_err(|e| {
        Error::Invalid(format!("Invalid YAML config {}: {e}", config_file.display()))
    })
}

fn discover_config(repo_root: &Path) -> Option<PathBuf> {
    CANDIDATES.iter().map(|candidate| repo_root.join(candidate)).find(|path| path.is_file())
}
