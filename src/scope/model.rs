//! Scope metadata and its on-disk JSON form.

use crate::error::{Error, Result};
use crate::scope::ScopeTree;
use crate::utils::write_atomic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A named selection of repository files.
///
/// `base_commit`/`target_commit` record where the scope came from; they have
/// no effect on which files are included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scope {
    pub name: String,
    #[serde(default)]
    pub base_commit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_commit: Option<String>,
    #[serde(default)]
    pub files: ScopeTree,
}

impl Scope {
    pub fn new(name: impl Into<String>, base_commit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_commit: base_commit.into(),
            target_commit: None,
            files: ScopeTree::new(),
        }
    }

    pub fn with_target_commit(mut self, target: impl Into<String>) -> Self {
        let target = target.into();
        self.target_commit = if target.is_empty() { None } else { Some(target) };
        self
    }

    /// Included file paths, relative to the repository root.
    pub fn file_paths(&self) -> Vec<String> {
        self.files.collect_included_paths()
    }

    /// One-line provenance header, e.g. `Scope (Base: abc1234, Target: def5678)`.
    pub fn header(&self) -> String {
        match &self.target_commit {
            Some(target) => format!("Scope (Base: {}, Target: {})", self.base_commit, target),
            None => format!("Scope (Base: {})", self.base_commit),
        }
    }

    /// Write the scope as indented JSON, replacing `path` atomically.
    pub fn save(&self, path: &Path) -> Result<()> {
        let mut data = serde_json::to_vec_pretty(self).map_err(|source| Error::Json {
            context: format!("Error serializing scope {}", self.name),
            source,
        })?;
        data.push(b'\n');
        write_atomic(path, &data).map_err(|e| Error::io("Error writing scope file", path, e))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("Scope file {} doesn't exist", path.display())));
            }
            Err(err) => return Err(Error::io("Failed to read scope file", path, err)),
        };
        serde_json::from_slice(&data).map_err(|err| {
            Error::Invalid(format!("Failed to parse scope file {}: {err}", path.display()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_save_load_round_trip() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("abc1234.main.json");

        let mut scope = Scope::new("main", "abc1234").with_target_commit("def5678");
        for path in ["src/a.go", "src/b/c.go", "README.md", "src/b/d.go"] {
            scope.files.insert(path, true);
        }
        scope.files.set_included("src/b/d.go", false);
        scope.save(&path).expect("save");

        let loaded = Scope::load(&path).expect("load");
        assert_eq!(loaded, scope);
        assert_eq!(loaded.file_paths(), vec!["README.md", "src/a.go", "src/b/c.go"]);
    }

    #[test]
    fn test_hand_written_scope_file() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("scope.json");
        fs::write(
            &path,
            r#"{"name": "review", "baseCommit": "main", "files": {"src": {"a.go": true, "b.go": false}}}"#,
        )
        .expect("write");

        let scope = Scope::load(&path).expect("load");
        assert_eq!(scope.target_commit, None);
        assert_eq!(scope.file_paths(), vec!["src/a.go"]);

        scope.save(&path).expect("save");
        let reloaded = Scope::load(&path).expect("reload");
        assert_eq!(reloaded.file_paths(), vec!["src/a.go"]);
    }

    #[test]
    fn test_saved_form_is_indented_camel_case() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("scope.json");
        let mut scope = Scope::new("main", "abc1234");
        scope.files.insert("a.go", true);
        scope.save(&path).expect("save");

        let text = fs::read_to_string(&path).expect("read");
        assert!(text.contains("\n  \"baseCommit\": \"abc1234\""));
        assert!(!text.contains("targetCommit"));
        assert!(text.contains("\"a.go\": true"));
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let tmp = TempDir::new().expect("tmp");
        let err = Scope::load(&tmp.path().join("nope.json")).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }

    #[test]
    fn test_load_malformed_is_invalid() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{ not json").expect("write");
        let err = Scope::load(&path).unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::Invalid);
    }

    #[test]
    fn test_header() {
        assert_eq!(Scope::new("a", "abc").header(), "Scope (Base: abc)");
        assert_eq!(
            Scope::new("a", "main").with_target_commit("abc").header(),
            "Scope (Base: main, Target: abc)"
        );
    }
}
