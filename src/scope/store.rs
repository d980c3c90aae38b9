//! Commit-keyed scope storage and the per-commit selection pointer.
//!
//! Files live in one storage directory:
//! `{dir}/{short_hash}.{scope}.json` for scopes and
//! `{dir}/{short_hash}.context.json` for the selected-scope pointer, so
//! checkouts of different commits never see each other's scopes.

use crate::error::{Error, Result};
use crate::git::GitProvider;
use crate::scope::Scope;
use crate::utils::write_atomic;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the pointer file; never usable as a scope name.
pub const CONTEXT_NAME: &str = "context";

const EXTENSION: &str = "json";

/// Which scope commands use when none is named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitContext {
    pub selected_scope: String,
}

impl CommitContext {
    pub fn new(scope: impl Into<String>) -> Self {
        Self { selected_scope: scope.into() }
    }
}

/// Scope storage for one commit.
#[derive(Debug, Clone)]
pub struct ScopeStore {
    dir: PathBuf,
    commit: String,
}

impl ScopeStore {
    pub fn new(dir: impl Into<PathBuf>, commit: impl Into<String>) -> Self {
        Self { dir: dir.into(), commit: commit.into() }
    }

    /// Key the store by the repository's current short commit hash.
    pub fn for_repo(dir: impl Into<PathBuf>, git: &dyn GitProvider) -> Result<Self> {
        let info = git.info()?;
        if !info.is_repo {
            return Err(Error::Unavailable(
                "Not inside a git repository; scopes are stored per commit".to_string(),
            ));
        }
        Ok(Self::new(dir, info.commit))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn commit(&self) -> &str {
        &self.commit
    }

    pub fn scope_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{}.{}", self.commit, name, EXTENSION))
    }

    pub fn context_path(&self) -> PathBuf {
        self.scope_path(CONTEXT_NAME)
    }

    /// Create the storage directory and keep it out of version control by
    /// listing it in the `.gitignore` of `repo_root`.
    pub fn init(&self, repo_root: &Path) -> Result<()> {
        fs::create_dir_all(&self.dir)
            .map_err(|e| Error::io("Failed to create storage directory", &self.dir, e))?;

        let entry = match self.dir.strip_prefix(repo_root) {
            Ok(rel) => crate::utils::normalize_path(&rel.to_string_lossy()),
            // Storage outside the repository needs no ignore entry.
            Err(_) => return Ok(()),
        };
        add_to_gitignore(&repo_root.join(".gitignore"), &entry)
    }

    /// Save a freshly built scope and make it the selected one.
    pub fn create(&self, scope: &Scope) -> Result<PathBuf> {
        validate_scope_name(&scope.name)?;
        let path = self.save(scope)?;
        self.save_context(&CommitContext::new(&scope.name))?;
        tracing::info!("created scope {} at {}", scope.name, path.display());
        Ok(path)
    }

    pub fn save(&self, scope: &Scope) -> Result<PathBuf> {
        validate_scope_name(&scope.name)?;
        let path = self.scope_path(&scope.name);
        scope.save(&path)?;
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Scope> {
        validate_scope_name(name)?;
        let path = self.scope_path(name);
        if !path.is_file() {
            return Err(Error::NotFound(format!("Scope {name} doesn't exist")));
        }
        Scope::load(&path)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.scope_path(name).is_file()
    }

    /// Load the scope the selection pointer names.
    pub fn load_selected(&self) -> Result<Scope> {
        let name = self.selected_name()?;
        self.load(&name).map_err(|err| match err {
            Error::NotFound(_) => Error::NotFound(format!(
                "Selected scope {name} no longer exists, select another scope"
            )),
            other => other,
        })
    }

    pub fn selected_name(&self) -> Result<String> {
        Ok(self.load_context()?.selected_scope)
    }

    /// `name` if given, otherwise the selected scope.
    pub fn resolve(&self, name: Option<&str>) -> Result<Scope> {
        match name {
            Some(name) => self.load(name),
            None => self.load_selected(),
        }
    }

    /// Point the selection at an existing scope.
    pub fn select(&self, name: &str) -> Result<()> {
        validate_scope_name(name)?;
        if !self.exists(name) {
            return Err(Error::NotFound(format!("Scope {name} doesn't exist")));
        }
        self.save_context(&CommitContext::new(name))
    }

    pub fn load_context(&self) -> Result<CommitContext> {
        let path = self.context_path();
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(
                    "No commit context, create a new scope or select an existing one".to_string(),
                ));
            }
            Err(err) => return Err(Error::io("Error reading commit context file", &path, err)),
        };
        serde_json::from_slice(&data).map_err(|err| {
            Error::Invalid(format!("Error parsing commit context file {}: {err}", path.display()))
        })
    }

    pub fn save_context(&self, context: &CommitContext) -> Result<()> {
        let path = self.context_path();
        let data = serde_json::to_vec_pretty(context).map_err(|source| Error::Json {
            context: "Error serializing commit context".to_string(),
            source,
        })?;
        write_atomic(&path, &data)
            .map_err(|e| Error::io("Error writing commit context file", &path, e))
    }

    /// Scope names stored for the current commit, sorted.
    pub fn list(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::io("Error reading storage directory", &self.dir, err)),
        };

        let prefix = format!("{}.", self.commit);
        let suffix = format!(".{EXTENSION}");
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io("Error reading storage directory", &self.dir, e))?;
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            let Some(name) =
                file_name.strip_prefix(&prefix).and_then(|rest| rest.strip_suffix(&suffix))
            else {
                continue;
            };
            if name.trim().is_empty() || name == CONTEXT_NAME {
                continue;
            }
            names.push(name.to_string());
        }
        names.sort();
        Ok(names)
    }

    /// Copy scope `from` to a new scope `to`.
    pub fn copy(&self, from: &str, to: &str) -> Result<PathBuf> {
        validate_scope_name(to)?;
        if self.exists(to) {
            return Err(Error::Invalid(format!("Target scope '{to}' already exists")));
        }
        let mut scope = self.load(from)?;
        scope.name = to.to_string();
        self.save(&scope)
    }

    /// Delete a scope. If it was selected, the selection pointer is removed
    /// too rather than left dangling.
    pub fn delete(&self, name: &str) -> Result<PathBuf> {
        validate_scope_name(name)?;
        let path = self.scope_path(name);
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::NotFound(format!("Scope {name} doesn't exist")));
            }
            Err(err) => return Err(Error::io("Failed to delete scope file", &path, err)),
        }

        if let Ok(context) = self.load_context() {
            if context.selected_scope == name {
                let context_path = self.context_path();
                fs::remove_file(&context_path).map_err(|e| {
                    Error::io("Failed to clear commit context", &context_path, e)
                })?;
                tracing::info!("cleared selection pointing at deleted scope {name}");
            }
        }
        Ok(path)
    }
}

/// Reject names that would collide with the pointer file or escape the
/// storage directory.
pub fn validate_scope_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::Invalid("Scope name cannot be empty".to_string()));
    }
    if name == CONTEXT_NAME {
        return Err(Error::Invalid(format!("Scope name '{CONTEXT_NAME}' is reserved")));
    }
    if name.contains('/') || name.contains('\\') {
        return Err(Error::Invalid(format!("Scope name '{name}' cannot contain path separators")));
    }
    Ok(())
}

/// Append `entry` to the ignore file unless a line already equals it.
fn add_to_gitignore(path: &Path, entry: &str) -> Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(Error::io("Failed to read .gitignore", path, err)),
    };

    if existing.lines().any(|line| line.trim() == entry) {
        return Ok(());
    }

    let mut lines: Vec<&str> = existing.lines().collect();
    if lines.last().is_some_and(|last| !last.is_empty()) {
        lines.push("");
    }
    lines.push(entry);
    let mut content = lines.join("\n");
    content.push('\n');

    write_atomic(path, content.as_bytes())
        .map_err(|e| Error::io("Failed to write .gitignore", path, e))?;
    tracing::debug!("added {entry} to {}", path.display());
    Ok(())
}
