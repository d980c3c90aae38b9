//! Scope construction from the working tree or from a git diff.

use crate::error::{Error, Result};
use crate::git::GitProvider;
use crate::scan::PathMatcher;
use crate::scope::Scope;
use crate::utils::normalize_path;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Builds scopes for one repository root.
pub struct ScopeBuilder<'a> {
    root: PathBuf,
    matcher: PathMatcher,
    git: &'a dyn GitProvider,
}

impl<'a> ScopeBuilder<'a> {
    pub fn new(root: impl Into<PathBuf>, matcher: PathMatcher, git: &'a dyn GitProvider) -> Self {
        Self { root: root.into(), matcher, git }
    }

    /// Every non-ignored file under the root, based on the current commit.
    ///
    /// Ignored directories are pruned without descending; symlinks are not
    /// followed. Any entry the walk cannot read fails the whole scan.
    pub fn full_scan(&self, name: &str) -> Result<Scope> {
        let info = self.git.info()?;
        let mut scope = Scope::new(name, info.commit);

        let walker = WalkDir::new(&self.root).min_depth(1).follow_links(false);
        let mut skipped = 0usize;
        for entry in walker.into_iter().filter_entry(|e| {
            if !e.file_type().is_dir() {
                return true;
            }
            match relative(&self.root, e.path()) {
                Some(rel) => !self.matcher.should_ignore(&rel, true),
                None => true,
            }
        }) {
            let entry = entry.map_err(|err| walk_error(&self.root, err))?;
            if entry.file_type().is_dir() {
                continue;
            }
            let Some(rel) = relative(&self.root, entry.path()) else {
                continue;
            };
            if self.matcher.should_ignore(&rel, false) {
                skipped += 1;
                continue;
            }
            scope.files.insert(&rel, true);
        }

        tracing::info!(
            "full scan of {} included {} files ({} ignored)",
            self.root.display(),
            scope.files.included_count(),
            skipped
        );
        Ok(scope)
    }

    /// Files changed between `base` and `target` (the working tree when
    /// `target` is `None`). Deleted files are kept so the scope still records
    /// them; invoking over them later skips what no longer exists.
    pub fn diff_scan(&self, name: &str, base: &str, target: Option<&str>) -> Result<Scope> {
        let target_commit = match target {
            Some(target) => target.to_string(),
            None => self.git.info()?.commit,
        };
        let changed = self.git.changed_paths(base, target)?;

        let mut scope = Scope::new(name, base).with_target_commit(target_commit);
        for path in changed {
            let path = normalize_path(path.trim());
            if path.is_empty() {
                continue;
            }
            if self.matcher.should_ignore(&path, false) {
                tracing::debug!("diff scan ignoring {path}");
                continue;
            }
            scope.files.insert(&path, true);
        }

        tracing::info!(
            "diff scan {base}..{} included {} files",
            target.unwrap_or("<worktree>"),
            scope.files.included_count()
        );
        Ok(scope)
    }
}

fn walk_error(root: &Path, err: walkdir::Error) -> Error {
    let path = err.path().unwrap_or(root).to_path_buf();
    let source = err.into_io_error().unwrap_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "filesystem loop detected")
    });
    Error::io("Error accessing path", &path, source)
}

fn relative(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let rel = normalize_path(&rel.to_string_lossy());
    if rel.is_empty() {
        None
    } else {
        Some(rel)
    }
}
