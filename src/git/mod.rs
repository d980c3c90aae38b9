//! Repository metadata and diff listing.

use crate::error::{Error, Result};
use git2::{Delta, DiffOptions, Repository};
use std::path::{Path, PathBuf};

/// Snapshot of the repository state scopes are keyed by.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GitInfo {
    pub is_repo: bool,
    /// Abbreviated HEAD commit hash.
    pub commit: String,
    pub branch: String,
}

/// Source of commit information and changed-file lists.
pub trait GitProvider {
    fn info(&self) -> Result<GitInfo>;

    /// Paths added, modified or deleted between `from` and `to`. With no `to`,
    /// compares `from` against the working tree (index included).
    fn changed_paths(&self, from: &str, to: Option<&str>) -> Result<Vec<String>>;
}

/// [`GitProvider`] backed by libgit2.
pub struct GitRepo {
    repo: Option<Repository>,
}

impl GitRepo {
    /// Discover the repository containing `path`. Not being inside a
    /// repository is not an error; [`GitProvider::info`] reports it.
    pub fn discover(path: &Path) -> Self {
        let repo = Repository::discover(path).ok();
        if repo.is_none() {
            tracing::debug!("no git repository found from {}", path.display());
        }
        Self { repo }
    }

    /// Root of the working tree, when there is one.
    pub fn workdir(&self) -> Option<PathBuf> {
        self.repo.as_ref().and_then(|r| r.workdir()).map(Path::to_path_buf)
    }

    fn require_repo(&self) -> Result<&Repository> {
        self.repo
            .as_ref()
            .ok_or_else(|| Error::Unavailable("Not inside a git repository".to_string()))
    }
}

impl GitProvider for GitRepo {
    fn info(&self) -> Result<GitInfo> {
        let Some(repo) = self.repo.as_ref() else {
            return Ok(GitInfo::default());
        };

        let head = repo.head().map_err(|e| {
            if e.code() == git2::ErrorCode::UnbornBranch {
                Error::NotFound("Repository has no commits yet".to_string())
            } else {
                Error::git("failed to read HEAD", e)
            }
        })?;
        let commit = head.peel_to_commit().map_err(|e| Error::git("HEAD is not a commit", e))?;
        let short = commit
            .as_object()
            .short_id()
            .map_err(|e| Error::git("failed to get short commit hash", e))?;
        let commit = short.as_str().unwrap_or_default().to_string();
        let branch = head.shorthand().unwrap_or("HEAD").to_string();

        Ok(GitInfo { is_repo: true, commit, branch })
    }

    fn changed_paths(&self, from: &str, to: Option<&str>) -> Result<Vec<String>> {
        let repo = self.require_repo()?;
        let base = repo
            .revparse_single(from)
            .and_then(|obj| obj.peel_to_tree())
            .map_err(|e| Error::git(format!("failed to resolve base {from}"), e))?;

        let mut opts = DiffOptions::new();
        let diff = match to {
            Some(to) => {
                let target = repo
                    .revparse_single(to)
                    .and_then(|obj| obj.peel_to_tree())
                    .map_err(|e| Error::git(format!("failed to resolve target {to}"), e))?;
                repo.diff_tree_to_tree(Some(&base), Some(&target), Some(&mut opts))
            }
            None => repo.diff_tree_to_workdir_with_index(Some(&base), Some(&mut opts)),
        }
        .map_err(|e| Error::git("failed to compute git diff", e))?;

        let mut paths = Vec::new();
        for delta in diff.deltas() {
            let file = match delta.status() {
                Delta::Added | Delta::Modified => delta.new_file(),
                Delta::Deleted => delta.old_file(),
                _ => continue,
            };
            if let Some(path) = file.path() {
                paths.push(path.to_string_lossy().into_owned());
            }
        }
        tracing::debug!("git diff {from}..{} listed {} paths", to.unwrap_or("<worktree>"), paths.len());
        Ok(paths)
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{commit_files, init_repo};
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_info_outside_repo() {
        let tmp = TempDir::new().expect("tmp");
        let git = GitRepo::discover(tmp.path());
        // The temp dir may live under some unrelated checkout; only assert when
        // discovery found nothing.
        if git.workdir().is_none() {
            assert_eq!(git.info().expect("info"), GitInfo::default());
            assert!(git.changed_paths("HEAD", None).is_err());
        }
    }

    #[test]
    fn test_info_reports_short_hash_and_branch() {
        let tmp = TempDir::new().expect("tmp");
        let repo = init_repo(tmp.path());
        let oid = commit_files(&repo, &[("a.go", "package a\n")], "init");

        let info = GitRepo::discover(tmp.path()).info().expect("info");
        assert!(info.is_repo);
        assert!(oid.to_string().starts_with(&info.commit));
        assert!(info.commit.len() >= 7);
        assert!(!info.branch.is_empty());
    }

    #[test]
    fn test_unborn_head_is_not_found() {
        let tmp = TempDir::new().expect("tmp");
        init_repo(tmp.path());
        let err = GitRepo::discover(tmp.path()).info().unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::NotFound);
    }

    #[test]
    fn test_changed_paths_between_commits() {
        let tmp = TempDir::new().expect("tmp");
        let repo = init_repo(tmp.path());
        let base = commit_files(
            &repo,
            &[("keep.go", "k\n"), ("edit.go", "v1\n"), ("gone.go", "bye\n")],
            "base",
        );
        fs::remove_file(tmp.path().join("gone.go")).expect("rm");
        let target =
            commit_files(&repo, &[("edit.go", "v2\n"), ("src/new.go", "new\n")], "target");

        let git = GitRepo::discover(tmp.path());
        let mut paths = git
            .changed_paths(&base.to_string(), Some(&target.to_string()))
            .expect("diff");
        paths.sort();
        assert_eq!(paths, vec!["edit.go", "gone.go", "src/new.go"]);
    }

    #[test]
    fn test_changed_paths_against_worktree() {
        let tmp = TempDir::new().expect("tmp");
        let repo = init_repo(tmp.path());
        commit_files(&repo, &[("a.go", "v1\n"), ("b.go", "v1\n")], "base");
        fs::write(tmp.path().join("a.go"), "v2\n").expect("edit");
        fs::remove_file(tmp.path().join("b.go")).expect("rm");

        let mut paths = GitRepo::discover(tmp.path()).changed_paths("HEAD", None).expect("diff");
        paths.sort();
        assert_eq!(paths, vec!["a.go", "b.go"]);
    }
}
