//! Repository context shared by the scope and llm commands.

use std::path::{Path, PathBuf};

use crate::config::{load_config, Config};
use crate::error::{Error, Result};
use crate::git::GitRepo;
use crate::scan::{PathMatcher, ScopeBuilder};
use crate::scope::{Scope, ScopeStore};

/// The repository the command runs in, its config and its scope storage.
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
    pub git: GitRepo,
    pub store: ScopeStore,
}

impl Workspace {
    /// Discover the repository from the current directory, load its config
    /// and make sure scope storage exists.
    pub fn open(config_path: Option<&Path>) -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| Error::io("Failed to read current directory", Path::new("."), e))?;
        Self::open_at(&cwd, config_path)
    }

    pub fn open_at(dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let git = GitRepo::discover(dir);
        let root = git
            .workdir()
            .ok_or_else(|| Error::Unavailable("Not inside a git repository".to_string()))?;
        let config = load_config(&root, config_path)?;
        let store = ScopeStore::for_repo(root.join(&config.storage_dir), &git)?;
        store.init(&root)?;
        tracing::debug!("workspace at {} (commit {})", root.display(), store.commit());
        Ok(Self { root, config, git, store })
    }

    /// Default rules, then config rules, then the project ignore file.
    /// `extensions` overrides the configured allow-list when given.
    pub fn matcher(&self, extensions: Option<Vec<String>>) -> Result<PathMatcher> {
        let mut matcher = PathMatcher::default().add_rules(self.config.ignore.iter().cloned());
        if self.config.storage_dir != ".coderunner" {
            matcher = matcher.add_rules([self.config.storage_dir.clone()]);
        }
        let matcher = matcher.load_ignore_file(&self.root.join(&self.config.ignore_file))?;
        let extensions = extensions.unwrap_or_else(|| self.config.extensions.clone());
        Ok(matcher.allowed_extensions(extensions))
    }

    pub fn builder(&self, extensions: Option<Vec<String>>) -> Result<ScopeBuilder<'_>> {
        Ok(ScopeBuilder::new(&self.root, self.matcher(extensions)?, &self.git))
    }

    /// The named scope, or the selected one.
    pub fn scope(&self, name: Option<&str>) -> Result<Scope> {
        self.store.resolve(name)
    }
}
