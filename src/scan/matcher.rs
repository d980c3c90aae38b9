//! Ignore-rule and extension filtering for scope candidates.
//!
//! The rule language is a small subset of gitignore: first match
//! wins and there is no `!` negation, so a path matched by any rule can never
//! be re-included.

use crate::error::{Error, Result};
use crate::utils::{last_component, normalize_path};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Rules every matcher starts from.
pub const DEFAULT_IGNORE_RULES: &[&str] = &[
    ".git",
    ".DS_Store",
    "._.DS_Store",
    "Thumbs.db",
    "desktop.ini",
    "*.swp",
    "*~",
    ".vscode",
    ".idea",
    "*.tmp",
    "*.temp",
    ".env",
    "node_modules",
    ".coderunner",
];

/// Decides whether a repository-relative path is left out of a scope.
#[derive(Debug, Clone)]
pub struct PathMatcher {
    rules: Vec<String>,
    extensions: BTreeSet<String>,
}

impl Default for PathMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_RULES.iter().map(|r| r.to_string()).collect())
    }
}

impl PathMatcher {
    /// Create a matcher from an explicit rule list and no extension allow-list.
    pub fn new(rules: Vec<String>) -> Self {
        Self { rules, extensions: BTreeSet::new() }
    }

    /// Restrict files to these extensions (`.go`, `ts`, ...). Empty means any.
    pub fn allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.extensions = extensions
            .into_iter()
            .map(|e| normalize_extension(e.as_ref()))
            .filter(|e| e != ".")
            .collect();
        self
    }

    /// Append rules after the existing ones.
    pub fn add_rules<I, S>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rules.extend(rules.into_iter().map(Into::into).filter(|r: &String| !r.is_empty()));
        self
    }

    /// Append the rules of a project ignore file. A missing file adds nothing.
    pub fn load_ignore_file(self, path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(self),
            Err(err) => return Err(Error::io("Failed to read ignore file", path, err)),
        };
        let rules = parse_ignore_file(&content);
        tracing::debug!("loaded {} ignore rules from {}", rules.len(), path.display());
        Ok(self.add_rules(rules))
    }

    pub fn rules(&self) -> &[String] {
        &self.rules
    }

    /// Whether `path` (relative to the scan root) should be left out.
    ///
    /// `is_dir` tells the matcher the entry kind; the extension allow-list only
    /// applies to files. Matching directories are meant to be pruned whole.
    pub fn should_ignore(&self, path: &str, is_dir: bool) -> bool {
        let normalized = normalize_path(path);
        let rel = normalized.trim_start_matches("./").trim_end_matches('/');
        let base = last_component(rel);

        if self.rules.iter().any(|rule| rule == base) {
            return true;
        }

        if !is_dir && !self.extensions.is_empty() {
            let allowed = extension_of(base).is_some_and(|ext| self.extensions.contains(&ext));
            if !allowed {
                return true;
            }
        }

        self.rules.iter().any(|rule| rule_matches(rule, rel, base))
    }
}

fn rule_matches(rule: &str, rel: &str, base: &str) -> bool {
    let rule = rule.strip_prefix("*/").unwrap_or(rule);
    let rule = rule.strip_prefix("./").unwrap_or(rule);
    let rule = rule.strip_prefix('/').unwrap_or(rule);
    if rule.is_empty() {
        return false;
    }

    // Directory contents: `build/*` covers `build/out.o` but not `buildfile.txt`.
    if let Some(dir) = rule.strip_suffix("/*") {
        return rel.starts_with(&format!("{dir}/"));
    }

    if let Some(dir) = rule.strip_suffix('/') {
        return has_path_prefix(rel, dir);
    }

    if rule.starts_with("*.") {
        let suffix = &rule[1..];
        return rel.ends_with(suffix) || base.ends_with(suffix);
    }

    if rule.contains('*') && fragments_in_order(rule, rel) {
        return true;
    }

    has_path_prefix(rel, rule)
}

/// Every non-empty `*`-separated fragment of `rule` appears in `rel`, left to right.
fn fragments_in_order(rule: &str, rel: &str) -> bool {
    let mut remaining = rel;
    for fragment in rule.split('*').filter(|f| !f.is_empty()) {
        match remaining.find(fragment) {
            Some(idx) => remaining = &remaining[idx + fragment.len()..],
            None => return false,
        }
    }
    true
}

/// `prefix` equals `rel` or names one of its ancestor directories.
fn has_path_prefix(rel: &str, prefix: &str) -> bool {
    match rel.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

fn extension_of(base: &str) -> Option<String> {
    Path::new(base).extension().and_then(|e| e.to_str()).map(|e| format!(".{e}"))
}

/// `ts` → `.ts`, `.ts` stays as is.
pub fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{ext}")
    }
}

/// Parse gitignore-style content into plain rules.
///
/// Comment lines are dropped, and a trailing comment is stripped only when the
/// `#` follows whitespace so patterns like `.#*` survive. Negations are not
/// supported and are skipped.
pub fn parse_ignore_file(content: &str) -> Vec<String> {
    let mut rules = Vec::new();
    for line in content.lines() {
        let mut line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(idx) = line.find(" #").or_else(|| line.find("\t#")) {
            line = line[..idx].trim();
        }
        if line.is_empty() {
            continue;
        }
        if line.starts_with('!') {
            tracing::debug!("skipping unsupported negated ignore rule {line}");
            continue;
        }
        rules.push(line.to_string());
    }
    rules
}
