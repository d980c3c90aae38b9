//! Rate-limited, sequential prompt pipeline over a scope's files.

use crate::error::{Error, Result};
use crate::llm::{PromptError, TextGenerator, TokenBucket};
use crate::scope::Scope;
use crate::utils::{estimate_tokens, is_binary_content};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Budget and retry settings for one run.
#[derive(Debug, Clone)]
pub struct InvokerSettings {
    pub tokens_per_window: f64,
    pub refill_interval: Duration,
    pub chars_to_tokens: f64,
    pub max_rate_limit_attempts: u32,
}

impl Default for InvokerSettings {
    fn default() -> Self {
        Self {
            tokens_per_window: 80_000.0,
            refill_interval: Duration::from_secs(60),
            chars_to_tokens: 0.5,
            max_rate_limit_attempts: 5,
        }
    }
}

/// What happened to the files of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub skipped_binary: usize,
    pub skipped_missing: usize,
}

/// Feeds every included file of a scope through a [`TextGenerator`], one at a
/// time, under a shared token budget.
pub struct Invoker<'a> {
    generator: &'a dyn TextGenerator,
    bucket: TokenBucket,
    settings: InvokerSettings,
    root: PathBuf,
}

impl<'a> Invoker<'a> {
    /// `root` is the directory scope paths are relative to.
    pub fn new(
        generator: &'a dyn TextGenerator,
        root: impl Into<PathBuf>,
        settings: InvokerSettings,
    ) -> Self {
        let bucket = TokenBucket::new(settings.tokens_per_window, settings.refill_interval);
        Self { generator, bucket, settings, root: root.into() }
    }

    pub fn bucket(&self) -> &TokenBucket {
        &self.bucket
    }

    /// Run `prompt` against each included file and hand `(path, response)` to
    /// `on_response`. Binary and missing files are skipped; any other failure
    /// stops the run, leaving earlier callbacks' effects in place.
    pub fn run<F>(&self, scope: &Scope, prompt: &str, mut on_response: F) -> Result<RunSummary>
    where
        F: FnMut(&str, &str) -> anyhow::Result<()>,
    {
        let mut summary = RunSummary::default();

        for path in scope.file_paths() {
            let full_path = self.root.join(&path);
            let content = match read_if_present(&full_path)? {
                Some(content) => content,
                None => {
                    tracing::warn!("skipping {path}: file no longer exists");
                    summary.skipped_missing += 1;
                    continue;
                }
            };

            if is_binary_content(&content) {
                tracing::debug!("skipping binary file {path}");
                summary.skipped_binary += 1;
                continue;
            }

            let full_prompt = compose_prompt(prompt, &String::from_utf8_lossy(&content));
            let response = self.prompt_with_retry(&path, &full_prompt)?;

            on_response(&path, &response)
                .map_err(|source| Error::Callback { path: path.clone(), source })?;
            summary.processed += 1;
            tracing::info!("processed {path} with {}", self.generator.model());
        }

        Ok(summary)
    }

    /// Debit the estimated cost, then call the model. A rate-limit reply drains
    /// the bucket so the next attempt waits out the current window.
    fn prompt_with_retry(&self, path: &str, text: &str) -> Result<String> {
        let cost = estimate_tokens(text, self.settings.chars_to_tokens);
        let attempts = self.settings.max_rate_limit_attempts.max(1);

        for attempt in 1..=attempts {
            self.bucket.acquire(cost);
            match self.generator.prompt(text) {
                Ok(response) => return Ok(response),
                Err(PromptError::RateLimited) => {
                    tracing::warn!(
                        "rate limited on {path} (attempt {attempt}/{attempts}), waiting for refill"
                    );
                    self.bucket.drain();
                }
                Err(source) => return Err(Error::Provider { path: path.to_string(), source }),
            }
        }

        Err(Error::RetriesExhausted { path: path.to_string(), attempts })
    }
}

/// The text sent to the model for one file.
pub fn compose_prompt(prompt: &str, content: &str) -> String {
    format!("{prompt}\n\nFile Content:\n{content}")
}

fn read_if_present(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::io("Failed to read file", path, err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Replays canned results and records every prompt it sees.
    struct ScriptedGenerator {
        replies: Mutex<VecDeque<std::result::Result<String, PromptError>>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn new(replies: Vec<std::result::Result<String, PromptError>>) -> Self {
            Self { replies: Mutex::new(replies.into()), prompts: Mutex::new(Vec::new()) }
        }

        fn echo() -> Self {
            Self::new(Vec::new())
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().expect("lock").clone()
        }
    }

    impl TextGenerator for ScriptedGenerator {
        fn prompt(&self, text: &str) -> std::result::Result<String, PromptError> {
            self.prompts.lock().expect("lock").push(text.to_string());
            self.replies
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or_else(|| Ok(format!("reply {}", text.len())))
        }

        fn model(&self) -> &str {
            "scripted"
        }
    }

    fn fast_settings() -> InvokerSettings {
        InvokerSettings {
            tokens_per_window: 1_000.0,
            refill_interval: Duration::from_millis(10),
            chars_to_tokens: 0.5,
            max_rate_limit_attempts: 3,
        }
    }

    fn repo_with(files: &[(&str, &str)]) -> TempDir {
        let tmp = TempDir::new().expect("tmp");
        for (rel, content) in files {
            let path = tmp.path().join(rel);
            fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
            fs::write(path, content).expect("write");
        }
        tmp
    }

    fn scope_of(json: &str) -> Scope {
        serde_json::from_str(json).expect("scope json")
    }

    #[test]
    fn test_only_included_files_reach_callback() {
        let tmp = repo_with(&[("src/a.go", "package a"), ("src/b.go", "package b")]);
        let scope = scope_of(r#"{"name": "main", "files": {"src": {"a.go": true, "b.go": false}}}"#);
        let generator = ScriptedGenerator::echo();
        let invoker = Invoker::new(&generator, tmp.path(), fast_settings());

        let seen = RefCell::new(Vec::new());
        let summary = invoker
            .run(&scope, "Review", |path, _| {
                seen.borrow_mut().push(path.to_string());
                Ok(())
            })
            .expect("run");

        assert_eq!(seen.into_inner(), vec!["src/a.go"]);
        assert_eq!(summary, RunSummary { processed: 1, skipped_binary: 0, skipped_missing: 0 });
        assert_eq!(generator.prompts(), vec!["Review\n\nFile Content:\npackage a"]);
    }

    #[test]
    fn test_binary_and_missing_files_are_skipped() {
        let tmp = repo_with(&[("img.png", "PNG\0\u{1}data"), ("ok.go", "ok"), ("empty.go", "")]);
        let mut scope = Scope::new("diff", "main");
        for path in ["img.png", "ok.go", "empty.go", "x.go"] {
            scope.files.insert(path, true);
        }
        let generator = ScriptedGenerator::echo();
        let invoker = Invoker::new(&generator, tmp.path(), fast_settings());

        let mut seen = Vec::new();
        let summary = invoker
            .run(&scope, "p", |path, _| {
                seen.push(path.to_string());
                Ok(())
            })
            .expect("run");

        assert_eq!(seen, vec!["empty.go", "ok.go"]);
        assert_eq!(summary.skipped_binary, 1);
        assert_eq!(summary.skipped_missing, 1);
        assert_eq!(summary.processed, 2);
    }

    #[test]
    fn test_rate_limit_retries_same_request() {
        let tmp = repo_with(&[("a.go", "aaaa")]);
        let mut scope = Scope::new("main", "abc");
        scope.files.insert("a.go", true);
        let generator =
            ScriptedGenerator::new(vec![Err(PromptError::RateLimited), Ok("second try".to_string())]);
        let invoker = Invoker::new(&generator, tmp.path(), fast_settings());

        let mut responses = Vec::new();
        invoker
            .run(&scope, "p", |_, response| {
                responses.push(response.to_string());
                Ok(())
            })
            .expect("run");

        assert_eq!(responses, vec!["second try"]);
        let prompts = generator.prompts();
        assert_eq!(prompts.len(), 2);
        assert_eq!(prompts[0], prompts[1]);
    }

    #[test]
    fn test_rate_limit_attempts_are_bounded() {
        let tmp = repo_with(&[("a.go", "a")]);
        let mut scope = Scope::new("main", "abc");
        scope.files.insert("a.go", true);
        let generator = ScriptedGenerator::new(
            (0..5).map(|_| Err(PromptError::RateLimited)).collect(),
        );
        let invoker = Invoker::new(&generator, tmp.path(), fast_settings());

        let err = invoker.run(&scope, "p", |_, _| Ok(())).unwrap_err();
        assert!(matches!(err, Error::RetriesExhausted { attempts: 3, .. }));
        assert_eq!(generator.prompts().len(), 3);
    }

    #[test]
    fn test_provider_error_aborts_run() {
        let tmp = repo_with(&[("a.go", "a"), ("b.go", "b")]);
        let mut scope = Scope::new("main", "abc");
        scope.files.insert("a.go", true);
        scope.files.insert("b.go", true);
        let generator = ScriptedGenerator::new(vec![Err(PromptError::Status {
            status: 400,
            body: "bad request".to_string(),
        })]);
        let invoker = Invoker::new(&generator, tmp.path(), fast_settings());

        let mut calls = 0;
        let err = invoker
            .run(&scope, "p", |_, _| {
                calls += 1;
                Ok(())
            })
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.to_string().contains("a.go"));
        assert_eq!(calls, 0);
        assert_eq!(generator.prompts().len(), 1);
    }

    #[test]
    fn test_callback_failure_aborts_remaining_files() {
        let tmp = repo_with(&[("a.go", "a"), ("b.go", "b")]);
        let mut scope = Scope::new("main", "abc");
        scope.files.insert("a.go", true);
        scope.files.insert("b.go", true);
        let generator = ScriptedGenerator::echo();
        let invoker = Invoker::new(&generator, tmp.path(), fast_settings());

        let err = invoker.run(&scope, "p", |_, _| Err(anyhow::anyhow!("disk full"))).unwrap_err();
        assert!(matches!(err, Error::Callback { ref path, .. } if path == "a.go"));
        assert_eq!(generator.prompts().len(), 1);
    }

    #[test]
    fn test_each_call_debits_the_bucket() {
        let tmp = repo_with(&[("a.go", "0123456789")]);
        let mut scope = Scope::new("main", "abc");
        scope.files.insert("a.go", true);
        let generator = ScriptedGenerator::echo();
        let settings = InvokerSettings {
            refill_interval: Duration::from_secs(60),
            ..fast_settings()
        };
        let invoker = Invoker::new(&generator, tmp.path(), settings);

        invoker.run(&scope, "p", |_, _| Ok(())).expect("run");
        let composed = compose_prompt("p", "0123456789");
        let expected = 1_000.0 - composed.chars().count() as f64 * 0.5;
        assert_eq!(invoker.bucket().remaining(), expected);
    }
}
