//! Error types shared by the scope engine and the invocation pipeline.

use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::llm::PromptError;

/// Coarse classification used by the CLI to decide how much detail to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Invalid,
    Internal,
    Unavailable,
}

#[derive(Error, Debug)]
pub enum Error {
    /// A scope, commit context or file does not exist.
    #[error("{0}")]
    NotFound(String),

    /// Malformed input: bad scope file, reserved name, unknown model.
    #[error("{0}")]
    Invalid(String),

    /// A required external tool or environment is missing.
    #[error("{0}")]
    Unavailable(String),

    #[error("{context}: {}", path.display())]
    Io {
        context: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{context}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}")]
    Git {
        context: String,
        #[source]
        source: git2::Error,
    },

    #[error("model call failed for {path}")]
    Provider {
        path: String,
        #[source]
        source: PromptError,
    },

    #[error("provider kept rate limiting {path} after {attempts} attempts")]
    RetriesExhausted { path: String, attempts: u32 },

    #[error("callback failed for {path}")]
    Callback {
        path: String,
        #[source]
        source: anyhow::Error,
    },
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Invalid(_) => ErrorKind::Invalid,
            Error::Unavailable(_) => ErrorKind::Unavailable,
            Error::Io { .. }
            | Error::Json { .. }
            | Error::Git { .. }
            | Error::Provider { .. }
            | Error::RetriesExhausted { .. }
            | Error::Callback { .. } => ErrorKind::Internal,
        }
    }

    pub(crate) fn io(context: impl Into<String>, path: &Path, source: std::io::Error) -> Self {
        Error::Io { context: context.into(), path: path.to_path_buf(), source }
    }

    pub(crate) fn git(context: impl Into<String>, source: git2::Error) -> Self {
        Error::Git { context: context.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
