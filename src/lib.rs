//! coderunner: pick a scope of a codebase and run an LLM prompt over it
//!
//! Scopes are named, commit-keyed selections of repository files built from
//! a full working-tree scan or from a git diff. The runner feeds every
//! included file to a text-generation provider under a shared token budget.

pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod llm;
pub mod runner;
pub mod scan;
pub mod scope;
pub mod utils;

pub use error::{Error, ErrorKind, Result};
