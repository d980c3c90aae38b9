//! Command-line interface for coderunner
//!
//! `scope` manages commit-keyed file selections, `llm` runs a prompt over
//! every file of one.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod editor;
mod llm;
mod scope;
mod utils;
mod workspace;

/// Select scopes of a codebase and run LLM prompts over every file in them
#[derive(Parser)]
#[command(name = "coderunner")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file to use instead of the auto-discovered one
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage scopes of a codebase
    #[command(subcommand)]
    Scope(scope::ScopeCommand),

    /// Call an LLM on each file of a scope
    #[command(subcommand)]
    Llm(llm::LlmCommand),

    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Scope(command) => scope::run(command, config_path),
        Commands::Llm(command) => llm::run(command, config_path),
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            let name = command.get_name().to_string();
            clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
            Ok(())
        }
    }
}

/// Log to stderr. `RUST_LOG` wins when set; otherwise `--verbose` selects
/// DEBUG and the default is WARN.
fn init_tracing(verbose: bool) {
    let filter = if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        EnvFilter::from_default_env()
    } else if verbose {
        EnvFilter::default().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::default().add_directive(Level::WARN.into())
    };
    let _ = tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init();
}

/// Print `err` for a human: the short message for user-facing failures, the
/// whole cause chain for internal ones.
pub fn report_error(err: &anyhow::Error) {
    use console::style;

    let detailed = match err.downcast_ref::<crate::Error>() {
        Some(lib_err) => lib_err.kind() == crate::ErrorKind::Internal,
        None => true,
    };
    if detailed {
        eprintln!("{} {:#}", style("error:").red().bold(), err);
    } else {
        eprintln!("{} {}", style("error:").red().bold(), err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_scope_create() {
        let cli = Cli::try_parse_from([
            "coderunner",
            "scope",
            "create",
            "--scope",
            "review",
            "--base",
            "main",
            "--extensions",
            ".go,.ts",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Commands::Scope(_)));
    }

    #[test]
    fn test_target_requires_base() {
        let result = Cli::try_parse_from([
            "coderunner",
            "scope",
            "create",
            "--scope",
            "x",
            "--target",
            "abc",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_llm_prompt_requires_prompt() {
        assert!(Cli::try_parse_from(["coderunner", "llm", "prompt"]).is_err());
    }
}
