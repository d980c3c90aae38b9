//! `llm` subcommands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::Path;
use std::time::Duration;

use super::workspace::Workspace;
use crate::llm::build_generator;
use crate::runner::{Invoker, InvokerSettings};

#[derive(Subcommand)]
pub enum LlmCommand {
    /// Run a prompt on each file of a scope
    Prompt(PromptArgs),
}

#[derive(Args)]
pub struct PromptArgs {
    /// The prompt to run against every file
    #[arg(short, long)]
    pub prompt: String,

    /// Name of the scope (defaults to the selected scope)
    #[arg(short, long, visible_alias = "name")]
    pub scope: Option<String>,

    /// The model to use (sonnet, o1, o1-mini, 4o)
    #[arg(short, long)]
    pub model: Option<String>,

    /// Save each response next to its file as `<file>.llm.md`
    #[arg(long)]
    pub save: bool,
}

pub fn run(command: LlmCommand, config_path: Option<&Path>) -> Result<()> {
    match command {
        LlmCommand::Prompt(args) => prompt(args, config_path),
    }
}

fn prompt(args: PromptArgs, config_path: Option<&Path>) -> Result<()> {
    let ws = Workspace::open(config_path)?;
    let scope = ws.scope(args.scope.as_deref())?;
    let model = args.model.as_deref().unwrap_or(&ws.config.model);
    let generator = build_generator(model, &ws.config)?;

    let settings = InvokerSettings {
        tokens_per_window: f64::from(ws.config.tokens_per_minute),
        refill_interval: Duration::from_secs(ws.config.refill_interval_secs),
        chars_to_tokens: ws.config.chars_to_tokens,
        max_rate_limit_attempts: ws.config.max_rate_limit_attempts,
    };
    let invoker = Invoker::new(generator.as_ref(), &ws.root, settings);

    let spinner = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(spinner_style);
    }
    spinner.set_message(format!(
        "Running prompt over {} files of scope {}...",
        scope.files.included_count(),
        scope.name
    ));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let root = ws.root.clone();
    let save = args.save;
    let result = invoker.run(&scope, &args.prompt, |path, response| {
        if save {
            let output = root.join(format!("{path}.llm.md"));
            fs::write(&output, response)
                .with_context(|| format!("Failed to write response file {}", output.display()))?;
            spinner.println(format!("Response written to: {}", output.display()));
        } else {
            spinner.suspend(|| {
                println!("{}", style(format!("== {path}")).bold());
                println!("{response}");
            });
        }
        Ok(())
    });
    spinner.finish_and_clear();

    let summary = result?;
    println!(
        "{} {} processed, {} binary skipped, {} missing skipped",
        style("✓").green(),
        summary.processed,
        summary.skipped_binary,
        summary.skipped_missing
    );
    Ok(())
}
