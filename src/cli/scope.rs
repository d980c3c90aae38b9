//! `scope` subcommands

use anyhow::Result;
use clap::{Args, Subcommand};
use console::style;
use std::fs;
use std::path::Path;

use super::editor::open_in_editor;
use super::utils::parse_extensions;
use super::workspace::Workspace;
use crate::utils::is_binary_content;

#[derive(Subcommand)]
pub enum ScopeCommand {
    /// List the scopes of the current commit
    List,

    /// Create a scope from the working tree, or from a git diff with --base
    Create(CreateArgs),

    /// Show the selected scope
    Selected,

    /// Select a scope
    Select(NameArg),

    /// Copy a scope
    Copy(CopyArgs),

    /// Open a scope file in an editor
    Edit(EditArgs),

    /// Delete a scope
    Delete(NameArg),

    /// Display the tree of the files in scope
    Tree(OptionalNameArg),

    /// Print the path and content of every file in scope
    Print(OptionalNameArg),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Name of the scope
    #[arg(short, long, visible_alias = "name")]
    pub scope: String,

    /// Commit or branch to diff against; without it the whole tree is scanned
    #[arg(short, long, value_name = "REF")]
    pub base: Option<String>,

    /// Diff target (defaults to the working tree)
    #[arg(short, long, value_name = "REF", requires = "base")]
    pub target: Option<String>,

    /// File extensions to include (e.g. --extensions .go,.js,.ts)
    #[arg(short, long, visible_alias = "ext", value_name = "EXTS")]
    pub extensions: Option<String>,
}

#[derive(Args)]
pub struct NameArg {
    /// Name of the scope
    #[arg(short, long, visible_alias = "name")]
    pub scope: String,
}

#[derive(Args)]
pub struct OptionalNameArg {
    /// Name of the scope (defaults to the selected scope)
    #[arg(short, long, visible_alias = "name")]
    pub scope: Option<String>,
}

#[derive(Args)]
pub struct CopyArgs {
    /// Name of the scope copy
    #[arg(short, long)]
    pub copy: String,

    /// Scope to copy (defaults to the selected scope)
    #[arg(short, long, visible_alias = "name")]
    pub scope: Option<String>,
}

#[derive(Args)]
pub struct EditArgs {
    /// Scope to edit (defaults to the selected scope)
    #[arg(short, long, visible_alias = "name")]
    pub scope: Option<String>,

    /// Editor to open the file with
    #[arg(short, long)]
    pub editor: Option<String>,
}

pub fn run(command: ScopeCommand, config_path: Option<&Path>) -> Result<()> {
    let ws = Workspace::open(config_path)?;

    match command {
        ScopeCommand::List => list(&ws),
        ScopeCommand::Create(args) => create(&ws, args),
        ScopeCommand::Selected => {
            match ws.store.selected_name() {
                Ok(name) => println!("{name}"),
                Err(_) => println!("No selected scope"),
            }
            Ok(())
        }
        ScopeCommand::Select(args) => {
            ws.store.select(&args.scope)?;
            println!("Selected scope {}", style(&args.scope).cyan());
            Ok(())
        }
        ScopeCommand::Copy(args) => {
            let from = match args.scope {
                Some(name) => name,
                None => ws.store.selected_name()?,
            };
            let path = ws.store.copy(&from, &args.copy)?;
            println!("Copied scope {from} to {}", path.display());
            Ok(())
        }
        ScopeCommand::Edit(args) => {
            let name = match args.scope {
                Some(name) => name,
                None => ws.store.selected_name()?,
            };
            // Surface a missing scope before launching anything.
            ws.store.load(&name)?;
            open_in_editor(&ws.store.scope_path(&name), args.editor.as_deref())?;
            Ok(())
        }
        ScopeCommand::Delete(args) => {
            let path = ws.store.delete(&args.scope)?;
            println!("Deleted scope file {}", path.display());
            Ok(())
        }
        ScopeCommand::Tree(args) => {
            let scope = ws.scope(args.scope.as_deref())?;
            println!("{}", style(scope.header()).bold());
            print!("{}", scope.files.render());
            Ok(())
        }
        ScopeCommand::Print(args) => print_files(&ws, args.scope.as_deref()),
    }
}

fn list(ws: &Workspace) -> Result<()> {
    let names = ws.store.list()?;
    if names.is_empty() {
        println!("No scopes for this commit found");
        return Ok(());
    }

    let selected = ws.store.selected_name().ok();
    for name in names {
        if selected.as_deref() == Some(name.as_str()) {
            println!("{} {}", style("*").green(), style(&name).green());
        } else {
            println!("  {name}");
        }
    }
    Ok(())
}

fn create(ws: &Workspace, args: CreateArgs) -> Result<()> {
    crate::scope::validate_scope_name(&args.scope)?;
    let builder = ws.builder(parse_extensions(&args.extensions))?;

    let scope = match &args.base {
        Some(base) => builder.diff_scan(&args.scope, base, args.target.as_deref())?,
        None => builder.full_scan(&args.scope)?,
    };

    let path = ws.store.create(&scope)?;
    println!(
        "Created scope file {} with {} files. You can edit the file to change the scope.",
        path.display(),
        scope.files.included_count()
    );
    Ok(())
}

fn print_files(ws: &Workspace, name: Option<&str>) -> Result<()> {
    let scope = ws.scope(name)?;
    for path in scope.file_paths() {
        let full_path = ws.root.join(&path);
        let content = match fs::read(&full_path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("skipping {path}: file no longer exists");
                continue;
            }
            Err(err) => return Err(crate::Error::io("Failed to read file", &full_path, err).into()),
        };
        if is_binary_content(&content) {
            continue;
        }
        println!("File: {path}");
        println!("Content: {}", String::from_utf8_lossy(&content));
    }
    Ok(())
}
