//! Opening scope files for hand editing.

use std::path::Path;
use std::process::Command;

use crate::error::{Error, Result};

/// Open `path` with `editor`, else `$VISUAL`/`$EDITOR`, else the platform
/// opener. Waits for the editor to exit.
pub fn open_in_editor(path: &Path, editor: Option<&str>) -> Result<()> {
    if !path.is_file() {
        return Err(Error::NotFound(format!("File {} not found", path.display())));
    }

    let chosen = editor
        .map(str::to_string)
        .or_else(|| env_editor("VISUAL"))
        .or_else(|| env_editor("EDITOR"));

    let mut command = match &chosen {
        Some(editor) => {
            // Allow values like `code --wait`.
            let mut parts = editor.split_whitespace();
            let program = parts.next().unwrap_or(editor.as_str());
            let mut command = Command::new(program);
            command.args(parts);
            command
        }
        None => platform_opener(),
    };
    command.arg(path);

    let program = command.get_program().to_string_lossy().into_owned();
    tracing::debug!("opening {} with {}", path.display(), program);
    let status = command.status().map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::Unavailable(format!("{program} is not installed in the system"))
        } else {
            Error::io(format!("Failed to launch {program} for"), path, err)
        }
    })?;

    if !status.success() {
        return Err(Error::Invalid(format!(
            "Failed to open file {} with {program} ({status})",
            path.display()
        )));
    }
    Ok(())
}

fn env_editor(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn platform_opener() -> Command {
    if cfg!(target_os = "macos") {
        let mut command = Command::new("open");
        command.arg("-t");
        command
    } else if cfg!(windows) {
        let mut command = Command::new("cmd");
        command.args(["/C", "start", "/wait", ""]);
        command
    } else {
        Command::new("xdg-open")
    }
}
