//! Editor collaborator: let the user edit the listing in a text editor.
//!
//! The listing is written to a private temporary file, the editor command is
//! run through the shell with the file name appended, and the file is read
//! back once the editor exits.

use anyhow::{Context, Result, bail};
use std::fs;
use std::io::Write;
use std::process::Command;
use tracing::debug;

use crate::fs_ops::io_error_with_help;

/// Editor command used when nothing else is configured.
pub const DEFAULT_EDITOR: &str = "vi";

/// Pick the editor command: explicit choice, then config, then `$VISUAL`,
/// `$EDITOR` and finally [`DEFAULT_EDITOR`]. Empty values are skipped.
pub fn resolve_command(cli: Option<&str>, config: Option<&str>) -> String {
    let env = |name: &str| std::env::var(name).ok();
    [cli.map(str::to_string), config.map(str::to_string), env("VISUAL"), env("EDITOR")]
        .into_iter()
        .flatten()
        .find(|c| !c.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_EDITOR.to_string())
}

/// Run `command` on a temporary file holding `text` and return the edited text.
pub fn edit(text: &str, command: &str) -> Result<String> {
    let file = tempfile::Builder::new()
        .prefix("dir_edit-")
        .suffix(".txt")
        .tempfile()
        .context("create temporary listing file")?;
    {
        let mut handle = file.reopen().context("open temporary listing file")?;
        handle
            .write_all(text.as_bytes())
            .and_then(|_| handle.flush())
            .context("write temporary listing file")?;
    }
    let path = file.into_temp_path();

    let quoted = shlex::try_quote(&path.to_string_lossy())
        .ok()
        .map(|q| q.into_owned())
        .context("temporary file name cannot be quoted")?;
    let line = format!("{command} {quoted}");
    debug!(command = %line, "Launching editor");

    let status = shell(&line)
        .status()
        .with_context(|| format!("failed to launch editor: {command}"))?;
    if !status.success() {
        bail!("editor command failed: {line} ({status})");
    }

    let edited = fs::read(&path).map_err(io_error_with_help("read edited listing", &path))?;
    Ok(String::from_utf8_lossy(&edited).into_owned())
}

#[cfg(unix)]
fn shell(line: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(line);
    cmd
}

#[cfg(not(unix))]
fn shell(line: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(line);
    cmd
}
