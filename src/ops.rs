//! Filesystem operations emitted by the resolver and consumed by the executor.
//! Paths are relative to the edited directory.

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    MakeDir(PathBuf),
    Rename { from: PathBuf, to: PathBuf },
    RemoveFile(PathBuf),
    RemoveDir(PathBuf),
    /// Recursive removal of a non-empty directory (`--remove-recursive`).
    RemoveTree(PathBuf),
}

impl Operation {
    pub fn rename(from: impl Into<PathBuf>, to: impl Into<PathBuf>) -> Self {
        Operation::Rename {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Shell command name equivalent to this operation.
    pub fn command(&self) -> &'static str {
        match self {
            Operation::MakeDir(_) => "mkdir",
            Operation::Rename { .. } => "mv -n",
            Operation::RemoveFile(_) => "rm",
            Operation::RemoveDir(_) => "rmdir",
            Operation::RemoveTree(_) => "rm -r",
        }
    }

    pub fn paths(&self) -> Vec<&Path> {
        match self {
            Operation::Rename { from, to } => vec![from.as_path(), to.as_path()],
            Operation::MakeDir(p)
            | Operation::RemoveFile(p)
            | Operation::RemoveDir(p)
            | Operation::RemoveTree(p) => vec![p.as_path()],
        }
    }

    /// Render as a line a POSIX shell can replay, e.g. `mv -n a 'b c'`.
    pub fn shell_line(&self) -> String {
        let args: Vec<Cow<'_, str>> = self.paths().into_iter().map(|p| p.to_string_lossy()).collect();
        shell_command(self.command(), &args)
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.shell_line())
    }
}

/// Join a command and quoted arguments; `--` guards arguments that look like options.
pub fn shell_command(command: &str, args: &[Cow<'_, str>]) -> String {
    let sep = if args.iter().any(|a| a.starts_with('-')) { " -- " } else { " " };
    let quoted: Vec<Cow<'_, str>> = args.iter().map(|a| quote(a)).collect();
    format!("{command}{sep}{}", quoted.join(" "))
}

fn quote(arg: &str) -> Cow<'_, str> {
    // try_quote only fails on interior NUL bytes, which paths cannot contain.
    shlex::try_quote(arg).unwrap_or_else(|_| Cow::Owned(format!("'{}'", arg.replace('\'', r"'\''"))))
}
