//! CLI definition and parsing.
//!
//! Notes:
//! - Boolean flags can only switch a setting on; the config file supplies the rest.
//! - --debug is a shorthand for --log-level debug.

use clap::{Parser, ValueHint};
use std::path::PathBuf;

use crate::config::types::{Config, LogLevel};
use crate::plan::NestedPolicy;

/// Rename and delete files by editing their names in a text editor.
/// CLI flags override values from the XML config file.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Edit a directory listing in your editor and apply the changes")]
pub struct Args {
    /// Directory to edit.
    #[arg(value_name = "DIR", default_value = ".", value_hint = ValueHint::DirPath)]
    pub dir: PathBuf,

    /// Only list these paths (relative to DIR) instead of the directory contents.
    #[arg(value_name = "FILES", value_hint = ValueHint::AnyPath)]
    pub files: Vec<PathBuf>,

    /// Include entries starting with a dot.
    #[arg(short = 'a', long)]
    pub all: bool,

    /// Print the operations but do not touch the filesystem.
    #[arg(short = 'd', long)]
    pub dry_run: bool,

    /// Editor command (default: $VISUAL, $EDITOR, vi).
    #[arg(short = 'e', long, value_name = "CMD", value_hint = ValueHint::CommandString)]
    pub editor: Option<String>,

    /// Read the paths to edit from FILE, one per line.
    #[arg(short = 'i', long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub input: Option<PathBuf>,

    /// Read the new names from FILE instead of running an editor.
    #[arg(short = 'o', long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub output: Option<PathBuf>,

    /// Replace newlines in names with a blank instead of refusing them.
    #[arg(short = 'm', long)]
    pub mangle_newlines: bool,

    /// Sort by leading number (e.g. `2 - b` before `10 - a`).
    #[arg(short = 'n', long)]
    pub numeric_sort: bool,

    /// Allow deleting non-empty directories.
    #[arg(short = 'R', long)]
    pub remove_recursive: bool,

    /// List recursively; create target directories and remove emptied ones.
    #[arg(short = 'r', long)]
    pub recursive: bool,

    /// Never create or remove directories.
    #[arg(short = 'S', long)]
    pub safe: bool,

    /// Write the operation trace to FILE instead of stdout.
    #[arg(short = 'L', long, value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub logfile: Option<PathBuf>,

    /// Print each operation as it is performed.
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// How to treat a changed entry inside a changed directory.
    #[arg(long, value_enum, value_name = "POLICY")]
    pub nested: Option<NestedPolicy>,

    /// Set log level: quiet, normal, info, debug.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Enable debug logging (shorthand for --log-level debug).
    #[arg(long)]
    pub debug: bool,

    /// Emit diagnostic logs as JSON.
    #[arg(long)]
    pub json: bool,

    /// Print the config file location and exit.
    #[arg(long)]
    pub print_config: bool,

    /// Write a commented config template to the config location and exit.
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    /// Precedence: --debug > --log-level > config.
    pub fn effective_log_level(&self) -> Option<LogLevel> {
        if self.debug {
            return Some(LogLevel::Debug);
        }
        self.log_level.as_deref().and_then(LogLevel::parse)
    }

    /// Whether operations are echoed to the trace.
    pub fn wants_trace(&self) -> bool {
        self.verbose || self.dry_run || self.logfile.is_some()
    }

    /// Apply CLI overrides to a loaded Config. Unset flags leave it alone.
    pub fn apply_overrides(&self, cfg: &mut Config) {
        if let Some(editor) = &self.editor {
            cfg.editor = Some(editor.clone());
        }
        if let Some(level) = self.effective_log_level() {
            cfg.log_level = level;
        }
        if let Some(policy) = self.nested {
            cfg.nested_policy = policy;
        }
        cfg.all |= self.all;
        cfg.recursive |= self.recursive;
        cfg.numeric_sort |= self.numeric_sort;
        cfg.mangle_newlines |= self.mangle_newlines;
        cfg.safe |= self.safe;
        cfg.remove_recursive |= self.remove_recursive;
    }
}

pub fn parse() -> Args {
    Args::parse()
}
