//! Core configuration types.
//! - Config holds the settings a run starts from.
//! - LogLevel is the user-facing verbosity with parsing helpers.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::listing::{ListingOptions, SortOrder};
use crate::plan::NestedPolicy;
use crate::resolve::ResolveOptions;
use crate::snapshot::ReadOptions;

/// Verbosity levels exposed to users and the config file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Quiet,
    /// Warnings and errors (default)
    #[default]
    Normal,
    /// Per-run summaries
    Info,
    /// Everything, including each planned operation
    Debug,
}

impl LogLevel {
    /// Parse common names (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "quiet" | "error" | "none" => Some(LogLevel::Quiet),
            "normal" | "warn" => Some(LogLevel::Normal),
            "info" | "verbose" => Some(LogLevel::Info),
            "debug" | "trace" => Some(LogLevel::Debug),
            _ => None,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LogLevel::Quiet => "quiet",
            LogLevel::Normal => "normal",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        };
        f.write_str(s)
    }
}

impl FromStr for LogLevel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid log level: '{s}'"))
    }
}

/// Settings for one run. Every field has a default so a missing config file
/// behaves like an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Editor command; `None` falls back to `$VISUAL`, `$EDITOR`, `vi`.
    pub editor: Option<String>,
    pub log_level: LogLevel,
    /// File that also receives diagnostic log output.
    pub trace_file: Option<PathBuf>,
    pub all: bool,
    pub recursive: bool,
    pub numeric_sort: bool,
    pub mangle_newlines: bool,
    pub safe: bool,
    pub remove_recursive: bool,
    pub nested_policy: NestedPolicy,
}

impl Config {
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            all: self.all,
            recursive: self.recursive,
        }
    }

    /// Listing options for a directory read. Explicit path lists keep their
    /// given order, so the caller passes `sorted = false` for those.
    pub fn listing_options(&self, sorted: bool) -> ListingOptions {
        let sort = match (sorted, self.numeric_sort) {
            (false, _) => SortOrder::Preserve,
            (true, false) => SortOrder::Text,
            (true, true) => SortOrder::Numeric,
        };
        ListingOptions {
            mangle_newlines: self.mangle_newlines,
            sort,
        }
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            recursive: self.recursive,
            safe: self.safe,
            remove_recursive: self.remove_recursive,
            ..Default::default()
        }
    }
}
