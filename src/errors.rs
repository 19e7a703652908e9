//! Typed error definitions for dir_edit.
//! Every structural failure carries the offending paths so callers can render
//! them however they like; `code()` gives a stable number for logs and tests.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::ops::Operation;

#[derive(Debug, Error)]
pub enum DirEditError {
    #[error("new file list has {found} lines, expected {expected}")]
    InconsistentLineCount { expected: usize, found: usize },

    #[error("duplicate input entries {first} and {second}")]
    DuplicateSource { first: PathBuf, second: PathBuf },

    #[error("{first} and {second} have the same destination {target}")]
    TargetCollision {
        first: PathBuf,
        second: PathBuf,
        target: PathBuf,
    },

    #[error("path {path} leads outside the edited directory")]
    PathEscapesRoot { path: PathBuf },

    #[error("{inner} is nested inside {outer}, which is changed in the same pass")]
    NestedPathConflict { outer: PathBuf, inner: PathBuf },

    #[error("file name {path} contains a newline; use --mangle-newlines")]
    NewlineInName { path: PathBuf },

    #[error("safe mode forbids creating directory {path}")]
    DirectoryCreationForbidden { path: PathBuf },

    #[error("safe mode forbids removing directory {path}")]
    DirectoryRemovalForbidden { path: PathBuf },

    #[error("not removing directory {path}: not empty (try --remove-recursive)")]
    DirectoryNotEmpty { path: PathBuf },

    #[error("path {target} already exists and is not part of the edit")]
    TargetExists { target: PathBuf },

    #[error("{path} is listed but no longer exists")]
    SourceMissing { path: PathBuf },

    #[error("cannot place {target}: {parent} is not a directory")]
    ParentNotDirectory { parent: PathBuf, target: PathBuf },

    #[error("{operation}: {cause} ({applied} operations applied before the failure)")]
    FilesystemOperationFailed {
        operation: Operation,
        applied: usize,
        #[source]
        cause: io::Error,
    },

    #[error("interrupted by user after {applied} operations")]
    Interrupted { applied: usize },
}

impl DirEditError {
    /// Stable numeric code for structured logs.
    pub fn code(&self) -> u16 {
        match self {
            DirEditError::InconsistentLineCount { .. } => 10,
            DirEditError::DuplicateSource { .. } => 11,
            DirEditError::TargetCollision { .. } => 12,
            DirEditError::PathEscapesRoot { .. } => 13,
            DirEditError::NestedPathConflict { .. } => 14,
            DirEditError::NewlineInName { .. } => 15,
            DirEditError::DirectoryCreationForbidden { .. } => 20,
            DirEditError::DirectoryRemovalForbidden { .. } => 21,
            DirEditError::DirectoryNotEmpty { .. } => 22,
            DirEditError::TargetExists { .. } => 23,
            DirEditError::ParentNotDirectory { .. } => 24,
            DirEditError::SourceMissing { .. } => 25,
            DirEditError::FilesystemOperationFailed { .. } => 30,
            DirEditError::Interrupted { .. } => 31,
        }
    }

    /// Short snake_case name used as the `kind` log field.
    pub fn kind(&self) -> &'static str {
        match self {
            DirEditError::InconsistentLineCount { .. } => "inconsistent_line_count",
            DirEditError::DuplicateSource { .. } => "duplicate_source",
            DirEditError::TargetCollision { .. } => "target_collision",
            DirEditError::PathEscapesRoot { .. } => "path_escapes_root",
            DirEditError::NestedPathConflict { .. } => "nested_path_conflict",
            DirEditError::NewlineInName { .. } => "newline_in_name",
            DirEditError::DirectoryCreationForbidden { .. } => "directory_creation_forbidden",
            DirEditError::DirectoryRemovalForbidden { .. } => "directory_removal_forbidden",
            DirEditError::DirectoryNotEmpty { .. } => "directory_not_empty",
            DirEditError::TargetExists { .. } => "target_exists",
            DirEditError::ParentNotDirectory { .. } => "parent_not_directory",
            DirEditError::SourceMissing { .. } => "source_missing",
            DirEditError::FilesystemOperationFailed { .. } => "filesystem_operation_failed",
            DirEditError::Interrupted { .. } => "interrupted",
        }
    }

    /// True when the error was raised before any filesystem mutation.
    pub fn is_structural(&self) -> bool {
        !matches!(
            self,
            DirEditError::FilesystemOperationFailed { .. } | DirEditError::Interrupted { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, DirEditError>;
