//! Path entries: one tracked path and what the edit wants done with it.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// One path delivered by the snapshot provider, relative to the edited directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotEntry {
    pub path: PathBuf,
    pub is_directory: bool,
}

impl SnapshotEntry {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_directory: false,
        }
    }

    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            is_directory: true,
        }
    }

    /// Text shown for this entry in the editable listing.
    pub fn display_name(&self) -> Cow<'_, str> {
        self.path.to_string_lossy()
    }
}

/// What the edited listing asks for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition<'a> {
    Keep,
    Rename(&'a Path),
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub original: PathBuf,
    /// `None` deletes, `Some(original)` keeps, anything else renames.
    pub target: Option<PathBuf>,
    pub is_directory: bool,
}

impl PathEntry {
    pub fn disposition(&self) -> Disposition<'_> {
        match &self.target {
            None => Disposition::Delete,
            Some(t) if *t == self.original => Disposition::Keep,
            Some(t) => Disposition::Rename(t),
        }
    }

    pub fn is_change(&self) -> bool {
        self.disposition() != Disposition::Keep
    }
}

/// Strict ancestors of a relative path, innermost first: `a/b/c` yields `a/b`, `a`.
pub fn ancestors(path: &Path) -> impl Iterator<Item = &Path> {
    path.ancestors()
        .skip(1)
        .filter(|p| !p.as_os_str().is_empty())
}

/// Number of components; used to order work innermost first.
pub fn depth(path: &Path) -> usize {
    path.components().count()
}
