//! Snapshot provider: which paths the listing shows.
//!
//! Either the contents of the edited directory (flat, or recursive with files,
//! symlinks and empty leaf directories) or an explicit list of paths.

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::entry::SnapshotEntry;
use crate::fs_ops::io_error_with_help;

#[derive(Debug, Clone, Copy, Default)]
pub struct ReadOptions {
    /// Include names starting with a dot.
    pub all: bool,
    pub recursive: bool,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// List `root`; paths come back relative to it, in file-name order per directory.
pub fn read_dir(root: &Path, options: &ReadOptions) -> Result<Vec<SnapshotEntry>> {
    let max_depth = if options.recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(root)
        .min_depth(1)
        .max_depth(max_depth)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| options.all || !is_hidden(e));

    let mut entries = Vec::new();
    for item in walker {
        let item = item.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            match e.into_io_error() {
                Some(ioe) => io_error_with_help("read directory", &path)(ioe),
                None => anyhow::anyhow!("read directory '{}': filesystem loop", path.display()),
            }
        })?;
        let rel = match item.path().strip_prefix(root) {
            Ok(rel) => rel.to_path_buf(),
            Err(_) => continue,
        };
        let is_dir = item.file_type().is_dir();
        if is_dir && options.recursive {
            // only leaf directories are listed, and only when truly empty
            if is_empty_dir(item.path()) {
                entries.push(SnapshotEntry::dir(rel));
            }
            continue;
        }
        entries.push(SnapshotEntry {
            path: rel,
            is_directory: is_dir,
        });
    }
    debug!(root = %root.display(), count = entries.len(), recursive = options.recursive, "Read directory");
    Ok(entries)
}

fn is_empty_dir(path: &Path) -> bool {
    fs::read_dir(path)
        .map(|mut rd| rd.next().is_none())
        .unwrap_or(false)
}

/// Snapshot of explicitly named paths. Relative paths are taken from `root`;
/// paths that do not exist are skipped with a warning.
pub fn from_paths<I, S>(root: &Path, paths: I) -> Vec<SnapshotEntry>
where
    I: IntoIterator<Item = S>,
    S: AsRef<Path>,
{
    let mut out = Vec::new();
    for p in paths {
        let p = p.as_ref();
        if p.as_os_str().is_empty() {
            continue;
        }
        match fs::symlink_metadata(root.join(p)) {
            Ok(md) => out.push(SnapshotEntry {
                path: p.to_path_buf(),
                is_directory: md.is_dir(),
            }),
            Err(e) => warn!(path = %p.display(), error = %e, "Skipping path that cannot be read"),
        }
    }
    out
}

/// Read a file holding one path per line.
pub fn read_list_file(path: &Path) -> Result<Vec<String>> {
    let text = fs::read_to_string(path).map_err(io_error_with_help("read file list", path))?;
    Ok(text
        .lines()
        .map(|l| l.trim_end_matches(['\r', '\n']).to_string())
        .collect())
}

/// Paths from a list file, as `PathBuf`s.
pub fn read_path_list(path: &Path) -> Result<Vec<PathBuf>> {
    Ok(read_list_file(path)?.into_iter().map(PathBuf::from).collect())
}
