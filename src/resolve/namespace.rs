//! Simulated view of the edited directory while operations are planned.
//!
//! The resolver never touches the disk. It asks a [`PathProbe`] what existed
//! before the edit and records every planned change in an overlay, so later
//! decisions see the tree as it will look at that point of execution.

use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use crate::entry::{SnapshotEntry, ancestors};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file, symlink or anything else that is not a directory.
    File,
    Dir,
}

/// Read-only access to the tree as it was before any operation ran.
pub trait PathProbe {
    fn kind(&self, path: &Path) -> Option<EntryKind>;
    /// Names directly inside `dir`; empty when `dir` is not a directory.
    fn children(&self, dir: &Path) -> Vec<OsString>;
}

/// Probe backed by the real filesystem. Symlinks are never followed.
#[derive(Debug, Clone)]
pub struct DiskProbe {
    root: PathBuf,
}

impl DiskProbe {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl PathProbe for DiskProbe {
    fn kind(&self, path: &Path) -> Option<EntryKind> {
        let md = fs::symlink_metadata(self.root.join(path)).ok()?;
        Some(if md.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        })
    }

    fn children(&self, dir: &Path) -> Vec<OsString> {
        match fs::read_dir(self.root.join(dir)) {
            Ok(rd) => rd.filter_map(|e| e.ok()).map(|e| e.file_name()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// Probe over a fixed set of paths. Parents of every path are implied
/// directories.
#[derive(Debug, Clone, Default)]
pub struct MemoryProbe {
    entries: BTreeMap<PathBuf, EntryKind>,
}

impl MemoryProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, kind: EntryKind) {
        let path = path.into();
        for anc in ancestors(&path) {
            self.entries.insert(anc.to_path_buf(), EntryKind::Dir);
        }
        self.entries.insert(path, kind);
    }

    pub fn from_snapshot(entries: &[SnapshotEntry]) -> Self {
        let mut probe = Self::new();
        for e in entries {
            let kind = if e.is_directory {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            probe.insert(e.path.clone(), kind);
        }
        probe
    }
}

impl PathProbe for MemoryProbe {
    fn kind(&self, path: &Path) -> Option<EntryKind> {
        self.entries.get(path).copied()
    }

    fn children(&self, dir: &Path) -> Vec<OsString> {
        self.entries
            .range(dir.to_path_buf()..)
            .take_while(|(p, _)| p.starts_with(dir))
            .filter(|(p, _)| p.parent() == Some(dir))
            .filter_map(|(p, _)| p.file_name().map(|n| n.to_os_string()))
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Absent,
    /// `backing` is where the content lives on disk before execution;
    /// `None` for directories created by the plan.
    Present {
        kind: EntryKind,
        backing: Option<PathBuf>,
    },
}

pub(crate) struct Namespace<'p, P: PathProbe + ?Sized> {
    probe: &'p P,
    overlay: BTreeMap<PathBuf, Slot>,
}

impl<'p, P: PathProbe + ?Sized> Namespace<'p, P> {
    pub fn new(probe: &'p P) -> Self {
        Self {
            probe,
            overlay: BTreeMap::new(),
        }
    }

    fn lookup(&self, path: &Path) -> Option<(EntryKind, Option<PathBuf>)> {
        if let Some(slot) = self.overlay.get(path) {
            return match slot {
                Slot::Absent => None,
                Slot::Present { kind, backing } => Some((*kind, backing.clone())),
            };
        }
        match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                let (kind, backing) = self.lookup(parent)?;
                if kind != EntryKind::Dir {
                    return None;
                }
                let real = backing?.join(path.file_name()?);
                self.probe.kind(&real).map(|k| (k, Some(real)))
            }
            _ => self.probe.kind(path).map(|k| (k, Some(path.to_path_buf()))),
        }
    }

    pub fn kind(&self, path: &Path) -> Option<EntryKind> {
        self.lookup(path).map(|(kind, _)| kind)
    }

    pub fn exists(&self, path: &Path) -> bool {
        self.lookup(path).is_some()
    }

    /// Present entries directly inside `dir`.
    pub fn children(&self, dir: &Path) -> Vec<PathBuf> {
        let Some((EntryKind::Dir, backing)) = self.lookup(dir) else {
            return Vec::new();
        };
        let mut names: BTreeSet<OsString> = backing
            .map(|b| self.probe.children(&b))
            .unwrap_or_default()
            .into_iter()
            .collect();
        for key in self.below(dir) {
            if key.parent() == Some(dir) {
                if let Some(name) = key.file_name() {
                    names.insert(name.to_os_string());
                }
            }
        }
        names
            .into_iter()
            .map(|n| dir.join(n))
            .filter(|p| self.exists(p))
            .collect()
    }

    pub fn is_empty_dir(&self, dir: &Path) -> bool {
        self.kind(dir) == Some(EntryKind::Dir) && self.children(dir).is_empty()
    }

    /// Move `from` and everything below it to `to`. Returns false and changes
    /// nothing when `from` does not exist.
    pub fn rename(&mut self, from: &Path, to: &Path) -> bool {
        let Some((kind, backing)) = self.lookup(from) else {
            return false;
        };
        let slot = Slot::Present { kind, backing };
        let carried: Vec<(PathBuf, Slot)> = self
            .below(from)
            .into_iter()
            .filter_map(|k| {
                let slot = self.overlay.remove(&k)?;
                let rel = k.strip_prefix(from).ok()?.to_path_buf();
                Some((rel, slot))
            })
            .collect();
        self.clear_below(to);
        self.overlay.insert(from.to_path_buf(), Slot::Absent);
        self.overlay.insert(to.to_path_buf(), slot);
        for (rel, slot) in carried {
            self.overlay.insert(to.join(rel), slot);
        }
        true
    }

    pub fn remove(&mut self, path: &Path) {
        self.clear_below(path);
        self.overlay.insert(path.to_path_buf(), Slot::Absent);
    }

    pub fn make_dir(&mut self, path: &Path) {
        self.clear_below(path);
        self.overlay.insert(
            path.to_path_buf(),
            Slot::Present {
                kind: EntryKind::Dir,
                backing: None,
            },
        );
    }

    /// Overlay keys strictly below `dir`.
    fn below(&self, dir: &Path) -> Vec<PathBuf> {
        self.overlay
            .range(dir.to_path_buf()..)
            .map(|(k, _)| k)
            .take_while(|k| k.starts_with(dir))
            .filter(|k| k.as_path() != dir)
            .cloned()
            .collect()
    }

    fn clear_below(&mut self, dir: &Path) {
        for key in self.below(dir) {
            self.overlay.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe() -> MemoryProbe {
        let mut p = MemoryProbe::new();
        p.insert("d/a", EntryKind::File);
        p.insert("d/sub/b", EntryKind::File);
        p.insert("f", EntryKind::File);
        p
    }

    #[test]
    fn renamed_directory_carries_its_contents() {
        let p = probe();
        let mut ns = Namespace::new(&p);
        ns.rename(Path::new("d"), Path::new("e"));
        assert!(!ns.exists(Path::new("d/a")));
        assert_eq!(ns.kind(Path::new("e/sub/b")), Some(EntryKind::File));
        assert_eq!(
            ns.children(Path::new("e")),
            vec![PathBuf::from("e/a"), PathBuf::from("e/sub")]
        );
    }

    #[test]
    fn moved_out_children_leave_directory_empty() {
        let p = probe();
        let mut ns = Namespace::new(&p);
        ns.rename(Path::new("d/a"), Path::new("a"));
        ns.rename(Path::new("d/sub"), Path::new("sub"));
        assert!(ns.is_empty_dir(Path::new("d")));
        assert!(ns.exists(Path::new("sub/b")));
    }

    #[test]
    fn overlay_entries_follow_a_renamed_parent() {
        let p = probe();
        let mut ns = Namespace::new(&p);
        ns.rename(Path::new("f"), Path::new("d/f"));
        ns.rename(Path::new("d"), Path::new("x"));
        assert_eq!(ns.kind(Path::new("x/f")), Some(EntryKind::File));
        assert!(!ns.exists(Path::new("f")));
        assert!(!ns.exists(Path::new("d/f")));
    }

    #[test]
    fn renaming_a_missing_path_changes_nothing() {
        let p = probe();
        let mut ns = Namespace::new(&p);
        assert!(!ns.rename(Path::new("nope"), Path::new("d/nope")));
        assert!(!ns.exists(Path::new("d/nope")));
        assert_eq!(
            ns.children(Path::new("d")),
            vec![PathBuf::from("d/a"), PathBuf::from("d/sub")]
        );
    }

    #[test]
    fn new_directories_start_empty() {
        let p = probe();
        let mut ns = Namespace::new(&p);
        ns.make_dir(Path::new("n"));
        assert!(ns.is_empty_dir(Path::new("n")));
        ns.rename(Path::new("f"), Path::new("n/f"));
        assert_eq!(ns.children(Path::new("n")), vec![PathBuf::from("n/f")]);
    }

    #[test]
    fn reoccupied_name_drops_stale_markers() {
        let p = probe();
        let mut ns = Namespace::new(&p);
        ns.rename(Path::new("d/a"), Path::new("a"));
        ns.rename(Path::new("d"), Path::new("gone"));
        ns.make_dir(Path::new("d"));
        ns.rename(Path::new("gone/sub"), Path::new("d/sub"));
        assert!(ns.exists(Path::new("d/sub/b")));
        assert!(!ns.exists(Path::new("d/a")));
    }
}
