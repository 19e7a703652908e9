//! Plan builder.
//! Pairs original entries with edited lines by position, classifies each pair
//! and rejects anything that cannot be applied safely before a single
//! filesystem call is made.

use std::borrow::Cow;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::entry::{Disposition, PathEntry, SnapshotEntry, ancestors};
use crate::errors::{DirEditError, Result};

/// How to treat a changed entry nested inside another changed entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum NestedPolicy {
    /// Refuse the whole edit.
    #[default]
    Reject,
    /// Re-express the inner path under the outer entry's new location.
    Compose,
}

impl NestedPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reject" => Some(NestedPolicy::Reject),
            "compose" => Some(NestedPolicy::Compose),
            _ => None,
        }
    }
}

impl FromStr for NestedPolicy {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("invalid nested policy: '{s}'"))
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Absolute path of the edited directory; absolute entries inside it are accepted.
    pub root: Option<PathBuf>,
    pub nested: NestedPolicy,
}

/// Entries index-aligned with the original and edited listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenamePlan {
    entries: Vec<PathEntry>,
}

impl RenamePlan {
    pub fn entries(&self) -> &[PathEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries that rename or delete.
    pub fn change_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_change()).count()
    }
}

pub fn build(
    originals: &[SnapshotEntry],
    edited: &[String],
    options: &BuildOptions,
) -> Result<RenamePlan> {
    if originals.len() != edited.len() {
        return Err(DirEditError::InconsistentLineCount {
            expected: originals.len(),
            found: edited.len(),
        });
    }
    let root = options.root.as_deref();

    let mut entries = Vec::with_capacity(originals.len());
    let mut by_source: HashMap<PathBuf, usize> = HashMap::new();
    for (snap, line) in originals.iter().zip(edited) {
        let original = make_relpath(&snap.path, root)?;
        if let Some(&first) = by_source.get(&original) {
            return Err(DirEditError::DuplicateSource {
                first: originals[first].path.clone(),
                second: snap.path.clone(),
            });
        }
        by_source.insert(original.clone(), entries.len());

        let target = if line.is_empty() {
            None
        } else if matches!(snap.display_name(), Cow::Owned(ref shown) if shown == line) {
            // Name could not be shown exactly; an untouched line keeps it.
            Some(original.clone())
        } else {
            Some(make_relpath(Path::new(line), root)?)
        };
        entries.push(PathEntry {
            original,
            target,
            is_directory: snap.is_directory,
        });
    }

    check_collisions(&entries)?;
    check_nesting(&entries, &by_source, options.nested)?;

    let plan = RenamePlan { entries };
    debug!(entries = plan.len(), changes = plan.change_count(), "Built rename plan");
    Ok(plan)
}

fn check_collisions(entries: &[PathEntry]) -> Result<()> {
    let mut by_target: HashMap<&Path, usize> = HashMap::new();
    for (i, entry) in entries.iter().enumerate() {
        let Some(target) = entry.target.as_deref() else {
            continue;
        };
        if let Some(&first) = by_target.get(target) {
            return Err(DirEditError::TargetCollision {
                first: entries[first].original.clone(),
                second: entry.original.clone(),
                target: target.to_path_buf(),
            });
        }
        by_target.insert(target, i);
    }
    Ok(())
}

fn check_nesting(
    entries: &[PathEntry],
    by_source: &HashMap<PathBuf, usize>,
    policy: NestedPolicy,
) -> Result<()> {
    for inner in entries {
        for anc in ancestors(&inner.original) {
            let Some(&j) = by_source.get(anc) else {
                continue;
            };
            let outer = &entries[j];
            let conflict = match (outer.disposition(), inner.disposition()) {
                (Disposition::Keep, _) => false,
                (Disposition::Delete, Disposition::Delete) => false,
                (Disposition::Delete, _) => true,
                (Disposition::Rename(_), Disposition::Delete) => false,
                (Disposition::Rename(_), _) => policy == NestedPolicy::Reject,
            };
            if conflict {
                return Err(DirEditError::NestedPathConflict {
                    outer: outer.original.clone(),
                    inner: inner.original.clone(),
                });
            }
        }
    }
    Ok(())
}

/// Normalize `path` lexically to a path relative to the edited directory.
///
/// `.` components and duplicate or trailing separators disappear, `..` folds
/// into its parent. Absolute paths are accepted only below `root`. Anything
/// that leaves the directory, or names the directory itself, is refused.
pub fn make_relpath(path: &Path, root: Option<&Path>) -> Result<PathBuf> {
    let escapes = || DirEditError::PathEscapesRoot {
        path: path.to_path_buf(),
    };

    let owned;
    let relative = if path.has_root() {
        let root = root.ok_or_else(escapes)?;
        let abs = fold_components(path).ok_or_else(escapes)?;
        let base = fold_components(root).ok_or_else(escapes)?;
        owned = abs.strip_prefix(&base).map_err(|_| escapes())?.to_path_buf();
        owned.as_path()
    } else {
        path
    };

    let out = fold_components(relative).ok_or_else(escapes)?;
    if out.as_os_str().is_empty() || out.has_root() {
        return Err(escapes());
    }
    Ok(out)
}

/// Fold `.` and `..` lexically; `None` when `..` climbs above the start.
fn fold_components(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if out.file_name().is_none() || !out.pop() {
                    return None;
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn originals(names: &[&str]) -> Vec<SnapshotEntry> {
        names.iter().map(|n| SnapshotEntry::file(*n)).collect()
    }

    fn lines(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn classifies_keep_rename_delete() {
        let plan = build(
            &originals(&["a", "b", "c"]),
            &lines(&["a", "x", ""]),
            &BuildOptions::default(),
        )
        .unwrap();
        let d: Vec<_> = plan.entries().iter().map(|e| e.disposition()).collect();
        assert_eq!(
            d,
            vec![
                Disposition::Keep,
                Disposition::Rename(Path::new("x")),
                Disposition::Delete
            ]
        );
        assert_eq!(plan.change_count(), 2);
    }

    #[test]
    fn equivalent_spellings_are_no_ops() {
        let plan = build(
            &originals(&["a", "b", "c"]),
            &lines(&["x/..//a", "b/", "./c"]),
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(plan.change_count(), 0);
    }

    #[test]
    fn duplicate_targets_collide() {
        let err = build(
            &originals(&["a1", "a2"]),
            &lines(&["b", "b"]),
            &BuildOptions::default(),
        )
        .unwrap_err();
        match err {
            DirEditError::TargetCollision { first, second, target } => {
                assert_eq!(first, PathBuf::from("a1"));
                assert_eq!(second, PathBuf::from("a2"));
                assert_eq!(target, PathBuf::from("b"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn renaming_onto_a_kept_entry_collides() {
        let err = build(
            &originals(&["a", "b"]),
            &lines(&["b", "b"]),
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DirEditError::TargetCollision { .. }));
    }

    #[test]
    fn deleted_names_may_be_reused() {
        let plan = build(
            &originals(&["a", "b"]),
            &lines(&["", "a"]),
            &BuildOptions::default(),
        )
        .unwrap();
        assert_eq!(plan.change_count(), 2);
    }

    #[test]
    fn escaping_targets_are_refused() {
        for bad in ["../x", "a/../../x", "/etc/passwd", ".", "a/.."] {
            let err = build(&originals(&["a"]), &lines(&[bad]), &BuildOptions::default())
                .unwrap_err();
            assert!(
                matches!(err, DirEditError::PathEscapesRoot { .. }),
                "{bad} should escape, got {err:?}"
            );
        }
    }

    #[test]
    fn absolute_paths_inside_root_are_relative() {
        let opts = BuildOptions {
            root: Some(PathBuf::from("/work/dir")),
            ..Default::default()
        };
        assert_eq!(
            make_relpath(Path::new("/work/dir/sub/../f"), opts.root.as_deref()).unwrap(),
            PathBuf::from("f")
        );
        assert!(make_relpath(Path::new("/work/other"), opts.root.as_deref()).is_err());
    }

    #[test]
    fn duplicate_sources_are_refused() {
        let err = build(
            &originals(&["a", "./a"]),
            &lines(&["b", "c"]),
            &BuildOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DirEditError::DuplicateSource { .. }));
    }

    #[test]
    fn nested_rename_depends_on_policy() {
        let snaps = vec![SnapshotEntry::dir("d"), SnapshotEntry::file("d/f")];
        let edited = lines(&["e", "g"]);
        let err = build(&snaps, &edited, &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, DirEditError::NestedPathConflict { .. }));

        let compose = BuildOptions {
            nested: NestedPolicy::Compose,
            ..Default::default()
        };
        assert!(build(&snaps, &edited, &compose).is_ok());
    }

    #[test]
    fn deleted_parent_with_surviving_child_is_refused_under_any_policy() {
        let snaps = vec![SnapshotEntry::dir("d"), SnapshotEntry::file("d/f")];
        let compose = BuildOptions {
            nested: NestedPolicy::Compose,
            ..Default::default()
        };
        let err = build(&snaps, &lines(&["", "d/f"]), &compose).unwrap_err();
        assert!(matches!(err, DirEditError::NestedPathConflict { .. }));
        assert!(build(&snaps, &lines(&["", ""]), &compose).is_ok());
    }

    #[test]
    fn line_count_must_match() {
        let err = build(&originals(&["a", "b"]), &lines(&["a"]), &BuildOptions::default())
            .unwrap_err();
        assert!(matches!(err, DirEditError::InconsistentLineCount { .. }));
    }
}
