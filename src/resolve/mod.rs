//! Turn a validated rename plan into an ordered list of filesystem operations.
//!
//! Resolution runs in three phases against a simulated namespace:
//! 1. deletions, innermost first;
//! 2. renames in dependency order, parking one member of each cycle under a
//!    temporary name and creating missing parent directories on the way;
//! 3. in recursive mode, removal of source directories the edit left empty.
//!
//! Every structural problem is reported here, before the executor runs.

pub mod namespace;

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::entry::{ancestors, depth};
use crate::errors::{DirEditError, Result};
use crate::graph::{Move, OperationGraph, Scheduler, Step, index_by_entry, temp_name};
use crate::ops::Operation;
use crate::plan::RenamePlan;

pub use namespace::{DiskProbe, EntryKind, MemoryProbe, PathProbe};
use namespace::Namespace;

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// Create missing target parents and clean up emptied source directories.
    pub recursive: bool,
    /// Never create or remove directories.
    pub safe: bool,
    /// Allow deleting non-empty directories.
    pub remove_recursive: bool,
    /// Mixed into temporary names so concurrent runs do not pick the same one.
    pub temp_salt: u32,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            recursive: false,
            safe: false,
            remove_recursive: false,
            temp_salt: std::process::id(),
        }
    }
}

impl ResolveOptions {
    fn cleanup(&self) -> bool {
        self.recursive && !self.safe
    }
}

pub fn resolve<P: PathProbe + ?Sized>(
    plan: &RenamePlan,
    probe: &P,
    options: &ResolveOptions,
) -> Result<Vec<Operation>> {
    let mut resolver = Resolver {
        ns: Namespace::new(probe),
        ops: Vec::new(),
        cleanup: BTreeSet::new(),
        planned: HashSet::new(),
        targets: HashSet::new(),
        options,
    };
    for entry in plan.entries() {
        resolver.planned.insert(entry.original.clone());
        if let Some(t) = &entry.target {
            resolver.planned.insert(t.clone());
            resolver.targets.insert(t.clone());
        }
    }

    resolver.delete_phase(plan)?;
    let graph = OperationGraph::new(effective_moves(plan));
    resolver.rename_phase(&graph)?;
    if options.cleanup() {
        resolver.cleanup_phase();
    }

    debug!(
        entries = plan.len(),
        operations = resolver.ops.len(),
        "Resolved rename plan"
    );
    Ok(resolver.ops)
}

/// Moves needed to realize the plan, in entry order.
///
/// An entry below another planned entry travels with it and is found under
/// that entry's target. It records the move it must follow, or inherits it
/// when the entry above stays put.
fn effective_moves(plan: &RenamePlan) -> Vec<Move> {
    let entries = plan.entries();
    let placed: HashMap<&Path, usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.target.is_some())
        .map(|(i, e)| (e.original.as_path(), i))
        .collect();

    let mut by_depth: Vec<usize> = (0..entries.len()).collect();
    by_depth.sort_by_key(|&i| depth(&entries[i].original));

    let mut source: Vec<PathBuf> = entries.iter().map(|e| e.original.clone()).collect();
    let mut after: Vec<Option<usize>> = vec![None; entries.len()];
    let is_move = |i: usize, source: &[PathBuf]| entries[i].target.as_ref() != Some(&source[i]);

    for i in by_depth {
        if entries[i].target.is_none() {
            continue;
        }
        let original = &entries[i].original;
        let outer = ancestors(original).find_map(|a| placed.get(a).map(|&j| (j, a)));
        let Some((j, anc)) = outer else {
            continue;
        };
        let (Some(outer_target), Ok(rel)) = (&entries[j].target, original.strip_prefix(anc)) else {
            continue;
        };
        source[i] = outer_target.join(rel);
        after[i] = if is_move(j, &source) { Some(j) } else { after[j] };
    }

    let mut moves: Vec<Move> = Vec::new();
    for (i, entry) in entries.iter().enumerate() {
        let Some(target) = &entry.target else {
            continue;
        };
        if *target == source[i] {
            continue;
        }
        moves.push(Move {
            entry: i,
            source: source[i].clone(),
            target: target.clone(),
            after: after[i],
        });
    }
    let index = index_by_entry(&moves);
    for m in &mut moves {
        m.after = m.after.and_then(|e| index.get(&e).copied());
    }
    moves
}

struct Resolver<'a, 'p, P: PathProbe + ?Sized> {
    ns: Namespace<'p, P>,
    ops: Vec<Operation>,
    cleanup: BTreeSet<PathBuf>,
    planned: HashSet<PathBuf>,
    targets: HashSet<PathBuf>,
    options: &'a ResolveOptions,
}

impl<P: PathProbe + ?Sized> Resolver<'_, '_, P> {
    fn delete_phase(&mut self, plan: &RenamePlan) -> Result<()> {
        let mut doomed: Vec<_> = plan.entries().iter().filter(|e| e.target.is_none()).collect();
        doomed.sort_by_key(|e| std::cmp::Reverse(depth(&e.original)));

        for entry in doomed {
            let path = entry.original.as_path();
            let Some(kind) = self.ns.kind(path) else {
                return Err(DirEditError::SourceMissing {
                    path: path.to_path_buf(),
                });
            };
            let op = match kind {
                EntryKind::File => Operation::RemoveFile(path.to_path_buf()),
                EntryKind::Dir if self.options.safe => {
                    return Err(DirEditError::DirectoryRemovalForbidden {
                        path: path.to_path_buf(),
                    });
                }
                EntryKind::Dir if self.ns.children(path).is_empty() => {
                    Operation::RemoveDir(path.to_path_buf())
                }
                EntryKind::Dir if self.options.remove_recursive => {
                    Operation::RemoveTree(path.to_path_buf())
                }
                EntryKind::Dir => {
                    return Err(DirEditError::DirectoryNotEmpty {
                        path: path.to_path_buf(),
                    });
                }
            };
            self.ns.remove(path);
            self.ops.push(op);
            self.mark_for_cleanup(path);
        }
        Ok(())
    }

    fn rename_phase(&mut self, graph: &OperationGraph) -> Result<()> {
        let moves = graph.moves();
        let mut location: Vec<PathBuf> = moves.iter().map(|m| m.source.clone()).collect();
        let mut scheduler = Scheduler::new(graph);

        loop {
            let step = match scheduler.next_step() {
                Ok(Some(step)) => step,
                Ok(None) => break,
                Err(cycle) => {
                    let outer = cycle.first().copied().unwrap_or(0);
                    let inner = cycle.get(1).copied().unwrap_or(outer);
                    return Err(DirEditError::NestedPathConflict {
                        outer: moves[outer].source.clone(),
                        inner: moves[inner].source.clone(),
                    });
                }
            };
            match step {
                Step::Run(x) => {
                    let target = &moves[x].target;
                    self.occupy(target)?;
                    self.push_rename(&location[x], target)?;
                }
                Step::Park(x) => {
                    let salt = self.options.temp_salt;
                    let tmp = temp_name(&moves[x].source, salt, |p| {
                        self.planned.contains(p) || self.ns.exists(p)
                    });
                    debug!(source = %moves[x].source.display(), tmp = %tmp.display(), "Parking to break cycle");
                    self.push_rename(&location[x], &tmp)?;
                    location[x] = tmp;
                }
            }
        }
        Ok(())
    }

    fn push_rename(&mut self, from: &Path, to: &Path) -> Result<()> {
        if !self.ns.rename(from, to) {
            return Err(DirEditError::SourceMissing {
                path: from.to_path_buf(),
            });
        }
        self.ops.push(Operation::rename(from, to));
        self.mark_for_cleanup(from);
        Ok(())
    }

    /// Make `target` available: parents exist as directories and the name is free.
    fn occupy(&mut self, target: &Path) -> Result<()> {
        let parents: Vec<&Path> = ancestors(target).collect();
        for parent in parents.into_iter().rev() {
            match self.ns.kind(parent) {
                Some(EntryKind::Dir) => {}
                Some(EntryKind::File) => {
                    return Err(DirEditError::ParentNotDirectory {
                        parent: parent.to_path_buf(),
                        target: target.to_path_buf(),
                    });
                }
                None if self.options.safe => {
                    return Err(DirEditError::DirectoryCreationForbidden {
                        path: parent.to_path_buf(),
                    });
                }
                None => {
                    self.ns.make_dir(parent);
                    self.ops.push(Operation::MakeDir(parent.to_path_buf()));
                }
            }
        }

        if !self.ns.exists(target) {
            return Ok(());
        }
        // a source directory emptied by earlier moves may give way
        if self.options.cleanup() && self.cleanup.contains(target) && self.ns.is_empty_dir(target) {
            self.ns.remove(target);
            self.ops.push(Operation::RemoveDir(target.to_path_buf()));
            return Ok(());
        }
        Err(DirEditError::TargetExists {
            target: target.to_path_buf(),
        })
    }

    fn mark_for_cleanup(&mut self, vacated: &Path) {
        for anc in ancestors(vacated) {
            self.cleanup.insert(anc.to_path_buf());
        }
    }

    /// Remove directories left empty, innermost first. Names the edit asked
    /// for are never removed.
    fn cleanup_phase(&mut self) {
        let mut candidates: Vec<PathBuf> = self.cleanup.iter().cloned().collect();
        candidates.sort_by(|a, b| depth(b).cmp(&depth(a)).then_with(|| b.cmp(a)));
        for dir in candidates {
            if self.targets.contains(&dir) || !self.ns.is_empty_dir(&dir) {
                continue;
            }
            self.ns.remove(&dir);
            self.ops.push(Operation::RemoveDir(dir));
        }
    }
}
