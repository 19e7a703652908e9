//! Dependency graph over pending moves and the scheduler that orders them.
//!
//! An edge `x -> y` means move `x` waits for move `y`:
//! - `Vacate`: `x` wants a name that `y` still occupies (its target equals
//!   `y`'s source, lies inside it, or contains it). Parking `y` under a
//!   temporary name satisfies the edge.
//! - `Complete`: `x` lives inside `y`'s destination and can only move once
//!   `y` has arrived there.
//! - `Parent`: `x` moves into a directory that `y` brings into place, so `y`
//!   must arrive first. Unlike `Complete`, `x` itself may still be parked.
//!
//! A move whose target and source are nested in each other waits for itself;
//! it is broken like any other cycle.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use crate::entry::ancestors;

/// One rename the resolver must schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Move {
    /// Index of the plan entry this move realizes.
    pub entry: usize,
    /// Where the content sits when the plan starts executing.
    pub source: PathBuf,
    pub target: PathBuf,
    /// Move that must complete first (composed nested entries).
    pub after: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeKind {
    Vacate,
    Complete,
    Parent,
}

#[derive(Debug)]
pub struct OperationGraph {
    moves: Vec<Move>,
    deps: Vec<Vec<(usize, EdgeKind)>>,
    vacate_dependents: Vec<Vec<usize>>,
    /// Released when the move arrives (`Complete` and `Parent` edges).
    arrival_dependents: Vec<Vec<usize>>,
}

impl OperationGraph {
    pub fn new(moves: Vec<Move>) -> Self {
        let n = moves.len();
        let by_source: BTreeMap<&Path, usize> = moves
            .iter()
            .enumerate()
            .map(|(i, m)| (m.source.as_path(), i))
            .collect();
        let by_target: HashMap<&Path, usize> = moves
            .iter()
            .enumerate()
            .map(|(i, m)| (m.target.as_path(), i))
            .collect();

        let mut deps: Vec<Vec<(usize, EdgeKind)>> = vec![Vec::new(); n];
        for (x, m) in moves.iter().enumerate() {
            let mut waits: BTreeSet<usize> = BTreeSet::new();
            // the target itself, or a directory above it, is still someone's source
            for p in std::iter::once(m.target.as_path()).chain(ancestors(&m.target)) {
                if let Some(&y) = by_source.get(p) {
                    waits.insert(y);
                }
            }
            // sources still sitting below the target, unless they only get
            // there by following this very move
            for (src, &y) in by_source.range(m.target.as_path()..) {
                if !src.starts_with(&m.target) {
                    break;
                }
                if !follows(&moves, y, x) {
                    waits.insert(y);
                }
            }
            deps[x].extend(waits.into_iter().map(|y| (y, EdgeKind::Vacate)));
            if let Some(p) = m.after {
                deps[x].push((p, EdgeKind::Complete));
            }
            // a directory above the target is itself the target of a move
            for anc in ancestors(&m.target) {
                if let Some(&y) = by_target.get(anc) {
                    if y != x && m.after != Some(y) {
                        deps[x].push((y, EdgeKind::Parent));
                    }
                }
            }
        }

        let mut vacate_dependents = vec![Vec::new(); n];
        let mut arrival_dependents = vec![Vec::new(); n];
        for (x, edges) in deps.iter().enumerate() {
            for &(y, kind) in edges {
                match kind {
                    EdgeKind::Vacate => vacate_dependents[y].push(x),
                    EdgeKind::Complete | EdgeKind::Parent => arrival_dependents[y].push(x),
                }
            }
        }

        Self {
            moves,
            deps,
            vacate_dependents,
            arrival_dependents,
        }
    }

    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn dependencies(&self, x: usize) -> &[(usize, EdgeKind)] {
        &self.deps[x]
    }
}

/// True when `y` runs only after `x` through its chain of `after` links.
fn follows(moves: &[Move], y: usize, x: usize) -> bool {
    let mut cur = moves[y].after;
    let mut hops = 0;
    while let Some(p) = cur {
        if p == x {
            return true;
        }
        hops += 1;
        if hops > moves.len() {
            return false;
        }
        cur = moves[p].after;
    }
    false
}

/// What the resolver should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Move `x` to its target.
    Run(usize),
    /// Move `x` out of the way under a temporary name.
    Park(usize),
}

/// Kahn-style scheduler with cycle breaking.
pub struct Scheduler<'g> {
    graph: &'g OperationGraph,
    waiting: Vec<usize>,
    done: Vec<bool>,
    parked: Vec<bool>,
    ready: BTreeSet<usize>,
    pending: BTreeSet<usize>,
}

impl<'g> Scheduler<'g> {
    pub fn new(graph: &'g OperationGraph) -> Self {
        let waiting: Vec<usize> = graph.deps.iter().map(Vec::len).collect();
        let ready = (0..graph.len()).filter(|&x| waiting[x] == 0).collect();
        Self {
            graph,
            waiting,
            done: vec![false; graph.len()],
            parked: vec![false; graph.len()],
            ready,
            pending: (0..graph.len()).collect(),
        }
    }

    /// Next step, `Ok(None)` when every move ran, or `Err(cycle)` for a cycle
    /// that has no member that can be parked.
    pub fn next_step(&mut self) -> Result<Option<Step>, Vec<usize>> {
        if let Some(x) = self.ready.pop_first() {
            self.complete(x);
            return Ok(Some(Step::Run(x)));
        }
        let Some(&start) = self.pending.first() else {
            return Ok(None);
        };
        let cycle = self.find_cycle(start);
        match self.choose_parking(&cycle) {
            Some(x) => {
                self.park(x);
                Ok(Some(Step::Park(x)))
            }
            None => Err(cycle),
        }
    }

    fn unsatisfied(&self, y: usize, kind: EdgeKind) -> bool {
        !self.done[y] && !(kind == EdgeKind::Vacate && self.parked[y])
    }

    fn release(&mut self, x: usize) {
        self.waiting[x] -= 1;
        if self.waiting[x] == 0 && !self.done[x] {
            self.ready.insert(x);
        }
    }

    fn complete(&mut self, x: usize) {
        self.done[x] = true;
        self.pending.remove(&x);
        if !self.parked[x] {
            for i in 0..self.graph.vacate_dependents[x].len() {
                let d = self.graph.vacate_dependents[x][i];
                self.release(d);
            }
        }
        for i in 0..self.graph.arrival_dependents[x].len() {
            let d = self.graph.arrival_dependents[x][i];
            self.release(d);
        }
    }

    fn park(&mut self, x: usize) {
        self.parked[x] = true;
        for i in 0..self.graph.vacate_dependents[x].len() {
            let d = self.graph.vacate_dependents[x][i];
            self.release(d);
        }
    }

    /// Depth-first search over unsatisfied edges. Every pending move waits on
    /// something, so the walk always closes a cycle.
    fn find_cycle(&self, start: usize) -> Vec<usize> {
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            Unvisited,
            InProgress,
            Done,
        }
        let mut mark = vec![Mark::Unvisited; self.graph.len()];
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        mark[start] = Mark::InProgress;

        while let Some(top) = stack.len().checked_sub(1) {
            let (x, mut edge) = stack[top];
            let deps = &self.graph.deps[x];
            let mut next = None;
            while edge < deps.len() {
                let (y, kind) = deps[edge];
                edge += 1;
                if self.unsatisfied(y, kind) && mark[y] != Mark::Done {
                    next = Some(y);
                    break;
                }
            }
            stack[top].1 = edge;
            match next {
                Some(y) if mark[y] == Mark::InProgress => {
                    let from = stack.iter().position(|&(n, _)| n == y).unwrap_or(0);
                    return stack[from..].iter().map(|&(n, _)| n).collect();
                }
                Some(y) => {
                    mark[y] = Mark::InProgress;
                    stack.push((y, 0));
                }
                None => {
                    mark[x] = Mark::Done;
                    stack.pop();
                }
            }
        }
        Vec::new()
    }

    /// Lowest-indexed cycle member that another member waits on to vacate and
    /// whose own source is already in place.
    fn choose_parking(&self, cycle: &[usize]) -> Option<usize> {
        let mut candidates: Vec<usize> = Vec::new();
        for (i, &x) in cycle.iter().enumerate() {
            let y = cycle[(i + 1) % cycle.len()];
            let vacate_edge = self.graph.deps[x]
                .iter()
                .any(|&(d, kind)| d == y && kind == EdgeKind::Vacate && self.unsatisfied(d, kind));
            let in_place = self.graph.deps[y]
                .iter()
                .all(|&(d, kind)| kind != EdgeKind::Complete || !self.unsatisfied(d, kind));
            if vacate_edge && in_place && !self.parked[y] {
                candidates.push(y);
            }
        }
        candidates.into_iter().min()
    }
}

/// Fresh name for parking `source` at the top of the edited directory.
///
/// Pure: the caller decides what is taken (planned paths plus whatever
/// currently exists); the counter grows until a free name is found.
pub fn temp_name(source: &Path, salt: u32, taken: impl Fn(&Path) -> bool) -> PathBuf {
    let base = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "entry".to_string());
    let mut n: u64 = 0;
    loop {
        let candidate = PathBuf::from(format!(".{base}.{salt}.{n}.tmp"));
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

/// Index of moves by entry, for translating `after` references.
pub fn index_by_entry(moves: &[Move]) -> HashMap<usize, usize> {
    moves.iter().enumerate().map(|(i, m)| (m.entry, i)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(entry: usize, source: &str, target: &str) -> Move {
        Move {
            entry,
            source: PathBuf::from(source),
            target: PathBuf::from(target),
            after: None,
        }
    }

    fn drain(graph: &OperationGraph) -> Vec<Step> {
        let mut sched = Scheduler::new(graph);
        let mut steps = Vec::new();
        while let Some(step) = sched.next_step().expect("schedulable") {
            steps.push(step);
        }
        steps
    }

    #[test]
    fn chain_runs_vacate_before_occupy() {
        // a->b, b->c, c->d: c must go first, then b, then a
        let g = OperationGraph::new(vec![mv(0, "a", "b"), mv(1, "b", "c"), mv(2, "c", "d")]);
        assert_eq!(drain(&g), vec![Step::Run(2), Step::Run(1), Step::Run(0)]);
    }

    #[test]
    fn swap_parks_one_member() {
        let g = OperationGraph::new(vec![mv(0, "a", "b"), mv(1, "b", "a")]);
        let steps = drain(&g);
        assert_eq!(steps.len(), 3);
        assert!(matches!(steps[0], Step::Park(_)));
        let parked = match steps[0] {
            Step::Park(x) => x,
            _ => unreachable!(),
        };
        assert_eq!(steps[2], Step::Run(parked));
    }

    #[test]
    fn three_cycle_parks_lowest_member() {
        let g = OperationGraph::new(vec![mv(0, "a", "b"), mv(1, "b", "c"), mv(2, "c", "a")]);
        assert_eq!(
            drain(&g),
            vec![Step::Park(0), Step::Run(2), Step::Run(1), Step::Run(0)]
        );
    }

    #[test]
    fn target_inside_own_source_is_a_self_cycle() {
        let g = OperationGraph::new(vec![mv(0, "x", "x/new_x")]);
        assert_eq!(g.dependencies(0), &[(0, EdgeKind::Vacate)]);
        assert_eq!(drain(&g), vec![Step::Park(0), Step::Run(0)]);
    }

    #[test]
    fn target_containing_other_source_waits_for_it() {
        // f wants name d while d/a still lives there
        let g = OperationGraph::new(vec![mv(0, "f", "d"), mv(1, "d/a", "b")]);
        assert_eq!(drain(&g), vec![Step::Run(1), Step::Run(0)]);
    }

    #[test]
    fn move_into_directory_waits_for_that_directory() {
        // b -> n/b is listed before a -> n; n only exists once a arrives
        let g = OperationGraph::new(vec![mv(0, "b", "n/b"), mv(1, "a", "n")]);
        assert_eq!(g.dependencies(0), &[(1, EdgeKind::Parent)]);
        assert_eq!(drain(&g), vec![Step::Run(1), Step::Run(0)]);
    }

    #[test]
    fn waiting_for_a_parent_does_not_prevent_parking() {
        // c -> d/c needs x in place as d; d -> c needs c gone first
        let g = OperationGraph::new(vec![mv(0, "c", "d/c"), mv(1, "x", "d"), mv(2, "d", "c")]);
        assert_eq!(
            drain(&g),
            vec![Step::Park(0), Step::Run(2), Step::Run(1), Step::Run(0)]
        );
    }

    #[test]
    fn complete_edges_order_composed_children() {
        let mut child = mv(1, "y/a", "z");
        child.after = Some(0);
        let g = OperationGraph::new(vec![mv(0, "x", "y"), child]);
        assert_eq!(drain(&g), vec![Step::Run(0), Step::Run(1)]);
    }

    #[test]
    fn temp_name_skips_taken_names() {
        let taken = [PathBuf::from(".a.7.0.tmp"), PathBuf::from(".a.7.1.tmp")];
        let name = temp_name(Path::new("dir/a"), 7, |p| taken.iter().any(|t| t == p));
        assert_eq!(name, PathBuf::from(".a.7.2.tmp"));
    }
}
