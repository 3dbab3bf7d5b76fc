//! Whitelist-driven pruning: backward dependency closure plus a stable
//! topological order.

use std::collections::{BTreeSet, VecDeque};

use petgraph::algo::kosaraju_scc;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::error::{Error, Result};
use crate::graph::DependencyGraph;
use crate::notebook::{Cell, CellId, CellKind};

/// Ordered sequence of retained cells: every retained producer precedes its
/// consumers, and the preamble cell comes first.
#[derive(Debug, Clone)]
pub struct PrunedNotebook {
    cells: Vec<Cell>,
}

impl PrunedNotebook {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn code_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.kind == CellKind::Code)
    }
}

/// Compute the minimal retained cell set for `keep_seed` and order it.
///
/// Seed names resolve to cells two ways: an output name keeps its producer, a
/// cell name keeps that cell. The latter is the only way a side-effect-only
/// cell (no outputs) can be retained; nothing can depend on it. The closure
/// then walks backward through parameters until fixpoint. The synthetic
/// preamble cell is always retained.
pub fn prune(graph: &DependencyGraph, keep_seed: &BTreeSet<String>) -> Result<PrunedNotebook> {
    let notebook = graph.notebook();

    let mut keep: FxHashSet<CellId> = FxHashSet::default();
    for name in keep_seed {
        if let Some(producer) = graph.producer_of(name) {
            keep.insert(producer.id);
        }
        if let Some(cell) = graph.cell_by_name(name) {
            keep.insert(cell.id);
        }
    }
    for cell in notebook.cells() {
        if cell.kind == CellKind::Preamble {
            keep.insert(cell.id);
        }
    }

    // Backward closure over parameter producers.
    let mut queue: VecDeque<CellId> = keep.iter().copied().collect();
    while let Some(id) = queue.pop_front() {
        for producer in graph.dependencies(id) {
            if keep.insert(producer) {
                queue.push_back(producer);
            }
        }
    }

    debug!(retained = keep.len(), total = notebook.len(), "computed closure");

    let cells = order_retained(graph, &keep)?;
    Ok(PrunedNotebook { cells })
}

/// Kahn's algorithm over the retained subgraph. Ready cells are emitted in
/// ascending order of appearance, so the output is deterministic and keeps
/// the original relative order wherever dependencies allow.
fn order_retained(graph: &DependencyGraph, keep: &FxHashSet<CellId>) -> Result<Vec<Cell>> {
    let notebook = graph.notebook();

    let mut remaining: BTreeSet<CellId> = keep.iter().copied().collect();
    let mut indegree: FxHashMap<CellId, usize> = FxHashMap::default();
    for &id in keep {
        let deps = graph
            .dependencies(id)
            .into_iter()
            .filter(|dep| keep.contains(dep))
            .count();
        indegree.insert(id, deps);
    }

    let mut ordered = Vec::with_capacity(keep.len());
    while let Some(&next) = remaining.iter().find(|id| indegree[*id] == 0) {
        remaining.remove(&next);
        let cell = notebook.get(next).ok_or_else(|| Error::CyclicDependency {
            names: vec![next.to_string()],
        })?;
        ordered.push(cell.clone());

        for dependent in graph.dependents(next) {
            if remaining.contains(&dependent) {
                *indegree.get_mut(&dependent).expect("retained cell") -= 1;
            }
        }
    }

    if !remaining.is_empty() {
        return Err(Error::CyclicDependency {
            names: cycle_names(graph, &remaining),
        });
    }

    Ok(ordered)
}

/// Name the cycle that stalled the ordering, via strongly connected
/// components restricted to the stalled cells.
fn cycle_names(graph: &DependencyGraph, stalled: &BTreeSet<CellId>) -> Vec<String> {
    let notebook = graph.notebook();
    let name_of = |id: CellId| {
        notebook
            .get(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    for scc in kosaraju_scc(graph.petgraph()) {
        if scc.len() < 2 {
            continue;
        }
        let mut ids: Vec<CellId> = scc.iter().map(|&idx| graph.petgraph()[idx]).collect();
        if ids.iter().all(|id| stalled.contains(id)) {
            ids.sort();
            return ids.into_iter().map(name_of).collect();
        }
    }

    // No multi-cell component matched; report everything that stalled.
    stalled.iter().copied().map(name_of).collect()
}
