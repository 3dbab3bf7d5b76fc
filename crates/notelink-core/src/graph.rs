//! Dependency graph over notebook cells.
//!
//! Edges run from the cell producing a name to each cell consuming it.
//! Built in two passes: producers from outputs, then consumers from
//! parameters resolved through the producer index. Cross-cell cycles are
//! accepted structurally here; they only become fatal when the pruner has to
//! linearize the retained cells.

use std::collections::BTreeSet;

use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{Error, Result};
use crate::notebook::{Cell, CellId, Notebook};

/// Immutable dependency graph for one notebook.
#[derive(Debug)]
pub struct DependencyGraph {
    notebook: Notebook,
    /// Edges go from producer to consumer.
    graph: DiGraph<CellId, ()>,
    node_indices: FxHashMap<CellId, NodeIndex>,
    /// Output name to producing cell (exactly one or none).
    producer_of: FxHashMap<String, CellId>,
    /// Output name to consuming cells.
    consumers_of: FxHashMap<String, Vec<CellId>>,
}

impl DependencyGraph {
    /// Build the graph, validating producers and references.
    ///
    /// `externals` is the allowlist of host-provided global names; an
    /// external reference is legal but never becomes an edge.
    pub fn build(notebook: Notebook, externals: FxHashSet<String>) -> Result<Self> {
        let mut graph = DiGraph::new();
        let mut node_indices = FxHashMap::default();
        let mut producer_of: FxHashMap<String, CellId> = FxHashMap::default();
        let mut consumers_of: FxHashMap<String, Vec<CellId>> = FxHashMap::default();

        // First pass: register nodes and producers.
        for cell in notebook.cells() {
            let idx = graph.add_node(cell.id);
            node_indices.insert(cell.id, idx);

            for output in &cell.outputs {
                if let Some(&prev) = producer_of.get(output) {
                    let first = notebook.get(prev).map(|c| c.name.clone()).unwrap_or_default();
                    return Err(Error::DuplicateProducer {
                        name: output.clone(),
                        first,
                        second: cell.name.clone(),
                    });
                }
                producer_of.insert(output.clone(), cell.id);
            }
        }

        // Second pass: resolve parameters into edges.
        for cell in notebook.cells() {
            for param in &cell.params {
                match producer_of.get(param) {
                    Some(&producer) if producer == cell.id => {
                        // A cell reading its own output can never run.
                        return Err(Error::CyclicDependency {
                            names: vec![cell.name.clone()],
                        });
                    }
                    Some(&producer) => {
                        graph.add_edge(node_indices[&producer], node_indices[&cell.id], ());
                        consumers_of.entry(param.clone()).or_default().push(cell.id);
                    }
                    None if externals.contains(param) => {}
                    None => {
                        return Err(Error::UnresolvedReference {
                            cell: cell.name.clone(),
                            name: param.clone(),
                        });
                    }
                }
            }
        }

        Ok(Self {
            notebook,
            graph,
            node_indices,
            producer_of,
            consumers_of,
        })
    }

    pub fn notebook(&self) -> &Notebook {
        &self.notebook
    }

    /// The cell producing `name`, if any.
    pub fn producer_of(&self, name: &str) -> Option<&Cell> {
        self.producer_of.get(name).and_then(|&id| self.notebook.get(id))
    }

    /// Cells consuming `name`.
    pub fn consumers_of(&self, name: &str) -> &[CellId] {
        self.consumers_of.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Look up a cell by its cell name.
    pub fn cell_by_name(&self, name: &str) -> Option<&Cell> {
        self.notebook.cells().iter().find(|c| c.name == name)
    }

    /// All names the whitelist may reference: cell names and output names.
    pub fn universe(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        for cell in self.notebook.cells() {
            names.insert(cell.name.clone());
            names.extend(cell.outputs.iter().cloned());
        }
        names
    }

    /// Producers of a cell's parameters (distinct, external names excluded).
    pub fn dependencies(&self, id: CellId) -> Vec<CellId> {
        let mut deps = Vec::new();
        if let Some(cell) = self.notebook.get(id) {
            for param in &cell.params {
                if let Some(&producer) = self.producer_of.get(param) {
                    if !deps.contains(&producer) {
                        deps.push(producer);
                    }
                }
            }
        }
        deps
    }

    /// Direct dependents of a cell (distinct cells that read its outputs).
    pub fn dependents(&self, id: CellId) -> Vec<CellId> {
        self.node_indices
            .get(&id)
            .map(|&idx| {
                let mut seen = Vec::new();
                for neighbor in self.graph.neighbors(idx) {
                    let neighbor_id = self.graph[neighbor];
                    if !seen.contains(&neighbor_id) {
                        seen.push(neighbor_id);
                    }
                }
                seen
            })
            .unwrap_or_default()
    }

    pub(crate) fn petgraph(&self) -> &DiGraph<CellId, ()> {
        &self.graph
    }
}
