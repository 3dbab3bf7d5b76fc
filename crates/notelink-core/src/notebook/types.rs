//! Types for parsed notebooks.

/// Unique identifier for a cell within a notebook.
///
/// Assigned in order of appearance, so it doubles as the tie-break key for
/// stable topological ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub(crate) usize);

impl CellId {
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "cell_{}", self.0)
    }
}

/// Source span (1-based, inclusive line range) for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start_line: usize,
    pub end_line: usize,
}

/// Kind of cell in the notebook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    /// Module-level text before the first decorator (imports, app construction).
    /// Always retained by the pruner.
    Preamble,
    /// Ordinary code cell.
    Code,
}

/// A parsed notebook cell.
#[derive(Debug, Clone)]
pub struct Cell {
    /// Unique identifier.
    pub id: CellId,
    /// Function name, or a synthesized `cell_<n>` for anonymous (`def _`) cells.
    pub name: String,
    /// Kind of cell.
    pub kind: CellKind,
    /// Names this cell reads (order of declaration, de-duplicated).
    pub params: Vec<String>,
    /// Names this cell defines via its final return statement.
    pub outputs: Vec<String>,
    /// Verbatim source text, decorator through last body line.
    pub text: String,
    /// Location in the source file.
    pub span: SourceSpan,
    /// Position of appearance in the source file.
    pub order_index: usize,
}

impl Cell {
    /// A code cell with no outputs only matters for its side effects.
    ///
    /// Such cells are unreachable through output closure and are retained
    /// only when the whitelist names the cell itself.
    pub fn is_side_effect_only(&self) -> bool {
        self.kind == CellKind::Code && self.outputs.is_empty()
    }
}

/// A parsed notebook: the preamble cell followed by code cells in order of
/// appearance.
#[derive(Debug, Clone)]
pub struct Notebook {
    cells: Vec<Cell>,
}

impl Notebook {
    pub(crate) fn new(cells: Vec<Cell>) -> Self {
        Self { cells }
    }

    /// All cells, preamble first, in order of appearance.
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Look up a cell by ID.
    pub fn get(&self, id: CellId) -> Option<&Cell> {
        self.cells.get(id.0)
    }

    /// Code cells only (skips the preamble).
    pub fn code_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.kind == CellKind::Code)
    }

    /// Number of cells, preamble included.
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
