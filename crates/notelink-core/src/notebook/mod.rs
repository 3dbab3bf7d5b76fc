//! Notebook parsing: cell records extracted from marimo-format source.

mod parser;
mod types;

pub use parser::{NotebookParser, PREAMBLE_NAME};
pub use types::{Cell, CellId, CellKind, Notebook, SourceSpan};
