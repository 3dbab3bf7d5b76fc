//! Rendering a pruned notebook back to marimo-format source.

use crate::error::{Error, Result};
use crate::notebook::CellKind;
use crate::prune::PrunedNotebook;

const TRAILER: &str = "if __name__ == \"__main__\":\n    app.run()\n";

/// Render the retained cells back to notebook source.
///
/// Each cell's text is emitted byte-for-byte in pruned order, blocks
/// separated by two blank lines, with the standard trailer appended.
/// Re-parsing the result yields a structurally equivalent cell list.
pub fn serialize(pruned: &PrunedNotebook) -> Result<String> {
    if pruned.code_cells().next().is_none() {
        return Err(Error::EmptyOutput);
    }

    let mut out = String::new();
    for cell in pruned.cells() {
        match cell.kind {
            CellKind::Preamble => {
                if !cell.text.is_empty() {
                    out.push_str(&cell.text);
                    out.push('\n');
                }
            }
            CellKind::Code => {
                if !out.is_empty() {
                    out.push_str("\n\n");
                }
                out.push_str(&cell.text);
                out.push('\n');
            }
        }
    }
    out.push_str("\n\n");
    out.push_str(TRAILER);

    Ok(out)
}
