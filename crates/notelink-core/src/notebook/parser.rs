//! Line-level parser for the marimo notebook format.
//!
//! A notebook file is a preamble (imports, `app = marimo.App(...)`), a
//! sequence of `@app.cell` decorated functions, and an `if __name__` trailer.
//! Parsing is purely textual: parameters name what a cell reads, the final
//! `return` names what it produces. No code is ever executed.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::types::{Cell, CellId, CellKind, Notebook, SourceSpan};
use crate::error::{Error, Result};

/// Flattened `def` signature: name, parameter list, optional annotation.
static DEF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\((.*)\)\s*(?:->[^:]*)?:\s*$").unwrap()
});

/// Flattened `return` statement tail.
static RETURN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^return\b\s*(.*)$").unwrap());

static IDENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Name given to the synthetic preamble cell.
pub const PREAMBLE_NAME: &str = "__preamble__";

/// Parser for extracting cells from marimo notebook source.
pub struct NotebookParser;

impl NotebookParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a notebook file.
    pub fn parse_file(&self, path: &Path) -> Result<Notebook> {
        let source = std::fs::read_to_string(path)?;
        self.parse_str(&source)
    }

    /// Parse notebook source text.
    ///
    /// Pure function of the text: records order of appearance but assumes
    /// nothing about dependency order.
    pub fn parse_str(&self, source: &str) -> Result<Notebook> {
        let lines: Vec<&str> = source.lines().collect();

        // Everything before the first decorator is the preamble, modeled as
        // a synthetic zero-input cell that the pruner always retains.
        let Some(first_cell_line) = lines.iter().position(|l| is_decorator_start(l)) else {
            return Err(Error::Parse {
                line: 1,
                message: "no cells found".to_string(),
            });
        };

        let preamble_text = lines[..first_cell_line].join("\n").trim_end().to_string();
        let mut cells = vec![Cell {
            id: CellId::new(0),
            name: PREAMBLE_NAME.to_string(),
            kind: CellKind::Preamble,
            params: Vec::new(),
            outputs: Vec::new(),
            text: preamble_text,
            span: SourceSpan {
                start_line: 1,
                end_line: first_cell_line.max(1),
            },
            order_index: 0,
        }];

        let mut i = first_cell_line;
        while i < lines.len() {
            let line = lines[i];
            if line.trim().is_empty() {
                i += 1;
                continue;
            }
            if is_trailer(line) {
                break;
            }
            if !is_decorator_start(line) {
                return Err(Error::Parse {
                    line: i + 1,
                    message: format!("expected '@app.cell' decorator, found {line:?}"),
                });
            }

            let (cell, next) = self.parse_cell(&lines, i, cells.len())?;
            cells.push(cell);
            i = next;
        }

        debug!(cells = cells.len() - 1, "parsed notebook");
        Ok(Notebook::new(cells))
    }

    /// Parse one cell starting at the decorator line. Returns the cell and
    /// the index of the first line after its body.
    fn parse_cell(&self, lines: &[&str], start: usize, order_index: usize) -> Result<(Cell, usize)> {
        // Decorator, possibly with parenthesized arguments spanning lines.
        let mut i = consume_balanced(lines, start)?;

        // Flatten the def signature (may span lines) and extract name/params.
        let def_line = i;
        let (signature, after_sig) = flatten_from(lines, i, |joined| {
            joined.contains('(') && paren_depth(joined) == 0
        })?;
        i = after_sig;

        let caps = DEF_RE.captures(&signature).ok_or_else(|| Error::Parse {
            line: def_line + 1,
            message: format!("expected a cell function definition, found {signature:?}"),
        })?;
        let def_name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let params = parse_params(caps.get(2).map(|m| m.as_str()).unwrap_or_default(), def_line)?;

        // Body: indented lines up to the next top-level line.
        let body_start = i;
        while i < lines.len() {
            let l = lines[i];
            if !l.is_empty() && !l.starts_with(' ') && !l.starts_with('\t') {
                break;
            }
            i += 1;
        }
        let mut body_end = i;
        while body_end > body_start && lines[body_end - 1].trim().is_empty() {
            body_end -= 1;
        }

        let outputs = parse_outputs(&lines[body_start..body_end], body_start)?;

        // Anonymous cells get a positional name.
        let name = if def_name == "_" {
            format!("cell_{order_index}")
        } else {
            def_name.to_string()
        };

        let cell = Cell {
            id: CellId::new(order_index),
            name,
            kind: CellKind::Code,
            params,
            outputs,
            text: lines[start..body_end].join("\n"),
            span: SourceSpan {
                start_line: start + 1,
                end_line: body_end,
            },
            order_index,
        };

        Ok((cell, i))
    }
}

impl Default for NotebookParser {
    fn default() -> Self {
        Self::new()
    }
}

fn is_decorator_start(line: &str) -> bool {
    line.starts_with("@app.cell")
}

fn is_trailer(line: &str) -> bool {
    line.starts_with("if __name__")
}

/// Net parenthesis depth of a chunk of text.
///
/// Simplified: does not account for parens inside string literals, which the
/// generated decorator and signature lines do not contain.
fn paren_depth(text: &str) -> i32 {
    let mut depth = 0i32;
    for ch in text.chars() {
        match ch {
            '(' => depth += 1,
            ')' => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Consume lines from `start` until parenthesis balance closes. Returns the
/// index of the first line after the balanced chunk.
fn consume_balanced(lines: &[&str], start: usize) -> Result<usize> {
    let mut depth = 0i32;
    let mut i = start;
    while i < lines.len() {
        depth += paren_depth(lines[i]);
        i += 1;
        if depth <= 0 {
            return Ok(i);
        }
    }
    Err(Error::Parse {
        line: start + 1,
        message: "unbalanced parentheses".to_string(),
    })
}

/// Join lines starting at `start` into a single logical line, stopping once
/// `done` accepts the accumulated text. Returns the text and the index of the
/// first unconsumed line.
fn flatten_from(
    lines: &[&str],
    start: usize,
    done: impl Fn(&str) -> bool,
) -> Result<(String, usize)> {
    let mut joined = String::new();
    let mut i = start;
    while i < lines.len() {
        let part = if joined.is_empty() {
            lines[i].trim_end()
        } else {
            joined.push(' ');
            lines[i].trim()
        };
        joined.push_str(part);
        i += 1;
        if done(&joined) {
            return Ok((joined, i));
        }
    }
    Err(Error::Parse {
        line: start + 1,
        message: "unexpected end of file".to_string(),
    })
}

/// Parse the parameter list of a flattened signature into an ordered,
/// de-duplicated list of names.
fn parse_params(list: &str, def_line: usize) -> Result<Vec<String>> {
    let mut params = Vec::new();
    for raw in list.split(',') {
        let name = raw.trim();
        if name.is_empty() {
            continue; // trailing comma
        }
        if !IDENT_RE.is_match(name) {
            return Err(Error::Parse {
                line: def_line + 1,
                message: format!("cell parameter is not a plain name: {name:?}"),
            });
        }
        if !params.iter().any(|p| p == name) {
            params.push(name.to_string());
        }
    }
    Ok(params)
}

/// Extract output names from the cell's final `return` statement.
///
/// Only returns at the body's base indentation count; returns inside nested
/// helper functions are deeper and skipped. A cell without a base-level
/// return produces nothing (pure side-effect cell).
fn parse_outputs(body: &[&str], body_offset: usize) -> Result<Vec<String>> {
    let base_indent = body
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);

    let Some(ret_idx) = body.iter().rposition(|l| {
        let indent = l.len() - l.trim_start().len();
        indent == base_indent && RETURN_RE.is_match(l.trim_start())
    }) else {
        return Ok(Vec::new());
    };

    // The return statement runs to the end of the body (multi-line tuples
    // are flattened by joining the remaining lines).
    let joined = body[ret_idx..]
        .iter()
        .map(|l| l.trim())
        .collect::<Vec<_>>()
        .join(" ");
    let line = body_offset + ret_idx + 1;

    let caps = RETURN_RE.captures(&joined).ok_or_else(|| Error::Parse {
        line,
        message: format!("malformed return statement: {joined:?}"),
    })?;
    let mut tail = caps.get(1).map(|m| m.as_str()).unwrap_or_default().trim();
    if tail.starts_with('(') && tail.ends_with(')') {
        tail = tail[1..tail.len() - 1].trim();
    }

    let mut outputs = Vec::new();
    for raw in tail.split(',') {
        let name = raw.trim();
        if name.is_empty() {
            continue;
        }
        if !IDENT_RE.is_match(name) {
            return Err(Error::Parse {
                line,
                message: format!("return statement must name outputs, found {name:?}"),
            });
        }
        outputs.push(name.to_string());
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Notebook {
        NotebookParser::new().parse_str(source).unwrap()
    }

    const SIMPLE: &str = "\
import marimo

app = marimo.App()


@app.cell
def a():
    x = 1
    return (x,)


@app.cell
def b(x):
    y = x + 1
    return (y,)


if __name__ == \"__main__\":
    app.run()
";

    #[test]
    fn parses_preamble_and_cells() {
        let nb = parse(SIMPLE);
        assert_eq!(nb.len(), 3);
        assert_eq!(nb.cells()[0].kind, CellKind::Preamble);
        assert_eq!(nb.cells()[0].text, "import marimo\n\napp = marimo.App()");
        assert_eq!(nb.cells()[1].name, "a");
        assert_eq!(nb.cells()[1].outputs, vec!["x"]);
        assert!(nb.cells()[1].params.is_empty());
        assert_eq!(nb.cells()[2].name, "b");
        assert_eq!(nb.cells()[2].params, vec!["x"]);
        assert_eq!(nb.cells()[2].outputs, vec!["y"]);
    }

    #[test]
    fn cell_text_is_verbatim() {
        let nb = parse(SIMPLE);
        assert_eq!(
            nb.cells()[1].text,
            "@app.cell\ndef a():\n    x = 1\n    return (x,)"
        );
    }

    #[test]
    fn parse_file_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nb.py");
        std::fs::write(&path, SIMPLE).unwrap();
        let nb = NotebookParser::new().parse_file(&path).unwrap();
        assert_eq!(nb.len(), 3);
    }

    #[test]
    fn no_cells_is_a_parse_error() {
        let err = NotebookParser::new()
            .parse_str("import marimo\napp = marimo.App()\n")
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
        assert!(err.to_string().contains("no cells found"));
    }

    #[test]
    fn anonymous_cells_get_positional_names() {
        let source = "\
import marimo
app = marimo.App()

@app.cell
def _():
    x = 1
    return (x,)

@app.cell
def _(x):
    print(x)
    return

if __name__ == \"__main__\":
    app.run()
";
        let nb = parse(source);
        assert_eq!(nb.cells()[1].name, "cell_1");
        assert_eq!(nb.cells()[2].name, "cell_2");
        assert!(nb.cells()[2].outputs.is_empty());
        assert!(nb.cells()[2].is_side_effect_only());
    }

    #[test]
    fn multiline_signature_and_return_are_flattened() {
        let source = "\
import marimo
app = marimo.App()

@app.cell
def wide(
    a,
    b,
    c,
):
    d = a + b + c
    e = d * 2
    return (
        d,
        e,
    )

if __name__ == \"__main__\":
    app.run()
";
        let nb = parse(source);
        assert_eq!(nb.cells()[1].params, vec!["a", "b", "c"]);
        assert_eq!(nb.cells()[1].outputs, vec!["d", "e"]);
    }

    #[test]
    fn decorator_arguments_are_tolerated() {
        let source = "\
import marimo
app = marimo.App()

@app.cell(hide_code=True)
def a():
    x = 1
    return (x,)

if __name__ == \"__main__\":
    app.run()
";
        let nb = parse(source);
        assert_eq!(nb.cells()[1].name, "a");
        assert!(nb.cells()[1].text.starts_with("@app.cell(hide_code=True)"));
    }

    #[test]
    fn nested_helper_returns_are_ignored() {
        let source = "\
import marimo
app = marimo.App()

@app.cell
def outer():
    def helper(v):
        return v + 1
    w = helper(41)
    return (w,)

if __name__ == \"__main__\":
    app.run()
";
        let nb = parse(source);
        assert_eq!(nb.cells()[1].outputs, vec!["w"]);
    }

    #[test]
    fn duplicate_params_are_collapsed() {
        let source = "\
import marimo
app = marimo.App()

@app.cell
def c(x, x):
    y = x
    return (y,)

if __name__ == \"__main__\":
    app.run()
";
        let nb = parse(source);
        assert_eq!(nb.cells()[1].params, vec!["x"]);
    }

    #[test]
    fn non_name_return_is_a_parse_error() {
        let source = "\
import marimo
app = marimo.App()

@app.cell
def c():
    x = 1
    return x + 1

if __name__ == \"__main__\":
    app.run()
";
        let err = NotebookParser::new().parse_str(source).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 7, .. }), "{err}");
    }

    #[test]
    fn stray_top_level_code_is_a_parse_error() {
        let source = "\
import marimo
app = marimo.App()

@app.cell
def a():
    x = 1
    return (x,)

print(\"not a cell\")
";
        let err = NotebookParser::new().parse_str(source).unwrap_err();
        assert!(matches!(err, Error::Parse { line: 9, .. }), "{err}");
    }

    #[test]
    fn cells_in_any_dependency_order_parse() {
        // Consumer before producer: order of appearance is recorded, not
        // validated here.
        let source = "\
import marimo
app = marimo.App()

@app.cell
def b(x):
    y = x + 1
    return (y,)

@app.cell
def a():
    x = 1
    return (x,)

if __name__ == \"__main__\":
    app.run()
";
        let nb = parse(source);
        assert_eq!(nb.cells()[1].name, "b");
        assert_eq!(nb.cells()[2].name, "a");
        assert_eq!(nb.cells()[1].order_index, 1);
        assert_eq!(nb.cells()[2].order_index, 2);
    }
}
