//! Minify command implementations for the notelink CLI.
//!
//! Both subcommands share one pipeline: parse the notebook, build the
//! dependency graph, resolve the whitelist, prune, and serialize. File mode
//! writes the result; URL mode encodes it into a playground link.

use std::path::{Path, PathBuf};

use anyhow::Context;
use rustc_hash::FxHashSet;
use tracing::{debug, info};

use notelink_core::{
    DependencyGraph, EncodeOptions, NotebookParser, encode, prune, read_only_url,
    resolve_whitelist, serialize, share_url,
};

/// Run the core pipeline and return the minified source text.
fn minify_source(
    source: &Path,
    whitelist: Option<&str>,
    externals: &[String],
) -> anyhow::Result<String> {
    let notebook = NotebookParser::new().parse_file(source)?;
    debug!(cells = notebook.len(), path = %source.display(), "parsed notebook");

    let externals: FxHashSet<String> = externals.iter().cloned().collect();
    let graph = DependencyGraph::build(notebook, externals)?;

    let keep_seed = match whitelist {
        Some(expr) => resolve_whitelist(expr, &graph.universe())?,
        // No whitelist: keep every cell, side-effect cells included.
        None => graph.universe(),
    };

    let pruned = prune(&graph, &keep_seed)?;
    debug!(retained = pruned.cells().len(), "pruned notebook");

    Ok(serialize(&pruned)?)
}

/// Minify a notebook and write it to a file.
pub fn to_file(
    source: &str,
    whitelist: Option<&str>,
    out: Option<&str>,
    externals: &[String],
) -> anyhow::Result<()> {
    let source = Path::new(source);
    let text = minify_source(source, whitelist, externals)?;

    let out_path = match out {
        Some(path) => PathBuf::from(path),
        None => default_out_path(source),
    };
    std::fs::write(&out_path, &text)
        .with_context(|| format!("failed to write {}", out_path.display()))?;

    let original_size = std::fs::metadata(source)?.len();
    if original_size > 0 {
        let reduction = 1.0 - (text.len() as f64 / original_size as f64);
        info!(
            "wrote {} ({:.2}% smaller than original)",
            out_path.display(),
            reduction * 100.0
        );
    }

    println!("{}", out_path.display());
    Ok(())
}

/// Minify a notebook and print a shareable playground URL.
pub fn to_url(
    source: &str,
    whitelist: Option<&str>,
    externals: &[String],
    read_only: bool,
    max_size: usize,
) -> anyhow::Result<()> {
    let text = minify_source(Path::new(source), whitelist, externals)?;

    let opts = EncodeOptions {
        max_token_len: max_size,
    };
    let token = encode(&text, &opts)?;
    debug!(token_len = token.len(), budget = max_size, "encoded artifact");

    let url = if read_only {
        read_only_url(&token)
    } else {
        share_url(&token)
    };
    println!("{url}");
    Ok(())
}

/// Default output path: `<stem>.min.py` next to the source file.
fn default_out_path(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "notebook".to_string());
    source.with_file_name(format!("{stem}.min.py"))
}
