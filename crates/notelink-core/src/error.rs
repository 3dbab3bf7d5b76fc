//! Error types for notelink-core.

use thiserror::Error;

/// Result type for notelink-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the minification pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Notebook source could not be parsed.
    #[error("parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Two cells declare the same output name.
    #[error("duplicate producer for '{name}': declared by cells '{first}' and '{second}'")]
    DuplicateProducer {
        name: String,
        first: String,
        second: String,
    },

    /// A cell parameter that no cell produces and that is not allowlisted as external.
    #[error(
        "unresolved reference: cell '{cell}' reads '{name}', which no cell produces and which is not an external name"
    )]
    UnresolvedReference { cell: String, name: String },

    /// The whitelist expression is malformed or selects nothing.
    #[error("invalid whitelist: {0}")]
    InvalidWhitelist(String),

    /// A true cycle among retained cells; no execution order exists.
    #[error("cyclic dependency among cells: {}", names.join(" -> "))]
    CyclicDependency { names: Vec<String> },

    /// Pruning retained no code cells.
    #[error("empty output: no code cells retained")]
    EmptyOutput,

    /// The encoded token exceeds the configured size budget.
    #[error("artifact too large: token is {size} bytes, limit is {limit}")]
    ArtifactTooLarge { size: usize, limit: usize },

    /// A token that cannot be decoded back to notebook source.
    #[error("corrupt artifact: {0}")]
    CorruptArtifact(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
