//! Core minification pipeline for marimo notebooks.
//!
//! This crate provides:
//! - Cell parser for the marimo textual notebook format
//! - Dependency graph over produced and consumed names
//! - Whitelist expression resolution
//! - Whitelist-driven pruning with a stable topological order
//! - Serialization back to notebook source
//! - URL-safe token encoding for shareable links
//!
//! The pipeline is pure and single-threaded:
//! parse → build graph → resolve whitelist → prune → serialize → encode.
//! Each stage fails fast with a typed [`Error`].

pub mod codec;
pub mod error;
pub mod graph;
pub mod notebook;
pub mod prune;
pub mod serialize;
pub mod whitelist;

pub use codec::{DEFAULT_MAX_TOKEN_LEN, EncodeOptions, decode, encode, read_only_url, share_url};
pub use error::{Error, Result};
pub use graph::DependencyGraph;
pub use notebook::{Cell, CellId, CellKind, Notebook, NotebookParser, SourceSpan};
pub use prune::{PrunedNotebook, prune};
pub use serialize::serialize;
pub use whitelist::{WhitelistExpr, resolve_whitelist};
