//! URL-safe encoding of minified notebook source.
//!
//! Token scheme: `v1.` + base64url (no padding) of the raw-DEFLATE
//! compressed UTF-8 text. The compression level is fixed, so identical input
//! always yields an identical token.

use std::io::{Read, Write};

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use tracing::debug;

use crate::error::{Error, Result};

/// Version prefix of every token. The `.` never appears in the base64url
/// alphabet, so the payload boundary is unambiguous.
pub const TOKEN_PREFIX: &str = "v1.";

/// Default token budget in bytes: the playground URL-size ceiling.
pub const DEFAULT_MAX_TOKEN_LEN: usize = 32_000;

/// Base URL for an editable playground link.
pub const SHARE_BASE_URL: &str = "https://marimo.app/#code/";

/// Base URL for the read-only embed variant.
pub const READ_ONLY_BASE_URL: &str =
    "https://marimo.app?mode=read&embed=true&include-code=false&show-chrome=false&code=";

/// Options for [`encode`].
#[derive(Debug, Clone, Copy)]
pub struct EncodeOptions {
    /// Maximum token length in bytes; longer tokens are rejected.
    pub max_token_len: usize,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            max_token_len: DEFAULT_MAX_TOKEN_LEN,
        }
    }
}

/// Encode notebook source into a URL-safe token.
pub fn encode(text: &str, opts: &EncodeOptions) -> Result<String> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(text.as_bytes())?;
    let compressed = encoder.finish()?;

    let mut token = String::from(TOKEN_PREFIX);
    URL_SAFE_NO_PAD.encode_string(&compressed, &mut token);

    debug!(
        input = text.len(),
        compressed = compressed.len(),
        token = token.len(),
        "encoded artifact"
    );

    if token.len() > opts.max_token_len {
        return Err(Error::ArtifactTooLarge {
            size: token.len(),
            limit: opts.max_token_len,
        });
    }
    Ok(token)
}

/// Decode a token back to notebook source. Lossless inverse of [`encode`].
pub fn decode(token: &str) -> Result<String> {
    let payload = token.strip_prefix(TOKEN_PREFIX).ok_or_else(|| {
        Error::CorruptArtifact(format!("missing '{TOKEN_PREFIX}' version prefix"))
    })?;

    let compressed = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|e| Error::CorruptArtifact(format!("invalid base64 payload: {e}")))?;

    let mut text = String::new();
    DeflateDecoder::new(compressed.as_slice())
        .read_to_string(&mut text)
        .map_err(|e| Error::CorruptArtifact(format!("invalid compressed payload: {e}")))?;
    Ok(text)
}

/// Wrap a token in the playground share URL.
pub fn share_url(token: &str) -> String {
    format!("{SHARE_BASE_URL}{token}")
}

/// Wrap a token in the read-only embed URL.
pub fn read_only_url(token: &str) -> String {
    format!("{READ_ONLY_BASE_URL}{token}")
}
