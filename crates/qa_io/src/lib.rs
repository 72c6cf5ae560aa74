//! qa_io: local JSON I/O for the quota engine.
//!
//! - `loader`: read request / params / cell-set files (size-capped, no URLs)
//! - `schema`: embedded JSON Schemas, validated before typed decoding
//! - `canonical_json`: sorted-key compact bytes + atomic file writes
//! - `hasher`: SHA-256 digests over raw or canonical bytes
//!
//! Everything here fails with `IoError`; the algorithms never see a path.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Unified error for qa_io.
#[derive(Debug, Error)]
pub enum IoError {
    /// Filesystem / path errors (open, read, rename, fsync).
    #[error("io/path error: {0}")]
    Path(String),

    /// JSON decode/encode errors with a JSON Pointer into the document.
    #[error("json error at {pointer}: {msg}")]
    Json { pointer: String, msg: String },

    /// Document does not satisfy its embedded schema.
    #[error("schema error at {pointer}: {msg}")]
    Schema { pointer: String, msg: String },

    #[error("hash error: {0}")]
    Hash(String),

    /// Input exceeds a hard limit (file size).
    #[error("limit exceeded: {0}")]
    Limit(String),

    /// Well-formed but semantically invalid input.
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type IoResult<T> = Result<T, IoError>;

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for IoError {
    fn from(e: serde_json::Error) -> Self {
        // serde_json reports line/column, not a pointer.
        IoError::Json {
            pointer: "/".to_string(),
            msg: e.to_string(),
        }
    }
}

pub mod canonical_json;
pub mod hasher;
pub mod loader;
pub mod schema;

/// Returns true if `s` looks like a URL (any `<scheme>://`, including `file://`).
#[inline]
pub fn looks_like_url_strict(s: &str) -> bool {
    s.trim().contains("://")
}

pub mod prelude {
    pub use crate::{looks_like_url_strict, IoError, IoResult};

    pub use crate::canonical_json;
    pub use crate::hasher;
    pub use crate::loader;
    pub use crate::schema;

    pub use crate::canonical_json::{to_canonical_bytes, write_canonical_file};
    pub use crate::hasher::{allocation_digest, sha256_canonical, sha256_hex};
    pub use crate::loader::{load_cells, load_params, load_request};
}
