//! SHA-256 digests for inputs and allocation artifacts.
//!
//! - `sha256_canonical` hashes a value's canonical JSON bytes.
//! - `sha256_hex` / `sha256_file` hash raw bytes.
//! - `allocation_digest` hashes a cell set *without* ids or progress, so two
//!   runs that differ only in their id source produce the same digest.
//!
//! Hex digests are lowercase.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Serialize;
use sha2::{Digest, Sha256};

use qa_core::{DemographicFilter, QuotaCell};

use crate::{canonical_json::to_canonical_bytes, IoError, IoResult};

/// SHA-256 over raw bytes.
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// SHA-256 over the canonical JSON bytes of `value`.
pub fn sha256_canonical<T: Serialize + ?Sized>(value: &T) -> IoResult<String> {
    let bytes = to_canonical_bytes(value).map_err(|e| IoError::Hash(e.to_string()))?;
    Ok(sha256_hex(&bytes))
}

/// SHA-256 over a file's raw bytes, streamed.
pub fn sha256_file(path: &Path) -> IoResult<String> {
    let f = File::open(path).map_err(|e| IoError::Path(format!("{}: {e}", path.display())))?;
    let mut reader = BufReader::new(f);
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

#[derive(Serialize)]
struct DigestCell<'a> {
    name: &'a str,
    target: u32,
    #[serde(rename = "demographicFilter")]
    demographic_filter: &'a DemographicFilter,
}

/// Id-independent digest of a cell set: (name, target, filter) in order.
pub fn allocation_digest(cells: &[QuotaCell]) -> IoResult<String> {
    let view: Vec<DigestCell<'_>> = cells
        .iter()
        .map(|c| DigestCell {
            name: &c.name,
            target: c.target,
            demographic_filter: &c.demographic_filter,
        })
        .collect();
    sha256_canonical(&view)
}
