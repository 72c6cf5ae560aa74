//! Loader: read local JSON documents, validate against the embedded schemas,
//! and decode into `qa_core` types. No network I/O.
//!
//! Documents:
//! - allocation request (`dimensions`, `totalTarget`, `mode`)
//! - engine params (every field optional)
//! - quota cell set (array of cells, e.g. a previous allocation's `cells`)

use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::Value;

use qa_core::{variables, AllocationRequest, EngineParams, QuotaCell};

use crate::{looks_like_url_strict, schema, IoError, IoResult};

/// Hard cap on any single input document.
pub const MAX_INPUT_BYTES: u64 = 8 * 1024 * 1024;

/// Read a file as a JSON `Value`, rejecting URLs and oversized inputs.
pub fn read_json_value_with_limits(path: &Path) -> IoResult<Value> {
    let shown = path.display().to_string();
    if looks_like_url_strict(&shown) {
        return Err(IoError::Path(format!("only local files are accepted: {shown}")));
    }
    let f = File::open(path).map_err(|e| IoError::Path(format!("{shown}: {e}")))?;
    let len = f.metadata().map(|m| m.len()).unwrap_or(0);
    if len > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!("{shown} is {len} bytes (max {MAX_INPUT_BYTES})")));
    }

    let mut buf = Vec::with_capacity(len as usize);
    f.take(MAX_INPUT_BYTES + 1).read_to_end(&mut buf)?;
    if buf.len() as u64 > MAX_INPUT_BYTES {
        return Err(IoError::Limit(format!("{shown} exceeds {MAX_INPUT_BYTES} bytes")));
    }
    tracing::debug!(path = %shown, bytes = buf.len(), "read json input");
    Ok(serde_json::from_slice(&buf)?)
}

fn decode<T: DeserializeOwned>(kind: schema::SchemaKind, v: Value) -> IoResult<T> {
    schema::validate_value(kind, &v)?;
    serde_json::from_value(v).map_err(|e| IoError::Json {
        pointer: "/".into(),
        msg: format!("{}: {e}", kind.name()),
    })
}

// ----------------------------- Requests -----------------------------

pub fn parse_request_value(v: Value) -> IoResult<AllocationRequest> {
    decode(schema::SchemaKind::AllocationRequest, v)
}

pub fn parse_request_str(s: &str) -> IoResult<AllocationRequest> {
    parse_request_value(serde_json::from_str(s)?)
}

pub fn load_request(path: &Path) -> IoResult<AllocationRequest> {
    let req = parse_request_value(read_json_value_with_limits(path)?)?;
    tracing::debug!(
        dimensions = req.dimensions.len(),
        total_target = req.total_target,
        mode = req.mode.as_str(),
        "loaded allocation request"
    );
    Ok(req)
}

// ----------------------------- Params -----------------------------

pub fn parse_params_value(v: Value) -> IoResult<EngineParams> {
    let p: EngineParams = decode(schema::SchemaKind::EngineParams, v)?;
    variables::validate_domains(&p).map_err(|e| IoError::Invalid(format!("parameter domain error: {e}")))?;
    Ok(p)
}

pub fn load_params(path: &Path) -> IoResult<EngineParams> {
    parse_params_value(read_json_value_with_limits(path)?)
}

// ----------------------------- Cells -----------------------------

/// Decode a cell set and check that ids are unique.
pub fn parse_cells_value(v: Value) -> IoResult<Vec<QuotaCell>> {
    let cells: Vec<QuotaCell> = decode(schema::SchemaKind::QuotaCells, v)?;
    let mut seen = BTreeSet::new();
    for (i, c) in cells.iter().enumerate() {
        if !seen.insert(c.id.as_str()) {
            return Err(IoError::Invalid(format!("duplicate cell id '{}' at /{i}/id", c.id)));
        }
    }
    Ok(cells)
}

/// Load a cell set: either a bare array or an object carrying `cells`
/// (so a previous allocation artifact can be fed straight back in).
pub fn load_cells(path: &Path) -> IoResult<Vec<QuotaCell>> {
    let v = read_json_value_with_limits(path)?;
    let v = match v {
        Value::Object(mut map) => map.remove("cells").ok_or_else(|| IoError::Json {
            pointer: "/cells".into(),
            msg: "expected an array of cells or an object with `cells`".into(),
        })?,
        other => other,
    };
    let cells = parse_cells_value(v)?;
    tracing::debug!(cells = cells.len(), "loaded quota cells");
    Ok(cells)
}
