//! Embedded JSON Schemas (Draft 7) for every document the engine reads.
//!
//! Validation runs on the raw `Value` before typed decoding so errors carry
//! a JSON Pointer to the offending node. With the `schemaval` feature off,
//! validation is a no-op and serde decoding is the only gate.

use serde_json::Value;

use crate::IoResult;
#[cfg(feature = "schemaval")]
use crate::IoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaKind {
    AllocationRequest,
    EngineParams,
    QuotaCells,
}

impl SchemaKind {
    pub fn source(self) -> &'static str {
        match self {
            SchemaKind::AllocationRequest => include_str!("../schemas/allocation_request.schema.json"),
            SchemaKind::EngineParams => include_str!("../schemas/engine_params.schema.json"),
            SchemaKind::QuotaCells => include_str!("../schemas/quota_cells.schema.json"),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SchemaKind::AllocationRequest => "allocation_request",
            SchemaKind::EngineParams => "engine_params",
            SchemaKind::QuotaCells => "quota_cells",
        }
    }
}

/// Validate `instance` against the schema for `kind`; report the first violation.
#[cfg(feature = "schemaval")]
pub fn validate_value(kind: SchemaKind, instance: &Value) -> IoResult<()> {
    use jsonschema::{Draft, JSONSchema};

    let schema: Value = serde_json::from_str(kind.source()).map_err(|e| IoError::Schema {
        pointer: "/".into(),
        msg: format!("embedded schema {} unreadable: {e}", kind.name()),
    })?;
    let compiled = JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(&schema)
        .map_err(|e| IoError::Schema {
            pointer: "/".into(),
            msg: format!("schema {} compile error: {e}", kind.name()),
        })?;

    if let Err(errors) = compiled.validate(instance) {
        if let Some(err) = errors.into_iter().next() {
            let ptr = err.instance_path.to_string();
            return Err(IoError::Schema {
                pointer: if ptr.is_empty() { "/".into() } else { ptr },
                msg: err.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(not(feature = "schemaval"))]
#[inline]
pub fn validate_value(_kind: SchemaKind, _instance: &Value) -> IoResult<()> {
    Ok(())
}
