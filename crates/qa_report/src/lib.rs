//! qa_report: pure offline report model + renderers (JSON / plain text).
//!
//! Rules:
//! - No I/O. Callers pass the allocation document already parsed as JSON.
//! - Percent strings are one-decimal, computed from integer targets (no float
//!   formatting drift between platforms).
//! - Stable section and row order: cells appear in document order.

#![deny(unsafe_code)]

use core::fmt;

use serde_json::Value;

pub mod render_text;

pub use render_text::render_text;

/// Loosely coupled input: the serialized `AllocationDoc`.
pub type AllocationArtifact = Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportError {
    MissingField(&'static str),
    Inconsistent(&'static str),
    Render(&'static str),
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReportError::MissingField(p) => write!(f, "report: missing field {p}"),
            ReportError::Inconsistent(m) => write!(f, "report: inconsistent artifact ({m})"),
            ReportError::Render(m) => write!(f, "report: render failed ({m})"),
        }
    }
}

impl std::error::Error for ReportError {}

// ===== Model =====

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportModel {
    pub header: SectionHeader,
    pub totals: SectionTotals,
    pub cells: Vec<CellRow>,
    pub warnings: Vec<String>,
    pub integrity: SectionIntegrity,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionHeader {
    pub title: String,
    pub operation: String,
    pub mode: Option<String>,
    pub dimensions: Vec<String>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionTotals {
    pub total_target: u64,
    pub allocated: u64,
    pub delta: i64,
    pub reconciled: bool,
    pub cell_count: u64,
    pub completes: u64,
    pub completion_pct_1dp: String,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellRow {
    pub id: String,
    pub name: String,
    pub target: u64,
    pub share_pct_1dp: String,
    pub current: u64,
    pub status: String,
    /// "dim=category" pairs in key order; empty for custom cells.
    pub filter: Vec<String>,
}

#[cfg_attr(feature = "render_json", derive(serde::Serialize))]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionIntegrity {
    pub allocation_sha256: String,
    pub params_sha256: String,
    pub engine: String,
    pub format_version: String,
}

// ===== API =====

/// Build the report model from an allocation document (pure, offline).
pub fn build_model(doc: &AllocationArtifact) -> Result<ReportModel, ReportError> {
    let operation = json_get_str(doc, "/operation")?;
    let total_target = json_get_u64(doc, "/total_target")?;

    let header = SectionHeader {
        title: "Quota Allocation".to_string(),
        operation,
        mode: json_get_str(doc, "/request/mode").ok(),
        dimensions: doc
            .pointer("/request/dimensions")
            .and_then(Value::as_array)
            .map(|dims| {
                dims.iter()
                    .filter_map(|d| {
                        let id = d.get("id")?.as_str()?;
                        let n = d.get("selected")?.as_array()?.len();
                        Some(format!("{id} ({n})"))
                    })
                    .collect()
            })
            .unwrap_or_default(),
    };

    let cells_v = doc
        .pointer("/cells")
        .and_then(Value::as_array)
        .ok_or(ReportError::MissingField("/cells"))?;
    let mut cells = Vec::with_capacity(cells_v.len());
    for c in cells_v {
        let target = json_get_u64(c, "/target")?;
        cells.push(CellRow {
            id: json_get_str(c, "/id")?,
            name: json_get_str(c, "/name")?,
            target,
            share_pct_1dp: percent_one_decimal(target, total_target),
            current: json_get_u64(c, "/current").unwrap_or(0),
            status: json_get_str(c, "/status").unwrap_or_else(|_| "pending".into()),
            filter: c
                .get("demographicFilter")
                .and_then(Value::as_object)
                .map(|m| {
                    m.iter()
                        .map(|(k, v)| format!("{k}={}", v.as_str().unwrap_or_default()))
                        .collect()
                })
                .unwrap_or_default(),
        });
    }

    let allocated = json_get_u64(doc, "/summary/allocated")?;
    let sum: u64 = cells.iter().map(|r| r.target).sum();
    if sum != allocated {
        return Err(ReportError::Inconsistent("summary.allocated != sum(cells.target)"));
    }
    let delta = json_get_i64(doc, "/summary/delta")?;
    let completes = json_get_u64(doc, "/summary/completes").unwrap_or(0);

    let totals = SectionTotals {
        total_target,
        allocated,
        delta,
        reconciled: delta == 0,
        cell_count: cells.len() as u64,
        completes,
        completion_pct_1dp: percent_one_decimal(completes, allocated),
    };

    let warnings = doc
        .pointer("/warnings")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(|w| w.as_str().map(str::to_string)).collect())
        .unwrap_or_default();

    let engine = format!(
        "{}/{} v{} ({})",
        json_get_str(doc, "/engine/vendor").unwrap_or_else(|_| "quota".into()),
        json_get_str(doc, "/engine/name").unwrap_or_else(|_| "quota_engine".into()),
        json_get_str(doc, "/engine/version").unwrap_or_else(|_| "0.0.0".into()),
        json_get_str(doc, "/engine/build").unwrap_or_else(|_| "dev".into()),
    );
    let integrity = SectionIntegrity {
        allocation_sha256: json_get_str(doc, "/allocation_sha256")?,
        params_sha256: json_get_str(doc, "/params_sha256").unwrap_or_default(),
        engine,
        format_version: json_get_str(doc, "/format_version").unwrap_or_else(|_| "1".into()),
    };

    Ok(ReportModel { header, totals, cells, warnings, integrity })
}

/// Serialize the model as JSON (field order follows struct layout).
#[cfg(feature = "render_json")]
pub fn render_json(model: &ReportModel) -> Result<String, ReportError> {
    serde_json::to_string_pretty(model).map_err(|_| ReportError::Render("json_serialize"))
}

// ===== Helpers (integer math only) =====

/// `num / den` as a percent with one decimal, rounded half up: "33.3%".
pub fn percent_one_decimal(num: u64, den: u64) -> String {
    if den == 0 {
        return "0.0%".to_string();
    }
    let n = u128::from(num) * 1000;
    let d = u128::from(den);
    let tenths = (n + d / 2) / d;
    format!("{}.{}%", tenths / 10, tenths % 10)
}

fn json_get_str(root: &Value, ptr: &'static str) -> Result<String, ReportError> {
    root.pointer(ptr)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ReportError::MissingField(ptr))
}

fn json_get_u64(root: &Value, ptr: &'static str) -> Result<u64, ReportError> {
    root.pointer(ptr).and_then(Value::as_u64).ok_or(ReportError::MissingField(ptr))
}

fn json_get_i64(root: &Value, ptr: &'static str) -> Result<i64, ReportError> {
    root.pointer(ptr).and_then(Value::as_i64).ok_or(ReportError::MissingField(ptr))
}
