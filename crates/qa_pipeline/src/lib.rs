//! qa_pipeline: run a request or a cell set through validate, allocate and build.
//!
//! I/O is delegated to `qa_io`, arithmetic to `qa_algo`. The pipeline owns the
//! output document and the log lines around each stage.

#![forbid(unsafe_code)]

use core::fmt;

use serde::Serialize;

use qa_algo::{AllocError, QuotaSummary};
use qa_core::{AllocationRequest, CellId, EngineParams, IdSource, QuotaCell, SeededIds};

pub mod allocate;
pub mod build_doc;
pub mod load;
pub mod validate;

pub use load::{load_params_opt, LoadedParams};
pub use validate::{validate_cells, validate_request, RequestCheck};

/// Format tag written into every allocation document.
pub const FORMAT_VERSION: &str = "1";

/// Engine identifiers echoed into every document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineMeta {
    pub vendor: String,
    pub name: String,
    pub version: String,
    pub build: String,
}

pub fn engine_identifiers() -> EngineMeta {
    EngineMeta {
        vendor: "quota".to_string(),
        name: "quota_engine".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        build: if cfg!(debug_assertions) { "dev" } else { "release" }.to_string(),
    }
}

/// Which engine pass produced the cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Generate,
    Redistribute,
    Duplicate,
    Delete,
}

/// A single edit applied to an existing cell set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellEdit {
    Duplicate(CellId),
    Delete(CellId),
}

impl CellEdit {
    pub fn operation(&self) -> Operation {
        match self {
            CellEdit::Duplicate(_) => Operation::Duplicate,
            CellEdit::Delete(_) => Operation::Delete,
        }
    }
}

/// The single artifact of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationDoc {
    pub format_version: String,
    pub operation: Operation,
    pub engine: EngineMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<AllocationRequest>,
    pub total_target: u32,
    pub params_sha256: String,
    pub cells: Vec<QuotaCell>,
    pub summary: QuotaSummary,
    /// Digest over (name, target, filter) of each cell; ids excluded.
    pub allocation_sha256: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Single error surface for the orchestration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Io(String),
    Schema(String),
    Validate(String),
    NotFound(String),
    Allocate(String),
    Build(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Io(m) => write!(f, "io: {m}"),
            PipelineError::Schema(m) => write!(f, "schema: {m}"),
            PipelineError::Validate(m) => write!(f, "validate: {m}"),
            PipelineError::NotFound(m) => write!(f, "not found: {m}"),
            PipelineError::Allocate(m) => write!(f, "allocate: {m}"),
            PipelineError::Build(m) => write!(f, "build: {m}"),
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<qa_io::IoError> for PipelineError {
    fn from(e: qa_io::IoError) -> Self {
        use qa_io::IoError;
        match e {
            IoError::Schema { pointer, msg } => PipelineError::Schema(format!("{pointer}: {msg}")),
            IoError::Json { pointer, msg } => PipelineError::Schema(format!("json {pointer}: {msg}")),
            IoError::Invalid(m) => PipelineError::Validate(m),
            IoError::Hash(m) => PipelineError::Build(format!("hash: {m}")),
            IoError::Path(m) => PipelineError::Io(format!("path: {m}")),
            IoError::Limit(m) => PipelineError::Io(format!("limit: {m}")),
        }
    }
}

impl From<AllocError> for PipelineError {
    fn from(e: AllocError) -> Self {
        match e {
            AllocError::Validation(m) => PipelineError::Validate(m),
            AllocError::NotFound(id) => PipelineError::NotFound(format!("quota cell {id}")),
        }
    }
}

/// Id source used when the caller does not inject one.
pub fn default_ids(params: &EngineParams) -> SeededIds {
    SeededIds::from_seed_u64(params.id_seed)
}

// -------------------------------------- Public API --------------------------------------

/// Generate a fresh cell set for `request` and wrap it in an `AllocationDoc`.
pub fn run_request(
    request: &AllocationRequest,
    params: &EngineParams,
    ids: &mut dyn IdSource,
) -> Result<AllocationDoc, PipelineError> {
    let check = validate::validate_request(request, params)?;
    tracing::debug!(
        mode = request.mode.as_str(),
        combinations = check.combinations,
        total_target = check.total_target,
        "request validated"
    );

    let outcome = allocate::allocate(request, params, ids, &check)?;
    let doc = build_doc::build(
        Operation::Generate,
        Some(request.clone()),
        check.total_target,
        params,
        outcome,
    )?;
    tracing::info!(
        cells = doc.cells.len(),
        allocated = doc.summary.allocated,
        total_target = doc.total_target,
        "allocation generated"
    );
    Ok(doc)
}

/// Reset an existing cell set to an even split of `total_target`.
pub fn run_redistribute(
    cells: &[QuotaCell],
    total_target: i64,
    params: &EngineParams,
) -> Result<AllocationDoc, PipelineError> {
    let total = validate::validate_cells(cells, total_target)?;
    let outcome = allocate::redistribute(cells, total)?;
    let doc = build_doc::build(Operation::Redistribute, None, total, params, outcome)?;
    tracing::info!(cells = doc.cells.len(), total_target = total, "allocation redistributed");
    Ok(doc)
}

/// Duplicate or delete one cell of an existing set. Without an explicit
/// `total_target` the set's current allocated sum is kept as the total.
pub fn run_edit(
    cells: &[QuotaCell],
    edit: &CellEdit,
    total_target: Option<i64>,
    params: &EngineParams,
    ids: &mut dyn IdSource,
) -> Result<AllocationDoc, PipelineError> {
    let requested = total_target.unwrap_or_else(|| cells.iter().map(|c| i64::from(c.target)).sum());
    let total = validate::validate_cells(cells, requested)?;
    let outcome = allocate::edit(cells, edit, total, params, ids)?;
    let doc = build_doc::build(edit.operation(), None, total, params, outcome)?;
    tracing::info!(cells = doc.cells.len(), total_target = total, operation = ?edit.operation(), "cell set edited");
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use qa_core::{cells::AllocationMode, DemographicDimension, SequentialIds};

    #[test]
    fn error_mapping_is_stable() {
        let e: PipelineError = AllocError::Validation("bad".into()).into();
        assert_eq!(e, PipelineError::Validate("bad".into()));

        let id: CellId = "q_0001".parse().unwrap();
        let e: PipelineError = AllocError::NotFound(id).into();
        assert!(matches!(e, PipelineError::NotFound(ref m) if m.contains("q_0001")));

        let e: PipelineError = qa_io::IoError::Limit("too big".into()).into();
        assert_eq!(e.to_string(), "io: limit: too big");
    }

    #[test]
    fn run_request_builds_document() {
        let req = AllocationRequest {
            dimensions: vec![DemographicDimension::new("gender".parse().unwrap(), ["male", "female"])],
            total_target: 11,
            mode: AllocationMode::Even,
        };
        let params = EngineParams::default();
        let doc = run_request(&req, &params, &mut default_ids(&params)).unwrap();
        assert_eq!(doc.operation, Operation::Generate);
        assert_eq!(doc.format_version, FORMAT_VERSION);
        assert_eq!(doc.cells.iter().map(|c| c.target).collect::<Vec<_>>(), vec![6, 5]);
        assert!(doc.summary.is_reconciled());
        assert!(doc.warnings.is_empty());
        assert_eq!(doc.request.as_ref(), Some(&req));
        assert_eq!(doc.allocation_sha256.len(), 64);
    }

    #[test]
    fn edit_keeps_current_total_and_reports_unknown_ids() {
        let req = AllocationRequest {
            dimensions: vec![DemographicDimension::new("gender".parse().unwrap(), ["male", "female"])],
            total_target: 11,
            mode: AllocationMode::Even,
        };
        let params = EngineParams::default();
        let mut ids = SequentialIds::new();
        let base = run_request(&req, &params, &mut ids).unwrap();

        let first = base.cells[0].id.clone();
        let doc = run_edit(&base.cells, &CellEdit::Duplicate(first), None, &params, &mut ids).unwrap();
        assert_eq!(doc.operation, Operation::Duplicate);
        assert_eq!(doc.total_target, 11);
        assert_eq!(doc.cells.len(), 3);
        assert_eq!(doc.summary.delta, 6);

        let missing: CellId = "q_9999".parse().unwrap();
        let r = run_edit(&base.cells, &CellEdit::Delete(missing), None, &params, &mut ids);
        assert!(matches!(r, Err(PipelineError::NotFound(ref m)) if m.contains("q_9999")));
    }

    #[test]
    fn redistribute_rejects_bad_total() {
        let r = run_redistribute(&[], 0, &EngineParams::default());
        assert!(matches!(r, Err(PipelineError::Validate(_))));
    }
}
