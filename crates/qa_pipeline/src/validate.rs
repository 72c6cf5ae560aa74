//! VALIDATE stage: structural checks on a request before any id is drawn.
//!
//! Runs the same checks the generators run, so `--validate-only` and a real
//! run agree on what is rejected.

use qa_algo::{validate_dimensions, validate_total};
use qa_core::{AllocationRequest, EngineParams, QuotaCell};

use crate::PipelineError;

/// What a valid request will produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestCheck {
    pub total_target: u32,
    /// Size of the Cartesian product (census mode may emit fewer cells).
    pub combinations: usize,
}

pub fn validate_request(request: &AllocationRequest, params: &EngineParams) -> Result<RequestCheck, PipelineError> {
    let total_target = validate_total(request.total_target)?;
    let combinations = validate_dimensions(&request.dimensions, request.mode, params.max_cells)?;
    if combinations == 0 {
        tracing::debug!("no dimension has a selection; result will be empty");
    }
    Ok(RequestCheck { total_target, combinations })
}

/// Check a cell set can be rebalanced to `total_target`.
pub fn validate_cells(cells: &[QuotaCell], total_target: i64) -> Result<u32, PipelineError> {
    let total = validate_total(total_target)?;
    if cells.is_empty() {
        tracing::debug!("empty cell set; redistribution is a no-op");
    }
    Ok(total)
}
