//! BUILD stage: summary + digests around the allocated cells.

use qa_algo::summarize;
use qa_core::{AllocationRequest, EngineParams};
use qa_io::hasher;

use crate::{allocate::AllocationOutcome, engine_identifiers, AllocationDoc, Operation, PipelineError, FORMAT_VERSION};

pub fn build(
    operation: Operation,
    request: Option<AllocationRequest>,
    total_target: u32,
    params: &EngineParams,
    outcome: AllocationOutcome,
) -> Result<AllocationDoc, PipelineError> {
    let summary = summarize(&outcome.cells, total_target);
    let allocation_sha256 = hasher::allocation_digest(&outcome.cells)?;
    let params_sha256 = hasher::sha256_canonical(params)?;
    tracing::debug!(%allocation_sha256, delta = summary.delta, "document built");

    Ok(AllocationDoc {
        format_version: FORMAT_VERSION.to_string(),
        operation,
        engine: engine_identifiers(),
        request,
        total_target,
        params_sha256,
        cells: outcome.cells,
        summary,
        allocation_sha256,
        warnings: outcome.warnings,
    })
}
