//! ALLOCATE stage: run the generator for the request's mode (or an even
//! redistribution) and collect the warnings a caller should see.
//!
//! Census mode neither reconciles drift nor keeps zero cells; both are
//! reported here rather than corrected.

use qa_algo::{delete_cell, duplicate_cell, generate, redistribute_even};
use qa_core::{AllocationMode, AllocationRequest, EngineParams, IdSource, QuotaCell};

use crate::{validate::RequestCheck, CellEdit, PipelineError};

/// Cells plus human-readable warnings for the output document.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationOutcome {
    pub cells: Vec<QuotaCell>,
    pub warnings: Vec<String>,
}

pub fn allocate(
    request: &AllocationRequest,
    params: &EngineParams,
    ids: &mut dyn IdSource,
    check: &RequestCheck,
) -> Result<AllocationOutcome, PipelineError> {
    let cells = generate(request, params, ids)?;
    let mut warnings = Vec::new();

    if request.mode == AllocationMode::Census {
        let dropped = check.combinations.saturating_sub(cells.len());
        if dropped > 0 {
            tracing::warn!(dropped, "census combinations rounded to zero were dropped");
            warnings.push(format!("{dropped} combination(s) rounded to a zero target and were dropped"));
        }

        let allocated: u64 = cells.iter().map(|c| u64::from(c.target)).sum();
        let delta = allocated as i64 - i64::from(check.total_target);
        if delta != 0 {
            tracing::warn!(allocated, total_target = check.total_target, delta, "census targets do not sum to total");
            warnings.push(format!(
                "census targets sum to {allocated}, total target is {} (delta {delta:+})",
                check.total_target
            ));
        }
    }

    Ok(AllocationOutcome { cells, warnings })
}

pub fn redistribute(cells: &[QuotaCell], total_target: u32) -> Result<AllocationOutcome, PipelineError> {
    let cells = redistribute_even(cells, i64::from(total_target))?;
    tracing::debug!(cells = cells.len(), total_target, "targets redistributed evenly");
    Ok(AllocationOutcome { cells, warnings: Vec::new() })
}

pub fn edit(
    cells: &[QuotaCell],
    edit: &CellEdit,
    total_target: u32,
    params: &EngineParams,
    ids: &mut dyn IdSource,
) -> Result<AllocationOutcome, PipelineError> {
    let cells = match edit {
        CellEdit::Duplicate(id) => duplicate_cell(cells, i64::from(total_target), id, params, ids)?,
        CellEdit::Delete(id) => delete_cell(cells, id)?,
    };
    tracing::debug!(cells = cells.len(), ?edit, "cell edit applied");
    Ok(AllocationOutcome { cells, warnings: Vec::new() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate::validate_request;
    use qa_core::{DemographicDimension, SequentialIds};

    fn weighted(id: &str, cats: &[(&str, f64)]) -> DemographicDimension {
        let mut d = DemographicDimension::new(id.parse().unwrap(), cats.iter().map(|(c, _)| *c));
        for (c, w) in cats {
            d = d.with_weight(*c, *w).unwrap();
        }
        d
    }

    #[test]
    fn census_drift_and_drops_are_warned() {
        let req = AllocationRequest {
            dimensions: vec![weighted("region", &[("north", 0.1), ("south", 60.0)])],
            total_target: 100,
            mode: AllocationMode::Census,
        };
        let p = EngineParams::default();
        let check = validate_request(&req, &p).unwrap();
        let out = allocate(&req, &p, &mut SequentialIds::new(), &check).unwrap();
        assert_eq!(out.cells.len(), 1);
        assert_eq!(out.cells[0].target, 60);
        assert_eq!(out.warnings.len(), 2);
        assert!(out.warnings[0].starts_with("1 combination"));
        assert!(out.warnings[1].contains("delta -40"));
    }

    #[test]
    fn even_mode_has_no_warnings() {
        let req = AllocationRequest {
            dimensions: vec![DemographicDimension::new("gender".parse().unwrap(), ["male", "female", "other"])],
            total_target: 10,
            mode: AllocationMode::Even,
        };
        let p = EngineParams::default();
        let check = validate_request(&req, &p).unwrap();
        let out = allocate(&req, &p, &mut SequentialIds::new(), &check).unwrap();
        assert_eq!(out.cells.iter().map(|c| c.target).collect::<Vec<_>>(), vec![4, 3, 3]);
        assert!(out.warnings.is_empty());
    }
}
