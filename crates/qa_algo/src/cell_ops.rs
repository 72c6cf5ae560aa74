//! Cell-set operations: duplicate, delete, field update, custom add.
//!
//! All operations take the current set by reference and return a new set.
//! On error the caller's set is untouched (there is nothing to roll back).

use std::collections::BTreeSet;

use qa_core::{
    rng::{fresh_id, IdSource},
    variables::EngineParams,
    CellId, DemographicFilter, QuotaCell, QuotaStatus,
};

use crate::{validate_total, AllocError, AllocResult};

/// Editable fields of a cell. Target is signed so transient negative input
/// from an editor is rejected here rather than wrapped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellField {
    Name(String),
    Target(i64),
}

fn position(cells: &[QuotaCell], id: &CellId) -> AllocResult<usize> {
    cells
        .iter()
        .position(|c| &c.id == id)
        .ok_or_else(|| AllocError::NotFound(id.clone()))
}

fn taken_ids(cells: &[QuotaCell]) -> BTreeSet<CellId> {
    cells.iter().map(|c| c.id.clone()).collect()
}

/// Append a copy of cell `id`: fresh id, name suffixed, no progress.
pub fn duplicate_cell(
    cells: &[QuotaCell],
    total_target: i64,
    id: &CellId,
    params: &EngineParams,
    ids: &mut dyn IdSource,
) -> AllocResult<Vec<QuotaCell>> {
    let total = validate_total(total_target)?;
    let src = &cells[position(cells, id)?];

    let mut taken = taken_ids(cells);
    let mut copy = src.clone();
    copy.id = fresh_id(ids, &mut taken);
    copy.name = format!("{} {}", src.name, params.copy_suffix);
    copy.current = 0;
    copy.status = QuotaStatus::Pending;
    copy.refresh_percentage(total);

    let mut out = cells.to_vec();
    out.push(copy);
    Ok(out)
}

/// Remove cell `id`.
pub fn delete_cell(cells: &[QuotaCell], id: &CellId) -> AllocResult<Vec<QuotaCell>> {
    let ix = position(cells, id)?;
    let mut out = cells.to_vec();
    out.remove(ix);
    Ok(out)
}

/// Set one field on cell `id` and re-derive percentages against `total_target`.
pub fn upsert_cell_field(
    cells: &[QuotaCell],
    total_target: i64,
    id: &CellId,
    field: CellField,
) -> AllocResult<Vec<QuotaCell>> {
    let total = validate_total(total_target)?;
    let ix = position(cells, id)?;

    let mut out = cells.to_vec();
    match field {
        CellField::Name(name) => {
            let name = name.trim();
            if name.is_empty() {
                return Err(AllocError::Validation("cell name must not be empty".into()));
            }
            out[ix].name = name.to_string();
        }
        CellField::Target(t) => {
            if t < 0 {
                return Err(AllocError::Validation(format!("cell target must be ≥ 0 (got {t})")));
            }
            out[ix].target = u32::try_from(t)
                .map_err(|_| AllocError::Validation(format!("cell target too large: {t}")))?;
        }
    }
    for c in &mut out {
        c.refresh_percentage(total);
    }
    Ok(out)
}

/// Append a manually defined cell with no demographic filter.
pub fn add_custom_cell(
    cells: &[QuotaCell],
    total_target: i64,
    params: &EngineParams,
    ids: &mut dyn IdSource,
) -> AllocResult<Vec<QuotaCell>> {
    let total = validate_total(total_target)?;
    let mut taken = taken_ids(cells);
    let cell = QuotaCell::pending(
        fresh_id(ids, &mut taken),
        format!("{} {}", params.custom_cell_prefix, cells.len() + 1),
        params.custom_cell_target,
        total,
        DemographicFilter::new(),
    );
    let mut out = cells.to_vec();
    out.push(cell);
    Ok(out)
}
