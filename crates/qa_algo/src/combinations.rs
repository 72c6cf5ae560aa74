//! Demographic combinations (Cartesian product of selected categories).
//!
//! Contract:
//! - Dimensions with an empty selection are not targeted and are skipped.
//! - Order is deterministic: dimension order, then category order, with the
//!   first dimension varying slowest (odometer order).
//! - No targeted dimension → empty product (not an error).
//! - Product size is capped by `EngineParams::max_cells`.

use std::collections::BTreeSet;

use qa_core::{
    cells::{is_valid_weight, DemographicFilter},
    AllocationMode, DemographicDimension,
};

use crate::{AllocError, AllocResult};

/// One cell-to-be: a category picked from each targeted dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Combo<'a> {
    pub parts: Vec<(&'a DemographicDimension, &'a str)>,
}

impl<'a> Combo<'a> {
    pub fn name(&self, separator: &str) -> String {
        cell_name(self.parts.iter().map(|(_, c)| *c), separator)
    }

    pub fn filter(&self) -> DemographicFilter {
        self.parts
            .iter()
            .map(|(d, c)| (d.id.clone(), (*c).to_string()))
            .collect()
    }

    /// Π(weight_i / 100) over the parts. `None` if any category is unweighted.
    pub fn weight_share(&self) -> Option<f64> {
        self.parts
            .iter()
            .try_fold(1.0f64, |acc, (d, c)| d.weight_of(c).map(|w| acc * (w / 100.0)))
    }
}

/// Join category labels into a display name.
pub fn cell_name<'s, I>(labels: I, separator: &str) -> String
where
    I: IntoIterator<Item = &'s str>,
{
    labels.into_iter().collect::<Vec<_>>().join(separator)
}

/// Check dimension input for `mode` and return the product size.
pub fn validate_dimensions(
    dims: &[DemographicDimension],
    mode: AllocationMode,
    max_cells: usize,
) -> AllocResult<usize> {
    let mut seen_dims = BTreeSet::new();
    let mut count: usize = 1;
    let mut any_active = false;

    for d in dims {
        if !seen_dims.insert(d.id.as_str()) {
            return Err(AllocError::Validation(format!("duplicate dimension '{}'", d.id)));
        }

        let mut seen_cats = BTreeSet::new();
        for c in &d.selected {
            if c.trim().is_empty() {
                return Err(AllocError::Validation(format!("empty category in dimension '{}'", d.id)));
            }
            if !seen_cats.insert(c.as_str()) {
                return Err(AllocError::Validation(format!(
                    "duplicate category '{c}' in dimension '{}'",
                    d.id
                )));
            }
            if mode == AllocationMode::Census {
                match d.weight_of(c) {
                    Some(w) if is_valid_weight(w) => {}
                    Some(w) => {
                        return Err(AllocError::Validation(format!(
                            "census weight for '{}/{c}' out of range: {w}",
                            d.id
                        )))
                    }
                    None => {
                        return Err(AllocError::Validation(format!(
                            "missing census weight for '{}/{c}'",
                            d.id
                        )))
                    }
                }
            }
        }

        if d.selected.is_empty() {
            continue;
        }
        any_active = true;
        count = count
            .checked_mul(d.selected.len())
            .filter(|&n| n <= max_cells)
            .ok_or_else(|| {
                AllocError::Validation(format!("too many quota cells (limit {max_cells})"))
            })?;
    }

    Ok(if any_active { count } else { 0 })
}

/// Validate and expand `dims` into combinations in odometer order.
pub fn expand<'a>(
    dims: &'a [DemographicDimension],
    mode: AllocationMode,
    max_cells: usize,
) -> AllocResult<Vec<Combo<'a>>> {
    let count = validate_dimensions(dims, mode, max_cells)?;
    if count == 0 {
        return Ok(Vec::new());
    }

    let active: Vec<&DemographicDimension> = dims.iter().filter(|d| !d.selected.is_empty()).collect();
    let mut out = Vec::with_capacity(count);
    let mut idx = vec![0usize; active.len()];

    loop {
        out.push(Combo {
            parts: active
                .iter()
                .zip(&idx)
                .map(|(&d, &i)| (d, d.selected[i].as_str()))
                .collect(),
        });

        // Advance the odometer from the last dimension.
        let mut k = active.len();
        loop {
            if k == 0 {
                debug_assert_eq!(out.len(), count);
                return Ok(out);
            }
            k -= 1;
            idx[k] += 1;
            if idx[k] < active[k].selected.len() {
                break;
            }
            idx[k] = 0;
        }
    }
}
