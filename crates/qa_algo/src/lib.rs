// crates/qa_algo/src/lib.rs
//! Quota allocation algorithms.
//!
//! Every entry point is a pure function: it receives its complete input
//! (including the id source) and returns a complete new cell list, or an
//! `AllocError` without touching the input.

#![forbid(unsafe_code)]

use core::fmt;

use qa_core::{
    cells::AllocationRequest,
    ids::CellId,
    rng::IdSource,
    variables::EngineParams,
    AllocationMode, QuotaCell,
};

// ----------------------------- Errors ----------------------------------------------

/// Engine failures. There are no transient categories: the engine does no I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllocError {
    /// Non-positive total, malformed dimension input, bad field value.
    Validation(String),
    /// Operation referenced a cell id absent from the collection.
    NotFound(CellId),
}

impl fmt::Display for AllocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AllocError::Validation(m) => write!(f, "validation error: {m}"),
            AllocError::NotFound(id) => write!(f, "quota cell not found: {id}"),
        }
    }
}

impl std::error::Error for AllocError {}

pub type AllocResult<T> = Result<T, AllocError>;

/// Accept a caller-supplied total: must be in `1..=u32::MAX`.
pub fn validate_total(total_target: i64) -> AllocResult<u32> {
    if total_target <= 0 {
        return Err(AllocError::Validation(format!(
            "total target must be positive (got {total_target})"
        )));
    }
    u32::try_from(total_target)
        .map_err(|_| AllocError::Validation(format!("total target too large: {total_target}")))
}

// ----------------------------- Modules ---------------------------------------------

pub mod combinations;

pub mod allocation {
    pub mod even_split;
    pub mod census_weighted;

    pub use census_weighted::generate_census_weighted;
    pub use even_split::{generate_even_split, redistribute_even};
}

pub mod cell_ops;
pub mod summary;

// Tight, explicit re-exports (avoid wildcard export drift).
pub use allocation::{generate_census_weighted, generate_even_split, redistribute_even};
pub use cell_ops::{add_custom_cell, delete_cell, duplicate_cell, upsert_cell_field, CellField};
pub use combinations::{cell_name, validate_dimensions};
pub use summary::{summarize, QuotaSummary, StatusCounts};

// ----------------------------- Dispatcher ------------------------------------------

/// Run one generation pass for `request`, replacing any previous set wholesale.
pub fn generate(
    request: &AllocationRequest,
    params: &EngineParams,
    ids: &mut dyn IdSource,
) -> AllocResult<Vec<QuotaCell>> {
    match request.mode {
        AllocationMode::Even => generate_even_split(&request.dimensions, request.total_target, params, ids),
        AllocationMode::Census => {
            generate_census_weighted(&request.dimensions, request.total_target, params, ids)
        }
    }
}
