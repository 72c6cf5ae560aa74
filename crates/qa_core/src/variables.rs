//! variables.rs: Engine parameters with safe defaults + domain checks.
//!
//! Every field has a default so a partial params file (or none at all) is
//! valid. `validate_domains` is the single place ranges are enforced.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

pub const DEFAULT_CUSTOM_CELL_TARGET: u32 = 10;
pub const DEFAULT_CUSTOM_CELL_PREFIX: &str = "Custom Quota";
pub const DEFAULT_COPY_SUFFIX: &str = "(Copy)";
pub const DEFAULT_NAME_SEPARATOR: &str = " / ";
pub const DEFAULT_MAX_CELLS: usize = 1000;
/// Hard ceiling for `max_cells`; a product this large is never a usable quota plan.
pub const MAX_CELLS_LIMIT: usize = 1_000_000;
pub const DEFAULT_OVERDELIVERY_TOLERANCE_PCT: u8 = 10;

/// Tunables shared by generation and cell-set operations.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct EngineParams {
    /// Target given to a manually added cell.
    pub custom_cell_target: u32,
    /// Name prefix for manually added cells ("Custom Quota 3").
    pub custom_cell_prefix: String,
    /// Appended to a duplicated cell's name.
    pub copy_suffix: String,
    /// Joins category labels into a generated cell name.
    pub name_separator: String,
    /// Upper bound on the Cartesian product size of one generation pass.
    pub max_cells: usize,
    /// Percent above target after which a cell counts as overdelivered.
    pub overdelivery_tolerance_pct: u8,
    /// Seed for the default (ChaCha20) id source.
    pub id_seed: u64,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            custom_cell_target: DEFAULT_CUSTOM_CELL_TARGET,
            custom_cell_prefix: DEFAULT_CUSTOM_CELL_PREFIX.to_string(),
            copy_suffix: DEFAULT_COPY_SUFFIX.to_string(),
            name_separator: DEFAULT_NAME_SEPARATOR.to_string(),
            max_cells: DEFAULT_MAX_CELLS,
            overdelivery_tolerance_pct: DEFAULT_OVERDELIVERY_TOLERANCE_PCT,
            id_seed: 0,
        }
    }
}

/// Reject parameter values outside their domains.
pub fn validate_domains(p: &EngineParams) -> Result<(), CoreError> {
    if p.custom_cell_target == 0 {
        return Err(CoreError::DomainOutOfRange("custom_cell_target"));
    }
    if p.custom_cell_prefix.trim().is_empty() {
        return Err(CoreError::DomainOutOfRange("custom_cell_prefix"));
    }
    if p.copy_suffix.trim().is_empty() {
        return Err(CoreError::DomainOutOfRange("copy_suffix"));
    }
    if p.name_separator.is_empty() {
        return Err(CoreError::DomainOutOfRange("name_separator"));
    }
    if p.max_cells == 0 || p.max_cells > MAX_CELLS_LIMIT {
        return Err(CoreError::DomainOutOfRange("max_cells"));
    }
    if p.overdelivery_tolerance_pct > 100 {
        return Err(CoreError::DomainOutOfRange("overdelivery_tolerance_pct"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_domains(&EngineParams::default()), Ok(()));
    }

    #[test]
    fn out_of_range_fields() {
        let p = EngineParams { max_cells: 0, ..EngineParams::default() };
        assert_eq!(validate_domains(&p), Err(CoreError::DomainOutOfRange("max_cells")));
        let p = EngineParams { max_cells: MAX_CELLS_LIMIT + 1, ..EngineParams::default() };
        assert_eq!(validate_domains(&p), Err(CoreError::DomainOutOfRange("max_cells")));
        let p = EngineParams { max_cells: MAX_CELLS_LIMIT, ..EngineParams::default() };
        assert_eq!(validate_domains(&p), Ok(()));

        let p = EngineParams { overdelivery_tolerance_pct: 101, ..EngineParams::default() };
        assert_eq!(
            validate_domains(&p),
            Err(CoreError::DomainOutOfRange("overdelivery_tolerance_pct"))
        );

        let p = EngineParams { copy_suffix: "  ".into(), ..EngineParams::default() };
        assert!(validate_domains(&p).is_err());
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_params_fill_defaults() {
        let p: EngineParams = serde_json::from_str(r#"{"custom_cell_target": 25, "id_seed": 7}"#).unwrap();
        assert_eq!(p.custom_cell_target, 25);
        assert_eq!(p.id_seed, 7);
        assert_eq!(p.copy_suffix, DEFAULT_COPY_SUFFIX);
        assert!(serde_json::from_str::<EngineParams>(r#"{"bogus": 1}"#).is_err());
    }
}
