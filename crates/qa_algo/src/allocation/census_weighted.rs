//! Census-weighted allocation over demographic combinations.
//!
//! Contract:
//! - target = round(T × Π(weight_i / 100)), rounding half away from zero.
//! - Cells whose target rounds to 0 are dropped before ids are drawn.
//! - No remainder correction: Σ targets may differ from T by a few units.
//!   Callers surface the drift (see `summary::QuotaSummary::delta`).
//! - Every selected category must carry a weight in (0, 100].

use std::collections::BTreeSet;

use qa_core::{
    rng::{fresh_id, IdSource},
    rounding::round_to_u32,
    variables::EngineParams,
    AllocationMode, DemographicDimension, QuotaCell,
};

use crate::{combinations::expand, validate_total, AllocError, AllocResult};

/// Generate cells sized by the product of their categories' census weights.
pub fn generate_census_weighted(
    dimensions: &[DemographicDimension],
    total_target: i64,
    params: &EngineParams,
    ids: &mut dyn IdSource,
) -> AllocResult<Vec<QuotaCell>> {
    let total = validate_total(total_target)?;
    let combos = expand(dimensions, AllocationMode::Census, params.max_cells)?;

    let mut taken = BTreeSet::new();
    let mut cells = Vec::with_capacity(combos.len());
    for combo in &combos {
        let share = combo.weight_share().ok_or_else(|| {
            AllocError::Validation(format!("missing census weight in '{}'", combo.name("/")))
        })?;
        let target = round_to_u32(f64::from(total) * share);
        if target == 0 {
            continue;
        }
        cells.push(QuotaCell::pending(
            fresh_id(ids, &mut taken),
            combo.name(&params.name_separator),
            target,
            total,
            combo.filter(),
        ));
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use qa_core::SequentialIds;

    fn weighted(id: &str, cats: &[(&str, f64)]) -> DemographicDimension {
        let mut d = DemographicDimension::new(id.parse().unwrap(), cats.iter().map(|(c, _)| *c));
        for (c, w) in cats {
            d = d.with_weight(*c, *w).unwrap();
        }
        d
    }

    fn us_gender_age() -> Vec<DemographicDimension> {
        vec![
            weighted("gender", &[("male", 49.2), ("female", 50.8)]),
            weighted("age_ranges", &[("18-24", 9.3), ("25-34", 13.8)]),
        ]
    }

    #[test]
    fn census_targets_follow_formula() {
        let cells = generate_census_weighted(&us_gender_age(), 1000, &EngineParams::default(), &mut SequentialIds::new())
            .unwrap();
        let by_name = |n: &str| cells.iter().find(|c| c.name == n).map(|c| c.target);
        // round(1000 * 0.492 * 0.093) = round(45.756)
        assert_eq!(by_name("male / 18-24"), Some(46));
        // round(1000 * 0.492 * 0.138) = round(67.896)
        assert_eq!(by_name("male / 25-34"), Some(68));
        // round(1000 * 0.508 * 0.093) = round(47.244)
        assert_eq!(by_name("female / 18-24"), Some(47));
        // round(1000 * 0.508 * 0.138) = round(70.104)
        assert_eq!(by_name("female / 25-34"), Some(70));
    }

    #[test]
    fn drift_is_not_corrected() {
        let cells = generate_census_weighted(&us_gender_age(), 1000, &EngineParams::default(), &mut SequentialIds::new())
            .unwrap();
        // Only 23.1% of the population is covered by the selected age bands.
        let sum: u32 = cells.iter().map(|c| c.target).sum();
        assert_eq!(sum, 46 + 68 + 47 + 70);
        assert!((cells[0].percentage - 4.6).abs() < 1e-9);
    }

    #[test]
    fn zero_cells_dropped_before_ids_drawn() {
        let dims = vec![weighted("region", &[("north", 0.01), ("south", 99.99)])];
        let cells = generate_census_weighted(&dims, 100, &EngineParams::default(), &mut SequentialIds::new()).unwrap();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].name, "south");
        assert_eq!(cells[0].target, 100);
        assert_eq!(cells[0].id.as_str(), "q_0001");
    }

    #[test]
    fn missing_weight_is_validation_error() {
        let dims = vec![DemographicDimension::new("gender".parse().unwrap(), ["male"])];
        let r = generate_census_weighted(&dims, 100, &EngineParams::default(), &mut SequentialIds::new());
        assert!(matches!(r, Err(AllocError::Validation(_))));
    }

    proptest! {
        #[test]
        fn census_never_emits_zero_targets(
            total in 1i64..5_000,
            w1 in proptest::collection::vec(0.01f64..100.0, 1..5),
            w2 in proptest::collection::vec(0.01f64..100.0, 1..5),
        ) {
            let mk = |id: &str, ws: &[f64]| {
                let mut d = DemographicDimension::new(id.parse().unwrap(), (0..ws.len()).map(|i| format!("k{i}")));
                for (i, w) in ws.iter().enumerate() {
                    d = d.with_weight(format!("k{i}"), *w).unwrap();
                }
                d
            };
            let dims = vec![mk("a", &w1), mk("b", &w2)];
            let cells = generate_census_weighted(&dims, total, &EngineParams::default(), &mut SequentialIds::new()).unwrap();
            prop_assert!(cells.len() <= w1.len() * w2.len());
            prop_assert!(cells.iter().all(|c| c.target > 0));
        }
    }
}
