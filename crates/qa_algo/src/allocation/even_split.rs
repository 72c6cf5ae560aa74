//! Even split allocation over demographic combinations.
//!
//! Contract:
//! - base = floor(T / n) for every cell; the remainder `T mod n` is handed out
//!   one unit at a time to the first cells in generation order.
//! - Sum of targets == T exactly; max − min ≤ 1.
//! - No targeted dimension → empty list; T ≤ 0 → `AllocError::Validation`.
//!
//! Determinism:
//! - No RNG in the arithmetic. Ids are drawn from the caller's `IdSource` in
//!   generation order, so a seeded source reproduces the whole set.

use std::collections::BTreeSet;

use qa_core::{
    rng::{fresh_id, IdSource},
    rounding::even_shares,
    variables::EngineParams,
    AllocationMode, DemographicDimension, QuotaCell,
};

use crate::{combinations::expand, validate_total, AllocResult};

/// Generate one cell per combination with an even split of `total_target`.
pub fn generate_even_split(
    dimensions: &[DemographicDimension],
    total_target: i64,
    params: &EngineParams,
    ids: &mut dyn IdSource,
) -> AllocResult<Vec<QuotaCell>> {
    let total = validate_total(total_target)?;
    let combos = expand(dimensions, AllocationMode::Even, params.max_cells)?;
    let shares = even_shares(total, combos.len());

    let mut taken = BTreeSet::new();
    let cells = combos
        .iter()
        .zip(shares)
        .map(|(combo, target)| {
            QuotaCell::pending(
                fresh_id(ids, &mut taken),
                combo.name(&params.name_separator),
                target,
                total,
                combo.filter(),
            )
        })
        .collect();
    Ok(cells)
}

/// Reset targets of an existing set to an even split of `total_target`.
///
/// Order, ids, names, progress, status and filters are preserved; only
/// `target` and `percentage` change.
pub fn redistribute_even(cells: &[QuotaCell], total_target: i64) -> AllocResult<Vec<QuotaCell>> {
    let total = validate_total(total_target)?;
    let shares = even_shares(total, cells.len());
    Ok(cells
        .iter()
        .zip(shares)
        .map(|(c, target)| {
            let mut next = c.clone();
            next.target = target;
            next.refresh_percentage(total);
            next
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AllocError;
    use proptest::prelude::*;
    use qa_core::{QuotaStatus, SeededIds, SequentialIds};

    fn dim(id: &str, cats: &[&str]) -> DemographicDimension {
        DemographicDimension::new(id.parse().unwrap(), cats.iter().copied())
    }

    fn gender_age() -> Vec<DemographicDimension> {
        vec![dim("gender", &["male", "female"]), dim("age_ranges", &["18-24", "25-34"])]
    }

    fn targets(cells: &[QuotaCell]) -> Vec<u32> {
        cells.iter().map(|c| c.target).collect()
    }

    #[test]
    fn four_cells_of_25() {
        let cells = generate_even_split(&gender_age(), 100, &EngineParams::default(), &mut SequentialIds::new())
            .unwrap();
        assert_eq!(targets(&cells), vec![25, 25, 25, 25]);
        assert_eq!(cells[0].name, "male / 18-24");
        assert_eq!(cells[3].name, "female / 25-34");
        for c in &cells {
            assert_eq!(c.current, 0);
            assert_eq!(c.status, QuotaStatus::Pending);
            assert!((c.percentage - 25.0).abs() < 1e-9);
            assert_eq!(c.demographic_filter.len(), 2);
        }
    }

    #[test]
    fn remainder_goes_to_first_cell() {
        let cells = generate_even_split(&gender_age(), 101, &EngineParams::default(), &mut SequentialIds::new())
            .unwrap();
        assert_eq!(targets(&cells), vec![26, 25, 25, 25]);
        assert_eq!(cells.iter().map(|c| c.target).sum::<u32>(), 101);
    }

    #[test]
    fn no_dimensions_is_empty_not_error() {
        let cells = generate_even_split(&[], 100, &EngineParams::default(), &mut SequentialIds::new()).unwrap();
        assert!(cells.is_empty());
    }

    #[test]
    fn non_positive_total_rejected() {
        for t in [0, -1, -100] {
            let r = generate_even_split(&gender_age(), t, &EngineParams::default(), &mut SequentialIds::new());
            assert!(matches!(r, Err(AllocError::Validation(_))));
        }
    }

    #[test]
    fn same_seed_same_cells() {
        let p = EngineParams::default();
        let a = generate_even_split(&gender_age(), 333, &p, &mut SeededIds::from_seed_u64(9)).unwrap();
        let b = generate_even_split(&gender_age(), 333, &p, &mut SeededIds::from_seed_u64(9)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn redistribute_preserves_identity() {
        let p = EngineParams::default();
        let mut cells = generate_even_split(&gender_age(), 100, &p, &mut SequentialIds::new()).unwrap();
        cells[0].target = 70;
        cells[1].current = 12;
        cells[1].status = QuotaStatus::Active;

        let out = redistribute_even(&cells, 103).unwrap();
        assert_eq!(targets(&out), vec![26, 26, 26, 25]);
        for (before, after) in cells.iter().zip(&out) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.name, after.name);
            assert_eq!(before.current, after.current);
            assert_eq!(before.status, after.status);
            assert_eq!(before.demographic_filter, after.demographic_filter);
        }
        assert!((out[3].percentage - 25.0 / 103.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn redistribute_empty_and_invalid() {
        assert!(redistribute_even(&[], 10).unwrap().is_empty());
        assert!(redistribute_even(&[], 0).is_err());
    }

    proptest! {
        #[test]
        fn even_split_sums_and_spread(total in 1i64..100_000, a in 1usize..6, b in 1usize..6, c in 0usize..4) {
            let cats = |n: usize| (0..n).map(|i| format!("c{i}")).collect::<Vec<_>>();
            let dims = vec![
                DemographicDimension::new("a".parse().unwrap(), cats(a)),
                DemographicDimension::new("b".parse().unwrap(), cats(b)),
                DemographicDimension::new("c".parse().unwrap(), cats(c)),
            ];
            let cells = generate_even_split(&dims, total, &EngineParams::default(), &mut SequentialIds::new()).unwrap();
            prop_assert_eq!(cells.len(), a * b * c.max(1));
            let sum: u64 = cells.iter().map(|x| u64::from(x.target)).sum();
            prop_assert_eq!(sum, total as u64);
            let max = cells.iter().map(|x| x.target).max().unwrap();
            let min = cells.iter().map(|x| x.target).min().unwrap();
            prop_assert!(max - min <= 1);
            let unique: BTreeSet<_> = cells.iter().map(|x| x.id.clone()).collect();
            prop_assert_eq!(unique.len(), cells.len());
        }

        #[test]
        fn redistribute_keeps_cardinality_and_ids(total in 1i64..10_000, n in 1usize..40, seed in any::<u64>()) {
            let dims = vec![DemographicDimension::new(
                "a".parse().unwrap(),
                (0..n).map(|i| format!("c{i}")),
            )];
            let cells = generate_even_split(&dims, 500, &EngineParams::default(), &mut SeededIds::from_seed_u64(seed)).unwrap();
            let out = redistribute_even(&cells, total).unwrap();
            prop_assert_eq!(out.len(), cells.len());
            for (x, y) in cells.iter().zip(&out) {
                prop_assert_eq!(&x.id, &y.id);
            }
            let sum: u64 = out.iter().map(|x| u64::from(x.target)).sum();
            prop_assert_eq!(sum, total as u64);
        }
    }
}
