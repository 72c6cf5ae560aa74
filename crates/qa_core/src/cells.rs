//! Domain records: demographic dimensions, quota cells, and cell status.
//!
//! Wire names follow the console's record shape (`demographicFilter`,
//! `totalTarget`, …), hence the camelCase renames under the `serde` feature.

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;
use crate::ids::{CellId, DimensionId};
use crate::rounding::percentage_of;

/// Allocation mode for a generation pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum AllocationMode {
    /// Distribute the total as equally as possible across all cells.
    Even,
    /// Size each cell by the product of its categories' census weights.
    Census,
}

impl AllocationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            AllocationMode::Even => "even",
            AllocationMode::Census => "census",
        }
    }
}

impl core::str::FromStr for AllocationMode {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "even" => Ok(AllocationMode::Even),
            "census" => Ok(AllocationMode::Census),
            _ => Err(CoreError::DomainOutOfRange("mode")),
        }
    }
}

/// One targeted dimension: selected categories in display order plus
/// optional census weights (percent of population) keyed by category.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DemographicDimension {
    pub id: DimensionId,
    pub selected: Vec<String>,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "BTreeMap::is_empty"))]
    pub weights: BTreeMap<String, f64>,
}

impl DemographicDimension {
    pub fn new<I, S>(id: DimensionId, selected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id,
            selected: selected.into_iter().map(Into::into).collect(),
            weights: BTreeMap::new(),
        }
    }

    /// Builder-style weight setter. Rejects weights outside (0, 100].
    pub fn with_weight(mut self, category: impl Into<String>, pct: f64) -> Result<Self, CoreError> {
        if !is_valid_weight(pct) {
            return Err(CoreError::InvalidWeight);
        }
        self.weights.insert(category.into(), pct);
        Ok(self)
    }

    #[inline]
    pub fn weight_of(&self, category: &str) -> Option<f64> {
        self.weights.get(category).copied()
    }
}

/// Census weights are percentages in (0, 100].
#[inline]
pub fn is_valid_weight(pct: f64) -> bool {
    pct.is_finite() && pct > 0.0 && pct <= 100.0
}

/// Generation request as received from the console: the targeted dimensions,
/// the requested total, and the allocation mode.
///
/// `total_target` stays signed so a non-positive total reaches validation
/// instead of failing at the parse layer.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct AllocationRequest {
    pub dimensions: Vec<DemographicDimension>,
    pub total_target: i64,
    pub mode: AllocationMode,
}

/// Dimension → category value represented by a cell. Empty for custom cells.
pub type DemographicFilter = BTreeMap<DimensionId, String>;

/// Progress status of a cell. Set by the progress collaborator; the engine
/// only ever initializes it to `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum QuotaStatus {
    #[default]
    Pending,
    Active,
    Completed,
    Overdelivered,
}

impl QuotaStatus {
    pub const ALL: [QuotaStatus; 4] = [
        QuotaStatus::Pending,
        QuotaStatus::Active,
        QuotaStatus::Completed,
        QuotaStatus::Overdelivered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuotaStatus::Pending => "pending",
            QuotaStatus::Active => "active",
            QuotaStatus::Completed => "completed",
            QuotaStatus::Overdelivered => "overdelivered",
        }
    }

    /// Status implied by a progress reading.
    ///
    /// `pending` until the first response, `active` while below target,
    /// `completed` once the target is met, and `overdelivered` when `current`
    /// exceeds the target by more than `tolerance_pct` percent. Integer-only.
    pub fn from_progress(current: u32, target: u32, tolerance_pct: u8) -> Self {
        if current == 0 {
            return QuotaStatus::Pending;
        }
        if current < target {
            return QuotaStatus::Active;
        }
        let lhs = u64::from(current) * 100;
        let rhs = u64::from(target) * (100 + u64::from(tolerance_pct));
        if lhs > rhs {
            QuotaStatus::Overdelivered
        } else {
            QuotaStatus::Completed
        }
    }
}

/// One demographic-combination bucket with its own target.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct QuotaCell {
    pub id: CellId,
    pub name: String,
    pub target: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub current: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub percentage: f64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub status: QuotaStatus,
    #[cfg_attr(feature = "serde", serde(default))]
    pub demographic_filter: DemographicFilter,
}

impl QuotaCell {
    /// Fresh cell as produced by a generation pass: no progress, `pending`.
    pub fn pending(
        id: CellId,
        name: impl Into<String>,
        target: u32,
        total_target: u32,
        demographic_filter: DemographicFilter,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            target,
            current: 0,
            percentage: percentage_of(target, total_target),
            status: QuotaStatus::Pending,
            demographic_filter,
        }
    }

    /// Recompute the derived percentage against `total_target`.
    #[inline]
    pub fn refresh_percentage(&mut self, total_target: u32) {
        self.percentage = percentage_of(self.target, total_target);
    }

    #[inline]
    pub fn is_custom(&self) -> bool {
        self.demographic_filter.is_empty()
    }
}
