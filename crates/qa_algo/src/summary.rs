//! Totals-vs-target summary of a quota set.
//!
//! Census mode does not reconcile rounding drift; this summary is how the
//! drift reaches the caller (`delta = allocated − total_target`).

#[cfg(feature = "serde")]
use serde::Serialize;

use qa_core::{QuotaCell, QuotaStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct StatusCounts {
    pub pending: usize,
    pub active: usize,
    pub completed: usize,
    pub overdelivered: usize,
}

impl StatusCounts {
    fn bump(&mut self, s: QuotaStatus) {
        match s {
            QuotaStatus::Pending => self.pending += 1,
            QuotaStatus::Active => self.active += 1,
            QuotaStatus::Completed => self.completed += 1,
            QuotaStatus::Overdelivered => self.overdelivered += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct QuotaSummary {
    pub total_target: u32,
    pub allocated: u64,
    /// Signed drift: positive when cells ask for more than the total.
    pub delta: i64,
    pub cell_count: usize,
    pub min_target: Option<u32>,
    pub max_target: Option<u32>,
    pub completes: u64,
    pub by_status: StatusCounts,
}

impl QuotaSummary {
    #[inline]
    pub fn is_reconciled(&self) -> bool {
        self.delta == 0
    }
}

pub fn summarize(cells: &[QuotaCell], total_target: u32) -> QuotaSummary {
    let mut by_status = StatusCounts::default();
    let mut allocated = 0u64;
    let mut completes = 0u64;
    for c in cells {
        allocated += u64::from(c.target);
        completes += u64::from(c.current);
        by_status.bump(c.status);
    }
    QuotaSummary {
        total_target,
        allocated,
        delta: allocated as i64 - i64::from(total_target),
        cell_count: cells.len(),
        min_target: cells.iter().map(|c| c.target).min(),
        max_target: cells.iter().map(|c| c.target).max(),
        completes,
        by_status,
    }
}
