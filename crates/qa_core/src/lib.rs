//! qa_core: quota cell model, id newtypes and the seeded id sources.
//!
//! This crate is **I/O-free**. It defines stable types/APIs used across the
//! engine (`qa_algo`, `qa_io`, `qa_pipeline`, `qa_report`, `qa_cli`).
//!
//! - Tokens: `DimensionId`, `CellId`
//! - Domain records: `AllocationRequest`, `DemographicDimension`, `QuotaCell`, `QuotaStatus`
//! - Engine parameters with safe defaults (`EngineParams`)
//! - Rounding & percentage helpers
//! - Injectable id sources (seeded ChaCha20 or sequential)
//!
//! Serialization derives are gated behind the `serde` feature.

#![forbid(unsafe_code)]

pub mod errors {
    use core::fmt;

    /// Minimal error set for core-domain validation & parsing.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub enum CoreError {
        InvalidToken,
        InvalidWeight,
        DomainOutOfRange(&'static str),
        EmptyChoiceSet,
    }

    impl fmt::Display for CoreError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                CoreError::InvalidToken => write!(f, "invalid token"),
                CoreError::InvalidWeight => write!(f, "census weight must be a finite percentage in (0, 100]"),
                CoreError::DomainOutOfRange(k) => write!(f, "domain out of range: {k}"),
                CoreError::EmptyChoiceSet => write!(f, "empty choice set"),
            }
        }
    }

    impl std::error::Error for CoreError {}
}

pub mod ids;
pub mod cells;
pub mod rounding;
pub mod rng;
pub mod variables;

pub use cells::{AllocationMode, AllocationRequest, DemographicDimension, DemographicFilter, QuotaCell, QuotaStatus};
pub use errors::CoreError;
pub use ids::{CellId, DimensionId};
pub use rng::{IdSource, SeededIds, SequentialIds};
pub use variables::EngineParams;
