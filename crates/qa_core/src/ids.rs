//! crates/qa_core/src/ids.rs
//! Token ids for dimensions and quota cells.
//! Deterministic, ASCII-only, strict shapes; no I/O.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

const TOKEN_MAX_LEN: usize = 64;

/// Token shape: ^[A-Za-z0-9_.:-]{1,64}$ (ASCII only)
#[inline]
pub fn is_valid_token(s: &str) -> bool {
    let bs = s.as_bytes();
    let len = bs.len();
    if len == 0 || len > TOKEN_MAX_LEN {
        return false;
    }
    bs.iter().all(|&b| {
        b.is_ascii_alphanumeric() || b == b'_' || b == b'.' || b == b':' || b == b'-'
    })
}

macro_rules! token_newtype {
    ($(#[$m:meta])* $name:ident) => {
        $(#[$m])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        #[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
        pub struct $name(String);

        impl $name {
            #[inline] pub fn as_str(&self) -> &str { &self.0 }
        }

        impl fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(&self.0) }
        }

        impl FromStr for $name {
            type Err = CoreError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if is_valid_token(s) { Ok(Self(s.to_owned())) } else { Err(CoreError::InvalidToken) }
            }
        }

        impl TryFrom<&str> for $name {
            type Error = CoreError;
            #[inline]
            fn try_from(value: &str) -> Result<Self, Self::Error> { value.parse() }
        }

        impl TryFrom<String> for $name {
            type Error = CoreError;
            fn try_from(value: String) -> Result<Self, Self::Error> {
                if is_valid_token(&value) { Ok(Self(value)) } else { Err(CoreError::InvalidToken) }
            }
        }

        impl From<$name> for String {
            #[inline]
            fn from(v: $name) -> String { v.0 }
        }
    }
}

token_newtype!(
    /// Demographic dimension token, e.g. `gender`, `age_ranges`.
    DimensionId
);
token_newtype!(
    /// Quota cell id, unique within one quota set.
    CellId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens() {
        for ok in ["gender", "age_ranges", "q_00ff", "A_b:9.Z", "1699999999"] {
            assert!(is_valid_token(ok));
            let _d: DimensionId = ok.parse().unwrap();
            let _c: CellId = ok.parse().unwrap();
        }
        let long = "x".repeat(65);
        for bad in ["", " ", "é", "age ranges", long.as_str()] {
            assert!(!is_valid_token(bad));
            assert_eq!(bad.parse::<CellId>(), Err(CoreError::InvalidToken));
        }
    }

    #[test]
    fn display_round_trip() {
        let id: DimensionId = "age_ranges".parse().unwrap();
        assert_eq!(id.to_string(), "age_ranges");
        assert_eq!(String::from(id), "age_ranges");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serde_rejects_bad_shape() {
        let ok: CellId = serde_json::from_str("\"q_0001\"").unwrap();
        assert_eq!(ok.as_str(), "q_0001");
        assert!(serde_json::from_str::<CellId>("\"has space\"").is_err());
    }
}
