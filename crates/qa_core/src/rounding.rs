//! Rounding and percentage helpers.
//!
//! Census sizing is the only place floats enter the engine; everything that
//! must reconcile exactly (even split, redistribution) stays integer-only.

/// Round half away from zero and clamp into `u32`.
///
/// NaN and negatives map to 0; values past `u32::MAX` saturate.
#[inline]
pub fn round_to_u32(x: f64) -> u32 {
    if !x.is_finite() || x <= 0.0 {
        return 0;
    }
    let r = x.round();
    if r >= u32::MAX as f64 {
        u32::MAX
    } else {
        r as u32
    }
}

/// `target / total * 100`; 0 when the total is 0.
#[inline]
pub fn percentage_of(target: u32, total: u32) -> f64 {
    if total == 0 {
        return 0.0;
    }
    f64::from(target) / f64::from(total) * 100.0
}

/// Split `total` into `n` integer shares that sum to `total` and differ by at
/// most one. The first `total % n` shares carry the extra unit.
pub fn even_shares(total: u32, n: usize) -> Vec<u32> {
    if n == 0 {
        return Vec::new();
    }
    let n64 = n as u64;
    let base = (u64::from(total) / n64) as u32;
    let remainder = (u64::from(total) % n64) as usize;
    (0..n).map(|i| if i < remainder { base + 1 } else { base }).collect()
}
