// crates/qa_core/src/rng.rs
//
// Injectable id generation for quota cells.
//
// Cell ids must be unique within one quota set and stable for a cell's
// lifetime. Engine operations never reach for OS entropy: every fresh id comes
// from an `IdSource` passed in by the caller, so a run is reproducible from
// its seed.
//
// Two sources ship here:
// • `SeededIds`:     ChaCha20 stream, ids shaped "q_" + 16 lowercase hex.
// • `SequentialIds`: counter, ids shaped "q_0001", "q_0002", …
//
// Seeding is explicit: `seed.to_le_bytes()` into the first 8 bytes of the
// 32-byte ChaCha20 key, remaining bytes zero.

use std::collections::BTreeSet;

use rand_chacha::ChaCha20Rng;
use rand_core::{RngCore, SeedableRng};

use crate::ids::CellId;

/// Source of candidate cell ids. Candidates need not be unique on their own;
/// callers go through [`fresh_id`] which redraws on collision.
pub trait IdSource {
    fn next_id(&mut self) -> CellId;
}

impl<T: IdSource + ?Sized> IdSource for &mut T {
    #[inline]
    fn next_id(&mut self) -> CellId {
        (**self).next_id()
    }
}

/// Draw ids from `source` until one is not in `taken`, then reserve it.
pub fn fresh_id<S: IdSource + ?Sized>(source: &mut S, taken: &mut BTreeSet<CellId>) -> CellId {
    loop {
        let id = source.next_id();
        if taken.insert(id.clone()) {
            return id;
        }
    }
}

/// Seeded ChaCha20 id stream.
#[derive(Debug, Clone)]
pub struct SeededIds {
    rng: ChaCha20Rng,
    words_consumed: u128,
}

impl SeededIds {
    #[inline]
    pub fn from_seed_u64(seed: u64) -> Self {
        let mut seed32 = [0u8; 32];
        seed32[..8].copy_from_slice(&seed.to_le_bytes());
        Self {
            rng: ChaCha20Rng::from_seed(seed32),
            words_consumed: 0,
        }
    }

    /// Number of 64-bit words drawn so far (saturating).
    #[inline]
    pub fn words_consumed(&self) -> u128 {
        self.words_consumed
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        self.words_consumed = self.words_consumed.saturating_add(1);
        self.rng.next_u64()
    }
}

impl IdSource for SeededIds {
    fn next_id(&mut self) -> CellId {
        let word = self.next_u64();
        CellId::try_from(format!("q_{word:016x}")).unwrap_or_else(|_| unreachable!("hex id is a valid token"))
    }
}

/// Monotonic counter ids. Handy for fixtures and human-readable output.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    next: u64,
}

impl SequentialIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting after `n` (the next id is `n + 1`).
    pub fn starting_after(n: u64) -> Self {
        Self { next: n }
    }
}

impl IdSource for SequentialIds {
    fn next_id(&mut self) -> CellId {
        self.next = self.next.saturating_add(1);
        CellId::try_from(format!("q_{:04}", self.next)).unwrap_or_else(|_| unreachable!("counter id is a valid token"))
    }
}
