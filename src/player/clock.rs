// SPDX-License-Identifier: MPL-2.0
//! The shared playback position clock.
//!
//! Written by the decode worker once per tick, read by command callers
//! (most importantly the quality-switch path, which snapshots it before
//! tearing a session down). Stored as `f64` bits in an `AtomicU64` so no
//! lock sits on the per-tick hot path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Lock-free playback position, in seconds.
#[derive(Debug)]
pub struct PositionClock(AtomicU64);

/// The clock as shared between the engine and its decode worker.
pub type SharedPositionClock = Arc<PositionClock>;

impl PositionClock {
    pub fn new() -> Self {
        Self(AtomicU64::new(0.0_f64.to_bits()))
    }

    /// Current position in seconds.
    pub fn get(&self) -> f64 {
        f64::from_bits(self.0.load(Ordering::Acquire))
    }

    /// Stores a new position.
    pub fn set(&self, position_secs: f64) {
        self.0.store(position_secs.to_bits(), Ordering::Release);
    }

    /// Resets the position to zero.
    pub fn reset(&self) {
        self.set(0.0);
    }
}

impl Default for PositionClock {
    fn default() -> Self {
        Self::new()
    }
}
