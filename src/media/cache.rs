// SPDX-License-Identifier: MPL-2.0
//! The decoder resource cache.
//!
//! Decode handles sit on finite OS resources (file handles, codec
//! contexts), so their lifetime is managed explicitly: a pair exists from
//! `acquire` until `release`, and the cache enforces at most one live pair
//! per source identity. There is deliberately no process-wide table: the
//! cache is a plain owned object injected into the engine, so tests can
//! substitute an instrumented fake and assert exact acquire/release
//! sequences.

use crate::error::Result;
use crate::media::{DecoderPair, SourceOpener};
use crate::source::SourceId;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A live decoder pair, shared between the engine (for pause/resume audio
/// control) and the decode worker (for frame reads).
pub type SharedPair = Arc<Mutex<DecoderPair>>;

/// The cache as shared between the engine and the worker's exit path.
///
/// The cache itself is not internally thread-safe; this single mutex is the
/// required external synchronization.
pub type SharedCache = Arc<Mutex<Box<dyn MediaCache>>>;

/// Ownership interface of the decoder resource cache.
pub trait MediaCache: Send {
    /// Returns the live pair for `id`, opening and caching one if needed.
    fn acquire(&mut self, id: &SourceId) -> Result<SharedPair>;

    /// Closes and evicts the pair for `id`. Releasing an absent identity is
    /// a no-op, not an error.
    fn release(&mut self, id: &SourceId);
}

/// Production cache: memoizes one decoder pair per source identity on top
/// of a [`SourceOpener`].
pub struct DecoderCache {
    opener: Box<dyn SourceOpener>,
    live: HashMap<SourceId, SharedPair>,
}

impl DecoderCache {
    pub fn new(opener: Box<dyn SourceOpener>) -> Self {
        Self {
            opener,
            live: HashMap::new(),
        }
    }

    /// Number of currently live pairs.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Whether a pair is live for `id`.
    pub fn is_live(&self, id: &SourceId) -> bool {
        self.live.contains_key(id)
    }
}

impl MediaCache for DecoderCache {
    fn acquire(&mut self, id: &SourceId) -> Result<SharedPair> {
        if let Some(pair) = self.live.get(id) {
            tracing::debug!(source = %id, "reusing cached decoder pair");
            return Ok(Arc::clone(pair));
        }

        tracing::debug!(source = %id, "opening decoder pair");
        let pair = Arc::new(Mutex::new(self.opener.open(id)?));
        self.live.insert(id.clone(), Arc::clone(&pair));
        Ok(pair)
    }

    fn release(&mut self, id: &SourceId) {
        if self.live.remove(id).is_some() {
            // The pair closes when the session's last handle drops; eviction
            // here guarantees no later acquire can see the stale pair.
            tracing::debug!(source = %id, "released decoder pair");
        }
    }
}
