//! Reference result cache.
//!
//! The reference backend is slow, and verification needs its output for
//! every non-reference run. Results are cached per filter. The cache does not
//! know which image produced an entry, so it must be cleared whenever the
//! input image changes; [`ReferenceCache::clear`] counts those invalidations.

use std::collections::HashMap;

use fxlab_core::RgbaImage;
use tracing::trace;

use crate::Filter;

/// Cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached filters.
    pub entries: usize,
    /// Total cached bytes.
    pub total_bytes: u64,
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups that missed.
    pub misses: u64,
    /// Number of [`ReferenceCache::clear`] calls.
    pub clears: u64,
}

/// Per-filter cache of reference outputs.
#[derive(Default)]
pub struct ReferenceCache {
    entries: HashMap<Filter, RgbaImage>,
    total_bytes: u64,
    hits: u64,
    misses: u64,
    clears: u64,
}

impl ReferenceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached output for `filter`, if one exists with the given dimensions.
    ///
    /// An entry with different dimensions is treated as a miss; it can only
    /// come from an image that was swapped without clearing.
    pub fn get(&mut self, filter: Filter, dims: (u32, u32)) -> Option<&RgbaImage> {
        match self.entries.get(&filter) {
            Some(image) if image.dimensions() == dims => {
                self.hits += 1;
                trace!(%filter, "reference cache hit");
                Some(image)
            }
            _ => {
                self.misses += 1;
                trace!(%filter, "reference cache miss");
                None
            }
        }
    }

    /// Like [`get`](Self::get) without touching the hit/miss counters.
    pub fn peek(&self, filter: Filter, dims: (u32, u32)) -> Option<&RgbaImage> {
        self.entries
            .get(&filter)
            .filter(|image| image.dimensions() == dims)
    }

    /// Stores the reference output for `filter`, replacing any previous one.
    pub fn insert(&mut self, filter: Filter, image: RgbaImage) {
        let size = image.size_bytes() as u64;
        if let Some(old) = self.entries.insert(filter, image) {
            self.total_bytes = self.total_bytes.saturating_sub(old.size_bytes() as u64);
        }
        self.total_bytes += size;
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.total_bytes = 0;
        self.clears += 1;
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            total_bytes: self.total_bytes,
            hits: self.hits,
            misses: self.misses,
            clears: self.clears,
        }
    }
}
