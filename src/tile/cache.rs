//! Tile cache orchestrating read and write policies.
//!
//! The cache itself holds no opinion on which tile to keep. Resident tiles
//! live in the read policy, commits go through the write policy, and tiles
//! come from the factory. The cache supplies the mechanics in between and
//! counts misses.
//!
//! # Residency Contract
//!
//! After [`TileCache::update`] returns `Ok`, every `read` and `write` for a
//! point inside the updated sub-domain succeeds until a later `update`
//! evicts it.
//!
//! # Lock Order
//!
//! The shared handles are always locked read policy, then write policy,
//! then factory, and never in any other order.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::TileError;
use crate::factory::{ImageFactory, TileValue};
use crate::geometry::{Domain, Point};
use crate::image::Image;
use crate::timing::Stopwatch;
use crate::Shared;

use super::read_policy::ReadPolicy;
use super::write_policy::WritePolicy;

/// Snapshot of a cache's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads that found no resident tile
    pub miss_read: u64,
    /// Writes that found no resident tile
    pub miss_write: u64,
    /// Tiles currently resident in the read policy
    pub resident_tiles: usize,
    /// Resident tiles holding writes the factory has not seen
    pub dirty_tiles: usize,
    /// Maximum number of resident tiles
    pub capacity: usize,
}

/// Bounded tile store driven by a read policy and a write policy.
///
/// # Type Parameters
///
/// * `F` - The tile factory
/// * `R` - The read policy, storing tiles of type `F::Output`
/// * `W` - The write policy
pub struct TileCache<F, R, W, const D: usize> {
    factory: Shared<F>,
    read_policy: Shared<R>,
    write_policy: Shared<W>,

    miss_read: AtomicU64,
    miss_write: AtomicU64,

    update_timer: Stopwatch,
}

impl<F, R, W, const D: usize> TileCache<F, R, W, D>
where
    F: ImageFactory<D>,
    R: ReadPolicy<F::Output, D>,
    W: WritePolicy<F, D>,
{
    /// Create a cache over shared collaborators.
    pub fn new(factory: Shared<F>, read_policy: Shared<R>, write_policy: Shared<W>) -> Self {
        Self {
            factory,
            read_policy,
            write_policy,
            miss_read: AtomicU64::new(0),
            miss_write: AtomicU64::new(0),
            update_timer: Stopwatch::default(),
        }
    }

    /// Enable or disable timing of the update path.
    pub fn set_timing(&mut self, enabled: bool) {
        self.update_timer.set_enabled(enabled);
    }

    /// Read the value at `point` if its tile is resident.
    pub fn read(&self, point: &Point<D>) -> Option<TileValue<F, D>> {
        let mut read_policy = self.read_policy.lock();
        let value = read_policy.page(point).map(|page| page.tile().get(point));
        if value.is_some() {
            trace!(%point, "cache hit");
        }
        value
    }

    /// Write `value` at `point` if its tile is resident.
    ///
    /// Returns `Ok(false)` on a miss. Errors only come from a write policy
    /// that commits to the factory immediately.
    pub fn write(&self, point: &Point<D>, value: TileValue<F, D>) -> Result<bool, TileError> {
        let mut read_policy = self.read_policy.lock();
        let Some(page) = read_policy.page(point) else {
            return Ok(false);
        };
        let mut write_policy = self.write_policy.lock();
        let mut factory = self.factory.lock();
        write_policy.write_in_page(page, point, value, &mut *factory)?;
        Ok(true)
    }

    /// Make the tile for `sub_domain` resident.
    ///
    /// If the read policy needs room, the tile it gives up is flushed
    /// through the write policy before the new tile is fetched.
    pub fn update(&self, sub_domain: &Domain<D>) -> Result<(), TileError> {
        self.update_timer.time(|| self.update_inner(sub_domain))
    }

    fn update_inner(&self, sub_domain: &Domain<D>) -> Result<(), TileError> {
        let mut read_policy = self.read_policy.lock();
        if read_policy.contains(sub_domain) {
            return Ok(());
        }

        let mut write_policy = self.write_policy.lock();
        let mut factory = self.factory.lock();

        if let Some(victim) = read_policy.page_to_detach() {
            debug!(
                tile = %victim.tile().domain(),
                dirty = victim.is_dirty(),
                "flushing tile before eviction"
            );
            write_policy.flush_page(victim, &mut *factory)?;
        }

        let evicted = read_policy.update_cache(sub_domain, &mut *factory)?;
        debug!(tile = %sub_domain, resident = read_policy.len(), "tile installed");

        if let Some(tile) = evicted {
            debug!(tile = %tile.domain(), "tile evicted");
            factory.detach_image(tile);
        }
        Ok(())
    }

    /// Flush every resident tile through the write policy, keeping them
    /// resident.
    pub fn flush(&self) -> Result<(), TileError> {
        let mut read_policy = self.read_policy.lock();
        let mut write_policy = self.write_policy.lock();
        let mut factory = self.factory.lock();
        for page in read_policy.pages_mut() {
            write_policy.flush_page(page, &mut *factory)?;
        }
        Ok(())
    }

    /// Flush and detach every resident tile.
    ///
    /// Tiles are only removed once every flush succeeded, so a failed flush
    /// leaves the cache intact.
    pub fn clear(&self) -> Result<(), TileError> {
        let mut read_policy = self.read_policy.lock();
        let mut write_policy = self.write_policy.lock();
        let mut factory = self.factory.lock();
        for page in read_policy.pages_mut() {
            write_policy.flush_page(page, &mut *factory)?;
        }
        let drained = read_policy.drain();
        debug!(tiles = drained.len(), "cache cleared");
        for tile in drained {
            factory.detach_image(tile);
        }
        Ok(())
    }

    pub fn inc_cache_miss_read(&self) {
        self.miss_read.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_cache_miss_write(&self) {
        self.miss_write.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cache_miss_read(&self) -> u64 {
        self.miss_read.load(Ordering::Relaxed)
    }

    pub fn cache_miss_write(&self) -> u64 {
        self.miss_write.load(Ordering::Relaxed)
    }

    /// Reset both miss counters to zero.
    pub fn reset_cache_misses(&self) {
        self.miss_read.store(0, Ordering::Relaxed);
        self.miss_write.store(0, Ordering::Relaxed);
    }

    /// Number of resident tiles.
    pub fn resident_tiles(&self) -> usize {
        self.read_policy.lock().len()
    }

    /// Number of resident tiles holding unflushed writes.
    pub fn dirty_tiles(&self) -> usize {
        self.read_policy
            .lock()
            .pages()
            .iter()
            .filter(|page| page.is_dirty())
            .count()
    }

    pub fn stats(&self) -> CacheStats {
        let read_policy = self.read_policy.lock();
        CacheStats {
            miss_read: self.cache_miss_read(),
            miss_write: self.cache_miss_write(),
            resident_tiles: read_policy.len(),
            dirty_tiles: read_policy
                .pages()
                .iter()
                .filter(|page| page.is_dirty())
                .count(),
            capacity: read_policy.capacity(),
        }
    }

    /// Accumulated time spent in [`update`](Self::update).
    pub fn update_timer(&self) -> &Stopwatch {
        &self.update_timer
    }

    /// Resident tiles are within capacity, valid, and pairwise distinct.
    pub fn is_valid(&self) -> bool {
        let read_policy = self.read_policy.lock();
        let pages = read_policy.pages();
        let distinct = pages.iter().enumerate().all(|(i, a)| {
            pages[i + 1..]
                .iter()
                .all(|b| a.tile().domain() != b.tile().domain())
        });
        read_policy.len() <= read_policy.capacity()
            && distinct
            && pages.iter().all(|page| page.tile().is_valid())
    }
}

// =============================================================================
// Tests
// =============================================================================
