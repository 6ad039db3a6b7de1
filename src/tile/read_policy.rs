//! Read policies: which tiles stay resident.
//!
//! A read policy is the storage of the tile cache. It holds the resident
//! tiles as [`Page`]s, answers point lookups, and decides which tile to
//! give up when a new one must be installed. Sharing one policy instance between several
//! tiled images therefore shares the resident tile set itself.

use std::collections::VecDeque;
use std::num::NonZeroUsize;

use lru::LruCache;

use crate::error::FactoryError;
use crate::factory::ImageFactory;
use crate::geometry::{Domain, Point};
use crate::image::Image;

use super::page::Page;

/// Default number of resident tiles for the bounded policies.
pub const DEFAULT_CACHE_TILES: usize = 16;

/// Tile retention strategy over tiles of type `T`.
pub trait ReadPolicy<T: Image<D>, const D: usize> {
    /// Resident tile whose domain contains `point`.
    ///
    /// This is storage lookup only. Policies that track recency may record
    /// the access, but retention is decided per tile domain.
    fn page(&mut self, point: &Point<D>) -> Option<&mut Page<T>>;

    /// `true` if the tile for exactly `sub_domain` is resident.
    fn contains(&self, sub_domain: &Domain<D>) -> bool;

    /// The page the next [`update_cache`](Self::update_cache) will evict,
    /// or `None` if there is still room.
    fn page_to_detach(&mut self) -> Option<&mut Page<T>>;

    /// Install `tile` as a clean page, returning the tile it displaced.
    ///
    /// The displaced page must already have been flushed.
    fn install(&mut self, tile: T) -> Option<T>;

    /// Fetch the tile for `sub_domain` from `factory` and install it.
    fn update_cache<F>(
        &mut self,
        sub_domain: &Domain<D>,
        factory: &mut F,
    ) -> Result<Option<T>, FactoryError>
    where
        F: ImageFactory<D, Output = T>,
    {
        let tile = factory.request_image(sub_domain)?;
        Ok(self.install(tile))
    }

    /// Every resident page, in no particular order.
    fn pages(&self) -> Vec<&Page<T>>;

    /// Every resident page, mutably, in no particular order.
    fn pages_mut(&mut self) -> Vec<&mut Page<T>>;

    /// Remove and return every resident tile.
    fn drain(&mut self) -> Vec<T>;

    /// Number of resident tiles.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of resident tiles.
    fn capacity(&self) -> usize;
}

// =============================================================================
// Last tile
// =============================================================================

/// Keep only the most recently installed tile.
#[derive(Debug, Clone)]
pub struct LastTilePolicy<T, const D: usize> {
    tile: Option<Page<T>>,
}

impl<T, const D: usize> LastTilePolicy<T, D> {
    pub fn new() -> Self {
        Self { tile: None }
    }
}

impl<T, const D: usize> Default for LastTilePolicy<T, D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Image<D>, const D: usize> ReadPolicy<T, D> for LastTilePolicy<T, D> {
    fn page(&mut self, point: &Point<D>) -> Option<&mut Page<T>> {
        self.tile
            .as_mut()
            .filter(|p| p.tile().domain().is_inside(point))
    }

    fn contains(&self, sub_domain: &Domain<D>) -> bool {
        self.tile
            .as_ref()
            .is_some_and(|p| p.tile().domain() == sub_domain)
    }

    fn page_to_detach(&mut self) -> Option<&mut Page<T>> {
        self.tile.as_mut()
    }

    fn install(&mut self, tile: T) -> Option<T> {
        self.tile.replace(Page::new(tile)).map(Page::into_tile)
    }

    fn pages(&self) -> Vec<&Page<T>> {
        self.tile.iter().collect()
    }

    fn pages_mut(&mut self) -> Vec<&mut Page<T>> {
        self.tile.iter_mut().collect()
    }

    fn drain(&mut self) -> Vec<T> {
        self.tile.take().map(Page::into_tile).into_iter().collect()
    }

    fn len(&self) -> usize {
        usize::from(self.tile.is_some())
    }

    fn capacity(&self) -> usize {
        1
    }
}

// =============================================================================
// FIFO
// =============================================================================

/// Keep up to `capacity` tiles, evicting the oldest install first.
#[derive(Debug, Clone)]
pub struct FifoPolicy<T, const D: usize> {
    tiles: VecDeque<Page<T>>,
    capacity: usize,
}

impl<T, const D: usize> FifoPolicy<T, D> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            tiles: VecDeque::with_capacity(capacity),
            capacity,
        }
    }
}

impl<T: Image<D>, const D: usize> ReadPolicy<T, D> for FifoPolicy<T, D> {
    fn page(&mut self, point: &Point<D>) -> Option<&mut Page<T>> {
        self.tiles
            .iter_mut()
            .find(|p| p.tile().domain().is_inside(point))
    }

    fn contains(&self, sub_domain: &Domain<D>) -> bool {
        self.tiles.iter().any(|p| p.tile().domain() == sub_domain)
    }

    fn page_to_detach(&mut self) -> Option<&mut Page<T>> {
        if self.tiles.len() >= self.capacity {
            self.tiles.front_mut()
        } else {
            None
        }
    }

    fn install(&mut self, tile: T) -> Option<T> {
        let evicted = if self.tiles.len() >= self.capacity {
            self.tiles.pop_front()
        } else {
            None
        };
        self.tiles.push_back(Page::new(tile));
        evicted.map(Page::into_tile)
    }

    fn pages(&self) -> Vec<&Page<T>> {
        self.tiles.iter().collect()
    }

    fn pages_mut(&mut self) -> Vec<&mut Page<T>> {
        self.tiles.iter_mut().collect()
    }

    fn drain(&mut self) -> Vec<T> {
        self.tiles.drain(..).map(Page::into_tile).collect()
    }

    fn len(&self) -> usize {
        self.tiles.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

// =============================================================================
// LRU
// =============================================================================

/// Keep up to `capacity` tiles, evicting the least recently accessed.
pub struct LruPolicy<T, const D: usize> {
    tiles: LruCache<Domain<D>, Page<T>>,
}

impl<T, const D: usize> LruPolicy<T, D> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        Self {
            tiles: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
        }
    }
}

impl<T: Image<D>, const D: usize> ReadPolicy<T, D> for LruPolicy<T, D> {
    fn page(&mut self, point: &Point<D>) -> Option<&mut Page<T>> {
        // Find the owning tile without touching recency, then promote it.
        let key = self
            .tiles
            .iter()
            .find(|(domain, _)| domain.is_inside(point))
            .map(|(domain, _)| *domain)?;
        self.tiles.get_mut(&key)
    }

    fn contains(&self, sub_domain: &Domain<D>) -> bool {
        self.tiles.contains(sub_domain)
    }

    fn page_to_detach(&mut self) -> Option<&mut Page<T>> {
        if self.tiles.len() < self.tiles.cap().get() {
            return None;
        }
        // Peeking leaves recency untouched.
        let key = *self.tiles.peek_lru()?.0;
        self.tiles.peek_mut(&key)
    }

    fn install(&mut self, tile: T) -> Option<T> {
        let key = *tile.domain();
        self.tiles
            .push(key, Page::new(tile))
            .map(|(_, evicted)| evicted.into_tile())
    }

    fn pages(&self) -> Vec<&Page<T>> {
        self.tiles.iter().map(|(_, page)| page).collect()
    }

    fn pages_mut(&mut self) -> Vec<&mut Page<T>> {
        self.tiles.iter_mut().map(|(_, page)| page).collect()
    }

    fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.tiles.len());
        while let Some((_, page)) = self.tiles.pop_lru() {
            out.push(page.into_tile());
        }
        out
    }

    fn len(&self) -> usize {
        self.tiles.len()
    }

    fn capacity(&self) -> usize {
        self.tiles.cap().get()
    }
}

// =============================================================================
// Runtime selection
// =============================================================================

/// A read policy chosen at runtime.
///
/// An enum rather than a trait object: `update_cache` is generic over the
/// factory, which keeps [`ReadPolicy`] from being object-safe.
pub enum AnyReadPolicy<T, const D: usize> {
    Last(LastTilePolicy<T, D>),
    Fifo(FifoPolicy<T, D>),
    Lru(LruPolicy<T, D>),
}

macro_rules! dispatch {
    ($self:expr, $policy:ident => $body:expr) => {
        match $self {
            AnyReadPolicy::Last($policy) => $body,
            AnyReadPolicy::Fifo($policy) => $body,
            AnyReadPolicy::Lru($policy) => $body,
        }
    };
}

impl<T: Image<D>, const D: usize> ReadPolicy<T, D> for AnyReadPolicy<T, D> {
    fn page(&mut self, point: &Point<D>) -> Option<&mut Page<T>> {
        dispatch!(self, p => p.page(point))
    }

    fn contains(&self, sub_domain: &Domain<D>) -> bool {
        dispatch!(self, p => p.contains(sub_domain))
    }

    fn page_to_detach(&mut self) -> Option<&mut Page<T>> {
        dispatch!(self, p => p.page_to_detach())
    }

    fn install(&mut self, tile: T) -> Option<T> {
        dispatch!(self, p => p.install(tile))
    }

    fn pages(&self) -> Vec<&Page<T>> {
        dispatch!(self, p => p.pages())
    }

    fn pages_mut(&mut self) -> Vec<&mut Page<T>> {
        dispatch!(self, p => p.pages_mut())
    }

    fn drain(&mut self) -> Vec<T> {
        dispatch!(self, p => p.drain())
    }

    fn len(&self) -> usize {
        dispatch!(self, p => p.len())
    }

    fn capacity(&self) -> usize {
        dispatch!(self, p => p.capacity())
    }
}
