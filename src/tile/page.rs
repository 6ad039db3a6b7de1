//! Resident tile slot.

/// A resident tile together with its commit state.
///
/// The dirty bit belongs to this resident copy, not to the tile's domain:
/// two read policies holding copies of the same sub-domain track their
/// unflushed writes independently.
#[derive(Debug, Clone)]
pub struct Page<T> {
    tile: T,
    dirty: bool,
}

impl<T> Page<T> {
    /// Wrap a freshly fetched, clean tile.
    pub fn new(tile: T) -> Self {
        Self { tile, dirty: false }
    }

    pub fn tile(&self) -> &T {
        &self.tile
    }

    /// Mutable access to the tile. Does not touch the dirty bit.
    pub fn tile_mut(&mut self) -> &mut T {
        &mut self.tile
    }

    pub fn into_tile(self) -> T {
        self.tile
    }

    /// `true` if the tile holds writes the factory has not seen.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
