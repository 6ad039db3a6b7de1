//! Write policies: when modified tiles reach the factory.
//!
//! Policies keep no per-tile state. Whether a resident tile holds unflushed
//! writes is recorded on its [`Page`], so one policy instance can serve any
//! number of caches.

use crate::error::FactoryError;
use crate::factory::{ImageFactory, TileValue};
use crate::geometry::Point;
use crate::image::Image;

use super::page::Page;

/// Commit strategy for writes into resident tiles of factory `F`.
pub trait WritePolicy<F: ImageFactory<D>, const D: usize> {
    /// Store `value` at `point` in `page`, committing to `factory` as the
    /// policy requires.
    fn write_in_page(
        &mut self,
        page: &mut Page<F::Output>,
        point: &Point<D>,
        value: TileValue<F, D>,
        factory: &mut F,
    ) -> Result<(), FactoryError>;

    /// Called before `page` leaves the cache, or on an explicit flush.
    fn flush_page(
        &mut self,
        page: &mut Page<F::Output>,
        factory: &mut F,
    ) -> Result<(), FactoryError>;
}

// =============================================================================
// Write-through
// =============================================================================

/// Every write is flushed to the factory immediately; detaching a tile
/// writes nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteThrough;

impl WriteThrough {
    pub fn new() -> Self {
        Self
    }
}

impl<F: ImageFactory<D>, const D: usize> WritePolicy<F, D> for WriteThrough {
    fn write_in_page(
        &mut self,
        page: &mut Page<F::Output>,
        point: &Point<D>,
        value: TileValue<F, D>,
        factory: &mut F,
    ) -> Result<(), FactoryError> {
        page.tile_mut().set_value(point, value);
        factory.flush_image(page.tile())
    }

    fn flush_page(
        &mut self,
        _page: &mut Page<F::Output>,
        _factory: &mut F,
    ) -> Result<(), FactoryError> {
        Ok(())
    }
}

// =============================================================================
// Write-back
// =============================================================================

/// Writes stay in the tile and mark its page dirty; a dirty page is flushed
/// when it is detached or on an explicit flush.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteBack;

impl WriteBack {
    pub fn new() -> Self {
        Self
    }
}

impl<F: ImageFactory<D>, const D: usize> WritePolicy<F, D> for WriteBack {
    fn write_in_page(
        &mut self,
        page: &mut Page<F::Output>,
        point: &Point<D>,
        value: TileValue<F, D>,
        _factory: &mut F,
    ) -> Result<(), FactoryError> {
        page.tile_mut().set_value(point, value);
        page.mark_dirty();
        Ok(())
    }

    fn flush_page(
        &mut self,
        page: &mut Page<F::Output>,
        factory: &mut F,
    ) -> Result<(), FactoryError> {
        if page.is_dirty() {
            factory.flush_image(page.tile())?;
            page.mark_clean();
        }
        Ok(())
    }
}

// =============================================================================
// Runtime selection
// =============================================================================

/// A write policy chosen at runtime.
#[derive(Debug, Clone, Copy)]
pub enum AnyWritePolicy {
    Through(WriteThrough),
    Back(WriteBack),
}

impl<F: ImageFactory<D>, const D: usize> WritePolicy<F, D> for AnyWritePolicy {
    fn write_in_page(
        &mut self,
        page: &mut Page<F::Output>,
        point: &Point<D>,
        value: TileValue<F, D>,
        factory: &mut F,
    ) -> Result<(), FactoryError> {
        match self {
            AnyWritePolicy::Through(p) => p.write_in_page(page, point, value, factory),
            AnyWritePolicy::Back(p) => p.write_in_page(page, point, value, factory),
        }
    }

    fn flush_page(
        &mut self,
        page: &mut Page<F::Output>,
        factory: &mut F,
    ) -> Result<(), FactoryError> {
        match self {
            AnyWritePolicy::Through(p) => WritePolicy::<F, D>::flush_page(p, page, factory),
            AnyWritePolicy::Back(p) => WritePolicy::<F, D>::flush_page(p, page, factory),
        }
    }
}
