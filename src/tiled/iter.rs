//! Tile-major traversal of a [`TiledImage`].
//!
//! Points are visited tile by tile. Inside a tile, axis 0 varies fastest;
//! across tiles, the tile index on axis 0 varies fastest. Staying inside
//! the current tile keeps its cached domain, so the owning tile is only
//! recomputed when the cursor crosses into the next one.

use crate::error::TileError;
use crate::factory::{ImageFactory, TileValue};
use crate::geometry::{Domain, Point};
use crate::tile::{ReadPolicy, WritePolicy};

use super::image::TiledImage;

/// Forward cursor over the points of a [`TiledImage`].
///
/// Two cursors compare equal when they sit on the same position; the
/// past-the-end cursor has no position. Cursors from different images
/// must not be compared.
///
/// As an [`Iterator`] it yields positions only and never touches the
/// cache. Use [`value`](Self::value) or [`TiledImage::values`] to read.
pub struct TiledIter<'a, F, R, W, const D: usize> {
    image: &'a TiledImage<F, R, W, D>,
    position: Option<Point<D>>,
    tile: Domain<D>,
}

impl<'a, F, R, W, const D: usize> TiledIter<'a, F, R, W, D>
where
    F: ImageFactory<D>,
    R: ReadPolicy<F::Output, D>,
    W: WritePolicy<F, D>,
{
    pub(super) fn new(image: &'a TiledImage<F, R, W, D>, position: Option<Point<D>>) -> Self {
        let anchor = position.unwrap_or(*image.upper_bound());
        Self {
            image,
            position,
            tile: image.find_sub_domain(&anchor),
        }
    }

    /// Current position, `None` once traversal is complete.
    pub fn position(&self) -> Option<&Point<D>> {
        self.position.as_ref()
    }

    /// Tile containing the current position.
    pub fn tile(&self) -> &Domain<D> {
        &self.tile
    }

    pub fn is_end(&self) -> bool {
        self.position.is_none()
    }

    /// Value at the current position, read through [`TiledImage::get`].
    pub fn value(&self) -> Option<Result<TileValue<F, D>, TileError>> {
        self.position.as_ref().map(|p| self.image.get(p))
    }

    /// Step to the next position.
    pub fn advance(&mut self) {
        let Some(position) = self.position.as_mut() else {
            return;
        };
        let tile = self.tile;

        for axis in 0..D {
            if position[axis] < tile.upper_bound()[axis] {
                position[axis] += 1;
                return;
            }

            let exhausted = (0..D).all(|j| position[j] == tile.upper_bound()[j]);
            if exhausted {
                // Jump to the first point of the next tile.
                let lower = self.image.lower_bound();
                let upper = self.image.upper_bound();
                for j in 0..D {
                    if tile.upper_bound()[j] < upper[j] {
                        position[j] = tile.upper_bound()[j] + 1;
                        for k in j + 1..D {
                            position[k] = tile.lower_bound()[k];
                        }
                        self.tile = self.image.find_sub_domain(position);
                        return;
                    }
                    position[j] = lower[j];
                }
                self.position = None;
                return;
            }

            // Carry within the tile.
            for j in 0..=axis {
                position[j] = tile.lower_bound()[j];
            }
        }
    }
}

impl<'a, F, R, W, const D: usize> Iterator for TiledIter<'a, F, R, W, D>
where
    F: ImageFactory<D>,
    R: ReadPolicy<F::Output, D>,
    W: WritePolicy<F, D>,
{
    type Item = Point<D>;

    fn next(&mut self) -> Option<Point<D>> {
        let current = self.position?;
        self.advance();
        Some(current)
    }
}

impl<F, R, W, const D: usize> PartialEq for TiledIter<'_, F, R, W, D> {
    fn eq(&self, other: &Self) -> bool {
        self.position == other.position
    }
}

impl<F, R, W, const D: usize> Clone for TiledIter<'_, F, R, W, D> {
    fn clone(&self) -> Self {
        Self {
            image: self.image,
            position: self.position,
            tile: self.tile,
        }
    }
}

/// `(point, value)` pairs in tile-major order.
pub struct TiledValues<'a, F, R, W, const D: usize> {
    cursor: TiledIter<'a, F, R, W, D>,
}

impl<'a, F, R, W, const D: usize> TiledValues<'a, F, R, W, D> {
    pub(super) fn new(cursor: TiledIter<'a, F, R, W, D>) -> Self {
        Self { cursor }
    }
}

impl<'a, F, R, W, const D: usize> Iterator for TiledValues<'a, F, R, W, D>
where
    F: ImageFactory<D>,
    R: ReadPolicy<F::Output, D>,
    W: WritePolicy<F, D>,
{
    type Item = Result<(Point<D>, TileValue<F, D>), TileError>;

    fn next(&mut self) -> Option<Self::Item> {
        let point = *self.cursor.position()?;
        let value = self.cursor.value()?;
        self.cursor.advance();
        Some(value.map(|v| (point, v)))
    }
}
