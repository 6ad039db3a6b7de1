use std::fmt;

use tracing::debug;

use crate::error::{TileError, TilingError};
use crate::factory::{ImageFactory, TileValue};
use crate::geometry::{Coord, Domain, Point};
use crate::tile::{CacheStats, ReadPolicy, TileCache, WritePolicy};
use crate::timing::{micros, Stopwatch, Timings};
use crate::Shared;

use super::iter::{TiledIter, TiledValues};

/// A large image seen through a bounded cache of tiles.
///
/// The full domain is cut into `n` tiles per axis. Tile width on each axis
/// is `floor(extent / n)`; the last tile on an axis absorbs the remainder
/// and always ends on the domain's upper bound.
///
/// # Shared Collaborators
///
/// The factory and both policies are shared handles, not owned. Two tiled
/// images built over the same read policy see one resident tile set: a tile
/// loaded through one is a hit for the other. The cache wrapper itself
/// (miss counters, timings) belongs to this image alone.
///
/// # Example
///
/// ```
/// use tiled_image::factory::ImageFactoryFromImage;
/// use tiled_image::geometry::{Domain, Point};
/// use tiled_image::image::DenseImage;
/// use tiled_image::shared;
/// use tiled_image::tile::{LruPolicy, WriteBack};
/// use tiled_image::tiled::TiledImage;
///
/// let domain = Domain::new(Point::new([0, 0]), Point::new([9, 9])).unwrap();
/// let image = DenseImage::from_fn(domain, |p| p[0] + 10 * p[1]);
///
/// let tiled = TiledImage::new(
///     shared(ImageFactoryFromImage::new(image)),
///     shared(LruPolicy::new(4)),
///     shared(WriteBack::new()),
///     3,
/// )
/// .unwrap();
///
/// assert_eq!(tiled.get(&Point::new([9, 9])).unwrap(), 99);
/// assert_eq!(tiled.cache_miss_read(), 1);
///
/// let tile = tiled.find_sub_domain(&Point::new([9, 9]));
/// assert_eq!(*tile.lower_bound(), Point::new([6, 6]));
/// ```
pub struct TiledImage<F, R, W, const D: usize> {
    factory: Shared<F>,
    cache: TileCache<F, R, W, D>,

    domain: Domain<D>,
    tiles: Coord,
    tile_size: Point<D>,

    update_timer: Stopwatch,
    find_timer: Stopwatch,
    read_timer: Stopwatch,
}

impl<F, R, W, const D: usize> TiledImage<F, R, W, D>
where
    F: ImageFactory<D>,
    R: ReadPolicy<F::Output, D>,
    W: WritePolicy<F, D>,
{
    /// Tile the factory's domain into `tiles` tiles per axis.
    ///
    /// # Errors
    ///
    /// Fails if the factory is invalid, `tiles < 1`, or `tiles` exceeds the
    /// extent on some axis (which would produce empty tiles).
    pub fn new(
        factory: Shared<F>,
        read_policy: Shared<R>,
        write_policy: Shared<W>,
        tiles: Coord,
    ) -> Result<Self, TilingError> {
        let (domain, valid) = {
            let factory = factory.lock();
            (*factory.domain(), factory.is_valid())
        };
        if !valid {
            return Err(TilingError::InvalidFactory);
        }
        if tiles < 1 {
            return Err(TilingError::InvalidTileCount(tiles));
        }

        let extent = domain.extent();
        let mut tile_size = Point::zero();
        for axis in 0..D {
            tile_size[axis] = extent[axis] / tiles;
            if tile_size[axis] == 0 {
                return Err(TilingError::DegenerateTile {
                    axis,
                    extent: extent[axis],
                    tiles,
                });
            }
        }

        debug!(%domain, tiles, %tile_size, "tiled image created");
        Ok(Self {
            cache: TileCache::new(factory.clone(), read_policy, write_policy),
            factory,
            domain,
            tiles,
            tile_size,
            update_timer: Stopwatch::default(),
            find_timer: Stopwatch::default(),
            read_timer: Stopwatch::default(),
        })
    }

    /// Enable or disable timing of the update, find and read paths.
    pub fn with_timings(mut self, enabled: bool) -> Self {
        self.update_timer.set_enabled(enabled);
        self.find_timer.set_enabled(enabled);
        self.read_timer.set_enabled(enabled);
        self.cache.set_timing(enabled);
        self
    }

    // -------------------------------------------------------------------------
    // Geometry
    // -------------------------------------------------------------------------

    /// Full domain, copied from the factory at construction.
    pub fn domain(&self) -> &Domain<D> {
        &self.domain
    }

    pub fn lower_bound(&self) -> &Point<D> {
        self.domain.lower_bound()
    }

    pub fn upper_bound(&self) -> &Point<D> {
        self.domain.upper_bound()
    }

    /// Number of tiles along each axis.
    pub fn tiles_per_axis(&self) -> Coord {
        self.tiles
    }

    /// Width of a regular (non-final) tile on each axis.
    pub fn tile_size(&self) -> &Point<D> {
        &self.tile_size
    }

    /// Total number of tiles in the partition.
    pub fn tile_count(&self) -> u64 {
        (self.tiles as u64).pow(D as u32)
    }

    /// The tile containing `point`.
    ///
    /// Pure: no cache access. `point` must lie inside the domain; this is
    /// checked in debug builds only.
    pub fn find_sub_domain(&self, point: &Point<D>) -> Domain<D> {
        debug_assert!(
            self.domain.is_inside(point),
            "{} outside {}",
            point,
            self.domain
        );

        let lower = self.domain.lower_bound();
        let upper = self.domain.upper_bound();
        let last = self.tiles - 1;

        let mut tile_lower = Point::zero();
        let mut tile_upper = Point::zero();
        for axis in 0..D {
            let index = ((point[axis] - lower[axis]) / self.tile_size[axis]).min(last);
            tile_lower[axis] = index * self.tile_size[axis] + lower[axis];
            tile_upper[axis] = if index == last {
                upper[axis]
            } else {
                (tile_lower[axis] + self.tile_size[axis] - 1).min(upper[axis])
            };
        }
        Domain::from_bounds_unchecked(tile_lower, tile_upper)
    }

    // -------------------------------------------------------------------------
    // Access
    // -------------------------------------------------------------------------

    /// Value at `point`, loading its tile on a miss.
    pub fn get(&self, point: &Point<D>) -> Result<TileValue<F, D>, TileError> {
        debug_assert!(
            self.domain.is_inside(point),
            "{} outside {}",
            point,
            self.domain
        );

        if let Some(value) = self.read_timer.time(|| self.cache.read(point)) {
            return Ok(value);
        }

        self.cache.inc_cache_miss_read();
        let tile = self.find_timer.time(|| self.find_sub_domain(point));
        debug!(%point, %tile, "read miss");
        self.update_timer.time(|| self.cache.update(&tile))?;

        self.read_timer
            .time(|| self.cache.read(point))
            .ok_or_else(|| TileError::NotResident {
                point: point.to_string(),
                tile: tile.to_string(),
            })
    }

    /// Overwrite the value at `point`, loading its tile on a miss.
    pub fn set_value(&self, point: &Point<D>, value: TileValue<F, D>) -> Result<(), TileError> {
        debug_assert!(
            self.domain.is_inside(point),
            "{} outside {}",
            point,
            self.domain
        );

        if self.cache.write(point, value.clone())? {
            return Ok(());
        }

        self.cache.inc_cache_miss_write();
        let tile = self.find_timer.time(|| self.find_sub_domain(point));
        debug!(%point, %tile, "write miss");
        self.update_timer.time(|| self.cache.update(&tile))?;

        if self.cache.write(point, value)? {
            Ok(())
        } else {
            Err(TileError::NotResident {
                point: point.to_string(),
                tile: tile.to_string(),
            })
        }
    }

    // -------------------------------------------------------------------------
    // Iteration
    // -------------------------------------------------------------------------

    /// Cursor on the first point of the first tile.
    pub fn begin(&self) -> TiledIter<'_, F, R, W, D> {
        TiledIter::new(self, Some(*self.domain.lower_bound()))
    }

    /// The past-the-end cursor.
    pub fn end(&self) -> TiledIter<'_, F, R, W, D> {
        TiledIter::new(self, None)
    }

    /// Every point of the domain, tile by tile.
    pub fn points(&self) -> TiledIter<'_, F, R, W, D> {
        self.begin()
    }

    /// Every `(point, value)` pair, tile by tile. Values are read lazily
    /// through [`get`](Self::get).
    pub fn values(&self) -> TiledValues<'_, F, R, W, D> {
        TiledValues::new(self.begin())
    }

    // -------------------------------------------------------------------------
    // Cache
    // -------------------------------------------------------------------------

    pub fn cache_miss_read(&self) -> u64 {
        self.cache.cache_miss_read()
    }

    pub fn cache_miss_write(&self) -> u64 {
        self.cache.cache_miss_write()
    }

    pub fn reset_cache_misses(&self) {
        self.cache.reset_cache_misses();
    }

    /// Tiles currently resident in the read policy, shared or not.
    pub fn resident_tiles(&self) -> usize {
        self.cache.resident_tiles()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Flush pending writes to the factory, keeping tiles resident.
    pub fn flush(&self) -> Result<(), TileError> {
        self.cache.flush()
    }

    /// Flush pending writes and detach every resident tile.
    pub fn clear_cache(&self) -> Result<(), TileError> {
        self.cache.clear()
    }

    /// The shared factory handle.
    pub fn factory(&self) -> &Shared<F> {
        &self.factory
    }

    /// Factory and cache are both consistent.
    pub fn is_valid(&self) -> bool {
        let factory_valid = self.factory.lock().is_valid();
        factory_valid && self.cache.is_valid()
    }

    // -------------------------------------------------------------------------
    // Instrumentation
    // -------------------------------------------------------------------------

    pub fn timings(&self) -> Timings {
        Timings {
            update_us: micros(self.update_timer.elapsed()),
            find_sub_domain_us: micros(self.find_timer.elapsed()),
            read_us: micros(self.read_timer.elapsed()),
            update_cache_us: micros(self.cache.update_timer().elapsed()),
        }
    }

    pub fn clear_timings(&self) {
        self.update_timer.reset();
        self.find_timer.reset();
        self.read_timer.reset();
        self.cache.update_timer().reset();
    }
}

impl<F, R, W, const D: usize> fmt::Display for TiledImage<F, R, W, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[TiledImage] {} tiles={}^{} tile size={}",
            self.domain, self.tiles, D, self.tile_size
        )
    }
}
