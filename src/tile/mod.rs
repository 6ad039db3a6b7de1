//! Tile cache layer.
//!
//! This module provides the bounded tile store behind a tiled image and the
//! strategies that drive it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │               TiledImage                │
//! └────────────────────┬────────────────────┘
//!                      │ read / write / update
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │               TileCache                 │
//! │  ┌──────────────┐  ┌─────────────────┐  │
//! │  │ ReadPolicy   │  │  WritePolicy    │  │
//! │  │ (resident    │  │  (through /     │  │
//! │  │  tiles)      │  │   back)         │  │
//! │  └──────────────┘  └─────────────────┘  │
//! └────────────────────┬────────────────────┘
//!                      │ request / flush / detach
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │              ImageFactory               │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`TileCache`]: miss accounting and the update/flush mechanics
//! - [`ReadPolicy`]: which tiles stay resident ([`LastTilePolicy`],
//!   [`FifoPolicy`], [`LruPolicy`])
//! - [`Page`]: a resident tile and its dirty bit
//! - [`WritePolicy`]: when writes reach the factory ([`WriteThrough`],
//!   [`WriteBack`])
//!
//! # Example
//!
//! ```
//! use tiled_image::factory::ImageFactoryFromImage;
//! use tiled_image::geometry::{Domain, Point};
//! use tiled_image::image::DenseImage;
//! use tiled_image::shared;
//! use tiled_image::tile::{LruPolicy, TileCache, WriteThrough};
//!
//! let domain = Domain::new(Point::new([0, 0]), Point::new([63, 63])).unwrap();
//! let factory = shared(ImageFactoryFromImage::new(DenseImage::new(domain, 1u8)));
//! let cache: TileCache<_, _, _, 2> = TileCache::new(
//!     factory,
//!     shared(LruPolicy::new(4)),
//!     shared(WriteThrough::new()),
//! );
//!
//! let point = Point::new([3, 3]);
//! assert_eq!(cache.read(&point), None);
//!
//! let tile = Domain::new(Point::new([0, 0]), Point::new([15, 15])).unwrap();
//! cache.update(&tile).unwrap();
//! assert_eq!(cache.read(&point), Some(1));
//! ```

mod cache;
mod page;
mod read_policy;
mod write_policy;

pub use cache::{CacheStats, TileCache};
pub use page::Page;
pub use read_policy::{
    AnyReadPolicy, FifoPolicy, LastTilePolicy, LruPolicy, ReadPolicy, DEFAULT_CACHE_TILES,
};
pub use write_policy::{AnyWritePolicy, WritePolicy, WriteBack, WriteThrough};
