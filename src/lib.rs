//! # Tiled Image
//!
//! Out-of-core access to large n-dimensional images through a bounded cache
//! of tiles.
//!
//! An image too large for memory is described by an [`ImageFactory`] that
//! can materialize any rectangular sub-domain on request and write one back.
//! A [`TiledImage`] cuts the factory's domain into a regular grid of tiles
//! and answers point reads and writes from whichever tiles are resident,
//! fetching a tile on a miss.
//!
//! ## Features
//!
//! - **Pluggable residency**: keep the last tile, a FIFO window, or an LRU set
//! - **Pluggable commits**: write-through or write-back to the factory
//! - **Tile-major iteration**: visit every point while loading each tile once
//! - **Shared caches**: images built over one read policy share resident tiles
//!
//! ## Architecture
//!
//! - [`geometry`] - Points and axis-aligned domains
//! - [`image`] - The dense image abstraction tiles are made of
//! - [`factory`] - Tile sources: in-memory images and raw files
//! - [`tile`] - Tile cache, read policies and write policies
//! - [`tiled`] - The tiled image facade and its iterator
//! - [`timing`] - Optional instrumentation
//! - [`report`] - Serializable command reports
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```
//! use tiled_image::{shared, DenseImage, Domain, ImageFactoryFromImage, LruPolicy, Point};
//! use tiled_image::{TiledImage, WriteBack};
//!
//! let domain = Domain::new(Point::new([0, 0]), Point::new([99, 99])).unwrap();
//! let factory = shared(ImageFactoryFromImage::new(DenseImage::new(domain, 0u16)));
//!
//! let tiled = TiledImage::new(
//!     factory.clone(),
//!     shared(LruPolicy::new(4)),
//!     shared(WriteBack::new()),
//!     10,
//! )
//! .unwrap();
//!
//! tiled.set_value(&Point::new([42, 7]), 9).unwrap();
//! assert_eq!(tiled.get(&Point::new([42, 7])).unwrap(), 9);
//!
//! let sum: u64 = tiled.values().map(|v| v.unwrap().1 as u64).sum();
//! assert_eq!(sum, 9);
//! ```

use std::sync::Arc;

use parking_lot::Mutex;

pub mod config;
pub mod error;
pub mod factory;
pub mod geometry;
pub mod image;
pub mod report;
pub mod tile;
pub mod tiled;
pub mod timing;

/// Handle to a collaborator shared between caches and images.
pub type Shared<T> = Arc<Mutex<T>>;

/// Wrap `value` in a [`Shared`] handle.
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(Mutex::new(value))
}

// Re-export commonly used types
pub use config::{
    Cli, Command, FillConfig, ImageArgs, ProbeConfig, ReadPolicyChoice, SampleType, ScanConfig,
    WritePolicyChoice,
};
pub use error::{DomainError, FactoryError, TileError, TilingError};
pub use factory::{ImageFactory, ImageFactoryFromImage, RawFileImageFactory, Sample, TileValue};
pub use geometry::{Coord, Domain, NormKind, Point};
pub use image::{DenseImage, Image};
pub use report::{FillReport, ProbeReport, Report, ScanReport};
pub use tile::{
    AnyReadPolicy, AnyWritePolicy, CacheStats, FifoPolicy, LastTilePolicy, LruPolicy, Page,
    ReadPolicy, TileCache, WriteBack, WritePolicy, WriteThrough, DEFAULT_CACHE_TILES,
};
pub use tiled::{TiledImage, TiledIter, TiledValues};
pub use timing::{Stopwatch, Timings};
