//! Tiled image facade.
//!
//! [`TiledImage`] partitions a factory's domain into `n` tiles per axis and
//! serves point reads and writes through a [`TileCache`](crate::tile::TileCache).
//! [`TiledIter`] walks the domain tile by tile so that a bounded cache sees
//! each tile exactly once per pass.

mod image;
mod iter;

pub use image::TiledImage;
pub use iter::{TiledIter, TiledValues};
