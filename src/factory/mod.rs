//! Tile factories.
//!
//! A factory owns the ground truth of a large image and materializes
//! independent copies of sub-domains ("tiles") on request. Modified tiles
//! are written back with [`ImageFactory::flush_image`].
//!
//! # Implementations
//!
//! - [`ImageFactoryFromImage`]: ground truth is an in-memory [`Image`]
//! - [`RawFileImageFactory`]: ground truth is a raw little-endian sample
//!   file on disk, read and written row by row so that only the requested
//!   tiles are ever held in memory

mod from_image;
mod raw_file;
mod sample;

pub use from_image::ImageFactoryFromImage;
pub use raw_file::RawFileImageFactory;
pub use sample::Sample;

use crate::error::FactoryError;
use crate::geometry::Domain;
use crate::image::Image;

/// Producer of tiles for sub-domains of a fixed full domain.
pub trait ImageFactory<const D: usize> {
    /// Tile type handed out by this factory.
    type Output: Image<D>;

    /// Full logical domain. Fixed for the factory's lifetime.
    fn domain(&self) -> &Domain<D>;

    /// Consistency check, used by assertions only.
    fn is_valid(&self) -> bool {
        true
    }

    /// Materialize a tile covering exactly `sub_domain`.
    fn request_image(&mut self, sub_domain: &Domain<D>) -> Result<Self::Output, FactoryError>;

    /// Write the content of `image` back to the ground truth.
    fn flush_image(&mut self, image: &Self::Output) -> Result<(), FactoryError>;

    /// Release a tile that left the cache.
    fn detach_image(&mut self, image: Self::Output) {
        drop(image);
    }
}

/// Pixel value type of the tiles produced by factory `F`.
pub type TileValue<F, const D: usize> = <<F as ImageFactory<D>>::Output as Image<D>>::Value;

/// Reject sub-domains that are not fully inside the factory domain.
pub(crate) fn check_sub_domain<const D: usize>(
    domain: &Domain<D>,
    sub_domain: &Domain<D>,
) -> Result<(), FactoryError> {
    if domain.contains_domain(sub_domain) {
        Ok(())
    } else {
        Err(FactoryError::OutsideDomain {
            requested: sub_domain.to_string(),
            domain: domain.to_string(),
        })
    }
}
