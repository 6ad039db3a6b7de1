use tracing::trace;

use crate::error::FactoryError;
use crate::geometry::Domain;
use crate::image::{DenseImage, Image};

use super::{check_sub_domain, ImageFactory};

/// Factory whose ground truth is an in-memory image.
///
/// Each requested tile is an independent [`DenseImage`] copy; flushing
/// copies the tile's values back into the wrapped image.
#[derive(Debug, Clone)]
pub struct ImageFactoryFromImage<I> {
    image: I,
}

impl<I> ImageFactoryFromImage<I> {
    pub fn new(image: I) -> Self {
        Self { image }
    }

    /// The ground-truth image.
    pub fn image(&self) -> &I {
        &self.image
    }

    pub fn into_inner(self) -> I {
        self.image
    }
}

impl<I: Image<D>, const D: usize> ImageFactory<D> for ImageFactoryFromImage<I> {
    type Output = DenseImage<I::Value, D>;

    fn domain(&self) -> &Domain<D> {
        self.image.domain()
    }

    fn is_valid(&self) -> bool {
        self.image.is_valid()
    }

    fn request_image(&mut self, sub_domain: &Domain<D>) -> Result<Self::Output, FactoryError> {
        check_sub_domain(self.image.domain(), sub_domain)?;
        trace!(tile = %sub_domain, "copying tile from image");
        Ok(DenseImage::from_fn(*sub_domain, |p| self.image.get(p)))
    }

    fn flush_image(&mut self, tile: &Self::Output) -> Result<(), FactoryError> {
        check_sub_domain(self.image.domain(), tile.domain())?;
        trace!(tile = %tile.domain(), "flushing tile to image");
        for (point, value) in tile.domain().points().zip(tile.as_slice()) {
            self.image.set_value(&point, value.clone());
        }
        Ok(())
    }
}
