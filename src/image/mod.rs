//! Image container abstraction.
//!
//! Tiles handed out by factories and the full in-memory images behind
//! [`ImageFactoryFromImage`](crate::factory::ImageFactoryFromImage) both
//! implement [`Image`].

mod dense;

pub use dense::DenseImage;

use crate::geometry::{Domain, Point};

/// A value-per-point container over a fixed [`Domain`].
///
/// `get` and `set_value` require the point to lie inside `domain()`.
pub trait Image<const D: usize> {
    /// Pixel value type.
    type Value: Clone;

    /// Domain covered by this image.
    fn domain(&self) -> &Domain<D>;

    /// Value at `point`.
    fn get(&self, point: &Point<D>) -> Self::Value;

    /// Overwrite the value at `point`.
    fn set_value(&mut self, point: &Point<D>, value: Self::Value);

    /// Number of points along each axis.
    fn extent(&self) -> Point<D> {
        self.domain().extent()
    }

    /// Consistency check, used by assertions only.
    fn is_valid(&self) -> bool {
        true
    }
}
