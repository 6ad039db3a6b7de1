//! Integer geometry: points and the boxes that bound images and tiles.

mod domain;
mod point;

pub use domain::{Domain, DomainPoints};
pub use point::{Coord, NormKind, Point};
