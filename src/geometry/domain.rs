//! Closed axis-aligned boxes of integer points.

use std::fmt;

use serde::Serialize;

use super::point::{Coord, Point};
use crate::error::DomainError;

/// A closed box `[lower, upper]` in `D`-dimensional integer space.
///
/// Construction guarantees `lower[i] <= upper[i]` on every axis, so a
/// domain always holds at least one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Domain<const D: usize> {
    lower: Point<D>,
    upper: Point<D>,
}

impl<const D: usize> Domain<D> {
    /// Create a domain, rejecting inverted bounds.
    pub fn new(lower: Point<D>, upper: Point<D>) -> Result<Self, DomainError> {
        for axis in 0..D {
            if lower[axis] > upper[axis] {
                return Err(DomainError::InvertedBounds {
                    axis,
                    lower: lower[axis],
                    upper: upper[axis],
                });
            }
        }
        Ok(Self { lower, upper })
    }

    /// Domain `[lower, lower + extent - 1]`.
    pub fn from_extent(lower: Point<D>, extent: Point<D>) -> Result<Self, DomainError> {
        for axis in 0..D {
            if extent[axis] < 1 {
                return Err(DomainError::EmptyExtent {
                    axis,
                    extent: extent[axis],
                });
            }
        }
        Self::new(lower, lower + extent - Point::diagonal(1))
    }

    /// Domain from bounds the caller has already validated.
    pub(crate) fn from_bounds_unchecked(lower: Point<D>, upper: Point<D>) -> Self {
        debug_assert!(lower.is_lower(&upper), "inverted bounds {} .. {}", lower, upper);
        Self { lower, upper }
    }

    pub fn lower_bound(&self) -> &Point<D> {
        &self.lower
    }

    pub fn upper_bound(&self) -> &Point<D> {
        &self.upper
    }

    /// Per-axis range check.
    pub fn is_inside(&self, point: &Point<D>) -> bool {
        self.lower.is_lower(point) && point.is_lower(&self.upper)
    }

    /// `true` if `other` lies entirely within this domain.
    pub fn contains_domain(&self, other: &Domain<D>) -> bool {
        self.is_inside(&other.lower) && self.is_inside(&other.upper)
    }

    /// Number of points along each axis.
    pub fn extent(&self) -> Point<D> {
        self.upper - self.lower + Point::diagonal(1)
    }

    /// Total number of points.
    pub fn size(&self) -> u64 {
        self.extent().iter().map(|e| e as u64).product()
    }

    /// Offset of `point` in first-axis-fastest linear order.
    ///
    /// The caller must ensure `point` is inside the domain.
    pub fn linear_index(&self, point: &Point<D>) -> usize {
        debug_assert!(self.is_inside(point), "{} outside {}", point, self);
        let extent = self.extent();
        let mut index: Coord = 0;
        let mut stride: Coord = 1;
        for axis in 0..D {
            index += (point[axis] - self.lower[axis]) * stride;
            stride *= extent[axis];
        }
        index as usize
    }

    /// Iterate over every point, axis 0 fastest.
    pub fn points(&self) -> DomainPoints<D> {
        DomainPoints {
            domain: *self,
            next: Some(self.lower),
        }
    }
}

impl<const D: usize> fmt::Display for Domain<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Domain {} .. {}]", self.lower, self.upper)
    }
}

/// Row-major iterator over the points of a [`Domain`].
#[derive(Debug, Clone)]
pub struct DomainPoints<const D: usize> {
    domain: Domain<D>,
    next: Option<Point<D>>,
}

impl<const D: usize> Iterator for DomainPoints<D> {
    type Item = Point<D>;

    fn next(&mut self) -> Option<Point<D>> {
        let current = self.next?;
        let mut following = current;
        let mut advanced = false;
        for axis in 0..D {
            if following[axis] < self.domain.upper[axis] {
                following[axis] += 1;
                advanced = true;
                break;
            }
            following[axis] = self.domain.lower[axis];
        }
        self.next = advanced.then_some(following);
        Some(current)
    }
}
