//! N-dimensional integer points.
//!
//! Axis 0 is the fastest-varying axis everywhere in this crate: linear
//! storage, domain iteration and tiled traversal all advance it first.

use std::fmt;
use std::ops::{Add, AddAssign, Index, IndexMut, Sub, SubAssign};

use serde::ser::{Serialize, Serializer};

/// Integer type used for every coordinate component.
pub type Coord = i64;

/// Norm selector for [`Point::norm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormKind {
    /// Sum of absolute components
    L1,
    /// Euclidean length
    L2,
    /// Largest absolute component
    Linf,
}

/// A point (or vector) in `D`-dimensional integer space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point<const D: usize>([Coord; D]);

impl<const D: usize> Point<D> {
    /// Create a point from its components.
    pub const fn new(components: [Coord; D]) -> Self {
        Self(components)
    }

    /// The origin.
    pub const fn zero() -> Self {
        Self([0; D])
    }

    /// A point with every component equal to `value`.
    pub const fn diagonal(value: Coord) -> Self {
        Self([value; D])
    }

    /// Build a point from a slice, returning `None` on a length mismatch.
    pub fn from_slice(components: &[Coord]) -> Option<Self> {
        let array: [Coord; D] = components.try_into().ok()?;
        Some(Self(array))
    }

    /// Number of axes.
    pub const fn dimension(&self) -> usize {
        D
    }

    /// Borrow the components.
    pub fn as_array(&self) -> &[Coord; D] {
        &self.0
    }

    /// Iterate over the components, axis 0 first.
    pub fn iter(&self) -> impl Iterator<Item = Coord> + '_ {
        self.0.iter().copied()
    }

    /// Componentwise minimum.
    pub fn inf(&self, other: &Self) -> Self {
        let mut out = *self;
        for axis in 0..D {
            out.0[axis] = out.0[axis].min(other.0[axis]);
        }
        out
    }

    /// Componentwise maximum.
    pub fn sup(&self, other: &Self) -> Self {
        let mut out = *self;
        for axis in 0..D {
            out.0[axis] = out.0[axis].max(other.0[axis]);
        }
        out
    }

    /// `true` if every component is `<=` the matching component of `other`.
    pub fn is_lower(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a <= b)
    }

    /// `true` if every component is `>=` the matching component of `other`.
    pub fn is_upper(&self, other: &Self) -> bool {
        self.0.iter().zip(other.0.iter()).all(|(a, b)| a >= b)
    }

    /// Norm of the point seen as a vector.
    pub fn norm(&self, kind: NormKind) -> f64 {
        match kind {
            NormKind::L1 => self.0.iter().map(|c| c.unsigned_abs() as f64).sum(),
            NormKind::L2 => self
                .0
                .iter()
                .map(|&c| (c as f64) * (c as f64))
                .sum::<f64>()
                .sqrt(),
            NormKind::Linf => self
                .0
                .iter()
                .map(|c| c.unsigned_abs())
                .max()
                .unwrap_or(0) as f64,
        }
    }
}

impl<const D: usize> Default for Point<D> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const D: usize> From<[Coord; D]> for Point<D> {
    fn from(components: [Coord; D]) -> Self {
        Self(components)
    }
}

impl<const D: usize> Index<usize> for Point<D> {
    type Output = Coord;

    fn index(&self, axis: usize) -> &Coord {
        &self.0[axis]
    }
}

impl<const D: usize> IndexMut<usize> for Point<D> {
    fn index_mut(&mut self, axis: usize) -> &mut Coord {
        &mut self.0[axis]
    }
}

impl<const D: usize> AddAssign for Point<D> {
    fn add_assign(&mut self, rhs: Self) {
        for axis in 0..D {
            self.0[axis] += rhs.0[axis];
        }
    }
}

impl<const D: usize> SubAssign for Point<D> {
    fn sub_assign(&mut self, rhs: Self) {
        for axis in 0..D {
            self.0[axis] -= rhs.0[axis];
        }
    }
}

impl<const D: usize> Add for Point<D> {
    type Output = Self;

    fn add(mut self, rhs: Self) -> Self {
        self += rhs;
        self
    }
}

impl<const D: usize> Sub for Point<D> {
    type Output = Self;

    fn sub(mut self, rhs: Self) -> Self {
        self -= rhs;
        self
    }
}

impl<const D: usize> fmt::Display for Point<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (axis, c) in self.0.iter().enumerate() {
            if axis > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, ")")
    }
}

// serde only derives arrays up to a fixed length, so serialize as a sequence.
impl<const D: usize> Serialize for Point<D> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.0.iter())
    }
}
