use crate::geometry::{Domain, Point};

use super::Image;

/// Image stored as one contiguous vector, axis 0 fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseImage<V, const D: usize> {
    domain: Domain<D>,
    data: Vec<V>,
}

impl<V: Clone, const D: usize> DenseImage<V, D> {
    /// Create an image with every point set to `fill`.
    pub fn new(domain: Domain<D>, fill: V) -> Self {
        Self {
            data: vec![fill; domain.size() as usize],
            domain,
        }
    }

    /// Create an image whose values come from `f(point)`.
    pub fn from_fn(domain: Domain<D>, mut f: impl FnMut(&Point<D>) -> V) -> Self {
        Self {
            data: domain.points().map(|p| f(&p)).collect(),
            domain,
        }
    }

    /// Wrap existing samples. Returns `None` if `data` does not match the
    /// domain size.
    pub fn from_vec(domain: Domain<D>, data: Vec<V>) -> Option<Self> {
        (data.len() as u64 == domain.size()).then_some(Self { domain, data })
    }

    /// Samples in linear order.
    pub fn as_slice(&self) -> &[V] {
        &self.data
    }

    /// Mutable samples in linear order.
    pub fn as_mut_slice(&mut self) -> &mut [V] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<V> {
        self.data
    }
}

impl<V: Clone, const D: usize> Image<D> for DenseImage<V, D> {
    type Value = V;

    fn domain(&self) -> &Domain<D> {
        &self.domain
    }

    fn get(&self, point: &Point<D>) -> V {
        self.data[self.domain.linear_index(point)].clone()
    }

    fn set_value(&mut self, point: &Point<D>, value: V) {
        let index = self.domain.linear_index(point);
        self.data[index] = value;
    }

    fn is_valid(&self) -> bool {
        self.data.len() as u64 == self.domain.size()
    }
}
