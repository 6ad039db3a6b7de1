//! Test utilities for integration tests.
//!
//! This module provides a tracking factory and helpers for building tiled
//! images over small, predictable content.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tiled_image::{
    shared, Coord, DenseImage, Domain, FactoryError, Image, ImageFactory, ImageFactoryFromImage,
    Point, Shared,
};

// =============================================================================
// Tracking Factory
// =============================================================================

/// Counters shared between a [`TrackingFactory`] and the test observing it.
#[derive(Debug, Default)]
pub struct FactoryCounters {
    pub requests: AtomicUsize,
    pub flushes: AtomicUsize,
    pub detaches: AtomicUsize,
}

impl FactoryCounters {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn flushes(&self) -> usize {
        self.flushes.load(Ordering::SeqCst)
    }

    pub fn detaches(&self) -> usize {
        self.detaches.load(Ordering::SeqCst)
    }
}

/// An in-memory factory that counts every request, flush and detach.
///
/// This is useful for verifying which tiles the cache fetches and when
/// writes reach the ground truth.
pub struct TrackingFactory<const D: usize> {
    inner: ImageFactoryFromImage<DenseImage<i64, D>>,
    counters: Arc<FactoryCounters>,
    requested: Vec<Domain<D>>,
}

impl<const D: usize> TrackingFactory<D> {
    pub fn new(image: DenseImage<i64, D>) -> Self {
        Self {
            inner: ImageFactoryFromImage::new(image),
            counters: Arc::new(FactoryCounters::default()),
            requested: Vec::new(),
        }
    }

    pub fn counters(&self) -> Arc<FactoryCounters> {
        Arc::clone(&self.counters)
    }

    /// Sub-domains requested so far, in order.
    pub fn requested(&self) -> &[Domain<D>] {
        &self.requested
    }

    /// Value currently held by the ground truth.
    pub fn stored(&self, point: &Point<D>) -> i64 {
        self.inner.image().get(point)
    }
}

impl<const D: usize> ImageFactory<D> for TrackingFactory<D> {
    type Output = DenseImage<i64, D>;

    fn domain(&self) -> &Domain<D> {
        ImageFactory::<D>::domain(&self.inner)
    }

    fn request_image(&mut self, sub_domain: &Domain<D>) -> Result<Self::Output, FactoryError> {
        self.counters.requests.fetch_add(1, Ordering::SeqCst);
        self.requested.push(*sub_domain);
        ImageFactory::<D>::request_image(&mut self.inner, sub_domain)
    }

    fn flush_image(&mut self, image: &Self::Output) -> Result<(), FactoryError> {
        self.counters.flushes.fetch_add(1, Ordering::SeqCst);
        ImageFactory::<D>::flush_image(&mut self.inner, image)
    }

    fn detach_image(&mut self, image: Self::Output) {
        self.counters.detaches.fetch_add(1, Ordering::SeqCst);
        ImageFactory::<D>::detach_image(&mut self.inner, image);
    }
}

// =============================================================================
// Content Helpers
// =============================================================================

/// Domain with the given bounds; panics on inverted bounds.
pub fn domain<const D: usize>(lower: [Coord; D], upper: [Coord; D]) -> Domain<D> {
    Domain::new(Point::new(lower), Point::new(upper)).unwrap()
}

/// Image whose value at each point is its linear index in `domain`.
pub fn indexed_image<const D: usize>(domain: Domain<D>) -> DenseImage<i64, D> {
    DenseImage::from_fn(domain, |p| domain.linear_index(p) as i64)
}

/// Tracking factory over [`indexed_image`], already wrapped for sharing.
pub fn tracking_factory<const D: usize>(
    domain: Domain<D>,
) -> (Shared<TrackingFactory<D>>, Arc<FactoryCounters>) {
    let factory = TrackingFactory::new(indexed_image(domain));
    let counters = factory.counters();
    (shared(factory), counters)
}
