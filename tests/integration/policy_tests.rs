//! Shared policy integration tests.
//!
//! Tests verify:
//! - Two tiled images over one read policy see one resident tile set
//! - Miss counters stay per image
//! - Dirty state belongs to each resident copy, even under a shared write
//!   policy

use tiled_image::{
    shared, AnyReadPolicy, DenseImage, FifoPolicy, LastTilePolicy, LruPolicy, Point, ReadPolicy,
    TiledImage, WriteBack, WriteThrough,
};

use super::test_utils::{domain, tracking_factory};

#[test]
fn test_shared_read_policy_aliases_tiles() {
    let full = domain([0, 0], [9, 9]);
    let (factory, counters) = tracking_factory(full);
    let read_policy = shared(LruPolicy::new(4));
    let write_policy = shared(WriteThrough::new());

    let a = TiledImage::new(factory.clone(), read_policy.clone(), write_policy.clone(), 3).unwrap();
    let b = TiledImage::new(factory.clone(), read_policy.clone(), write_policy, 3).unwrap();

    let p = Point::new([4, 4]);
    assert_eq!(a.get(&p).unwrap(), 44);
    assert_eq!(a.cache_miss_read(), 1);

    // The tile loaded through `a` is a hit for `b`.
    assert_eq!(b.get(&p).unwrap(), 44);
    assert_eq!(b.cache_miss_read(), 0);
    assert_eq!(counters.requests(), 1);

    // Both see the same resident set.
    assert_eq!(a.cache_stats().resident_tiles, 1);
    assert_eq!(b.cache_stats().resident_tiles, 1);
    assert_eq!(read_policy.lock().len(), 1);
}

#[test]
fn test_shared_read_policy_sees_writes() {
    let full = domain([0, 0], [9, 9]);
    let (factory, _) = tracking_factory(full);
    let read_policy = shared(FifoPolicy::new(2));
    let write_policy = shared(WriteBack::new());

    let a = TiledImage::new(factory.clone(), read_policy.clone(), write_policy.clone(), 2).unwrap();
    let b = TiledImage::new(factory.clone(), read_policy, write_policy, 2).unwrap();

    let p = Point::new([7, 2]);
    a.set_value(&p, -1).unwrap();

    // Not flushed yet, but resident in the shared policy.
    assert_eq!(factory.lock().stored(&p), 27);
    assert_eq!(b.get(&p).unwrap(), -1);
    assert_eq!(b.cache_miss_read(), 0);

    // Flushing through either image commits the shared dirty tile.
    b.flush().unwrap();
    assert_eq!(factory.lock().stored(&p), -1);
}

#[test]
fn test_shared_write_back_flushes_on_eviction_by_other_image() {
    let full = domain([0, 0], [9, 9]);
    let (factory, counters) = tracking_factory(full);
    let read_policy = shared(LastTilePolicy::new());
    let write_policy = shared(WriteBack::new());

    let a = TiledImage::new(factory.clone(), read_policy.clone(), write_policy.clone(), 2).unwrap();
    let b = TiledImage::new(factory.clone(), read_policy, write_policy, 2).unwrap();

    a.set_value(&Point::new([0, 0]), 123).unwrap();
    assert_eq!(b.cache_stats().dirty_tiles, 1);

    // `b` loads another tile, evicting the dirty one written through `a`.
    b.get(&Point::new([9, 9])).unwrap();
    assert_eq!(counters.flushes(), 1);
    assert_eq!(a.cache_stats().dirty_tiles, 0);
    assert_eq!(factory.lock().stored(&Point::new([0, 0])), 123);

    assert_eq!(a.cache_miss_write(), 1);
    assert_eq!(b.cache_miss_read(), 1);
}

#[test]
fn test_separate_policies_do_not_alias() {
    let full = domain([0, 0], [9, 9]);
    let (factory, counters) = tracking_factory(full);

    let a = TiledImage::new(
        factory.clone(),
        shared(LruPolicy::<DenseImage<i64, 2>, 2>::new(4)),
        shared(WriteThrough::new()),
        3,
    )
    .unwrap();
    let b = TiledImage::new(
        factory,
        shared(LruPolicy::<DenseImage<i64, 2>, 2>::new(4)),
        shared(WriteThrough::new()),
        3,
    )
    .unwrap();

    let p = Point::new([1, 1]);
    a.get(&p).unwrap();
    b.get(&p).unwrap();
    assert_eq!(a.cache_miss_read(), 1);
    assert_eq!(b.cache_miss_read(), 1);
    assert_eq!(counters.requests(), 2);

    // A write-through on one is visible to the other after it reloads.
    a.set_value(&p, 5).unwrap();
    b.clear_cache().unwrap();
    assert_eq!(b.get(&p).unwrap(), 5);
}

#[test]
fn test_runtime_selected_policy() {
    let full = domain([0, 0], [9, 9]);
    let (factory, _) = tracking_factory(full);
    let read_policy = shared(AnyReadPolicy::Fifo(FifoPolicy::new(3)));

    let tiled = TiledImage::new(factory, read_policy.clone(), shared(WriteThrough::new()), 3).unwrap();
    for p in full.points() {
        tiled.get(&p).unwrap();
    }

    assert_eq!(read_policy.lock().capacity(), 3);
    assert_eq!(read_policy.lock().len(), 3);
    assert!(tiled.is_valid());
}

#[test]
fn test_shared_write_back_keeps_dirty_state_per_copy() {
    let full = domain([0, 0], [9, 9]);
    let (factory, counters) = tracking_factory(full);
    let write_policy = shared(WriteBack::new());

    let a = TiledImage::new(
        factory.clone(),
        shared(LastTilePolicy::new()),
        write_policy.clone(),
        2,
    )
    .unwrap();
    let b = TiledImage::new(factory.clone(), shared(LastTilePolicy::new()), write_policy, 2).unwrap();

    let p = Point::new([0, 0]);
    a.set_value(&p, 123).unwrap();

    // `b` holds its own clean copy of the same tile and evicts it.
    assert_eq!(b.get(&p).unwrap(), 0);
    b.get(&Point::new([9, 9])).unwrap();
    assert_eq!(counters.flushes(), 0);
    assert_eq!(factory.lock().stored(&p), 0);

    // The write made through `a` is still pending and reaches the factory.
    assert_eq!(a.cache_stats().dirty_tiles, 1);
    a.flush().unwrap();
    assert_eq!(factory.lock().stored(&p), 123);
    assert_eq!(counters.flushes(), 1);

    a.clear_cache().unwrap();
    assert_eq!(factory.lock().stored(&p), 123);
    assert_eq!(counters.flushes(), 1);
}
