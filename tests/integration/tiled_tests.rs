//! Tiled image integration tests.
//!
//! Tests verify:
//! - The tile partition covers the domain without overlap
//! - Tile-major iteration visits every point once, tile after tile
//! - Reads see earlier writes under every policy combination
//! - Misses, fetches and flushes happen exactly when expected

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use tiled_image::{
    shared, AnyReadPolicy, AnyWritePolicy, Coord, DenseImage, Domain, FifoPolicy,
    ImageFactoryFromImage, LastTilePolicy, LruPolicy, Point, TiledImage, WriteBack, WriteThrough,
};

use super::test_utils::{domain, indexed_image, tracking_factory};

type Tile2 = DenseImage<i64, 2>;

fn indexed_tiled(
    domain: Domain<2>,
    tiles: Coord,
) -> TiledImage<ImageFactoryFromImage<Tile2>, LruPolicy<Tile2, 2>, WriteBack, 2> {
    TiledImage::new(
        shared(ImageFactoryFromImage::new(indexed_image(domain))),
        shared(LruPolicy::new(4)),
        shared(WriteBack::new()),
        tiles,
    )
    .unwrap()
}

// =============================================================================
// Partition
// =============================================================================

#[test]
fn test_ten_by_ten_in_three_tiles() {
    let tiled = indexed_tiled(domain([0, 0], [9, 9]), 3);
    assert_eq!(*tiled.tile_size(), Point::new([3, 3]));

    // Widths along axis 0 are 3, 3 and 4.
    let widths: Vec<Coord> = [0, 3, 6]
        .iter()
        .map(|&x| tiled.find_sub_domain(&Point::new([x, 0])).extent()[0])
        .collect();
    assert_eq!(widths, vec![3, 3, 4]);

    assert_eq!(
        tiled.find_sub_domain(&Point::new([9, 9])),
        domain([6, 6], [9, 9])
    );
    assert_eq!(tiled.points().count(), 100);
}

#[test]
fn test_three_dimensional_partition() {
    let full = Domain::new(Point::new([0, 0, 0]), Point::new([6, 4, 9])).unwrap();
    let image = DenseImage::from_fn(full, |p| full.linear_index(p) as i64);
    let tiled = TiledImage::new(
        shared(ImageFactoryFromImage::new(image)),
        shared(FifoPolicy::new(3)),
        shared(WriteThrough::new()),
        2,
    )
    .unwrap();

    let tiles: HashSet<_> = full.points().map(|p| tiled.find_sub_domain(&p)).collect();
    assert_eq!(tiles.len(), 8);
    let covered: u64 = tiles.iter().map(|t| t.size()).sum();
    assert_eq!(covered, full.size());

    let last = tiled.find_sub_domain(&Point::new([6, 4, 9]));
    assert_eq!(*last.lower_bound(), Point::new([3, 2, 5]));
    assert_eq!(*last.upper_bound(), Point::new([6, 4, 9]));
}

fn tiling_strategy() -> impl Strategy<Value = (Coord, Coord, Coord, Coord, Coord)> {
    (-20i64..20, -20i64..20, 1i64..25, 1i64..25).prop_flat_map(|(x, y, ex, ey)| {
        (Just(x), Just(y), Just(ex), Just(ey), 1..=ex.min(ey))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_partition_covers_without_overlap((x, y, ex, ey, tiles) in tiling_strategy()) {
        let full = Domain::from_extent(Point::new([x, y]), Point::new([ex, ey])).unwrap();
        let tiled = indexed_tiled(full, tiles);

        let mut members: HashMap<Domain<2>, u64> = HashMap::new();
        for p in full.points() {
            let tile = tiled.find_sub_domain(&p);
            prop_assert!(tile.is_inside(&p), "{} not inside its tile {}", p, tile);
            prop_assert!(full.contains_domain(&tile), "{} escapes {}", tile, full);
            *members.entry(tile).or_default() += 1;
        }

        prop_assert_eq!(members.len() as u64, tiled.tile_count());
        for (tile, count) in &members {
            // Every point of a tile maps back to it: no overlap.
            prop_assert_eq!(*count, tile.size(), "tile {} shared with a neighbour", tile);
        }

        // Only the last tile on an axis may be wider than the regular size.
        for tile in members.keys() {
            for axis in 0..2 {
                let width = tile.extent()[axis];
                if tile.upper_bound()[axis] != full.upper_bound()[axis] {
                    prop_assert_eq!(width, tiled.tile_size()[axis]);
                } else {
                    prop_assert!(width >= tiled.tile_size()[axis]);
                }
            }
        }
    }

    #[test]
    fn test_iteration_is_tile_major((x, y, ex, ey, tiles) in tiling_strategy()) {
        let full = Domain::from_extent(Point::new([x, y]), Point::new([ex, ey])).unwrap();
        let tiled = indexed_tiled(full, tiles);

        let points: Vec<_> = tiled.points().collect();
        prop_assert_eq!(points.len() as u64, full.size());

        let unique: HashSet<_> = points.iter().copied().collect();
        prop_assert_eq!(unique.len(), points.len());

        let mut finished = HashSet::new();
        let mut current = None;
        for p in &points {
            let tile = tiled.find_sub_domain(p);
            if current != Some(tile) {
                if let Some(previous) = current {
                    finished.insert(previous);
                }
                prop_assert!(!finished.contains(&tile), "tile {} revisited", tile);
                current = Some(tile);
            }
        }
    }
}

// =============================================================================
// Access
// =============================================================================

fn read_policy(kind: usize) -> AnyReadPolicy<Tile2, 2> {
    match kind {
        0 => AnyReadPolicy::Last(LastTilePolicy::new()),
        1 => AnyReadPolicy::Fifo(FifoPolicy::new(2)),
        _ => AnyReadPolicy::Lru(LruPolicy::new(2)),
    }
}

fn write_policy(write_back: bool) -> AnyWritePolicy {
    if write_back {
        AnyWritePolicy::Back(WriteBack::new())
    } else {
        AnyWritePolicy::Through(WriteThrough::new())
    }
}

#[test]
fn test_read_after_write_all_policies() {
    let full = domain([0, 0], [11, 11]);

    for kind in 0..3 {
        for write_back in [false, true] {
            let tiled = TiledImage::new(
                shared(ImageFactoryFromImage::new(indexed_image(full))),
                shared(read_policy(kind)),
                shared(write_policy(write_back)),
                4,
            )
            .unwrap();

            for p in full.points().step_by(5) {
                tiled.set_value(&p, -(p[0] + 100 * p[1])).unwrap();
            }
            for p in full.points() {
                let expected = if full.linear_index(&p) % 5 == 0 {
                    -(p[0] + 100 * p[1])
                } else {
                    full.linear_index(&p) as i64
                };
                assert_eq!(
                    tiled.get(&p).unwrap(),
                    expected,
                    "at {} (policy {}, write back {})",
                    p,
                    kind,
                    write_back
                );
            }
        }
    }
}

#[test]
fn test_scan_fetches_each_tile_once() {
    let full = domain([0, 0], [9, 9]);
    let (factory, counters) = tracking_factory(full);
    let tiled = TiledImage::new(
        factory.clone(),
        shared(LastTilePolicy::new()),
        shared(WriteThrough::new()),
        3,
    )
    .unwrap();

    let sum: i64 = tiled.values().map(|r| r.unwrap().1).sum();
    assert_eq!(sum, (0..100).sum::<i64>());

    assert_eq!(tiled.cache_miss_read(), 9);
    assert_eq!(counters.requests(), 9);
    // Every tile but the resident one has been detached.
    assert_eq!(counters.detaches(), 8);

    let requested = factory.lock().requested().to_vec();
    assert_eq!(requested[0], domain([0, 0], [2, 2]));
    assert_eq!(requested[1], domain([3, 0], [5, 2]));
    assert_eq!(requested[2], domain([6, 0], [9, 2]));
    assert_eq!(requested[3], domain([0, 3], [2, 5]));
    assert_eq!(requested[8], domain([6, 6], [9, 9]));
}

#[test]
fn test_write_back_flushes_on_eviction() {
    let full = domain([0, 0], [9, 9]);
    let (factory, counters) = tracking_factory(full);
    let tiled = TiledImage::new(
        factory.clone(),
        shared(LastTilePolicy::new()),
        shared(WriteBack::new()),
        2,
    )
    .unwrap();

    tiled.set_value(&Point::new([1, 1]), 7).unwrap();
    assert_eq!(counters.flushes(), 0);
    assert_eq!(factory.lock().stored(&Point::new([1, 1])), 11);

    // Loading another tile evicts the dirty one.
    tiled.get(&Point::new([9, 9])).unwrap();
    assert_eq!(counters.flushes(), 1);
    assert_eq!(factory.lock().stored(&Point::new([1, 1])), 7);

    // A clean tile is evicted without a flush.
    tiled.get(&Point::new([0, 0])).unwrap();
    assert_eq!(counters.flushes(), 1);
    assert_eq!(tiled.get(&Point::new([1, 1])).unwrap(), 7);
}

#[test]
fn test_write_through_flushes_every_write() {
    let full = domain([0, 0], [9, 9]);
    let (factory, counters) = tracking_factory(full);
    let tiled = TiledImage::new(
        factory.clone(),
        shared(LruPolicy::new(4)),
        shared(WriteThrough::new()),
        2,
    )
    .unwrap();

    for x in 0..5 {
        tiled.set_value(&Point::new([x, 0]), 1000 + x).unwrap();
    }
    assert_eq!(counters.flushes(), 5);
    assert_eq!(tiled.cache_miss_write(), 1);
    assert_eq!(factory.lock().stored(&Point::new([4, 0])), 1004);

    // Nothing left to commit on detach.
    tiled.clear_cache().unwrap();
    assert_eq!(counters.flushes(), 5);
    assert_eq!(counters.detaches(), 1);
}

#[test]
fn test_flush_keeps_tiles_resident() {
    let full = domain([0, 0], [9, 9]);
    let (factory, counters) = tracking_factory(full);
    let tiled = TiledImage::new(
        factory.clone(),
        shared(LruPolicy::new(4)),
        shared(WriteBack::new()),
        2,
    )
    .unwrap();

    tiled.set_value(&Point::new([0, 0]), -5).unwrap();
    tiled.set_value(&Point::new([9, 9]), -6).unwrap();
    tiled.flush().unwrap();

    assert_eq!(counters.flushes(), 2);
    assert_eq!(factory.lock().stored(&Point::new([0, 0])), -5);
    assert_eq!(factory.lock().stored(&Point::new([9, 9])), -6);
    assert_eq!(tiled.cache_stats().resident_tiles, 2);
    assert_eq!(tiled.cache_stats().dirty_tiles, 0);

    // Nothing dirty left.
    tiled.flush().unwrap();
    assert_eq!(counters.flushes(), 2);
}

#[test]
fn test_lru_survives_revisits() {
    let full = domain([0, 0], [9, 9]);
    let (factory, counters) = tracking_factory(full);
    let tiled = TiledImage::new(
        factory,
        shared(LruPolicy::new(2)),
        shared(WriteThrough::new()),
        2,
    )
    .unwrap();

    let a = Point::new([0, 0]);
    let b = Point::new([9, 0]);
    let c = Point::new([0, 9]);

    tiled.get(&a).unwrap();
    tiled.get(&b).unwrap();
    tiled.get(&a).unwrap(); // a is most recent
    tiled.get(&c).unwrap(); // evicts b
    tiled.get(&a).unwrap();

    assert_eq!(tiled.cache_miss_read(), 3);
    assert_eq!(counters.requests(), 3);

    tiled.get(&b).unwrap();
    assert_eq!(tiled.cache_miss_read(), 4);
}

#[test]
fn test_fifo_ignores_recency() {
    let full = domain([0, 0], [9, 9]);
    let (factory, _) = tracking_factory(full);
    let tiled = TiledImage::new(
        factory,
        shared(FifoPolicy::new(2)),
        shared(WriteThrough::new()),
        2,
    )
    .unwrap();

    let a = Point::new([0, 0]);
    let b = Point::new([9, 0]);
    let c = Point::new([0, 9]);

    tiled.get(&a).unwrap();
    tiled.get(&b).unwrap();
    tiled.get(&a).unwrap();
    tiled.get(&c).unwrap(); // evicts a, the oldest
    tiled.get(&a).unwrap();

    assert_eq!(tiled.cache_miss_read(), 4);
}

#[test]
fn test_negative_origin_round_trip() {
    let full = domain([-7, -3], [2, 6]);
    let tiled = indexed_tiled(full, 3);

    for p in full.points() {
        assert_eq!(tiled.get(&p).unwrap(), full.linear_index(&p) as i64);
    }
    assert_eq!(tiled.cache_miss_read(), 9);

    tiled.set_value(&Point::new([-7, -3]), 42).unwrap();
    assert_eq!(tiled.get(&Point::new([-7, -3])).unwrap(), 42);
}
