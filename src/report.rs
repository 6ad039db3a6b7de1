//! Reports printed by the command line tool.
//!
//! Each report serializes to JSON for `--json` and renders as plain text
//! otherwise.

use std::fmt;

use serde::Serialize;

use crate::geometry::Coord;
use crate::tile::CacheStats;
use crate::timing::Timings;

/// Result of a full tile-major pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub domain: String,
    pub tiles_per_axis: Coord,
    pub tile_count: u64,
    /// Points visited by the iterator
    pub visited: u64,
    /// Sum of every value, widened to `f64`
    pub checksum: f64,
    pub cache: CacheStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings: Option<Timings>,
}

/// Result of a single point read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProbeReport {
    pub point: Vec<Coord>,
    pub value: f64,
    /// Tile owning the point
    pub tile: String,
    pub cache: CacheStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings: Option<Timings>,
}

/// Result of overwriting the whole image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FillReport {
    pub domain: String,
    pub value: f64,
    /// Points written
    pub written: u64,
    /// Every tile was detached after the flush
    pub cleared: bool,
    pub cache: CacheStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timings: Option<Timings>,
}

/// Any command's report, tagged by command name.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum Report {
    Scan(ScanReport),
    Probe(ProbeReport),
    Fill(FillReport),
}

impl Report {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn write_cache(f: &mut fmt::Formatter<'_>, cache: &CacheStats) -> fmt::Result {
    writeln!(
        f,
        "Cache: {} read misses, {} write misses, {}/{} tiles resident ({} dirty)",
        cache.miss_read,
        cache.miss_write,
        cache.resident_tiles,
        cache.capacity,
        cache.dirty_tiles
    )
}

fn write_timings(f: &mut fmt::Formatter<'_>, timings: &Option<Timings>) -> fmt::Result {
    if let Some(t) = timings {
        writeln!(
            f,
            "Timings: update {}us, find {}us, read {}us, cache update {}us",
            t.update_us, t.find_sub_domain_us, t.read_us, t.update_cache_us
        )?;
    }
    Ok(())
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Report::Scan(r) => {
                writeln!(f, "Domain: {}", r.domain)?;
                writeln!(f, "Tiles: {} per axis, {} total", r.tiles_per_axis, r.tile_count)?;
                writeln!(f, "Visited: {} points", r.visited)?;
                writeln!(f, "Checksum: {}", r.checksum)?;
                write_cache(f, &r.cache)?;
                write_timings(f, &r.timings)
            }
            Report::Probe(r) => {
                let point: Vec<String> = r.point.iter().map(|c| c.to_string()).collect();
                writeln!(f, "Point: ({})", point.join(", "))?;
                writeln!(f, "Value: {}", r.value)?;
                writeln!(f, "Tile: {}", r.tile)?;
                write_cache(f, &r.cache)?;
                write_timings(f, &r.timings)
            }
            Report::Fill(r) => {
                writeln!(f, "Domain: {}", r.domain)?;
                writeln!(f, "Wrote {} to {} points", r.value, r.written)?;
                if r.cleared {
                    writeln!(f, "Cache cleared")?;
                }
                write_cache(f, &r.cache)?;
                write_timings(f, &r.timings)
            }
        }
    }
}
