//! Configuration for the `tiled-image` command line tool.
//!
//! Every option can be given on the command line or through an environment
//! variable with the `TILED_` prefix.
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use tiled_image::config::Cli;
//!
//! let cli = Cli::parse();
//! ```
//!
//! # Environment Variables
//!
//! - `TILED_RAW` - Raw little-endian sample file backing the image
//! - `TILED_EXTENT` - Extent per axis, comma-separated (default: 512,512)
//! - `TILED_LOWER` - Lower bound per axis (default: origin)
//! - `TILED_TILES` - Tiles per axis (default: 8)
//! - `TILED_READ_POLICY` - `lru`, `fifo` or `last` (default: lru)
//! - `TILED_CACHE_TILES` - Resident tile budget (default: 16)
//! - `TILED_WRITE_POLICY` - `through` or `back` (default: back)
//! - `TILED_SAMPLE` - `u8`, `u16` or `f32` (default: u8)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::DomainError;
use crate::geometry::{Coord, Domain, Point};
use crate::tile::DEFAULT_CACHE_TILES;

// =============================================================================
// Default Values
// =============================================================================

/// Default extent of the synthetic image.
pub const DEFAULT_EXTENT: &str = "512,512";

/// Default number of tiles per axis.
pub const DEFAULT_TILES: Coord = 8;

/// Dimensions the binary is compiled for.
pub const SUPPORTED_DIMENSIONS: [usize; 2] = [2, 3];

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tiled Image - out-of-core access to large images through a tile cache.
#[derive(Parser, Debug, Clone)]
#[command(name = "tiled-image")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Walk every point tile by tile and report cache behaviour.
    Scan(ScanConfig),

    /// Read a single point and report its value and tile.
    Probe(ProbeConfig),

    /// Write a constant over the whole image and flush it to the source.
    Fill(FillConfig),
}

impl Command {
    pub fn image(&self) -> &ImageArgs {
        match self {
            Command::Scan(c) => &c.image,
            Command::Probe(c) => &c.image,
            Command::Fill(c) => &c.image,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        match self {
            Command::Scan(c) => c.validate(),
            Command::Probe(c) => c.validate(),
            Command::Fill(c) => c.validate(),
        }
    }
}

/// Which tiles stay resident.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicyChoice {
    /// Least recently used tiles are evicted first
    #[default]
    Lru,
    /// Oldest tile is evicted first
    Fifo,
    /// Only the last requested tile is kept
    Last,
}

/// When writes reach the image source.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WritePolicyChoice {
    /// Every write is committed immediately
    Through,
    /// Writes are committed when a tile leaves the cache or on flush
    #[default]
    Back,
}

/// Pixel type of the image.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleType {
    #[default]
    U8,
    U16,
    F32,
}

impl SampleType {
    /// Whether `value` is exactly representable as this sample type.
    pub fn accepts(&self, value: f64) -> bool {
        match self {
            SampleType::U8 => value.fract() == 0.0 && (0.0..=u8::MAX as f64).contains(&value),
            SampleType::U16 => value.fract() == 0.0 && (0.0..=u16::MAX as f64).contains(&value),
            SampleType::F32 => value.is_finite(),
        }
    }
}

/// Arguments describing the image and its cache, shared by every command.
#[derive(Args, Debug, Clone)]
pub struct ImageArgs {
    // =========================================================================
    // Image Source
    // =========================================================================
    /// Raw file of little-endian samples, axis 0 fastest.
    ///
    /// If not specified, a synthetic in-memory image is generated.
    #[arg(long, env = "TILED_RAW")]
    pub raw: Option<PathBuf>,

    /// Extent of the image on each axis (comma-separated, 2 or 3 axes).
    #[arg(
        long,
        env = "TILED_EXTENT",
        value_delimiter = ',',
        default_value = DEFAULT_EXTENT
    )]
    pub extent: Vec<Coord>,

    /// Lower bound on each axis. Defaults to the origin.
    #[arg(
        long,
        env = "TILED_LOWER",
        value_delimiter = ',',
        allow_hyphen_values = true
    )]
    pub lower: Option<Vec<Coord>>,

    /// Pixel type of the image.
    #[arg(long, value_enum, default_value_t = SampleType::default(), env = "TILED_SAMPLE")]
    pub sample: SampleType,

    // =========================================================================
    // Tiling and Cache
    // =========================================================================
    /// Number of tiles per axis.
    #[arg(long, default_value_t = DEFAULT_TILES, env = "TILED_TILES")]
    pub tiles: Coord,

    /// Read policy deciding which tiles stay resident.
    #[arg(long, value_enum, default_value_t = ReadPolicyChoice::default(), env = "TILED_READ_POLICY")]
    pub read_policy: ReadPolicyChoice,

    /// Maximum number of resident tiles (ignored by the `last` policy).
    #[arg(long, default_value_t = DEFAULT_CACHE_TILES, env = "TILED_CACHE_TILES")]
    pub cache_tiles: usize,

    /// Write policy deciding when writes reach the source.
    #[arg(long, value_enum, default_value_t = WritePolicyChoice::default(), env = "TILED_WRITE_POLICY")]
    pub write_policy: WritePolicyChoice,

    // =========================================================================
    // Output Configuration
    // =========================================================================
    /// Collect timings of the update, find and read paths.
    #[arg(long, default_value_t = false)]
    pub timings: bool,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ImageArgs {
    /// Validate the image arguments and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        let dimension = self.extent.len();
        if !SUPPORTED_DIMENSIONS.contains(&dimension) {
            return Err(format!(
                "extent must have 2 or 3 components, got {}",
                dimension
            ));
        }

        if let Some(axis) = self.extent.iter().position(|&e| e < 1) {
            return Err(format!("extent on axis {} must be at least 1", axis));
        }

        if let Some(ref lower) = self.lower {
            if lower.len() != dimension {
                return Err(format!(
                    "lower has {} components but extent has {}",
                    lower.len(),
                    dimension
                ));
            }
        }

        if self.tiles < 1 {
            return Err("tiles must be greater than 0".to_string());
        }
        if let Some(&min_extent) = self.extent.iter().min() {
            if self.tiles > min_extent {
                return Err(format!(
                    "tiles ({}) cannot exceed the smallest extent ({})",
                    self.tiles, min_extent
                ));
            }
        }

        if self.cache_tiles == 0 {
            return Err("cache_tiles must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Number of axes.
    pub fn dimension(&self) -> usize {
        self.extent.len()
    }

    /// Lower bound, the origin if none was given.
    pub fn lower_or_origin(&self) -> Vec<Coord> {
        self.lower
            .clone()
            .unwrap_or_else(|| vec![0; self.extent.len()])
    }

    /// The image domain for a `D`-dimensional run.
    pub fn domain<const D: usize>(&self) -> Result<Domain<D>, DomainError> {
        let lower = point_from_slice::<D>(&self.lower_or_origin())?;
        let extent = point_from_slice::<D>(&self.extent)?;
        Domain::from_extent(lower, extent)
    }
}

/// Scan the whole image.
#[derive(Args, Debug, Clone)]
pub struct ScanConfig {
    #[command(flatten)]
    pub image: ImageArgs,
}

impl ScanConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.image.validate()
    }
}

/// Read a single point.
#[derive(Args, Debug, Clone)]
pub struct ProbeConfig {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Point to read (comma-separated, one component per axis).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub point: Vec<Coord>,
}

impl ProbeConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.image.validate()?;

        if self.point.len() != self.image.dimension() {
            return Err(format!(
                "point has {} components but the image has {} axes",
                self.point.len(),
                self.image.dimension()
            ));
        }

        let lower = self.image.lower_or_origin();
        for (axis, &c) in self.point.iter().enumerate() {
            let upper = lower[axis] + self.image.extent[axis] - 1;
            if c < lower[axis] || c > upper {
                return Err(format!(
                    "point component {} on axis {} is outside [{}, {}]",
                    c, axis, lower[axis], upper
                ));
            }
        }

        Ok(())
    }

    pub fn point<const D: usize>(&self) -> Result<Point<D>, DomainError> {
        point_from_slice(&self.point)
    }
}

/// Overwrite every point with a constant.
#[derive(Args, Debug, Clone)]
pub struct FillConfig {
    #[command(flatten)]
    pub image: ImageArgs,

    /// Value to write, converted to the sample type.
    #[arg(long, allow_hyphen_values = true)]
    pub value: f64,

    /// Detach every tile after flushing.
    #[arg(long, default_value_t = false)]
    pub clear: bool,
}

impl FillConfig {
    pub fn validate(&self) -> Result<(), String> {
        self.image.validate()?;

        if !self.image.sample.accepts(self.value) {
            return Err(format!(
                "value {} is not representable as {:?}",
                self.value, self.image.sample
            ));
        }

        Ok(())
    }
}

fn point_from_slice<const D: usize>(components: &[Coord]) -> Result<Point<D>, DomainError> {
    Point::from_slice(components).ok_or(DomainError::DimensionMismatch {
        expected: D,
        actual: components.len(),
    })
}

// =============================================================================
// Tests
// =============================================================================
