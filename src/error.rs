use thiserror::Error;

use crate::geometry::Coord;

/// Errors raised when building a domain
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    /// Lower bound exceeds upper bound on some axis
    #[error("Inverted bounds on axis {axis}: lower {lower} > upper {upper}")]
    InvertedBounds {
        axis: usize,
        lower: Coord,
        upper: Coord,
    },

    /// Extent must be at least one point on every axis
    #[error("Empty extent on axis {axis}: {extent}")]
    EmptyExtent { axis: usize, extent: Coord },

    /// Wrong number of components for the image dimension
    #[error("Expected {expected} components, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors that can occur when a factory materializes or flushes a tile
#[derive(Debug, Clone, Error)]
pub enum FactoryError {
    /// I/O error on the backing store
    #[error("I/O error: {0}")]
    Io(String),

    /// Requested sub-domain is not part of the factory's domain
    #[error("Sub-domain {requested} is outside factory domain {domain}")]
    OutsideDomain { requested: String, domain: String },

    /// Backing store does not match the declared domain
    #[error("Size mismatch: expected {expected} bytes, found {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    /// Invalid domain description
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl From<std::io::Error> for FactoryError {
    fn from(err: std::io::Error) -> Self {
        FactoryError::Io(err.to_string())
    }
}

/// Errors raised when partitioning a domain into tiles
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TilingError {
    /// Tile count per axis must be at least 1
    #[error("Invalid tile count: {0} (must be at least 1)")]
    InvalidTileCount(Coord),

    /// Tile count exceeds the extent on some axis, so tiles would be empty
    #[error("Degenerate tiling on axis {axis}: extent {extent} cannot hold {tiles} tiles")]
    DegenerateTile {
        axis: usize,
        extent: Coord,
        tiles: Coord,
    },

    /// Factory reports itself invalid
    #[error("Image factory is not valid")]
    InvalidFactory,
}

/// Errors that can occur when accessing a tiled image
#[derive(Debug, Clone, Error)]
pub enum TileError {
    /// The factory failed to materialize or flush a tile
    #[error("Factory error: {0}")]
    Factory(#[from] FactoryError),

    /// A point was still not resident right after its tile was installed.
    ///
    /// This signals a read policy that breaks the residency contract.
    #[error("Tile {tile} not resident after update (point {point})")]
    NotResident { point: String, tile: String },
}
