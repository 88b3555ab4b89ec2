//! Error types for the `chunkforge-world` crate.
//!
//! All fallible operations in this crate, including every [`WorldHost`]
//! method, return [`WorldError`].
//!
//! [`WorldHost`]: crate::host::WorldHost

use chunkforge_types::{CellPos, RegionCoord, RegionLocator, SpaceId};

/// Errors that can occur while reading or writing region data.
#[derive(Debug, thiserror::Error)]
pub enum WorldError {
    /// The space is not known to the host.
    #[error("unknown space: {0}")]
    UnknownSpace(SpaceId),

    /// The space is known but has no live instance to query.
    #[error("space {0} is not live")]
    SpaceNotLive(SpaceId),

    /// A cell position lies outside the usable height of its space.
    #[error("cell {pos} is outside the usable height of space {space}")]
    CellOutOfRange {
        /// The space being addressed.
        space: SpaceId,
        /// The offending position.
        pos: CellPos,
    },

    /// A cell position does not belong to the region being written.
    #[error("cell {pos} is not inside region {coord}")]
    CellOutsideRegion {
        /// The region being written.
        coord: RegionCoord,
        /// The offending position.
        pos: CellPos,
    },

    /// Source and target regions do not share a section geometry.
    #[error("layout mismatch copying {copied_from} into {copied_into}")]
    LayoutMismatch {
        /// The source region.
        copied_from: RegionLocator,
        /// The target region.
        copied_into: RegionLocator,
    },

    /// A serialized grid payload was truncated or corrupt.
    #[error("malformed grid payload: {detail}")]
    MalformedPayload {
        /// Human-readable description of what went wrong.
        detail: String,
    },

    /// A grid palette grew beyond its representable size.
    #[error("palette overflow: more than {max} distinct values")]
    PaletteOverflow {
        /// The largest supported palette.
        max: usize,
    },

    /// A grid index was outside the grid.
    #[error("grid index {index} out of bounds for length {len}")]
    IndexOutOfBounds {
        /// The requested index.
        index: usize,
        /// The grid length.
        len: usize,
    },

    /// Arithmetic overflow during a checked operation.
    #[error("arithmetic overflow in region calculation")]
    ArithmeticOverflow,
}
