//! Shared type definitions for the chunkforge workspace.
//!
//! Every crate in the workspace speaks in these types: region and cell
//! coordinates, the per-space region layout, cell content values, logical
//! space identifiers, and trigger identifiers.
//!
//! # Modules
//!
//! - [`content`] -- Block, biome, and marker values stored in region cells.
//! - [`coords`] -- Cell positions, region coordinates, and step directions.
//! - [`ids`] -- Type-safe UUID wrappers for runtime identifiers.
//! - [`layout`] -- Region geometry: width, vertical sections, and indexing.
//! - [`space`] -- Identifiers for parallel logical spaces.

pub mod content;
pub mod coords;
pub mod ids;
pub mod layout;
pub mod space;

// Re-export all public types at crate root for convenience.
pub use content::{BiomeId, BlockId, CellContent, MarkerId, UpdateFlags};
pub use coords::{CellPos, Direction, RegionCoord};
pub use ids::TriggerId;
pub use layout::{CellIndex, RegionLayout};
pub use space::{RegionLocator, SpaceId};
