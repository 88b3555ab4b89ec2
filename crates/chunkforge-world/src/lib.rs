//! Region storage model and host interface for chunkforge.
//!
//! This crate owns everything the provisioning core needs to know about
//! regions without knowing how a real host stores them: the paletted
//! section grids and their byte codec, the single-cell emptiness check,
//! the copy engine, and the [`WorldHost`] trait through which the core
//! reaches the host. [`MemoryWorld`] is a complete in-memory host.
//!
//! # Modules
//!
//! - [`copy`] -- Copies a source region into an empty target region.
//! - [`emptiness`] -- O(1) emptiness check on a region's reference cell.
//! - [`error`] -- Error types for region access and grid decoding.
//! - [`host`] -- The [`WorldHost`] collaborator trait.
//! - [`memory`] -- In-memory host with on-demand region generators.
//! - [`palette`] -- Paletted, bit-packed per-cell grids and their codec.
//! - [`region`] -- Regions and their vertical sections.

pub mod copy;
pub mod emptiness;
pub mod error;
pub mod host;
pub mod memory;
pub mod palette;
pub mod region;

pub use copy::{CopyOutcome, RegionCopyEngine};
pub use emptiness::EmptinessOracle;
pub use error::WorldError;
pub use host::WorldHost;
pub use memory::{CellWrite, MemoryWorld, PatternGenerator, RegionGenerator, SentinelGenerator, SpawnRecord};
pub use palette::{PaletteValue, PalettedGrid};
pub use region::{Region, Section};
