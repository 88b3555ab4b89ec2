//! The host world as seen by the provisioning core.
//!
//! Region storage, entity spawning, content copying and client refresh
//! all belong to the host. The core reaches them only through
//! [`WorldHost`], so a game server, a test fixture or the in-memory
//! [`MemoryWorld`](crate::memory::MemoryWorld) can stand behind it.

use chunkforge_types::{CellContent, CellPos, RegionLayout, RegionLocator, SpaceId, UpdateFlags};

use crate::error::WorldError;
use crate::region::Region;

/// Operations the provisioning core consumes from the host.
///
/// Implementations are driven from a single cooperative scheduler; no
/// method is called concurrently with another.
pub trait WorldHost {
    /// Geometry of regions in `space`.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::UnknownSpace`] for spaces the host does not
    /// know.
    fn layout(&self, space: &SpaceId) -> Result<RegionLayout, WorldError>;

    /// Whether `space` currently has a live instance that can be queried.
    fn is_space_live(&self, space: &SpaceId) -> bool;

    /// Whether at least one observer is present. Provisioning stalls while
    /// this is false.
    fn has_active_observers(&self) -> bool;

    /// Fetch a region, generating it first if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the space is unknown or not live.
    fn load_or_generate(&mut self, region: &RegionLocator) -> Result<&mut Region, WorldError>;

    /// Read the content of one cell, loading its region if needed.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::CellOutOfRange`] if `pos` lies outside the
    /// usable height of `space`.
    fn get_cell(&mut self, space: &SpaceId, pos: CellPos) -> Result<CellContent, WorldError> {
        let layout = self.layout(space)?;
        let locator = RegionLocator::new(space.clone(), layout.region_of(pos));
        self.load_or_generate(&locator)?
            .cell(pos)
            .ok_or_else(|| WorldError::CellOutOfRange {
                space: space.clone(),
                pos,
            })
    }

    /// Write the content of one cell.
    ///
    /// `flags` selects neighbour notification and observer broadcast.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the cell cannot be addressed.
    fn set_cell(
        &mut self,
        space: &SpaceId,
        pos: CellPos,
        content: CellContent,
        flags: UpdateFlags,
    ) -> Result<(), WorldError>;

    /// Copy block content and per-cell metadata from `source` into
    /// `target`, shifting metadata positions to the target region.
    ///
    /// Trigger markers already present in the target must survive the
    /// copy.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if either region cannot be loaded.
    fn copy_content(&mut self, source: &RegionLocator, target: &RegionLocator) -> Result<(), WorldError>;

    /// Spawn the entities appropriate for `target`, given the region it
    /// was provisioned from.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the host cannot spawn into `target`.
    fn spawn_entities(&mut self, target: &RegionLocator, source: &RegionLocator) -> Result<(), WorldError>;

    /// Force observers to reload `region` from the store.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if the region's space is unknown.
    fn force_reload(&mut self, region: &RegionLocator) -> Result<(), WorldError>;
}
