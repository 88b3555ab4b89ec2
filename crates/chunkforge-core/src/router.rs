//! Synchronization router.
//!
//! After a region is provisioned, each linked space gets a matching region
//! provisioned too. The router finds the first linked region that is still
//! empty and plants a trigger marker in it. It plants at most one marker
//! per call, so a provisioning machine drives one linked region per
//! scheduling cycle.

use chunkforge_types::{CellContent, CellPos, MarkerId, RegionLocator, UpdateFlags};
use chunkforge_world::{EmptinessOracle, WorldError, WorldHost};
use tracing::{debug, info};

use crate::spaces::SpaceTable;

/// A marker planted by the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlantedTrigger {
    /// Region the marker was planted in.
    pub region: RegionLocator,
    /// Cell holding the marker.
    pub pos: CellPos,
    /// The planted marker.
    pub marker: MarkerId,
}

/// Plants triggers in linked regions.
#[derive(Debug, Clone, Copy)]
pub struct SynchronizationRouter {
    oracle: EmptinessOracle,
    marker: MarkerId,
}

impl SynchronizationRouter {
    /// Create a router planting `marker`.
    pub const fn new(oracle: EmptinessOracle, marker: MarkerId) -> Self {
        Self { oracle, marker }
    }

    /// Plant a marker in the first eligible region linked to `target`.
    ///
    /// Linked spaces are tried in configured order. Spaces without a live
    /// instance are skipped. A region is eligible when it is empty and its
    /// reference cell is not already a marker. Returns `None` once every
    /// linked region is provisioned or pending.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError`] if a linked region cannot be loaded or
    /// written.
    pub fn try_plant_one<H: WorldHost + ?Sized>(
        &self,
        host: &mut H,
        spaces: &SpaceTable,
        target: &RegionLocator,
    ) -> Result<Option<PlantedTrigger>, WorldError> {
        for linked in spaces.synchronized(&target.space) {
            if !host.is_space_live(linked) {
                debug!(space = %linked, "Linked space not live, skipping");
                continue;
            }
            let Some(coord) = spaces.linked_region(&target.space, target.coord, linked) else {
                continue;
            };
            let region = RegionLocator::new(linked.clone(), coord);
            let loaded = host.load_or_generate(&region)?;
            if !self.oracle.is_empty_for_sync(loaded) {
                continue;
            }
            let pos = EmptinessOracle::reference_cell(loaded);
            host.set_cell(linked, pos, CellContent::Marker(self.marker), UpdateFlags::ALL)?;
            info!(from = %target, region = %region, "Linked trigger planted");
            return Ok(Some(PlantedTrigger {
                region,
                pos,
                marker: self.marker,
            }));
        }
        Ok(None)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chunkforge_types::{BiomeId, BlockId, RegionCoord, RegionLayout, SpaceId};
    use chunkforge_world::{MemoryWorld, SentinelGenerator};

    use super::*;
    use crate::config::SpaceConfig;

    fn layout() -> RegionLayout {
        RegionLayout::new(8, 4, 0, 2).unwrap()
    }

    fn space(id: &str, scale: f64, synchronized: &[&str]) -> SpaceConfig {
        SpaceConfig {
            id: SpaceId::from(id),
            scale,
            layout: layout(),
            source: None,
            synchronized: synchronized.iter().map(|s| SpaceId::from(*s)).collect(),
            generation_only: false,
        }
    }

    fn setup() -> (MemoryWorld, SpaceTable) {
        let spaces = SpaceTable::build(&[
            space("home", 1.0, &["low", "high"]),
            space("low", 8.0, &[]),
            space("high", 1.0, &[]),
        ])
        .unwrap();
        let mut world = MemoryWorld::new();
        for id in ["home", "low", "high"] {
            world.add_space(
                id,
                layout(),
                SentinelGenerator {
                    biome: BiomeId::VOID,
                    sentinel: BlockId::AIR,
                },
            );
        }
        (world, spaces)
    }

    fn router() -> SynchronizationRouter {
        SynchronizationRouter::new(EmptinessOracle::new(BlockId::AIR), MarkerId(0))
    }

    #[test]
    fn plants_one_per_call_then_exhausts() {
        let (mut world, spaces) = setup();
        let target = RegionLocator::new("home", RegionCoord::new(3, 0));

        let first = router().try_plant_one(&mut world, &spaces, &target).unwrap().unwrap();
        assert_eq!(first.region, RegionLocator::new("low", RegionCoord::new(0, 0)));
        assert_eq!(first.pos, CellPos::new(3, 7, 3));
        assert_eq!(
            world.get_cell(&SpaceId::from("low"), first.pos).unwrap(),
            CellContent::Marker(MarkerId(0))
        );
        assert_eq!(world.writes().last().map(|w| w.flags), Some(UpdateFlags::ALL));

        let second = router().try_plant_one(&mut world, &spaces, &target).unwrap().unwrap();
        assert_eq!(second.region, RegionLocator::new("high", RegionCoord::new(3, 0)));

        for _ in 0..3 {
            assert!(router().try_plant_one(&mut world, &spaces, &target).unwrap().is_none());
        }
    }

    #[test]
    fn skips_spaces_that_are_not_live() {
        let (mut world, spaces) = setup();
        world.set_live(&SpaceId::from("low"), false);
        let target = RegionLocator::new("home", RegionCoord::new(0, 0));
        let planted = router().try_plant_one(&mut world, &spaces, &target).unwrap().unwrap();
        assert_eq!(planted.region.space, SpaceId::from("high"));
    }

    #[test]
    fn skips_populated_regions() {
        let (mut world, spaces) = setup();
        let low = SpaceId::from("low");
        let reference = layout().reference_cell(RegionCoord::new(0, 0));
        world
            .set_cell(&low, reference, CellContent::Block(BlockId(4)), UpdateFlags::ALL)
            .unwrap();
        let target = RegionLocator::new("home", RegionCoord::new(0, 0));
        let planted = router().try_plant_one(&mut world, &spaces, &target).unwrap().unwrap();
        assert_eq!(planted.region.space, SpaceId::from("high"));
    }

    #[test]
    fn no_linked_spaces_plants_nothing() {
        let (mut world, spaces) = setup();
        let target = RegionLocator::new("high", RegionCoord::new(0, 0));
        assert!(router().try_plant_one(&mut world, &spaces, &target).unwrap().is_none());
    }
}
