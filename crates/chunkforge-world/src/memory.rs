//! In-memory world host.
//!
//! [`MemoryWorld`] keeps every region of every configured space in a
//! `BTreeMap`, generates missing regions on demand through a
//! [`RegionGenerator`], and records the side effects the core asks for
//! (spawns, reloads, cell writes) so they can be inspected afterwards.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chunkforge_types::{
    BiomeId, BlockId, CellContent, CellPos, RegionCoord, RegionLayout, RegionLocator, SpaceId,
    UpdateFlags,
};
use tracing::debug;

use crate::error::WorldError;
use crate::host::WorldHost;
use crate::region::Region;

/// Produces a fresh region the first time it is requested.
pub trait RegionGenerator: Send + Sync {
    /// Generate the region at `coord` with the given geometry.
    ///
    /// # Errors
    ///
    /// Returns a [`WorldError`] if the region cannot be filled.
    fn generate(&self, coord: RegionCoord, layout: RegionLayout) -> Result<Region, WorldError>;
}

/// Generates regions where every cell is the sentinel block.
///
/// Used for live spaces: nothing exists there until it is provisioned.
#[derive(Debug, Clone, Copy)]
pub struct SentinelGenerator {
    /// Biome of every generated cell.
    pub biome: BiomeId,
    /// Block of every generated cell.
    pub sentinel: BlockId,
}

impl RegionGenerator for SentinelGenerator {
    fn generate(&self, coord: RegionCoord, layout: RegionLayout) -> Result<Region, WorldError> {
        Ok(Region::uniform(coord, layout, self.biome, self.sentinel))
    }
}

/// Generates regions filled with a repeating block pattern and one biome.
///
/// Cell `(x, y, z)` holds `blocks[(x + y + z) mod blocks.len()]`. Used for
/// generation-only source spaces.
#[derive(Debug, Clone)]
pub struct PatternGenerator {
    biome: BiomeId,
    blocks: Vec<BlockId>,
}

impl PatternGenerator {
    /// Create a pattern generator. An empty pattern generates air.
    pub fn new(biome: BiomeId, blocks: Vec<BlockId>) -> Self {
        Self { biome, blocks }
    }

    /// Block expected at `pos`.
    pub fn block_at(&self, pos: CellPos) -> BlockId {
        let Ok(len) = i64::try_from(self.blocks.len()) else {
            return BlockId::AIR;
        };
        let sum = i64::from(pos.x)
            .saturating_add(i64::from(pos.y))
            .saturating_add(i64::from(pos.z));
        sum.checked_rem_euclid(len)
            .and_then(|slot| usize::try_from(slot).ok())
            .and_then(|slot| self.blocks.get(slot).copied())
            .unwrap_or(BlockId::AIR)
    }
}

impl RegionGenerator for PatternGenerator {
    fn generate(&self, coord: RegionCoord, layout: RegionLayout) -> Result<Region, WorldError> {
        let mut region = Region::uniform(coord, layout, self.biome, BlockId::AIR);
        for (section_index, section) in region.sections_mut().iter_mut().enumerate() {
            for index in 0..section.blocks.len() {
                let pos = layout
                    .cell_at(coord, section_index, index)
                    .ok_or(WorldError::ArithmeticOverflow)?;
                section
                    .blocks
                    .set(index, CellContent::Block(self.block_at(pos)))?;
            }
        }
        region.clear_dirty();
        Ok(region)
    }
}

/// A cell write requested through [`WorldHost::set_cell`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellWrite {
    /// Space written to.
    pub space: SpaceId,
    /// Position written.
    pub pos: CellPos,
    /// Content written.
    pub content: CellContent,
    /// Update flags passed with the write.
    pub flags: UpdateFlags,
}

/// A spawn request received through [`WorldHost::spawn_entities`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpawnRecord {
    /// Region entities were spawned into.
    pub target: RegionLocator,
    /// Region the entities were derived from.
    pub source: RegionLocator,
}

struct SpaceEntry {
    layout: RegionLayout,
    live: bool,
    generator: Box<dyn RegionGenerator>,
    regions: BTreeMap<RegionCoord, Region>,
}

/// A [`WorldHost`] backed entirely by memory.
pub struct MemoryWorld {
    spaces: BTreeMap<SpaceId, SpaceEntry>,
    observers: bool,
    writes: Vec<CellWrite>,
    spawns: Vec<SpawnRecord>,
    reloads: Vec<RegionLocator>,
}

impl MemoryWorld {
    /// Create an empty world with one observer present.
    pub const fn new() -> Self {
        Self {
            spaces: BTreeMap::new(),
            observers: true,
            writes: Vec::new(),
            spawns: Vec::new(),
            reloads: Vec::new(),
        }
    }

    /// Register a live space. Registering the same id twice replaces it.
    pub fn add_space(
        &mut self,
        space: impl Into<SpaceId>,
        layout: RegionLayout,
        generator: impl RegionGenerator + 'static,
    ) -> &mut Self {
        self.spaces.insert(
            space.into(),
            SpaceEntry {
                layout,
                live: true,
                generator: Box::new(generator),
                regions: BTreeMap::new(),
            },
        );
        self
    }

    /// Mark a space live or unloaded. Unknown spaces are ignored.
    pub fn set_live(&mut self, space: &SpaceId, live: bool) {
        if let Some(entry) = self.spaces.get_mut(space) {
            entry.live = live;
        }
    }

    /// Set whether any observer is present.
    pub const fn set_observers(&mut self, present: bool) {
        self.observers = present;
    }

    /// A region if it has already been generated.
    pub fn region(&self, locator: &RegionLocator) -> Option<&Region> {
        self.spaces.get(&locator.space)?.regions.get(&locator.coord)
    }

    /// Number of generated regions in `space`.
    pub fn region_count(&self, space: &SpaceId) -> usize {
        self.spaces.get(space).map_or(0, |entry| entry.regions.len())
    }

    /// Every cell write so far, oldest first.
    pub fn writes(&self) -> &[CellWrite] {
        &self.writes
    }

    /// Every spawn request so far, oldest first.
    pub fn spawns(&self) -> &[SpawnRecord] {
        &self.spawns
    }

    /// Every forced reload so far, oldest first.
    pub fn reloads(&self) -> &[RegionLocator] {
        &self.reloads
    }

    fn entry(&self, space: &SpaceId) -> Result<&SpaceEntry, WorldError> {
        self.spaces
            .get(space)
            .ok_or_else(|| WorldError::UnknownSpace(space.clone()))
    }
}

impl Default for MemoryWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for MemoryWorld {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MemoryWorld")
            .field("spaces", &self.spaces.keys().collect::<Vec<_>>())
            .field("observers", &self.observers)
            .field("spawns", &self.spawns.len())
            .field("reloads", &self.reloads.len())
            .finish_non_exhaustive()
    }
}

impl WorldHost for MemoryWorld {
    fn layout(&self, space: &SpaceId) -> Result<RegionLayout, WorldError> {
        Ok(self.entry(space)?.layout)
    }

    fn is_space_live(&self, space: &SpaceId) -> bool {
        self.spaces.get(space).is_some_and(|entry| entry.live)
    }

    fn has_active_observers(&self) -> bool {
        self.observers
    }

    fn load_or_generate(&mut self, locator: &RegionLocator) -> Result<&mut Region, WorldError> {
        let entry = self
            .spaces
            .get_mut(&locator.space)
            .ok_or_else(|| WorldError::UnknownSpace(locator.space.clone()))?;
        if !entry.live {
            return Err(WorldError::SpaceNotLive(locator.space.clone()));
        }
        let layout = entry.layout;
        let generator = &entry.generator;
        match entry.regions.entry(locator.coord) {
            Entry::Occupied(slot) => Ok(slot.into_mut()),
            Entry::Vacant(slot) => Ok(slot.insert(generator.generate(locator.coord, layout)?)),
        }
    }

    fn set_cell(
        &mut self,
        space: &SpaceId,
        pos: CellPos,
        content: CellContent,
        flags: UpdateFlags,
    ) -> Result<(), WorldError> {
        let layout = self.layout(space)?;
        if !layout.contains_y(pos.y) {
            return Err(WorldError::CellOutOfRange {
                space: space.clone(),
                pos,
            });
        }
        let locator = RegionLocator::new(space.clone(), layout.region_of(pos));
        self.load_or_generate(&locator)?.set_cell(pos, content)?;
        self.writes.push(CellWrite {
            space: space.clone(),
            pos,
            content,
            flags,
        });
        Ok(())
    }

    fn copy_content(&mut self, source: &RegionLocator, target: &RegionLocator) -> Result<(), WorldError> {
        let source_region = self.load_or_generate(source)?;
        let source_layout = source_region.layout();
        let blocks: Vec<_> = source_region
            .sections()
            .iter()
            .map(|section| section.blocks.clone())
            .collect();
        let source_origin = source_layout.origin_cell(source.coord, 0);
        let annotations = source_region.annotations().clone();

        let target_region = self.load_or_generate(target)?;
        let target_layout = target_region.layout();
        if target_layout.cells_per_section() != source_layout.cells_per_section() {
            return Err(WorldError::LayoutMismatch {
                copied_from: source.clone(),
                copied_into: target.clone(),
            });
        }
        let target_origin = target_layout.origin_cell(target.coord, 0);
        let dx = target_origin
            .x
            .checked_sub(source_origin.x)
            .ok_or(WorldError::ArithmeticOverflow)?;
        let dz = target_origin
            .z
            .checked_sub(source_origin.z)
            .ok_or(WorldError::ArithmeticOverflow)?;

        for (section, copied) in target_region.sections_mut().iter_mut().zip(blocks) {
            let markers: Vec<_> = section
                .blocks
                .iter()
                .enumerate()
                .filter(|(_, content)| content.is_marker())
                .collect();
            section.blocks = copied;
            for (index, marker) in markers {
                section.blocks.set(index, marker)?;
            }
        }

        let mut shifted = BTreeMap::new();
        for (pos, note) in annotations {
            let moved = CellPos::new(
                pos.x.checked_add(dx).ok_or(WorldError::ArithmeticOverflow)?,
                pos.y,
                pos.z.checked_add(dz).ok_or(WorldError::ArithmeticOverflow)?,
            );
            shifted.insert(moved, note);
        }
        target_region.replace_annotations(shifted);
        target_region.mark_dirty();
        Ok(())
    }

    fn spawn_entities(&mut self, target: &RegionLocator, source: &RegionLocator) -> Result<(), WorldError> {
        self.entry(&target.space)?;
        self.entry(&source.space)?;
        debug!(target = %target, source = %source, "Spawning entities");
        self.spawns.push(SpawnRecord {
            target: target.clone(),
            source: source.clone(),
        });
        Ok(())
    }

    fn force_reload(&mut self, region: &RegionLocator) -> Result<(), WorldError> {
        self.entry(&region.space)?;
        self.reloads.push(region.clone());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chunkforge_types::MarkerId;

    use super::*;

    fn layout() -> RegionLayout {
        RegionLayout::new(8, 4, 0, 2).unwrap()
    }

    fn world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        world
            .add_space(
                "source",
                layout(),
                PatternGenerator::new(BiomeId(7), vec![BlockId(1), BlockId(2), BlockId(3)]),
            )
            .add_space(
                "live",
                layout(),
                SentinelGenerator {
                    biome: BiomeId::VOID,
                    sentinel: BlockId::AIR,
                },
            );
        world
    }

    #[test]
    fn regions_are_generated_once() {
        let mut world = world();
        let locator = RegionLocator::new("live", RegionCoord::new(0, 0));
        world
            .load_or_generate(&locator)
            .unwrap()
            .set_cell(CellPos::new(0, 0, 0), CellContent::Block(BlockId(9)))
            .unwrap();
        let again = world.load_or_generate(&locator).unwrap();
        assert_eq!(again.cell(CellPos::new(0, 0, 0)), Some(CellContent::Block(BlockId(9))));
        assert_eq!(world.region_count(&SpaceId::from("live")), 1);
    }

    #[test]
    fn pattern_generator_repeats() {
        let mut world = world();
        let region = world
            .load_or_generate(&RegionLocator::new("source", RegionCoord::new(-1, 0)))
            .unwrap();
        assert_eq!(region.cell(CellPos::new(-8, 0, 0)), Some(CellContent::Block(BlockId(2))));
        assert_eq!(region.cell(CellPos::new(-7, 0, 0)), Some(CellContent::Block(BlockId(3))));
        assert_eq!(region.biome(CellPos::new(-1, 7, 7)), Some(BiomeId(7)));
        assert!(!region.is_dirty());
    }

    #[test]
    fn pattern_generator_fills_every_cell() {
        let generator = PatternGenerator::new(BiomeId(2), vec![BlockId(4), BlockId(5), BlockId(6)]);
        let coord = RegionCoord::new(1, -2);
        let region = generator.generate(coord, layout()).unwrap();
        for (section_index, section) in region.sections().iter().enumerate() {
            for (index, content) in section.blocks.iter().enumerate() {
                let pos = layout().cell_at(coord, section_index, index).unwrap();
                assert_eq!(content, CellContent::Block(generator.block_at(pos)));
            }
        }
        assert!(!region.is_dirty());
    }

    #[test]
    fn unknown_and_unloaded_spaces_fail() {
        let mut world = world();
        let missing = RegionLocator::new("void", RegionCoord::new(0, 0));
        assert!(matches!(
            world.load_or_generate(&missing),
            Err(WorldError::UnknownSpace(_))
        ));
        world.set_live(&SpaceId::from("live"), false);
        assert!(!world.is_space_live(&SpaceId::from("live")));
        let unloaded = RegionLocator::new("live", RegionCoord::new(0, 0));
        assert!(matches!(
            world.load_or_generate(&unloaded),
            Err(WorldError::SpaceNotLive(_))
        ));
    }

    #[test]
    fn set_cell_records_flags() {
        let mut world = world();
        let live = SpaceId::from("live");
        let pos = CellPos::new(3, 7, -4);
        world
            .set_cell(&live, pos, CellContent::Marker(MarkerId(1)), UpdateFlags::NONE)
            .unwrap();
        assert_eq!(world.get_cell(&live, pos).unwrap(), CellContent::Marker(MarkerId(1)));
        assert_eq!(world.writes().len(), 1);
        assert_eq!(world.writes().first().map(|w| w.flags), Some(UpdateFlags::NONE));
        assert!(world
            .set_cell(&live, CellPos::new(0, 8, 0), CellContent::AIR, UpdateFlags::ALL)
            .is_err());
    }

    #[test]
    fn copy_content_keeps_markers_and_shifts_metadata() {
        let mut world = world();
        let source = RegionLocator::new("source", RegionCoord::new(0, 0));
        let target = RegionLocator::new("live", RegionCoord::new(2, -1));
        world
            .load_or_generate(&source)
            .unwrap()
            .annotate(CellPos::new(1, 1, 1), "spawner")
            .unwrap();
        let marker_pos = CellPos::new(19, 7, -5);
        world
            .set_cell(&target.space, marker_pos, CellContent::Marker(MarkerId(0)), UpdateFlags::NONE)
            .unwrap();

        world.copy_content(&source, &target).unwrap();

        let region = world.region(&target).unwrap();
        assert!(region.is_dirty());
        assert_eq!(region.cell(marker_pos), Some(CellContent::Marker(MarkerId(0))));
        // Content moves by index: the target origin holds the source origin's block.
        assert_eq!(region.cell(CellPos::new(16, 0, -8)), Some(CellContent::Block(BlockId(1))));
        assert_eq!(region.cell(CellPos::new(17, 0, -8)), Some(CellContent::Block(BlockId(2))));
        assert_eq!(
            region.annotations().get(&CellPos::new(17, 1, -7)).map(String::as_str),
            Some("spawner")
        );
    }

    #[test]
    fn spawns_and_reloads_are_recorded() {
        let mut world = world();
        let source = RegionLocator::new("source", RegionCoord::new(0, 0));
        let target = RegionLocator::new("live", RegionCoord::new(0, 0));
        world.spawn_entities(&target, &source).unwrap();
        world.force_reload(&target).unwrap();
        assert_eq!(world.spawns().len(), 1);
        assert_eq!(world.reloads(), &[target]);
        let missing = RegionLocator::new("void", RegionCoord::new(0, 0));
        assert!(world.force_reload(&missing).is_err());
    }
}
