//! Region containers: vertical sections of attribute and content grids.

use std::collections::BTreeMap;

use chunkforge_types::{BiomeId, BlockId, CellContent, CellPos, RegionCoord, RegionLayout};

use crate::error::WorldError;
use crate::palette::PalettedGrid;

/// One vertical slice of a region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Attribute grid, one biome per cell.
    pub biomes: PalettedGrid<BiomeId>,
    /// Content grid, one block or marker per cell.
    pub blocks: PalettedGrid<CellContent>,
}

impl Section {
    /// Create a section of `cells` cells with uniform biome and content.
    pub fn uniform(cells: usize, biome: BiomeId, content: CellContent) -> Self {
        Self {
            biomes: PalettedGrid::filled(cells, biome),
            blocks: PalettedGrid::filled(cells, content),
        }
    }
}

/// A square column of cells split into vertical sections.
///
/// Regions are owned by the host's region store. The `dirty` flag tells
/// the store the region needs persisting; `annotations` carry per-cell
/// metadata (the host's equivalent of block entities) that moves along
/// with content during a copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region {
    coord: RegionCoord,
    layout: RegionLayout,
    sections: Vec<Section>,
    dirty: bool,
    annotations: BTreeMap<CellPos, String>,
}

impl Region {
    /// Create a region filled with one biome and one block.
    pub fn uniform(coord: RegionCoord, layout: RegionLayout, biome: BiomeId, block: BlockId) -> Self {
        let cells = layout.cells_per_section();
        let sections = (0..layout.section_count())
            .map(|_| Section::uniform(cells, biome, CellContent::Block(block)))
            .collect();
        Self {
            coord,
            layout,
            sections,
            dirty: false,
            annotations: BTreeMap::new(),
        }
    }

    /// Coordinate of this region in its space.
    pub const fn coord(&self) -> RegionCoord {
        self.coord
    }

    /// Geometry of this region.
    pub const fn layout(&self) -> RegionLayout {
        self.layout
    }

    /// All sections, bottom first.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Mutable access to all sections.
    pub fn sections_mut(&mut self) -> &mut [Section] {
        &mut self.sections
    }

    /// Content of the cell at absolute position `pos`.
    ///
    /// Returns `None` if `pos` is outside this region or its usable height.
    pub fn cell(&self, pos: CellPos) -> Option<CellContent> {
        let at = self.locate(pos)?;
        self.sections.get(at.section)?.blocks.get(at.index)
    }

    /// Write content at absolute position `pos` and mark the region dirty.
    pub fn set_cell(&mut self, pos: CellPos, content: CellContent) -> Result<(), WorldError> {
        let at = self.locate(pos).ok_or(WorldError::CellOutsideRegion {
            coord: self.coord,
            pos,
        })?;
        let section = self
            .sections
            .get_mut(at.section)
            .ok_or(WorldError::ArithmeticOverflow)?;
        section.blocks.set(at.index, content)?;
        self.dirty = true;
        Ok(())
    }

    /// Biome of the cell at absolute position `pos`.
    pub fn biome(&self, pos: CellPos) -> Option<BiomeId> {
        let at = self.locate(pos)?;
        self.sections.get(at.section)?.biomes.get(at.index)
    }

    /// Write the biome at absolute position `pos` and mark the region dirty.
    pub fn set_biome(&mut self, pos: CellPos, biome: BiomeId) -> Result<(), WorldError> {
        let at = self.locate(pos).ok_or(WorldError::CellOutsideRegion {
            coord: self.coord,
            pos,
        })?;
        let section = self
            .sections
            .get_mut(at.section)
            .ok_or(WorldError::ArithmeticOverflow)?;
        section.biomes.set(at.index, biome)?;
        self.dirty = true;
        Ok(())
    }

    /// Whether the region has unsaved changes.
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flag the region as having unsaved changes.
    pub const fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Clear the unsaved-changes flag.
    pub const fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    /// Per-cell metadata attached to this region.
    pub const fn annotations(&self) -> &BTreeMap<CellPos, String> {
        &self.annotations
    }

    /// Attach metadata to a cell inside this region.
    pub fn annotate(&mut self, pos: CellPos, note: impl Into<String>) -> Result<(), WorldError> {
        if self.locate(pos).is_none() {
            return Err(WorldError::CellOutsideRegion {
                coord: self.coord,
                pos,
            });
        }
        self.annotations.insert(pos, note.into());
        self.dirty = true;
        Ok(())
    }

    /// Replace all annotations.
    pub(crate) fn replace_annotations(&mut self, annotations: BTreeMap<CellPos, String>) {
        self.annotations = annotations;
    }

    fn locate(&self, pos: CellPos) -> Option<chunkforge_types::CellIndex> {
        if self.layout.region_of(pos) != self.coord {
            return None;
        }
        self.layout.locate(pos)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn layout() -> RegionLayout {
        RegionLayout::new(8, 4, 0, 2).unwrap()
    }

    #[test]
    fn uniform_region_reads_back() {
        let region = Region::uniform(RegionCoord::new(0, 0), layout(), BiomeId(1), BlockId(2));
        assert_eq!(region.sections().len(), 2);
        assert_eq!(region.cell(CellPos::new(3, 5, 3)), Some(CellContent::Block(BlockId(2))));
        assert_eq!(region.biome(CellPos::new(0, 0, 0)), Some(BiomeId(1)));
        assert!(!region.is_dirty());
    }

    #[test]
    fn cells_outside_region_are_rejected() {
        let mut region = Region::uniform(RegionCoord::new(1, 0), layout(), BiomeId(1), BlockId(2));
        assert_eq!(region.cell(CellPos::new(0, 0, 0)), None);
        assert_eq!(region.cell(CellPos::new(8, 0, 0)), Some(CellContent::Block(BlockId(2))));
        assert!(region.set_cell(CellPos::new(0, 0, 0), CellContent::AIR).is_err());
        assert!(region.cell(CellPos::new(8, 8, 0)).is_none());
    }

    #[test]
    fn writes_mark_dirty() {
        let mut region = Region::uniform(RegionCoord::new(0, 0), layout(), BiomeId(1), BlockId(2));
        region.set_cell(CellPos::new(1, 1, 1), CellContent::AIR).unwrap();
        assert!(region.is_dirty());
        assert_eq!(region.cell(CellPos::new(1, 1, 1)), Some(CellContent::AIR));
        region.clear_dirty();
        region.set_biome(CellPos::new(1, 6, 1), BiomeId(4)).unwrap();
        assert!(region.is_dirty());
        assert_eq!(region.biome(CellPos::new(1, 6, 1)), Some(BiomeId(4)));
        assert_eq!(region.biome(CellPos::new(1, 5, 1)), Some(BiomeId(1)));
    }

    #[test]
    fn annotations_stay_inside_region() {
        let mut region = Region::uniform(RegionCoord::new(0, 0), layout(), BiomeId(1), BlockId(2));
        region.annotate(CellPos::new(2, 2, 2), "chest").unwrap();
        assert!(region.annotate(CellPos::new(9, 2, 2), "chest").is_err());
        assert_eq!(region.annotations().len(), 1);
    }
}
