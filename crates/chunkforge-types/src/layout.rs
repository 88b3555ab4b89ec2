//! Region geometry for one logical space.
//!
//! A region is a square column of `width x width` cells split vertically
//! into `section_count` sections of `section_height` cells each, starting
//! at `min_y`. Cells inside a section are indexed in Y, then Z, then X
//! order: `index = (ly * width + lz) * width + lx`.

use core::num::NonZeroU16;

use serde::{Deserialize, Serialize};

use crate::coords::{CellPos, RegionCoord};

/// Default region width in cells.
const DEFAULT_WIDTH: u16 = 16;
/// Default section height in cells.
const DEFAULT_SECTION_HEIGHT: u16 = 16;
/// Default lowest cell y.
const DEFAULT_MIN_Y: i32 = -64;
/// Default number of vertical sections.
const DEFAULT_SECTION_COUNT: u16 = 24;

/// Location of a cell inside a region's section storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellIndex {
    /// Vertical section index, `0` at the bottom.
    pub section: usize,
    /// Index of the cell inside the section grid.
    pub index: usize,
}

/// Geometry shared by every region of a logical space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RegionLayout {
    /// Cells along each horizontal side of a region.
    #[serde(default = "default_width")]
    pub width: NonZeroU16,
    /// Cells per vertical section.
    #[serde(default = "default_section_height")]
    pub section_height: NonZeroU16,
    /// Lowest usable cell y.
    #[serde(default = "default_min_y")]
    pub min_y: i32,
    /// Number of vertical sections.
    #[serde(default = "default_section_count")]
    pub section_count: NonZeroU16,
}

impl RegionLayout {
    /// Build a layout from raw dimensions.
    ///
    /// Returns `None` if any of `width`, `section_height` or
    /// `section_count` is zero.
    pub fn new(width: u16, section_height: u16, min_y: i32, section_count: u16) -> Option<Self> {
        Some(Self {
            width: NonZeroU16::new(width)?,
            section_height: NonZeroU16::new(section_height)?,
            min_y,
            section_count: NonZeroU16::new(section_count)?,
        })
    }

    /// Region width in cells.
    pub fn width(self) -> i32 {
        i32::from(self.width.get())
    }

    /// Section height in cells.
    pub fn section_height(self) -> i32 {
        i32::from(self.section_height.get())
    }

    /// Number of vertical sections.
    pub fn section_count(self) -> usize {
        usize::from(self.section_count.get())
    }

    /// Total usable height in cells.
    pub fn height(self) -> i32 {
        self.section_height()
            .saturating_mul(i32::from(self.section_count.get()))
    }

    /// First y above the usable height (exclusive bound).
    pub fn max_y(self) -> i32 {
        self.min_y.saturating_add(self.height())
    }

    /// Highest usable y: the layer holding each region's reference cell.
    pub fn top_y(self) -> i32 {
        self.max_y().saturating_sub(1)
    }

    /// Whether `y` lies inside the usable height.
    pub fn contains_y(self, y: i32) -> bool {
        y >= self.min_y && y < self.max_y()
    }

    /// Number of cells stored per section.
    pub fn cells_per_section(self) -> usize {
        let w = usize::from(self.width.get());
        w.saturating_mul(w)
            .saturating_mul(usize::from(self.section_height.get()))
    }

    /// Region containing `pos`.
    pub fn region_of(self, pos: CellPos) -> RegionCoord {
        let w = self.width();
        RegionCoord::new(
            pos.x.checked_div_euclid(w).unwrap_or_default(),
            pos.z.checked_div_euclid(w).unwrap_or_default(),
        )
    }

    /// Lowest-x, lowest-z cell of a region at height `y`.
    pub fn origin_cell(self, coord: RegionCoord, y: i32) -> CellPos {
        let w = self.width();
        CellPos::new(coord.x.saturating_mul(w), y, coord.z.saturating_mul(w))
    }

    /// Horizontal middle cell of a region at height `y`.
    ///
    /// For even widths the middle rounds towards the origin
    /// (offset 7 for a 16-wide region).
    pub fn middle_cell(self, coord: RegionCoord, y: i32) -> CellPos {
        let offset = self
            .width()
            .saturating_sub(1)
            .checked_div(2)
            .unwrap_or_default();
        let origin = self.origin_cell(coord, y);
        CellPos::new(
            origin.x.saturating_add(offset),
            y,
            origin.z.saturating_add(offset),
        )
    }

    /// The single cell inspected by the emptiness check: the horizontal
    /// middle of the region at the top usable height.
    pub fn reference_cell(self, coord: RegionCoord) -> CellPos {
        self.middle_cell(coord, self.top_y())
    }

    /// Locate an absolute cell inside its region's section storage.
    ///
    /// Returns `None` if `pos.y` is outside the usable height.
    pub fn locate(self, pos: CellPos) -> Option<CellIndex> {
        let w = self.width();
        let sh = self.section_height();
        let lx = pos.x.checked_rem_euclid(w)?;
        let lz = pos.z.checked_rem_euclid(w)?;
        let rel_y = pos.y.checked_sub(self.min_y)?;
        if rel_y < 0 || rel_y >= self.height() {
            return None;
        }
        let section = usize::try_from(rel_y.checked_div(sh)?).ok()?;
        let ly = rel_y.checked_rem(sh)?;
        let index = ly.checked_mul(w)?.checked_add(lz)?.checked_mul(w)?.checked_add(lx)?;
        Some(CellIndex {
            section,
            index: usize::try_from(index).ok()?,
        })
    }

    /// Absolute position of the cell at `index` in `section` of region
    /// `coord`. Inverse of [`locate`](Self::locate).
    pub fn cell_at(self, coord: RegionCoord, section: usize, index: usize) -> Option<CellPos> {
        let w = usize::from(self.width.get());
        let sh = usize::from(self.section_height.get());
        let lx = index.checked_rem(w)?;
        let lz = index.checked_div(w)?.checked_rem(w)?;
        let ly = index.checked_div(w.checked_mul(w)?)?;
        if ly >= sh || section >= self.section_count() {
            return None;
        }
        let rel_y = section.checked_mul(sh)?.checked_add(ly)?;
        let origin = self.origin_cell(coord, self.min_y);
        Some(CellPos::new(
            origin.x.checked_add(i32::try_from(lx).ok()?)?,
            origin.y.checked_add(i32::try_from(rel_y).ok()?)?,
            origin.z.checked_add(i32::try_from(lz).ok()?)?,
        ))
    }
}

impl Default for RegionLayout {
    fn default() -> Self {
        Self {
            width: default_width(),
            section_height: default_section_height(),
            min_y: DEFAULT_MIN_Y,
            section_count: default_section_count(),
        }
    }
}

const fn default_width() -> NonZeroU16 {
    match NonZeroU16::new(DEFAULT_WIDTH) {
        Some(value) => value,
        None => NonZeroU16::MIN,
    }
}

const fn default_section_height() -> NonZeroU16 {
    match NonZeroU16::new(DEFAULT_SECTION_HEIGHT) {
        Some(value) => value,
        None => NonZeroU16::MIN,
    }
}

const fn default_min_y() -> i32 {
    DEFAULT_MIN_Y
}

const fn default_section_count() -> NonZeroU16 {
    match NonZeroU16::new(DEFAULT_SECTION_COUNT) {
        Some(value) => value,
        None => NonZeroU16::MIN,
    }
}
