//! Single-cell emptiness check for target regions.
//!
//! A region is "empty" when its reference cell (horizontal middle, top
//! usable height) still holds the sentinel block or a trigger marker
//! sitting on unset ground. Only that one cell is inspected. A region whose
//! top-middle cell holds any other content is treated as populated.

use chunkforge_types::{BlockId, CellContent, CellPos};

use crate::region::Region;

/// Decides whether a region may receive a copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptinessOracle {
    sentinel: BlockId,
}

impl EmptinessOracle {
    /// Create an oracle that treats `sentinel` as unset ground.
    pub const fn new(sentinel: BlockId) -> Self {
        Self { sentinel }
    }

    /// The sentinel block.
    pub const fn sentinel(self) -> BlockId {
        self.sentinel
    }

    /// Position of the single cell this oracle inspects.
    pub fn reference_cell(region: &Region) -> CellPos {
        region.layout().reference_cell(region.coord())
    }

    /// Whether the region may receive a copy: the reference cell is the
    /// sentinel, or a marker waiting to provision this region.
    pub fn is_empty(self, region: &Region) -> bool {
        match region.cell(Self::reference_cell(region)) {
            Some(CellContent::Block(block)) => block == self.sentinel,
            Some(CellContent::Marker(_)) => true,
            None => false,
        }
    }

    /// Whether the reference cell already holds a trigger marker.
    pub fn is_pending(region: &Region) -> bool {
        region
            .cell(Self::reference_cell(region))
            .is_some_and(CellContent::is_marker)
    }

    /// Emptiness as seen by the synchronization router: empty and not
    /// already carrying a pending marker.
    pub fn is_empty_for_sync(self, region: &Region) -> bool {
        self.is_empty(region) && !Self::is_pending(region)
    }
}
