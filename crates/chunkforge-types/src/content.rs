//! Values stored in region cells.
//!
//! Each cell of a region carries two things: an attribute value
//! ([`BiomeId`], biome-like categorical data) and a content value
//! ([`CellContent`], block-like data). Content is either an ordinary
//! block or a trigger marker waiting for provisioning.

use serde::{Deserialize, Serialize};

/// Numeric block identifier. Meaning is owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u16);

impl BlockId {
    /// The empty block. Also the default "unset ground" sentinel.
    pub const AIR: Self = Self(0);
}

/// Numeric biome identifier. Meaning is owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BiomeId(pub u16);

impl BiomeId {
    /// Biome assigned to cells nobody has written yet.
    pub const VOID: Self = Self(0);
}

/// Index of a configured trigger kind.
///
/// Markers are interned: the trigger table assigns each configured trigger
/// a stable `MarkerId` by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MarkerId(pub u16);

/// Content of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellContent {
    /// An ordinary block.
    Block(BlockId),
    /// A trigger marker signalling "provisioning pending here".
    Marker(MarkerId),
}

impl CellContent {
    /// Shorthand for `CellContent::Block(BlockId::AIR)`.
    pub const AIR: Self = Self::Block(BlockId::AIR);

    /// Return the marker id if this cell holds a trigger marker.
    pub const fn marker(self) -> Option<MarkerId> {
        match self {
            Self::Marker(id) => Some(id),
            Self::Block(_) => None,
        }
    }

    /// Whether this cell holds any trigger marker.
    pub const fn is_marker(self) -> bool {
        matches!(self, Self::Marker(_))
    }
}

impl Default for CellContent {
    fn default() -> Self {
        Self::AIR
    }
}

impl From<BlockId> for CellContent {
    fn from(block: BlockId) -> Self {
        Self::Block(block)
    }
}

/// Side-effect flags passed to the host when writing a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UpdateFlags(u8);

impl UpdateFlags {
    /// Write silently: no neighbour updates, no broadcast.
    pub const NONE: Self = Self(0);
    /// Notify neighbouring cells of the change.
    pub const NEIGHBOURS: Self = Self(1);
    /// Broadcast the change to observers.
    pub const OBSERVERS: Self = Self(2);
    /// Neighbour updates and broadcast.
    pub const ALL: Self = Self(3);

    /// Whether every flag in `other` is also set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}
