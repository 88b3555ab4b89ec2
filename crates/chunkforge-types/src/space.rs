//! Identifiers for parallel logical spaces.
//!
//! A logical space is one of several coordinate systems that exist side by
//! side: generation-only source spaces, live target spaces, and the
//! synchronized companions of a live space. Spaces are named by short
//! string identifiers taken from configuration.

use serde::{Deserialize, Serialize};

use crate::coords::RegionCoord;

/// Name of a logical space, e.g. `overworld` or `overworld_source`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(String);

impl SpaceId {
    /// Create a space identifier from any string-like value.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for SpaceId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpaceId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// A region addressed across spaces: which space, which region.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RegionLocator {
    /// Space holding the region.
    pub space: SpaceId,
    /// Region coordinate inside that space.
    pub coord: RegionCoord,
}

impl RegionLocator {
    /// Create a locator.
    pub fn new(space: impl Into<SpaceId>, coord: RegionCoord) -> Self {
        Self {
            space: space.into(),
            coord,
        }
    }
}

impl core::fmt::Display for RegionLocator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}{}", self.space, self.coord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_plain_string() {
        let id = SpaceId::from("nether");
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"nether\""));
        assert_eq!(id.to_string(), "nether");
    }

    #[test]
    fn locator_display_joins_space_and_coord() {
        let locator = RegionLocator::new("nether", RegionCoord::new(-1, 2));
        assert_eq!(locator.to_string(), "nether[-1, 2]");
    }
}
