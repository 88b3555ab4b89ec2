//! Logical spaces and the coordinate transform between them.
//!
//! Every space carries a scale factor relative to a shared reference.
//! Moving from space `a` to space `b` multiplies horizontal cell
//! coordinates by `scale(a) / scale(b)`.

use std::collections::BTreeMap;

use chunkforge_types::{CellPos, RegionCoord, RegionLayout, SpaceId};

use crate::config::{ConfigError, SpaceConfig};

/// A configured logical space.
#[derive(Debug, Clone, PartialEq)]
pub struct SpaceDef {
    /// Space identifier.
    pub id: SpaceId,
    /// Scale relative to the reference space.
    pub scale: f64,
    /// Region geometry.
    pub layout: RegionLayout,
    /// Generation-only companion this space copies from.
    pub source: Option<SpaceId>,
    /// Linked spaces, in synchronization order.
    pub synchronized: Vec<SpaceId>,
    /// Whether this space only exists to be copied from.
    pub generation_only: bool,
}

/// All configured spaces.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SpaceTable {
    spaces: BTreeMap<SpaceId, SpaceDef>,
}

impl SpaceTable {
    /// Build the table, checking scales and cross references.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for duplicate ids, non-positive or
    /// non-finite scales, and references to unknown spaces.
    pub fn build(configs: &[SpaceConfig]) -> Result<Self, ConfigError> {
        let mut spaces = BTreeMap::new();
        for config in configs {
            if !(config.scale.is_finite() && config.scale > 0.0) {
                return Err(ConfigError::invalid(format!(
                    "space '{}' has invalid scale {}",
                    config.id, config.scale
                )));
            }
            let def = SpaceDef {
                id: config.id.clone(),
                scale: config.scale,
                layout: config.layout,
                source: config.source.clone(),
                synchronized: config.synchronized.clone(),
                generation_only: config.generation_only,
            };
            if spaces.insert(config.id.clone(), def).is_some() {
                return Err(ConfigError::invalid(format!("duplicate space '{}'", config.id)));
            }
        }
        for def in spaces.values() {
            let referenced = def.source.iter().chain(&def.synchronized);
            for other in referenced {
                if !spaces.contains_key(other) {
                    return Err(ConfigError::invalid(format!(
                        "space '{}' references unknown space '{other}'",
                        def.id
                    )));
                }
            }
        }
        Ok(Self { spaces })
    }

    /// Look up a space.
    pub fn get(&self, space: &SpaceId) -> Option<&SpaceDef> {
        self.spaces.get(space)
    }

    /// Whether `space` is configured.
    pub fn contains(&self, space: &SpaceId) -> bool {
        self.spaces.contains_key(space)
    }

    /// All spaces in id order.
    pub fn iter(&self) -> impl Iterator<Item = &SpaceDef> {
        self.spaces.values()
    }

    /// Region geometry of `space`.
    pub fn layout(&self, space: &SpaceId) -> Option<RegionLayout> {
        self.get(space).map(|def| def.layout)
    }

    /// Generation-only companion of `space`.
    pub fn source_of(&self, space: &SpaceId) -> Option<&SpaceId> {
        self.get(space)?.source.as_ref()
    }

    /// Spaces linked to `space`, in synchronization order.
    pub fn synchronized(&self, space: &SpaceId) -> &[SpaceId] {
        match self.get(space) {
            Some(def) => &def.synchronized,
            None => &[],
        }
    }

    /// Factor converting horizontal coordinates of `from` into `to`.
    pub fn scale(&self, from: &SpaceId, to: &SpaceId) -> Option<f64> {
        Some(self.get(from)?.scale / self.get(to)?.scale)
    }

    /// Region of `to` linked to region `coord` of `from`: the region
    /// containing the scaled horizontal middle of `coord`.
    pub fn linked_region(&self, from: &SpaceId, coord: RegionCoord, to: &SpaceId) -> Option<RegionCoord> {
        let scale = self.scale(from, to)?;
        let middle = self.layout(from)?.middle_cell(coord, 0);
        let scaled = CellPos::new(scale_axis(middle.x, scale), 0, scale_axis(middle.z, scale));
        Some(self.layout(to)?.region_of(scaled))
    }
}

/// Scale one cell coordinate, flooring towards negative infinity.
#[allow(clippy::cast_possible_truncation)] // `as` saturates at the i32 bounds.
fn scale_axis(value: i32, scale: f64) -> i32 {
    (f64::from(value) * scale).floor() as i32
}
