//! Trigger kinds and the trigger table.
//!
//! A trigger is a marker written into a target region's top layer. Each
//! configured trigger carries, as data, how to find the region it copies
//! from ([`TriggerKind`]) and where it may be used (`valid_in`). The table
//! interns triggers by position: trigger `i` is stored in cells as
//! [`MarkerId`]`(i)`.

use chunkforge_types::{MarkerId, RegionCoord, SpaceId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, TriggerConfig};
use crate::spaces::SpaceTable;

/// How a trigger locates its source region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerKind {
    /// Copy the same region coordinate from the target space's source
    /// space.
    Mirrored,
    /// Copy a region picked at random within `spread` regions of the
    /// target coordinate, in the target space's source space. The pick is
    /// seeded from the world seed and the target coordinate, so it is
    /// stable across ticks.
    Random {
        /// Maximum offset in regions along each axis.
        #[serde(default = "default_spread")]
        spread: u16,
    },
    /// Copy the same region coordinate from a dedicated generation space,
    /// e.g. one generating a single biome family.
    Themed {
        /// The dedicated generation space.
        source: SpaceId,
    },
}

/// A configured trigger with its interned marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerDef {
    /// Marker written into cells for this trigger.
    pub marker: MarkerId,
    /// Unique configured name.
    pub name: String,
    /// Source derivation.
    pub kind: TriggerKind,
    /// Disabled triggers abort on their first tick.
    pub enabled: bool,
    /// Spaces this trigger may provision.
    pub valid_in: Vec<SpaceId>,
}

impl TriggerDef {
    /// Space the trigger copies from when placed in `target`.
    pub fn source_space(&self, spaces: &SpaceTable, target: &SpaceId) -> Option<SpaceId> {
        match &self.kind {
            TriggerKind::Mirrored | TriggerKind::Random { .. } => spaces.source_of(target).cloned(),
            TriggerKind::Themed { source } => Some(source.clone()),
        }
    }

    /// Region the trigger copies from when placed in region `target`.
    pub fn derive_source(&self, seed: u64, target: RegionCoord) -> RegionCoord {
        match &self.kind {
            TriggerKind::Mirrored | TriggerKind::Themed { .. } => target,
            TriggerKind::Random { spread } => {
                let spread = i32::from(*spread);
                let mut rng = StdRng::seed_from_u64(mix(seed, target));
                let dx: i32 = rng.random_range(-spread..=spread);
                let dz: i32 = rng.random_range(-spread..=spread);
                RegionCoord::new(target.x.saturating_add(dx), target.z.saturating_add(dz))
            }
        }
    }

    /// Whether the trigger may run in `target`.
    pub fn is_valid_for(&self, target: &SpaceId) -> bool {
        self.enabled && self.valid_in.contains(target)
    }
}

/// All configured triggers, indexed by marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerTable {
    defs: Vec<TriggerDef>,
    sync_marker: MarkerId,
}

impl TriggerTable {
    /// Build the table from configured triggers.
    ///
    /// `sync_trigger` names the trigger planted by the synchronization
    /// router.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] on duplicate names, an unknown
    /// `sync_trigger`, or more triggers than markers can address.
    pub fn build(triggers: &[TriggerConfig], sync_trigger: &str) -> Result<Self, ConfigError> {
        let mut defs: Vec<TriggerDef> = Vec::with_capacity(triggers.len());
        for (index, trigger) in triggers.iter().enumerate() {
            if defs.iter().any(|d| d.name == trigger.name) {
                return Err(ConfigError::invalid(format!(
                    "duplicate trigger name '{}'",
                    trigger.name
                )));
            }
            let marker = u16::try_from(index)
                .map(MarkerId)
                .map_err(|_err| ConfigError::invalid("too many triggers"))?;
            defs.push(TriggerDef {
                marker,
                name: trigger.name.clone(),
                kind: trigger.kind.clone(),
                enabled: trigger.enabled,
                valid_in: trigger.valid_in.clone(),
            });
        }
        let sync_marker = defs
            .iter()
            .find(|d| d.name == sync_trigger)
            .map(|d| d.marker)
            .ok_or_else(|| {
                ConfigError::invalid(format!("sync_trigger '{sync_trigger}' is not a configured trigger"))
            })?;
        Ok(Self { defs, sync_marker })
    }

    /// Trigger interned as `marker`.
    pub fn get(&self, marker: MarkerId) -> Option<&TriggerDef> {
        self.defs.get(usize::from(marker.0))
    }

    /// Trigger configured under `name`.
    pub fn by_name(&self, name: &str) -> Option<&TriggerDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    /// Marker planted by the synchronization router.
    pub const fn sync_marker(&self) -> MarkerId {
        self.sync_marker
    }

    /// All triggers in marker order.
    pub fn iter(&self) -> impl Iterator<Item = &TriggerDef> {
        self.defs.iter()
    }
}

/// Fold the world seed and a region coordinate into one RNG seed.
fn mix(seed: u64, coord: RegionCoord) -> u64 {
    let x = u64::from_le_bytes(i64::from(coord.x).to_le_bytes());
    let z = u64::from_le_bytes(i64::from(coord.z).to_le_bytes());
    seed ^ x.rotate_left(32) ^ z.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

const fn default_spread() -> u16 {
    8
}
