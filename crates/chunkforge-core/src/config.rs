//! Configuration loading and typed config structures for chunkforge.
//!
//! The canonical configuration lives in `chunkforge-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, a loader, and [`ProvisioningConfig::validate`], which
//! checks the cross references the loader cannot.

use std::path::{Path, PathBuf};

use chunkforge_types::{BlockId, Direction, RegionLayout, SpaceId};
use serde::Deserialize;

use crate::spaces::SpaceTable;
use crate::trigger::{TriggerKind, TriggerTable};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but is inconsistent.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// What is wrong.
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for [`ConfigError::Invalid`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: reason.into(),
        }
    }
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level provisioning configuration.
///
/// Mirrors the structure of `chunkforge-config.yaml`. Every field has a
/// default, so an empty document describes two live spaces linked to each
/// other, each with its own generation-only source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProvisioningConfig {
    /// World-level settings.
    #[serde(default)]
    pub world: WorldConfig,

    /// Logical spaces.
    #[serde(default = "default_spaces")]
    pub spaces: Vec<SpaceConfig>,

    /// Trigger kinds, in marker order.
    #[serde(default = "default_triggers")]
    pub triggers: Vec<TriggerConfig>,

    /// Name of the trigger the synchronization router plants.
    #[serde(default = "default_sync_trigger")]
    pub sync_trigger: String,

    /// Gameplay rules.
    #[serde(default)]
    pub gameplay: GameplayConfig,

    /// Auxiliary data sources.
    #[serde(default)]
    pub auxiliary: AuxiliaryConfig,

    /// Simulation boundary parameters.
    #[serde(default)]
    pub simulation: SimulationBoundsConfig,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            spaces: default_spaces(),
            triggers: default_triggers(),
            sync_trigger: default_sync_trigger(),
            gameplay: GameplayConfig::default(),
            auxiliary: AuxiliaryConfig::default(),
            simulation: SimulationBoundsConfig::default(),
        }
    }
}

impl ProvisioningConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yml::from_str(&contents)?;
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Check cross references between spaces and triggers.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for non-positive scales, references
    /// to unknown spaces, and unknown or duplicate trigger names.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let spaces = SpaceTable::build(&self.spaces)?;
        let triggers = TriggerTable::build(&self.triggers, &self.sync_trigger)?;
        for trigger in triggers.iter() {
            for space in &trigger.valid_in {
                if !spaces.contains(space) {
                    return Err(ConfigError::invalid(format!(
                        "trigger '{}' is valid in unknown space '{space}'",
                        trigger.name
                    )));
                }
            }
            if let TriggerKind::Themed { source } = &trigger.kind {
                if !spaces.contains(source) {
                    return Err(ConfigError::invalid(format!(
                        "trigger '{}' copies from unknown space '{source}'",
                        trigger.name
                    )));
                }
            }
        }
        Ok(())
    }
}

/// World-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Seed for random-source trigger derivation.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per scheduling cycle.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Block that marks unset ground.
    #[serde(default = "default_sentinel_block")]
    pub sentinel_block: BlockId,

    /// Direction of the cell whose content replaces a consumed marker.
    #[serde(default = "default_marker_anchor")]
    pub marker_anchor: Direction,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            sentinel_block: default_sentinel_block(),
            marker_anchor: default_marker_anchor(),
        }
    }
}

/// One logical space.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpaceConfig {
    /// Space identifier.
    pub id: SpaceId,

    /// Scale relative to the reference space.
    #[serde(default = "default_scale")]
    pub scale: f64,

    /// Region geometry.
    #[serde(default)]
    pub layout: RegionLayout,

    /// Generation-only companion this space copies from.
    #[serde(default)]
    pub source: Option<SpaceId>,

    /// Linked spaces, in synchronization order.
    #[serde(default)]
    pub synchronized: Vec<SpaceId>,

    /// Whether the space only exists to be copied from.
    #[serde(default)]
    pub generation_only: bool,
}

/// One trigger kind.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TriggerConfig {
    /// Unique trigger name.
    pub name: String,

    /// How the trigger finds its source region.
    #[serde(default = "default_trigger_kind")]
    pub kind: TriggerKind,

    /// Disabled triggers abort on their first tick.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Spaces the trigger may provision.
    #[serde(default)]
    pub valid_in: Vec<SpaceId>,
}

/// Gameplay rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct GameplayConfig {
    /// Whether blocks may be placed in regions that were never provisioned.
    #[serde(default = "default_true")]
    pub block_placement_allowed_outside_spawned_regions: bool,
}

impl Default for GameplayConfig {
    fn default() -> Self {
        Self {
            block_placement_allowed_outside_spawned_regions: true,
        }
    }
}

/// Auxiliary data sources.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct AuxiliaryConfig {
    /// Directory of scanner data JSON files. `None` disables the reload.
    #[serde(default)]
    pub scanner_data_dir: Option<PathBuf>,
}

/// Simulation boundary parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct SimulationBoundsConfig {
    /// Maximum number of scheduling cycles (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Stop once no trigger is pending.
    #[serde(default = "default_true")]
    pub stop_when_idle: bool,
}

impl Default for SimulationBoundsConfig {
    fn default() -> Self {
        Self {
            max_ticks: 0,
            stop_when_idle: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    50
}

const fn default_sentinel_block() -> BlockId {
    BlockId::AIR
}

const fn default_marker_anchor() -> Direction {
    Direction::North
}

const fn default_scale() -> f64 {
    1.0
}

const fn default_true() -> bool {
    true
}

const fn default_trigger_kind() -> TriggerKind {
    TriggerKind::Mirrored
}

fn default_sync_trigger() -> String {
    "spawn_region".to_owned()
}

fn default_spaces() -> Vec<SpaceConfig> {
    let space = |id: &str, scale: f64, source: Option<&str>, synchronized: &[&str]| SpaceConfig {
        id: SpaceId::from(id),
        scale,
        layout: RegionLayout::default(),
        source: source.map(SpaceId::from),
        synchronized: synchronized.iter().copied().map(SpaceId::from).collect(),
        generation_only: source.is_none(),
    };
    vec![
        space("overworld", 1.0, Some("overworld_source"), &["the_nether"]),
        space("overworld_source", 1.0, None, &[]),
        space("the_nether", 8.0, Some("nether_source"), &["overworld"]),
        space("nether_source", 8.0, None, &[]),
    ]
}

fn default_triggers() -> Vec<TriggerConfig> {
    vec![
        TriggerConfig {
            name: default_sync_trigger(),
            kind: TriggerKind::Mirrored,
            enabled: true,
            valid_in: vec![SpaceId::from("overworld"), SpaceId::from("the_nether")],
        },
        TriggerConfig {
            name: "spawn_random_region".to_owned(),
            kind: TriggerKind::Random { spread: 8 },
            enabled: true,
            valid_in: vec![SpaceId::from("overworld")],
        },
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ProvisioningConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.seed, 42);
        assert_eq!(config.world.marker_anchor, Direction::North);
        assert_eq!(config.spaces.len(), 4);
        assert_eq!(config.sync_trigger, "spawn_region");
    }

    #[test]
    fn empty_document_uses_defaults() {
        let config = ProvisioningConfig::parse("{}").unwrap();
        assert_eq!(config, ProvisioningConfig::default());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
world:
  seed: 7
  tick_interval_ms: 0
  sentinel_block: 0
  marker_anchor: east

spaces:
  - id: live
    scale: 1.0
    source: live_source
    synchronized: [mirror]
    layout:
      width: 8
      section_height: 4
      min_y: 0
      section_count: 2
  - id: live_source
    generation_only: true
    layout:
      width: 8
      section_height: 4
      min_y: 0
      section_count: 2
  - id: mirror
    scale: 8.0
    source: live_source
  - id: forest_source
    generation_only: true

triggers:
  - name: basic
    valid_in: [live, mirror]
  - name: forest
    kind:
      type: themed
      source: forest_source
    valid_in: [live]
  - name: lucky
    enabled: false
    kind:
      type: random
      spread: 2

sync_trigger: basic

gameplay:
  block_placement_allowed_outside_spawned_regions: false

auxiliary:
  scanner_data_dir: data/scanner

simulation:
  max_ticks: 100
  stop_when_idle: false
";
        let config = ProvisioningConfig::parse(yaml).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.world.seed, 7);
        assert_eq!(config.world.marker_anchor, Direction::East);
        assert_eq!(config.spaces.len(), 4);
        assert_eq!(config.spaces.first().map(|s| s.layout.width()), Some(8));
        assert_eq!(config.triggers.len(), 3);
        assert_eq!(config.triggers.first().map(|t| &t.kind), Some(&TriggerKind::Mirrored));
        assert!(!config.gameplay.block_placement_allowed_outside_spawned_regions);
        assert_eq!(
            config.auxiliary.scanner_data_dir.as_deref(),
            Some(Path::new("data/scanner"))
        );
        assert_eq!(config.simulation.max_ticks, 100);
        assert!(!config.simulation.stop_when_idle);
    }

    #[test]
    fn unknown_trigger_space_is_invalid() {
        let mut config = ProvisioningConfig::default();
        if let Some(trigger) = config.triggers.first_mut() {
            trigger.valid_in.push(SpaceId::from("the_end"));
        }
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn unknown_themed_source_is_invalid() {
        let mut config = ProvisioningConfig::default();
        config.triggers.push(TriggerConfig {
            name: "forest".to_owned(),
            kind: TriggerKind::Themed {
                source: SpaceId::from("forest_source"),
            },
            enabled: true,
            valid_in: vec![SpaceId::from("overworld")],
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let result = ProvisioningConfig::parse("spaces: [unterminated");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = ProvisioningConfig::from_file(Path::new("/nonexistent/chunkforge-config.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
