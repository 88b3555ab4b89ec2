//! Scheduling cycle: drives every live trigger one step per tick.
//!
//! The [`Provisioner`] owns one [`ProvisioningMachine`] per trigger marker
//! and exposes the three hooks a host calls:
//!
//! 1. [`on_trigger_placed`](Provisioner::on_trigger_placed) -- a marker was
//!    written; start a machine for it.
//! 2. [`on_invalidated`](Provisioner::on_invalidated) -- the marker's cell
//!    was destroyed or unloaded; drop its machine.
//! 3. [`on_tick`](Provisioner::on_tick) -- one scheduling cycle.
//!
//! Each tick, for every machine:
//!
//! - If the marker is gone from its cell, the machine is cancelled.
//! - Otherwise the machine advances and the resulting [`Effect`] is applied
//!   to the host: copy, synchronize, spawn, or abort.
//! - Markers planted by the router start their own machines on the next
//!   tick.
//!
//! A failure inside one machine is logged and drops only that machine; the
//! rest of the tick carries on.

use std::collections::BTreeMap;

use chunkforge_types::{
    CellContent, CellPos, Direction, MarkerId, RegionLocator, SpaceId, TriggerId, UpdateFlags,
};
use chunkforge_world::{CopyOutcome, EmptinessOracle, RegionCopyEngine, WorldError, WorldHost};
use tracing::{debug, info, warn};

use crate::config::{ConfigError, GameplayConfig, ProvisioningConfig};
use crate::machine::{Effect, ProvisioningMachine, TickContext};
use crate::router::{PlantedTrigger, SynchronizationRouter};
use crate::spaces::SpaceTable;
use crate::trigger::{TriggerDef, TriggerTable};

/// Errors that can occur while handling one trigger.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A world operation failed.
    #[error("world error: {source}")]
    World {
        /// The underlying world error.
        #[from]
        source: WorldError,
    },

    /// The trigger was placed in a space that is not configured.
    #[error("unknown space: {0}")]
    UnknownSpace(SpaceId),

    /// The marker does not name a configured trigger.
    #[error("unknown trigger marker {marker}")]
    UnknownMarker {
        /// Raw marker value.
        marker: u16,
    },

    /// No trigger is configured under this name.
    #[error("unknown trigger '{name}'")]
    UnknownTrigger {
        /// The requested name.
        name: String,
    },
}

/// Counters describing one scheduling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// No observer was present; no machine advanced.
    pub stalled: bool,
    /// Regions copied.
    pub copies: u32,
    /// Copies skipped because the target was no longer empty.
    pub copies_skipped: u32,
    /// Linked markers planted.
    pub plants: u32,
    /// Entity spawns issued.
    pub spawns: u32,
    /// Machines that completed normally.
    pub completed: u32,
    /// Machines aborted because their trigger was invalid.
    pub aborted: u32,
    /// Machines dropped because their marker disappeared.
    pub cancelled: u32,
    /// Machines dropped because a host operation failed.
    pub failed: u32,
    /// Machines still pending after the tick.
    pub active: u32,
}

/// A trigger marker being provisioned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveTrigger {
    /// Runtime identifier.
    pub id: TriggerId,
    /// Marker stored in the cell.
    pub marker: MarkerId,
    /// Region being provisioned.
    pub target: RegionLocator,
    /// Cell holding the marker.
    pub pos: CellPos,
    /// The trigger's state machine.
    pub machine: ProvisioningMachine,
}

/// How one machine's step ended.
enum Step {
    /// Keep the machine for the next tick.
    Keep,
    /// The machine is done and can be dropped.
    Drop,
}

/// The per-cycle provisioning hook.
#[derive(Debug, Clone)]
pub struct Provisioner {
    spaces: SpaceTable,
    triggers: TriggerTable,
    oracle: EmptinessOracle,
    copier: RegionCopyEngine,
    router: SynchronizationRouter,
    gameplay: GameplayConfig,
    seed: u64,
    anchor: Direction,
    active: BTreeMap<TriggerId, ActiveTrigger>,
    tick: u64,
}

impl Provisioner {
    /// Build a provisioner from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the configuration is
    /// inconsistent.
    pub fn from_config(config: &ProvisioningConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let spaces = SpaceTable::build(&config.spaces)?;
        let triggers = TriggerTable::build(&config.triggers, &config.sync_trigger)?;
        let oracle = EmptinessOracle::new(config.world.sentinel_block);
        Ok(Self {
            router: SynchronizationRouter::new(oracle, triggers.sync_marker()),
            copier: RegionCopyEngine::new(oracle),
            oracle,
            spaces,
            triggers,
            gameplay: config.gameplay,
            seed: config.world.seed,
            anchor: config.world.marker_anchor,
            active: BTreeMap::new(),
            tick: 0,
        })
    }

    /// Configured spaces.
    pub const fn spaces(&self) -> &SpaceTable {
        &self.spaces
    }

    /// Configured triggers.
    pub const fn triggers(&self) -> &TriggerTable {
        &self.triggers
    }

    /// Emptiness check used for copies and plants.
    pub const fn oracle(&self) -> EmptinessOracle {
        self.oracle
    }

    /// Gameplay rules.
    pub const fn gameplay(&self) -> GameplayConfig {
        self.gameplay
    }

    /// Number of ticks executed so far.
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Whether no trigger is pending.
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Number of pending triggers.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Pending triggers, oldest first.
    pub fn active(&self) -> impl Iterator<Item = &ActiveTrigger> {
        self.active.values()
    }

    /// Start provisioning for a marker written at `pos` in `space`.
    ///
    /// Placing the same marker at the same cell twice returns the existing
    /// trigger.
    ///
    /// # Errors
    ///
    /// Returns [`TickError::UnknownSpace`] or [`TickError::UnknownMarker`]
    /// for markers the configuration does not describe.
    pub fn on_trigger_placed(
        &mut self,
        space: &SpaceId,
        pos: CellPos,
        marker: MarkerId,
    ) -> Result<TriggerId, TickError> {
        let layout = self
            .spaces
            .layout(space)
            .ok_or_else(|| TickError::UnknownSpace(space.clone()))?;
        if self.triggers.get(marker).is_none() {
            return Err(TickError::UnknownMarker { marker: marker.0 });
        }
        if let Some(existing) = self
            .active
            .values()
            .find(|t| t.pos == pos && t.target.space == *space && t.marker == marker)
        {
            return Ok(existing.id);
        }
        let trigger = ActiveTrigger {
            id: TriggerId::new(),
            marker,
            target: RegionLocator::new(space.clone(), layout.region_of(pos)),
            pos,
            machine: ProvisioningMachine::new(),
        };
        let id = trigger.id;
        info!(trigger = %id, region = %trigger.target, pos = %pos, "Trigger placed");
        self.active.insert(id, trigger);
        Ok(id)
    }

    /// Drop the machine for the marker at `pos` in `space`.
    ///
    /// Returns `true` if a machine was removed.
    pub fn on_invalidated(&mut self, space: &SpaceId, pos: CellPos) -> bool {
        let before = self.active.len();
        self.active
            .retain(|_, t| !(t.pos == pos && t.target.space == *space));
        let removed = self.active.len() < before;
        if removed {
            debug!(space = %space, pos = %pos, "Trigger invalidated");
        }
        removed
    }

    /// Run one scheduling cycle.
    pub fn on_tick<H: WorldHost + ?Sized>(&mut self, host: &mut H) -> TickSummary {
        self.tick = self.tick.saturating_add(1);
        let mut summary = TickSummary {
            tick: self.tick,
            ..TickSummary::default()
        };

        if !host.has_active_observers() {
            summary.stalled = true;
            summary.active = count(self.active.len());
            debug!(tick = self.tick, pending = self.active.len(), "No observers, stalled");
            return summary;
        }

        let ids: Vec<TriggerId> = self.active.keys().copied().collect();
        let mut planted = Vec::new();
        for id in ids {
            let Some(mut trigger) = self.active.remove(&id) else {
                continue;
            };
            match self.step(host, &mut trigger, &mut summary, &mut planted) {
                Ok(Step::Keep) => {
                    self.active.insert(id, trigger);
                }
                Ok(Step::Drop) => {}
                Err(err) => {
                    warn!(trigger = %id, region = %trigger.target, error = %err, "Trigger step failed, dropping");
                    summary.failed = summary.failed.saturating_add(1);
                }
            }
        }

        for plant in planted {
            if let Err(err) = self.on_trigger_placed(&plant.region.space, plant.pos, plant.marker) {
                warn!(region = %plant.region, error = %err, "Planted trigger could not be registered");
            }
        }

        summary.active = count(self.active.len());
        summary
    }

    fn step<H: WorldHost + ?Sized>(
        &self,
        host: &mut H,
        trigger: &mut ActiveTrigger,
        summary: &mut TickSummary,
        planted: &mut Vec<PlantedTrigger>,
    ) -> Result<Step, TickError> {
        let space = trigger.target.space.clone();
        if host.get_cell(&space, trigger.pos)? != CellContent::Marker(trigger.marker) {
            info!(trigger = %trigger.id, pos = %trigger.pos, "Marker gone, trigger cancelled");
            summary.cancelled = summary.cancelled.saturating_add(1);
            return Ok(Step::Drop);
        }

        let def = self
            .triggers
            .get(trigger.marker)
            .ok_or(TickError::UnknownMarker {
                marker: trigger.marker.0,
            })?;
        let source = self.source_for(host, def, &trigger.target);
        let ctx = TickContext {
            observers_present: true,
            trigger_valid: source.is_some(),
        };
        let Some(effect) = trigger.machine.advance(ctx) else {
            return Ok(Step::Keep);
        };
        debug!(trigger = %trigger.id, counter = trigger.machine.counter(), effect = ?effect, "Machine effect");

        match (effect, source) {
            (Effect::CopyRegion, Some(source)) => {
                match self.copier.copy(host, &source, &trigger.target)? {
                    CopyOutcome::Copied { sections } => {
                        info!(trigger = %trigger.id, source = %source, target = %trigger.target, sections, "Region copied");
                        summary.copies = summary.copies.saturating_add(1);
                    }
                    CopyOutcome::SkippedNotEmpty => {
                        debug!(trigger = %trigger.id, target = %trigger.target, "Copy skipped, target populated");
                        summary.copies_skipped = summary.copies_skipped.saturating_add(1);
                    }
                }
                Ok(Step::Keep)
            }
            (Effect::Synchronize, Some(_)) => {
                let plant = self.router.try_plant_one(host, &self.spaces, &trigger.target)?;
                trigger.machine.record_sync(plant.is_some());
                if let Some(plant) = plant {
                    summary.plants = summary.plants.saturating_add(1);
                    planted.push(plant);
                }
                Ok(Step::Keep)
            }
            (Effect::SpawnEntities, Some(source)) => {
                host.spawn_entities(&trigger.target, &source)?;
                summary.spawns = summary.spawns.saturating_add(1);
                if host.get_cell(&space, trigger.pos)? == CellContent::Marker(trigger.marker) {
                    self.replace_marker(host, &space, trigger.pos)?;
                }
                info!(trigger = %trigger.id, region = %trigger.target, "Trigger completed");
                summary.completed = summary.completed.saturating_add(1);
                Ok(Step::Drop)
            }
            (Effect::Abort, _) | (_, None) => {
                self.replace_marker(host, &space, trigger.pos)?;
                info!(trigger = %trigger.id, region = %trigger.target, name = %def.name, "Trigger invalid here, aborted");
                summary.aborted = summary.aborted.saturating_add(1);
                Ok(Step::Drop)
            }
        }
    }

    /// Source region for `def` placed in `target`, or `None` if the trigger
    /// is not valid there.
    fn source_for<H: WorldHost + ?Sized>(
        &self,
        host: &H,
        def: &TriggerDef,
        target: &RegionLocator,
    ) -> Option<RegionLocator> {
        if !def.is_valid_for(&target.space) {
            return None;
        }
        let space = def.source_space(&self.spaces, &target.space)?;
        if !host.is_space_live(&space) {
            return None;
        }
        Some(RegionLocator::new(space, def.derive_source(self.seed, target.coord)))
    }

    /// Overwrite the marker at `pos` with the content of its anchor
    /// neighbour.
    fn replace_marker<H: WorldHost + ?Sized>(
        &self,
        host: &mut H,
        space: &SpaceId,
        pos: CellPos,
    ) -> Result<(), TickError> {
        let content = match host.get_cell(space, pos.relative(self.anchor)) {
            Ok(content) => content,
            Err(WorldError::CellOutOfRange { .. }) => CellContent::Block(self.oracle.sentinel()),
            Err(err) => return Err(err.into()),
        };
        host.set_cell(space, pos, content, UpdateFlags::ALL)?;
        Ok(())
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chunkforge_types::{BiomeId, BlockId, RegionCoord, RegionLayout};
    use chunkforge_world::{MemoryWorld, PatternGenerator, SentinelGenerator};

    use super::*;
    use crate::config::{SpaceConfig, TriggerConfig};
    use crate::trigger::TriggerKind;

    fn layout() -> RegionLayout {
        RegionLayout::new(8, 4, 0, 2).unwrap()
    }

    fn config() -> ProvisioningConfig {
        let space = |id: &str, source: Option<&str>| SpaceConfig {
            id: SpaceId::from(id),
            scale: 1.0,
            layout: layout(),
            source: source.map(SpaceId::from),
            synchronized: Vec::new(),
            generation_only: source.is_none(),
        };
        ProvisioningConfig {
            spaces: vec![space("live", Some("gen")), space("gen", None)],
            triggers: vec![
                TriggerConfig {
                    name: "spawn".to_owned(),
                    kind: TriggerKind::Mirrored,
                    enabled: true,
                    valid_in: vec![SpaceId::from("live")],
                },
                TriggerConfig {
                    name: "off".to_owned(),
                    kind: TriggerKind::Mirrored,
                    enabled: false,
                    valid_in: vec![SpaceId::from("live")],
                },
            ],
            sync_trigger: "spawn".to_owned(),
            ..ProvisioningConfig::default()
        }
    }

    fn world() -> MemoryWorld {
        let mut world = MemoryWorld::new();
        world
            .add_space(
                "live",
                layout(),
                SentinelGenerator {
                    biome: BiomeId::VOID,
                    sentinel: BlockId::AIR,
                },
            )
            .add_space("gen", layout(), PatternGenerator::new(BiomeId(2), vec![BlockId(5)]));
        world
    }

    fn place(world: &mut MemoryWorld, provisioner: &mut Provisioner, marker: MarkerId) -> CellPos {
        let live = SpaceId::from("live");
        let pos = layout().reference_cell(RegionCoord::new(0, 0));
        world
            .set_cell(&live, pos, CellContent::Marker(marker), UpdateFlags::NONE)
            .unwrap();
        provisioner.on_trigger_placed(&live, pos, marker).unwrap();
        pos
    }

    #[test]
    fn placing_twice_reuses_the_trigger() {
        let mut provisioner = Provisioner::from_config(&config()).unwrap();
        let live = SpaceId::from("live");
        let pos = CellPos::new(1, 7, 1);
        let a = provisioner.on_trigger_placed(&live, pos, MarkerId(0)).unwrap();
        let b = provisioner.on_trigger_placed(&live, pos, MarkerId(0)).unwrap();
        assert_eq!(a, b);
        assert_eq!(provisioner.active_count(), 1);
    }

    #[test]
    fn unknown_space_and_marker_are_rejected() {
        let mut provisioner = Provisioner::from_config(&config()).unwrap();
        let pos = CellPos::new(0, 7, 0);
        assert!(matches!(
            provisioner.on_trigger_placed(&SpaceId::from("void"), pos, MarkerId(0)),
            Err(TickError::UnknownSpace(_))
        ));
        assert!(matches!(
            provisioner.on_trigger_placed(&SpaceId::from("live"), pos, MarkerId(9)),
            Err(TickError::UnknownMarker { marker: 9 })
        ));
    }

    #[test]
    fn disabled_trigger_aborts_and_restores_anchor_content() {
        let mut world = world();
        let mut provisioner = Provisioner::from_config(&config()).unwrap();
        let pos = place(&mut world, &mut provisioner, MarkerId(1));

        let summary = provisioner.on_tick(&mut world);
        assert_eq!(summary.aborted, 1);
        assert_eq!(summary.copies, 0);
        assert!(provisioner.is_empty());
        assert_eq!(world.get_cell(&SpaceId::from("live"), pos).unwrap(), CellContent::AIR);
        assert_eq!(world.writes().last().map(|w| w.flags), Some(UpdateFlags::ALL));
    }

    #[test]
    fn unloaded_source_space_aborts() {
        let mut world = world();
        world.set_live(&SpaceId::from("gen"), false);
        let mut provisioner = Provisioner::from_config(&config()).unwrap();
        place(&mut world, &mut provisioner, MarkerId(0));
        let summary = provisioner.on_tick(&mut world);
        assert_eq!(summary.aborted, 1);
        assert!(world.spawns().is_empty());
    }

    #[test]
    fn removed_marker_cancels() {
        let mut world = world();
        let mut provisioner = Provisioner::from_config(&config()).unwrap();
        let pos = place(&mut world, &mut provisioner, MarkerId(0));
        provisioner.on_tick(&mut world);
        world
            .set_cell(&SpaceId::from("live"), pos, CellContent::Block(BlockId(3)), UpdateFlags::ALL)
            .unwrap();
        let summary = provisioner.on_tick(&mut world);
        assert_eq!(summary.cancelled, 1);
        assert!(provisioner.is_empty());
    }

    #[test]
    fn invalidation_drops_the_machine() {
        let mut world = world();
        let mut provisioner = Provisioner::from_config(&config()).unwrap();
        let pos = place(&mut world, &mut provisioner, MarkerId(0));
        assert!(provisioner.on_invalidated(&SpaceId::from("live"), pos));
        assert!(!provisioner.on_invalidated(&SpaceId::from("live"), pos));
        assert!(provisioner.is_empty());
    }

    #[test]
    fn stalled_ticks_do_not_advance() {
        let mut world = world();
        world.set_observers(false);
        let mut provisioner = Provisioner::from_config(&config()).unwrap();
        place(&mut world, &mut provisioner, MarkerId(0));
        for _ in 0..30 {
            let summary = provisioner.on_tick(&mut world);
            assert!(summary.stalled);
            assert_eq!(summary.active, 1);
        }
        assert!(world.spawns().is_empty());
        assert_eq!(provisioner.active().next().map(|t| t.machine.counter()), Some(0));
    }

    #[test]
    fn full_run_copies_then_spawns_once() {
        let mut world = world();
        let mut provisioner = Provisioner::from_config(&config()).unwrap();
        let pos = place(&mut world, &mut provisioner, MarkerId(0));

        let first = provisioner.on_tick(&mut world);
        assert_eq!(first.copies, 1);
        let mut spawns: u32 = 0;
        for _ in 1..20 {
            spawns = spawns.saturating_add(provisioner.on_tick(&mut world).spawns);
        }
        assert_eq!(spawns, 1);
        assert!(provisioner.is_empty());
        assert_eq!(world.spawns().len(), 1);
        // Marker replaced by its northern neighbour, which was copied from the source.
        assert_eq!(
            world.get_cell(&SpaceId::from("live"), pos).unwrap(),
            CellContent::Block(BlockId(5))
        );
    }
}
