//! Per-trigger provisioning state machine.
//!
//! The machine is polled once per scheduling cycle with a [`TickContext`]
//! and answers with at most one [`Effect`] for the scheduler to carry out.
//! It never touches the world itself.
//!
//! # Timeline
//!
//! | counter | effect |
//! |---|---|
//! | [`TICKS_TO_SPAWN_CHUNK`] | [`Effect::CopyRegion`] |
//! | [`TICKS_TO_SYNCH_CHUNK`] | [`Effect::Synchronize`], repeated while it plants |
//! | `>=` [`TICKS_TO_SPAWN_ENTITIES`] | [`Effect::SpawnEntities`], then done |
//!
//! The counter only advances on ticks where an observer is present. An
//! invalid trigger aborts on the next eligible tick.

/// Counter value at which the source region is copied.
pub const TICKS_TO_SPAWN_CHUNK: u32 = 1;

/// Counter value at which linked regions are synchronized.
pub const TICKS_TO_SYNCH_CHUNK: u32 = 3;

/// Counter value from which entities are spawned.
pub const TICKS_TO_SPAWN_ENTITIES: u32 = 20;

/// What the world looked like this tick, as far as the machine cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickContext {
    /// At least one observer is present.
    pub observers_present: bool,
    /// The trigger may run in its space and its source space is live.
    pub trigger_valid: bool,
}

/// Work the scheduler must perform for this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Replace the marker with its anchor neighbour and stop.
    Abort,
    /// Copy the source region into the target region.
    CopyRegion,
    /// Ask the router to plant one linked trigger, then report back with
    /// [`ProvisioningMachine::record_sync`].
    Synchronize,
    /// Spawn entities, remove the marker and stop.
    SpawnEntities,
}

/// Lifecycle phase of a machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No eligible tick yet.
    Idle,
    /// The copy has been issued.
    CopyExecuted,
    /// Synchronization is in progress.
    Synchronizing,
    /// Every linked region is provisioned or pending.
    SynchronizationSettled,
    /// Waiting for the spawn delay to elapse.
    AwaitingEntitySpawn,
    /// Entities spawned; the machine is done.
    Completed,
    /// The trigger was invalid; the machine is done.
    Aborted,
}

/// Tick-counting controller for one trigger marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisioningMachine {
    counter: u32,
    phase: Phase,
}

impl ProvisioningMachine {
    /// A machine that has not ticked yet.
    pub const fn new() -> Self {
        Self {
            counter: 0,
            phase: Phase::Idle,
        }
    }

    /// Current tick counter.
    pub const fn counter(&self) -> u32 {
        self.counter
    }

    /// Current phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the machine has reached a terminal phase.
    pub const fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Completed | Phase::Aborted)
    }

    /// Advance one scheduling cycle.
    ///
    /// Returns `None` when there is nothing to do this tick: the machine is
    /// finished, no observer is present, or the counter sits between
    /// thresholds.
    pub const fn advance(&mut self, ctx: TickContext) -> Option<Effect> {
        if self.is_finished() || !ctx.observers_present {
            return None;
        }
        self.counter = self.counter.saturating_add(1);

        if !ctx.trigger_valid {
            self.phase = Phase::Aborted;
            return Some(Effect::Abort);
        }

        if self.counter == TICKS_TO_SPAWN_CHUNK {
            self.phase = Phase::CopyExecuted;
            Some(Effect::CopyRegion)
        } else if self.counter == TICKS_TO_SYNCH_CHUNK {
            self.phase = Phase::Synchronizing;
            Some(Effect::Synchronize)
        } else if self.counter >= TICKS_TO_SPAWN_ENTITIES {
            self.phase = Phase::Completed;
            Some(Effect::SpawnEntities)
        } else {
            if self.counter > TICKS_TO_SYNCH_CHUNK {
                self.phase = Phase::AwaitingEntitySpawn;
            }
            None
        }
    }

    /// Report the result of an [`Effect::Synchronize`].
    ///
    /// A planted marker holds the counter so the next tick synchronizes
    /// again. Otherwise synchronization is settled.
    pub const fn record_sync(&mut self, planted: bool) {
        if planted {
            self.counter = self.counter.saturating_sub(1);
        } else {
            self.phase = Phase::SynchronizationSettled;
        }
    }
}

impl Default for ProvisioningMachine {
    fn default() -> Self {
        Self::new()
    }
}
