//! Tick callback that logs provisioning progress.

use chunkforge_core::runner::TickCallback;
use chunkforge_core::tick::{Provisioner, TickSummary};
use tracing::{debug, info};

/// Logs each cycle and keeps running totals.
#[derive(Debug, Default)]
pub struct ProgressLog {
    /// Regions copied so far.
    pub copies: u64,
    /// Linked triggers planted so far.
    pub plants: u64,
    /// Triggers completed so far.
    pub completed: u64,
    /// Trigger steps that failed so far.
    pub failed: u64,
}

impl TickCallback for ProgressLog {
    fn on_tick(&mut self, summary: &TickSummary, provisioner: &Provisioner) {
        self.copies = self.copies.saturating_add(u64::from(summary.copies));
        self.plants = self.plants.saturating_add(u64::from(summary.plants));
        self.completed = self.completed.saturating_add(u64::from(summary.completed));
        self.failed = self.failed.saturating_add(u64::from(summary.failed));

        debug!(
            tick = summary.tick,
            stalled = summary.stalled,
            copies = summary.copies,
            plants = summary.plants,
            spawns = summary.spawns,
            pending = provisioner.active_count(),
            "Tick complete"
        );
        if summary.completed > 0 || summary.aborted > 0 {
            info!(
                tick = summary.tick,
                completed = summary.completed,
                aborted = summary.aborted,
                pending = provisioner.active_count(),
                "Triggers finished"
            );
        }
    }
}
