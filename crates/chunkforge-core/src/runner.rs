//! Scheduling loop runner.
//!
//! [`run_provisioning`] drives [`Provisioner::on_tick`] in real time,
//! sleeping `tick_interval_ms` between cycles. It stops when:
//!
//! - **Tick limit**: `max_ticks` cycles have run (0 = unlimited)
//! - **Idle**: no trigger is pending and `stop_when_idle` is set
//!
//! A run with neither bound set runs until the task is cancelled.

use std::time::Duration;

use chunkforge_world::WorldHost;
use tracing::{info, warn};

use crate::config::ProvisioningConfig;
use crate::tick::{Provisioner, TickSummary};

/// Why the run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunEndReason {
    /// `max_ticks` cycles have run.
    MaxTicksReached,
    /// No trigger was left pending.
    Idle,
}

/// Loop bounds and pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunBounds {
    /// Maximum number of cycles (0 = unlimited).
    pub max_ticks: u64,
    /// Real-time milliseconds between cycles.
    pub tick_interval_ms: u64,
    /// Stop once no trigger is pending.
    pub stop_when_idle: bool,
}

impl RunBounds {
    /// Bounds taken from configuration.
    pub const fn from_config(config: &ProvisioningConfig) -> Self {
        Self {
            max_ticks: config.simulation.max_ticks,
            tick_interval_ms: config.world.tick_interval_ms,
            stop_when_idle: config.simulation.stop_when_idle,
        }
    }

    const fn tick_limit_reached(&self, ticks: u64) -> bool {
        self.max_ticks > 0 && ticks >= self.max_ticks
    }
}

/// Result of a run.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// Why the run ended.
    pub end_reason: RunEndReason,
    /// The last tick summary, if any cycle ran.
    pub final_summary: Option<TickSummary>,
    /// Cycles executed by this run.
    pub total_ticks: u64,
}

/// Callback invoked after each cycle.
pub trait TickCallback: Send {
    /// Called after a cycle completes.
    fn on_tick(&mut self, summary: &TickSummary, provisioner: &Provisioner);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _provisioner: &Provisioner) {}
}

/// Run the scheduling loop until a bound is hit.
///
/// Per-trigger failures never end the run; they are counted in each
/// [`TickSummary`].
pub async fn run_provisioning<H: WorldHost + ?Sized>(
    provisioner: &mut Provisioner,
    host: &mut H,
    bounds: RunBounds,
    callback: &mut dyn TickCallback,
) -> RunResult {
    let mut last_summary: Option<TickSummary> = None;
    let mut total_ticks: u64 = 0;

    info!(
        max_ticks = bounds.max_ticks,
        tick_interval_ms = bounds.tick_interval_ms,
        stop_when_idle = bounds.stop_when_idle,
        pending = provisioner.active_count(),
        "Provisioning starting"
    );

    loop {
        if bounds.stop_when_idle && provisioner.is_empty() {
            info!(total_ticks, "No pending triggers, idle");
            return RunResult {
                end_reason: RunEndReason::Idle,
                final_summary: last_summary,
                total_ticks,
            };
        }

        let summary = provisioner.on_tick(host);
        total_ticks = total_ticks.saturating_add(1);
        callback.on_tick(&summary, provisioner);

        if bounds.tick_limit_reached(total_ticks) {
            info!(tick = summary.tick, max_ticks = bounds.max_ticks, "Tick limit reached");
            return RunResult {
                end_reason: RunEndReason::MaxTicksReached,
                final_summary: Some(summary),
                total_ticks,
            };
        }

        last_summary = Some(summary);

        if bounds.tick_interval_ms > 0 {
            tokio::time::sleep(Duration::from_millis(bounds.tick_interval_ms)).await;
        }
    }
}

/// Log how a run ended.
pub fn log_run_end(result: &RunResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        final_tick = result.final_summary.as_ref().map(|s| s.tick),
        "Provisioning ended"
    );

    if let Some(ref summary) = result.final_summary {
        info!(
            tick = summary.tick,
            pending = summary.active,
            completed = summary.completed,
            failed = summary.failed,
            "Final tick summary"
        );
    } else {
        warn!("Provisioning ended with no ticks executed");
    }
}
