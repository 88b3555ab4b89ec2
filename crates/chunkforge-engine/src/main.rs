//! Provisioning engine binary for chunkforge.
//!
//! Builds an in-memory world from configuration, activates the sync
//! trigger at the origin of the first live space that accepts it, and
//! runs the scheduling loop until the world is idle or the tick limit is
//! reached.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `chunkforge-config.yaml`
//! 3. Build the in-memory world and the provisioner
//! 4. Reload scanner data, if a directory is configured
//! 5. Activate the starting trigger
//! 6. Run the scheduling loop
//! 7. Log the result

mod error;
mod progress;
mod world;

use std::path::Path;

use chunkforge_core::auxiliary::ScannerMappings;
use chunkforge_core::config::ProvisioningConfig;
use chunkforge_core::placement::{self, ActivationOutcome};
use chunkforge_core::runner::{self, RunBounds};
use chunkforge_core::tick::Provisioner;
use chunkforge_types::{CellPos, Direction, SpaceId};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::progress::ProgressLog;

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, scanner data, or the starting
/// activation fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("chunkforge-engine starting");

    // 2. Load configuration.
    let config = load_config()?;
    info!(
        seed = config.world.seed,
        tick_interval_ms = config.world.tick_interval_ms,
        spaces = config.spaces.len(),
        triggers = config.triggers.len(),
        "Configuration loaded"
    );

    // 3. Build the world and the provisioner.
    let mut provisioner = Provisioner::from_config(&config)?;
    let mut world = world::build_world(&config);
    info!(spaces = config.spaces.len(), "In-memory world built");

    // 4. Scanner data.
    if let Some(dir) = &config.auxiliary.scanner_data_dir {
        let mut mappings = ScannerMappings::new();
        let report = mappings.reload_dir(dir).map_err(EngineError::from)?;
        info!(loaded = report.loaded, items = mappings.len(), "Scanner data ready");
    }

    // 5. Activate the starting trigger.
    let space = activation_space(&provisioner, &config.sync_trigger)?;
    let outcome = placement::activate(
        &mut world,
        &mut provisioner,
        &space,
        CellPos::new(0, 0, 0),
        Direction::North,
        &config.sync_trigger,
    )
    .map_err(EngineError::from)?;
    match &outcome {
        ActivationOutcome::Placed { pos, region } => {
            info!(region = %region, pos = %pos, "Starting trigger placed");
        }
        ActivationOutcome::NoEmptyRegion | ActivationOutcome::InvalidSpace => {
            warn!(space = %space, outcome = ?outcome, "Starting trigger not placed");
        }
    }

    // 6. Run the scheduling loop.
    let mut progress = ProgressLog::default();
    let result = runner::run_provisioning(
        &mut provisioner,
        &mut world,
        RunBounds::from_config(&config),
        &mut progress,
    )
    .await;

    // 7. Log results.
    runner::log_run_end(&result);

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        copies = progress.copies,
        plants = progress.plants,
        completed = progress.completed,
        failed = progress.failed,
        "chunkforge-engine shutdown complete"
    );

    Ok(())
}

/// Load configuration from `chunkforge-config.yaml`.
///
/// Looks for the config file relative to the current working directory.
fn load_config() -> Result<ProvisioningConfig, EngineError> {
    let config_path = Path::new("chunkforge-config.yaml");
    if config_path.exists() {
        let config = ProvisioningConfig::from_file(config_path)?;
        Ok(config)
    } else {
        info!("Config file not found, using defaults");
        Ok(ProvisioningConfig::default())
    }
}

/// First live space, in id order, where `trigger` may be used.
fn activation_space(provisioner: &Provisioner, trigger: &str) -> Result<SpaceId, EngineError> {
    let def = provisioner.triggers().by_name(trigger);
    provisioner
        .spaces()
        .iter()
        .filter(|space| !space.generation_only)
        .find(|space| def.is_some_and(|d| d.is_valid_for(&space.id)))
        .map(|space| space.id.clone())
        .ok_or_else(|| EngineError::NoActivationSpace {
            trigger: trigger.to_owned(),
        })
}
