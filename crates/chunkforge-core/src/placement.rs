//! Interactive trigger activation and the placement gameplay rule.
//!
//! An activator cell is used from one of its faces. The trigger marker goes
//! on the top layer of the first empty region among the activator's own
//! region and its four horizontal neighbours, tried in the order: own, opposite of the
//! facing, counter-clockwise, clockwise, facing. A vertical face counts as
//! facing north.

use chunkforge_types::{CellContent, CellPos, Direction, RegionLocator, SpaceId, UpdateFlags};
use chunkforge_world::WorldHost;
use tracing::{debug, info};

use crate::tick::{Provisioner, TickError};

/// Result of an activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivationOutcome {
    /// A marker was planted and registered.
    Placed {
        /// Cell holding the marker.
        pos: CellPos,
        /// Region being provisioned.
        region: RegionLocator,
    },
    /// All five candidate regions are provisioned or pending.
    NoEmptyRegion,
    /// The trigger may not be used in this space.
    InvalidSpace,
}

/// Use the activator at `pos` from `face`, planting the trigger named
/// `trigger`.
///
/// The marker is written with [`UpdateFlags::NONE`]. When it lands in a
/// neighbouring region the activator cell is cleared to air with
/// [`UpdateFlags::ALL`].
///
/// # Errors
///
/// Returns [`TickError::UnknownTrigger`] for an unconfigured name,
/// [`TickError::UnknownSpace`] for an unconfigured space, and
/// [`TickError::World`] if a candidate region cannot be loaded or written.
pub fn activate<H: WorldHost + ?Sized>(
    host: &mut H,
    provisioner: &mut Provisioner,
    space: &SpaceId,
    pos: CellPos,
    face: Direction,
    trigger: &str,
) -> Result<ActivationOutcome, TickError> {
    let def = provisioner
        .triggers()
        .by_name(trigger)
        .ok_or_else(|| TickError::UnknownTrigger {
            name: trigger.to_owned(),
        })?;
    let marker = def.marker;
    if !def.is_valid_for(space) {
        debug!(space = %space, trigger, "Trigger not valid in this space");
        return Ok(ActivationOutcome::InvalidSpace);
    }
    let layout = provisioner
        .spaces()
        .layout(space)
        .ok_or_else(|| TickError::UnknownSpace(space.clone()))?;
    let oracle = provisioner.oracle();

    for candidate in candidates(pos, face, layout.top_y()) {
        let region = RegionLocator::new(space.clone(), layout.region_of(candidate));
        if !oracle.is_empty_for_sync(host.load_or_generate(&region)?) {
            continue;
        }
        host.set_cell(space, candidate, CellContent::Marker(marker), UpdateFlags::NONE)?;
        if candidate != pos {
            host.set_cell(space, pos, CellContent::AIR, UpdateFlags::ALL)?;
        }
        provisioner.on_trigger_placed(space, candidate, marker)?;
        info!(space = %space, region = %region, trigger, "Trigger activated");
        return Ok(ActivationOutcome::Placed {
            pos: candidate,
            region,
        });
    }
    debug!(space = %space, pos = %pos, "No empty region around activator");
    Ok(ActivationOutcome::NoEmptyRegion)
}

/// Marker cells to try, in order.
const fn candidates(pos: CellPos, face: Direction, top_y: i32) -> [CellPos; 5] {
    let dir = if face.is_horizontal() {
        face
    } else {
        Direction::North
    };
    let top = pos.at_y(top_y);
    [
        top,
        top.relative(dir.opposite()),
        top.relative(dir.counter_clockwise()),
        top.relative(dir.clockwise()),
        top.relative(dir),
    ]
}

/// Whether a block may be placed at `pos`.
///
/// With `block_placement_allowed_outside_spawned_regions` off, placement
/// is refused in regions of a provisioned space that are still empty.
///
/// # Errors
///
/// Returns [`TickError::World`] if the region cannot be loaded.
pub fn is_placement_allowed<H: WorldHost + ?Sized>(
    host: &mut H,
    provisioner: &Provisioner,
    space: &SpaceId,
    pos: CellPos,
) -> Result<bool, TickError> {
    if provisioner
        .gameplay()
        .block_placement_allowed_outside_spawned_regions
    {
        return Ok(true);
    }
    let Some(def) = provisioner.spaces().get(space) else {
        return Ok(true);
    };
    if def.source.is_none() {
        return Ok(true);
    }
    let region = RegionLocator::new(space.clone(), def.layout.region_of(pos));
    let loaded = host.load_or_generate(&region)?;
    Ok(!provisioner.oracle().is_empty(loaded))
}
