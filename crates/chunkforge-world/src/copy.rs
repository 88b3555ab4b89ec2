//! Region copy engine.
//!
//! Copies one generated source region into an empty target region:
//!
//! 1. Re-check that the target is still empty. If not, skip silently.
//! 2. Serialize each source section's attribute grid into a buffer sized
//!    exactly to its payload.
//! 3. Deserialize each buffer into the matching target section, giving the
//!    target an independent copy. Each section copied marks the target
//!    dirty.
//! 4. Hand block content and metadata to the host.
//! 5. Ask the host to force a reload of the target.

use chunkforge_types::RegionLocator;
use tracing::debug;

use crate::emptiness::EmptinessOracle;
use crate::error::WorldError;
use crate::host::WorldHost;

/// Result of a copy attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyOutcome {
    /// The target was populated from the source.
    Copied {
        /// Number of sections whose attribute grids were copied.
        sections: usize,
    },
    /// The target was no longer empty; nothing was written.
    SkippedNotEmpty,
}

/// Copies source regions into empty target regions.
#[derive(Debug, Clone, Copy)]
pub struct RegionCopyEngine {
    oracle: EmptinessOracle,
}

impl RegionCopyEngine {
    /// Create a copy engine that guards targets with `oracle`.
    pub const fn new(oracle: EmptinessOracle) -> Self {
        Self { oracle }
    }

    /// Copy `source` into `target` if `target` is empty.
    ///
    /// When the two layouts disagree on section count, only the sections
    /// present in both are copied.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::LayoutMismatch`] if the regions' sections hold
    /// different numbers of cells, or any error raised by the host.
    pub fn copy<H: WorldHost + ?Sized>(
        &self,
        host: &mut H,
        source: &RegionLocator,
        target: &RegionLocator,
    ) -> Result<CopyOutcome, WorldError> {
        if !self.oracle.is_empty(host.load_or_generate(target)?) {
            debug!(target = %target, "Copy skipped, target no longer empty");
            return Ok(CopyOutcome::SkippedNotEmpty);
        }

        let source_region = host.load_or_generate(source)?;
        let source_cells = source_region.layout().cells_per_section();
        let mut buffers = Vec::with_capacity(source_region.sections().len());
        for section in source_region.sections() {
            let mut buffer = vec![0_u8; section.biomes.serialized_size()];
            section.biomes.write_to(&mut buffer)?;
            buffers.push(buffer);
        }

        let target_region = host.load_or_generate(target)?;
        if target_region.layout().cells_per_section() != source_cells {
            return Err(WorldError::LayoutMismatch {
                copied_from: source.clone(),
                copied_into: target.clone(),
            });
        }
        let mut copied: usize = 0;
        for (index, buffer) in buffers.iter().enumerate() {
            let Some(section) = target_region.sections_mut().get_mut(index) else {
                break;
            };
            section.biomes.read_into(buffer)?;
            target_region.mark_dirty();
            copied = copied.saturating_add(1);
        }

        host.copy_content(source, target)?;
        host.force_reload(target)?;

        debug!(source = %source, target = %target, sections = copied, "Region copied");
        Ok(CopyOutcome::Copied { sections: copied })
    }
}
