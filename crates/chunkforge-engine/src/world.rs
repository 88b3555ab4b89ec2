//! In-memory world assembly from configuration.
//!
//! Generation-only spaces get a [`PatternGenerator`] whose block cycle is
//! picked from the world seed. Every other space starts as unset ground
//! filled with the sentinel block.

use chunkforge_core::config::ProvisioningConfig;
use chunkforge_types::{BiomeId, BlockId};
use chunkforge_world::{MemoryWorld, PatternGenerator, SentinelGenerator};

/// Blocks cycled through by generation spaces.
const PATTERN_BLOCKS: [BlockId; 4] = [BlockId(1), BlockId(2), BlockId(3), BlockId(4)];

/// Build an in-memory world with one entry per configured space.
pub fn build_world(config: &ProvisioningConfig) -> MemoryWorld {
    let sentinel = config.world.sentinel_block;
    let mut world = MemoryWorld::new();
    for (index, space) in config.spaces.iter().enumerate() {
        if space.generation_only {
            let biome = BiomeId(u16::try_from(index.saturating_add(1)).unwrap_or(u16::MAX));
            let generator = PatternGenerator::new(biome, pattern(config.world.seed, sentinel));
            world.add_space(space.id.clone(), space.layout, generator);
        } else {
            world.add_space(
                space.id.clone(),
                space.layout,
                SentinelGenerator {
                    biome: BiomeId::VOID,
                    sentinel,
                },
            );
        }
    }
    world
}

/// The block cycle for `seed`, rotated and without the sentinel.
fn pattern(seed: u64, sentinel: BlockId) -> Vec<BlockId> {
    let shift = seed
        .checked_rem(4)
        .and_then(|rem| usize::try_from(rem).ok())
        .unwrap_or_default();
    let mut blocks: Vec<BlockId> = PATTERN_BLOCKS.into_iter().filter(|b| *b != sentinel).collect();
    if shift < blocks.len() {
        blocks.rotate_left(shift);
    }
    blocks
}
