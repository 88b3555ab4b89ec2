//! End-to-end provisioning scenarios against the in-memory host.
//!
//! Every scenario uses 8x8 regions, two sections of four cells each. The
//! live space `home` copies from the generation-only `home_gen` and is
//! linked to `left` and `right`, which have no links of their own.

// Panicking on failure is the correct behavior in test code.
#![allow(clippy::unwrap_used, clippy::panic)]

use chunkforge_core::config::ProvisioningConfig;
use chunkforge_core::machine::TICKS_TO_SPAWN_ENTITIES;
use chunkforge_core::placement::{ActivationOutcome, activate};
use chunkforge_core::tick::{Provisioner, TickSummary};
use chunkforge_types::{
    BiomeId, BlockId, CellContent, CellPos, Direction, MarkerId, RegionCoord, RegionLocator,
    SpaceId, UpdateFlags,
};
use chunkforge_world::{MemoryWorld, PatternGenerator, SentinelGenerator, WorldHost};

const CONFIG: &str = r"
world:
  tick_interval_ms: 0

spaces:
  - id: home
    source: home_gen
    synchronized: [left, right]
    layout: { width: 8, section_height: 4, min_y: 0, section_count: 2 }
  - id: left
    source: home_gen
    layout: { width: 8, section_height: 4, min_y: 0, section_count: 2 }
  - id: right
    source: home_gen
    layout: { width: 8, section_height: 4, min_y: 0, section_count: 2 }
  - id: home_gen
    generation_only: true
    layout: { width: 8, section_height: 4, min_y: 0, section_count: 2 }

triggers:
  - name: spawn
    valid_in: [home, left, right]

sync_trigger: spawn
";

fn pattern() -> PatternGenerator {
    PatternGenerator::new(BiomeId(3), vec![BlockId(1), BlockId(2), BlockId(3)])
}

fn setup() -> (Provisioner, MemoryWorld) {
    let config = ProvisioningConfig::parse(CONFIG).unwrap();
    let provisioner = Provisioner::from_config(&config).unwrap();
    let mut world = MemoryWorld::new();
    for space in &config.spaces {
        if space.generation_only {
            world.add_space(space.id.clone(), space.layout, pattern());
        } else {
            world.add_space(
                space.id.clone(),
                space.layout,
                SentinelGenerator {
                    biome: BiomeId::VOID,
                    sentinel: BlockId::AIR,
                },
            );
        }
    }
    (provisioner, world)
}

fn home() -> SpaceId {
    SpaceId::from("home")
}

/// Write a trigger marker at the reference cell of home region `coord`.
fn place_at_reference(provisioner: &mut Provisioner, world: &mut MemoryWorld, coord: RegionCoord) -> CellPos {
    let pos = provisioner.spaces().layout(&home()).unwrap().reference_cell(coord);
    world
        .set_cell(&home(), pos, CellContent::Marker(MarkerId(0)), UpdateFlags::NONE)
        .unwrap();
    provisioner.on_trigger_placed(&home(), pos, MarkerId(0)).unwrap();
    pos
}

fn run_until_idle(provisioner: &mut Provisioner, world: &mut MemoryWorld, limit: u32) -> Vec<TickSummary> {
    let mut summaries = Vec::new();
    for _ in 0..limit {
        if provisioner.is_empty() {
            break;
        }
        summaries.push(provisioner.on_tick(world));
    }
    summaries
}

#[test]
fn full_timeline_copies_synchronizes_and_spawns() {
    let (mut provisioner, mut world) = setup();
    let pos = place_at_reference(&mut provisioner, &mut world, RegionCoord::new(0, 0));
    let counter = |p: &Provisioner| {
        p.active()
            .find(|t| t.target.space == home())
            .map(|t| t.machine.counter())
    };

    // Tick 1: the source region is copied cell for cell.
    let first = provisioner.on_tick(&mut world);
    assert_eq!(first.copies, 1);
    let generator = pattern();
    for probe in [CellPos::new(0, 0, 0), CellPos::new(5, 2, 1), CellPos::new(7, 6, 7)] {
        assert_eq!(
            world.get_cell(&home(), probe).unwrap(),
            CellContent::Block(generator.block_at(probe))
        );
    }
    // The marker survives its own copy.
    assert_eq!(world.get_cell(&home(), pos).unwrap(), CellContent::Marker(MarkerId(0)));
    assert_eq!(world.reloads(), &[RegionLocator::new("home", RegionCoord::new(0, 0))]);

    // Tick 2: nothing.
    let second = provisioner.on_tick(&mut world);
    assert_eq!((second.copies, second.plants), (0, 0));

    // Ticks 3 and 4 plant one linked trigger each, holding the counter.
    let third = provisioner.on_tick(&mut world);
    assert_eq!(third.plants, 1);
    assert_eq!(counter(&provisioner), Some(2));
    assert_eq!(
        world.get_cell(&SpaceId::from("left"), pos).unwrap(),
        CellContent::Marker(MarkerId(0))
    );
    let fourth = provisioner.on_tick(&mut world);
    assert_eq!(fourth.plants, 1);
    assert_eq!(fourth.copies, 1, "the left trigger copies on its first tick");

    // Tick 5: every linked region is pending, synchronization settles.
    let fifth = provisioner.on_tick(&mut world);
    assert_eq!(fifth.plants, 0);
    assert_eq!(counter(&provisioner), Some(3));

    // Two held ticks push the spawn back by two.
    let mut home_spawn_tick = None;
    for _ in 0..30 {
        let summary = provisioner.on_tick(&mut world);
        if world.spawns().iter().any(|s| s.target.space == home()) && home_spawn_tick.is_none() {
            home_spawn_tick = Some(summary.tick);
        }
    }
    assert_eq!(home_spawn_tick, Some(u64::from(TICKS_TO_SPAWN_ENTITIES).saturating_add(2)));
    assert!(provisioner.is_empty());

    let spawned: Vec<String> = world.spawns().iter().map(|s| s.target.to_string()).collect();
    assert_eq!(spawned, vec!["home[0, 0]", "left[0, 0]", "right[0, 0]"]);
    assert!(world.spawns().iter().all(|s| s.source.space == SpaceId::from("home_gen")));

    // The marker was replaced by its northern neighbour.
    let north = pos.relative(Direction::North);
    assert_eq!(
        world.get_cell(&home(), pos).unwrap(),
        CellContent::Block(generator.block_at(north))
    );
}

#[test]
fn plants_are_bounded_by_linked_space_count() {
    let (mut provisioner, mut world) = setup();
    place_at_reference(&mut provisioner, &mut world, RegionCoord::new(2, -1));
    let summaries = run_until_idle(&mut provisioner, &mut world, 200);
    let plants: u32 = summaries.iter().map(|s| s.plants).sum();
    let spawns: u32 = summaries.iter().map(|s| s.spawns).sum();
    assert_eq!(plants, 2);
    assert_eq!(spawns, 3);
    assert!(summaries.iter().all(|s| s.failed == 0 && s.aborted == 0));
}

#[test]
fn no_observers_means_no_progress() {
    let (mut provisioner, mut world) = setup();
    place_at_reference(&mut provisioner, &mut world, RegionCoord::new(0, 0));
    world.set_observers(false);
    for _ in 0..50 {
        assert!(provisioner.on_tick(&mut world).stalled);
    }
    assert!(world.reloads().is_empty());
    assert!(world.spawns().is_empty());

    world.set_observers(true);
    assert_eq!(provisioner.on_tick(&mut world).copies, 1);
}

#[test]
fn populated_target_skips_the_copy() {
    let (mut provisioner, mut world) = setup();
    let coord = RegionCoord::new(0, 0);
    let reference = provisioner.spaces().layout(&home()).unwrap().reference_cell(coord);
    world
        .set_cell(&home(), reference, CellContent::Block(BlockId(9)), UpdateFlags::ALL)
        .unwrap();
    let pos = CellPos::new(1, 7, 1);
    world
        .set_cell(&home(), pos, CellContent::Marker(MarkerId(0)), UpdateFlags::NONE)
        .unwrap();
    provisioner.on_trigger_placed(&home(), pos, MarkerId(0)).unwrap();

    let summary = provisioner.on_tick(&mut world);
    assert_eq!((summary.copies, summary.copies_skipped), (0, 1));
    assert_eq!(world.get_cell(&home(), CellPos::new(0, 0, 0)).unwrap(), CellContent::AIR);
}

#[test]
fn trigger_in_generation_space_aborts() {
    let (mut provisioner, mut world) = setup();
    let gen_space = SpaceId::from("home_gen");
    let pos = CellPos::new(3, 7, 3);
    world
        .set_cell(&gen_space, pos, CellContent::Marker(MarkerId(0)), UpdateFlags::NONE)
        .unwrap();
    provisioner.on_trigger_placed(&gen_space, pos, MarkerId(0)).unwrap();

    let summary = provisioner.on_tick(&mut world);
    assert_eq!(summary.aborted, 1);
    let expected = CellContent::Block(pattern().block_at(pos.relative(Direction::North)));
    assert_eq!(world.get_cell(&gen_space, pos).unwrap(), expected);
}

#[test]
fn repeated_placement_is_idempotent() {
    let (mut provisioner, mut world) = setup();
    let coord = RegionCoord::new(0, 0);
    let pos = place_at_reference(&mut provisioner, &mut world, coord);
    provisioner.on_trigger_placed(&home(), pos, MarkerId(0)).unwrap();
    assert_eq!(provisioner.active_count(), 1);
    assert_eq!(provisioner.on_tick(&mut world).copies, 1);
}

#[test]
fn activation_runs_to_completion() {
    let (mut provisioner, mut world) = setup();
    let outcome = activate(
        &mut world,
        &mut provisioner,
        &home(),
        CellPos::new(4, 2, 4),
        Direction::South,
        "spawn",
    )
    .unwrap();
    let ActivationOutcome::Placed { region, .. } = outcome else {
        panic!("expected a placement, got {outcome:?}");
    };
    assert_eq!(region, RegionLocator::new("home", RegionCoord::new(0, 0)));

    let summaries = run_until_idle(&mut provisioner, &mut world, 200);
    assert_eq!(summaries.first().map(|s| s.copies), Some(1));
    assert!(world.spawns().iter().any(|s| s.target == region));
}
