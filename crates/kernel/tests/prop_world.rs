use proptest::prelude::*;
use tileworld_common::{ChunkPosition, GlobalTilePosition, NEIGHBOR_OFFSETS};
use tileworld_kernel::{Chunk, Solidity, World};

/// 3x3 chunks around the origin with a scattering of solid tiles.
fn patchwork_world() -> World {
    let mut world = World::empty();
    for cx in -1..=1 {
        for cy in -1..=1 {
            let chunk = Chunk::from_fn(ChunkPosition::new(cx, cy), |local| {
                if (local.x * 7 + local.y * 3 + cx + cy) % 5 == 0 {
                    Solidity::Solid
                } else {
                    Solidity::NonSolid
                }
            });
            world.insert_chunk(chunk).unwrap();
        }
    }
    world
}

fn arb_loaded_global() -> impl Strategy<Value = GlobalTilePosition> {
    (-16i32..32, -16i32..32).prop_map(|(x, y)| GlobalTilePosition::new(x, y))
}

proptest! {
    #[test]
    fn tile_round_trips_through_global(g in arb_loaded_global()) {
        let world = patchwork_world();
        let tile = *world.tile_at(g).unwrap();
        let back = world.tile_at(world.global_position_of(&tile)).unwrap();
        prop_assert_eq!(*back, tile);
    }

    #[test]
    fn tile_round_trips_through_world_position(g in arb_loaded_global()) {
        let world = patchwork_world();
        let tile = *world.tile_at(g).unwrap();
        let pos = world.world_position_of(&tile).unwrap();
        prop_assert_eq!(*world.tile_at_world(pos).unwrap(), tile);
    }

    #[test]
    fn neighbors_are_adjacent_across_chunks(g in arb_loaded_global()) {
        let world = patchwork_world();
        let tile = *world.tile_at(g).unwrap();
        for offset in NEIGHBOR_OFFSETS {
            let expected = g.offset(offset).unwrap();
            match world.neighbor_of(&tile, offset) {
                Ok(n) => {
                    prop_assert_eq!(n.global(), expected);
                    prop_assert!(g.is_adjacent(n.global()));
                }
                Err(_) => prop_assert!(!world.contains_chunk(expected.chunk())),
            }
        }
    }

    #[test]
    fn lookups_outside_loaded_chunks_fail(x in 32i32..1000, y in -1000i32..1000) {
        let world = patchwork_world();
        prop_assert!(world.tile_at(GlobalTilePosition::new(x, y)).is_err());
    }
}
