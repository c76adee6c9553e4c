use loam_blocks::BlockRegistry;
use loam_chunk::{CHUNK_VOLUME, Chunk, VoxelState, idx};
use loam_lighting::{LIGHT_FALLOFF, recompute_lighting};
use loam_world::{CHUNK_HEIGHT, CHUNK_WIDTH, ChunkCoord};
use proptest::prelude::*;

fn blocks() -> impl Strategy<Value = Vec<(usize, usize, usize, u8)>> {
    // stone, leaves, glass, planks
    let id = prop_oneof![Just(2u8), Just(11u8), Just(10u8), Just(7u8)];
    prop::collection::vec(
        (0usize..CHUNK_WIDTH, 0usize..CHUNK_HEIGHT, 0usize..CHUNK_WIDTH, id),
        0..400,
    )
}

fn build(cells: &[(usize, usize, usize, u8)]) -> Chunk {
    let mut voxels = vec![VoxelState::AIR; CHUNK_VOLUME];
    for &(x, y, z, id) in cells {
        voxels[idx(x, y, z)].id = id;
    }
    Chunk::from_voxels(ChunkCoord::new(3, -2), voxels)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    // light stays in [0,1] and neighbours never differ by more than one falloff step
    #[test]
    fn flood_fill_is_smooth(cells in blocks()) {
        let reg = BlockRegistry::builtin().unwrap();
        let mut chunk = build(&cells);
        recompute_lighting(&mut chunk, &reg);
        for y in 0..CHUNK_HEIGHT {
            for z in 0..CHUNK_WIDTH {
                for x in 0..CHUNK_WIDTH {
                    let l = chunk.get_local(x, y, z).light;
                    prop_assert!((0.0..=1.0).contains(&l));
                    if x + 1 < CHUNK_WIDTH {
                        prop_assert!((l - chunk.get_local(x + 1, y, z).light).abs() <= LIGHT_FALLOFF + 1e-5);
                    }
                    if y + 1 < CHUNK_HEIGHT {
                        prop_assert!((l - chunk.get_local(x, y + 1, z).light).abs() <= LIGHT_FALLOFF + 1e-5);
                    }
                    if z + 1 < CHUNK_WIDTH {
                        prop_assert!((l - chunk.get_local(x, y, z + 1).light).abs() <= LIGHT_FALLOFF + 1e-5);
                    }
                }
            }
        }
    }

    // cells above the first block of a column see the full sky
    #[test]
    fn open_sky_above_first_block(cells in blocks()) {
        let reg = BlockRegistry::builtin().unwrap();
        let mut chunk = build(&cells);
        recompute_lighting(&mut chunk, &reg);
        for z in 0..CHUNK_WIDTH {
            for x in 0..CHUNK_WIDTH {
                for y in (0..CHUNK_HEIGHT).rev() {
                    let v = chunk.get_local(x, y, z);
                    if v.id != 0 {
                        break;
                    }
                    prop_assert_eq!(v.light, 1.0);
                }
            }
        }
    }

    // relighting an unchanged chunk is stable
    #[test]
    fn relight_is_idempotent(cells in blocks()) {
        let reg = BlockRegistry::builtin().unwrap();
        let mut chunk = build(&cells);
        recompute_lighting(&mut chunk, &reg);
        let first = chunk.voxels().to_vec();
        recompute_lighting(&mut chunk, &reg);
        prop_assert_eq!(first, chunk.voxels().to_vec());
    }
}
