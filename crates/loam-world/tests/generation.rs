use loam_blocks::{AIR, BlockRegistry};
use loam_world::voxel::generation::SUBSURFACE_DEPTH;
use loam_world::{ChunkCoord, CHUNK_WIDTH, VoxelMod, World, WorldGenConfig};
use proptest::prelude::*;

fn reg() -> BlockRegistry {
    BlockRegistry::builtin().unwrap()
}

fn world_from_toml(src: &str) -> World {
    let cfg: WorldGenConfig = toml::from_str(src).unwrap();
    World::from_config(&cfg, &reg())
}

fn flat_world() -> World {
    world_from_toml(
        r#"
        seed = 9
        world_size_chunks = 8
        solid_ground_height = 42

        [[biomes]]
        name = "flat"
        scale = 0.0
        terrain_height = 0.0
        terrain_scale = 0.0
        surface_block = "grass"
        subsurface_block = "dirt"
        "#,
    )
}

#[test]
fn flat_biome_column_layers() {
    let r = reg();
    let w = flat_world();
    let grass = r.id_by_name("grass").unwrap();
    let dirt = r.id_by_name("dirt").unwrap();
    let stone = r.id_by_name("stone").unwrap();
    let bedrock = r.id_by_name("bedrock").unwrap();

    for (x, z) in [(0, 0), (17, 33), (127, 127), (64, 5)] {
        assert_eq!(w.block_at(x, 43, z), AIR);
        assert_eq!(w.block_at(x, 42, z), grass);
        for y in 39..=41 {
            assert_eq!(w.block_at(x, y, z), dirt, "y={y}");
        }
        for y in 1..=38 {
            assert_eq!(w.block_at(x, y, z), stone, "y={y}");
        }
        assert_eq!(w.block_at(x, 0, z), bedrock);
        assert_eq!(w.block_at(x, 127, z), AIR);
    }
    assert_eq!(SUBSURFACE_DEPTH, 3);
}

#[test]
fn outside_world_is_air() {
    let w = flat_world();
    let size = w.world_size_voxels();
    assert_eq!(w.block_at(-1, 10, 0), AIR);
    assert_eq!(w.block_at(0, 10, size), AIR);
    assert_eq!(w.block_at(0, -1, 0), AIR);
    assert_eq!(w.block_at(0, 128, 0), AIR);
}

#[test]
fn later_lodes_win() {
    let r = reg();
    let w = world_from_toml(
        r#"
        world_size_chunks = 4
        solid_ground_height = 42

        [[biomes]]
        name = "ores"
        scale = 0.0
        terrain_scale = 0.0

        [[biomes.lodes]]
        name = "first"
        block = "coal_ore"
        min_height = 0
        max_height = 30
        scale = 0.1
        threshold = -1.0

        [[biomes.lodes]]
        name = "second"
        block = "cobblestone"
        min_height = 10
        max_height = 20
        scale = 0.1
        threshold = -1.0
        "#,
    );
    let coal = r.id_by_name("coal_ore").unwrap();
    let cobble = r.id_by_name("cobblestone").unwrap();
    let stone = r.id_by_name("stone").unwrap();
    assert_eq!(w.block_at(3, 5, 3), coal);
    assert_eq!(w.block_at(3, 10, 3), coal);
    assert_eq!(w.block_at(3, 15, 3), cobble);
    assert_eq!(w.block_at(3, 20, 3), coal);
    assert_eq!(w.block_at(3, 30, 3), stone);
    // Lodes never touch the surface layers.
    assert_eq!(w.block_at(3, 42, 3), r.id_by_name("grass").unwrap());
}

#[test]
fn flora_roots_only_on_the_surface() {
    let w = world_from_toml(
        r#"
        world_size_chunks = 4
        solid_ground_height = 42

        [[biomes]]
        name = "jungle"
        scale = 0.0
        terrain_scale = 0.0

        [biomes.flora]
        enabled = true
        zone_threshold = -1.0
        placement_threshold = -1.0
        min_height = 4
        max_height = 4
        "#,
    );
    for y in 0..128 {
        let mut mods: Vec<VoxelMod> = Vec::new();
        w.generate_voxel(20, y, 20, &mut mods);
        if y == 42 {
            assert!(!mods.is_empty());
            assert!(mods.iter().all(|m| m.y > 42));
        } else {
            assert!(mods.is_empty(), "y={y}");
        }
    }
    // Queries never emit structures.
    let mut none: Vec<VoxelMod> = Vec::new();
    w.generate_voxel(-5, 42, 20, &mut none);
    assert!(none.is_empty());
}

#[test]
fn streamable_excludes_outer_ring() {
    let w = flat_world();
    assert!(w.is_chunk_in_world(ChunkCoord::new(0, 0)));
    assert!(!w.is_chunk_streamable(ChunkCoord::new(0, 3)));
    assert!(w.is_chunk_streamable(ChunkCoord::new(1, 6)));
    assert!(!w.is_chunk_streamable(ChunkCoord::new(7, 3)));
    assert!(!w.is_chunk_in_world(ChunkCoord::new(8, 3)));
    assert_eq!(w.chunk_index(ChunkCoord::new(3, 2)), Some(2 * 8 + 3));
    assert_eq!(w.chunk_index(ChunkCoord::new(-1, 2)), None);
}

fn coord() -> impl Strategy<Value = i32> {
    -100_000i32..=100_000
}

fn world_xz() -> impl Strategy<Value = i32> {
    0i32..(100 * CHUNK_WIDTH as i32)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // origin -> chunk is the identity, including negative chunks
    #[test]
    fn chunk_origin_round_trips(cx in coord(), cz in coord()) {
        let c = ChunkCoord::new(cx, cz);
        let (ox, oz) = c.origin();
        prop_assert_eq!(ChunkCoord::from_voxel(ox, oz), c);
        prop_assert_eq!(ChunkCoord::from_voxel(ox + CHUNK_WIDTH as i32 - 1, oz + CHUNK_WIDTH as i32 - 1), c);
        prop_assert_eq!(ChunkCoord::from_voxel(ox - 1, oz), c.offset(-1, 0));
        prop_assert_eq!(ChunkCoord::from_world_pos(c.origin_vec()), c);
    }

    // split_voxel recombines into the same world column
    #[test]
    fn split_voxel_recombines(x in coord(), z in coord()) {
        let (c, lx, lz) = ChunkCoord::split_voxel(x, z);
        let (ox, oz) = c.origin();
        prop_assert!(lx < CHUNK_WIDTH && lz < CHUNK_WIDTH);
        prop_assert_eq!((ox + lx as i32, oz + lz as i32), (x, z));
    }

    // freshly built generators agree voxel for voxel, structures included
    #[test]
    fn generation_is_deterministic(x in world_xz(), y in 0i32..128, z in world_xz(), seed in any::<i32>()) {
        let cfg = WorldGenConfig { seed, ..WorldGenConfig::default() };
        let a = World::from_config(&cfg, &reg());
        let b = World::from_config(&cfg, &reg());
        let mut ma: Vec<VoxelMod> = Vec::new();
        let mut mb: Vec<VoxelMod> = Vec::new();
        prop_assert_eq!(a.generate_voxel(x, y, z, &mut ma), b.generate_voxel(x, y, z, &mut mb));
        prop_assert_eq!(a.block_at(x, y, z), a.block_at(x, y, z));
        prop_assert_eq!(ma, mb);
    }

    // terrain never leaves the world column and always has bedrock underneath
    #[test]
    fn column_height_is_sane(x in world_xz(), z in world_xz()) {
        let w = World::from_config(&WorldGenConfig::default(), &reg());
        let col = w.column_terrain(x, z);
        prop_assert!(col.height >= 42 && col.height < 128);
        prop_assert!(col.dominant < w.params.biomes.len());
        prop_assert_eq!(w.block_at(x, 0, z), w.params.bedrock);
        prop_assert_eq!(w.block_at(x, col.height + 1, z), AIR);
    }
}
