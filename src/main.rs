use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use loam_blocks::BlockRegistry;
use loam_geom::Vec3;
use loam_runtime::{DrawEvent, Settings, WorldGrid};
use loam_world::worldgen::load_config_from_path;
use loam_world::{CHUNK_HEIGHT, NoiseField, VoxelMod, World, WorldGenConfig};

#[derive(Parser, Debug)]
#[command(name = "loam", version, about = "Headless voxel world streaming")]
struct Cli {
    /// Block table
    #[arg(long, global = true, default_value = "assets/voxels/blocks.toml")]
    blocks: PathBuf,
    /// Biome catalog and world extents
    #[arg(long, global = true, default_value = "assets/worldgen.toml")]
    worldgen: PathBuf,
    /// Streaming settings
    #[arg(long, global = true, default_value = "assets/settings.toml")]
    settings: PathBuf,
    /// Overrides the seed from the worldgen file
    #[arg(long, global = true)]
    seed: Option<i32>,
    /// Default log filter; RUST_LOG takes precedence
    #[arg(long, global = true, default_value = "info")]
    log_level: LevelFilter,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream the world around an observer walking along +x
    Walk {
        #[arg(long, default_value_t = 600)]
        ticks: u32,
        /// Voxels per tick
        #[arg(long, default_value_t = 0.5)]
        speed: f32,
        /// Process everything on the tick thread
        #[arg(long)]
        no_threads: bool,
    },
    /// Print one generated column from above the surface down to bedrock
    Column {
        #[arg(long)]
        x: i32,
        #[arg(long)]
        z: i32,
    },
    /// Write a binary PGM of the wavelength noise field
    NoiseMap {
        #[arg(long, default_value_t = 256)]
        size: u32,
        #[arg(long, default_value_t = 32.0)]
        scale: f32,
        #[arg(long, default_value_t = 0.0)]
        offset: f32,
        #[arg(long, default_value = "noise.pgm")]
        out: PathBuf,
    },
}

fn init_logging(level: LevelFilter) {
    let mut builder = env_logger::Builder::new();
    builder
        .filter_level(level)
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
}

fn load_registry(path: &Path) -> Result<BlockRegistry, Box<dyn Error>> {
    if path.exists() {
        return BlockRegistry::load_from_path(path);
    }
    log::warn!("{} not found; using built-in blocks", path.display());
    BlockRegistry::builtin()
}

fn load_worldgen(path: &Path, seed: Option<i32>) -> Result<WorldGenConfig, Box<dyn Error>> {
    let mut cfg = if path.exists() {
        load_config_from_path(path)?
    } else {
        log::warn!("{} not found; using default biomes", path.display());
        WorldGenConfig::default()
    };
    if let Some(seed) = seed {
        cfg.seed = seed;
    }
    Ok(cfg)
}

fn load_settings(path: &Path) -> Result<Settings, Box<dyn Error>> {
    if path.exists() {
        return Settings::load_from_path(path);
    }
    log::warn!("{} not found; using default settings", path.display());
    Ok(Settings::default())
}

#[derive(Default)]
struct Tally {
    events: usize,
    triangles: usize,
}

impl Tally {
    fn add(&mut self, events: Vec<DrawEvent>) {
        for e in events.iter().filter(|e| e.active) {
            self.events += 1;
            self.triangles += e.mesh.mesh.triangle_count();
        }
    }
}

fn walk(cli: &Cli, ticks: u32, speed: f32, no_threads: bool) -> Result<(), Box<dyn Error>> {
    let reg = Arc::new(load_registry(&cli.blocks)?);
    let cfg = load_worldgen(&cli.worldgen, cli.seed)?;
    let world = Arc::new(World::from_config(&cfg, &reg));
    let mut settings = load_settings(&cli.settings)?;
    if no_threads {
        settings = settings.foreground();
    }
    let mut grid = WorldGrid::new(world.clone(), reg, settings)?;

    let mut pos = world.center_chunk().origin_vec() + Vec3::new(8.0, 80.0, 8.0);
    let t0 = Instant::now();
    grid.generate_initial(pos);
    log::info!("initial window generated in {:.1?}", t0.elapsed());

    let mut tally = Tally::default();
    tally.add(grid.drain_draw_events());
    let edge = world.world_size_voxels() as f32 - 1.0;
    let t1 = Instant::now();
    for _ in 0..ticks {
        pos.x = (pos.x + speed).min(edge);
        grid.tick(pos);
        tally.add(grid.drain_draw_events());
    }
    grid.flush();
    tally.add(grid.drain_draw_events());
    let elapsed = t1.elapsed();
    grid.shutdown();

    let s = grid.stats();
    println!("ticks:            {ticks} in {elapsed:.1?}");
    println!("observer chunk:   {:?}", grid.observer_chunk());
    println!("draw events:      {}", tally.events);
    println!("triangles drawn:  {}", tally.triangles);
    println!("active chunks:    {}", s.active);
    println!("materialized:     {} ({} populated)", s.materialized, s.populated);
    println!("meshes built:     {}", s.meshes_built);
    println!("mods applied:     {}", s.mods_applied);
    println!("pending creation: {}", s.pending_create);
    Ok(())
}

fn column(cli: &Cli, x: i32, z: i32) -> Result<(), Box<dyn Error>> {
    let reg = load_registry(&cli.blocks)?;
    let cfg = load_worldgen(&cli.worldgen, cli.seed)?;
    let world = World::from_config(&cfg, &reg);
    if !world.is_voxel_in_world(x, 0, z) {
        return Err(format!("column ({x}, {z}) is outside the world").into());
    }
    let col = world.column_terrain(x, z);
    let biome = &world.params.biomes[col.dominant];
    println!(
        "column ({x}, {z}): biome {} (weight {:.3}), surface at y={}",
        biome.name, col.dominant_weight, col.height
    );
    let mut structure: Vec<VoxelMod> = Vec::new();
    let top = (col.height + 8).min(CHUNK_HEIGHT as i32 - 1);
    for y in (0..=top).rev() {
        let id = world.generate_voxel(x, y, z, &mut structure);
        println!("{y:>4} {:>3} {}", id, reg.name(id));
    }
    if !structure.is_empty() {
        println!("roots a structure of {} voxels", structure.len());
    }
    Ok(())
}

fn noise_map(cli: &Cli, size: u32, scale: f32, offset: f32, out: &Path) -> Result<(), Box<dyn Error>> {
    let cfg = load_worldgen(&cli.worldgen, cli.seed)?;
    let noise = NoiseField::new(cfg.seed);
    let mut w = BufWriter::new(File::create(out)?);
    write!(w, "P5\n{size} {size}\n255\n")?;
    let mut row = Vec::with_capacity(size as usize);
    for y in 0..size {
        row.clear();
        for x in 0..size {
            let v = noise.perlin_2d(x as f32, y as f32, scale, offset);
            row.push((v * 255.0).round().clamp(0.0, 255.0) as u8);
        }
        w.write_all(&row)?;
    }
    w.flush()?;
    log::info!("wrote {}x{} noise map to {}", size, size, out.display());
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    match &cli.cmd {
        Command::Walk {
            ticks,
            speed,
            no_threads,
        } => walk(&cli, *ticks, *speed, *no_threads),
        Command::Column { x, z } => column(&cli, *x, *z),
        Command::NoiseMap {
            size,
            scale,
            offset,
            out,
        } => noise_map(&cli, *size, *scale, *offset, out),
    }
}
