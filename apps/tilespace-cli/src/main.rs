use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use glam::Vec3;
use tilespace_author::Editor;
use tilespace_common::{
    CollisionType, MapCoord, Mesh, RenderPrimitive, Texture, TileDefinition, TileRef, Tileset,
    TilesetType,
};
use tilespace_input::{Action, GridPos};
use tilespace_kernel::Area;
use tilespace_persist::{ProjectStore, export_area};
use tilespace_render::{Framebuffer, OrbitCamera, Renderer, SoftwareRenderer, ViewportConfig};
use tilespace_tools::{AreaInspector, FrameTimer};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "tilespace-cli", about = "CLI tool for tilespace projects")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Project directory
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print crate info
    Info,
    /// List stored areas
    List,
    /// Create a demo area with a starter tileset and save it
    New {
        name: String,
        #[arg(long, default_value = "2")]
        width: usize,
        #[arg(long, default_value = "2")]
        height: usize,
    },
    /// Print an area summary and per-map layer occupancy
    Inspect { name: String },
    /// Render an area to a PPM image
    Render {
        name: String,
        #[arg(short, long, default_value = "render.ppm")]
        out: PathBuf,
        #[arg(long, default_value = "640")]
        width: usize,
        #[arg(long, default_value = "480")]
        height: usize,
        /// Viewport configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Frames to render for timing
        #[arg(long, default_value = "1")]
        frames: usize,
    },
    /// Write runtime layouts and tilesets
    Export {
        name: String,
        #[arg(short, long, default_value = "export")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let store = ProjectStore::open(&cli.project)?;

    match cli.command {
        Commands::Info => {
            println!("tilespace-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", tilespace_common::crate_info());
            println!("kernel: {}", tilespace_kernel::crate_info());
            println!("persist: {}", tilespace_persist::crate_info());
            println!("render: {}", tilespace_render::crate_info());
            println!("author: {}", tilespace_author::crate_info());
            println!("input: {}", tilespace_input::crate_info());
            println!("tools: {}", tilespace_tools::crate_info());
        }
        Commands::List => {
            for name in store.list_areas()? {
                println!("{name}");
            }
        }
        Commands::New {
            name,
            width,
            height,
        } => {
            let mut area = demo_area(&name, width, height)?;
            let path = store.save_area(&mut area)?;
            println!("{}", AreaInspector::summary(&area));
            println!("Saved to {}", path.display());
        }
        Commands::Inspect { name } => {
            let area = store.load_area(&name)?;
            println!("{}", AreaInspector::summary(&area));
            for coord in AreaInspector::list_maps(&area) {
                if let Some(info) = AreaInspector::inspect_map(&area, coord) {
                    println!("  {info}");
                }
            }
        }
        Commands::Render {
            name,
            out,
            width,
            height,
            config,
            frames,
        } => {
            let viewport = match config {
                Some(path) => ViewportConfig::load(&path)?,
                None => ViewportConfig::default(),
            };
            let area = store.load_area(&name)?;
            let mut camera = OrbitCamera::new(viewport.camera.clone());
            camera.look_at(area_centre(&area));

            let mut renderer = SoftwareRenderer::new(width, height, viewport.render);
            let mut timer = FrameTimer::default();
            let mut last = None;
            for _ in 0..frames.max(1) {
                let stats = renderer.render(&area, &camera);
                timer.record_frame(&stats);
                last = Some(stats);
            }
            if let Some(stats) = last {
                println!(
                    "Frame: tiles={} unresolved={} triangles={} culled={} pixels={}",
                    stats.tiles_drawn,
                    stats.unresolved,
                    stats.triangles_submitted,
                    stats.triangles_culled,
                    stats.pixels_written
                );
            }
            let t = timer.timings();
            println!(
                "Timing: frames={} avg={:?} min={:?} max={:?} ({:.1} fps)",
                t.frames,
                t.average,
                t.min,
                t.max,
                t.fps()
            );
            write_ppm(renderer.framebuffer(), &out)?;
            println!("Wrote {}", out.display());
        }
        Commands::Export { name, out } => {
            let area = store.load_area(&name)?;
            let report = export_area(&area, &out)?;
            println!(
                "Exported {} layouts and {} tilesets ({} files) to {}",
                report.layouts,
                report.tilesets,
                report.files.len(),
                out.display()
            );
        }
    }

    Ok(())
}

/// Area with a cube tileset: a grass floor on every map and a stone wall
/// along the north edge of the first map.
fn demo_area(name: &str, width: usize, height: usize) -> anyhow::Result<Area> {
    let mut tileset = Tileset::new(format!("{name}-terrain"), TilesetType::Regional);
    tileset.push(TileDefinition::new(0, "air"));
    let grass = tileset.push(
        TileDefinition::new(1, "grass").with_primitive(RenderPrimitive::new(
            Mesh::unit_cube(),
            Texture::from_fn(8, 8, |x, y| {
                if (x + y) % 4 == 0 { 0xFF3C8C3C } else { 0xFF4CAF50 }
            }),
        )),
    );
    let stone = tileset.push(
        TileDefinition::new(2, "stone")
            .with_collision(CollisionType::Solid)
            .with_primitive(RenderPrimitive::new(
                Mesh::unit_cube(),
                Texture::solid(4, 4, 0xFF8A8A8A),
            )),
    );

    let mut area = Area::new(name, width.max(1), height.max(1));
    let index = area.add_tileset(tileset) as u8;
    for y in 0..area.height() {
        for x in 0..area.width() {
            area.get_or_create_map(x as i32, y as i32);
        }
    }

    let mut editor = Editor::new(area, Default::default());
    let coords: Vec<MapCoord> = AreaInspector::list_maps(editor.area());
    for coord in coords {
        editor.apply(Action::SelectTile(TileRef::new(index, grass)))?;
        editor.apply(Action::Fill(GridPos::new(0, coord, 0, 0)))?;
    }

    editor.apply(Action::SelectTile(TileRef::new(index, stone)))?;
    editor.apply(Action::BeginStroke)?;
    for x in 0..tilespace_common::MAP_WIDTH as i32 {
        editor.apply(Action::Paint(GridPos::new(1, MapCoord::new(0, 0), x, 0)))?;
    }
    editor.apply(Action::EndStroke)?;

    Ok(editor.into_area())
}

fn area_centre(area: &Area) -> Vec3 {
    Vec3::new(
        (area.width() * tilespace_common::MAP_WIDTH) as f32 * 0.5,
        0.0,
        (area.height() * tilespace_common::MAP_HEIGHT) as f32 * 0.5,
    )
}

/// Binary PPM (P6); alpha is dropped.
fn write_ppm(fb: &Framebuffer, path: &Path) -> anyhow::Result<()> {
    let mut out = Vec::with_capacity(fb.pixels().len() * 3 + 32);
    write!(out, "P6\n{} {}\n255\n", fb.width(), fb.height())?;
    for &argb in fb.pixels() {
        out.extend_from_slice(&[(argb >> 16) as u8, (argb >> 8) as u8, argb as u8]);
    }
    std::fs::write(path, out)?;
    Ok(())
}
