//! Strip a generated grid and report what the optimizer produced
//!
//! ```text
//! cargo run --bin strip_grid -- --cols 16 --rows 8 --quads --verbose
//! ```

use anyhow::{ensure, Result};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use stripcrate::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "strip_grid")]
#[command(version, about = "Turn a generated grid into triangle strips and fans")]
struct Cli {
    /// Number of cells along X.
    #[arg(long, default_value_t = 8)]
    cols: usize,

    /// Number of cells along Y.
    #[arg(long, default_value_t = 8)]
    rows: usize,

    /// Emit quads instead of split cells.
    #[arg(long)]
    quads: bool,

    /// Randomly nudge every vertex by up to this distance.
    #[arg(long, default_value_t = 0.0)]
    jitter: f64,

    /// Seed for the jitter.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Keep strips even and skip fans.
    #[arg(long)]
    flat_shaded: bool,

    /// Skip fan detection.
    #[arg(long)]
    no_fans: bool,

    /// Skip cutting quad grids into rows.
    #[arg(long)]
    no_sheets: bool,

    /// Print every primitive.
    #[arg(short, long)]
    verbose: bool,
}

fn build_mesh(cli: &Cli) -> PolygonMesh {
    let mut mesh = if cli.quads {
        PolygonMesh::quad_grid(PoolId(0), cli.cols, cli.rows, 1.0)
    } else {
        PolygonMesh::triangle_grid(PoolId(0), cli.cols, cli.rows, 1.0)
    };

    if cli.jitter > 0.0 {
        let mut rng = StdRng::seed_from_u64(cli.seed);
        for vertex in &mut mesh.pool.vertices {
            vertex.position.x += rng.gen_range(-cli.jitter..cli.jitter);
            vertex.position.y += rng.gen_range(-cli.jitter..cli.jitter);
            vertex.position.z += rng.gen_range(-cli.jitter..cli.jitter);
        }
    }
    mesh
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    ensure!(cli.cols > 0 && cli.rows > 0, "grid needs at least one cell");
    ensure!(cli.jitter < 0.5, "jitter of {} would fold the grid", cli.jitter);

    let mesh = build_mesh(&cli);
    info!(
        vertices = mesh.vertex_count(),
        polygons = mesh.polygon_count(),
        triangles = mesh.triangle_count(),
        "grid generated"
    );

    let config = MesherConfig::default()
        .with_flat_shading(cli.flat_shaded)
        .with_fan_detection(!cli.no_fans)
        .with_sheet_building(!cli.no_sheets);
    mesh.validate()?;
    let (primitives, stats) = Mesher::new(config).mesh_with_stats(&mesh.pool, &mesh.polygons)?;

    println!("stripcrate grid demo");
    println!("====================");
    println!("Input: {} polygons, {} triangles", mesh.polygon_count(), stats.input_triangles);
    println!(
        "Output: {} primitives ({} strips, {} fans, {} polygons)",
        stats.primitive_count(),
        stats.triangle_strips,
        stats.triangle_fans,
        stats.polygons
    );
    println!(
        "Prepass quads: {}, sheets: {}, fans built: {}, fans unrolled: {}",
        stats.quads_paired, stats.sheets_cut, stats.fans_built, stats.fans_unrolled
    );

    let vertices_sent: usize = primitives.iter().map(|p| p.vertex_count()).sum();
    println!(
        "Vertices sent: {} (vs {} as independent triangles)",
        vertices_sent,
        stats.input_triangles * 3
    );

    if cli.verbose {
        for (i, primitive) in primitives.iter().enumerate() {
            println!("  #{:<4} {:<15} {:?}", i, primitive.kind, primitive.vertices);
        }
    }

    ensure!(stats.is_conserved(), "triangle count changed: {:?}", stats);
    Ok(())
}
