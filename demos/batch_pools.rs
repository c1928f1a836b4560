//! Optimize several independent vertex pools in one parallel batch

use anyhow::Result;
use clap::Parser;
use stripcrate::prelude::*;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "batch_pools")]
#[command(version, about = "Optimize many grids at once, one per vertex pool")]
struct Cli {
    /// Number of pools in the batch.
    #[arg(short, long, default_value_t = 8)]
    pools: u32,

    /// Cells along each side of every grid.
    #[arg(short, long, default_value_t = 16)]
    size: usize,

    /// Show debug logs from the optimizer.
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    let mut pools = Vec::new();
    let mut polygons = Vec::new();
    for id in 0..cli.pools {
        // Alternate quad and triangle grids so both paths run.
        let mesh = if id % 2 == 0 {
            PolygonMesh::quad_grid(PoolId(id), cli.size, cli.size, 1.0)
        } else {
            PolygonMesh::triangle_grid(PoolId(id), cli.size, cli.size, 1.0)
        };
        pools.push(mesh.pool);
        polygons.extend(mesh.polygons);
    }

    let results = mesh_batch(&pools, &polygons, &MesherConfig::default())?;
    for (pool, primitives) in &results {
        let triangles: usize = primitives.iter().map(|p| p.triangle_count()).sum();
        println!("{}: {} primitives, {} triangles", pool, primitives.len(), triangles);
    }
    Ok(())
}
