//! Triangle strip, fan and quad sheet builder
//!
//! This crate turns an unordered batch of polygons over one vertex pool into
//! fewer, longer primitives:
//! - Triangle strips grown greedily across shared edges
//! - Triangle fans around high-degree vertices
//! - Rows cut from rectangular grids of quads
//!
//! The optimizer is single threaded per pool; [`mesh_batch`] spreads
//! independent pools over a thread pool.

pub mod config;
pub mod edge;
pub mod fan;
pub mod mesher;
pub mod sheet;
mod state;
pub mod strip;
pub mod triangulate;
mod mating;

pub use config::*;
pub use fan::FanReport;
pub use mesher::*;
pub use sheet::SheetTally;
pub use strip::{Shape, Status};

use stripcrate_core::{PolygonMesh, Primitive, Result};

/// Turn a polygon mesh into render-ready primitives
pub trait MeshOptimizer {
    /// Optimize every polygon of `mesh` into strips, fans and leftover polygons
    fn optimize(&self, mesh: &PolygonMesh) -> Result<Vec<Primitive>>;
}
