//! # stripcrate
//!
//! Turns polygon meshes into triangle strips, triangle fans and quad sheets
//! for faster rendering.
//!
//! This is the umbrella crate that provides convenient access to all stripcrate
//! functionality. Use the individual crates for more granular control over
//! dependencies.
//!
//! ## Features
//!
//! - **Core**: Vertex pools, polygons, output primitives and errors
//! - **Mesher**: The strip, fan and sheet builder
//!
//! ## Quick Start
//!
//! ```rust
//! use stripcrate::prelude::*;
//!
//! let mesh = PolygonMesh::quad_grid(PoolId(0), 4, 4, 1.0);
//! let primitives = Mesher::default().optimize(&mesh).unwrap();
//!
//! assert_eq!(primitives.len(), 4);
//! assert!(primitives.iter().all(|p| p.kind == PrimitiveKind::TriangleStrip));
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: Enables the mesher
//! - `mesher`: The strip, fan and sheet builder

// Re-export core functionality
pub use stripcrate_core::*;

#[cfg(feature = "mesher")]
pub use stripcrate_mesher as mesher;

/// Convenient imports for common use cases
pub mod prelude {
    pub use stripcrate_core::*;

    #[cfg(feature = "mesher")]
    pub use stripcrate_mesher::{mesh_batch, MeshOptimizer, MeshStats, Mesher, MesherConfig};
}
