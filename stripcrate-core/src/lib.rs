//! Core data structures and traits for stripcrate
//!
//! This crate provides the input and output types of the mesh optimizer:
//! vertex pools, polygons with their shading attributes, and the strip,
//! fan and polygon primitives the optimizer emits.

pub mod point;
pub mod polygon;
pub mod primitive;
pub mod mesh;
pub mod traits;
pub mod error;

pub use point::*;
pub use polygon::*;
pub use primitive::*;
pub use mesh::*;
pub use traits::*;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3};
