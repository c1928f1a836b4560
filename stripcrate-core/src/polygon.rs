//! Vertex pools and the polygon records that index them

use crate::error::{Error, Result};
use crate::point::*;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a vertex pool. Every polygon names the pool its indices refer to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PoolId(pub u32);

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pool#{}", self.0)
    }
}

/// Opaque handle to an externally resolved material or texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

/// A shared pool of vertices referenced by index
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VertexPool {
    pub id: PoolId,
    pub vertices: Vec<Vertex>,
}

impl VertexPool {
    /// Create a new empty pool
    pub fn new(id: PoolId) -> Self {
        Self {
            id,
            vertices: Vec::new(),
        }
    }

    /// Create a pool from plain positions
    pub fn from_positions(id: PoolId, positions: Vec<Point3d>) -> Self {
        Self {
            id,
            vertices: positions.into_iter().map(Vertex::from_position).collect(),
        }
    }

    /// Add a vertex and return its index
    pub fn add_vertex(&mut self, vertex: Vertex) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Get the number of vertices
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Check if the pool is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Get a vertex by index
    pub fn get(&self, index: usize) -> Option<&Vertex> {
        self.vertices.get(index)
    }

    /// Position of a vertex. The index must be in range.
    pub fn position(&self, index: usize) -> Point3d {
        self.vertices[index].position
    }
}

/// Flat shading attributes carried by a polygon.
///
/// The optimizer never interprets these; it only compares them for equality
/// and hands them back on the primitives it emits.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PolygonAttributes {
    pub color: Option<Color>,
    pub normal: Option<Vector3d>,
    pub material: Option<MaterialId>,
}

impl PolygonAttributes {
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_normal(mut self, normal: Vector3d) -> Self {
        self.normal = Some(normal);
        self
    }

    pub fn with_material(mut self, material: MaterialId) -> Self {
        self.material = Some(material);
        self
    }
}

/// A convex or concave polygon indexing a vertex pool, in counter-clockwise
/// winding order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    pub pool: PoolId,
    pub vertices: Vec<usize>,
    pub attributes: PolygonAttributes,
}

impl Polygon {
    /// Create a polygon with default attributes
    pub fn new(pool: PoolId, vertices: Vec<usize>) -> Self {
        Self {
            pool,
            vertices,
            attributes: PolygonAttributes::default(),
        }
    }

    /// Create a triangle
    pub fn triangle(pool: PoolId, vertices: [usize; 3]) -> Self {
        Self::new(pool, vertices.to_vec())
    }

    /// Create a quadrilateral
    pub fn quad(pool: PoolId, vertices: [usize; 4]) -> Self {
        Self::new(pool, vertices.to_vec())
    }

    /// Replace the polygon's attributes
    pub fn with_attributes(mut self, attributes: PolygonAttributes) -> Self {
        self.attributes = attributes;
        self
    }

    /// Number of vertices
    pub fn size(&self) -> usize {
        self.vertices.len()
    }

    /// Directed edges in winding order, closing back to the first vertex
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.vertices.iter().copied().circular_tuple_windows()
    }

    /// Check that the polygon is usable against the given pool: at least three
    /// vertices, all in range, none repeated.
    pub fn validate(&self, pool: &VertexPool) -> Result<()> {
        if self.vertices.len() < 3 {
            return Err(Error::InvalidData(format!(
                "Polygon has {} vertices, at least 3 are required",
                self.vertices.len()
            )));
        }
        if let Some(&bad) = self.vertices.iter().find(|&&vi| vi >= pool.len()) {
            return Err(Error::InvalidData(format!(
                "Vertex index {} out of range for {} with {} vertices",
                bad,
                pool.id,
                pool.len()
            )));
        }
        if !self.vertices.iter().all_unique() {
            return Err(Error::InvalidData(format!(
                "Polygon {:?} repeats a vertex",
                self.vertices
            )));
        }
        Ok(())
    }

    /// Compute the unit plane normal with Newell's method.
    ///
    /// Returns `None` for degenerate polygons (zero area).
    pub fn calculate_normal(&self, pool: &VertexPool) -> Option<Vector3d> {
        newell_normal(pool, &self.vertices)
    }
}

/// Unit normal of the closed loop `vertices` by Newell's method, or `None`
/// when the loop encloses no area.
pub fn newell_normal(pool: &VertexPool, vertices: &[usize]) -> Option<Vector3d> {
    let mut normal = Vector3d::zeros();
    for (a, b) in vertices.iter().copied().circular_tuple_windows() {
        let p = pool.position(a);
        let q = pool.position(b);
        normal.x += (p.y - q.y) * (p.z + q.z);
        normal.y += (p.z - q.z) * (p.x + q.x);
        normal.z += (p.x - q.x) * (p.y + q.y);
    }
    normal.try_normalize(1e-12)
}
