//! Core traits for stripcrate

use crate::{mesh::PolygonMesh, polygon::*, primitive::*};

/// Trait for records that represent a set of triangles over vertex indices
pub trait Triangulated {
    /// Number of triangles represented
    fn triangle_count(&self) -> usize;

    /// The represented triangles, each in its original winding order
    fn triangles(&self) -> Vec<[usize; 3]>;
}

/// Fan decomposition from the first vertex; exact for convex polygons.
fn fan_triangles(vertices: &[usize]) -> Vec<[usize; 3]> {
    if vertices.len() < 3 {
        return Vec::new();
    }
    (1..vertices.len() - 1)
        .map(|i| [vertices[0], vertices[i], vertices[i + 1]])
        .collect()
}

impl Triangulated for Polygon {
    fn triangle_count(&self) -> usize {
        self.vertices.len().saturating_sub(2)
    }

    fn triangles(&self) -> Vec<[usize; 3]> {
        fan_triangles(&self.vertices)
    }
}

impl Triangulated for Primitive {
    fn triangle_count(&self) -> usize {
        self.vertices.len().saturating_sub(2)
    }

    fn triangles(&self) -> Vec<[usize; 3]> {
        match self.kind {
            PrimitiveKind::Polygon | PrimitiveKind::TriangleFan => fan_triangles(&self.vertices),
            PrimitiveKind::TriangleStrip => self
                .vertices
                .windows(3)
                .enumerate()
                .map(|(i, w)| {
                    // Every odd triangle is traversed backwards by the strip.
                    if i % 2 == 0 {
                        [w[0], w[1], w[2]]
                    } else {
                        [w[1], w[0], w[2]]
                    }
                })
                .collect(),
        }
    }
}

impl Triangulated for PolygonMesh {
    fn triangle_count(&self) -> usize {
        self.polygons.iter().map(|p| p.triangle_count()).sum()
    }

    fn triangles(&self) -> Vec<[usize; 3]> {
        self.polygons.iter().flat_map(|p| p.triangles()).collect()
    }
}
