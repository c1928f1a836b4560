//! Output primitives produced by the mesher

use crate::polygon::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Shape of an emitted primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveKind {
    /// An independent polygon (triangle or quad)
    Polygon,
    /// A triangle strip; triangle `i` is completed by vertex `i + 2`
    TriangleStrip,
    /// A triangle fan around the first vertex
    TriangleFan,
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PrimitiveKind::Polygon => "polygon",
            PrimitiveKind::TriangleStrip => "triangle-strip",
            PrimitiveKind::TriangleFan => "triangle-fan",
        };
        f.write_str(name)
    }
}

/// A primitive emitted by the mesher.
///
/// `components` holds one attribute record per represented triangle, in the
/// order the triangles appear; `attributes` is the record of the first one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub kind: PrimitiveKind,
    pub pool: PoolId,
    pub vertices: Vec<usize>,
    pub attributes: PolygonAttributes,
    pub components: Vec<PolygonAttributes>,
}

impl Primitive {
    /// Create a primitive. The component list must hold one record per triangle.
    pub fn new(
        kind: PrimitiveKind,
        pool: PoolId,
        vertices: Vec<usize>,
        components: Vec<PolygonAttributes>,
    ) -> Self {
        let attributes = components.first().copied().unwrap_or_default();
        Self {
            kind,
            pool,
            vertices,
            attributes,
            components,
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Re-express every represented triangle as an independent polygon, with its
    /// component attributes.
    pub fn to_polygons(&self) -> Vec<Polygon> {
        use crate::traits::Triangulated;

        self.triangles()
            .into_iter()
            .enumerate()
            .map(|(i, tri)| {
                let attributes = self.components.get(i).copied().unwrap_or(self.attributes);
                Polygon::triangle(self.pool, tri).with_attributes(attributes)
            })
            .collect()
    }
}
