//! Polygon mesh container and procedural generators

use crate::error::Result;
use crate::point::*;
use crate::polygon::*;
use serde::{Deserialize, Serialize};

/// A vertex pool together with the polygons that index it
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolygonMesh {
    pub pool: VertexPool,
    pub polygons: Vec<Polygon>,
}

impl PolygonMesh {
    /// Create a new empty mesh over a fresh pool
    pub fn new(id: PoolId) -> Self {
        Self {
            pool: VertexPool::new(id),
            polygons: Vec::new(),
        }
    }

    /// Create a mesh from an existing pool and polygons
    pub fn from_parts(pool: VertexPool, polygons: Vec<Polygon>) -> Self {
        Self { pool, polygons }
    }

    /// Identity of the underlying pool
    pub fn pool_id(&self) -> PoolId {
        self.pool.id
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.pool.len()
    }

    /// Get the number of polygons
    pub fn polygon_count(&self) -> usize {
        self.polygons.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.pool.is_empty() || self.polygons.is_empty()
    }

    /// Add a vertex at the given position
    pub fn add_vertex(&mut self, position: Point3d) -> usize {
        self.pool.add_vertex(Vertex::from_position(position))
    }

    /// Add a polygon with default attributes
    pub fn add_polygon(&mut self, vertices: Vec<usize>) -> &mut Polygon {
        self.polygons.push(Polygon::new(self.pool.id, vertices));
        let last = self.polygons.len() - 1;
        &mut self.polygons[last]
    }

    /// Add a triangle with default attributes
    pub fn add_triangle(&mut self, vertices: [usize; 3]) -> &mut Polygon {
        self.add_polygon(vertices.to_vec())
    }

    /// Add a quad with default attributes
    pub fn add_quad(&mut self, vertices: [usize; 4]) -> &mut Polygon {
        self.add_polygon(vertices.to_vec())
    }

    /// Validate every polygon against the pool
    pub fn validate(&self) -> Result<()> {
        self.polygons.iter().try_for_each(|p| p.validate(&self.pool))
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        self.pool.vertices.clear();
        self.polygons.clear();
    }

    /// A flat grid of `cols` x `rows` quads in the XY plane, facing +Z.
    ///
    /// Vertex `(i, j)` sits at `(i * spacing, j * spacing, 0)` and has index
    /// `j * (cols + 1) + i`.
    pub fn quad_grid(id: PoolId, cols: usize, rows: usize, spacing: f64) -> Self {
        let mut mesh = Self::grid_vertices(id, cols, rows, spacing);
        for j in 0..rows {
            for i in 0..cols {
                let [bl, br, tr, tl] = Self::cell(cols, i, j);
                mesh.add_quad([bl, br, tr, tl]);
            }
        }
        mesh
    }

    /// The same grid as [`PolygonMesh::quad_grid`] with every cell split into
    /// two triangles along its `bl`-`tr` diagonal.
    pub fn triangle_grid(id: PoolId, cols: usize, rows: usize, spacing: f64) -> Self {
        let mut mesh = Self::grid_vertices(id, cols, rows, spacing);
        for j in 0..rows {
            for i in 0..cols {
                let [bl, br, tr, tl] = Self::cell(cols, i, j);
                mesh.add_triangle([bl, br, tr]);
                mesh.add_triangle([bl, tr, tl]);
            }
        }
        mesh
    }

    fn grid_vertices(id: PoolId, cols: usize, rows: usize, spacing: f64) -> Self {
        let mut mesh = Self::new(id);
        for j in 0..=rows {
            for i in 0..=cols {
                mesh.add_vertex(Point3d::new(i as f64 * spacing, j as f64 * spacing, 0.0));
            }
        }
        mesh
    }

    fn cell(cols: usize, i: usize, j: usize) -> [usize; 4] {
        let stride = cols + 1;
        let bl = j * stride + i;
        let br = bl + 1;
        let tl = bl + stride;
        let tr = tl + 1;
        [bl, br, tr, tl]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Triangulated;

    #[test]
    fn test_quad_grid_counts() {
        let mesh = PolygonMesh::quad_grid(PoolId(0), 4, 3, 1.0);
        assert_eq!(mesh.vertex_count(), 20);
        assert_eq!(mesh.polygon_count(), 12);
        assert_eq!(mesh.triangle_count(), 24);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_triangle_grid_winding() {
        let mesh = PolygonMesh::triangle_grid(PoolId(0), 2, 2, 0.5);
        assert_eq!(mesh.polygon_count(), 8);
        for poly in &mesh.polygons {
            let normal = poly.calculate_normal(&mesh.pool).unwrap();
            assert!(normal.z > 0.99, "grid triangles should face +Z");
        }
    }

    #[test]
    fn test_add_and_clear() {
        let mut mesh = PolygonMesh::new(PoolId(2));
        let a = mesh.add_vertex(Point3d::new(0.0, 0.0, 0.0));
        let b = mesh.add_vertex(Point3d::new(1.0, 0.0, 0.0));
        let c = mesh.add_vertex(Point3d::new(0.0, 1.0, 0.0));
        mesh.add_triangle([a, b, c]);
        assert_eq!(mesh.polygons[0].pool, PoolId(2));
        assert!(!mesh.is_empty());

        mesh.clear();
        assert!(mesh.is_empty());
    }
}
