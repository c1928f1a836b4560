//! Point and vertex types

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// RGBA color with floating point channels
pub type Color = [f32; 4];

/// A vertex in a vertex pool.
///
/// Per-vertex normals and colors are carried through the optimizer untouched;
/// only the position is ever read, and only for geometric tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub position: Point3d,
    pub normal: Option<Vector3d>,
    pub color: Option<Color>,
}

impl Vertex {
    /// Create a vertex with only a position
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self::from_position(Point3d::new(x, y, z))
    }

    /// Create a vertex from an existing point
    pub fn from_position(position: Point3d) -> Self {
        Self {
            position,
            normal: None,
            color: None,
        }
    }

    /// Attach a per-vertex normal
    pub fn with_normal(mut self, normal: Vector3d) -> Self {
        self.normal = Some(normal);
        self
    }

    /// Attach a per-vertex color
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::from_position(Point3d::origin())
    }
}

impl From<Point3d> for Vertex {
    fn from(position: Point3d) -> Self {
        Self::from_position(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_builders() {
        let v = Vertex::new(1.0, 2.0, 3.0)
            .with_normal(Vector3d::z())
            .with_color([1.0, 0.0, 0.0, 1.0]);
        assert_eq!(v.position, Point3d::new(1.0, 2.0, 3.0));
        assert_eq!(v.normal, Some(Vector3d::z()));
        assert_eq!(v.color, Some([1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn test_vertex_default_is_origin() {
        let v = Vertex::default();
        assert_eq!(v.position, Point3d::origin());
        assert!(v.normal.is_none());
        assert!(v.color.is_none());
    }
}
