//! Strips: primitives in progress
//!
//! A strip starts life as one triangle or quad and grows by absorbing
//! neighbors across shared edges. Triangle `i` of a triangle strip is
//! `(s[i], s[i+1], s[i+2])` for even `i` and `(s[i+1], s[i], s[i+2])` for odd
//! `i`, so the head edge `(s[0], s[1])` always runs in the true winding
//! direction while the stored tail edge `(s[n-2], s[n-1])` does only when the
//! strip holds an odd number of triangles.
//!
//! Quad strips pair their vertices across the strip: quad `i` is
//! `(q[2i], q[2i+1], q[2i+3], q[2i+2])` for even `i` and the reverse for odd
//! `i`, so a single quad `[a, b, c, d]` is stored in its own winding order.

use crate::edge::{EdgeId, EdgeIndex};
use std::fmt;
use stripcrate_core::{Point3d, Vector3d};

/// Stable handle to a strip in the mesher arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StripId(pub usize);

/// Interned attribute record; equal handles mean equal source attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrId(pub usize);

/// Shape of a strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Triangle,
    Quad,
    TriangleStrip,
    QuadStrip,
    TriangleFan,
}

impl Shape {
    /// Quads and quad strips
    pub fn is_quad_family(self) -> bool {
        matches!(self, Shape::Quad | Shape::QuadStrip)
    }

    /// A lone triangle or quad, which can still be rotated freely
    pub fn is_polygon(self) -> bool {
        matches!(self, Shape::Triangle | Shape::Quad)
    }

    /// Rank used to keep like shapes together when choosing neighbors
    pub fn category(self) -> i32 {
        match self {
            Shape::Triangle => 1,
            Shape::TriangleStrip => 2,
            Shape::Quad | Shape::QuadStrip => 5,
            Shape::TriangleFan => 0,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Triangle => "Tri",
            Shape::Quad => "Quad",
            Shape::TriangleStrip => "TriStrip",
            Shape::QuadStrip => "QuadStrip",
            Shape::TriangleFan => "TriFan",
        };
        f.write_str(name)
    }
}

/// Lifecycle of a strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Still looking for neighbors
    Alive,
    /// Claimed by a mutual pair during the quad prepass
    Paired,
    /// Absorbed into another strip or a fan
    Dead,
    /// No eligible neighbors remain
    Done,
}

/// How a strip came to be, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Origin {
    UserSupplied,
    FirstQuad,
    FanPoly,
    Mate,
}

/// A primitive in progress
#[derive(Debug, Clone)]
pub struct Strip {
    pub shape: Shape,
    pub status: Status,
    pub origin: Origin,
    pub verts: Vec<usize>,
    /// One attribute handle per triangle
    pub prims: Vec<AttrId>,
    pub edges: Vec<EdgeId>,
    pub planar: bool,
    pub plane_normal: Vector3d,
    pub plane_offset: f64,
    pub row_id: i64,
    pub row_distance: i64,
    pub index: usize,
}

impl Strip {
    /// Create an empty strip of the given shape
    pub fn new(shape: Shape, origin: Origin, index: usize) -> Self {
        Self {
            shape,
            status: Status::Alive,
            origin,
            verts: Vec::new(),
            prims: Vec::new(),
            edges: Vec::new(),
            planar: false,
            plane_normal: Vector3d::zeros(),
            plane_offset: 0.0,
            row_id: 0,
            row_distance: 0,
            index,
        }
    }

    /// Build a triangle or quad strip from a polygon's vertices.
    ///
    /// A quad carries its attribute twice, once per logical triangle. The
    /// plane is captured when `normal` is known.
    pub fn from_polygon(
        verts: &[usize],
        attr: AttrId,
        normal: Option<Vector3d>,
        first_position: Point3d,
        index: usize,
    ) -> Self {
        let shape = match verts.len() {
            3 => Shape::Triangle,
            4 => Shape::Quad,
            n => panic!("strips are built from triangles and quads, got {} vertices", n),
        };
        let mut strip = Self::new(shape, Origin::UserSupplied, index);
        strip.verts = verts.to_vec();
        strip.prims = vec![attr; verts.len() - 2];
        if let Some(n) = normal {
            strip.planar = true;
            strip.plane_normal = n;
            strip.plane_offset = -n.dot(&first_position.coords);
        }
        strip
    }

    /// Alive, or transiently paired
    pub fn is_alive(&self) -> bool {
        matches!(self.status, Status::Alive | Status::Paired)
    }

    /// Number of triangles represented
    pub fn triangle_count(&self) -> usize {
        self.verts.len().saturating_sub(2)
    }

    pub fn type_category(&self) -> i32 {
        self.shape.category()
    }

    /// The first two vertices, in true winding direction
    pub fn head_edge(&self) -> (usize, usize) {
        (self.verts[0], self.verts[1])
    }

    /// The last two vertices as stored
    pub fn tail_edge(&self) -> (usize, usize) {
        let n = self.verts.len();
        (self.verts[n - 2], self.verts[n - 1])
    }

    /// Move the first vertex to the back
    fn rotate_forward(&mut self) {
        self.verts.rotate_left(1);
    }

    /// Move the last vertex to the front
    fn rotate_back(&mut self) {
        self.verts.rotate_right(1);
    }

    /// Rotate a triangle or quad so that `edge` spans its first two vertices
    pub fn rotate_to_front(&mut self, edge: (usize, usize)) {
        debug_assert!(self.shape.is_polygon());
        let on_edge = |vi: usize| vi == edge.0 || vi == edge.1;

        if on_edge(self.verts[0]) {
            if !on_edge(self.verts[1]) {
                // The edge wraps around the end of the list.
                self.rotate_back();
            }
        } else {
            let mut remaining = self.verts.len();
            while !on_edge(self.verts[0]) {
                remaining -= 1;
                assert!(remaining > 0, "edge {:?} not on strip {}", edge, self.index);
                self.rotate_forward();
            }
        }

        debug_assert!(on_edge(self.verts[0]) && on_edge(self.verts[1]));
    }

    /// Rotate a triangle or quad so that `edge` spans its last two vertices
    pub fn rotate_to_back(&mut self, edge: (usize, usize)) {
        debug_assert!(self.shape.is_polygon());
        let on_edge = |vi: usize| vi == edge.0 || vi == edge.1;
        let n = self.verts.len();

        if on_edge(self.verts[n - 1]) {
            if !on_edge(self.verts[n - 2]) {
                self.rotate_forward();
            }
        } else {
            let mut remaining = n;
            while !on_edge(self.verts[n - 1]) {
                remaining -= 1;
                assert!(remaining > 0, "edge {:?} not on strip {}", edge, self.index);
                self.rotate_back();
            }
        }

        debug_assert!(on_edge(self.verts[n - 1]) && on_edge(self.verts[n - 2]));
    }

    /// Quads and quad strips can flip their facing; triangle strips cannot
    pub fn can_invert(&self) -> bool {
        self.shape.is_quad_family()
    }

    /// Flip the facing of a quad or quad strip by swapping each vertex pair.
    /// Returns false, leaving the strip untouched, for other shapes.
    pub fn invert(&mut self) -> bool {
        if !self.can_invert() {
            return false;
        }
        debug_assert!(self.verts.len() % 2 == 0);
        for pair in self.verts.chunks_exact_mut(2) {
            pair.swap(0, 1);
        }
        true
    }

    /// Reverse the vertex and component order
    pub fn reverse(&mut self) {
        self.verts.reverse();
        self.prims.reverse();
    }

    /// True if the strip holds an odd number of triangles, or of quads
    pub fn is_odd(&self) -> bool {
        if self.shape.is_quad_family() {
            self.verts.len() % 4 == 0
        } else {
            self.verts.len() % 2 == 1
        }
    }

    /// True if converting to `target` would turn the stored tail edge around
    pub fn would_reverse_tail(&self, target: Shape) -> bool {
        if self.shape == target {
            return false;
        }
        match (target, self.shape) {
            (Shape::TriangleStrip, Shape::Triangle) => false,
            (Shape::TriangleStrip, Shape::Quad | Shape::QuadStrip) => self.verts.len() % 4 == 0,
            (Shape::QuadStrip, Shape::Quad) => false,
            (target, shape) => panic!("invalid strip conversion from {} to {}", shape, target),
        }
    }

    /// Convert a triangle, quad or quad strip into a triangle strip or quad
    /// strip. Quad-family to triangle strip swaps every other vertex pair.
    pub fn convert_to_type(&mut self, target: Shape) {
        if self.shape == target {
            return;
        }
        match (target, self.shape) {
            (Shape::TriangleStrip, Shape::Triangle) => {}
            (Shape::TriangleStrip, Shape::Quad | Shape::QuadStrip) => {
                debug_assert!(self.verts.len() % 2 == 0);
                for pair in self.verts.chunks_exact_mut(2).skip(1).step_by(2) {
                    pair.swap(0, 1);
                }
            }
            (Shape::QuadStrip, Shape::Quad) => {}
            (target, shape) => panic!("invalid strip conversion from {} to {}", shape, target),
        }
        self.shape = target;
    }

    /// First vertex on any of the strip's edges that is not an endpoint of `edge`
    pub fn find_uncommon_vertex(&self, index: &EdgeIndex, edge: (usize, usize)) -> Option<usize> {
        let off_edge = |vi: usize| vi != edge.0 && vi != edge.1;
        self.edges.iter().find_map(|&e| {
            let (a, b) = index.pair(e);
            if off_edge(a) {
                Some(a)
            } else if off_edge(b) {
                Some(b)
            } else {
                None
            }
        })
    }

    /// First edge that does not touch `vi`; in a triangle, the edge opposite it
    pub fn find_opposite_edge(&self, index: &EdgeIndex, vi: usize) -> Option<EdgeId> {
        self.edges
            .iter()
            .copied()
            .find(|&e| !index.get(e).contains_vertex(vi))
    }

    /// First edge sharing no vertex with `edge`; in a quad, the edge across from it
    pub fn find_opposite_edge_of(&self, index: &EdgeIndex, edge: (usize, usize)) -> Option<EdgeId> {
        self.edges
            .iter()
            .copied()
            .find(|&e| index.get(e).common_vertices(edge) == 0)
    }

    /// First edge sharing exactly one vertex with `edge`
    pub fn find_adjacent_edge(&self, index: &EdgeIndex, edge: (usize, usize)) -> Option<EdgeId> {
        self.edges
            .iter()
            .copied()
            .find(|&e| index.get(e).common_vertices(edge) == 1)
    }

    /// `1 - cos` of the angle between the two plane normals, or 2 when
    /// either strip is not planar
    pub fn coplanarity(&self, other: &Strip) -> f64 {
        if !self.planar || !other.planar {
            return 2.0;
        }
        1.0 - self.plane_normal.dot(&other.plane_normal)
    }

    pub fn is_coplanar_with(&self, other: &Strip, threshold: f64) -> bool {
        self.coplanarity(other) <= threshold
    }
}

impl fmt::Display for Strip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Status::Alive => {}
            Status::Paired => write!(f, "Paired ")?,
            Status::Dead => write!(f, "Dead ")?,
            Status::Done => write!(f, "Done ")?,
        }
        write!(f, "{}", self.shape)?;
        if self.planar {
            write!(f, " (planar)")?;
        }
        write!(f, " {} [", self.index)?;
        for vi in &self.verts {
            write!(f, " {}", vi)?;
        }
        write!(f, " ]: {} prims, {} edges", self.prims.len(), self.edges.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_strip(shape: Shape, verts: &[usize]) -> Strip {
        let mut strip = Strip::new(shape, Origin::UserSupplied, 0);
        strip.verts = verts.to_vec();
        strip.prims = vec![AttrId(0); verts.len() - 2];
        strip
    }

    #[test]
    fn test_from_polygon_quad_duplicates_attribute() {
        let strip = Strip::from_polygon(
            &[0, 1, 2, 3],
            AttrId(4),
            Some(Vector3d::z()),
            Point3d::new(0.0, 0.0, 2.0),
            9,
        );
        assert_eq!(strip.shape, Shape::Quad);
        assert_eq!(strip.prims, vec![AttrId(4), AttrId(4)]);
        assert!(strip.planar);
        assert_eq!(strip.plane_offset, -2.0);
        assert_eq!(strip.index, 9);
    }

    #[test]
    fn test_rotate_to_front() {
        let mut tri = make_strip(Shape::Triangle, &[7, 1, 2]);
        tri.rotate_to_front((1, 2));
        assert_eq!(tri.verts, vec![1, 2, 7]);

        // The edge wraps around the end of the list.
        let mut tri = make_strip(Shape::Triangle, &[1, 7, 2]);
        tri.rotate_to_front((1, 2));
        assert_eq!(tri.verts, vec![2, 1, 7]);

        let mut quad = make_strip(Shape::Quad, &[5, 6, 1, 2]);
        quad.rotate_to_front((2, 1));
        assert_eq!(quad.verts, vec![1, 2, 5, 6]);
    }

    #[test]
    fn test_rotate_to_back() {
        let mut tri = make_strip(Shape::Triangle, &[1, 2, 7]);
        tri.rotate_to_back((1, 2));
        assert_eq!(tri.verts, vec![7, 1, 2]);

        let mut tri = make_strip(Shape::Triangle, &[2, 7, 1]);
        tri.rotate_to_back((1, 2));
        assert_eq!(tri.verts, vec![7, 1, 2]);

        let mut quad = make_strip(Shape::Quad, &[1, 2, 5, 6]);
        quad.rotate_to_back((5, 2));
        assert_eq!(quad.verts, vec![6, 1, 2, 5]);
    }

    #[test]
    fn test_invert_only_quad_family() {
        let mut quad = make_strip(Shape::QuadStrip, &[0, 1, 2, 3, 4, 5]);
        assert!(quad.invert());
        assert_eq!(quad.verts, vec![1, 0, 3, 2, 5, 4]);

        let mut tristrip = make_strip(Shape::TriangleStrip, &[0, 1, 2, 3]);
        assert!(!tristrip.can_invert());
        assert!(!tristrip.invert());
        assert_eq!(tristrip.verts, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_is_odd() {
        assert!(make_strip(Shape::Triangle, &[0, 1, 2]).is_odd());
        assert!(!make_strip(Shape::TriangleStrip, &[0, 1, 2, 3]).is_odd());
        assert!(make_strip(Shape::Quad, &[0, 1, 2, 3]).is_odd());
        assert!(!make_strip(Shape::QuadStrip, &[0, 1, 2, 3, 4, 5]).is_odd());
        assert!(make_strip(Shape::QuadStrip, &[0, 1, 2, 3, 4, 5, 6, 7]).is_odd());
    }

    #[test]
    fn test_convert_quad_strip_to_triangle_strip() {
        let mut strip = make_strip(Shape::QuadStrip, &[0, 1, 6, 5, 10, 11]);
        assert!(!strip.would_reverse_tail(Shape::TriangleStrip));
        strip.convert_to_type(Shape::TriangleStrip);
        assert_eq!(strip.shape, Shape::TriangleStrip);
        assert_eq!(strip.verts, vec![0, 1, 5, 6, 10, 11]);

        let quad = make_strip(Shape::Quad, &[0, 1, 2, 3]);
        assert!(quad.would_reverse_tail(Shape::TriangleStrip));
        assert!(!quad.would_reverse_tail(Shape::QuadStrip));
    }

    #[test]
    #[should_panic]
    fn test_triangle_strip_never_becomes_quad_strip() {
        let mut strip = make_strip(Shape::TriangleStrip, &[0, 1, 2, 3]);
        strip.convert_to_type(Shape::QuadStrip);
    }

    #[test]
    fn test_head_and_tail_edges() {
        let strip = make_strip(Shape::TriangleStrip, &[4, 5, 6, 7, 8]);
        assert_eq!(strip.head_edge(), (4, 5));
        assert_eq!(strip.tail_edge(), (7, 8));
        assert_eq!(strip.triangle_count(), 3);
    }

    #[test]
    fn test_edge_helpers() {
        let mut index = EdgeIndex::new();
        let mut quad = make_strip(Shape::Quad, &[0, 1, 2, 3]);
        quad.edges = vec![
            index.get_or_create(0, 1),
            index.get_or_create(1, 2),
            index.get_or_create(2, 3),
            index.get_or_create(3, 0),
        ];

        assert_eq!(quad.find_uncommon_vertex(&index, (0, 1)), Some(2));
        assert_eq!(quad.find_opposite_edge(&index, 0), Some(quad.edges[1]));
        assert_eq!(quad.find_opposite_edge_of(&index, (1, 0)), Some(quad.edges[2]));
        assert_eq!(quad.find_adjacent_edge(&index, (0, 1)), Some(quad.edges[1]));
    }

    #[test]
    fn test_coplanarity() {
        let mut a = make_strip(Shape::Triangle, &[0, 1, 2]);
        let mut b = make_strip(Shape::Triangle, &[1, 3, 2]);
        assert_eq!(a.coplanarity(&b), 2.0);

        a.planar = true;
        b.planar = true;
        a.plane_normal = Vector3d::z();
        b.plane_normal = Vector3d::z();
        assert!(a.is_coplanar_with(&b, 0.01));

        b.plane_normal = Vector3d::x();
        assert_eq!(a.coplanarity(&b), 1.0);
        assert!(!a.is_coplanar_with(&b, 0.01));
    }

    #[test]
    fn test_display() {
        let mut strip = make_strip(Shape::TriangleStrip, &[0, 1, 2, 3]);
        strip.status = Status::Done;
        strip.index = 3;
        assert_eq!(strip.to_string(), "Done TriStrip 3 [ 0 1 2 3 ]: 2 prims, 0 edges");
    }
}
