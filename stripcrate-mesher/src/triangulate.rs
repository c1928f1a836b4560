//! Polygon triangulation
//!
//! Convex polygons are cut by a zig-zag sweep that alternates between the two
//! ends of the vertex list, which leaves triangles in an order that strips
//! well. Concave polygons fall back to ear clipping on the projection that
//! drops the dominant axis of the polygon normal.

use nalgebra::Vector2;
use stripcrate_core::{newell_normal, Vector3d, VertexPool};

const EPSILON: f64 = 1e-12;

/// Zig-zag triangulation of a convex polygon, preserving winding
pub fn zigzag(vertices: &[usize]) -> Vec<[usize; 3]> {
    let n = vertices.len();
    let mut triangles = Vec::with_capacity(n.saturating_sub(2));
    if n < 3 {
        return triangles;
    }

    let mut lo = 0;
    let mut hi = n - 1;
    let mut from_low = true;
    while hi - lo >= 2 {
        if from_low {
            triangles.push([vertices[lo], vertices[lo + 1], vertices[hi]]);
            lo += 1;
        } else {
            triangles.push([vertices[lo], vertices[hi - 1], vertices[hi]]);
            hi -= 1;
        }
        from_low = !from_low;
    }
    triangles
}

/// Project a polygon onto the coordinate plane most nearly perpendicular to
/// `normal`, keeping counter-clockwise winding when seen from the normal side.
pub fn project(pool: &VertexPool, vertices: &[usize], normal: &Vector3d) -> Vec<Vector2<f64>> {
    let abs = normal.abs();
    let axis = if abs.x > abs.y && abs.x > abs.z {
        0
    } else if abs.y > abs.z {
        1
    } else {
        2
    };
    let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
    let flip = normal[axis] < 0.0;

    vertices
        .iter()
        .map(|&vi| {
            let p = pool.position(vi);
            if flip {
                Vector2::new(p[v], p[u])
            } else {
                Vector2::new(p[u], p[v])
            }
        })
        .collect()
}

fn cross(o: &Vector2<f64>, a: &Vector2<f64>, b: &Vector2<f64>) -> f64 {
    (a - o).perp(&(b - o))
}

/// True if every corner of the projected loop turns strictly left
pub fn is_convex(points: &[Vector2<f64>]) -> bool {
    let n = points.len();
    (0..n).all(|i| cross(&points[i], &points[(i + 1) % n], &points[(i + 2) % n]) > EPSILON)
}

fn in_triangle(p: &Vector2<f64>, a: &Vector2<f64>, b: &Vector2<f64>, c: &Vector2<f64>) -> bool {
    cross(a, b, p) >= 0.0 && cross(b, c, p) >= 0.0 && cross(c, a, p) >= 0.0
}

/// Ear clipping over projected points. Returns `None` when no ear can be
/// found, which only happens for self-intersecting loops.
pub fn ear_clip(vertices: &[usize], points: &[Vector2<f64>]) -> Option<Vec<[usize; 3]>> {
    let mut remaining: Vec<usize> = (0..vertices.len()).collect();
    let mut triangles = Vec::with_capacity(vertices.len().saturating_sub(2));

    while remaining.len() > 3 {
        let m = remaining.len();
        let ear = (0..m).find(|&i| {
            let (prev, cur, next) = (remaining[(i + m - 1) % m], remaining[i], remaining[(i + 1) % m]);
            let (a, b, c) = (&points[prev], &points[cur], &points[next]);
            cross(a, b, c) > EPSILON
                && remaining
                    .iter()
                    .filter(|&&k| k != prev && k != cur && k != next)
                    .all(|&k| !in_triangle(&points[k], a, b, c))
        })?;

        let (prev, cur, next) = (remaining[(ear + m - 1) % m], remaining[ear], remaining[(ear + 1) % m]);
        triangles.push([vertices[prev], vertices[cur], vertices[next]]);
        remaining.remove(ear);
    }

    if let [a, b, c] = remaining[..] {
        triangles.push([vertices[a], vertices[b], vertices[c]]);
    }
    Some(triangles)
}

/// Triangulate a polygon over `pool`.
///
/// Returns `None` for degenerate loops (no area) and for loops that cannot be
/// ear clipped; callers decide how to fall back.
pub fn triangulate(pool: &VertexPool, vertices: &[usize]) -> Option<Vec<[usize; 3]>> {
    match vertices.len() {
        0..=2 => None,
        3 => Some(vec![[vertices[0], vertices[1], vertices[2]]]),
        _ => {
            let normal = newell_normal(pool, vertices)?;
            let points = project(pool, vertices, &normal);
            if is_convex(&points) {
                Some(zigzag(vertices))
            } else {
                ear_clip(vertices, &points)
            }
        }
    }
}

/// True if the polygon is non-degenerate and convex in its own plane
pub fn is_convex_polygon(pool: &VertexPool, vertices: &[usize]) -> bool {
    newell_normal(pool, vertices)
        .map(|normal| is_convex(&project(pool, vertices, &normal)))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use stripcrate_core::{Point3d, PoolId};

    fn make_pool(points: &[(f64, f64, f64)]) -> VertexPool {
        VertexPool::from_positions(
            PoolId(0),
            points.iter().map(|&(x, y, z)| Point3d::new(x, y, z)).collect(),
        )
    }

    fn signed_area_z(pool: &VertexPool, tri: &[usize; 3]) -> f64 {
        let a = pool.position(tri[0]);
        let b = pool.position(tri[1]);
        let c = pool.position(tri[2]);
        (b - a).cross(&(c - a)).z
    }

    #[test]
    fn test_zigzag_counts_and_order() {
        assert_eq!(zigzag(&[0, 1, 2, 3]), vec![[0, 1, 3], [1, 2, 3]]);
        assert_eq!(zigzag(&[0, 1, 2, 3, 4]), vec![[0, 1, 4], [1, 3, 4], [1, 2, 3]]);
        assert_eq!(zigzag(&[0, 1, 2, 3, 4, 5, 6, 7]).len(), 6);
        assert!(zigzag(&[0, 1]).is_empty());
    }

    #[test]
    fn test_convex_hexagon_keeps_winding() {
        let pool = make_pool(&[
            (2.0, 0.0, 0.0),
            (1.0, 1.7, 0.0),
            (-1.0, 1.7, 0.0),
            (-2.0, 0.0, 0.0),
            (-1.0, -1.7, 0.0),
            (1.0, -1.7, 0.0),
        ]);
        let tris = triangulate(&pool, &[0, 1, 2, 3, 4, 5]).unwrap();
        assert_eq!(tris.len(), 4);
        for tri in &tris {
            assert!(signed_area_z(&pool, tri) > 0.0, "triangle {:?} flipped", tri);
        }
    }

    #[test]
    fn test_concave_polygon_uses_ear_clipping() {
        // An arrow head with a reflex vertex at index 3.
        let pool = make_pool(&[
            (0.0, 0.0, 0.0),
            (2.0, 0.0, 0.0),
            (2.0, 2.0, 0.0),
            (1.0, 0.5, 0.0),
            (0.0, 2.0, 0.0),
        ]);
        let verts = [0, 1, 2, 3, 4];
        assert!(!is_convex_polygon(&pool, &verts));

        let tris = triangulate(&pool, &verts).unwrap();
        assert_eq!(tris.len(), 3);
        for tri in &tris {
            assert!(signed_area_z(&pool, tri) > 0.0, "triangle {:?} flipped", tri);
        }
    }

    #[test]
    fn test_projection_respects_facing() {
        // The same square seen from below: winding is clockwise in XY.
        let pool = make_pool(&[
            (0.0, 0.0, 0.0),
            (0.0, 1.0, 0.0),
            (1.0, 1.0, 0.0),
            (1.0, 0.0, 0.0),
        ]);
        let verts = [0, 1, 2, 3];
        let normal = newell_normal(&pool, &verts).unwrap();
        assert!(normal.z < 0.0);
        assert!(is_convex(&project(&pool, &verts, &normal)));
        assert!(is_convex_polygon(&pool, &verts));
    }

    #[test]
    fn test_degenerate_polygon() {
        let pool = make_pool(&[
            (0.0, 0.0, 0.0),
            (1.0, 0.0, 0.0),
            (2.0, 0.0, 0.0),
            (3.0, 0.0, 0.0),
        ]);
        assert!(triangulate(&pool, &[0, 1, 2, 3]).is_none());
        assert!(!is_convex_polygon(&pool, &[0, 1, 2, 3]));
    }
}
