//! Mating engine
//!
//! Joins two strips that share an edge into one. The choice of partner is
//! greedy: every strip looks across its edges and keeps the neighbor that
//! `pick_mate` ranks best.

use crate::edge::EdgeId;
use crate::state::MeshState;
use crate::strip::{Origin, Shape, Status, Strip, StripId};
use tracing::trace;

impl MeshState<'_> {
    /// Join a strip with its best neighbor.
    ///
    /// Returns false, marking the strip done, when it has no neighbors left.
    /// Returns true once a join was attempted, whether or not it succeeded.
    pub fn mate(&mut self, id: StripId) -> bool {
        assert_eq!(self.strip(id).status, Status::Alive, "only live strips can mate");

        match self.find_ideal_mate(id) {
            None => {
                self.strip_mut(id).status = Status::Done;
                trace!(strip = %self.strip(id), "no neighbors left");
                false
            }
            Some((mate, edge)) => {
                trace!(
                    strip = %self.strip(id),
                    mate = %self.strip(mate),
                    neighbors = self.count_neighbors(id),
                    "mating"
                );
                self.mate_pieces(edge, id, mate);
                true
            }
        }
    }

    /// The most suitable neighbor of a strip and the edge they share
    pub fn find_ideal_mate(&self, id: StripId) -> Option<(StripId, EdgeId)> {
        let mut best: Option<(StripId, EdgeId)> = None;
        for (other, edge) in self.neighbors(id) {
            if !self.strip(other).is_alive() {
                continue;
            }
            best = match best {
                Some((mate, mate_edge)) if !self.pick_mate(id, other, mate, edge, mate_edge) => {
                    Some((mate, mate_edge))
                }
                _ => Some((other, edge)),
            };
        }
        best
    }

    /// True if `a` (across `a_edge`) is a better partner for `me` than `b`
    /// (across `b_edge`).
    pub fn pick_mate(&self, me: StripId, a: StripId, b: StripId, a_edge: EdgeId, b_edge: EdgeId) -> bool {
        let (me_strip, a_strip, b_strip) = (self.strip(me), self.strip(a), self.strip(b));

        // Keep like shapes together so quad strips are not polluted by stray triangles.
        let (a_cat, b_cat) = (a_strip.type_category(), b_strip.type_category());
        if a_cat != b_cat {
            let me_cat = me_strip.type_category();
            return (a_cat - me_cat).abs() < (b_cat - me_cat).abs();
        }

        if me_strip.shape == Shape::Triangle
            && a_strip.shape == Shape::Triangle
            && b_strip.shape == Shape::Triangle
        {
            let weights = self.config.mate_weights;
            let coplanar_diff = me_strip.coplanarity(a_strip) - me_strip.coplanarity(b_strip);

            let (a_length, b_length) = (self.edge_length(a_edge), self.edge_length(b_edge));
            let total = a_length + b_length;
            let length_diff = if total > 0.0 {
                (a_length - b_length) / total
            } else {
                0.0
            };

            let score = weights.coplanarity * coplanar_diff - weights.edge_length * length_diff;
            return score < 0.0;
        }

        if a_strip.prims.len() != b_strip.prims.len() {
            return a_strip.prims.len() < b_strip.prims.len();
        }

        self.count_neighbors(a) < self.count_neighbors(b)
    }

    /// Join `back` onto `front` across `edge`.
    ///
    /// On success `front` holds the result and `back` is dead. On failure the
    /// shared edge is severed from both strips so the pair is never retried.
    pub fn mate_pieces(&mut self, edge: EdgeId, front_id: StripId, back_id: StripId) -> bool {
        let common = self.edges.pair(edge);
        let flat_shaded = self.config.flat_shaded;
        let (front, back) = (self.strip(front_id), self.strip(back_id));
        assert_eq!(front.status, Status::Alive, "front strip must be alive");
        assert_eq!(back.status, Status::Alive, "back strip must be alive");

        let is_coplanar = front.is_coplanar_with(back, self.config.coplanarity_threshold);
        let mut remove_sides = true;

        let success = match (front.shape, back.shape) {
            (Shape::Triangle, Shape::Triangle) => {
                let new_vert = uncommon_vertex(back, common);
                let make_quad = is_coplanar
                    && self.config.allow_quad_retesselation
                    && front.prims[0] == back.prims[0]
                    && self.convex_quad(common, front_id, back_id);

                match new_vert {
                    Some(new_vert) if winds_against(front, back, common) => {
                        let (front, back) = self.pair_mut(front_id, back_id);
                        if make_quad {
                            insert_on_edge(&mut front.verts, common, new_vert);
                            front.shape = Shape::Quad;
                            // All four outer edges stay; the quad may still grow any way.
                            remove_sides = false;
                        } else {
                            front.rotate_to_back(common);
                            front.shape = Shape::TriangleStrip;
                            front.verts.push(new_vert);
                        }
                        front.prims.append(&mut back.prims);
                        back.verts.clear();
                        true
                    }
                    _ => false,
                }
            }
            (Shape::Quad | Shape::QuadStrip, Shape::Quad | Shape::QuadStrip) => {
                let (front, back) = self.pair_mut(front_id, back_id);
                mate_strips(common, front, back, Shape::QuadStrip, flat_shaded)
            }
            _ => {
                let (front, back) = self.pair_mut(front_id, back_id);
                if mate_strips(common, front, back, Shape::TriangleStrip, flat_shaded) {
                    true
                } else if mate_strips(common, back, front, Shape::TriangleStrip, flat_shaded) {
                    front.verts = std::mem::take(&mut back.verts);
                    front.prims = std::mem::take(&mut back.prims);
                    front.shape = back.shape;
                    true
                } else {
                    false
                }
            }
        };

        if !success {
            trace!(edge = ?common, "join refused, severing edge");
            self.sever(edge, front_id);
            self.sever(edge, back_id);
            return false;
        }

        self.combine_edges(front_id, back_id, remove_sides);
        if !remove_sides {
            self.sever(edge, front_id);
        }

        let (front, back) = self.pair_mut(front_id, back_id);
        assert!(back.verts.is_empty() && back.prims.is_empty(), "back strip not emptied");
        back.status = Status::Dead;
        front.planar = is_coplanar;
        front.origin = Origin::Mate;

        if cfg!(debug_assertions) {
            self.check_edges(front_id);
        }
        true
    }

    /// True if the two triangles meeting at `common` form a convex quad.
    ///
    /// Both apexes and the shared edge are projected onto the coordinate plane
    /// that drops the largest component of the front normal; the quad is
    /// convex when the shared edge crosses the line through the two apexes.
    pub fn convex_quad(&self, common: (usize, usize), front_id: StripId, back_id: StripId) -> bool {
        let (front, back) = (self.strip(front_id), self.strip(back_id));
        let (Some(vi_a), Some(vi_b)) = (uncommon_vertex(front, common), uncommon_vertex(back, common)) else {
            return false;
        };
        if !front.planar {
            return false;
        }

        let n = front.plane_normal.abs();
        let (xi, yi) = if n.x > n.y {
            if n.x > n.z {
                (1, 2)
            } else {
                (0, 1)
            }
        } else if n.y > n.z {
            (0, 2)
        } else {
            (0, 1)
        };

        let project = |vi: usize| {
            let p = self.pool.position(vi);
            (p[xi], p[yi])
        };
        let (a, b) = (project(vi_a), project(vi_b));
        let (c, d) = (project(common.0), project(common.1));

        // Line through the apexes: A x + B y + C = 0
        let line_a = b.1 - a.1;
        let line_b = a.0 - b.0;
        let line_c = -(line_a * b.0 + line_b * b.1);

        let t = -(line_a * c.0 + line_b * c.1 + line_c) / (line_a * (d.0 - c.0) + line_b * (d.1 - c.1));
        (0.0..=1.0).contains(&t)
    }

    /// Move the back strip's edges onto the front strip. With `remove_sides`
    /// only the edges matching the new head and tail survive.
    pub fn combine_edges(&mut self, front_id: StripId, back_id: StripId, remove_sides: bool) {
        let moved = std::mem::take(&mut self.strip_mut(back_id).edges);
        for &edge in &moved {
            self.edges.change_strip(edge, back_id, front_id);
        }
        self.strip_mut(front_id).edges.extend(moved);

        if remove_sides {
            let front = self.strip(front_id);
            let (head, tail) = (front.head_edge(), front.tail_edge());
            let junk: Vec<EdgeId> = front
                .edges
                .iter()
                .copied()
                .filter(|&e| {
                    let edge = self.edges.get(e);
                    !edge.matches_pair(head) && !edge.matches_pair(tail)
                })
                .collect();
            for edge in junk {
                self.sever(edge, front_id);
            }
        }
    }
}

/// First vertex of `strip` off the shared edge
fn uncommon_vertex(strip: &Strip, common: (usize, usize)) -> Option<usize> {
    strip
        .verts
        .iter()
        .copied()
        .find(|&vi| vi != common.0 && vi != common.1)
}

/// True if the polygon `verts` walks from `a` straight to `b`
fn has_directed_edge(verts: &[usize], (a, b): (usize, usize)) -> bool {
    let n = verts.len();
    (0..n).any(|i| verts[i] == a && verts[(i + 1) % n] == b)
}

/// True if two polygons cross their shared edge in opposite directions, as
/// consistently wound neighbors do
fn winds_against(front: &Strip, back: &Strip, (a, b): (usize, usize)) -> bool {
    (has_directed_edge(&front.verts, (a, b)) && has_directed_edge(&back.verts, (b, a)))
        || (has_directed_edge(&front.verts, (b, a)) && has_directed_edge(&back.verts, (a, b)))
}

/// Insert `vi` between the two endpoints of `common` in a triangle's vertex list
fn insert_on_edge(verts: &mut Vec<usize>, common: (usize, usize), vi: usize) {
    let on_edge = |v: usize| v == common.0 || v == common.1;
    if on_edge(verts[0]) {
        if on_edge(verts[1]) {
            verts.insert(1, vi);
        } else {
            verts.push(vi);
        }
    } else {
        verts.insert(2, vi);
    }
}

/// True if the back strip has to flip its facing before it can follow the
/// front strip.
fn must_invert(front: &Strip, back: &Strip, will_reverse_back: bool, target: Shape) -> bool {
    let mut invert = false;

    // Converting quads to triangles always leaves an even tail on the front.
    if !(front.shape.is_quad_family() && target == Shape::TriangleStrip) && front.is_odd() {
        invert = !invert;
    }

    // Reversing the back strip turns its head edge around only when it is odd.
    if will_reverse_back && back.is_odd() {
        invert = !invert;
    }

    invert
}

fn matches_pair(edge: (usize, usize), common: (usize, usize)) -> bool {
    edge == common || edge == (common.1, common.0)
}

/// Stitch `back` onto the tail of `front`, producing a strip of `target`
/// shape in `front` and emptying `back`.
///
/// Fails when no combination of reversals and inversions lines the two
/// strips up head to tail without flipping one of them, and when flat shading
/// would be left with an odd number of triangles. Both strips are restored on
/// failure, up to a rotation of a lone triangle or quad.
pub(crate) fn mate_strips(
    common: (usize, usize),
    front: &mut Strip,
    back: &mut Strip,
    target: Shape,
    flat_shaded: bool,
) -> bool {
    if flat_shaded && (front.triangle_count() + back.triangle_count()) % 2 == 1 {
        return false;
    }

    if front.shape.is_polygon() {
        front.rotate_to_back(common);
    }
    if back.shape.is_polygon() {
        back.rotate_to_front(common);
    }

    let reverse_front = matches_pair(front.head_edge(), common);
    let reverse_back = !matches_pair(back.head_edge(), common);

    // Reversing an odd front also turns its facing around.
    let invert_front = reverse_front && front.is_odd();
    if invert_front && !front.can_invert() {
        return false;
    }

    let invert_back = must_invert(front, back, reverse_back, target);
    if invert_back && !back.can_invert() {
        return false;
    }

    if invert_back {
        back.invert();
    }
    if invert_front {
        front.invert();
    }
    if reverse_front {
        front.reverse();
    }
    if reverse_back {
        back.reverse();
    }

    let will_reverse = front.would_reverse_tail(target);
    let head_to_tail = front.tail_edge() == back.head_edge();
    if will_reverse == head_to_tail {
        // The strips face away from each other.
        if reverse_back {
            back.reverse();
        }
        if reverse_front {
            front.reverse();
        }
        if invert_front {
            front.invert();
        }
        if invert_back {
            back.invert();
        }
        return false;
    }

    front.convert_to_type(target);
    back.convert_to_type(target);

    let keep = front.verts.len() - 2;
    front.verts.truncate(keep);
    front.verts.append(&mut back.verts);
    front.prims.append(&mut back.prims);
    true
}
