//! Fan builder
//!
//! Vertices touched by more than six distinct edges are fan centers. The
//! loose triangles around such a vertex are chained into runs; a long,
//! narrow run becomes one triangle fan, anything else can be re-tesselated
//! into triangles that strip better.

use crate::state::MeshState;
use crate::strip::{AttrId, Origin, Shape, Status, Strip, StripId};
use crate::triangulate::triangulate;
use itertools::Itertools;
use std::collections::{HashSet, VecDeque};
use stripcrate_core::newell_normal;
use tracing::{debug, trace};

/// Vertices of higher edge degree than this are fan candidates
pub const FAN_CENTER_MIN_DEGREE: usize = 6;

/// A rim sweeping this far around its center overlaps itself
const FULL_TURN_DEGREES: f64 = 360.0;

/// Slack allowed when comparing a fan's summed angle against the limit
const ANGLE_TOLERANCE_DEGREES: f64 = 1e-6;

/// What the fan phase did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanReport {
    /// Triangle fans emitted
    pub built: usize,
    /// Fan segments re-tesselated into fresh triangles
    pub unrolled: usize,
}

/// A chain of triangles around one center vertex.
///
/// Each triangle is stored as the directed rim edge `(a, b)` it contributes
/// once rotated so the center comes first, i.e. triangle `(center, a, b)`.
#[derive(Debug, Clone)]
struct FanMaker {
    center: usize,
    rim: VecDeque<(usize, usize)>,
    strips: VecDeque<StripId>,
}

impl FanMaker {
    fn new(center: usize, id: StripId, strip: &Strip) -> Option<Self> {
        let pos = strip.verts.iter().position(|&vi| vi == center)?;
        let a = strip.verts[(pos + 1) % 3];
        let b = strip.verts[(pos + 2) % 3];
        Some(Self {
            center,
            rim: VecDeque::from([(a, b)]),
            strips: VecDeque::from([id]),
        })
    }

    fn is_empty(&self) -> bool {
        self.strips.is_empty()
    }

    fn len(&self) -> usize {
        self.strips.len()
    }

    /// Absorb `other` if it continues this run at either end
    fn join(&mut self, other: &mut FanMaker) -> bool {
        debug_assert_eq!(self.center, other.center);
        let (Some(&(my_front, _)), Some(&(_, my_back))) = (self.rim.front(), self.rim.back()) else {
            return false;
        };
        let (Some(&(other_front, _)), Some(&(_, other_back))) = (other.rim.front(), other.rim.back()) else {
            return false;
        };

        if my_back == other_front {
            self.rim.append(&mut other.rim);
            self.strips.append(&mut other.strips);
            true
        } else if my_front == other_back {
            other.rim.append(&mut self.rim);
            other.strips.append(&mut self.strips);
            std::mem::swap(&mut self.rim, &mut other.rim);
            std::mem::swap(&mut self.strips, &mut other.strips);
            true
        } else {
            false
        }
    }

    /// Center followed by the rim, `[center, a0, b0, b1, ...]`
    fn fan_vertices(&self) -> Vec<usize> {
        let mut verts = Vec::with_capacity(self.rim.len() + 2);
        verts.push(self.center);
        if let Some(&(a, _)) = self.rim.front() {
            verts.push(a);
        }
        verts.extend(self.rim.iter().map(|&(_, b)| b));
        verts
    }
}

impl MeshState<'_> {
    /// Sum of the angles the rim edges subtend at `center`, in degrees
    fn rim_angle(&self, center: usize, rim: &[(usize, usize)]) -> f64 {
        let center = self.pool.position(center);
        rim.iter()
            .map(|&(a, b)| {
                let u = self.pool.position(a) - center;
                let v = self.pool.position(b) - center;
                u.angle(&v).to_degrees()
            })
            .sum()
    }

    /// Find fans around every high-degree vertex, building or unrolling each
    /// completed run.
    pub fn find_fans(&mut self) -> FanReport {
        let mut report = FanReport::default();
        let mut unrolled: Vec<([usize; 3], AttrId)> = Vec::new();

        let centers: Vec<usize> = self
            .edges
            .vertices()
            .into_iter()
            .filter(|&vi| self.edges.degree(vi) > FAN_CENTER_MIN_DEGREE)
            .collect();

        for center in centers {
            let mut seen = HashSet::new();
            let mut fans: Vec<FanMaker> = Vec::new();
            for &edge in self.edges.vertex_edges(center) {
                for id in self.edges.strips_across(edge) {
                    let strip = self.strip(id);
                    if strip.shape == Shape::Triangle && strip.status == Status::Alive && seen.insert(id) {
                        fans.extend(FanMaker::new(center, id, strip));
                    }
                }
            }

            // Keep chaining until no run can absorb another.
            loop {
                let mut joined_any = false;
                for i in 0..fans.len() {
                    for j in (i + 1)..fans.len() {
                        if fans[i].is_empty() || fans[j].is_empty() {
                            continue;
                        }
                        let (head, tail) = fans.split_at_mut(j);
                        joined_any |= head[i].join(&mut tail[0]);
                    }
                }
                if !joined_any {
                    break;
                }
            }

            for fan in fans.iter().filter(|f| !f.is_empty()) {
                self.build_fan(fan, &mut report, &mut unrolled);
            }
        }

        for (tri, attr) in unrolled {
            self.add_piece(&tri, attr, Origin::FanPoly);
        }

        debug!(built = report.built, unrolled = report.unrolled, "fan phase finished");
        report
    }

    /// Emit a run as a triangle fan, or unroll it if it does not qualify
    fn build_fan(&mut self, fan: &FanMaker, report: &mut FanReport, unrolled: &mut Vec<([usize; 3], AttrId)>) {
        let min_count = self.config.min_fan_triangle_count;
        let rim: Vec<(usize, usize)> = fan.rim.iter().copied().collect();
        let angle = self.rim_angle(fan.center, &rim);
        trace!(center = fan.center, triangles = fan.len(), angle, "fan candidate");

        if min_count > 0
            && fan.len() >= min_count
            && angle < self.config.max_fan_angle_degrees + ANGLE_TOLERANCE_DEGREES
        {
            let mut strip = Strip::new(Shape::TriangleFan, Origin::FanPoly, 0);
            strip.verts = fan.fan_vertices();
            for &id in &fan.strips {
                let member = self.strip_mut(id);
                strip.prims.append(&mut member.prims);
                member.verts.clear();
                member.status = Status::Dead;
                self.remove_all_edges(id);
            }
            strip.status = Status::Done;
            self.add_strip(strip);
            report.built += 1;
            return;
        }

        if self.config.unroll_fans {
            let strips: Vec<StripId> = fan.strips.iter().copied().collect();
            let threshold = self.config.coplanarity_threshold;

            // Split where neighboring triangles change material or facing.
            let mut start = 0;
            for i in 1..=strips.len() {
                let seam = i == strips.len() || {
                    let (prev, this) = (self.strip(strips[i - 1]), self.strip(strips[i]));
                    prev.prims[0] != this.prims[0] || !prev.is_coplanar_with(this, threshold)
                };
                if seam {
                    if self.unroll(fan.center, &strips[start..i], &rim[start..i], unrolled) {
                        report.unrolled += 1;
                    }
                    start = i;
                }
            }
        }
    }

    /// Rebuild a seam-free segment of a run as one polygon and re-tesselate it.
    ///
    /// Segments that wind a full turn or more overlap themselves, and any
    /// re-tesselation that turns a triangle away from the segment's facing is
    /// refused; the original triangles are then left alone.
    fn unroll(
        &mut self,
        center: usize,
        strips: &[StripId],
        rim: &[(usize, usize)],
        unrolled: &mut Vec<([usize; 3], AttrId)>,
    ) -> bool {
        if strips.len() < 3 {
            return false;
        }

        let mut poly = vec![center, rim[0].0];
        poly.extend(rim.iter().map(|&(_, b)| b));
        if !poly.iter().all_unique() || self.rim_angle(center, rim) >= FULL_TURN_DEGREES {
            return false;
        }

        let Some(triangles) = triangulate(self.pool, &poly) else {
            return false;
        };
        debug_assert_eq!(triangles.len(), strips.len());

        let facing = self.strip(strips[0]);
        if !facing.planar {
            return false;
        }
        let keeps_facing = triangles.iter().all(|tri| {
            newell_normal(self.pool, tri).is_some_and(|normal| normal.dot(&facing.plane_normal) > 0.0)
        });
        if !keeps_facing {
            trace!(center, rim = ?poly, "unroll would flip triangles, keeping the run");
            return false;
        }

        let attr = self.strip(strips[0]).prims[0];
        for &id in strips {
            let member = self.strip_mut(id);
            member.verts.clear();
            member.prims.clear();
            member.status = Status::Dead;
            self.remove_all_edges(id);
        }
        unrolled.extend(triangles.into_iter().map(|tri| (tri, attr)));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MesherConfig;
    use stripcrate_core::{Point3d, PolygonAttributes, PoolId, VertexPool};

    /// A center vertex 0 ringed by `n` rim vertices on the unit circle
    fn make_disc(n: usize, closed: bool) -> (VertexPool, Vec<[usize; 3]>) {
        let mut positions = vec![Point3d::origin()];
        for i in 0..n {
            let theta = std::f64::consts::TAU * i as f64 / n as f64;
            positions.push(Point3d::new(theta.cos(), theta.sin(), 0.0));
        }
        let count = if closed { n } else { n - 1 };
        let triangles = (0..count).map(|i| [0, 1 + i, 1 + (i + 1) % n]).collect();
        (VertexPool::from_positions(PoolId(0), positions), triangles)
    }

    fn load(state: &mut MeshState<'_>, triangles: &[[usize; 3]]) -> Vec<StripId> {
        let attr = state.intern(&PolygonAttributes::default());
        triangles
            .iter()
            .map(|tri| state.add_piece(tri, attr, Origin::UserSupplied))
            .collect()
    }

    #[test]
    fn test_closed_disc_becomes_one_fan() {
        let (pool, triangles) = make_disc(8, true);
        let config = MesherConfig::default();
        let mut state = MeshState::new(&pool, &config);
        let ids = load(&mut state, &triangles);

        let report = state.find_fans();
        assert_eq!(report, FanReport { built: 1, unrolled: 0 });

        let fan = state.strips.last().unwrap();
        assert_eq!(fan.shape, Shape::TriangleFan);
        assert_eq!(fan.status, Status::Done);
        assert_eq!(fan.verts.len(), 10);
        assert_eq!(fan.prims.len(), 8);
        assert_eq!(fan.verts[0], 0);
        assert_eq!(fan.verts[1], fan.verts[9]);
        for id in ids {
            assert_eq!(state.strip(id).status, Status::Dead);
            assert!(state.strip(id).edges.is_empty());
        }
    }

    #[test]
    fn test_joined_rim_is_contiguous() {
        let (pool, triangles) = make_disc(8, true);
        let config = MesherConfig::default();
        let mut state = MeshState::new(&pool, &config);
        load(&mut state, &triangles);
        state.find_fans();

        let fan = state.strips.last().unwrap();
        for w in fan.verts[1..].windows(2) {
            let step = (w[1] + 8 - w[0]) % 8;
            assert_eq!(step, 1, "rim {:?} is not walked in order", fan.verts);
        }
    }

    #[test]
    fn test_wide_fan_is_unrolled() {
        let (pool, triangles) = make_disc(8, false);
        let config = MesherConfig::default().with_fan_limits(4, 180.0);
        let mut state = MeshState::new(&pool, &config);
        let before = state.strips.len();
        let ids = load(&mut state, &triangles);
        assert_eq!(state.strips.len() - before, 7);

        // Seven open triangles give the center degree 8 but span 315 degrees.
        let report = state.find_fans();
        assert_eq!(report, FanReport { built: 0, unrolled: 1 });

        for id in ids {
            assert_eq!(state.strip(id).status, Status::Dead);
        }
        let fresh: Vec<&Strip> = state.strips.iter().filter(|s| s.status == Status::Alive).collect();
        assert_eq!(fresh.len(), 7);
        assert!(fresh.iter().all(|s| s.origin == Origin::FanPoly && s.shape == Shape::Triangle));
    }

    #[test]
    fn test_low_degree_vertex_ignored() {
        let (pool, triangles) = make_disc(5, true);
        let config = MesherConfig::default();
        let mut state = MeshState::new(&pool, &config);
        load(&mut state, &triangles);

        assert_eq!(state.find_fans(), FanReport::default());
        assert!(state.strips.iter().all(|s| s.status == Status::Alive));
    }

    #[test]
    fn test_material_seam_splits_unrolled_segments() {
        let (pool, triangles) = make_disc(8, false);
        let config = MesherConfig::default().with_fan_limits(0, 360.0);
        let mut state = MeshState::new(&pool, &config);
        let red = state.intern(&PolygonAttributes::default().with_color([1.0, 0.0, 0.0, 1.0]));
        let blue = state.intern(&PolygonAttributes::default().with_color([0.0, 0.0, 1.0, 1.0]));
        for (i, tri) in triangles.iter().enumerate() {
            let attr = if i < 4 { red } else { blue };
            state.add_piece(tri, attr, Origin::UserSupplied);
        }

        let report = state.find_fans();
        assert_eq!(report, FanReport { built: 0, unrolled: 2 });

        let fresh: Vec<&Strip> = state.strips.iter().filter(|s| s.status == Status::Alive).collect();
        assert_eq!(fresh.len(), 7);
        assert_eq!(fresh.iter().filter(|s| s.prims[0] == red).count(), 4);
        assert_eq!(fresh.iter().filter(|s| s.prims[0] == blue).count(), 3);
    }

    #[test]
    fn test_overwound_fan_is_kept() {
        // Rim steps 80 degrees at a time while drifting outwards, so the six
        // triangles sweep 480 degrees and the last ones lap the first.
        let mut positions = vec![Point3d::origin()];
        for k in 0..7 {
            let theta = (80.0 * k as f64).to_radians();
            let radius = 1.0 + 0.15 * k as f64;
            positions.push(Point3d::new(radius * theta.cos(), radius * theta.sin(), 0.0));
        }
        let pool = VertexPool::from_positions(PoolId(0), positions);
        let triangles: Vec<[usize; 3]> = (0..6).map(|k| [0, 1 + k, 2 + k]).collect();

        let config = MesherConfig::default();
        let mut state = MeshState::new(&pool, &config);
        let ids = load(&mut state, &triangles);

        assert_eq!(state.find_fans(), FanReport::default());
        for id in ids {
            assert_eq!(state.strip(id).status, Status::Alive);
        }
        assert_eq!(state.strips.iter().filter(|s| s.origin == Origin::FanPoly).count(), 0);
    }

    #[test]
    fn test_gradual_bend_splits_at_the_fold() {
        // Rim rises slowly, then one triangle folds up steeply. Each step is
        // compared with its neighbor, so only the fold opens a seam.
        let mut positions = vec![Point3d::origin()];
        for i in 0..8 {
            let theta = std::f64::consts::TAU * i as f64 / 8.0;
            let z = if i < 7 { 0.02 * i as f64 } else { 2.0 };
            positions.push(Point3d::new(theta.cos(), theta.sin(), z));
        }
        let pool = VertexPool::from_positions(PoolId(0), positions);
        let triangles: Vec<[usize; 3]> = (0..7).map(|i| [0, 1 + i, 2 + i]).collect();

        let config = MesherConfig::default().with_fan_limits(0, 360.0);
        let mut state = MeshState::new(&pool, &config);
        let ids = load(&mut state, &triangles);

        let report = state.find_fans();
        assert_eq!(report.built, 0);
        assert_eq!(report.unrolled, 1);
        // The folded triangle is alone in its segment and stays as it was.
        assert_eq!(state.strip(ids[6]).status, Status::Alive);
        assert!(ids[..6].iter().all(|&id| state.strip(id).status == Status::Dead));
    }
}
