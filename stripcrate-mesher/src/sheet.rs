//! Sheet builder
//!
//! Finds rectangular patches of quads joined edge to edge and cuts them into
//! parallel rows of quad strips. A sheet is first measured from a seed quad
//! in two perpendicular directions; the direction with the longer average
//! row is then cut.
//!
//! Row ids are handed out from a counter that only grows. A strip whose
//! `row_id` is below the current sheet's first row id is unclaimed by that
//! sheet; a negative id marks a strip already cut.

use crate::edge::EdgeId;
use crate::state::MeshState;
use crate::strip::{Shape, Status, StripId};
use tracing::{debug, trace};

/// Normal dot products closer than this are treated as equal
const SHEET_NORMAL_TOLERANCE: f64 = 1e-4;

/// Totals gathered while measuring one sheet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SheetTally {
    pub prims: usize,
    pub rows: usize,
}

impl SheetTally {
    /// Triangles per row
    pub fn average_row(&self) -> f64 {
        if self.rows == 0 {
            0.0
        } else {
            self.prims as f64 / self.rows as f64
        }
    }
}

/// A strip on the measuring walk, with the neighbors still to try
#[derive(Debug, Clone, Copy)]
struct SheetVisit {
    strip: StripId,
    entry: (usize, usize),
    new_row: bool,
    row_id: i64,
    distance: i64,
    pass: u8,
    cursor: usize,
}

impl SheetVisit {
    fn new(strip: StripId, entry: (usize, usize), new_row: bool, row_id: i64, distance: i64) -> Self {
        Self {
            strip,
            entry,
            new_row,
            row_id,
            distance,
            pass: 0,
            cursor: 0,
        }
    }
}

impl MeshState<'_> {
    /// True if `a` is a better strip than `b` to follow from `me` while
    /// measuring a sheet. Only matters when more than two strips share an edge.
    pub fn pick_sheet_mate(&self, me: StripId, a: StripId, b: StripId) -> bool {
        let (me_strip, a_strip, b_strip) = (self.strip(me), self.strip(a), self.strip(b));

        if me_strip.planar && a_strip.planar && b_strip.planar {
            let a_diff = me_strip.plane_normal.dot(&a_strip.plane_normal);
            let b_diff = me_strip.plane_normal.dot(&b_strip.plane_normal);
            if (a_diff - b_diff).abs() > SHEET_NORMAL_TOLERANCE {
                return a_diff > b_diff;
            }
        }

        let (a_cat, b_cat) = (a_strip.type_category(), b_strip.type_category());
        if a_cat != b_cat {
            let me_cat = me_strip.type_category();
            return (a_cat - me_cat).abs() < (b_cat - me_cat).abs();
        }

        false
    }

    /// Best unclaimed strip across `edge`, seen from `me`
    fn sheet_mate_across(&self, me: StripId, edge: EdgeId, first_row_id: i64) -> Option<StripId> {
        let mut best: Option<StripId> = None;
        for other in self.edges.strips_across(edge) {
            let strip = self.strip(other);
            if other == me || !strip.is_alive() || strip.row_id >= first_row_id {
                continue;
            }
            best = match best {
                Some(current) if !self.pick_sheet_mate(me, other, current) => Some(current),
                _ => Some(other),
            };
        }
        best
    }

    /// Claim a strip for the sheet being measured. Returns the walk state for
    /// its neighbors, or `None` if a closer row already owns it.
    fn enter_sheet(&mut self, mut visit: SheetVisit, first_row_id: i64, tally: &mut SheetTally) -> Option<SheetVisit> {
        let strip = self.strip_mut(visit.strip);
        if strip.row_id >= first_row_id && (visit.new_row || strip.row_distance <= visit.distance) {
            return None;
        }

        tally.prims += strip.prims.len();
        if visit.new_row {
            tally.rows += 1;
            visit.row_id = first_row_id + tally.rows as i64 - 1;
        }
        strip.row_id = visit.row_id;
        strip.row_distance = visit.distance;
        Some(visit)
    }

    /// Next neighbor to walk into from `visit`, with the edge crossed and
    /// whether it starts a new row.
    ///
    /// A quad is left twice over: first through the edges that continue the
    /// current direction, then through the edges that turn. Edges sharing one
    /// vertex with the entry edge run perpendicular to it; edges sharing none
    /// lie across from it. Any other strip is simply walked through.
    fn next_sheet_step(&self, visit: &mut SheetVisit, first_row_id: i64) -> Option<(StripId, EdgeId, bool)> {
        let strip = self.strip(visit.strip);
        let is_quad = strip.shape == Shape::Quad;
        let passes = if is_quad { 2 } else { 1 };

        while visit.pass < passes {
            let secondary = visit.pass == 1;
            while visit.cursor < strip.edges.len() {
                let edge = strip.edges[visit.cursor];
                visit.cursor += 1;

                let record = self.edges.get(edge);
                let follow = if is_quad {
                    let want = if secondary == visit.new_row { 0 } else { 1 };
                    record.common_vertices(visit.entry) == want
                } else {
                    !record.matches_pair(visit.entry)
                };
                if !follow {
                    continue;
                }
                if let Some(mate) = self.sheet_mate_across(visit.strip, edge, first_row_id) {
                    return Some((mate, edge, secondary));
                }
            }
            visit.pass += 1;
            visit.cursor = 0;
        }
        None
    }

    /// Measure the sheet reachable from `seed`, entering it across `entry`.
    ///
    /// Only `row_id` and `row_distance` are written. Every claimed strip gets a
    /// row id at or above `first_row_id`. The walk uses an explicit stack,
    /// since a sheet can be arbitrarily large.
    pub fn measure_sheet(&mut self, seed: StripId, entry: EdgeId, first_row_id: i64) -> SheetTally {
        let mut tally = SheetTally::default();
        let entry = self.edges.pair(entry);
        let mut stack: Vec<SheetVisit> = Vec::new();
        stack.extend(self.enter_sheet(SheetVisit::new(seed, entry, true, 0, 0), first_row_id, &mut tally));

        while let Some(top) = stack.last_mut() {
            let (row_id, distance) = (top.row_id, top.distance);
            match self.next_sheet_step(top, first_row_id) {
                Some((mate, edge, secondary)) => {
                    let entry = self.edges.pair(edge);
                    let distance = distance + i64::from(secondary);
                    let visit = SheetVisit::new(mate, entry, secondary, row_id, distance);
                    stack.extend(self.enter_sheet(visit, first_row_id, &mut tally));
                }
                None => {
                    stack.pop();
                }
            }
        }

        tally
    }

    /// Mate every strip of a measured sheet with the rest of its row.
    ///
    /// Later rows are cut first, since mating rewrites this strip's edges.
    /// Strips already cut are skipped.
    pub fn cut_sheet(&mut self, id: StripId, first_row_id: i64, do_mate: bool) {
        let row_id = self.strip(id).row_id;
        if row_id < 0 {
            return;
        }

        let later: Vec<StripId> = self
            .neighbors(id)
            .into_iter()
            .map(|(other, _)| other)
            .filter(|&other| self.strip(other).row_id > row_id)
            .collect();
        for other in later {
            if self.strip(other).status == Status::Alive {
                self.cut_sheet(other, first_row_id, true);
            }
        }

        if !do_mate || self.strip(id).status != Status::Alive {
            return;
        }

        while self.strip(id).status == Status::Alive {
            let row_id = self.strip(id).row_id;
            let next = self
                .neighbors(id)
                .into_iter()
                .find(|&(other, _)| {
                    let strip = self.strip(other);
                    strip.status == Status::Alive && strip.row_id == row_id
                });
            let Some((mate, edge)) = next else {
                break;
            };

            // The mate spreads the cut to its own later rows first.
            self.cut_sheet(mate, first_row_id, false);
            if self.strip(id).status == Status::Alive && self.strip(mate).status == Status::Alive {
                self.mate_pieces(edge, id, mate);
            }
        }

        self.strip_mut(id).row_id = -first_row_id;
    }

    /// Cut every quad sheet into rows. Returns the number of sheets cut.
    pub fn build_sheets(&mut self) -> usize {
        let mut next_row_id: i64 = 1;
        let mut sheets = 0;

        for seed in self.alive_where(|s| s.shape == Shape::Quad) {
            let strip = self.strip(seed);
            if strip.status != Status::Alive || strip.shape != Shape::Quad || strip.row_id < 0 {
                continue;
            }
            let Some(&edge_a) = strip.edges.first() else {
                continue;
            };
            let Some(edge_b) = strip.find_adjacent_edge(&self.edges, self.edges.pair(edge_a)) else {
                continue;
            };

            let first_a = next_row_id;
            let tally_a = self.measure_sheet(seed, edge_a, first_a);
            next_row_id += tally_a.rows as i64;

            let first_b = next_row_id;
            let tally_b = self.measure_sheet(seed, edge_b, first_b);
            next_row_id += tally_b.rows as i64;

            let first = if tally_a.average_row() > tally_b.average_row() {
                // Measuring b overwrote the row ids; lay out a again.
                let first = next_row_id;
                let tally = self.measure_sheet(seed, edge_a, first);
                next_row_id += tally.rows as i64;
                first
            } else {
                first_b
            };

            trace!(
                seed = %self.strip(seed),
                rows_a = tally_a.rows,
                average_a = tally_a.average_row(),
                rows_b = tally_b.rows,
                average_b = tally_b.average_row(),
                "sheet measured"
            );
            self.cut_sheet(seed, first, true);
            sheets += 1;
        }

        debug!(sheets, "sheet phase finished");
        sheets
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MesherConfig;
    use crate::strip::Origin;
    use stripcrate_core::{Point3d, PolygonAttributes, PoolId, VertexPool};

    /// `cols` x `rows` grid of unit quads in the XY plane, wound counter-clockwise
    fn make_grid(cols: usize, rows: usize) -> (VertexPool, Vec<[usize; 4]>) {
        let width = cols + 1;
        let positions = (0..=rows)
            .flat_map(|j| (0..=cols).map(move |i| Point3d::new(i as f64, j as f64, 0.0)))
            .collect();
        let cells = (0..rows)
            .flat_map(|j| {
                (0..cols).map(move |i| {
                    let bl = j * width + i;
                    [bl, bl + 1, bl + 1 + width, bl + width]
                })
            })
            .collect();
        (VertexPool::from_positions(PoolId(0), positions), cells)
    }

    fn load<'a>(state: &mut MeshState<'a>, cells: &[[usize; 4]]) -> Vec<StripId> {
        let attr = state.intern(&PolygonAttributes::default());
        cells
            .iter()
            .map(|cell| state.add_piece(cell, attr, Origin::UserSupplied))
            .collect()
    }

    #[test]
    fn test_measure_square_sheet() {
        let (pool, cells) = make_grid(3, 3);
        let config = MesherConfig::default();
        let mut state = MeshState::new(&pool, &config);
        let ids = load(&mut state, &cells);

        let seed = ids[0];
        let entry = state.strip(seed).edges[0];
        let tally = state.measure_sheet(seed, entry, 1);

        assert_eq!(tally.rows, 3);
        assert_eq!(tally.prims, 18);
        assert_eq!(tally.average_row(), 6.0);
        for &id in &ids {
            let row_id = state.strip(id).row_id;
            assert!((1..=3).contains(&row_id), "strip {} not claimed", state.strip(id));
        }
        // Measuring never joins anything.
        assert!(ids.iter().all(|&id| state.strip(id).shape == Shape::Quad));
    }

    #[test]
    fn test_measure_prefers_long_rows() {
        // A 4 x 1 bar: a row along it holds 4 quads, a row across holds one.
        let (pool, cells) = make_grid(4, 1);
        let config = MesherConfig::default();
        let mut state = MeshState::new(&pool, &config);
        let ids = load(&mut state, &cells);

        let seed = ids[0];
        let bottom = state.strip(seed).edges[0];
        let side = state
            .strip(seed)
            .find_adjacent_edge(&state.edges, state.edges.pair(bottom))
            .unwrap();

        let along = state.measure_sheet(seed, bottom, 1);
        let across = state.measure_sheet(seed, side, 1 + along.rows as i64);
        assert_eq!(along.rows, 1);
        assert_eq!(along.average_row(), 8.0);
        // Across the bar the walk never leaves the seed.
        assert_eq!(across.rows, 1);
        assert_eq!(across.average_row(), 2.0);
    }

    #[test]
    fn test_build_sheets_cuts_grid_into_rows() {
        let (pool, cells) = make_grid(4, 4);
        let config = MesherConfig::default();
        let mut state = MeshState::new(&pool, &config);
        let ids = load(&mut state, &cells);

        assert_eq!(state.build_sheets(), 1);

        let rows: Vec<_> = ids
            .iter()
            .map(|&id| state.strip(id))
            .filter(|s| s.is_alive())
            .collect();
        assert_eq!(rows.len(), 4);
        for row in &rows {
            assert_eq!(row.shape, Shape::QuadStrip);
            assert_eq!(row.verts.len(), 10);
            assert_eq!(row.prims.len(), 8);
            assert!(row.row_id < 0);
        }
        let dead = ids.iter().filter(|&&id| state.strip(id).status == Status::Dead).count();
        assert_eq!(dead, 12);
    }

    #[test]
    fn test_cut_rows_keep_winding() {
        let (pool, cells) = make_grid(3, 2);
        let config = MesherConfig::default();
        let mut state = MeshState::new(&pool, &config);
        let ids = load(&mut state, &cells);
        state.build_sheets();

        let mut triangles = 0;
        for &id in &ids {
            let mut strip = state.strip(id).clone();
            if strip.verts.is_empty() {
                continue;
            }
            if strip.shape.is_quad_family() {
                strip.convert_to_type(Shape::TriangleStrip);
            }
            for (i, w) in strip.verts.windows(3).enumerate() {
                let tri = if i % 2 == 0 { [w[0], w[1], w[2]] } else { [w[1], w[0], w[2]] };
                let (a, b, c) = (pool.position(tri[0]), pool.position(tri[1]), pool.position(tri[2]));
                assert!((b - a).cross(&(c - a)).z > 0.0, "triangle {:?} flipped", tri);
                triangles += 1;
            }
        }
        assert_eq!(triangles, 12);
    }

    #[test]
    fn test_pick_sheet_mate_prefers_aligned_normal() {
        let pool = VertexPool::from_positions(
            PoolId(0),
            vec![
                Point3d::new(0.0, 0.0, 0.0),
                Point3d::new(1.0, 0.0, 0.0),
                Point3d::new(1.0, 1.0, 0.0),
                Point3d::new(0.0, 1.0, 0.0),
                Point3d::new(1.0, -1.0, 0.0),
                Point3d::new(0.0, -1.0, 0.0),
                Point3d::new(1.0, 0.0, -1.0),
                Point3d::new(0.0, 0.0, -1.0),
            ],
        );
        let config = MesherConfig::default();
        let mut state = MeshState::new(&pool, &config);
        let attr = state.intern(&PolygonAttributes::default());

        let me = state.add_piece(&[0, 1, 2, 3], attr, Origin::UserSupplied);
        let flat = state.add_piece(&[5, 4, 1, 0], attr, Origin::UserSupplied);
        let folded = state.add_piece(&[7, 6, 1, 0], attr, Origin::UserSupplied);

        assert!(state.pick_sheet_mate(me, flat, folded));
        assert!(!state.pick_sheet_mate(me, folded, flat));
        assert!(!state.pick_sheet_mate(me, flat, flat));

        let shared = state.edges.find(0, 1).unwrap();
        assert_eq!(state.sheet_mate_across(me, shared, 1), Some(flat));
    }
}
