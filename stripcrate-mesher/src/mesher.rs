//! Orchestrator
//!
//! Runs the phases of one optimizer invocation over a single vertex pool:
//! fans, the quad-pairing prepass, loose triangles, sheets, leftover quads
//! and finally everything else. Each phase leaves no strip alive that it was
//! responsible for, so the next one starts from settled adjacency.

use crate::config::MesherConfig;
use crate::state::MeshState;
use crate::strip::{AttrId, Origin, Shape, Status, StripId};
use crate::triangulate::{is_convex_polygon, triangulate, zigzag};
use crate::MeshOptimizer;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use stripcrate_core::{
    newell_normal, Error, Polygon, PolygonMesh, PoolId, Primitive, PrimitiveKind, Result, Triangulated, VertexPool,
};
use tracing::{debug, info};

/// Counters describing one optimizer invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeshStats {
    /// Triangles implied by the input, after polygon triangulation
    pub input_triangles: usize,
    /// Triangles represented by the output primitives
    pub output_triangles: usize,
    pub polygons: usize,
    pub triangle_strips: usize,
    pub triangle_fans: usize,
    pub fans_built: usize,
    pub fans_unrolled: usize,
    /// Mutually ideal triangle pairs joined by the prepass
    pub quads_paired: usize,
    pub sheets_cut: usize,
}

impl MeshStats {
    /// Total number of emitted primitives
    pub fn primitive_count(&self) -> usize {
        self.polygons + self.triangle_strips + self.triangle_fans
    }

    /// True if no triangle was lost or invented
    pub fn is_conserved(&self) -> bool {
        self.input_triangles == self.output_triangles
    }

    fn record(&mut self, primitive: &Primitive) {
        self.output_triangles += primitive.triangle_count();
        match primitive.kind {
            PrimitiveKind::Polygon => self.polygons += 1,
            PrimitiveKind::TriangleStrip => self.triangle_strips += 1,
            PrimitiveKind::TriangleFan => self.triangle_fans += 1,
        }
    }
}

/// Greedy strip, fan and sheet builder
#[derive(Debug, Clone, Default)]
pub struct Mesher {
    config: MesherConfig,
}

impl Mesher {
    pub fn new(config: MesherConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MesherConfig {
        &self.config
    }

    /// Convert polygons over one vertex pool into strips, fans and polygons.
    ///
    /// # Panics
    ///
    /// Panics if a polygon names a pool other than `pool`; mixed batches have
    /// to be split first, see [`mesh_batch`].
    pub fn mesh(&self, pool: &VertexPool, polygons: &[Polygon]) -> Result<Vec<Primitive>> {
        self.mesh_with_stats(pool, polygons).map(|(primitives, _)| primitives)
    }

    /// Like [`Mesher::mesh`], also reporting what each phase did
    pub fn mesh_with_stats(&self, pool: &VertexPool, polygons: &[Polygon]) -> Result<(Vec<Primitive>, MeshStats)> {
        let polygons: Vec<&Polygon> = polygons.iter().collect();
        self.run(pool, &polygons)
    }

    fn run(&self, pool: &VertexPool, polygons: &[&Polygon]) -> Result<(Vec<Primitive>, MeshStats)> {
        self.config.validate()?;
        for polygon in polygons {
            assert_eq!(
                polygon.pool, pool.id,
                "polygon {:?} belongs to another vertex pool",
                polygon.vertices
            );
            polygon.validate(pool)?;
        }

        let mut stats = MeshStats::default();
        let mut state = MeshState::new(pool, &self.config);
        for polygon in polygons {
            let attr = state.intern(&polygon.attributes);
            stats.input_triangles += polygon.triangle_count();
            enter_polygon(&mut state, &polygon.vertices, attr);
        }
        debug!(pool = %pool.id, strips = state.strips.len(), edges = state.edges.len(), "input loaded");

        if self.config.fans_enabled() {
            let report = state.find_fans();
            stats.fans_built = report.built;
            stats.fans_unrolled = report.unrolled;
        }

        stats.quads_paired = pair_triangles(&mut state);

        let triangles = state.alive_where(|s| s.shape == Shape::Triangle);
        let mated = mating_pass(&mut state, triangles);
        debug!(mated, "triangle pass finished");

        if self.config.allow_sheet_building {
            stats.sheets_cut = state.build_sheets();
        }

        let quads = state.alive_where(|s| s.shape.is_quad_family());
        let mated = mating_pass(&mut state, quads);
        debug!(mated, "quad pass finished");

        let leftovers = state.alive_where(|_| true);
        let mated = mating_pass(&mut state, leftovers);
        debug!(mated, "strip pass finished");

        let primitives = emit(&mut state);
        for primitive in &primitives {
            stats.record(primitive);
        }

        info!(
            pool = %pool.id,
            input_triangles = stats.input_triangles,
            primitives = primitives.len(),
            strips = stats.triangle_strips,
            fans = stats.triangle_fans,
            conserved = stats.is_conserved(),
            "mesh optimized"
        );
        Ok((primitives, stats))
    }
}

impl MeshOptimizer for Mesher {
    fn optimize(&self, mesh: &PolygonMesh) -> Result<Vec<Primitive>> {
        mesh.validate()?;
        self.mesh(&mesh.pool, &mesh.polygons)
    }
}

/// Optimize polygons spread over several vertex pools.
///
/// Polygons are grouped by pool and every group is optimized independently,
/// in parallel. The result holds one entry per pool, in the order of `pools`.
pub fn mesh_batch(
    pools: &[VertexPool],
    polygons: &[Polygon],
    config: &MesherConfig,
) -> Result<Vec<(PoolId, Vec<Primitive>)>> {
    config.validate()?;

    let mut slots: HashMap<PoolId, usize> = HashMap::with_capacity(pools.len());
    for (slot, pool) in pools.iter().enumerate() {
        if slots.insert(pool.id, slot).is_some() {
            return Err(Error::InvalidData(format!("{} appears twice in the batch", pool.id)));
        }
    }

    let mut groups: Vec<Vec<&Polygon>> = vec![Vec::new(); pools.len()];
    for polygon in polygons {
        let slot = *slots.get(&polygon.pool).ok_or(Error::UnknownPool(polygon.pool))?;
        groups[slot].push(polygon);
    }

    let mesher = Mesher::new(config.clone());
    pools
        .par_iter()
        .zip(groups.par_iter())
        .map(|(pool, group)| -> Result<(PoolId, Vec<Primitive>)> {
            let (primitives, _) = mesher.run(pool, group)?;
            Ok((pool.id, primitives))
        })
        .collect()
}

/// Enter one input polygon as triangles and quads.
///
/// Convex quads stay whole, and so do quads with no area, which cannot be
/// cut meaningfully. Everything else is triangulated; loops that defeat the
/// triangulator are cut by a zig-zag sweep.
fn enter_polygon(state: &mut MeshState<'_>, vertices: &[usize], attr: AttrId) {
    let whole = match vertices.len() {
        3 => true,
        4 => is_convex_polygon(state.pool, vertices) || newell_normal(state.pool, vertices).is_none(),
        _ => false,
    };
    if whole {
        state.add_piece(vertices, attr, Origin::UserSupplied);
        return;
    }

    let triangles = triangulate(state.pool, vertices).unwrap_or_else(|| zigzag(vertices));
    for triangle in triangles {
        state.add_piece(&triangle, attr, Origin::UserSupplied);
    }
}

/// Join triangles that are each other's ideal mate.
///
/// Pairs are found before any is joined, so that one join cannot spoil the
/// choice of another. Returns the number of pairs joined.
fn pair_triangles(state: &mut MeshState<'_>) -> usize {
    let mut pairs = Vec::new();
    for id in state.alive_where(|s| s.shape == Shape::Triangle) {
        if state.strip(id).status != Status::Alive {
            continue;
        }
        let Some((mate, edge)) = state.find_ideal_mate(id) else {
            continue;
        };
        let candidate = state.strip(mate);
        if candidate.status != Status::Alive || candidate.shape != Shape::Triangle {
            continue;
        }
        if matches!(state.find_ideal_mate(mate), Some((back, _)) if back == id) {
            state.strip_mut(id).status = Status::Paired;
            state.strip_mut(mate).status = Status::Paired;
            pairs.push((id, mate, edge));
        }
    }

    let mut joined = 0;
    for (front, back, edge) in pairs {
        state.strip_mut(front).status = Status::Alive;
        state.strip_mut(back).status = Status::Alive;
        if state.mate_pieces(edge, front, back) {
            state.strip_mut(front).origin = Origin::FirstQuad;
            joined += 1;
        }
    }

    debug!(pairs = joined, "quad prepass finished");
    joined
}

/// Mate strips from the front of the queue until each is done or dead.
/// Returns the number of mating attempts.
fn mating_pass(state: &mut MeshState<'_>, ids: Vec<StripId>) -> usize {
    let mut queue: VecDeque<StripId> = ids.into();
    let mut attempts = 0;
    while let Some(&id) = queue.front() {
        if state.strip(id).status == Status::Alive && state.mate(id) {
            attempts += 1;
        }
        if state.strip(id).status != Status::Alive {
            queue.pop_front();
        }
    }
    attempts
}

/// Convert every finished strip into an output primitive, in arena order
fn emit(state: &mut MeshState<'_>) -> Vec<Primitive> {
    let pool = state.pool.id;
    let mut primitives = Vec::new();

    for index in 0..state.strips.len() {
        let id = StripId(index);
        let strip = state.strip_mut(id);
        if strip.verts.is_empty() {
            continue;
        }
        assert!(
            matches!(strip.status, Status::Done | Status::Alive),
            "strip {} has vertices but is not finished",
            strip
        );

        let kind = match strip.shape {
            Shape::Triangle | Shape::Quad => PrimitiveKind::Polygon,
            Shape::TriangleStrip => PrimitiveKind::TriangleStrip,
            Shape::QuadStrip => {
                strip.convert_to_type(Shape::TriangleStrip);
                PrimitiveKind::TriangleStrip
            }
            Shape::TriangleFan => PrimitiveKind::TriangleFan,
        };
        strip.status = Status::Done;

        let strip = state.strip(id);
        assert_eq!(
            strip.verts.len(),
            strip.prims.len() + 2,
            "strip {} does not carry one component per triangle",
            strip
        );
        let components = strip.prims.iter().map(|&attr| state.attribute(attr)).collect();
        primitives.push(Primitive::new(kind, pool, strip.verts.clone(), components));
    }

    primitives
}
