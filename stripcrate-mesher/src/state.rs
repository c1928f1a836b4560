//! Per-invocation arena of strips and edges
//!
//! Strips and edges are addressed by index handles and live exactly as long as
//! one optimizer call. Dead strips stay in the arena with empty lists.

use crate::config::MesherConfig;
use crate::edge::{EdgeId, EdgeIndex};
use crate::strip::{AttrId, Origin, Strip, StripId};
use std::collections::HashMap;
use stripcrate_core::{newell_normal, PolygonAttributes, VertexPool};

/// Bit-exact key of an attribute record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct AttributeKey {
    color: Option<[u32; 4]>,
    normal: Option<[u64; 3]>,
    material: Option<u32>,
}

impl From<&PolygonAttributes> for AttributeKey {
    fn from(attrs: &PolygonAttributes) -> Self {
        Self {
            color: attrs.color.map(|c| c.map(f32::to_bits)),
            normal: attrs.normal.map(|n| [n.x.to_bits(), n.y.to_bits(), n.z.to_bits()]),
            material: attrs.material.map(|m| m.0),
        }
    }
}

/// Everything one optimizer invocation owns
pub(crate) struct MeshState<'a> {
    pub pool: &'a VertexPool,
    pub config: &'a MesherConfig,
    pub strips: Vec<Strip>,
    pub edges: EdgeIndex,
    pub attributes: Vec<PolygonAttributes>,
    attribute_keys: HashMap<AttributeKey, AttrId>,
}

impl<'a> MeshState<'a> {
    pub fn new(pool: &'a VertexPool, config: &'a MesherConfig) -> Self {
        Self {
            pool,
            config,
            strips: Vec::new(),
            edges: EdgeIndex::new(),
            attributes: Vec::new(),
            attribute_keys: HashMap::new(),
        }
    }

    /// Handle for an attribute record, shared by every equal record
    pub fn intern(&mut self, attrs: &PolygonAttributes) -> AttrId {
        let key = AttributeKey::from(attrs);
        if let Some(&id) = self.attribute_keys.get(&key) {
            return id;
        }
        let id = AttrId(self.attributes.len());
        self.attributes.push(*attrs);
        self.attribute_keys.insert(key, id);
        id
    }

    pub fn attribute(&self, id: AttrId) -> PolygonAttributes {
        self.attributes[id.0]
    }

    pub fn strip(&self, id: StripId) -> &Strip {
        &self.strips[id.0]
    }

    pub fn strip_mut(&mut self, id: StripId) -> &mut Strip {
        &mut self.strips[id.0]
    }

    /// Mutable access to two distinct strips at once
    pub fn pair_mut(&mut self, a: StripId, b: StripId) -> (&mut Strip, &mut Strip) {
        assert_ne!(a, b, "a strip cannot mate with itself");
        if a.0 < b.0 {
            let (lo, hi) = self.strips.split_at_mut(b.0);
            (&mut lo[a.0], &mut hi[0])
        } else {
            let (lo, hi) = self.strips.split_at_mut(a.0);
            (&mut hi[0], &mut lo[b.0])
        }
    }

    /// Enter a triangle or quad as a new strip and register its edges
    pub fn add_piece(&mut self, verts: &[usize], attr: AttrId, origin: Origin) -> StripId {
        let id = StripId(self.strips.len());
        let normal = newell_normal(self.pool, verts);
        let mut strip = Strip::from_polygon(verts, attr, normal, self.pool.position(verts[0]), id.0);
        strip.origin = origin;

        for i in 0..verts.len() {
            let edge = self.edges.get_or_create(verts[i], verts[(i + 1) % verts.len()]);
            self.edges.attach(edge, id);
            strip.edges.push(edge);
        }

        self.strips.push(strip);
        id
    }

    /// Add a fully built strip that takes part in no adjacency
    pub fn add_strip(&mut self, mut strip: Strip) -> StripId {
        let id = StripId(self.strips.len());
        strip.index = id.0;
        self.strips.push(strip);
        id
    }

    /// Permanently cut `strip` off from the vertex pair of `edge`
    pub fn sever(&mut self, edge: EdgeId, strip: StripId) {
        self.edges.detach(edge, strip);
        let undirected = edge.undirected();
        self.strips[strip.0]
            .edges
            .retain(|e| e.undirected() != undirected);
    }

    /// Drop every edge of a strip, making it ineligible for further mating
    pub fn remove_all_edges(&mut self, strip: StripId) {
        let edges = std::mem::take(&mut self.strips[strip.0].edges);
        for edge in edges {
            self.edges.detach(edge, strip);
        }
    }

    /// Strips other than `id` reachable across its edges, one entry per shared edge
    pub fn neighbors(&self, id: StripId) -> Vec<(StripId, EdgeId)> {
        self.strips[id.0]
            .edges
            .iter()
            .flat_map(|&e| self.edges.strips_across(e).map(move |s| (s, e)))
            .filter(|&(s, _)| s != id)
            .collect()
    }

    pub fn count_neighbors(&self, id: StripId) -> usize {
        self.neighbors(id).len()
    }

    /// Distance between the endpoints of an edge
    pub fn edge_length(&self, edge: EdgeId) -> f64 {
        let (a, b) = self.edges.pair(edge);
        (self.pool.position(b) - self.pool.position(a)).norm()
    }

    /// Strips that are alive and pass `filter`, in arena order
    pub fn alive_where(&self, filter: impl Fn(&Strip) -> bool) -> Vec<StripId> {
        self.strips
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_alive() && filter(s))
            .map(|(i, _)| StripId(i))
            .collect()
    }

    /// Check that every edge a strip lists names the strip back
    pub fn check_edges(&self, id: StripId) {
        for &edge in &self.strips[id.0].edges {
            assert!(
                self.edges.strips_across(edge).any(|s| s == id),
                "edge {:?} does not reference strip {}",
                self.edges.pair(edge),
                self.strips[id.0]
            );
        }
    }
}
