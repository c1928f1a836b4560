//! Edge index
//!
//! Directed edges are allocated in twin pairs: `edges[2k]` runs from the lower
//! vertex index to the higher one and `edges[2k + 1]` is its opposite, so the
//! twin of any edge is found by flipping the lowest bit of its handle. Each
//! record lists the strips that currently use it as an outer boundary in its
//! direction; strips on the far side of the same vertex pair sit on the twin.

use crate::strip::StripId;
use std::collections::HashMap;

/// Stable handle to a directed edge record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub usize);

impl EdgeId {
    /// Handle of the opposite-direction twin
    #[inline]
    pub fn opposite(self) -> EdgeId {
        EdgeId(self.0 ^ 1)
    }

    /// Handle shared by both directions of the same vertex pair
    #[inline]
    pub fn undirected(self) -> EdgeId {
        EdgeId(self.0 & !1)
    }
}

/// One side of a polygon, traversed from `vi_a` to `vi_b`
#[derive(Debug, Clone)]
pub struct Edge {
    pub vi_a: usize,
    pub vi_b: usize,
    pub opposite: EdgeId,
    pub strips: Vec<StripId>,
}

impl Edge {
    /// True if either endpoint is `vi`
    pub fn contains_vertex(&self, vi: usize) -> bool {
        self.vi_a == vi || self.vi_b == vi
    }

    /// True if `other` joins the same two vertices, in either orientation
    pub fn matches(&self, other: &Edge) -> bool {
        self.matches_pair((other.vi_a, other.vi_b))
    }

    /// True if the edge joins the vertices of `pair`, in either orientation
    pub fn matches_pair(&self, pair: (usize, usize)) -> bool {
        (self.vi_a == pair.0 && self.vi_b == pair.1) || (self.vi_a == pair.1 && self.vi_b == pair.0)
    }

    /// Number of endpoints shared with `pair`
    pub fn common_vertices(&self, pair: (usize, usize)) -> usize {
        let shared = |vi: usize| vi == pair.0 || vi == pair.1;
        shared(self.vi_a) as usize + shared(self.vi_b) as usize
    }

    /// The endpoints as an ordered pair
    pub fn pair(&self) -> (usize, usize) {
        (self.vi_a, self.vi_b)
    }

    /// Remove one strip from this record only, leaving the twin untouched
    pub fn remove_strip(&mut self, strip: StripId) {
        self.strips.retain(|&s| s != strip);
    }
}

/// Lookup of directed edges keyed by their unordered vertex pair
#[derive(Debug, Clone, Default)]
pub struct EdgeIndex {
    edges: Vec<Edge>,
    lookup: HashMap<(usize, usize), EdgeId>,
    vertex_edges: HashMap<usize, Vec<EdgeId>>,
}

impl EdgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the edge running from `vi_a` to `vi_b`, creating it and its twin
    /// the first time the vertex pair is referenced.
    pub fn get_or_create(&mut self, vi_a: usize, vi_b: usize) -> EdgeId {
        debug_assert_ne!(vi_a, vi_b, "degenerate edge");
        let key = (vi_a.min(vi_b), vi_a.max(vi_b));
        let base = match self.lookup.get(&key) {
            Some(&id) => id,
            None => {
                let id = EdgeId(self.edges.len());
                self.edges.push(Edge {
                    vi_a: key.0,
                    vi_b: key.1,
                    opposite: id.opposite(),
                    strips: Vec::new(),
                });
                self.edges.push(Edge {
                    vi_a: key.1,
                    vi_b: key.0,
                    opposite: id,
                    strips: Vec::new(),
                });
                self.lookup.insert(key, id);
                self.vertex_edges.entry(key.0).or_default().push(id);
                self.vertex_edges.entry(key.1).or_default().push(id);
                id
            }
        };
        if vi_a == key.0 {
            base
        } else {
            base.opposite()
        }
    }

    /// Find an existing edge without creating it
    pub fn find(&self, vi_a: usize, vi_b: usize) -> Option<EdgeId> {
        let key = (vi_a.min(vi_b), vi_a.max(vi_b));
        self.lookup
            .get(&key)
            .map(|&id| if vi_a == key.0 { id } else { id.opposite() })
    }

    pub fn get(&self, id: EdgeId) -> &Edge {
        &self.edges[id.0]
    }

    pub fn get_mut(&mut self, id: EdgeId) -> &mut Edge {
        &mut self.edges[id.0]
    }

    /// Endpoints of an edge
    pub fn pair(&self, id: EdgeId) -> (usize, usize) {
        self.edges[id.0].pair()
    }

    /// Number of directed edge records
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Register a strip as using `id` in its own direction
    pub fn attach(&mut self, id: EdgeId, strip: StripId) {
        self.edges[id.0].strips.push(strip);
    }

    /// Remove a strip from an edge and from its twin
    pub fn detach(&mut self, id: EdgeId, strip: StripId) {
        self.edges[id.0].remove_strip(strip);
        self.edges[id.opposite().0].remove_strip(strip);
    }

    /// Hand every reference `from` holds on an edge and its twin over to `to`
    pub fn change_strip(&mut self, id: EdgeId, from: StripId, to: StripId) {
        for e in [id, id.opposite()] {
            for s in self.edges[e.0].strips.iter_mut() {
                if *s == from {
                    *s = to;
                }
            }
        }
    }

    /// Every strip touching the vertex pair of `id`, on either side
    pub fn strips_across(&self, id: EdgeId) -> impl Iterator<Item = StripId> + '_ {
        self.edges[id.0]
            .strips
            .iter()
            .chain(self.edges[id.opposite().0].strips.iter())
            .copied()
    }

    /// Undirected edges incident to a vertex, one handle per vertex pair
    pub fn vertex_edges(&self, vi: usize) -> &[EdgeId] {
        self.vertex_edges.get(&vi).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of distinct vertex pairs incident to a vertex
    pub fn degree(&self, vi: usize) -> usize {
        self.vertex_edges(vi).len()
    }

    /// Every vertex that has at least one edge, in ascending order
    pub fn vertices(&self) -> Vec<usize> {
        let mut vertices: Vec<usize> = self.vertex_edges.keys().copied().collect();
        vertices.sort_unstable();
        vertices
    }
}
