//! Filtration Values for the Weighted Rips Complex
//!
//! Every site carries a load (wait time). A site with a large load "occupies"
//! more of the filtration: its vertex appears late, and edges touching it
//! appear no earlier than the vertex. For an edge (i, j):
//!
//! ```text
//!   f(i, j) = max( w_i, w_j, (d_ij + w_i + w_j) / 2 )
//! ```
//!
//! which is `max(w_i, w_j)` when `d_ij <= |w_i - w_j|` (one load dominates)
//! and the balanced midpoint `(d_ij + w_i + w_j) / 2` otherwise.
//!
//! Triangles use the clique rule: the value of a triangle is the maximum of
//! its three edge values. That rule is fixed and not part of the model, so
//! any model whose edge value dominates both vertex values yields a valid
//! filtration.

/// Assigns filtration values to vertices and edges.
///
/// Implementations must be pure: the same inputs always give the same value.
pub trait FiltrationModel: Sync {
    /// Value at which the vertex of a site with this weight appears.
    fn vertex_value(&self, weight: f64) -> f64;

    /// Value at which the edge between two sites appears.
    fn edge_value(&self, w_i: f64, w_j: f64, d_ij: f64) -> f64;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

/// Clique extension: a triangle appears when its last edge does.
pub fn triangle_value(edges: [f64; 3]) -> f64 {
    edges[0].max(edges[1]).max(edges[2])
}

/// Weighted Rips filtration (power-distance style).
///
/// `scale = 1.0` gives the midpoint form above. `scale = 2.0` gives
/// `max(2w_i, 2w_j, d + w_i + w_j)` with vertices at `2w`, the convention of
/// simplex-tree weighted Rips implementations, where zero weights reduce to
/// the plain distance. Power-of-two scales are exact in `f64` and leave the
/// simplex order unchanged; other scales may round near-equal values into ties.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedRips {
    pub scale: f64,
}

impl WeightedRips {
    pub fn new() -> Self {
        Self { scale: 1.0 }
    }

    pub fn with_scale(scale: f64) -> Self {
        Self { scale }
    }
}

impl Default for WeightedRips {
    fn default() -> Self {
        Self::new()
    }
}

impl FiltrationModel for WeightedRips {
    fn vertex_value(&self, weight: f64) -> f64 {
        self.scale * weight
    }

    fn edge_value(&self, w_i: f64, w_j: f64, d_ij: f64) -> f64 {
        let value = if d_ij <= (w_i - w_j).abs() {
            w_i.max(w_j)
        } else {
            (d_ij + w_i + w_j) / 2.0
        };
        self.scale * value
    }

    fn name(&self) -> &'static str {
        "weighted-rips"
    }
}

/// Ordinary Vietoris-Rips filtration: weights are ignored, every vertex is
/// present from 0 and an edge appears at its (scaled) length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlainRips {
    pub scale: f64,
}

impl Default for PlainRips {
    fn default() -> Self {
        Self { scale: 1.0 }
    }
}

impl FiltrationModel for PlainRips {
    fn vertex_value(&self, _weight: f64) -> f64 {
        0.0
    }

    fn edge_value(&self, _w_i: f64, _w_j: f64, d_ij: f64) -> f64 {
        self.scale * d_ij
    }

    fn name(&self) -> &'static str {
        "rips"
    }
}
