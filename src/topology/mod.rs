//! Topology Module: Weighted Rips Filtration and Persistent Homology
//!
//! Implements the topological half of the service-gap analysis:
//! - Weighted Vietoris-Rips filtration values from loads and distances
//! - Construction of the ordered 2-skeleton over all sites
//! - Exact persistence pairs via boundary matrix reduction
//! - Selection of the triangles that kill one-dimensional classes
//!
//! ## Mathematical Background
//!
//! For N sites with pairwise distances d and loads w, every vertex, edge
//! and triangle receives a filtration value f. Growing a threshold t,
//! the subcomplex {σ : f(σ) ≤ t} gains simplices one at a time in a fixed
//! total order. A one-dimensional class (a loop of edges) is born when an
//! edge closes a cycle and dies when a triangle fills it in. Loops that
//! stay open for a long stretch of t surround areas the sites cover poorly.

mod filtration;
mod complex;
mod reduction;
mod selection;

pub use filtration::{FiltrationModel, PlainRips, WeightedRips, triangle_value};
pub use complex::{
    ComplexBuilder,
    FilteredComplex,
    FilteredSimplex,
    Simplex,
    filtration_order,
    validate_inputs,
};
pub use reduction::{BoundaryReducer, EssentialClass, PersistenceDiagram, PersistencePair};
pub use selection::{DeathTriangle, PersistenceSelector, RankBy};
