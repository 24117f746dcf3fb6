//! Filtered 2-Skeleton Construction
//!
//! Enumerates every vertex, edge and triangle over N sites (no distance
//! cutoff unless one is configured), tags each simplex with its filtration
//! value, and sorts the result into the total order
//!
//! ```text
//!   (filtration value, dimension, sorted vertex tuple)   ascending
//! ```
//!
//! which is the column order of the boundary matrix. Vertex tuples are
//! unique, so the order is strict and two builds on the same input are
//! identical.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::Serialize;
use tracing::debug;

use super::filtration::{triangle_value, FiltrationModel};
use crate::error::{AnalysisError, Result};

/// A simplex represented by its sorted, distinct vertex indices.
#[derive(Debug, Clone, Hash, Eq, PartialEq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Simplex {
    vertices: Vec<usize>,
}

impl Simplex {
    /// Build from arbitrary vertex order. Rejects empty input, duplicates and
    /// anything above dimension 2.
    pub fn new(mut vertices: Vec<usize>) -> Result<Self> {
        vertices.sort_unstable();
        let distinct = vertices.windows(2).all(|w| w[0] != w[1]);
        if vertices.is_empty() || vertices.len() > 3 || !distinct {
            return Err(AnalysisError::InvalidConfig(format!(
                "not a simplex of dimension <= 2: {:?}",
                vertices
            )));
        }
        Ok(Self { vertices })
    }

    pub fn vertex(i: usize) -> Self {
        Self { vertices: vec![i] }
    }

    /// Edge between two distinct sites (order irrelevant).
    pub fn edge(i: usize, j: usize) -> Self {
        debug_assert_ne!(i, j);
        Self { vertices: vec![i.min(j), i.max(j)] }
    }

    /// Triangle on three distinct sites (order irrelevant).
    pub fn triangle(i: usize, j: usize, k: usize) -> Self {
        let mut vertices = vec![i, j, k];
        vertices.sort_unstable();
        debug_assert!(vertices[0] != vertices[1] && vertices[1] != vertices[2]);
        Self { vertices }
    }

    pub fn vertices(&self) -> &[usize] {
        &self.vertices
    }

    pub fn dimension(&self) -> usize {
        self.vertices.len() - 1
    }

    /// Codimension-1 faces: [v0, ..., v̂i, ..., vk] for each i.
    pub fn faces(&self) -> Vec<Simplex> {
        if self.dimension() == 0 {
            return Vec::new();
        }
        (0..self.vertices.len())
            .map(|i| {
                let mut face = self.vertices.clone();
                face.remove(i);
                Simplex { vertices: face }
            })
            .collect()
    }

    /// Vertex triple of a triangle.
    pub fn as_triangle(&self) -> Option<[usize; 3]> {
        match self.vertices.as_slice() {
            &[a, b, c] => Some([a, b, c]),
            _ => None,
        }
    }

    /// Check every vertex lies in `0..n_sites`.
    pub fn check_range(&self, n_sites: usize) -> Result<()> {
        match self.vertices.iter().find(|&&v| v >= n_sites) {
            Some(&vertex) => Err(AnalysisError::VertexOutOfRange { vertex, n_sites }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Simplex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.vertices.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}

/// A simplex with the filtration value at which it enters the complex.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredSimplex {
    pub simplex: Simplex,
    pub value: f64,
}

impl FilteredSimplex {
    pub fn dimension(&self) -> usize {
        self.simplex.dimension()
    }
}

/// Total order of the boundary matrix columns.
pub fn filtration_order(a: &FilteredSimplex, b: &FilteredSimplex) -> Ordering {
    a.value
        .total_cmp(&b.value)
        .then(a.dimension().cmp(&b.dimension()))
        .then_with(|| a.simplex.cmp(&b.simplex))
}

/// Ordered simplex list plus a lookup from simplex to its position.
#[derive(Debug, Clone)]
pub struct FilteredComplex {
    n_sites: usize,
    simplices: Vec<FilteredSimplex>,
    index: HashMap<Simplex, usize>,
}

impl FilteredComplex {
    pub fn n_sites(&self) -> usize {
        self.n_sites
    }

    pub fn len(&self) -> usize {
        self.simplices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.simplices.is_empty()
    }

    /// Simplices in filtration order.
    pub fn simplices(&self) -> &[FilteredSimplex] {
        &self.simplices
    }

    pub fn get(&self, position: usize) -> Option<&FilteredSimplex> {
        self.simplices.get(position)
    }

    /// Position of a simplex in the filtration order.
    pub fn position(&self, simplex: &Simplex) -> Option<usize> {
        self.index.get(simplex).copied()
    }

    /// Filtration value of a simplex, if present.
    pub fn value_of(&self, simplex: &Simplex) -> Option<f64> {
        self.position(simplex).map(|p| self.simplices[p].value)
    }

    /// Number of simplices of dimension `d`.
    pub fn count(&self, d: usize) -> usize {
        self.simplices.iter().filter(|s| s.dimension() == d).count()
    }

    /// Raw boundary column: positions of the codimension-1 faces present in
    /// the complex, ascending.
    pub fn boundary(&self, position: usize) -> Vec<usize> {
        let mut rows: Vec<usize> = self.simplices[position]
            .simplex
            .faces()
            .iter()
            .filter_map(|face| self.position(face))
            .collect();
        rows.sort_unstable();
        rows
    }
}

/// Validate a distance matrix and weight vector.
///
/// Checks shape, finiteness, non-negativity, symmetry, zero diagonal and
/// that no two distinct sites coincide.
pub fn validate_inputs(
    distances: &Array2<f64>,
    weights: &Array1<f64>,
    symmetry_tolerance: f64,
) -> Result<()> {
    let (rows, cols) = distances.dim();
    if rows != cols {
        return Err(AnalysisError::NonSquareMatrix { rows, cols });
    }
    if weights.len() != rows {
        return Err(AnalysisError::LengthMismatch {
            what: "weight vector",
            expected: rows,
            actual: weights.len(),
        });
    }
    if rows < 3 {
        return Err(AnalysisError::TooFewSites(rows));
    }

    for (i, &w) in weights.iter().enumerate() {
        if !w.is_finite() || w < 0.0 {
            return Err(AnalysisError::InvalidValue {
                what: "weight",
                index: (i, 0),
                value: w,
            });
        }
    }

    for ((i, j), &d) in distances.indexed_iter() {
        if !d.is_finite() || d < 0.0 {
            return Err(AnalysisError::InvalidValue {
                what: "distance",
                index: (i, j),
                value: d,
            });
        }
    }

    for i in 0..rows {
        let dii = distances[[i, i]];
        if dii.abs() > symmetry_tolerance {
            return Err(AnalysisError::NonZeroDiagonal { site: i, value: dii });
        }
        for j in i + 1..rows {
            let dij = distances[[i, j]];
            let dji = distances[[j, i]];
            if (dij - dji).abs() > symmetry_tolerance {
                return Err(AnalysisError::AsymmetricMatrix { i, j, dij, dji });
            }
            if dij == 0.0 {
                return Err(AnalysisError::CoincidentSites { i, j });
            }
        }
    }

    Ok(())
}

/// Builds the filtered 2-skeleton from distances and weights.
pub struct ComplexBuilder<'a> {
    distances: &'a Array2<f64>,
    weights: &'a Array1<f64>,
    model: &'a dyn FiltrationModel,
    max_filtration: Option<f64>,
    symmetry_tolerance: f64,
    parallel: bool,
}

impl<'a> ComplexBuilder<'a> {
    pub fn new(
        distances: &'a Array2<f64>,
        weights: &'a Array1<f64>,
        model: &'a dyn FiltrationModel,
    ) -> Self {
        Self {
            distances,
            weights,
            model,
            max_filtration: None,
            symmetry_tolerance: 1e-9,
            parallel: false,
        }
    }

    /// Drop simplices whose value exceeds `max`.
    pub fn max_filtration(mut self, max: Option<f64>) -> Self {
        self.max_filtration = max;
        self
    }

    pub fn symmetry_tolerance(mut self, tolerance: f64) -> Self {
        self.symmetry_tolerance = tolerance;
        self
    }

    /// Compute filtration values on the rayon pool.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    fn within_cutoff(&self, value: f64) -> bool {
        self.max_filtration.map_or(true, |max| value <= max)
    }

    /// Build and order the complex.
    ///
    /// Fails on inconsistent inputs and on any face entering after one of
    /// its cofaces.
    pub fn build(&self) -> Result<FilteredComplex> {
        validate_inputs(self.distances, self.weights, self.symmetry_tolerance)?;
        let n = self.weights.len();

        let vertex_values: Vec<f64> = self
            .weights
            .iter()
            .map(|&w| self.model.vertex_value(w))
            .collect();

        // Edge values (upper triangle, symmetric lookup)
        let pairs: Vec<(usize, usize)> = (0..n)
            .flat_map(|i| (i + 1..n).map(move |j| (i, j)))
            .collect();
        let edge_fn = |&(i, j): &(usize, usize)| {
            self.model
                .edge_value(self.weights[i], self.weights[j], self.distances[[i, j]])
        };
        let edge_list: Vec<f64> = if self.parallel {
            pairs.par_iter().map(edge_fn).collect()
        } else {
            pairs.iter().map(edge_fn).collect()
        };
        let mut edge_values = Array2::<f64>::from_elem((n, n), f64::NAN);
        for (&(i, j), &value) in pairs.iter().zip(&edge_list) {
            edge_values[[i, j]] = value;
            edge_values[[j, i]] = value;
        }

        let mut simplices: Vec<FilteredSimplex> = Vec::new();

        for (i, &value) in vertex_values.iter().enumerate() {
            check_finite(&Simplex::vertex(i), value)?;
            if self.within_cutoff(value) {
                simplices.push(FilteredSimplex {
                    simplex: Simplex::vertex(i),
                    value,
                });
            }
        }

        for (&(i, j), &value) in pairs.iter().zip(&edge_list) {
            let edge = Simplex::edge(i, j);
            check_finite(&edge, value)?;
            for v in [i, j] {
                check_monotone(&edge, value, &Simplex::vertex(v), vertex_values[v])?;
            }
            if self.within_cutoff(value) {
                simplices.push(FilteredSimplex {
                    simplex: edge,
                    value,
                });
            }
        }

        let triangles_from = |i: usize| -> Vec<Result<Option<FilteredSimplex>>> {
            let mut out = Vec::new();
            for j in i + 1..n {
                for k in j + 1..n {
                    out.push(self.triangle(i, j, k, &edge_values));
                }
            }
            out
        };
        let triangles: Vec<Result<Option<FilteredSimplex>>> = if self.parallel {
            (0..n).into_par_iter().flat_map_iter(triangles_from).collect()
        } else {
            (0..n).flat_map(triangles_from).collect()
        };
        for triangle in triangles {
            if let Some(t) = triangle? {
                simplices.push(t);
            }
        }

        simplices.sort_by(filtration_order);

        let index: HashMap<Simplex, usize> = simplices
            .iter()
            .enumerate()
            .map(|(pos, s)| (s.simplex.clone(), pos))
            .collect();

        let complex = FilteredComplex {
            n_sites: n,
            simplices,
            index,
        };
        debug!(
            model = self.model.name(),
            vertices = complex.count(0),
            edges = complex.count(1),
            triangles = complex.count(2),
            "built filtered complex"
        );
        Ok(complex)
    }

    fn triangle(
        &self,
        i: usize,
        j: usize,
        k: usize,
        edge_values: &Array2<f64>,
    ) -> Result<Option<FilteredSimplex>> {
        let edges = [
            (Simplex::edge(i, j), edge_values[[i, j]]),
            (Simplex::edge(i, k), edge_values[[i, k]]),
            (Simplex::edge(j, k), edge_values[[j, k]]),
        ];
        // every face must be present for the triangle to be
        if edges.iter().any(|(_, v)| !self.within_cutoff(*v)) {
            return Ok(None);
        }
        let value = triangle_value([edges[0].1, edges[1].1, edges[2].1]);
        let simplex = Simplex::triangle(i, j, k);
        check_finite(&simplex, value)?;
        for (face, face_value) in &edges {
            check_monotone(&simplex, value, face, *face_value)?;
        }
        if !self.within_cutoff(value) {
            return Ok(None);
        }
        Ok(Some(FilteredSimplex { simplex, value }))
    }
}

fn check_finite(simplex: &Simplex, value: f64) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(AnalysisError::NonFiniteFiltration {
            simplex: simplex.clone(),
            value,
        })
    }
}

fn check_monotone(simplex: &Simplex, value: f64, face: &Simplex, face_value: f64) -> Result<()> {
    if face_value <= value {
        Ok(())
    } else {
        Err(AnalysisError::NumericInvariantViolation {
            simplex: simplex.clone(),
            face: face.clone(),
            simplex_value: value,
            face_value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::filtration::{PlainRips, WeightedRips};
    use ndarray::array;
    use proptest::prelude::*;

    fn square() -> Array2<f64> {
        let s2 = 2.0_f64.sqrt();
        array![
            [0.0, 1.0, s2, 1.0],
            [1.0, 0.0, 1.0, s2],
            [s2, 1.0, 0.0, 1.0],
            [1.0, s2, 1.0, 0.0]
        ]
    }

    /// Model whose edges can sit below their vertices.
    struct Inverted;

    impl FiltrationModel for Inverted {
        fn vertex_value(&self, weight: f64) -> f64 {
            weight
        }
        fn edge_value(&self, _w_i: f64, _w_j: f64, d_ij: f64) -> f64 {
            d_ij
        }
        fn name(&self) -> &'static str {
            "inverted"
        }
    }

    #[test]
    fn test_simplex_canonical_form() {
        let t = Simplex::triangle(3, 1, 2);
        assert_eq!(t.vertices(), &[1, 2, 3]);
        assert_eq!(t, Simplex::new(vec![2, 3, 1]).unwrap());
        assert_eq!(Simplex::edge(5, 2), Simplex::edge(2, 5));
        assert!(Simplex::new(vec![1, 1]).is_err());
        assert!(Simplex::new(vec![]).is_err());
        assert!(Simplex::new(vec![0, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_faces() {
        let faces = Simplex::triangle(0, 1, 2).faces();
        assert_eq!(
            faces,
            vec![Simplex::edge(1, 2), Simplex::edge(0, 2), Simplex::edge(0, 1)]
        );
        assert!(Simplex::vertex(4).faces().is_empty());
    }

    #[test]
    fn test_full_skeleton_counts() {
        let n = 6;
        let dm = Array2::from_shape_fn((n, n), |(i, j)| (i as f64 - j as f64).abs());
        let w = Array1::zeros(n);
        let model = WeightedRips::new();
        let complex = ComplexBuilder::new(&dm, &w, &model).build().unwrap();
        assert_eq!(complex.count(0), 6);
        assert_eq!(complex.count(1), 15);
        assert_eq!(complex.count(2), 20);
    }

    #[test]
    fn test_square_order() {
        let dm = square();
        let w = Array1::zeros(4);
        let model = WeightedRips::new();
        let complex = ComplexBuilder::new(&dm, &w, &model).build().unwrap();

        // vertices first, then the four sides, then diagonals, then triangles
        let dims: Vec<usize> = complex.simplices().iter().map(|s| s.dimension()).collect();
        assert_eq!(dims, vec![0, 0, 0, 0, 1, 1, 1, 1, 1, 1, 2, 2, 2, 2]);

        let sides: Vec<&Simplex> = complex.simplices()[4..8].iter().map(|s| &s.simplex).collect();
        assert_eq!(
            sides,
            vec![
                &Simplex::edge(0, 1),
                &Simplex::edge(0, 3),
                &Simplex::edge(1, 2),
                &Simplex::edge(2, 3)
            ]
        );
        assert!((complex.simplices()[4].value - 0.5).abs() < 1e-12);
        assert!((complex.simplices()[8].value - 2.0_f64.sqrt() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_triangle_is_max_of_edges() {
        let dm = square();
        let w = array![1.0, 0.0, 2.0, 0.5];
        let model = WeightedRips::new();
        let complex = ComplexBuilder::new(&dm, &w, &model).build().unwrap();
        for s in complex.simplices().iter().filter(|s| s.dimension() == 2) {
            let max_edge = s
                .simplex
                .faces()
                .iter()
                .map(|f| complex.value_of(f).unwrap())
                .fold(f64::NEG_INFINITY, f64::max);
            assert_eq!(s.value, max_edge);
        }
    }

    #[test]
    fn test_boundary_positions_precede_column() {
        let dm = square();
        let w = Array1::zeros(4);
        let model = WeightedRips::new();
        let complex = ComplexBuilder::new(&dm, &w, &model).build().unwrap();
        for pos in 0..complex.len() {
            let rows = complex.boundary(pos);
            let dim = complex.simplices()[pos].dimension();
            assert_eq!(rows.len(), if dim == 0 { 0 } else { dim + 1 });
            assert!(rows.iter().all(|&r| r < pos));
        }
    }

    #[test]
    fn test_rejects_too_few_sites() {
        let dm = array![[0.0, 1.0], [1.0, 0.0]];
        let w = array![0.0, 0.0];
        let model = WeightedRips::new();
        let err = ComplexBuilder::new(&dm, &w, &model).build().unwrap_err();
        assert_eq!(err, AnalysisError::TooFewSites(2));
    }

    #[test]
    fn test_rejects_length_mismatch() {
        let dm = square();
        let w = array![0.0, 0.0, 0.0];
        let model = WeightedRips::new();
        let err = ComplexBuilder::new(&dm, &w, &model).build().unwrap_err();
        assert!(matches!(err, AnalysisError::LengthMismatch { expected: 4, actual: 3, .. }));
    }

    #[test]
    fn test_rejects_asymmetric_and_negative() {
        let model = WeightedRips::new();
        let w = Array1::zeros(3);

        let dm = array![[0.0, 1.0, 2.0], [1.5, 0.0, 1.0], [2.0, 1.0, 0.0]];
        let err = ComplexBuilder::new(&dm, &w, &model).build().unwrap_err();
        assert!(matches!(err, AnalysisError::AsymmetricMatrix { i: 0, j: 1, .. }));

        let dm = array![[0.0, -1.0, 2.0], [-1.0, 0.0, 1.0], [2.0, 1.0, 0.0]];
        let err = ComplexBuilder::new(&dm, &w, &model).build().unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidValue { what: "distance", .. }));
    }

    #[test]
    fn test_rejects_non_square_matrix() {
        let dm = Array2::<f64>::zeros((3, 4));
        let w = Array1::zeros(3);
        let model = WeightedRips::new();
        let err = ComplexBuilder::new(&dm, &w, &model).build().unwrap_err();
        assert_eq!(err, AnalysisError::NonSquareMatrix { rows: 3, cols: 4 });
    }

    #[test]
    fn test_rejects_non_zero_diagonal() {
        let mut dm = square();
        dm[[2, 2]] = 0.25;
        let w = Array1::zeros(4);
        let model = WeightedRips::new();
        let err = ComplexBuilder::new(&dm, &w, &model).build().unwrap_err();
        assert_eq!(err, AnalysisError::NonZeroDiagonal { site: 2, value: 0.25 });
    }

    #[test]
    fn test_rejects_nan_and_negative_weights() {
        let dm = square();
        let model = WeightedRips::new();

        let w = array![0.0, f64::NAN, 0.0, 0.0];
        let err = ComplexBuilder::new(&dm, &w, &model).build().unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidValue { what: "weight", index: (1, 0), .. }
        ));

        let w = array![0.0, 0.0, 0.0, -3.0];
        let err = ComplexBuilder::new(&dm, &w, &model).build().unwrap_err();
        assert_eq!(
            err,
            AnalysisError::InvalidValue { what: "weight", index: (3, 0), value: -3.0 }
        );
    }

    #[test]
    fn test_overflowing_edge_value_rejected() {
        let dm = square();
        let w = array![f64::MAX, f64::MAX, 0.0, 0.0];
        let model = WeightedRips::new();
        let err = ComplexBuilder::new(&dm, &w, &model).build().unwrap_err();
        match err {
            AnalysisError::NonFiniteFiltration { simplex, value } => {
                assert_eq!(simplex, Simplex::edge(0, 1));
                assert!(value.is_infinite());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_range() {
        let t = Simplex::triangle(0, 2, 5);
        assert!(t.check_range(6).is_ok());
        assert_eq!(
            t.check_range(5),
            Err(AnalysisError::VertexOutOfRange { vertex: 5, n_sites: 5 })
        );
    }

    #[test]
    fn test_all_zero_distances_rejected() {
        let dm = Array2::<f64>::zeros((4, 4));
        let w = Array1::from_elem(4, 1.0);
        let model = WeightedRips::new();
        let err = ComplexBuilder::new(&dm, &w, &model).build().unwrap_err();
        assert_eq!(err, AnalysisError::CoincidentSites { i: 0, j: 1 });
    }

    #[test]
    fn test_non_monotone_model_rejected() {
        let dm = square();
        let w = array![5.0, 0.0, 0.0, 0.0];
        let err = ComplexBuilder::new(&dm, &w, &Inverted).build().unwrap_err();
        assert!(matches!(err, AnalysisError::NumericInvariantViolation { .. }));
    }

    #[test]
    fn test_cutoff_keeps_complex_closed() {
        let dm = square();
        let w = Array1::zeros(4);
        let model = PlainRips::default();
        let complex = ComplexBuilder::new(&dm, &w, &model)
            .max_filtration(Some(1.2))
            .build()
            .unwrap();
        assert_eq!(complex.count(1), 4);
        assert_eq!(complex.count(2), 0);
    }

    proptest! {
        #[test]
        fn faces_never_exceed_cofaces(
            coords in prop::collection::vec((0.0f64..10.0, 0.0f64..10.0), 3..8),
            weights in prop::collection::vec(0.0f64..5.0, 8),
        ) {
            let n = coords.len();
            let dm = Array2::from_shape_fn((n, n), |(i, j)| {
                let dx = coords[i].0 - coords[j].0;
                let dy = coords[i].1 - coords[j].1;
                (dx * dx + dy * dy).sqrt()
            });
            prop_assume!((0..n).all(|i| (i + 1..n).all(|j| dm[[i, j]] > 0.0)));
            let w = Array1::from_iter(weights.into_iter().take(n));
            let model = WeightedRips::new();
            let complex = ComplexBuilder::new(&dm, &w, &model).build().unwrap();
            for s in complex.simplices() {
                for face in s.simplex.faces() {
                    prop_assert!(complex.value_of(&face).unwrap() <= s.value);
                }
            }
        }

        #[test]
        fn order_is_strict_and_reproducible(
            coords in prop::collection::vec((0i32..5, 0i32..5), 3..7),
        ) {
            let n = coords.len();
            let dm = Array2::from_shape_fn((n, n), |(i, j)| {
                let dx = (coords[i].0 - coords[j].0) as f64;
                let dy = (coords[i].1 - coords[j].1) as f64;
                (dx * dx + dy * dy).sqrt()
            });
            prop_assume!((0..n).all(|i| (i + 1..n).all(|j| dm[[i, j]] > 0.0)));
            let w = Array1::zeros(n);
            let model = WeightedRips::new();
            let a = ComplexBuilder::new(&dm, &w, &model).build().unwrap();
            let b = ComplexBuilder::new(&dm, &w, &model).parallel(true).build().unwrap();
            prop_assert_eq!(a.simplices(), b.simplices());
            for pair in a.simplices().windows(2) {
                prop_assert_eq!(filtration_order(&pair[0], &pair[1]), Ordering::Less);
            }
        }
    }
}
