//! Persistent Homology via Boundary Matrix Reduction
//!
//! Standard algorithm over Z/2Z on the ordered 2-skeleton:
//!
//! 1. Column j holds the positions of the faces of simplex j
//! 2. Process columns left to right; while another column already owns
//!    the same lowest row, add (XOR) that column into the current one
//! 3. An empty column is a birth; a non-empty one kills the class born at
//!    its lowest row
//!
//! A `low -> column` map makes the pivot lookup direct instead of a scan.
//! Columns are reduced strictly in filtration order, so identical inputs
//! always produce identical pairs.
//!
//! ## Reference
//!
//! Edelsbrunner, Letscher, Zomorodian (2002). "Topological Persistence
//! and Simplification". Discrete & Computational Geometry.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;
use tracing::debug;

use super::complex::{FilteredComplex, Simplex};

/// A finite persistence pair: a class born at `birth` and killed by `death`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PersistencePair {
    /// Homological dimension of the class (dimension of the birth simplex)
    pub dimension: usize,
    pub birth: Simplex,
    pub death: Simplex,
    /// Positions of the two simplices in the filtration order
    pub birth_index: usize,
    pub death_index: usize,
    pub birth_value: f64,
    pub death_value: f64,
}

impl PersistencePair {
    /// Lifetime of the feature
    pub fn persistence(&self) -> f64 {
        self.death_value - self.birth_value
    }
}

/// A class that is never killed inside the 2-skeleton.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EssentialClass {
    pub dimension: usize,
    pub birth: Simplex,
    pub birth_index: usize,
    pub birth_value: f64,
}

/// All pairs and essential classes of a filtered complex.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersistenceDiagram {
    pub pairs: Vec<PersistencePair>,
    pub essential: Vec<EssentialClass>,
}

impl PersistenceDiagram {
    /// Finite pairs whose class has dimension `d`
    pub fn pairs_in_dim(&self, d: usize) -> Vec<&PersistencePair> {
        self.pairs.iter().filter(|p| p.dimension == d).collect()
    }

    pub fn essential_in_dim(&self, d: usize) -> Vec<&EssentialClass> {
        self.essential.iter().filter(|e| e.dimension == d).collect()
    }

    /// Number of classes of dimension `d` alive at filtration value `t`
    pub fn betti_at(&self, d: usize, t: f64) -> usize {
        let finite = self
            .pairs
            .iter()
            .filter(|p| p.dimension == d && p.birth_value <= t && t < p.death_value)
            .count();
        let essential = self
            .essential
            .iter()
            .filter(|e| e.dimension == d && e.birth_value <= t)
            .count();
        finite + essential
    }

    /// Total persistence of finite pairs in dimension d
    pub fn total_persistence(&self, d: usize) -> f64 {
        self.pairs
            .iter()
            .filter(|p| p.dimension == d)
            .map(|p| p.persistence())
            .sum()
    }

    /// Shannon entropy of the positive finite lifetimes in dimension d
    pub fn persistence_entropy(&self, d: usize) -> f64 {
        let lifetimes: Vec<f64> = self
            .pairs
            .iter()
            .filter(|p| p.dimension == d)
            .map(|p| p.persistence())
            .filter(|&l| l > 0.0)
            .collect();

        let total: f64 = lifetimes.iter().sum();
        if lifetimes.is_empty() || total <= 0.0 {
            return 0.0;
        }

        let mut entropy = 0.0;
        for l in lifetimes {
            let prob = l / total;
            entropy -= prob * prob.ln();
        }
        entropy
    }
}

/// Sparse column of the boundary matrix
#[derive(Debug, Clone, Default)]
struct SparseColumn {
    /// Non-zero row indices
    rows: BTreeSet<usize>,
}

impl SparseColumn {
    fn from_rows(rows: impl IntoIterator<Item = usize>) -> Self {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    fn is_zero(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lowest (maximum) non-zero row
    fn low(&self) -> Option<usize> {
        self.rows.iter().next_back().copied()
    }

    /// XOR with another column - addition in Z/2Z
    fn add_assign(&mut self, other: &SparseColumn) {
        for &row in &other.rows {
            if !self.rows.remove(&row) {
                self.rows.insert(row);
            }
        }
    }
}

/// Reduces the boundary matrix of a [`FilteredComplex`].
pub struct BoundaryReducer<'a> {
    complex: &'a FilteredComplex,
}

impl<'a> BoundaryReducer<'a> {
    pub fn new(complex: &'a FilteredComplex) -> Self {
        Self { complex }
    }

    /// Run the reduction and collect pairs and essential classes.
    pub fn reduce(&self) -> PersistenceDiagram {
        let simplices = self.complex.simplices();
        let m = simplices.len();

        let mut columns: Vec<SparseColumn> = Vec::with_capacity(m);
        let mut low_to_col: HashMap<usize, usize> = HashMap::new();
        let mut additions = 0usize;

        for col_idx in 0..m {
            let mut column = SparseColumn::from_rows(self.complex.boundary(col_idx));

            while let Some(low_idx) = column.low() {
                match low_to_col.get(&low_idx) {
                    Some(&pivot_col) => {
                        column.add_assign(&columns[pivot_col]);
                        additions += 1;
                    }
                    None => break,
                }
            }

            if let Some(low_idx) = column.low() {
                low_to_col.insert(low_idx, col_idx);
            }
            columns.push(column);
        }

        let mut diagram = PersistenceDiagram::default();
        let mut paired = vec![false; m];

        for (col_idx, column) in columns.iter().enumerate() {
            if let Some(low_idx) = column.low() {
                let birth = &simplices[low_idx];
                let death = &simplices[col_idx];
                paired[low_idx] = true;
                paired[col_idx] = true;
                diagram.pairs.push(PersistencePair {
                    dimension: birth.dimension(),
                    birth: birth.simplex.clone(),
                    death: death.simplex.clone(),
                    birth_index: low_idx,
                    death_index: col_idx,
                    birth_value: birth.value,
                    death_value: death.value,
                });
            }
        }

        for (idx, simplex) in simplices.iter().enumerate() {
            if !paired[idx] && columns[idx].is_zero() {
                diagram.essential.push(EssentialClass {
                    dimension: simplex.dimension(),
                    birth: simplex.simplex.clone(),
                    birth_index: idx,
                    birth_value: simplex.value,
                });
            }
        }

        debug!(
            columns = m,
            additions,
            pairs = diagram.pairs.len(),
            essential = diagram.essential.len(),
            "reduced boundary matrix"
        );
        diagram
    }
}
