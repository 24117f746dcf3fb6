//! Error types for the underserved-region analysis.
//!
//! Two families of failure exist:
//!
//! - [`AnalysisError`]: fatal. Inconsistent inputs or a broken filtration
//!   abort the run before boundary reduction starts.
//! - [`GeometryIssue`]: per-item. A degenerate triangle or malformed region
//!   is skipped, logged and counted; the rest of the run proceeds.

use serde::Serialize;
use thiserror::Error;

use crate::topology::Simplex;

/// Fatal error raised while validating inputs or building the filtration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// At least three sites are needed for a triangle to exist.
    #[error("configuration error: need at least 3 sites, got {0}")]
    TooFewSites(usize),

    /// Distance matrix is not N×N.
    #[error("configuration error: distance matrix must be square, got {rows}x{cols}")]
    NonSquareMatrix { rows: usize, cols: usize },

    /// Matrix side, weight vector and coordinate table disagree on N.
    #[error("configuration error: {what} has length {actual}, expected {expected}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// NaN, infinite or negative input value.
    #[error("configuration error: invalid {what} at {index:?}: {value}")]
    InvalidValue {
        what: &'static str,
        index: (usize, usize),
        value: f64,
    },

    #[error("configuration error: distance matrix asymmetric at ({i}, {j}): {dij} vs {dji}")]
    AsymmetricMatrix { i: usize, j: usize, dij: f64, dji: f64 },

    #[error("configuration error: non-zero diagonal at site {site}: {value}")]
    NonZeroDiagonal { site: usize, value: f64 },

    /// Two distinct sites at distance zero.
    #[error("configuration error: sites {i} and {j} coincide (distance 0)")]
    CoincidentSites { i: usize, j: usize },

    /// A simplex refers to a site outside `0..n`.
    #[error("configuration error: vertex {vertex} out of range for {n_sites} sites")]
    VertexOutOfRange { vertex: usize, n_sites: usize },

    /// Rejected analysis setting.
    #[error("configuration error: {0}")]
    InvalidConfig(String),

    /// A face enters the filtration after one of its cofaces, or a value is
    /// not finite.
    #[error(
        "numeric invariant violation: face {face} (value {face_value}) exceeds \
         coface {simplex} (value {simplex_value})"
    )]
    NumericInvariantViolation {
        simplex: Simplex,
        face: Simplex,
        simplex_value: f64,
        face_value: f64,
    },

    #[error("numeric invariant violation: simplex {simplex} has non-finite value {value}")]
    NonFiniteFiltration { simplex: Simplex, value: f64 },
}

/// Crate result alias.
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Recoverable geometric problem. The affected item is left out of the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeometryIssue {
    /// The three sites of a death triangle are collinear.
    DegenerateTriangle { triangle_id: usize, sites: [usize; 3] },
    /// Region polygon is empty, has too few distinct vertices, or holds
    /// non-finite coordinates.
    MalformedRegion { region_id: String, reason: String },
}

impl std::fmt::Display for GeometryIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeometryIssue::DegenerateTriangle { triangle_id, sites } => write!(
                f,
                "degenerate triangle {} (sites {}, {}, {} are collinear)",
                triangle_id, sites[0], sites[1], sites[2]
            ),
            GeometryIssue::MalformedRegion { region_id, reason } => {
                write!(f, "malformed region {}: {}", region_id, reason)
            }
        }
    }
}
