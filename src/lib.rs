//! # TDA-Underserved
//!
//! Service-Gap Detection for Geographic Regions via Weighted Persistent
//! Homology
//!
//! Given service sites (e.g. DMV offices) with a load each (wait time) and
//! pairwise distances, this crate finds the places where coverage is
//! structurally weak and flags every target region (ZIP code polygon) that
//! touches one of them.
//!
//! ### Central Idea
//!
//! Proximity alone cannot tell a dense cluster from a ring of sites around
//! an empty middle. Topology can: in a weighted Rips filtration the ring
//! closes into a loop long before the area inside it is filled in. The
//! triangle that finally fills a long-lived loop marks a coverage hole.
//!
//! ### Methodology
//!
//! 1. **Weighted Rips filtration**: vertices, edges and triangles over all
//!    sites, valued by loads and distances ([`topology::WeightedRips`])
//!
//! 2. **Persistent homology**: exact pairs from boundary matrix reduction
//!    over Z/2Z ([`BoundaryReducer`])
//!
//! 3. **Death triangles**: the triangles killing one-dimensional classes,
//!    ranked by persistence ([`PersistenceSelector`])
//!
//! 4. **Classification**: a region is UNDERSERVED iff its polygon meets at
//!    least one death triangle ([`RegionClassifier`])
//!
//! ## Example
//!
//! ```
//! use ndarray::{array, Array1};
//! use tda_underserved::{AnalysisConfig, AnalysisInput, Label, UnderservedAnalysis, ZipRegion};
//!
//! let s2 = 2.0_f64.sqrt();
//! let distances = array![
//!     [0.0, 1.0, s2, 1.0],
//!     [1.0, 0.0, 1.0, s2],
//!     [s2, 1.0, 0.0, 1.0],
//!     [1.0, s2, 1.0, 0.0]
//! ];
//! let locations = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)];
//! let regions = vec![ZipRegion::from_exterior(
//!     "center",
//!     vec![(0.45, 0.45), (0.55, 0.45), (0.55, 0.55), (0.45, 0.55)],
//! )];
//!
//! let input = AnalysisInput::from_parts(distances, &Array1::zeros(4), &locations, None, regions)?;
//! let report = UnderservedAnalysis::new(AnalysisConfig::default()).run(&input)?;
//! assert_eq!(report.records[0].label, Label::Underserved);
//! # Ok::<(), tda_underserved::AnalysisError>(())
//! ```
//!
//! ## References
//!
//! - Edelsbrunner & Harer, "Computational Topology" (2010)
//! - Zomorodian & Carlsson, "Computing Persistent Homology" (2005)

pub mod topology;
pub mod geometry;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod site;

// Re-exports from topology
pub use topology::{
    // Filtration
    FiltrationModel,
    WeightedRips,
    PlainRips,
    // Complex construction
    ComplexBuilder,
    FilteredComplex,
    FilteredSimplex,
    Simplex,
    // Persistence
    BoundaryReducer,
    PersistenceDiagram,
    PersistencePair,
    EssentialClass,
    PersistenceSelector,
    DeathTriangle,
    RankBy,
};

// Re-exports from geometry
pub use geometry::{
    TriangleGeometryBuilder,
    TriangleRegion,
    RegionClassifier,
    RegionResult,
    RegionRecord,
    Classification,
    Label,
    ZipRegion,
};

pub use config::AnalysisConfig;
pub use error::{AnalysisError, GeometryIssue, Result};
pub use pipeline::{AnalysisInput, AnalysisReport, RegionReport, Summary, UnderservedAnalysis};
pub use site::Site;
