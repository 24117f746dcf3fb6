//! Geometry Module: Death Triangles on the Map
//!
//! Places the death triangles of one-dimensional classes at the locations
//! of their three sites and flags every region whose polygon meets one of
//! them. Intersection follows closed-set semantics: a shared boundary point
//! counts.

mod triangles;
mod regions;
mod classifier;

pub use triangles::{TriangleGeometryBuilder, TriangleRegion, TriangleSet};
pub use regions::{RegionRecord, ZipRegion};
pub use classifier::{Classification, Label, RegionClassifier, RegionResult};
