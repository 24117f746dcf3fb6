//! Region classification against death triangles.

use std::fmt;

use geo::{Intersects, Rect};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::regions::ZipRegion;
use super::triangles::TriangleRegion;
use crate::error::GeometryIssue;

/// Service label of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "UNDERSERVED")]
    Underserved,
    #[serde(rename = "NOT UNDERSERVED")]
    NotUnderserved,
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Underserved => write!(f, "UNDERSERVED"),
            Label::NotUnderserved => write!(f, "NOT UNDERSERVED"),
        }
    }
}

/// Outcome for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionResult {
    pub region_id: String,
    pub name: String,
    pub label: Label,
    /// Ids of every intersecting triangle, ascending
    pub triangle_ids: Vec<usize>,
}

impl RegionResult {
    pub fn is_underserved(&self) -> bool {
        self.label == Label::Underserved
    }
}

/// Per-region results in input order, minus skipped regions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub results: Vec<RegionResult>,
    pub skipped: Vec<GeometryIssue>,
}

impl Classification {
    pub fn underserved_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_underserved()).count()
    }
}

/// Flags regions that touch at least one death triangle.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegionClassifier {
    parallel: bool,
}

impl RegionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify regions on the rayon pool. Output order is unchanged.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn classify(&self, triangles: &[TriangleRegion], regions: &[ZipRegion]) -> Classification {
        let outcomes: Vec<Result<RegionResult, GeometryIssue>> = if self.parallel {
            regions
                .par_iter()
                .map(|r| classify_one(triangles, r))
                .collect()
        } else {
            regions.iter().map(|r| classify_one(triangles, r)).collect()
        };

        let mut classification = Classification::default();
        for outcome in outcomes {
            match outcome {
                Ok(result) => classification.results.push(result),
                Err(issue) => {
                    warn!("skipping {}", issue);
                    classification.skipped.push(issue);
                }
            }
        }
        classification
    }
}

/// Test one region against every triangle. Not short-circuited: all
/// intersecting triangles are recorded.
fn classify_one(
    triangles: &[TriangleRegion],
    region: &ZipRegion,
) -> Result<RegionResult, GeometryIssue> {
    let bbox: Rect<f64> = region.validate()?;

    let triangle_ids: Vec<usize> = triangles
        .iter()
        .filter(|t| t.bbox.intersects(&bbox))
        .filter(|t| region.geometry.intersects(&t.polygon))
        .map(|t| t.id)
        .collect();

    let label = if triangle_ids.is_empty() {
        Label::NotUnderserved
    } else {
        Label::Underserved
    };

    Ok(RegionResult {
        region_id: region.id.clone(),
        name: region.display_name(),
        label,
        triangle_ids,
    })
}
