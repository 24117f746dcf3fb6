//! End-to-end underserved-region analysis.
//!
//! ```text
//!   distances + loads ─► ComplexBuilder ─► BoundaryReducer ─► PersistenceSelector
//!                                                                    │
//!   site coordinates ─────────────────────────► TriangleGeometryBuilder
//!                                                                    │
//!   region polygons ──────────────────────────────► RegionClassifier ─► AnalysisReport
//! ```
//!
//! Every stage consumes the previous stage's output by reference and builds
//! a new value; nothing upstream is mutated. Configuration and filtration
//! errors abort the run; geometry problems are skipped and reported.

use ndarray::{Array1, Array2};
use serde::Serialize;
use tracing::info;

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, GeometryIssue, Result};
use crate::geometry::{
    Classification, Label, RegionClassifier, TriangleGeometryBuilder, TriangleRegion, ZipRegion,
};
use crate::site::Site;
use crate::topology::{BoundaryReducer, ComplexBuilder, PersistenceSelector};

/// Fully materialised inputs for one run.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub sites: Vec<Site>,
    pub distances: Array2<f64>,
    pub regions: Vec<ZipRegion>,
}

impl AnalysisInput {
    /// Assemble sites from a weight vector and a coordinate table that share
    /// the distance matrix's site order.
    pub fn from_parts(
        distances: Array2<f64>,
        weights: &Array1<f64>,
        locations: &[(f64, f64)],
        names: Option<&[String]>,
        regions: Vec<ZipRegion>,
    ) -> Result<Self> {
        let n = distances.nrows();
        if weights.len() != n {
            return Err(AnalysisError::LengthMismatch {
                what: "weight vector",
                expected: n,
                actual: weights.len(),
            });
        }
        if locations.len() != n {
            return Err(AnalysisError::LengthMismatch {
                what: "coordinate table",
                expected: n,
                actual: locations.len(),
            });
        }
        if let Some(names) = names {
            if names.len() != n {
                return Err(AnalysisError::LengthMismatch {
                    what: "site names",
                    expected: n,
                    actual: names.len(),
                });
            }
        }

        let sites = locations
            .iter()
            .zip(weights.iter())
            .enumerate()
            .map(|(id, (&(lon, lat), &w))| {
                let site = Site::new(id, lon, lat, w);
                match names {
                    Some(names) => site.with_name(names[id].clone()),
                    None => site,
                }
            })
            .collect();

        Ok(Self {
            sites,
            distances,
            regions,
        })
    }

    /// Weight vector in site order.
    pub fn weights(&self) -> Array1<f64> {
        self.sites.iter().map(|s| s.weight).collect()
    }

    fn validate_sites(&self) -> Result<()> {
        let n = self.distances.nrows();
        if self.sites.len() != n {
            return Err(AnalysisError::LengthMismatch {
                what: "site table",
                expected: n,
                actual: self.sites.len(),
            });
        }
        for (position, site) in self.sites.iter().enumerate() {
            if site.id != position {
                return Err(AnalysisError::InvalidConfig(format!(
                    "site at position {} has id {}",
                    position, site.id
                )));
            }
            for value in [site.longitude, site.latitude] {
                if !value.is_finite() {
                    return Err(AnalysisError::InvalidValue {
                        what: "coordinate",
                        index: (position, 0),
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

/// A triangle as listed in a region's record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriangleRef {
    pub triangle_id: usize,
    pub site_ids: [usize; 3],
    pub site_names: Vec<String>,
    pub persistence: f64,
}

/// Output row for one region.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionReport {
    pub region_id: String,
    pub name: String,
    pub label: Label,
    pub intersecting_count: usize,
    pub triangles: Vec<TriangleRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub total_regions: usize,
    pub underserved: usize,
    pub not_underserved: usize,
    pub underserved_percentage: f64,
}

/// Run statistics and everything that was skipped.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub filtration_model: String,
    pub vertices: usize,
    pub edges: usize,
    pub triangles: usize,
    /// All finite H1 pairs, zero persistence included
    pub h1_pairs: usize,
    /// H1 death triangles kept after thresholding
    pub h1_selected: usize,
    pub h1_total_persistence: f64,
    pub h1_entropy: f64,
    pub skipped_triangles: usize,
    pub skipped_regions: usize,
    pub issues: Vec<GeometryIssue>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub records: Vec<RegionReport>,
    pub summary: Summary,
    pub triangles: Vec<TriangleRegion>,
    pub diagnostics: Diagnostics,
}

impl AnalysisReport {
    pub fn underserved(&self) -> impl Iterator<Item = &RegionReport> {
        self.records.iter().filter(|r| r.label == Label::Underserved)
    }

    /// Record for a region id.
    pub fn record(&self, region_id: &str) -> Option<&RegionReport> {
        self.records.iter().find(|r| r.region_id == region_id)
    }
}

/// Runs the full chain for one configuration.
#[derive(Debug, Clone, Default)]
pub struct UnderservedAnalysis {
    config: AnalysisConfig,
}

impl UnderservedAnalysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn run(&self, input: &AnalysisInput) -> Result<AnalysisReport> {
        let cfg = &self.config;
        cfg.validate()?;
        input.validate_sites()?;

        let weights = input.weights();
        let model = cfg.filtration_model();
        let complex = ComplexBuilder::new(&input.distances, &weights, model.as_ref())
            .max_filtration(cfg.max_filtration)
            .symmetry_tolerance(cfg.symmetry_tolerance)
            .parallel(cfg.parallel)
            .build()?;
        info!(
            "Complex: {} vertices, {} edges, {} triangles ({})",
            complex.count(0),
            complex.count(1),
            complex.count(2),
            model.name()
        );

        let diagram = BoundaryReducer::new(&complex).reduce();
        let h1_pairs = diagram.pairs_in_dim(1).len();

        let selected = PersistenceSelector::new(cfg.min_persistence, cfg.rank_by)
            .with_max_triangles(cfg.max_triangles)
            .select(&diagram);
        info!("Persistence: {} H1 pairs, {} death triangles selected", h1_pairs, selected.len());

        let triangle_set = TriangleGeometryBuilder::new(&input.sites)
            .collinear_tolerance(cfg.collinear_tolerance)
            .build(&selected)?;

        let classification = RegionClassifier::new()
            .parallel(cfg.parallel)
            .classify(&triangle_set.triangles, &input.regions);

        let records = build_records(&classification, &triangle_set.triangles, &input.sites);
        let summary = summarize(&classification);
        info!(
            "Classification: {} of {} regions underserved ({:.1}%)",
            summary.underserved, summary.total_regions, summary.underserved_percentage
        );

        let mut issues = triangle_set.skipped.clone();
        issues.extend(classification.skipped.iter().cloned());
        let diagnostics = Diagnostics {
            filtration_model: model.name().to_string(),
            vertices: complex.count(0),
            edges: complex.count(1),
            triangles: complex.count(2),
            h1_pairs,
            h1_selected: selected.len(),
            h1_total_persistence: diagram.total_persistence(1),
            h1_entropy: diagram.persistence_entropy(1),
            skipped_triangles: triangle_set.skipped.len(),
            skipped_regions: classification.skipped.len(),
            issues,
        };
        if diagnostics.skipped_triangles + diagnostics.skipped_regions > 0 {
            info!(
                "Degraded run: skipped {} triangles, {} regions",
                diagnostics.skipped_triangles, diagnostics.skipped_regions
            );
        }

        Ok(AnalysisReport {
            records,
            summary,
            triangles: triangle_set.triangles,
            diagnostics,
        })
    }
}

fn build_records(
    classification: &Classification,
    triangles: &[TriangleRegion],
    sites: &[Site],
) -> Vec<RegionReport> {
    classification
        .results
        .iter()
        .map(|result| {
            let refs: Vec<TriangleRef> = result
                .triangle_ids
                .iter()
                .filter_map(|id| triangles.iter().find(|t| t.id == *id))
                .map(|t| TriangleRef {
                    triangle_id: t.id,
                    site_ids: t.sites,
                    site_names: t.sites.iter().map(|&s| sites[s].label()).collect(),
                    persistence: t.persistence,
                })
                .collect();
            RegionReport {
                region_id: result.region_id.clone(),
                name: result.name.clone(),
                label: result.label,
                intersecting_count: refs.len(),
                triangles: refs,
            }
        })
        .collect()
}

fn summarize(classification: &Classification) -> Summary {
    let total_regions = classification.results.len();
    let underserved = classification.underserved_count();
    let underserved_percentage = if total_regions == 0 {
        0.0
    } else {
        underserved as f64 / total_regions as f64 * 100.0
    };
    Summary {
        total_regions,
        underserved,
        not_underserved: total_regions - underserved,
        underserved_percentage,
    }
}
