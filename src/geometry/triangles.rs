//! Planar triangles from death simplices.

use geo::{Coord, LineString, Polygon, Rect};
use serde::Serialize;
use tracing::warn;

use crate::error::{GeometryIssue, Result};
use crate::site::Site;
use crate::topology::{DeathTriangle, Simplex};

/// A death triangle placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriangleRegion {
    /// Persistence rank (0 = most persistent)
    pub id: usize,
    /// Position of the death simplex in the filtration order
    pub simplex_index: usize,
    pub sites: [usize; 3],
    pub persistence: f64,
    pub death_value: f64,
    #[serde(skip)]
    pub polygon: Polygon<f64>,
    #[serde(skip)]
    pub bbox: Rect<f64>,
}

/// Triangles that could be built plus the ones that were skipped.
#[derive(Debug, Clone, Default)]
pub struct TriangleSet {
    pub triangles: Vec<TriangleRegion>,
    pub skipped: Vec<GeometryIssue>,
}

/// Maps ranked death triangles onto site coordinates.
pub struct TriangleGeometryBuilder<'a> {
    sites: &'a [Site],
    collinear_tolerance: f64,
}

impl<'a> TriangleGeometryBuilder<'a> {
    pub fn new(sites: &'a [Site]) -> Self {
        Self {
            sites,
            collinear_tolerance: 1e-12,
        }
    }

    /// Twice-area threshold under which a triangle counts as collinear.
    pub fn collinear_tolerance(mut self, tolerance: f64) -> Self {
        self.collinear_tolerance = tolerance;
        self
    }

    /// Build one polygon per death triangle, in rank order.
    ///
    /// An out-of-range site id is fatal; a collinear triangle is skipped.
    pub fn build(&self, selected: &[DeathTriangle]) -> Result<TriangleSet> {
        let mut set = TriangleSet::default();

        for (rank, death) in selected.iter().enumerate() {
            let [i, j, k] = death.sites;
            Simplex::triangle(i, j, k).check_range(self.sites.len())?;
            let [a, b, c] = [i, j, k].map(|site| self.sites[site].location());
            let twice_area = (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x);
            if !twice_area.is_finite() || twice_area.abs() <= self.collinear_tolerance {
                let issue = GeometryIssue::DegenerateTriangle {
                    triangle_id: rank,
                    sites: death.sites,
                };
                warn!("skipping {}", issue);
                set.skipped.push(issue);
                continue;
            }

            let polygon = Polygon::new(LineString::from(vec![a, b, c]), vec![]);
            let bbox = Rect::new(
                Coord {
                    x: a.x.min(b.x).min(c.x),
                    y: a.y.min(b.y).min(c.y),
                },
                Coord {
                    x: a.x.max(b.x).max(c.x),
                    y: a.y.max(b.y).max(c.y),
                },
            );

            set.triangles.push(TriangleRegion {
                id: rank,
                simplex_index: death.simplex_index,
                sites: death.sites,
                persistence: death.persistence,
                death_value: death.death_value,
                polygon,
                bbox,
            });
        }

        Ok(set)
    }
}
