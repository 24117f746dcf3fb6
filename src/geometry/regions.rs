//! Target regions (ZIP code areas).

use geo::{Area, BoundingRect, Coord, LineString, MultiPolygon, Polygon, Rect};
use serde::{Deserialize, Serialize};

use crate::error::GeometryIssue;

/// A region polygon with a stable identifier. Read-only for the analysis.
#[derive(Debug, Clone, PartialEq)]
pub struct ZipRegion {
    pub id: String,
    pub name: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

impl ZipRegion {
    pub fn new(id: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        Self {
            id: id.into(),
            name: None,
            geometry,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Single-polygon region from an exterior ring of (x, y) points.
    pub fn from_exterior(id: impl Into<String>, ring: Vec<(f64, f64)>) -> Self {
        let polygon = Polygon::new(LineString::from(ring), vec![]);
        Self::new(id, MultiPolygon::new(vec![polygon]))
    }

    /// Display name, falling back to `ZIP <id>`.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("ZIP {}", self.id))
    }

    /// Check the geometry is usable and return its bounding box.
    pub fn validate(&self) -> Result<Rect<f64>, GeometryIssue> {
        let malformed = |reason: &str| GeometryIssue::MalformedRegion {
            region_id: self.id.clone(),
            reason: reason.to_string(),
        };

        if self.geometry.0.is_empty() {
            return Err(malformed("no polygons"));
        }

        for polygon in &self.geometry.0 {
            let all_finite = std::iter::once(polygon.exterior())
                .chain(polygon.interiors())
                .flat_map(|ring| ring.coords())
                .all(|c| c.x.is_finite() && c.y.is_finite());
            if !all_finite {
                return Err(malformed("non-finite coordinate"));
            }
            if !has_three_distinct_vertices(polygon.exterior()) {
                return Err(malformed("exterior ring has fewer than 3 distinct vertices"));
            }
        }

        if self.geometry.unsigned_area() <= 0.0 {
            return Err(malformed("zero area"));
        }

        self.geometry
            .bounding_rect()
            .ok_or_else(|| malformed("no bounding box"))
    }
}

/// Stops at the third distinct coordinate, so long rings cost one pass.
fn has_three_distinct_vertices(ring: &LineString<f64>) -> bool {
    let mut seen: Vec<Coord<f64>> = Vec::with_capacity(3);
    for c in ring.coords() {
        if !seen.contains(c) {
            seen.push(*c);
            if seen.len() == 3 {
                return true;
            }
        }
    }
    false
}

/// Serialisable form of a region: rings of `[x, y]` pairs.
///
/// `polygons[k][0]` is the exterior of polygon k, further rings are holes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub polygons: Vec<Vec<Vec<[f64; 2]>>>,
}

impl From<RegionRecord> for ZipRegion {
    fn from(record: RegionRecord) -> Self {
        let to_ring = |ring: Vec<[f64; 2]>| {
            LineString::from(ring.into_iter().map(|[x, y]| (x, y)).collect::<Vec<_>>())
        };
        let polygons = record
            .polygons
            .into_iter()
            .map(|rings| {
                let mut rings = rings.into_iter();
                // a ringless entry stays as an empty polygon so validation reports it
                let exterior = rings.next().unwrap_or_default();
                Polygon::new(to_ring(exterior), rings.map(to_ring).collect())
            })
            .collect();
        Self {
            id: record.id,
            name: record.name,
            geometry: MultiPolygon::new(polygons),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square(id: &str) -> ZipRegion {
        ZipRegion::from_exterior(id, vec![(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
    }

    #[test]
    fn test_valid_region_bbox() {
        let bbox = unit_square("94110").validate().unwrap();
        assert_eq!(bbox.min(), Coord { x: 0.0, y: 0.0 });
        assert_eq!(bbox.max(), Coord { x: 1.0, y: 1.0 });
    }

    #[test]
    fn test_empty_region_is_malformed() {
        let region = ZipRegion::new("00000", MultiPolygon::new(vec![]));
        assert!(matches!(
            region.validate(),
            Err(GeometryIssue::MalformedRegion { .. })
        ));
    }

    #[test]
    fn test_degenerate_ring_is_malformed() {
        let region = ZipRegion::from_exterior("1", vec![(0.0, 0.0), (1.0, 1.0), (0.0, 0.0)]);
        assert!(region.validate().is_err());

        let flat = ZipRegion::from_exterior("2", vec![(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)]);
        assert!(flat.validate().is_err());

        let nan = ZipRegion::from_exterior("3", vec![(0.0, 0.0), (f64::NAN, 0.0), (1.0, 1.0)]);
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_record_conversion_keeps_holes() {
        let record = RegionRecord {
            id: "95814".into(),
            name: Some("Sacramento".into()),
            polygons: vec![vec![
                vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]],
                vec![[1.0, 1.0], [2.0, 1.0], [2.0, 2.0], [1.0, 2.0]],
            ]],
        };
        let region = ZipRegion::from(record);
        assert_eq!(region.display_name(), "Sacramento");
        assert_eq!(region.geometry.0.len(), 1);
        assert_eq!(region.geometry.0[0].interiors().len(), 1);
        assert!((region.geometry.unsigned_area() - 15.0).abs() < 1e-12);
    }

    #[test]
    fn test_ringless_polygon_entry_is_malformed() {
        let record = RegionRecord {
            id: "93210".into(),
            name: None,
            polygons: vec![
                vec![vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]],
                vec![],
            ],
        };
        let region = ZipRegion::from(record);
        assert_eq!(region.geometry.0.len(), 2);
        assert_eq!(
            region.validate(),
            Err(GeometryIssue::MalformedRegion {
                region_id: "93210".into(),
                reason: "exterior ring has fewer than 3 distinct vertices".into(),
            })
        );
    }

    #[test]
    fn test_long_ring_validates() {
        let n = 40_000;
        let ring: Vec<(f64, f64)> = (0..n)
            .map(|k| {
                let a = k as f64 * std::f64::consts::TAU / n as f64;
                (a.cos(), a.sin())
            })
            .collect();
        let region = ZipRegion::from_exterior("96001", ring);
        let bbox = region.validate().unwrap();
        assert!(bbox.max().x > 0.99 && bbox.min().y < -0.99);
    }

    #[test]
    fn test_distinct_vertex_check_ignores_repeats() {
        let repeated = LineString::from(vec![(0.0, 0.0), (0.0, 0.0), (1.0, 0.0), (1.0, 0.0)]);
        assert!(!has_three_distinct_vertices(&repeated));
        let three = LineString::from(vec![(0.0, 0.0), (1.0, 0.0), (0.0, 0.0), (0.0, 1.0)]);
        assert!(has_three_distinct_vertices(&three));
    }
}
