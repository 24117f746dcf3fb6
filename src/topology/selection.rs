//! Selection of One-Dimensional Death Triangles
//!
//! A 1-cycle that is killed inside the 2-skeleton is killed by a triangle.
//! Those triangles are the "holes" in service coverage: three sites whose
//! pairwise connections appear well before the area between them fills in.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::reduction::PersistenceDiagram;

/// Ranking of the selected triangles, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    /// death - birth
    #[default]
    Persistence,
    /// Filtration value of the death triangle
    DeathFiltration,
}

/// A triangle that kills a one-dimensional class.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeathTriangle {
    /// Sorted site ids
    pub sites: [usize; 3],
    /// Position of the triangle in the filtration order
    pub simplex_index: usize,
    pub birth_value: f64,
    pub death_value: f64,
    pub persistence: f64,
}

/// Filters and ranks H1 pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistenceSelector {
    /// Keep pairs whose persistence is strictly greater than this
    pub min_persistence: f64,
    pub rank_by: RankBy,
    pub max_triangles: Option<usize>,
}

impl Default for PersistenceSelector {
    fn default() -> Self {
        Self {
            min_persistence: 0.0,
            rank_by: RankBy::Persistence,
            max_triangles: None,
        }
    }
}

impl PersistenceSelector {
    pub fn new(min_persistence: f64, rank_by: RankBy) -> Self {
        Self {
            min_persistence,
            rank_by,
            max_triangles: None,
        }
    }

    pub fn with_max_triangles(mut self, max: Option<usize>) -> Self {
        self.max_triangles = max;
        self
    }

    /// Death triangles of H1 pairs, ranked.
    ///
    /// Essential 1-cycles have no death triangle and never appear.
    pub fn select(&self, diagram: &PersistenceDiagram) -> Vec<DeathTriangle> {
        let mut selected: Vec<DeathTriangle> = diagram
            .pairs
            .iter()
            .filter(|p| p.dimension == 1 && p.death.dimension() == 2)
            .filter(|p| p.persistence() > self.min_persistence)
            .filter_map(|p| {
                p.death.as_triangle().map(|sites| DeathTriangle {
                    sites,
                    simplex_index: p.death_index,
                    birth_value: p.birth_value,
                    death_value: p.death_value,
                    persistence: p.persistence(),
                })
            })
            .collect();

        let rank_by = self.rank_by;
        selected.sort_by(|a, b| rank_order(rank_by, a, b));

        if let Some(max) = self.max_triangles {
            selected.truncate(max);
        }
        selected
    }
}

fn rank_order(rank_by: RankBy, a: &DeathTriangle, b: &DeathTriangle) -> Ordering {
    let by_persistence = b.persistence.total_cmp(&a.persistence);
    let by_death = b.death_value.total_cmp(&a.death_value);
    let primary = match rank_by {
        RankBy::Persistence => by_persistence.then(by_death),
        RankBy::DeathFiltration => by_death.then(by_persistence),
    };
    primary.then_with(|| a.sites.cmp(&b.sites))
}
