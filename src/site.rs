//! Service sites (offices) with location and load.

use geo::Coord;
use serde::{Deserialize, Serialize};

/// A service location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    /// Position in the distance matrix and weight vector
    pub id: usize,
    #[serde(default)]
    pub name: Option<String>,
    pub longitude: f64,
    pub latitude: f64,
    /// Non-negative load, e.g. wait minutes
    pub weight: f64,
}

impl Site {
    pub fn new(id: usize, longitude: f64, latitude: f64, weight: f64) -> Self {
        Self {
            id,
            name: None,
            longitude,
            latitude,
            weight,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Planar location, x = longitude, y = latitude.
    pub fn location(&self) -> Coord<f64> {
        Coord {
            x: self.longitude,
            y: self.latitude,
        }
    }

    /// Display name, falling back to the id.
    pub fn label(&self) -> String {
        self.name.clone().unwrap_or_else(|| format!("site {}", self.id))
    }
}
