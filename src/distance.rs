//! Great-circle distances between stadiums.
//!
//! The distance matrix is computed once from the team coordinates and is
//! read-only afterwards, so a single matrix can be shared by any number of
//! optimizer runs.

use crate::error::{Error, Result};
use crate::team::Team;
use serde::{Deserialize, Serialize};

/// Mean Earth radius in kilometers
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance in kilometers between two points given in degrees
pub fn haversine(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Symmetric N×N matrix of stadium-to-stadium distances with a zero diagonal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceMatrix {
    rows: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Compute all pairwise haversine distances
    pub fn from_teams(teams: &[Team]) -> Self {
        let n = teams.len();
        let mut rows = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in i + 1..n {
                let d = haversine(teams[i].lat, teams[i].lon, teams[j].lat, teams[j].lon);
                rows[i][j] = d;
                rows[j][i] = d;
            }
        }

        DistanceMatrix { rows }
    }

    /// Wrap precomputed distances. Rows must form a square matrix of
    /// finite, non-negative values with a zero diagonal.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n = rows.len();
        for (i, row) in rows.iter().enumerate() {
            if row.len() != n {
                return Err(Error::invalid_input(format!(
                    "distance row {} has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            if let Some(d) = row.iter().find(|d| !d.is_finite() || **d < 0.0) {
                return Err(Error::invalid_input(format!(
                    "distance row {} contains invalid entry {}",
                    i, d
                )));
            }
            if row[i] != 0.0 {
                return Err(Error::invalid_input(format!(
                    "distance diagonal at {} is {}, expected 0",
                    i, row[i]
                )));
            }
        }
        Ok(DistanceMatrix { rows })
    }

    /// Distance between the stadiums of teams `i` and `j`
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    /// Number of teams covered by the matrix
    #[inline]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    /// Summary of the off-diagonal distances
    pub fn statistics(&self) -> DistanceStatistics {
        let n = self.len();
        let mut pairs = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = 0.0f64;

        for i in 0..n {
            for j in i + 1..n {
                let d = self.get(i, j);
                pairs += 1;
                sum += d;
                min = min.min(d);
                max = max.max(d);
            }
        }

        DistanceStatistics {
            teams: n,
            pairs,
            min_km: if pairs > 0 { min } else { 0.0 },
            avg_km: if pairs > 0 { sum / pairs as f64 } else { 0.0 },
            max_km: max,
        }
    }
}

/// Statistics about the pairwise stadium distances
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistanceStatistics {
    pub teams: usize,
    pub pairs: usize,
    pub min_km: f64,
    pub avg_km: f64,
    pub max_km: f64,
}

impl std::fmt::Display for DistanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Teams: {} ({} pairs)", self.teams, self.pairs)?;
        writeln!(f, "  Min distance: {:.2} km", self.min_km)?;
        writeln!(f, "  Avg distance: {:.2} km", self.avg_km)?;
        writeln!(f, "  Max distance: {:.2} km", self.max_km)
    }
}
