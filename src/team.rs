//! Teams and their stadium coordinates.
//!
//! Teams are produced either by a seeded random generator scattering stadiums
//! around a center point, or loaded from a JSON or CSV file. Once built they
//! are never mutated; the scheduling core only reads their ids and coordinates.

use crate::error::{Error, Result};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

/// Kilometers per degree of latitude, used to turn km offsets into degrees
const KM_PER_DEGREE: f64 = 111.0;

/// A team with its home stadium location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    /// Team identifier, equal to its index in the team list
    pub id: usize,
    /// Display name
    pub name: String,
    /// Stadium latitude in degrees
    pub lat: f64,
    /// Stadium longitude in degrees
    pub lon: f64,
}

impl Team {
    pub fn new(id: usize, name: impl Into<String>, lat: f64, lon: f64) -> Self {
        Team { id, name: name.into(), lat, lon }
    }
}

/// Parameters for random team generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamGenerationConfig {
    /// (latitude, longitude) of the region center
    pub center: (f64, f64),
    /// Half-width of the square region, in kilometers
    pub spread_km: f64,
}

impl Default for TeamGenerationConfig {
    fn default() -> Self {
        // San Francisco
        TeamGenerationConfig {
            center: (37.7749, -122.4194),
            spread_km: 20.0,
        }
    }
}

/// Generate `n` teams uniformly scattered within ±`spread_km` of the center.
/// Deterministic for a given seed.
pub fn generate_teams(n: usize, config: &TeamGenerationConfig, seed: u64) -> Result<Vec<Team>> {
    if n == 0 {
        return Err(Error::InvalidTeamCount(n));
    }
    if !config.spread_km.is_finite() || config.spread_km < 0.0 {
        return Err(Error::invalid_input(format!(
            "spread_km must be a non-negative number, got {}",
            config.spread_km
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let (center_lat, center_lon) = config.center;
    let spread = config.spread_km;
    let km_per_degree_lon = KM_PER_DEGREE * center_lat.to_radians().cos();

    let teams = (0..n)
        .map(|i| {
            let dx_km: f64 = rng.gen_range(-spread..=spread);
            let dy_km: f64 = rng.gen_range(-spread..=spread);
            Team::new(
                i,
                format!("Team{}", i + 1),
                center_lat + dy_km / KM_PER_DEGREE,
                center_lon + dx_km / km_per_degree_lon,
            )
        })
        .collect();

    Ok(teams)
}

/// Load teams from a `.json` array or a `.csv` file with an `id,name,lat,lon` header
pub fn load_teams<P: AsRef<Path>>(path: P) -> Result<Vec<Team>> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    let teams: Vec<Team> = match extension.as_deref() {
        Some("json") => serde_json::from_reader(File::open(path)?)?,
        Some("csv") => {
            let mut reader = csv::Reader::from_reader(File::open(path)?);
            reader
                .deserialize::<Team>()
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
        _ => {
            return Err(Error::invalid_input(format!(
                "unsupported team file {:?} (expected .json or .csv)",
                path
            )))
        }
    };

    check_teams(&teams)?;
    Ok(teams)
}

/// Ensure ids are exactly `0..n` in order and coordinates are in range
pub fn check_teams(teams: &[Team]) -> Result<()> {
    if teams.is_empty() {
        return Err(Error::InvalidTeamCount(0));
    }
    for (index, team) in teams.iter().enumerate() {
        if team.id != index {
            return Err(Error::invalid_input(format!(
                "team at position {} has id {} (ids must be 0..{} in order)",
                index,
                team.id,
                teams.len()
            )));
        }
        if !(-90.0..=90.0).contains(&team.lat) || !(-180.0..=180.0).contains(&team.lon) {
            return Err(Error::invalid_input(format!(
                "team {} has out-of-range coordinates ({}, {})",
                team.id, team.lat, team.lon
            )));
        }
    }
    Ok(())
}
