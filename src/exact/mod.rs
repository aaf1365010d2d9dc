//! Exact solver backends.
//!
//! Backends sit behind the [`ExactSolver`] capability trait and report
//! whether they can run through [`ExactSolver::is_available`]. Callers that
//! want an exact answer probe first and fall back to the local search
//! optimizers otherwise; nothing else in the crate depends on a backend
//! being present.

mod exhaustive;

pub use exhaustive::*;

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::schedule::Schedule;
use crate::travel::{direct_travel, total_travel};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Objective minimized by an exact backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Objective {
    /// Chained tours, as computed by [`crate::travel::evaluate_travel`]
    Chained,
    /// One-way distance from each away team's stadium to the host, see
    /// [`direct_travel`]
    Direct,
}

impl Objective {
    pub fn evaluate(&self, schedule: &Schedule, matrix: &DistanceMatrix) -> f64 {
        match self {
            Objective::Chained => total_travel(schedule, matrix),
            Objective::Direct => direct_travel(schedule, matrix),
        }
    }
}

impl std::fmt::Display for Objective {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Objective::Chained => write!(f, "chained"),
            Objective::Direct => write!(f, "direct"),
        }
    }
}

/// Result of an exact run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExactOutcome {
    /// `None` when no candidate satisfied the constraints
    pub schedule: Option<Schedule>,
    /// Value of `objective` for `schedule`, infinite when there is none
    pub objective_value: f64,
    pub objective: Objective,
    /// The whole search space was covered
    pub proven_optimal: bool,
    /// Candidates examined
    pub explored: u64,
    pub elapsed: Duration,
}

impl ExactOutcome {
    pub fn is_solved(&self) -> bool {
        self.schedule.is_some()
    }
}

pub trait ExactSolver {
    fn name(&self) -> &str;
    fn is_available(&self) -> bool;
    fn solve(&self, schedule: &Schedule, matrix: &DistanceMatrix) -> Result<ExactOutcome>;
}

/// Placeholder for a backend that is not part of this build
#[derive(Debug, Clone)]
pub struct UnavailableSolver {
    pub name: String,
    pub reason: String,
}

impl UnavailableSolver {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        UnavailableSolver { name: name.into(), reason: reason.into() }
    }
}

impl ExactSolver for UnavailableSolver {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_available(&self) -> bool {
        false
    }

    fn solve(&self, _schedule: &Schedule, _matrix: &DistanceMatrix) -> Result<ExactOutcome> {
        Err(Error::ExactUnavailable(format!("{}: {}", self.name, self.reason)))
    }
}
