//! Exhaustive venue assignment for small tournaments.
//!
//! Keeps the round structure and pairings of the input schedule and tries
//! every home/away orientation of its matches, walking the 2^M assignments
//! in Gray-code order so each step flips a single venue in place.

use super::{ExactOutcome, ExactSolver, Objective};
use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::schedule::Schedule;
use crate::validators::{ValidatorSuite, DEFAULT_MAX_CONSECUTIVE_AWAY};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Hard cap on enumerated matches (2^24 assignments)
pub const MAX_ENUMERATED_MATCHES: usize = 24;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExhaustiveConfig {
    pub max_teams: usize,
    pub max_consecutive_away: usize,
    pub objective: Objective,
}

impl Default for ExhaustiveConfig {
    fn default() -> Self {
        ExhaustiveConfig {
            max_teams: 6,
            max_consecutive_away: DEFAULT_MAX_CONSECUTIVE_AWAY,
            objective: Objective::Chained,
        }
    }
}

pub struct ExhaustiveVenueSolver {
    pub config: ExhaustiveConfig,
}

impl ExhaustiveVenueSolver {
    pub fn new(config: ExhaustiveConfig) -> Self {
        ExhaustiveVenueSolver { config }
    }
}

impl Default for ExhaustiveVenueSolver {
    fn default() -> Self {
        Self::new(ExhaustiveConfig::default())
    }
}

impl ExactSolver for ExhaustiveVenueSolver {
    fn name(&self) -> &str {
        "ExhaustiveVenue"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn solve(&self, schedule: &Schedule, matrix: &DistanceMatrix) -> Result<ExactOutcome> {
        let start = Instant::now();
        let teams = matrix.len();
        if teams > self.config.max_teams {
            return Err(Error::InstanceTooLarge { teams, limit: self.config.max_teams });
        }
        if schedule.team_count_hint() > teams {
            return Err(Error::invalid_input(format!(
                "schedule references {} teams but the distance matrix covers {}",
                schedule.team_count_hint(),
                teams
            )));
        }

        let positions: Vec<(usize, usize)> = schedule
            .rounds
            .iter()
            .enumerate()
            .flat_map(|(r, round)| {
                round
                    .slots
                    .iter()
                    .enumerate()
                    .filter(|(_, slot)| slot.is_match())
                    .map(move |(i, _)| (r, i))
            })
            .collect();
        if positions.len() > MAX_ENUMERATED_MATCHES {
            return Err(Error::TooManyMatches { matches: positions.len(), limit: MAX_ENUMERATED_MATCHES });
        }

        let suite = ValidatorSuite::standard(teams, self.config.max_consecutive_away);
        let objective = self.config.objective;
        let mut candidate = schedule.clone();
        let mut best: Option<(Schedule, f64)> = None;
        let total: u64 = 1 << positions.len();

        for step in 0..total {
            if step > 0 {
                let (r, i) = positions[step.trailing_zeros() as usize];
                candidate.rounds[r].slots[i].flip();
            }
            if !suite.is_satisfied(&candidate) {
                continue;
            }
            let value = objective.evaluate(&candidate, matrix);
            if best.as_ref().map_or(true, |(_, b)| value < *b) {
                best = Some((candidate.clone(), value));
            }
        }

        let elapsed = start.elapsed();
        log::info!(
            "[{}] {} assignments of {} matches in {:.3}s, best {} objective {}",
            self.name(),
            total,
            positions.len(),
            elapsed.as_secs_f64(),
            objective,
            best.as_ref().map_or("none".to_string(), |(_, v)| format!("{:.3}", v))
        );

        let (schedule, objective_value) = match best {
            Some((s, v)) => (Some(s), v),
            None => (None, f64::INFINITY),
        };
        Ok(ExactOutcome {
            schedule,
            objective_value,
            objective,
            proven_optimal: true,
            explored: total,
            elapsed,
        })
    }
}
