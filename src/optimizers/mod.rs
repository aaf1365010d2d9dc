//! Local search over schedules.
//!
//! Every optimizer runs the same trial pipeline: draw a move kind, draw its
//! operands, apply the move in place, optionally gate the candidate through
//! the validator suite, then score it with the travel evaluator. The
//! optimizers differ only in how they decide to keep or revert a scored
//! candidate and in when they stop.

pub mod greedy_swap;
pub mod hill_climbing;
pub mod simulated_annealing;

pub use greedy_swap::*;
pub use hill_climbing::*;
pub use simulated_annealing::*;

use crate::distance::DistanceMatrix;
use crate::error::{Error, Result};
use crate::moves::{Move, MoveKind};
use crate::schedule::Schedule;
use crate::travel::total_travel;
use crate::validators::ValidatorSuite;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A candidate must beat the reference score by more than this to count as better
pub const IMPROVEMENT_TOLERANCE: f64 = 1e-6;

/// One new best-ever score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    pub iteration: usize,
    /// Previous best minus new best, always positive
    pub delta: f64,
}

/// What happened during one optimizer run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    pub strategy: String,
    pub iterations: usize,
    pub elapsed: Duration,
    pub improvements: Vec<Improvement>,
    /// Candidates that became the current schedule
    pub accepted: usize,
    /// Trials whose move could not be applied or had no operands
    pub infeasible: usize,
    pub rejected_by_validation: usize,
    /// Only set by simulated annealing
    pub final_temperature: Option<f64>,
}

impl Telemetry {
    pub fn new(strategy: &str) -> Self {
        Telemetry {
            strategy: strategy.to_string(),
            iterations: 0,
            elapsed: Duration::ZERO,
            improvements: Vec::new(),
            accepted: 0,
            infeasible: 0,
            rejected_by_validation: 0,
            final_temperature: None,
        }
    }

    /// Sum of all recorded improvement deltas
    pub fn total_improvement(&self) -> f64 {
        self.improvements.iter().map(|i| i.delta).sum()
    }
}

/// Best schedule found, its total travel and the run telemetry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub schedule: Schedule,
    pub score: f64,
    pub baseline_score: f64,
    pub telemetry: Telemetry,
}

/// Common interface for the schedule optimizers
pub trait Optimizer {
    fn optimize(&self, schedule: &Schedule, matrix: &DistanceMatrix, seed: u64) -> OptimizationResult;
    fn name(&self) -> &str;
}

/// Which optimizer to run, with its parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Strategy {
    HillClimbing(HillClimbingConfig),
    SimulatedAnnealing(AnnealingConfig),
    GreedySwap(GreedySwapConfig),
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::HillClimbing(_) => "HillClimbing",
            Strategy::SimulatedAnnealing(_) => "SimulatedAnnealing",
            Strategy::GreedySwap(_) => "GreedySwap",
        }
    }

    /// Reject parameter sets the optimizers cannot run with
    pub fn validate(&self) -> Result<()> {
        match self {
            Strategy::HillClimbing(config) => check_moves(&config.moves),
            Strategy::SimulatedAnnealing(config) => {
                check_moves(&config.moves)?;
                if !(config.cooling_rate > 0.0 && config.cooling_rate < 1.0) {
                    return Err(Error::invalid_input(format!(
                        "cooling rate must lie in (0, 1), got {}",
                        config.cooling_rate
                    )));
                }
                if !config.initial_temperature.is_finite() || config.initial_temperature < 0.0 {
                    return Err(Error::invalid_input(format!(
                        "initial temperature must be finite and non-negative, got {}",
                        config.initial_temperature
                    )));
                }
                Ok(())
            }
            Strategy::GreedySwap(_) => Ok(()),
        }
    }

    pub fn optimizer(&self) -> Box<dyn Optimizer> {
        match self {
            Strategy::HillClimbing(config) => Box::new(HillClimbing::new(config.clone())),
            Strategy::SimulatedAnnealing(config) => Box::new(SimulatedAnnealing::new(config.clone())),
            Strategy::GreedySwap(config) => Box::new(GreedySwap::new(config.clone())),
        }
    }
}

impl Default for Strategy {
    fn default() -> Self {
        Strategy::HillClimbing(HillClimbingConfig::default())
    }
}

fn check_moves(moves: &[MoveKind]) -> Result<()> {
    if moves.is_empty() {
        return Err(Error::invalid_input("move set must not be empty"));
    }
    Ok(())
}

/// Improve `schedule` with the given strategy.
///
/// Fails only on bad parameters or when the schedule names teams the
/// distance matrix does not cover.
pub fn optimize(
    schedule: &Schedule,
    matrix: &DistanceMatrix,
    strategy: &Strategy,
    seed: u64,
) -> Result<OptimizationResult> {
    strategy.validate()?;

    let teams = schedule.team_count_hint();
    if teams > matrix.len() {
        return Err(Error::invalid_input(format!(
            "schedule references {} teams but the distance matrix covers {}",
            teams,
            matrix.len()
        )));
    }

    Ok(strategy.optimizer().optimize(schedule, matrix, seed))
}

/// Current and best-ever schedules of a running search
pub(crate) struct SearchState {
    pub current: Schedule,
    pub current_score: f64,
    pub best: Schedule,
    pub best_score: f64,
}

impl SearchState {
    pub fn new(schedule: &Schedule, matrix: &DistanceMatrix) -> Self {
        let score = total_travel(schedule, matrix);
        SearchState {
            current: schedule.clone(),
            current_score: score,
            best: schedule.clone(),
            best_score: score,
        }
    }

    /// Make the last scored candidate current and update the best-ever
    /// schedule if it beats it by the tolerance
    pub fn accept(&mut self, score: f64, iteration: usize, telemetry: &mut Telemetry) {
        self.current_score = score;
        telemetry.accepted += 1;

        if score < self.best_score - IMPROVEMENT_TOLERANCE {
            telemetry.improvements.push(Improvement { iteration, delta: self.best_score - score });
            log::debug!(
                "[{}] iteration {}: best {:.3} -> {:.3}",
                telemetry.strategy,
                iteration,
                self.best_score,
                score
            );
            self.best_score = score;
            self.best = self.current.clone();
        }
    }

    pub fn finish(self, baseline_score: f64, telemetry: Telemetry) -> OptimizationResult {
        OptimizationResult { schedule: self.best, score: self.best_score, baseline_score, telemetry }
    }
}

/// Outcome of a single trial
pub(crate) enum Trial {
    /// Nothing changed; the trial is counted in the telemetry
    Skipped,
    /// The move has been applied to the current schedule and scored; the
    /// caller either keeps it or calls `Move::revert`
    Scored { mv: Move, score: f64 },
}

/// Apply `mv` to the current schedule, run the validation gate and score it
pub(crate) fn try_move(
    state: &mut SearchState,
    mv: Move,
    gate: Option<&ValidatorSuite>,
    matrix: &DistanceMatrix,
    telemetry: &mut Telemetry,
) -> Trial {
    if !mv.apply(&mut state.current) {
        telemetry.infeasible += 1;
        return Trial::Skipped;
    }

    if let Some(suite) = gate {
        if !suite.is_satisfied(&state.current) {
            mv.revert(&mut state.current);
            telemetry.rejected_by_validation += 1;
            return Trial::Skipped;
        }
    }

    let score = total_travel(&state.current, matrix);
    Trial::Scored { mv, score }
}

/// Draw a move kind and operands, then run [`try_move`]
pub(crate) fn random_trial<R: Rng + ?Sized>(
    state: &mut SearchState,
    kinds: &[MoveKind],
    rng: &mut R,
    gate: Option<&ValidatorSuite>,
    matrix: &DistanceMatrix,
    telemetry: &mut Telemetry,
) -> Trial {
    let Some(&kind) = kinds.choose(rng) else {
        return Trial::Skipped;
    };
    let Some(mv) = Move::sample(kind, &state.current, rng) else {
        telemetry.infeasible += 1;
        return Trial::Skipped;
    };
    try_move(state, mv, gate, matrix, telemetry)
}

/// Validation gate for `matrix.len()` teams, warning when the baseline
/// already fails it
pub(crate) fn build_gate(
    enabled: bool,
    schedule: &Schedule,
    matrix: &DistanceMatrix,
    max_consecutive_away: usize,
    strategy: &str,
) -> Option<ValidatorSuite> {
    if !enabled {
        return None;
    }
    let suite = ValidatorSuite::standard(matrix.len(), max_consecutive_away);
    let report = suite.validate(schedule);
    if !report.is_ok() {
        log::warn!(
            "[{}] baseline violates {} constraint(s); only valid candidates will be accepted",
            strategy,
            report.violations.len()
        );
    }
    Some(suite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::build_balanced_schedule;
    use crate::team::{generate_teams, TeamGenerationConfig};

    fn instance(n: usize) -> (Schedule, DistanceMatrix) {
        let teams = generate_teams(n, &TeamGenerationConfig::default(), 7).unwrap();
        (build_balanced_schedule(n).unwrap(), DistanceMatrix::from_teams(&teams))
    }

    #[test]
    fn test_strategy_validation() {
        let mut annealing = AnnealingConfig::default();
        annealing.cooling_rate = 1.0;
        assert!(Strategy::SimulatedAnnealing(annealing.clone()).validate().is_err());

        annealing.cooling_rate = 0.9;
        annealing.initial_temperature = -1.0;
        assert!(Strategy::SimulatedAnnealing(annealing).validate().is_err());

        let mut climbing = HillClimbingConfig::default();
        climbing.moves.clear();
        assert!(Strategy::HillClimbing(climbing).validate().is_err());

        assert!(Strategy::default().validate().is_ok());
    }

    #[test]
    fn test_optimize_rejects_small_matrix() {
        let (schedule, _) = instance(6);
        let (_, small) = instance(4);
        assert!(optimize(&schedule, &small, &Strategy::default(), 1).is_err());

        let huge = Schedule::from_pairs(vec![vec![(0, usize::MAX)]]);
        assert!(matches!(
            optimize(&huge, &small, &Strategy::default(), 1),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_optimize_dispatches_by_strategy() {
        let (schedule, matrix) = instance(6);
        let strategies = [
            Strategy::HillClimbing(HillClimbingConfig::with_params(200, 50)),
            Strategy::SimulatedAnnealing(AnnealingConfig::with_params(1.0, 0.99, 200)),
            Strategy::GreedySwap(GreedySwapConfig::default()),
        ];

        for strategy in &strategies {
            let result = optimize(&schedule, &matrix, strategy, 42).unwrap();
            assert_eq!(result.telemetry.strategy, strategy.name());
            assert!(result.score <= result.baseline_score);
            assert!((total_travel(&result.schedule, &matrix) - result.score).abs() < 1e-6);
        }
    }
}
