//! Hill climbing by random sampling.
//!
//! Each iteration tries one random move and keeps it only if total travel
//! drops by more than [`IMPROVEMENT_TOLERANCE`]. The search stops after
//! `max_no_improve` scored candidates in a row fail to improve, or when the
//! iteration budget runs out.

use super::{
    build_gate, random_trial, OptimizationResult, Optimizer, SearchState, Telemetry, Trial,
    IMPROVEMENT_TOLERANCE,
};
use crate::distance::DistanceMatrix;
use crate::moves::MoveKind;
use crate::schedule::Schedule;
use crate::validators::DEFAULT_MAX_CONSECUTIVE_AWAY;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Hill climbing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HillClimbingConfig {
    /// Total iteration budget, skipped trials included
    pub max_iterations: usize,
    /// Consecutive non-improving scored candidates before stopping
    pub max_no_improve: usize,
    /// Gate candidates through the validator suite
    pub validate: bool,
    pub max_consecutive_away: usize,
    /// Move kinds drawn uniformly at random
    pub moves: Vec<MoveKind>,
}

impl Default for HillClimbingConfig {
    fn default() -> Self {
        HillClimbingConfig {
            max_iterations: 1000,
            max_no_improve: 100,
            validate: true,
            max_consecutive_away: DEFAULT_MAX_CONSECUTIVE_AWAY,
            moves: MoveKind::ALL.to_vec(),
        }
    }
}

impl HillClimbingConfig {
    pub fn with_params(max_iterations: usize, max_no_improve: usize) -> Self {
        HillClimbingConfig { max_iterations, max_no_improve, ..Default::default() }
    }
}

pub struct HillClimbing {
    pub config: HillClimbingConfig,
}

impl HillClimbing {
    pub fn new(config: HillClimbingConfig) -> Self {
        HillClimbing { config }
    }
}

impl Default for HillClimbing {
    fn default() -> Self {
        Self::new(HillClimbingConfig::default())
    }
}

impl Optimizer for HillClimbing {
    fn optimize(&self, schedule: &Schedule, matrix: &DistanceMatrix, seed: u64) -> OptimizationResult {
        let start = Instant::now();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut telemetry = Telemetry::new(self.name());
        let gate = build_gate(
            self.config.validate,
            schedule,
            matrix,
            self.config.max_consecutive_away,
            self.name(),
        );

        let mut state = SearchState::new(schedule, matrix);
        let baseline_score = state.current_score;
        let mut no_improve = 0;

        log::debug!(
            "[{}] start: baseline {:.3}, budget {}, patience {}",
            self.name(),
            baseline_score,
            self.config.max_iterations,
            self.config.max_no_improve
        );

        while telemetry.iterations < self.config.max_iterations && no_improve < self.config.max_no_improve {
            let iteration = telemetry.iterations;
            telemetry.iterations += 1;

            let trial = random_trial(
                &mut state,
                &self.config.moves,
                &mut rng,
                gate.as_ref(),
                matrix,
                &mut telemetry,
            );
            let Trial::Scored { mv, score } = trial else {
                continue;
            };

            if score < state.current_score - IMPROVEMENT_TOLERANCE {
                state.accept(score, iteration, &mut telemetry);
                no_improve = 0;
            } else {
                mv.revert(&mut state.current);
                no_improve += 1;
            }
        }

        telemetry.elapsed = start.elapsed();
        log::info!(
            "[{}] {:.3} -> {:.3} after {} iterations ({} improvements, {:.3}s)",
            self.name(),
            baseline_score,
            state.best_score,
            telemetry.iterations,
            telemetry.improvements.len(),
            telemetry.elapsed.as_secs_f64()
        );

        state.finish(baseline_score, telemetry)
    }

    fn name(&self) -> &str {
        "HillClimbing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::build_balanced_schedule;
    use crate::team::{generate_teams, TeamGenerationConfig};
    use crate::travel::total_travel;
    use crate::validators::validate;

    fn instance(n: usize, seed: u64) -> (Schedule, DistanceMatrix) {
        let teams = generate_teams(n, &TeamGenerationConfig::default(), seed).unwrap();
        (build_balanced_schedule(n).unwrap(), DistanceMatrix::from_teams(&teams))
    }

    #[test]
    fn test_validated_search_keeps_schedule_valid() {
        for n in [4, 5, 8, 9] {
            let (baseline, matrix) = instance(n, n as u64);
            assert!(validate(&baseline, n, 3).is_ok());

            let result = HillClimbing::default().optimize(&baseline, &matrix, 42);

            let report = validate(&result.schedule, n, 3);
            assert!(report.is_ok(), "n = {}: {:?}", n, report.reasons());
            assert!(result.schedule.is_single_round_robin(n));
            assert!(result.score <= result.baseline_score);
        }
    }

    #[test]
    fn test_improvements_are_positive_and_sum_up() {
        let (baseline, matrix) = instance(10, 3);
        let result = HillClimbing::default().optimize(&baseline, &matrix, 5);

        assert!(result.telemetry.improvements.iter().all(|i| i.delta > IMPROVEMENT_TOLERANCE));
        let gained = result.baseline_score - result.score;
        assert!((result.telemetry.total_improvement() - gained).abs() < 1e-6);
        assert!((total_travel(&result.schedule, &matrix) - result.score).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_result() {
        let (baseline, matrix) = instance(8, 1);
        let optimizer = HillClimbing::default();
        let first = optimizer.optimize(&baseline, &matrix, 9);
        let second = optimizer.optimize(&baseline, &matrix, 9);

        assert_eq!(first.schedule, second.schedule);
        assert_eq!(first.score, second.score);
        assert_eq!(first.telemetry.iterations, second.telemetry.iterations);
    }

    #[test]
    fn test_stops_on_patience_or_budget() {
        let (baseline, matrix) = instance(6, 2);
        let config = HillClimbingConfig::with_params(50, 5);
        let result = HillClimbing::new(config).optimize(&baseline, &matrix, 0);
        assert!(result.telemetry.iterations <= 50);

        let zero = HillClimbing::new(HillClimbingConfig::with_params(0, 5)).optimize(&baseline, &matrix, 0);
        assert_eq!(zero.telemetry.iterations, 0);
        assert_eq!(zero.schedule, baseline);
    }

    #[test]
    fn test_single_round_schedule_has_nothing_to_swap() {
        let (baseline, matrix) = instance(2, 4);
        let config = HillClimbingConfig {
            moves: vec![MoveKind::SwapRounds, MoveKind::SwapMatches],
            ..HillClimbingConfig::with_params(30, 10)
        };
        let result = HillClimbing::new(config).optimize(&baseline, &matrix, 1);

        assert_eq!(result.telemetry.iterations, 30);
        assert_eq!(result.telemetry.infeasible, 30);
        assert_eq!(result.schedule, baseline);
    }
}
