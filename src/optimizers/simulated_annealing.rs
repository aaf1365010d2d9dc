//! Simulated annealing with geometric cooling.
//!
//! Uses the same trial pipeline as hill climbing but accepts worse
//! candidates with probability `exp(-delta / T)`. The temperature is
//! multiplied by `cooling_rate` after every iteration, skipped trials
//! included, and the run always uses its whole iteration budget.

use super::{build_gate, random_trial, OptimizationResult, Optimizer, SearchState, Telemetry, Trial};
use crate::distance::DistanceMatrix;
use crate::moves::MoveKind;
use crate::schedule::Schedule;
use crate::validators::DEFAULT_MAX_CONSECUTIVE_AWAY;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Annealing parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnealingConfig {
    pub initial_temperature: f64,
    /// Multiplier applied to the temperature each iteration, in (0, 1)
    pub cooling_rate: f64,
    pub max_iterations: usize,
    pub validate: bool,
    pub max_consecutive_away: usize,
    pub moves: Vec<MoveKind>,
}

impl Default for AnnealingConfig {
    fn default() -> Self {
        AnnealingConfig {
            initial_temperature: 1.0,
            cooling_rate: 0.995,
            max_iterations: 10000,
            validate: true,
            max_consecutive_away: DEFAULT_MAX_CONSECUTIVE_AWAY,
            moves: MoveKind::ALL.to_vec(),
        }
    }
}

impl AnnealingConfig {
    pub fn with_params(initial_temperature: f64, cooling_rate: f64, max_iterations: usize) -> Self {
        AnnealingConfig { initial_temperature, cooling_rate, max_iterations, ..Default::default() }
    }
}

/// Metropolis acceptance: always downhill, uphill with probability `exp(-delta / T)`
#[inline]
pub fn metropolis_accepts<R: Rng + ?Sized>(delta: f64, temperature: f64, rng: &mut R) -> bool {
    if delta < 0.0 {
        return true;
    }
    temperature > 0.0 && rng.gen::<f64>() < (-delta / temperature).exp()
}

pub struct SimulatedAnnealing {
    pub config: AnnealingConfig,
}

impl SimulatedAnnealing {
    pub fn new(config: AnnealingConfig) -> Self {
        SimulatedAnnealing { config }
    }
}

impl Default for SimulatedAnnealing {
    fn default() -> Self {
        Self::new(AnnealingConfig::default())
    }
}

impl Optimizer for SimulatedAnnealing {
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
        let mut temperature = self.config.initial_temperature;

        log::debug!(
            "[{}] start: baseline {:.3}, T0 {}, cooling {}, budget {}",
            self.name(),
            baseline_score,
            temperature,
            self.config.cooling_rate,
            self.config.max_iterations
        );

        for iteration in 0..self.config.max_iterations {
            telemetry.iterations += 1;

            let trial = random_trial(
                &mut state,
                &self.config.moves,
                &mut rng,
                gate.as_ref(),
                matrix,
                &mut telemetry,
            );
            if let Trial::Scored { mv, score } = trial {
                let delta = score - state.current_score;
                if metropolis_accepts(delta, temperature, &mut rng) {
                    state.accept(score, iteration, &mut telemetry);
                } else {
                    mv.revert(&mut state.current);
                }
            }

            temperature *= self.config.cooling_rate;
        }

        telemetry.elapsed = start.elapsed();
        telemetry.final_temperature = Some(temperature);
        log::info!(
            "[{}] {:.3} -> {:.3} after {} iterations ({} accepted, final T {:.3e}, {:.3}s)",
            self.name(),
            baseline_score,
            state.best_score,
            telemetry.iterations,
            telemetry.accepted,
            temperature,
            telemetry.elapsed.as_secs_f64()
        );

        state.finish(baseline_score, telemetry)
    }

    fn name(&self) -> &str {
        "SimulatedAnnealing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{build_balanced_schedule, build_schedule};
    use crate::team::{generate_teams, TeamGenerationConfig};
    use crate::travel::total_travel;
    use crate::validators::validate;
    use proptest::prelude::*;

    fn matrix_for(n: usize, seed: u64) -> DistanceMatrix {
        let teams = generate_teams(n, &TeamGenerationConfig::default(), seed).unwrap();
        DistanceMatrix::from_teams(&teams)
    }

    #[test]
    fn test_metropolis_rule() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        assert!(metropolis_accepts(-1.0, 0.0, &mut rng));
        assert!(!metropolis_accepts(1.0, 0.0, &mut rng));
        assert!(!metropolis_accepts(1e6, 1e-3, &mut rng));

        let accepted = (0..10_000).filter(|_| metropolis_accepts(1.0, 1.0, &mut rng)).count();
        let rate = accepted as f64 / 10_000.0;
        assert!((rate - (-1.0f64).exp()).abs() < 0.03, "rate = {}", rate);
    }

    #[test]
    fn test_final_temperature_follows_schedule() {
        let n = 6;
        let config = AnnealingConfig::with_params(2.0, 0.5, 10);
        let result = SimulatedAnnealing::new(config).optimize(&build_balanced_schedule(n).unwrap(), &matrix_for(n, 1), 3);

        assert_eq!(result.telemetry.iterations, 10);
        let expected = 2.0 * 0.5f64.powi(10);
        let final_temperature = result.telemetry.final_temperature.unwrap();
        assert!((final_temperature - expected).abs() < 1e-12);
    }

    #[test]
    fn test_validated_annealing_stays_valid() {
        let n = 8;
        let baseline = build_balanced_schedule(n).unwrap();
        let matrix = matrix_for(n, 2);
        let result = SimulatedAnnealing::new(AnnealingConfig::with_params(50.0, 0.99, 2000)).optimize(&baseline, &matrix, 17);

        assert!(validate(&result.schedule, n, 3).is_ok());
        assert!(result.schedule.is_single_round_robin(n));
        assert!((total_travel(&result.schedule, &matrix) - result.score).abs() < 1e-6);
    }

    #[test]
    fn test_same_seed_same_result() {
        let n = 7;
        let baseline = build_balanced_schedule(n).unwrap();
        let matrix = matrix_for(n, 5);
        let optimizer = SimulatedAnnealing::new(AnnealingConfig::with_params(10.0, 0.99, 500));

        let first = optimizer.optimize(&baseline, &matrix, 123);
        let second = optimizer.optimize(&baseline, &matrix, 123);
        assert_eq!(first.schedule, second.schedule);
        assert_eq!(first.telemetry.accepted, second.telemetry.accepted);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_best_never_worse_than_baseline(
            n in 3usize..10,
            iterations in 1usize..300,
            temperature in 0.0f64..500.0,
            seed in any::<u64>(),
            validate_moves in any::<bool>(),
        ) {
            let baseline = build_schedule(n).unwrap();
            let matrix = matrix_for(n, seed);
            let config = AnnealingConfig {
                validate: validate_moves,
                ..AnnealingConfig::with_params(temperature, 0.99, iterations)
            };
            let result = SimulatedAnnealing::new(config).optimize(&baseline, &matrix, seed);

            prop_assert!(result.score <= result.baseline_score);
            prop_assert_eq!(result.baseline_score, total_travel(&baseline, &matrix));
            prop_assert!(result.schedule.is_single_round_robin(n));
        }
    }
}
