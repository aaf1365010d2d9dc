//! Deterministic first-improvement search over single-slot swaps.
//!
//! Scans every `(r1 < r2, i1, i2)` slot exchange in order, applies the first
//! feasible one that lowers total travel, and restarts the scan. Stops when
//! a full scan finds nothing. The seed is ignored.

use super::{
    build_gate, try_move, OptimizationResult, Optimizer, SearchState, Telemetry, Trial,
    IMPROVEMENT_TOLERANCE,
};
use crate::distance::DistanceMatrix;
use crate::moves::Move;
use crate::schedule::Schedule;
use crate::validators::DEFAULT_MAX_CONSECUTIVE_AWAY;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GreedySwapConfig {
    pub validate: bool,
    pub max_consecutive_away: usize,
}

impl Default for GreedySwapConfig {
    fn default() -> Self {
        GreedySwapConfig { validate: false, max_consecutive_away: DEFAULT_MAX_CONSECUTIVE_AWAY }
    }
}

pub struct GreedySwap {
    pub config: GreedySwapConfig,
}

impl GreedySwap {
    pub fn new(config: GreedySwapConfig) -> Self {
        GreedySwap { config }
    }
}

impl Default for GreedySwap {
    fn default() -> Self {
        Self::new(GreedySwapConfig::default())
    }
}

/// Every single-slot exchange between two distinct rounds, in scan order
fn swap_candidates(schedule: &Schedule) -> Vec<Move> {
    let rounds = &schedule.rounds;
    let mut candidates = Vec::new();
    for r1 in 0..rounds.len() {
        for r2 in r1 + 1..rounds.len() {
            for i1 in 0..rounds[r1].len() {
                for i2 in 0..rounds[r2].len() {
                    candidates.push(Move::SwapMatches { r1, i1, r2, i2 });
                }
            }
        }
    }
    candidates
}

impl Optimizer for GreedySwap {
    fn optimize(&self, schedule: &Schedule, matrix: &DistanceMatrix, _seed: u64) -> OptimizationResult {
        let start = Instant::now();
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

        let mut improved = true;
        while improved {
            improved = false;
            for mv in swap_candidates(&state.current) {
                let iteration = telemetry.iterations;
                telemetry.iterations += 1;

                let trial = try_move(&mut state, mv, gate.as_ref(), matrix, &mut telemetry);
                let Trial::Scored { mv, score } = trial else {
                    continue;
                };
                if score < state.current_score - IMPROVEMENT_TOLERANCE {
                    state.accept(score, iteration, &mut telemetry);
                    improved = true;
                    break;
                }
                mv.revert(&mut state.current);
            }
        }

        telemetry.elapsed = start.elapsed();
        log::info!(
            "[{}] {:.3} -> {:.3} after {} candidates ({} swaps applied)",
            self.name(),
            baseline_score,
            state.best_score,
            telemetry.iterations,
            telemetry.accepted
        );

        state.finish(baseline_score, telemetry)
    }

    fn name(&self) -> &str {
        "GreedySwap"
    }
}
