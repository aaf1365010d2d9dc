//! Travel cost evaluation.
//!
//! Teams travel as chained tours: each team starts at its own stadium,
//! moves to wherever it plays each round, stays put on a bye, and goes home
//! after the last round. Consecutive away games are driven directly from one
//! host to the next, so clustering away trips geographically pays off.

use crate::distance::DistanceMatrix;
use crate::schedule::{Round, Schedule};
use serde::{Deserialize, Serialize};

/// Per-team and total travel for one schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelReport {
    /// Kilometers traveled by each team
    pub per_team: Vec<f64>,
    /// Sum of `per_team`
    pub total: f64,
}

/// Simulate every team's movement through the schedule.
///
/// Ids outside the matrix are ignored; the structural validator reports them.
pub fn evaluate_travel(schedule: &Schedule, matrix: &DistanceMatrix) -> TravelReport {
    let n = matrix.len();
    let mut location: Vec<usize> = (0..n).collect();
    let mut per_team = vec![0.0; n];
    let mut venue: Vec<Option<usize>> = vec![None; n];

    for round in &schedule.rounds {
        venue.iter_mut().for_each(|v| *v = None);
        for (home, away) in round.matches() {
            if home < n && away < n {
                venue[home] = Some(home);
                venue[away] = Some(home);
            }
        }

        for team in 0..n {
            if let Some(target) = venue[team] {
                if location[team] != target {
                    per_team[team] += matrix.get(location[team], target);
                    location[team] = target;
                }
            }
        }
    }

    for team in 0..n {
        if location[team] != team {
            per_team[team] += matrix.get(location[team], team);
        }
    }

    let total: f64 = per_team.iter().sum();
    TravelReport { per_team, total }
}

/// Total travel only
#[inline]
pub fn total_travel(schedule: &Schedule, matrix: &DistanceMatrix) -> f64 {
    evaluate_travel(schedule, matrix).total
}

/// Round-trip-free approximation used by the exact backends: each away team
/// is charged the one-way distance from its own stadium to the host's.
///
/// This ignores chaining and the final return home, so it is a different
/// objective from [`evaluate_travel`] and the two must not be compared as if
/// they measured the same thing.
pub fn direct_travel(schedule: &Schedule, matrix: &DistanceMatrix) -> f64 {
    let n = matrix.len();
    schedule
        .rounds
        .iter()
        .flat_map(Round::matches)
        .filter(|&(home, away)| home < n && away < n)
        .map(|(home, away)| matrix.get(away, home))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{build_balanced_schedule, MatchSlot};
    use crate::team::{generate_teams, TeamGenerationConfig};
    use proptest::prelude::*;

    fn two_team_matrix() -> DistanceMatrix {
        DistanceMatrix::from_rows(vec![vec![0.0, 100.0], vec![100.0, 0.0]]).unwrap()
    }

    #[test]
    fn test_two_teams_away_round_trip() {
        let schedule = Schedule::from_pairs(vec![vec![(0, 1)]]);
        let report = evaluate_travel(&schedule, &two_team_matrix());

        assert_eq!(report.per_team, vec![0.0, 200.0]);
        assert_eq!(report.total, 200.0);
    }

    #[test]
    fn test_consecutive_away_games_chain() {
        // team 2 plays at 0 then at 1 without going home in between
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 10.0, 50.0],
            vec![10.0, 0.0, 45.0],
            vec![50.0, 45.0, 0.0],
        ])
        .unwrap();
        let schedule = Schedule::from_pairs(vec![vec![(0, 2)], vec![(1, 2)]]);
        let report = evaluate_travel(&schedule, &matrix);

        assert_eq!(report.per_team[2], 50.0 + 10.0 + 45.0);
        // team 1 is idle in round 0, then home; team 0 stays home
        assert_eq!(report.per_team[0], 0.0);
        assert_eq!(report.per_team[1], 0.0);
    }

    #[test]
    fn test_bye_keeps_location() {
        let matrix = DistanceMatrix::from_rows(vec![
            vec![0.0, 30.0, 40.0],
            vec![30.0, 0.0, 20.0],
            vec![40.0, 20.0, 0.0],
        ])
        .unwrap();
        // team 2 away at 0, idle there, away at 1, then home
        let schedule = Schedule::new(vec![
            Round::new(vec![MatchSlot::new(0, 2), MatchSlot::Idle(1)]),
            Round::new(vec![MatchSlot::new(0, 1), MatchSlot::Idle(2)]),
            Round::new(vec![MatchSlot::new(1, 2), MatchSlot::Idle(0)]),
        ]);
        let report = evaluate_travel(&schedule, &matrix);

        assert_eq!(report.per_team[2], 40.0 + 30.0 + 20.0);
        assert_eq!(report.per_team[1], 30.0 + 30.0);
        assert_eq!(report.per_team[0], 0.0);
    }

    #[test]
    fn test_zero_distance_bye_contributes_nothing() {
        let matrix = DistanceMatrix::from_rows(vec![vec![0.0; 3]; 3]).unwrap();
        let schedule = Schedule::new(vec![
            Round::new(vec![MatchSlot::new(0, 2), MatchSlot::Idle(1)]),
            Round::new(vec![MatchSlot::new(0, 1), MatchSlot::Idle(2)]),
        ]);
        let report = evaluate_travel(&schedule, &matrix);
        assert_eq!(report.per_team[2], 0.0);
        assert_eq!(report.total, 0.0);
    }

    #[test]
    fn test_direct_travel_differs_from_chained() {
        let matrix = two_team_matrix();
        let schedule = Schedule::from_pairs(vec![vec![(0, 1)]]);
        assert_eq!(direct_travel(&schedule, &matrix), 100.0);
        assert_eq!(total_travel(&schedule, &matrix), 200.0);
    }

    proptest! {
        #[test]
        fn prop_evaluation_is_pure(n in 2usize..12, seed in any::<u64>()) {
            let teams = generate_teams(n, &TeamGenerationConfig::default(), seed).unwrap();
            let matrix = DistanceMatrix::from_teams(&teams);
            let schedule = build_balanced_schedule(n).unwrap();

            let first = evaluate_travel(&schedule, &matrix);
            let second = evaluate_travel(&schedule, &matrix);
            prop_assert_eq!(&first, &second);
            prop_assert!(first.total >= 0.0);
            prop_assert!((first.per_team.iter().sum::<f64>() - first.total).abs() < 1e-9);
        }
    }
}
