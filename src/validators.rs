//! Constraint checks over schedules.
//!
//! Every check returns a [`ValidationReport`] listing the violations it found,
//! each tied to a round and/or team. Malformed input is reported the same way;
//! nothing here panics or returns an error.

use crate::schedule::{Role, Schedule};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Default bound on consecutive away games
pub const DEFAULT_MAX_CONSECUTIVE_AWAY: usize = 3;

/// Largest tolerated |home − away| per team
pub const MAX_HOME_AWAY_DIFFERENCE: usize = 1;

/// A single broken rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    EmptySchedule,
    UnknownTeam { round: usize, slot: usize, team: usize },
    DuplicateTeam { round: usize, team: usize },
    SelfMatch { round: usize, slot: usize, team: usize },
    ConsecutiveAway { team: usize, start_round: usize, length: usize, limit: usize },
    /// `round` holds (home, away) and `round + 1` holds (away, home)
    Repeater { round: usize, home: usize, away: usize },
    HomeAwayImbalance { team: usize, home: usize, away: usize },
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Violation::EmptySchedule => write!(f, "Schedule is empty"),
            Violation::UnknownTeam { round, slot, team } => {
                write!(f, "Round {}, slot {}: invalid team id {}", round, slot, team)
            }
            Violation::DuplicateTeam { round, team } => {
                write!(f, "Round {}: team {} appears multiple times", round, team)
            }
            Violation::SelfMatch { round, slot, team } => {
                write!(f, "Round {}, slot {}: team {} cannot play itself", round, slot, team)
            }
            Violation::ConsecutiveAway { team, start_round, length, limit } => write!(
                f,
                "Team {}: {} consecutive away games starting at round {} (max allowed: {})",
                team, length, start_round, limit
            ),
            Violation::Repeater { round, home, away } => write!(
                f,
                "Repeater: round {} has ({}, {}) and round {} has ({}, {})",
                round,
                home,
                away,
                round + 1,
                away,
                home
            ),
            Violation::HomeAwayImbalance { team, home, away } => write!(
                f,
                "Team {}: home/away imbalance (home: {}, away: {}, difference: {})",
                team,
                home,
                away,
                home.abs_diff(away)
            ),
        }
    }
}

/// Outcome of one or more checks
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty()
    }

    /// Human-readable descriptions, in detection order
    pub fn reasons(&self) -> Vec<String> {
        self.violations.iter().map(|v| v.to_string()).collect()
    }

    pub fn merge(&mut self, other: ValidationReport) {
        self.violations.extend(other.violations);
    }
}

/// A rule a schedule may satisfy or break
pub trait Constraint {
    fn check(&self, schedule: &Schedule) -> ValidationReport;
    fn name(&self) -> &str;
}

/// Ids in range, no team twice in a round, nobody playing itself
pub struct StructuralValidity {
    pub team_count: usize,
}

impl Constraint for StructuralValidity {
    fn check(&self, schedule: &Schedule) -> ValidationReport {
        let mut violations = Vec::new();

        if schedule.is_empty() {
            violations.push(Violation::EmptySchedule);
            return ValidationReport { violations };
        }

        for (round_idx, round) in schedule.rounds.iter().enumerate() {
            let mut seen = HashSet::new();
            for (slot_idx, slot) in round.slots.iter().enumerate() {
                for team in slot.teams() {
                    if team >= self.team_count {
                        violations.push(Violation::UnknownTeam { round: round_idx, slot: slot_idx, team });
                    }
                    if !seen.insert(team) {
                        violations.push(Violation::DuplicateTeam { round: round_idx, team });
                    }
                }
                if let Some((home, away)) = slot.pairing() {
                    if home == away {
                        violations.push(Violation::SelfMatch { round: round_idx, slot: slot_idx, team: home });
                    }
                }
            }
        }

        ValidationReport { violations }
    }

    fn name(&self) -> &str {
        "StructuralValidity"
    }
}

/// No team plays more than `limit` away games in a row.
///
/// Home games and byes both end a streak. Each offending streak is reported
/// once, with the round it started in.
pub struct MaxConsecutiveAway {
    pub limit: usize,
}

impl Default for MaxConsecutiveAway {
    fn default() -> Self {
        MaxConsecutiveAway { limit: DEFAULT_MAX_CONSECUTIVE_AWAY }
    }
}

impl Constraint for MaxConsecutiveAway {
    fn check(&self, schedule: &Schedule) -> ValidationReport {
        let mut violations = Vec::new();

        let teams: BTreeSet<usize> = schedule.rounds.iter().flat_map(|r| r.teams()).collect();

        for team in teams {
            let mut streak = 0;
            let mut start_round = 0;

            for (round_idx, round) in schedule.rounds.iter().enumerate() {
                if let Role::Away(_) = round.role_of(team) {
                    if streak == 0 {
                        start_round = round_idx;
                    }
                    streak += 1;
                } else {
                    if streak > self.limit {
                        violations.push(Violation::ConsecutiveAway {
                            team,
                            start_round,
                            length: streak,
                            limit: self.limit,
                        });
                    }
                    streak = 0;
                }
            }

            if streak > self.limit {
                violations.push(Violation::ConsecutiveAway {
                    team,
                    start_round,
                    length: streak,
                    limit: self.limit,
                });
            }
        }

        ValidationReport { violations }
    }

    fn name(&self) -> &str {
        "MaxConsecutiveAway"
    }
}

/// A fixture must not be followed by its reverse in the next round
pub struct NoImmediateRepeat;

impl Constraint for NoImmediateRepeat {
    fn check(&self, schedule: &Schedule) -> ValidationReport {
        let mut violations = Vec::new();

        for (round_idx, pair) in schedule.rounds.windows(2).enumerate() {
            let current: HashSet<(usize, usize)> = pair[0].matches().collect();
            for (home, away) in pair[1].matches() {
                if current.contains(&(away, home)) {
                    violations.push(Violation::Repeater { round: round_idx, home: away, away: home });
                }
            }
        }

        ValidationReport { violations }
    }

    fn name(&self) -> &str {
        "NoImmediateRepeat"
    }
}

/// Each team's home and away totals differ by at most one
pub struct HomeAwayBalance {
    pub team_count: usize,
}

impl Constraint for HomeAwayBalance {
    fn check(&self, schedule: &Schedule) -> ValidationReport {
        let violations = schedule
            .home_away_counts(self.team_count)
            .into_iter()
            .enumerate()
            .filter(|(_, (home, away))| home.abs_diff(*away) > MAX_HOME_AWAY_DIFFERENCE)
            .map(|(team, (home, away))| Violation::HomeAwayImbalance { team, home, away })
            .collect();

        ValidationReport { violations }
    }

    fn name(&self) -> &str {
        "HomeAwayBalance"
    }
}

/// Ordered collection of constraints
pub struct ValidatorSuite {
    constraints: Vec<Box<dyn Constraint + Send + Sync>>,
}

impl ValidatorSuite {
    pub fn new() -> Self {
        ValidatorSuite { constraints: Vec::new() }
    }

    /// The four tournament rules
    pub fn standard(team_count: usize, max_consecutive_away: usize) -> Self {
        let constraints: Vec<Box<dyn Constraint + Send + Sync>> = vec![
            Box::new(StructuralValidity { team_count }),
            Box::new(MaxConsecutiveAway { limit: max_consecutive_away }),
            Box::new(NoImmediateRepeat),
            Box::new(HomeAwayBalance { team_count }),
        ];

        ValidatorSuite { constraints }
    }

    pub fn add_constraint<C: Constraint + Send + Sync + 'static>(&mut self, constraint: C) {
        self.constraints.push(Box::new(constraint));
    }

    /// Run every constraint and collect all violations
    pub fn validate(&self, schedule: &Schedule) -> ValidationReport {
        let mut report = ValidationReport::default();
        for constraint in &self.constraints {
            report.merge(constraint.check(schedule));
        }
        report
    }

    /// Stops at the first failing constraint
    pub fn is_satisfied(&self, schedule: &Schedule) -> bool {
        self.constraints.iter().all(|c| c.check(schedule).is_ok())
    }

    pub fn names(&self) -> Vec<&str> {
        self.constraints.iter().map(|c| c.name()).collect()
    }
}

impl Default for ValidatorSuite {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the full suite for `team_count` teams and the given away-streak bound
pub fn validate(schedule: &Schedule, team_count: usize, max_consecutive_away: usize) -> ValidationReport {
    ValidatorSuite::standard(team_count, max_consecutive_away).validate(schedule)
}
