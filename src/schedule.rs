//! Schedule representation and the circle-method generator.
//!
//! A schedule is an ordered list of rounds; each round is a list of slots,
//! either a real match (home, away) or an idle marker for the team sitting
//! out that round. Rounds and slots are addressed by index so move operators
//! can exchange them in place.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashSet, VecDeque};

/// One entry of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchSlot {
    /// `away` travels to the stadium of `home`
    Match { home: usize, away: usize },
    /// Team with a bye this round
    Idle(usize),
}

impl MatchSlot {
    pub fn new(home: usize, away: usize) -> Self {
        MatchSlot::Match { home, away }
    }

    /// Team ids occupying this slot
    pub fn teams(&self) -> impl Iterator<Item = usize> {
        let ids = match *self {
            MatchSlot::Match { home, away } => [Some(home), Some(away)],
            MatchSlot::Idle(team) => [Some(team), None],
        };
        ids.into_iter().flatten()
    }

    pub fn involves(&self, team: usize) -> bool {
        self.teams().any(|t| t == team)
    }

    /// `(home, away)` when this is a real match
    pub fn pairing(&self) -> Option<(usize, usize)> {
        match *self {
            MatchSlot::Match { home, away } => Some((home, away)),
            MatchSlot::Idle(_) => None,
        }
    }

    pub fn is_match(&self) -> bool {
        matches!(self, MatchSlot::Match { .. })
    }

    /// Swap home and away; `false` for idle slots
    pub fn flip(&mut self) -> bool {
        match self {
            MatchSlot::Match { home, away } => {
                std::mem::swap(home, away);
                true
            }
            MatchSlot::Idle(_) => false,
        }
    }
}

impl std::fmt::Display for MatchSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchSlot::Match { home, away } => write!(f, "{} vs {}", home, away),
            MatchSlot::Idle(team) => write!(f, "{} idle", team),
        }
    }
}

/// What a team does in a given round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Home,
    /// Away at the stadium of the given host
    Away(usize),
    Idle,
}

/// A set of slots in which no team appears twice
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Round {
    pub slots: Vec<MatchSlot>,
}

impl Round {
    pub fn new(slots: Vec<MatchSlot>) -> Self {
        Round { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Real matches as `(home, away)`
    pub fn matches(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.slots.iter().filter_map(MatchSlot::pairing)
    }

    pub fn idle_teams(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().filter_map(|slot| match *slot {
            MatchSlot::Idle(team) => Some(team),
            MatchSlot::Match { .. } => None,
        })
    }

    /// Every team id occupying a slot, in slot order
    pub fn teams(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots.iter().flat_map(MatchSlot::teams)
    }

    /// Role of `team`; a team missing from every slot is treated as idle
    pub fn role_of(&self, team: usize) -> Role {
        for (home, away) in self.matches() {
            if home == team {
                return Role::Home;
            }
            if away == team {
                return Role::Away(home);
            }
        }
        Role::Idle
    }
}

/// Ordered sequence of rounds
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Schedule {
    pub rounds: Vec<Round>,
}

impl Schedule {
    pub fn new(rounds: Vec<Round>) -> Self {
        Schedule { rounds }
    }

    /// Build a schedule of real matches from `(home, away)` lists
    pub fn from_pairs(rounds: Vec<Vec<(usize, usize)>>) -> Self {
        Schedule {
            rounds: rounds
                .into_iter()
                .map(|r| Round::new(r.into_iter().map(|(h, a)| MatchSlot::new(h, a)).collect()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }

    pub fn num_matches(&self) -> usize {
        self.rounds.iter().map(|r| r.matches().count()).sum()
    }

    /// Smallest team count consistent with the ids present (max id + 1,
    /// saturating at `usize::MAX`)
    pub fn team_count_hint(&self) -> usize {
        self.rounds
            .iter()
            .flat_map(Round::teams)
            .max()
            .map_or(0, |max| max.saturating_add(1))
    }

    /// Number of (home games, away games) per team, ids `>= n` ignored
    pub fn home_away_counts(&self, n: usize) -> Vec<(usize, usize)> {
        let mut counts = vec![(0, 0); n];
        for (home, away) in self.rounds.iter().flat_map(Round::matches) {
            if home < n {
                counts[home].0 += 1;
            }
            if away < n {
                counts[away].1 += 1;
            }
        }
        counts
    }

    /// True when every unordered pair of `0..n` meets exactly once and
    /// nothing else is scheduled
    pub fn is_single_round_robin(&self, n: usize) -> bool {
        let mut seen = HashSet::new();
        for (home, away) in self.rounds.iter().flat_map(Round::matches) {
            if home >= n || away >= n || home == away {
                return false;
            }
            if !seen.insert((home.min(away), home.max(away))) {
                return false;
            }
        }
        seen.len() == n * n.saturating_sub(1) / 2
    }
}

impl std::fmt::Display for Schedule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (index, round) in self.rounds.iter().enumerate() {
            let slots: Vec<String> = round.slots.iter().map(|s| s.to_string()).collect();
            writeln!(f, "Round {}: {}", index + 1, slots.join(", "))?;
        }
        Ok(())
    }
}

/// Circle-method (Berger table) single round robin for `n` teams.
///
/// For odd `n` a bye position is added; whoever is paired with it gets an
/// idle slot. Home and away alternate with round parity. After each round the
/// first position stays fixed and the last one moves to the second position.
pub fn build_schedule(n: usize) -> Result<Schedule> {
    if n == 0 {
        return Err(Error::InvalidTeamCount(n));
    }

    let mut ids: Vec<Option<usize>> = (0..n).map(Some).collect();
    if n % 2 == 1 {
        ids.push(None);
    }
    let m = ids.len();

    let mut rounds = Vec::with_capacity(m - 1);
    for r in 0..m - 1 {
        let mut slots = Vec::with_capacity(m / 2);
        for i in 0..m / 2 {
            match (ids[i], ids[m - 1 - i]) {
                (Some(a), Some(b)) => {
                    if r % 2 == 0 {
                        slots.push(MatchSlot::new(a, b));
                    } else {
                        slots.push(MatchSlot::new(b, a));
                    }
                }
                (Some(team), None) | (None, Some(team)) => slots.push(MatchSlot::Idle(team)),
                (None, None) => {}
            }
        }
        rounds.push(Round::new(slots));

        ids[1..].rotate_right(1);
    }

    Ok(Schedule::new(rounds))
}

/// Circle-method schedule with venues rebalanced so every team's home and
/// away counts differ by at most one
pub fn build_balanced_schedule(n: usize) -> Result<Schedule> {
    let mut schedule = build_schedule(n)?;
    let flips = balance_venues(&mut schedule, n);
    log::debug!("Balanced circle schedule for {} teams with {} venue flips", n, flips);
    Ok(schedule)
}

/// Flip venues along home→away paths from a team with too many home games to
/// a team with more away than home games (or the mirror case) until every
/// team satisfies |home − away| ≤ 1. Returns the number of flips.
///
/// Stops early if no path exists, which only happens for schedules that are
/// not complete round robins.
pub fn balance_venues(schedule: &mut Schedule, n: usize) -> usize {
    let mut flips = 0;

    loop {
        let balance: Vec<i64> = schedule
            .home_away_counts(n)
            .iter()
            .map(|&(h, a)| h as i64 - a as i64)
            .collect();

        // surplus: walk home -> away edges towards a team with negative balance
        let (start, surplus) = match balance.iter().position(|&b| b > 1) {
            Some(t) => (t, true),
            None => match balance.iter().position(|&b| b < -1) {
                Some(t) => (t, false),
                None => return flips,
            },
        };

        let mut adjacency: Vec<Vec<(usize, usize, usize)>> = vec![Vec::new(); n];
        for (r, round) in schedule.rounds.iter().enumerate() {
            for (s, slot) in round.slots.iter().enumerate() {
                if let Some((home, away)) = slot.pairing() {
                    if home >= n || away >= n {
                        continue;
                    }
                    if surplus {
                        adjacency[home].push((away, r, s));
                    } else {
                        adjacency[away].push((home, r, s));
                    }
                }
            }
        }

        let mut previous: Vec<Option<(usize, usize, usize)>> = vec![None; n];
        let mut visited = vec![false; n];
        visited[start] = true;
        let mut queue = VecDeque::from([start]);
        let mut end = None;

        while let Some(u) = queue.pop_front() {
            let wanted = if surplus { balance[u] < 0 } else { balance[u] > 0 };
            if u != start && wanted {
                end = Some(u);
                break;
            }
            for &(v, r, s) in &adjacency[u] {
                if !visited[v] {
                    visited[v] = true;
                    previous[v] = Some((u, r, s));
                    queue.push_back(v);
                }
            }
        }

        let Some(mut v) = end else {
            return flips;
        };
        while let Some((u, r, s)) = previous[v] {
            schedule.rounds[r].slots[s].flip();
            flips += 1;
            v = u;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::validate;
    use proptest::prelude::*;

    fn assert_no_repeats(schedule: &Schedule) {
        for round in &schedule.rounds {
            let mut seen = HashSet::new();
            for team in round.teams() {
                assert!(seen.insert(team), "team {} repeated in a round", team);
            }
        }
    }

    #[test]
    fn test_even_four_teams() {
        let schedule = build_schedule(4).unwrap();
        let expected = Schedule::from_pairs(vec![
            vec![(0, 3), (1, 2)],
            vec![(2, 0), (1, 3)],
            vec![(0, 1), (2, 3)],
        ]);
        assert_eq!(schedule, expected);
        assert!(schedule.is_single_round_robin(4));
    }

    #[test]
    fn test_odd_five_teams_has_one_idle_per_round() {
        let schedule = build_schedule(5).unwrap();
        assert_eq!(schedule.len(), 5);

        let mut idle = Vec::new();
        for round in &schedule.rounds {
            assert_eq!(round.matches().count(), 2);
            let idle_here: Vec<usize> = round.idle_teams().collect();
            assert_eq!(idle_here.len(), 1);
            idle.push(idle_here[0]);
        }
        idle.sort();
        assert_eq!(idle, vec![0, 1, 2, 3, 4]);
        assert_eq!(schedule.rounds[0].slots[0], MatchSlot::Idle(0));
    }

    #[test]
    fn test_single_team_and_zero() {
        let one = build_schedule(1).unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one.rounds[0].slots, vec![MatchSlot::Idle(0)]);
        assert!(matches!(build_schedule(0), Err(Error::InvalidTeamCount(0))));
    }

    #[test]
    fn test_team_count_hint() {
        assert_eq!(build_schedule(6).unwrap().team_count_hint(), 6);
        assert_eq!(Schedule::default().team_count_hint(), 0);
        assert_eq!(Schedule::from_pairs(vec![vec![(0, usize::MAX)]]).team_count_hint(), usize::MAX);
    }

    #[test]
    fn test_raw_schedule_is_unbalanced_for_four() {
        let schedule = build_schedule(4).unwrap();
        assert_eq!(schedule.home_away_counts(4)[3], (0, 3));
    }

    #[test]
    fn test_balanced_schedule_passes_suite() {
        for n in 2..=16 {
            let schedule = build_balanced_schedule(n).unwrap();
            assert!(schedule.is_single_round_robin(n));
            let report = validate(&schedule, n, 3);
            assert!(report.is_ok(), "n={} violations: {:?}", n, report.reasons());
        }
    }

    #[test]
    fn test_balance_keeps_pairings_and_rounds() {
        let raw = build_schedule(8).unwrap();
        let mut balanced = raw.clone();
        let flips = balance_venues(&mut balanced, 8);
        assert!(flips > 0);
        for (a, b) in raw.rounds.iter().zip(&balanced.rounds) {
            for (x, y) in a.slots.iter().zip(&b.slots) {
                let tx: HashSet<usize> = x.teams().collect();
                let ty: HashSet<usize> = y.teams().collect();
                assert_eq!(tx, ty);
            }
        }
    }

    #[test]
    fn test_role_of() {
        let round = Round::new(vec![MatchSlot::new(0, 1), MatchSlot::Idle(2)]);
        assert_eq!(round.role_of(0), Role::Home);
        assert_eq!(round.role_of(1), Role::Away(0));
        assert_eq!(round.role_of(2), Role::Idle);
        assert_eq!(round.role_of(7), Role::Idle);
    }

    proptest! {
        #[test]
        fn prop_circle_method_structure(n in 2usize..40) {
            let schedule = build_schedule(n).unwrap();
            prop_assert!(schedule.is_single_round_robin(n));
            assert_no_repeats(&schedule);

            if n % 2 == 0 {
                prop_assert_eq!(schedule.len(), n - 1);
                for round in &schedule.rounds {
                    prop_assert_eq!(round.matches().count(), n / 2);
                    prop_assert_eq!(round.idle_teams().count(), 0);
                }
            } else {
                prop_assert_eq!(schedule.len(), n);
                let mut idle = HashSet::new();
                for round in &schedule.rounds {
                    prop_assert_eq!(round.matches().count(), (n - 1) / 2);
                    let teams: Vec<usize> = round.idle_teams().collect();
                    prop_assert_eq!(teams.len(), 1);
                    idle.insert(teams[0]);
                }
                prop_assert!(idle.len() > 1);
            }
        }
    }
}
