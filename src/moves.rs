//! Move operators over schedules.
//!
//! A [`Move`] is a small record (kind + operands). `apply` checks that the
//! result keeps every round free of repeated teams and then edits the
//! schedule in place; every move is its own inverse, so `revert` undoes an
//! applied move without keeping a copy of the schedule around.
//!
//! The free functions (`swap_rounds`, `swap_matches`, ...) are the
//! value-semantic form: they leave their input untouched and return a new
//! schedule together with a feasibility flag.

use crate::schedule::{Round, Schedule};
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Kinds of moves an optimizer can draw from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MoveKind {
    SwapRounds,
    SwapMatches,
    FlipVenue,
    SwapPairingSet,
}

impl MoveKind {
    pub const ALL: [MoveKind; 4] = [
        MoveKind::SwapRounds,
        MoveKind::SwapMatches,
        MoveKind::FlipVenue,
        MoveKind::SwapPairingSet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            MoveKind::SwapRounds => "swap-rounds",
            MoveKind::SwapMatches => "swap-matches",
            MoveKind::FlipVenue => "flip-venue",
            MoveKind::SwapPairingSet => "swap-pairing-set",
        }
    }
}

/// A concrete move with its operands
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Move {
    /// Exchange two whole rounds
    SwapRounds { r1: usize, r2: usize },
    /// Exchange slot `i1` of round `r1` with slot `i2` of round `r2`
    SwapMatches { r1: usize, i1: usize, r2: usize, i2: usize },
    /// Swap home and away of one match
    FlipVenue { round: usize, slot: usize },
    /// Exchange several `(slot in r1, slot in r2)` pairs at once
    SwapPairingSet { r1: usize, r2: usize, pairs: Vec<(usize, usize)> },
}

impl Move {
    pub fn kind(&self) -> MoveKind {
        match self {
            Move::SwapRounds { .. } => MoveKind::SwapRounds,
            Move::SwapMatches { .. } => MoveKind::SwapMatches,
            Move::FlipVenue { .. } => MoveKind::FlipVenue,
            Move::SwapPairingSet { .. } => MoveKind::SwapPairingSet,
        }
    }

    /// Whether applying this move to `schedule` is possible and keeps every
    /// round free of repeated teams. Out-of-range operands are infeasible.
    /// Swapping a slot with itself is a feasible no-op; swapping two
    /// different slots of the same round is not.
    pub fn is_feasible(&self, schedule: &Schedule) -> bool {
        let rounds = &schedule.rounds;
        match *self {
            Move::SwapRounds { r1, r2 } => r1 < rounds.len() && r2 < rounds.len(),
            Move::SwapMatches { r1, i1, r2, i2 } => {
                if r1 >= rounds.len() || r2 >= rounds.len() {
                    return false;
                }
                if i1 >= rounds[r1].len() || i2 >= rounds[r2].len() {
                    return false;
                }
                if r1 == r2 {
                    return i1 == i2;
                }
                exchange_is_clean(&rounds[r1], &[i1], &rounds[r2], &[i2])
            }
            Move::FlipVenue { round, slot } => rounds
                .get(round)
                .and_then(|r| r.slots.get(slot))
                .map_or(false, |s| s.is_match()),
            Move::SwapPairingSet { r1, r2, ref pairs } => {
                if pairs.is_empty() || r1 == r2 || r1 >= rounds.len() || r2 >= rounds.len() {
                    return false;
                }
                let out_of_r1: Vec<usize> = pairs.iter().map(|&(i, _)| i).collect();
                let out_of_r2: Vec<usize> = pairs.iter().map(|&(_, j)| j).collect();
                if !distinct_in_range(&out_of_r1, rounds[r1].len())
                    || !distinct_in_range(&out_of_r2, rounds[r2].len())
                {
                    return false;
                }
                exchange_is_clean(&rounds[r1], &out_of_r1, &rounds[r2], &out_of_r2)
            }
        }
    }

    /// Apply in place if feasible; returns whether the schedule changed
    pub fn apply(&self, schedule: &mut Schedule) -> bool {
        if !self.is_feasible(schedule) {
            return false;
        }
        self.exchange(schedule);
        true
    }

    /// Undo a move previously applied with [`Move::apply`]
    pub fn revert(&self, schedule: &mut Schedule) {
        self.exchange(schedule);
    }

    /// Caller guarantees feasibility
    fn exchange(&self, schedule: &mut Schedule) {
        match *self {
            Move::SwapRounds { r1, r2 } => schedule.rounds.swap(r1, r2),
            Move::SwapMatches { r1, i1, r2, i2 } => swap_slots(schedule, r1, i1, r2, i2),
            Move::FlipVenue { round, slot } => {
                schedule.rounds[round].slots[slot].flip();
            }
            Move::SwapPairingSet { r1, r2, ref pairs } => {
                for &(i1, i2) in pairs {
                    swap_slots(schedule, r1, i1, r2, i2);
                }
            }
        }
    }

    /// Draw random operands for `kind` that are in range for `schedule`.
    ///
    /// Returns `None` when the schedule has no room for this kind of move
    /// (fewer than two rounds, empty rounds, no real match to flip). The
    /// result may still be infeasible; `apply` decides.
    pub fn sample<R: Rng + ?Sized>(kind: MoveKind, schedule: &Schedule, rng: &mut R) -> Option<Move> {
        let rounds = &schedule.rounds;
        match kind {
            MoveKind::SwapRounds => {
                let (r1, r2) = two_rounds(rounds.len(), rng)?;
                Some(Move::SwapRounds { r1, r2 })
            }
            MoveKind::SwapMatches => {
                let (r1, r2) = two_rounds(rounds.len(), rng)?;
                if rounds[r1].is_empty() || rounds[r2].is_empty() {
                    return None;
                }
                let i1 = rng.gen_range(0..rounds[r1].len());
                let i2 = rng.gen_range(0..rounds[r2].len());
                Some(Move::SwapMatches { r1, i1, r2, i2 })
            }
            MoveKind::FlipVenue => {
                if rounds.is_empty() {
                    return None;
                }
                let round = rng.gen_range(0..rounds.len());
                let candidates: Vec<usize> = rounds[round]
                    .slots
                    .iter()
                    .enumerate()
                    .filter(|(_, s)| s.is_match())
                    .map(|(i, _)| i)
                    .collect();
                let slot = *candidates.choose(rng)?;
                Some(Move::FlipVenue { round, slot })
            }
            MoveKind::SwapPairingSet => {
                let (r1, r2) = two_rounds(rounds.len(), rng)?;
                if rounds[r1].is_empty() {
                    return None;
                }
                let seed_slot = rng.gen_range(0..rounds[r1].len());
                let pairs = closed_pairing_set(&rounds[r1], &rounds[r2], seed_slot)?;
                Some(Move::SwapPairingSet { r1, r2, pairs })
            }
        }
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Move::SwapRounds { r1, r2 } => write!(f, "swap rounds {} and {}", r1, r2),
            Move::SwapMatches { r1, i1, r2, i2 } => {
                write!(f, "swap slot {}/{} with slot {}/{}", r1, i1, r2, i2)
            }
            Move::FlipVenue { round, slot } => write!(f, "flip venue {}/{}", round, slot),
            Move::SwapPairingSet { r1, r2, pairs } => {
                write!(f, "swap {} slots between rounds {} and {}", pairs.len(), r1, r2)
            }
        }
    }
}

fn two_rounds<R: Rng + ?Sized>(len: usize, rng: &mut R) -> Option<(usize, usize)> {
    if len < 2 {
        return None;
    }
    let picked = rand::seq::index::sample(rng, len, 2);
    Some((picked.index(0), picked.index(1)))
}

fn swap_slots(schedule: &mut Schedule, r1: usize, i1: usize, r2: usize, i2: usize) {
    let first = schedule.rounds[r1].slots[i1];
    schedule.rounds[r1].slots[i1] = schedule.rounds[r2].slots[i2];
    schedule.rounds[r2].slots[i2] = first;
}

fn distinct_in_range(indices: &[usize], len: usize) -> bool {
    let mut seen = HashSet::with_capacity(indices.len());
    indices.iter().all(|&i| i < len && seen.insert(i))
}

/// Teams leaving each round must not collide with the teams that stay in
/// the other round
fn exchange_is_clean(a: &Round, out_of_a: &[usize], b: &Round, out_of_b: &[usize]) -> bool {
    let moving = |round: &Round, out: &[usize]| -> HashSet<usize> {
        out.iter().flat_map(|&i| round.slots[i].teams()).collect()
    };
    let staying = |round: &Round, out: &[usize]| -> HashSet<usize> {
        round
            .slots
            .iter()
            .enumerate()
            .filter(|(i, _)| !out.contains(i))
            .flat_map(|(_, s)| s.teams())
            .collect()
    };

    moving(a, out_of_a).is_disjoint(&staying(b, out_of_b))
        && moving(b, out_of_b).is_disjoint(&staying(a, out_of_a))
}

/// Grow a set of slots starting from `seed_slot` of `a` until the slots
/// picked in `a` and in `b` cover exactly the same teams, then pair them up
/// in index order. `None` if the two sides end up with different slot counts.
fn closed_pairing_set(a: &Round, b: &Round, seed_slot: usize) -> Option<Vec<(usize, usize)>> {
    let mut in_a: BTreeSet<usize> = BTreeSet::from([seed_slot]);
    let mut in_b: BTreeSet<usize> = BTreeSet::new();
    let mut teams: HashSet<usize> = a.slots[seed_slot].teams().collect();

    loop {
        let mut grew = false;
        for (round, picked) in [(b, &mut in_b), (a, &mut in_a)] {
            for (i, slot) in round.slots.iter().enumerate() {
                if !picked.contains(&i) && slot.teams().any(|t| teams.contains(&t)) {
                    picked.insert(i);
                    teams.extend(slot.teams());
                    grew = true;
                }
            }
        }
        if !grew {
            break;
        }
    }

    if in_a.len() != in_b.len() {
        return None;
    }
    Some(in_a.into_iter().zip(in_b).collect())
}

fn apply_to_copy(schedule: &Schedule, mv: &Move) -> (Schedule, bool) {
    let mut candidate = schedule.clone();
    let feasible = mv.apply(&mut candidate);
    (candidate, feasible)
}

/// Exchange two whole rounds. Always feasible for in-range indices.
pub fn swap_rounds(schedule: &Schedule, r1: usize, r2: usize) -> (Schedule, bool) {
    apply_to_copy(schedule, &Move::SwapRounds { r1, r2 })
}

/// Exchange one slot between two different rounds
pub fn swap_matches(schedule: &Schedule, r1: usize, i1: usize, r2: usize, i2: usize) -> (Schedule, bool) {
    apply_to_copy(schedule, &Move::SwapMatches { r1, i1, r2, i2 })
}

/// Swap home and away of one match
pub fn flip_venue(schedule: &Schedule, round: usize, slot: usize) -> (Schedule, bool) {
    apply_to_copy(schedule, &Move::FlipVenue { round, slot })
}

/// Exchange several slot pairs between two rounds at once
pub fn swap_pairing_set(
    schedule: &Schedule,
    r1: usize,
    r2: usize,
    pairs: &[(usize, usize)],
) -> (Schedule, bool) {
    apply_to_copy(schedule, &Move::SwapPairingSet { r1, r2, pairs: pairs.to_vec() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{build_schedule, MatchSlot};
    use crate::validators::StructuralValidity;
    use crate::validators::Constraint;
    use rand_chacha::ChaCha8Rng;

    fn sample_schedule() -> Schedule {
        Schedule::from_pairs(vec![
            vec![(0, 1), (2, 3)],
            vec![(1, 2), (3, 0)],
            vec![(0, 3), (1, 2)],
        ])
    }

    #[test]
    fn test_swap_rounds() {
        let schedule = sample_schedule();
        let (swapped, ok) = swap_rounds(&schedule, 0, 1);

        assert!(ok);
        assert_eq!(swapped.rounds[0], schedule.rounds[1]);
        assert_eq!(swapped.rounds[1], schedule.rounds[0]);
        assert_eq!(swapped.rounds[2], schedule.rounds[2]);

        let (unchanged, ok) = swap_rounds(&schedule, 0, 3);
        assert!(!ok);
        assert_eq!(unchanged, schedule);
    }

    #[test]
    fn test_swap_matches_conflict_detection() {
        let schedule = sample_schedule();
        // (0,1) into round 1 would collide with (3,0)
        let (_, ok) = swap_matches(&schedule, 0, 0, 1, 0);
        assert!(!ok);

        // (2,3) into round 2 would collide with (0,3)
        let (_, ok) = swap_matches(&schedule, 0, 1, 2, 1);
        assert!(!ok);

        let partial = Schedule::from_pairs(vec![vec![(0, 1)], vec![(2, 3)]]);
        let (swapped, ok) = swap_matches(&partial, 0, 0, 1, 0);
        assert!(ok);
        assert_eq!(swapped.rounds[0].slots, vec![MatchSlot::new(2, 3)]);
        assert_eq!(swapped.rounds[1].slots, vec![MatchSlot::new(0, 1)]);
    }

    #[test]
    fn test_swap_matches_rejects_bad_operands() {
        let schedule = sample_schedule();
        assert!(!swap_matches(&schedule, 0, 5, 1, 0).1);
        assert!(!swap_matches(&schedule, 0, 0, 0, 1).1);
        assert!(!swap_matches(&schedule, 9, 0, 1, 0).1);
    }

    #[test]
    fn test_swap_match_with_itself_is_noop() {
        let schedule = sample_schedule();
        let (same, ok) = swap_matches(&schedule, 1, 1, 1, 1);

        assert!(ok);
        assert_eq!(same, schedule);
    }

    #[test]
    fn test_flip_venue() {
        let schedule = sample_schedule();
        let (flipped, ok) = flip_venue(&schedule, 0, 0);

        assert!(ok);
        assert_eq!(flipped.rounds[0].slots[0], MatchSlot::new(1, 0));
        assert_eq!(flipped.rounds[0].slots[1], schedule.rounds[0].slots[1]);
        assert_eq!(schedule.rounds[0].slots[0], MatchSlot::new(0, 1));

        let with_bye = Schedule::new(vec![Round::new(vec![MatchSlot::Idle(0)])]);
        assert!(!flip_venue(&with_bye, 0, 0).1);
    }

    #[test]
    fn test_swap_pairing_set() {
        // rounds 0 and 1 hold the same four teams split differently
        let schedule = Schedule::from_pairs(vec![
            vec![(0, 1), (2, 3), (4, 5)],
            vec![(0, 2), (1, 3), (4, 6)],
        ]);

        let (swapped, ok) = swap_pairing_set(&schedule, 0, 1, &[(0, 0), (1, 1)]);
        assert!(ok);
        assert_eq!(swapped.rounds[0].slots[0], MatchSlot::new(0, 2));
        assert_eq!(swapped.rounds[1].slots[1], MatchSlot::new(2, 3));

        // moving {0,1} alone would clash with (1,3) staying in round 1
        assert!(!swap_pairing_set(&schedule, 0, 1, &[(0, 0)]).1);
        // duplicated indices are malformed
        assert!(!swap_pairing_set(&schedule, 0, 1, &[(0, 0), (0, 1)]).1);
        assert!(!swap_pairing_set(&schedule, 0, 1, &[]).1);
    }

    #[test]
    fn test_revert_restores_schedule() {
        let original = build_schedule(6).unwrap();
        let mut schedule = original.clone();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for _ in 0..200 {
            let kind = *MoveKind::ALL.choose(&mut rng).unwrap();
            if let Some(mv) = Move::sample(kind, &schedule, &mut rng) {
                if mv.apply(&mut schedule) {
                    mv.revert(&mut schedule);
                }
                assert_eq!(schedule, original, "revert failed for {}", mv);
            }
        }
    }

    #[test]
    fn test_sampled_pairing_sets_are_feasible() {
        let mut schedule = build_schedule(8).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let structural = StructuralValidity { team_count: 8 };
        let mut applied = 0;

        for _ in 0..200 {
            if let Some(mv) = Move::sample(MoveKind::SwapPairingSet, &schedule, &mut rng) {
                assert!(mv.is_feasible(&schedule));
                assert!(mv.apply(&mut schedule));
                applied += 1;
            }
            assert!(structural.check(&schedule).is_ok());
        }

        assert!(applied > 0);
        assert!(schedule.is_single_round_robin(8));
    }

    #[test]
    fn test_sampling_needs_two_rounds() {
        let schedule = Schedule::from_pairs(vec![vec![(0, 1)]]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(Move::sample(MoveKind::SwapRounds, &schedule, &mut rng).is_none());
        assert!(Move::sample(MoveKind::SwapMatches, &schedule, &mut rng).is_none());
        assert!(Move::sample(MoveKind::FlipVenue, &schedule, &mut rng).is_some());
    }
}
