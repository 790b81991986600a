//! Single-elimination bracket value object
//!
//! A [`Bracket`] is an immutable snapshot. [`Bracket::select`] never
//! touches `self`; it validates the selection and returns a new snapshot,
//! so a rejected selection leaves the caller's bracket exactly as it was.
//!
//! # Pairing policy
//!
//! A pool is paired in order: `(p0, p1), (p2, p3), …`. When the pool is
//! odd, the last candidate holds a bye and advances without playing. The
//! next pool is the bye holder first, then the round's winners in match
//! order. The first slot of any pool of two or more is always paired, so no
//! candidate ever gets two byes in a row.
//!
//! # Phases
//!
//! ```text
//! Seeding ──pair──> InRound ──select──> InRound
//!                      │
//!                      └─round exhausted─> RoundComplete ──2+ left──> InRound (re-seeded)
//!                                                  └────1 left────> Finished
//! ```
//!
//! Snapshots handed out are always `InRound` or `Finished`.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;
use yumcup_common::api::{GameStatus, GameSummary, MatchView};
use yumcup_common::{Candidate, Error, Result};

/// Bracket lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeding,
    InRound,
    RoundComplete,
    Finished,
}

/// One pairwise comparison within a round
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub id: String,
    /// Pool size of the round
    pub round: usize,
    /// 1-based position within the round
    pub match_order: usize,
    pub slot_a: Candidate,
    pub slot_b: Candidate,
}

impl Match {
    fn new(round: usize, match_order: usize, slot_a: Candidate, slot_b: Candidate) -> Self {
        Self {
            id: format!("{}-{}", round, match_order),
            round,
            match_order,
            slot_a,
            slot_b,
        }
    }

    /// Split into (winner, loser) if `winner_id` is one of the two slots
    fn decide(&self, winner_id: &str) -> Option<(&Candidate, &Candidate)> {
        if self.slot_a.id == winner_id {
            Some((&self.slot_a, &self.slot_b))
        } else if self.slot_b.id == winner_id {
            Some((&self.slot_b, &self.slot_a))
        } else {
            None
        }
    }

    pub fn to_view(&self) -> MatchView {
        MatchView {
            id: self.id.clone(),
            round: self.round,
            match_order: self.match_order,
            slot_a: self.slot_a.clone(),
            slot_b: self.slot_b.clone(),
        }
    }
}

/// A match that was just resolved
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub match_id: String,
    pub winner: Candidate,
    pub loser: Candidate,
}

/// What the caller should show next
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    NextMatch(Match),
    Champion(Candidate),
}

/// Result of a successful selection
#[derive(Debug, Clone)]
pub struct Advance {
    pub bracket: Bracket,
    pub resolution: Resolution,
    pub outcome: Outcome,
}

/// Full tournament state for one game
#[derive(Debug, Clone)]
pub struct Bracket {
    game_id: Uuid,
    phase: Phase,
    /// Pool size when the current round started
    round: usize,
    /// 1-based count of rounds played so far
    round_number: usize,
    /// Candidates not yet eliminated, in seeding order
    remaining: Vec<Candidate>,
    /// Unplayed matches of the current round, in play order
    pending: Vec<Match>,
    /// Winners of the current round so far
    completed_winners: Vec<Candidate>,
    bye: Option<Candidate>,
    champion: Option<Candidate>,
    matches_in_round: usize,
    started_at: DateTime<Utc>,
}

impl Bracket {
    /// Seed a new bracket from a candidate pool
    ///
    /// Duplicate ids are collapsed to their first occurrence.
    ///
    /// # Errors
    /// [`Error::InsufficientCandidates`] when fewer than two distinct
    /// candidates remain.
    pub fn start(game_id: Uuid, candidates: Vec<Candidate>) -> Result<Self> {
        let submitted = candidates.len();
        let mut seen = HashSet::new();
        let pool: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();

        if pool.len() != submitted {
            warn!(
                game_id = %game_id,
                submitted,
                distinct = pool.len(),
                "Dropped duplicate candidates while seeding"
            );
        }

        if pool.len() < 2 {
            return Err(Error::InsufficientCandidates(pool.len()));
        }

        let mut bracket = Self {
            game_id,
            phase: Phase::Seeding,
            round: pool.len(),
            round_number: 0,
            remaining: Vec::new(),
            pending: Vec::new(),
            completed_winners: Vec::new(),
            bye: None,
            champion: None,
            matches_in_round: 0,
            started_at: Utc::now(),
        };
        bracket.seed_round(pool);
        Ok(bracket)
    }

    /// Pair `pool` into the next round's matches
    fn seed_round(&mut self, pool: Vec<Candidate>) {
        let round = pool.len();
        let mut pending = Vec::with_capacity(round / 2);
        let mut iter = pool.iter().cloned();
        let mut bye = None;

        while let Some(a) = iter.next() {
            match iter.next() {
                Some(b) => pending.push(Match::new(round, pending.len() + 1, a, b)),
                None => bye = Some(a),
            }
        }

        debug!(
            game_id = %self.game_id,
            from = ?self.phase,
            round,
            matches = pending.len(),
            bye = bye.as_ref().map(|c| c.id.as_str()),
            "Seeded round"
        );

        self.round = round;
        self.round_number += 1;
        self.matches_in_round = pending.len();
        self.pending = pending;
        self.bye = bye;
        self.remaining = pool;
        self.completed_winners.clear();
        self.phase = Phase::InRound;
    }

    /// Resolve the current match in favour of `winner_id`
    ///
    /// Returns the successor snapshot; `self` is unchanged either way.
    ///
    /// # Errors
    /// - [`Error::GameAlreadyComplete`] once a champion exists
    /// - [`Error::InvalidSelection`] when `match_id` is not the current
    ///   match or `winner_id` is not one of its two candidates
    pub fn select(&self, match_id: &str, winner_id: &str) -> Result<Advance> {
        if self.phase == Phase::Finished {
            return Err(Error::GameAlreadyComplete(self.game_id.to_string()));
        }

        let current = self.pending.first().ok_or_else(|| {
            Error::Internal(format!("game {} has no pending match", self.game_id))
        })?;

        if current.id != match_id {
            return Err(Error::InvalidSelection(format!(
                "match {} is not the current match (expected {})",
                match_id, current.id
            )));
        }

        let (winner, loser) = current.decide(winner_id).ok_or_else(|| {
            Error::InvalidSelection(format!(
                "candidate {} is not playing in match {}",
                winner_id, match_id
            ))
        })?;
        let resolution = Resolution {
            match_id: current.id.clone(),
            winner: winner.clone(),
            loser: loser.clone(),
        };

        let mut next = self.clone();
        next.pending.remove(0);
        next.remaining.retain(|c| c.id != resolution.loser.id);
        next.completed_winners.push(resolution.winner.clone());

        let outcome = if let Some(next_match) = next.pending.first() {
            Outcome::NextMatch(next_match.clone())
        } else {
            next.phase = Phase::RoundComplete;
            next.finish_round()?
        };

        Ok(Advance {
            bracket: next,
            resolution,
            outcome,
        })
    }

    /// Leave `RoundComplete` for either the next round or the finish
    fn finish_round(&mut self) -> Result<Outcome> {
        let mut pool = Vec::with_capacity(self.completed_winners.len() + 1);
        pool.extend(self.bye.take());
        pool.append(&mut self.completed_winners);

        if pool.len() == 1 {
            let champion = pool.remove(0);
            debug!(game_id = %self.game_id, champion = %champion.id, "Bracket finished");
            self.remaining = vec![champion.clone()];
            self.champion = Some(champion.clone());
            self.phase = Phase::Finished;
            return Ok(Outcome::Champion(champion));
        }

        self.seed_round(pool);
        self.pending
            .first()
            .cloned()
            .map(Outcome::NextMatch)
            .ok_or_else(|| Error::Internal(format!("game {} re-seeded without a match", self.game_id)))
    }

    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    /// Pool size of the current round
    pub fn round(&self) -> usize {
        self.round
    }

    pub fn round_number(&self) -> usize {
        self.round_number
    }

    pub fn remaining(&self) -> &[Candidate] {
        &self.remaining
    }

    pub fn pending_matches(&self) -> &[Match] {
        &self.pending
    }

    pub fn completed_winners(&self) -> &[Candidate] {
        &self.completed_winners
    }

    pub fn current_match(&self) -> Option<&Match> {
        self.pending.first()
    }

    pub fn bye(&self) -> Option<&Candidate> {
        self.bye.as_ref()
    }

    pub fn champion(&self) -> Option<&Candidate> {
        self.champion.as_ref()
    }

    pub fn matches_in_round(&self) -> usize {
        self.matches_in_round
    }

    pub fn completed_in_round(&self) -> usize {
        self.matches_in_round - self.pending.len()
    }

    /// 1-based position of the current match; resets to 1 each round
    pub fn match_in_round(&self) -> usize {
        if self.is_finished() {
            self.matches_in_round
        } else {
            self.completed_in_round() + 1
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn status(&self) -> GameStatus {
        if self.is_finished() {
            GameStatus::Completed
        } else {
            GameStatus::InProgress
        }
    }

    pub fn summary(&self) -> GameSummary {
        GameSummary {
            game_id: self.game_id.to_string(),
            status: self.status(),
            current_round: self.round,
            round_number: self.round_number,
            match_in_round: self.match_in_round(),
            matches_in_round: self.matches_in_round,
            remaining: self.remaining.len(),
            current_match: self.current_match().map(Match::to_view),
            bye: self.bye.clone(),
            champion: self.champion.clone(),
            started_at: self.started_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(ids: &[&str]) -> Vec<Candidate> {
        ids.iter().map(|id| Candidate::new(*id, id.to_uppercase())).collect()
    }

    fn current(b: &Bracket) -> (String, String, String) {
        let m = b.current_match().expect("pending match");
        (m.id.clone(), m.slot_a.id.clone(), m.slot_b.id.clone())
    }

    /// Always pick slot A; returns the finished bracket and rounds played
    fn play_out(mut b: Bracket) -> (Bracket, usize) {
        let mut guard = 0;
        while !b.is_finished() {
            let (mid, a, _) = current(&b);
            b = b.select(&mid, &a).unwrap().bracket;
            guard += 1;
            assert!(guard < 1000, "bracket did not terminate");
        }
        let rounds = b.round_number();
        (b, rounds)
    }

    #[test]
    fn four_candidate_walkthrough() {
        let b = Bracket::start(Uuid::new_v4(), pool(&["a", "b", "c", "d"])).unwrap();
        assert_eq!(b.round(), 4);
        assert_eq!(current(&b), ("4-1".into(), "a".into(), "b".into()));
        assert_eq!((b.match_in_round(), b.matches_in_round()), (1, 2));

        let adv = b.select("4-1", "a").unwrap();
        assert_eq!(adv.resolution.loser.id, "b");
        let b = adv.bracket;
        assert_eq!(current(&b), ("4-2".into(), "c".into(), "d".into()));
        assert_eq!(b.round(), 4);
        assert_eq!(b.match_in_round(), 2);

        let b = b.select("4-2", "c").unwrap().bracket;
        assert_eq!(b.round(), 2);
        assert_eq!(current(&b), ("2-1".into(), "a".into(), "c".into()));
        assert_eq!((b.match_in_round(), b.matches_in_round()), (1, 1));

        let adv = b.select("2-1", "a").unwrap();
        assert_eq!(adv.outcome, Outcome::Champion(Candidate::new("a", "A")));
        assert_eq!(adv.bracket.champion().map(|c| c.id.as_str()), Some("a"));
        assert!(adv.bracket.pending_matches().is_empty());
        assert_eq!(adv.bracket.remaining().len(), 1);
    }

    #[test]
    fn odd_pool_gives_bye_then_plays_it() {
        let b = Bracket::start(Uuid::new_v4(), pool(&["a", "b", "c"])).unwrap();
        assert_eq!(b.round(), 3);
        assert_eq!(b.bye().map(|c| c.id.as_str()), Some("c"));
        assert_eq!(b.pending_matches().len(), 1);

        let b = b.select("3-1", "b").unwrap().bracket;
        assert_eq!(b.round(), 2);
        assert!(b.bye().is_none());
        assert_eq!(current(&b), ("2-1".into(), "c".into(), "b".into()));
        assert_eq!(b.remaining().len(), 2);
    }

    #[test]
    fn bye_never_repeats_consecutively() {
        for n in 2..=40 {
            let ids: Vec<String> = (0..n).map(|i| format!("c{}", i)).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let mut b = Bracket::start(Uuid::new_v4(), pool(&refs)).unwrap();
            let mut last_bye: Option<String> = None;
            let mut checked_round = 0;

            while !b.is_finished() {
                if b.round_number() != checked_round {
                    let bye = b.bye().map(|c| c.id.clone());
                    if let (Some(prev), Some(now)) = (&last_bye, &bye) {
                        assert_ne!(prev, now, "n={} consecutive bye", n);
                    }
                    // No duplicates between pending slots and the bye
                    let mut ids: Vec<&str> = b
                        .pending_matches()
                        .iter()
                        .flat_map(|m| [m.slot_a.id.as_str(), m.slot_b.id.as_str()])
                        .chain(b.bye().map(|c| c.id.as_str()))
                        .collect();
                    let total = ids.len();
                    ids.sort_unstable();
                    ids.dedup();
                    assert_eq!(ids.len(), total, "n={} duplicated candidate", n);
                    assert_eq!(total, b.round());
                    last_bye = bye;
                    checked_round = b.round_number();
                }
                let (mid, _, bid) = current(&b);
                b = b.select(&mid, &bid).unwrap().bracket;
            }
        }
    }

    #[test]
    fn rounds_played_is_ceil_log2() {
        for n in 2..=70usize {
            let ids: Vec<String> = (0..n).map(|i| i.to_string()).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let b = Bracket::start(Uuid::new_v4(), pool(&refs)).unwrap();
            let (done, rounds) = play_out(b);
            let expected = (n as f64).log2().ceil() as usize;
            assert_eq!(rounds, expected, "n={}", n);
            assert!(done.champion().is_some());
        }
    }

    #[test]
    fn round_is_non_increasing() {
        let ids: Vec<String> = (0..13).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
        let mut b = Bracket::start(Uuid::new_v4(), pool(&refs)).unwrap();
        let mut prev = b.round();
        while !b.is_finished() {
            let (mid, a, _) = current(&b);
            b = b.select(&mid, &a).unwrap().bracket;
            assert!(b.round() <= prev);
            prev = b.round();
        }
    }

    #[test]
    fn rejects_small_pools() {
        assert!(matches!(
            Bracket::start(Uuid::new_v4(), vec![]),
            Err(Error::InsufficientCandidates(0))
        ));
        assert!(matches!(
            Bracket::start(Uuid::new_v4(), pool(&["a"])),
            Err(Error::InsufficientCandidates(1))
        ));
        assert!(matches!(
            Bracket::start(Uuid::new_v4(), pool(&["a", "a"])),
            Err(Error::InsufficientCandidates(1))
        ));
    }

    #[test]
    fn foreign_winner_leaves_bracket_untouched() {
        let b = Bracket::start(Uuid::new_v4(), pool(&["a", "b", "c", "d"])).unwrap();
        let err = b.select("4-1", "c").unwrap_err();
        assert!(matches!(err, Error::InvalidSelection(_)));
        assert_eq!(b.pending_matches().len(), 2);
        assert_eq!(current(&b).0, "4-1");
    }

    #[test]
    fn stale_match_id_is_rejected() {
        let b = Bracket::start(Uuid::new_v4(), pool(&["a", "b", "c", "d"])).unwrap();
        let next = b.select("4-1", "a").unwrap().bracket;
        assert!(matches!(
            next.select("4-1", "a"),
            Err(Error::InvalidSelection(_))
        ));
        assert!(matches!(
            next.select("no-such-match", "c"),
            Err(Error::InvalidSelection(_))
        ));
    }

    #[test]
    fn finished_bracket_rejects_everything() {
        let b = Bracket::start(Uuid::new_v4(), pool(&["a", "b"])).unwrap();
        let done = b.select("2-1", "b").unwrap().bracket;
        assert_eq!(done.phase(), Phase::Finished);
        assert!(matches!(
            done.select("2-1", "b"),
            Err(Error::GameAlreadyComplete(_))
        ));
        assert_eq!(done.summary().status, GameStatus::Completed);
    }
}
