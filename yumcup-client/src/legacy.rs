//! Client-side bracket for the stateless start endpoint
//!
//! `GET /api/yumcup/start` hands back a plain candidate list; progression is
//! computed locally from array positions. Pairing and bye handling match the
//! server engine: pairs are `(0,1), (2,3), ..`, an odd pool's last candidate
//! sits out and opens the next round.

use std::collections::HashSet;
use tracing::debug;
use yumcup_common::{Candidate, Error, Result};

/// What a pick led to
#[derive(Debug, Clone, PartialEq)]
pub enum LegacyOutcome {
    /// Another pair is waiting
    Next,
    Champion(Candidate),
}

#[derive(Debug, Clone)]
pub struct LegacyBracket {
    /// Pool of the round being played
    pool: Vec<Candidate>,
    /// Index of slot A of the current pair within `pool`
    cursor: usize,
    winners: Vec<Candidate>,
    champion: Option<Candidate>,
}

impl LegacyBracket {
    /// Build from the server's list; duplicates keep their first position
    pub fn new(candidates: Vec<Candidate>) -> Result<Self> {
        let mut seen = HashSet::new();
        let pool: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();
        if pool.len() < 2 {
            return Err(Error::InsufficientCandidates(pool.len()));
        }
        Ok(Self {
            pool,
            cursor: 0,
            winners: Vec::new(),
            champion: None,
        })
    }

    /// Pool size of the current round
    pub fn round(&self) -> usize {
        self.pool.len()
    }

    pub fn matches_in_round(&self) -> usize {
        self.pool.len() / 2
    }

    /// 1-based position of the current pair
    pub fn match_in_round(&self) -> usize {
        self.cursor / 2 + 1
    }

    pub fn current_pair(&self) -> Option<(&Candidate, &Candidate)> {
        if self.champion.is_some() {
            return None;
        }
        Some((self.pool.get(self.cursor)?, self.pool.get(self.cursor + 1)?))
    }

    /// Candidate sitting out this round
    pub fn bye(&self) -> Option<&Candidate> {
        if self.pool.len() % 2 == 1 {
            self.pool.last()
        } else {
            None
        }
    }

    pub fn champion(&self) -> Option<&Candidate> {
        self.champion.as_ref()
    }

    pub fn is_finished(&self) -> bool {
        self.champion.is_some()
    }

    /// Advance the current pair in favour of `winner_id`
    pub fn pick(&mut self, winner_id: &str) -> Result<LegacyOutcome> {
        if let Some(champion) = &self.champion {
            return Err(Error::GameAlreadyComplete(format!(
                "champion {} already decided",
                champion.id
            )));
        }
        let (a, b) = self
            .current_pair()
            .ok_or_else(|| Error::Internal("legacy bracket has no current pair".to_string()))?;
        let winner = if a.id == winner_id {
            a.clone()
        } else if b.id == winner_id {
            b.clone()
        } else {
            return Err(Error::InvalidSelection(format!(
                "candidate {} is not in the current pair",
                winner_id
            )));
        };

        self.winners.push(winner);
        self.cursor += 2;
        if self.cursor + 1 < self.pool.len() {
            return Ok(LegacyOutcome::Next);
        }

        // Round over: bye holder first, then winners in match order
        let mut next = Vec::with_capacity(self.winners.len() + 1);
        next.extend(self.bye().cloned());
        next.append(&mut self.winners);
        debug!(from = self.pool.len(), to = next.len(), "Legacy round complete");

        if next.len() == 1 {
            let champion = next.remove(0);
            self.champion = Some(champion.clone());
            return Ok(LegacyOutcome::Champion(champion));
        }
        self.pool = next;
        self.cursor = 0;
        Ok(LegacyOutcome::Next)
    }
}
