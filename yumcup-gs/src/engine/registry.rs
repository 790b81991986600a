//! Live game registry
//!
//! Holds one [`Bracket`] snapshot per game id. Each game sits behind its own
//! mutex so selections for one game are applied strictly one at a time,
//! while different games never wait on each other. A selection computes the
//! successor snapshot first and swaps it in only on success.
//!
//! Games are never deleted explicitly. The idle sweeper drops any game that
//! has not been touched for `idle_timeout`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;
use yumcup_common::api::{CandidateStats, StatsResponse};
use yumcup_common::{Candidate, Error, Result};

use super::bracket::{Advance, Bracket, Outcome};

struct GameSlot {
    bracket: Bracket,
    last_touched: Instant,
}

#[derive(Default)]
struct StatsBook {
    games_started: u64,
    games_completed: u64,
    candidates: HashMap<String, CandidateStats>,
}

impl StatsBook {
    fn entry(&mut self, candidate: &Candidate) -> &mut CandidateStats {
        self.candidates
            .entry(candidate.id.clone())
            .or_insert_with(|| CandidateStats {
                id: candidate.id.clone(),
                name: candidate.name.clone(),
                play_count: 0,
                win_count: 0,
            })
    }
}

/// In-memory store of all live games
pub struct GameRegistry {
    games: RwLock<HashMap<Uuid, Arc<Mutex<GameSlot>>>>,
    stats: Mutex<StatsBook>,
    idle_timeout: Duration,
}

impl GameRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            games: RwLock::new(HashMap::new()),
            stats: Mutex::new(StatsBook::default()),
            idle_timeout,
        }
    }

    /// Seed and register a new game
    pub async fn start(&self, candidates: Vec<Candidate>) -> Result<Bracket> {
        let game_id = Uuid::new_v4();
        let bracket = Bracket::start(game_id, candidates)?;

        let slot = GameSlot {
            bracket: bracket.clone(),
            last_touched: Instant::now(),
        };
        self.games
            .write()
            .await
            .insert(game_id, Arc::new(Mutex::new(slot)));
        self.stats.lock().await.games_started += 1;

        info!(
            game_id = %game_id,
            round = bracket.round(),
            matches = bracket.matches_in_round(),
            "Game started"
        );
        Ok(bracket)
    }

    /// Apply one selection to a live game
    ///
    /// Unknown or malformed game ids are an [`Error::InvalidSelection`]: the
    /// caller is holding a reference to a game that does not exist.
    pub async fn select(&self, game_id: &str, match_id: &str, winner_id: &str) -> Result<Advance> {
        let id = Uuid::parse_str(game_id)
            .map_err(|_| Error::InvalidSelection(format!("unknown game {}", game_id)))?;
        let slot = self
            .slot(id)
            .await
            .ok_or_else(|| Error::InvalidSelection(format!("unknown game {}", game_id)))?;

        let mut slot = slot.lock().await;
        let advance = slot.bracket.select(match_id, winner_id)?;
        slot.bracket = advance.bracket.clone();
        slot.last_touched = Instant::now();
        drop(slot);

        self.record(&advance).await;

        debug!(
            game_id = %id,
            match_id,
            winner = %advance.resolution.winner.id,
            round = advance.bracket.round(),
            "Selection applied"
        );
        Ok(advance)
    }

    async fn record(&self, advance: &Advance) {
        let mut stats = self.stats.lock().await;
        stats.entry(&advance.resolution.winner).play_count += 1;
        stats.entry(&advance.resolution.loser).play_count += 1;
        if let Outcome::Champion(champion) = &advance.outcome {
            stats.entry(champion).win_count += 1;
            stats.games_completed += 1;
            info!(game_id = %advance.bracket.game_id(), champion = %champion.id, "Game complete");
        }
    }

    /// Current snapshot of a game
    pub async fn snapshot(&self, game_id: &str) -> Result<Bracket> {
        let id = Uuid::parse_str(game_id)
            .map_err(|_| Error::NotFound(format!("game {}", game_id)))?;
        let slot = self
            .slot(id)
            .await
            .ok_or_else(|| Error::NotFound(format!("game {}", game_id)))?;
        let bracket = slot.lock().await.bracket.clone();
        Ok(bracket)
    }

    async fn slot(&self, id: Uuid) -> Option<Arc<Mutex<GameSlot>>> {
        self.games.read().await.get(&id).cloned()
    }

    pub async fn active_games(&self) -> usize {
        self.games.read().await.len()
    }

    /// Play statistics, champions first
    pub async fn stats(&self) -> StatsResponse {
        let active_games = self.active_games().await;
        let stats = self.stats.lock().await;
        let mut candidates: Vec<CandidateStats> = stats.candidates.values().cloned().collect();
        candidates.sort_by(|a, b| {
            b.win_count
                .cmp(&a.win_count)
                .then(b.play_count.cmp(&a.play_count))
                .then_with(|| a.id.cmp(&b.id))
        });
        StatsResponse {
            games_started: stats.games_started,
            games_completed: stats.games_completed,
            active_games,
            candidates,
        }
    }

    /// Drop games idle for longer than the timeout; returns how many
    ///
    /// A game whose lock is held is in use and is skipped.
    pub async fn sweep_idle(&self) -> usize {
        let now = Instant::now();
        let mut games = self.games.write().await;
        let before = games.len();
        games.retain(|_, slot| match slot.try_lock() {
            Ok(slot) => now.duration_since(slot.last_touched) < self.idle_timeout,
            Err(_) => true,
        });
        let evicted = before - games.len();
        if evicted > 0 {
            info!(evicted, remaining = games.len(), "Evicted idle games");
        }
        evicted
    }

    /// Run [`Self::sweep_idle`] every `interval`
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.sweep_idle().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(n: usize) -> Vec<Candidate> {
        (0..n).map(|i| Candidate::new(format!("v{}", i), format!("Venue {}", i))).collect()
    }

    #[tokio::test]
    async fn duplicate_submission_succeeds_once() {
        let registry = GameRegistry::new(Duration::from_secs(60));
        let bracket = registry.start(pool(4)).await.unwrap();
        let gid = bracket.game_id().to_string();

        registry.select(&gid, "4-1", "v0").await.unwrap();
        let err = registry.select(&gid, "4-1", "v0").await.unwrap_err();
        assert!(matches!(err, Error::InvalidSelection(_)));
    }

    #[tokio::test]
    async fn concurrent_submissions_are_serialized() {
        let registry = Arc::new(GameRegistry::new(Duration::from_secs(60)));
        let bracket = registry.start(pool(8)).await.unwrap();
        let gid = bracket.game_id().to_string();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = registry.clone();
                let gid = gid.clone();
                tokio::spawn(async move { registry.select(&gid, "8-1", "v1").await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(Error::InvalidSelection(_)) => {}
                Err(other) => panic!("unexpected error: {}", other),
            }
        }
        assert_eq!(ok, 1);

        let snap = registry.snapshot(&gid).await.unwrap();
        assert_eq!(snap.current_match().unwrap().id, "8-2");
    }

    #[tokio::test]
    async fn unknown_game_is_invalid_selection() {
        let registry = GameRegistry::new(Duration::from_secs(60));
        let err = registry
            .select(&Uuid::new_v4().to_string(), "2-1", "a")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSelection(_)));

        let err = registry.select("not-a-uuid", "2-1", "a").await.unwrap_err();
        assert!(matches!(err, Error::InvalidSelection(_)));
    }

    #[tokio::test]
    async fn stats_count_plays_and_wins() {
        let registry = GameRegistry::new(Duration::from_secs(60));
        let gid = registry.start(pool(2)).await.unwrap().game_id().to_string();
        registry.select(&gid, "2-1", "v1").await.unwrap();

        let stats = registry.stats().await;
        assert_eq!(stats.games_started, 1);
        assert_eq!(stats.games_completed, 1);
        assert_eq!(stats.candidates[0].id, "v1");
        assert_eq!(stats.candidates[0].win_count, 1);
        assert_eq!(stats.candidates[0].play_count, 1);
        assert_eq!(stats.candidates[1].play_count, 1);

        let err = registry.select(&gid, "2-1", "v1").await.unwrap_err();
        assert!(matches!(err, Error::GameAlreadyComplete(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn idle_games_are_swept() {
        let registry = GameRegistry::new(Duration::from_secs(30));
        let old = registry.start(pool(2)).await.unwrap().game_id().to_string();

        tokio::time::advance(Duration::from_secs(20)).await;
        let fresh = registry.start(pool(2)).await.unwrap().game_id().to_string();

        tokio::time::advance(Duration::from_secs(15)).await;
        assert_eq!(registry.sweep_idle().await, 1);
        assert!(registry.snapshot(&old).await.is_err());
        assert!(registry.snapshot(&fresh).await.is_ok());
    }
}
