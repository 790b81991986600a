//! Location-based seeding
//!
//! Turns a position and a radius into a registered bracket: ask the
//! catalog, cap the pool, then hand it to the engine. An empty or
//! single-venue neighbourhood is [`Error::NoCandidatesFound`], which the
//! user fixes by widening the radius. That is distinct from the engine's
//! own [`Error::InsufficientCandidates`], which would mean a seeding bug.

use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};
use yumcup_common::{Candidate, Coordinates, Error, Result};

use crate::engine::{Bracket, GameRegistry};
use crate::provider::{CandidateProvider, SearchArea};

/// Largest radius the catalog accepts, in meters
pub const MAX_RADIUS_M: u32 = 20_000;

pub struct Seeder {
    provider: Arc<dyn CandidateProvider>,
    registry: Arc<GameRegistry>,
    max_candidates: usize,
}

impl Seeder {
    pub fn new(
        provider: Arc<dyn CandidateProvider>,
        registry: Arc<GameRegistry>,
        max_candidates: usize,
    ) -> Self {
        Self {
            provider,
            registry,
            max_candidates,
        }
    }

    /// Fetch up to `max_candidates` distinct venues around `center`
    pub async fn candidates(&self, center: Coordinates, radius: u32) -> Result<Vec<Candidate>> {
        center.validate()?;
        if radius == 0 || radius > MAX_RADIUS_M {
            return Err(Error::InvalidInput(format!(
                "radius must be between 1 and {} meters, got {}",
                MAX_RADIUS_M, radius
            )));
        }

        let area = SearchArea {
            center,
            radius,
            limit: self.max_candidates,
        };
        let found = self.provider.search(&area).await?;

        let mut seen = HashSet::new();
        let mut pool: Vec<Candidate> = found
            .into_iter()
            .filter(|c| seen.insert(c.id.clone()))
            .collect();
        pool.truncate(self.max_candidates);

        if pool.len() < 2 {
            warn!(
                provider = self.provider.name(),
                found = pool.len(),
                radius,
                "Not enough venues nearby"
            );
            return Err(Error::NoCandidatesFound {
                found: pool.len(),
                radius,
            });
        }
        Ok(pool)
    }

    /// Search around `center` and start a bracket from the result
    pub async fn seed(&self, center: Coordinates, radius: u32) -> Result<Bracket> {
        let pool = self.candidates(center, radius).await?;
        info!(
            provider = self.provider.name(),
            pool = pool.len(),
            radius,
            "Seeding bracket"
        );
        self.registry.start(pool).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::StaticProvider;
    use std::time::Duration;

    fn seeder(venues: Vec<Candidate>, max: usize) -> Seeder {
        Seeder::new(
            Arc::new(StaticProvider::new(venues)),
            Arc::new(GameRegistry::new(Duration::from_secs(60))),
            max,
        )
    }

    fn venue(id: &str, distance: u32) -> Candidate {
        let mut c = Candidate::new(id, id);
        c.distance = Some(distance);
        c
    }

    const CENTER: Coordinates = Coordinates {
        latitude: 37.5665,
        longitude: 126.9780,
    };

    #[tokio::test]
    async fn one_venue_is_no_candidates_found() {
        let s = seeder(vec![venue("only", 10)], 16);
        let err = s.seed(CENTER, 500).await.unwrap_err();
        assert!(matches!(err, Error::NoCandidatesFound { found: 1, radius: 500 }));
    }

    #[tokio::test]
    async fn empty_area_is_no_candidates_found() {
        let s = seeder(vec![venue("far", 5000)], 16);
        let err = s.seed(CENTER, 500).await.unwrap_err();
        assert!(matches!(err, Error::NoCandidatesFound { found: 0, .. }));
    }

    #[tokio::test]
    async fn pool_is_capped() {
        let venues = (0..30).map(|i| venue(&format!("v{}", i), i * 10)).collect();
        let s = seeder(venues, 16);
        let bracket = s.seed(CENTER, 1000).await.unwrap();
        assert_eq!(bracket.round(), 16);
        assert_eq!(bracket.current_match().unwrap().slot_a.id, "v0");
    }

    #[tokio::test]
    async fn rejects_bad_radius_and_position() {
        let s = seeder(vec![venue("a", 1), venue("b", 2)], 16);
        assert!(matches!(s.seed(CENTER, 0).await, Err(Error::InvalidInput(_))));
        assert!(matches!(s.seed(CENTER, 50_000).await, Err(Error::InvalidInput(_))));
        assert!(matches!(
            s.seed(Coordinates::new(123.0, 0.0), 500).await,
            Err(Error::InvalidInput(_))
        ));
    }
}
