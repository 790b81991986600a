//! Fixed candidate list
//!
//! Serves venues from a JSON file (an array of candidate objects) or an
//! in-memory list. Used for offline runs, demos, and tests. Venues are
//! filtered by great-circle distance to the search center, nearest first;
//! the returned `distance` is recomputed for the actual center.

use async_trait::async_trait;
use std::path::Path;
use tracing::info;
use yumcup_common::{Candidate, Result};

use super::{CandidateProvider, SearchArea};

pub struct StaticProvider {
    candidates: Vec<Candidate>,
}

impl StaticProvider {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let candidates: Vec<Candidate> = serde_json::from_str(&text)?;
        info!(
            path = %path.display(),
            count = candidates.len(),
            "Loaded static candidate list"
        );
        Ok(Self::new(candidates))
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}

#[async_trait]
impl CandidateProvider for StaticProvider {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn search(&self, area: &SearchArea) -> Result<Vec<Candidate>> {
        let radius = f64::from(area.radius);
        let mut hits: Vec<(f64, Candidate)> = self
            .candidates
            .iter()
            .filter_map(|c| {
                // Without coordinates, trust a precomputed distance
                let distance = match c.location {
                    Some(loc) => area.center.distance_to(&loc),
                    None => f64::from(c.distance?),
                };
                (distance <= radius).then(|| {
                    let mut hit = c.clone();
                    hit.distance = Some(distance.round() as u32);
                    (distance, hit)
                })
            })
            .collect();

        hits.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(hits
            .into_iter()
            .take(area.limit)
            .map(|(_, c)| c)
            .collect())
    }
}
