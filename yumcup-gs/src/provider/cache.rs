//! Geohash-keyed result cache
//!
//! Search results are cached per neighbourhood: the key is the provider
//! name, the 6-character geohash cell of the center (about 1.2 km × 0.6 km),
//! the radius, and the limit. Entries expire after the TTL. Failures are
//! never cached.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use yumcup_common::{Candidate, Result};

use super::{CandidateProvider, SearchArea};

pub const GEOHASH_PRECISION: usize = 6;

struct CacheEntry {
    candidates: Vec<Candidate>,
    stored_at: Instant,
}

/// Caching decorator around any provider
pub struct CachedProvider {
    inner: Arc<dyn CandidateProvider>,
    ttl: Duration,
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl CachedProvider {
    pub fn new(inner: Arc<dyn CandidateProvider>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn cache_key(&self, area: &SearchArea) -> Result<String> {
        Ok(format!(
            "{}:geohash:{}:{}:{}",
            self.inner.name(),
            area.center.geohash(GEOHASH_PRECISION)?,
            area.radius,
            area.limit
        ))
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl CandidateProvider for CachedProvider {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn search(&self, area: &SearchArea) -> Result<Vec<Candidate>> {
        let key = self.cache_key(area)?;

        if let Some(entry) = self.entries.read().await.get(&key) {
            if entry.stored_at.elapsed() < self.ttl {
                debug!(key = %key, "Cache hit");
                return Ok(entry.candidates.clone());
            }
        }

        debug!(key = %key, "Cache miss");
        let candidates = self.inner.search(area).await?;
        let mut entries = self.entries.write().await;
        entries.retain(|_, e| e.stored_at.elapsed() < self.ttl);
        entries.insert(
            key,
            CacheEntry {
                candidates: candidates.clone(),
                stored_at: Instant::now(),
            },
        );
        Ok(candidates)
    }
}
