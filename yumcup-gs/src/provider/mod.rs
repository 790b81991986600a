//! Candidate catalogs
//!
//! A [`CandidateProvider`] turns a search area into an ordered list of
//! venues. Ranking and data sources are the catalog's business; callers only
//! rely on the order being stable for a given response.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use yumcup_common::config::{ProviderConfig, ProviderKind};
use yumcup_common::{Candidate, Coordinates, Error, Result};

pub mod cache;
pub mod kakao;
pub mod static_list;

pub use cache::CachedProvider;
pub use kakao::KakaoLocalProvider;
pub use static_list::StaticProvider;

/// Where and how much to search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchArea {
    pub center: Coordinates,
    /// Meters
    pub radius: u32,
    /// Stop once this many candidates are collected
    pub limit: usize,
}

/// Candidate catalog trait
#[async_trait]
pub trait CandidateProvider: Send + Sync {
    /// Catalog identifier for logs and cache keys
    fn name(&self) -> &'static str;

    /// Venues inside `area`, nearest or most relevant first
    ///
    /// An empty list is a valid answer; only transport or upstream failures
    /// are errors.
    async fn search(&self, area: &SearchArea) -> Result<Vec<Candidate>>;
}

/// Build the configured provider, wrapped in the result cache when enabled
pub fn build_provider(config: &ProviderConfig) -> Result<Arc<dyn CandidateProvider>> {
    let inner: Arc<dyn CandidateProvider> = match config.kind {
        ProviderKind::Kakao => {
            let key = config.kakao_api_key.clone().ok_or_else(|| {
                Error::Config(
                    "Kakao provider needs provider.kakao_api_key or KAKAO_API_KEY".to_string(),
                )
            })?;
            Arc::new(KakaoLocalProvider::new(
                &config.kakao_base_url,
                &key,
                Duration::from_secs(config.request_timeout_secs),
            )?)
        }
        ProviderKind::Static => {
            let path = config.static_path.as_ref().ok_or_else(|| {
                Error::Config("provider.static_path is not set".to_string())
            })?;
            Arc::new(StaticProvider::from_file(path)?)
        }
    };

    if config.cache_ttl_secs == 0 {
        info!(provider = inner.name(), "Candidate cache disabled");
        return Ok(inner);
    }

    info!(
        provider = inner.name(),
        ttl_secs = config.cache_ttl_secs,
        "Candidate cache enabled"
    );
    Ok(Arc::new(CachedProvider::new(
        inner,
        Duration::from_secs(config.cache_ttl_secs),
    )))
}
