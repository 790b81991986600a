//! Kakao Local API client
//!
//! Category search for restaurants (`FD6`) around a point. Results come 15
//! per page, sorted by distance; pages are fetched until enough venues are
//! collected or the API reports the last page.
//!
//! Transport failures and 5xx answers are retried with linear backoff.
//! 4xx answers are returned immediately.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use yumcup_common::candidate::{non_empty, parse_distance};
use yumcup_common::{Candidate, Coordinates, Error, Result};

use super::{CandidateProvider, SearchArea};

const CATEGORY_SEARCH_PATH: &str = "/v2/local/search/category.json";
const RESTAURANT_CATEGORY: &str = "FD6";
const PAGE_SIZE: usize = 15;
/// The API serves at most 45 documents per query
const MAX_PAGES: u32 = 3;
const USER_AGENT: &str = concat!("yumcup/", env!("CARGO_PKG_VERSION"));

/// Kakao search response envelope
#[derive(Debug, Deserialize)]
struct KakaoSearchResponse {
    meta: KakaoMeta,
    #[serde(default)]
    documents: Vec<KakaoDocument>,
}

#[derive(Debug, Deserialize)]
struct KakaoMeta {
    #[serde(default)]
    is_end: bool,
}

/// One place as returned by Kakao
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct KakaoDocument {
    id: String,
    place_name: Option<String>,
    /// e.g. "음식점 > 한식 > 냉면"
    category_name: Option<String>,
    phone: Option<String>,
    address_name: Option<String>,
    road_address_name: Option<String>,
    /// Longitude, as a string
    x: Option<String>,
    /// Latitude, as a string
    y: Option<String>,
    place_url: Option<String>,
    /// Meters from the query point, as a string
    distance: Option<String>,
}

impl KakaoDocument {
    fn into_candidate(self) -> Option<Candidate> {
        if self.id.trim().is_empty() {
            return None;
        }
        let location = match (
            self.y.as_deref().and_then(|v| v.parse::<f64>().ok()),
            self.x.as_deref().and_then(|v| v.parse::<f64>().ok()),
        ) {
            (Some(lat), Some(lon)) => Some(Coordinates::new(lat, lon)),
            _ => None,
        };
        let category = non_empty(self.category_name).map(|c| {
            c.rsplit('>')
                .next()
                .map(str::trim)
                .unwrap_or_default()
                .to_string()
        });

        let mut candidate = Candidate::new(
            self.id,
            non_empty(self.place_name).unwrap_or_else(|| yumcup_common::candidate::UNKNOWN.to_string()),
        );
        candidate.category = non_empty(category);
        candidate.distance = self
            .distance
            .map(serde_json::Value::String)
            .as_ref()
            .and_then(parse_distance);
        candidate.address = non_empty(self.address_name);
        candidate.road_address = non_empty(self.road_address_name);
        candidate.phone = non_empty(self.phone);
        candidate.place_url = non_empty(self.place_url);
        candidate.location = location;
        Some(candidate)
    }
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Delay before attempt n+1 is `base_delay * n`
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
        }
    }
}

enum Attempt {
    Retry(Error),
    Fail(Error),
}

/// Kakao Local API client
pub struct KakaoLocalProvider {
    http_client: reqwest::Client,
    base_url: String,
    auth_header: String,
    retry: RetryPolicy,
}

impl KakaoLocalProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Provider(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_header: format!("KakaoAK {}", api_key),
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_page(&self, area: &SearchArea, page: u32) -> Result<KakaoSearchResponse> {
        let mut attempt = 1;
        loop {
            match self.try_fetch_page(area, page).await {
                Ok(response) => return Ok(response),
                Err(Attempt::Fail(e)) => return Err(e),
                Err(Attempt::Retry(e)) if attempt >= self.retry.max_attempts => {
                    warn!(page, attempts = attempt, error = %e, "Kakao Local API gave up");
                    return Err(e);
                }
                Err(Attempt::Retry(e)) => {
                    let delay = self.retry.base_delay * attempt;
                    warn!(
                        page,
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        error = %e,
                        "Kakao Local API attempt failed, retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn try_fetch_page(
        &self,
        area: &SearchArea,
        page: u32,
    ) -> std::result::Result<KakaoSearchResponse, Attempt> {
        let url = format!("{}{}", self.base_url, CATEGORY_SEARCH_PATH);
        debug!(url = %url, page, radius = area.radius, "Querying Kakao Local API");

        let response = self
            .http_client
            .get(&url)
            .header(reqwest::header::AUTHORIZATION, &self.auth_header)
            .query(&[
                ("category_group_code", RESTAURANT_CATEGORY.to_string()),
                ("x", area.center.longitude.to_string()),
                ("y", area.center.latitude.to_string()),
                ("radius", area.radius.to_string()),
                ("size", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
                ("sort", "distance".to_string()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Attempt::Retry(Error::ProviderTimeout(format!("Kakao Local API: {}", e)))
                } else {
                    Attempt::Retry(Error::Provider(format!("Kakao Local API: {}", e)))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = Error::Provider(format!("Kakao Local API {}: {}", status.as_u16(), body));
            return Err(if status.is_server_error() {
                Attempt::Retry(err)
            } else {
                Attempt::Fail(err)
            });
        }

        response
            .json::<KakaoSearchResponse>()
            .await
            .map_err(|e| Attempt::Fail(Error::Provider(format!("Kakao Local API parse error: {}", e))))
    }
}

#[async_trait]
impl CandidateProvider for KakaoLocalProvider {
    fn name(&self) -> &'static str {
        "kakao"
    }

    async fn search(&self, area: &SearchArea) -> Result<Vec<Candidate>> {
        let mut candidates = Vec::with_capacity(area.limit);

        for page in 1..=MAX_PAGES {
            let response = self.fetch_page(area, page).await?;
            let is_end = response.meta.is_end;
            candidates.extend(
                response
                    .documents
                    .into_iter()
                    .filter_map(KakaoDocument::into_candidate),
            );

            if candidates.len() >= area.limit || is_end {
                break;
            }
        }

        candidates.truncate(area.limit);
        info!(
            found = candidates.len(),
            radius = area.radius,
            "Retrieved venues from Kakao Local API"
        );
        Ok(candidates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_maps_to_candidate() {
        let doc: KakaoDocument = serde_json::from_value(serde_json::json!({
            "id": "26338954",
            "place_name": "Pyongyang Naengmyeon",
            "category_name": "음식점 > 한식 > 냉면",
            "phone": "",
            "address_name": "Seoul Jung-gu",
            "road_address_name": "Seoul Jung-gu Changgyeonggung-ro 62-29",
            "x": "126.99",
            "y": "37.56",
            "place_url": "http://place.map.kakao.com/26338954",
            "distance": "418"
        }))
        .unwrap();

        let c = doc.into_candidate().unwrap();
        assert_eq!(c.id, "26338954");
        assert_eq!(c.category.as_deref(), Some("냉면"));
        assert_eq!(c.distance, Some(418));
        assert_eq!(c.phone, None);
        assert_eq!(c.location, Some(Coordinates::new(37.56, 126.99)));
        assert!(c.rating.is_none());
    }

    #[test]
    fn document_without_id_is_skipped() {
        let doc = KakaoDocument::default();
        assert!(doc.into_candidate().is_none());
    }
}
