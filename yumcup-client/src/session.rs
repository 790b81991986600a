//! HTTP client for the yumcup-gs game protocol
//!
//! One request per call. Failures are returned as-is and never retried;
//! retrying is the user's decision.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use yumcup_common::api::{
    ErrorResponse, GameSummary, LocationRequest, SelectRequest, SelectResponse, StartResponse,
};
use yumcup_common::{Candidate, Coordinates, Error, Result};

const USER_AGENT: &str = concat!("yumcup-client/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Game server client
#[derive(Clone)]
pub struct SessionClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl SessionClient {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::NetworkFailure(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a bracket around `center`
    pub async fn start_location(&self, center: Coordinates, radius: u32) -> Result<StartResponse> {
        let body = LocationRequest {
            latitude: center.latitude,
            longitude: center.longitude,
            radius,
        };
        let request = self
            .http_client
            .post(self.url("/api/yumcup/start/location"))
            .json(&body);

        self.send(request).await.map_err(|e| match e {
            Error::NoCandidatesFound { found, .. } => Error::NoCandidatesFound { found, radius },
            other => other,
        })
    }

    /// Submit the winner of `match_id`
    pub async fn select(&self, game_id: &str, match_id: &str, winner_id: &str) -> Result<SelectResponse> {
        let body = SelectRequest {
            game_id: game_id.to_string(),
            match_id: match_id.to_string(),
            winner_id: winner_id.to_string(),
        };
        let request = self.http_client.post(self.url("/api/yumcup/select")).json(&body);
        self.send(request).await
    }

    /// Stateless candidate list around the server's default location
    pub async fn start_legacy(&self) -> Result<Vec<Candidate>> {
        let request = self.http_client.get(self.url("/api/yumcup/start"));
        self.send(request).await
    }

    /// Snapshot of a game, for reconnecting
    pub async fn get_game(&self, game_id: &str) -> Result<GameSummary> {
        let request = self
            .http_client
            .get(self.url(&format!("/api/yumcup/games/{}", game_id)));
        self.send(request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T> {
        let response = request.send().await.map_err(|e| {
            warn!(error = %e, "Game server unreachable");
            Error::NetworkFailure(e.to_string())
        })?;

        let status = response.status();
        debug!(status = status.as_u16(), url = %response.url(), "Game server response");

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(decode_error(status, &text));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| Error::NetworkFailure(format!("malformed response: {}", e)))
    }
}

/// Turn an error body back into the taxonomy where the code is known
fn decode_error(status: StatusCode, body: &str) -> Error {
    let Ok(envelope) = serde_json::from_str::<ErrorResponse>(body) else {
        return Error::Remote {
            status: status.as_u16(),
            message: body.to_string(),
        };
    };

    let message = envelope.error.message;
    match envelope.error.code.as_str() {
        "INVALID_SELECTION" => Error::InvalidSelection(message),
        "GAME_ALREADY_COMPLETE" => Error::GameAlreadyComplete(message),
        "INVALID_INPUT" => Error::InvalidInput(message),
        "NOT_FOUND" => Error::NotFound(message),
        "PROVIDER_TIMEOUT" => Error::ProviderTimeout(message),
        // The server's count is not on the wire; the caller knows the radius
        "NO_CANDIDATES_FOUND" => Error::NoCandidatesFound { found: 0, radius: 0 },
        _ => Error::Remote {
            status: status.as_u16(),
            message,
        },
    }
}
