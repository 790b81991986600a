//! Shared API request/response types
//!
//! Field names are camelCase on the wire; callers depend on them exactly.
//!
//! # Endpoints
//!
//! - `POST /api/yumcup/start/location`: [`LocationRequest`] → [`StartResponse`]
//! - `POST /api/yumcup/select`: [`SelectRequest`] → [`SelectResponse`]
//! - `GET /api/yumcup/start`: `Vec<Candidate>` (legacy, stateless)
//! - `GET /api/yumcup/games/:game_id`: [`GameSummary`]
//! - `GET /api/yumcup/stats`: [`StatsResponse`]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::candidate::Candidate;

// ========================================
// Requests
// ========================================

/// Body of `POST /api/yumcup/start/location`
///
/// # Examples
///
/// ```
/// use yumcup_common::api::types::LocationRequest;
///
/// let req: LocationRequest =
///     serde_json::from_str(r#"{"latitude":37.5,"longitude":127.0,"radius":800}"#).unwrap();
/// assert_eq!(req.radius, 800);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct LocationRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Search radius in meters
    pub radius: u32,
}

/// Body of `POST /api/yumcup/select`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectRequest {
    pub game_id: String,
    pub match_id: String,
    pub winner_id: String,
}

// ========================================
// Responses
// ========================================

/// Game lifecycle as reported to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    InProgress,
    Completed,
}

/// One pairwise comparison
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView {
    pub id: String,
    /// Pool size of the round this match belongs to
    pub round: usize,
    /// 1-based position within the round
    pub match_order: usize,
    pub slot_a: Candidate,
    pub slot_b: Candidate,
}

/// Response of `POST /api/yumcup/start/location`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    pub game_id: String,
    pub current_match: MatchView,
    pub current_round: usize,
    pub match_in_round: usize,
    pub matches_in_round: usize,
    pub status: GameStatus,
}

/// Response of `POST /api/yumcup/select`
///
/// Serialized with a `gameComplete` discriminator:
/// `{ "gameComplete": true, "winner": … }` or
/// `{ "gameComplete": false, "nextMatch": …, "currentRound": … }`.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectResponse {
    Next(NextMatchBody),
    Complete(CompleteBody),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextMatchBody {
    pub next_match: MatchView,
    pub current_round: usize,
    pub match_in_round: usize,
    pub matches_in_round: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteBody {
    pub winner: Candidate,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectResponseWire {
    game_complete: bool,
    #[serde(flatten)]
    body: serde_json::Value,
}

impl Serialize for SelectResponse {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::Error;
        let (game_complete, body) = match self {
            SelectResponse::Next(next) => (false, serde_json::to_value(next)),
            SelectResponse::Complete(done) => (true, serde_json::to_value(done)),
        };
        let body = body.map_err(S::Error::custom)?;
        SelectResponseWire { game_complete, body }.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for SelectResponse {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;
        let wire = SelectResponseWire::deserialize(deserializer)?;
        if wire.game_complete {
            serde_json::from_value(wire.body)
                .map(SelectResponse::Complete)
                .map_err(D::Error::custom)
        } else {
            serde_json::from_value(wire.body)
                .map(SelectResponse::Next)
                .map_err(D::Error::custom)
        }
    }
}

/// Read-only snapshot of a live or finished game
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub game_id: String,
    pub status: GameStatus,
    pub current_round: usize,
    pub round_number: usize,
    pub match_in_round: usize,
    pub matches_in_round: usize,
    pub remaining: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_match: Option<MatchView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bye: Option<Candidate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub champion: Option<Candidate>,
    pub started_at: DateTime<Utc>,
}

/// Per-candidate play record
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateStats {
    pub id: String,
    pub name: String,
    pub play_count: u64,
    pub win_count: u64,
}

/// Response of `GET /api/yumcup/stats`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub games_started: u64,
    pub games_completed: u64,
    pub active_games: usize,
    pub candidates: Vec<CandidateStats>,
}

// ========================================
// Error Response Types
// ========================================

/// Error detail inside [`ErrorResponse`]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorDetail {
    /// Machine-readable code, e.g. `INVALID_SELECTION`
    pub code: String,
    /// Human-readable text
    pub message: String,
}

/// Body of every non-2xx response
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
    pub timestamp: DateTime<Utc>,
}
