//! Common error types for YumCup
//!
//! One taxonomy shared by the server, the client, and the acquisition flow.
//! Variants fall into three groups:
//! - acquisition failures (location, empty search result), user-recoverable
//! - engine contract violations, caller bugs that never mutate a bracket
//! - transport and infrastructure failures

use thiserror::Error;

/// Common result type for YumCup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across YumCup crates
#[derive(Error, Debug)]
pub enum Error {
    /// Platform has no location capability, or it could not determine a position
    #[error("Location unavailable: {0}")]
    LocationUnavailable(String),

    /// User refused location permission
    #[error("Location permission denied")]
    LocationDenied,

    /// No fix arrived within the allowed wait
    #[error("Location request timed out after {0} ms")]
    LocationTimeout(u64),

    /// Caller abandoned a pending operation
    #[error("Operation cancelled")]
    Cancelled,

    /// Catalog search returned fewer than two venues
    #[error("No candidates found: {found} venue(s) within {radius} m")]
    NoCandidatesFound { found: usize, radius: u32 },

    /// Bracket seeding was attempted with fewer than two candidates
    #[error("Insufficient candidates: need at least 2, got {0}")]
    InsufficientCandidates(usize),

    /// Selection referenced an unknown game, a stale match, or a non-participant
    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    /// Selection submitted after the champion was decided
    #[error("Game already complete: {0}")]
    GameAlreadyComplete(String),

    /// Transport-level failure talking to a remote service
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    /// Remote service answered with a non-success status
    #[error("Remote error {status}: {message}")]
    Remote { status: u16, message: String },

    /// Candidate catalog failure (bad response, upstream error)
    #[error("Provider error: {0}")]
    Provider(String),

    /// Candidate catalog did not answer in time
    #[error("Provider timed out: {0}")]
    ProviderTimeout(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid user input or request parameter
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding/decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the user can fix this by retrying, changing permission,
    /// widening the radius, or moving.
    pub fn is_user_recoverable(&self) -> bool {
        matches!(
            self,
            Error::LocationUnavailable(_)
                | Error::LocationDenied
                | Error::LocationTimeout(_)
                | Error::NoCandidatesFound { .. }
                | Error::NetworkFailure(_)
                | Error::ProviderTimeout(_)
        )
    }

    /// Engine contract violations: programming errors on the caller side
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::InsufficientCandidates(_)
                | Error::InvalidSelection(_)
                | Error::GameAlreadyComplete(_)
        )
    }

    /// Short message suitable for showing next to a manual retry action
    pub fn user_message(&self) -> String {
        match self {
            Error::LocationUnavailable(_) => {
                "We couldn't determine your location. Please try again.".to_string()
            }
            Error::LocationDenied => {
                "Location permission is required. Allow location access and try again."
                    .to_string()
            }
            Error::LocationTimeout(_) => {
                "Finding your location took too long. Please try again.".to_string()
            }
            Error::NoCandidatesFound { radius, .. } => format!(
                "Not enough venues within {} m. Try a wider radius or another location.",
                radius
            ),
            Error::NetworkFailure(_) | Error::ProviderTimeout(_) => {
                "Connection problem. Please try again.".to_string()
            }
            Error::Cancelled => "Cancelled.".to_string(),
            other => format!("Something went wrong: {}", other),
        }
    }
}
