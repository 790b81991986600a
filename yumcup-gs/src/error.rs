//! HTTP error mapping for yumcup-gs
//!
//! Every failure leaves the server as a non-2xx status with an
//! [`ErrorResponse`] body: a stable machine code plus the human-readable
//! message. 5xx responses log at error, everything else at warn.

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use thiserror::Error;
use tracing::{error, warn};
use yumcup_common::api::{ErrorDetail, ErrorResponse};

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Domain error from the engine, seeding, or provider
    #[error(transparent)]
    Game(#[from] yumcup_common::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        use yumcup_common::Error as E;
        let ApiError::Game(err) = self;
        match err {
            E::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            E::InsufficientCandidates(_) => (StatusCode::BAD_REQUEST, "INSUFFICIENT_CANDIDATES"),
            E::NoCandidatesFound { .. } => (StatusCode::BAD_REQUEST, "NO_CANDIDATES_FOUND"),
            E::InvalidSelection(_) => (StatusCode::CONFLICT, "INVALID_SELECTION"),
            E::GameAlreadyComplete(_) => (StatusCode::CONFLICT, "GAME_ALREADY_COMPLETE"),
            E::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            E::Provider(_) | E::NetworkFailure(_) | E::Remote { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "PROVIDER_UNAVAILABLE")
            }
            E::ProviderTimeout(_) => (StatusCode::GATEWAY_TIMEOUT, "PROVIDER_TIMEOUT"),
            E::LocationUnavailable(_) => (StatusCode::BAD_REQUEST, "LOCATION_UNAVAILABLE"),
            E::LocationDenied => (StatusCode::BAD_REQUEST, "LOCATION_DENIED"),
            E::LocationTimeout(_) => (StatusCode::BAD_REQUEST, "LOCATION_TIMEOUT"),
            E::Cancelled => (StatusCode::BAD_REQUEST, "CANCELLED"),
            E::Config(_) | E::Io(_) | E::Json(_) | E::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.to_string();

        if status.is_server_error() {
            error!(code, %status, "{}", message);
        } else {
            warn!(code, %status, "{}", message);
        }

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
            timestamp: Utc::now(),
        });

        (status, body).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Game(yumcup_common::Error::InvalidInput(rejection.body_text()))
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
