//! Play button flow: locate the user, then start a game there

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use yumcup_common::api::StartResponse;
use yumcup_common::{Error, Result};

use crate::geolocation::GeolocationSource;
use crate::session::SessionClient;

/// Default search radius in meters
pub const DEFAULT_RADIUS_M: u32 = 1000;
/// Default bound on waiting for a position
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(10);

pub struct GameLauncher {
    geolocation: GeolocationSource,
    session: SessionClient,
    radius: u32,
    max_wait: Duration,
}

impl GameLauncher {
    pub fn new(geolocation: GeolocationSource, session: SessionClient) -> Self {
        Self {
            geolocation,
            session,
            radius: DEFAULT_RADIUS_M,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    pub fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Warm the position cache as soon as the shell is shown
    pub fn prepare(&self) -> JoinHandle<()> {
        self.geolocation.prefetch()
    }

    /// Acquire a position and start a game around it
    ///
    /// Errors come back unchanged for the shell to show with
    /// [`Error::user_message`]; nothing is retried here.
    pub async fn launch(&self, cancel: &CancellationToken) -> Result<StartResponse> {
        let center = self.geolocation.acquire(self.max_wait, cancel).await?;

        let started = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            started = self.session.start_location(center, self.radius) => started,
        };

        match &started {
            Ok(start) => info!(
                game_id = %start.game_id,
                round = start.current_round,
                "Game launched"
            ),
            Err(e) => warn!(error = %e, recoverable = e.is_user_recoverable(), "Launch failed"),
        }
        started
    }
}
