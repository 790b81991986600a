//! Position acquisition
//!
//! Wraps a callback-style platform geolocation API ([`PositionProvider`])
//! behind async operations. [`GeolocationSource::prefetch`] fires a cheap,
//! low-accuracy request in the background; [`GeolocationSource::acquire`]
//! serves a fresh cached fix or waits, bounded and cancellable, for a
//! high-accuracy one. Both share one cache.
//!
//! A cancelled acquire never writes the cache: the platform callback's
//! receiver is dropped with the acquire future, so a late fix is discarded.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use yumcup_common::{Coordinates, Error, Result};

/// Cached fixes younger than this are served without a platform call
pub const DEFAULT_FRESHNESS: Duration = Duration::from_secs(60);

/// Upper bound for a background prefetch
pub const PREFETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Request options passed to the platform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest platform-cached position the caller will accept
    pub maximum_age: Duration,
}

impl PositionOptions {
    /// Coarse, cheap fix for prefetch
    pub fn low_accuracy() -> Self {
        Self {
            high_accuracy: false,
            timeout: PREFETCH_TIMEOUT,
            maximum_age: DEFAULT_FRESHNESS,
        }
    }

    /// Precise fix for an on-demand acquire
    pub fn high_accuracy(timeout: Duration) -> Self {
        Self {
            high_accuracy: true,
            timeout,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Failure reported by the platform callback
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PositionError {
    #[error("permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("timeout")]
    Timeout,
}

impl PositionError {
    fn into_error(self, waited: Duration) -> Error {
        match self {
            PositionError::PermissionDenied => Error::LocationDenied,
            PositionError::PositionUnavailable(reason) => Error::LocationUnavailable(reason),
            PositionError::Timeout => Error::LocationTimeout(waited.as_millis() as u64),
        }
    }
}

/// One-shot completion handed to the platform
pub type PositionCallback =
    Box<dyn FnOnce(std::result::Result<Coordinates, PositionError>) + Send + 'static>;

/// Platform geolocation capability
///
/// Implementations invoke `callback` at most once, from any thread. Never
/// invoking it is allowed; the caller's own timeout covers that.
pub trait PositionProvider: Send + Sync {
    /// Whether the platform can locate at all
    fn is_available(&self) -> bool;

    fn get_current_position(&self, options: PositionOptions, callback: PositionCallback);
}

#[derive(Debug, Clone, Copy)]
struct CachedFix {
    coordinates: Coordinates,
    captured_at: Instant,
}

/// Async position source with a shared freshness cache
#[derive(Clone)]
pub struct GeolocationSource {
    platform: Arc<dyn PositionProvider>,
    cache: Arc<Mutex<Option<CachedFix>>>,
    freshness: Duration,
}

impl GeolocationSource {
    pub fn new(platform: Arc<dyn PositionProvider>) -> Self {
        Self::with_freshness(platform, DEFAULT_FRESHNESS)
    }

    pub fn with_freshness(platform: Arc<dyn PositionProvider>, freshness: Duration) -> Self {
        Self {
            platform,
            cache: Arc::new(Mutex::new(None)),
            freshness,
        }
    }

    /// Cached fix, if still fresh
    pub async fn cached_fix(&self) -> Option<Coordinates> {
        let cache = self.cache.lock().await;
        (*cache)
            .filter(|fix| fix.captured_at.elapsed() < self.freshness)
            .map(|fix| fix.coordinates)
    }

    async fn store(&self, coordinates: Coordinates) {
        *self.cache.lock().await = Some(CachedFix {
            coordinates,
            captured_at: Instant::now(),
        });
    }

    /// Store a fix requested at `requested_at` unless a later one already landed
    async fn store_unless_superseded(&self, coordinates: Coordinates, requested_at: Instant) -> bool {
        let mut cache = self.cache.lock().await;
        if matches!(*cache, Some(fix) if fix.captured_at >= requested_at) {
            return false;
        }
        *cache = Some(CachedFix {
            coordinates,
            captured_at: Instant::now(),
        });
        true
    }

    fn request(
        &self,
        options: PositionOptions,
    ) -> oneshot::Receiver<std::result::Result<Coordinates, PositionError>> {
        let (tx, rx) = oneshot::channel();
        self.platform.get_current_position(
            options,
            Box::new(move |result| {
                // Receiver gone means the waiter was cancelled or timed out
                let _ = tx.send(result);
            }),
        );
        rx
    }

    /// Warm the cache in the background
    ///
    /// Never fails: errors are logged at debug and the cache is left as is.
    /// A coarse fix arriving after an acquire stored a precise one is dropped.
    pub fn prefetch(&self) -> JoinHandle<()> {
        let source = self.clone();
        tokio::spawn(async move {
            if !source.platform.is_available() {
                debug!("Prefetch skipped: no geolocation capability");
                return;
            }
            let options = PositionOptions::low_accuracy();
            let requested_at = Instant::now();
            let rx = source.request(options);
            match tokio::time::timeout(options.timeout, rx).await {
                Ok(Ok(Ok(coordinates))) => {
                    if source.store_unless_superseded(coordinates, requested_at).await {
                        debug!(
                            latitude = coordinates.latitude,
                            longitude = coordinates.longitude,
                            "Prefetched position"
                        );
                    } else {
                        debug!("Prefetched position discarded: newer fix cached");
                    }
                }
                Ok(Ok(Err(e))) => debug!(error = %e, "Prefetch failed"),
                Ok(Err(_)) => debug!("Prefetch callback dropped"),
                Err(_) => debug!("Prefetch timed out"),
            }
        })
    }

    /// Current position, waiting at most `max_wait`
    ///
    /// # Errors
    /// - [`Error::LocationUnavailable`] without capability or position
    /// - [`Error::LocationDenied`] when permission is refused
    /// - [`Error::LocationTimeout`] when no fix arrives in time
    /// - [`Error::Cancelled`] when `cancel` fires first
    pub async fn acquire(&self, max_wait: Duration, cancel: &CancellationToken) -> Result<Coordinates> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if let Some(coordinates) = self.cached_fix().await {
            debug!("Serving cached position");
            return Ok(coordinates);
        }
        if !self.platform.is_available() {
            return Err(Error::LocationUnavailable(
                "geolocation is not supported on this platform".to_string(),
            ));
        }

        let rx = self.request(PositionOptions::high_accuracy(max_wait));
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Location request cancelled");
                return Err(Error::Cancelled);
            }
            outcome = tokio::time::timeout(max_wait, rx) => outcome,
        };

        let coordinates = match outcome {
            Err(_) => {
                warn!(max_wait_ms = max_wait.as_millis() as u64, "Location request timed out");
                return Err(Error::LocationTimeout(max_wait.as_millis() as u64));
            }
            Ok(Err(_)) => {
                return Err(Error::LocationUnavailable(
                    "platform dropped the location request".to_string(),
                ))
            }
            Ok(Ok(result)) => result.map_err(|e| e.into_error(max_wait))?,
        };

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.store(coordinates).await;
        Ok(coordinates)
    }
}
