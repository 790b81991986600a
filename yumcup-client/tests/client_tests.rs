//! Integration tests for yumcup-client against a live yumcup-gs router
//!
//! Tests cover:
//! - Full game through SessionClient
//! - Error bodies decoded into the shared taxonomy
//! - No retries: one request observed per failed call
//! - GameLauncher: prefetch + acquire + start
//! - LegacyBracket fed by the stateless start endpoint

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use yumcup_client::{
    GameLauncher, GeolocationSource, LegacyBracket, LegacyOutcome, PositionCallback,
    PositionOptions, PositionProvider, SessionClient,
};
use yumcup_common::api::{GameStatus, SelectResponse};
use yumcup_common::config::LegacyConfig;
use yumcup_common::{Candidate, Coordinates, Error};
use yumcup_gs::engine::GameRegistry;
use yumcup_gs::provider::StaticProvider;
use yumcup_gs::{build_router, AppState};

const CENTER: Coordinates = Coordinates {
    latitude: 37.5665,
    longitude: 126.9780,
};

fn venues(n: usize) -> Vec<Candidate> {
    (0..n)
        .map(|i| {
            let mut c = Candidate::new(format!("v{}", i), format!("Venue {}", i));
            c.location = Some(Coordinates::new(
                CENTER.latitude + 0.001 * (i as f64 + 1.0),
                CENTER.longitude,
            ));
            c
        })
        .collect()
}

/// Test helper: Serve the real router on an ephemeral port
async fn spawn_server(n: usize) -> String {
    let registry = Arc::new(GameRegistry::new(Duration::from_secs(1800)));
    let state = AppState::new(
        Arc::new(StaticProvider::new(venues(n))),
        registry,
        16,
        LegacyConfig::default(),
    );
    serve(build_router(state)).await
}

async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

struct FixedPlatform {
    fix: Coordinates,
    calls: AtomicUsize,
}

impl PositionProvider for FixedPlatform {
    fn is_available(&self) -> bool {
        true
    }

    fn get_current_position(&self, _options: PositionOptions, callback: PositionCallback) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        callback(Ok(self.fix));
    }
}

// =============================================================================
// SessionClient Tests
// =============================================================================

#[tokio::test]
async fn test_full_game_over_http() {
    let base_url = spawn_server(8).await;
    let client = SessionClient::new(&base_url).unwrap();

    let start = client.start_location(CENTER, 2000).await.unwrap();
    assert_eq!(start.status, GameStatus::InProgress);
    assert_eq!(start.current_round, 8);
    assert_eq!(start.matches_in_round, 4);

    let mut current = start.current_match;
    let mut selections = 0;
    let champion = loop {
        selections += 1;
        let response = client
            .select(&start.game_id, &current.id, &current.slot_b.id)
            .await
            .unwrap();
        match response {
            SelectResponse::Next(next) => current = next.next_match,
            SelectResponse::Complete(done) => break done.winner,
        }
    };
    // n - 1 matches for 8 candidates
    assert_eq!(selections, 7);

    let summary = client.get_game(&start.game_id).await.unwrap();
    assert_eq!(summary.status, GameStatus::Completed);
    assert_eq!(summary.champion.unwrap().id, champion.id);
}

#[tokio::test]
async fn test_contract_violations_decoded() {
    let base_url = spawn_server(4).await;
    let client = SessionClient::new(&base_url).unwrap();
    let start = client.start_location(CENTER, 2000).await.unwrap();

    let err = client
        .select(&start.game_id, "2-1", &start.current_match.slot_a.id)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSelection(_)));
    assert!(err.is_contract_violation());

    let err = client
        .get_game("00000000-0000-4000-8000-000000000000")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_empty_area_is_recoverable() {
    let base_url = spawn_server(4).await;
    let client = SessionClient::new(&base_url).unwrap();

    let err = client.start_location(CENTER, 50).await.unwrap_err();
    assert!(matches!(err, Error::NoCandidatesFound { radius: 50, .. }));
    assert!(err.is_user_recoverable());
}

#[tokio::test]
async fn test_failed_call_is_not_retried() {
    let hits = Arc::new(AtomicUsize::new(0));
    let router = Router::new()
        .route(
            "/api/yumcup/start/location",
            post(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({
                        "error": { "code": "PROVIDER_UNAVAILABLE", "message": "Provider error: down" },
                        "timestamp": "2024-01-01T00:00:00Z"
                    })),
                )
            }),
        )
        .with_state(hits.clone());
    let base_url = serve(router).await;
    let client = SessionClient::new(&base_url).unwrap();

    let err = client.start_location(CENTER, 1000).await.unwrap_err();
    assert!(matches!(err, Error::Remote { status: 503, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_unreachable_server_is_network_failure() {
    // Bind then drop to get a port nobody listens on
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = SessionClient::new(&format!("http://{}", addr)).unwrap();
    let err = client.start_legacy().await.unwrap_err();
    assert!(matches!(err, Error::NetworkFailure(_)));
    assert!(err.is_user_recoverable());
}

// =============================================================================
// Launcher, Legacy Tests
// =============================================================================

#[tokio::test]
async fn test_launcher_uses_prefetched_position() {
    let base_url = spawn_server(4).await;
    let platform = Arc::new(FixedPlatform {
        fix: CENTER,
        calls: AtomicUsize::new(0),
    });
    let launcher = GameLauncher::new(
        GeolocationSource::new(platform.clone()),
        SessionClient::new(&base_url).unwrap(),
    );

    launcher.prepare().await.unwrap();
    let start = launcher.launch(&CancellationToken::new()).await.unwrap();

    assert_eq!(start.current_round, 4);
    assert_eq!(start.current_match.slot_a.id, "v0");
    assert_eq!(platform.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_launcher_cancelled_before_start() {
    let base_url = spawn_server(4).await;
    let platform = Arc::new(FixedPlatform {
        fix: CENTER,
        calls: AtomicUsize::new(0),
    });
    let launcher = GameLauncher::new(
        GeolocationSource::new(platform.clone()),
        SessionClient::new(&base_url).unwrap(),
    );
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = launcher.launch(&cancel).await.unwrap_err();
    assert!(matches!(err, Error::Cancelled));
    assert_eq!(platform.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_legacy_list_plays_to_champion() {
    let base_url = spawn_server(5).await;
    let client = SessionClient::new(&base_url).unwrap();

    let list = client.start_legacy().await.unwrap();
    assert_eq!(list.len(), 5);

    let mut bracket = LegacyBracket::new(list).unwrap();
    assert_eq!(bracket.bye().unwrap().id, "v4");
    let champion = loop {
        let id = bracket.current_pair().unwrap().1.id.clone();
        if let LegacyOutcome::Champion(c) = bracket.pick(&id).unwrap() {
            break c;
        }
    };
    assert_eq!(bracket.champion(), Some(&champion));
}

#[tokio::test]
async fn test_server_health_reachable() {
    let base_url = spawn_server(2).await;
    let body: Value = reqwest::get(format!("{}/health", base_url))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["module"], "yumcup-gs");
}
