//! # YumCup Client Library
//!
//! Caller side of the bracket game, for embedding in presentation shells:
//! - Position acquisition with prefetch and a shared cache
//! - HTTP session client for the game server
//! - Client-side bracket for the stateless start endpoint
//! - Launcher tying acquisition to game start

pub mod geolocation;
pub mod launcher;
pub mod legacy;
pub mod session;

pub use geolocation::{GeolocationSource, PositionCallback, PositionError, PositionOptions, PositionProvider};
pub use launcher::GameLauncher;
pub use legacy::{LegacyBracket, LegacyOutcome};
pub use session::SessionClient;
