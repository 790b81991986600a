//! HTTP API handlers for yumcup-gs

pub mod game;
pub mod health;

pub use game::game_routes;
pub use health::health_routes;
