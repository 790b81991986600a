//! # YumCup Common Library
//!
//! Shared code for the YumCup game server and client:
//! - Candidate schema and boundary normalization
//! - API request/response types
//! - Error taxonomy
//! - Configuration loading
//! - Coordinate helpers (distance, geohash)

pub mod api;
pub mod candidate;
pub mod config;
pub mod error;
pub mod geo;

pub use candidate::{Candidate, PriceLevel};
pub use error::{Error, Result};
pub use geo::Coordinates;
