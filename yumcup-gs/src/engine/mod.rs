//! Tournament bracket engine
//!
//! [`bracket`] is the pure state machine; [`registry`] keeps live games and
//! serializes selections per game.

pub mod bracket;
pub mod registry;

pub use bracket::{Advance, Bracket, Match, Outcome, Phase, Resolution};
pub use registry::GameRegistry;
