//! API types shared by the game server and its callers

pub mod types;

pub use types::*;
