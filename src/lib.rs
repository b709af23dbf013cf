//! Swim training statistics.
//!
//! `ingest` turns loosely-typed JSON into the closed types of `types`;
//! `stats`, `progress` and `recommend` are pure functions over those.

pub mod api;
pub mod cli;
pub mod ingest;
pub mod progress;
pub mod recommend;
pub mod stats;
pub mod types;
pub mod utils;
