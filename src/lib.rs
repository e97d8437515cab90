//! Pulseboard Library
//!
//! Backend pipeline for a live crypto breakout dashboard: fetch the
//! top-100 market universe, derive breakout proxy scores, republish
//! every 30 seconds.

pub mod clock;
pub mod config;
pub mod market;
pub mod metrics;
pub mod mock;
pub mod pipeline;
pub mod types;

#[cfg(feature = "dashboard")]
pub mod dashboard;
