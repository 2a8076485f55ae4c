//! Configuration Module
//!
//! Environment-driven settings for the telemetry client.

mod settings;

pub use settings::{ClientConfig, LogSettings, StreamSettings};
