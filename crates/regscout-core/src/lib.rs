//! Core types and configuration for the regscout registry harvester.
//!
//! This crate holds what every other regscout crate needs: the TOML-backed
//! configuration, the central error types, validated identifier newtypes,
//! and the static directory data for the target registry (professions,
//! states, suburbs, and the search alphabet).

pub mod config;
pub mod directory;
pub mod error;
pub mod types;

pub use config::{
    AppConfig, ClientConfig, PathsConfig, SearchConfig, ThrottleProfile, ThrottleSettings,
};
pub use error::{ConfigError, ConfigResult, CoreError, Result};
pub use types::{RegId, Timestamp};
