//! Core types, errors, and configuration for groupscope.
//!
//! This crate provides the data model shared by the analysis pipeline and the
//! command-line front end: parsed message records, per-user feature vectors,
//! behavior profiles, and the report table handed to output writers.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use config::{AnalysisConfig, GroupscopeConfig, InfluenceWeights};
pub use error::{Error, Result};
pub use types::*;
