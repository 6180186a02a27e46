//! Behavioral profiling of group-chat transcripts.
//!
//! The pipeline is strictly sequential: [`parsers`] turns raw export text
//! into message records, [`features`] aggregates them into one vector per
//! participant, [`clustering`] standardizes and partitions those vectors,
//! and [`profiling`] maps clusters and raw features to narratives and
//! influence scores. [`pipeline::analyze_transcript`] runs all four.

#![deny(missing_docs, unsafe_code)]

/// Transcript parsing with date-format locking.
pub mod parsers;

/// Per-message text signals (emoji, links, casing).
pub mod nlp;

/// Per-user feature extraction.
pub mod features;

/// Standardization and k-means clustering.
pub mod clustering;

/// Archetype labelling, narratives and influence scores.
pub mod profiling;

/// End-to-end pipeline driver.
pub mod pipeline;

/// Error types for analysis operations.
pub mod error;

pub use error::{AnalysisError, AnalysisResult};
pub use pipeline::analyze_transcript;
