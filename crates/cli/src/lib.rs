//! Command-line interface for groupscope.
//!
//! Reads chat exports from disk, runs the analysis pipeline and writes the
//! resulting report as text, JSON or CSV. Also generates synthetic sample
//! transcripts and default configuration files.

#![deny(missing_docs, unsafe_code)]

/// CLI command definitions and parsing.
pub mod commands;

/// CLI application entry point and configuration.
pub mod app;

/// Report rendering.
pub mod report;

/// Synthetic sample transcript generator.
pub mod sample;

/// Error types for CLI operations.
pub mod error;
