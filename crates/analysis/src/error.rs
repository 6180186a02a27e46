use thiserror::Error;

/// Errors that can abort a pipeline run.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The transcript contains no parseable message line.
    #[error("Empty transcript: no parseable message lines found")]
    EmptyTranscript,
    /// Message headers were found but their dates fit no supported format.
    #[error(
        "Unsupported date format: {sample:?} matches none of DD/MM/YYYY, MM/DD/YYYY, YYYY-MM-DD"
    )]
    UnsupportedDateFormat {
        /// First offending line.
        sample: String,
    },
    /// Fewer participants than requested clusters.
    #[error(
        "Insufficient data: {requested} clusters requested but only {users} distinct users; use n_clusters <= {users}"
    )]
    InsufficientData {
        /// Distinct participants available.
        users: usize,
        /// Requested cluster count.
        requested: usize,
    },
    /// Invalid pipeline parameters.
    #[error("Configuration error: {0}")]
    InvalidConfig(String),
    /// Error raised by the core crate.
    #[error(transparent)]
    Core(#[from] groupscope_core::Error),
}

/// Result type alias for analysis operations.
pub type AnalysisResult<T> = Result<T, AnalysisError>;
