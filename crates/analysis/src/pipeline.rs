//! Runs parse, extract, cluster and profile in sequence.

use crate::clustering::cluster_users;
use crate::error::{AnalysisError, AnalysisResult};
use crate::features::extract_features;
use crate::parsers::TranscriptParser;
use crate::profiling::{assign_labels, generate_profiles, summarize_clusters};
use groupscope_core::{AnalysisConfig, AnalysisReport, UserReport};
use tracing::{info, instrument};

/// Analyze a transcript, detecting its date order.
pub fn analyze_transcript(text: &str, config: &AnalysisConfig) -> AnalysisResult<AnalysisReport> {
    analyze_with_parser(&TranscriptParser::new(), text, config)
}

/// Analyze a transcript with a preconfigured parser.
///
/// Rows come back ordered by influence (highest first, ties by user name),
/// clusters by id.
#[instrument(skip_all, fields(k = config.n_clusters, seed = config.random_state))]
pub fn analyze_with_parser(
    parser: &TranscriptParser,
    text: &str,
    config: &AnalysisConfig,
) -> AnalysisResult<AnalysisReport> {
    config
        .validate()
        .map_err(|e| match e {
            groupscope_core::Error::Validation(msg) => AnalysisError::InvalidConfig(msg),
            other => AnalysisError::Core(other),
        })?;

    let transcript = parser.parse(text)?;
    let features = extract_features(&transcript.records, config);
    let assignment = cluster_users(&features, config)?;
    let labels = assign_labels(&assignment, config);
    let profiles = generate_profiles(&features, &assignment, &labels, config);
    let clusters = summarize_clusters(&features, &profiles, &labels);

    let mut rows: Vec<UserReport> = features
        .into_iter()
        .zip(profiles)
        .map(|(features, profile)| UserReport {
            features,
            cluster_id: profile.cluster_id,
            cluster_label: profile.cluster_label.to_string(),
            influence_score: profile.influence_score,
            behavior_profile: profile.narrative,
        })
        .collect();
    rows.sort_by(|a, b| {
        b.influence_score
            .total_cmp(&a.influence_score)
            .then_with(|| a.features.user.cmp(&b.features.user))
    });

    info!(
        users = rows.len(),
        clusters = clusters.len(),
        "Analysis complete"
    );
    Ok(AnalysisReport {
        rows,
        clusters,
        parse: transcript.summary,
    })
}
