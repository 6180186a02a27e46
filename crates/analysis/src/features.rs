//! Per-user behavioral feature extraction.

use crate::nlp::TextSignals;
use chrono::{NaiveDateTime, Timelike};
use groupscope_core::{AnalysisConfig, MessageRecord, UserFeatureVector};
use std::collections::BTreeMap;
use tracing::{info, instrument};

#[derive(Debug, Default)]
struct UserAccumulator {
    count: usize,
    first: Option<NaiveDateTime>,
    last: Option<NaiveDateTime>,
    response_hours: f64,
    response_samples: usize,
    night: usize,
    lengths: Vec<usize>,
    emoji: usize,
    exclamations: usize,
    questions: usize,
    uppercase: f64,
    links: usize,
    initiations: usize,
}

impl UserAccumulator {
    fn observe_time(&mut self, timestamp: NaiveDateTime) {
        self.first = Some(self.first.map_or(timestamp, |t| t.min(timestamp)));
        self.last = Some(self.last.map_or(timestamp, |t| t.max(timestamp)));
    }

    fn into_vector(mut self, user: String) -> UserFeatureVector {
        let count = self.count.max(1) as f64;
        let days = match (self.first, self.last) {
            (Some(first), Some(last)) => (last.date() - first.date()).num_days() + 1,
            _ => 1,
        }
        .max(1) as f64;
        let total_chars: usize = self.lengths.iter().sum();

        self.lengths.sort_unstable();
        let median_length = median(&self.lengths);

        UserFeatureVector {
            user,
            message_count: self.count,
            messages_per_day: self.count as f64 / days,
            avg_response_time_hours: if self.response_samples == 0 {
                0.0
            } else {
                self.response_hours / self.response_samples as f64
            },
            response_samples: self.response_samples,
            night_activity_ratio: self.night as f64 / count,
            avg_length: total_chars as f64 / count,
            median_length,
            total_chars,
            emoji_rate: self.emoji as f64 / count,
            exclamation_rate: self.exclamations as f64 / count,
            question_rate: self.questions as f64 / count,
            uppercase_rate: self.uppercase / count,
            total_links: self.links,
            link_share_rate: self.links as f64 / count,
            initiations: self.initiations,
            initiation_rate: self.initiations as f64 / count,
        }
    }
}

/// Median of a sorted slice, 0 when empty.
fn median(sorted: &[usize]) -> f64 {
    match sorted.len() {
        0 => 0.0,
        n if n % 2 == 1 => sorted[n / 2] as f64,
        n => (sorted[n / 2 - 1] + sorted[n / 2]) as f64 / 2.0,
    }
}

/// Build one feature vector per participant, ordered by user name.
///
/// Every record has a real sender; system events never reach this stage, so
/// replies and silence gaps are measured between participant messages only.
#[instrument(skip_all, fields(records = records.len()))]
pub fn extract_features(
    records: &[MessageRecord],
    config: &AnalysisConfig,
) -> Vec<UserFeatureVector> {
    let gap_seconds = config.initiation_gap_minutes.saturating_mul(60);
    let mut users: BTreeMap<&str, UserAccumulator> = BTreeMap::new();
    let mut previous: Option<&MessageRecord> = None;

    for record in records {
        let signals = TextSignals::measure(&record.text);
        let acc = users.entry(record.user.as_str()).or_default();

        acc.count += 1;
        acc.observe_time(record.timestamp);
        acc.lengths.push(signals.chars);
        acc.emoji += signals.emoji;
        acc.exclamations += signals.exclamations;
        acc.questions += signals.questions;
        acc.uppercase += signals.uppercase_ratio;
        if signals.has_link {
            acc.links += 1;
        }
        if config.is_night_hour(record.timestamp.hour()) {
            acc.night += 1;
        }

        match previous {
            Some(prev) => {
                let gap = (record.timestamp - prev.timestamp).num_seconds();
                if prev.user != record.user {
                    acc.response_hours += gap.max(0) as f64 / 3600.0;
                    acc.response_samples += 1;
                }
                if gap > gap_seconds {
                    acc.initiations += 1;
                }
            }
            None => acc.initiations += 1,
        }
        previous = Some(record);
    }

    let vectors: Vec<UserFeatureVector> = users
        .into_iter()
        .map(|(user, acc)| acc.into_vector(user.to_string()))
        .collect();
    info!(users = vectors.len(), "Extracted features");
    vectors
}
