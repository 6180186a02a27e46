//! Report writers for analysis results.

use crate::commands::OutputFormat;
use crate::error::Result;
use groupscope_core::{AnalysisReport, ClusterSummary, FeatureKind, FormatLock, UserReport};
use std::fmt::Write as _;

/// Render a report. With `summary`, only the per-cluster table is written.
pub fn render(
    report: &AnalysisReport,
    format: OutputFormat,
    decimals: usize,
    summary: bool,
) -> Result<String> {
    let rendered = match (format, summary) {
        (OutputFormat::Json, false) => serde_json::to_string_pretty(report)? + "\n",
        (OutputFormat::Json, true) => serde_json::to_string_pretty(&report.clusters)? + "\n",
        (OutputFormat::Csv, false) => rows_csv(&report.rows, decimals),
        (OutputFormat::Csv, true) => clusters_csv(&report.clusters, decimals),
        (OutputFormat::Text, false) => rows_text(report, decimals),
        (OutputFormat::Text, true) => clusters_text(&report.clusters, decimals),
    };
    Ok(rendered)
}

fn csv_escape(v: &str) -> String {
    let escaped = v.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

fn fixed(value: f64, decimals: usize) -> String {
    format!("{:.*}", decimals, value)
}

fn rows_csv(rows: &[UserReport], decimals: usize) -> String {
    let mut header = vec!["user", "cluster_id", "cluster_label", "message_count"];
    header.extend(FeatureKind::ALL.iter().map(|kind| kind.column_name()));
    header.extend([
        "response_samples",
        "total_chars",
        "total_links",
        "initiations",
        "influence_score",
        "behavior_profile",
    ]);

    let mut out = header.join(",");
    out.push('\n');
    for row in rows {
        let f = &row.features;
        let mut fields = vec![
            csv_escape(&f.user),
            row.cluster_id.to_string(),
            csv_escape(&row.cluster_label),
            f.message_count.to_string(),
        ];
        fields.extend(
            FeatureKind::ALL
                .iter()
                .map(|kind| fixed(f.value(*kind), decimals)),
        );
        fields.extend([
            f.response_samples.to_string(),
            f.total_chars.to_string(),
            f.total_links.to_string(),
            f.initiations.to_string(),
            fixed(row.influence_score, decimals),
            csv_escape(&row.behavior_profile),
        ]);
        out.push_str(&fields.join(","));
        out.push('\n');
    }
    out
}

fn clusters_csv(clusters: &[ClusterSummary], decimals: usize) -> String {
    let mut out =
        String::from("cluster_id,cluster_label,user_count,avg_messages_per_day,avg_influence_score\n");
    for c in clusters {
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            c.cluster_id,
            csv_escape(&c.cluster_label),
            c.user_count,
            fixed(c.avg_messages_per_day, decimals),
            fixed(c.avg_influence_score, decimals)
        );
    }
    out
}

fn rows_text(report: &AnalysisReport, decimals: usize) -> String {
    let parse = &report.parse;
    let lock = match parse.format_lock {
        FormatLock::Disambiguated { line_number } => format!("detected at line {}", line_number),
        FormatLock::Defaulted => "assumed".to_string(),
        FormatLock::Forced => "forced".to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Parsed {} messages from {} participants (dates {}, {})",
        parse.records,
        report.rows.len(),
        parse.date_order,
        lock
    );
    if parse.inconsistent_lines > 0 {
        let _ = writeln!(
            out,
            "{} header lines did not match the date format and were kept as message text",
            parse.inconsistent_lines
        );
    }

    for (rank, row) in report.rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "\n{}. {} [{}]\n   messages: {}  per day: {}  influence: {}\n   {}",
            rank + 1,
            row.features.user,
            row.cluster_label,
            row.features.message_count,
            fixed(row.features.messages_per_day, decimals),
            fixed(row.influence_score, decimals),
            row.behavior_profile
        );
    }
    out
}

fn clusters_text(clusters: &[ClusterSummary], decimals: usize) -> String {
    let width = clusters
        .iter()
        .map(|c| c.cluster_label.chars().count())
        .max()
        .unwrap_or(0)
        .max("Label".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<7}  {:<width$}  {:>5}  {:>12}  {:>9}",
        "Cluster",
        "Label",
        "Users",
        "Msgs per day",
        "Influence",
        width = width
    );
    for c in clusters {
        let _ = writeln!(
            out,
            "{:<7}  {:<width$}  {:>5}  {:>12}  {:>9}",
            c.cluster_id,
            c.cluster_label,
            c.user_count,
            fixed(c.avg_messages_per_day, decimals),
            fixed(c.avg_influence_score, decimals),
            width = width
        );
    }
    out
}
