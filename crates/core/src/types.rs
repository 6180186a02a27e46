use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a participant message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Plain text message.
    Text,

    /// Media placeholder (image, video, document omitted from the export).
    Media,
}

/// One parsed message from a transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    /// Local, timezone-naive timestamp.
    pub timestamp: NaiveDateTime,

    /// Display name as written in the export.
    pub user: String,

    /// Message body, possibly multi-line or empty.
    pub text: String,

    /// Message kind.
    pub kind: MessageKind,

    /// 1-based source line of the message header.
    pub line_number: usize,
}

/// Header line without a sender, such as a join or a subject change.
///
/// Kept apart from [`MessageRecord`] so every record `user` is a real
/// participant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemEvent {
    /// Local, timezone-naive timestamp.
    pub timestamp: NaiveDateTime,

    /// Event line as written.
    pub text: String,

    /// 1-based source line.
    pub line_number: usize,
}

/// Day/month/year ordering of a transcript's dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DateOrder {
    /// `DD/MM/YYYY`
    DayMonthYear,

    /// `MM/DD/YYYY`
    MonthDayYear,

    /// `YYYY-MM-DD`
    YearMonthDay,
}

impl DateOrder {
    /// All orders in priority order.
    pub const PRIORITY: [DateOrder; 3] = [
        DateOrder::DayMonthYear,
        DateOrder::MonthDayYear,
        DateOrder::YearMonthDay,
    ];
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateOrder::DayMonthYear => write!(f, "DD/MM/YYYY"),
            DateOrder::MonthDayYear => write!(f, "MM/DD/YYYY"),
            DateOrder::YearMonthDay => write!(f, "YYYY-MM-DD"),
        }
    }
}

/// Clock convention of message times.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClockStyle {
    /// `1:05 PM`
    TwelveHour,

    /// `13:05`
    TwentyFourHour,
}

/// How the date format of a transcript was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormatLock {
    /// Locked by a line whose values only fit one order.
    Disambiguated {
        /// Source line that settled the order.
        line_number: usize,
    },

    /// No line settled the order; the first priority order was assumed.
    Defaulted,

    /// The caller supplied the order.
    Forced,
}

/// Bookkeeping produced alongside parsed records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseSummary {
    /// Date order adopted for the whole transcript.
    pub date_order: DateOrder,

    /// How the order was chosen.
    pub format_lock: FormatLock,

    /// Clock style of the first message header.
    pub clock_style: ClockStyle,

    /// Number of records produced.
    pub records: usize,

    /// Lines appended to a previous message.
    pub continuation_lines: usize,

    /// Lines before the first message header, dropped.
    pub orphan_lines: usize,

    /// Header lines without a sender.
    pub system_events: usize,

    /// Media placeholder records.
    pub media_messages: usize,

    /// Header-shaped lines whose date does not fit the locked order.
    pub inconsistent_lines: usize,

    /// Records whose timestamp precedes the previous record's.
    pub out_of_order: usize,
}

/// Output of the transcript parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTranscript {
    /// Participant messages in source order.
    pub records: Vec<MessageRecord>,

    /// System events in source order.
    pub system_events: Vec<SystemEvent>,

    /// Parse bookkeeping.
    pub summary: ParseSummary,
}

/// Feature columns used for clustering, in matrix column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    AvgLength,
    MedianLength,
    MessagesPerDay,
    AvgResponseTimeHours,
    NightActivityRatio,
    EmojiRate,
    ExclamationRate,
    QuestionRate,
    UppercaseRate,
    LinkShareRate,
    InitiationRate,
}

impl FeatureKind {
    /// Every clustering column in matrix order.
    pub const ALL: [FeatureKind; 11] = [
        FeatureKind::AvgLength,
        FeatureKind::MedianLength,
        FeatureKind::MessagesPerDay,
        FeatureKind::AvgResponseTimeHours,
        FeatureKind::NightActivityRatio,
        FeatureKind::EmojiRate,
        FeatureKind::ExclamationRate,
        FeatureKind::QuestionRate,
        FeatureKind::UppercaseRate,
        FeatureKind::LinkShareRate,
        FeatureKind::InitiationRate,
    ];

    /// Column position in a feature matrix row.
    pub fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|kind| *kind == self)
            .unwrap_or_default()
    }

    /// Column name used in reports.
    pub fn column_name(self) -> &'static str {
        match self {
            FeatureKind::AvgLength => "avg_length",
            FeatureKind::MedianLength => "median_length",
            FeatureKind::MessagesPerDay => "messages_per_day",
            FeatureKind::AvgResponseTimeHours => "avg_response_time_hours",
            FeatureKind::NightActivityRatio => "night_activity_ratio",
            FeatureKind::EmojiRate => "emoji_rate",
            FeatureKind::ExclamationRate => "exclamation_rate",
            FeatureKind::QuestionRate => "question_rate",
            FeatureKind::UppercaseRate => "uppercase_rate",
            FeatureKind::LinkShareRate => "link_share_rate",
            FeatureKind::InitiationRate => "initiation_rate",
        }
    }
}

/// Behavioral features of one participant.
///
/// Every field is finite. Undefined ratios resolve to 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserFeatureVector {
    /// Display name.
    pub user: String,

    /// Number of participant messages.
    pub message_count: usize,

    /// Messages per calendar day of the user's active span.
    pub messages_per_day: f64,

    /// Mean hours between another user's message and this user's reply.
    /// 0 when `response_samples` is 0.
    pub avg_response_time_hours: f64,

    /// Messages that followed a different user.
    pub response_samples: usize,

    /// Fraction of messages sent in the night window.
    pub night_activity_ratio: f64,

    /// Mean message length in characters.
    pub avg_length: f64,

    /// Median message length in characters.
    pub median_length: f64,

    /// Total characters written.
    pub total_chars: usize,

    /// Mean emoji per message.
    pub emoji_rate: f64,

    /// Mean `!` per message.
    pub exclamation_rate: f64,

    /// Mean `?` per message.
    pub question_rate: f64,

    /// Mean share of uppercase letters per message.
    pub uppercase_rate: f64,

    /// Messages containing at least one link.
    pub total_links: usize,

    /// Fraction of messages containing a link.
    pub link_share_rate: f64,

    /// Messages that opened a new thread.
    pub initiations: usize,

    /// Fraction of messages that opened a new thread.
    pub initiation_rate: f64,
}

impl UserFeatureVector {
    /// Value of one clustering column.
    pub fn value(&self, kind: FeatureKind) -> f64 {
        match kind {
            FeatureKind::AvgLength => self.avg_length,
            FeatureKind::MedianLength => self.median_length,
            FeatureKind::MessagesPerDay => self.messages_per_day,
            FeatureKind::AvgResponseTimeHours => self.avg_response_time_hours,
            FeatureKind::NightActivityRatio => self.night_activity_ratio,
            FeatureKind::EmojiRate => self.emoji_rate,
            FeatureKind::ExclamationRate => self.exclamation_rate,
            FeatureKind::QuestionRate => self.question_rate,
            FeatureKind::UppercaseRate => self.uppercase_rate,
            FeatureKind::LinkShareRate => self.link_share_rate,
            FeatureKind::InitiationRate => self.initiation_rate,
        }
    }

    /// Clustering row in [`FeatureKind::ALL`] order.
    pub fn clustering_row(&self) -> Vec<f64> {
        FeatureKind::ALL.iter().map(|kind| self.value(*kind)).collect()
    }

    /// Whether the user ever replied to someone else.
    pub fn has_responses(&self) -> bool {
        self.response_samples > 0
    }
}

/// Per-feature standardization parameters computed for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standardizer {
    /// Column means.
    pub means: Vec<f64>,

    /// Column scales (population standard deviation, 1 for constant columns).
    pub scales: Vec<f64>,
}

/// Cluster assignment for every user of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterAssignment {
    /// Users in feature-table order.
    pub users: Vec<String>,

    /// Cluster id per user, aligned with `users`.
    pub labels: Vec<usize>,

    /// Centroids in standardized feature space, indexed by cluster id.
    pub centroids: Vec<Vec<f64>>,

    /// Standardized feature rows, aligned with `users`.
    pub standardized: Vec<Vec<f64>>,

    /// Standardization parameters of this run.
    pub standardizer: Standardizer,

    /// Sum of squared distances to assigned centroids.
    pub inertia: f64,

    /// Iterations used by the winning restart.
    pub iterations: usize,
}

impl ClusterAssignment {
    /// Number of clusters.
    pub fn cluster_count(&self) -> usize {
        self.centroids.len()
    }

    /// Cluster id of a user.
    pub fn cluster_of(&self, user: &str) -> Option<usize> {
        self.users
            .iter()
            .position(|candidate| candidate == user)
            .map(|idx| self.labels[idx])
    }
}

/// Named behavioral archetype for the default cluster count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Archetype {
    /// High message volume.
    ActiveConversationalist,

    /// Shares links and resources.
    InformationBroadcaster,

    /// Rarely writes.
    SilentObserver,

    /// Mostly active at night.
    NightOwl,

    /// Nothing stands out.
    RegularParticipant,
}

impl Archetype {
    /// Human-readable archetype name.
    pub fn name(self) -> &'static str {
        match self {
            Archetype::ActiveConversationalist => "Active Conversationalist",
            Archetype::InformationBroadcaster => "Information Broadcaster",
            Archetype::SilentObserver => "Silent Observer",
            Archetype::NightOwl => "Night Owl",
            Archetype::RegularParticipant => "Regular Participant",
        }
    }
}

/// Display label of a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClusterLabel {
    /// Named archetype.
    Archetype(Archetype),

    /// Name supplied through configuration.
    Custom(String),

    /// "Cluster N".
    Generic(usize),
}

impl fmt::Display for ClusterLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClusterLabel::Archetype(archetype) => write!(f, "{}", archetype.name()),
            ClusterLabel::Custom(name) => write!(f, "{}", name),
            ClusterLabel::Generic(id) => write!(f, "Cluster {}", id),
        }
    }
}

/// Narrative profile and influence of one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    /// Display name.
    pub user: String,

    /// Assigned cluster.
    pub cluster_id: usize,

    /// Label of the assigned cluster.
    pub cluster_label: ClusterLabel,

    /// Natural-language description.
    pub narrative: String,

    /// Composite influence in [0, 1].
    pub influence_score: f64,
}

/// One row of the final report table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserReport {
    /// Raw features.
    #[serde(flatten)]
    pub features: UserFeatureVector,

    /// Assigned cluster.
    pub cluster_id: usize,

    /// Rendered cluster label.
    pub cluster_label: String,

    /// Composite influence in [0, 1].
    pub influence_score: f64,

    /// Natural-language description.
    pub behavior_profile: String,
}

/// Aggregate of one cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterSummary {
    /// Cluster id.
    pub cluster_id: usize,

    /// Rendered cluster label.
    pub cluster_label: String,

    /// Members.
    pub user_count: usize,

    /// Mean messages per day, rounded to two decimals.
    pub avg_messages_per_day: f64,

    /// Mean influence score, rounded to two decimals.
    pub avg_influence_score: f64,
}

/// Complete result of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// One row per participant, highest influence first.
    pub rows: Vec<UserReport>,

    /// One entry per cluster, by id.
    pub clusters: Vec<ClusterSummary>,

    /// Parser bookkeeping.
    pub parse: ParseSummary,
}

impl AnalysisReport {
    /// Row of a user.
    pub fn row(&self, user: &str) -> Option<&UserReport> {
        self.rows.iter().find(|row| row.features.user == user)
    }
}
