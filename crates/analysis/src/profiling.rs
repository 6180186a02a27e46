//! Cluster labels, influence scores and narrative profiles.

use groupscope_core::constants::ARCHETYPE_CLUSTER_COUNT;
use groupscope_core::{
    AnalysisConfig, Archetype, BehaviorProfile, ClusterAssignment, ClusterLabel, ClusterSummary,
    FeatureKind, InfluenceWeights, UserFeatureVector,
};
use tracing::{debug, info, instrument};

/// Minimum centroid difference for an archetype to win a cluster.
const CLAIM_MARGIN: f64 = 1e-9;

/// Which extreme of a feature an archetype claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Extreme {
    Highest,
    Lowest,
}

/// Archetypes in claiming order.
const CLAIMS: [(Archetype, FeatureKind, Extreme); 4] = [
    (Archetype::NightOwl, FeatureKind::NightActivityRatio, Extreme::Highest),
    (
        Archetype::InformationBroadcaster,
        FeatureKind::LinkShareRate,
        Extreme::Highest,
    ),
    (
        Archetype::ActiveConversationalist,
        FeatureKind::MessagesPerDay,
        Extreme::Highest,
    ),
    (Archetype::SilentObserver, FeatureKind::MessagesPerDay, Extreme::Lowest),
];

/// Label every cluster of an assignment, indexed by cluster id.
///
/// Named archetypes are only used for the default cluster count. Each
/// archetype claims the unclaimed cluster whose centroid is the strict
/// extreme of its feature, and only when that centroid lies on the matching
/// side of the population mean (0 in standardized space). A single leftover
/// cluster becomes [`Archetype::RegularParticipant`]. Configured names win
/// over everything.
pub fn assign_labels(assignment: &ClusterAssignment, config: &AnalysisConfig) -> Vec<ClusterLabel> {
    let k = assignment.cluster_count();
    let mut labels: Vec<Option<ClusterLabel>> = vec![None; k];

    if k == ARCHETYPE_CLUSTER_COUNT {
        for (archetype, feature, extreme) in CLAIMS {
            let column = feature.index();
            let candidates: Vec<(usize, f64)> = labels
                .iter()
                .enumerate()
                .filter(|(_, label)| label.is_none())
                .map(|(id, _)| (id, assignment.centroids[id][column]))
                .collect();

            match strict_extreme(&candidates, extreme) {
                Some((id, value)) if on_expected_side(value, extreme) => {
                    debug!(cluster = id, archetype = archetype.name(), value, "archetype claimed");
                    labels[id] = Some(ClusterLabel::Archetype(archetype));
                }
                _ => debug!(archetype = archetype.name(), "archetype left unclaimed"),
            }
        }

        let unclaimed: Vec<usize> = (0..k).filter(|&id| labels[id].is_none()).collect();
        if let &[id] = unclaimed.as_slice() {
            labels[id] = Some(ClusterLabel::Archetype(Archetype::RegularParticipant));
        }
    }

    labels
        .into_iter()
        .enumerate()
        .map(|(id, label)| match config.cluster_name(id) {
            Some(name) => ClusterLabel::Custom(name.to_string()),
            None => label.unwrap_or(ClusterLabel::Generic(id)),
        })
        .collect()
}

fn strict_extreme(candidates: &[(usize, f64)], extreme: Extreme) -> Option<(usize, f64)> {
    let mut sorted = candidates.to_vec();
    sorted.sort_by(|a, b| match extreme {
        Extreme::Highest => b.1.total_cmp(&a.1),
        Extreme::Lowest => a.1.total_cmp(&b.1),
    });
    match sorted.as_slice() {
        [] => None,
        [only] => Some(*only),
        [best, runner_up, ..] => {
            if (best.1 - runner_up.1).abs() > CLAIM_MARGIN {
                Some(*best)
            } else {
                None
            }
        }
    }
}

fn on_expected_side(value: f64, extreme: Extreme) -> bool {
    match extreme {
        Extreme::Highest => value > 0.0,
        Extreme::Lowest => value < 0.0,
    }
}

/// Min-max scale values into [0, 1]; a degenerate range scales to 0.
fn min_max(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let range = max - min;
    values
        .iter()
        .map(|v| if range > 0.0 { (v - min) / range } else { 0.0 })
        .collect()
}

/// Influence score per user, aligned with `features`.
///
/// Activity, responsiveness and initiation are each min-max scaled over the
/// given users and combined with `weights`. Responsiveness ranks the fastest
/// responder highest and is scaled over responders only. Users who never
/// replied to anyone get no responsiveness credit, and neither does anyone
/// when all responders share one response time.
pub fn influence_scores(features: &[UserFeatureVector], weights: &InfluenceWeights) -> Vec<f64> {
    let activity = min_max(&features.iter().map(|f| f.messages_per_day).collect::<Vec<_>>());
    let initiation = min_max(&features.iter().map(|f| f.initiation_rate).collect::<Vec<_>>());

    let responders: Vec<usize> = (0..features.len())
        .filter(|&idx| features[idx].has_responses())
        .collect();
    // Negated so shorter response times scale towards 1.
    let scaled_response = min_max(
        &responders
            .iter()
            .map(|&idx| -features[idx].avg_response_time_hours)
            .collect::<Vec<_>>(),
    );
    let mut responsiveness = vec![0.0; features.len()];
    for (idx, scaled) in responders.into_iter().zip(scaled_response) {
        responsiveness[idx] = scaled;
    }

    (0..features.len())
        .map(|idx| {
            let score = weights.activity * activity[idx]
                + weights.responsiveness * responsiveness[idx]
                + weights.initiation * initiation[idx];
            score.clamp(0.0, 1.0)
        })
        .collect()
}

/// Describe a user in one or two sentences.
pub fn narrative(label: &ClusterLabel, features: &UserFeatureVector, influence: f64) -> String {
    let mut traits: Vec<&str> = Vec::new();

    let per_day = features.messages_per_day;
    let total = features.message_count;
    traits.push(if per_day >= 4.0 || total >= 500 {
        "This user is highly active"
    } else if per_day >= 2.0 || total >= 100 {
        "This user is moderately active"
    } else {
        "This user has low activity"
    });

    traits.push(if features.avg_length >= 100.0 {
        "writes long, detailed messages"
    } else {
        "prefers short messages"
    });

    let expressiveness =
        features.emoji_rate + features.exclamation_rate * 0.5 + features.uppercase_rate * 10.0;
    traits.push(if expressiveness >= 2.0 {
        "emotionally expressive"
    } else {
        "emotionally reserved"
    });

    traits.push(if !features.has_responses() {
        "rarely replies to others"
    } else if features.avg_response_time_hours < 2.0 {
        "responds quickly"
    } else {
        "responds slowly"
    });

    if features.link_share_rate > 0.1 {
        traits.push("often shares links or resources");
    }
    if features.night_activity_ratio > 0.3 {
        traits.push("more active at night");
    }
    if features.initiation_rate > 0.1 || influence > 0.95 {
        traits.push("frequently initiates conversations and influences group flow");
    }

    format!(
        "This user belongs to the '{}' group. {}.",
        label,
        traits.join(", ")
    )
}

/// Build one profile per user.
///
/// `features` must be the table `assignment` was computed from, in the same
/// order, and `labels` the output of [`assign_labels`] for that assignment.
#[instrument(skip_all, fields(users = features.len()))]
pub fn generate_profiles(
    features: &[UserFeatureVector],
    assignment: &ClusterAssignment,
    labels: &[ClusterLabel],
    config: &AnalysisConfig,
) -> Vec<BehaviorProfile> {
    let scores = influence_scores(features, &config.influence);

    let profiles: Vec<BehaviorProfile> = features
        .iter()
        .zip(&assignment.labels)
        .zip(scores)
        .map(|((vector, &cluster_id), influence_score)| {
            let cluster_label = labels
                .get(cluster_id)
                .cloned()
                .unwrap_or(ClusterLabel::Generic(cluster_id));
            BehaviorProfile {
                user: vector.user.clone(),
                cluster_id,
                narrative: narrative(&cluster_label, vector, influence_score),
                cluster_label,
                influence_score,
            }
        })
        .collect();

    info!(profiles = profiles.len(), "Generated behavior profiles");
    profiles
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Per-cluster member count and mean activity and influence, by cluster id.
pub fn summarize_clusters(
    features: &[UserFeatureVector],
    profiles: &[BehaviorProfile],
    labels: &[ClusterLabel],
) -> Vec<ClusterSummary> {
    labels
        .iter()
        .enumerate()
        .map(|(cluster_id, label)| {
            let members: Vec<(&UserFeatureVector, &BehaviorProfile)> = features
                .iter()
                .zip(profiles)
                .filter(|(_, profile)| profile.cluster_id == cluster_id)
                .collect();
            let n = members.len().max(1) as f64;
            let per_day: f64 = members.iter().map(|(f, _)| f.messages_per_day).sum();
            let influence: f64 = members.iter().map(|(_, p)| p.influence_score).sum();

            ClusterSummary {
                cluster_id,
                cluster_label: label.to_string(),
                user_count: members.len(),
                avg_messages_per_day: round2(per_day / n),
                avg_influence_score: round2(influence / n),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use groupscope_core::Standardizer;

    fn vector(user: &str) -> UserFeatureVector {
        UserFeatureVector {
            user: user.to_string(),
            message_count: 10,
            messages_per_day: 1.0,
            avg_response_time_hours: 1.0,
            response_samples: 3,
            night_activity_ratio: 0.0,
            avg_length: 20.0,
            median_length: 20.0,
            total_chars: 200,
            emoji_rate: 0.0,
            exclamation_rate: 0.0,
            question_rate: 0.0,
            uppercase_rate: 0.0,
            total_links: 0,
            link_share_rate: 0.0,
            initiations: 0,
            initiation_rate: 0.0,
        }
    }

    fn centroid(night: f64, links: f64, per_day: f64) -> Vec<f64> {
        let mut row = vec![0.0; FeatureKind::ALL.len()];
        row[FeatureKind::NightActivityRatio.index()] = night;
        row[FeatureKind::LinkShareRate.index()] = links;
        row[FeatureKind::MessagesPerDay.index()] = per_day;
        row
    }

    fn assignment(centroids: Vec<Vec<f64>>) -> ClusterAssignment {
        let k = centroids.len();
        ClusterAssignment {
            users: (0..k).map(|i| format!("u{}", i)).collect(),
            labels: (0..k).collect(),
            centroids,
            standardized: Vec::new(),
            standardizer: Standardizer {
                means: Vec::new(),
                scales: Vec::new(),
            },
            inertia: 0.0,
            iterations: 1,
        }
    }

    #[test]
    fn five_distinct_clusters_get_all_archetypes() {
        let a = assignment(vec![
            centroid(2.0, 0.0, 0.1),
            centroid(0.0, 2.0, 0.2),
            centroid(0.0, 0.0, 2.0),
            centroid(0.0, 0.0, -2.0),
            centroid(-0.5, -0.5, 0.0),
        ]);
        let labels = assign_labels(&a, &AnalysisConfig::default());
        assert_eq!(labels[0], ClusterLabel::Archetype(Archetype::NightOwl));
        assert_eq!(labels[1], ClusterLabel::Archetype(Archetype::InformationBroadcaster));
        assert_eq!(labels[2], ClusterLabel::Archetype(Archetype::ActiveConversationalist));
        assert_eq!(labels[3], ClusterLabel::Archetype(Archetype::SilentObserver));
        assert_eq!(labels[4], ClusterLabel::Archetype(Archetype::RegularParticipant));
    }

    #[test]
    fn tied_centroids_fall_back_to_generic_labels() {
        let a = assignment(vec![
            centroid(1.0, 0.0, 0.0),
            centroid(1.0, 0.0, 0.0),
            centroid(0.0, 1.0, 1.0),
            centroid(0.0, 0.0, -1.0),
            centroid(0.0, 0.0, 0.0),
        ]);
        let labels = assign_labels(&a, &AnalysisConfig::default());
        assert_eq!(labels[0], ClusterLabel::Generic(0));
        assert_eq!(labels[1], ClusterLabel::Generic(1));
        assert_eq!(labels[2], ClusterLabel::Archetype(Archetype::InformationBroadcaster));
        assert_eq!(labels[3], ClusterLabel::Archetype(Archetype::SilentObserver));
        assert_eq!(labels[4], ClusterLabel::Generic(4));
    }

    #[test]
    fn other_cluster_counts_use_generic_or_configured_names() {
        let a = assignment(vec![centroid(1.0, 0.0, 0.0), centroid(-1.0, 0.0, 0.0)]);
        let mut config = AnalysisConfig {
            n_clusters: 2,
            ..AnalysisConfig::default()
        };
        assert_eq!(
            assign_labels(&a, &config),
            vec![ClusterLabel::Generic(0), ClusterLabel::Generic(1)]
        );

        config.cluster_names.insert("1".into(), "Lurkers".into());
        let labels = assign_labels(&a, &config);
        assert_eq!(labels[1], ClusterLabel::Custom("Lurkers".into()));
    }

    #[test]
    fn influence_is_bounded_and_rewards_activity() {
        let mut busy = vector("busy");
        busy.messages_per_day = 50.0;
        busy.initiation_rate = 0.5;
        busy.avg_response_time_hours = 0.1;
        let mut quiet = vector("quiet");
        quiet.messages_per_day = 0.1;
        quiet.avg_response_time_hours = 30.0;
        let mut silent = vector("silent");
        silent.messages_per_day = 0.05;
        silent.response_samples = 0;
        silent.avg_response_time_hours = 0.0;

        let scores = influence_scores(&[busy, quiet, silent], &InfluenceWeights::default());
        assert!(scores.iter().all(|s| (0.0..=1.0).contains(s)));
        assert!((scores[0] - 1.0).abs() < 1e-9);
        assert!(scores[0] > scores[1]);
        assert_eq!(scores[2], 0.0);
    }

    #[test]
    fn identical_users_score_zero() {
        let scores = influence_scores(&[vector("a"), vector("b")], &InfluenceWeights::default());
        assert_eq!(scores, vec![0.0, 0.0]);
    }

    #[test]
    fn sole_slow_responder_gets_no_responsiveness_credit() {
        let mut opener = vector("opener");
        opener.messages_per_day = 2.0;
        opener.initiation_rate = 1.0;
        opener.response_samples = 0;
        opener.avg_response_time_hours = 0.0;
        let mut late = vector("late");
        late.messages_per_day = 1.0;
        late.response_samples = 1;
        late.avg_response_time_hours = 100.0;

        let scores = influence_scores(&[opener, late], &InfluenceWeights::default());
        assert!((scores[0] - 0.7).abs() < 1e-9);
        assert_eq!(scores[1], 0.0);
    }

    #[test]
    fn faster_responder_scores_higher_responsiveness() {
        let mut fast = vector("fast");
        fast.avg_response_time_hours = 0.5;
        let mut slow = vector("slow");
        slow.avg_response_time_hours = 10.0;

        let weights = InfluenceWeights {
            activity: 0.0,
            responsiveness: 1.0,
            initiation: 0.0,
        };
        let scores = influence_scores(&[fast, slow], &weights);
        assert_eq!(scores, vec![1.0, 0.0]);
    }

    #[test]
    fn profiles_use_the_labels_they_are_given() {
        let a = assignment(vec![centroid(1.0, 0.0, 0.0), centroid(-1.0, 0.0, 0.0)]);
        let features = vec![vector("u0"), vector("u1")];
        let labels = vec![
            ClusterLabel::Custom("Early".into()),
            ClusterLabel::Custom("Late".into()),
        ];
        let profiles = generate_profiles(&features, &a, &labels, &AnalysisConfig::default());
        assert_eq!(profiles[0].cluster_label, labels[0]);
        assert_eq!(profiles[1].cluster_label, labels[1]);
        assert!(profiles[1].narrative.starts_with("This user belongs to the 'Late' group."));
    }

    #[test]
    fn narrative_mentions_label_and_traits() {
        let mut features = vector("owl");
        features.messages_per_day = 5.0;
        features.night_activity_ratio = 0.6;
        features.link_share_rate = 0.2;
        features.response_samples = 0;
        let text = narrative(&ClusterLabel::Archetype(Archetype::NightOwl), &features, 0.2);
        assert!(text.starts_with("This user belongs to the 'Night Owl' group."));
        assert!(text.contains("highly active"));
        assert!(text.contains("rarely replies to others"));
        assert!(text.contains("often shares links or resources"));
        assert!(text.contains("more active at night"));
        assert!(!text.contains("initiates"));
        assert!(text.ends_with('.'));
    }

    #[test]
    fn summaries_average_members() {
        let features = vec![vector("a"), vector("b"), vector("c")];
        let profiles: Vec<BehaviorProfile> = [(0, 0.5), (0, 0.25), (1, 1.0)]
            .iter()
            .zip(&features)
            .map(|(&(cluster_id, influence_score), f)| BehaviorProfile {
                user: f.user.clone(),
                cluster_id,
                cluster_label: ClusterLabel::Generic(cluster_id),
                narrative: String::new(),
                influence_score,
            })
            .collect();
        let labels = vec![ClusterLabel::Generic(0), ClusterLabel::Generic(1)];

        let summaries = summarize_clusters(&features, &profiles, &labels);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].user_count, 2);
        assert_eq!(summaries[0].avg_influence_score, 0.38);
        assert_eq!(summaries[1].cluster_label, "Cluster 1");
        assert_eq!(summaries[1].avg_messages_per_day, 1.0);
    }
}
