//! Feature standardization and k-means clustering.
//!
//! All state lives in the values returned here. Nothing is cached between
//! calls, so concurrent runs on different inputs cannot interfere and a rerun
//! with the same features and parameters reproduces the same assignment.
//!
//! # Algorithm
//!
//! 1. Standardize every column to zero mean and unit population variance
//! 2. Seed k centroids with k-means++ from a `fastrand` generator seeded by
//!    `random_state`
//! 3. Assign each point to its nearest centroid (squared Euclidean distance),
//!    refilling any cluster left empty
//! 4. Recompute centroids as the mean of their members
//! 5. Repeat until the summed centroid shift drops below `tolerance` or
//!    `max_iterations` is reached
//! 6. Run `n_init` restarts from one generator and keep the lowest inertia
//! 7. Renumber clusters by first appearance in input order
//!
//! # Validation
//!
//! - `n_clusters` must be > 0 and <= the number of users
//! - a fit never returns an empty cluster

use crate::error::{AnalysisError, AnalysisResult};
use groupscope_core::{AnalysisConfig, ClusterAssignment, Standardizer, UserFeatureVector};
use tracing::{debug, info, instrument};

/// Fit per-column mean and scale and return the standardized rows.
///
/// Scales are population standard deviations; a constant column gets scale 1
/// and standardizes to all zeros.
pub fn standardize(rows: &[Vec<f64>]) -> (Standardizer, Vec<Vec<f64>>) {
    let width = rows.first().map_or(0, Vec::len);
    let n = rows.len().max(1) as f64;

    let mut means = vec![0.0; width];
    for row in rows {
        for (mean, value) in means.iter_mut().zip(row) {
            *mean += value;
        }
    }
    for mean in &mut means {
        *mean /= n;
    }

    let mut scales = vec![0.0; width];
    for row in rows {
        for ((scale, value), mean) in scales.iter_mut().zip(row).zip(&means) {
            *scale += (value - mean).powi(2);
        }
    }
    for scale in &mut scales {
        let std = (*scale / n).sqrt();
        *scale = if std > f64::EPSILON { std } else { 1.0 };
    }

    let standardizer = Standardizer { means, scales };
    let standardized = rows
        .iter()
        .map(|row| transform(&standardizer, row))
        .collect();
    (standardizer, standardized)
}

/// Apply fitted parameters to one row.
pub fn transform(standardizer: &Standardizer, row: &[f64]) -> Vec<f64> {
    row.iter()
        .zip(&standardizer.means)
        .zip(&standardizer.scales)
        .map(|((value, mean), scale)| (value - mean) / scale)
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Index of the nearest centroid; ties go to the lowest index.
fn nearest(point: &[f64], centroids: &[Vec<f64>]) -> (usize, f64) {
    let mut best = (0, f64::INFINITY);
    for (idx, centroid) in centroids.iter().enumerate() {
        let dist = squared_distance(point, centroid);
        if dist < best.1 {
            best = (idx, dist);
        }
    }
    best
}

/// k-means parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeans {
    /// Number of clusters.
    pub k: usize,
    /// Restarts; the lowest inertia wins.
    pub n_init: usize,
    /// Iteration cap per restart.
    pub max_iterations: usize,
    /// Convergence threshold on the summed squared centroid shift.
    pub tolerance: f64,
    /// Seed for k-means++ sampling.
    pub seed: u64,
}

/// Result of a k-means fit.
#[derive(Debug, Clone, PartialEq)]
pub struct KMeansFit {
    /// Cluster per point, canonicalised by first appearance.
    pub labels: Vec<usize>,
    /// Centroid per cluster.
    pub centroids: Vec<Vec<f64>>,
    /// Sum of squared distances to assigned centroids.
    pub inertia: f64,
    /// Iterations of the winning restart.
    pub iterations: usize,
}

impl KMeans {
    /// Parameters taken from an analysis configuration.
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            k: config.n_clusters,
            n_init: config.n_init.max(1),
            max_iterations: config.max_iterations.max(1),
            tolerance: config.tolerance,
            seed: config.random_state,
        }
    }

    /// Cluster points. Requires `1 <= k <= points.len()`.
    pub fn fit(&self, points: &[Vec<f64>]) -> KMeansFit {
        let mut rng = fastrand::Rng::with_seed(self.seed);
        let mut best: Option<KMeansFit> = None;

        for run in 0..self.n_init {
            let seeds = self.init_plus_plus(points, &mut rng);
            let fit = self.lloyd(points, seeds);
            debug!(run, inertia = fit.inertia, iterations = fit.iterations, "k-means restart");
            if best.as_ref().map_or(true, |b| fit.inertia < b.inertia) {
                best = Some(fit);
            }
        }

        let best = best.unwrap_or_else(|| KMeansFit {
            labels: vec![0; points.len()],
            centroids: Vec::new(),
            inertia: 0.0,
            iterations: 0,
        });
        canonicalize(best)
    }

    fn init_plus_plus(&self, points: &[Vec<f64>], rng: &mut fastrand::Rng) -> Vec<Vec<f64>> {
        let n = points.len();
        let mut centroids = vec![points[rng.usize(0..n)].clone()];
        let mut dist: Vec<f64> = points
            .iter()
            .map(|p| squared_distance(p, &centroids[0]))
            .collect();

        while centroids.len() < self.k {
            let total: f64 = dist.iter().sum();
            let idx = if total > 0.0 {
                let target = rng.f64() * total;
                let mut cumulative = 0.0;
                let mut chosen = n - 1;
                for (idx, d) in dist.iter().enumerate() {
                    cumulative += d;
                    if cumulative > target {
                        chosen = idx;
                        break;
                    }
                }
                chosen
            } else {
                rng.usize(0..n)
            };

            let centroid = points[idx].clone();
            for (d, p) in dist.iter_mut().zip(points) {
                *d = d.min(squared_distance(p, &centroid));
            }
            centroids.push(centroid);
        }
        centroids
    }

    fn lloyd(&self, points: &[Vec<f64>], mut centroids: Vec<Vec<f64>>) -> KMeansFit {
        let mut labels = vec![0; points.len()];
        let mut iterations = 0;

        for iteration in 1..=self.max_iterations {
            iterations = iteration;
            assign(points, &centroids, &mut labels);
            fill_empty_clusters(points, &mut centroids, &mut labels);
            let updated = means(points, &labels, &centroids);
            let shift: f64 = centroids
                .iter()
                .zip(&updated)
                .map(|(old, new)| squared_distance(old, new))
                .sum();
            centroids = updated;
            if shift <= self.tolerance {
                break;
            }
        }

        assign(points, &centroids, &mut labels);
        fill_empty_clusters(points, &mut centroids, &mut labels);
        let centroids = means(points, &labels, &centroids);
        let inertia = points
            .iter()
            .zip(&labels)
            .map(|(p, &label)| squared_distance(p, &centroids[label]))
            .sum();

        KMeansFit {
            labels,
            centroids,
            inertia,
            iterations,
        }
    }
}

fn assign(points: &[Vec<f64>], centroids: &[Vec<f64>], labels: &mut [usize]) {
    for (label, point) in labels.iter_mut().zip(points) {
        *label = nearest(point, centroids).0;
    }
}

/// Give every empty cluster the point lying farthest from its own centroid,
/// taken from a cluster that keeps at least one member.
fn fill_empty_clusters(points: &[Vec<f64>], centroids: &mut [Vec<f64>], labels: &mut [usize]) {
    let mut counts = vec![0usize; centroids.len()];
    for &label in labels.iter() {
        counts[label] += 1;
    }

    for cluster in 0..centroids.len() {
        if counts[cluster] > 0 {
            continue;
        }
        let mut donor: Option<(usize, f64)> = None;
        for (idx, point) in points.iter().enumerate() {
            let current = labels[idx];
            if counts[current] < 2 {
                continue;
            }
            let dist = squared_distance(point, &centroids[current]);
            if donor.map_or(true, |(_, best)| dist > best) {
                donor = Some((idx, dist));
            }
        }
        let Some((idx, _)) = donor else {
            break;
        };
        counts[labels[idx]] -= 1;
        counts[cluster] += 1;
        labels[idx] = cluster;
        centroids[cluster] = points[idx].clone();
    }
}

/// Member means; a cluster without members keeps its previous centroid.
fn means(points: &[Vec<f64>], labels: &[usize], previous: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let width = previous.first().map_or(0, Vec::len);
    let mut sums = vec![vec![0.0; width]; previous.len()];
    let mut counts = vec![0usize; previous.len()];

    for (point, &label) in points.iter().zip(labels) {
        counts[label] += 1;
        for (sum, value) in sums[label].iter_mut().zip(point) {
            *sum += value;
        }
    }

    sums.into_iter()
        .zip(counts)
        .zip(previous)
        .map(|((sum, count), prev)| {
            if count == 0 {
                prev.clone()
            } else {
                sum.into_iter().map(|s| s / count as f64).collect()
            }
        })
        .collect()
}

/// Renumber clusters by first appearance in point order.
fn canonicalize(fit: KMeansFit) -> KMeansFit {
    let k = fit.centroids.len();
    let mut mapping: Vec<Option<usize>> = vec![None; k];
    let mut next = 0;
    for &label in &fit.labels {
        if mapping[label].is_none() {
            mapping[label] = Some(next);
            next += 1;
        }
    }
    for slot in mapping.iter_mut() {
        if slot.is_none() {
            *slot = Some(next);
            next += 1;
        }
    }

    let mapping: Vec<usize> = mapping.into_iter().map(Option::unwrap_or_default).collect();
    let mut centroids = vec![Vec::new(); k];
    for (old, centroid) in fit.centroids.into_iter().enumerate() {
        centroids[mapping[old]] = centroid;
    }

    KMeansFit {
        labels: fit.labels.iter().map(|&label| mapping[label]).collect(),
        centroids,
        inertia: fit.inertia,
        iterations: fit.iterations,
    }
}

/// Standardize feature vectors and partition users into `n_clusters` groups.
#[instrument(skip_all, fields(users = features.len(), k = config.n_clusters))]
pub fn cluster_users(
    features: &[UserFeatureVector],
    config: &AnalysisConfig,
) -> AnalysisResult<ClusterAssignment> {
    if config.n_clusters == 0 {
        return Err(AnalysisError::InvalidConfig(
            "n_clusters must be at least 1".to_string(),
        ));
    }
    if config.n_clusters > features.len() {
        return Err(AnalysisError::InsufficientData {
            users: features.len(),
            requested: config.n_clusters,
        });
    }

    let rows: Vec<Vec<f64>> = features.iter().map(|f| f.clustering_row()).collect();
    let (standardizer, standardized) = standardize(&rows);
    let fit = KMeans::from_config(config).fit(&standardized);

    info!(
        clusters = fit.centroids.len(),
        inertia = fit.inertia,
        iterations = fit.iterations,
        "Clustered users"
    );

    Ok(ClusterAssignment {
        users: features.iter().map(|f| f.user.clone()).collect(),
        labels: fit.labels,
        centroids: fit.centroids,
        standardized,
        standardizer,
        inertia: fit.inertia,
        iterations: fit.iterations,
    })
}
