//! Analysis constants and configuration defaults.

/// Default number of behavior clusters.
pub const DEFAULT_CLUSTER_COUNT: usize = 5;

/// Default seed for k-means initialisation.
pub const DEFAULT_RANDOM_STATE: u64 = 42;

/// Default number of k-means restarts.
pub const DEFAULT_N_INIT: usize = 10;

/// Default k-means iteration cap per restart.
pub const DEFAULT_MAX_ITERATIONS: usize = 300;

/// Default centroid-shift tolerance for k-means convergence.
pub const DEFAULT_TOLERANCE: f64 = 1e-4;

/// Silence (minutes) after which a message counts as starting a new thread.
pub const DEFAULT_INITIATION_GAP_MINUTES: i64 = 60;

/// First hour of the night window (inclusive).
pub const DEFAULT_NIGHT_START_HOUR: u32 = 22;

/// Hour the night window ends (exclusive).
pub const DEFAULT_NIGHT_END_HOUR: u32 = 6;

/// Number of archetypes; named labels are only produced for this cluster count.
pub const ARCHETYPE_CLUSTER_COUNT: usize = 5;

/// Allowed drift of the influence weight sum away from 1.
pub const WEIGHT_SUM_EPSILON: f64 = 1e-6;
