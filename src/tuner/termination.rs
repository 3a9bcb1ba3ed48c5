//! Convergence-based termination.
//!
//! The search stops once the mean cost of the population failed to improve
//! by at least 5% over the previous generation a given number of times.
//! Non-improving generations are counted over the whole run; an improving
//! generation does not reset the count.

/// A generation improves iff its mean cost is at most this factor times
/// the previous mean.
pub const IMPROVEMENT_FACTOR: f64 = 0.95;

/// Tracks generation means and decides when to stop.
///
/// # Examples
///
/// ```
/// use u_tuner::tuner::TerminationDetector;
///
/// let mut detector = TerminationDetector::new(1);
/// assert!(!detector.observe(4.25));
/// assert!(!detector.observe(4.0));
/// assert!(detector.observe(4.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct TerminationDetector {
    max_hits: usize,
    hits: usize,
    previous_mean: Option<f64>,
    history: Vec<f64>,
}

impl TerminationDetector {
    pub fn new(max_hits: usize) -> Self {
        Self {
            max_hits,
            hits: 0,
            previous_mean: None,
            history: Vec::new(),
        }
    }

    /// Records the mean cost of a freshly evaluated generation and returns
    /// `true` if the search should stop.
    pub fn observe(&mut self, mean: f64) -> bool {
        self.history.push(mean);

        let Some(previous) = self.previous_mean.replace(mean) else {
            return false;
        };

        if mean > IMPROVEMENT_FACTOR * previous {
            self.hits += 1;
            tracing::debug!(
                mean,
                previous,
                hits = self.hits,
                max_hits = self.max_hits,
                "insufficient improvement"
            );
        }
        self.hits >= self.max_hits
    }

    /// Number of non-improving generations so far.
    pub fn hits(&self) -> usize {
        self.hits
    }

    pub fn max_hits(&self) -> usize {
        self.max_hits
    }

    /// Every mean observed, in order.
    pub fn history(&self) -> &[f64] {
        &self.history
    }
}
