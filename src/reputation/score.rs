//! Reputation scoring
//!
//! The score is a pure function of an agent's rating history and violation
//! list: the weighted mean of ratings minus accumulated violation penalties,
//! clamped to [0, 1]. Recomputing it from the same history always yields the
//! same value, so any replica holding the history can verify a published score.

use super::record::{RatingEntry, ViolationEntry};
use crate::agent::NEUTRAL_REPUTATION;
use chrono::Duration;

/// Clamp a submitted rating into [0, 1]. NaN counts as 0.
pub fn clamp_rating(rating: f64) -> f64 {
    if rating.is_nan() {
        return 0.0;
    }
    rating.clamp(0.0, 1.0)
}

/// Weights must be finite and non-negative to take part in the mean.
fn effective_weight(weight: f64) -> f64 {
    if weight.is_finite() && weight > 0.0 {
        weight
    } else {
        0.0
    }
}

/// Ratings that count toward the score.
///
/// With a window, only ratings no older than `window` relative to the newest
/// rating are kept. Anchoring on the newest entry instead of the wall clock keeps
/// the score a function of history alone.
pub fn ratings_in_window(history: &[RatingEntry], window: Option<Duration>) -> Vec<&RatingEntry> {
    let Some(window) = window else {
        return history.iter().collect();
    };
    let Some(newest) = history.iter().map(|entry| entry.timestamp).max() else {
        return Vec::new();
    };
    history
        .iter()
        .filter(|entry| newest - entry.timestamp <= window)
        .collect()
}

/// Σ(rating·weight)/Σ(weight), or the neutral score when nothing counts.
pub fn weighted_mean<'a, I>(ratings: I) -> f64
where
    I: IntoIterator<Item = &'a RatingEntry>,
{
    let mut weighted = 0.0;
    let mut total_weight = 0.0;
    for entry in ratings {
        let weight = effective_weight(entry.weight);
        weighted += clamp_rating(entry.rating) * weight;
        total_weight += weight;
    }
    if total_weight > 0.0 {
        weighted / total_weight
    } else {
        NEUTRAL_REPUTATION
    }
}

/// Reference O(n) score over the full history.
pub fn compute_score(
    history: &[RatingEntry],
    violations: &[ViolationEntry],
    window: Option<Duration>,
) -> f64 {
    let base = weighted_mean(ratings_in_window(history, window));
    let penalty: f64 = violations
        .iter()
        .map(|violation| effective_weight(violation.penalty))
        .sum();
    (base - penalty).clamp(0.0, 1.0)
}

/// Trust weighting applied to each rater. The default weighs every rater equally.
pub trait RaterWeighting: Send + Sync {
    fn weight(&self, rater_id: &str) -> f64;
}

pub struct UniformWeighting;

impl RaterWeighting for UniformWeighting {
    fn weight(&self, _rater_id: &str) -> f64 {
        1.0
    }
}
