use crate::error::{ModelError, ModelResult};

/// P(k; λ) = e^-λ · λ^k / k!
///
/// λ = 0 is special-cased so that the whole mass sits on k = 0. Built by the recurrence
/// `p(k) = p(k-1) · λ / k`, which never forms `λ^k` or `k!` and so stays finite for large k.
pub fn point_probability(k: u32, lambda: f64) -> f64 {
    if lambda == 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    (1..=k).fold((-lambda).exp(), |p, i| p * lambda / i as f64)
}

/// Goal-count distribution of length `max_goals + 1`.
///
/// Entries `0..max_goals` are exact point probabilities; the last entry holds the
/// "max_goals or more" mass so the vector sums to 1.
pub fn goal_probabilities(lambda: f64, max_goals: usize) -> ModelResult<Vec<f64>> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(ModelError::InvalidRate(lambda));
    }

    let mut out = Vec::with_capacity(max_goals + 1);
    let mut sum = 0.0_f64;
    let mut p = (-lambda).exp();
    for k in 0..max_goals {
        if k > 0 {
            p *= lambda / k as f64;
        }
        out.push(p);
        sum += p;
    }
    out.push((1.0 - sum).max(0.0));
    Ok(out)
}
