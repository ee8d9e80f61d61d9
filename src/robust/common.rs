use rand::rngs::ThreadRng;
use rand::seq::index::sample as sample_indices;

use crate::deterministic::solve_deterministic;
use crate::error::PolyEstimatorError;
use crate::observation::Observation;
use crate::polynomial::Polynomial;
use crate::residual::{ResidualMode, ResidualModel};

/// A polynomial together with which observations it explains, returned by
/// every robust driver.
pub struct RobustOutcome {
    pub polynomial: Polynomial,
    pub inliers: Vec<bool>,
}

/// How a robust driver picks its minimal samples.
pub(crate) enum Sampling {
    /// Uniform random without replacement (RANSAC, LMedS).
    Uniform,
    /// PROSAC-style progressive sampling: a growing high-quality prefix of
    /// `quality_sorted` (indices into the observation list, descending
    /// quality), with the newest-admitted index of the prefix always drawn.
    Progressive { quality_sorted: Vec<usize> },
}

/// How a robust driver scores a candidate polynomial against all observations.
pub(crate) enum Scoring {
    /// RANSAC/PROSAC: count of residuals within `threshold`.
    InlierCount { threshold: f64 },
    /// LMedS/PROMedS: median of squared residuals.
    MedianOfSquares,
}

/// A candidate's score, comparable within its own `Scoring` kind. Higher
/// inlier counts are better; lower medians are better.
enum CandidateScore {
    InlierCount { count: usize, total_residual: f64 },
    Median(f64),
}

impl CandidateScore {
    fn is_better_than(&self, other: &CandidateScore) -> bool {
        match (self, other) {
            (
                CandidateScore::InlierCount {
                    count: c1,
                    total_residual: r1,
                },
                CandidateScore::InlierCount {
                    count: c2,
                    total_residual: r2,
                },
            ) => c1 > c2 || (c1 == c2 && r1 < r2),
            (CandidateScore::Median(m1), CandidateScore::Median(m2)) => m1 < m2,
            _ => false,
        }
    }
}

/// `σ̂ = 1.4826 * (1 + 5/(n-s)) * sqrt(median)`, the robust scale estimate
/// LMedS/PROMedS use to turn a median-of-squares score into an inlier mask.
fn lmeds_sigma(median_of_squares: f64, n: usize, s: usize) -> f64 {
    let correction = if n > s {
        1.0 + 5.0 / (n - s) as f64
    } else {
        1.0
    };
    1.4826 * correction * median_of_squares.max(0.0).sqrt()
}

fn residuals(
    poly: &Polynomial,
    observations: &[Observation],
    mode: ResidualMode,
) -> Vec<f64> {
    observations
        .iter()
        .map(|obs| ResidualModel::residual(poly, obs, mode).unwrap_or(f64::INFINITY))
        .collect()
}

fn score_and_mask(
    scoring: &Scoring,
    residuals: &[f64],
    sample_size: usize,
) -> (CandidateScore, Vec<bool>, f64) {
    match scoring {
        Scoring::InlierCount { threshold } => {
            let mask: Vec<bool> = residuals.iter().map(|&r| r <= *threshold).collect();
            let count = mask.iter().filter(|&&m| m).count();
            let total_residual: f64 = residuals
                .iter()
                .zip(mask.iter())
                .filter(|(_, &m)| m)
                .map(|(&r, _)| r)
                .sum();
            let epsilon = count as f64 / residuals.len().max(1) as f64;
            (
                CandidateScore::InlierCount {
                    count,
                    total_residual,
                },
                mask,
                epsilon,
            )
        }
        Scoring::MedianOfSquares => {
            let mut squares: Vec<f64> = residuals.iter().map(|&r| r * r).collect();
            squares.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let median = if squares.is_empty() {
                0.0
            } else if squares.len() % 2 == 1 {
                squares[squares.len() / 2]
            } else {
                (squares[squares.len() / 2 - 1] + squares[squares.len() / 2]) / 2.0
            };
            let n = residuals.len();
            let sigma = lmeds_sigma(median, n, sample_size);
            let mask: Vec<bool> = residuals.iter().map(|&r| r.abs() <= 2.5 * sigma).collect();
            let epsilon = mask.iter().filter(|&&m| m).count() as f64 / n.max(1) as f64;
            (CandidateScore::Median(median), mask, epsilon)
        }
    }
}

fn adaptive_max_iterations(
    confidence: f64,
    epsilon: f64,
    sample_size: usize,
    max_iterations: usize,
) -> usize {
    if epsilon <= 0.0 {
        return max_iterations;
    }
    let inlier_sample_prob = (1.0 - epsilon).powi(sample_size as i32);
    if inlier_sample_prob >= 1.0 {
        return max_iterations;
    }
    let denom = (1.0 - inlier_sample_prob).ln();
    if denom >= -1e-300 {
        return max_iterations;
    }
    let needed = ((1.0 - confidence).ln() / denom).ceil();
    if !needed.is_finite() || needed < 1.0 {
        1
    } else {
        (needed as usize).min(max_iterations)
    }
}

/// PROSAC's growth schedule, simplified to a linear ramp of the
/// high-quality prefix size from `sample_size` up to `n_total` over
/// `max_iterations`. The real Chum & Matas schedule solves a combinatorial
/// recurrence for `T'_n`; this keeps the qualitative behaviour (the prefix
/// widens as iterations progress, eventually covering every observation)
/// without carrying that recurrence's bookkeeping.
fn prosac_prefix(iteration: usize, sample_size: usize, n_total: usize, max_iterations: usize) -> usize {
    if max_iterations == 0 || n_total <= sample_size {
        return n_total;
    }
    let t = (iteration as f64 / max_iterations as f64).min(1.0);
    let span = (n_total - sample_size) as f64;
    (sample_size + (t * span).round() as usize).min(n_total)
}

fn draw_sample(
    sampling: &Sampling,
    iteration: usize,
    sample_size: usize,
    n_total: usize,
    max_iterations: usize,
    rng: &mut ThreadRng,
) -> Vec<usize> {
    match sampling {
        Sampling::Uniform => sample_indices(rng, n_total, sample_size.min(n_total)).into_vec(),
        Sampling::Progressive { quality_sorted } => {
            let prefix = prosac_prefix(iteration, sample_size, n_total, max_iterations).max(sample_size);
            if sample_size == 0 {
                return Vec::new();
            }
            let boundary = quality_sorted[prefix - 1];
            let mut rest = sample_indices(rng, prefix - 1, sample_size - 1)
                .into_iter()
                .map(|i| quality_sorted[i])
                .collect::<Vec<_>>();
            rest.push(boundary);
            rest
        }
    }
}

/// Runs the common robust-estimation loop shared by RANSAC, LMedS, PROSAC
/// and PROMedS: repeatedly sample a minimal subset, solve deterministically,
/// score against all observations, keep the best candidate, and (optionally)
/// refine with an LMSE solve over the final inlier set.
#[allow(clippy::too_many_arguments)]
pub(crate) fn run(
    observations: &[Observation],
    degree: usize,
    sampling: Sampling,
    scoring: Scoring,
    confidence: f64,
    max_iterations: usize,
    progress_delta: f64,
    use_geometric_distance: bool,
    refine_result: bool,
    stop_threshold: Option<f64>,
    mut on_iteration: impl FnMut(usize),
    mut on_progress: impl FnMut(f64),
) -> Result<RobustOutcome, PolyEstimatorError> {
    let sample_size = degree + 1;
    let n_total = observations.len();
    let residual_mode = if use_geometric_distance {
        ResidualMode::Geometric
    } else {
        ResidualMode::Algebraic
    };

    let mut rng = rand::thread_rng();
    let mut best_score: Option<CandidateScore> = None;
    let mut best_polynomial: Option<Polynomial> = None;
    let mut best_mask: Vec<bool> = vec![false; n_total];
    let mut epsilon = 0.0_f64;
    let mut last_progress_bucket = 0usize;
    let mut n_needed = max_iterations;
    let mut stopped_early = false;

    let mut it = 0usize;
    while it < max_iterations && it < n_needed && !stopped_early {
        let sample = draw_sample(&sampling, it, sample_size, n_total, max_iterations, &mut rng);
        if sample.len() == sample_size {
            let subset: Vec<Observation> = sample.iter().map(|&i| observations[i].clone()).collect();
            if let Ok(candidate) = solve_deterministic(&subset, degree, false) {
                let rs = residuals(&candidate, observations, residual_mode);
                let (score, mask, eps) = score_and_mask(&scoring, &rs, sample_size);

                let improved = match &best_score {
                    None => true,
                    Some(existing) => score.is_better_than(existing),
                };
                if improved {
                    if let (CandidateScore::Median(m), Some(t)) = (&score, stop_threshold) {
                        if *m <= t {
                            stopped_early = true;
                        }
                    }
                    best_score = Some(score);
                    best_polynomial = Some(candidate);
                    best_mask = mask;
                    epsilon = epsilon.max(eps);
                    n_needed = adaptive_max_iterations(confidence, epsilon, sample_size, max_iterations);
                }
            }
        }

        on_iteration(it);
        let progress = if n_needed == 0 {
            1.0
        } else {
            ((it + 1) as f64 / n_needed as f64).min(1.0)
        };
        if progress_delta > 0.0 {
            let bucket = (progress / progress_delta).floor() as usize;
            if bucket > last_progress_bucket {
                last_progress_bucket = bucket;
                on_progress((bucket as f64 * progress_delta).min(1.0));
            }
        }

        it += 1;
    }

    if !best_mask.iter().any(|&is_inlier| is_inlier) {
        return Err(PolyEstimatorError::RobustEstimator(
            "no candidate achieved any inliers within max_iterations".into(),
        ));
    }

    let polynomial = best_polynomial.ok_or_else(|| {
        PolyEstimatorError::RobustEstimator(
            "no candidate achieved any inliers within max_iterations".into(),
        )
    })?;

    if !refine_result {
        return Ok(RobustOutcome {
            polynomial,
            inliers: best_mask,
        });
    }

    let inlier_observations: Vec<Observation> = observations
        .iter()
        .zip(best_mask.iter())
        .filter(|(_, &is_inlier)| is_inlier)
        .map(|(obs, _)| obs.clone())
        .collect();

    if inlier_observations.len() <= sample_size {
        return Ok(RobustOutcome {
            polynomial,
            inliers: best_mask,
        });
    }

    let refined = solve_deterministic(&inlier_observations, degree, true)?;
    Ok(RobustOutcome {
        polynomial: refined,
        inliers: best_mask,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adaptive_iterations_shrinks_as_inlier_ratio_grows() {
        let few_inliers = adaptive_max_iterations(0.99, 0.1, 2, 10_000);
        let many_inliers = adaptive_max_iterations(0.99, 0.9, 2, 10_000);
        assert!(many_inliers < few_inliers);
    }

    #[test]
    fn adaptive_iterations_never_exceeds_max() {
        let n = adaptive_max_iterations(0.999999, 0.01, 5, 500);
        assert!(n <= 500);
    }

    #[test]
    fn adaptive_iterations_zero_epsilon_keeps_cap() {
        assert_eq!(adaptive_max_iterations(0.99, 0.0, 2, 1234), 1234);
    }

    #[test]
    fn lmeds_sigma_scales_with_sqrt_median() {
        let sigma_small = lmeds_sigma(1.0, 100, 2);
        let sigma_large = lmeds_sigma(4.0, 100, 2);
        assert!((sigma_large - 2.0 * sigma_small).abs() < 1e-9);
    }

    #[test]
    fn prosac_prefix_reaches_full_set_at_last_iteration() {
        assert_eq!(prosac_prefix(100, 2, 50, 100), 50);
        assert_eq!(prosac_prefix(0, 2, 50, 100), 2);
    }

    #[test]
    fn inlier_count_score_prefers_more_inliers() {
        let a = CandidateScore::InlierCount {
            count: 10,
            total_residual: 5.0,
        };
        let b = CandidateScore::InlierCount {
            count: 8,
            total_residual: 1.0,
        };
        assert!(a.is_better_than(&b));
    }

    #[test]
    fn median_score_prefers_smaller_median() {
        let a = CandidateScore::Median(0.5);
        let b = CandidateScore::Median(2.0);
        assert!(a.is_better_than(&b));
    }
}
