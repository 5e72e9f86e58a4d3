//! Two-component 1-D Gaussian mixture fitted by expectation-maximisation,
//! and the analytic crossing point of its weighted densities.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::{
    GMM_EQUAL_STD_TOLERANCE, GMM_KMEANS_ITERATIONS, GMM_MAX_ITERATIONS, GMM_TOLERANCE,
    GMM_VARIANCE_FLOOR,
};

/// Reasons a mixture fit is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GmmFitError {
    #[error("need at least 2 samples, got {0}")]
    TooFewSamples(usize),

    #[error("all samples are identical")]
    ZeroSpread,

    #[error("a mixture component lost all of its samples")]
    EmptyComponent,

    #[error("EM did not converge within {0} iterations")]
    NotConverged(usize),

    #[error("fit produced non-finite parameters")]
    NonFinite,
}

/// Fitted components, ordered by ascending mean: index 0 is background,
/// index 1 is tissue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MixtureComponents {
    pub means: [f64; 2],
    pub stds: [f64; 2],
    pub weights: [f64; 2],
}

impl MixtureComponents {
    /// Crossing of the two weighted densities between the means.
    pub fn intersection(&self) -> f64 {
        gaussian_intersection(
            self.means[0],
            self.stds[0],
            self.weights[0],
            self.means[1],
            self.stds[1],
            self.weights[1],
        )
    }
}

#[derive(Clone, Copy, Debug)]
struct Component {
    weight: f64,
    mean: f64,
    variance: f64,
}

/// Fit a 2-component mixture to `samples`.
///
/// Means are seeded with k-means++ driven by `seed`, refined by a few Lloyd
/// iterations, then EM runs until the mean log-likelihood changes by less
/// than the tolerance.
pub fn fit_gaussian_mixture(samples: &[f32], seed: u64) -> Result<MixtureComponents, GmmFitError> {
    let x: Vec<f64> = samples
        .iter()
        .filter(|v| v.is_finite())
        .map(|&v| v as f64)
        .collect();
    if x.len() < 2 {
        return Err(GmmFitError::TooFewSamples(x.len()));
    }

    let mut components = kmeans_init(&x, seed)?;
    let mut resp = vec![[0.0f64; 2]; x.len()];
    let mut previous = f64::NEG_INFINITY;
    let mut converged = false;

    for _ in 0..GMM_MAX_ITERATIONS {
        let log_likelihood = e_step(&x, &components, &mut resp);
        components = m_step(&x, &resp)?;

        if (log_likelihood - previous).abs() < GMM_TOLERANCE {
            converged = true;
            break;
        }
        previous = log_likelihood;
    }

    if !converged {
        return Err(GmmFitError::NotConverged(GMM_MAX_ITERATIONS));
    }

    components.sort_by(|a, b| a.mean.total_cmp(&b.mean));
    let [c0, c1] = components;
    let fitted = MixtureComponents {
        means: [c0.mean, c1.mean],
        stds: [c0.variance.sqrt(), c1.variance.sqrt()],
        weights: [c0.weight, c1.weight],
    };

    let all_finite = fitted
        .means
        .iter()
        .chain(&fitted.stds)
        .chain(&fitted.weights)
        .all(|v| v.is_finite());
    if !all_finite {
        return Err(GmmFitError::NonFinite);
    }
    Ok(fitted)
}

/// k-means++ seeding followed by Lloyd iterations, converted to mixture
/// parameters from the hard assignment.
fn kmeans_init(x: &[f64], seed: u64) -> Result<[Component; 2], GmmFitError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let first = x[rng.random_range(0..x.len())];

    let distances: Vec<f64> = x.iter().map(|&v| (v - first).powi(2)).collect();
    let total: f64 = distances.iter().sum();
    if total <= 0.0 {
        return Err(GmmFitError::ZeroSpread);
    }
    let mut target = rng.random::<f64>() * total;
    let mut second = x[x.len() - 1];
    for (&v, &d) in x.iter().zip(&distances) {
        if target < d {
            second = v;
            break;
        }
        target -= d;
    }

    let mut centers = [first, second];
    let mut assignment = vec![0usize; x.len()];
    for _ in 0..GMM_KMEANS_ITERATIONS {
        for (a, &v) in assignment.iter_mut().zip(x) {
            *a = usize::from((v - centers[1]).abs() < (v - centers[0]).abs());
        }
        let mut sums = [0.0f64; 2];
        let mut counts = [0usize; 2];
        for (&a, &v) in assignment.iter().zip(x) {
            sums[a] += v;
            counts[a] += 1;
        }
        if counts.contains(&0) {
            return Err(GmmFitError::EmptyComponent);
        }
        let updated = [sums[0] / counts[0] as f64, sums[1] / counts[1] as f64];
        if updated == centers {
            break;
        }
        centers = updated;
    }

    let resp: Vec<[f64; 2]> = assignment
        .iter()
        .map(|&a| if a == 0 { [1.0, 0.0] } else { [0.0, 1.0] })
        .collect();
    m_step(x, &resp)
}

/// Fill `resp` with posterior responsibilities; returns the mean
/// log-likelihood of the samples.
fn e_step(x: &[f64], components: &[Component; 2], resp: &mut [[f64; 2]]) -> f64 {
    let ln_2pi = (2.0 * std::f64::consts::PI).ln();
    let consts: Vec<(f64, f64, f64)> = components
        .iter()
        .map(|c| {
            (
                c.weight.ln() - 0.5 * (ln_2pi + c.variance.ln()),
                c.mean,
                c.variance,
            )
        })
        .collect();

    let mut total = 0.0;
    for (r, &v) in resp.iter_mut().zip(x) {
        let lp = [
            consts[0].0 - (v - consts[0].1).powi(2) / (2.0 * consts[0].2),
            consts[1].0 - (v - consts[1].1).powi(2) / (2.0 * consts[1].2),
        ];
        let max = lp[0].max(lp[1]);
        let lse = max + ((lp[0] - max).exp() + (lp[1] - max).exp()).ln();
        r[0] = (lp[0] - lse).exp();
        r[1] = (lp[1] - lse).exp();
        total += lse;
    }
    total / x.len() as f64
}

fn m_step(x: &[f64], resp: &[[f64; 2]]) -> Result<[Component; 2], GmmFitError> {
    let n = x.len() as f64;
    let mut components = [Component {
        weight: 0.0,
        mean: 0.0,
        variance: 0.0,
    }; 2];

    for (k, component) in components.iter_mut().enumerate() {
        let mass: f64 = resp.iter().map(|r| r[k]).sum();
        if mass <= 10.0 * f64::EPSILON {
            return Err(GmmFitError::EmptyComponent);
        }
        let nk = mass + 10.0 * f64::EPSILON;
        let mean = resp.iter().zip(x).map(|(r, &v)| r[k] * v).sum::<f64>() / nk;
        let variance = resp
            .iter()
            .zip(x)
            .map(|(r, &v)| r[k] * (v - mean).powi(2))
            .sum::<f64>()
            / nk
            + GMM_VARIANCE_FLOOR;
        if !mean.is_finite() || !variance.is_finite() {
            return Err(GmmFitError::NonFinite);
        }
        *component = Component {
            weight: nk / n,
            mean,
            variance,
        };
    }
    Ok(components)
}

/// Crossing point of `w0 * N(m0, s0)` and `w1 * N(m1, s1)` between the means.
///
/// Equal deviations reduce the quadratic to a line and give the midpoint.
/// Otherwise the root of
/// `(s0² - s1²) x² + 2 (m0 s1² - m1 s0²) x + m1² s0² - m0² s1² + 2 s0² s1² ln(s1 w0 / (s0 w1)) = 0`
/// lying strictly between `m0` and `m1` is returned. With no real root, or no
/// root between the means, the midpoint is used.
pub fn gaussian_intersection(m0: f64, s0: f64, w0: f64, m1: f64, s1: f64, w1: f64) -> f64 {
    let midpoint = (m0 + m1) / 2.0;
    if (s0 - s1).abs() <= 1e-8 + GMM_EQUAL_STD_TOLERANCE * s1.abs() {
        return midpoint;
    }

    let (v0, v1) = (s0 * s0, s1 * s1);
    let a = v0 - v1;
    let b = 2.0 * (m0 * v1 - m1 * v0);
    let c = m1 * m1 * v0 - m0 * m0 * v1 + 2.0 * v0 * v1 * ((s1 * w0) / (s0 * w1)).ln();

    let disc = b * b - 4.0 * a * c;
    if !disc.is_finite() || disc < 0.0 {
        return midpoint;
    }

    let root = disc.sqrt();
    let x1 = (-b + root) / (2.0 * a);
    let x2 = (-b - root) / (2.0 * a);
    let (lo, hi) = if m0 <= m1 { (m0, m1) } else { (m1, m0) };
    let between = |x: f64| lo < x && x < hi;

    if between(x1) {
        x1
    } else if between(x2) {
        x2
    } else {
        midpoint
    }
}
