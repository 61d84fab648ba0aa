//! Sampling-based local surrogate.
//!
//! Neighbours of the final candidate are drawn by applying one to
//! `max_edits` random local edits. Each neighbour is described by
//! indicator features (how many edits of each kind were applied, which
//! buses were touched) and its fitness delta. A kernel-weighted ridge
//! regression over those samples yields one coefficient per feature.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::evaluation::FitnessEvaluator;
use crate::local_search::{random_any_move, MoveKind};
use crate::models::Candidate;

use super::{Attribution, ExplainConfig};

/// Surrogate coefficients plus the weighted R² of the fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Surrogate {
    /// One attribution per feature with a non-zero coefficient, ranked.
    pub attributions: Vec<Attribution>,
    /// Weighted coefficient of determination, if any sample varied.
    pub r_squared: Option<f64>,
    /// Neighbours actually evaluated.
    pub samples: usize,
}

/// Fits the surrogate around `candidate` with `samples` neighbours drawn
/// from a generator seeded with `seed`.
///
/// The same inputs always give the same output.
pub fn perturbation(
    fitness: &FitnessEvaluator<'_>,
    candidate: &Candidate,
    samples: usize,
    seed: u64,
    config: &ExplainConfig,
) -> Surrogate {
    let problem = fitness.problem();
    let base = fitness.score(candidate).total;
    let num_buses = candidate.num_buses();
    let dim = MoveKind::ALL.len() + num_buses;
    let max_edits = config.max_edits.max(1);

    let mut rng = StdRng::seed_from_u64(seed);
    let mut rows: Vec<Vec<f64>> = Vec::with_capacity(samples);
    let mut neighbours = Vec::with_capacity(samples);
    let mut weights = Vec::with_capacity(samples);

    for _ in 0..samples {
        let edits = rng.random_range(1..=max_edits);
        let mut neighbour = candidate.clone();
        let mut z = vec![0.0; dim];
        let mut applied = 0;
        for _ in 0..edits {
            let Some(mv) = random_any_move(&neighbour, &mut rng) else {
                break;
            };
            if let Some(next) = mv.apply(&neighbour) {
                neighbour = next;
                z[mv.kind().index()] += 1.0;
                let (a, b) = mv.buses();
                z[MoveKind::ALL.len() + a] = 1.0;
                z[MoveKind::ALL.len() + b] = 1.0;
                applied += 1;
            }
        }
        if applied == 0 {
            break;
        }
        let distance = applied as f64 / max_edits as f64;
        let width = config.kernel_width.max(1e-9);
        weights.push((-(distance * distance) / (width * width)).exp());
        neighbours.push(neighbour);
        rows.push(z);
    }
    let targets: Vec<f64> = fitness
        .score_all(&neighbours)
        .iter()
        .map(|s| s.total - base)
        .collect();

    let evaluated = rows.len();
    let Some((coefficients, r_squared)) =
        weighted_ridge(&rows, &targets, &weights, config.ridge_lambda)
    else {
        return Surrogate {
            attributions: Vec::new(),
            r_squared: None,
            samples: evaluated,
        };
    };

    let mut attributions: Vec<Attribution> = coefficients
        .iter()
        .enumerate()
        .filter(|(_, c)| **c != 0.0 && c.is_finite())
        .map(|(j, &c)| {
            let name = if j < MoveKind::ALL.len() {
                format!("edit:{}", MoveKind::ALL[j].name())
            } else {
                format!("bus:{}", problem.bus(j - MoveKind::ALL.len()).id())
            };
            Attribution::new(name, c)
        })
        .collect();
    super::rank(&mut attributions);

    Surrogate {
        attributions,
        r_squared,
        samples: evaluated,
    }
}

/// Solves `min Σ wᵢ (yᵢ - b - xᵢ·β)² + λ‖β‖²` with an unpenalized intercept.
///
/// Returns the slope coefficients and the weighted R², or `None` when
/// there are no samples or the system is singular.
fn weighted_ridge(
    rows: &[Vec<f64>],
    targets: &[f64],
    weights: &[f64],
    lambda: f64,
) -> Option<(Vec<f64>, Option<f64>)> {
    let first = rows.first()?;
    let p = first.len() + 1;

    // Normal equations over [1, x].
    let mut a = vec![0.0; p * p];
    let mut rhs = vec![0.0; p];
    for ((x, &y), &w) in rows.iter().zip(targets).zip(weights) {
        let xi = |k: usize| if k == 0 { 1.0 } else { x[k - 1] };
        for r in 0..p {
            rhs[r] += w * xi(r) * y;
            for c in 0..p {
                a[r * p + c] += w * xi(r) * xi(c);
            }
        }
    }
    for k in 1..p {
        a[k * p + k] += lambda.max(1e-9);
    }

    let beta = solve(a, rhs, p)?;

    let w_sum: f64 = weights.iter().sum();
    let mean = targets.iter().zip(weights).map(|(y, w)| w * y).sum::<f64>() / w_sum;
    let (mut ss_res, mut ss_tot) = (0.0, 0.0);
    for ((x, &y), &w) in rows.iter().zip(targets).zip(weights) {
        let pred = beta[0] + x.iter().zip(&beta[1..]).map(|(a, b)| a * b).sum::<f64>();
        ss_res += w * (y - pred).powi(2);
        ss_tot += w * (y - mean).powi(2);
    }
    let r_squared = (ss_tot > 0.0).then(|| 1.0 - ss_res / ss_tot);

    Some((beta[1..].to_vec(), r_squared))
}

/// Gauss-Jordan elimination with partial pivoting on a row-major `n × n`
/// system.
fn solve(mut a: Vec<f64>, mut b: Vec<f64>, n: usize) -> Option<Vec<f64>> {
    for col in 0..n {
        let pivot_row =
            (col..n).max_by(|&i, &j| a[i * n + col].abs().total_cmp(&a[j * n + col].abs()))?;
        if a[pivot_row * n + col].abs() < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for j in 0..n {
                a.swap(col * n + j, pivot_row * n + j);
            }
            b.swap(col, pivot_row);
        }
        let pivot = a[col * n + col];
        for j in 0..n {
            a[col * n + j] /= pivot;
        }
        b[col] /= pivot;
        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row * n + col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                let v = a[col * n + j];
                a[row * n + j] -= factor * v;
            }
            let v = b[col];
            b[row] -= factor * v;
        }
    }
    Some(b)
}
