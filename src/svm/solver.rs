//! Dual coordinate descent for soft-margin binary SVMs.
//!
//! The bias is folded into the kernel (`K'(x, y) = K(x, y) + 1`), which removes the
//! equality constraint from the dual and leaves only the box `0 <= alpha_i <= C`.
//! Each step optimizes a single coordinate in closed form and updates the cached
//! gradient of every other coordinate.

use crate::svm::kernel::KernelCache;

/// The support vectors of a solved binary problem.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Solution {
    /// Indices (into the cache's samples) of samples with nonzero multipliers.
    pub support_vectors: Vec<usize>,
    /// `alpha_i * y_i` for every support vector.
    pub weights: Vec<f64>,
    /// Subtracted from the weighted kernel sum when classifying.
    pub threshold: f64,
    /// Number of passes over the samples that were performed.
    pub passes: usize,
}

impl Solution {
    /// Signed margin of sample `i` under the solution.
    pub fn margin(&self, cache: &mut KernelCache<'_>, i: usize) -> f64 {
        let mut sum = crate::util::KahanSum::with_initial(-self.threshold);
        for (&sv, &w) in self.support_vectors.iter().zip(&self.weights) {
            sum.add(w * cache.get(sv, i));
        }
        sum.sum()
    }
}

/// Solve one binary problem.
///
/// `positive[i]` says whether sample `i` belongs to the positive class. `c` is the
/// box constraint; iteration stops once the largest projected gradient falls below
/// `tolerance` or after `max_passes` sweeps.
pub fn solve(
    cache: &mut KernelCache<'_>,
    positive: &[bool],
    c: f64,
    tolerance: f64,
    max_passes: usize,
) -> Solution {
    let n = positive.len();
    let labels: Vec<f64> = positive
        .iter()
        .map(|&p| if p { 1.0 } else { -1.0 })
        .collect();
    let mut alpha = vec![0.0f64; n];
    // Gradient of 1/2 a'Qa - e'a with Q_ij = y_i y_j K'_ij; starts at -1.
    let mut gradient = vec![-1.0f64; n];

    let mut passes = 0;
    while passes < max_passes {
        passes += 1;
        let mut max_violation: f64 = 0.0;

        for i in 0..n {
            let g = gradient[i];
            let projected = if alpha[i] <= 0.0 {
                g.min(0.0)
            } else if alpha[i] >= c {
                g.max(0.0)
            } else {
                g
            };
            max_violation = max_violation.max(projected.abs());
            if projected.abs() <= tolerance {
                continue;
            }

            let q_ii = cache.get(i, i) + 1.0;
            if q_ii <= 0.0 {
                continue;
            }
            let old = alpha[i];
            let new = (old - g / q_ii).clamp(0.0, c);
            let delta = new - old;
            if delta == 0.0 {
                continue;
            }
            alpha[i] = new;

            let scale = labels[i] * delta;
            let row = cache.row(i);
            for (k, grad) in gradient.iter_mut().enumerate() {
                *grad += labels[k] * scale * (row[k] + 1.0);
            }
        }

        if max_violation < tolerance {
            break;
        }
    }

    let mut solution = Solution {
        passes,
        ..Default::default()
    };
    for (i, &a) in alpha.iter().enumerate() {
        if a > 0.0 {
            let weight = a * labels[i];
            solution.support_vectors.push(i);
            solution.weights.push(weight);
            solution.threshold -= weight;
        }
    }
    solution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::svm::kernel::Kernel;

    #[test]
    fn test_separates_two_points() {
        let vectors = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let mut cache = KernelCache::new(Kernel::Linear, &vectors);
        let solution = solve(&mut cache, &[true, false], 10.0, 1e-6, 1000);

        assert_eq!(solution.support_vectors, vec![0, 1]);
        assert!(solution.weights[0] > 0.0);
        assert!(solution.weights[1] < 0.0);
        assert!(solution.margin(&mut cache, 0) > 0.0);
        assert!(solution.margin(&mut cache, 1) < 0.0);
    }

    #[test]
    fn test_respects_box_constraint() {
        let vectors = vec![vec![1.0], vec![1.0], vec![0.9]];
        let mut cache = KernelCache::new(Kernel::Linear, &vectors);
        let c = 0.5;
        let solution = solve(&mut cache, &[true, false, true], c, 1e-8, 500);

        for (&sv, &w) in solution.support_vectors.iter().zip(&solution.weights) {
            assert!(w.abs() <= c + 1e-12, "weight {w} of sample {sv} exceeds C");
        }
    }

    #[test]
    fn test_single_class() {
        let vectors = vec![vec![1.0], vec![2.0]];
        let mut cache = KernelCache::new(Kernel::Linear, &vectors);
        let solution = solve(&mut cache, &[true, true], 1.0, 1e-6, 100);
        assert!(solution.margin(&mut cache, 0) > 0.0);
        assert!(solution.margin(&mut cache, 1) > 0.0);
    }
}
