//! Dense vector helpers over `f64` slices.

use crate::util::kahan::KahanSum;

/// Dot product of two equally sized vectors.
///
/// Extra trailing components of the longer slice are ignored.
pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).collect::<KahanSum>().sum()
}

/// Euclidean (L2) norm.
pub fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Squared Euclidean distance between two vectors.
pub fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .collect::<KahanSum>()
        .sum()
}

/// Scale a vector to unit Euclidean length in place.
///
/// Returns `false` and leaves the vector untouched when its norm is zero (or not
/// finite), so callers can apply their own fallback instead of dividing by zero.
pub fn l2_normalize(v: &mut [f64]) -> bool {
    let magnitude = norm(v);
    if magnitude == 0.0 || !magnitude.is_finite() {
        return false;
    }
    for value in v.iter_mut() {
        *value /= magnitude;
    }
    true
}

/// Add `scale * source` into `target`.
pub fn add_scaled(target: &mut [f64], source: &[f64], scale: f64) {
    for (t, s) in target.iter_mut().zip(source) {
        *t += scale * s;
    }
}

/// Whether every component is finite.
pub fn is_finite(v: &[f64]) -> bool {
    v.iter().all(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_and_norm() {
        assert_eq!(dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
        assert_eq!(norm(&[3.0, 4.0]), 5.0);
        assert_eq!(squared_distance(&[1.0, 1.0], &[4.0, 5.0]), 25.0);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = vec![3.0, 0.0, 4.0];
        assert!(l2_normalize(&mut v));
        assert!((norm(&v) - 1.0).abs() < 1e-12);
        assert_eq!(v, vec![0.6, 0.0, 0.8]);
    }

    #[test]
    fn test_l2_normalize_zero_vector() {
        let mut v = vec![0.0; 4];
        assert!(!l2_normalize(&mut v));
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_add_scaled() {
        let mut target = vec![1.0, 1.0];
        add_scaled(&mut target, &[2.0, -1.0], 0.5);
        assert_eq!(target, vec![2.0, 0.5]);
        assert!(is_finite(&target));
        assert!(!is_finite(&[f64::NAN]));
    }
}
