//! Error-compensated floating point summation.

/// A running sum that tracks the low-order bits lost by each addition.
///
/// Wide dot products (one term per vocabulary token) drift noticeably with naive
/// summation, which makes classification depend on token order. Every forward pass
/// and every margin score in the crate goes through this accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct KahanSum {
    sum: f64,
    compensation: f64,
}

impl KahanSum {
    /// Create an empty sum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sum starting at `value`.
    pub fn with_initial(value: f64) -> Self {
        Self {
            sum: value,
            compensation: 0.0,
        }
    }

    /// Add a term to the sum.
    #[inline]
    pub fn add(&mut self, value: f64) {
        let y = value - self.compensation;
        let t = self.sum + y;
        self.compensation = (t - self.sum) - y;
        self.sum = t;
    }

    /// The current value of the sum.
    #[inline]
    pub fn sum(&self) -> f64 {
        self.sum
    }
}

impl Extend<f64> for KahanSum {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl FromIterator<f64> for KahanSum {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut sum = KahanSum::new();
        sum.extend(iter);
        sum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compensates_small_terms() {
        let mut sum = KahanSum::with_initial(1e16);
        for _ in 0..1000 {
            sum.add(1.0);
        }
        assert_eq!(sum.sum(), 1e16 + 1000.0);

        let mut naive = 1e16_f64;
        for _ in 0..1000 {
            naive += 1.0;
        }
        assert_ne!(naive, 1e16 + 1000.0);
    }

    #[test]
    fn test_from_iterator() {
        let sum: KahanSum = [0.1, 0.2, 0.3].into_iter().collect();
        assert!((sum.sum() - 0.6).abs() < 1e-15);
        assert_eq!(KahanSum::new().sum(), 0.0);
    }
}
