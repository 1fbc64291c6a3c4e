//! Kernel functions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CodelangError, Result};
use crate::util::linalg;

/// Kernel family, as named in persisted models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KernelType {
    #[serde(rename = "linear")]
    Linear,
    #[serde(rename = "polynomial")]
    Polynomial,
    #[serde(rename = "rbf")]
    RadialBasis,
}

impl KernelType {
    /// Number of numeric parameters the kernel takes.
    pub fn param_count(self) -> usize {
        match self {
            KernelType::Linear => 0,
            KernelType::Polynomial => 2,
            KernelType::RadialBasis => 1,
        }
    }
}

/// An inner product in some feature space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KernelRecord", into = "KernelRecord")]
pub enum Kernel {
    /// `x·y`
    Linear,
    /// `(x·y + sum)^degree`
    Polynomial { sum: f64, degree: f64 },
    /// `exp(-gamma·‖x−y‖²)`
    RadialBasis { gamma: f64 },
}

impl Kernel {
    /// Build a kernel from its type and parameter list.
    ///
    /// Fails with [`CodelangError::InvalidConfig`] if the number of parameters does
    /// not match the kernel type, a parameter is not finite, or a polynomial degree
    /// is not a positive integer.
    pub fn new(kind: KernelType, params: &[f64]) -> Result<Self> {
        if params.len() != kind.param_count() {
            return Err(CodelangError::invalid_config(format!(
                "{kind:?} kernel takes {} parameters, got {}",
                kind.param_count(),
                params.len()
            )));
        }
        if params.iter().any(|p| !p.is_finite()) {
            return Err(CodelangError::invalid_config(format!(
                "{kind:?} kernel parameters must be finite, got {params:?}"
            )));
        }
        if kind == KernelType::Polynomial {
            let degree = params[1];
            if degree < 1.0 || degree.fract() != 0.0 {
                return Err(CodelangError::invalid_config(format!(
                    "polynomial degree must be a positive integer, got {degree}"
                )));
            }
        }
        Ok(match kind {
            KernelType::Linear => Kernel::Linear,
            KernelType::Polynomial => Kernel::Polynomial {
                sum: params[0],
                degree: params[1],
            },
            KernelType::RadialBasis => Kernel::RadialBasis { gamma: params[0] },
        })
    }

    pub fn kind(&self) -> KernelType {
        match self {
            Kernel::Linear => KernelType::Linear,
            Kernel::Polynomial { .. } => KernelType::Polynomial,
            Kernel::RadialBasis { .. } => KernelType::RadialBasis,
        }
    }

    pub fn params(&self) -> Vec<f64> {
        match *self {
            Kernel::Linear => Vec::new(),
            Kernel::Polynomial { sum, degree } => vec![sum, degree],
            Kernel::RadialBasis { gamma } => vec![gamma],
        }
    }

    /// The kernel's inner product of two vectors.
    #[inline]
    pub fn product(&self, a: &[f64], b: &[f64]) -> f64 {
        match *self {
            Kernel::Linear => linalg::dot(a, b),
            Kernel::Polynomial { sum, degree } => (linalg::dot(a, b) + sum).powf(degree),
            Kernel::RadialBasis { gamma } => (-gamma * linalg::squared_distance(a, b)).exp(),
        }
    }

    /// Kernels tried when none are configured: linear, `(x·y + c)^2` for
    /// c in {0, 1}, and radial basis with gamma from 1e-5 to 1e2.
    pub fn default_candidates() -> Vec<Kernel> {
        let mut kernels = vec![Kernel::Linear];
        kernels.extend([0.0, 1.0].map(|sum| Kernel::Polynomial { sum, degree: 2.0 }));
        kernels.extend((-5..=2).map(|p| Kernel::RadialBasis {
            gamma: 10f64.powi(p),
        }));
        kernels
    }
}

impl fmt::Display for Kernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Kernel::Linear => write!(f, "x*y"),
            Kernel::Polynomial { sum, degree } => write!(f, "(x*y + {sum})^{degree}"),
            Kernel::RadialBasis { gamma } => write!(f, "exp(-{gamma}*||x-y||^2)"),
        }
    }
}

/// Persisted form of a [`Kernel`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct KernelRecord {
    #[serde(rename = "type")]
    pub kind: KernelType,
    #[serde(default)]
    pub params: Vec<f64>,
}

impl From<Kernel> for KernelRecord {
    fn from(kernel: Kernel) -> Self {
        KernelRecord {
            kind: kernel.kind(),
            params: kernel.params(),
        }
    }
}

impl TryFrom<KernelRecord> for Kernel {
    type Error = CodelangError;

    fn try_from(record: KernelRecord) -> Result<Self> {
        Kernel::new(record.kind, &record.params)
    }
}

/// Lazily computed kernel rows over a fixed list of sample vectors.
///
/// Row `i` holds the products of sample `i` with every sample and is computed the
/// first time any product involving `i` as the row index is requested.
pub struct KernelCache<'a> {
    kernel: Kernel,
    vectors: &'a [Vec<f64>],
    rows: Vec<Option<Vec<f64>>>,
}

impl<'a> KernelCache<'a> {
    pub fn new(kernel: Kernel, vectors: &'a [Vec<f64>]) -> Self {
        Self {
            kernel,
            vectors,
            rows: vec![None; vectors.len()],
        }
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Products of sample `i` with every sample.
    pub fn row(&mut self, i: usize) -> &[f64] {
        let kernel = self.kernel;
        let vectors = self.vectors;
        self.rows[i].get_or_insert_with(|| {
            vectors
                .iter()
                .map(|v| kernel.product(&vectors[i], v))
                .collect()
        })
    }

    /// Product of samples `i` and `j`.
    pub fn get(&mut self, i: usize, j: usize) -> f64 {
        if let Some(row) = &self.rows[j] {
            return row[i];
        }
        self.row(i)[j]
    }

    /// Number of rows computed so far.
    pub fn cached_rows(&self) -> usize {
        self.rows.iter().filter(|r| r.is_some()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_products() {
        let a = [1.0, 2.0];
        let b = [3.0, 4.0];
        assert_eq!(Kernel::Linear.product(&a, &b), 11.0);
        assert_eq!(
            Kernel::Polynomial {
                sum: 1.0,
                degree: 2.0
            }
            .product(&a, &b),
            144.0
        );
        let rbf = Kernel::RadialBasis { gamma: 0.5 };
        assert!((rbf.product(&a, &b) - (-4.0f64).exp()).abs() < 1e-15);
        assert_eq!(rbf.product(&a, &a), 1.0);
    }

    #[test]
    fn test_parameter_validation() {
        assert!(Kernel::new(KernelType::Linear, &[]).is_ok());
        assert!(matches!(
            Kernel::new(KernelType::Polynomial, &[1.0]),
            Err(CodelangError::InvalidConfig(_))
        ));
        assert!(Kernel::new(KernelType::RadialBasis, &[1.0, 2.0]).is_err());
        assert!(Kernel::new(KernelType::RadialBasis, &[f64::NAN]).is_err());
        assert!(matches!(
            Kernel::new(KernelType::Polynomial, &[-1.0, 1.5]),
            Err(CodelangError::InvalidConfig(_))
        ));
        assert!(Kernel::new(KernelType::Polynomial, &[1.0, 0.0]).is_err());
        assert!(Kernel::new(KernelType::Polynomial, &[1.0, -2.0]).is_err());
        assert!(Kernel::new(KernelType::Polynomial, &[-1.0, 3.0]).is_ok());
        assert_eq!(
            Kernel::new(KernelType::Polynomial, &[1.0, 3.0]).unwrap(),
            Kernel::Polynomial {
                sum: 1.0,
                degree: 3.0
            }
        );
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&Kernel::RadialBasis { gamma: 0.25 }).unwrap();
        assert_eq!(json, r#"{"type":"rbf","params":[0.25]}"#);
        let kernel: Kernel = serde_json::from_str(r#"{"type":"linear"}"#).unwrap();
        assert_eq!(kernel, Kernel::Linear);
        assert!(serde_json::from_str::<Kernel>(r#"{"type":"polynomial","params":[2]}"#).is_err());
        assert!(
            serde_json::from_str::<Kernel>(r#"{"type":"polynomial","params":[-1,0.5]}"#).is_err()
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(Kernel::Linear.to_string(), "x*y");
        let poly = Kernel::Polynomial {
            sum: 1.0,
            degree: 2.0,
        };
        assert_eq!(poly.to_string(), "(x*y + 1)^2");
    }

    #[test]
    fn test_default_candidates() {
        let kernels = Kernel::default_candidates();
        assert_eq!(kernels.len(), 11);
        assert_eq!(kernels[0], Kernel::Linear);
        assert_eq!(kernels[10], Kernel::RadialBasis { gamma: 100.0 });
    }

    #[test]
    fn test_cache() {
        let vectors = vec![vec![1.0, 0.0], vec![1.0, 1.0]];
        let mut cache = KernelCache::new(Kernel::Linear, &vectors);
        assert_eq!(cache.cached_rows(), 0);
        assert_eq!(cache.get(0, 1), 1.0);
        assert_eq!(cache.get(1, 0), 1.0);
        assert_eq!(cache.cached_rows(), 1);
        assert_eq!(cache.row(1), &[1.0, 2.0]);
        assert_eq!(cache.cached_rows(), 2);
    }
}
