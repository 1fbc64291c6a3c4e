//! One-vs-all combination, shrinking and persistence.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{CodelangError, Result};
use crate::svm::kernel::{Kernel, KernelRecord};
use crate::tokens::{Frequencies, Vocabulary};
use crate::util::{KahanSum, linalg};

/// A language-vs-rest machine over the shared support vector pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryClassifier {
    /// Indices into the model's sample vectors.
    pub support_vectors: Vec<usize>,
    /// Weight of each support vector.
    pub weights: Vec<f64>,
    pub threshold: f64,
}

/// A trained one-vs-all kernel SVM.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Svm {
    keywords: Vocabulary,
    kernel: Kernel,
    sample_vectors: Vec<Vec<f64>>,
    classifiers: BTreeMap<String, BinaryClassifier>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SvmRecord {
    keywords: Vocabulary,
    kernel: KernelRecord,
    sample_vectors: Vec<Vec<f64>>,
    classifiers: BTreeMap<String, BinaryClassifier>,
}

impl Svm {
    pub fn new(
        keywords: Vocabulary,
        kernel: Kernel,
        sample_vectors: Vec<Vec<f64>>,
        classifiers: BTreeMap<String, BinaryClassifier>,
    ) -> Result<Self> {
        let svm = Self {
            keywords,
            kernel,
            sample_vectors,
            classifiers,
        };
        svm.validate()?;
        Ok(svm)
    }

    pub fn kernel(&self) -> Kernel {
        self.kernel
    }

    pub fn keywords(&self) -> &Vocabulary {
        &self.keywords
    }

    pub fn sample_vectors(&self) -> &[Vec<f64>] {
        &self.sample_vectors
    }

    pub fn classifiers(&self) -> &BTreeMap<String, BinaryClassifier> {
        &self.classifiers
    }

    /// Margin score of every language for a sample, in sorted language order.
    pub fn scores(&self, freqs: &Frequencies) -> Vec<(&str, f64)> {
        let query = self.keywords.vectorize(freqs);
        let products: Vec<f64> = self
            .sample_vectors
            .iter()
            .map(|sv| self.kernel.product(sv, &query))
            .collect();

        self.classifiers
            .iter()
            .map(|(language, classifier)| {
                let mut sum: KahanSum = classifier
                    .support_vectors
                    .iter()
                    .zip(&classifier.weights)
                    .map(|(&idx, &w)| products[idx] * w)
                    .collect();
                sum.add(-classifier.threshold);
                (language.as_str(), sum.sum())
            })
            .collect()
    }

    /// The language with the largest margin; the first in sorted order wins ties.
    pub fn classify(&self, freqs: &Frequencies) -> &str {
        let mut best: Option<(&str, f64)> = None;
        for (language, score) in self.scores(freqs) {
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((language, score));
            }
        }
        best.map_or("", |(language, _)| language)
    }

    pub fn languages(&self) -> Vec<String> {
        self.classifiers.keys().cloned().collect()
    }

    /// Collapse a linear-kernel model to one vector per language.
    ///
    /// With a linear kernel `Σ w_i (sv_i · x) = (Σ w_i sv_i) · x`, so each binary
    /// classifier becomes a single support vector with weight 1 and the same
    /// threshold. Classification results are unchanged.
    pub fn shrink(&self) -> Result<Svm> {
        if self.kernel != Kernel::Linear {
            return Err(CodelangError::invalid_operation(format!(
                "only linear SVMs can be shrunk, kernel is {}",
                self.kernel
            )));
        }

        let dims = self.keywords.len();
        let mut sample_vectors = Vec::with_capacity(self.classifiers.len());
        let mut classifiers = BTreeMap::new();
        for (language, classifier) in &self.classifiers {
            let mut aggregate = vec![0.0; dims];
            for (&idx, &w) in classifier.support_vectors.iter().zip(&classifier.weights) {
                linalg::add_scaled(&mut aggregate, &self.sample_vectors[idx], w);
            }
            classifiers.insert(
                language.clone(),
                BinaryClassifier {
                    support_vectors: vec![sample_vectors.len()],
                    weights: vec![1.0],
                    threshold: classifier.threshold,
                },
            );
            sample_vectors.push(aggregate);
        }

        Svm::new(self.keywords.clone(), Kernel::Linear, sample_vectors, classifiers)
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decode a model; a kernel with the wrong parameters is a configuration error.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let record: SvmRecord = serde_json::from_slice(data)
            .map_err(|e| CodelangError::decode(format!("svm classifier: {e}")))?;
        let kernel = Kernel::new(record.kernel.kind, &record.kernel.params)?;
        Svm::new(
            record.keywords,
            kernel,
            record.sample_vectors,
            record.classifiers,
        )
    }

    fn validate(&self) -> Result<()> {
        if self.classifiers.is_empty() {
            return Err(CodelangError::decode("svm has no classifiers"));
        }
        for vector in &self.sample_vectors {
            if vector.len() != self.keywords.len() || !linalg::is_finite(vector) {
                return Err(CodelangError::decode(format!(
                    "svm sample vector must have {} finite components",
                    self.keywords.len()
                )));
            }
        }
        for (language, classifier) in &self.classifiers {
            if classifier.support_vectors.len() != classifier.weights.len() {
                return Err(CodelangError::decode(format!(
                    "{language}: {} support vectors but {} weights",
                    classifier.support_vectors.len(),
                    classifier.weights.len()
                )));
            }
            if let Some(&idx) = classifier
                .support_vectors
                .iter()
                .find(|&&idx| idx >= self.sample_vectors.len())
            {
                return Err(CodelangError::decode(format!(
                    "{language}: support vector index {idx} out of range"
                )));
            }
            if !classifier.threshold.is_finite() || !linalg::is_finite(&classifier.weights) {
                return Err(CodelangError::decode(format!(
                    "{language}: non-finite weights"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(pairs: &[(&str, f64)]) -> Frequencies {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    fn two_language_model(kernel: Kernel) -> Svm {
        let mut classifiers = BTreeMap::new();
        classifiers.insert(
            "A".to_string(),
            BinaryClassifier {
                support_vectors: vec![0, 1],
                weights: vec![1.0, -1.0],
                threshold: 0.0,
            },
        );
        classifiers.insert(
            "B".to_string(),
            BinaryClassifier {
                support_vectors: vec![0, 1],
                weights: vec![-1.0, 1.0],
                threshold: 0.0,
            },
        );
        Svm::new(
            Vocabulary::new(vec!["a".into(), "b".into()]),
            kernel,
            vec![vec![1.0, 0.0], vec![0.0, 1.0]],
            classifiers,
        )
        .unwrap()
    }

    #[test]
    fn test_classify_by_largest_margin() {
        let svm = two_language_model(Kernel::Linear);
        assert_eq!(svm.classify(&freqs(&[("a", 1.0)])), "A");
        assert_eq!(svm.classify(&freqs(&[("b", 1.0)])), "B");
        // Equal margins: first language wins.
        assert_eq!(svm.classify(&Frequencies::new()), "A");
    }

    #[test]
    fn test_shrink_classifies_identically() {
        let svm = two_language_model(Kernel::Linear);
        let shrunk = svm.shrink().unwrap();
        assert_eq!(shrunk.sample_vectors().len(), 2);
        assert_eq!(shrunk.sample_vectors()[0], vec![1.0, -1.0]);

        for query in [
            freqs(&[("a", 0.7), ("b", 0.3)]),
            freqs(&[("a", 0.2), ("b", 0.8)]),
            freqs(&[("c", 1.0)]),
        ] {
            assert_eq!(svm.classify(&query), shrunk.classify(&query));
            for ((_, x), (_, y)) in svm.scores(&query).into_iter().zip(shrunk.scores(&query)) {
                assert!((x - y).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_shrink_requires_linear_kernel() {
        let svm = two_language_model(Kernel::RadialBasis { gamma: 1.0 });
        assert!(matches!(
            svm.shrink(),
            Err(CodelangError::InvalidOperation(_))
        ));
    }

    #[test]
    fn test_round_trip() {
        let svm = two_language_model(Kernel::Polynomial {
            sum: 1.0,
            degree: 2.0,
        });
        let json = String::from_utf8(svm.encode().unwrap()).unwrap();
        assert!(json.contains(r#""kernel":{"type":"polynomial","params":[1.0,2.0]}"#));
        assert!(json.contains(r#""supportVectors":[0,1]"#));
        assert_eq!(Svm::decode(json.as_bytes()).unwrap(), svm);
    }

    #[test]
    fn test_decode_validation() {
        let bad_kernel = br#"{"keywords":["a"],"kernel":{"type":"rbf","params":[]},
            "sampleVectors":[[1.0]],
            "classifiers":{"A":{"supportVectors":[0],"weights":[1.0],"threshold":0.0}}}"#;
        assert!(matches!(
            Svm::decode(bad_kernel),
            Err(CodelangError::InvalidConfig(_))
        ));

        let bad_index = br#"{"keywords":["a"],"kernel":{"type":"linear","params":[]},
            "sampleVectors":[[1.0]],
            "classifiers":{"A":{"supportVectors":[3],"weights":[1.0],"threshold":0.0}}}"#;
        assert!(matches!(Svm::decode(bad_index), Err(CodelangError::Decode(_))));

        assert!(matches!(Svm::decode(b"[]"), Err(CodelangError::Decode(_))));
    }
}
