//! The closed family of classifiers and the algorithm registry.
//!
//! Every algorithm trains from a [`SampleSet`] and yields a [`Classifier`], which
//! classifies [`Frequencies`] and encodes to JSON. [`Algorithm`] maps the
//! persisted algorithm names to trainers and decoders.
//!
//! # Examples
//!
//! ```
//! use codelang::classifier::Algorithm;
//! use codelang::config::TrainingConfig;
//! use codelang::tokens::{Frequencies, SampleSet};
//!
//! let mut samples = SampleSet::new();
//! samples.insert("C".into(), vec![[("int", 0.8), ("void", 0.2)].into_iter().collect()]);
//! samples.insert("Python".into(), vec![[("def", 0.6), ("self", 0.4)].into_iter().collect()]);
//!
//! let algorithm: Algorithm = "knn".parse().unwrap();
//! let classifier = algorithm.train(&samples, &TrainingConfig::default()).unwrap();
//! let query: Frequencies = [("def", 0.5), ("self", 0.5)].into_iter().collect();
//! assert_eq!(classifier.classify(&query), "Python");
//!
//! let data = classifier.encode().unwrap();
//! let decoded = algorithm.decode(&data).unwrap();
//! assert_eq!(decoded.classify(&query), "Python");
//! ```

use std::fmt;
use std::str::FromStr;

use log::info;

use crate::config::TrainingConfig;
use crate::error::{CodelangError, Result};
use crate::gaussbayes::{self, GaussBayes};
use crate::idtree::{self, IdTree};
use crate::knn::{self, Knn};
use crate::neuralnet::{self, Network};
use crate::svm::{self, Svm};
use crate::tokens::{Frequencies, SampleSet};

/// A named training algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    IdTree,
    Knn,
    NeuralNet,
    Svm,
    GaussBayes,
}

impl Algorithm {
    /// Every registered algorithm, in listing order.
    pub const ALL: [Algorithm; 5] = [
        Algorithm::IdTree,
        Algorithm::Knn,
        Algorithm::NeuralNet,
        Algorithm::Svm,
        Algorithm::GaussBayes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Algorithm::IdTree => "idtree",
            Algorithm::Knn => "knn",
            Algorithm::NeuralNet => "neuralnet",
            Algorithm::Svm => "svm",
            Algorithm::GaussBayes => "gaussbayes",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Algorithm::IdTree => "use ID3 to make decision trees",
            Algorithm::Knn => "K-nearest neighbors",
            Algorithm::NeuralNet => "feedforward neural network",
            Algorithm::Svm => "support vector machines",
            Algorithm::GaussBayes => "naive Bayes with Gaussians",
        }
    }

    /// Train a classifier with this algorithm.
    pub fn train(self, samples: &SampleSet, config: &TrainingConfig) -> Result<Classifier> {
        info!("Training {} on {} languages", self.name(), samples.len());
        Ok(match self {
            Algorithm::IdTree => Classifier::IdTree(idtree::train(samples, config)?),
            Algorithm::Knn => Classifier::Knn(knn::train(samples, config)?),
            Algorithm::NeuralNet => Classifier::NeuralNet(neuralnet::train(samples, config)?),
            Algorithm::Svm => Classifier::Svm(svm::train(samples, config)?),
            Algorithm::GaussBayes => Classifier::GaussBayes(gaussbayes::train(samples, config)?),
        })
    }

    /// Decode a classifier previously encoded by this algorithm.
    pub fn decode(self, data: &[u8]) -> Result<Classifier> {
        Ok(match self {
            Algorithm::IdTree => Classifier::IdTree(IdTree::decode(data)?),
            Algorithm::Knn => Classifier::Knn(Knn::decode(data)?),
            Algorithm::NeuralNet => Classifier::NeuralNet(Network::decode(data)?),
            Algorithm::Svm => Classifier::Svm(Svm::decode(data)?),
            Algorithm::GaussBayes => Classifier::GaussBayes(GaussBayes::decode(data)?),
        })
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = CodelangError;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::ALL
            .into_iter()
            .find(|a| a.name() == s)
            .ok_or_else(|| CodelangError::unknown_algorithm(s))
    }
}

/// A trained classifier of any algorithm.
#[derive(Debug, Clone, PartialEq)]
pub enum Classifier {
    IdTree(IdTree),
    Knn(Knn),
    NeuralNet(Network),
    Svm(Svm),
    GaussBayes(GaussBayes),
}

impl Classifier {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Classifier::IdTree(_) => Algorithm::IdTree,
            Classifier::Knn(_) => Algorithm::Knn,
            Classifier::NeuralNet(_) => Algorithm::NeuralNet,
            Classifier::Svm(_) => Algorithm::Svm,
            Classifier::GaussBayes(_) => Algorithm::GaussBayes,
        }
    }

    /// The most likely language of a sample.
    pub fn classify(&self, freqs: &Frequencies) -> &str {
        match self {
            Classifier::IdTree(c) => c.classify(freqs),
            Classifier::Knn(c) => c.classify(freqs),
            Classifier::NeuralNet(c) => c.classify(freqs),
            Classifier::Svm(c) => c.classify(freqs),
            Classifier::GaussBayes(c) => c.classify(freqs),
        }
    }

    /// The most likely language and, for identification trees, the confidence of
    /// the leaf that produced it.
    pub fn classify_with_confidence(&self, freqs: &Frequencies) -> (&str, Option<f64>) {
        match self {
            Classifier::IdTree(c) => {
                let result = c.classify_with_confidence(freqs);
                (result.language, result.confidence)
            }
            _ => (self.classify(freqs), None),
        }
    }

    /// Languages the classifier can return, sorted.
    pub fn languages(&self) -> Vec<String> {
        match self {
            Classifier::IdTree(c) => c.languages(),
            Classifier::Knn(c) => c.languages(),
            Classifier::NeuralNet(c) => c.languages(),
            Classifier::Svm(c) => c.languages(),
            Classifier::GaussBayes(c) => c.languages(),
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        match self {
            Classifier::IdTree(c) => c.encode(),
            Classifier::Knn(c) => c.encode(),
            Classifier::NeuralNet(c) => c.encode(),
            Classifier::Svm(c) => c.encode(),
            Classifier::GaussBayes(c) => c.encode(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for algorithm in Algorithm::ALL {
            assert_eq!(algorithm.name().parse::<Algorithm>().unwrap(), algorithm);
            assert_eq!(algorithm.to_string(), algorithm.name());
            assert!(!algorithm.description().is_empty());
        }
    }

    #[test]
    fn test_unknown_algorithm() {
        let err = "forest".parse::<Algorithm>().unwrap_err();
        assert!(matches!(err, CodelangError::UnknownAlgorithm(ref name) if name == "forest"));
    }

    #[test]
    fn test_decode_wrong_format() {
        for algorithm in Algorithm::ALL {
            assert!(algorithm.decode(b"{}").is_err(), "{algorithm} accepted {{}}");
        }
    }
}
