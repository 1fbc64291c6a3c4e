//! Kernel selection and one-vs-all training.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, log};

use crate::config::TrainingConfig;
use crate::error::{CodelangError, Result};
use crate::holdout::{Holdout, accuracy};
use crate::svm::classifier::{BinaryClassifier, Svm};
use crate::svm::kernel::{Kernel, KernelCache};
use crate::svm::solver::solve;
use crate::tokens::{SampleSet, Vocabulary, sample_count};

/// Train a one-vs-all SVM for every configured kernel and keep the one with the
/// best held-out accuracy (the first tried on ties).
pub fn train(samples: &SampleSet, config: &TrainingConfig) -> Result<Svm> {
    config.svm.validate()?;
    if sample_count(samples) == 0 {
        return Err(CodelangError::training("no samples for svm"));
    }

    let holdout = Holdout::split(samples, config.cross_validation_fraction, config.seed);
    let vocabulary = Vocabulary::from_samples(&holdout.training);

    let mut vectors = Vec::new();
    let mut labels = Vec::new();
    for (language_idx, freqs) in holdout.training.values().enumerate() {
        for f in freqs {
            vectors.push(vocabulary.vectorize(f));
            labels.push(language_idx);
        }
    }
    let languages: Vec<&String> = holdout.training.keys().collect();
    let c = 1.0 / (config.svm.tradeoff * vectors.len() as f64);

    let mut best: Option<(Svm, f64)> = None;
    for &kernel in &config.svm.kernels {
        log!(config.progress_level(), "Trying kernel: {kernel}");
        let mut cache = KernelCache::new(kernel, &vectors);

        let mut classifiers = BTreeMap::new();
        for (language_idx, language) in languages.iter().enumerate() {
            let positive: Vec<bool> = labels.iter().map(|&l| l == language_idx).collect();
            let solution = solve(
                &mut cache,
                &positive,
                c,
                config.svm.tolerance,
                config.svm.max_passes,
            );
            debug!(
                "{language}: {} support vectors after {} passes",
                solution.support_vectors.len(),
                solution.passes
            );
            classifiers.insert(
                (*language).clone(),
                BinaryClassifier {
                    support_vectors: solution.support_vectors,
                    weights: solution.weights,
                    threshold: solution.threshold,
                },
            );
        }
        debug!("Kernel cache holds {} rows", cache.cached_rows());

        let svm = pool_support_vectors(&vocabulary, kernel, &vectors, classifiers)?;
        let score = accuracy(&holdout.validation, |f| svm.classify(f));
        if log::log_enabled!(config.progress_level()) {
            let training_score = accuracy(&holdout.training, |f| svm.classify(f));
            log!(
                config.progress_level(),
                "Results: cross={score:.4} training={training_score:.4} support={}/{}",
                svm.sample_vectors().len(),
                vectors.len()
            );
        }

        if best.as_ref().is_none_or(|(_, best_score)| score > *best_score) {
            best = Some((svm, score));
        }
    }

    best.map(|(svm, _)| svm)
        .ok_or_else(|| CodelangError::training("no kernel produced a classifier"))
}

/// Replace per-problem sample indices with indices into a pool holding each used
/// sample once, in ascending sample order.
fn pool_support_vectors(
    vocabulary: &Vocabulary,
    kernel: Kernel,
    vectors: &[Vec<f64>],
    mut classifiers: BTreeMap<String, BinaryClassifier>,
) -> Result<Svm> {
    let used: BTreeSet<usize> = classifiers
        .values()
        .flat_map(|c| c.support_vectors.iter().copied())
        .collect();
    let remap: BTreeMap<usize, usize> = used
        .iter()
        .enumerate()
        .map(|(pool_idx, &sample_idx)| (sample_idx, pool_idx))
        .collect();

    for classifier in classifiers.values_mut() {
        for idx in classifier.support_vectors.iter_mut() {
            *idx = remap[&*idx];
        }
    }
    let pool = used.iter().map(|&i| vectors[i].clone()).collect();
    Svm::new(vocabulary.clone(), kernel, pool, classifiers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SvmConfig;
    use crate::tokens::Frequencies;

    fn freqs(pairs: &[(&str, f64)]) -> Frequencies {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    fn linear_config() -> TrainingConfig {
        TrainingConfig {
            svm: SvmConfig {
                kernels: vec![Kernel::Linear],
                ..SvmConfig::default()
            },
            ..TrainingConfig::default()
        }
    }

    #[test]
    fn test_linear_two_languages() {
        let mut samples = SampleSet::new();
        samples.insert("A".to_string(), vec![freqs(&[("x", 1.0)])]);
        samples.insert("B".to_string(), vec![freqs(&[("y", 1.0)])]);

        let svm = train(&samples, &linear_config()).unwrap();
        assert_eq!(svm.kernel(), Kernel::Linear);
        assert_eq!(svm.sample_vectors().len(), 2);
        assert_eq!(svm.classify(&freqs(&[("x", 1.0)])), "A");
        assert_eq!(svm.classify(&freqs(&[("y", 1.0)])), "B");

        let shrunk = svm.shrink().unwrap();
        assert_eq!(shrunk.classify(&freqs(&[("x", 0.9), ("y", 0.1)])), "A");
    }

    #[test]
    fn test_pool_remaps_indices() {
        let vocabulary = Vocabulary::new(vec!["x".into()]);
        let vectors = vec![vec![0.1], vec![0.2], vec![0.3], vec![0.4]];
        let mut classifiers = BTreeMap::new();
        classifiers.insert(
            "A".to_string(),
            BinaryClassifier {
                support_vectors: vec![3, 1],
                weights: vec![1.0, 2.0],
                threshold: 0.5,
            },
        );
        classifiers.insert(
            "B".to_string(),
            BinaryClassifier {
                support_vectors: vec![1],
                weights: vec![-1.0],
                threshold: 0.0,
            },
        );

        let svm = pool_support_vectors(&vocabulary, Kernel::Linear, &vectors, classifiers).unwrap();
        assert_eq!(svm.sample_vectors(), &[vec![0.2], vec![0.4]]);
        assert_eq!(svm.classifiers()["A"].support_vectors, vec![1, 0]);
        assert_eq!(svm.classifiers()["B"].support_vectors, vec![0]);
    }

    #[test]
    fn test_first_kernel_wins_ties() {
        let mut samples = SampleSet::new();
        samples.insert("A".to_string(), vec![freqs(&[("x", 1.0)])]);
        samples.insert("B".to_string(), vec![freqs(&[("y", 1.0)])]);
        let config = TrainingConfig {
            svm: SvmConfig {
                kernels: vec![
                    Kernel::Polynomial {
                        sum: 1.0,
                        degree: 2.0,
                    },
                    Kernel::Linear,
                ],
                ..SvmConfig::default()
            },
            ..TrainingConfig::default()
        };
        // Nothing is held out, so every kernel scores 0.
        let svm = train(&samples, &config).unwrap();
        assert_eq!(
            svm.kernel(),
            Kernel::Polynomial {
                sum: 1.0,
                degree: 2.0
            }
        );
    }
}
