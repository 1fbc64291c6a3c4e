//! Neighbor count selection.

use log::{debug, log};

use crate::config::{NeighborWeighting, TrainingConfig};
use crate::error::{CodelangError, Result};
use crate::holdout::Holdout;
use crate::knn::classifier::{Ballot, Knn, KnnSample};
use crate::tokens::{SampleSet, Vocabulary, sample_count};
use crate::util::linalg;

/// Train a K-nearest-neighbors classifier.
///
/// The neighbor count is the one that classifies the most held-out samples
/// correctly against the remaining samples (the smallest such count on ties, 1 when
/// nothing is held out). The final model stores every sample.
pub fn train(samples: &SampleSet, config: &TrainingConfig) -> Result<Knn> {
    if sample_count(samples) == 0 {
        return Err(CodelangError::training("no samples for knn"));
    }

    let vocabulary = Vocabulary::from_samples(samples);
    let weighting = config.knn.weighting;

    let holdout = Holdout::split(samples, config.cross_validation_fraction, config.seed);
    let training = normalized_samples(&vocabulary, &holdout.training);
    let validation = normalized_samples(&vocabulary, &holdout.validation);

    let neighbor_count = optimal_neighbor_count(&training, &validation, weighting);
    log!(
        config.progress_level(),
        "Chose k={} using {} held-out samples",
        neighbor_count,
        validation.len()
    );

    let all = normalized_samples(&vocabulary, samples);
    debug!("Storing {} samples over {} tokens", all.len(), vocabulary.len());
    Knn::new(vocabulary, all, neighbor_count, weighting)
}

fn normalized_samples(vocabulary: &Vocabulary, samples: &SampleSet) -> Vec<KnnSample> {
    samples
        .iter()
        .flat_map(|(language, freqs)| {
            freqs.iter().map(move |f| {
                let mut vector = vocabulary.vectorize(f);
                linalg::l2_normalize(&mut vector);
                KnnSample {
                    language: language.clone(),
                    vector,
                }
            })
        })
        .collect()
}

/// Score every candidate k in a single pass per held-out sample.
///
/// Each held-out sample ranks the training samples by similarity once; its ballot
/// then grows one neighbor at a time and the correct count for that k is bumped
/// whenever the current winner matches.
fn optimal_neighbor_count(
    training: &[KnnSample],
    validation: &[KnnSample],
    weighting: NeighborWeighting,
) -> usize {
    if validation.is_empty() || training.is_empty() {
        return 1;
    }

    let mut correct = vec![0usize; training.len()];
    for held_out in validation {
        // Same fallback as `Knn::classify`: the first stored sample's language,
        // whatever k is.
        if linalg::norm(&held_out.vector) == 0.0 {
            if held_out.language == training[0].language {
                correct.iter_mut().for_each(|count| *count += 1);
            }
            continue;
        }

        let mut ranked: Vec<(f64, &str)> = training
            .iter()
            .map(|s| (linalg::dot(&s.vector, &held_out.vector), s.language.as_str()))
            .collect();
        // Stable, so equally similar samples keep their stored order.
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut ballot = Ballot::new(weighting);
        for (k_index, &(similarity, language)) in ranked.iter().enumerate() {
            ballot.add(language, similarity);
            if ballot.winner() == Some(held_out.language.as_str()) {
                correct[k_index] += 1;
            }
        }
    }

    let mut best_k = 1;
    let mut best_correct = 0;
    for (k_index, &count) in correct.iter().enumerate() {
        if count > best_correct {
            best_correct = count;
            best_k = k_index + 1;
        }
    }
    best_k
}
