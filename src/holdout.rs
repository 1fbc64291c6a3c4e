//! Seeded held-out partitions used for model selection.

use rand::prelude::*;

use crate::tokens::{Frequencies, SampleSet};

/// A sample set split into a held-out part and a training part.
#[derive(Debug, Clone, Default)]
pub struct Holdout {
    pub validation: SampleSet,
    pub training: SampleSet,
}

impl Holdout {
    /// Shuffle each language's samples and hold out `floor(fraction * count)` of them.
    ///
    /// Languages are processed in sorted order from a single generator, so the
    /// partition only depends on the data and the seed.
    pub fn split(samples: &SampleSet, fraction: f64, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut holdout = Self::default();

        for (language, freqs) in samples {
            let mut shuffled: Vec<Frequencies> = freqs.clone();
            shuffled.shuffle(&mut rng);
            let held = ((fraction * shuffled.len() as f64).floor() as usize).min(shuffled.len());
            let training = shuffled.split_off(held);
            holdout.validation.insert(language.clone(), shuffled);
            holdout.training.insert(language.clone(), training);
        }
        holdout
    }
}

/// Fraction of samples for which `classify` returns the sample's language.
///
/// An empty sample set scores 0.
pub fn accuracy<'a, F>(samples: &SampleSet, classify: F) -> f64
where
    F: Fn(&Frequencies) -> &'a str,
{
    let mut correct = 0usize;
    let mut total = 0usize;
    for (language, freqs) in samples {
        for sample in freqs {
            total += 1;
            if classify(sample) == language {
                correct += 1;
            }
        }
    }
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}
