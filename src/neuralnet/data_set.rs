//! Held-out partitions with prepared network inputs.

use crate::config::TrainingConfig;
use crate::holdout::Holdout;
use crate::neuralnet::network::Network;
use crate::tokens::{SampleSet, Vocabulary};
use crate::util::KahanSum;

/// A network input vector with the index of its language.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledInput {
    pub language: usize,
    pub input: Vec<f64>,
}

/// Samples split into training and validation parts and converted into network
/// inputs.
///
/// The vocabulary and the per-feature standardization come from the training part
/// only.
#[derive(Debug, Clone)]
pub struct DataSet {
    pub(crate) vocabulary: Vocabulary,
    pub(crate) langs: Vec<String>,
    pub(crate) input_shift: Option<Vec<f64>>,
    pub(crate) input_scale: Option<Vec<f64>>,
    pub(crate) training: Vec<LabeledInput>,
    pub(crate) validation: Vec<LabeledInput>,
}

impl DataSet {
    pub fn new(samples: &SampleSet, config: &TrainingConfig) -> Self {
        let holdout = Holdout::split(samples, config.cross_validation_fraction, config.seed);
        let vocabulary = Vocabulary::from_samples(&holdout.training);
        let langs: Vec<String> = samples.keys().cloned().collect();

        let mut training = raw_inputs(&vocabulary, &holdout.training);
        let mut validation = raw_inputs(&vocabulary, &holdout.validation);

        let (input_shift, input_scale) = if config.neuralnet.standardize_inputs {
            let (shift, scale) = feature_statistics(vocabulary.len(), &training);
            for sample in training.iter_mut().chain(validation.iter_mut()) {
                standardize(&mut sample.input, &shift, &scale);
            }
            (Some(shift), Some(scale))
        } else {
            (None, None)
        };

        Self {
            vocabulary,
            langs,
            input_shift,
            input_scale,
            training,
            validation,
        }
    }

    pub fn langs(&self) -> &[String] {
        &self.langs
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn training_len(&self) -> usize {
        self.training.len()
    }

    pub fn validation_len(&self) -> usize {
        self.validation.len()
    }

    /// Fraction of held-out samples the network classifies correctly.
    pub fn cross_score(&self, network: &Network) -> f64 {
        score(network, &self.validation)
    }

    /// Fraction of training samples the network classifies correctly.
    pub fn training_score(&self, network: &Network) -> f64 {
        score(network, &self.training)
    }
}

fn raw_inputs(vocabulary: &Vocabulary, samples: &SampleSet) -> Vec<LabeledInput> {
    samples
        .values()
        .enumerate()
        .flat_map(|(language, freqs)| {
            freqs.iter().map(move |f| LabeledInput {
                language,
                input: vocabulary.vectorize(f),
            })
        })
        .collect()
}

/// Per-feature shift (negated mean) and scale (reciprocal population standard
/// deviation, or 1 for constant features).
fn feature_statistics(dims: usize, samples: &[LabeledInput]) -> (Vec<f64>, Vec<f64>) {
    if samples.is_empty() {
        return (vec![0.0; dims], vec![1.0; dims]);
    }
    let n = samples.len() as f64;
    let mut shift = Vec::with_capacity(dims);
    let mut scale = Vec::with_capacity(dims);
    for j in 0..dims {
        let mean = samples.iter().map(|s| s.input[j]).collect::<KahanSum>().sum() / n;
        let variance = samples
            .iter()
            .map(|s| (s.input[j] - mean).powi(2))
            .collect::<KahanSum>()
            .sum()
            / n;
        let stddev = variance.sqrt();
        shift.push(-mean);
        scale.push(if stddev > 0.0 { 1.0 / stddev } else { 1.0 });
    }
    (shift, scale)
}

fn standardize(input: &mut [f64], shift: &[f64], scale: &[f64]) {
    for ((x, s), k) in input.iter_mut().zip(shift).zip(scale) {
        *x = (*x + s) * k;
    }
}

fn score(network: &Network, samples: &[LabeledInput]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let correct = samples
        .iter()
        .filter(|s| network.predict(&s.input) == s.language)
        .count();
    correct as f64 / samples.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Frequencies;

    fn freqs(pairs: &[(&str, f64)]) -> Frequencies {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn test_feature_statistics() {
        let samples = vec![
            LabeledInput {
                language: 0,
                input: vec![1.0, 0.5],
            },
            LabeledInput {
                language: 1,
                input: vec![3.0, 0.5],
            },
        ];
        let (shift, scale) = feature_statistics(2, &samples);
        assert_eq!(shift, vec![-2.0, -0.5]);
        assert_eq!(scale, vec![1.0, 1.0]);
    }

    #[test]
    fn test_standardized_training_inputs() {
        let mut samples = SampleSet::new();
        samples.insert("A".to_string(), vec![freqs(&[("x", 0.2)])]);
        samples.insert("B".to_string(), vec![freqs(&[("x", 0.6)])]);
        let data = DataSet::new(&samples, &TrainingConfig::default());

        assert_eq!(data.langs(), &["A", "B"]);
        assert_eq!(data.training_len(), 2);
        assert_eq!(data.validation_len(), 0);
        assert!((data.training[0].input[0] + 1.0).abs() < 1e-12);
        assert!((data.training[1].input[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_raw_inputs_without_standardization() {
        let mut samples = SampleSet::new();
        samples.insert("A".to_string(), vec![freqs(&[("x", 0.2)])]);
        let mut config = TrainingConfig::default();
        config.neuralnet.standardize_inputs = false;
        let data = DataSet::new(&samples, &config);

        assert!(data.input_shift.is_none());
        assert_eq!(data.training[0].input, vec![0.2]);
    }
}
