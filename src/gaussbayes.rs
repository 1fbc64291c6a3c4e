//! Gaussian naive Bayes classifier.
//!
//! Every (language, token) pair gets a normal distribution fitted to the token's
//! frequency across the language's samples. A sample is assigned to the language
//! under which the sum of per-token log-densities is highest.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

use log::{log, warn};
use serde::{Deserialize, Serialize};

use crate::config::TrainingConfig;
use crate::error::{CodelangError, Result};
use crate::tokens::{Frequencies, SampleSet, Vocabulary, sample_count};
use crate::util::KahanSum;

/// Variance used when no (language, token) pair has a nonzero variance.
pub const FALLBACK_VARIANCE: f64 = 1e-6;

/// A normal distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gaussian {
    pub mean: f64,
    pub variance: f64,
}

impl Gaussian {
    /// Natural log of the density at `x`.
    #[inline]
    pub fn log_density(&self, x: f64) -> f64 {
        let diff = x - self.mean;
        -0.5 * (2.0 * PI * self.variance).ln() - diff * diff / (2.0 * self.variance)
    }
}

/// A trained Gaussian naive Bayes classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaussBayes {
    lang_gaussians: BTreeMap<String, BTreeMap<String, Gaussian>>,
}

impl GaussBayes {
    pub fn new(lang_gaussians: BTreeMap<String, BTreeMap<String, Gaussian>>) -> Result<Self> {
        let model = Self { lang_gaussians };
        model.validate()?;
        Ok(model)
    }

    pub fn gaussian(&self, language: &str, token: &str) -> Option<&Gaussian> {
        self.lang_gaussians.get(language)?.get(token)
    }

    /// Log-likelihood of a sample under one language's distributions.
    pub fn log_likelihood(&self, language: &str, freqs: &Frequencies) -> Option<f64> {
        self.lang_gaussians
            .get(language)
            .map(|gaussians| Self::score(gaussians, freqs))
    }

    fn score(gaussians: &BTreeMap<String, Gaussian>, freqs: &Frequencies) -> f64 {
        gaussians
            .iter()
            .map(|(token, g)| g.log_density(freqs.get(token)))
            .collect::<KahanSum>()
            .sum()
    }

    /// The language with the highest log-likelihood; the first in sorted order wins
    /// ties.
    pub fn classify(&self, freqs: &Frequencies) -> &str {
        let mut best: Option<(&str, f64)> = None;
        for (language, gaussians) in &self.lang_gaussians {
            let score = Self::score(gaussians, freqs);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((language.as_str(), score));
            }
        }
        best.map_or("", |(language, _)| language)
    }

    pub fn languages(&self) -> Vec<String> {
        self.lang_gaussians.keys().cloned().collect()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let model: Self = serde_json::from_slice(data)
            .map_err(|e| CodelangError::decode(format!("gaussian bayes classifier: {e}")))?;
        model.validate()?;
        Ok(model)
    }

    fn validate(&self) -> Result<()> {
        if self.lang_gaussians.is_empty() {
            return Err(CodelangError::decode("gaussian bayes classifier has no languages"));
        }
        for (language, gaussians) in &self.lang_gaussians {
            for (token, g) in gaussians {
                if !g.mean.is_finite() || !(g.variance > 0.0 && g.variance.is_finite()) {
                    return Err(CodelangError::decode(format!(
                        "invalid distribution for {token:?} in {language}: mean {}, variance {}",
                        g.mean, g.variance
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Fit per-language, per-token Gaussians.
///
/// Tokens absent from a sample count as frequency 0, and variances are population
/// variances. Zero variances are replaced by the smallest nonzero variance in the
/// model (or [`FALLBACK_VARIANCE`]).
pub fn train(samples: &SampleSet, config: &TrainingConfig) -> Result<GaussBayes> {
    if sample_count(samples) == 0 {
        return Err(CodelangError::training("no samples for gaussian bayes"));
    }

    let vocabulary = Vocabulary::from_samples(samples);
    let mut lang_gaussians = BTreeMap::new();
    for (language, freqs) in samples {
        if freqs.is_empty() {
            warn!("Skipping {language}: no samples");
            continue;
        }
        lang_gaussians.insert(language.clone(), fit_language(&vocabulary, freqs));
    }

    let replaced = regularize_variances(&mut lang_gaussians);
    log!(
        config.progress_level(),
        "Fitted {} languages over {} tokens ({} zero variances replaced)",
        lang_gaussians.len(),
        vocabulary.len(),
        replaced
    );
    GaussBayes::new(lang_gaussians)
}

fn fit_language(vocabulary: &Vocabulary, freqs: &[Frequencies]) -> BTreeMap<String, Gaussian> {
    let n = freqs.len() as f64;

    let mut sums: HashMap<&str, KahanSum> = HashMap::new();
    for sample in freqs {
        for (token, value) in sample.iter() {
            sums.entry(token).or_default().add(value);
        }
    }

    vocabulary
        .tokens()
        .iter()
        .map(|token| {
            let mean = sums.get(token.as_str()).map_or(0.0, |s| s.sum() / n);
            let squares: KahanSum = freqs
                .iter()
                .map(|sample| {
                    let diff = sample.get(token) - mean;
                    diff * diff
                })
                .collect();
            (
                token.clone(),
                Gaussian {
                    mean,
                    variance: squares.sum() / n,
                },
            )
        })
        .collect()
}

/// Replace zero variances; returns how many were replaced.
fn regularize_variances(
    lang_gaussians: &mut BTreeMap<String, BTreeMap<String, Gaussian>>,
) -> usize {
    let smallest = lang_gaussians
        .values()
        .flat_map(BTreeMap::values)
        .map(|g| g.variance)
        .filter(|&v| v > 0.0)
        .min_by(f64::total_cmp)
        .unwrap_or(FALLBACK_VARIANCE);

    let mut replaced = 0;
    for g in lang_gaussians.values_mut().flat_map(BTreeMap::values_mut) {
        if !(g.variance > 0.0) {
            g.variance = smallest;
            replaced += 1;
        }
    }
    replaced
}
