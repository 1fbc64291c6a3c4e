//! Nearest-neighbor voting and persistence.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::config::NeighborWeighting;
use crate::error::{CodelangError, Result};
use crate::tokens::{Frequencies, Vocabulary};
use crate::util::linalg;

/// A stored training sample with a unit-length (or all-zero) vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnSample {
    pub language: String,
    pub vector: Vec<f64>,
}

/// A trained K-nearest-neighbors classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Knn {
    tokens: Vocabulary,
    samples: Vec<KnnSample>,
    neighbor_count: usize,
    #[serde(default)]
    weighting: NeighborWeighting,
}

impl Knn {
    /// Build a classifier from normalized samples.
    pub fn new(
        tokens: Vocabulary,
        samples: Vec<KnnSample>,
        neighbor_count: usize,
        weighting: NeighborWeighting,
    ) -> Result<Self> {
        let knn = Self {
            tokens,
            samples,
            neighbor_count,
            weighting,
        };
        knn.validate()?;
        Ok(knn)
    }

    pub fn neighbor_count(&self) -> usize {
        self.neighbor_count
    }

    pub fn weighting(&self) -> NeighborWeighting {
        self.weighting
    }

    pub fn samples(&self) -> &[KnnSample] {
        &self.samples
    }

    /// Classify a sample by similarity-weighted voting of its nearest neighbors.
    ///
    /// A sample with no vocabulary tokens cannot be normalized and is assigned the
    /// language of the first stored sample.
    pub fn classify(&self, freqs: &Frequencies) -> &str {
        let Some(query) = self.tokens.vectorize_normalized(freqs) else {
            return &self.samples[0].language;
        };

        let neighbors = self.nearest(&query);
        let mut ballot = Ballot::new(self.weighting);
        for &(similarity, idx) in &neighbors {
            ballot.add(&self.samples[idx].language, similarity);
        }
        ballot.winner().unwrap_or(&self.samples[0].language)
    }

    /// Indices of the `neighbor_count` most similar samples, most similar first.
    ///
    /// On equal similarity the sample stored first ranks higher.
    fn nearest(&self, query: &[f64]) -> Vec<(f64, usize)> {
        let k = self.neighbor_count;
        let mut neighbors: Vec<(f64, usize)> = Vec::with_capacity(k + 1);
        for (idx, sample) in self.samples.iter().enumerate() {
            let similarity = linalg::dot(&sample.vector, query);
            let position = neighbors
                .iter()
                .position(|&(s, _)| s < similarity)
                .unwrap_or(neighbors.len());
            if position >= k {
                continue;
            }
            neighbors.insert(position, (similarity, idx));
            neighbors.truncate(k);
        }
        neighbors
    }

    /// Languages of the stored samples, sorted.
    pub fn languages(&self) -> Vec<String> {
        self.samples
            .iter()
            .map(|s| s.language.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let knn: Self = serde_json::from_slice(data)
            .map_err(|e| CodelangError::decode(format!("knn classifier: {e}")))?;
        knn.validate()?;
        Ok(knn)
    }

    fn validate(&self) -> Result<()> {
        if self.samples.is_empty() {
            return Err(CodelangError::decode("knn classifier has no samples"));
        }
        if self.neighbor_count == 0 {
            return Err(CodelangError::decode("knn neighbor count must be at least 1"));
        }
        if let Some(sample) = self
            .samples
            .iter()
            .find(|s| s.vector.len() != self.tokens.len() || !linalg::is_finite(&s.vector))
        {
            return Err(CodelangError::decode(format!(
                "knn sample for {} has an invalid vector",
                sample.language
            )));
        }
        Ok(())
    }
}

/// Accumulates neighbor votes in the order the neighbors are seen.
pub(crate) struct Ballot<'a> {
    weighting: NeighborWeighting,
    scores: Vec<(&'a str, f64)>,
    exact: Option<&'a str>,
}

impl<'a> Ballot<'a> {
    pub(crate) fn new(weighting: NeighborWeighting) -> Self {
        Self {
            weighting,
            scores: Vec::new(),
            exact: None,
        }
    }

    pub(crate) fn add(&mut self, language: &'a str, similarity: f64) {
        let weight = match self.weighting {
            NeighborWeighting::Similarity => similarity,
            NeighborWeighting::InverseDistance => {
                let distance = 1.0 - similarity;
                if distance <= 0.0 {
                    self.exact.get_or_insert(language);
                    return;
                }
                1.0 / distance
            }
        };
        match self.scores.iter_mut().find(|(l, _)| *l == language) {
            Some((_, score)) => *score += weight,
            None => self.scores.push((language, weight)),
        }
    }

    /// The language with the highest total weight; the first seen wins ties.
    pub(crate) fn winner(&self) -> Option<&'a str> {
        if self.exact.is_some() {
            return self.exact;
        }
        let mut best: Option<(&'a str, f64)> = None;
        for &(language, score) in &self.scores {
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((language, score));
            }
        }
        best.map(|(language, _)| language)
    }
}
