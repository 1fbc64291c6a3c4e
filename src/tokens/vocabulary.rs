//! Ordered feature vocabularies.

use std::collections::BTreeSet;
use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::tokens::SampleSet;
use crate::tokens::freqs::Frequencies;
use crate::util::linalg;

/// An immutable, ordered list of tokens defining feature indices.
///
/// Vocabularies built from samples are sorted lexicographically so that training
/// does not depend on hash map iteration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    tokens: Vec<String>,
    index: HashMap<String, usize>,
}

impl Vocabulary {
    /// Create a vocabulary from tokens in their feature order.
    pub fn new(tokens: Vec<String>) -> Self {
        let index = tokens
            .iter()
            .enumerate()
            .map(|(i, token)| (token.clone(), i))
            .collect();
        Self { tokens, index }
    }

    /// Collect every token present in any sample, sorted.
    pub fn from_samples(samples: &SampleSet) -> Self {
        Self::from_frequencies(samples.values().flatten())
    }

    /// Collect every token present in the given vectors, sorted.
    pub fn from_frequencies<'a>(freqs: impl IntoIterator<Item = &'a Frequencies>) -> Self {
        let tokens: BTreeSet<&str> = freqs.into_iter().flat_map(Frequencies::tokens).collect();
        Self::new(tokens.into_iter().map(str::to_string).collect())
    }

    /// Tokens in feature order.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Feature index of a token.
    pub fn index_of(&self, token: &str) -> Option<usize> {
        self.index.get(token).copied()
    }

    /// Project frequencies onto this vocabulary.
    ///
    /// Tokens outside the vocabulary are ignored; vocabulary tokens missing from
    /// `freqs` take the value 0.
    pub fn vectorize(&self, freqs: &Frequencies) -> Vec<f64> {
        let mut vector = vec![0.0; self.tokens.len()];
        if freqs.len() < self.tokens.len() {
            for (token, value) in freqs.iter() {
                if let Some(idx) = self.index_of(token) {
                    vector[idx] = value;
                }
            }
        } else {
            for (slot, token) in vector.iter_mut().zip(&self.tokens) {
                *slot = freqs.get(token);
            }
        }
        vector
    }

    /// Project frequencies and scale the result to unit Euclidean length.
    ///
    /// Returns `None` when the projected vector is all zeros.
    pub fn vectorize_normalized(&self, freqs: &Frequencies) -> Option<Vec<f64>> {
        let mut vector = self.vectorize(freqs);
        linalg::l2_normalize(&mut vector).then_some(vector)
    }
}

impl Serialize for Vocabulary {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.tokens.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Vocabulary {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<String>::deserialize(deserializer).map(Vocabulary::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn freqs(pairs: &[(&str, f64)]) -> Frequencies {
        pairs.iter().map(|&(k, v)| (k, v)).collect()
    }

    #[test]
    fn test_from_samples_is_sorted() {
        let mut samples = SampleSet::new();
        samples.insert("B".to_string(), vec![freqs(&[("zeta", 1.0), ("alpha", 1.0)])]);
        samples.insert("A".to_string(), vec![freqs(&[("mid", 1.0), ("alpha", 2.0)])]);

        let vocab = Vocabulary::from_samples(&samples);
        assert_eq!(vocab.tokens(), &["alpha", "mid", "zeta"]);
        assert_eq!(vocab.index_of("zeta"), Some(2));
        assert_eq!(vocab.index_of("omega"), None);
    }

    #[test]
    fn test_vectorize_ignores_unknown_tokens() {
        let vocab = Vocabulary::new(vec!["a".into(), "b".into(), "c".into()]);
        let v = vocab.vectorize(&freqs(&[("c", 0.5), ("x", 0.5)]));
        assert_eq!(v, vec![0.0, 0.0, 0.5]);

        let v = vocab.vectorize(&freqs(&[("a", 0.1), ("b", 0.2), ("c", 0.3), ("d", 0.4)]));
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }

    #[test]
    fn test_serializes_as_token_list() {
        let vocab = Vocabulary::new(vec!["b".into(), "a".into()]);
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"["b","a"]"#);
        let decoded: Vocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.index_of("a"), Some(1));
    }

    #[test]
    fn test_vectorize_normalized() {
        let vocab = Vocabulary::new(vec!["a".into(), "b".into()]);
        let v = vocab.vectorize_normalized(&freqs(&[("a", 0.3), ("b", 0.4)])).unwrap();
        assert!((linalg::norm(&v) - 1.0).abs() < 1e-12);

        assert!(vocab.vectorize_normalized(&freqs(&[("z", 1.0)])).is_none());
        assert!(vocab.vectorize_normalized(&Frequencies::new()).is_none());
    }
}
