//! L1-normalized token frequencies.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::tokens::counts::TokenCounts;

/// Token frequencies of a single document.
///
/// The frequency of a token is its occurrence count divided by the total number of
/// tokens in the document. Tokens that are not present have frequency 0.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Frequencies(HashMap<String, f64>);

impl Frequencies {
    /// Create an empty frequency map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Normalize token counts by their sum.
    ///
    /// A document without tokens yields an empty map rather than dividing by zero.
    pub fn from_counts(counts: &TokenCounts) -> Self {
        let total: usize = counts.values().sum();
        let normalizer = if total == 0 { 1.0 } else { total as f64 };
        Self(
            counts
                .iter()
                .map(|(token, &count)| (token.clone(), count as f64 / normalizer))
                .collect(),
        )
    }

    /// Frequency of `token`, or 0 if absent.
    #[inline]
    pub fn get(&self, token: &str) -> f64 {
        self.0.get(token).copied().unwrap_or(0.0)
    }

    /// Set the frequency of a token.
    pub fn insert(&mut self, token: impl Into<String>, value: f64) {
        self.0.insert(token.into(), value);
    }

    /// Iterate over present tokens and their frequencies.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(token, &value)| (token.as_str(), value))
    }

    /// Iterate over present tokens.
    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of present tokens.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no token is present.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for Frequencies {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<HashMap<String, f64>> for Frequencies {
    fn from(map: HashMap<String, f64>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_counts() {
        let counts: TokenCounts = [("def".to_string(), 3), ("self".to_string(), 1)]
            .into_iter()
            .collect();
        let freqs = Frequencies::from_counts(&counts);

        assert_eq!(freqs.get("def"), 0.75);
        assert_eq!(freqs.get("self"), 0.25);
        assert_eq!(freqs.get("missing"), 0.0);
        assert_eq!(freqs.len(), 2);
    }

    #[test]
    fn test_from_empty_counts() {
        let freqs = Frequencies::from_counts(&TokenCounts::new());
        assert!(freqs.is_empty());
    }

    #[test]
    fn test_serde_is_a_plain_map() {
        let freqs: Frequencies = [("int", 0.5)].into_iter().collect();
        let json = serde_json::to_string(&freqs).unwrap();
        assert_eq!(json, r#"{"int":0.5}"#);
        let decoded: Frequencies = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, freqs);
    }
}
