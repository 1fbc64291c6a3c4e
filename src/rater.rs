//! Success-rate evaluation of trained classifiers against labeled samples.

use std::cmp::Ordering;

use rayon::prelude::*;
use serde::Serialize;

use crate::classifier::Classifier;
use crate::tokens::SampleSet;

/// Success counts for a single language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageRating {
    pub language: String,
    pub correct: usize,
    pub total: usize,
}

impl LanguageRating {
    pub fn fraction(&self) -> f64 {
        fraction(self.correct, self.total)
    }
}

/// Success counts across all languages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverallRating {
    pub correct: usize,
    pub total: usize,
    /// Per-language ratings, best first.
    pub languages: Vec<LanguageRating>,
}

impl OverallRating {
    pub fn fraction(&self) -> f64 {
        fraction(self.correct, self.total)
    }
}

fn fraction(correct: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        correct as f64 / total as f64
    }
}

/// Classify every sample in parallel and tally the results.
pub fn rate(classifier: &Classifier, samples: &SampleSet) -> OverallRating {
    let mut languages: Vec<LanguageRating> = samples
        .par_iter()
        .map(|(language, docs)| {
            let correct = docs
                .par_iter()
                .filter(|freqs| classifier.classify(freqs) == language)
                .count();
            LanguageRating {
                language: language.clone(),
                correct,
                total: docs.len(),
            }
        })
        .collect();

    languages.sort_by(|a, b| {
        b.fraction()
            .partial_cmp(&a.fraction())
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.language.cmp(&b.language))
    });

    OverallRating {
        correct: languages.iter().map(|r| r.correct).sum(),
        total: languages.iter().map(|r| r.total).sum(),
        languages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::idtree::{IdTree, TreeNode};
    use crate::tokens::Frequencies;

    fn freqs(pairs: &[(&str, f64)]) -> Frequencies {
        pairs.iter().map(|&(t, v)| (t, v)).collect()
    }

    fn stump() -> Classifier {
        Classifier::IdTree(IdTree::new(TreeNode::branch(
            "def",
            0.25,
            TreeNode::leaf("C", None),
            TreeNode::leaf("Python", None),
        )))
    }

    #[test]
    fn test_rate_counts() {
        let mut samples = SampleSet::new();
        samples.insert(
            "Python".into(),
            vec![freqs(&[("def", 0.5)]), freqs(&[("def", 0.1)])],
        );
        samples.insert("C".into(), vec![freqs(&[("int", 1.0)])]);
        samples.insert("Go".into(), vec![freqs(&[("func", 1.0)])]);

        let rating = rate(&stump(), &samples);
        assert_eq!(rating.correct, 2);
        assert_eq!(rating.total, 4);
        assert_eq!(rating.fraction(), 0.5);

        let order: Vec<&str> = rating.languages.iter().map(|r| r.language.as_str()).collect();
        assert_eq!(order, vec!["C", "Python", "Go"]);
        assert_eq!(rating.languages[1].correct, 1);
        assert_eq!(rating.languages[1].total, 2);
    }

    #[test]
    fn test_empty_rating() {
        let rating = rate(&stump(), &SampleSet::new());
        assert_eq!(rating.total, 0);
        assert_eq!(rating.fraction(), 0.0);
        assert!(rating.languages.is_empty());

        let mut samples = SampleSet::new();
        samples.insert("C".into(), Vec::new());
        let rating = rate(&stump(), &samples);
        assert_eq!(rating.languages[0].fraction(), 0.0);
    }
}
