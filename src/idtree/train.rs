//! ID3 induction.

use std::cmp::Ordering;

use log::{debug, log};
use rayon::prelude::*;

use crate::config::TrainingConfig;
use crate::error::{CodelangError, Result};
use crate::idtree::node::{IdTree, TreeNode};
use crate::tokens::{SampleSet, Vocabulary, sample_count};

/// A training sample projected onto the vocabulary.
struct LinearSample {
    language: usize,
    values: Vec<f64>,
}

#[derive(Debug, Clone, Copy)]
struct Split {
    token: usize,
    threshold: f64,
    entropy: f64,
}

impl Split {
    /// Pick the lower entropy split, preferring the lower token index on ties.
    fn better(self, other: Split) -> Split {
        match other
            .entropy
            .total_cmp(&self.entropy)
            .then(other.token.cmp(&self.token))
        {
            Ordering::Less => other,
            _ => self,
        }
    }
}

struct TreeBuilder<'a> {
    vocabulary: &'a Vocabulary,
    languages: Vec<&'a str>,
    language_totals: Vec<usize>,
    samples: Vec<LinearSample>,
}

/// Grow an identification tree on the given samples.
pub fn train(samples: &SampleSet, config: &TrainingConfig) -> Result<IdTree> {
    if sample_count(samples) == 0 {
        return Err(CodelangError::training("no samples to build a tree from"));
    }

    let vocabulary = Vocabulary::from_samples(samples);
    let builder = TreeBuilder::new(&vocabulary, samples);
    log!(
        config.progress_level(),
        "Building identification tree from {} samples over {} tokens",
        builder.samples.len(),
        vocabulary.len()
    );

    let all: Vec<usize> = (0..builder.samples.len()).collect();
    let mut root = builder.build(&all);
    builder.center_thresholds(&mut root, &all);

    let tree = IdTree::new(root);
    debug!("Identification tree has {} branches", tree.branch_count());
    Ok(tree)
}

impl<'a> TreeBuilder<'a> {
    fn new(vocabulary: &'a Vocabulary, samples: &'a SampleSet) -> Self {
        let languages: Vec<&str> = samples.keys().map(String::as_str).collect();
        let language_totals = samples.values().map(Vec::len).collect();
        let samples = samples
            .values()
            .enumerate()
            .flat_map(|(language, freqs)| {
                freqs.iter().map(move |f| LinearSample {
                    language,
                    values: vocabulary.vectorize(f),
                })
            })
            .collect();

        Self {
            vocabulary,
            languages,
            language_totals,
            samples,
        }
    }

    fn build(&self, subset: &[usize]) -> TreeNode {
        let counts = self.language_counts(subset);
        let parent_entropy = entropy(&counts);

        let split = if counts.iter().filter(|&&c| c > 0).count() > 1 {
            self.best_split(subset)
                .filter(|split| split.entropy < parent_entropy)
        } else {
            None
        };

        let Some(split) = split else {
            return self.leaf(&counts);
        };

        let (false_subset, true_subset): (Vec<usize>, Vec<usize>) = subset
            .iter()
            .partition(|&&i| self.samples[i].values[split.token] <= split.threshold);

        TreeNode::branch(
            self.vocabulary.tokens()[split.token].clone(),
            split.threshold,
            self.build(&false_subset),
            self.build(&true_subset),
        )
    }

    fn leaf(&self, counts: &[usize]) -> TreeNode {
        let mut best = 0;
        for (language, &count) in counts.iter().enumerate() {
            if count > counts[best] {
                best = language;
            }
        }
        let total = self.language_totals[best];
        let confidence = (total > 0).then(|| counts[best] as f64 / total as f64);
        TreeNode::leaf(self.languages[best], confidence)
    }

    fn language_counts(&self, subset: &[usize]) -> Vec<usize> {
        let mut counts = vec![0; self.languages.len()];
        for &i in subset {
            counts[self.samples[i].language] += 1;
        }
        counts
    }

    /// Search every token for the split with the lowest weighted entropy.
    ///
    /// Tokens are divided into one contiguous chunk per worker thread. Each chunk
    /// yields its local best, and the reduction keeps the lowest entropy with the
    /// lowest token index on ties, so the result does not depend on scheduling.
    fn best_split(&self, subset: &[usize]) -> Option<Split> {
        let num_tokens = self.vocabulary.len();
        if num_tokens == 0 {
            return None;
        }
        let chunk_size = num_tokens.div_ceil(rayon::current_num_threads()).max(1);
        let tokens: Vec<usize> = (0..num_tokens).collect();

        tokens
            .par_chunks(chunk_size)
            .filter_map(|chunk| {
                chunk
                    .iter()
                    .filter_map(|&token| self.best_threshold(subset, token))
                    .reduce(Split::better)
            })
            .reduce_with(Split::better)
    }

    /// Find the best threshold for a single token, if the token has at least two
    /// distinct values in the subset.
    fn best_threshold(&self, subset: &[usize], token: usize) -> Option<Split> {
        let mut sorted: Vec<(f64, usize)> = subset
            .iter()
            .map(|&i| (self.samples[i].values[token], self.samples[i].language))
            .collect();
        sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

        let n = sorted.len();
        let mut lower = vec![0usize; self.languages.len()];
        let mut upper = vec![0usize; self.languages.len()];
        for &(_, language) in &sorted {
            upper[language] += 1;
        }

        let mut best: Option<Split> = None;
        let mut last_value = sorted.first()?.0;
        for i in 1..n {
            let moved = sorted[i - 1].1;
            upper[moved] -= 1;
            lower[moved] += 1;

            let value = sorted[i].0;
            if value == last_value {
                continue;
            }

            let lower_frac = i as f64 / n as f64;
            let upper_frac = (n - i) as f64 / n as f64;
            let disorder = lower_frac * entropy(&lower) + upper_frac * entropy(&upper);
            if best.is_none_or(|b| disorder < b.entropy) {
                best = Some(Split {
                    token,
                    threshold: (last_value + value) / 2.0,
                    entropy: disorder,
                });
            }
            last_value = value;
        }
        best
    }

    /// Move every threshold to the midpoint between the largest value routed to the
    /// false branch and the smallest value routed to the true branch.
    fn center_thresholds(&self, node: &mut TreeNode, subset: &[usize]) {
        let TreeNode::Branch {
            token,
            threshold,
            false_branch,
            true_branch,
        } = node
        else {
            return;
        };
        let Some(idx) = self.vocabulary.index_of(token) else {
            return;
        };

        let mut lower: Option<f64> = None;
        let mut upper: Option<f64> = None;
        for &i in subset {
            let value = self.samples[i].values[idx];
            if value <= *threshold {
                lower = Some(lower.map_or(value, |l| l.max(value)));
            } else {
                upper = Some(upper.map_or(value, |u| u.min(value)));
            }
        }
        if let (Some(lower), Some(upper)) = (lower, upper) {
            *threshold = (lower + upper) / 2.0;
        }

        let (false_subset, true_subset): (Vec<usize>, Vec<usize>) = subset
            .iter()
            .partition(|&&i| self.samples[i].values[idx] <= *threshold);
        self.center_thresholds(false_branch, &false_subset);
        self.center_thresholds(true_branch, &true_subset);
    }
}

/// Shannon entropy (natural log) of a language distribution.
fn entropy(counts: &[usize]) -> f64 {
    let total: usize = counts.iter().sum();
    if total == 0 {
        return 0.0;
    }
    counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| {
            let p = c as f64 / total as f64;
            -p * p.ln()
        })
        .sum()
}
