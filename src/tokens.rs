//! Token extraction and the frequency vector model.
//!
//! Raw source text is turned into [`TokenCounts`] by [`count_tokens`], counts are
//! L1-normalized into [`Frequencies`], and trained models project frequencies onto a
//! fixed [`Vocabulary`] to obtain dense feature vectors. Labeled corpora are read
//! from disk with [`SampleCounts`].

pub mod counts;
pub mod freqs;
pub mod samples;
pub mod vocabulary;

use std::collections::BTreeMap;

pub use counts::{TokenCounts, count_tokens};
pub use freqs::Frequencies;
pub use samples::SampleCounts;
pub use vocabulary::Vocabulary;

/// Training input: language name to the frequency vectors of its samples.
///
/// Languages iterate in sorted order, which every trainer relies on for
/// reproducible tie breaking.
pub type SampleSet = BTreeMap<String, Vec<Frequencies>>;

/// Number of samples across all languages.
pub fn sample_count(samples: &SampleSet) -> usize {
    samples.values().map(Vec::len).sum()
}
