//! Labeled sample corpora on disk.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use rayon::prelude::*;

use crate::error::Result;
use crate::tokens::SampleSet;
use crate::tokens::counts::{TokenCounts, count_tokens};
use crate::tokens::freqs::Frequencies;

/// Token counts of every sample document, grouped by language.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleCounts {
    languages: BTreeMap<String, Vec<TokenCounts>>,
}

impl SampleCounts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a corpus directory.
    ///
    /// Each non-hidden subdirectory of `dir` names a language and each non-hidden
    /// regular file inside it is one sample. Files are decoded as UTF-8 (invalid
    /// sequences are replaced) and tokenized in parallel.
    pub fn read_dir<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let mut jobs: Vec<(String, PathBuf)> = Vec::new();
        for language in list_entries(dir, true)? {
            let lang_dir = dir.join(&language);
            for file in list_entries(&lang_dir, false)? {
                jobs.push((language.clone(), lang_dir.join(file)));
            }
        }
        debug!("Tokenizing {} sample files from {}", jobs.len(), dir.display());

        let counted: Vec<(String, TokenCounts)> = jobs
            .into_par_iter()
            .map(|(language, path)| -> Result<(String, TokenCounts)> {
                let bytes = fs::read(&path)?;
                Ok((language, count_tokens(&String::from_utf8_lossy(&bytes))))
            })
            .collect::<Result<_>>()?;

        let mut samples = Self::new();
        for (language, counts) in counted {
            samples.add(language, counts);
        }
        Ok(samples)
    }

    /// Append one sample document to a language.
    pub fn add(&mut self, language: impl Into<String>, counts: TokenCounts) {
        self.languages.entry(language.into()).or_default().push(counts);
    }

    /// Samples of one language.
    pub fn get(&self, language: &str) -> Option<&[TokenCounts]> {
        self.languages.get(language).map(Vec::as_slice)
    }

    /// Language names in sorted order.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Total number of sample documents.
    pub fn num_samples(&self) -> usize {
        self.languages.values().map(Vec::len).sum()
    }

    /// Number of distinct tokens across all documents.
    pub fn num_tokens(&self) -> usize {
        self.languages
            .values()
            .flatten()
            .flat_map(|counts| counts.keys())
            .collect::<HashSet<_>>()
            .len()
    }

    /// Remove tokens which appear in `n` or fewer documents.
    pub fn prune(&mut self, n: usize) {
        let mut doc_counts: HashMap<String, usize> = HashMap::new();
        for counts in self.languages.values().flatten() {
            for token in counts.keys() {
                *doc_counts.entry(token.clone()).or_insert(0) += 1;
            }
        }

        for counts in self.languages.values_mut().flatten() {
            counts.retain(|token, _| doc_counts.get(token).is_some_and(|&c| c > n));
        }
    }

    /// Convert every document to L1-normalized frequencies.
    pub fn to_sample_set(&self) -> SampleSet {
        self.languages
            .iter()
            .map(|(language, docs)| {
                (
                    language.clone(),
                    docs.iter().map(Frequencies::from_counts).collect(),
                )
            })
            .collect()
    }
}

fn list_entries(dir: &Path, want_dirs: bool) -> Result<Vec<String>> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type()?;
        let matches = if want_dirs {
            file_type.is_dir()
        } else {
            file_type.is_file()
        };
        if matches {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}
