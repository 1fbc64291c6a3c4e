//! Command implementations for the codelang CLI.

use std::fs;
use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::classifier::{Algorithm, Classifier};
use crate::cli::args::*;
use crate::cli::output::*;
use crate::config::TrainingConfig;
use crate::error::Result;
use crate::rater;
use crate::svm::Svm;
use crate::tokens::{Frequencies, SampleCounts, count_tokens};

/// Execute a CLI command.
pub fn execute_command(args: CodelangArgs) -> Result<()> {
    match &args.command {
        Command::Train(train_args) => train(train_args, &args),
        Command::Classify(classify_args) => classify(classify_args, &args),
        Command::Rate(rate_args) => rate(rate_args, &args),
        Command::ShrinkSvm(shrink_args) => shrink_svm(shrink_args, &args),
        Command::Algorithms => list_algorithms(&args),
    }
}

/// Train a classifier and write it to disk.
fn train(args: &TrainArgs, cli_args: &CodelangArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => {
            debug!("Loading training configuration from {}", path.display());
            TrainingConfig::from_file(path)?
        }
        None => TrainingConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.verbose |= cli_args.verbosity() > 1;

    info!("Reading samples from {}", args.sample_dir.display());
    let mut counts = SampleCounts::read_dir(&args.sample_dir)?;
    let tokens_before_pruning = counts.num_tokens();
    counts.prune(args.ubiquity);
    let tokens = counts.num_tokens();
    let samples = counts.to_sample_set();

    let start_time = Instant::now();
    let classifier = args.algorithm.train(&samples, &config)?;
    let duration = start_time.elapsed();

    fs::write(&args.output, classifier.encode()?)?;

    output_result(
        &TrainingResult {
            algorithm: args.algorithm.to_string(),
            output: args.output.to_string_lossy().to_string(),
            languages: samples.len(),
            samples: counts.num_samples(),
            tokens_before_pruning,
            tokens,
            duration_ms: duration.as_millis() as u64,
        },
        cli_args,
    )
}

/// Classify a single file.
fn classify(args: &ClassifyArgs, cli_args: &CodelangArgs) -> Result<()> {
    let classifier = load_classifier(args.algorithm, &args.model)?;

    let contents = fs::read(&args.file)?;
    let freqs = Frequencies::from_counts(&count_tokens(&String::from_utf8_lossy(&contents)));
    let (language, confidence) = classifier.classify_with_confidence(&freqs);

    output_result(
        &ClassificationResult {
            file: args.file.to_string_lossy().to_string(),
            language: language.to_string(),
            confidence,
        },
        cli_args,
    )
}

/// Rate a classifier against a sample directory.
fn rate(args: &RateArgs, cli_args: &CodelangArgs) -> Result<()> {
    let classifier = load_classifier(args.algorithm, &args.model)?;

    info!("Reading samples from {}", args.sample_dir.display());
    let samples = SampleCounts::read_dir(&args.sample_dir)?.to_sample_set();

    output_result(&rater::rate(&classifier, &samples), cli_args)
}

/// Collapse a linear SVM into one support vector per language.
fn shrink_svm(args: &ShrinkSvmArgs, cli_args: &CodelangArgs) -> Result<()> {
    let svm = Svm::decode(&fs::read(&args.input)?)?;
    let shrunk = svm.shrink()?;

    fs::write(&args.output, shrunk.encode()?)?;

    output_result(
        &ShrinkResult {
            output: args.output.to_string_lossy().to_string(),
            vectors_before: svm.sample_vectors().len(),
            vectors_after: shrunk.sample_vectors().len(),
        },
        cli_args,
    )
}

/// List the registered algorithms.
fn list_algorithms(cli_args: &CodelangArgs) -> Result<()> {
    let algorithms: Vec<AlgorithmInfo> = Algorithm::ALL
        .into_iter()
        .map(|algorithm| AlgorithmInfo {
            name: algorithm.name(),
            description: algorithm.description(),
        })
        .collect();

    output_result(&algorithms, cli_args)
}

fn load_classifier(algorithm: Algorithm, path: &Path) -> Result<Classifier> {
    debug!("Loading {algorithm} classifier from {}", path.display());
    algorithm.decode(&fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use std::ffi::OsStr;

    use super::*;
    use clap::Parser;
    use tempfile::TempDir;

    fn write_corpus(dir: &Path) {
        let files = [
            ("C", "a.c", "int main(void) { return 0; }"),
            ("C", "b.c", "int x; void f(void) { x = 1; }"),
            ("Python", "a.py", "def f(self):\n    return self"),
            ("Python", "b.py", "def g(self, x):\n    return x"),
        ];
        for (language, name, contents) in files {
            let language_dir = dir.join(language);
            fs::create_dir_all(&language_dir).unwrap();
            fs::write(language_dir.join(name), contents).unwrap();
        }
    }

    #[test]
    fn test_train_then_classify() {
        let dir = TempDir::new().unwrap();
        let corpus = dir.path().join("samples");
        write_corpus(&corpus);
        let model = dir.path().join("idtree.json");
        let source = dir.path().join("query.py");
        fs::write(&source, "def h(self):\n    pass").unwrap();

        let args = CodelangArgs::try_parse_from([
            OsStr::new("codelang"),
            OsStr::new("-q"),
            OsStr::new("train"),
            OsStr::new("idtree"),
            corpus.as_os_str(),
            model.as_os_str(),
        ])
        .unwrap();
        execute_command(args).unwrap();
        assert!(model.exists());

        let classifier = load_classifier(Algorithm::IdTree, &model).unwrap();
        let contents = fs::read_to_string(&source).unwrap();
        let freqs = Frequencies::from_counts(&count_tokens(&contents));
        assert_eq!(classifier.classify(&freqs), "Python");

        let args = CodelangArgs::try_parse_from([
            OsStr::new("codelang"),
            OsStr::new("-q"),
            OsStr::new("rate"),
            OsStr::new("idtree"),
            model.as_os_str(),
            corpus.as_os_str(),
        ])
        .unwrap();
        execute_command(args).unwrap();
    }

    #[test]
    fn test_shrink_rejects_non_svm() {
        let dir = TempDir::new().unwrap();
        let input = dir.path().join("bogus.json");
        let output = dir.path().join("out.json");
        fs::write(&input, "{\"root\": {\"leaf\": true}}").unwrap();

        let args = CodelangArgs::try_parse_from([
            OsStr::new("codelang"),
            OsStr::new("shrink-svm"),
            input.as_os_str(),
            output.as_os_str(),
        ])
        .unwrap();
        assert!(execute_command(args).is_err());
    }

    #[test]
    fn test_missing_model() {
        let dir = TempDir::new().unwrap();
        assert!(load_classifier(Algorithm::Knn, &dir.path().join("absent.json")).is_err());
    }
}
