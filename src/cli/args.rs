//! Command line argument parsing for the codelang CLI using clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::classifier::Algorithm;

/// codelang - identify the programming language of source files
#[derive(Parser, Debug, Clone)]
#[command(name = "codelang")]
#[command(about = "Train and run programming-language classifiers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct CodelangArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl CodelangArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Train a classifier on a directory of samples
    Train(TrainArgs),

    /// Classify a single source file
    Classify(ClassifyArgs),

    /// Measure a classifier's success rate on a directory of samples
    Rate(RateArgs),

    /// Collapse a linear SVM into a single support vector per language
    #[command(name = "shrink-svm")]
    ShrinkSvm(ShrinkSvmArgs),

    /// List the available algorithms
    Algorithms,
}

/// Arguments for training
#[derive(Parser, Debug, Clone)]
pub struct TrainArgs {
    /// Algorithm to train
    #[arg(value_name = "ALGORITHM")]
    pub algorithm: Algorithm,

    /// Directory with one subdirectory of samples per language
    #[arg(value_name = "SAMPLE_DIR")]
    pub sample_dir: PathBuf,

    /// Where to write the encoded classifier
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,

    /// Drop tokens which appear in this many documents or fewer
    #[arg(short, long, default_value = "0")]
    pub ubiquity: usize,

    /// Training configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Random seed (overrides the configuration file)
    #[arg(short, long)]
    pub seed: Option<u64>,
}

/// Arguments for classifying a file
#[derive(Parser, Debug, Clone)]
pub struct ClassifyArgs {
    /// Algorithm the model was trained with
    #[arg(value_name = "ALGORITHM")]
    pub algorithm: Algorithm,

    /// Encoded classifier
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Source file to classify
    #[arg(value_name = "FILE")]
    pub file: PathBuf,
}

/// Arguments for rating a classifier
#[derive(Parser, Debug, Clone)]
pub struct RateArgs {
    /// Algorithm the model was trained with
    #[arg(value_name = "ALGORITHM")]
    pub algorithm: Algorithm,

    /// Encoded classifier
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// Directory with one subdirectory of samples per language
    #[arg(value_name = "SAMPLE_DIR")]
    pub sample_dir: PathBuf,
}

/// Arguments for shrinking an SVM
#[derive(Parser, Debug, Clone)]
pub struct ShrinkSvmArgs {
    /// Encoded linear SVM
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to write the shrunk SVM
    #[arg(value_name = "OUTPUT")]
    pub output: PathBuf,
}

/// Output formats for CLI
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_train_command() {
        let args = CodelangArgs::try_parse_from([
            "codelang",
            "train",
            "knn",
            "/data/samples",
            "knn.json",
            "--ubiquity",
            "2",
            "--seed",
            "7",
        ])
        .unwrap();

        if let Command::Train(train_args) = args.command {
            assert_eq!(train_args.algorithm, Algorithm::Knn);
            assert_eq!(train_args.sample_dir, PathBuf::from("/data/samples"));
            assert_eq!(train_args.output, PathBuf::from("knn.json"));
            assert_eq!(train_args.ubiquity, 2);
            assert_eq!(train_args.seed, Some(7));
            assert!(train_args.config.is_none());
        } else {
            panic!("Expected Train command");
        }
    }

    #[test]
    fn test_train_defaults() {
        let args =
            CodelangArgs::try_parse_from(["codelang", "train", "svm", "samples", "out"]).unwrap();

        if let Command::Train(train_args) = args.command {
            assert_eq!(train_args.ubiquity, 0);
            assert!(train_args.seed.is_none());
        } else {
            panic!("Expected Train command");
        }
    }

    #[test]
    fn test_unknown_algorithm_rejected() {
        let result =
            CodelangArgs::try_parse_from(["codelang", "classify", "forest", "model", "main.c"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_shrink_svm_command() {
        let args = CodelangArgs::try_parse_from(["codelang", "shrink-svm", "in.json", "out.json"])
            .unwrap();
        assert!(matches!(args.command, Command::ShrinkSvm(_)));
    }

    #[test]
    fn test_verbosity_levels() {
        let args = CodelangArgs::try_parse_from(["codelang", "algorithms"]).unwrap();
        assert_eq!(args.verbosity(), 1);

        let args = CodelangArgs::try_parse_from(["codelang", "-vv", "algorithms"]).unwrap();
        assert_eq!(args.verbosity(), 2);

        let args = CodelangArgs::try_parse_from(["codelang", "-vv", "-q", "algorithms"]).unwrap();
        assert_eq!(args.verbosity(), 0);
    }

    #[test]
    fn test_output_format() {
        let args =
            CodelangArgs::try_parse_from(["codelang", "--format", "json", "--pretty", "algorithms"])
                .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert!(args.pretty);
    }
}
