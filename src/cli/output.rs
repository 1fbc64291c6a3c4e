//! Output formatting for CLI commands.

use serde::Serialize;

use crate::cli::args::{CodelangArgs, OutputFormat};
use crate::error::Result;
use crate::rater::OverallRating;

/// Human-readable rendering of a command result.
pub trait HumanOutput {
    fn print_human(&self, args: &CodelangArgs);
}

/// Result structure for training.
#[derive(Debug, Serialize)]
pub struct TrainingResult {
    pub algorithm: String,
    pub output: String,
    pub languages: usize,
    pub samples: usize,
    pub tokens_before_pruning: usize,
    pub tokens: usize,
    pub duration_ms: u64,
}

impl HumanOutput for TrainingResult {
    fn print_human(&self, args: &CodelangArgs) {
        println!(
            "Pruned {}/{} tokens.",
            self.tokens_before_pruning - self.tokens,
            self.tokens_before_pruning
        );
        if args.verbosity() > 1 {
            println!(
                "Trained {} on {} samples in {} languages ({}ms)",
                self.algorithm, self.samples, self.languages, self.duration_ms
            );
        }
        println!("Wrote {}", self.output);
    }
}

/// Result structure for classifying a file.
#[derive(Debug, Serialize)]
pub struct ClassificationResult {
    pub file: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl HumanOutput for ClassificationResult {
    fn print_human(&self, _args: &CodelangArgs) {
        match self.confidence {
            Some(confidence) => println!(
                "Classification: {} (confidence {:.2})",
                self.language, confidence
            ),
            None => println!("Classification: {}", self.language),
        }
    }
}

impl HumanOutput for OverallRating {
    fn print_human(&self, args: &CodelangArgs) {
        println!(
            "Success rate: {}/{} or {:.2}%",
            self.correct,
            self.total,
            100.0 * self.fraction()
        );
        if args.verbosity() == 0 {
            return;
        }
        for rating in &self.languages {
            println!(
                "{} - success rate {}/{} or {:.2}%",
                rating.language,
                rating.correct,
                rating.total,
                100.0 * rating.fraction()
            );
        }
    }
}

/// Result structure for shrinking an SVM.
#[derive(Debug, Serialize)]
pub struct ShrinkResult {
    pub output: String,
    pub vectors_before: usize,
    pub vectors_after: usize,
}

impl HumanOutput for ShrinkResult {
    fn print_human(&self, _args: &CodelangArgs) {
        println!(
            "Shrunk {} support vectors to {}",
            self.vectors_before, self.vectors_after
        );
        println!("Wrote {}", self.output);
    }
}

/// One entry of the algorithm listing.
#[derive(Debug, Serialize)]
pub struct AlgorithmInfo {
    pub name: &'static str,
    pub description: &'static str,
}

impl HumanOutput for Vec<AlgorithmInfo> {
    fn print_human(&self, _args: &CodelangArgs) {
        let width = self.iter().map(|info| info.name.len()).max().unwrap_or(0);
        for info in self {
            println!("{:width$}  {}", info.name, info.description);
        }
    }
}

/// Output a result in the specified format.
pub fn output_result<T: Serialize + HumanOutput>(result: &T, args: &CodelangArgs) -> Result<()> {
    match args.output_format {
        OutputFormat::Human => {
            result.print_human(args);
            Ok(())
        }
        OutputFormat::Json => output_json(result, args),
    }
}

/// Output in JSON format.
fn output_json<T: Serialize>(result: &T, args: &CodelangArgs) -> Result<()> {
    let json = if args.pretty {
        serde_json::to_string_pretty(result)?
    } else {
        serde_json::to_string(result)?
    };

    println!("{json}");
    Ok(())
}
