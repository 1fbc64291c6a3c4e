//! Step-size search with early stopping.

use log::{debug, log, warn};
use rand::prelude::*;

use crate::config::{NeuralNetConfig, TrainingConfig};
use crate::error::{CodelangError, Result};
use crate::neuralnet::data_set::DataSet;
use crate::neuralnet::gradients::GradientCalc;
use crate::neuralnet::network::Network;
use crate::tokens::{SampleSet, sample_count};

/// Scores of a finished run.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Scores {
    cross: f64,
    training: f64,
}

impl Scores {
    fn of(data: &DataSet, network: &Network) -> Self {
        Self {
            cross: data.cross_score(network),
            training: data.training_score(network),
        }
    }

    /// Higher held-out accuracy, or equal held-out and higher training accuracy.
    fn beats(&self, other: &Scores) -> bool {
        self.cross > other.cross || (self.cross == other.cross && self.training > other.training)
    }
}

/// Train a network for every configured step size and keep the best one.
///
/// Runs that produce a non-finite weight are discarded. Fails if every run
/// diverges.
pub fn train(samples: &SampleSet, config: &TrainingConfig) -> Result<Network> {
    config.neuralnet.validate()?;
    if sample_count(samples) == 0 {
        return Err(CodelangError::training("no samples for neural network"));
    }

    let data = DataSet::new(samples, config);
    let hidden = config.neuralnet.hidden_units(data.langs().len());
    debug!(
        "Network shape: {} inputs, {} hidden, {} outputs; {} training / {} held-out samples",
        data.vocabulary().len(),
        hidden,
        data.langs().len(),
        data.training_len(),
        data.validation_len()
    );

    let mut best: Option<(Network, Scores)> = None;
    for &step_size in &config.neuralnet.step_sizes {
        let mut trainer = Trainer::new(&data, hidden, step_size, config.seed, &config.neuralnet);
        let Some(network) = trainer.run() else {
            log!(config.progress_level(), "Step size {step_size:e}: diverged");
            continue;
        };

        let scores = Scores::of(&data, &network);
        log!(
            config.progress_level(),
            "Step size {step_size:e}: cross={:.4} training={:.4} epochs={}",
            scores.cross,
            scores.training,
            trainer.epochs
        );
        if best.as_ref().is_none_or(|(_, b)| scores.beats(b)) {
            best = Some((network, scores));
        }
    }

    match best {
        Some((network, _)) => Ok(network),
        None => {
            warn!("Every step size diverged");
            Err(CodelangError::training("neural network diverged for every step size"))
        }
    }
}

/// Gradient descent for one step size.
struct Trainer<'a> {
    data: &'a DataSet,
    config: &'a NeuralNetConfig,
    network: Network,
    calc: GradientCalc,
    step_size: f64,
    epochs: usize,
}

impl<'a> Trainer<'a> {
    fn new(
        data: &'a DataSet,
        hidden: usize,
        step_size: f64,
        seed: u64,
        config: &'a NeuralNetConfig,
    ) -> Self {
        let network = initial_network(data, hidden, seed);
        let calc = GradientCalc::new(&network);
        Self {
            data,
            config,
            network,
            calc,
            step_size,
            epochs: 0,
        }
    }

    /// Train with early stopping; `None` if a weight became non-finite.
    ///
    /// After the initial epochs, training continues in doubling increments while
    /// held-out accuracy keeps improving. On stagnation the network is reverted to
    /// the last improving snapshot.
    fn run(&mut self) -> Option<Network> {
        let max = self.config.max_iterations;
        let mut done = self.config.initial_iterations.min(max);
        self.epochs_or_diverge(done)?;
        if done >= max {
            return Some(self.network.clone());
        }

        let mut snapshot = self.network.clone();
        let mut scores = Scores::of(self.data, &self.network);
        while done < max {
            let increment = done.max(1).min(max - done);
            self.epochs_or_diverge(increment)?;
            done += increment;

            let new_scores = Scores::of(self.data, &self.network);
            if !new_scores.beats(&scores) {
                return Some(snapshot);
            }
            scores = new_scores;
            snapshot = self.network.clone();
        }
        Some(snapshot)
    }

    fn epochs_or_diverge(&mut self, count: usize) -> Option<()> {
        for _ in 0..count {
            if !self.epoch() || diverged(&self.network) {
                return None;
            }
        }
        Some(())
    }

    /// One pass over the training samples, language by language.
    ///
    /// Returns `false` as soon as a gradient is non-finite.
    fn epoch(&mut self) -> bool {
        self.epochs += 1;
        let data = self.data;
        for sample in &data.training {
            self.calc.compute(&self.network, &sample.input, sample.language);
            if !self.calc.is_finite() {
                return false;
            }
            if self.config.normalize_gradients && !self.calc.normalize() {
                continue;
            }
            self.calc.descend(&mut self.network, self.step_size);
        }
        true
    }
}

/// Weights beyond this magnitude overflow once multiplied together, so a run
/// that reaches them has diverged even while every weight is still finite.
const DIVERGENCE_BOUND: f64 = 1e150;

fn diverged(network: &Network) -> bool {
    !network.is_finite()
        || network
            .hidden_weights
            .iter()
            .chain(&network.output_weights)
            .flatten()
            .any(|w| w.abs() > DIVERGENCE_BOUND)
}

/// Random weights uniform in `±1/sqrt(fan_in)`, where the fan-in counts the bias.
fn initial_network(data: &DataSet, hidden: usize, seed: u64) -> Network {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut random_rows = |rows: usize, width: usize| -> Vec<Vec<f64>> {
        let bound = 1.0 / (width as f64).sqrt();
        (0..rows)
            .map(|_| (0..width).map(|_| rng.random_range(-bound..bound)).collect())
            .collect()
    };

    let hidden_weights = random_rows(hidden, data.vocabulary().len() + 1);
    let output_weights = random_rows(data.langs().len(), hidden + 1);
    Network {
        tokens: data.vocabulary().clone(),
        langs: data.langs().to_vec(),
        hidden_weights,
        output_weights,
        input_shift: data.input_shift.clone(),
        input_scale: data.input_scale.clone(),
    }
}
