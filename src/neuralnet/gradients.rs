//! Backpropagation for the squared error `1/2 ||output - target||^2`.

use crate::neuralnet::network::Network;
use crate::util::{KahanSum, linalg};

/// Scratch space for computing gradients of one network shape.
///
/// Allocating it once and reusing it for every sample avoids per-sample
/// allocations during training.
pub(crate) struct GradientCalc {
    hidden_outputs: Vec<f64>,
    outputs: Vec<f64>,
    output_deltas: Vec<f64>,
    pub hidden_partials: Vec<Vec<f64>>,
    pub output_partials: Vec<Vec<f64>>,
}

impl GradientCalc {
    pub fn new(network: &Network) -> Self {
        let hidden = network.hidden_weights.len();
        let outputs = network.output_weights.len();
        let inputs = network.tokens.len();
        Self {
            hidden_outputs: vec![0.0; hidden],
            outputs: vec![0.0; outputs],
            output_deltas: vec![0.0; outputs],
            hidden_partials: vec![vec![0.0; inputs + 1]; hidden],
            output_partials: vec![vec![0.0; hidden + 1]; outputs],
        }
    }

    /// Compute the gradient for one sample with a one-hot target at `language`.
    pub fn compute(&mut self, network: &Network, inputs: &[f64], language: usize) {
        network.hidden_outputs(inputs, &mut self.hidden_outputs);
        network.outputs(&self.hidden_outputs, &mut self.outputs);

        let hidden_count = self.hidden_outputs.len();
        for (k, &o) in self.outputs.iter().enumerate() {
            let target = if k == language { 1.0 } else { 0.0 };
            let delta = (o - target) * o * (1.0 - o);
            self.output_deltas[k] = delta;

            let partials = &mut self.output_partials[k];
            for (p, &h) in partials.iter_mut().zip(&self.hidden_outputs) {
                *p = h * delta;
            }
            partials[hidden_count] = delta;
        }

        let input_count = inputs.len();
        for (j, &h) in self.hidden_outputs.iter().enumerate() {
            let back: KahanSum = network
                .output_weights
                .iter()
                .zip(&self.output_deltas)
                .map(|(weights, &delta)| weights[j] * delta)
                .collect();
            let delta = h * (1.0 - h) * back.sum();

            let partials = &mut self.hidden_partials[j];
            for (p, &x) in partials.iter_mut().zip(inputs) {
                *p = x * delta;
            }
            partials[input_count] = delta;
        }
    }

    /// Whether every partial derivative is finite.
    pub fn is_finite(&self) -> bool {
        self.hidden_partials
            .iter()
            .chain(&self.output_partials)
            .all(|row| linalg::is_finite(row))
    }

    /// Scale the gradient to unit Euclidean norm.
    ///
    /// Returns `false` (leaving the gradient untouched) if the norm is zero. The
    /// gradient must be finite.
    pub fn normalize(&mut self) -> bool {
        let squares: KahanSum = self
            .hidden_partials
            .iter()
            .chain(&self.output_partials)
            .flatten()
            .map(|x| x * x)
            .collect();
        let norm = squares.sum().sqrt();
        if norm == 0.0 {
            return false;
        }
        for x in self
            .hidden_partials
            .iter_mut()
            .chain(self.output_partials.iter_mut())
            .flatten()
        {
            *x /= norm;
        }
        true
    }

    /// Apply `weights -= step * gradient`.
    pub fn descend(&self, network: &mut Network, step: f64) {
        for (row, partials) in network.hidden_weights.iter_mut().zip(&self.hidden_partials) {
            for (w, p) in row.iter_mut().zip(partials) {
                *w -= step * p;
            }
        }
        for (row, partials) in network.output_weights.iter_mut().zip(&self.output_partials) {
            for (w, p) in row.iter_mut().zip(partials) {
                *w -= step * p;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::Vocabulary;

    fn network() -> Network {
        Network {
            tokens: Vocabulary::new(vec!["a".into(), "b".into()]),
            langs: vec!["A".into(), "B".into()],
            hidden_weights: vec![vec![0.3, -0.2, 0.1], vec![-0.4, 0.5, 0.0]],
            output_weights: vec![vec![0.2, -0.1, 0.05], vec![-0.3, 0.4, -0.05]],
            input_shift: None,
            input_scale: None,
        }
    }

    fn error(network: &Network, inputs: &[f64], language: usize) -> f64 {
        let mut hidden = vec![0.0; network.hidden_weights.len()];
        let mut outputs = vec![0.0; network.output_weights.len()];
        network.hidden_outputs(inputs, &mut hidden);
        network.outputs(&hidden, &mut outputs);
        outputs
            .iter()
            .enumerate()
            .map(|(k, o)| {
                let t = if k == language { 1.0 } else { 0.0 };
                0.5 * (o - t) * (o - t)
            })
            .sum()
    }

    #[test]
    fn test_matches_finite_differences() {
        let base = network();
        let inputs = [0.7, -1.2];
        let mut calc = GradientCalc::new(&base);
        calc.compute(&base, &inputs, 1);

        let eps = 1e-6;
        for j in 0..base.hidden_weights.len() {
            for i in 0..base.hidden_weights[j].len() {
                let mut plus = base.clone();
                plus.hidden_weights[j][i] += eps;
                let mut minus = base.clone();
                minus.hidden_weights[j][i] -= eps;
                let numeric = (error(&plus, &inputs, 1) - error(&minus, &inputs, 1)) / (2.0 * eps);
                assert!((numeric - calc.hidden_partials[j][i]).abs() < 1e-8);
            }
        }
        for k in 0..base.output_weights.len() {
            for j in 0..base.output_weights[k].len() {
                let mut plus = base.clone();
                plus.output_weights[k][j] += eps;
                let mut minus = base.clone();
                minus.output_weights[k][j] -= eps;
                let numeric = (error(&plus, &inputs, 1) - error(&minus, &inputs, 1)) / (2.0 * eps);
                assert!((numeric - calc.output_partials[k][j]).abs() < 1e-8);
            }
        }
    }

    #[test]
    fn test_normalize_and_descend() {
        let mut net = network();
        let inputs = [0.7, -1.2];
        let before = error(&net, &inputs, 0);

        let mut calc = GradientCalc::new(&net);
        calc.compute(&net, &inputs, 0);
        assert!(calc.normalize());
        let norm: f64 = calc
            .hidden_partials
            .iter()
            .chain(&calc.output_partials)
            .flatten()
            .map(|x| x * x)
            .sum::<f64>()
            .sqrt();
        assert!((norm - 1.0).abs() < 1e-12);

        calc.descend(&mut net, 0.01);
        assert!(error(&net, &inputs, 0) < before);
    }

    #[test]
    fn test_nan_weight_gives_non_finite_gradient() {
        let mut net = network();
        net.output_weights[0][1] = f64::NAN;
        let mut calc = GradientCalc::new(&net);
        calc.compute(&net, &[0.7, -1.2], 0);
        assert!(!calc.is_finite());

        let net = network();
        calc.compute(&net, &[0.7, -1.2], 0);
        assert!(calc.is_finite());
    }

    #[test]
    fn test_zero_gradient_is_not_normalized() {
        let net = network();
        let mut calc = GradientCalc::new(&net);
        assert!(!calc.normalize());
    }
}
