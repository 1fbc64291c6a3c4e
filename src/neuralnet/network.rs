//! Network evaluation and persistence.

use serde::{Deserialize, Serialize};

use crate::error::{CodelangError, Result};
use crate::tokens::{Frequencies, Vocabulary};
use crate::util::{KahanSum, linalg};

#[inline]
pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// A feed-forward network with one hidden layer.
///
/// Every weight row ends with a bias term which is not multiplied by an input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub(crate) tokens: Vocabulary,
    pub(crate) langs: Vec<String>,
    /// One row per hidden unit, `tokens.len() + 1` weights each.
    pub(crate) hidden_weights: Vec<Vec<f64>>,
    /// One row per language, `hidden_weights.len() + 1` weights each.
    pub(crate) output_weights: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) input_shift: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) input_scale: Option<Vec<f64>>,
}

impl Network {
    pub fn tokens(&self) -> &Vocabulary {
        &self.tokens
    }

    pub fn langs(&self) -> &[String] {
        &self.langs
    }

    pub fn hidden_size(&self) -> usize {
        self.hidden_weights.len()
    }

    /// Project a sample onto the input layer, applying the stored standardization.
    pub fn inputs(&self, freqs: &Frequencies) -> Vec<f64> {
        let mut inputs = self.tokens.vectorize(freqs);
        if let (Some(shift), Some(scale)) = (&self.input_shift, &self.input_scale) {
            for ((x, s), k) in inputs.iter_mut().zip(shift).zip(scale) {
                *x = (*x + s) * k;
            }
        }
        inputs
    }

    /// Hidden activations for prepared inputs.
    pub(crate) fn hidden_outputs(&self, inputs: &[f64], out: &mut [f64]) {
        let n = inputs.len();
        for (h, weights) in out.iter_mut().zip(&self.hidden_weights) {
            let mut sum = KahanSum::with_initial(weights[n]);
            for (x, w) in inputs.iter().zip(weights) {
                sum.add(x * w);
            }
            *h = sigmoid(sum.sum());
        }
    }

    /// Output activations given hidden activations.
    pub(crate) fn outputs(&self, hidden: &[f64], out: &mut [f64]) {
        let n = hidden.len();
        for (o, weights) in out.iter_mut().zip(&self.output_weights) {
            let mut sum = KahanSum::with_initial(weights[n]);
            for (h, w) in hidden.iter().zip(weights) {
                sum.add(h * w);
            }
            *o = sigmoid(sum.sum());
        }
    }

    /// Index of the strongest output for prepared inputs; the first wins ties.
    pub fn predict(&self, inputs: &[f64]) -> usize {
        let mut hidden = vec![0.0; self.hidden_weights.len()];
        let mut outputs = vec![0.0; self.output_weights.len()];
        self.hidden_outputs(inputs, &mut hidden);
        self.outputs(&hidden, &mut outputs);

        let mut best = 0;
        for (i, &o) in outputs.iter().enumerate() {
            if o > outputs[best] {
                best = i;
            }
        }
        best
    }

    pub fn classify(&self, freqs: &Frequencies) -> &str {
        &self.langs[self.predict(&self.inputs(freqs))]
    }

    pub fn languages(&self) -> Vec<String> {
        let mut langs = self.langs.clone();
        langs.sort();
        langs
    }

    /// Whether every weight is finite.
    pub fn is_finite(&self) -> bool {
        self.hidden_weights
            .iter()
            .chain(&self.output_weights)
            .all(|row| linalg::is_finite(row))
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn decode(data: &[u8]) -> Result<Self> {
        let network: Self = serde_json::from_slice(data)
            .map_err(|e| CodelangError::decode(format!("neural network: {e}")))?;
        network.validate()?;
        Ok(network)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.langs.is_empty() {
            return Err(CodelangError::decode("network has no languages"));
        }
        if self.output_weights.len() != self.langs.len() {
            return Err(CodelangError::decode(format!(
                "network has {} outputs for {} languages",
                self.output_weights.len(),
                self.langs.len()
            )));
        }
        let input_width = self.tokens.len() + 1;
        if self.hidden_weights.iter().any(|row| row.len() != input_width) {
            return Err(CodelangError::decode(format!(
                "hidden weight rows must have {input_width} entries"
            )));
        }
        let hidden_width = self.hidden_weights.len() + 1;
        if self.output_weights.iter().any(|row| row.len() != hidden_width) {
            return Err(CodelangError::decode(format!(
                "output weight rows must have {hidden_width} entries"
            )));
        }
        match (&self.input_shift, &self.input_scale) {
            (None, None) => {}
            (Some(shift), Some(scale))
                if shift.len() == self.tokens.len()
                    && scale.len() == self.tokens.len()
                    && linalg::is_finite(shift)
                    && linalg::is_finite(scale) => {}
            _ => {
                return Err(CodelangError::decode(
                    "inputShift and inputScale must both be present with one finite entry per token",
                ));
            }
        }
        if !self.is_finite() {
            return Err(CodelangError::decode("network has non-finite weights"));
        }
        Ok(())
    }
}
