//! Activation functions and per-neuron dynamics.

use serde::{Deserialize, Serialize};

/// Stateless nonlinearity applied to a neuron's pre-activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activation {
    Linear,
    Tanh,
    Sigmoid,
    Relu,
    LeakyRelu,
    Elu,
    Softplus,
    Gaussian,
    Sin,
    Step,
}

impl Activation {
    pub const ALL: [Activation; 10] = [
        Activation::Linear,
        Activation::Tanh,
        Activation::Sigmoid,
        Activation::Relu,
        Activation::LeakyRelu,
        Activation::Elu,
        Activation::Softplus,
        Activation::Gaussian,
        Activation::Sin,
        Activation::Step,
    ];

    #[inline]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Activation::Linear => x,
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Relu => x.max(0.0),
            Activation::LeakyRelu => {
                if x >= 0.0 {
                    x
                } else {
                    0.01 * x
                }
            }
            Activation::Elu => {
                if x >= 0.0 {
                    x
                } else {
                    x.exp() - 1.0
                }
            }
            // ln(1 + e^x), written to stay finite for large x
            Activation::Softplus => x.max(0.0) + (-x.abs()).exp().ln_1p(),
            Activation::Gaussian => (-x * x).exp(),
            Activation::Sin => x.sin(),
            Activation::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

impl Default for Activation {
    fn default() -> Self {
        Activation::Tanh
    }
}

/// How a neuron turns its activation into an output over time.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeuronDynamics {
    /// Output is the activation of the current pre-activation.
    Standard,
    /// Exponential smoothing: `y_t = (1 - alpha) * y_{t-1} + alpha * f(x_t)`.
    Leaky { alpha: f32 },
}

impl Default for NeuronDynamics {
    fn default() -> Self {
        NeuronDynamics::Standard
    }
}

impl NeuronDynamics {
    pub fn is_stateful(&self) -> bool {
        !matches!(self, NeuronDynamics::Standard)
    }

    /// Compute the neuron output for this step and update its state.
    #[inline]
    pub fn step(&self, activated: f32, state: &mut NeuronState) -> f32 {
        let out = match *self {
            NeuronDynamics::Standard => activated,
            NeuronDynamics::Leaky { alpha } => (1.0 - alpha) * state.last_output + alpha * activated,
        };
        state.last_output = out;
        out
    }
}

/// Per-episode neuron state.
///
/// Cloning yields a cleared state: a copied network never inherits the
/// temporal history of the network it was copied from.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct NeuronState {
    #[serde(skip)]
    pub last_output: f32,
}

impl Clone for NeuronState {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl NeuronState {
    pub fn reset(&mut self) {
        self.last_output = 0.0;
    }
}
