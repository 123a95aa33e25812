//! Parameter mutations: weights, biases, activations and delays.

use super::activation::Activation;
use super::initializer::gaussian;
use super::network::{ConnectionId, Network, NeuronId, NeuronRole};
use super::structural::StructuralOutcome;
use crate::config::{DelayMutationMode, NetworkConfig};
use rand::seq::SliceRandom;
use rand::Rng;

/// What a parameter mutation event changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ParameterOutcome {
    pub weights_mutated: usize,
    pub biases_mutated: usize,
    /// Neuron, old activation, new activation
    pub activation_changed: Option<(NeuronId, Activation, Activation)>,
    /// Connection, old delay, new delay
    pub delay_changed: Option<(ConnectionId, u32, u32)>,
}

/// Result of one full mutation event.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MutationOutcome {
    pub parameters: ParameterOutcome,
    pub structure: StructuralOutcome,
}

/// Bernoulli gate; never fires for `p <= 0`, always for `p >= 1`.
#[inline]
pub(crate) fn gate<R: Rng + ?Sized>(probability: f32, rng: &mut R) -> bool {
    rng.gen::<f32>() < probability
}

impl Network {
    /// Perturb parameters according to `config.mutation`.
    ///
    /// Channels are gated independently in the order weights, biases,
    /// activations, delays. Weight and bias noise is added to every enabled
    /// connection / non-input neuron and clamped to the configured bounds.
    /// Activation and delay mutation each change a single random target.
    pub fn mutate_parameters<R: Rng + ?Sized>(&mut self, config: &NetworkConfig, rng: &mut R) -> ParameterOutcome {
        let mut outcome = ParameterOutcome::default();
        let Some(m) = &config.mutation else {
            return outcome;
        };

        if gate(m.weights.probability, rng) {
            let (lo, hi) = config.weights.bounds;
            for conn in self.connections_mut().filter(|c| c.enabled) {
                conn.weight = (conn.weight + gaussian(m.weights.strength, rng)).clamp(lo, hi);
                outcome.weights_mutated += 1;
            }
        }

        let bias = m.bias_channel();
        if gate(bias.probability, rng) {
            let (lo, hi) = config.bias.bounds;
            for neuron in self.neurons_mut().filter(|n| n.role != NeuronRole::Input) {
                neuron.bias = (neuron.bias + gaussian(bias.strength, rng)).clamp(lo, hi);
                outcome.biases_mutated += 1;
            }
        }

        if let Some(act) = &m.activations {
            if gate(act.probability, rng) {
                let allowed: &[Activation] = act
                    .allowed
                    .as_deref()
                    .or(config.activations_allowed.as_deref())
                    .unwrap_or(&Activation::ALL);
                let hidden: Vec<NeuronId> = self.hidden_neurons().map(|n| n.id).collect();
                if let (Some(&id), Some(&new)) = (hidden.choose(rng), allowed.choose(rng)) {
                    if let Some(neuron) = self.neuron_mut(id) {
                        let old = neuron.activation;
                        neuron.activation = new;
                        outcome.activation_changed = Some((id, old, new));
                    }
                }
            }
        }

        if let Some(d) = &m.delay {
            if gate(d.probability, rng) {
                let recurrent: Vec<(ConnectionId, u32)> = self
                    .recurrent_connections()
                    .filter(|c| c.enabled)
                    .filter_map(|c| c.delay().map(|delay| (c.id, delay)))
                    .collect();
                if let Some(&(id, old)) = recurrent.choose(rng) {
                    let lo = d.bounds.0.max(1);
                    let hi = d.bounds.1.max(lo);
                    let new = match d.mode {
                        DelayMutationMode::DeltaStep => {
                            if rng.gen_bool(0.5) {
                                old.saturating_add(d.delta)
                            } else {
                                old.saturating_sub(d.delta)
                            }
                        }
                        DelayMutationMode::Resample => rng.gen_range(lo..=hi),
                    }
                    .clamp(lo, hi);
                    if self.set_delay(id, new).is_ok() {
                        outcome.delay_changed = Some((id, old, new));
                    }
                }
            }
        }

        outcome
    }

    /// One mutation event: parameters first, then structure.
    pub fn mutate<R: Rng + ?Sized>(&mut self, config: &NetworkConfig, rng: &mut R) -> MutationOutcome {
        let parameters = self.mutate_parameters(config, rng);
        let structure = self.mutate_structure(config, rng);
        MutationOutcome { parameters, structure }
    }
}
