//! Flat parameter vectors for vector-based optimizers.
//!
//! Layout: weights of enabled connections in ascending connection id, then
//! biases of non-input neurons in ascending neuron id. The layout changes
//! whenever the topology does, so vectors are only valid for the network they
//! were taken from.

use super::network::{Network, NeuronRole};
use crate::config::NetworkConfig;
use crate::error::EvaluationError;
use ndarray::Array1;

impl Network {
    pub fn parameter_count(&self) -> usize {
        self.enabled_connection_count() + self.non_input_neuron_count()
    }

    pub fn parameter_vector(&self) -> Array1<f32> {
        let weights = self.enabled_connections().map(|c| c.weight);
        let biases = self.neurons().filter(|n| n.role != NeuronRole::Input).map(|n| n.bias);
        Array1::from_iter(weights.chain(biases))
    }

    /// Write a vector produced by [`Network::parameter_vector`] back.
    pub fn set_parameter_vector(&mut self, params: &Array1<f32>) -> Result<(), EvaluationError> {
        let expected = self.parameter_count();
        if params.len() != expected {
            return Err(EvaluationError::ParameterLength {
                expected,
                found: params.len(),
            });
        }

        let mut values = params.iter().copied();
        for conn in self.connections_mut().filter(|c| c.enabled) {
            if let Some(v) = values.next() {
                conn.weight = v;
            }
        }
        for neuron in self.neurons_mut().filter(|n| n.role != NeuronRole::Input) {
            if let Some(v) = values.next() {
                neuron.bias = v;
            }
        }
        Ok(())
    }

    /// Clamp every weight and non-input bias to the configured bounds.
    pub fn clamp_parameters(&mut self, config: &NetworkConfig) {
        let (wlo, whi) = config.weights.bounds;
        let (blo, bhi) = config.bias.bounds;
        for conn in self.connections_mut() {
            conn.weight = conn.weight.clamp(wlo, whi);
        }
        for neuron in self.neurons_mut().filter(|n| n.role != NeuronRole::Input) {
            neuron.bias = neuron.bias.clamp(blo, bhi);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::neural::{Activation, ConnectionKind, TopologyConstraints};

    fn sample() -> Network {
        let mut net = Network::new(&[2, 1, 1], Activation::Tanh, TopologyConstraints::default()).unwrap();
        let (a, b) = (net.input_neurons()[0], net.input_neurons()[1]);
        let (h, o) = (net.layers()[1].neurons()[0], net.output_neurons()[0]);
        net.add_connection(a, h, ConnectionKind::Feedforward, 0.1, None).unwrap();
        net.add_connection(b, h, ConnectionKind::Feedforward, 0.2, None).unwrap();
        net.add_connection(h, o, ConnectionKind::Feedforward, 0.3, None).unwrap();
        net.set_bias(h, -0.4).unwrap();
        net.set_bias(o, 0.5).unwrap();
        net
    }

    #[test]
    fn test_vector_layout() {
        let net = sample();
        assert_eq!(net.parameter_count(), 5);
        assert_eq!(net.parameter_vector().to_vec(), vec![0.1, 0.2, 0.3, -0.4, 0.5]);
    }

    #[test]
    fn test_disabled_connections_excluded() {
        let mut net = sample();
        let first = net.connections().next().unwrap().id;
        net.set_connection_enabled(first, false).unwrap();
        assert_eq!(net.parameter_vector().to_vec(), vec![0.2, 0.3, -0.4, 0.5]);
    }

    #[test]
    fn test_set_vector() {
        let mut net = sample();
        let doubled = net.parameter_vector() * 2.0;
        net.set_parameter_vector(&doubled).unwrap();
        assert_eq!(net.parameter_vector(), doubled);
        let h = net.layers()[1].neurons()[0];
        assert_eq!(net.neuron(h).unwrap().bias, -0.8);
    }

    #[test]
    fn test_length_mismatch() {
        let mut net = sample();
        assert_eq!(
            net.set_parameter_vector(&Array1::zeros(3)),
            Err(EvaluationError::ParameterLength { expected: 5, found: 3 })
        );
        assert_eq!(net.parameter_vector()[0], 0.1);
    }

    #[test]
    fn test_clamp_parameters() {
        let mut net = sample();
        net.set_parameter_vector(&Array1::from_elem(5, 9.0)).unwrap();
        net.clamp_parameters(&NetworkConfig::default());
        let (_, whi) = NetworkConfig::default().weights.bounds;
        let (_, bhi) = NetworkConfig::default().bias.bounds;
        assert!(net.connections().all(|c| c.weight == whi));
        assert!(net.hidden_neurons().all(|n| n.bias == bhi));
    }
}
