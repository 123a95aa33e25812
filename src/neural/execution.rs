//! Forward execution over one or more timesteps.
//!
//! An episode starts with [`Network::reset`] (all delay buffers and neuron
//! states zeroed) followed by any number of [`Network::step`] calls. Layers
//! are evaluated in increasing index order, which is enough to have every
//! feedforward source computed before its target; recurrent connections only
//! ever read from their delay buffers, so cycles never need resolving.

use super::network::{ConnectionId, Network, NeuronId, NeuronRole};
use crate::error::EvaluationError;
use rayon::prelude::*;
use std::collections::HashMap;

/// Dense, per-call view of the graph used while stepping.
struct StepPlan {
    /// Neuron ids in layer order; positions index `outputs`
    order: Vec<NeuronId>,
    /// Start offset of each layer in `order`
    layer_offsets: Vec<usize>,
    /// Feedforward edges grouped by target layer: (source pos, target pos, weight)
    feedforward: Vec<Vec<(usize, usize, f32)>>,
    /// Enabled recurrent edges: (connection, source pos, target pos, weight)
    recurrent: Vec<(ConnectionId, usize, usize, f32)>,
}

impl StepPlan {
    fn build(net: &Network) -> Self {
        let mut order = Vec::with_capacity(net.neuron_count());
        let mut layer_offsets = Vec::with_capacity(net.layer_count() + 1);
        for layer in net.layers() {
            layer_offsets.push(order.len());
            order.extend_from_slice(layer.neurons());
        }
        layer_offsets.push(order.len());

        let position: HashMap<NeuronId, usize> = order.iter().enumerate().map(|(pos, id)| (*id, pos)).collect();

        let mut feedforward = vec![Vec::new(); net.layer_count()];
        let mut recurrent = Vec::new();
        for c in net.enabled_connections() {
            let (Some(&src), Some(&dst)) = (position.get(&c.source), position.get(&c.target)) else {
                continue;
            };
            if c.kind.is_recurrent() {
                recurrent.push((c.id, src, dst, c.weight));
            } else if let Some(target) = net.neuron(c.target) {
                feedforward[target.layer].push((src, dst, c.weight));
            }
        }

        Self {
            order,
            layer_offsets,
            feedforward,
            recurrent,
        }
    }

    fn layer_range(&self, layer: usize) -> std::ops::Range<usize> {
        self.layer_offsets[layer]..self.layer_offsets[layer + 1]
    }

    fn output_range(&self) -> std::ops::Range<usize> {
        self.layer_range(self.layer_offsets.len() - 2)
    }
}

impl Network {
    /// Begin a fresh evaluation episode.
    pub fn reset(&mut self) {
        for neuron in self.neurons_mut() {
            neuron.state.reset();
        }
        for conn in self.connections_mut() {
            conn.buffer.clear();
        }
    }

    /// Advance one step without resetting and return the output layer values.
    pub fn step(&mut self, inputs: &[f32]) -> Result<Vec<f32>, EvaluationError> {
        self.check_inputs(inputs)?;
        let plan = StepPlan::build(self);
        Ok(self.step_with(&plan, inputs))
    }

    /// Reset, run `steps` steps with a constant input, return the final outputs.
    pub fn forward(&mut self, inputs: &[f32], steps: usize) -> Result<Vec<f32>, EvaluationError> {
        let mut trace = self.forward_trace(inputs, steps)?;
        Ok(trace.pop().unwrap_or_default())
    }

    /// Like [`Network::forward`], but returns the outputs of every step.
    pub fn forward_trace(&mut self, inputs: &[f32], steps: usize) -> Result<Vec<Vec<f32>>, EvaluationError> {
        if steps == 0 {
            return Err(EvaluationError::ZeroSteps);
        }
        self.check_inputs(inputs)?;

        self.reset();
        let plan = StepPlan::build(self);
        Ok((0..steps).map(|_| self.step_with(&plan, inputs)).collect())
    }

    /// Reset, then feed one input vector per step (time-series evaluation).
    pub fn forward_sequence(&mut self, sequence: &[Vec<f32>]) -> Result<Vec<Vec<f32>>, EvaluationError> {
        if sequence.is_empty() {
            return Err(EvaluationError::ZeroSteps);
        }
        for inputs in sequence {
            self.check_inputs(inputs)?;
        }

        self.reset();
        let plan = StepPlan::build(self);
        Ok(sequence.iter().map(|inputs| self.step_with(&plan, inputs)).collect())
    }

    fn check_inputs(&self, inputs: &[f32]) -> Result<(), EvaluationError> {
        if inputs.len() != self.input_size() {
            return Err(EvaluationError::InputArity {
                expected: self.input_size(),
                found: inputs.len(),
            });
        }
        Ok(())
    }

    fn step_with(&mut self, plan: &StepPlan, inputs: &[f32]) -> Vec<f32> {
        let mut outputs = vec![0.0f32; plan.order.len()];
        let mut acc = vec![0.0f32; plan.order.len()];

        // Recurrent contributions only depend on buffered history
        for &(cid, _, dst, weight) in &plan.recurrent {
            if let Some(conn) = self.connection(cid) {
                acc[dst] += weight * conn.buffer.front();
            }
        }

        for (layer, edges) in plan.feedforward.iter().enumerate() {
            let range = plan.layer_range(layer);
            if layer == 0 {
                outputs[range.clone()].copy_from_slice(inputs);
                for pos in range {
                    if let Some(neuron) = self.neuron_mut(plan.order[pos]) {
                        neuron.state.last_output = outputs[pos];
                    }
                }
                continue;
            }

            for &(src, dst, weight) in edges {
                acc[dst] += weight * outputs[src];
            }
            for pos in range {
                if let Some(neuron) = self.neuron_mut(plan.order[pos]) {
                    debug_assert_ne!(neuron.role, NeuronRole::Input);
                    let activated = neuron.activation.apply(neuron.bias + acc[pos]);
                    let dynamics = neuron.dynamics;
                    outputs[pos] = dynamics.step(activated, &mut neuron.state);
                }
            }
        }

        // Every buffer advances once all outputs of this step are known
        for &(cid, src, _, _) in &plan.recurrent {
            if let Some(conn) = self.connection_mut(cid) {
                conn.buffer.push(outputs[src]);
            }
        }

        outputs[plan.output_range()].to_vec()
    }
}

/// Evaluate independent networks in parallel, one network per worker.
pub fn forward_batch(
    networks: &mut [Network],
    inputs: &[f32],
    steps: usize,
) -> Vec<Result<Vec<f32>, EvaluationError>> {
    networks.par_iter_mut().map(|net| net.forward(inputs, steps)).collect()
}
