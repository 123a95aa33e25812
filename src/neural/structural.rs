//! Structural mutation: adding and removing neurons and connections.
//!
//! One call to [`Network::mutate_structure`] is one mutation event. The four
//! operator gates are evaluated in a fixed priority order and only the first
//! that fires is applied. Rejected edits are recorded in the outcome and the
//! event degrades to a (partial) no-op; nothing is retried.

use super::activation::NeuronDynamics;
use super::initializer::{fraction_of, gaussian, sample_delay, sample_param, DEFAULT_WEIGHT_INIT, NEAR_ZERO_STD};
use super::mutations::gate;
use super::network::{ConnectionId, ConnectionKind, Network, NeuronId, NeuronRole};
use crate::config::{
    AddConnectionConfig, AddNeuronConfig, NetworkConfig, ParamInit, RemoveConnectionConfig, WeightInit,
};
use crate::error::Rejection;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralOperator {
    AddNeuron,
    RemoveNeuron,
    AddConnection,
    RemoveConnection,
}

/// What a structural mutation event did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructuralOutcome {
    /// Operator whose gate fired, if any
    pub operator: Option<StructuralOperator>,
    pub added_neurons: Vec<NeuronId>,
    pub removed_neurons: Vec<NeuronId>,
    pub added_connections: Vec<ConnectionId>,
    pub removed_connections: Vec<ConnectionId>,
    pub rejections: Vec<Rejection>,
}

impl StructuralOutcome {
    /// True when the topology actually changed.
    pub fn changed(&self) -> bool {
        !(self.added_neurons.is_empty()
            && self.removed_neurons.is_empty()
            && self.added_connections.is_empty()
            && self.removed_connections.is_empty())
    }

    fn reject(&mut self, reason: Rejection) {
        log::trace!("structural edit rejected: {}", reason);
        self.rejections.push(reason);
    }
}

/// Weight for a structurally created connection, clamped to the weight bounds.
fn new_weight<R: Rng + ?Sized>(init: WeightInit, explicit: Option<f32>, config: &NetworkConfig, rng: &mut R) -> f32 {
    let (lo, hi) = config.weights.bounds;
    let weight = match (explicit, init) {
        (Some(w), _) => w,
        (None, WeightInit::Random) => sample_param(
            config.weights.initializer.unwrap_or(DEFAULT_WEIGHT_INIT),
            config.weights.effective_init_bounds(),
            rng,
        ),
        (None, WeightInit::NearZero) => gaussian(NEAR_ZERO_STD, rng),
        (None, WeightInit::Zero | WeightInit::None) => 0.0,
    };
    weight.clamp(lo, hi)
}

impl Network {
    /// Run one structural mutation event.
    pub fn mutate_structure<R: Rng + ?Sized>(&mut self, config: &NetworkConfig, rng: &mut R) -> StructuralOutcome {
        let mut outcome = StructuralOutcome::default();
        let Some(ops) = &config.structural else {
            return outcome;
        };

        if let Some(op) = &ops.add_neuron {
            if gate(op.probability, rng) {
                outcome.operator = Some(StructuralOperator::AddNeuron);
                self.grow_neuron(config, op, rng, &mut outcome);
            }
        }
        if outcome.operator.is_none() {
            if let Some(op) = &ops.remove_neuron {
                if gate(op.probability, rng) {
                    outcome.operator = Some(StructuralOperator::RemoveNeuron);
                    self.prune_neuron(rng, &mut outcome);
                }
            }
        }
        if outcome.operator.is_none() {
            if let Some(op) = &ops.add_connection {
                if gate(op.probability, rng) {
                    outcome.operator = Some(StructuralOperator::AddConnection);
                    self.grow_connections(config, op, rng, &mut outcome);
                }
            }
        }
        if outcome.operator.is_none() {
            if let Some(op) = &ops.remove_connection {
                if gate(op.probability, rng) {
                    outcome.operator = Some(StructuralOperator::RemoveConnection);
                    self.prune_connections(op, rng, &mut outcome);
                }
            }
        }

        if let Some(op) = outcome.operator {
            log::debug!(
                "structural {:?}: +{}n -{}n +{}c -{}c, {} rejected",
                op,
                outcome.added_neurons.len(),
                outcome.removed_neurons.len(),
                outcome.added_connections.len(),
                outcome.removed_connections.len(),
                outcome.rejections.len()
            );
        }
        outcome
    }

    fn grow_neuron<R: Rng + ?Sized>(
        &mut self,
        config: &NetworkConfig,
        op: &AddNeuronConfig,
        rng: &mut R,
        outcome: &mut StructuralOutcome,
    ) {
        // Check the cap before a hidden layer might be created
        if let Some(cap) = self.constraints().max_neurons {
            if self.non_input_neuron_count() >= cap {
                outcome.reject(Rejection::NeuronCapExceeded(cap));
                return;
            }
        }

        let hidden: Vec<usize> = self.hidden_layer_indices().collect();
        let layer = match hidden.choose(rng) {
            Some(&layer) => layer,
            None => self.insert_hidden_layer(NeuronDynamics::Standard),
        };

        let activation = op
            .activations_allowed
            .as_ref()
            .or(config.activations_allowed.as_ref())
            .and_then(|allowed| allowed.choose(rng).copied())
            .unwrap_or_else(|| config.activation.for_layer(layer));
        let bias = sample_param(
            config.bias.initializer.unwrap_or(ParamInit::Zero),
            config.bias.effective_init_bounds(),
            rng,
        );

        let id = match self.add_neuron(layer, activation, bias) {
            Ok(id) => id,
            Err(reason) => {
                outcome.reject(reason);
                return;
            }
        };
        outcome.added_neurons.push(id);

        if op.init == WeightInit::None {
            return;
        }

        let mut incoming: Vec<NeuronId> = self
            .neurons()
            .filter(|n| n.role != NeuronRole::Output && n.layer < layer)
            .filter(|n| self.check_connection(n.id, id, ConnectionKind::Feedforward).is_ok())
            .map(|n| n.id)
            .collect();
        let mut outgoing: Vec<NeuronId> = self
            .neurons()
            .filter(|n| n.role != NeuronRole::Input && n.layer > layer)
            .filter(|n| self.check_connection(id, n.id, ConnectionKind::Feedforward).is_ok())
            .map(|n| n.id)
            .collect();

        incoming.shuffle(rng);
        outgoing.shuffle(rng);
        let take_in = fraction_of(incoming.len(), op.init_connection_ratio);
        let take_out = fraction_of(outgoing.len(), op.init_connection_ratio);

        let edges = incoming
            .into_iter()
            .take(take_in)
            .map(|src| (src, id))
            .chain(outgoing.into_iter().take(take_out).map(|dst| (id, dst)));
        for (source, target) in edges.collect::<Vec<_>>() {
            let weight = new_weight(op.init, None, config, rng);
            match self.add_connection(source, target, ConnectionKind::Feedforward, weight, None) {
                Ok(cid) => outcome.added_connections.push(cid),
                Err(reason) => outcome.reject(reason),
            }
        }
    }

    fn prune_neuron<R: Rng + ?Sized>(&mut self, rng: &mut R, outcome: &mut StructuralOutcome) {
        let hidden: Vec<NeuronId> = self.hidden_neurons().map(|n| n.id).collect();
        let Some(&id) = hidden.choose(rng) else {
            outcome.reject(Rejection::NoEligibleTarget);
            return;
        };

        let incident: Vec<ConnectionId> = self
            .connections()
            .filter(|c| c.source == id || c.target == id)
            .map(|c| c.id)
            .collect();
        match self.remove_neuron(id) {
            Ok(()) => {
                outcome.removed_neurons.push(id);
                outcome.removed_connections.extend(incident);
            }
            Err(reason) => outcome.reject(reason),
        }
    }

    fn grow_connections<R: Rng + ?Sized>(
        &mut self,
        config: &NetworkConfig,
        op: &AddConnectionConfig,
        rng: &mut R,
        outcome: &mut StructuralOutcome,
    ) {
        let mut candidates = self.candidate_edges();
        if candidates.is_empty() {
            outcome.reject(Rejection::NoEligibleTarget);
            return;
        }

        let wanted = rng.gen_range(1..=op.max_new_connections.max(1)).min(candidates.len());
        candidates.shuffle(rng);
        for (source, target, kind) in candidates.into_iter().take(wanted) {
            let weight = new_weight(op.init, op.weight, config, rng);
            let delay = kind.is_recurrent().then(|| sample_delay(config.delay, rng));
            match self.add_connection(source, target, kind, weight, delay) {
                Ok(cid) => outcome.added_connections.push(cid),
                Err(reason) => outcome.reject(reason),
            }
        }
    }

    fn prune_connections<R: Rng + ?Sized>(
        &mut self,
        op: &RemoveConnectionConfig,
        rng: &mut R,
        outcome: &mut StructuralOutcome,
    ) {
        let mut removable = self.removable_connections();
        if removable.is_empty() {
            outcome.reject(Rejection::NoEligibleTarget);
            return;
        }

        // Earlier removals can make later ones illegal, so each one is re-checked
        removable.shuffle(rng);
        for cid in removable {
            if outcome.removed_connections.len() >= op.max_removed_connections {
                break;
            }
            match self.remove_connection(cid) {
                Ok(()) => outcome.removed_connections.push(cid),
                Err(reason) => outcome.reject(reason),
            }
        }
    }
}
