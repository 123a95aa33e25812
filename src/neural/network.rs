//! Graph store: neurons, connections and layer partitioning.
//!
//! Neurons and connections live in id-keyed maps; adjacency is always derived
//! from connection endpoints, never stored as pointers. Every public mutating
//! method is atomic: it either applies the whole edit (including cascades) or
//! returns a [`Rejection`] and leaves the network untouched.

use super::activation::{Activation, NeuronDynamics, NeuronState};
use super::delay::DelayBuffer;
use crate::error::{ConfigError, InvariantViolation, Rejection};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

/// Neuron identifier. Unique for the lifetime of a network, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NeuronId(pub u32);

/// Connection identifier. Unique for the lifetime of a network, never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub u32);

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronRole {
    Input,
    Hidden,
    Output,
}

/// The recurrent connection kinds a topology may allow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrentKind {
    /// Self-loop.
    Direct,
    /// Between two neurons of the same layer.
    #[serde(alias = "lateral")]
    Local,
    /// From a neuron back to an earlier layer.
    Indirect,
}

impl RecurrentKind {
    pub const ALL: [RecurrentKind; 3] = [RecurrentKind::Direct, RecurrentKind::Local, RecurrentKind::Indirect];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionKind {
    Feedforward,
    Direct,
    Local,
    Indirect,
}

impl ConnectionKind {
    /// Kind implied by the endpoints' positions.
    pub fn classify(source: NeuronId, source_layer: usize, target: NeuronId, target_layer: usize) -> Self {
        if source == target {
            ConnectionKind::Direct
        } else if source_layer == target_layer {
            ConnectionKind::Local
        } else if target_layer > source_layer {
            ConnectionKind::Feedforward
        } else {
            ConnectionKind::Indirect
        }
    }

    pub fn recurrent(self) -> Option<RecurrentKind> {
        match self {
            ConnectionKind::Feedforward => None,
            ConnectionKind::Direct => Some(RecurrentKind::Direct),
            ConnectionKind::Local => Some(RecurrentKind::Local),
            ConnectionKind::Indirect => Some(RecurrentKind::Indirect),
        }
    }

    #[inline]
    pub fn is_recurrent(self) -> bool {
        self != ConnectionKind::Feedforward
    }
}

impl From<RecurrentKind> for ConnectionKind {
    fn from(kind: RecurrentKind) -> Self {
        match kind {
            RecurrentKind::Direct => ConnectionKind::Direct,
            RecurrentKind::Local => ConnectionKind::Local,
            RecurrentKind::Indirect => ConnectionKind::Indirect,
        }
    }
}

/// Which feedforward edges are legal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionScope {
    /// Layer `i` to the next populated layer above it, judged when the edge
    /// is created.
    #[default]
    Adjacent,
    /// Any layer `i` to any layer `j > i`.
    Crosslayer,
}

/// Structural rules the graph store enforces on every edit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologyConstraints {
    pub scope: ConnectionScope,
    pub allowed_recurrent: Vec<RecurrentKind>,
    /// Cap on non-input neurons
    pub max_neurons: Option<usize>,
    /// Cap on enabled connections
    pub max_connections: Option<usize>,
    pub keep_connected: bool,
}

impl TopologyConstraints {
    pub fn allows(&self, kind: RecurrentKind) -> bool {
        self.allowed_recurrent.contains(&kind)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Layer {
    pub index: usize,
    neurons: Vec<NeuronId>,
    /// Dynamics given to neurons created in this layer
    pub dynamics: NeuronDynamics,
}

impl Layer {
    pub fn neurons(&self) -> &[NeuronId] {
        &self.neurons
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Neuron {
    pub id: NeuronId,
    pub layer: usize,
    pub role: NeuronRole,
    pub bias: f32,
    pub activation: Activation,
    pub dynamics: NeuronDynamics,
    #[serde(skip)]
    pub(crate) state: NeuronState,
}

impl Neuron {
    /// Output from the most recent execution step.
    pub fn last_output(&self) -> f32 {
        self.state.last_output
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub source: NeuronId,
    pub target: NeuronId,
    pub weight: f32,
    pub kind: ConnectionKind,
    pub enabled: bool,
    delay: Option<u32>,
    pub(crate) buffer: DelayBuffer,
}

impl Connection {
    /// Delay in steps; `Some` exactly for recurrent kinds.
    pub fn delay(&self) -> Option<u32> {
        self.delay
    }

    pub fn buffer(&self) -> &DelayBuffer {
        &self.buffer
    }

    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

/// Evolvable layered network.
///
/// `Clone` is a deep copy whose delay buffers and neuron states are zeroed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Network {
    layers: Vec<Layer>,
    neurons: BTreeMap<NeuronId, Neuron>,
    connections: BTreeMap<ConnectionId, Connection>,
    constraints: TopologyConstraints,
    next_neuron_id: u32,
    next_connection_id: u32,
}

impl Network {
    /// Build a network with the given layer sizes and no connections.
    ///
    /// Input neurons are linear; every other neuron uses `activation` and a zero
    /// bias. Requires at least an input and an output layer, both non-empty.
    pub fn new(dim: &[usize], activation: Activation, constraints: TopologyConstraints) -> Result<Self, ConfigError> {
        let activations = vec![activation; dim.len()];
        let dynamics = vec![NeuronDynamics::Standard; dim.len()];
        Self::from_layout(dim, &activations, &dynamics, constraints)
    }

    /// Build an unconnected network with per-layer activation and dynamics.
    pub(crate) fn from_layout(
        dim: &[usize],
        activations: &[Activation],
        dynamics: &[NeuronDynamics],
        constraints: TopologyConstraints,
    ) -> Result<Self, ConfigError> {
        if dim.len() < 2 {
            return Err(ConfigError::invalid("dim must contain at least an input and an output layer"));
        }
        if dim[0] == 0 || dim[dim.len() - 1] == 0 {
            return Err(ConfigError::invalid("input and output layers must not be empty"));
        }

        let mut net = Self {
            layers: (0..dim.len())
                .map(|index| Layer {
                    index,
                    neurons: Vec::new(),
                    dynamics: dynamics.get(index).copied().unwrap_or_default(),
                })
                .collect(),
            neurons: BTreeMap::new(),
            connections: BTreeMap::new(),
            constraints,
            next_neuron_id: 0,
            next_connection_id: 0,
        };

        let non_input: usize = dim[1..].iter().sum();
        if let Some(cap) = net.constraints.max_neurons {
            if non_input > cap {
                return Err(ConfigError::invalid(format!(
                    "dim declares {non_input} non-input neurons, above max_neurons = {cap}"
                )));
            }
        }

        let last = dim.len() - 1;
        for (layer, &size) in dim.iter().enumerate() {
            let role = match layer {
                0 => NeuronRole::Input,
                l if l == last => NeuronRole::Output,
                _ => NeuronRole::Hidden,
            };
            let activation = if role == NeuronRole::Input {
                Activation::Linear
            } else {
                activations.get(layer).copied().unwrap_or_default()
            };
            for _ in 0..size {
                net.insert_neuron(layer, role, activation, 0.0);
            }
        }

        Ok(net)
    }

    fn insert_neuron(&mut self, layer: usize, role: NeuronRole, activation: Activation, bias: f32) -> NeuronId {
        let id = NeuronId(self.next_neuron_id);
        self.next_neuron_id += 1;
        let dynamics = if role == NeuronRole::Input {
            NeuronDynamics::Standard
        } else {
            self.layers[layer].dynamics
        };
        self.neurons.insert(
            id,
            Neuron {
                id,
                layer,
                role,
                bias,
                activation,
                dynamics,
                state: NeuronState::default(),
            },
        );
        self.layers[layer].neurons.push(id);
        id
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn constraints(&self) -> &TopologyConstraints {
        &self.constraints
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&Layer> {
        self.layers.get(index)
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    #[inline]
    pub fn output_layer_index(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn input_size(&self) -> usize {
        self.layers[0].len()
    }

    pub fn output_size(&self) -> usize {
        self.layers[self.output_layer_index()].len()
    }

    pub fn input_neurons(&self) -> &[NeuronId] {
        self.layers[0].neurons()
    }

    pub fn output_neurons(&self) -> &[NeuronId] {
        self.layers[self.output_layer_index()].neurons()
    }

    pub fn hidden_layer_indices(&self) -> std::ops::Range<usize> {
        1..self.output_layer_index()
    }

    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        self.neurons.get(&id)
    }

    /// All neurons in id order.
    pub fn neurons(&self) -> impl Iterator<Item = &Neuron> {
        self.neurons.values()
    }

    pub fn hidden_neurons(&self) -> impl Iterator<Item = &Neuron> {
        self.neurons.values().filter(|n| n.role == NeuronRole::Hidden)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    /// All connections in id order, enabled or not.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    pub fn enabled_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(|c| c.enabled)
    }

    pub fn recurrent_connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(|c| c.kind.is_recurrent())
    }

    pub fn incoming(&self, id: NeuronId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.target == id)
    }

    pub fn outgoing(&self, id: NeuronId) -> impl Iterator<Item = &Connection> {
        self.connections.values().filter(move |c| c.source == id)
    }

    pub fn neuron_count(&self) -> usize {
        self.neurons.len()
    }

    pub fn non_input_neuron_count(&self) -> usize {
        self.neurons.len() - self.input_size()
    }

    pub fn hidden_neuron_count(&self) -> usize {
        self.hidden_neurons().count()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn enabled_connection_count(&self) -> usize {
        self.enabled_connections().count()
    }

    pub fn has_recurrence(&self) -> bool {
        self.enabled_connections().any(|c| c.kind.is_recurrent())
    }

    /// Enabled connection with exactly these endpoints and kind.
    pub fn find_enabled(&self, source: NeuronId, target: NeuronId, kind: ConnectionKind) -> Option<ConnectionId> {
        self.connections
            .values()
            .find(|c| c.enabled && c.source == source && c.target == target && c.kind == kind)
            .map(|c| c.id)
    }

    /// Enabled incoming connections from other neurons (self-loops excluded).
    pub fn enabled_in_degree(&self, id: NeuronId) -> usize {
        self.connections
            .values()
            .filter(|c| c.enabled && c.target == id && c.source != id)
            .count()
    }

    /// Enabled outgoing connections to other neurons (self-loops excluded).
    pub fn enabled_out_degree(&self, id: NeuronId) -> usize {
        self.connections
            .values()
            .filter(|c| c.enabled && c.source == id && c.target != id)
            .count()
    }

    /// Check whether `source -> target` of `kind` could be added right now.
    pub fn check_connection(&self, source: NeuronId, target: NeuronId, kind: ConnectionKind) -> Result<(), Rejection> {
        self.check_edge_shape(source, target, kind)?;
        if self.find_enabled(source, target, kind).is_some() {
            return Err(Rejection::DuplicateEdge {
                source_id: source,
                target,
                kind,
            });
        }
        if let Some(cap) = self.constraints.max_connections {
            if self.enabled_connection_count() >= cap {
                return Err(Rejection::ConnectionCapExceeded(cap));
            }
        }
        Ok(())
    }

    /// Direction, scope, boundary and allowed-kind rules, ignoring what already exists.
    fn check_edge_shape(&self, source: NeuronId, target: NeuronId, kind: ConnectionKind) -> Result<(), Rejection> {
        let src = self.neurons.get(&source).ok_or(Rejection::UnknownNeuron(source))?;
        let dst = self.neurons.get(&target).ok_or(Rejection::UnknownNeuron(target))?;

        if dst.role == NeuronRole::Input || src.role == NeuronRole::Output {
            return Err(Rejection::BoundaryLayer);
        }

        let illegal = Rejection::IllegalDirection {
            source_id: source,
            target,
            kind,
        };
        if ConnectionKind::classify(source, src.layer, target, dst.layer) != kind {
            return Err(illegal);
        }

        match kind.recurrent() {
            None => {
                if self.constraints.scope == ConnectionScope::Adjacent && !self.only_empty_between(src.layer, dst.layer) {
                    return Err(illegal);
                }
            }
            Some(rk) => {
                if !self.constraints.allows(rk) {
                    return Err(Rejection::DisallowedKind(rk));
                }
            }
        }
        Ok(())
    }

    /// True when no layer strictly between `lower` and `upper` holds a neuron.
    ///
    /// Adjacency skips empty layers, so `[2, 0, 1]` wires inputs straight to
    /// outputs. An edge that was adjacent when created stays legal after a
    /// skipped layer gains neurons.
    pub fn only_empty_between(&self, lower: usize, upper: usize) -> bool {
        upper <= lower + 1 || self.layers[lower + 1..upper].iter().all(Layer::is_empty)
    }

    /// Every legal `(source, target, kind)` not currently present as an enabled edge.
    ///
    /// Feedforward candidates come first, then recurrent ones, each in neuron id order.
    pub fn candidate_edges(&self) -> Vec<(NeuronId, NeuronId, ConnectionKind)> {
        let present: HashSet<(NeuronId, NeuronId, ConnectionKind)> = self
            .enabled_connections()
            .map(|c| (c.source, c.target, c.kind))
            .collect();

        let mut feedforward = Vec::new();
        let mut recurrent = Vec::new();
        for src in self.neurons.values().filter(|n| n.role != NeuronRole::Output) {
            for dst in self.neurons.values().filter(|n| n.role != NeuronRole::Input) {
                let kind = ConnectionKind::classify(src.id, src.layer, dst.id, dst.layer);
                if present.contains(&(src.id, dst.id, kind)) || self.check_edge_shape(src.id, dst.id, kind).is_err() {
                    continue;
                }
                if kind.is_recurrent() {
                    recurrent.push((src.id, dst.id, kind));
                } else {
                    feedforward.push((src.id, dst.id, kind));
                }
            }
        }
        feedforward.extend(recurrent);
        feedforward
    }

    /// First neuron that removing `removed` connections (and optionally a neuron)
    /// would cut off, under the keep-connected policy.
    ///
    /// A neuron is cut off when an edit takes it from at least one enabled
    /// incoming (hidden and output neurons) or outgoing (hidden and input
    /// neurons) connection to none. Self-loops do not count.
    fn would_orphan(&self, removed: &BTreeSet<ConnectionId>, removed_neuron: Option<NeuronId>) -> Option<NeuronId> {
        if !self.constraints.keep_connected {
            return None;
        }

        let mut touched = BTreeSet::new();
        for id in removed {
            if let Some(c) = self.connections.get(id) {
                if c.enabled && !c.is_self_loop() {
                    touched.insert(c.source);
                    touched.insert(c.target);
                }
            }
        }
        if let Some(n) = removed_neuron {
            touched.remove(&n);
        }

        for id in touched {
            let Some(neuron) = self.neurons.get(&id) else {
                continue;
            };
            let live = |c: &&Connection| c.enabled && !c.is_self_loop() && !removed.contains(&c.id);
            let needs_in = neuron.role != NeuronRole::Input;
            let needs_out = neuron.role != NeuronRole::Output;

            if needs_in {
                let before = self.enabled_in_degree(id);
                let after = self.incoming(id).filter(live).count();
                if before > 0 && after == 0 {
                    return Some(id);
                }
            }
            if needs_out {
                let before = self.enabled_out_degree(id);
                let after = self.outgoing(id).filter(live).count();
                if before > 0 && after == 0 {
                    return Some(id);
                }
            }
        }
        None
    }

    /// Enabled connections that could be removed without cutting a neuron off.
    pub fn removable_connections(&self) -> Vec<ConnectionId> {
        self.enabled_connections()
            .filter(|c| {
                let single = BTreeSet::from([c.id]);
                self.would_orphan(&single, None).is_none()
            })
            .map(|c| c.id)
            .collect()
    }

    // ------------------------------------------------------------------
    // Structural edits
    // ------------------------------------------------------------------

    /// Add an unconnected neuron to a hidden layer.
    pub fn add_neuron(&mut self, layer: usize, activation: Activation, bias: f32) -> Result<NeuronId, Rejection> {
        if layer >= self.layers.len() {
            return Err(Rejection::UnknownLayer(layer));
        }
        if layer == 0 || layer == self.output_layer_index() {
            return Err(Rejection::BoundaryLayer);
        }
        if let Some(cap) = self.constraints.max_neurons {
            if self.non_input_neuron_count() >= cap {
                return Err(Rejection::NeuronCapExceeded(cap));
            }
        }
        Ok(self.insert_neuron(layer, NeuronRole::Hidden, activation, bias))
    }

    /// Insert an empty hidden layer directly before the output layer and
    /// return its index.
    pub fn insert_hidden_layer(&mut self, dynamics: NeuronDynamics) -> usize {
        let out = self.output_layer_index();
        self.layers.insert(
            out,
            Layer {
                index: out,
                neurons: Vec::new(),
                dynamics,
            },
        );
        for (index, layer) in self.layers.iter_mut().enumerate().skip(out + 1) {
            layer.index = index;
            for id in &layer.neurons {
                if let Some(n) = self.neurons.get_mut(id) {
                    n.layer = index;
                }
            }
        }
        out
    }

    /// Remove a hidden neuron together with all its connections.
    pub fn remove_neuron(&mut self, id: NeuronId) -> Result<(), Rejection> {
        let neuron = self.neurons.get(&id).ok_or(Rejection::UnknownNeuron(id))?;
        if neuron.role != NeuronRole::Hidden {
            return Err(Rejection::BoundaryLayer);
        }
        let layer = neuron.layer;

        let incident: BTreeSet<ConnectionId> = self
            .connections
            .values()
            .filter(|c| c.source == id || c.target == id)
            .map(|c| c.id)
            .collect();

        if let Some(orphan) = self.would_orphan(&incident, Some(id)) {
            return Err(Rejection::WouldOrphan(orphan));
        }

        for cid in &incident {
            self.connections.remove(cid);
        }
        self.layers[layer].neurons.retain(|n| *n != id);
        self.neurons.remove(&id);
        Ok(())
    }

    /// Add a connection. Recurrent kinds default to a delay of 1 when `delay`
    /// is `None`; feedforward connections must not carry a delay.
    pub fn add_connection(
        &mut self,
        source: NeuronId,
        target: NeuronId,
        kind: ConnectionKind,
        weight: f32,
        delay: Option<u32>,
    ) -> Result<ConnectionId, Rejection> {
        self.check_connection(source, target, kind)?;

        let delay = match (kind.is_recurrent(), delay) {
            (false, None) => None,
            (false, Some(d)) => return Err(Rejection::InvalidDelay(Some(d))),
            (true, None) => Some(1),
            (true, Some(0)) => return Err(Rejection::InvalidDelay(Some(0))),
            (true, Some(d)) => Some(d),
        };

        let id = ConnectionId(self.next_connection_id);
        self.next_connection_id += 1;
        self.connections.insert(
            id,
            Connection {
                id,
                source,
                target,
                weight,
                kind,
                enabled: true,
                delay,
                buffer: DelayBuffer::new(delay.unwrap_or(0) as usize),
            },
        );
        Ok(id)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Result<(), Rejection> {
        if !self.connections.contains_key(&id) {
            return Err(Rejection::UnknownConnection(id));
        }
        if let Some(orphan) = self.would_orphan(&BTreeSet::from([id]), None) {
            return Err(Rejection::WouldOrphan(orphan));
        }
        self.connections.remove(&id);
        Ok(())
    }

    /// Enable or disable a connection. Disabling follows the keep-connected
    /// rule; enabling follows the duplicate-edge and cap rules.
    pub fn set_connection_enabled(&mut self, id: ConnectionId, enabled: bool) -> Result<(), Rejection> {
        let conn = self.connections.get(&id).ok_or(Rejection::UnknownConnection(id))?;
        if conn.enabled == enabled {
            return Ok(());
        }
        if enabled {
            let (source, target, kind) = (conn.source, conn.target, conn.kind);
            self.check_connection(source, target, kind)?;
        } else if let Some(orphan) = self.would_orphan(&BTreeSet::from([id]), None) {
            return Err(Rejection::WouldOrphan(orphan));
        }
        if let Some(conn) = self.connections.get_mut(&id) {
            conn.enabled = enabled;
            conn.buffer.clear();
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Parameter edits
    // ------------------------------------------------------------------

    pub fn set_weight(&mut self, id: ConnectionId, weight: f32) -> Result<(), Rejection> {
        let conn = self.connections.get_mut(&id).ok_or(Rejection::UnknownConnection(id))?;
        conn.weight = weight;
        Ok(())
    }

    pub fn set_bias(&mut self, id: NeuronId, bias: f32) -> Result<(), Rejection> {
        let neuron = self.neurons.get_mut(&id).ok_or(Rejection::UnknownNeuron(id))?;
        neuron.bias = bias;
        Ok(())
    }

    pub fn set_activation(&mut self, id: NeuronId, activation: Activation) -> Result<(), Rejection> {
        let neuron = self.neurons.get_mut(&id).ok_or(Rejection::UnknownNeuron(id))?;
        if neuron.role == NeuronRole::Input {
            return Err(Rejection::BoundaryLayer);
        }
        neuron.activation = activation;
        Ok(())
    }

    pub fn set_dynamics(&mut self, id: NeuronId, dynamics: NeuronDynamics) -> Result<(), Rejection> {
        let neuron = self.neurons.get_mut(&id).ok_or(Rejection::UnknownNeuron(id))?;
        if neuron.role == NeuronRole::Input {
            return Err(Rejection::BoundaryLayer);
        }
        neuron.dynamics = dynamics;
        neuron.state.reset();
        Ok(())
    }

    /// Change a recurrent connection's delay, resizing its buffer.
    pub fn set_delay(&mut self, id: ConnectionId, delay: u32) -> Result<(), Rejection> {
        let conn = self.connections.get_mut(&id).ok_or(Rejection::UnknownConnection(id))?;
        if !conn.kind.is_recurrent() || delay == 0 {
            return Err(Rejection::InvalidDelay(Some(delay)));
        }
        conn.delay = Some(delay);
        conn.buffer.resize(delay as usize);
        Ok(())
    }

    pub(crate) fn connections_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.values_mut()
    }

    pub(crate) fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    pub(crate) fn neurons_mut(&mut self) -> impl Iterator<Item = &mut Neuron> {
        self.neurons.values_mut()
    }

    pub(crate) fn neuron_mut(&mut self, id: NeuronId) -> Option<&mut Neuron> {
        self.neurons.get_mut(&id)
    }

    // ------------------------------------------------------------------
    // Validation & introspection
    // ------------------------------------------------------------------

    /// Check if network is valid (no NaN/Inf)
    pub fn is_valid(&self) -> bool {
        self.connections.values().all(|c| c.weight.is_finite()) && self.neurons.values().all(|n| n.bias.is_finite())
    }

    /// Verify every stateless graph invariant.
    ///
    /// Connection scope is not re-checked here. It is enforced when an edge is
    /// created, and an `Adjacent` edge stays legal after a layer it skipped
    /// gains neurons (see [`Network::only_empty_between`]).
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        for layer in &self.layers {
            for id in &layer.neurons {
                match self.neurons.get(id) {
                    Some(n) if n.layer == layer.index => {}
                    _ => return Err(InvariantViolation::LayerMismatch(*id, layer.index)),
                }
            }
        }

        let mut seen = HashSet::new();
        for c in self.connections.values() {
            let (Some(src), Some(dst)) = (self.neurons.get(&c.source), self.neurons.get(&c.target)) else {
                return Err(InvariantViolation::DanglingConnection(c.id));
            };
            if dst.role == NeuronRole::Input || src.role == NeuronRole::Output {
                return Err(InvariantViolation::BoundaryLayer(c.id));
            }
            if ConnectionKind::classify(c.source, src.layer, c.target, dst.layer) != c.kind {
                return Err(InvariantViolation::IllegalDirection(c.id));
            }
            match c.kind.recurrent() {
                None => {
                    if c.delay.is_some() || !c.buffer.is_empty() {
                        return Err(InvariantViolation::DelayMismatch(c.id, c.delay, c.buffer.len()));
                    }
                }
                Some(rk) => {
                    if !self.constraints.allows(rk) {
                        return Err(InvariantViolation::DisallowedKind(c.id));
                    }
                    match c.delay {
                        Some(d) if d >= 1 && d as usize == c.buffer.len() => {}
                        _ => return Err(InvariantViolation::DelayMismatch(c.id, c.delay, c.buffer.len())),
                    }
                }
            }
            if c.enabled && !seen.insert((c.source, c.target, c.kind)) {
                return Err(InvariantViolation::DuplicateEdge(c.source, c.target, c.kind));
            }
        }

        if let Some(cap) = self.constraints.max_neurons {
            if self.non_input_neuron_count() > cap {
                return Err(InvariantViolation::NeuronCap(self.non_input_neuron_count(), cap));
            }
        }
        if let Some(cap) = self.constraints.max_connections {
            if self.enabled_connection_count() > cap {
                return Err(InvariantViolation::ConnectionCap(self.enabled_connection_count(), cap));
            }
        }
        Ok(())
    }

    pub fn summary(&self) -> TopologySummary {
        let enabled = self.enabled_connections();
        let (mut feedforward, mut recurrent) = (0, 0);
        for c in enabled {
            if c.kind.is_recurrent() {
                recurrent += 1;
            } else {
                feedforward += 1;
            }
        }
        TopologySummary {
            layer_sizes: self.layers.iter().map(Layer::len).collect(),
            neurons: self.neurons.len(),
            hidden_neurons: self.hidden_neuron_count(),
            feedforward_connections: feedforward,
            recurrent_connections: recurrent,
            disabled_connections: self.connections.len() - feedforward - recurrent,
            max_delay: self.recurrent_connections().filter_map(Connection::delay).max().unwrap_or(0),
        }
    }
}

/// Topology overview for logging and reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologySummary {
    pub layer_sizes: Vec<usize>,
    pub neurons: usize,
    pub hidden_neurons: usize,
    pub feedforward_connections: usize,
    pub recurrent_connections: usize,
    pub disabled_connections: usize,
    pub max_delay: u32,
}

impl fmt::Display for TopologySummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Network Topology ===")?;
        writeln!(f, "Layers: {:?}", self.layer_sizes)?;
        writeln!(f, "Neurons: {} ({} hidden)", self.neurons, self.hidden_neurons)?;
        writeln!(
            f,
            "Connections: {} feedforward, {} recurrent, {} disabled",
            self.feedforward_connections, self.recurrent_connections, self.disabled_connections
        )?;
        writeln!(f, "Max delay: {}", self.max_delay)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constraints(scope: ConnectionScope, recurrent: &[RecurrentKind], keep_connected: bool) -> TopologyConstraints {
        TopologyConstraints {
            scope,
            allowed_recurrent: recurrent.to_vec(),
            keep_connected,
            ..TopologyConstraints::default()
        }
    }

    /// [1, 1, 1] chain: input -> hidden -> output
    fn chain(keep_connected: bool) -> (Network, NeuronId, NeuronId, NeuronId) {
        let mut net = Network::new(
            &[1, 1, 1],
            Activation::Linear,
            constraints(ConnectionScope::Adjacent, &[RecurrentKind::Direct], keep_connected),
        )
        .unwrap();
        let (i, h, o) = (net.input_neurons()[0], net.layers()[1].neurons()[0], net.output_neurons()[0]);
        net.add_connection(i, h, ConnectionKind::Feedforward, 1.0, None).unwrap();
        net.add_connection(h, o, ConnectionKind::Feedforward, 1.0, None).unwrap();
        (net, i, h, o)
    }

    #[test]
    fn test_new_network_layout() {
        let net = Network::new(&[2, 0, 1], Activation::Tanh, TopologyConstraints::default()).unwrap();
        assert_eq!(net.layer_count(), 3);
        assert_eq!(net.input_size(), 2);
        assert_eq!(net.output_size(), 1);
        assert_eq!(net.non_input_neuron_count(), 1);
        assert_eq!(net.connection_count(), 0);
        assert!(net.check_invariants().is_ok());
    }

    #[test]
    fn test_malformed_layout_is_config_error() {
        let constraints = TopologyConstraints::default;
        assert!(matches!(
            Network::new(&[3], Activation::Tanh, constraints()),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Network::new(&[0, 2, 1], Activation::Tanh, constraints()),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Network::new(&[2, 2, 0], Activation::Tanh, constraints()),
            Err(ConfigError::Invalid(_))
        ));

        let capped = TopologyConstraints {
            max_neurons: Some(2),
            ..TopologyConstraints::default()
        };
        assert!(matches!(
            Network::new(&[1, 2, 1], Activation::Tanh, capped),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_ids_are_never_reused() {
        let mut net = Network::new(&[1, 0, 1], Activation::Tanh, TopologyConstraints::default()).unwrap();
        let a = net.add_neuron(1, Activation::Tanh, 0.0).unwrap();
        net.remove_neuron(a).unwrap();
        let b = net.add_neuron(1, Activation::Tanh, 0.0).unwrap();
        assert_ne!(a, b);
        assert!(net.neuron(a).is_none());
    }

    #[test]
    fn test_duplicate_edge_rejected() {
        let (mut net, i, h, _) = chain(false);
        let before = net.connection_count();
        let err = net.add_connection(i, h, ConnectionKind::Feedforward, 0.3, None).unwrap_err();
        assert!(matches!(err, Rejection::DuplicateEdge { .. }));
        assert_eq!(net.connection_count(), before);
    }

    #[test]
    fn test_direction_and_scope_rules() {
        let mut net = Network::new(&[1, 1, 1], Activation::Linear, TopologyConstraints::default()).unwrap();
        let (i, h, o) = (net.input_neurons()[0], net.layers()[1].neurons()[0], net.output_neurons()[0]);

        // skips a layer under adjacent scope
        assert!(matches!(
            net.add_connection(i, o, ConnectionKind::Feedforward, 1.0, None),
            Err(Rejection::IllegalDirection { .. })
        ));
        // kind must match geometry
        assert!(matches!(
            net.add_connection(i, h, ConnectionKind::Local, 1.0, None),
            Err(Rejection::IllegalDirection { .. })
        ));
        // no recurrence allowed by default
        assert_eq!(
            net.add_connection(h, h, ConnectionKind::Direct, 1.0, Some(1)),
            Err(Rejection::DisallowedKind(RecurrentKind::Direct))
        );
        // nothing leaves the output layer or enters the input layer
        assert_eq!(
            net.add_connection(o, h, ConnectionKind::Indirect, 1.0, Some(1)),
            Err(Rejection::BoundaryLayer)
        );
        assert_eq!(
            net.add_connection(h, i, ConnectionKind::Indirect, 1.0, Some(1)),
            Err(Rejection::BoundaryLayer)
        );
        assert_eq!(net.connection_count(), 0);
    }

    #[test]
    fn test_crosslayer_scope_allows_skips() {
        let mut net = Network::new(
            &[1, 1, 1],
            Activation::Linear,
            constraints(ConnectionScope::Crosslayer, &[], false),
        )
        .unwrap();
        let (i, o) = (net.input_neurons()[0], net.output_neurons()[0]);
        assert!(net.add_connection(i, o, ConnectionKind::Feedforward, 1.0, None).is_ok());
    }

    #[test]
    fn test_delay_rules() {
        let (mut net, i, h, _) = chain(false);
        assert_eq!(
            net.add_connection(h, h, ConnectionKind::Direct, 0.5, Some(0)),
            Err(Rejection::InvalidDelay(Some(0)))
        );
        let rec = net.add_connection(h, h, ConnectionKind::Direct, 0.5, None).unwrap();
        assert_eq!(net.connection(rec).unwrap().delay(), Some(1));

        net.set_delay(rec, 4).unwrap();
        assert_eq!(net.connection(rec).unwrap().buffer().len(), 4);

        let ff = net.find_enabled(i, h, ConnectionKind::Feedforward).unwrap();
        assert_eq!(net.set_delay(ff, 2), Err(Rejection::InvalidDelay(Some(2))));
        assert!(net.check_invariants().is_ok());
    }

    #[test]
    fn test_remove_only_hidden_neuron_keep_connected() {
        let (mut net, _, h, _) = chain(true);
        let before = net.summary();

        let err = net.remove_neuron(h).unwrap_err();
        assert!(matches!(err, Rejection::WouldOrphan(_)));
        assert_eq!(net.summary(), before);
        assert!(net.neuron(h).is_some());
    }

    #[test]
    fn test_remove_neuron_cascades() {
        let (mut net, _, h, _) = chain(false);
        net.add_connection(h, h, ConnectionKind::Direct, 0.5, Some(2)).unwrap();
        net.remove_neuron(h).unwrap();
        assert_eq!(net.connection_count(), 0);
        assert!(net.layers()[1].is_empty());
        assert!(net.check_invariants().is_ok());
    }

    #[test]
    fn test_boundary_neurons_cannot_be_removed() {
        let (mut net, i, _, o) = chain(false);
        assert_eq!(net.remove_neuron(i), Err(Rejection::BoundaryLayer));
        assert_eq!(net.remove_neuron(o), Err(Rejection::BoundaryLayer));
        assert_eq!(net.add_neuron(0, Activation::Tanh, 0.0), Err(Rejection::BoundaryLayer));
    }

    #[test]
    fn test_self_loop_does_not_count_as_connected() {
        let (mut net, i, h, _) = chain(true);
        net.add_connection(h, h, ConnectionKind::Direct, 0.5, None).unwrap();
        let ff = net.find_enabled(i, h, ConnectionKind::Feedforward).unwrap();
        assert!(matches!(net.remove_connection(ff), Err(Rejection::WouldOrphan(_))));

        // the self-loop itself is always removable
        let rec = net.find_enabled(h, h, ConnectionKind::Direct).unwrap();
        assert!(net.removable_connections().contains(&rec));
        assert!(net.remove_connection(rec).is_ok());
    }

    #[test]
    fn test_caps() {
        let mut net = Network::new(
            &[2, 0, 1],
            Activation::Tanh,
            TopologyConstraints {
                max_neurons: Some(2),
                max_connections: Some(1),
                ..TopologyConstraints::default()
            },
        )
        .unwrap();
        let h = net.add_neuron(1, Activation::Tanh, 0.0).unwrap();
        assert_eq!(net.add_neuron(1, Activation::Tanh, 0.0), Err(Rejection::NeuronCapExceeded(2)));

        let inputs = net.input_neurons().to_vec();
        net.add_connection(inputs[0], h, ConnectionKind::Feedforward, 1.0, None).unwrap();
        assert_eq!(
            net.add_connection(inputs[1], h, ConnectionKind::Feedforward, 1.0, None),
            Err(Rejection::ConnectionCapExceeded(1))
        );
    }

    #[test]
    fn test_disable_and_reenable() {
        let (mut net, i, h, _) = chain(false);
        let ff = net.find_enabled(i, h, ConnectionKind::Feedforward).unwrap();
        net.set_connection_enabled(ff, false).unwrap();
        assert_eq!(net.enabled_connection_count(), 1);

        // a fresh duplicate blocks re-enabling the old edge
        net.add_connection(i, h, ConnectionKind::Feedforward, 0.2, None).unwrap();
        assert!(matches!(
            net.set_connection_enabled(ff, true),
            Err(Rejection::DuplicateEdge { .. })
        ));
        assert!(net.check_invariants().is_ok());
    }

    #[test]
    fn test_insert_hidden_layer() {
        let mut net = Network::new(&[1, 1], Activation::Tanh, TopologyConstraints::default()).unwrap();
        let (i, o) = (net.input_neurons()[0], net.output_neurons()[0]);
        net.add_connection(i, o, ConnectionKind::Feedforward, 1.0, None).unwrap();

        let index = net.insert_hidden_layer(NeuronDynamics::Standard);
        assert_eq!(index, 1);
        assert_eq!(net.layer_count(), 3);
        assert_eq!(net.neuron(o).unwrap().layer, 2);
        assert!(net.check_invariants().is_ok());
    }

    #[test]
    fn test_adjacency_skips_empty_layers() {
        let mut net = Network::new(&[1, 0, 1], Activation::Tanh, TopologyConstraints::default()).unwrap();
        let (i, o) = (net.input_neurons()[0], net.output_neurons()[0]);
        net.add_connection(i, o, ConnectionKind::Feedforward, 1.0, None).unwrap();

        // once the middle layer is populated, new skip edges are refused
        let h = net.add_neuron(1, Activation::Tanh, 0.0).unwrap();
        // the existing skip edge was legal when created and stays so
        assert!(net.find_enabled(i, o, ConnectionKind::Feedforward).is_some());
        assert!(net.check_invariants().is_ok());
        net.remove_connection(net.find_enabled(i, o, ConnectionKind::Feedforward).unwrap()).unwrap();
        assert!(matches!(
            net.add_connection(i, o, ConnectionKind::Feedforward, 1.0, None),
            Err(Rejection::IllegalDirection { .. })
        ));
        assert!(net.add_connection(i, h, ConnectionKind::Feedforward, 1.0, None).is_ok());
        assert!(net.check_invariants().is_ok());
    }

    #[test]
    fn test_candidate_edges_exclude_present() {
        let (net, i, h, o) = chain(false);
        let candidates = net.candidate_edges();
        assert!(!candidates.contains(&(i, h, ConnectionKind::Feedforward)));
        assert!(!candidates.contains(&(h, o, ConnectionKind::Feedforward)));
        assert_eq!(candidates, vec![(h, h, ConnectionKind::Direct)]);
    }

    #[test]
    fn test_serialization() {
        let (mut net, _, h, _) = chain(false);
        net.add_connection(h, h, ConnectionKind::Direct, 0.5, Some(3)).unwrap();
        let bytes = bincode::serialize(&net).unwrap();
        let restored: Network = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.summary(), net.summary());
        assert!(restored.check_invariants().is_ok());
    }
}
