//! Error types.
//!
//! Configuration and evaluation errors are fatal to the call that raised them.
//! [`Rejection`] is different: structural operators collect rejections in their
//! outcome and carry on, so a rejected edit only ever degrades to a no-op.

use crate::neural::{ConnectionId, ConnectionKind, NeuronId, RecurrentKind};
use thiserror::Error;

/// Malformed or contradictory configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid configuration: {0}")]
    Invalid(String),

    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::Invalid(msg.into())
    }
}

/// Why a structural edit was refused. The network is unchanged whenever one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("an enabled {kind:?} connection {source_id} -> {target} already exists")]
    DuplicateEdge {
        source_id: NeuronId,
        target: NeuronId,
        kind: ConnectionKind,
    },

    #[error("neuron cap of {0} reached")]
    NeuronCapExceeded(usize),

    #[error("connection cap of {0} reached")]
    ConnectionCapExceeded(usize),

    #[error("edit would leave neuron {0} disconnected")]
    WouldOrphan(NeuronId),

    #[error("recurrent kind {0:?} is not allowed")]
    DisallowedKind(RecurrentKind),

    #[error("input and output layers are fixed")]
    BoundaryLayer,

    #[error("{kind:?} connection {source_id} -> {target} is not legal for this topology")]
    IllegalDirection {
        source_id: NeuronId,
        target: NeuronId,
        kind: ConnectionKind,
    },

    #[error("invalid delay {0:?} for this connection kind")]
    InvalidDelay(Option<u32>),

    #[error("unknown neuron {0}")]
    UnknownNeuron(NeuronId),

    #[error("unknown connection {0}")]
    UnknownConnection(ConnectionId),

    #[error("unknown layer {0}")]
    UnknownLayer(usize),

    #[error("no eligible target for this operator")]
    NoEligibleTarget,
}

/// A call to the execution engine that cannot be carried out.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("expected {expected} inputs, got {found}")]
    InputArity { expected: usize, found: usize },

    #[error("at least one execution step is required")]
    ZeroSteps,

    #[error("parameter vector has length {found}, network has {expected} parameters")]
    ParameterLength { expected: usize, found: usize },
}

/// A broken graph invariant, reported by [`crate::Network::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("duplicate enabled connection {0} -> {1} ({2:?})")]
    DuplicateEdge(NeuronId, NeuronId, ConnectionKind),

    #[error("connection {0} has an illegal direction for its kind or scope")]
    IllegalDirection(ConnectionId),

    #[error("connection {0} uses a recurrent kind that is not allowed")]
    DisallowedKind(ConnectionId),

    #[error("connection {0} touches a fixed boundary layer")]
    BoundaryLayer(ConnectionId),

    #[error("connection {0} has delay {1:?} with a buffer of length {2}")]
    DelayMismatch(ConnectionId, Option<u32>, usize),

    #[error("connection {0} refers to a missing neuron")]
    DanglingConnection(ConnectionId),

    #[error("neuron {0} is listed in layer {1} but stored elsewhere")]
    LayerMismatch(NeuronId, usize),

    #[error("{0} non-input neurons exceed the cap of {1}")]
    NeuronCap(usize, usize),

    #[error("{0} enabled connections exceed the cap of {1}")]
    ConnectionCap(usize, usize),
}

/// Errors that can occur while saving or loading a network checkpoint.
#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("invalid format: {0}")]
    InvalidFormat(String),

    #[error("version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}
