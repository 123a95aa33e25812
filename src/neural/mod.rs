//! Evolvable layered networks.
//!
//! - Id-keyed graph store with structural rules enforced on every edit
//! - Multi-step execution with per-connection delay lines
//! - Topology presets for initialization
//! - Structural and parameter mutation operators

mod activation;
mod delay;
mod execution;
mod initializer;
mod mutations;
mod network;
mod params;
mod structural;

pub use activation::{Activation, NeuronDynamics, NeuronState};
pub use delay::DelayBuffer;
pub use execution::forward_batch;
pub use initializer::{IDENTITY_SELF_WEIGHT, NEAR_ZERO_STD};
pub use mutations::{MutationOutcome, ParameterOutcome};
pub use network::{
    Connection, ConnectionId, ConnectionKind, ConnectionScope, Layer, Network, Neuron, NeuronId, NeuronRole,
    RecurrentKind, TopologyConstraints, TopologySummary,
};
pub use structural::{StructuralOperator, StructuralOutcome};
