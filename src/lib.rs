//! # EvoNet
//!
//! Evolvable layered neural networks for neuroevolution.
//!
//! ## Features
//!
//! - **Structural evolution**: neurons and connections are added and removed
//!   by mutation operators that never break the graph invariants
//! - **Recurrence**: self, lateral and backward connections with per-connection
//!   delay lines, evaluated over multiple timesteps
//! - **Parallel**: independent networks are evaluated across all cores via Rayon
//! - **Configurable**: YAML configuration files
//! - **Reproducible**: every stochastic operation takes a caller-supplied RNG
//!
//! ## Quick Start
//!
//! ```rust
//! use evonet::{Config, Network};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = Config::default();
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//!
//! let mut net = Network::initialize(&config.network, &mut rng).unwrap();
//! let output = net.forward(&[0.5, -0.5], 3).unwrap();
//! assert_eq!(output.len(), 1);
//!
//! // Offspring start from a copy with cleared temporal state
//! let mut child = net.clone();
//! child.mutate(&config.network, &mut rng);
//! assert!(child.check_invariants().is_ok());
//! ```
//!
//! ## Checkpoints
//!
//! ```rust,no_run
//! use evonet::checkpoint::NetworkCheckpoint;
//! use evonet::{Config, Network};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let config = Config::default();
//! let net = Network::initialize(&config.network, &mut ChaCha8Rng::seed_from_u64(1)).unwrap();
//!
//! NetworkCheckpoint::new(net, 0, Some(1)).save("network.bin").unwrap();
//! let loaded = NetworkCheckpoint::load("network.bin").unwrap();
//! println!("{}", loaded.network.summary());
//! ```

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod evolution;
pub mod neural;

// Re-export main types
pub use config::{Config, NetworkConfig};
pub use error::{CheckpointError, ConfigError, EvaluationError, InvariantViolation, Rejection};
pub use evolution::{MutationControl, MutationSchedule};
pub use neural::{
    forward_batch, Activation, ConnectionId, ConnectionKind, ConnectionScope, MutationOutcome, Network, NeuronDynamics,
    NeuronId, ParameterOutcome, RecurrentKind, StructuralOperator, StructuralOutcome, TopologySummary,
};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build a network from a configuration record.
pub fn initialize<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Network, ConfigError> {
    Network::initialize(config, rng)
}

/// Reproducible RNG for a seed, or a randomly seeded one.
pub fn seeded_rng(seed: Option<u64>) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed.unwrap_or_else(rand::random))
}
