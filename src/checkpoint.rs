//! Saving and loading networks.
//!
//! Topology, parameters and delays are persisted; delay buffer contents and
//! neuron states are not, so a loaded network always starts a fresh episode.

use crate::error::CheckpointError;
use crate::neural::Network;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

const MAGIC: &[u8; 4] = b"EVNT";

/// A network plus the metadata needed to resume an experiment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NetworkCheckpoint {
    /// Version for compatibility checking
    pub version: u32,
    /// Mutation events applied since initialization
    pub generation: u64,
    /// Seed the network was initialized from
    pub seed: Option<u64>,
    pub network: Network,
}

impl NetworkCheckpoint {
    /// Current checkpoint version
    pub const VERSION: u32 = 1;

    pub fn new(network: Network, generation: u64, seed: Option<u64>) -> Self {
        Self {
            version: Self::VERSION,
            generation,
            seed,
            network,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, CheckpointError> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend(bincode::serialize(self)?);
        Ok(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CheckpointError> {
        let body = bytes
            .strip_prefix(MAGIC.as_slice())
            .ok_or_else(|| CheckpointError::InvalidFormat("Invalid magic bytes".to_string()))?;
        let checkpoint: NetworkCheckpoint = bincode::deserialize(body)?;

        if checkpoint.version != Self::VERSION {
            return Err(CheckpointError::VersionMismatch {
                expected: Self::VERSION,
                found: checkpoint.version,
            });
        }
        checkpoint
            .network
            .check_invariants()
            .map_err(|violation| CheckpointError::InvalidFormat(format!("corrupt network: {}", violation)))?;
        Ok(checkpoint)
    }

    /// Save checkpoint to binary file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), CheckpointError> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&self.to_bytes()?)?;
        writer.flush()?;
        Ok(())
    }

    /// Load checkpoint from binary file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, CheckpointError> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        let mut buffer = Vec::new();
        reader.read_to_end(&mut buffer)?;
        Self::from_bytes(&buffer)
    }

    /// Get approximate size in bytes
    pub fn size_bytes(&self) -> usize {
        bincode::serialized_size(self).unwrap_or(0) as usize + MAGIC.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NetworkConfig;
    use crate::neural::{ConnectionKind, RecurrentKind};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tempfile::tempdir;

    fn recurrent_network() -> Network {
        let mut config = NetworkConfig::default();
        config.dim = vec![2, 3, 1];
        config.connectivity.recurrent = vec![RecurrentKind::Direct];
        config.connectivity.recurrent_density = 1.0;
        Network::initialize(&config, &mut ChaCha8Rng::seed_from_u64(5)).unwrap()
    }

    #[test]
    fn test_checkpoint_roundtrip() {
        let mut network = recurrent_network();
        network.forward(&[0.5, -0.5], 4).unwrap();
        let expected = network.forward(&[1.0, 0.0], 3).unwrap();

        let checkpoint = NetworkCheckpoint::new(network, 12, Some(5));
        let dir = tempdir().unwrap();
        let path = dir.path().join("network.bin");
        checkpoint.save(&path).unwrap();
        let mut loaded = NetworkCheckpoint::load(&path).unwrap();

        assert_eq!(loaded.generation, 12);
        assert_eq!(loaded.seed, Some(5));
        assert_eq!(loaded.network.summary(), checkpoint.network.summary());
        assert!(loaded.network.check_invariants().is_ok());
        assert_eq!(loaded.network.forward(&[1.0, 0.0], 3).unwrap(), expected);
    }

    #[test]
    fn test_buffers_not_persisted() {
        let mut network = recurrent_network();
        network.forward(&[1.0, 1.0], 5).unwrap();

        let bytes = NetworkCheckpoint::new(network, 0, None).to_bytes().unwrap();
        let loaded = NetworkCheckpoint::from_bytes(&bytes).unwrap();
        for conn in loaded.network.connections().filter(|c| c.kind == ConnectionKind::Direct) {
            assert_eq!(conn.buffer().to_vec(), vec![0.0; conn.buffer().len()]);
        }
        assert!(loaded.network.neurons().all(|n| n.last_output() == 0.0));
    }

    #[test]
    fn test_rejects_foreign_files() {
        let result = NetworkCheckpoint::from_bytes(b"NOPExxxx");
        assert!(matches!(result, Err(CheckpointError::InvalidFormat(_))));
    }

    #[test]
    fn test_rejects_network_breaking_invariants() {
        let mut network = recurrent_network();
        let cid = network
            .connections()
            .find(|c| c.kind == ConnectionKind::Feedforward)
            .map(|c| c.id)
            .unwrap();
        if let Some(conn) = network.connection_mut(cid) {
            conn.kind = ConnectionKind::Direct;
        }

        let bytes = NetworkCheckpoint::new(network, 0, None).to_bytes().unwrap();
        assert!(matches!(
            NetworkCheckpoint::from_bytes(&bytes),
            Err(CheckpointError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_version_mismatch() {
        let mut checkpoint = NetworkCheckpoint::new(recurrent_network(), 0, None);
        checkpoint.version = 99;
        let bytes = checkpoint.to_bytes().unwrap();
        assert!(matches!(
            NetworkCheckpoint::from_bytes(&bytes),
            Err(CheckpointError::VersionMismatch { expected: 1, found: 99 })
        ));
    }

    #[test]
    fn test_checkpoint_size() {
        let checkpoint = NetworkCheckpoint::new(recurrent_network(), 0, None);
        let size = checkpoint.size_bytes();
        assert!(size > 4);
        assert!(size < 100_000);
    }
}
