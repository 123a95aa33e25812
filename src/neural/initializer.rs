//! Building networks from configuration.
//!
//! Three topology presets are supported (see [`TopologyPreset`]). Density is
//! applied to the full set of scope-legal edges first; the connection cap is
//! enforced afterwards and simply stops edge creation early.

use super::network::{ConnectionKind, Network, NeuronId, NeuronRole, RecurrentKind};
use crate::config::{Bounds, DelayConfig, NetworkConfig, ParamInit, TopologyPreset};
use crate::error::{ConfigError, Rejection};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Self-loop weight used by the identity preset
pub const IDENTITY_SELF_WEIGHT: f32 = 1.0;
/// Standard deviation of "near-zero" weights
pub const NEAR_ZERO_STD: f32 = 0.01;
/// Weight initializer used when none is configured
pub const DEFAULT_WEIGHT_INIT: ParamInit = ParamInit::Normal { std: 0.5 };

/// Draw one value from `init`, clamped to `bounds`.
pub fn sample_param<R: Rng + ?Sized>(init: ParamInit, bounds: Bounds, rng: &mut R) -> f32 {
    let (lo, hi) = bounds;
    let value = match init {
        ParamInit::Normal { std } => gaussian(std, rng),
        ParamInit::Uniform => rng.gen_range(lo..=hi),
        ParamInit::Zero => 0.0,
        ParamInit::Fixed { value } => value,
    };
    value.clamp(lo, hi)
}

/// Zero-mean Gaussian sample; a non-positive `std` yields 0.
pub fn gaussian<R: Rng + ?Sized>(std: f32, rng: &mut R) -> f32 {
    match Normal::new(0.0, std) {
        Ok(dist) if std > 0.0 => dist.sample(rng),
        _ => 0.0,
    }
}

pub fn sample_delay<R: Rng + ?Sized>(config: DelayConfig, rng: &mut R) -> u32 {
    match config {
        DelayConfig::Fixed { value } => value.max(1),
        DelayConfig::Uniform { min, max } => rng.gen_range(min.max(1)..=max.max(min.max(1))),
    }
}

/// Number of edges a fraction selects out of `available`; at least one when any exist.
pub(crate) fn fraction_of(available: usize, fraction: f32) -> usize {
    if available == 0 || fraction <= 0.0 {
        return 0;
    }
    ((available as f32 * fraction).round() as usize).clamp(1, available)
}

impl Network {
    /// Build a network from a configuration record.
    ///
    /// The configuration is validated first. Biases of non-input neurons and all
    /// weights are drawn from their initializers and clamped to the init bounds;
    /// recurrent connections receive a delay from the delay policy.
    pub fn initialize<R: Rng + ?Sized>(config: &NetworkConfig, rng: &mut R) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut net = Network::from_layout(
            &config.dim,
            &config.activations(),
            &config.dynamics(),
            config.connectivity.constraints(),
        )?;

        let bias_init = config.bias.initializer.unwrap_or(ParamInit::Zero);
        let bias_bounds = config.bias.effective_init_bounds();
        for neuron in net.neurons_mut() {
            if neuron.role != NeuronRole::Input {
                neuron.bias = sample_param(bias_init, bias_bounds, rng);
            }
        }

        match config.initializer {
            TopologyPreset::Unconnected => {}
            TopologyPreset::Default => net.wire_initial(config, false, rng),
            TopologyPreset::Identity => net.wire_initial(config, true, rng),
        }

        log::debug!(
            "initialized network: layers {:?}, {} connections",
            net.summary().layer_sizes,
            net.enabled_connection_count()
        );
        Ok(net)
    }

    fn wire_initial<R: Rng + ?Sized>(&mut self, config: &NetworkConfig, identity: bool, rng: &mut R) {
        let conn = &config.connectivity;
        let weight_bounds = config.weights.effective_init_bounds();
        let weight_init = if identity {
            ParamInit::Normal { std: NEAR_ZERO_STD }
        } else {
            config.weights.initializer.unwrap_or(DEFAULT_WEIGHT_INIT)
        };

        let (mut feedforward, recurrent): (Vec<_>, Vec<_>) =
            self.candidate_edges().into_iter().partition(|(_, _, kind)| !kind.is_recurrent());

        feedforward.shuffle(rng);
        let take = fraction_of(feedforward.len(), conn.density);
        let mut chosen: Vec<_> = feedforward.into_iter().take(take).collect();

        // Identity wires a self-loop on every hidden neuron; the rate covers the rest
        let mut self_loops = Vec::new();
        for kind in &self.constraints().allowed_recurrent {
            let mut of_kind: Vec<_> = recurrent
                .iter()
                .copied()
                .filter(|(_, _, k)| *k == ConnectionKind::from(*kind))
                .collect();
            if identity && *kind == RecurrentKind::Direct {
                self_loops = of_kind;
                continue;
            }
            of_kind.shuffle(rng);
            let take = fraction_of(of_kind.len(), conn.recurrent_density);
            chosen.extend(of_kind.into_iter().take(take));
        }
        chosen.sort();
        self_loops.sort();

        let mut planned = self_loops
            .into_iter()
            .map(|edge| (edge, IDENTITY_SELF_WEIGHT.clamp(weight_bounds.0, weight_bounds.1)))
            .chain(chosen.into_iter().map(|edge| (edge, sample_param(weight_init, weight_bounds, rng))))
            .collect::<Vec<((NeuronId, NeuronId, ConnectionKind), f32)>>()
            .into_iter();

        while let Some(((source, target, kind), weight)) = planned.next() {
            let delay = kind.is_recurrent().then(|| sample_delay(config.delay, rng));
            match self.add_connection(source, target, kind, weight, delay) {
                Ok(_) => {}
                Err(Rejection::ConnectionCapExceeded(cap)) => {
                    log::debug!("connection cap {} reached during init, {} planned edges skipped", cap, planned.len() + 1);
                    break;
                }
                Err(reason) => log::trace!("init edge {} -> {} skipped: {}", source, target, reason),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ActivationSpec, ConnectivityConfig};
    use crate::neural::{Activation, ConnectionScope};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn config(dim: &[usize]) -> NetworkConfig {
        NetworkConfig {
            dim: dim.to_vec(),
            activation: ActivationSpec::Single(Activation::Tanh),
            connectivity: ConnectivityConfig {
                max_neurons: None,
                max_connections: None,
                keep_connected: false,
                ..ConnectivityConfig::default()
            },
            mutation: None,
            structural: None,
            ..NetworkConfig::default()
        }
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_full_density_adjacent() {
        let net = Network::initialize(&config(&[2, 3, 1]), &mut rng()).unwrap();
        assert_eq!(net.enabled_connection_count(), 2 * 3 + 3);
        assert!(!net.has_recurrence());
        assert!(net.check_invariants().is_ok());
    }

    #[test]
    fn test_full_density_crosslayer() {
        let mut cfg = config(&[2, 3, 1]);
        cfg.connectivity.scope = ConnectionScope::Crosslayer;
        let net = Network::initialize(&cfg, &mut rng()).unwrap();
        assert_eq!(net.enabled_connection_count(), 2 * 3 + 3 + 2);
    }

    #[test]
    fn test_partial_density() {
        let mut cfg = config(&[2, 3, 1]);
        cfg.connectivity.density = 0.5;
        let net = Network::initialize(&cfg, &mut rng()).unwrap();
        assert_eq!(net.enabled_connection_count(), 5);
    }

    #[test]
    fn test_empty_hidden_layer_wires_inputs_to_output() {
        let net = Network::initialize(&config(&[2, 0, 1]), &mut rng()).unwrap();
        let o = net.output_neurons()[0];
        assert_eq!(net.enabled_in_degree(o), 2);
    }

    #[test]
    fn test_unconnected_preset() {
        let mut cfg = config(&[3, 4, 2]);
        cfg.initializer = TopologyPreset::Unconnected;
        let net = Network::initialize(&cfg, &mut rng()).unwrap();
        assert_eq!(net.connection_count(), 0);
        assert_eq!(net.neuron_count(), 9);
    }

    #[test]
    fn test_recurrent_rate_and_delay() {
        let mut cfg = config(&[2, 3, 1]);
        cfg.connectivity.recurrent = vec![RecurrentKind::Direct, RecurrentKind::Local];
        cfg.connectivity.recurrent_density = 1.0;
        cfg.delay = DelayConfig::Fixed { value: 2 };
        let net = Network::initialize(&cfg, &mut rng()).unwrap();

        let direct = net.recurrent_connections().filter(|c| c.kind == ConnectionKind::Direct).count();
        let local = net.recurrent_connections().filter(|c| c.kind == ConnectionKind::Local).count();
        assert_eq!(direct, 3);
        assert_eq!(local, 6);
        assert!(net.recurrent_connections().all(|c| c.delay() == Some(2)));
        assert!(net.check_invariants().is_ok());
    }

    #[test]
    fn test_identity_preset() {
        let mut cfg = config(&[2, 3, 1]);
        cfg.initializer = TopologyPreset::Identity;
        cfg.connectivity.recurrent = vec![RecurrentKind::Direct];
        let net = Network::initialize(&cfg, &mut rng()).unwrap();

        for h in net.hidden_neurons() {
            let loop_id = net.find_enabled(h.id, h.id, ConnectionKind::Direct).unwrap();
            assert_eq!(net.connection(loop_id).unwrap().weight, IDENTITY_SELF_WEIGHT);
        }
        assert!(net
            .connections()
            .filter(|c| !c.is_self_loop())
            .all(|c| c.weight.abs() < 0.1));
    }

    #[test]
    fn test_values_within_init_bounds() {
        let mut cfg = config(&[4, 6, 3]);
        cfg.weights.initializer = Some(ParamInit::Normal { std: 5.0 });
        cfg.weights.init_bounds = Some((-0.2, 0.3));
        cfg.bias.initializer = Some(ParamInit::Uniform);
        let net = Network::initialize(&cfg, &mut rng()).unwrap();

        assert!(net.connections().all(|c| (-0.2..=0.3).contains(&c.weight)));
        let (lo, hi) = cfg.bias.bounds;
        assert!(net.neurons().all(|n| (lo..=hi).contains(&n.bias)));
        assert!(net.neurons().filter(|n| n.role == NeuronRole::Input).all(|n| n.bias == 0.0));
    }

    #[test]
    fn test_connection_cap_stops_creation() {
        let mut cfg = config(&[3, 4, 2]);
        cfg.connectivity.max_connections = Some(5);
        let net = Network::initialize(&cfg, &mut rng()).unwrap();
        assert_eq!(net.enabled_connection_count(), 5);
        assert!(net.check_invariants().is_ok());
    }

    #[test]
    fn test_same_seed_same_network() {
        let cfg = config(&[3, 4, 2]);
        let a = Network::initialize(&cfg, &mut rng()).unwrap();
        let b = Network::initialize(&cfg, &mut rng()).unwrap();
        let wa: Vec<f32> = a.connections().map(|c| c.weight).collect();
        let wb: Vec<f32> = b.connections().map(|c| c.weight).collect();
        assert_eq!(wa, wb);
        assert_eq!(a.summary(), b.summary());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut cfg = config(&[2, 1]);
        cfg.connectivity.density = 1.5;
        assert!(Network::initialize(&cfg, &mut rng()).is_err());
    }
}
