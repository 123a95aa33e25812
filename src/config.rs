//! Configuration for EvoNet networks and their mutation operators.
//!
//! Supports YAML configuration files with sensible defaults. Every record is
//! checked by [`Config::validate`] / [`NetworkConfig::validate`] before a network
//! is built, so contradictory settings surface as [`ConfigError`] up front.

use crate::error::ConfigError;
use crate::evolution::MutationSchedule;
use crate::neural::{Activation, ConnectionScope, NeuronDynamics, RecurrentKind, TopologyConstraints};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Seed for the network's random stream; random when absent
    #[serde(default)]
    pub seed: Option<u64>,
    pub network: NetworkConfig,
    /// Per-generation control of parameter mutation
    #[serde(default)]
    pub schedule: Option<MutationSchedule>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// Network layout, initialization and mutation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Layer sizes: input, hidden..., output
    pub dim: Vec<usize>,
    #[serde(default)]
    pub activation: ActivationSpec,
    /// Whitelist for hidden-neuron activations
    #[serde(default)]
    pub activations_allowed: Option<Vec<Activation>>,
    #[serde(default)]
    pub initializer: TopologyPreset,
    pub connectivity: ConnectivityConfig,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub bias: BiasConfig,
    #[serde(default)]
    pub delay: DelayConfig,
    /// One entry per layer, written `standard` or `leaky: {alpha: ..}`
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub neuron_dynamics: Option<Vec<NeuronDynamics>>,
    #[serde(default)]
    pub mutation: Option<ParameterMutationConfig>,
    #[serde(default)]
    pub structural: Option<StructuralMutationConfig>,
}

/// A single activation for every layer, or one per layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivationSpec {
    Single(Activation),
    PerLayer(Vec<Activation>),
}

impl Default for ActivationSpec {
    fn default() -> Self {
        ActivationSpec::Single(Activation::Tanh)
    }
}

impl ActivationSpec {
    pub fn for_layer(&self, layer: usize) -> Activation {
        match self {
            ActivationSpec::Single(a) => *a,
            ActivationSpec::PerLayer(list) => list.get(layer).copied().unwrap_or_default(),
        }
    }
}

/// Starting connectivity of a freshly initialized network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopologyPreset {
    /// Feedforward edges by scope and density plus recurrent edges by rate
    #[default]
    Default,
    /// All neurons, no connections
    Unconnected,
    /// Like default, with unit self-loops and near-zero remaining weights
    Identity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    pub scope: ConnectionScope,
    /// Fraction of scope-legal feedforward edges created at init (0, 1]
    pub density: f32,
    /// Allowed recurrent kinds
    #[serde(default)]
    pub recurrent: Vec<RecurrentKind>,
    /// Fraction of legal recurrent edges created at init, per allowed kind
    #[serde(default = "default_recurrent_density")]
    pub recurrent_density: f32,
    #[serde(default)]
    pub max_neurons: Option<usize>,
    #[serde(default)]
    pub max_connections: Option<usize>,
    #[serde(default)]
    pub keep_connected: bool,
}

fn default_recurrent_density() -> f32 {
    0.1
}

impl ConnectivityConfig {
    pub fn constraints(&self) -> TopologyConstraints {
        let mut allowed = self.recurrent.clone();
        allowed.sort();
        allowed.dedup();
        TopologyConstraints {
            scope: self.scope,
            allowed_recurrent: allowed,
            max_neurons: self.max_neurons,
            max_connections: self.max_connections,
            keep_connected: self.keep_connected,
        }
    }
}

/// Distribution used to fill weights or biases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParamInit {
    Normal { std: f32 },
    /// Uniform over the init bounds
    Uniform,
    Zero,
    Fixed { value: f32 },
}

pub type Bounds = (f32, f32);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightsConfig {
    /// `None` leaves the choice to the topology preset
    #[serde(default)]
    pub initializer: Option<ParamInit>,
    /// Hard bounds during mutation
    pub bounds: Bounds,
    /// Clipping bounds at init; must lie within `bounds`
    #[serde(default)]
    pub init_bounds: Option<Bounds>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasConfig {
    #[serde(default)]
    pub initializer: Option<ParamInit>,
    pub bounds: Bounds,
    #[serde(default)]
    pub init_bounds: Option<Bounds>,
}

impl WeightsConfig {
    pub fn effective_init_bounds(&self) -> Bounds {
        self.init_bounds.unwrap_or(self.bounds)
    }
}

impl BiasConfig {
    pub fn effective_init_bounds(&self) -> Bounds {
        self.init_bounds.unwrap_or(self.bounds)
    }
}

/// Initial delay of recurrent connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "initializer", rename_all = "snake_case")]
pub enum DelayConfig {
    Fixed { value: u32 },
    /// Inclusive range
    Uniform { min: u32, max: u32 },
}

/// Parameter mutation channels; each is gated independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterMutationConfig {
    pub weights: GaussianMutation,
    /// Falls back to `weights` when absent
    #[serde(default)]
    pub biases: Option<GaussianMutation>,
    #[serde(default)]
    pub activations: Option<ActivationMutation>,
    #[serde(default)]
    pub delay: Option<DelayMutationConfig>,
}

impl ParameterMutationConfig {
    pub fn bias_channel(&self) -> &GaussianMutation {
        self.biases.as_ref().unwrap_or(&self.weights)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GaussianMutation {
    /// Probability that this channel fires in a mutation event
    pub probability: f32,
    /// Standard deviation of the added noise
    pub strength: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivationMutation {
    pub probability: f32,
    /// Overrides the network-wide `activations_allowed`
    #[serde(default)]
    pub allowed: Option<Vec<Activation>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DelayMutationMode {
    /// Move by +/- delta, clamped to bounds
    DeltaStep,
    /// Redraw uniformly within bounds
    Resample,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DelayMutationConfig {
    pub probability: f32,
    pub mode: DelayMutationMode,
    #[serde(default = "default_delay_delta")]
    pub delta: u32,
    /// Inclusive bounds
    pub bounds: (u32, u32),
}

fn default_delay_delta() -> u32 {
    1
}

/// How the weights of structurally added connections are chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightInit {
    /// Draw from the network's weight initializer
    #[default]
    Random,
    Zero,
    /// Small normal noise around zero
    NearZero,
    /// Create no connections (add-neuron only)
    None,
}

/// Structural operators, tried in the order add-neuron, remove-neuron,
/// add-connection, remove-connection; the first gate that fires is the only
/// operator applied in that event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructuralMutationConfig {
    #[serde(default)]
    pub add_neuron: Option<AddNeuronConfig>,
    #[serde(default)]
    pub remove_neuron: Option<RemoveNeuronConfig>,
    #[serde(default)]
    pub add_connection: Option<AddConnectionConfig>,
    #[serde(default)]
    pub remove_connection: Option<RemoveConnectionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddNeuronConfig {
    pub probability: f32,
    /// Falls back to the network-wide `activations_allowed`, then to the layer activation
    #[serde(default)]
    pub activations_allowed: Option<Vec<Activation>>,
    #[serde(default)]
    pub init: WeightInit,
    /// Fraction of eligible incoming/outgoing edges wired on insertion
    #[serde(default = "default_init_connection_ratio")]
    pub init_connection_ratio: f32,
}

fn default_init_connection_ratio() -> f32 {
    1.0
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemoveNeuronConfig {
    pub probability: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddConnectionConfig {
    pub probability: f32,
    #[serde(default = "default_max_edits")]
    pub max_new_connections: usize,
    #[serde(default)]
    pub init: WeightInit,
    /// Explicit weight for every new connection; overrides `init`
    #[serde(default)]
    pub weight: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RemoveConnectionConfig {
    pub probability: f32,
    #[serde(default = "default_max_edits")]
    pub max_removed_connections: usize,
}

fn default_max_edits() -> usize {
    1
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            network: NetworkConfig::default(),
            schedule: None,
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            dim: vec![2, 0, 1],
            activation: ActivationSpec::PerLayer(vec![Activation::Linear, Activation::Tanh, Activation::Tanh]),
            activations_allowed: Some(vec![Activation::Tanh, Activation::Relu, Activation::Sigmoid]),
            initializer: TopologyPreset::Default,
            connectivity: ConnectivityConfig::default(),
            weights: WeightsConfig::default(),
            bias: BiasConfig::default(),
            delay: DelayConfig::default(),
            neuron_dynamics: None,
            mutation: Some(ParameterMutationConfig::default()),
            structural: Some(StructuralMutationConfig::default_growth()),
        }
    }
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            scope: ConnectionScope::Adjacent,
            density: 1.0,
            recurrent: Vec::new(),
            recurrent_density: default_recurrent_density(),
            max_neurons: Some(32),
            max_connections: Some(256),
            keep_connected: true,
        }
    }
}

impl Default for WeightsConfig {
    fn default() -> Self {
        Self {
            initializer: Some(ParamInit::Normal { std: 0.5 }),
            bounds: (-1.0, 1.0),
            init_bounds: None,
        }
    }
}

impl Default for BiasConfig {
    fn default() -> Self {
        Self {
            initializer: Some(ParamInit::Zero),
            bounds: (-0.5, 0.5),
            init_bounds: None,
        }
    }
}

impl Default for DelayConfig {
    fn default() -> Self {
        DelayConfig::Fixed { value: 1 }
    }
}

impl Default for ParameterMutationConfig {
    fn default() -> Self {
        Self {
            weights: GaussianMutation {
                probability: 1.0,
                strength: 0.05,
            },
            biases: None,
            activations: None,
            delay: None,
        }
    }
}

impl StructuralMutationConfig {
    /// Moderate growth-biased operator mix.
    pub fn default_growth() -> Self {
        Self {
            add_neuron: Some(AddNeuronConfig {
                probability: 0.05,
                activations_allowed: None,
                init: WeightInit::Random,
                init_connection_ratio: 1.0,
            }),
            remove_neuron: Some(RemoveNeuronConfig { probability: 0.02 }),
            add_connection: Some(AddConnectionConfig {
                probability: 0.1,
                max_new_connections: 2,
                init: WeightInit::NearZero,
                weight: None,
            }),
            remove_connection: Some(RemoveConnectionConfig {
                probability: 0.05,
                max_removed_connections: 1,
            }),
        }
    }
}

fn check_probability(name: &str, p: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&p) {
        return Err(ConfigError::invalid(format!("{name} must be within [0, 1], got {p}")));
    }
    Ok(())
}

fn check_bounds(name: &str, (lo, hi): Bounds) -> Result<(), ConfigError> {
    if !(lo.is_finite() && hi.is_finite()) || lo >= hi {
        return Err(ConfigError::invalid(format!("{name} must satisfy lower < upper")));
    }
    Ok(())
}

fn check_init(name: &str, init: Option<ParamInit>, bounds: Bounds, init_bounds: Option<Bounds>) -> Result<(), ConfigError> {
    check_bounds(&format!("{name}.bounds"), bounds)?;
    if let Some(ib) = init_bounds {
        check_bounds(&format!("{name}.init_bounds"), ib)?;
        if ib.0 < bounds.0 || ib.1 > bounds.1 {
            return Err(ConfigError::invalid(format!("{name}.init_bounds must lie within {name}.bounds")));
        }
    }
    if let Some(ParamInit::Normal { std }) = init {
        if !(std > 0.0) {
            return Err(ConfigError::invalid(format!("{name}.std must be > 0 for a normal initializer")));
        }
    }
    Ok(())
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.network.validate()?;
        if let Some(schedule) = &self.schedule {
            schedule.validate()?;
        }
        Ok(())
    }
}

impl NetworkConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layers = self.dim.len();
        if layers < 2 {
            return Err(ConfigError::invalid("dim must contain at least an input and an output layer"));
        }
        if self.dim[0] == 0 || self.dim[layers - 1] == 0 {
            return Err(ConfigError::invalid("input and output layers must not be empty"));
        }
        if let ActivationSpec::PerLayer(list) = &self.activation {
            if list.len() != layers {
                return Err(ConfigError::invalid("length of the activation list must match dim"));
            }
        }
        if let Some(allowed) = &self.activations_allowed {
            if allowed.is_empty() {
                return Err(ConfigError::invalid("activations_allowed must not be empty"));
            }
        }
        if let Some(dynamics) = &self.neuron_dynamics {
            if dynamics.len() != layers {
                return Err(ConfigError::invalid("length of neuron_dynamics must match dim"));
            }
            for d in dynamics {
                if let NeuronDynamics::Leaky { alpha } = d {
                    if !(*alpha > 0.0 && *alpha <= 1.0) {
                        return Err(ConfigError::invalid("leaky alpha must be within (0, 1]"));
                    }
                }
            }
        }

        let conn = &self.connectivity;
        if !(conn.density > 0.0 && conn.density <= 1.0) {
            return Err(ConfigError::invalid("connectivity.density must be within (0, 1]"));
        }
        check_probability("connectivity.recurrent_density", conn.recurrent_density)?;
        if let Some(cap) = conn.max_neurons {
            let declared: usize = self.dim[1..].iter().sum();
            if declared > cap {
                return Err(ConfigError::invalid(format!(
                    "dim declares {declared} non-input neurons, above max_neurons = {cap}"
                )));
            }
        }

        check_init("weights", self.weights.initializer, self.weights.bounds, self.weights.init_bounds)?;
        check_init("bias", self.bias.initializer, self.bias.bounds, self.bias.init_bounds)?;

        match self.delay {
            DelayConfig::Fixed { value } if value < 1 => {
                return Err(ConfigError::invalid("delay.value must be >= 1"));
            }
            DelayConfig::Uniform { min, max } if min < 1 || max < min => {
                return Err(ConfigError::invalid("delay bounds must satisfy 1 <= min <= max"));
            }
            _ => {}
        }

        if let Some(m) = &self.mutation {
            m.validate()?;
        }
        if let Some(s) = &self.structural {
            s.validate()?;
        }
        Ok(())
    }

    pub fn activations(&self) -> Vec<Activation> {
        (0..self.dim.len()).map(|l| self.activation.for_layer(l)).collect()
    }

    pub fn dynamics(&self) -> Vec<NeuronDynamics> {
        self.neuron_dynamics
            .clone()
            .unwrap_or_else(|| vec![NeuronDynamics::Standard; self.dim.len()])
    }
}

impl ParameterMutationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, channel) in [("mutation.weights", Some(&self.weights)), ("mutation.biases", self.biases.as_ref())] {
            if let Some(g) = channel {
                check_probability(&format!("{name}.probability"), g.probability)?;
                if !(g.strength >= 0.0 && g.strength.is_finite()) {
                    return Err(ConfigError::invalid(format!("{name}.strength must be >= 0")));
                }
            }
        }
        if let Some(a) = &self.activations {
            check_probability("mutation.activations.probability", a.probability)?;
            if a.allowed.as_ref().is_some_and(|l| l.is_empty()) {
                return Err(ConfigError::invalid("mutation.activations.allowed must not be empty"));
            }
        }
        if let Some(d) = &self.delay {
            check_probability("mutation.delay.probability", d.probability)?;
            let (lo, hi) = d.bounds;
            if lo < 1 || hi < lo {
                return Err(ConfigError::invalid("mutation.delay.bounds must satisfy 1 <= min <= max"));
            }
            if d.mode == DelayMutationMode::DeltaStep && d.delta == 0 {
                return Err(ConfigError::invalid("mutation.delay.delta must be >= 1"));
            }
        }
        Ok(())
    }
}

impl StructuralMutationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(a) = &self.add_neuron {
            check_probability("structural.add_neuron.probability", a.probability)?;
            check_probability("structural.add_neuron.init_connection_ratio", a.init_connection_ratio)?;
            if a.activations_allowed.as_ref().is_some_and(|l| l.is_empty()) {
                return Err(ConfigError::invalid("structural.add_neuron.activations_allowed must not be empty"));
            }
        }
        if let Some(r) = &self.remove_neuron {
            check_probability("structural.remove_neuron.probability", r.probability)?;
        }
        if let Some(a) = &self.add_connection {
            check_probability("structural.add_connection.probability", a.probability)?;
            if a.max_new_connections == 0 {
                return Err(ConfigError::invalid("structural.add_connection.max_new_connections must be >= 1"));
            }
            if a.init == WeightInit::None && a.weight.is_none() {
                return Err(ConfigError::invalid("structural.add_connection.init cannot be none"));
            }
        }
        if let Some(r) = &self.remove_connection {
            check_probability("structural.remove_connection.probability", r.probability)?;
            if r.max_removed_connections == 0 {
                return Err(ConfigError::invalid(
                    "structural.remove_connection.max_removed_connections must be >= 1",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded = Config::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.network.dim, loaded.network.dim);
        assert_eq!(config.network.connectivity.scope, loaded.network.connectivity.scope);
    }

    #[test]
    fn test_dynamics_as_plain_maps() {
        let yaml = r#"
network:
  dim: [1, 2, 1]
  connectivity: { scope: adjacent, density: 1.0 }
  neuron_dynamics: [standard, {leaky: {alpha: 0.25}}, standard]
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.network.dynamics()[1], NeuronDynamics::Leaky { alpha: 0.25 });

        let written = serde_yaml::to_string(&config).unwrap();
        assert!(written.contains("leaky:"));
        assert!(!written.contains("!leaky"));
        let reloaded = Config::from_yaml_str(&written).unwrap();
        assert_eq!(reloaded.network.neuron_dynamics, config.network.neuron_dynamics);
    }

    #[test]
    fn test_minimal_yaml() {
        let yaml = r#"
seed: 7
network:
  dim: [4, 6, 2]
  activation: [linear, relu, sigmoid]
  initializer: identity
  connectivity:
    scope: crosslayer
    density: 0.5
    recurrent: [direct, lateral]
  weights:
    initializer: { kind: normal, std: 0.5 }
    bounds: [-1.0, 1.0]
  delay: { initializer: uniform, min: 1, max: 3 }
  neuron_dynamics:
    - standard
    - leaky:
        alpha: 0.25
    - standard
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        let net = &config.network;
        assert_eq!(config.seed, Some(7));
        assert_eq!(net.initializer, TopologyPreset::Identity);
        assert_eq!(net.activation.for_layer(1), Activation::Relu);
        assert_eq!(
            net.connectivity.constraints().allowed_recurrent,
            vec![RecurrentKind::Direct, RecurrentKind::Local]
        );
        assert_eq!(net.delay, DelayConfig::Uniform { min: 1, max: 3 });
        assert_eq!(net.dynamics()[1], NeuronDynamics::Leaky { alpha: 0.25 });
        assert!(net.mutation.is_none());
    }

    #[test]
    fn test_schedule_yaml() {
        let yaml = r#"
network:
  dim: [1, 1]
  connectivity: { scope: adjacent, density: 1.0 }
schedule:
  strategy: exponential_decay
  max_strength: 0.5
  min_strength: 0.05
  max_probability: 1.0
  min_probability: 0.2
  max_generations: 100
"#;
        let config = Config::from_yaml_str(yaml).unwrap();
        assert!(matches!(
            config.schedule,
            Some(MutationSchedule::ExponentialDecay { max_generations: 100, .. })
        ));
    }

    #[test]
    fn test_contradictions_rejected() {
        let mut config = NetworkConfig::default();
        config.dim = vec![3];
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default();
        config.activation = ActivationSpec::PerLayer(vec![Activation::Tanh]);
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default();
        config.connectivity.max_neurons = Some(2);
        config.dim = vec![2, 3, 1];
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default();
        config.weights.init_bounds = Some((-2.0, 0.5));
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default();
        config.delay = DelayConfig::Uniform { min: 3, max: 2 };
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default();
        config.connectivity.density = 0.0;
        assert!(config.validate().is_err());

        let mut config = NetworkConfig::default();
        if let Some(s) = config.structural.as_mut() {
            if let Some(a) = s.add_connection.as_mut() {
                a.init = WeightInit::None;
            }
        }
        assert!(config.validate().is_err());
    }
}
