//! Per-generation control of parameter mutation strength and probability.

use crate::config::ParameterMutationConfig;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Smoothing factor of the diversity moving average.
pub const DIVERSITY_EMA_ALPHA: f32 = 0.1;

/// How mutation strength and probability evolve across generations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum MutationSchedule {
    Constant {
        strength: f32,
        probability: f32,
    },
    /// Geometric decay from the max values to the min values over `max_generations`
    ExponentialDecay {
        max_strength: f32,
        min_strength: f32,
        max_probability: f32,
        min_probability: f32,
        max_generations: u32,
    },
    /// Diversity-driven adaptation
    AdaptiveGlobal {
        strength: f32,
        probability: f32,
        min_strength: f32,
        max_strength: f32,
        min_probability: f32,
        max_probability: f32,
        increase_factor: f32,
        decrease_factor: f32,
        min_diversity: f32,
        max_diversity: f32,
    },
}

impl MutationSchedule {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = match *self {
            MutationSchedule::Constant { strength, probability } => {
                strength >= 0.0 && (0.0..=1.0).contains(&probability)
            }
            MutationSchedule::ExponentialDecay {
                max_strength,
                min_strength,
                max_probability,
                min_probability,
                max_generations,
            } => {
                min_strength > 0.0
                    && min_strength <= max_strength
                    && min_probability > 0.0
                    && min_probability <= max_probability
                    && max_probability <= 1.0
                    && max_generations > 0
            }
            MutationSchedule::AdaptiveGlobal {
                strength,
                probability,
                min_strength,
                max_strength,
                min_probability,
                max_probability,
                increase_factor,
                decrease_factor,
                min_diversity,
                max_diversity,
            } => {
                (min_strength..=max_strength).contains(&strength)
                    && (min_probability..=max_probability).contains(&probability)
                    && min_probability >= 0.0
                    && max_probability <= 1.0
                    && increase_factor >= 1.0
                    && decrease_factor > 0.0
                    && decrease_factor <= 1.0
                    && min_diversity <= max_diversity
            }
        };
        if ok {
            Ok(())
        } else {
            Err(ConfigError::invalid(format!("inconsistent mutation schedule: {:?}", self)))
        }
    }
}

/// Running state of a [`MutationSchedule`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MutationControl {
    schedule: MutationSchedule,
    strength: f32,
    probability: f32,
    diversity_ema: Option<f32>,
}

impl MutationControl {
    pub fn new(schedule: MutationSchedule) -> Self {
        let (strength, probability) = match schedule {
            MutationSchedule::Constant { strength, probability } => (strength, probability),
            MutationSchedule::ExponentialDecay {
                max_strength,
                max_probability,
                ..
            } => (max_strength, max_probability),
            MutationSchedule::AdaptiveGlobal {
                strength, probability, ..
            } => (strength, probability),
        };
        Self {
            schedule,
            strength,
            probability,
            diversity_ema: None,
        }
    }

    pub fn strength(&self) -> f32 {
        self.strength
    }

    pub fn probability(&self) -> f32 {
        self.probability
    }

    pub fn diversity_ema(&self) -> Option<f32> {
        self.diversity_ema
    }

    /// True when [`MutationControl::update`] expects a population diversity value.
    pub fn needs_diversity(&self) -> bool {
        matches!(self.schedule, MutationSchedule::AdaptiveGlobal { .. })
    }

    /// Advance to `generation`. `diversity` is only used by the adaptive schedule.
    pub fn update(&mut self, generation: u32, diversity: Option<f32>) {
        match self.schedule {
            MutationSchedule::Constant { .. } => {}
            MutationSchedule::ExponentialDecay {
                max_strength,
                min_strength,
                max_probability,
                min_probability,
                max_generations,
            } => {
                self.strength = exp_decay(generation, max_generations, max_strength, min_strength);
                self.probability = exp_decay(generation, max_generations, max_probability, min_probability);
            }
            MutationSchedule::AdaptiveGlobal {
                min_strength,
                max_strength,
                min_probability,
                max_probability,
                increase_factor,
                decrease_factor,
                min_diversity,
                max_diversity,
                ..
            } => {
                let Some(diversity) = diversity else {
                    log::warn!("adaptive mutation schedule updated without a diversity value");
                    return;
                };
                let ema = match self.diversity_ema {
                    None => diversity,
                    Some(prev) => (1.0 - DIVERSITY_EMA_ALPHA) * prev + DIVERSITY_EMA_ALPHA * diversity,
                };
                self.diversity_ema = Some(ema);

                let factor = if ema < min_diversity {
                    increase_factor
                } else if ema > max_diversity {
                    decrease_factor
                } else {
                    1.0
                };
                self.strength = (self.strength * factor).clamp(min_strength, max_strength);
                self.probability = (self.probability * factor).clamp(min_probability, max_probability);
            }
        }
        log::trace!(
            "generation {}: mutation strength {:.4}, probability {:.4}",
            generation,
            self.strength,
            self.probability
        );
    }

    /// Write the effective values into the weight and bias channels.
    pub fn apply_to(&self, config: &mut ParameterMutationConfig) {
        config.weights.strength = self.strength;
        config.weights.probability = self.probability;
        if let Some(biases) = config.biases.as_mut() {
            biases.strength = self.strength;
            biases.probability = self.probability;
        }
    }
}

fn exp_decay(generation: u32, max_generations: u32, max_value: f32, min_value: f32) -> f32 {
    if generation >= max_generations {
        return min_value;
    }
    let k = (max_value / min_value).ln() / max_generations as f32;
    max_value * (-k * generation as f32).exp()
}
