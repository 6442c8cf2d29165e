use serde::{Deserialize, Serialize};

use crate::params::{ParamId, ParamRegistry};

pub mod manager;

pub use manager::Manager;

/// All six control values. Presets carry the full state, unlike the host
/// blob which only carries the two gains.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PresetParams {
    pub input_gain: f32,
    pub output_gain: f32,
    pub threshold: f32,
    pub ratio: f32,
    pub attack: f32,
    pub release: f32,
}

impl Default for PresetParams {
    fn default() -> Self {
        Self {
            input_gain: 1.0,
            output_gain: 1.0,
            threshold: -12.0,
            ratio: 4.0,
            attack: 20.0,
            release: 200.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub params: PresetParams,
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            name: "New Preset".to_string(),
            description: None,
            author: None,
            params: PresetParams::default(),
        }
    }
}

impl Preset {
    pub fn new(name: impl Into<String>, params: PresetParams) -> Self {
        Self {
            name: name.into(),
            description: None,
            author: None,
            params,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_author(mut self, author: &str) -> Self {
        self.author = Some(author.to_string());
        self
    }

    /// Capture the registry's current values under the given name.
    pub fn from_registry(name: impl Into<String>, registry: &ParamRegistry) -> Self {
        Self::new(
            name,
            PresetParams {
                input_gain: registry.get(ParamId::InputGain),
                output_gain: registry.get(ParamId::OutputGain),
                threshold: registry.get(ParamId::Threshold),
                ratio: registry.get(ParamId::Ratio),
                attack: registry.get(ParamId::Attack),
                release: registry.get(ParamId::Release),
            },
        )
    }

    /// Write every value into the registry. Out-of-range values in a
    /// hand-edited preset file are clamped by the registry.
    pub fn apply_to(&self, registry: &ParamRegistry) {
        registry.set(ParamId::InputGain, self.params.input_gain);
        registry.set(ParamId::OutputGain, self.params.output_gain);
        registry.set(ParamId::Threshold, self.params.threshold);
        registry.set(ParamId::Ratio, self.params.ratio);
        registry.set(ParamId::Attack, self.params.attack);
        registry.set(ParamId::Release, self.params.release);
    }
}
