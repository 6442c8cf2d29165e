use std::sync::Arc;

use log::warn;

use crate::dsp::DynamicsProcessor;
use crate::meter::{GainMeter, GainMeterHandle};
use crate::params::{PARAM_COUNT, ParamId, ParamRegistry, ParamSpec};

/// Host state blob: input gain then output gain, little-endian f32 each.
pub const STATE_SIZE: usize = 2 * size_of::<f32>();

/// Sample rate assumed until the host calls `prepare`.
const DEFAULT_SAMPLE_RATE: f32 = 44_100.0;

/// The processing lifecycle a host drives: configure a session, deliver
/// buffers, tear down, and move opaque state blobs around. Implementations
/// must keep `process` free of allocation, locks, and I/O.
pub trait ProcessingUnit {
    /// Begin a session at the given sample rate. May be called again with a
    /// different rate between sessions.
    fn prepare(&mut self, sample_rate: f32);

    /// Transform one channel-major buffer in place. Zero channels or zero
    /// samples must be a no-op.
    fn process(&mut self, channels: &mut [&mut [f32]]);

    /// End the session. Buffers delivered earlier must not be retained.
    fn release(&mut self);

    /// Serialize state for the host to persist.
    fn state(&self) -> Vec<u8>;

    /// Restore previously saved state. Malformed input is ignored.
    fn restore(&mut self, data: &[u8]);
}

/// The parameter bindings a generic host editor consumes: a fixed set of
/// indexed scalars with static metadata.
pub trait ControlSurface {
    fn param_count(&self) -> usize;
    fn param_spec(&self, index: usize) -> Option<&'static ParamSpec>;
    fn param(&self, index: usize) -> Option<f32>;
    fn set_param(&self, index: usize, value: f32);
}

/// A cloneable, thread-safe view over the plugin's parameters for editor
/// and automation threads. Writes go through atomic cells; no handle keeps
/// the audio thread waiting.
#[derive(Clone)]
pub struct ParamBindings {
    registry: Arc<ParamRegistry>,
}

impl ControlSurface for ParamBindings {
    fn param_count(&self) -> usize {
        PARAM_COUNT
    }

    fn param_spec(&self, index: usize) -> Option<&'static ParamSpec> {
        ParamId::from_index(index).map(ParamRegistry::spec)
    }

    fn param(&self, index: usize) -> Option<f32> {
        ParamId::from_index(index).map(|id| self.registry.get(id))
    }

    fn set_param(&self, index: usize, value: f32) {
        if let Some(id) = ParamId::from_index(index) {
            self.registry.set(id, value);
        }
    }
}

/// The gain/compressor effect: six registry-backed parameters feeding the
/// dynamics processor, plus a meter readout.
pub struct GainCompressor {
    registry: Arc<ParamRegistry>,
    processor: DynamicsProcessor,
    meter: GainMeter,
    meter_handle: GainMeterHandle,
}

impl GainCompressor {
    pub fn new() -> Self {
        let (meter, meter_handle) = GainMeter::new(DEFAULT_SAMPLE_RATE as usize);
        Self {
            registry: Arc::new(ParamRegistry::new()),
            processor: DynamicsProcessor::new(DEFAULT_SAMPLE_RATE),
            meter,
            meter_handle,
        }
    }

    /// Parameter bindings for an editor or automation thread.
    pub fn bindings(&self) -> ParamBindings {
        ParamBindings {
            registry: Arc::clone(&self.registry),
        }
    }

    /// Level/gain-reduction readout for a UI thread.
    pub fn meter(&self) -> &GainMeterHandle {
        &self.meter_handle
    }

    pub fn registry(&self) -> &Arc<ParamRegistry> {
        &self.registry
    }
}

impl Default for GainCompressor {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessingUnit for GainCompressor {
    fn prepare(&mut self, sample_rate: f32) {
        self.processor.set_sample_rate(sample_rate);
        self.meter.set_sample_rate(sample_rate as usize);
    }

    fn process(&mut self, channels: &mut [&mut [f32]]) {
        let num_samples = channels.first().map_or(0, |c| c.len());
        if channels.is_empty() || num_samples == 0 {
            return;
        }

        let params = self.registry.snapshot();

        let input_peak = block_peak(channels);
        self.processor.process(channels, &params);
        let output_peak = block_peak(channels);

        self.meter.update(input_peak, output_peak, num_samples);
    }

    fn release(&mut self) {
        self.meter.reset();
    }

    fn state(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(STATE_SIZE);
        data.extend_from_slice(&self.registry.get(ParamId::InputGain).to_le_bytes());
        data.extend_from_slice(&self.registry.get(ParamId::OutputGain).to_le_bytes());
        data
    }

    fn restore(&mut self, data: &[u8]) {
        // Only the two gain parameters travel through host state; anything
        // other than exactly two floats is ignored.
        if data.len() != STATE_SIZE {
            warn!(
                "ignoring state blob of {} bytes (expected {STATE_SIZE})",
                data.len()
            );
            return;
        }

        let input_gain = f32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let output_gain = f32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        self.registry.set(ParamId::InputGain, input_gain);
        self.registry.set(ParamId::OutputGain, output_gain);
    }
}

/// Explicit factory for whatever loading mechanism hosts this effect.
pub fn create_plugin() -> GainCompressor {
    GainCompressor::new()
}

fn block_peak(channels: &[&mut [f32]]) -> f32 {
    channels
        .iter()
        .flat_map(|c| c.iter())
        .fold(0.0f32, |peak, s| peak.max(s.abs()))
}
