use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::dsp::common::lin_to_db;

const CLIP_THRESHOLD: f32 = 0.95;
const SILENCE_FLOOR: f32 = 1e-10;

/// Publishes the processing side's levels for a UI thread to read without
/// touching the audio path: output peak (with hold), the gain reduction the
/// last buffer experienced, and a clip flag.
pub struct GainMeter {
    current_peak: f32,
    samples_since_peak: usize,
    peak_hold_samples: usize,
    info: Arc<ArcSwap<GainMeterInfo>>,
}

pub struct GainMeterHandle {
    info: Arc<ArcSwap<GainMeterInfo>>,
}

#[derive(Debug, Clone, Default)]
pub struct GainMeterInfo {
    pub peak_db: f32,
    pub peak_linear: f32,
    /// Negative when the last buffer was attenuated, 0.0 when it passed
    /// through at unity or louder.
    pub gain_reduction_db: f32,
    pub is_clipping: bool,
}

impl GainMeter {
    pub fn new(sample_rate: usize) -> (Self, GainMeterHandle) {
        let info = Arc::new(ArcSwap::from_pointee(GainMeterInfo::default()));

        (
            Self {
                current_peak: 0.0,
                samples_since_peak: 0,
                peak_hold_samples: sample_rate * 2, // 2 seconds
                info: Arc::clone(&info),
            },
            GainMeterHandle { info },
        )
    }

    pub fn set_sample_rate(&mut self, sample_rate: usize) {
        self.peak_hold_samples = sample_rate * 2;
    }

    /// Record one processed buffer: the input peak as it arrived, the
    /// output peak after processing, and the buffer length in samples.
    pub fn update(&mut self, input_peak: f32, output_peak: f32, num_samples: usize) {
        if output_peak > self.current_peak {
            self.current_peak = output_peak;
            self.samples_since_peak = 0;
        } else {
            self.samples_since_peak += num_samples;

            if self.samples_since_peak > self.peak_hold_samples {
                self.current_peak = output_peak;
                self.samples_since_peak = 0;
            }
        }

        let peak_db = if self.current_peak > SILENCE_FLOOR {
            lin_to_db(self.current_peak)
        } else {
            -100.0
        };

        let gain_reduction_db = if input_peak > SILENCE_FLOOR && output_peak > SILENCE_FLOOR {
            lin_to_db(output_peak / input_peak).min(0.0)
        } else {
            0.0
        };

        self.info.store(Arc::new(GainMeterInfo {
            peak_db,
            peak_linear: self.current_peak,
            gain_reduction_db,
            is_clipping: self.current_peak >= CLIP_THRESHOLD,
        }));
    }

    pub fn reset(&mut self) {
        self.current_peak = 0.0;
        self.samples_since_peak = 0;
        self.info.store(Arc::new(GainMeterInfo::default()));
    }
}

impl GainMeterHandle {
    pub fn get_info(&self) -> GainMeterInfo {
        self.info.load().as_ref().clone()
    }
}
