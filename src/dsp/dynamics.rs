use crate::dsp::common::{calculate_coefficient, db_to_lin, lin_to_db};

/// Floor for the linear threshold before any division. Registry clamping
/// keeps the threshold within [-60, 0] dB (linear 1e-3..=1.0), so this only
/// matters for hand-built `DynamicsParams`.
const THRESHOLD_FLOOR: f32 = 1e-6;

/// Attack/release time constants are floored at 1 ms (0.001 s).
const MIN_TIME_MS: f32 = 1.0;

/// Snapshot of the six control values, read once per processing call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicsParams {
    /// Input gain, linear [0.0, 2.0].
    pub input_gain: f32,
    /// Output gain, linear [0.0, 2.0].
    pub output_gain: f32,
    /// Compression threshold in dB [-60.0, 0.0].
    pub threshold_db: f32,
    /// Compression ratio [1.0, 20.0], e.g. 4.0 for 4:1.
    pub ratio: f32,
    /// Attack time in milliseconds [1.0, 1000.0].
    pub attack_ms: f32,
    /// Release time in milliseconds [10.0, 10000.0].
    pub release_ms: f32,
}

impl Default for DynamicsParams {
    fn default() -> Self {
        Self {
            input_gain: 1.0,
            output_gain: 1.0,
            threshold_db: -12.0,
            ratio: 4.0,
            attack_ms: 20.0,
            release_ms: 200.0,
        }
    }
}

/// Gain staging plus threshold-based compression, applied in place.
///
/// The signal path per sample is: input gain, envelope detection
/// (instantaneous absolute magnitude), gain reduction above threshold with
/// attack/release-weighted smoothing, output gain. The gain reduction is
/// re-derived from scratch every sample; no smoothed state is carried
/// between samples or buffers.
///
/// The hot path never allocates, locks, or performs I/O.
#[derive(Debug, Clone, Copy)]
pub struct DynamicsProcessor {
    sample_rate: f32,
}

impl DynamicsProcessor {
    pub fn new(sample_rate: f32) -> Self {
        Self { sample_rate }
    }

    pub const fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    pub const fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
    }

    /// Process one sample.
    ///
    /// The threshold arrives in dB and is compared in the linear domain;
    /// the conversion happens here so the comparison and the division
    /// underneath the ratio formula see the same units.
    #[inline]
    pub fn process_sample(&self, input: f32, params: &DynamicsParams) -> f32 {
        let mut sample = input * params.input_gain;

        let envelope = sample.abs();
        let threshold = db_to_lin(params.threshold_db).max(THRESHOLD_FLOOR);

        if envelope > threshold {
            // Classic ratio formula: reduce the dB overshoot by (1 - 1/ratio).
            let db_above = lin_to_db(envelope / threshold);
            let db_reduction = db_above * (1.0 - 1.0 / params.ratio);
            let gain_reduction = db_to_lin(-db_reduction);

            // Attack when the envelope still exceeds the reduced threshold,
            // release otherwise. Re-evaluated per sample, no hysteresis.
            let time_ms = if envelope > gain_reduction * threshold {
                params.attack_ms.max(MIN_TIME_MS)
            } else {
                params.release_ms.max(MIN_TIME_MS)
            };
            let coef = calculate_coefficient(time_ms, self.sample_rate);

            sample *= gain_reduction * coef;
        }

        sample * params.output_gain
    }

    /// Process one channel in index order. Order matters: the smoothing
    /// selection is a causal time-domain decision.
    pub fn process_channel(&self, samples: &mut [f32], params: &DynamicsParams) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(*sample, params);
        }
    }

    /// Process a channel-major buffer in place. Zero channels or zero
    /// samples is a no-op. Channels are independent; each is walked in
    /// index order.
    pub fn process(&self, channels: &mut [&mut [f32]], params: &DynamicsParams) {
        for channel in channels.iter_mut() {
            self.process_channel(channel, params);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_RATE: f32 = 44_100.0;
    const EPSILON: f32 = 1e-5;

    fn quiet_params() -> DynamicsParams {
        // Threshold at 0 dB (linear 1.0) so moderate signals never compress.
        DynamicsParams {
            threshold_db: 0.0,
            ..DynamicsParams::default()
        }
    }

    #[test]
    fn below_threshold_is_pure_gain_staging() {
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let params = DynamicsParams {
            input_gain: 0.5,
            output_gain: 1.5,
            ..quiet_params()
        };

        let out = proc.process_sample(0.4, &params);
        assert!((out - 0.4 * 0.5 * 1.5).abs() < EPSILON);
    }

    #[test]
    fn unity_gains_below_threshold_pass_through_exactly() {
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let params = quiet_params();

        for &input in &[0.0, 0.25, -0.25, 0.999, -0.999] {
            assert_eq!(proc.process_sample(input, &params), input);
        }
    }

    #[test]
    fn boundary_sample_does_not_trigger_compression() {
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let params = DynamicsParams::default();

        // Post-input-gain magnitude exactly equal to the linear threshold:
        // the comparison is strict, so no compression applies.
        let threshold_lin = crate::dsp::common::db_to_lin(params.threshold_db);
        let out = proc.process_sample(threshold_lin, &params);
        assert_eq!(out, threshold_lin);

        // One ulp-ish above must compress.
        let out = proc.process_sample(threshold_lin * 1.001, &params);
        assert!(out.abs() < threshold_lin * 1.001);
    }

    #[test]
    fn end_to_end_full_scale_sample() {
        // sampleRate=44100, unity gains, threshold=-12 dB, ratio=4,
        // attack=20 ms, release=200 ms, single sample at full scale.
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let params = DynamicsParams::default();

        let threshold = db_to_lin(-12.0);
        let db_above = lin_to_db(1.0 / threshold);
        let db_reduction = db_above * (1.0 - 1.0 / 4.0);
        let gain_reduction = db_to_lin(-db_reduction);
        // Envelope (1.0) exceeds gain_reduction * threshold, so attack.
        let coef = calculate_coefficient(20.0, SAMPLE_RATE);
        let expected = gain_reduction * coef;

        let out = proc.process_sample(1.0, &params);
        assert!(
            (out - expected).abs() < EPSILON,
            "expected {expected}, got {out}"
        );
    }

    #[test]
    fn higher_ratio_compresses_harder() {
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let mut last = f32::INFINITY;

        for ratio in [1.5, 2.0, 4.0, 8.0, 20.0] {
            let params = DynamicsParams {
                ratio,
                ..DynamicsParams::default()
            };
            let out = proc.process_sample(1.0, &params);
            assert!(
                out < last,
                "ratio {ratio} should compress harder than the previous step"
            );
            last = out;
        }
    }

    #[test]
    fn compression_branch_selects_attack_inside_it() {
        // With a linear-domain threshold, gain_reduction <= 1 inside the
        // branch, so the selection rule always lands on the attack constant.
        // Pin that down: release time must not influence the output.
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let slow_release = DynamicsParams {
            release_ms: 10_000.0,
            ..DynamicsParams::default()
        };
        let fast_release = DynamicsParams {
            release_ms: 10.0,
            ..DynamicsParams::default()
        };

        assert_eq!(
            proc.process_sample(0.9, &slow_release),
            proc.process_sample(0.9, &fast_release)
        );
    }

    #[test]
    fn attack_time_changes_smoothing() {
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let fast = DynamicsParams {
            attack_ms: 1.0,
            ..DynamicsParams::default()
        };
        let slow = DynamicsParams {
            attack_ms: 1000.0,
            ..DynamicsParams::default()
        };

        // Shorter attack -> smaller coefficient -> more applied reduction.
        assert!(proc.process_sample(1.0, &fast) < proc.process_sample(1.0, &slow));
    }

    #[test]
    fn zero_db_threshold_leaves_moderate_signals_alone() {
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let params = quiet_params();

        assert_eq!(proc.process_sample(0.99, &params), 0.99);
        // Above linear 1.0 still compresses.
        assert!(proc.process_sample(1.5, &params) < 1.5);
    }

    #[test]
    fn empty_shapes_are_no_ops() {
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let params = DynamicsParams::default();

        let mut no_channels: [&mut [f32]; 0] = [];
        proc.process(&mut no_channels, &params);

        let mut empty: [f32; 0] = [];
        let mut channels: [&mut [f32]; 1] = [&mut empty];
        proc.process(&mut channels, &params);
    }

    #[test]
    fn channels_are_processed_independently() {
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let params = DynamicsParams::default();

        let mut left = [1.0f32, 0.1, -1.0];
        let mut right = [0.1f32, 1.0, 0.1];
        let mut left_alone = left;

        {
            let mut channels: [&mut [f32]; 2] = [&mut left, &mut right];
            proc.process(&mut channels, &params);
        }
        proc.process_channel(&mut left_alone, &params);

        // Left channel output must not depend on the right channel.
        assert_eq!(left, left_alone);
    }

    #[test]
    fn non_finite_input_propagates() {
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let params = DynamicsParams::default();

        assert!(proc.process_sample(f32::NAN, &params).is_nan());
        assert!(!proc.process_sample(f32::INFINITY, &params).is_finite());
    }

    #[test]
    fn negative_samples_compress_symmetrically() {
        let proc = DynamicsProcessor::new(SAMPLE_RATE);
        let params = DynamicsParams::default();

        let pos = proc.process_sample(0.8, &params);
        let neg = proc.process_sample(-0.8, &params);
        assert_eq!(pos, -neg);
    }
}
