use std::sync::atomic::{AtomicU32, Ordering};

use crate::dsp::DynamicsParams;

pub const PARAM_COUNT: usize = 6;

/// Stable parameter indices. The order is part of the host contract: a
/// generic editor binds sliders by index, and automation refers to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ParamId {
    InputGain = 0,
    OutputGain = 1,
    Threshold = 2,
    Ratio = 3,
    Attack = 4,
    Release = 5,
}

impl ParamId {
    pub const ALL: [Self; PARAM_COUNT] = [
        Self::InputGain,
        Self::OutputGain,
        Self::Threshold,
        Self::Ratio,
        Self::Attack,
        Self::Release,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Static metadata for one parameter: identifier, human label, bounds and
/// default. Values outside [min, max] are clamped on the way into the
/// registry.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub id: ParamId,
    pub name: &'static str,
    pub label: &'static str,
    pub min: f32,
    pub max: f32,
    pub default: f32,
}

pub const PARAM_SPECS: [ParamSpec; PARAM_COUNT] = [
    ParamSpec {
        id: ParamId::InputGain,
        name: "input_gain",
        label: "Input Gain",
        min: 0.0,
        max: 2.0,
        default: 1.0,
    },
    ParamSpec {
        id: ParamId::OutputGain,
        name: "output_gain",
        label: "Output Gain",
        min: 0.0,
        max: 2.0,
        default: 1.0,
    },
    ParamSpec {
        id: ParamId::Threshold,
        name: "threshold",
        label: "Threshold",
        min: -60.0,
        max: 0.0,
        default: -12.0,
    },
    ParamSpec {
        id: ParamId::Ratio,
        name: "ratio",
        label: "Ratio",
        min: 1.0,
        max: 20.0,
        default: 4.0,
    },
    ParamSpec {
        id: ParamId::Attack,
        name: "attack",
        label: "Attack",
        min: 1.0,
        max: 1000.0,
        default: 20.0,
    },
    ParamSpec {
        id: ParamId::Release,
        name: "release",
        label: "Release",
        min: 10.0,
        max: 10000.0,
        default: 200.0,
    },
];

/// An f32 stored as raw bits in an `AtomicU32`. A plain store/load pair is
/// enough here: each cell is an independent value, so `Relaxed` ordering
/// cannot produce a torn or stale-beyond-one-buffer read.
struct AtomicF32(AtomicU32);

impl AtomicF32 {
    const fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

/// Owns the six parameter value cells. Control threads `set`, the audio
/// thread takes a `snapshot` at the top of each processing call; neither
/// side takes a lock.
pub struct ParamRegistry {
    values: [AtomicF32; PARAM_COUNT],
}

impl ParamRegistry {
    pub fn new() -> Self {
        Self {
            values: [
                AtomicF32::new(PARAM_SPECS[0].default),
                AtomicF32::new(PARAM_SPECS[1].default),
                AtomicF32::new(PARAM_SPECS[2].default),
                AtomicF32::new(PARAM_SPECS[3].default),
                AtomicF32::new(PARAM_SPECS[4].default),
                AtomicF32::new(PARAM_SPECS[5].default),
            ],
        }
    }

    pub const fn spec(id: ParamId) -> &'static ParamSpec {
        &PARAM_SPECS[id as usize]
    }

    pub fn get(&self, id: ParamId) -> f32 {
        self.values[id.index()].load()
    }

    /// Store a value, clamped to the parameter's range. Returns what was
    /// actually stored.
    pub fn set(&self, id: ParamId, value: f32) -> f32 {
        let spec = Self::spec(id);
        let clamped = value.clamp(spec.min, spec.max);
        self.values[id.index()].store(clamped);
        clamped
    }

    /// Reset every parameter to its default.
    pub fn reset(&self) {
        for spec in &PARAM_SPECS {
            self.values[spec.id.index()].store(spec.default);
        }
    }

    /// One coherent-enough read of all six values. Individual cells are
    /// read independently; a concurrent `set` lands in either this buffer
    /// or the next.
    pub fn snapshot(&self) -> DynamicsParams {
        DynamicsParams {
            input_gain: self.get(ParamId::InputGain),
            output_gain: self.get(ParamId::OutputGain),
            threshold_db: self.get(ParamId::Threshold),
            ratio: self.get(ParamId::Ratio),
            attack_ms: self.get(ParamId::Attack),
            release_ms: self.get(ParamId::Release),
        }
    }
}

impl Default for ParamRegistry {
    fn default() -> Self {
        Self::new()
    }
}
