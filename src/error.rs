use thiserror::Error;

/// Rejected generator configuration. Raised before any generation pass runs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("bounds must have a positive area, got {width} x {height}")]
    EmptyBounds { width: f32, height: f32 },

    #[error("step distance must be positive, got {0}")]
    NonPositiveStepDistance(f32),

    #[error("bridge step distance {bridge} is shorter than the step distance {step}")]
    BridgeStepTooShort { bridge: f32, step: f32 },

    #[error("{name} must be finite, got {value}")]
    NotFinite { name: &'static str, value: f32 },

    #[error("{name} must lie in {lo}..={hi}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        lo: f32,
        hi: f32,
    },

    #[error("{name} range is inverted: min {min} > max {max}")]
    InvertedRange { name: &'static str, min: f32, max: f32 },

    #[error("cannot sample rotation angles: {0}")]
    Distribution(#[from] rand::distr::uniform::Error),
}
