//! Configuration errors for the oscillator core.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("mass must be positive, got {0}")]
    NonPositiveMass(f64),

    #[error("spring stiffness must be non-negative, got {0}")]
    NegativeStiffness(f64),

    #[error("{name} must be finite, got {value}")]
    NonFinite { name: &'static str, value: f64 },

    #[error("degenerate axis range [{min}, {max}]: max must exceed min")]
    DegenerateRange { min: f64, max: f64 },

    #[error("border width must be non-negative, got {0}")]
    NegativeBorder(f64),

    #[error("border width {border} leaves no room inside range [{min}, {max}]")]
    BorderTooWide { border: f64, min: f64, max: f64 },

    #[error("substep count must be at least 1")]
    ZeroSubsteps,

    #[error("stiffest mode (omega^2 <= {omega_sq}) is unstable for substep {substep_dt}s")]
    Unstable { omega_sq: f64, substep_dt: f64 },

    #[error("fixed timestep must be positive, got {0}")]
    NonPositiveTimestep(f64),

    #[error("snap tolerance must be non-negative, got {0}")]
    NegativeTolerance(f64),

    #[error("spring index must be 1, 2 or 3, got {0}")]
    InvalidSpring(usize),

    #[error("snapshot decode error: {0}")]
    Snapshot(String),

    #[error("config decode error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Reject NaN and infinities before they reach the state vector.
#[inline]
pub(crate) fn ensure_finite(name: &'static str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::NonFinite { name, value })
    }
}
