//! Serializable simulation configuration.
//!
//! Every field has a default from [`crate::constants`], so a JSON document
//! only needs the values it overrides:
//!
//! ```json
//! {
//!   "mass": 2.0,
//!   "k2": 0.5,
//!   "picker": { "snap_to_diagonals": true, "border_width": 0.1 }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{ensure_finite, ConfigError, Result};
use crate::mapper::{AxisRange, PickerRect};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Physical range of mass 1's displacement across the picker's u axis.
    pub x_range: AxisRange,
    /// Physical range of mass 2's displacement across the picker's v axis.
    pub y_range: AxisRange,
    pub border_width: f64,
    pub snap_to_diagonals: bool,
    pub snap_tolerance: f64,
    /// Where the picker sits on the drawing surface; `None` disables it.
    pub rect: Option<PickerRect>,
}

impl Default for PickerConfig {
    fn default() -> Self {
        Self {
            x_range: DEFAULT_PICKER_RANGE.into(),
            y_range: DEFAULT_PICKER_RANGE.into(),
            border_width: 0.0,
            snap_to_diagonals: false,
            snap_tolerance: DEFAULT_SNAP_TOLERANCE,
            rect: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub mass: f64,
    pub k1: f64,
    pub k2: f64,

    // Absolute positions along the motion axis
    pub x1_init: f64,
    pub x2_init: f64,
    pub x1_ref: f64,
    pub x2_ref: f64,
    pub wall1_x: f64,
    pub wall2_x: f64,
    pub wall_thickness: f64,

    pub x1_travel: AxisRange,
    pub x2_travel: AxisRange,
    pub masses_draggable: bool,

    pub fixed_dt: f64,
    pub substeps: u32,
    pub start_paused: bool,

    pub picker: PickerConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            mass: DEFAULT_MASS,
            k1: DEFAULT_K1,
            k2: DEFAULT_K2,
            x1_init: DEFAULT_X1_INIT,
            x2_init: DEFAULT_X2_INIT,
            x1_ref: DEFAULT_X1_REF,
            x2_ref: DEFAULT_X2_REF,
            wall1_x: DEFAULT_WALL1_X,
            wall2_x: DEFAULT_WALL2_X,
            wall_thickness: DEFAULT_WALL_THICKNESS,
            x1_travel: DEFAULT_X1_TRAVEL.into(),
            x2_travel: DEFAULT_X2_TRAVEL.into(),
            masses_draggable: true,
            fixed_dt: FIXED_DT,
            substeps: DEFAULT_SUBSTEPS,
            start_paused: true,
            picker: PickerConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Config(e.to_string()))
    }

    /// Checks that are not covered by the component constructors.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("x1_init", self.x1_init),
            ("x2_init", self.x2_init),
            ("x1_ref", self.x1_ref),
            ("x2_ref", self.x2_ref),
            ("wall1_x", self.wall1_x),
            ("wall2_x", self.wall2_x),
            ("wall_thickness", self.wall_thickness),
        ] {
            ensure_finite(name, value)?;
        }
        let fixed_dt = ensure_finite("fixed_dt", self.fixed_dt)?;
        if fixed_dt <= 0.0 {
            return Err(ConfigError::NonPositiveTimestep(fixed_dt));
        }
        if self.substeps == 0 {
            return Err(ConfigError::ZeroSubsteps);
        }
        self.x1_travel.validate()?;
        self.x2_travel.validate()?;
        let tol = ensure_finite("snap_tolerance", self.picker.snap_tolerance)?;
        if tol < 0.0 {
            return Err(ConfigError::NegativeTolerance(tol));
        }
        Ok(())
    }
}
