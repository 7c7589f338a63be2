//! Continuous state of the two masses.
//!
//! Positions are displacements from each mass's reference (equilibrium)
//! position. The state has exactly two write paths: a kinematic override used
//! by dragging and direct coordinate commits (always zeroes velocity), and an
//! integration step used by the leapfrog integrator (preserves dynamics).

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::coupling::CouplingModel;
use crate::error::{ensure_finite, ConfigError, Result};

/// Persisted `(x1, x2, v1, v2)` tuple carried across simulation teardown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub x1: f64,
    pub x2: f64,
    pub v1: f64,
    pub v2: f64,
}

impl Snapshot {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| ConfigError::Snapshot(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| ConfigError::Snapshot(e.to_string()))
    }
}

#[derive(Clone, Debug)]
pub struct PhysicsState {
    x: DVec2,
    v: DVec2,
    // Last acceleration computed at `x`; the "old" term of the next leapfrog step.
    a: DVec2,
    x_ref: DVec2,
}

impl PhysicsState {
    /// Build a state at rest at displacement `x` from the reference positions.
    pub fn at_rest(x_ref: DVec2, x: DVec2, model: &CouplingModel) -> Self {
        Self {
            x,
            v: DVec2::ZERO,
            a: model.accelerations(x),
            x_ref,
        }
    }

    /// Displacements `(x1, x2)` from the reference positions.
    #[inline]
    pub fn displacements(&self) -> DVec2 {
        self.x
    }

    /// Reference-shifted positions along the motion axis.
    #[inline]
    pub fn absolute_positions(&self) -> DVec2 {
        self.x + self.x_ref
    }

    #[inline]
    pub fn velocities(&self) -> DVec2 {
        self.v
    }

    #[inline]
    pub fn accelerations(&self) -> DVec2 {
        self.a
    }

    #[inline]
    pub fn reference_positions(&self) -> DVec2 {
        self.x_ref
    }

    /// Write positions directly. Velocity is always zeroed; a drag is a
    /// kinematic override, not a dynamics event.
    pub fn apply_kinematic_override(&mut self, x: DVec2, model: &CouplingModel) {
        self.x = x;
        self.v = DVec2::ZERO;
        self.a = model.accelerations(x);
    }

    /// Commit the integrator's result for one substep.
    pub(crate) fn apply_integration_step(&mut self, x: DVec2, v: DVec2, a: DVec2) {
        self.x = x;
        self.v = v;
        self.a = a;
    }

    /// Zero velocity and recompute the restoring acceleration at the current
    /// positions, leaving a position-only initial condition.
    pub fn commit_at_rest(&mut self, model: &CouplingModel) {
        self.v = DVec2::ZERO;
        self.a = model.accelerations(self.x);
    }

    /// Recompute the carried acceleration after a coupling change.
    pub fn refresh_accelerations(&mut self, model: &CouplingModel) {
        self.a = model.accelerations(self.x);
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            x1: self.x.x,
            x2: self.x.y,
            v1: self.v.x,
            v2: self.v.y,
        }
    }

    /// Restore positions and velocities from a persisted snapshot. Non-finite
    /// snapshots are rejected and leave the state untouched.
    pub fn restore(&mut self, snapshot: &Snapshot, model: &CouplingModel) -> Result<()> {
        let x1 = ensure_finite("snapshot x1", snapshot.x1)?;
        let x2 = ensure_finite("snapshot x2", snapshot.x2)?;
        let v1 = ensure_finite("snapshot v1", snapshot.v1)?;
        let v2 = ensure_finite("snapshot v2", snapshot.v2)?;
        self.x = DVec2::new(x1, x2);
        self.v = DVec2::new(v1, v2);
        self.a = model.accelerations(self.x);
        Ok(())
    }
}
