//! Fixed-substep leapfrog (velocity-Verlet) integration.
//!
//! The carried acceleration in [`PhysicsState`] is the "old" term of each
//! step, so only one force evaluation is needed per substep.

use crate::coupling::CouplingModel;
use crate::error::{ConfigError, Result};
use crate::state::PhysicsState;

/// Advance `state` by one leapfrog step of length `dt`.
///
/// x_n+1 = x_n + dt (v_n + a_n dt / 2)
/// v_n+1 = v_n + dt (a_n + a_n+1) / 2
pub fn leapfrog_step(state: &mut PhysicsState, model: &CouplingModel, dt: f64) {
    if !dt.is_finite() || dt == 0.0 {
        return;
    }
    let x = state.displacements();
    let v = state.velocities();
    let a = state.accelerations();

    let x_new = x + dt * (v + 0.5 * a * dt);
    let a_new = model.accelerations(x_new);
    let v_new = v + 0.5 * (a + a_new) * dt;

    state.apply_integration_step(x_new, v_new, a_new);
}

/// Advance `state` by `total_dt` split into `substeps` equal leapfrog steps.
pub fn advance(state: &mut PhysicsState, model: &CouplingModel, total_dt: f64, substeps: u32) {
    if substeps == 0 {
        return;
    }
    let dt = total_dt / substeps as f64;
    for _ in 0..substeps {
        leapfrog_step(state, model, dt);
    }
}

/// Substep count paired with the fixed tick it subdivides.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Integrator {
    substeps: u32,
}

impl Integrator {
    pub fn new(substeps: u32) -> Result<Self> {
        if substeps == 0 {
            return Err(ConfigError::ZeroSubsteps);
        }
        Ok(Self { substeps })
    }

    #[inline]
    pub fn substeps(&self) -> u32 {
        self.substeps
    }

    /// Run one fixed tick of length `tick_dt`.
    pub fn tick(&self, state: &mut PhysicsState, model: &CouplingModel, tick_dt: f64) {
        advance(state, model, tick_dt, self.substeps);
    }
}

/// Converts variable frame time into whole fixed ticks.
///
/// Leftover time carries into the next frame. At most `max_ticks` ticks are
/// produced per frame; any excess backlog is dropped.
#[derive(Clone, Debug)]
pub struct FixedStepper {
    fixed_dt: f64,
    max_ticks: u32,
    accumulator: f64,
}

impl FixedStepper {
    pub fn new(fixed_dt: f64, max_ticks: u32) -> Self {
        Self {
            fixed_dt,
            max_ticks: max_ticks.max(1),
            accumulator: 0.0,
        }
    }

    #[inline]
    pub fn fixed_dt(&self) -> f64 {
        self.fixed_dt
    }

    /// Accumulate `frame_dt` seconds and return how many fixed ticks to run.
    pub fn ticks_for(&mut self, frame_dt: f64) -> u32 {
        if !frame_dt.is_finite() || frame_dt <= 0.0 || self.fixed_dt <= 0.0 {
            return 0;
        }
        self.accumulator += frame_dt;
        let mut ticks = 0;
        while self.accumulator >= self.fixed_dt && ticks < self.max_ticks {
            self.accumulator -= self.fixed_dt;
            ticks += 1;
        }
        if ticks == self.max_ticks && self.accumulator >= self.fixed_dt {
            log::debug!(
                "[tick] dropping {:.3}s of backlog",
                self.accumulator - self.accumulator % self.fixed_dt
            );
            self.accumulator %= self.fixed_dt;
        }
        ticks
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }
}
