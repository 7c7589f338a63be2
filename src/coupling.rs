//! Linear coupling between the two masses.
//!
//! Spring 1 joins the left wall to mass 1, spring 2 joins the masses and
//! spring 3 joins mass 2 to the right wall. The outer springs share one
//! stiffness in the symmetric configuration, so `set_k1` updates both.
//!
//! Once a stability limit is attached, live edits are clamped so the stiffest
//! mode stays integrable: `omega_max * dt_sub <= STABILITY_MARGIN`.

use glam::DVec2;
use std::f64::consts::TAU;

use crate::constants::{MIN_MASS, MIN_STIFFNESS, PERIOD_DISPLAY_MAX, STABILITY_MARGIN};
use crate::error::{ensure_finite, ConfigError, Result};
use crate::state::PhysicsState;

#[derive(Clone, Debug, PartialEq)]
pub struct CouplingModel {
    mass1: f64,
    mass2: f64,
    k1: f64,
    k2: f64,
    k3: f64,
    // Row i gives mass i's wall term and coupling term.
    matrix: [[f64; 2]; 2],
    // Ceiling on `max_omega_sq`; infinite until a substep is known.
    omega_sq_limit: f64,
}

impl CouplingModel {
    /// Validating constructor: masses must be positive, stiffnesses
    /// non-negative, everything finite.
    pub fn new(mass1: f64, mass2: f64, k1: f64, k2: f64, k3: f64) -> Result<Self> {
        for (name, value) in [
            ("mass1", mass1),
            ("mass2", mass2),
            ("k1", k1),
            ("k2", k2),
            ("k3", k3),
        ] {
            ensure_finite(name, value)?;
        }
        for m in [mass1, mass2] {
            if m <= 0.0 {
                return Err(ConfigError::NonPositiveMass(m));
            }
        }
        for k in [k1, k2, k3] {
            if k < 0.0 {
                return Err(ConfigError::NegativeStiffness(k));
            }
        }
        let mut model = Self {
            mass1,
            mass2,
            k1,
            k2,
            k3,
            matrix: [[0.0; 2]; 2],
            omega_sq_limit: f64::INFINITY,
        };
        model.recompute();
        Ok(model)
    }

    /// Two equal masses with equal outer springs.
    pub fn symmetric(mass: f64, k1: f64, k2: f64) -> Result<Self> {
        Self::new(mass, mass, k1, k2, k1)
    }

    /// Attach the stability limit for leapfrog substeps of `substep_dt`.
    /// Fails if the current parameters already exceed it.
    pub fn with_stability_limit(mut self, substep_dt: f64) -> Result<Self> {
        let dt = ensure_finite("substep_dt", substep_dt)?;
        if dt <= 0.0 {
            return Err(ConfigError::NonPositiveTimestep(dt));
        }
        let limit = (STABILITY_MARGIN / dt).powi(2);
        let omega_sq = self.max_omega_sq();
        if omega_sq > limit {
            return Err(ConfigError::Unstable {
                omega_sq,
                substep_dt: dt,
            });
        }
        self.omega_sq_limit = limit;
        Ok(self)
    }

    /// Upper bound on the squared angular frequency of the stiffest mode
    /// (Gershgorin bound on `M^-1 K`).
    pub fn max_omega_sq(&self) -> f64 {
        let stiffness = self.k1.max(self.k3) + 2.0 * self.k2;
        stiffness / self.mass1.min(self.mass2)
    }

    pub fn omega_sq_limit(&self) -> f64 {
        self.omega_sq_limit
    }

    fn recompute(&mut self) {
        self.matrix = [
            [-self.k1 / self.mass1, self.k2 / self.mass1],
            [-self.k3 / self.mass2, self.k2 / self.mass2],
        ];
    }

    /// Set both masses. Values below `MIN_MASS`, or light enough to make the
    /// stiffest mode unstable, are raised to the nearest allowed mass.
    pub fn set_masses(&mut self, mass: f64) -> Result<()> {
        let mass = ensure_finite("mass", mass)?;
        let stable_floor = (self.k1.max(self.k3) + 2.0 * self.k2) / self.omega_sq_limit;
        let clamped = mass.max(MIN_MASS).max(stable_floor);
        if clamped != mass {
            log::warn!("[params] mass {} clamped to {}", mass, clamped);
        }
        self.mass1 = clamped;
        self.mass2 = clamped;
        self.recompute();
        Ok(())
    }

    /// Set the outer stiffness; mirrored to spring 3 to keep left/right symmetry.
    pub fn set_k1(&mut self, k: f64) -> Result<()> {
        let ceiling = self.omega_sq_limit * self.mass1.min(self.mass2) - 2.0 * self.k2;
        let k = self.clamp_stiffness("k1", k, ceiling)?;
        self.k1 = k;
        self.k3 = k;
        self.recompute();
        Ok(())
    }

    pub fn set_k2(&mut self, k: f64) -> Result<()> {
        let ceiling =
            0.5 * (self.omega_sq_limit * self.mass1.min(self.mass2) - self.k1.max(self.k3));
        let k = self.clamp_stiffness("k2", k, ceiling)?;
        self.k2 = k;
        self.recompute();
        Ok(())
    }

    fn clamp_stiffness(&self, name: &'static str, k: f64, ceiling: f64) -> Result<f64> {
        let k = ensure_finite(name, k)?;
        let clamped = k.min(ceiling.max(MIN_STIFFNESS)).max(MIN_STIFFNESS);
        if clamped != k {
            log::warn!("[params] {} {} clamped to {}", name, k, clamped);
        }
        Ok(clamped)
    }

    /// Instantaneous accelerations for displacements `x = (x1, x2)`.
    #[inline]
    pub fn accelerations(&self, x: DVec2) -> DVec2 {
        let m = &self.matrix;
        DVec2::new(
            m[0][0] * x.x + m[0][1] * (x.y - x.x),
            m[1][0] * x.y + m[1][1] * (x.x - x.y),
        )
    }

    /// Periods of the in-phase and out-of-phase modes. Valid for the
    /// symmetric equal-mass configuration only; a zero stiffness gives an
    /// infinite period.
    pub fn normal_mode_periods(&self) -> (f64, f64) {
        let t1 = TAU * (self.mass1 / self.k1).sqrt();
        let t2 = TAU * (self.mass1 / (self.k1 + 2.0 * self.k2)).sqrt();
        (t1, t2)
    }

    /// Periods clamped to `[0, PERIOD_DISPLAY_MAX]` for timer displays.
    pub fn display_periods(&self) -> (f64, f64) {
        let (t1, t2) = self.normal_mode_periods();
        let clamp = |t: f64| {
            if t.is_nan() {
                PERIOD_DISPLAY_MAX
            } else {
                t.clamp(0.0, PERIOD_DISPLAY_MAX)
            }
        };
        (clamp(t1), clamp(t2))
    }

    /// Total mechanical energy of `state` under this coupling.
    pub fn energy(&self, state: &PhysicsState) -> f64 {
        let x = state.displacements();
        let v = state.velocities();
        let kinetic = self.mass1 * v.x * v.x + self.mass2 * v.y * v.y;
        let stretch = x.y - x.x;
        let potential = self.k1 * x.x * x.x + self.k3 * x.y * x.y + self.k2 * stretch * stretch;
        0.5 * (kinetic + potential)
    }

    pub fn masses(&self) -> (f64, f64) {
        (self.mass1, self.mass2)
    }

    pub fn stiffnesses(&self) -> (f64, f64, f64) {
        (self.k1, self.k2, self.k3)
    }

    pub fn matrix(&self) -> [[f64; 2]; 2] {
        self.matrix
    }
}
