// Host-side tests for the coupling model.

use coupled_oscillations::constants::{MIN_MASS, PERIOD_DISPLAY_MAX};
use coupled_oscillations::{ConfigError, CouplingModel};
use glam::DVec2;
use rand::prelude::*;
use std::f64::consts::TAU;

fn default_model() -> CouplingModel {
    CouplingModel::symmetric(1.0, 1.0, 1.0).unwrap()
}

#[test]
fn matrix_follows_masses_and_stiffnesses() {
    let model = CouplingModel::new(2.0, 4.0, 3.0, 5.0, 3.0).unwrap();
    let m = model.matrix();
    assert_eq!(m[0][0], -1.5);
    assert_eq!(m[0][1], 2.5);
    assert_eq!(m[1][0], -0.75);
    assert_eq!(m[1][1], 1.25);
}

#[test]
fn accelerations_vanish_at_equilibrium() {
    for (m1, m2, k1, k2) in [(1.0, 1.0, 1.0, 1.0), (0.5, 2.0, 3.0, 0.0), (7.0, 7.0, 0.1, 9.0)] {
        let model = CouplingModel::new(m1, m2, k1, k2, k1).unwrap();
        assert_eq!(model.accelerations(DVec2::ZERO), DVec2::ZERO);
    }
}

#[test]
fn accelerations_are_linear_in_displacement() {
    // Property: a(alpha * p + beta * q) == alpha * a(p) + beta * a(q)
    let model = CouplingModel::new(1.3, 0.7, 2.0, 0.4, 2.0).unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let p = DVec2::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
        let q = DVec2::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
        let alpha: f64 = rng.gen_range(-2.0..2.0);
        let beta: f64 = rng.gen_range(-2.0..2.0);
        let lhs = model.accelerations(alpha * p + beta * q);
        let rhs = alpha * model.accelerations(p) + beta * model.accelerations(q);
        assert!(
            (lhs - rhs).length() < 1e-9,
            "linearity failed for p={p:?} q={q:?}: {lhs:?} vs {rhs:?}"
        );
    }
}

#[test]
fn restoring_force_opposes_single_displacement() {
    let model = default_model();
    let a = model.accelerations(DVec2::new(1.0, 0.0));
    // Wall spring and coupling spring both pull mass 1 back; coupling drags mass 2 along.
    assert_eq!(a.x, -2.0);
    assert_eq!(a.y, 1.0);
}

#[test]
fn construction_rejects_invalid_parameters() {
    assert_eq!(
        CouplingModel::new(0.0, 1.0, 1.0, 1.0, 1.0),
        Err(ConfigError::NonPositiveMass(0.0))
    );
    assert_eq!(
        CouplingModel::new(1.0, -2.0, 1.0, 1.0, 1.0),
        Err(ConfigError::NonPositiveMass(-2.0))
    );
    assert_eq!(
        CouplingModel::new(1.0, 1.0, 1.0, -0.5, 1.0),
        Err(ConfigError::NegativeStiffness(-0.5))
    );
    assert!(matches!(
        CouplingModel::new(f64::NAN, 1.0, 1.0, 1.0, 1.0),
        Err(ConfigError::NonFinite { name: "mass1", .. })
    ));
}

#[test]
fn set_k1_mirrors_to_outer_right_spring() {
    let mut model = default_model();
    model.set_k1(4.0).unwrap();
    assert_eq!(model.stiffnesses(), (4.0, 1.0, 4.0));
    assert_eq!(model.matrix()[0][0], -4.0);
    assert_eq!(model.matrix()[1][0], -4.0);
}

#[test]
fn set_k2_recomputes_coupling_terms() {
    let mut model = default_model();
    model.set_k2(3.0).unwrap();
    assert_eq!(model.matrix()[0][1], 3.0);
    assert_eq!(model.matrix()[1][1], 3.0);
}

#[test]
fn zero_mass_is_clamped_not_propagated() {
    let mut model = default_model();
    model.set_masses(0.0).unwrap();
    assert_eq!(model.masses(), (MIN_MASS, MIN_MASS));
    let a = model.accelerations(DVec2::new(0.5, -0.5));
    assert!(a.is_finite());
}

#[test]
fn negative_stiffness_is_clamped_to_zero() {
    let mut model = default_model();
    model.set_k2(-1.0).unwrap();
    assert_eq!(model.stiffnesses().1, 0.0);
}

#[test]
fn non_finite_setter_input_is_rejected() {
    let mut model = default_model();
    assert!(model.set_masses(f64::INFINITY).is_err());
    assert!(model.set_k1(f64::NAN).is_err());
    assert_eq!(model, default_model());
}

#[test]
fn normal_mode_periods_match_closed_form() {
    let model = CouplingModel::symmetric(1.0, 1.0, 1.0).unwrap();
    let (t1, t2) = model.normal_mode_periods();
    assert!((t1 - TAU).abs() < 1e-12);
    assert!((t2 - TAU / 3.0_f64.sqrt()).abs() < 1e-12);

    let heavy = CouplingModel::symmetric(4.0, 1.0, 0.0).unwrap();
    let (t1, t2) = heavy.normal_mode_periods();
    assert!((t1 - 2.0 * TAU).abs() < 1e-12);
    assert!((t2 - 2.0 * TAU).abs() < 1e-12);
}

#[test]
fn display_periods_are_capped_when_springs_go_slack() {
    let model = CouplingModel::symmetric(1.0, 0.0, 0.0).unwrap();
    let (t1, t2) = model.normal_mode_periods();
    assert!(t1.is_infinite() && t2.is_infinite());
    assert_eq!(model.display_periods(), (PERIOD_DISPLAY_MAX, PERIOD_DISPLAY_MAX));
}

#[test]
fn stability_limit_caps_live_edits() {
    let mut model = default_model().with_stability_limit(0.002).unwrap();
    let limit = model.omega_sq_limit();
    assert!((limit - 810_000.0).abs() < 1e-3);

    model.set_masses(0.0).unwrap();
    assert_eq!(model.masses(), (MIN_MASS, MIN_MASS));

    model.set_k1(1e7).unwrap();
    let (k1, _, k3) = model.stiffnesses();
    assert!(k1 < 1e7);
    assert_eq!(k1, k3);
    assert!(model.max_omega_sq() <= limit * (1.0 + 1e-12));

    model.set_k2(1e7).unwrap();
    assert!(model.max_omega_sq() <= limit * (1.0 + 1e-12));

    // Lightening the masses again is held at the stable floor.
    model.set_masses(1e-6).unwrap();
    assert!(model.masses().0 >= MIN_MASS);
    assert!(model.max_omega_sq() <= limit * (1.0 + 1e-9));
}

#[test]
fn stiff_model_rejects_a_coarse_substep() {
    let stiff = CouplingModel::symmetric(1.0, 1e7, 0.0).unwrap();
    assert!(matches!(
        stiff.with_stability_limit(0.002),
        Err(ConfigError::Unstable { .. })
    ));
    assert!(matches!(
        default_model().with_stability_limit(0.0),
        Err(ConfigError::NonPositiveTimestep(_))
    ));
    // Without a limit the setters only clamp sign and mass floor.
    let mut free = default_model();
    free.set_k1(1e7).unwrap();
    assert_eq!(free.stiffnesses().0, 1e7);
}
