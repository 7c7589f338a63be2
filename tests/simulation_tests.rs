// Host-side tests for the simulation facade: gestures, parameters,
// persistence and notifications.

use coupled_oscillations::{
    ActiveDrag, ConfigError, MassId, NormalMode, PickerRect, Simulation, SimulationConfig,
    SimulationEvent, Snapshot,
};
use glam::DVec2;

fn make_sim() -> Simulation {
    Simulation::new(SimulationConfig::default()).unwrap()
}

// Picker centered at the origin spanning [-1, 1] on both axes, so surface
// points map straight onto the default physical picker range.
fn make_sim_with_picker() -> Simulation {
    let mut config = SimulationConfig::default();
    config.picker.rect = Some(PickerRect::new(DVec2::ZERO, DVec2::splat(2.0)));
    Simulation::new(config).unwrap()
}

fn events(sim: &mut Simulation) -> Vec<SimulationEvent> {
    let mut out = Vec::new();
    sim.drain_events(&mut out);
    out
}

#[test]
fn starts_at_configured_initial_conditions() {
    let sim = make_sim();
    assert!(sim.is_paused());
    assert_eq!(sim.displacements(), DVec2::ZERO);
    assert_eq!(sim.absolute_positions(), DVec2::new(-2.0, 2.0));
    assert_eq!(sim.velocities(), DVec2::ZERO);
}

#[test]
fn enter_normal_mode_sets_canned_positions() {
    let mut sim = make_sim();
    sim.enter_normal_mode(NormalMode::Symmetric, 1.0).unwrap();
    assert_eq!(sim.displacements(), DVec2::new(-1.0, -1.0));
    assert_eq!(sim.velocities(), DVec2::ZERO);

    sim.enter_normal_mode(NormalMode::Antisymmetric, 1.0).unwrap();
    assert_eq!(sim.displacements(), DVec2::new(-1.0, 1.0));
    assert_eq!(sim.velocities(), DVec2::ZERO);
    let expected = sim.model().accelerations(sim.displacements());
    assert_eq!(sim.state().accelerations(), expected);
}

#[test]
fn paused_simulation_does_not_advance() {
    let mut sim = make_sim();
    sim.set_displacements(-1.0, 0.5).unwrap();
    assert!(!sim.fixed_update());
    assert_eq!(sim.advance_frame(1.0), 0);
    assert_eq!(sim.displacements(), DVec2::new(-1.0, 0.5));
}

#[test]
fn running_simulation_conserves_energy() {
    let mut sim = make_sim();
    sim.set_displacements(-1.0, 0.5).unwrap();
    sim.resume();
    let e0 = sim.energy();
    for _ in 0..1000 {
        assert!(sim.fixed_update());
    }
    assert!((sim.energy() - e0).abs() / e0 < 0.01);
    assert_ne!(sim.displacements(), DVec2::new(-1.0, 0.5));
}

#[test]
fn mass_drag_from_paused_stays_paused() {
    let mut sim = make_sim();
    assert!(sim.begin_mass_drag(MassId::One));
    assert!(sim.drag_mass_to(-3.0));
    assert_eq!(sim.displacements(), DVec2::new(-1.0, 0.0));
    assert_eq!(sim.velocities(), DVec2::ZERO);
    assert_eq!(sim.release_mass(), Some(MassId::One));
    assert!(sim.is_paused());
    assert_eq!(sim.active_drag(), ActiveDrag::Idle);
    let expected = sim.model().accelerations(sim.displacements());
    assert_eq!(sim.state().accelerations(), expected);
}

#[test]
fn mass_drag_from_running_resumes_and_zeroes_velocity() {
    let mut sim = make_sim();
    sim.set_displacements(-1.0, 0.5).unwrap();
    sim.resume();
    for _ in 0..10 {
        sim.fixed_update();
    }
    assert_ne!(sim.velocities(), DVec2::ZERO);
    let x2_before = sim.displacements().y;

    assert!(sim.begin_mass_drag(MassId::One));
    assert!(sim.is_paused());
    sim.drag_mass_to(-2.5);
    assert_eq!(sim.velocities(), DVec2::ZERO);
    assert_eq!(sim.displacements().y, x2_before);
    sim.release_mass();
    assert!(!sim.is_paused());
    assert_eq!(sim.velocities(), DVec2::ZERO);
}

#[test]
fn mass_drag_is_clamped_to_travel_range() {
    let mut sim = make_sim();
    sim.begin_mass_drag(MassId::Two);
    sim.drag_mass_to(100.0);
    assert_eq!(sim.absolute_positions().y, 3.5);
    sim.drag_mass_to(-100.0);
    assert_eq!(sim.absolute_positions().y, 0.5);
    sim.release_mass();
}

#[test]
fn masses_can_be_made_non_interactive() {
    let mut sim = make_sim();
    sim.set_mass_interactivity(false);
    assert!(!sim.begin_mass_drag(MassId::One));
    assert!(!sim.pointer_down(DVec2::new(-2.0, 0.0)));
    assert_eq!(sim.active_drag(), ActiveDrag::Idle);
}

#[test]
fn hit_test_finds_mass_under_pointer() {
    let sim = make_sim();
    assert_eq!(sim.mass_half_extent(MassId::One), 0.5);
    assert_eq!(sim.hit_test_mass(DVec2::new(-2.2, 0.1)), Some(MassId::One));
    assert_eq!(sim.hit_test_mass(DVec2::new(2.4, -0.4)), Some(MassId::Two));
    assert_eq!(sim.hit_test_mass(DVec2::ZERO), None);
    assert_eq!(sim.hit_test_mass(DVec2::new(-2.0, 0.6)), None);
}

#[test]
fn pointer_dispatch_drags_masses() {
    let mut sim = make_sim();
    assert!(sim.pointer_down(DVec2::new(-2.0, 0.0)));
    assert_eq!(sim.active_drag(), ActiveDrag::Mass(MassId::One));
    assert!(sim.pointer_move(DVec2::new(-2.5, 3.0)).is_none());
    assert_eq!(sim.displacements(), DVec2::new(-0.5, 0.0));
    sim.pointer_up(DVec2::new(-2.25, 3.0));
    assert_eq!(sim.displacements(), DVec2::new(-0.25, 0.0));
    assert_eq!(sim.active_drag(), ActiveDrag::Idle);
}

#[test]
fn picker_release_at_center_fires_no_mode() {
    let mut sim = make_sim_with_picker();
    assert!(sim.pointer_down(DVec2::ZERO));
    assert_eq!(sim.active_drag(), ActiveDrag::Marker);
    let fb = sim.pointer_up(DVec2::ZERO).unwrap();
    assert_eq!(fb.uv, DVec2::splat(0.5));
    assert!(!fb.modes.any());
    assert_eq!(sim.displacements(), DVec2::ZERO);
    assert!(!sim.is_paused());

    let evs = events(&mut sim);
    assert!(evs.contains(&SimulationEvent::PickerPressed));
    assert!(!evs
        .iter()
        .any(|e| matches!(e, SimulationEvent::NormalModeFound(_))));
}

#[test]
fn picker_release_on_diagonal_reports_symmetric_mode() {
    let mut sim = make_sim_with_picker();
    sim.pointer_down(DVec2::new(-0.3, 0.8));
    let live = sim.pointer_move(DVec2::new(0.5, 0.5)).unwrap();
    assert!(live.modes.symmetric);
    assert!(sim.is_paused());

    let fb = sim.pointer_up(DVec2::new(0.5, 0.5)).unwrap();
    assert_eq!(fb.uv, DVec2::splat(0.75));
    assert_eq!(fb.rect_position, DVec2::splat(0.5));
    assert_eq!(sim.displacements(), DVec2::splat(0.5));
    assert_eq!(sim.velocities(), DVec2::ZERO);
    assert!(!sim.is_paused());

    let evs = events(&mut sim);
    assert_eq!(
        evs,
        vec![
            SimulationEvent::PickerPressed,
            SimulationEvent::PlaybackChanged { paused: false },
            SimulationEvent::NormalModeFound(NormalMode::Symmetric),
        ]
    );
}

#[test]
fn picker_release_on_antidiagonal_reports_antisymmetric_mode() {
    let mut sim = make_sim_with_picker();
    sim.pointer_down(DVec2::new(0.5, -0.5));
    sim.pointer_up(DVec2::new(0.5, -0.5));
    assert_eq!(sim.displacements(), DVec2::new(0.5, -0.5));
    let evs = events(&mut sim);
    assert!(evs.contains(&SimulationEvent::NormalModeFound(NormalMode::Antisymmetric)));
    assert!(!evs.contains(&SimulationEvent::NormalModeFound(NormalMode::Symmetric)));
}

#[test]
fn picker_resumes_even_if_paused_before_press() {
    let mut sim = make_sim_with_picker();
    assert!(sim.is_paused());
    sim.pointer_down(DVec2::new(0.2, 0.1));
    sim.pointer_up(DVec2::new(0.2, 0.1));
    assert!(!sim.is_paused());
}

#[test]
fn picker_clamps_pointer_outside_the_rect() {
    let mut config = SimulationConfig::default();
    config.picker.rect = Some(PickerRect::new(DVec2::ZERO, DVec2::splat(2.0)));
    config.picker.border_width = 0.5;
    let mut sim = Simulation::new(config).unwrap();
    sim.pointer_down(DVec2::new(0.9, 0.9));
    let fb = sim.pointer_move(DVec2::new(50.0, -50.0)).unwrap();
    assert_eq!(fb.uv, DVec2::new(0.75, 0.25));
    assert_eq!(sim.displacements(), DVec2::new(0.5, -0.5));
    sim.pointer_up(DVec2::new(50.0, -50.0));
}

#[test]
fn picker_snaps_to_diagonals_when_enabled() {
    let mut sim = make_sim_with_picker();
    sim.set_snap_to_diagonals(true);
    sim.pointer_down(DVec2::new(0.6, 0.56));
    let fb = sim.pointer_up(DVec2::new(0.6, 0.56)).unwrap();
    assert!((fb.uv.x - fb.uv.y).abs() < 1e-12);
    assert!((sim.displacements().x - 0.58).abs() < 1e-12);
}

#[test]
fn picker_press_is_ignored_during_mass_drag() {
    let mut sim = make_sim_with_picker();
    sim.set_displacements(-1.0, 0.0).unwrap();
    // Mass 1 sits at -3.0, outside the picker rect.
    assert!(sim.pointer_down(DVec2::new(-3.0, 0.0)));
    assert!(!sim.begin_marker_drag());
    assert!(sim.drag_marker_to(DVec2::ZERO).is_none());
    assert_eq!(sim.active_drag(), ActiveDrag::Mass(MassId::One));
    assert!(!events(&mut sim).contains(&SimulationEvent::PickerPressed));
}

#[test]
fn marker_tracks_displacements() {
    let mut sim = make_sim_with_picker();
    sim.set_displacements(0.5, -1.0).unwrap();
    assert_eq!(sim.marker_uv(), DVec2::new(0.75, 0.0));
    assert_eq!(sim.marker_rect_position(), Some(DVec2::new(0.5, -1.0)));
    assert_eq!(make_sim().marker_rect_position(), None);
}

#[test]
fn parameter_changes_can_start_from_rest() {
    let mut sim = make_sim();
    sim.set_displacements(-1.0, 0.5).unwrap();
    sim.resume();
    for _ in 0..5 {
        sim.fixed_update();
    }
    sim.set_k2(2.0, false).unwrap();
    assert_ne!(sim.velocities(), DVec2::ZERO);
    let expected = sim.model().accelerations(sim.displacements());
    assert_eq!(sim.state().accelerations(), expected);

    sim.set_k1(3.0, true).unwrap();
    assert_eq!(sim.velocities(), DVec2::ZERO);
    assert_eq!(sim.model().stiffnesses(), (3.0, 2.0, 3.0));
}

#[test]
fn zero_mass_slider_does_not_poison_state() {
    let mut sim = make_sim();
    sim.set_displacements(-1.0, 0.5).unwrap();
    sim.set_mass(0.0, true).unwrap();
    sim.resume();
    for _ in 0..100 {
        sim.fixed_update();
    }
    assert!(sim.displacements().is_finite());
    assert!(sim.set_k1(f64::NAN, false).is_err());
    assert!(sim.set_displacements(f64::INFINITY, 0.0).is_err());
}

#[test]
fn zero_mass_slider_with_stiff_springs_stays_finite() {
    for (mass, k1) in [(0.0, 1_000.0), (0.0, 2_000.0), (1.0, 1e7)] {
        let mut sim = make_sim();
        sim.set_mass(mass, true).unwrap();
        sim.set_k1(k1, true).unwrap();
        sim.set_displacements(-1.0, 0.5).unwrap();
        sim.resume();
        for tick in 0..1000 {
            sim.fixed_update();
            assert!(
                sim.displacements().is_finite(),
                "mass {mass} k1 {k1}: non-finite at tick {tick}"
            );
        }
        let model = sim.model();
        assert!(model.max_omega_sq() <= model.omega_sq_limit() * (1.0 + 1e-12));
    }
}

#[test]
fn stiff_spring_then_zero_mass_stays_finite() {
    let mut sim = make_sim();
    sim.set_k1(1e7, true).unwrap();
    sim.set_k2(1e7, true).unwrap();
    sim.set_mass(0.0, true).unwrap();
    sim.set_displacements(-1.0, 0.5).unwrap();
    sim.resume();
    for _ in 0..1000 {
        sim.fixed_update();
    }
    assert!(sim.displacements().is_finite());
    assert!(sim.velocities().is_finite());
}

#[test]
fn unstable_config_is_rejected() {
    let config = SimulationConfig {
        k1: 1e7,
        ..SimulationConfig::default()
    };
    assert!(matches!(
        Simulation::new(config),
        Err(ConfigError::Unstable { .. })
    ));
}

#[test]
fn tiny_masses_stay_grabbable() {
    let mut sim = make_sim();
    sim.set_mass(0.0, true).unwrap();
    assert!(sim.mass_half_extent(MassId::One) >= 0.15);
    assert_eq!(sim.hit_test_mass(DVec2::new(-2.05, 0.05)), Some(MassId::One));
    assert!(sim.begin_mass_drag(MassId::One));
}

#[test]
fn undrained_events_stay_bounded() {
    let mut sim = make_sim_with_picker();
    for _ in 0..100 {
        sim.resume();
        sim.pause();
        sim.pointer_down(DVec2::ZERO);
        sim.pointer_up(DVec2::new(0.3, 0.4));
    }
    assert!(sim.pending_events() <= 16);
    let evs = events(&mut sim);
    let playback: Vec<_> = evs
        .iter()
        .filter(|e| matches!(e, SimulationEvent::PlaybackChanged { .. }))
        .collect();
    assert_eq!(playback, vec![&SimulationEvent::PlaybackChanged { paused: false }]);
    assert_eq!(sim.pending_events(), 0);
}

#[test]
fn spring_endpoints_follow_masses_and_walls() {
    let mut sim = make_sim();
    sim.set_displacements(-0.5, 1.0).unwrap();
    assert_eq!(sim.spring_endpoints(1).unwrap(), (-4.75, -2.5));
    assert_eq!(sim.spring_endpoints(2).unwrap(), (-2.5, 3.0));
    assert_eq!(sim.spring_endpoints(3).unwrap(), (3.0, 4.75));
    assert_eq!(sim.spring_endpoints(0), Err(ConfigError::InvalidSpring(0)));
    assert_eq!(sim.spring_endpoints(4), Err(ConfigError::InvalidSpring(4)));
}

#[test]
fn axis_markers_report_center_of_mass_and_relative_coordinate() {
    let mut sim = make_sim();
    sim.set_displacements(-0.5, 1.0).unwrap();
    let m = sim.axis_markers();
    assert_eq!(m.x1, -2.5);
    assert_eq!(m.x2, 3.0);
    assert_eq!(m.center_of_mass, 0.25);
    assert_eq!(m.relative, 1.5);
}

#[test]
fn snapshot_survives_reinitialization() {
    let mut sim = make_sim();
    sim.set_displacements(-1.0, 0.5).unwrap();
    sim.resume();
    for _ in 0..37 {
        sim.fixed_update();
    }
    let snap = sim.snapshot();
    let json = snap.to_json().unwrap();

    let mut fresh = make_sim();
    fresh.restore(&Snapshot::from_json(&json).unwrap()).unwrap();
    assert_eq!(fresh.snapshot(), snap);
    assert_eq!(
        fresh.state().accelerations(),
        fresh.model().accelerations(fresh.displacements())
    );
}

#[test]
fn corrupt_snapshots_are_rejected() {
    let mut sim = make_sim();
    let bad = Snapshot {
        x1: f64::NAN,
        ..Snapshot::default()
    };
    assert!(sim.restore(&bad).is_err());
    assert_eq!(sim.displacements(), DVec2::ZERO);
    assert!(matches!(
        Snapshot::from_json("[1, 2]"),
        Err(ConfigError::Snapshot(_))
    ));
}

#[test]
fn reset_restores_initial_conditions() {
    let mut sim = make_sim();
    sim.set_displacements(-1.0, 0.5).unwrap();
    sim.resume();
    sim.fixed_update();
    sim.begin_mass_drag(MassId::Two);
    sim.reset(true);
    assert_eq!(sim.displacements(), DVec2::ZERO);
    assert_eq!(sim.velocities(), DVec2::ZERO);
    assert_eq!(sim.active_drag(), ActiveDrag::Idle);
    assert!(sim.is_paused());
}

#[test]
fn playback_changes_are_announced_once() {
    let mut sim = make_sim();
    sim.pause();
    assert!(events(&mut sim).is_empty());
    sim.resume();
    sim.resume();
    assert_eq!(
        events(&mut sim),
        vec![SimulationEvent::PlaybackChanged { paused: false }]
    );
}

#[test]
fn periods_are_exposed_and_capped() {
    let mut sim = make_sim();
    let (t1, t2) = sim.normal_mode_periods();
    assert!(t1 > t2);
    sim.set_k1(0.0, false).unwrap();
    sim.set_k2(0.0, false).unwrap();
    assert_eq!(sim.display_periods(), (99.99, 99.99));
}

#[test]
fn config_loads_partial_json() {
    let config = SimulationConfig::from_json_str(r#"{ "mass": 2.0, "k2": 0.5 }"#).unwrap();
    assert_eq!(config.mass, 2.0);
    assert_eq!(config.k2, 0.5);
    assert_eq!(config.k1, SimulationConfig::default().k1);
    assert_eq!(config.substeps, 10);

    let round = SimulationConfig::from_json_str(&config.to_json_string().unwrap()).unwrap();
    assert_eq!(round, config);
}

#[test]
fn invalid_configs_fail_fast() {
    assert!(matches!(
        SimulationConfig::from_json_str(r#"{ "substeps": 0 }"#),
        Err(ConfigError::ZeroSubsteps)
    ));
    assert!(matches!(
        SimulationConfig::from_json_str("not json"),
        Err(ConfigError::Config(_))
    ));

    let mut config = SimulationConfig::default();
    config.mass = 0.0;
    assert!(matches!(
        Simulation::new(config),
        Err(ConfigError::NonPositiveMass(_))
    ));

    let mut config = SimulationConfig::default();
    config.picker.x_range.max = config.picker.x_range.min;
    assert!(matches!(
        Simulation::new(config),
        Err(ConfigError::DegenerateRange { .. })
    ));
}
