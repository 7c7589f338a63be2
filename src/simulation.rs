//! The coupled-oscillator simulation as seen by a presentation layer.
//!
//! All state mutation happens through `&mut Simulation`, so a front-end that
//! keeps the simulation in one execution context gets single-writer semantics
//! for free. Discrete notifications (picker pressed, normal mode found,
//! play/pause changes) are queued and handed out by [`Simulation::drain_events`].

use glam::DVec2;
use smallvec::SmallVec;

use crate::config::SimulationConfig;
use crate::constants::{
    MAX_PENDING_EVENTS, MAX_TICKS_PER_FRAME, MIN_MASS_HALF_EXTENT, MODE_TOLERANCE,
};
use crate::coupling::CouplingModel;
use crate::error::{ensure_finite, ConfigError, Result};
use crate::integrator::{FixedStepper, Integrator};
use crate::interaction::{ActiveDrag, InteractionController, MassId};
use crate::mapper::{snap_to_diagonal, uv_to_rect, AxisRange, CoordinateMapper, PickerRect};
use crate::modes::{classify, ModeMatches, NormalMode};
use crate::state::{PhysicsState, Snapshot};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SimulationEvent {
    /// Pointer went down on the picker; stale mode feedback should be hidden.
    PickerPressed,
    /// A picker release landed on a normal-mode diagonal.
    NormalModeFound(NormalMode),
    PlaybackChanged { paused: bool },
}

/// Marker state reported while the picker is being dragged.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerFeedback {
    pub uv: DVec2,
    /// Marker position relative to the picker center.
    pub rect_position: DVec2,
    pub modes: ModeMatches,
}

/// Positions for the axis markers under the masses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisMarkers {
    pub x1: f64,
    pub x2: f64,
    pub center_of_mass: f64,
    /// Separation change relative to the equilibrium separation.
    pub relative: f64,
}

pub struct Simulation {
    config: SimulationConfig,
    model: CouplingModel,
    state: PhysicsState,
    integrator: Integrator,
    stepper: FixedStepper,
    controller: InteractionController,
    mapper: CoordinateMapper,
    events: SmallVec<[SimulationEvent; 4]>,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let model = CouplingModel::symmetric(config.mass, config.k1, config.k2)?
            .with_stability_limit(config.fixed_dt / config.substeps as f64)?;
        let integrator = Integrator::new(config.substeps)?;
        let mapper = CoordinateMapper::new(
            config.picker.x_range,
            config.picker.y_range,
            config.picker.border_width,
        )?;
        let state = PhysicsState::at_rest(
            DVec2::new(config.x1_ref, config.x2_ref),
            DVec2::new(config.x1_init - config.x1_ref, config.x2_init - config.x2_ref),
            &model,
        );
        log::info!(
            "[sim] mass={} k1={} k2={} x=({:.2},{:.2}) substeps={}",
            config.mass,
            config.k1,
            config.k2,
            state.displacements().x,
            state.displacements().y,
            config.substeps
        );
        Ok(Self {
            stepper: FixedStepper::new(config.fixed_dt, MAX_TICKS_PER_FRAME),
            controller: InteractionController::new(config.start_paused),
            config,
            model,
            state,
            integrator,
            mapper,
            events: SmallVec::new(),
        })
    }

    // ---------------- Time stepping ----------------

    /// Run one fixed tick if not paused. Returns whether the state advanced.
    pub fn fixed_update(&mut self) -> bool {
        if self.controller.is_paused() {
            return false;
        }
        self.integrator
            .tick(&mut self.state, &self.model, self.config.fixed_dt);
        true
    }

    /// Feed a frame's wall-clock time and run the fixed ticks it covers.
    /// Returns the number of ticks that advanced the state.
    pub fn advance_frame(&mut self, frame_dt: f64) -> u32 {
        let ticks = self.stepper.ticks_for(frame_dt);
        (0..ticks).filter(|_| self.fixed_update()).count() as u32
    }

    // ---------------- Reads ----------------

    pub fn displacements(&self) -> DVec2 {
        self.state.displacements()
    }

    pub fn absolute_positions(&self) -> DVec2 {
        self.state.absolute_positions()
    }

    pub fn velocities(&self) -> DVec2 {
        self.state.velocities()
    }

    pub fn state(&self) -> &PhysicsState {
        &self.state
    }

    pub fn model(&self) -> &CouplingModel {
        &self.model
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn energy(&self) -> f64 {
        self.model.energy(&self.state)
    }

    pub fn active_drag(&self) -> ActiveDrag {
        self.controller.active_drag()
    }

    pub fn axis_markers(&self) -> AxisMarkers {
        let p = self.state.absolute_positions();
        AxisMarkers {
            x1: p.x,
            x2: p.y,
            center_of_mass: 0.5 * (p.x + p.y),
            relative: p.y - p.x - 2.0 * self.config.x2_ref,
        }
    }

    /// Endpoints `(left, right)` of spring 1, 2 or 3 along the motion axis.
    /// Outer springs attach to the inner faces of the walls.
    pub fn spring_endpoints(&self, spring: usize) -> Result<(f64, f64)> {
        let p = self.state.absolute_positions();
        let half_wall = 0.5 * self.config.wall_thickness;
        match spring {
            1 => Ok((self.config.wall1_x + half_wall, p.x)),
            2 => Ok((p.x, p.y)),
            3 => Ok((p.y, self.config.wall2_x - half_wall)),
            other => Err(ConfigError::InvalidSpring(other)),
        }
    }

    pub fn normal_mode_periods(&self) -> (f64, f64) {
        self.model.normal_mode_periods()
    }

    pub fn display_periods(&self) -> (f64, f64) {
        self.model.display_periods()
    }

    // ---------------- Direct writes ----------------

    /// Kinematic override of both displacements; velocities become zero.
    pub fn set_displacements(&mut self, x1: f64, x2: f64) -> Result<()> {
        let x1 = ensure_finite("x1", x1)?;
        let x2 = ensure_finite("x2", x2)?;
        self.state
            .apply_kinematic_override(DVec2::new(x1, x2), &self.model);
        Ok(())
    }

    pub fn commit_velocities_at_rest(&mut self) {
        self.state.commit_at_rest(&self.model);
    }

    /// Canned initial condition for one of the two eigenmodes.
    pub fn enter_normal_mode(&mut self, mode: NormalMode, amplitude: f64) -> Result<()> {
        let amplitude = ensure_finite("amplitude", amplitude)?;
        let x2 = match mode {
            NormalMode::Symmetric => -amplitude,
            NormalMode::Antisymmetric => amplitude,
        };
        self.state
            .apply_kinematic_override(DVec2::new(-amplitude, x2), &self.model);
        log::info!("[sim] entered {:?} mode, amplitude {}", mode, amplitude);
        Ok(())
    }

    // ---------------- Playback ----------------

    pub fn is_paused(&self) -> bool {
        self.controller.is_paused()
    }

    pub fn pause(&mut self) {
        let was = self.controller.is_paused();
        self.controller.pause();
        self.note_playback(was);
    }

    pub fn resume(&mut self) {
        let was = self.controller.is_paused();
        self.controller.resume();
        self.note_playback(was);
    }

    fn note_playback(&mut self, was_paused: bool) {
        let paused = self.controller.is_paused();
        if paused != was_paused {
            self.push_event(SimulationEvent::PlaybackChanged { paused });
        }
    }

    /// Restore configured initial conditions at rest. Any active drag is
    /// dropped.
    pub fn reset(&mut self, pause: bool) {
        self.controller.cancel_drag();
        let x = DVec2::new(
            self.config.x1_init - self.config.x1_ref,
            self.config.x2_init - self.config.x2_ref,
        );
        self.state.apply_kinematic_override(x, &self.model);
        self.stepper.reset();
        if pause {
            self.pause();
        }
        log::info!("[sim] reset (paused: {})", self.is_paused());
    }

    // ---------------- Parameters ----------------

    pub fn set_mass(&mut self, value: f64, start_from_rest: bool) -> Result<()> {
        self.model.set_masses(value)?;
        self.after_parameter_change(start_from_rest);
        Ok(())
    }

    pub fn set_k1(&mut self, value: f64, start_from_rest: bool) -> Result<()> {
        self.model.set_k1(value)?;
        self.after_parameter_change(start_from_rest);
        Ok(())
    }

    pub fn set_k2(&mut self, value: f64, start_from_rest: bool) -> Result<()> {
        self.model.set_k2(value)?;
        self.after_parameter_change(start_from_rest);
        Ok(())
    }

    fn after_parameter_change(&mut self, start_from_rest: bool) {
        if start_from_rest {
            self.state.commit_at_rest(&self.model);
        } else {
            self.state.refresh_accelerations(&self.model);
        }
    }

    pub fn set_mass_interactivity(&mut self, interactive: bool) {
        self.config.masses_draggable = interactive;
    }

    pub fn set_picker_rect(&mut self, rect: Option<PickerRect>) {
        self.config.picker.rect = rect;
    }

    pub fn set_snap_to_diagonals(&mut self, snap: bool) {
        self.config.picker.snap_to_diagonals = snap;
    }

    /// New border width; applies from the next picker press.
    pub fn set_picker_border(&mut self, border_width: f64) -> Result<()> {
        self.mapper.set_border_width(border_width)?;
        self.config.picker.border_width = border_width;
        Ok(())
    }

    // ---------------- Persistence ----------------

    pub fn snapshot(&self) -> Snapshot {
        self.state.snapshot()
    }

    pub fn restore(&mut self, snapshot: &Snapshot) -> Result<()> {
        self.state.restore(snapshot, &self.model)
    }

    // ---------------- Mass dragging ----------------

    /// Visual half-width of a mass, growing slowly with its value. Never
    /// smaller than `MIN_MASS_HALF_EXTENT`.
    pub fn mass_half_extent(&self, mass: MassId) -> f64 {
        let (m1, m2) = self.model.masses();
        let m = if mass == MassId::One { m1 } else { m2 };
        (0.5 * (1.0 + m.powf(0.33).max(0.1).log10())).max(MIN_MASS_HALF_EXTENT)
    }

    /// Mass under a surface point, nearest first. Masses sit on `y = 0`.
    pub fn hit_test_mass(&self, point: DVec2) -> Option<MassId> {
        let p = self.state.absolute_positions();
        [(MassId::One, p.x), (MassId::Two, p.y)]
            .into_iter()
            .filter_map(|(id, cx)| {
                let h = self.mass_half_extent(id);
                let d = DVec2::new(point.x - cx, point.y).abs();
                (d.x <= h && d.y <= h).then_some((id, d.length_squared()))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    fn travel_range(&self, mass: MassId) -> AxisRange {
        match mass {
            MassId::One => self.config.x1_travel,
            MassId::Two => self.config.x2_travel,
        }
    }

    pub fn begin_mass_drag(&mut self, mass: MassId) -> bool {
        if !self.config.masses_draggable {
            return false;
        }
        let was = self.controller.is_paused();
        let started = self.controller.begin_mass_drag(mass);
        self.note_playback(was);
        started
    }

    /// Move the dragged mass to absolute axis position `axis_x`, clamped to
    /// its travel range. The other mass keeps its displacement.
    pub fn drag_mass_to(&mut self, axis_x: f64) -> bool {
        let ActiveDrag::Mass(mass) = self.controller.active_drag() else {
            return false;
        };
        if !axis_x.is_finite() {
            return false;
        }
        let abs = self.travel_range(mass).clamp(axis_x);
        let mut x = self.state.displacements();
        let x_ref = self.state.reference_positions();
        match mass {
            MassId::One => x.x = abs - x_ref.x,
            MassId::Two => x.y = abs - x_ref.y,
        }
        self.state.apply_kinematic_override(x, &self.model);
        true
    }

    /// Commit the dragged position at rest and resume if the run was playing
    /// before the drag.
    pub fn release_mass(&mut self) -> Option<MassId> {
        if !matches!(self.controller.active_drag(), ActiveDrag::Mass(_)) {
            return None;
        }
        self.state.commit_at_rest(&self.model);
        let was = self.controller.is_paused();
        let mass = self.controller.end_mass_drag();
        self.note_playback(was);
        mass
    }

    // ---------------- Picker (marker) dragging ----------------

    pub fn picker_rect(&self) -> Option<PickerRect> {
        self.config.picker.rect
    }

    pub fn mapper(&self) -> &CoordinateMapper {
        &self.mapper
    }

    /// UV of the current displacements, for placing the marker.
    pub fn marker_uv(&self) -> DVec2 {
        self.mapper.physical_to_uv(self.state.displacements())
    }

    /// Marker position relative to the picker center, if a picker is placed.
    pub fn marker_rect_position(&self) -> Option<DVec2> {
        let rect = self.config.picker.rect?;
        Some(uv_to_rect(self.marker_uv(), rect.size()))
    }

    pub fn begin_marker_drag(&mut self) -> bool {
        let was = self.controller.is_paused();
        if !self.controller.begin_marker_drag() {
            return false;
        }
        self.mapper.refresh_clamp();
        self.push_event(SimulationEvent::PickerPressed);
        self.note_playback(was);
        true
    }

    fn picker_uv(&self, rect: &PickerRect, point: DVec2) -> DVec2 {
        let mut uv = self.mapper.clamp_uv(rect.surface_to_uv(point));
        if self.config.picker.snap_to_diagonals {
            uv = snap_to_diagonal(uv, self.config.picker.snap_tolerance);
        }
        uv
    }

    fn apply_picker_point(&mut self, point: DVec2) -> Option<MarkerFeedback> {
        let rect = self.config.picker.rect?;
        if !point.is_finite() {
            return None;
        }
        let uv = self.picker_uv(&rect, point);
        let x = self.mapper.uv_to_physical(uv);
        self.state.apply_kinematic_override(x, &self.model);
        Some(MarkerFeedback {
            uv,
            rect_position: uv_to_rect(uv, rect.size()),
            modes: classify(uv, MODE_TOLERANCE),
        })
    }

    /// Map a surface point through the picker and write the result into the
    /// state. Feedback carries live mode matches for highlighting.
    pub fn drag_marker_to(&mut self, point: DVec2) -> Option<MarkerFeedback> {
        if self.controller.active_drag() != ActiveDrag::Marker {
            return None;
        }
        self.apply_picker_point(point)
    }

    /// Final mapping, commit at rest, resume, and report any normal mode the
    /// release landed on.
    pub fn release_marker(&mut self, point: DVec2) -> Option<MarkerFeedback> {
        if self.controller.active_drag() != ActiveDrag::Marker {
            return None;
        }
        let feedback = self.apply_picker_point(point);
        self.state.commit_at_rest(&self.model);
        let was = self.controller.is_paused();
        self.controller.end_marker_drag();
        self.note_playback(was);
        if let Some(fb) = feedback {
            for mode in fb.modes.modes() {
                log::info!("[picker] found normal mode {}", mode.number());
                self.push_event(SimulationEvent::NormalModeFound(mode));
            }
        }
        feedback
    }

    // ---------------- Pointer dispatch ----------------

    /// Route a pointer-down at a surface point to the picker or a mass.
    pub fn pointer_down(&mut self, point: DVec2) -> bool {
        if let Some(rect) = self.config.picker.rect {
            if rect.contains(point) {
                if self.begin_marker_drag() {
                    self.apply_picker_point(point);
                    return true;
                }
                return false;
            }
        }
        match self.hit_test_mass(point) {
            Some(mass) => self.begin_mass_drag(mass),
            None => false,
        }
    }

    pub fn pointer_move(&mut self, point: DVec2) -> Option<MarkerFeedback> {
        match self.controller.active_drag() {
            ActiveDrag::Idle => None,
            ActiveDrag::Mass(_) => {
                self.drag_mass_to(point.x);
                None
            }
            ActiveDrag::Marker => self.drag_marker_to(point),
        }
    }

    pub fn pointer_up(&mut self, point: DVec2) -> Option<MarkerFeedback> {
        match self.controller.active_drag() {
            ActiveDrag::Idle => None,
            ActiveDrag::Mass(_) => {
                self.drag_mass_to(point.x);
                self.release_mass();
                None
            }
            ActiveDrag::Marker => self.release_marker(point),
        }
    }

    // ---------------- Notifications ----------------

    /// Queue a notification. Playback changes collapse to the latest state and
    /// the oldest entries drop once `MAX_PENDING_EVENTS` are waiting.
    fn push_event(&mut self, event: SimulationEvent) {
        if matches!(event, SimulationEvent::PlaybackChanged { .. }) {
            self.events
                .retain(|e| !matches!(e, SimulationEvent::PlaybackChanged { .. }));
        }
        if self.events.len() >= MAX_PENDING_EVENTS {
            self.events.remove(0);
        }
        self.events.push(event);
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    /// Move queued notifications into `out`, oldest first.
    pub fn drain_events(&mut self, out: &mut Vec<SimulationEvent>) {
        out.extend(self.events.drain(..));
    }
}
