//! Simulation thread: owns the [`Simulation`], applies input commands, runs
//! fixed ticks and publishes a copied [`FrameSnapshot`] for the renderer.

use std::path::PathBuf;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use coupled_oscillations::constants::DEFAULT_MODE_AMPLITUDE;
use coupled_oscillations::{
    ModeMatches, NormalMode, PickerRect, Simulation, SimulationConfig, SimulationEvent, Snapshot,
};
use glam::DVec2;

// Slider-like step applied by the parameter keys
const PARAM_STEP: f64 = 0.1;

pub enum Command {
    PointerDown(DVec2),
    PointerMove(DVec2),
    PointerUp(DVec2),
    TogglePause,
    Reset,
    EnterMode(NormalMode),
    NudgeMass(f64),
    NudgeK1(f64),
    NudgeK2(f64),
    ToggleSnap,
    Shutdown,
}

impl Command {
    pub fn from_param_key(key: char) -> Option<Self> {
        match key {
            'm' => Some(Command::NudgeMass(PARAM_STEP)),
            'k' => Some(Command::NudgeK1(PARAM_STEP)),
            'c' => Some(Command::NudgeK2(PARAM_STEP)),
            'M' => Some(Command::NudgeMass(-PARAM_STEP)),
            'K' => Some(Command::NudgeK1(-PARAM_STEP)),
            'C' => Some(Command::NudgeK2(-PARAM_STEP)),
            _ => None,
        }
    }
}

/// Everything the renderer needs for one frame, copied out of the simulation.
#[derive(Clone, Copy, Debug, Default)]
pub struct FrameSnapshot {
    pub positions: [f32; 2],
    pub mass_half_extents: [f32; 2],
    pub springs: [[f32; 2]; 3],
    pub stiffnesses: [f32; 3],
    pub walls: [f32; 2],
    pub wall_thickness: f32,
    pub center_of_mass: f32,
    pub picker: Option<PickerRect>,
    pub marker: [f32; 2],
    pub live_modes: ModeMatches,
    pub found_mode: Option<NormalMode>,
    pub paused: bool,
}

pub fn snapshot_path() -> PathBuf {
    std::env::temp_dir().join("coupled-oscillations.snapshot.json")
}

fn load_snapshot(sim: &mut Simulation) {
    let path = snapshot_path();
    let Ok(json) = std::fs::read_to_string(&path) else {
        return;
    };
    match Snapshot::from_json(&json).and_then(|s| sim.restore(&s)) {
        Ok(()) => log::info!("[persist] restored state from {}", path.display()),
        Err(e) => log::warn!("[persist] ignoring {}: {}", path.display(), e),
    }
}

fn save_snapshot(sim: &Simulation) {
    let path = snapshot_path();
    let result = sim
        .snapshot()
        .to_json()
        .map_err(anyhow::Error::from)
        .and_then(|json| std::fs::write(&path, json).map_err(anyhow::Error::from));
    match result {
        Ok(()) => log::info!("[persist] saved state to {}", path.display()),
        Err(e) => log::warn!("[persist] could not save {}: {}", path.display(), e),
    }
}

struct Worker {
    sim: Simulation,
    live_modes: ModeMatches,
    found_mode: Option<NormalMode>,
    events: Vec<SimulationEvent>,
}

impl Worker {
    fn apply(&mut self, cmd: Command) -> anyhow::Result<bool> {
        match cmd {
            Command::PointerDown(p) => {
                self.sim.pointer_down(p);
            }
            Command::PointerMove(p) => {
                if let Some(fb) = self.sim.pointer_move(p) {
                    self.live_modes = fb.modes;
                }
            }
            Command::PointerUp(p) => {
                self.sim.pointer_up(p);
                self.live_modes = ModeMatches::default();
            }
            Command::TogglePause => {
                if self.sim.is_paused() {
                    self.sim.resume();
                } else {
                    self.sim.pause();
                }
            }
            Command::Reset => self.sim.reset(true),
            Command::EnterMode(mode) => self.sim.enter_normal_mode(mode, DEFAULT_MODE_AMPLITUDE)?,
            Command::NudgeMass(d) => {
                let (m, _) = self.sim.model().masses();
                self.sim.set_mass(round_tenths(m + d), true)?;
                self.log_params();
            }
            Command::NudgeK1(d) => {
                let (k1, _, _) = self.sim.model().stiffnesses();
                self.sim.set_k1(round_tenths(k1 + d), true)?;
                self.log_params();
            }
            Command::NudgeK2(d) => {
                let (_, k2, _) = self.sim.model().stiffnesses();
                self.sim.set_k2(round_tenths(k2 + d), true)?;
                self.log_params();
            }
            Command::ToggleSnap => {
                let snap = !self.sim.config().picker.snap_to_diagonals;
                self.sim.set_snap_to_diagonals(snap);
                log::info!("[picker] snap to diagonals: {}", snap);
            }
            Command::Shutdown => return Ok(false),
        }
        Ok(true)
    }

    fn log_params(&self) {
        let (m, _) = self.sim.model().masses();
        let (k1, k2, _) = self.sim.model().stiffnesses();
        let (t1, t2) = self.sim.display_periods();
        log::info!(
            "[params] m={:.1} k1={:.1} k2={:.1} T1={:.2}s T2={:.2}s",
            m,
            k1,
            k2,
            t1,
            t2
        );
    }

    fn handle_events(&mut self) {
        self.events.clear();
        self.sim.drain_events(&mut self.events);
        for ev in &self.events {
            match ev {
                SimulationEvent::PickerPressed => self.found_mode = None,
                SimulationEvent::NormalModeFound(mode) => {
                    log::info!("[feedback] normal mode {} found", mode.number());
                    self.found_mode = Some(*mode);
                }
                SimulationEvent::PlaybackChanged { paused } => {
                    log::info!("[sim] {}", if *paused { "paused" } else { "playing" });
                }
            }
        }
    }

    fn snapshot(&self) -> FrameSnapshot {
        let sim = &self.sim;
        let p = sim.absolute_positions();
        let spring = |i: usize| {
            sim.spring_endpoints(i)
                .map(|(l, r)| [l as f32, r as f32])
                .unwrap_or_default()
        };
        let (k1, k2, k3) = sim.model().stiffnesses();
        let cfg = sim.config();
        let marker = sim.marker_uv();
        FrameSnapshot {
            positions: [p.x as f32, p.y as f32],
            mass_half_extents: [
                sim.mass_half_extent(coupled_oscillations::MassId::One) as f32,
                sim.mass_half_extent(coupled_oscillations::MassId::Two) as f32,
            ],
            springs: [spring(1), spring(2), spring(3)],
            stiffnesses: [k1 as f32, k2 as f32, k3 as f32],
            walls: [cfg.wall1_x as f32, cfg.wall2_x as f32],
            wall_thickness: cfg.wall_thickness as f32,
            center_of_mass: sim.axis_markers().center_of_mass as f32,
            picker: sim.picker_rect(),
            marker: [marker.x as f32, marker.y as f32],
            live_modes: self.live_modes,
            found_mode: self.found_mode,
            paused: sim.is_paused(),
        }
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Spawn the simulation thread. The thread is the only writer of simulation
/// state; the renderer only ever sees copies.
pub fn spawn(
    config: SimulationConfig,
    commands: Receiver<Command>,
    shared: Arc<Mutex<FrameSnapshot>>,
) -> anyhow::Result<thread::JoinHandle<()>> {
    let mut sim = Simulation::new(config)?;
    load_snapshot(&mut sim);
    let mut worker = Worker {
        sim,
        live_modes: ModeMatches::default(),
        found_mode: None,
        events: Vec::new(),
    };
    let handle = thread::Builder::new()
        .name("oscillator-sim".into())
        .spawn(move || {
            let mut last = Instant::now();
            'run: loop {
                loop {
                    match commands.try_recv() {
                        Ok(cmd) => match worker.apply(cmd) {
                            Ok(true) => {}
                            Ok(false) => break 'run,
                            Err(e) => log::warn!("[input] rejected: {}", e),
                        },
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => break 'run,
                    }
                }

                let now = Instant::now();
                let dt = now - last;
                last = now;
                worker.sim.advance_frame(dt.as_secs_f64());
                worker.handle_events();

                let frame = worker.snapshot();
                if let Ok(mut guard) = shared.lock() {
                    *guard = frame;
                }
                thread::sleep(Duration::from_millis(4));
            }
            save_snapshot(&worker.sim);
        })?;
    Ok(handle)
}
