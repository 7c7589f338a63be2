use glam::DVec2;
use instant::Instant;
use js_sys::{Array, Float64Array};
use wasm_bindgen::prelude::*;
use web_sys as web;

use coupled_oscillations::constants::DEFAULT_MODE_AMPLITUDE;
use coupled_oscillations::{
    ConfigError, NormalMode, PickerRect, Simulation, SimulationConfig, SimulationEvent, Snapshot,
};

use crate::surface::element_to_world;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
    log::info!("coupled-web starting");
    Ok(())
}

fn js_err(e: ConfigError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

fn mode_from_number(number: u8) -> Result<NormalMode, JsValue> {
    match number {
        1 => Ok(NormalMode::Symmetric),
        2 => Ok(NormalMode::Antisymmetric),
        other => Err(JsValue::from_str(&format!("no normal mode {other}"))),
    }
}

fn pair(v: DVec2) -> Float64Array {
    Float64Array::from(&v.to_array()[..])
}

fn pointer_world(ev: &web::PointerEvent, el: &web::Element) -> DVec2 {
    let rect = el.get_bounding_client_rect();
    element_to_world(
        ev.client_x() as f64 - rect.left(),
        ev.client_y() as f64 - rect.top(),
        rect.width(),
        rect.height(),
    )
}

/// Browser-facing handle. The page drives `frame()` from
/// `requestAnimationFrame` and forwards pointer events; all mutation stays on
/// the page's single thread.
#[wasm_bindgen]
pub struct WebSimulation {
    sim: Simulation,
    last_frame: Option<Instant>,
    events: Vec<SimulationEvent>,
}

#[wasm_bindgen]
impl WebSimulation {
    /// Build from an optional JSON config; defaults otherwise.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<WebSimulation, JsValue> {
        let config = match config_json {
            Some(json) => SimulationConfig::from_json_str(&json).map_err(js_err)?,
            None => SimulationConfig::default(),
        };
        Ok(Self {
            sim: Simulation::new(config).map_err(js_err)?,
            last_frame: None,
            events: Vec::new(),
        })
    }

    /// Advance by the wall-clock time since the previous call. Returns the
    /// number of fixed ticks that ran.
    pub fn frame(&mut self) -> u32 {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| (now - last).as_secs_f64())
            .unwrap_or(0.0);
        self.last_frame = Some(now);
        self.sim.advance_frame(dt)
    }

    pub fn displacements(&self) -> Float64Array {
        pair(self.sim.displacements())
    }

    pub fn positions(&self) -> Float64Array {
        pair(self.sim.absolute_positions())
    }

    pub fn energy(&self) -> f64 {
        self.sim.energy()
    }

    /// `[T1, T2]` clamped for display.
    pub fn periods(&self) -> Float64Array {
        let (t1, t2) = self.sim.display_periods();
        Float64Array::from(&[t1, t2][..])
    }

    pub fn spring_endpoints(&self, spring: usize) -> Result<Float64Array, JsValue> {
        let (l, r) = self.sim.spring_endpoints(spring).map_err(js_err)?;
        Ok(Float64Array::from(&[l, r][..]))
    }

    pub fn center_of_mass(&self) -> f64 {
        self.sim.axis_markers().center_of_mass
    }

    pub fn is_paused(&self) -> bool {
        self.sim.is_paused()
    }

    pub fn pause(&mut self) {
        self.sim.pause();
    }

    pub fn resume(&mut self) {
        self.sim.resume();
    }

    pub fn reset(&mut self, pause: bool) {
        self.sim.reset(pause);
        self.last_frame = None;
    }

    pub fn set_mass(&mut self, value: f64, start_from_rest: bool) -> Result<(), JsValue> {
        self.sim.set_mass(value, start_from_rest).map_err(js_err)
    }

    pub fn set_k1(&mut self, value: f64, start_from_rest: bool) -> Result<(), JsValue> {
        self.sim.set_k1(value, start_from_rest).map_err(js_err)
    }

    pub fn set_k2(&mut self, value: f64, start_from_rest: bool) -> Result<(), JsValue> {
        self.sim.set_k2(value, start_from_rest).map_err(js_err)
    }

    /// Mode `1` (symmetric) or `2` (antisymmetric); a non-finite or missing
    /// amplitude falls back to the default.
    pub fn enter_normal_mode(&mut self, mode: u8, amplitude: Option<f64>) -> Result<(), JsValue> {
        let mode = mode_from_number(mode)?;
        let amplitude = amplitude
            .filter(|a| a.is_finite())
            .unwrap_or(DEFAULT_MODE_AMPLITUDE);
        self.sim.enter_normal_mode(mode, amplitude).map_err(js_err)
    }

    pub fn set_mass_interactivity(&mut self, interactive: bool) {
        self.sim.set_mass_interactivity(interactive);
    }

    pub fn set_snap_to_diagonals(&mut self, snap: bool) {
        self.sim.set_snap_to_diagonals(snap);
    }

    pub fn set_picker_border(&mut self, border_width: f64) -> Result<(), JsValue> {
        self.sim.set_picker_border(border_width).map_err(js_err)
    }

    /// Place the picker in world coordinates.
    pub fn set_picker_rect(&mut self, center_x: f64, center_y: f64, width: f64, height: f64) {
        self.sim.set_picker_rect(Some(PickerRect::new(
            DVec2::new(center_x, center_y),
            DVec2::new(width, height),
        )));
    }

    pub fn marker_uv(&self) -> Float64Array {
        pair(self.sim.marker_uv())
    }

    pub fn pointer_down(&mut self, ev: &web::PointerEvent, el: &web::Element) -> bool {
        self.sim.pointer_down(pointer_world(ev, el))
    }

    /// Returns the live mode numbers under the marker while dragging it.
    pub fn pointer_move(&mut self, ev: &web::PointerEvent, el: &web::Element) -> Array {
        let out = Array::new();
        if let Some(fb) = self.sim.pointer_move(pointer_world(ev, el)) {
            for mode in fb.modes.modes() {
                out.push(&JsValue::from(mode.number()));
            }
        }
        out
    }

    pub fn pointer_up(&mut self, ev: &web::PointerEvent, el: &web::Element) {
        self.sim.pointer_up(pointer_world(ev, el));
    }

    pub fn save_state(&self) -> Result<String, JsValue> {
        self.sim.snapshot().to_json().map_err(js_err)
    }

    pub fn load_state(&mut self, json: &str) -> Result<(), JsValue> {
        let snapshot = Snapshot::from_json(json).map_err(js_err)?;
        self.sim.restore(&snapshot).map_err(js_err)
    }

    /// Normal modes found since the last call, as mode numbers. A picker
    /// press is reported as `0` so the page can hide stale feedback.
    pub fn drain_mode_events(&mut self) -> Array {
        self.events.clear();
        self.sim.drain_events(&mut self.events);
        let out = Array::new();
        for ev in &self.events {
            match ev {
                SimulationEvent::PickerPressed => {
                    out.push(&JsValue::from(0u8));
                }
                SimulationEvent::NormalModeFound(mode) => {
                    out.push(&JsValue::from(mode.number()));
                }
                SimulationEvent::PlaybackChanged { paused } => {
                    log::info!("[sim] {}", if *paused { "paused" } else { "playing" });
                }
            }
        }
        out
    }
}
