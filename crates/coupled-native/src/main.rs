mod render;
mod scheduler;

use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};

use glam::DVec2;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use coupled_oscillations::{NormalMode, PickerRect, SimulationConfig};

use render::GpuState;
use scheduler::{Command, FrameSnapshot};

fn load_config() -> anyhow::Result<SimulationConfig> {
    let mut config = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path)?;
            log::info!("[config] loaded {}", path);
            SimulationConfig::from_json_str(&json)?
        }
        None => SimulationConfig::default(),
    };
    if config.picker.rect.is_none() {
        config.picker.rect = Some(PickerRect::new(
            DVec2::new(0.0, -2.0),
            DVec2::splat(2.2),
        ));
    }
    Ok(config)
}

fn key_command(key: &Key) -> Option<Command> {
    match key {
        Key::Named(NamedKey::Space) => Some(Command::TogglePause),
        Key::Character(s) => match s.as_str() {
            "r" | "R" => Some(Command::Reset),
            "1" => Some(Command::EnterMode(NormalMode::Symmetric)),
            "2" => Some(Command::EnterMode(NormalMode::Antisymmetric)),
            "s" | "S" => Some(Command::ToggleSnap),
            other => other.chars().next().and_then(Command::from_param_key),
        },
        _ => None,
    }
}

fn send(tx: &Sender<Command>, cmd: Command) {
    if tx.send(cmd).is_err() {
        log::warn!("[input] simulation thread is gone");
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = load_config()?;
    let shared = Arc::new(Mutex::new(FrameSnapshot::default()));
    let (tx, rx) = mpsc::channel();
    let mut sim_thread = Some(scheduler::spawn(config, rx, Arc::clone(&shared))?);

    let event_loop = EventLoop::new()?;
    let window = WindowBuilder::new()
        .with_title("Coupled Oscillations")
        .build(&event_loop)?;
    let mut state = pollster::block_on(GpuState::new(&window))?;
    let mut cursor = DVec2::ZERO;

    log::info!("[ui] space: play/pause, r: reset, 1/2: normal modes, s: snap");
    log::info!("[ui] m/k/c raise mass, k1, k2; shift lowers");

    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { event, .. } => match event {
            WindowEvent::Resized(size) => state.resize(size),
            WindowEvent::CloseRequested => {
                send(&tx, Command::Shutdown);
                if let Some(handle) = sim_thread.take() {
                    if handle.join().is_err() {
                        log::error!("[sim] thread panicked");
                    }
                }
                elwt.exit();
            }
            WindowEvent::CursorMoved { position, .. } => {
                cursor = state.viewport.pixel_to_world(position.x, position.y);
                send(&tx, Command::PointerMove(cursor));
            }
            WindowEvent::MouseInput {
                state: button_state,
                button: MouseButton::Left,
                ..
            } => match button_state {
                ElementState::Pressed => send(&tx, Command::PointerDown(cursor)),
                ElementState::Released => send(&tx, Command::PointerUp(cursor)),
            },
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        logical_key,
                        state: ElementState::Pressed,
                        ..
                    },
                ..
            } => {
                if let Some(cmd) = key_command(&logical_key) {
                    send(&tx, cmd);
                }
            }
            _ => {}
        },
        Event::AboutToWait => {
            let frame = match shared.lock() {
                Ok(guard) => *guard,
                Err(_) => return,
            };
            match state.render(&frame) {
                Ok(_) => state.window.request_redraw(),
                Err(wgpu::SurfaceError::Lost) => state.resize(state.window.inner_size()),
                Err(wgpu::SurfaceError::OutOfMemory) => elwt.exit(),
                Err(_) => {}
            }
        }
        _ => {}
    })?;
    Ok(())
}
