pub mod config;
pub mod constants;
pub mod coupling;
pub mod error;
pub mod integrator;
pub mod interaction;
pub mod mapper;
pub mod modes;
pub mod simulation;
pub mod state;

pub use config::{PickerConfig, SimulationConfig};
pub use coupling::CouplingModel;
pub use error::{ConfigError, Result};
pub use integrator::{advance, leapfrog_step, FixedStepper, Integrator};
pub use interaction::{ActiveDrag, InteractionController, MassId};
pub use mapper::{rect_to_uv, snap_to_diagonal, uv_to_rect, AxisRange, CoordinateMapper, PickerRect};
pub use modes::{classify, is_antisymmetric_mode, is_symmetric_mode, ModeMatches, NormalMode};
pub use simulation::{AxisMarkers, MarkerFeedback, Simulation, SimulationEvent};
pub use state::{PhysicsState, Snapshot};
