//! Physical defaults and interaction tuning constants.
//!
//! These express intended behavior (tick rate, tolerances, clamp limits) and
//! keep magic numbers out of the simulation code.

// Time stepping
pub const FIXED_DT: f64 = 0.02; // seconds per fixed tick
pub const DEFAULT_SUBSTEPS: u32 = 10; // leapfrog substeps per fixed tick
pub const MAX_TICKS_PER_FRAME: u32 = 8; // cap catch-up after a long frame

// Parameter clamps applied by live setters
pub const MIN_MASS: f64 = 1e-3;
pub const MIN_STIFFNESS: f64 = 0.0;
// Largest omega * dt a substep may see; leapfrog diverges at 2.
pub const STABILITY_MARGIN: f64 = 1.8;

// Default physical parameters
pub const DEFAULT_MASS: f64 = 1.0;
pub const DEFAULT_K1: f64 = 1.0;
pub const DEFAULT_K2: f64 = 1.0;

// Scene layout along the motion axis (absolute positions)
pub const DEFAULT_X1_REF: f64 = -2.0;
pub const DEFAULT_X2_REF: f64 = 2.0;
pub const DEFAULT_X1_INIT: f64 = -2.0;
pub const DEFAULT_X2_INIT: f64 = 2.0;
pub const DEFAULT_WALL1_X: f64 = -5.0;
pub const DEFAULT_WALL2_X: f64 = 5.0;
pub const DEFAULT_WALL_THICKNESS: f64 = 0.5;

// Mass drag travel limits (absolute positions)
pub const DEFAULT_X1_TRAVEL: [f64; 2] = [-3.5, -0.5];
pub const DEFAULT_X2_TRAVEL: [f64; 2] = [0.5, 3.5];

// Coordinate picker
pub const DEFAULT_PICKER_RANGE: [f64; 2] = [-1.0, 1.0];
pub const DEFAULT_SNAP_TOLERANCE: f64 = 0.1;
pub const MODE_TOLERANCE: f64 = 1e-7; // normal-mode detection on release

// Presentation limits
pub const PERIOD_DISPLAY_MAX: f64 = 99.99; // keeps timers sane as k -> 0
pub const DEFAULT_MODE_AMPLITUDE: f64 = 1.0;
pub const MIN_MASS_HALF_EXTENT: f64 = 0.15; // keeps tiny masses visible and grabbable
pub const MAX_PENDING_EVENTS: usize = 16; // undrained notifications kept
