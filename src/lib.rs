//! Gravity Pad - an ambient interactive particle pad
//!
//! Core modules:
//! - `sim`: Particle state and the per-frame physics tick
//! - `renderer`: Draw pass onto an abstract 2D surface
//! - `driver`: Frame loop, visibility pause, resize and pointer wiring
//! - `platform`: Host capabilities (manual host for tests, browser host on wasm32)
//! - `settings`: Tunable physics and appearance

pub mod driver;
pub mod error;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use driver::{FrameStats, PadDriver};
pub use error::{Error, Result};
pub use settings::{PadSettings, PhysicsParams};

/// Default tuning constants
pub mod consts {
    /// Particles per (re)initialization
    pub const PARTICLE_COUNT: usize = 12;
    /// Spawn radius range (px)
    pub const MIN_RADIUS: f32 = 8.0;
    pub const MAX_RADIUS: f32 = 20.0;
    /// Initial velocity components are drawn from ±this (px/tick)
    pub const MAX_INITIAL_SPEED: f32 = 4.0;

    /// Downward acceleration (px/tick²)
    pub const GRAVITY: f32 = 0.4;
    /// Per-tick velocity damping
    pub const FRICTION: f32 = 0.98;
    /// Velocity kept on a wall bounce
    pub const RESTITUTION: f32 = 0.7;
    /// Pointer influence radius (px)
    pub const REPEL_RADIUS: f32 = 120.0;
    /// Pointer push at zero distance (px/tick)
    pub const REPEL_FORCE: f32 = 1.5;
    /// Above the resting floor bounce of RESTITUTION * GRAVITY * FRICTION (~0.27)
    pub const REST_SPEED: f32 = 0.5;

    /// Highlight disc size and offset, as a fraction of the particle radius
    pub const HIGHLIGHT_SCALE: f32 = 0.3;
    /// Tether opacity at zero distance
    pub const TETHER_ALPHA: f32 = 0.4;
    pub const TETHER_WIDTH: f32 = 1.0;

    /// Fraction of the pad that must be in the viewport to keep simulating
    pub const VISIBILITY_THRESHOLD: f64 = 0.1;
}
