//! Particle simulation
//!
//! Pure state plus the per-frame stepper. No rendering or platform
//! dependencies live here; the driver owns the state and threads it through
//! [`tick`].

pub mod state;
pub mod tick;

pub use state::{ColorTag, PadState, Particle, SurfaceSize};
pub use tick::{falloff, repulsion, resolve_bounds, step_particle, tick};
