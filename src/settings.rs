//! Pad settings and physics tuning
//!
//! Persisted in LocalStorage on the web; defaults everywhere else.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::{Error, Result};
use crate::renderer::{Color, default_palette};

/// Per-tick physics constants shared by every particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsParams {
    /// Downward acceleration added to `vel.y` each tick (px/tick²)
    pub gravity: f32,
    /// Velocity multiplier applied each tick, in (0, 1]
    pub friction: f32,
    /// Fraction of velocity kept (and inverted) on a wall bounce, in [0, 1]
    pub restitution: f32,
    /// Pointer influence radius (px)
    pub repel_radius: f32,
    /// Velocity added per tick at zero distance from the pointer
    pub repel_force: f32,
    /// Bounces slower than this stop dead instead of rebounding
    pub rest_speed: f32,
}

impl Default for PhysicsParams {
    fn default() -> Self {
        Self {
            gravity: GRAVITY,
            friction: FRICTION,
            restitution: RESTITUTION,
            repel_radius: REPEL_RADIUS,
            repel_force: REPEL_FORCE,
            rest_speed: REST_SPEED,
        }
    }
}

impl PhysicsParams {
    /// Gravity, friction and resting off; only the pointer and walls act
    pub fn inertial() -> Self {
        Self {
            gravity: 0.0,
            friction: 1.0,
            rest_speed: 0.0,
            ..Self::default()
        }
    }
}

/// Pad settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PadSettings {
    /// Particles spawned per (re)initialization
    pub particle_count: usize,
    /// Smallest spawn radius (px)
    pub min_radius: f32,
    /// Largest spawn radius (px, exclusive)
    pub max_radius: f32,
    /// Bound on each initial velocity component (px/tick)
    pub max_initial_speed: f32,
    /// Particle colors, picked uniformly at spawn
    pub palette: Vec<Color>,
    /// Draw a line from each repelled particle to the pointer
    pub tethers: bool,
    /// Fraction of the pad that must be on screen for it to run
    pub visibility_threshold: f64,
    /// Fixed RNG seed; `None` seeds from the host
    pub seed: Option<u64>,
    pub physics: PhysicsParams,
}

impl Default for PadSettings {
    fn default() -> Self {
        Self {
            particle_count: PARTICLE_COUNT,
            min_radius: MIN_RADIUS,
            max_radius: MAX_RADIUS,
            max_initial_speed: MAX_INITIAL_SPEED,
            palette: default_palette(),
            tethers: true,
            visibility_threshold: VISIBILITY_THRESHOLD,
            seed: None,
            physics: PhysicsParams::default(),
        }
    }
}

impl PadSettings {
    /// Parse settings from JSON (missing fields take defaults) and validate them
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Check every value is finite and within its physical range
    pub fn validate(&self) -> Result<()> {
        let p = &self.physics;
        let finite = [
            self.min_radius,
            self.max_radius,
            self.max_initial_speed,
            p.gravity,
            p.friction,
            p.restitution,
            p.repel_radius,
            p.repel_force,
            p.rest_speed,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(invalid("all numeric settings must be finite"));
        }
        if self.min_radius <= 0.0 || self.max_radius < self.min_radius {
            return Err(invalid(format!(
                "radius range [{}, {}) must be positive and ordered",
                self.min_radius, self.max_radius
            )));
        }
        if self.max_initial_speed < 0.0 {
            return Err(invalid("max_initial_speed must be >= 0"));
        }
        if self.palette.is_empty() {
            return Err(invalid("palette must not be empty"));
        }
        if !(0.0..=1.0).contains(&self.visibility_threshold) {
            return Err(invalid("visibility_threshold must be in [0, 1]"));
        }
        if p.friction <= 0.0 || p.friction > 1.0 {
            return Err(invalid(format!("friction {} must be in (0, 1]", p.friction)));
        }
        if !(0.0..=1.0).contains(&p.restitution) {
            return Err(invalid(format!(
                "restitution {} must be in [0, 1]",
                p.restitution
            )));
        }
        if p.repel_radius <= 0.0 {
            return Err(invalid("repel_radius must be > 0"));
        }
        if p.rest_speed < 0.0 {
            return Err(invalid("rest_speed must be >= 0"));
        }
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    const STORAGE_KEY: &'static str = "gravity_pad_settings";

    /// Settings stored by the embedding page under `gravity_pad_settings`,
    /// or the defaults when there are none or they do not validate
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let stored = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
            .and_then(|storage| storage.get_item(Self::STORAGE_KEY).ok().flatten());

        if let Some(json) = stored {
            match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded pad settings from LocalStorage");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring stored pad settings: {}", e),
            }
        }
        Self::default()
    }

    /// Natively there is no store to read from
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidSettings(msg.into())
}
