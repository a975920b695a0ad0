//! Simulation state: the surface, the particles and the pointer
//!
//! Plain data. Behavior lives in [`super::tick`].

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::settings::PadSettings;

/// Pixel dimensions of the drawing surface
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Both dimensions finite and strictly positive
    pub fn is_valid(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    #[inline]
    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Whether a disc lies fully inside the surface (with a small slack for rounding)
    pub fn contains_disc(&self, center: Vec2, radius: f32) -> bool {
        const SLACK: f32 = 1e-3;
        center.x >= radius - SLACK
            && center.x <= self.width - radius + SLACK
            && center.y >= radius - SLACK
            && center.y <= self.height - radius + SLACK
    }
}

/// Palette index; has no physical effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ColorTag(pub u8);

/// One simulated body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Collision extent and draw size, always > 0
    pub radius: f32,
    pub color: ColorTag,
}

impl Particle {
    pub fn new(pos: Vec2, vel: Vec2, radius: f32) -> Self {
        Self {
            pos,
            vel,
            radius,
            color: ColorTag::default(),
        }
    }
}

/// Complete pad state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PadState {
    pub surface: SurfaceSize,
    pub particles: Vec<Particle>,
    /// Last pointer position in surface coordinates; `None` until the first move
    pub pointer: Option<Vec2>,
}

impl PadState {
    /// Spawn `settings.particle_count` particles in the upper half of `surface`.
    ///
    /// An invalid surface yields an empty pad rather than particles with
    /// nonsensical bounds.
    pub fn spawn(surface: SurfaceSize, settings: &PadSettings, rng: &mut impl Rng) -> Self {
        let mut state = Self {
            surface,
            particles: Vec::new(),
            pointer: None,
        };
        state.populate(settings, rng);
        state
    }

    /// Throw away every particle and respawn for a new surface size.
    ///
    /// The pointer survives; particle identity does not.
    pub fn reinitialize(&mut self, surface: SurfaceSize, settings: &PadSettings, rng: &mut impl Rng) {
        self.surface = surface;
        self.populate(settings, rng);
    }

    fn populate(&mut self, settings: &PadSettings, rng: &mut impl Rng) {
        self.particles.clear();

        if !self.surface.is_valid() {
            log::warn!(
                "Surface {}x{} is not drawable, pad left empty",
                self.surface.width,
                self.surface.height
            );
            return;
        }

        let SurfaceSize { width, height } = self.surface;
        // Tiny surfaces shrink the particles so they still fit between the walls
        let max_fit = width.min(height) / 2.0;
        let palette_len = settings.palette.len().clamp(1, u8::MAX as usize + 1);
        let speed = settings.max_initial_speed;

        self.particles.reserve(settings.particle_count);
        for _ in 0..settings.particle_count {
            let radius = sample(rng, settings.min_radius, settings.max_radius).min(max_fit);
            let x = sample(rng, radius, width - radius);
            let y = sample(rng, radius, (height / 2.0).max(radius));
            let vel = Vec2::new(sample(rng, -speed, speed), sample(rng, -speed, speed));
            let color = ColorTag(rng.random_range(0..palette_len) as u8);

            self.particles.push(Particle {
                pos: Vec2::new(x, y),
                vel,
                radius,
                color,
            });
        }
    }
}

/// Uniform sample from `[lo, hi)`, or `lo` when the range is empty
fn sample(rng: &mut impl Rng, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}
