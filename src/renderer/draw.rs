//! Per-frame draw pass

use glam::Vec2;

use super::{Color, DrawingSurface};
use crate::consts::{HIGHLIGHT_SCALE, TETHER_ALPHA, TETHER_WIDTH};
use crate::settings::PadSettings;
use crate::sim::{ColorTag, PadState, falloff};

/// Clear the surface and paint every particle
pub fn draw_frame(surface: &mut impl DrawingSurface, state: &PadState, settings: &PadSettings) {
    surface.clear();

    let repel_radius = settings.physics.repel_radius;

    for particle in &state.particles {
        if settings.tethers {
            if let Some(pointer) = state.pointer {
                let strength = falloff(particle.pos.distance(pointer), repel_radius);
                if strength > 0.0 {
                    let color = Color::TETHER.with_alpha(strength * TETHER_ALPHA);
                    surface.draw_line(particle.pos, pointer, TETHER_WIDTH, color);
                }
            }
        }

        surface.draw_disc(particle.pos, particle.radius, palette_color(settings, particle.color));

        // Glassy highlight, up and to the left
        let offset = Vec2::splat(-particle.radius * HIGHLIGHT_SCALE);
        surface.draw_disc(
            particle.pos + offset,
            particle.radius * HIGHLIGHT_SCALE,
            Color::HIGHLIGHT,
        );
    }
}

fn palette_color(settings: &PadSettings, tag: ColorTag) -> Color {
    settings
        .palette
        .get(tag.0 as usize)
        .copied()
        .unwrap_or(Color::BLACK)
}
