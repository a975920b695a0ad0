//! Per-frame simulation tick
//!
//! One tick is one frame: there is no physical time unit, so motion is
//! frame-rate dependent.

use glam::Vec2;

use super::state::{PadState, Particle, SurfaceSize};
use crate::settings::PhysicsParams;

/// Advance every particle by one tick
pub fn tick(state: &mut PadState, params: &PhysicsParams) {
    let surface = state.surface;
    let pointer = state.pointer;
    for particle in &mut state.particles {
        step_particle(particle, surface, pointer, params);
    }
}

/// Gravity, friction, pointer repulsion, integration, then wall bounces.
///
/// Repulsion sees post-friction velocity and pre-integration position.
pub fn step_particle(
    particle: &mut Particle,
    surface: SurfaceSize,
    pointer: Option<Vec2>,
    params: &PhysicsParams,
) {
    particle.vel.y += params.gravity;
    particle.vel *= params.friction;

    if let Some(pointer) = pointer {
        particle.vel += repulsion(particle.pos, pointer, params);
    }

    particle.pos += particle.vel;

    resolve_bounds(particle, surface, params);
}

/// Strength of the pointer push at `distance`: 1 at the pointer, 0 at the
/// repulsion radius and beyond (linear)
#[inline]
pub fn falloff(distance: f32, repel_radius: f32) -> f32 {
    if distance >= repel_radius {
        0.0
    } else {
        (repel_radius - distance) / repel_radius
    }
}

/// Velocity change pushing `pos` away from `pointer`
pub fn repulsion(pos: Vec2, pointer: Vec2, params: &PhysicsParams) -> Vec2 {
    let offset = pos - pointer;
    let dist_sq = offset.length_squared();
    if dist_sq >= params.repel_radius * params.repel_radius {
        return Vec2::ZERO;
    }

    let distance = dist_sq.sqrt();
    // Dead center has no direction to push in
    if distance <= f32::EPSILON {
        return Vec2::ZERO;
    }

    let direction = offset / distance;
    direction * falloff(distance, params.repel_radius) * params.repel_force
}

/// Clamp a particle back inside the surface and bounce it.
///
/// Checked floor, ceiling, right, left. Only the floor lets a particle come
/// to rest: a floor bounce slower than `rest_speed` stops dead.
pub fn resolve_bounds(particle: &mut Particle, surface: SurfaceSize, params: &PhysicsParams) {
    let r = particle.radius;

    if particle.pos.y + r > surface.height {
        particle.pos.y = surface.height - r;
        let reflected = reflect(particle.vel.y, params);
        particle.vel.y = if reflected.abs() < params.rest_speed {
            0.0
        } else {
            reflected
        };
    }
    if particle.pos.y - r < 0.0 {
        particle.pos.y = r;
        particle.vel.y = reflect(particle.vel.y, params);
    }
    if particle.pos.x + r > surface.width {
        particle.pos.x = surface.width - r;
        particle.vel.x = reflect(particle.vel.x, params);
    }
    if particle.pos.x - r < 0.0 {
        particle.pos.x = r;
        particle.vel.x = reflect(particle.vel.x, params);
    }
}

#[inline]
fn reflect(v: f32, params: &PhysicsParams) -> f32 {
    -v * params.restitution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::PadSettings;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn single(pos: Vec2, vel: Vec2, radius: f32, surface: SurfaceSize) -> PadState {
        PadState {
            surface,
            particles: vec![Particle::new(pos, vel, radius)],
            pointer: None,
        }
    }

    #[test]
    fn test_first_tick_scenario() {
        // 400x300 pad, particle at rest at (200, 50)
        let params = PhysicsParams::default();
        let mut state = single(
            Vec2::new(200.0, 50.0),
            Vec2::ZERO,
            10.0,
            SurfaceSize::new(400.0, 300.0),
        );

        tick(&mut state, &params);

        let p = &state.particles[0];
        assert!((p.vel.y - 0.392).abs() < 1e-5);
        assert!(p.vel.x.abs() < 1e-6);
        assert!((p.pos.x - 200.0).abs() < 1e-5);
        assert!((p.pos.y - 50.392).abs() < 1e-4);
    }

    #[test]
    fn test_settles_on_floor() {
        let params = PhysicsParams::default();
        let mut state = single(
            Vec2::new(200.0, 50.0),
            Vec2::ZERO,
            10.0,
            SurfaceSize::new(400.0, 300.0),
        );

        for _ in 0..2000 {
            tick(&mut state, &params);
        }

        let p = &state.particles[0];
        assert!((p.pos.y - 290.0).abs() < 1e-3, "y = {}", p.pos.y);
        assert!(p.vel.length() < 1e-3, "vel = {:?}", p.vel);
        assert!((p.pos.x - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_inertial_motion_is_constant() {
        let params = PhysicsParams::inertial();
        let vel = Vec2::new(1.5, -0.75);
        let mut state = single(
            Vec2::new(500.0, 500.0),
            vel,
            10.0,
            SurfaceSize::new(1000.0, 1000.0),
        );

        for i in 1..=100 {
            tick(&mut state, &params);
            let p = &state.particles[0];
            assert_eq!(p.vel, vel);
            assert!((p.pos - (Vec2::new(500.0, 500.0) + vel * i as f32)).length() < 1e-3);
        }
    }

    #[test]
    fn test_friction_decays_velocity() {
        let params = PhysicsParams {
            friction: 0.98,
            ..PhysicsParams::inertial()
        };
        let mut state = single(
            Vec2::new(5000.0, 5000.0),
            Vec2::new(2.0, -1.0),
            10.0,
            SurfaceSize::new(10_000.0, 10_000.0),
        );

        let mut prev = state.particles[0].vel.length();
        while prev > 1e-6 {
            tick(&mut state, &params);
            let speed = state.particles[0].vel.length();
            assert!(speed < prev, "speed {} did not drop below {}", speed, prev);
            prev = speed;
        }
    }

    #[test]
    fn test_floor_bounce() {
        let params = PhysicsParams::inertial();
        let surface = SurfaceSize::new(400.0, 300.0);
        let mut state = single(Vec2::new(200.0, 290.0), Vec2::new(0.0, 5.0), 10.0, surface);

        tick(&mut state, &params);

        let p = &state.particles[0];
        assert_eq!(p.pos.y, 290.0);
        assert!((p.vel.y - (-params.restitution * 5.0)).abs() < 1e-6);
    }

    #[test]
    fn test_wall_bounces() {
        let params = PhysicsParams::inertial();
        let surface = SurfaceSize::new(400.0, 300.0);

        // Ceiling
        let mut state = single(Vec2::new(200.0, 12.0), Vec2::new(0.0, -4.0), 10.0, surface);
        tick(&mut state, &params);
        assert_eq!(state.particles[0].pos.y, 10.0);
        assert!((state.particles[0].vel.y - 2.8).abs() < 1e-6);

        // Right wall
        let mut state = single(Vec2::new(388.0, 150.0), Vec2::new(4.0, 0.0), 10.0, surface);
        tick(&mut state, &params);
        assert_eq!(state.particles[0].pos.x, 390.0);
        assert!((state.particles[0].vel.x + 2.8).abs() < 1e-6);

        // Left wall
        let mut state = single(Vec2::new(12.0, 150.0), Vec2::new(-4.0, 0.0), 10.0, surface);
        tick(&mut state, &params);
        assert_eq!(state.particles[0].pos.x, 10.0);
        assert!((state.particles[0].vel.x - 2.8).abs() < 1e-6);
    }

    #[test]
    fn test_slow_bounce_comes_to_rest() {
        let params = PhysicsParams {
            rest_speed: 0.5,
            ..PhysicsParams::inertial()
        };
        let surface = SurfaceSize::new(400.0, 300.0);
        let mut state = single(Vec2::new(200.0, 289.9), Vec2::new(0.0, 0.5), 10.0, surface);

        tick(&mut state, &params);

        assert_eq!(state.particles[0].pos.y, 290.0);
        assert_eq!(state.particles[0].vel.y, 0.0);
    }

    #[test]
    fn test_slow_wall_and_ceiling_hits_still_reflect() {
        let params = PhysicsParams::default();
        let surface = SurfaceSize::new(400.0, 300.0);

        // Left wall, well under rest_speed / restitution
        let mut p = Particle::new(Vec2::new(10.1, 150.0), Vec2::new(-0.6, 0.0), 10.0);
        step_particle(&mut p, surface, None, &params);
        let expected = -(-0.6 * params.friction) * params.restitution;
        assert_eq!(p.pos.x, 10.0);
        assert!((p.vel.x - expected).abs() < 1e-6, "vel.x = {}", p.vel.x);

        // Right wall
        let mut p = Particle::new(Vec2::new(389.9, 150.0), Vec2::new(0.6, 0.0), 10.0);
        step_particle(&mut p, surface, None, &params);
        assert_eq!(p.pos.x, 390.0);
        assert!((p.vel.x + 0.6 * params.friction * params.restitution).abs() < 1e-6);

        // Ceiling, moving up slower than the rest cutoff
        let params = PhysicsParams {
            gravity: 0.0,
            ..PhysicsParams::default()
        };
        let mut p = Particle::new(Vec2::new(200.0, 10.1), Vec2::new(0.0, -0.6), 10.0);
        step_particle(&mut p, surface, None, &params);
        assert_eq!(p.pos.y, 10.0);
        assert!((p.vel.y - 0.6 * params.friction * params.restitution).abs() < 1e-6);
    }

    #[test]
    fn test_repulsion_follows_gravity_and_friction() {
        let params = PhysicsParams::default();
        let surface = SurfaceSize::new(400.0, 300.0);
        let start = Vec2::new(200.0, 150.0);
        let v0 = Vec2::new(1.0, -2.0);
        let pointer = Vec2::new(200.0, 170.0);
        let mut p = Particle::new(start, v0, 10.0);

        step_particle(&mut p, surface, Some(pointer), &params);

        // Push is added to the damped velocity, computed at the old position
        let push = repulsion(start, pointer, &params);
        assert!(push.length() > 0.0);
        let expected = (v0 + Vec2::new(0.0, params.gravity)) * params.friction + push;
        assert!((p.vel - expected).length() < 1e-5, "vel {:?} != {:?}", p.vel, expected);
        assert!((p.pos - (start + expected)).length() < 1e-4);
    }

    #[test]
    fn test_repulsion_linear_falloff() {
        let params = PhysicsParams::default();
        let pointer = Vec2::new(100.0, 100.0);

        let near = repulsion(Vec2::new(130.0, 100.0), pointer, &params);
        let far = repulsion(Vec2::new(190.0, 100.0), pointer, &params);

        // Pushed along +x, away from the pointer
        assert!(near.x > 0.0 && near.y.abs() < 1e-6);
        let expected_near = params.repel_force * (params.repel_radius - 30.0) / params.repel_radius;
        let expected_far = params.repel_force * (params.repel_radius - 90.0) / params.repel_radius;
        assert!((near.length() - expected_near).abs() < 1e-5);
        assert!((far.length() - expected_far).abs() < 1e-5);
        // Proportional to (R - d)
        assert!((near.length() / far.length() - 90.0 / 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_repulsion_outside_radius_is_zero() {
        let params = PhysicsParams::default();
        let pointer = Vec2::new(0.0, 0.0);
        assert_eq!(repulsion(Vec2::new(params.repel_radius, 0.0), pointer, &params), Vec2::ZERO);
        assert_eq!(repulsion(Vec2::new(300.0, 400.0), pointer, &params), Vec2::ZERO);
        assert_eq!(falloff(params.repel_radius, params.repel_radius), 0.0);
        assert_eq!(falloff(0.0, params.repel_radius), 1.0);
    }

    #[test]
    fn test_repulsion_at_pointer_is_skipped() {
        let params = PhysicsParams::default();
        let at = Vec2::new(42.0, 17.0);
        let push = repulsion(at, at, &params);
        assert_eq!(push, Vec2::ZERO);
        assert!(push.is_finite());
    }

    #[test]
    fn test_pointer_pushes_particle_in_tick() {
        let params = PhysicsParams::inertial();
        let mut state = single(
            Vec2::new(200.0, 150.0),
            Vec2::ZERO,
            10.0,
            SurfaceSize::new(400.0, 300.0),
        );
        state.pointer = Some(Vec2::new(200.0, 170.0));

        tick(&mut state, &params);

        // Pointer below, so the particle moves up
        let p = &state.particles[0];
        assert!(p.vel.y < 0.0);
        assert!(p.pos.y < 150.0);
    }

    proptest! {
        #[test]
        fn prop_particles_stay_in_bounds(
            seed in any::<u64>(),
            width in 1.0f32..2000.0,
            height in 1.0f32..2000.0,
            px in -500.0f32..2500.0,
            py in -500.0f32..2500.0,
            ticks in 1usize..300,
        ) {
            let settings = PadSettings::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let surface = SurfaceSize::new(width, height);
            let mut state = PadState::spawn(surface, &settings, &mut rng);
            state.pointer = Some(Vec2::new(px, py));

            for _ in 0..ticks {
                tick(&mut state, &settings.physics);
                for p in &state.particles {
                    prop_assert!(p.radius > 0.0);
                    prop_assert!(
                        surface.contains_disc(p.pos, p.radius),
                        "particle {:?} escaped {:?}", p, surface
                    );
                }
            }
        }
    }
}
