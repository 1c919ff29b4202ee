//! Drum forces and integration
//!
//! Runs once per tick, in this order: gravity/shell, jet, swirl, then
//! integrate-and-reflect with damping and spin. Later steps read the
//! velocities written by earlier ones. Exiting and asleep balls are skipped
//! everywhere.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;

use super::collision::reflect_velocity;
use super::state::{Ball, DrawMode, SimState};
use crate::consts::*;

/// Gravity plus the outward shell push that keeps balls off the center
pub fn apply_gravity_and_shell(balls: &mut [Ball], dt: f32) {
    let shell_r = SPHERE_RADIUS - BALL_RADIUS * 3.0;
    for ball in balls.iter_mut().filter(|b| b.is_active()) {
        ball.vel.y -= GRAVITY * dt;

        let r = ball.pos.length();
        if r < shell_r {
            let n = if r > 0.0 { ball.pos / r } else { Vec3::Y };
            let push = OUTWARD_FORCE * dt;
            ball.vel += Vec3::new(n.x * push, n.y * push * SHELL_VERTICAL_SCALE, n.z * push);
        }
    }
}

/// Gravity alone, used while a ball is being drawn or showcased
pub fn apply_gravity_only(balls: &mut [Ball], dt: f32) {
    for ball in balls.iter_mut().filter(|b| b.is_active()) {
        ball.vel.y -= GRAVITY * dt;
    }
}

/// Deterministic turbulence for the jet
#[inline]
pub fn jet_pulse(phase: f32) -> f32 {
    1.0 + 0.2 * (phase * 3.0 + (phase * 1.3).sin()).sin()
}

/// Vertical extent of the nozzle volume as (bottom, top)
pub fn jet_window() -> (f32, f32) {
    let bottom = -(SPHERE_RADIUS - BALL_RADIUS * 2.0);
    (bottom, bottom + JET_HEIGHT)
}

/// Jet falloff in [0, 1] for a position, zero outside the nozzle volume
pub fn jet_falloff(pos: Vec3) -> f32 {
    let (bottom, top) = jet_window();
    if pos.y < bottom || pos.y > top {
        return 0.0;
    }
    let r_xz = (pos.x * pos.x + pos.z * pos.z).sqrt();
    if r_xz > JET_RADIUS {
        return 0.0;
    }
    let radial = 1.0 - r_xz / JET_RADIUS;
    let vertical = 1.0 - (top - pos.y) / (top - bottom);
    (radial * vertical).max(0.0)
}

/// Upward nozzle force with a random lateral swirl
pub fn apply_air_jet(
    balls: &mut [Ball],
    rng: &mut Pcg32,
    jet_phase: f32,
    multiplier: f32,
    dt: f32,
) {
    let pulse = jet_pulse(jet_phase);
    for ball in balls.iter_mut().filter(|b| b.is_active()) {
        let f = jet_falloff(ball.pos);
        if f <= 0.0 {
            continue;
        }
        let strength = JET_STRENGTH * f * pulse * multiplier;
        ball.vel.y += strength * dt;

        let swirl = strength * JET_SWIRL;
        ball.vel.x += rng.random_range(-1.0f32..=1.0) * swirl * dt;
        ball.vel.z += rng.random_range(-1.0f32..=1.0) * swirl * dt;
    }
}

/// Whole-population tumble: `omega x r`
pub fn apply_rotational_swirl(balls: &mut [Ball], dt: f32) {
    let omega = Vec3::from_array(ROT_OMEGA);
    for ball in balls.iter_mut().filter(|b| b.is_active()) {
        ball.vel += omega.cross(ball.pos) * ROT_FORCE_SCALE * dt;
    }
}

/// Clamp, move, reflect off the wall, damp, spin
pub fn integrate_balls(balls: &mut [Ball], rng: &mut Pcg32, dt: f32) {
    let max_dist = SPHERE_RADIUS - BALL_RADIUS;

    for ball in balls.iter_mut().filter(|b| b.is_active()) {
        ball.vel = ball.vel.clamp_length_max(MAX_SPEED);
        ball.pos += ball.vel * dt;

        let dist = ball.pos.length();
        if dist > max_dist {
            let n = ball.pos / dist;
            ball.pos = n * max_dist;
            ball.vel = reflect_velocity(ball.vel, n) * BOUNCE;

            // Near the bottom pole, nudge sideways so nothing settles dead still
            if n.y < BOTTOM_KICK_NORMAL_Y {
                let tangent = Vec3::new(-n.z, 0.0, n.x).normalize_or(Vec3::X);
                let side = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                ball.vel += tangent * side * BOTTOM_KICK_SPEED;
            }
        }

        ball.vel *= DAMPING;

        let tangential = (ball.vel.x * ball.vel.x + ball.vel.z * ball.vel.z).sqrt();
        ball.spin_vel += tangential * SPIN_FACTOR * dt;
        ball.spin_vel *= SPIN_DAMPING;
        ball.spin_angle += ball.spin_vel * dt;
        ball.rotation.y = ball.spin_angle;
    }
}

/// Run the force pipeline for one tick
pub fn step_forces(state: &mut SimState, jet_multiplier: f32, dt: f32) {
    match state.mode {
        DrawMode::Drawing | DrawMode::Focus => apply_gravity_only(&mut state.balls, dt),
        _ => apply_gravity_and_shell(&mut state.balls, dt),
    }

    if state.mode.is_airblast() {
        apply_air_jet(&mut state.balls, &mut state.rng, state.jet_phase, jet_multiplier, dt);
        apply_rotational_swirl(&mut state.balls, dt);
    }

    integrate_balls(&mut state.balls, &mut state.rng, dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::DrawConfig;
    use crate::sim::state::{BallAnim, DrawPhase};
    use rand::SeedableRng;

    fn ball_at(pos: Vec3) -> Ball {
        Ball::new(1, 1, pos, 0.0)
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut balls = vec![ball_at(Vec3::new(0.0, -100.0, 0.0))];
        apply_gravity_only(&mut balls, SIM_DT);
        assert!((balls[0].vel.y + GRAVITY * SIM_DT).abs() < 1e-4);
    }

    #[test]
    fn test_shell_pushes_outward_inside_core() {
        let mut balls = vec![ball_at(Vec3::new(50.0, 0.0, 0.0))];
        apply_gravity_and_shell(&mut balls, SIM_DT);
        assert!(balls[0].vel.x > 0.0);

        // Outside the shell radius only gravity applies
        let mut balls = vec![ball_at(Vec3::new(150.0, 0.0, 0.0))];
        apply_gravity_and_shell(&mut balls, SIM_DT);
        assert_eq!(balls[0].vel.x, 0.0);
    }

    #[test]
    fn test_exiting_and_asleep_skip_forces() {
        let mut exiting = ball_at(Vec3::new(0.0, -120.0, 0.0));
        exiting.anim = BallAnim::Exiting {
            from: exiting.pos,
            progress: 0.0,
            phase: DrawPhase::Main,
        };
        let mut asleep = ball_at(Vec3::new(0.0, -120.0, 0.0));
        asleep.asleep = true;
        let mut balls = vec![exiting, asleep];
        let mut rng = Pcg32::seed_from_u64(1);

        apply_gravity_and_shell(&mut balls, SIM_DT);
        apply_air_jet(&mut balls, &mut rng, 0.0, 1.0, SIM_DT);
        apply_rotational_swirl(&mut balls, SIM_DT);
        integrate_balls(&mut balls, &mut rng, SIM_DT);

        assert!(balls.iter().all(|b| b.vel == Vec3::ZERO));
    }

    #[test]
    fn test_jet_lifts_inside_nozzle_only() {
        let (bottom, top) = jet_window();
        assert!(jet_falloff(Vec3::new(0.0, bottom + 10.0, 0.0)) > 0.0);
        assert_eq!(jet_falloff(Vec3::new(0.0, top + 1.0, 0.0)), 0.0);
        assert_eq!(jet_falloff(Vec3::new(JET_RADIUS + 1.0, bottom + 10.0, 0.0)), 0.0);

        let mut balls = vec![ball_at(Vec3::new(0.0, -100.0, 0.0))];
        let mut rng = Pcg32::seed_from_u64(3);
        apply_air_jet(&mut balls, &mut rng, 0.0, 1.0, SIM_DT);
        assert!(balls[0].vel.y > 0.0);

        // A zero multiplier (silent breath input) disables the jet
        let mut balls = vec![ball_at(Vec3::new(0.0, -100.0, 0.0))];
        apply_air_jet(&mut balls, &mut rng, 0.0, 0.0, SIM_DT);
        assert_eq!(balls[0].vel, Vec3::ZERO);
    }

    #[test]
    fn test_jet_pulse_bounds() {
        for i in 0..200 {
            let p = jet_pulse(i as f32 * 0.1);
            assert!((0.8..=1.2).contains(&p));
        }
    }

    #[test]
    fn test_speed_clamped() {
        let mut ball = ball_at(Vec3::ZERO);
        ball.vel = Vec3::new(5000.0, 0.0, 0.0);
        let mut balls = vec![ball];
        let mut rng = Pcg32::seed_from_u64(1);
        integrate_balls(&mut balls, &mut rng, 0.001);
        assert!(balls[0].vel.length() <= MAX_SPEED + 1e-3);
    }

    #[test]
    fn test_wall_reflects_and_contains() {
        let max_dist = SPHERE_RADIUS - BALL_RADIUS;
        let mut ball = ball_at(Vec3::new(max_dist - 1.0, 0.0, 0.0));
        ball.vel = Vec3::new(600.0, 0.0, 0.0);
        let mut balls = vec![ball];
        let mut rng = Pcg32::seed_from_u64(1);
        integrate_balls(&mut balls, &mut rng, SIM_DT);
        assert!(balls[0].pos.length() <= max_dist + 1e-3);
        assert!(balls[0].vel.x < 0.0);
    }

    #[test]
    fn test_bottom_kick_adds_lateral_speed() {
        let max_dist = SPHERE_RADIUS - BALL_RADIUS;
        let mut ball = ball_at(Vec3::new(0.0, -(max_dist - 1.0), 0.0));
        ball.vel = Vec3::new(0.0, -600.0, 0.0);
        let mut balls = vec![ball];
        let mut rng = Pcg32::seed_from_u64(5);
        integrate_balls(&mut balls, &mut rng, SIM_DT);
        let lateral = (balls[0].vel.x.powi(2) + balls[0].vel.z.powi(2)).sqrt();
        assert!(lateral > BOTTOM_KICK_SPEED * DAMPING * 0.9);
    }

    #[test]
    fn test_spin_accumulates_from_tangential_speed() {
        let mut ball = ball_at(Vec3::ZERO);
        ball.vel = Vec3::new(300.0, 0.0, 0.0);
        let mut balls = vec![ball];
        let mut rng = Pcg32::seed_from_u64(1);
        for _ in 0..10 {
            integrate_balls(&mut balls, &mut rng, SIM_DT);
        }
        assert!(balls[0].spin_vel > 0.0);
        assert!(balls[0].spin_angle > 0.0);
        assert_eq!(balls[0].rotation.y, balls[0].spin_angle);
    }

    /// One `step_forces` on a ball inside the shell core and one in the jet
    fn stepped(mode: DrawMode) -> (Ball, Ball) {
        let mut state = SimState::new(9, DrawConfig::clamped(10, 1, 0, 0, 1.0));
        state.balls = vec![
            Ball::new(1, 1, Vec3::new(100.0, 0.0, 0.0), 0.0),
            Ball::new(2, 2, Vec3::new(0.0, -140.0, 0.0), 0.0),
        ];
        state.mode = mode;
        step_forces(&mut state, 1.0, SIM_DT);
        (state.balls[0].clone(), state.balls[1].clone())
    }

    #[test]
    fn test_step_forces_idle_keeps_shell_only() {
        let (core, jet) = stepped(DrawMode::Idle);
        assert!(core.vel.x > 0.0);
        assert_eq!(core.vel.z, 0.0);
        assert!(jet.vel.y < 0.0);
        assert_eq!(jet.vel.x, 0.0);
    }

    #[test]
    fn test_step_forces_airblast_adds_jet_and_swirl() {
        let (idle_core, idle_jet) = stepped(DrawMode::Idle);
        let (core, jet) = stepped(DrawMode::Airblast { mix_elapsed: 0.0 });
        assert!(core.vel.x > 0.0);
        assert!(core.vel.z < 0.0);
        assert!(core.vel.y > idle_core.vel.y);
        assert!(jet.vel.y > 0.0);
        assert!(jet.vel.y > idle_jet.vel.y);
    }

    #[test]
    fn test_step_forces_drawing_and_focus_are_gravity_only() {
        for mode in [DrawMode::Drawing, DrawMode::Focus] {
            let (core, jet) = stepped(mode);
            assert_eq!(core.vel.x, 0.0);
            assert_eq!(core.vel.z, 0.0);
            assert!((core.vel.y + GRAVITY * SIM_DT * DAMPING).abs() < 1e-3);
            assert!(jet.vel.y < 0.0);
            assert_eq!(jet.vel.x, 0.0);
        }
    }
}
