//! Fixed timestep simulation tick
//!
//! Advances the drum deterministically: forces, then collisions, then the
//! draw sequencer.

use super::collision::handle_collisions;
use super::forces::step_forces;
use super::sequencer::{
    reset_all, run_scheduled, start_draw, update_auto_mix, update_exiting_ball,
};
use super::state::{DrawMode, SimState};
use crate::consts::*;
use crate::settings::DrawConfig;
use crate::stats::DrawPlan;

/// How to pick balls for a new draw
#[derive(Debug, Clone, PartialEq)]
pub enum DrawRequest {
    /// Uniform random ejection
    Random(DrawConfig),
    /// Realize a precomputed plan, falling back to random per ball
    Weighted(DrawConfig, DrawPlan),
}

impl DrawRequest {
    pub fn config(&self) -> DrawConfig {
        match self {
            DrawRequest::Random(config) | DrawRequest::Weighted(config, _) => *config,
        }
    }
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone)]
pub struct TickInput {
    /// Jet strength multiplier from the blower input (1.0 = constant)
    pub jet_multiplier: f32,
    /// Start a draw (ignored unless idle)
    pub start: Option<DrawRequest>,
    /// Abort and return to idle
    pub reset: bool,
}

impl Default for TickInput {
    fn default() -> Self {
        Self {
            jet_multiplier: 1.0,
            start: None,
            reset: false,
        }
    }
}

/// Advance the draw state by one timestep (capped at `MAX_DT`)
pub fn tick(state: &mut SimState, input: &TickInput, dt: f32) {
    let dt = dt.clamp(0.0, MAX_DT);

    if input.reset {
        reset_all(state);
    }
    match &input.start {
        Some(DrawRequest::Random(config)) => {
            start_draw(state, *config, None);
        }
        Some(DrawRequest::Weighted(config, plan)) => {
            start_draw(state, *config, Some(plan.clone()));
        }
        None => {}
    }

    state.time += dt as f64;
    state.time_ticks += 1;

    update_drum_rotation(state, dt);
    state.jet_phase += dt;

    step_forces(state, input.jet_multiplier.max(0.0), dt);
    handle_collisions(state);

    run_scheduled(state);
    update_auto_mix(state, dt);
    update_exiting_ball(state, dt);
}

/// Cosmetic drum spin while mixing or drawing, easing out otherwise
fn update_drum_rotation(state: &mut SimState, dt: f32) {
    match state.mode {
        DrawMode::Airblast { .. } | DrawMode::Drawing => {
            state.drum_rotation.y += DRUM_ROT_SPEED * dt;
            state.drum_rotation.z += DRUM_ROT_SPEED * 0.5 * dt;
        }
        _ => {
            state.drum_rotation.y *= 0.98;
            state.drum_rotation.z *= 0.98;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::schedule::ScheduledAction;
    use crate::sim::state::{Ball, DrawEvent};
    use glam::Vec3;

    fn config() -> DrawConfig {
        DrawConfig::clamped(12, 2, 0, 0, 0.5)
    }

    #[test]
    fn test_tick_idle_to_airblast() {
        let mut state = SimState::new(12345, config());
        tick(&mut state, &TickInput::default(), SIM_DT);
        assert!(state.mode.is_idle());

        let input = TickInput {
            start: Some(DrawRequest::Random(config())),
            ..Default::default()
        };
        tick(&mut state, &input, SIM_DT);
        assert!(state.mode.is_airblast());
        assert!(state.drum_rotation.y > 0.0);
    }

    #[test]
    fn test_dt_is_capped() {
        let mut state = SimState::new(1, config());
        tick(&mut state, &TickInput::default(), 1.0);
        assert!((state.time - MAX_DT as f64).abs() < 1e-9);
        assert_eq!(state.time_ticks, 1);
    }

    #[test]
    fn test_reset_input_returns_to_idle() {
        let mut state = SimState::new(5, config());
        let start = TickInput {
            start: Some(DrawRequest::Random(config())),
            ..Default::default()
        };
        tick(&mut state, &start, SIM_DT);
        for _ in 0..60 {
            tick(&mut state, &TickInput::default(), SIM_DT);
        }
        let reset = TickInput {
            reset: true,
            ..Default::default()
        };
        tick(&mut state, &reset, SIM_DT);
        assert!(state.mode.is_idle());
        assert_eq!(state.exiting_count(), 0);
        assert!(state.session.drawn_main.is_empty());
    }

    #[test]
    fn test_full_draw_completes() {
        let mut state = SimState::new(8, config());
        let start = TickInput {
            start: Some(DrawRequest::Random(config())),
            ..Default::default()
        };
        tick(&mut state, &start, SIM_DT);

        let mut events = state.drain_events();
        for _ in 0..3000 {
            tick(&mut state, &TickInput::default(), SIM_DT);
            events.extend(state.drain_events());
            if state.mode.is_idle() {
                break;
            }
        }
        assert!(state.mode.is_idle());
        assert_eq!(state.session.drawn_main.len(), 2);
        assert!(state.balls.is_empty());
        assert!(events.iter().any(|e| matches!(e, DrawEvent::DrawComplete { .. })));
    }

    #[test]
    fn test_determinism() {
        let mut state1 = SimState::new(99999, config());
        let mut state2 = SimState::new(99999, config());
        let start = TickInput {
            start: Some(DrawRequest::Random(config())),
            ..Default::default()
        };
        tick(&mut state1, &start, SIM_DT);
        tick(&mut state2, &start, SIM_DT);

        for _ in 0..300 {
            tick(&mut state1, &TickInput::default(), SIM_DT);
            tick(&mut state2, &TickInput::default(), SIM_DT);
        }

        assert_eq!(state1.mode, state2.mode);
        assert_eq!(state1.session, state2.session);
        for (b1, b2) in state1.balls.iter().zip(&state2.balls) {
            assert_eq!(b1.pos, b2.pos);
            assert_eq!(b1.vel, b2.vel);
        }
    }

    #[test]
    fn test_scheduled_eject_runs_after_physics() {
        let mut state = SimState::new(6, config());
        state.balls = vec![Ball::new(1, 7, Vec3::new(0.0, -100.0, 0.0), 0.0)];
        state.mode = DrawMode::Drawing;
        let (due, epoch) = (state.time, state.epoch);
        state.schedule.push(due, ScheduledAction::EjectBall, epoch);

        tick(&mut state, &TickInput::default(), SIM_DT);

        // The ball took this tick's gravity before leaving the drum
        let ball = &state.balls[0];
        assert!(ball.is_exiting());
        assert!(ball.vel.y < 0.0);
        assert!(state.schedule.is_empty());
    }
}
