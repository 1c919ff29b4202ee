//! Draw sequencer
//!
//! Drives a draw through its modes:
//! `idle -> airblast -> drawing -> focus(move, hold, fade) -> airblast | idle`,
//! with a main phase followed by an optional second phase. Only one ball may
//! be exiting at any time.

use glam::Vec3;
use rand::Rng;

use super::schedule::ScheduledAction;
use super::state::{BallAnim, DrawEvent, DrawMode, DrawPhase, SimState};
use crate::audio::SoundCue;
use crate::consts::*;
use crate::settings::DrawConfig;
use crate::stats::DrawPlan;
use crate::{lerp, saturate, smoothstep};

/// Fixed point just inside the drum mouth where gliding balls arrive
pub fn exit_slot() -> Vec3 {
    Vec3::new(0.0, -(SPHERE_RADIUS - BALL_RADIUS * 0.5), SPHERE_RADIUS * 0.3)
}

/// Final display orientation of a showcased ball
pub fn focus_final_rotation() -> Vec3 {
    Vec3::from_array(FOCUS_FINAL_ROT)
}

/// Begin a new draw from `idle`
///
/// Returns false (and changes nothing) when a draw is already running or
/// the main phase has nothing to draw.
pub fn start_draw(state: &mut SimState, config: DrawConfig, plan: Option<DrawPlan>) -> bool {
    if !state.mode.is_idle() {
        log::debug!("Draw already running ({})", state.mode.name());
        return false;
    }
    if config.main_count == 0 || config.main_target == 0 {
        log::warn!("Nothing to draw: {} of {}", config.main_target, config.main_count);
        return false;
    }

    state.config = config;
    state.plan = plan;
    state.session.clear();
    state.populate(config.main_count);
    state.jet_phase = 0.0;
    state.set_mode(DrawMode::Airblast { mix_elapsed: 0.0 });
    state.emit(DrawEvent::Sound(SoundCue::AirBegin));

    log::info!(
        "Draw started: {} of {}, then {} of {} ({})",
        config.main_target,
        config.main_count,
        config.second_target,
        config.second_count,
        if state.plan.is_some() { "weighted" } else { "random" }
    );
    true
}

/// Eject one ball from the drum
///
/// Refused while another ball is exiting or a showcase is running. A planned
/// number with no matching ball falls back to a uniform pick.
pub fn start_single_draw(state: &mut SimState) -> bool {
    if state.exiting_ball().is_some() || state.is_focus_active() {
        return false;
    }

    let remaining: Vec<usize> = state
        .balls
        .iter()
        .enumerate()
        .filter(|(_, b)| b.is_active())
        .map(|(i, _)| i)
        .collect();
    if remaining.is_empty() {
        log::debug!("No ball available to eject");
        return false;
    }

    let phase = state.session.phase;
    let planned = state
        .plan
        .as_ref()
        .and_then(|plan| plan.planned(phase, state.session.draw_index));

    let candidates: Vec<usize> = match planned {
        Some(number) => remaining
            .iter()
            .copied()
            .filter(|&i| state.balls[i].number == number)
            .collect(),
        None => Vec::new(),
    };
    if let (Some(number), true) = (planned, candidates.is_empty()) {
        log::debug!("Planned number {} not in drum, picking at random", number);
    }

    let pool = if candidates.is_empty() { &remaining } else { &candidates };
    let pick = pool[state.rng.random_range(0..pool.len())];

    let ball = &mut state.balls[pick];
    let len = ball.pos.length();
    let len = if len > 0.0 { len } else { 1.0 };
    let from = ball.pos * ((SPHERE_RADIUS - BALL_RADIUS) / len);
    ball.anim = BallAnim::Exiting {
        from,
        progress: 0.0,
        phase,
    };
    ball.opacity = 1.0;

    let (id, number) = (ball.id, ball.number);
    log::debug!("Ejecting ball {} (#{})", number, id);
    state.emit(DrawEvent::BallEjected { id, number });
    true
}

/// Count down the mix; when it runs out, stop the jet and eject
pub fn update_auto_mix(state: &mut SimState, dt: f32) {
    let DrawMode::Airblast { mix_elapsed } = state.mode else {
        return;
    };

    let elapsed = mix_elapsed + dt;
    if elapsed < state.config.mix_time {
        state.mode = DrawMode::Airblast { mix_elapsed: elapsed };
        return;
    }

    state.set_mode(DrawMode::Drawing);
    state.emit(DrawEvent::Sound(SoundCue::AirEnd));
    start_single_draw(state);
    let due = state.time + SECOND_EJECT_DELAY;
    let epoch = state.epoch;
    state.schedule.push(due, ScheduledAction::EjectBall, epoch);
}

/// Advance the exiting ball through glide and showcase, committing at the end
pub fn update_exiting_ball(state: &mut SimState, dt: f32) {
    let Some(idx) = state.balls.iter().position(|b| b.is_exiting()) else {
        return;
    };

    let ball = &mut state.balls[idx];
    match ball.anim {
        BallAnim::InDrum => {}
        BallAnim::Exiting {
            from,
            progress,
            phase,
        } => {
            let progress = (progress + dt * EXIT_RATE).min(1.0);
            ball.pos = from.lerp(exit_slot(), progress);
            if progress < 1.0 {
                ball.anim = BallAnim::Exiting {
                    from,
                    progress,
                    phase,
                };
                return;
            }

            ball.anim = BallAnim::FocusMove {
                from: ball.pos,
                timer: 0.0,
                phase,
            };
            let (id, number) = (ball.id, ball.number);
            state.emit(DrawEvent::BallArrived { id, number });
            state.emit(DrawEvent::Sound(SoundCue::BallArrived));
            state.set_mode(DrawMode::Focus);
        }
        BallAnim::FocusMove { from, timer, phase } => {
            let timer = timer + dt;
            let t = smoothstep(saturate(timer / FOCUS_MOVE_DURATION));
            ball.pos = from.lerp(Vec3::ZERO, t);
            ball.scale = lerp(1.0, FOCUS_SCALE, t);

            // One full turn about y, landing on the display angle
            let mut rot = focus_final_rotation();
            rot.y += FOCUS_ROT_DIRECTION * (1.0 - t) * std::f32::consts::TAU;
            ball.rotation = rot;

            ball.anim = if timer >= FOCUS_MOVE_DURATION {
                BallAnim::FocusHold { timer: 0.0, phase }
            } else {
                BallAnim::FocusMove { from, timer, phase }
            };
        }
        BallAnim::FocusHold { timer, phase } => {
            let timer = timer + dt;
            ball.pos = Vec3::ZERO;
            ball.scale = FOCUS_SCALE;
            ball.rotation = focus_final_rotation();

            ball.anim = if timer >= FOCUS_HOLD_DURATION {
                BallAnim::FocusFade { timer: 0.0, phase }
            } else {
                BallAnim::FocusHold { timer, phase }
            };
        }
        BallAnim::FocusFade { timer, phase } => {
            let timer = timer + dt;
            let f = saturate(timer / FOCUS_FADE_DURATION);
            ball.pos = Vec3::ZERO;
            ball.opacity = 1.0 - f;
            if f < 1.0 {
                ball.anim = BallAnim::FocusFade { timer, phase };
                return;
            }

            let number = ball.number;
            state.balls.remove(idx);
            commit_result(state, number, phase);
        }
    }
}

/// Record a drawn number and decide what comes next
fn commit_result(state: &mut SimState, number: u32, phase: DrawPhase) {
    state.session.commit(number, phase);
    state.session.draw_index += 1;
    state.emit(DrawEvent::ResultCommitted { number, phase });
    log::info!("Drawn {:?} #{}: {}", phase, state.session.draw_index, number);

    if state.session.draw_index < state.current_target() {
        // Re-mix before the next ball
        state.set_mode(DrawMode::Airblast { mix_elapsed: 0.0 });
        state.emit(DrawEvent::Sound(SoundCue::AirBegin));
        return;
    }

    if state.session.phase == DrawPhase::Main && state.config.has_second_phase() {
        state.session.phase = DrawPhase::Second;
        state.session.draw_index = 0;
        state.populate(state.config.second_count);
        state.set_mode(DrawMode::Airblast { mix_elapsed: 0.0 });
        state.emit(DrawEvent::PhaseChanged {
            phase: DrawPhase::Second,
        });
        state.emit(DrawEvent::Sound(SoundCue::AirBegin));
        log::info!("Second phase: {} of {}", state.config.second_target, state.config.second_count);
        return;
    }

    complete_draw(state);
}

fn complete_draw(state: &mut SimState) {
    state.set_mode(DrawMode::Idle);
    state.emit(DrawEvent::Sound(SoundCue::AirEnd));
    state.balls.clear();
    state.plan = None;

    let main = state.session.drawn_main.clone();
    let second = state.session.drawn_second.clone();
    log::info!("Draw complete: {:?} / {:?}", main, second);
    state.emit(DrawEvent::DrawComplete { main, second });

    let due = state.time + FANFARE_DELAY;
    let epoch = state.epoch;
    state.schedule.push(due, ScheduledAction::Fanfare, epoch);
}

/// Abort whatever is running and return to a settled `idle` drum
///
/// Pending scheduled actions become inert.
pub fn reset_all(state: &mut SimState) {
    state.set_mode(DrawMode::Idle);
    state.emit(DrawEvent::Sound(SoundCue::AirEnd));
    state.session.clear();
    state.plan = None;
    state.epoch = state.epoch.wrapping_add(1);
    state.jet_phase = 0.0;
    state.populate(state.config.main_count);
    log::info!("Reset (epoch {})", state.epoch);
}

/// Reset with a new configuration, e.g. after a preset change
pub fn reset_with_config(state: &mut SimState, config: DrawConfig) {
    state.config = config;
    reset_all(state);
}

/// Fire scheduled actions that are due, skipping stale ones
pub fn run_scheduled(state: &mut SimState) {
    for event in state.schedule.take_due(state.time) {
        if event.epoch != state.epoch {
            log::debug!("Dropping stale {:?}", event.action);
            continue;
        }
        match event.action {
            ScheduledAction::EjectBall => {
                if state.mode == DrawMode::Drawing {
                    start_single_draw(state);
                }
            }
            ScheduledAction::Fanfare => state.emit(DrawEvent::Sound(SoundCue::Fanfare)),
        }
    }
}
