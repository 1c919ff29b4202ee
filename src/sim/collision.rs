//! Ball-ball collision detection and response
//!
//! All-pairs scan over active balls. Overlaps are repaired positionally
//! (equal split along the contact normal) and approaching pairs exchange an
//! equal-mass impulse with restitution. A few positional-only passes follow
//! so stacked balls do not end the tick interpenetrating.

use glam::Vec3;

use super::state::{Ball, DrawEvent, SimState};
use crate::audio::SoundCue;
use crate::consts::*;

/// Reflect velocity off a surface with given normal
#[inline]
pub fn reflect_velocity(velocity: Vec3, normal: Vec3) -> Vec3 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Outcome of resolving one pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Closing speed along the normal (positive when approaching)
    pub impact: f32,
}

/// Resolve one overlapping pair in place; `None` when they do not touch
///
/// The normal points from `a` to `b`. Coincident centers are left alone.
pub fn resolve_pair(a: &mut Ball, b: &mut Ball) -> Option<Contact> {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    let min_dist = BALL_RADIUS * 2.0;
    if dist <= 0.0 || dist >= min_dist {
        return None;
    }

    let n = delta / dist;
    let half = (min_dist - dist) * 0.5;
    a.pos -= n * half;
    b.pos += n * half;

    let rel = (b.vel - a.vel).dot(n);
    if rel >= 0.0 {
        return Some(Contact { impact: 0.0 });
    }

    let impulse = -(1.0 + BOUNCE) * rel * 0.5;
    a.vel -= n * impulse;
    b.vel += n * impulse;

    Some(Contact { impact: -rel })
}

/// Positional-only overlap repair; returns true if anything moved
pub fn separate_pair(a: &mut Ball, b: &mut Ball) -> bool {
    let delta = b.pos - a.pos;
    let dist = delta.length();
    let min_dist = BALL_RADIUS * 2.0;
    if dist <= 0.0 || dist >= min_dist {
        return false;
    }
    let n = delta / dist;
    let half = (min_dist - dist) * 0.5;
    a.pos -= n * half;
    b.pos += n * half;
    true
}

/// Clamp active balls back inside the drum wall (position only)
pub fn contain(balls: &mut [Ball]) {
    let max_dist = SPHERE_RADIUS - BALL_RADIUS;
    for ball in balls.iter_mut().filter(|b| b.is_active()) {
        let dist = ball.pos.length();
        if dist > max_dist {
            ball.pos *= max_dist / dist;
        }
    }
}

/// Visit each active pair (i < j) with mutable access to both balls
fn for_each_active_pair(balls: &mut [Ball], mut f: impl FnMut(&mut Ball, &mut Ball)) {
    let n = balls.len();
    for i in 0..n {
        if !balls[i].is_active() {
            continue;
        }
        let (head, tail) = balls.split_at_mut(i + 1);
        let a = &mut head[i];
        for b in tail.iter_mut().filter(|b| b.is_active()) {
            f(&mut *a, b);
        }
    }
}

/// Impulse pass; returns the closing speed of every approaching contact
pub fn resolve_collisions(balls: &mut [Ball]) -> Vec<f32> {
    let mut impacts = Vec::new();
    for_each_active_pair(balls, |a, b| {
        if let Some(contact) = resolve_pair(a, b) {
            if contact.impact > 0.0 {
                impacts.push(contact.impact);
            }
        }
    });
    impacts
}

/// Extra positional passes, each followed by a wall clamp
pub fn relax_overlaps(balls: &mut [Ball], iterations: usize) {
    for _ in 0..iterations {
        let mut moved = false;
        for_each_active_pair(balls, |a, b| {
            moved |= separate_pair(a, b);
        });
        contain(balls);
        if !moved {
            break;
        }
    }
}

/// Collision stage of the tick, including knock cues while mixing
pub fn handle_collisions(state: &mut SimState) {
    let impacts = resolve_collisions(&mut state.balls);
    relax_overlaps(&mut state.balls, RELAX_ITERATIONS);

    if !state.mode.is_airblast() {
        return;
    }
    // Knocks are rate limited on the sim clock, so several hard hits in one
    // tick still produce a single cue
    for impact in impacts {
        if impact > IMPACT_THRESHOLD && knock_ready(state.last_knock, state.time) {
            state.last_knock = Some(state.time);
            state.emit(DrawEvent::Sound(SoundCue::Knock));
        }
    }
}

#[inline]
fn knock_ready(last: Option<f64>, now: f64) -> bool {
    match last {
        Some(t) => now - t >= KNOCK_COOLDOWN,
        None => true,
    }
}
