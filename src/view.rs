//! Presentation snapshot
//!
//! Read-only projection of the simulation for a renderer: world-space
//! transforms per ball, the drum rotation, the final showcase layout and the
//! results text. Physics units are scaled down to world units here.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::settings::SecondKind;
use crate::sim::{DrawPhase, SimState};

/// Transform of one ball for the current frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallView {
    pub id: u32,
    pub number: u32,
    /// World-space position
    pub position: Vec3,
    /// Euler rotation (x, y, z)
    pub rotation: Vec3,
    pub scale: f32,
    pub opacity: f32,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrumView {
    pub balls: Vec<BallView>,
    pub drum_rotation: Vec3,
    pub mode: String,
    pub phase: DrawPhase,
    /// "Blow into the mic" hint visibility
    pub blow_hint: bool,
}

pub fn ball_views(state: &SimState) -> Vec<BallView> {
    state
        .balls
        .iter()
        .map(|b| BallView {
            id: b.id,
            number: b.number,
            position: b.pos * WORLD_SCALE,
            rotation: b.rotation,
            scale: b.scale,
            opacity: b.opacity,
        })
        .collect()
}

pub fn drum_view(state: &SimState, blow_hint: bool) -> DrumView {
    DrumView {
        balls: ball_views(state),
        drum_rotation: state.drum_rotation,
        mode: state.mode.name().to_string(),
        phase: state.session.phase,
        blow_hint,
    }
}

/// One ball of the results showcase
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShowcaseSlot {
    pub number: u32,
    pub phase: DrawPhase,
    pub position: Vec3,
}

const SHOWCASE_Z: f32 = 4.0;
const SHOWCASE_ROW_CENTER: f32 = 1.5;
const SHOWCASE_ROW_GAP: f32 = 1.5;

/// Lay out the results in front of the drum: main numbers on top, the
/// second phase below, each row sorted and centered
pub fn showcase_layout(main: &[u32], second: &[u32]) -> Vec<ShowcaseSlot> {
    let mut slots = row(main, DrawPhase::Main, SHOWCASE_ROW_CENTER + SHOWCASE_ROW_GAP * 0.5);
    slots.extend(row(second, DrawPhase::Second, SHOWCASE_ROW_CENTER - SHOWCASE_ROW_GAP * 0.5));
    slots
}

fn row(numbers: &[u32], phase: DrawPhase, y: f32) -> Vec<ShowcaseSlot> {
    let spacing = BALL_RADIUS_WORLD * 3.0;
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    let start_x = -(sorted.len().saturating_sub(1) as f32) * spacing * 0.5;

    sorted
        .into_iter()
        .enumerate()
        .map(|(i, number)| ShowcaseSlot {
            number,
            phase,
            position: Vec3::new(start_x + i as f32 * spacing, y, SHOWCASE_Z),
        })
        .collect()
}

fn chips(numbers: &[u32]) -> String {
    if numbers.is_empty() {
        return "-".to_string();
    }
    let mut sorted = numbers.to_vec();
    sorted.sort_unstable();
    sorted.iter().map(u32::to_string).collect::<Vec<_>>().join(" ")
}

/// Banner text, e.g. `Numbers: 3 17 22 | Stars: 4 9`
pub fn format_results(main: &[u32], second: &[u32], kind: SecondKind) -> String {
    format!("Numbers: {} | {}: {}", chips(main), kind.label(), chips(second))
}

/// "Last drawn" line for the active phase
pub fn format_last_drawn(state: &SimState) -> String {
    match state.session.last_drawn() {
        Some(n) => format!("Last drawn: {}", n),
        None => "Last drawn: -".to_string(),
    }
}
