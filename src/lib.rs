//! Lotto Drum - a physics-driven lottery draw
//!
//! Core modules:
//! - `sim`: Deterministic simulation (forces, collisions, draw sequencing)
//! - `stats`: Historical frequency/recency weighting and draw planning
//! - `history`: Past draw records and the load-once cache
//! - `settings`: Draw configuration, presets and clamping rules
//! - `blower`: Jet-strength modulation from shake/breath input
//! - `audio`: Sound cue routing
//! - `view`: Per-tick presentation snapshot

pub mod audio;
pub mod blower;
pub mod error;
pub mod history;
pub mod settings;
pub mod sim;
pub mod stats;
pub mod view;

pub use error::{AudioError, HistoryError, SettingsError};
pub use settings::{DrawConfig, DrawSettings, Preset};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep used by hosts (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Largest step a single tick will integrate (frame hitches are clamped to this)
    pub const MAX_DT: f32 = 0.03;

    /// Drum dimensions (simulation units)
    pub const SPHERE_RADIUS: f32 = 190.0;
    pub const BALL_RADIUS: f32 = 18.0;

    /// Drum radius in render-world units
    pub const DRUM_RADIUS_WORLD: f32 = 4.0;
    /// Simulation units -> world units
    pub const WORLD_SCALE: f32 = DRUM_RADIUS_WORLD / SPHERE_RADIUS;
    pub const BALL_RADIUS_WORLD: f32 = BALL_RADIUS * WORLD_SCALE;

    /// Drum physics
    pub const DAMPING: f32 = 0.975;
    pub const BOUNCE: f32 = 0.95;
    pub const MAX_SPEED: f32 = 700.0;
    pub const GRAVITY: f32 = 800.0;
    pub const OUTWARD_FORCE: f32 = 130.0;
    /// Vertical share of the shell force
    pub const SHELL_VERTICAL_SCALE: f32 = 0.3;
    /// Lateral kick given to balls bouncing off the bottom pole
    pub const BOTTOM_KICK_SPEED: f32 = 140.0;
    /// Contact normals with y below this count as "bottom pole"
    pub const BOTTOM_KICK_NORMAL_Y: f32 = -0.7;

    /// Ball self-rotation
    pub const SPIN_FACTOR: f32 = 0.010;
    pub const SPIN_DAMPING: f32 = 0.98;

    /// Air jet
    pub const JET_STRENGTH: f32 = 145_000.0;
    pub const JET_RADIUS: f32 = 120.0;
    pub const JET_HEIGHT: f32 = 150.0;
    /// Random lateral swirl as a fraction of jet strength
    pub const JET_SWIRL: f32 = 0.04;

    /// Whole-population tumbling (omega x r)
    pub const ROT_OMEGA: [f32; 3] = [0.2, 0.1, 0.05];
    pub const ROT_FORCE_SCALE: f32 = 15.0;
    /// Cosmetic drum rotation while mixing (rad/s)
    pub const DRUM_ROT_SPEED: f32 = 0.2;

    /// Collisions
    pub const IMPACT_THRESHOLD: f32 = 130.0;
    /// Minimum spacing between two knock cues (seconds)
    pub const KNOCK_COOLDOWN: f64 = 0.08;
    /// Positional relaxation passes after the impulse pass
    pub const RELAX_ITERATIONS: usize = 8;

    /// Exit glide progress per second
    pub const EXIT_RATE: f32 = 0.85;
    /// Delay before the second ejection attempt after mixing ends
    pub const SECOND_EJECT_DELAY: f64 = 0.5;
    /// Delay between the showcase and the fanfare
    pub const FANFARE_DELAY: f64 = 0.4;

    /// Focus sequence
    pub const FOCUS_SCALE: f32 = (0.95 * DRUM_RADIUS_WORLD) / BALL_RADIUS_WORLD;
    pub const FOCUS_MOVE_DURATION: f32 = 0.8;
    pub const FOCUS_HOLD_DURATION: f32 = 2.0;
    pub const FOCUS_FADE_DURATION: f32 = 0.5;
    /// Display pose of a focused ball (number tilted toward the camera)
    pub const FOCUS_FINAL_ROT: [f32; 3] = [-0.35, -0.18, 0.0];
    /// One full y turn while moving: 1 = forward, -1 = reverse
    pub const FOCUS_ROT_DIRECTION: f32 = -1.0;

    /// Population limits
    pub const MAX_POPULATION: u32 = 200;
    pub const DEFAULT_MIX_TIME: f32 = 5.0;
    pub const MAX_MIX_TIME: f32 = 60.0;
    /// Minimum spawn spacing as a multiple of the ball radius
    pub const SPAWN_SPACING: f32 = 2.2;
    pub const SPAWN_TRIES: u32 = 300;
}

/// Cubic ease: 3t² - 2t³
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Clamp to [0, 1]
#[inline]
pub fn saturate(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_focus_scale_fills_drum() {
        // A focused ball is 95% of the drum radius
        let focused = consts::BALL_RADIUS_WORLD * consts::FOCUS_SCALE;
        assert!((focused - 0.95 * consts::DRUM_RADIUS_WORLD).abs() < 1e-4);
    }
}
