//! Jet-strength modulation
//!
//! The air jet runs at a constant strength by default. Two optional modes let
//! the player drive it: shaking the device or blowing into the microphone.
//! Sensor capture happens elsewhere; this module only turns raw readings into
//! the per-tick multiplier the simulation consumes.

use serde::{Deserialize, Serialize};

/// Standard gravity removed from accelerometer magnitudes
const EARTH_GRAVITY: f32 = 9.81;
/// Shake strength below this produces no air
const SHAKE_THRESHOLD: f32 = 2.0;
const SHAKE_MAX_MULTIPLIER: f32 = 4.0;
/// Per-frame decay of the smoothed shake strength
const SHAKE_DECAY: f32 = 0.98;
/// Microphone RMS noise floor (fans, room tone)
const MIC_NOISE_FLOOR: f32 = 0.02;
const MIC_SENSITIVITY: f32 = 35.0;
const MIC_MAX_MULTIPLIER: f32 = 5.0;

/// Source of the jet strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BlowerMode {
    /// Fixed base strength
    #[default]
    Constant,
    /// Device-motion shake intensity
    Shake,
    /// Microphone breath intensity
    Breath,
}

impl BlowerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlowerMode::Constant => "auto",
            BlowerMode::Shake => "shake",
            BlowerMode::Breath => "blow",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "auto" | "constant" => Some(BlowerMode::Constant),
            "shake" => Some(BlowerMode::Shake),
            "blow" | "breath" => Some(BlowerMode::Breath),
            _ => None,
        }
    }
}

/// Smoothed input levels and the resulting jet multiplier
#[derive(Debug, Clone, Default)]
pub struct BlowerInput {
    mode: BlowerMode,
    shake_strength: f32,
    mic_level: f32,
}

impl BlowerInput {
    pub fn new(mode: BlowerMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn mode(&self) -> BlowerMode {
        self.mode
    }

    /// Switch mode. Callers fall back to `Constant` when a sensor is refused.
    pub fn set_mode(&mut self, mode: BlowerMode) {
        if self.mode != mode {
            log::info!("Blower mode: {}", mode.as_str());
        }
        self.mode = mode;
    }

    pub fn shake_strength(&self) -> f32 {
        self.shake_strength
    }

    pub fn mic_level(&self) -> f32 {
        self.mic_level
    }

    /// Feed one accelerometer reading (including gravity), m/s²
    pub fn handle_motion(&mut self, ax: f32, ay: f32, az: f32) {
        let magnitude = (ax * ax + ay * ay + az * az).sqrt();
        let strength = (magnitude - EARTH_GRAVITY).max(0.0);
        self.shake_strength = self.shake_strength * 0.8 + strength * 0.2;
    }

    /// Feed one buffer of 8-bit time-domain microphone samples (128 = silence)
    pub fn handle_mic_samples(&mut self, samples: &[u8]) {
        if samples.is_empty() {
            return;
        }
        let sum: f32 = samples
            .iter()
            .map(|&s| {
                let v = (s as f32 - 128.0) / 128.0;
                v * v
            })
            .sum();
        let rms = (sum / samples.len() as f32).sqrt();
        self.mic_level = self.mic_level * 0.5 + rms * 0.5;
    }

    /// Once per frame, before reading the multiplier
    pub fn decay(&mut self) {
        self.shake_strength *= SHAKE_DECAY;
    }

    /// Jet strength multiplier for the current frame
    pub fn jet_multiplier(&self) -> f32 {
        match self.mode {
            BlowerMode::Constant => 1.0,
            BlowerMode::Shake => {
                if self.shake_strength < SHAKE_THRESHOLD {
                    0.0
                } else {
                    ((self.shake_strength - SHAKE_THRESHOLD) / 3.0).min(SHAKE_MAX_MULTIPLIER)
                }
            }
            BlowerMode::Breath => {
                if self.mic_level < MIC_NOISE_FLOOR {
                    0.0
                } else {
                    ((self.mic_level - MIC_NOISE_FLOOR) * MIC_SENSITIVITY).min(MIC_MAX_MULTIPLIER)
                }
            }
        }
    }

    /// Whether the "blow now" hint should be visible
    pub fn show_blow_hint(&self, airblast: bool) -> bool {
        airblast && self.mode == BlowerMode::Breath
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_mode() {
        let input = BlowerInput::default();
        assert_eq!(input.jet_multiplier(), 1.0);
        assert!(!input.show_blow_hint(true));
    }

    #[test]
    fn test_shake_threshold_and_cap() {
        let mut input = BlowerInput::new(BlowerMode::Shake);
        // Device at rest: only gravity
        for _ in 0..20 {
            input.handle_motion(0.0, 9.81, 0.0);
        }
        assert_eq!(input.jet_multiplier(), 0.0);

        // Violent shaking saturates at 4x
        for _ in 0..100 {
            input.handle_motion(40.0, 40.0, 40.0);
        }
        assert_eq!(input.jet_multiplier(), SHAKE_MAX_MULTIPLIER);

        // Stops shaking: decays back below threshold
        for _ in 0..400 {
            input.decay();
        }
        assert_eq!(input.jet_multiplier(), 0.0);
    }

    #[test]
    fn test_breath_levels() {
        let mut input = BlowerInput::new(BlowerMode::Breath);
        input.handle_mic_samples(&[128; 512]);
        assert_eq!(input.jet_multiplier(), 0.0);

        // Square wave at ±0.25 amplitude
        let loud: Vec<u8> = (0..512).map(|i| if i % 2 == 0 { 160 } else { 96 }).collect();
        for _ in 0..10 {
            input.handle_mic_samples(&loud);
        }
        assert!((input.mic_level() - 0.25).abs() < 0.01);
        assert_eq!(input.jet_multiplier(), MIC_MAX_MULTIPLIER);
        assert!(input.show_blow_hint(true));
        assert!(!input.show_blow_hint(false));
    }

    #[test]
    fn test_mode_names() {
        assert_eq!(BlowerMode::from_str("blow"), Some(BlowerMode::Breath));
        assert_eq!(BlowerMode::Shake.as_str(), "shake");
    }
}
