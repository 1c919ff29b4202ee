//! Draw settings and presets
//!
//! Everything the sequencer reads at draw start. Values coming from the
//! outside (text fields, JSON files) are clamped here, never rejected.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blower::BlowerMode;
use crate::consts::{DEFAULT_MIX_TIME, MAX_MIX_TIME, MAX_POPULATION};
use crate::error::SettingsError;
use crate::stats::DEFAULT_STAT_WEIGHT;

/// Lottery presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Preset {
    Euromillions,
    Eurojackpot,
    SwissLotto,
    #[default]
    Custom,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Euromillions => "euromillions",
            Preset::Eurojackpot => "eurojackpot",
            Preset::SwissLotto => "swisslotto",
            Preset::Custom => "custom",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "euromillions" | "euro-millions" => Some(Preset::Euromillions),
            "eurojackpot" => Some(Preset::Eurojackpot),
            "swisslotto" | "swiss-lotto" => Some(Preset::SwissLotto),
            "custom" => Some(Preset::Custom),
            _ => None,
        }
    }

    /// (main population, main target, second population, second target)
    pub fn counts(&self) -> (u32, u32, u32, u32) {
        match self {
            Preset::Euromillions => (50, 5, 12, 2),
            Preset::Eurojackpot => (50, 5, 12, 2),
            Preset::SwissLotto => (42, 6, 6, 1),
            Preset::Custom => (50, 5, 12, 2),
        }
    }

    /// Shape of the second-phase pieces
    pub fn second_kind(&self) -> SecondKind {
        match self {
            Preset::Euromillions => SecondKind::Star,
            Preset::Eurojackpot | Preset::SwissLotto | Preset::Custom => SecondKind::Extra,
        }
    }
}

/// What the second phase draws
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SecondKind {
    #[default]
    Star,
    Extra,
}

impl SecondKind {
    pub fn label(&self) -> &'static str {
        match self {
            SecondKind::Star => "Stars",
            SecondKind::Extra => "Extra",
        }
    }
}

/// Sanitized per-draw snapshot read by the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawConfig {
    pub main_count: u32,
    pub main_target: u32,
    pub second_count: u32,
    pub second_target: u32,
    /// Auto-mix duration in seconds, (0, 60]
    pub mix_time: f32,
}

impl Default for DrawConfig {
    fn default() -> Self {
        DrawSettings::default().draw_config()
    }
}

impl DrawConfig {
    /// Build a clamped config from arbitrary values
    pub fn clamped(
        main_count: u32,
        main_target: u32,
        second_count: u32,
        second_target: u32,
        mix_time: f32,
    ) -> Self {
        let main_count = main_count.min(MAX_POPULATION);
        let second_count = second_count.min(MAX_POPULATION);
        Self {
            main_count,
            main_target: main_target.min(main_count),
            second_count,
            second_target: second_target.min(second_count),
            mix_time: clamp_mix_time(mix_time),
        }
    }

    /// True when a second phase follows the main phase
    pub fn has_second_phase(&self) -> bool {
        self.second_target > 0 && self.second_count > 0
    }
}

/// User-facing draw settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DrawSettings {
    pub preset: Preset,

    // === Populations ===
    pub main_count: u32,
    pub main_target: u32,
    pub second_count: u32,
    pub second_target: u32,
    pub second_kind: SecondKind,

    // === Mixing ===
    /// Seconds of air mixing before each ejection
    pub mix_time: f32,
    pub blower_mode: BlowerMode,

    // === Weighted draws ===
    /// 0 = uniform, 0.3 = mild preference for "hot" numbers, 0.6 = strong
    pub stat_weight: f64,

    // === Audio ===
    pub muted: bool,
}

impl Default for DrawSettings {
    fn default() -> Self {
        Self::from_preset(Preset::Custom)
    }
}

impl DrawSettings {
    /// Create settings from a preset (applies preset counts)
    pub fn from_preset(preset: Preset) -> Self {
        let mut settings = Self {
            preset,
            main_count: 0,
            main_target: 0,
            second_count: 0,
            second_target: 0,
            second_kind: SecondKind::Star,
            mix_time: DEFAULT_MIX_TIME,
            blower_mode: BlowerMode::Constant,
            stat_weight: DEFAULT_STAT_WEIGHT,
            muted: false,
        };
        settings.apply_preset(preset);
        settings
    }

    /// Apply a preset (rewrites counts and second-phase kind)
    pub fn apply_preset(&mut self, preset: Preset) {
        let (main_count, main_target, second_count, second_target) = preset.counts();
        self.preset = preset;
        self.main_count = main_count;
        self.main_target = main_target;
        self.second_count = second_count;
        self.second_target = second_target;
        self.second_kind = preset.second_kind();
        self.sanitize();
    }

    /// Clamp every field into its legal range
    pub fn sanitize(&mut self) {
        let config = self.draw_config();
        self.main_count = config.main_count;
        self.main_target = config.main_target;
        self.second_count = config.second_count;
        self.second_target = config.second_target;
        self.mix_time = config.mix_time;
        self.stat_weight = if self.stat_weight.is_finite() {
            self.stat_weight.clamp(0.0, 1.0)
        } else {
            DEFAULT_STAT_WEIGHT
        };
    }

    /// Snapshot for the sequencer
    pub fn draw_config(&self) -> DrawConfig {
        DrawConfig::clamped(
            self.main_count,
            self.main_target,
            self.second_count,
            self.second_target,
            self.mix_time,
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, SettingsError> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Load settings, falling back to defaults on any failure
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("Using default settings ({}): {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SettingsError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        log::info!("Settings saved");
        Ok(())
    }
}

/// Parse a population/target text field: non-numeric or negative becomes 0
pub fn parse_count(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(v) if v > 0 => v.min(MAX_POPULATION as i64) as u32,
        _ => 0,
    }
}

/// Parse a mix-time text field: non-numeric or non-positive becomes the default
pub fn parse_mix_time(raw: &str) -> f32 {
    clamp_mix_time(raw.trim().parse::<f32>().unwrap_or(f32::NAN))
}

fn clamp_mix_time(mix_time: f32) -> f32 {
    if !mix_time.is_finite() || mix_time <= 0.0 {
        DEFAULT_MIX_TIME
    } else {
        mix_time.min(MAX_MIX_TIME)
    }
}
