//! Audio cue routing
//!
//! The simulation only emits cues; it never waits for playback. Playback
//! failures (missing backend, autoplay restrictions) are logged and dropped.

use serde::{Deserialize, Serialize};

use crate::blower::BlowerMode;
use crate::error::AudioError;
use crate::sim::DrawEvent;

/// Cues emitted by the draw engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    /// Air jet switched on (looping)
    AirBegin,
    /// Air jet switched off
    AirEnd,
    /// Ejected ball reached the exit slot
    BallArrived,
    /// Draw finished
    Fanfare,
    /// Hard ball-on-ball impact while mixing (rate limited by the engine)
    Knock,
}

/// Playable sound sources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sound {
    Air,
    Ball,
    Fanfare,
    Knock,
}

/// Something that can actually make noise
pub trait AudioBackend {
    fn play(&mut self, sound: Sound, volume: f32) -> Result<(), AudioError>;
    fn stop(&mut self, sound: Sound) -> Result<(), AudioError>;
}

/// Backend that only logs; used by the headless runner
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn play(&mut self, sound: Sound, volume: f32) -> Result<(), AudioError> {
        log::debug!("play {:?} at {:.2}", sound, volume);
        Ok(())
    }

    fn stop(&mut self, sound: Sound) -> Result<(), AudioError> {
        log::debug!("stop {:?}", sound);
        Ok(())
    }
}

/// Audio manager for the draw
pub struct AudioManager {
    backend: Option<Box<dyn AudioBackend>>,
    master_volume: f32,
    muted: bool,
    blower_mode: BlowerMode,
}

impl Default for AudioManager {
    fn default() -> Self {
        Self::new(None)
    }
}

impl AudioManager {
    pub fn new(backend: Option<Box<dyn AudioBackend>>) -> Self {
        if backend.is_none() {
            log::warn!("No audio backend - audio disabled");
        }
        Self {
            backend,
            master_volume: 0.8,
            muted: false,
            blower_mode: BlowerMode::Constant,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
        if muted {
            for sound in [Sound::Air, Sound::Ball, Sound::Fanfare, Sound::Knock] {
                self.stop(sound);
            }
        }
    }

    pub fn toggle_muted(&mut self) -> bool {
        self.set_muted(!self.muted);
        self.muted
    }

    pub fn is_muted(&self) -> bool {
        self.muted
    }

    /// The air loop is only audible with the constant blower
    pub fn set_blower_mode(&mut self, mode: BlowerMode) {
        self.blower_mode = mode;
        if mode != BlowerMode::Constant {
            self.stop(Sound::Air);
        }
    }

    fn effective_volume(&self) -> f32 {
        if self.muted { 0.0 } else { self.master_volume }
    }

    /// Map a cue to a backend call
    pub fn handle_cue(&mut self, cue: SoundCue) {
        match cue {
            SoundCue::AirBegin => {
                if self.blower_mode == BlowerMode::Constant {
                    self.play(Sound::Air);
                }
            }
            SoundCue::AirEnd => self.stop(Sound::Air),
            SoundCue::BallArrived => self.play(Sound::Ball),
            SoundCue::Fanfare => self.play(Sound::Fanfare),
            SoundCue::Knock => self.play(Sound::Knock),
        }
    }

    /// Route every sound cue in a batch of engine events
    pub fn handle_events<'a>(&mut self, events: impl IntoIterator<Item = &'a DrawEvent>) {
        for event in events {
            if let DrawEvent::Sound(cue) = event {
                self.handle_cue(*cue);
            }
        }
    }

    fn play(&mut self, sound: Sound) {
        let vol = self.effective_volume();
        if vol <= 0.0 {
            return;
        }
        let Some(backend) = self.backend.as_mut() else { return };
        if let Err(err) = backend.play(sound, vol) {
            log::debug!("Ignoring audio failure for {:?}: {}", sound, err);
        }
    }

    fn stop(&mut self, sound: Sound) {
        let Some(backend) = self.backend.as_mut() else { return };
        if let Err(err) = backend.stop(sound) {
            log::debug!("Ignoring audio failure for {:?}: {}", sound, err);
        }
    }
}
