//! Draw state and core simulation types
//!
//! Everything a tick reads or mutates lives in `SimState`, passed explicitly
//! to each subsystem.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::schedule::Schedule;
use crate::audio::SoundCue;
use crate::consts::*;
use crate::settings::DrawConfig;
use crate::stats::DrawPlan;

/// Global draw mode
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum DrawMode {
    /// Balls settle under gravity, waiting for a draw
    #[default]
    Idle,
    /// Jet and swirl are mixing the balls
    Airblast { mix_elapsed: f32 },
    /// Mixing finished, a ball is gliding out
    Drawing,
    /// A drawn ball is being showcased at the drum center
    Focus,
}

impl DrawMode {
    pub fn name(&self) -> &'static str {
        match self {
            DrawMode::Idle => "idle",
            DrawMode::Airblast { .. } => "airblast",
            DrawMode::Drawing => "drawing",
            DrawMode::Focus => "focus",
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self, DrawMode::Idle)
    }

    pub fn is_airblast(&self) -> bool {
        matches!(self, DrawMode::Airblast { .. })
    }
}

/// Which stage of a two-stage draw is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DrawPhase {
    /// Main numbers
    #[default]
    Main,
    /// Stars / extra numbers
    Second,
}

/// Per-ball animation state; anything but `InDrum` means the ball is exiting
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub enum BallAnim {
    /// Free in the drum, driven by physics
    #[default]
    InDrum,
    /// Gliding from the drum wall to the exit slot
    Exiting {
        from: Vec3,
        progress: f32,
        phase: DrawPhase,
    },
    /// Moving from the exit slot to the drum center while scaling up
    FocusMove {
        from: Vec3,
        timer: f32,
        phase: DrawPhase,
    },
    /// Pinned at the center for reading
    FocusHold { timer: f32, phase: DrawPhase },
    /// Fading out before the result is committed
    FocusFade { timer: f32, phase: DrawPhase },
}

impl BallAnim {
    pub fn is_exiting(&self) -> bool {
        !matches!(self, BallAnim::InDrum)
    }

    pub fn is_focus(&self) -> bool {
        matches!(
            self,
            BallAnim::FocusMove { .. } | BallAnim::FocusHold { .. } | BallAnim::FocusFade { .. }
        )
    }

    /// Phase captured when the glide started
    pub fn phase(&self) -> Option<DrawPhase> {
        match *self {
            BallAnim::InDrum => None,
            BallAnim::Exiting { phase, .. }
            | BallAnim::FocusMove { phase, .. }
            | BallAnim::FocusHold { phase, .. }
            | BallAnim::FocusFade { phase, .. } => Some(phase),
        }
    }
}

/// A numbered ball (or star)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub number: u32,
    pub pos: Vec3,
    pub vel: Vec3,
    /// Excluded from physics without being removed
    pub asleep: bool,
    pub anim: BallAnim,
    pub spin_angle: f32,
    pub spin_vel: f32,
    /// Euler rotation (x, y, z) for display
    pub rotation: Vec3,
    pub scale: f32,
    pub opacity: f32,
}

impl Ball {
    pub fn new(id: u32, number: u32, pos: Vec3, spin_angle: f32) -> Self {
        Self {
            id,
            number,
            pos,
            vel: Vec3::ZERO,
            asleep: false,
            anim: BallAnim::InDrum,
            spin_angle,
            spin_vel: 0.0,
            rotation: Vec3::new(0.0, spin_angle, 0.0),
            scale: 1.0,
            opacity: 1.0,
        }
    }

    pub fn is_exiting(&self) -> bool {
        self.anim.is_exiting()
    }

    /// Subject to drum forces and collisions
    pub fn is_active(&self) -> bool {
        !self.is_exiting() && !self.asleep
    }
}

/// Results of the draw in progress
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawSession {
    pub drawn_main: Vec<u32>,
    pub drawn_second: Vec<u32>,
    pub phase: DrawPhase,
    /// Balls committed in the current phase
    pub draw_index: usize,
}

impl DrawSession {
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_second_phase(&self) -> bool {
        self.phase == DrawPhase::Second
    }

    pub fn results(&self, phase: DrawPhase) -> &[u32] {
        match phase {
            DrawPhase::Main => &self.drawn_main,
            DrawPhase::Second => &self.drawn_second,
        }
    }

    pub fn commit(&mut self, number: u32, phase: DrawPhase) {
        match phase {
            DrawPhase::Main => self.drawn_main.push(number),
            DrawPhase::Second => self.drawn_second.push(number),
        }
    }

    /// Most recent result of the active phase
    pub fn last_drawn(&self) -> Option<u32> {
        self.results(self.phase).last().copied()
    }
}

/// Observable engine output, drained by hosts after each tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DrawEvent {
    ModeChanged { from: DrawMode, to: DrawMode },
    PhaseChanged { phase: DrawPhase },
    BallEjected { id: u32, number: u32 },
    BallArrived { id: u32, number: u32 },
    ResultCommitted { number: u32, phase: DrawPhase },
    DrawComplete { main: Vec<u32>, second: Vec<u32> },
    Sound(SoundCue),
}

/// Complete simulation state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    /// Seed for reproducibility
    pub seed: u64,
    pub(crate) rng: Pcg32,
    /// Simulation clock (seconds)
    pub time: f64,
    pub time_ticks: u64,
    pub mode: DrawMode,
    pub session: DrawSession,
    /// Snapshot read at draw start
    pub config: DrawConfig,
    /// Weighted plan for the draw in progress
    pub plan: Option<DrawPlan>,
    /// Drum population (sorted by id)
    pub balls: Vec<Ball>,
    /// Elapsed jet time, drives the turbulence pulse
    pub jet_phase: f32,
    /// Cosmetic drum rotation (x, y, z)
    pub drum_rotation: Vec3,
    /// Clock time of the last knock cue
    pub last_knock: Option<f64>,
    /// Pending delayed actions
    pub schedule: Schedule,
    /// Bumped on every reset; scheduled actions from older epochs are inert
    pub epoch: u32,
    #[serde(skip)]
    pub events: Vec<DrawEvent>,
    next_id: u32,
}

impl SimState {
    /// Create a state with the main population already in the drum
    pub fn new(seed: u64, config: DrawConfig) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time: 0.0,
            time_ticks: 0,
            mode: DrawMode::Idle,
            session: DrawSession::default(),
            config,
            plan: None,
            balls: Vec::new(),
            jet_phase: 0.0,
            drum_rotation: Vec3::ZERO,
            last_knock: None,
            schedule: Schedule::default(),
            epoch: 0,
            events: Vec::new(),
            next_id: 1,
        };
        state.populate(config.main_count);
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Replace the population with balls numbered 1..=count
    ///
    /// Spawn points are uniform inside the inner drum volume, rejecting
    /// points closer than 2.2 radii to an existing ball (bounded tries).
    pub fn populate(&mut self, count: u32) {
        self.balls.clear();
        let inner_r = SPHERE_RADIUS - BALL_RADIUS * 2.0;
        let min_spacing = BALL_RADIUS * SPAWN_SPACING;

        for number in 1..=count {
            let mut pos;
            let mut tries = 0;
            loop {
                let theta = self.rng.random::<f32>() * std::f32::consts::TAU;
                let phi = self.rng.random_range(-1.0f32..=1.0).acos();
                let r = inner_r * self.rng.random::<f32>().cbrt();
                pos = Vec3::new(
                    r * phi.sin() * theta.cos(),
                    r * phi.cos(),
                    r * phi.sin() * theta.sin(),
                );
                tries += 1;
                let crowded = self.balls.iter().any(|b| b.pos.distance(pos) < min_spacing);
                if !crowded || tries >= SPAWN_TRIES {
                    break;
                }
            }
            let spin = self.rng.random::<f32>() * std::f32::consts::TAU;
            let id = self.next_entity_id();
            self.balls.push(Ball::new(id, number, pos, spin));
        }
    }

    pub fn exiting_ball(&self) -> Option<&Ball> {
        self.balls.iter().find(|b| b.is_exiting())
    }

    pub fn exiting_count(&self) -> usize {
        self.balls.iter().filter(|b| b.is_exiting()).count()
    }

    pub fn is_focus_active(&self) -> bool {
        self.mode == DrawMode::Focus || self.balls.iter().any(|b| b.anim.is_focus())
    }

    pub fn emit(&mut self, event: DrawEvent) {
        self.events.push(event);
    }

    /// Switch mode, emitting a change event when it differs
    pub fn set_mode(&mut self, to: DrawMode) {
        let from = self.mode;
        self.mode = to;
        if from.name() != to.name() {
            log::debug!("Mode {} -> {}", from.name(), to.name());
            self.emit(DrawEvent::ModeChanged { from, to });
        }
    }

    /// Take all events emitted since the last drain
    pub fn drain_events(&mut self) -> Vec<DrawEvent> {
        std::mem::take(&mut self.events)
    }

    /// Draw target for the active phase
    pub fn current_target(&self) -> usize {
        match self.session.phase {
            DrawPhase::Main => self.config.main_target as usize,
            DrawPhase::Second => self.config.second_target as usize,
        }
    }
}
