//! Deterministic draw simulation
//!
//! All drum physics and draw sequencing live here. This module must be pure
//! and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies; hosts drain `DrawEvent`s

pub mod collision;
pub mod forces;
pub mod schedule;
pub mod sequencer;
pub mod state;
pub mod tick;

pub use collision::{contain, handle_collisions, reflect_velocity, resolve_pair};
pub use schedule::{Schedule, ScheduledAction, ScheduledEvent};
pub use sequencer::{
    exit_slot, reset_all, reset_with_config, start_draw, start_single_draw,
};
pub use state::{Ball, BallAnim, DrawEvent, DrawMode, DrawPhase, DrawSession, SimState};
pub use tick::{DrawRequest, TickInput, tick};
