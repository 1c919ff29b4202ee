//! Delayed actions on the simulation clock
//!
//! Replaces fire-and-forget timers: entries are checked every tick and never
//! cancelled. An entry whose preconditions no longer hold when it comes due
//! simply does nothing.

use serde::{Deserialize, Serialize};

/// What to do when an entry comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduledAction {
    /// Second ejection attempt after mixing ends
    EjectBall,
    /// Fanfare cue after the showcase
    Fanfare,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledEvent {
    /// Clock time at which the action fires
    pub due: f64,
    pub action: ScheduledAction,
    /// State epoch at scheduling time
    pub epoch: u32,
}

/// Pending actions, kept in due order (ties keep insertion order)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schedule {
    pending: Vec<ScheduledEvent>,
}

impl Schedule {
    pub fn push(&mut self, due: f64, action: ScheduledAction, epoch: u32) {
        let at = self.pending.partition_point(|e| e.due <= due);
        self.pending.insert(at, ScheduledEvent { due, action, epoch });
    }

    /// Remove and return every entry due at or before `now`
    pub fn take_due(&mut self, now: f64) -> Vec<ScheduledEvent> {
        let split = self.pending.partition_point(|e| e.due <= now);
        self.pending.drain(..split).collect()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.pending.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_due_in_order() {
        let mut schedule = Schedule::default();
        schedule.push(2.0, ScheduledAction::Fanfare, 0);
        schedule.push(0.5, ScheduledAction::EjectBall, 0);
        schedule.push(0.5, ScheduledAction::Fanfare, 1);

        assert!(schedule.take_due(0.4).is_empty());
        let due = schedule.take_due(1.0);
        assert_eq!(due.len(), 2);
        assert_eq!(due[0].action, ScheduledAction::EjectBall);
        assert_eq!(due[1].epoch, 1);
        assert_eq!(schedule.len(), 1);

        assert_eq!(schedule.take_due(5.0).len(), 1);
        assert!(schedule.is_empty());
    }
}
