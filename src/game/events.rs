//! Simulation Events
//!
//! One-way notifications for the renderer (dirty cells) and the audio
//! subsystem (sound effects). The simulation never reads them back.

use serde::{Serialize, Deserialize};

use crate::core::geom::CellPos;
use crate::game::grid::DominoType;

/// Discrete sound effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SoundEffect {
    /// Standard domino starts falling
    Standard = 0,
    /// Something bounced off a stopper
    Stopper = 1,
    /// Splitter cracks
    Splitter = 2,
    /// Exploder fuse lit
    Exploder = 3,
    /// Delay armed
    Delay = 4,
    /// Tumbler starts rolling
    Tumbler = 5,
    /// Bridger closes a gap
    Bridger = 6,
    /// Vanish disappears
    Vanish = 7,
    /// Trigger starts falling
    Trigger = 8,
    /// Ascender lifts off
    Ascender = 9,
    /// Entangled pair fires
    Connected = 10,
    /// Counter stone released
    Counter = 11,
    /// Exploder blast
    Explosion = 12,
    /// Two dominoes crashed
    Crash = 13,
    /// A door starts opening
    DoorOpen = 14,
    /// A door finished closing
    DoorClose = 15,
    /// Ant picks a domino up
    PickUp = 16,
    /// Ant puts a domino down
    PutDown = 17,
}

impl SoundEffect {
    /// Effect played when a domino of this type starts falling.
    pub fn for_domino(domino: DominoType) -> Option<Self> {
        let effect = match domino {
            DominoType::Standard => SoundEffect::Standard,
            DominoType::Stopper => SoundEffect::Stopper,
            DominoType::Splitter => SoundEffect::Splitter,
            DominoType::Exploder => SoundEffect::Exploder,
            DominoType::Delay => SoundEffect::Delay,
            DominoType::Tumbler => SoundEffect::Tumbler,
            DominoType::Bridger => SoundEffect::Standard,
            DominoType::Vanish => SoundEffect::Standard,
            DominoType::Trigger => SoundEffect::Trigger,
            DominoType::Ascender => SoundEffect::Ascender,
            DominoType::ConnectedA | DominoType::ConnectedB => SoundEffect::Connected,
            DominoType::Counter1 | DominoType::Counter2 | DominoType::Counter3 => {
                SoundEffect::Counter
            }
            _ => return None,
        };
        Some(effect)
    }
}

/// A notification emitted during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimEvent {
    /// Cell needs repainting
    Dirty {
        /// Cell position
        pos: CellPos,
    },
    /// Play a sound
    Sound {
        /// Which effect
        effect: SoundEffect,
    },
}

/// Receiver for simulation notifications.
pub trait EventSink {
    /// Mark a cell for repaint.
    fn mark_dirty(&mut self, pos: CellPos);

    /// Play a sound effect.
    fn play(&mut self, effect: SoundEffect);

    /// Mark a cell and the one above it (dominoes are two rows tall).
    fn mark_dirty_column(&mut self, pos: CellPos) {
        self.mark_dirty(pos);
        self.mark_dirty(pos.up());
    }
}

/// Sink that buffers everything for the driver to drain.
#[derive(Clone, Debug, Default)]
pub struct EventLog {
    events: Vec<SimEvent>,
}

impl EventLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Events buffered so far.
    pub fn events(&self) -> &[SimEvent] {
        &self.events
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.events)
    }

    /// Sounds buffered so far, in order.
    pub fn sounds(&self) -> Vec<SoundEffect> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SimEvent::Sound { effect } => Some(*effect),
                SimEvent::Dirty { .. } => None,
            })
            .collect()
    }
}

impl EventSink for EventLog {
    fn mark_dirty(&mut self, pos: CellPos) {
        self.events.push(SimEvent::Dirty { pos });
    }

    fn play(&mut self, effect: SoundEffect) {
        self.events.push(SimEvent::Sound { effect });
    }
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl EventSink for NullSink {
    fn mark_dirty(&mut self, _pos: CellPos) {}

    fn play(&mut self, _effect: SoundEffect) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_collects_in_order() {
        let mut log = EventLog::new();
        log.play(SoundEffect::Crash);
        log.mark_dirty_column(CellPos::new(2, 4));
        log.play(SoundEffect::DoorOpen);

        assert_eq!(log.sounds(), vec![SoundEffect::Crash, SoundEffect::DoorOpen]);
        assert_eq!(log.events()[1], SimEvent::Dirty { pos: CellPos::new(2, 4) });
        assert_eq!(log.events()[2], SimEvent::Dirty { pos: CellPos::new(2, 3) });

        let taken = log.take_events();
        assert_eq!(taken.len(), 4);
        assert!(log.events().is_empty());
    }

    #[test]
    fn test_every_placeable_type_has_a_sound() {
        for domino in DominoType::PLACEABLE {
            assert!(SoundEffect::for_domino(domino).is_some(), "{:?}", domino);
        }
        assert_eq!(SoundEffect::for_domino(DominoType::Crash1), None);
    }
}
