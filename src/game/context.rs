//! Simulation Context
//!
//! Everything a transition or push needs: the grid, the notification sink
//! and the tunables. Passed explicitly into every call.

use crate::core::geom::CellPos;
use crate::game::config::SimConfig;
use crate::game::events::{EventSink, SoundEffect};
use crate::game::grid::LevelGrid;

/// Borrowed view of the mutable simulation state.
pub struct SimContext<'a> {
    /// Level cells and doors
    pub grid: &'a mut LevelGrid,
    /// Dirty/sound receiver
    pub events: &'a mut dyn EventSink,
    /// Tunables
    pub config: &'a SimConfig,
    /// Cells that received a domino during the current raster scan.
    /// A domino moved forward in scan order is not stepped twice.
    arrivals: Vec<CellPos>,
}

impl<'a> SimContext<'a> {
    /// Bundle the pieces.
    pub fn new(grid: &'a mut LevelGrid, events: &'a mut dyn EventSink, config: &'a SimConfig) -> Self {
        Self { grid, events, config, arrivals: Vec::new() }
    }

    /// Mark a domino cell (and the row above it) for repaint.
    #[inline]
    pub fn dirty(&mut self, pos: CellPos) {
        self.events.mark_dirty_column(pos);
    }

    /// Play a sound.
    #[inline]
    pub fn play(&mut self, effect: SoundEffect) {
        self.events.play(effect);
    }

    /// Record that a domino moved into `pos`.
    pub fn arrived(&mut self, pos: CellPos) {
        if !self.arrivals.contains(&pos) {
            self.arrivals.push(pos);
        }
    }

    /// Did a domino move into `pos` during this scan?
    pub fn has_arrived(&self, pos: CellPos) -> bool {
        self.arrivals.contains(&pos)
    }

    /// Forget arrivals (start of a scan).
    pub fn reset_arrivals(&mut self) {
        self.arrivals.clear();
    }
}
