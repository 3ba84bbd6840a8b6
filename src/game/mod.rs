//! Game Logic Module
//!
//! All level simulation code. 100% deterministic.
//!
//! ## Module Structure
//!
//! - `grid`: Cells, domino types, doors and the level grid
//! - `builder`: Level construction and validation
//! - `domino`: Per-cell falling automaton
//! - `push`: Pushes between dominoes and ant pick-up/put-down
//! - `crash`, `splitter`, `ascender`: Type-specific behaviors
//! - `ant`: The avatar state machine
//! - `completion`: End-of-level verdict over the grid
//! - `input`: Key masks and replay logs
//! - `state`: Level state and results
//! - `tick`: The simulation clock
//! - `events`: Dirty marks and sounds for presentation

pub mod ant;
pub mod ascender;
pub mod builder;
pub mod completion;
pub mod config;
pub mod context;
pub mod crash;
pub mod domino;
pub mod error;
pub mod events;
pub mod grid;
pub mod input;
pub mod push;
pub mod splitter;
pub mod state;
pub mod tick;

// Re-export key types
pub use ant::{Ant, AntState};
pub use builder::LevelBuilder;
pub use completion::{level_completed, CompletionFailure};
pub use config::SimConfig;
pub use error::SimError;
pub use events::{EventLog, EventSink, SimEvent, SoundEffect};
pub use grid::{Cell, Door, DominoExtra, DominoType, LevelGrid};
pub use input::{InputMask, ReplayLog};
pub use state::{LevelResult, LevelState};
pub use tick::{replay_level, tick, TickResult};
