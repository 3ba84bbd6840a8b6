//! # Toppler
//!
//! Deterministic simulation core for a falling-domino puzzle game.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                         TOPPLER                              │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/            - Deterministic primitives                 │
//! │  ├── geom.rs      - Cell coordinates and facings             │
//! │  └── hash.rs      - State hashing for verification           │
//! │                                                              │
//! │  game/            - Level logic (deterministic)              │
//! │  ├── grid.rs      - Cells, domino types, doors               │
//! │  ├── builder.rs   - Level construction and validation        │
//! │  ├── domino.rs    - Per-cell falling automaton               │
//! │  ├── push.rs      - Domino pushes, pick-up and put-down      │
//! │  ├── crash.rs     - Crash piles                              │
//! │  ├── splitter.rs  - Splitter halves                          │
//! │  ├── ascender.rs  - Rising and ceiling behavior              │
//! │  ├── ant.rs       - Avatar state machine                     │
//! │  ├── completion.rs- End-of-level verdict                     │
//! │  ├── input.rs     - Key masks and replay logs                │
//! │  ├── state.rs     - Level state and results                  │
//! │  └── tick.rs      - Simulation clock                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are **100% deterministic**:
//! - Integer arithmetic only
//! - Cells are visited in a fixed raster order
//! - No system time and no randomness
//!
//! Given an identical level, config and input log, the simulation produces
//! **identical results** and an identical state hash on every platform.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;

// Re-export commonly used types
pub use core::geom::{CellPos, Facing};
pub use core::hash::StateHash;
pub use game::builder::LevelBuilder;
pub use game::config::SimConfig;
pub use game::error::SimError;
pub use game::input::{InputMask, ReplayLog};
pub use game::state::{LevelResult, LevelState};
pub use game::tick::{replay_level, tick};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;
