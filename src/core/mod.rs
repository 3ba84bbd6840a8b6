//! Core deterministic primitives.
//!
//! Integer grid geometry and SHA-256 state hashing. Nothing in here
//! touches the clock, the filesystem or floating point.

pub mod geom;
pub mod hash;

// Re-export core types
pub use geom::{CellPos, Facing, GRID_WIDTH, MAX_GRID_HEIGHT, ROW_UNITS};
pub use hash::{compute_state_hash, StateHash, StateHasher};
