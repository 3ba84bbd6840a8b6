//! Simulation errors.

use crate::core::geom::CellPos;
use crate::game::grid::{DominoExtra, DominoType};

/// Errors raised by the simulation core.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// No transition exists for a cell's state. Always an internal bug.
    #[error("no transition for {domino:?} state {state} dir {dir} extra {extra:?} at ({}, {})", pos.x, pos.y)]
    DispatchMiss {
        /// Cell that failed to dispatch
        pos: CellPos,
        /// Its domino type
        domino: DominoType,
        /// Its state
        state: u8,
        /// Its direction
        dir: i8,
        /// Its extra flag
        extra: DominoExtra,
    },

    /// Level data rejected by the builder.
    #[error("invalid level: {0}")]
    InvalidLevel(String),

    /// Replay bytes could not be encoded or decoded.
    #[error("replay codec error: {0}")]
    Replay(#[from] bincode::Error),

    /// JSON (config or replay) could not be parsed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
