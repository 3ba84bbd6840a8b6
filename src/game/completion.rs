//! Completion Checker
//!
//! Whole-grid acceptance predicate run when the trigger has fallen. A level
//! is complete when there is no crash pile anywhere and every domino has
//! come to rest in an accepted position.

use serde::{Serialize, Deserialize};

use crate::core::geom::CellPos;
use crate::game::domino::neighbour;
use crate::game::grid::{Cell, DominoExtra, DominoType, LevelGrid};
use crate::game::splitter;

/// Why a grid is not complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompletionFailure {
    /// A crash pile exists
    Crash {
        /// First pile in raster order
        pos: CellPos,
    },
    /// A domino is standing, moving or resting badly
    Incomplete {
        /// First offending cell in raster order
        pos: CellPos,
    },
}

/// Check the whole grid.
pub fn level_completed(grid: &LevelGrid) -> Result<(), CompletionFailure> {
    if let Some(pos) = grid.positions().find(|p| grid.domino(*p).is_crash()) {
        return Err(CompletionFailure::Crash { pos });
    }

    for pos in grid.positions() {
        let cell = grid.cell(pos);
        if matches!(cell.domino, DominoType::Empty | DominoType::Stopper) {
            continue;
        }
        if !domino_done(grid, pos, cell) {
            return Err(CompletionFailure::Incomplete { pos });
        }
    }
    Ok(())
}

/// Is the lean side of a tilted domino held by a wall, step or domino?
fn supported(grid: &LevelGrid, pos: CellPos, cell: &Cell) -> bool {
    if cell.dir == 0 {
        return false;
    }
    let n = neighbour(pos, cell.dir);
    !grid.in_bounds(n) || grid.step_up_at(n) || grid.cell(n).is_occupied()
}

fn domino_done(grid: &LevelGrid, pos: CellPos, cell: &Cell) -> bool {
    if cell.extra.in_transit() || matches!(cell.extra, DominoExtra::Countdown(_)) {
        return false;
    }

    let s = cell.state;
    let lying = matches!(s, 1..=3 | 13..=15);

    match cell.domino {
        DominoType::Splitter => splitter::is_split(s),
        DominoType::Trigger => cell.extra == DominoExtra::None && (s == 1 || s == 15),
        DominoType::Tumbler => lying || ((1..=4).contains(&cell.progress()) && supported(grid, pos, cell)),
        DominoType::Ascender => lying || s == 43 || s == 47,
        _ => !(4..=12).contains(&s) || supported(grid, pos, cell),
    }
}
