//! Splitter Sub-Automaton
//!
//! A splitter tracks two halves inside one cell. Each half has a position
//! code; the cell state is the table entry for the (left, right) pair.
//!
//! | Code | Half                             |
//! |------|----------------------------------|
//! | 0    | intact                           |
//! | 1    | just cracked                     |
//! | 2    | tilting, touching the neighbour  |
//! | 3    | leaning past the neighbour       |
//! | 4    | flat                             |
//! | 5..8 | still joined, leaning as one     |

use crate::core::geom::CellPos;
use crate::game::context::SimContext;
use crate::game::domino::{dispatch_miss, facing_of, falling_away, neighbour};
use crate::game::error::SimError;
use crate::game::events::SoundEffect;
use crate::game::grid::{DominoExtra, DominoType};
use crate::game::push::push;

/// State of a freshly cracked splitter.
pub const SPLIT_STATE: u8 = 26;

/// (state, (left half, right half))
const HALVES: [(u8, (u8, u8)); 15] = [
    (8, (0, 0)),
    (7, (5, 5)),
    (23, (6, 6)),
    (24, (7, 7)),
    (25, (8, 8)),
    (26, (1, 1)),
    (27, (2, 2)),
    (28, (2, 3)),
    (29, (2, 4)),
    (30, (3, 2)),
    (31, (3, 3)),
    (32, (3, 4)),
    (33, (4, 2)),
    (34, (4, 3)),
    (35, (4, 4)),
];

/// Half codes for a splitter state.
pub fn halves(state: u8) -> Option<(u8, u8)> {
    HALVES.iter().find(|(s, _)| *s == state).map(|(_, pair)| *pair)
}

/// Splitter state for a pair of half codes.
pub fn state_of(pair: (u8, u8)) -> Option<u8> {
    HALVES.iter().find(|(_, p)| *p == pair).map(|(s, _)| *s)
}

/// Has the splitter cracked?
#[inline]
pub fn is_split(state: u8) -> bool {
    (SPLIT_STATE..=35).contains(&state)
}

/// Advance both halves one step.
pub(crate) fn step(ctx: &mut SimContext<'_>, pos: CellPos) -> Result<(), SimError> {
    let cell = *ctx.grid.cell(pos);
    let (left, right) = halves(cell.state).ok_or_else(|| dispatch_miss(pos, &cell))?;

    let next = match (left, right) {
        (8, 8) => (1, 1),
        (l, r) if l >= 5 => (l + 1, r + 1),
        (l, r) => (advance_half(ctx, pos, l, -1), advance_half(ctx, pos, r, 1)),
    };
    let state = state_of(next).ok_or_else(|| dispatch_miss(pos, &cell))?;

    if state != cell.state {
        ctx.grid.update(pos, |c| c.state = state);
        if state == SPLIT_STATE {
            ctx.play(SoundEffect::Splitter);
        }
        ctx.dirty(pos);
    }
    Ok(())
}

fn advance_half(ctx: &mut SimContext<'_>, pos: CellPos, code: u8, dir: i8) -> u8 {
    let n = neighbour(pos, dir);
    let open = ctx.grid.in_bounds(n) && !ctx.grid.step_up_at(n);

    match code {
        1 => 2,
        2 if open => {
            if !ctx.grid.cell(n).is_occupied() {
                3
            } else if facing_of(dir).map_or(false, |f| push(ctx, n, f)) {
                3
            } else {
                2
            }
        }
        3 if open => {
            let next = ctx.grid.cell(n);
            if !next.is_occupied() || falling_away(next, dir, 4) {
                4
            } else {
                3
            }
        }
        _ => code,
    }
}

/// Crack an upright splitter hit from above.
pub(crate) fn split_struck(ctx: &mut SimContext<'_>, pos: CellPos, striker: DominoType) {
    ctx.grid.update(pos, |c| {
        c.state = SPLIT_STATE;
        c.dir = 0;
        c.extra = DominoExtra::StruckBy(striker);
    });
    ctx.play(SoundEffect::Splitter);
    ctx.dirty(pos);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::geom::Facing;
    use crate::game::config::SimConfig;
    use crate::game::domino::run_dominoes;
    use crate::game::events::EventLog;
    use crate::game::grid::LevelGrid;

    const ROW: i32 = 4;

    fn setup(extra: &[(i32, DominoType)]) -> LevelGrid {
        let mut grid = LevelGrid::new(8).unwrap();
        for x in 0..=10 {
            grid.update(CellPos::new(x, ROW), |c| c.platform = true);
        }
        grid.update(CellPos::new(5, ROW), |c| {
            c.set_domino(DominoType::Splitter, 8, 0, DominoExtra::None)
        });
        for (x, t) in extra {
            grid.update(CellPos::new(*x, ROW), |c| c.set_domino(*t, 8, 0, DominoExtra::None));
        }
        grid
    }

    fn run(grid: &mut LevelGrid, ticks: usize, push_first: bool) {
        let config = SimConfig::default();
        let mut log = EventLog::new();
        let mut ctx = SimContext::new(grid, &mut log, &config);
        if push_first {
            assert!(push(&mut ctx, CellPos::new(5, ROW), Facing::Right));
        }
        for _ in 0..ticks {
            run_dominoes(&mut ctx).unwrap();
        }
    }

    #[test]
    fn test_table_is_a_bijection() {
        for (state, pair) in HALVES {
            assert_eq!(halves(state), Some(pair));
            assert_eq!(state_of(pair), Some(state));
        }
        assert_eq!(halves(36), None);
        assert_eq!(state_of((1, 4)), None);
    }

    #[test]
    fn test_push_leans_then_splits() {
        let mut grid = setup(&[]);
        let pos = CellPos::new(5, ROW);

        run(&mut grid, 0, true);
        assert_eq!(grid.cell(pos).state, 7);
        assert_eq!(grid.cell(pos).dir, -1);

        run(&mut grid, 4, false);
        assert_eq!(grid.cell(pos).state, SPLIT_STATE);

        run(&mut grid, 3, false);
        assert_eq!(halves(grid.cell(pos).state), Some((4, 4)));
    }

    #[test]
    fn test_blocked_half_waits() {
        let mut grid = setup(&[(4, DominoType::Stopper)]);
        run(&mut grid, 12, true);
        assert_eq!(halves(grid.cell(CellPos::new(5, ROW)).state), Some((2, 4)));
    }

    #[test]
    fn test_half_pushes_neighbour() {
        let mut grid = setup(&[(6, DominoType::Standard)]);
        run(&mut grid, 30, true);

        assert_eq!(halves(grid.cell(CellPos::new(5, ROW)).state), Some((4, 4)));
        assert_eq!(grid.cell(CellPos::new(6, ROW)).state, 15);
    }

    #[test]
    fn test_struck_from_above() {
        let mut grid = setup(&[]);
        grid.update(CellPos::new(5, 2), |c| {
            c.set_domino(DominoType::Standard, 13, 1, DominoExtra::FreeFallingRubble)
        });

        run(&mut grid, 4, false);

        let cell = grid.cell(CellPos::new(5, ROW));
        assert_eq!(cell.domino, DominoType::Splitter);
        assert_eq!(cell.state, SPLIT_STATE);
        assert_eq!(cell.extra, DominoExtra::StruckBy(DominoType::Standard));
        assert_eq!(grid.domino(CellPos::new(5, 3)), DominoType::Empty);
    }
}
