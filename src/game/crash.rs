//! Crash Merging
//!
//! Two dominoes meeting in one cell merge into a crash pile. The pile type
//! comes from a fixed table over the colour class of both sides.

use tracing::debug;

use crate::core::geom::CellPos;
use crate::game::context::SimContext;
use crate::game::events::SoundEffect;
use crate::game::grid::{DominoExtra, DominoType};

/// First dissolve frame of a fresh pile.
pub const CRASH_FIRST_STATE: u8 = 51;

/// Last dissolve frame; piles stay here.
pub const CRASH_LAST_STATE: u8 = 56;

/// Colour class of one side of a collision.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum CrashClass {
    Yellow,
    YellowPile,
    Red,
    RedPile,
    Mixed,
}

fn classify(domino: DominoType) -> CrashClass {
    match domino {
        DominoType::Stopper => CrashClass::Red,
        DominoType::Crash0 | DominoType::Crash3 => CrashClass::YellowPile,
        DominoType::Crash2 | DominoType::Crash5 => CrashClass::RedPile,
        DominoType::Crash1 | DominoType::Crash4 => CrashClass::Mixed,
        _ => CrashClass::Yellow,
    }
}

/// Pile type produced by `existing` and `incoming` meeting.
///
/// Symmetric in its arguments. An empty existing side counts as a copy of
/// the incoming side.
pub fn crash_result(existing: DominoType, incoming: DominoType) -> DominoType {
    use CrashClass::*;

    let existing = if existing == DominoType::Empty { incoming } else { existing };
    match (classify(existing), classify(incoming)) {
        (Yellow, Yellow) => DominoType::Crash3,
        (Yellow, YellowPile) | (YellowPile, Yellow) | (YellowPile, YellowPile) => DominoType::Crash0,
        (Red, Red) => DominoType::Crash5,
        (Red, RedPile) | (RedPile, Red) | (RedPile, RedPile) => DominoType::Crash2,
        _ => DominoType::Crash1,
    }
}

/// Merge an incoming domino into the cell at `pos`.
///
/// The caller is responsible for clearing the cell the incoming domino
/// came from.
pub fn domino_crash(ctx: &mut SimContext<'_>, pos: CellPos, incoming: DominoType, incoming_extra: DominoExtra) {
    let existing = *ctx.grid.cell(pos);
    if !ctx.grid.in_bounds(pos) {
        return;
    }

    let pile = crash_result(existing.domino, incoming);
    let airborne = incoming_extra.airborne() || existing.extra.airborne();

    ctx.grid.update(pos, |cell| {
        cell.domino = pile;
        cell.state = CRASH_FIRST_STATE;
        cell.dir = 0;
        if airborne {
            cell.extra = DominoExtra::FreeFallingRubble;
            cell.y_offset &= 3;
        } else {
            cell.extra = DominoExtra::None;
            cell.y_offset = 0;
        }
    });

    debug!(
        "crash at ({}, {}): {:?} + {:?} -> {:?}",
        pos.x, pos.y, existing.domino, incoming, pile
    );
    ctx.play(SoundEffect::Crash);
    ctx.dirty(pos);
    ctx.arrived(pos);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::SimConfig;
    use crate::game::events::EventLog;
    use crate::game::grid::LevelGrid;

    #[test]
    fn test_crash_table() {
        use DominoType::*;

        assert_eq!(crash_result(Standard, Standard), Crash3);
        assert_eq!(crash_result(Tumbler, Trigger), Crash3);
        assert_eq!(crash_result(Standard, Crash3), Crash0);
        assert_eq!(crash_result(Crash0, Standard), Crash0);
        assert_eq!(crash_result(Crash0, Crash3), Crash0);
        assert_eq!(crash_result(Stopper, Stopper), Crash5);
        assert_eq!(crash_result(Stopper, Crash2), Crash2);
        assert_eq!(crash_result(Crash5, Stopper), Crash2);
        assert_eq!(crash_result(Stopper, Standard), Crash1);
        assert_eq!(crash_result(Crash0, Crash5), Crash1);
        assert_eq!(crash_result(Crash1, Standard), Crash1);
    }

    #[test]
    fn test_crash_table_is_symmetric() {
        for a in DominoType::ALL.iter().skip(1) {
            for b in DominoType::ALL.iter().skip(1) {
                assert_eq!(crash_result(*a, *b), crash_result(*b, *a), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_airborne_merge_keeps_falling() {
        let mut grid = LevelGrid::new(6).unwrap();
        let pos = CellPos::new(3, 2);
        grid.update(pos, |c| {
            c.set_domino(DominoType::Standard, 8, 0, DominoExtra::None);
            c.y_offset = 6;
        });
        let mut log = EventLog::new();
        let config = SimConfig::default();
        let mut ctx = SimContext::new(&mut grid, &mut log, &config);

        domino_crash(&mut ctx, pos, DominoType::Standard, DominoExtra::FreeFallingRubble);

        let cell = grid.cell(pos);
        assert_eq!(cell.domino, DominoType::Crash3);
        assert_eq!(cell.state, CRASH_FIRST_STATE);
        assert_eq!(cell.extra, DominoExtra::FreeFallingRubble);
        assert_eq!(cell.y_offset, 2);
        assert_eq!(log.sounds(), vec![SoundEffect::Crash]);
    }

    #[test]
    fn test_grounded_merge_resets_extra() {
        let mut grid = LevelGrid::new(6).unwrap();
        let pos = CellPos::new(0, 0);
        grid.update(pos, |c| c.set_domino(DominoType::Stopper, 8, 0, DominoExtra::None));
        let mut log = EventLog::new();
        let config = SimConfig::default();
        let mut ctx = SimContext::new(&mut grid, &mut log, &config);

        domino_crash(&mut ctx, pos, DominoType::Stopper, DominoExtra::None);

        assert_eq!(grid.domino(pos), DominoType::Crash5);
        assert_eq!(grid.cell(pos).extra, DominoExtra::None);
    }
}
