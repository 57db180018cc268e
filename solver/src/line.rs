//! The line-solver contract: every strategy exposes `prep`/`init`/`step`/
//! `term` behind one dispatch enum, works out of a shared workspace sized
//! once per puzzle, and reports the number of placements it examined
//! through the task's `fits` counter (zero meaning the line is
//! contradictory).

use enum_dispatch::enum_dispatch;
use nonogram_core::Cell;

use crate::complete::{Complete, CompleteState};
use crate::fast::Fast;
use crate::fcomp::{Fcomp, FcompState};
use crate::null::Null;
use crate::oddones::OddOnes;
use crate::olsak::Olsak;

/// Greatest dimensions of the loaded puzzle, used to size workspace.
#[derive(Debug, Default, Clone, Copy)]
pub struct Limits {
    pub max_line: usize,
    pub max_rule: usize,
}

/// Workspace requirement reported by a strategy's `prep`: slot counts per
/// arena, not bytes.
#[derive(Debug, Default, Clone, Copy)]
pub struct Req {
    /// Block-position slots.
    pub positions: usize,
    /// Covered-solid offset slots (push scratch).
    pub offsets: usize,
    /// Cell scratch.
    pub cells: usize,
}

impl Req {
    /// Folds another requirement in, keeping the per-arena maximum.
    pub fn cover(&mut self, other: Req) {
        self.positions = self.positions.max(other.positions);
        self.offsets = self.offsets.max(other.offsets);
        self.cells = self.cells.max(other.cells);
    }
}

/// Trace configuration handed through to strategies: an indentation depth
/// and a verbosity level shaping what goes to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineLog {
    pub indent: usize,
    pub level: u8,
}

/// Cross-step state of a suspendable strategy, one variant per strategy
/// that has any.
#[derive(Debug, Default)]
pub(crate) enum StrategyState {
    #[default]
    Idle,
    Complete(CompleteState),
    Fcomp(FcompState),
}

/// The shared per-session workspace. All strategies draw on the same
/// arenas; the driver sizes them to the worst case reported by `prep` over
/// every configured strategy.
#[derive(Debug, Default)]
pub struct Workspace {
    pub(crate) positions: Vec<usize>,
    pub(crate) offsets: Vec<Option<usize>>,
    pub(crate) cells: Vec<Cell>,
    pub(crate) state: StrategyState,
}

impl Workspace {
    #[must_use]
    pub fn new() -> Self {
        Workspace::default()
    }

    /// Grows the arenas to satisfy `req`; never shrinks, so buffers persist
    /// across loads.
    pub fn ensure(&mut self, req: &Req) {
        if self.positions.len() < req.positions {
            self.positions.resize(req.positions, 0);
        }
        if self.offsets.len() < req.offsets {
            self.offsets.resize(req.offsets, None);
        }
        if self.cells.len() < req.cells {
            self.cells.resize(req.cells, Cell::Blank);
        }
    }
}

/// One line to solve. The views are all forward-ordered scratch copies
/// owned by the driver; strategies read `line`, write deductions into
/// `result`, and count examined placements in `fits`.
pub struct LineTask<'a> {
    pub line: &'a [Cell],
    pub rule: &'a [usize],
    pub result: &'a mut [Cell],
    pub fits: &'a mut usize,
    pub log: LineLog,
}

impl LineTask<'_> {
    pub(crate) fn len(&self) -> usize {
        self.line.len()
    }

    /// Renders the result buffer for trace output.
    pub(crate) fn render_result(&self) -> String {
        self.result.iter().map(|c| c.glyph()).collect()
    }
}

/// The strategy vtable. `init` and `step` return `true` while there is more
/// work, `false` once the result buffer is ready to redeem. Single-shot
/// strategies never return `true` from `init` and make `step` a no-op.
#[enum_dispatch]
pub trait LineSolver {
    /// Reports worst-case workspace over all lines of a puzzle with the
    /// given limits.
    fn prep(&self, lim: &Limits, req: &mut Req);

    /// Starts solving one line.
    fn init(&self, ws: &mut Workspace, task: &mut LineTask) -> bool;

    /// Performs one increment of work.
    fn step(&self, ws: &mut Workspace, task: &mut LineTask) -> bool;

    /// Releases per-line state.
    fn term(&self, ws: &mut Workspace);
}

/// The pluggable line-solver strategies.
#[enum_dispatch(LineSolver)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Fast,
    Complete,
    Olsak,
    OddOnes,
    Fcomp,
    Null,
}

/// A rule as the strategies see it: the degenerate single-zero form reads
/// as empty.
pub(crate) fn effective_rule(rule: &[usize]) -> &[usize] {
    if rule == [0] { &[] } else { rule }
}
