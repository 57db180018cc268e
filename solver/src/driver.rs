//! The solver driver: schedules line work by heuristic, redeems solver
//! output against the grid, and guesses with snapshot/backtrack when
//! deduction runs dry.

use std::sync::Arc;

use log::{Level, debug, log_enabled};
use nonogram_core::{Cell, Grid, Point, Puzzle, Rect, Rule, density_score};
use thiserror::Error;

use crate::complete::Complete;
use crate::fast::Fast;
use crate::fcomp::Fcomp;
use crate::line::{LineLog, LineSolver, LineTask, Limits, Req, Strategy, Workspace};
use crate::null::Null;
use crate::observe::{DisplayObserver, SolutionClient};
use crate::oddones::OddOnes;
use crate::olsak::Olsak;

/// Result of one driver call. Ticks never fail; everything is a status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// No puzzle is loaded.
    Unloaded,
    /// Nothing left to do: solved (and reported), or exhausted.
    Finished,
    /// Work remains; call again.
    Unfinished,
    /// A complete solution was just presented and more may follow.
    Found,
    /// One line was completed, a guess placed, or a guess flipped.
    Line,
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverError {
    #[error("a puzzle is already loaded")]
    AlreadyLoaded,
    #[error("no puzzle is loaded")]
    NotLoaded,
    #[error("line-solver level {0} is out of range")]
    BadLevel(u32),
    #[error("grid is {got_w}x{got_h} but the puzzle needs {want_w}x{want_h}")]
    SizeMismatch {
        want_w: usize,
        want_h: usize,
        got_w: usize,
        got_h: usize,
    },
    #[error("puzzle has no rows or no columns")]
    EmptyPuzzle,
}

/// Preset strategy stacks. Level 1 is tried last; the names follow the
/// order of application, strongest fallback first.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    /// Extremes only.
    Fast,
    /// Exhaustive enumeration only.
    Complete,
    /// Fast first, complete when fast stops producing.
    Hybrid,
    /// Deduce nothing; guess everything.
    Null,
    Olsak,
    FastOlsak,
    FastOddones,
    FastOlsakComplete,
    FastOddonesComplete,
    /// The fast-complete slider on its own.
    #[default]
    Fcomp,
    /// Fast first, then the slider.
    FastFcomp,
}

/// Per-line bookkeeping: how many solids and dots the line still owes, and
/// the heuristic score steering line selection.
#[derive(Debug, Default, Clone, Copy)]
struct LineAttr {
    score: i64,
    dot: i64,
    solid: i64,
}

impl LineAttr {
    fn of(rule: &Rule, len: usize) -> Self {
        let solid = rule.solid_total() as i64;
        let score = if solid == 0 {
            len as i64
        } else {
            density_score(rule, len)
        };
        LineAttr {
            score,
            dot: len as i64 - solid,
            solid,
        }
    }

    /// Accounts one newly-determined cell and bumps the score; a counter
    /// reaching zero makes the line maximally attractive.
    fn absorb(&mut self, v: Cell, len: usize) {
        let counter = if v == Cell::Dot {
            &mut self.dot
        } else {
            &mut self.solid
        };
        *counter -= 1;
        if *counter == 0 {
            self.score = len as i64;
        } else {
            self.score += 1;
        }
    }
}

/// One strategy slot; an unset slot acts as a reveal-nothing backup.
#[derive(Debug, Default)]
struct Slot {
    name: String,
    strategy: Option<Strategy>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineState {
    /// No line chosen.
    Empty,
    /// A line solver is mid-line.
    Working,
    /// A line is solved but not yet redeemed.
    Done,
}

/// A saved branch point: the grid and line attributes over the unknown
/// rectangle as they were before the guess, plus the guess itself so the
/// alternative can be played on backtrack.
#[derive(Debug)]
struct Snapshot {
    area: Rect,
    cells: Vec<Cell>,
    rowattr: Vec<LineAttr>,
    colattr: Vec<LineAttr>,
    remcells: i64,
    guess_at: Point,
    guess: Cell,
}

/// The solver. Configure, `load`, then tick with [`Solver::run_cycles`]
/// (or the line/try wrappers) until [`Status::Finished`].
pub struct Solver {
    client: Option<Box<dyn SolutionClient>>,
    display: Option<Box<dyn DisplayObserver>>,
    log: LineLog,
    slots: Vec<Slot>,
    cycles: i32,

    puzzle: Option<Arc<Puzzle>>,
    grid: Grid,
    lim: Limits,
    workspace: Workspace,
    /// Line-solver result buffer.
    work: Vec<Cell>,
    /// Scratch copy of the line being solved.
    line_buf: Vec<Cell>,
    /// Scratch copy of its rule.
    rule_buf: Vec<usize>,

    rowattr: Vec<LineAttr>,
    colattr: Vec<LineAttr>,
    rowflag: Vec<u32>,
    colflag: Vec<u32>,

    stack: Vec<Snapshot>,
    remcells: i64,
    reminfo: i64,
    unkarea: Rect,

    on_row: bool,
    lineno: usize,
    level: u32,
    fits: usize,
    status: LineState,
    focus: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::new()
    }
}

impl Solver {
    #[must_use]
    pub fn new() -> Self {
        let mut solver = Solver {
            client: None,
            display: None,
            log: LineLog::default(),
            slots: Vec::new(),
            cycles: 50,
            puzzle: None,
            grid: Grid::new(0, 0),
            lim: Limits::default(),
            workspace: Workspace::new(),
            work: Vec::new(),
            line_buf: Vec::new(),
            rule_buf: Vec::new(),
            rowattr: Vec::new(),
            colattr: Vec::new(),
            rowflag: Vec::new(),
            colflag: Vec::new(),
            stack: Vec::new(),
            remcells: 0,
            reminfo: 0,
            unkarea: Rect::default(),
            on_row: true,
            lineno: 0,
            level: 0,
            fits: 0,
            status: LineState::Empty,
            focus: false,
        };
        solver
            .set_algorithm(Algorithm::default())
            .expect("nothing loaded yet");
        solver
    }

    fn ensure_unloaded(&self) -> Result<(), SolverError> {
        if self.puzzle.is_some() {
            Err(SolverError::AlreadyLoaded)
        } else {
            Ok(())
        }
    }

    /// Number of configured strategy levels.
    #[must_use]
    pub fn levels(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Resizes the slot table; new slots start unset.
    pub fn set_levels(&mut self, levels: u32) -> Result<(), SolverError> {
        self.ensure_unloaded()?;
        self.slots.resize_with(levels as usize, Slot::default);
        Ok(())
    }

    /// Installs a strategy at `level` (1-based; higher levels run first).
    pub fn set_solver(
        &mut self,
        level: u32,
        name: &str,
        strategy: Strategy,
    ) -> Result<(), SolverError> {
        self.ensure_unloaded()?;
        if level < 1 || level > self.levels() {
            return Err(SolverError::BadLevel(level));
        }
        self.slots[level as usize - 1] = Slot {
            name: name.to_owned(),
            strategy: Some(strategy),
        };
        Ok(())
    }

    /// Installs one of the preset strategy stacks.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) -> Result<(), SolverError> {
        self.ensure_unloaded()?;
        let stack: &[(&str, Strategy)] = match algorithm {
            Algorithm::Fast => &[("fast", Fast.into())],
            Algorithm::Complete => &[("complete", Complete.into())],
            Algorithm::Hybrid => &[("complete", Complete.into()), ("fast", Fast.into())],
            Algorithm::Null => &[("null", Null.into())],
            Algorithm::Olsak => &[("olsak", Olsak.into())],
            Algorithm::FastOlsak => &[("olsak", Olsak.into()), ("fast", Fast.into())],
            Algorithm::FastOddones => &[("odd-ones", OddOnes.into()), ("fast", Fast.into())],
            Algorithm::FastOlsakComplete => &[
                ("complete", Complete.into()),
                ("olsak", Olsak.into()),
                ("fast", Fast.into()),
            ],
            Algorithm::FastOddonesComplete => &[
                ("complete", Complete.into()),
                ("odd-ones", OddOnes.into()),
                ("fast", Fast.into()),
            ],
            Algorithm::Fcomp => &[("fcomp", Fcomp.into())],
            Algorithm::FastFcomp => &[("fcomp", Fcomp.into()), ("fast", Fast.into())],
        };
        self.set_levels(stack.len() as u32)?;
        for (i, (name, strategy)) in stack.iter().enumerate() {
            self.set_solver(i as u32 + 1, name, *strategy)?;
        }
        Ok(())
    }

    /// Per-tick budget of line-solver steps used by [`Solver::run`].
    pub fn set_cycles(&mut self, cycles: i32) {
        self.cycles = cycles;
    }

    pub fn set_client(&mut self, client: Box<dyn SolutionClient>) -> Result<(), SolverError> {
        self.ensure_unloaded()?;
        self.client = Some(client);
        Ok(())
    }

    pub fn set_display(&mut self, display: Box<dyn DisplayObserver>) -> Result<(), SolverError> {
        self.ensure_unloaded()?;
        self.display = Some(display);
        Ok(())
    }

    /// Trace indentation and verbosity for the records written through the
    /// `log` facade.
    pub fn set_log(&mut self, indent: usize, level: u8) -> Result<(), SolverError> {
        self.ensure_unloaded()?;
        self.log = LineLog { indent, level };
        Ok(())
    }

    /// Binds the driver to a puzzle and a caller-supplied grid, which may
    /// be partially (or fully) determined already.
    pub fn load(&mut self, puzzle: Arc<Puzzle>, grid: Grid) -> Result<(), SolverError> {
        self.ensure_unloaded()?;
        if puzzle.width() == 0 || puzzle.height() == 0 {
            return Err(SolverError::EmptyPuzzle);
        }
        if grid.width() != puzzle.width() || grid.height() != puzzle.height() {
            return Err(SolverError::SizeMismatch {
                want_w: puzzle.width(),
                want_h: puzzle.height(),
                got_w: grid.width(),
                got_h: grid.height(),
            });
        }

        let (w, h) = (puzzle.width(), puzzle.height());
        self.lim = Limits {
            max_line: w.max(h),
            max_rule: puzzle
                .rows()
                .iter()
                .chain(puzzle.cols())
                .map(Rule::len)
                .max()
                .unwrap_or(0),
        };

        self.remcells = grid.count(Cell::Blank) as i64;
        self.grid = grid;

        let levels = self.levels();
        self.rowflag.clear();
        self.rowflag.resize(h, levels);
        self.colflag.clear();
        self.colflag.resize(w, levels);
        self.reminfo = if levels > 0 { (w + h) as i64 } else { 0 };

        self.rowattr.clear();
        self.rowattr
            .extend(puzzle.rows().iter().map(|r| LineAttr::of(r, w)));
        self.colattr.clear();
        self.colattr
            .extend(puzzle.cols().iter().map(|r| LineAttr::of(r, h)));

        self.unkarea = Rect::new(Point::new(0, 0), Point::new(w, h));
        self.stack.clear();

        // Size the shared workspace for the hungriest configured strategy.
        let mut req = Req::default();
        for slot in &self.slots {
            if let Some(strategy) = slot.strategy {
                let mut one = Req::default();
                strategy.prep(&self.lim, &mut one);
                req.cover(one);
            }
        }
        self.workspace.ensure(&req);
        if self.work.len() < self.lim.max_line {
            self.work.resize(self.lim.max_line, Cell::Blank);
        }
        if self.line_buf.len() < self.lim.max_line {
            self.line_buf.resize(self.lim.max_line, Cell::Blank);
        }

        self.puzzle = Some(puzzle);
        self.status = LineState::Empty;
        self.focus = false;
        Ok(())
    }

    /// Detaches from the puzzle, dropping any pending guesses, and hands
    /// the grid back. Safe at any tick boundary.
    pub fn unload(&mut self) -> Result<Grid, SolverError> {
        if self.puzzle.is_none() {
            return Err(SolverError::NotLoaded);
        }
        if matches!(self.status, LineState::Working | LineState::Done) {
            self.term_current();
        }
        self.stack.clear();
        self.puzzle = None;
        self.focus = false;
        self.status = LineState::Empty;
        Ok(std::mem::replace(&mut self.grid, Grid::new(0, 0)))
    }

    /// The grid as it currently stands, if a puzzle is loaded. Observers
    /// may read it between ticks.
    #[must_use]
    pub fn grid(&self) -> Option<&Grid> {
        self.puzzle.as_ref().map(|_| &self.grid)
    }

    /// Pending-work level for a row (0 = idle), mirroring the display
    /// mark events.
    #[must_use]
    pub fn row_mark_of(&self, y: usize) -> u32 {
        self.rowflag.get(y).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn col_mark_of(&self, x: usize) -> u32 {
        self.colflag.get(x).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn row_in_focus(&self, y: usize) -> bool {
        self.focus && self.on_row && self.lineno == y
    }

    #[must_use]
    pub fn col_in_focus(&self, x: usize) -> bool {
        self.focus && !self.on_row && self.lineno == x
    }

    /// Outstanding (dots, solids) a row still owes, while loaded.
    #[must_use]
    pub fn row_remaining(&self, y: usize) -> Option<(i64, i64)> {
        self.puzzle.as_ref()?;
        self.rowattr.get(y).map(|a| (a.dot, a.solid))
    }

    #[must_use]
    pub fn col_remaining(&self, x: usize) -> Option<(i64, i64)> {
        self.puzzle.as_ref()?;
        self.colattr.get(x).map(|a| (a.dot, a.solid))
    }

    /// How many guesses are currently on the stack.
    #[must_use]
    pub fn guess_depth(&self) -> usize {
        self.stack.len()
    }

    /// Runs until `tries` line completions have happened (sharing one
    /// step budget of [`Solver::set_cycles`]), mapping a completed line to
    /// [`Status::Unfinished`].
    pub fn run(&mut self, tries: &mut i32) -> Status {
        let mut cycles = self.cycles;
        let status = self.run_lines(tries, &mut cycles);
        if status == Status::Line {
            Status::Unfinished
        } else {
            status
        }
    }

    /// Completes up to `lines` lines within the given step budget.
    pub fn run_lines(&mut self, lines: &mut i32, cycles: &mut i32) -> Status {
        let mut status = if self.puzzle.is_some() {
            Status::Unfinished
        } else {
            Status::Unloaded
        };
        while *lines > 0 {
            status = self.run_cycles(cycles);
            if status == Status::Line {
                *lines -= 1;
            } else {
                return status;
            }
        }
        status
    }

    /// One driver tick: advances a working line by up to `cycles` steps,
    /// or redeems a finished line, or backtracks, or selects a line, or
    /// reports/guesses. Returns control after each observable event.
    pub fn run_cycles(&mut self, cycles: &mut i32) -> Status {
        if self.puzzle.is_none() {
            return Status::Unloaded;
        }
        match self.status {
            LineState::Working => {
                while *cycles > 0 && self.status == LineState::Working {
                    *cycles -= 1;
                    self.step_line();
                }
                Status::Unfinished
            }
            LineState::Done => self.finish_line(),
            LineState::Empty => {
                if self.remcells < 0 {
                    self.backtrack()
                } else if self.reminfo > 0 {
                    self.select_line();
                    Status::Unfinished
                } else if self.remcells == 0 {
                    if self.log.level > 0 {
                        debug!("{:ind$}Correct grid.", "", ind = self.log.indent);
                    }
                    if let Some(client) = self.client.as_mut() {
                        client.present(&self.grid);
                    }
                    self.remcells = -1;
                    if self.stack.is_empty() {
                        Status::Finished
                    } else {
                        Status::Found
                    }
                } else {
                    self.guess()
                }
            }
        }
    }

    fn line_len(&self) -> usize {
        if self.on_row {
            self.grid.width()
        } else {
            self.grid.height()
        }
    }

    fn line_cell(&self, i: usize) -> Cell {
        if self.on_row {
            self.grid.get(i, self.lineno)
        } else {
            self.grid.get(self.lineno, i)
        }
    }

    fn rule_of(&self, on_row: bool, lineno: usize) -> Rule {
        let puzzle = self.puzzle.as_ref();
        match puzzle {
            Some(p) if on_row => p.row(lineno).clone(),
            Some(p) => p.col(lineno).clone(),
            None => Rule::default(),
        }
    }

    fn set_focus(&mut self, active: bool) {
        self.focus = active;
        let lineno = self.lineno;
        if let Some(display) = self.display.as_mut() {
            if self.on_row {
                display.row_focus(lineno, active);
            } else {
                display.col_focus(lineno, active);
            }
        }
    }

    /// Chooses the pending line with the greatest flag, breaking ties by
    /// strictly greater score; rows are scanned before columns.
    fn find_easiest(&mut self) {
        let mut level = self.rowflag[0];
        let mut score = self.rowattr[0].score;
        self.on_row = true;
        self.lineno = 0;

        for (i, &flag) in self.rowflag.iter().enumerate() {
            if flag > level || (level > 0 && flag == level && self.rowattr[i].score > score) {
                level = flag;
                score = self.rowattr[i].score;
                self.lineno = i;
            }
        }
        for (i, &flag) in self.colflag.iter().enumerate() {
            if flag > level || (level > 0 && flag == level && self.colattr[i].score > score) {
                level = flag;
                score = self.colattr[i].score;
                self.lineno = i;
                self.on_row = false;
            }
        }
        self.level = level;
    }

    fn select_line(&mut self) {
        self.find_easiest();
        if self.log.level > 0 && log_enabled!(Level::Debug) {
            let kind = if self.on_row { "Row" } else { "Column" };
            let attr = if self.on_row {
                &self.rowattr[self.lineno]
            } else {
                &self.colattr[self.lineno]
            };
            let rule = self.rule_of(self.on_row, self.lineno);
            debug!(
                "{:ind$}{kind} {} [{}]: ({}) {rule} {{",
                "",
                self.lineno,
                attr.score,
                rule.len(),
                ind = self.log.indent
            );
        }
        self.log.indent += 2;
        self.set_focus(true);
        self.setup_line();
    }

    fn current_slot(&self) -> Option<&Slot> {
        if self.level < 1 || self.level > self.levels() {
            return None;
        }
        Some(&self.slots[self.level as usize - 1])
    }

    fn setup_line(&mut self) {
        let len = self.line_len();
        for i in 0..len {
            self.line_buf[i] = self.line_cell(i);
        }
        let rule = self.rule_of(self.on_row, self.lineno);
        self.rule_buf.clear();
        self.rule_buf.extend_from_slice(rule.blocks());
        self.fits = 0;

        let strategy = self.current_slot().and_then(|s| s.strategy);
        if self.log.level > 0 && log_enabled!(Level::Debug) {
            let name = match self.current_slot() {
                None => "backup",
                Some(slot) if slot.strategy.is_none() => "backup",
                Some(slot) => &slot.name,
            };
            let start: String = self.line_buf[..len].iter().map(|c| c.glyph()).collect();
            debug!("{:ind$}  Algo: {name}", "", ind = self.log.indent);
            debug!("{:ind$} Start: >{start}<", "", ind = self.log.indent);
        }

        let Some(strategy) = strategy else {
            // Backup: reveal nothing, trust the line.
            for i in 0..len {
                let cell = self.line_buf[i];
                self.work[i] = if cell.is_known() { cell } else { Cell::Both };
            }
            self.fits = 1;
            self.status = LineState::Done;
            return;
        };

        let mut task = LineTask {
            line: &self.line_buf[..len],
            rule: &self.rule_buf,
            result: &mut self.work[..len],
            fits: &mut self.fits,
            log: self.log,
        };
        self.status = if strategy.init(&mut self.workspace, &mut task) {
            LineState::Working
        } else {
            LineState::Done
        };
    }

    fn step_line(&mut self) {
        let Some(strategy) = self.current_slot().and_then(|s| s.strategy) else {
            self.status = LineState::Done;
            return;
        };
        let len = self.line_len();
        let mut task = LineTask {
            line: &self.line_buf[..len],
            rule: &self.rule_buf,
            result: &mut self.work[..len],
            fits: &mut self.fits,
            log: self.log,
        };
        self.status = if strategy.step(&mut self.workspace, &mut task) {
            LineState::Working
        } else {
            LineState::Done
        };
    }

    fn term_current(&mut self) {
        if let Some(strategy) = self.current_slot().and_then(|s| s.strategy) {
            strategy.term(&mut self.workspace);
        }
    }

    /// A line has been solved: act on the result.
    fn finish_line(&mut self) -> Status {
        self.set_focus(false);

        if self.fits == 0 {
            self.remcells = -1;
            if self.log.level > 0 {
                debug!("{:ind$}         Inconsistency!", "", ind = self.log.indent);
            }
            self.term_current();
        } else {
            if self.log.level > 0 && log_enabled!(Level::Debug) {
                let len = self.line_len();
                let end: String = self.work[..len].iter().map(|c| c.glyph()).collect();
                debug!("{:ind$}   End: >{end}<", "", ind = self.log.indent);
            }
            let changed = self.redeem();

            // Step the line's own flag down, or retire the line.
            let attr = if self.on_row {
                self.rowattr[self.lineno]
            } else {
                self.colattr[self.lineno]
            };
            let flag = if self.on_row {
                &mut self.rowflag[self.lineno]
            } else {
                &mut self.colflag[self.lineno]
            };
            if attr.dot == 0 && attr.solid == 0 {
                *flag = 0;
            } else if !changed && (attr.dot == 0 || attr.solid == 0) {
                *flag = 0;
            } else {
                *flag = flag.saturating_sub(1);
            }
            if *flag == 0 {
                self.reminfo -= 1;
            }
            self.mark_own_line();
        }

        self.log.indent = self.log.indent.saturating_sub(2);
        if self.log.level > 0 {
            debug!("{:ind$}}}", "", ind = self.log.indent);
            debug!(
                "{:ind$}Cells: {}; Lines: {}",
                "",
                self.remcells,
                self.reminfo,
                ind = self.log.indent
            );
        }
        self.status = LineState::Empty;
        Status::Line
    }

    /// Commits the result buffer into the grid, keeping cell counts,
    /// scores, flags and the display in step. Returns whether any cell
    /// changed.
    fn redeem(&mut self) -> bool {
        let len = self.line_len();
        let perplen = if self.on_row {
            self.grid.height()
        } else {
            self.grid.width()
        };
        let lineno = self.lineno;
        let levels = self.levels();

        let mut changed = false;
        let mut cells_from: Option<usize> = None;
        let mut flags_from: Option<usize> = None;

        for i in 0..len {
            let current = self.line_cell(i);
            if current == Cell::Blank {
                let v = self.work[i];
                if !v.is_known() {
                    continue;
                }
                changed = true;
                if cells_from.is_none() {
                    cells_from = Some(i);
                }
                if self.on_row {
                    self.grid.set(i, lineno, v);
                } else {
                    self.grid.set(lineno, i, v);
                }
                self.remcells -= 1;

                // The crossing line gains information; so does this one.
                if self.on_row {
                    self.colattr[i].absorb(v, perplen);
                    self.rowattr[lineno].absorb(v, len);
                } else {
                    self.rowattr[i].absorb(v, perplen);
                    self.colattr[lineno].absorb(v, len);
                }

                // Revive the crossing line.
                let flag = if self.on_row {
                    &mut self.colflag[i]
                } else {
                    &mut self.rowflag[i]
                };
                if *flag < levels {
                    if *flag == 0 {
                        self.reminfo += 1;
                    }
                    *flag = levels;
                    if flags_from.is_none() {
                        flags_from = Some(i);
                    }
                } else if let Some(from) = flags_from.take() {
                    self.emit_mark(from, i);
                }
            } else {
                if let Some(from) = cells_from.take() {
                    self.emit_redraw(from, i);
                }
                if let Some(from) = flags_from.take() {
                    self.emit_mark(from, i);
                }
            }
        }
        if let Some(from) = cells_from.take() {
            self.emit_redraw(from, len);
        }
        if let Some(from) = flags_from.take() {
            self.emit_mark(from, len);
        }

        self.term_current();
        changed
    }

    /// Redraw damage for cells `from..to` of the current line.
    fn emit_redraw(&mut self, from: usize, to: usize) {
        let area = if self.on_row {
            Rect::new(
                Point::new(from, self.lineno),
                Point::new(to, self.lineno + 1),
            )
        } else {
            Rect::new(
                Point::new(self.lineno, from),
                Point::new(self.lineno + 1, to),
            )
        };
        if let Some(display) = self.display.as_mut() {
            display.redraw_area(&self.grid, &area);
        }
    }

    /// Mark damage for the lines crossing the current one at `from..to`.
    fn emit_mark(&mut self, from: usize, to: usize) {
        if let Some(display) = self.display.as_mut() {
            if self.on_row {
                display.col_mark(from, to);
            } else {
                display.row_mark(from, to);
            }
        }
    }

    fn mark_own_line(&mut self) {
        let lineno = self.lineno;
        if let Some(display) = self.display.as_mut() {
            if self.on_row {
                display.row_mark(lineno, lineno + 1);
            } else {
                display.col_mark(lineno, lineno + 1);
            }
        }
    }

    /// Writes a guessed (or flipped) colour at `at`, with all the
    /// accounting a deduced cell would get, and revives both lines.
    fn apply_guess(&mut self, at: Point, guess: Cell) {
        debug_assert!(guess.is_known());
        self.grid.set(at.x, at.y, guess);
        if self.log.level > 0 {
            debug!(
                "{:ind$}Guessing {} at ({},{})",
                "",
                guess.glyph(),
                at.x,
                at.y,
                ind = self.log.indent
            );
        }

        let w = self.grid.width();
        let h = self.grid.height();
        self.rowattr[at.y].absorb(guess, w);
        self.colattr[at.x].absorb(guess, h);
        self.remcells -= 1;
        self.reminfo = 2;

        let levels = self.levels();
        self.rowflag[at.y] = levels;
        self.colflag[at.x] = levels;

        if let Some(display) = self.display.as_mut() {
            display.row_mark(at.y, at.y + 1);
            display.col_mark(at.x, at.x + 1);
        }
        let cell_area = Rect::of_cell(at);
        if let Some(display) = self.display.as_mut() {
            display.redraw_area(&self.grid, &cell_area);
        }
        if self.log.level > 0 {
            debug!(
                "{:ind$}Cells: {}; Lines: {}",
                "",
                self.remcells,
                self.reminfo,
                ind = self.log.indent
            );
        }
    }

    /// The smallest rectangle inside the previous unknown area that holds
    /// every remaining blank cell.
    fn find_min_rect(&self) -> Rect {
        let orig = self.unkarea;
        let mut min_x = orig.max.x;
        let mut max_x = orig.min.x;
        let mut min_y = orig.max.y;
        let mut max_y = orig.min.y;

        for y in orig.min.y..orig.max.y {
            let row = &self.grid.row(y)[orig.min.x..orig.max.x];
            let Some(first) = row.iter().position(|&c| c == Cell::Blank) else {
                continue;
            };
            let last = row
                .iter()
                .rposition(|&c| c == Cell::Blank)
                .unwrap_or(first);
            min_x = min_x.min(orig.min.x + first);
            max_x = max_x.max(orig.min.x + last + 1);
            if min_y > y {
                min_y = y;
            }
            max_y = y + 1;
        }

        let found = Rect::new(Point::new(min_x, min_y), Point::new(max_x, max_y));
        debug_assert!(found.min.x < found.max.x && found.min.y < found.max.y);
        #[cfg(debug_assertions)]
        {
            for y in 0..self.grid.height() {
                for x in 0..self.grid.width() {
                    if self.grid.get(x, y) == Cell::Blank {
                        debug_assert!(found.contains(Point::new(x, y)));
                    }
                }
            }
        }
        found
    }

    /// The first blank cell, column by column, and a colour for it: dots
    /// if its row and column owe more dots than solids, solids otherwise.
    fn choose_guess(&self, area: &Rect) -> (Point, Cell) {
        let mut at = area.min;
        'search: for x in area.min.x..area.max.x {
            for y in area.min.y..area.max.y {
                if self.grid.get(x, y) == Cell::Blank {
                    at = Point::new(x, y);
                    break 'search;
                }
            }
        }

        let choice = if self.colattr[at.x].dot + self.rowattr[at.y].dot
            > self.colattr[at.x].solid + self.rowattr[at.y].solid
        {
            Cell::Dot
        } else {
            Cell::Solid
        };
        (at, choice)
    }

    /// No deductions left but blanks remain: snapshot and guess.
    fn guess(&mut self) -> Status {
        let area = self.find_min_rect();
        self.unkarea = area;
        let (at, choice) = self.choose_guess(&area);

        let (w, h) = (area.width(), area.height());
        let mut cells = Vec::with_capacity(w * h);
        for y in area.min.y..area.max.y {
            cells.extend_from_slice(&self.grid.row(y)[area.min.x..area.max.x]);
        }
        self.stack.push(Snapshot {
            area,
            cells,
            rowattr: self.rowattr[area.min.y..area.max.y].to_vec(),
            colattr: self.colattr[area.min.x..area.max.x].to_vec(),
            remcells: self.remcells,
            guess_at: at,
            guess: choice,
        });

        if self.log.level > 0 {
            debug!(
                "{:ind$}Pushing area ({},{})-({},{}) {{",
                "",
                area.min.x,
                area.min.y,
                area.max.x - 1,
                area.max.y - 1,
                ind = self.log.indent
            );
        }
        self.log.indent += 2;

        self.apply_guess(at, choice);
        Status::Line
    }

    /// A contradiction surfaced: put the saved area back and play the
    /// other colour at the guess position.
    fn backtrack(&mut self) -> Status {
        let Some(snap) = self.stack.pop() else {
            return Status::Finished;
        };
        if self.log.level > 0 {
            debug!(
                "{:ind$}Restoring ({},{})-({},{}) from stack",
                "",
                snap.area.min.x,
                snap.area.min.y,
                snap.area.max.x - 1,
                snap.area.max.y - 1,
                ind = self.log.indent
            );
        }

        self.remcells = snap.remcells;
        self.unkarea = snap.area;
        let w = snap.area.width();

        for (dy, y) in (snap.area.min.y..snap.area.max.y).enumerate() {
            self.grid.row_mut(y)[snap.area.min.x..snap.area.max.x]
                .copy_from_slice(&snap.cells[dy * w..(dy + 1) * w]);
            self.rowflag[y] = 0;
            self.rowattr[y] = snap.rowattr[dy];
        }
        for (dx, x) in (snap.area.min.x..snap.area.max.x).enumerate() {
            self.colflag[x] = 0;
            self.colattr[x] = snap.colattr[dx];
        }
        self.reminfo = 0;

        if let Some(display) = self.display.as_mut() {
            display.redraw_area(&self.grid, &snap.area);
        }
        if let Some(display) = self.display.as_mut() {
            display.col_mark(snap.area.min.x, snap.area.max.x);
            display.row_mark(snap.area.min.y, snap.area.max.y);
        }

        self.log.indent = self.log.indent.saturating_sub(2);
        if self.log.level > 0 {
            debug!("{:ind$}}}", "", ind = self.log.indent);
        }

        self.apply_guess(snap.guess_at, snap.guess.flipped());
        Status::Line
    }
}
