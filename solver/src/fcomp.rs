//! The fast-complete strategy: exact like `complete`, but instead of
//! re-enumerating placements from scratch it slides blocks from one valid
//! arrangement to the next, recording the swept cells as it goes.
//!
//! The machine oscillates between INVALID (find a tentative position for
//! the current block and every later one) and SLIDING (walk each block
//! rightward through its valid positions). When sliding runs out because a
//! block holds a solid, DRAWING brings an earlier block up to take the
//! solid over, invalidating everything after it; an overshoot during
//! INVALID restores the last valid arrangement (RESTORING) before drawing
//! again. Blocks proven to be at their final positions shrink the live
//! range `[base, max)` from the right.

use log::{Level, log_enabled, trace};
use nonogram_core::Cell;

use crate::line::{
    LineLog, LineSolver, LineTask, Limits, Req, StrategyState, Workspace, effective_rule,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Fcomp;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Mode {
    #[default]
    Invalid,
    Sliding,
    Drawing,
    Restoring,
}

/// Machine registers. Block positions (`pos`/`oldpos`) and covered-solid
/// offsets (`solid`/`oldsolid`, sentinel `line length + 1` for "none") live
/// in the workspace position arena, in that order.
#[derive(Debug, Default)]
pub(crate) struct FcompState {
    mode: Mode,
    /// Block in focus.
    block: usize,
    /// Left-most block not yet known to be final.
    base: usize,
    /// One past the right-most block not yet final.
    max: usize,
    /// Left boundary imposed by the fixed blocks: earlier blocks must end
    /// before this.
    maxpos: usize,
    /// Least block disturbed since the last valid arrangement.
    mininv: usize,
    /// Block whose covered solid DRAWING wants taken over.
    target: usize,
    /// Open cells that could still yield information.
    remunk: usize,
}

impl LineSolver for Fcomp {
    fn prep(&self, lim: &Limits, req: &mut Req) {
        req.positions += lim.max_rule * 4;
    }

    fn init(&self, ws: &mut Workspace, task: &mut LineTask) -> bool {
        let rule = effective_rule(task.rule);
        let len = task.len();
        let k = rule.len();

        *task.fits = 0;

        if rule.is_empty() {
            for i in 0..len {
                match task.line[i] {
                    Cell::Dot => task.result[i] = Cell::Dot,
                    Cell::Blank => task.result[i] = Cell::Dot,
                    _ => return false,
                }
            }
            *task.fits = 1;
            return false;
        }

        let mut remunk = 0;
        for (out, &cell) in task.result.iter_mut().zip(task.line) {
            if cell == Cell::Blank {
                remunk += 1;
            }
            *out = cell;
        }

        let (pos, rest) = ws.positions.split_at_mut(k);
        let (oldpos, rest) = rest.split_at_mut(k);
        let (solid, rest) = rest.split_at_mut(k);
        let oldsolid = &mut rest[..k];
        pos.fill(0);
        oldpos.fill(0);
        solid.fill(len + 1);
        oldsolid.fill(len + 1);

        ws.state = StrategyState::Fcomp(FcompState {
            mode: Mode::Invalid,
            block: 0,
            base: 0,
            max: k,
            maxpos: len,
            mininv: 0,
            target: 0,
            remunk,
        });
        true
    }

    fn step(&self, ws: &mut Workspace, task: &mut LineTask) -> bool {
        let rule = effective_rule(task.rule);
        let k = rule.len();
        let (pos, rest) = ws.positions.split_at_mut(k);
        let (oldpos, rest) = rest.split_at_mut(k);
        let (solid, rest) = rest.split_at_mut(k);
        let oldsolid = &mut rest[..k];
        let StrategyState::Fcomp(st) = &mut ws.state else {
            return false;
        };

        let mut f = Fr {
            line: task.line,
            rule,
            result: &mut *task.result,
            fits: &mut *task.fits,
            log: task.log,
            pos,
            oldpos,
            solid,
            oldsolid,
            st,
        };

        if f.log.level > 2 && log_enabled!(Level::Trace) {
            trace!(
                "{:ind$}fcomp {:?} block {} [{}-{}) m{}",
                "",
                f.st.mode,
                f.st.block,
                f.st.base,
                f.st.max,
                f.st.mininv,
                ind = f.log.indent
            );
        }

        match f.st.mode {
            Mode::Invalid => f.step_invalid(),
            Mode::Sliding => f.step_sliding(),
            Mode::Drawing => f.step_drawing(),
            Mode::Restoring => f.step_restoring(),
        }
    }

    fn term(&self, ws: &mut Workspace) {
        ws.state = StrategyState::Idle;
    }
}

struct Fr<'a> {
    line: &'a [Cell],
    rule: &'a [usize],
    result: &'a mut [Cell],
    fits: &'a mut usize,
    log: LineLog,
    pos: &'a mut [usize],
    oldpos: &'a mut [usize],
    solid: &'a mut [usize],
    oldsolid: &'a mut [usize],
    st: &'a mut FcompState,
}

impl Fr<'_> {
    fn covers(&self, b: usize) -> bool {
        self.solid[b] < self.rule[b]
    }

    /// ORs `v` over `[from, to)`, counting down the open cells; `true`
    /// means nothing more can be learned from this line. Every recorded
    /// section is one examined arrangement slice, so it bumps `fits`.
    fn record_section(&mut self, from: usize, to: usize, v: Cell) -> bool {
        *self.fits += 1;
        for i in from..to {
            if self.line[i] != Cell::Blank {
                continue;
            }
            if self.result[i].bits() & v.bits() != 0 {
                continue;
            }
            self.result[i] |= v;
            if self.result[i] == Cell::Both {
                self.st.remunk -= 1;
                if self.st.remunk == 0 {
                    return true;
                }
            }
        }
        false
    }

    /// Records the cells a single block swept while sliding from
    /// `oldpos[b]` to `pos[b]`: dots exposed on its left, solids newly
    /// covered on its right.
    fn merge1(&mut self, b: usize) -> bool {
        if self.record_section(self.oldpos[b], self.pos[b], Cell::Dot)
            || self.record_section(
                self.oldpos[b] + self.rule[b],
                self.pos[b] + self.rule[b],
                Cell::Solid,
            )
        {
            return true;
        }
        self.oldpos[b] = self.pos[b];
        self.oldsolid[b] = self.solid[b];
        false
    }

    /// Records a freshly-validated arrangement over the disturbed range
    /// `[mininv, max)`: the dots before each block and the block itself.
    fn record_sections(&mut self) -> bool {
        let base = self.st.mininv;
        let max = self.st.max;
        let mut left = if base > 0 {
            self.pos[base - 1] + self.rule[base - 1]
        } else {
            0
        };
        for b in base..max {
            if self.record_section(left, self.pos[b], Cell::Dot) {
                return true;
            }
            left = self.pos[b] + self.rule[b];
            if self.record_section(self.pos[b], left, Cell::Solid) {
                return true;
            }
            self.oldpos[b] = self.pos[b];
            self.oldsolid[b] = self.solid[b];
        }
        let end = if max == self.rule.len() {
            self.line.len()
        } else {
            self.pos[max]
        };
        self.record_section(left, end, Cell::Dot)
    }

    /// Is there room for a block of `req` cells strictly before `lim`,
    /// starting the search at `*at`?
    fn can_jump(&self, req: usize, lim: usize, at: &mut usize) -> bool {
        let mut got = 0;
        let mut i = *at;
        while i < lim && got < req {
            if self.line[i] == Cell::Dot {
                got = 0;
                *at = i + 1;
            } else {
                debug_assert_eq!(self.line[i], Cell::Blank);
                got += 1;
            }
            i += 1;
        }
        got >= req
    }

    fn step_invalid(&mut self) -> bool {
        if self.st.block >= self.st.max {
            // Every live block is tentatively placed.
            if self.st.block <= self.st.base {
                return false;
            }
            self.st.block -= 1;
            let b = self.st.block;

            // Any solid between the last block and the fixed region?
            for i in self.pos[b] + self.rule[b]..self.st.maxpos {
                if self.line[i] != Cell::Solid {
                    continue;
                }
                if self.pos[b] + self.solid[b] + self.rule[b] > i {
                    // The block can jump onto it without exposing its own
                    // solid; revalidate from there.
                    self.pos[b] = i + 1 - self.rule[b];
                    return true;
                }
                debug_assert!(self.covers(b));
                self.st.target = b;
                self.st.mode = Mode::Drawing;
                return true;
            }

            // A new valid arrangement.
            if self.record_sections() {
                return false;
            }
            self.st.mininv = self.st.max;
            self.st.mode = Mode::Sliding;
            return true;
        }

        let b = self.st.block;
        if self.pos[b] + self.rule[b] > self.st.maxpos {
            // Spilled off the line or into the fixed region.
            self.st.mode = Mode::Restoring;
            return true;
        }

        // Scan the block's span for dots, noting the first covered solid.
        let end = self.pos[b] + self.rule[b];
        self.solid[b] = self.line.len() + 1;
        let mut i = self.pos[b];
        while i < end && self.line[i] != Cell::Dot {
            if !self.covers(b) && self.line[i] == Cell::Solid {
                self.solid[b] = i - self.pos[b];
            }
            i += 1;
        }

        if i < end {
            // A dot under the block.
            if self.covers(b) {
                // With a solid before it, the block cannot pass; bring an
                // earlier block up instead.
                self.st.target = b;
                self.st.mode = Mode::Drawing;
                return true;
            }
            self.pos[b] = i + 1;
            return true;
        }

        // A solid just off the block's right edge counts as covered at the
        // edge, and drags the block over one cell at a time.
        if !self.covers(b) && end < self.line.len() && self.line[end] == Cell::Solid {
            self.solid[b] = self.rule[b];
        }
        while self.pos[b] + self.rule[b] < self.st.maxpos
            && self.line[self.pos[b] + self.rule[b]] == Cell::Solid
        {
            if self.solid[b] == 0 {
                // Solids at both ends, further apart than the block spans.
                self.st.target = b;
                self.st.mode = Mode::Drawing;
                return true;
            }
            self.pos[b] += 1;
            self.solid[b] -= 1;
        }

        // Valid position; line up the next block.
        if b + 1 < self.st.max && self.pos[b + 1] < self.pos[b] + self.rule[b] + 1 {
            self.pos[b + 1] = self.pos[b] + self.rule[b] + 1;
        }
        self.st.block += 1;
        true
    }

    fn step_sliding(&mut self) -> bool {
        let k = self.rule.len();
        let len = self.line.len();
        let b = self.st.block;
        let lim = if b + 1 < k { self.pos[b + 1] - 1 } else { len };

        debug_assert_eq!(self.pos[b], self.oldpos[b]);
        debug_assert_eq!(self.solid[b], self.oldsolid[b]);

        // Slide right until the next block, the line end, a dot, or the
        // point where the covered solid would escape.
        while self.pos[b] + self.rule[b] < lim
            && self.line[self.pos[b] + self.rule[b]] != Cell::Dot
            && self.solid[b] != 0
        {
            debug_assert_ne!(self.line[self.pos[b] + self.rule[b]], Cell::Solid);
            self.solid[b] -= 1;
            self.pos[b] += 1;
        }

        if self.pos[b] != self.oldpos[b] && self.merge1(b) {
            return false;
        }

        if self.pos[b] + self.rule[b] == lim && b + 1 == self.st.max {
            // The right-most live block is as far right as it goes.
            if self.st.max == self.st.base {
                return false;
            }
            self.st.max -= 1;
            self.st.maxpos = self.pos[b].saturating_sub(1);
        } else if self.pos[b] + self.rule[b] < lim
            && self.line[self.pos[b] + self.rule[b]] == Cell::Dot
        {
            let mut at = self.pos[b] + self.rule[b] + 1;
            if self.pos[b] + self.rule[b] * 2 < lim && self.can_jump(self.rule[b], lim, &mut at) {
                if !self.covers(b) {
                    // Jump the dot and keep sliding this block.
                    let from = self.oldpos[b];
                    self.pos[b] = at;
                    if self.record_section(from, from + self.rule[b], Cell::Dot) {
                        return false;
                    }
                    if self.record_section(self.pos[b], self.pos[b] + self.rule[b], Cell::Solid) {
                        return false;
                    }
                    self.oldpos[b] = self.pos[b];
                    self.solid[b] = len + 1;
                    self.oldsolid[b] = len + 1;
                    return true;
                }
                // Space to jump, but a covered solid pins the block here.
            } else if b + 1 == self.st.max {
                // No way past the dot: the block is final.
                if self.st.max == self.st.base {
                    return false;
                }
                self.st.max -= 1;
                self.st.maxpos = self.pos[b].saturating_sub(1);
            }
        }

        // Try sliding the block to the left next.
        if self.st.block > self.st.base {
            self.st.block -= 1;
            return true;
        }

        // All live blocks slid; pull a block up to the right-most one
        // still holding a solid, if any.
        if self.st.max <= self.st.base {
            return false;
        }
        self.st.block = self.st.max - 1;
        while self.st.block > self.st.base && !self.covers(self.st.block) {
            self.st.block -= 1;
        }
        if !self.covers(self.st.block) {
            return false;
        }
        self.st.target = self.st.block;
        self.st.mode = Mode::Drawing;
        true
    }

    fn step_drawing(&mut self) -> bool {
        debug_assert!(self.covers(self.st.target));

        loop {
            if self.st.block <= self.st.base {
                // Nothing earlier can take the solid: all arrangements are
                // exhausted.
                return false;
            }
            if self.st.mininv < self.st.max && self.st.block == self.st.mininv {
                // Cannot disturb below the restore point; put the last
                // valid arrangement back first.
                self.st.block = self.st.max - 1;
                self.st.mode = Mode::Restoring;
                return true;
            }
            if self.covers(self.st.block) {
                self.st.target = self.st.block;
            }
            self.st.block -= 1;

            let b = self.st.block;
            let t = self.st.target;
            let walk_on = self.covers(b)
                && self.pos[t] + self.solid[t] + 1 > self.pos[b] + self.solid[b] + self.rule[b];
            if !walk_on {
                break;
            }
        }

        if self.st.block < self.st.mininv {
            self.st.mininv = self.st.block;
        }

        let b = self.st.block;
        let t = self.st.target;
        debug_assert!(self.pos[t] + self.solid[t] + 1 >= self.rule[b]);
        self.pos[b] = self.pos[t] + self.solid[t] + 1 - self.rule[b];
        debug_assert!(self.pos[b] + self.rule[b] <= self.line.len());
        self.st.mode = Mode::Invalid;
        true
    }

    fn step_restoring(&mut self) -> bool {
        let k = self.rule.len();
        debug_assert!(self.st.block < k);
        debug_assert!(self.st.block < self.st.max);

        // Restore the disturbed blocks right to left and pick the
        // left-most restored block that covers a solid as the next target.
        // With nothing disturbed (`mininv` past the block) this restores
        // nothing.
        self.st.target = k;
        let lo = self.st.mininv;
        let hi = self.st.block;
        if lo <= hi {
            for i in (lo..=hi).rev() {
                self.pos[i] = self.oldpos[i];
                self.solid[i] = self.oldsolid[i];
                if self.covers(i) {
                    self.st.target = i;
                }
            }
        }

        self.st.block = self.st.mininv.min(self.st.max);
        self.st.mininv = k;

        if self.st.target >= k {
            // No restored block holds a solid; look further left.
            while self.st.block > self.st.base && !self.covers(self.st.block) {
                self.st.block -= 1;
            }
            if !self.covers(self.st.block) {
                return false;
            }
            self.st.target = self.st.block;
        }
        self.st.mode = Mode::Drawing;
        true
    }
}
