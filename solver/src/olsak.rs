//! The olsak strategy: for each open cell on which the two extreme
//! placements agree, pencil in the *contrary* value and ask push whether
//! the line still works. If it does, nothing is learned there and a skip
//! flag suppresses further guesses until a known cell goes by; if it does
//! not, the agreed value is forced.

use nonogram_core::Cell;

use crate::line::{LineSolver, LineTask, Limits, Req, Workspace, effective_rule};
use crate::push::push;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Olsak;

pub(crate) fn contrary_prep(lim: &Limits, req: &mut Req) {
    // Left, right, and throwaway test positions, push scratch, and the
    // per-cell agreement flags.
    req.positions += lim.max_rule * 3;
    req.offsets += lim.max_rule;
    req.cells += lim.max_line;
}

/// Fills the empty-rule answer: all dots, unless a solid already vetoes the
/// line. Returns the `fits` value.
pub(crate) fn fill_empty_rule(task: &mut LineTask) -> usize {
    for i in 0..task.len() {
        if task.line[i] == Cell::Solid {
            return 0;
        }
        task.result[i] = Cell::Dot;
    }
    1
}

/// Runs push both ways and merges the two extreme placements into
/// per-cell agreement flags: `Dot`/`Solid` where the extremes agree,
/// `Both` where they differ. Returns `false` if either push fails. On
/// success the right-pushed positions are left in `right`, forward frame.
pub(crate) fn extreme_flags(
    task: &LineTask,
    rule: &[usize],
    left: &mut [usize],
    right: &mut [usize],
    solid: &mut [Option<usize>],
    flags: &mut [Cell],
) -> bool {
    let len = task.line.len();
    let k = rule.len();

    if !push(task.line, rule, false, left, solid, task.log) {
        return false;
    }
    if !push(task.line, rule, true, right, solid, task.log) {
        return false;
    }
    right.reverse();
    for (b, p) in right.iter_mut().enumerate() {
        *p = len - *p - rule[b];
    }

    let mut i = 0;
    for b in 0..k {
        while i < left[b] {
            flags[i] = Cell::Dot;
            i += 1;
        }
        while i < left[b] + rule[b] {
            flags[i] = Cell::Solid;
            i += 1;
        }
    }
    while i < len {
        flags[i] = Cell::Dot;
        i += 1;
    }

    let mut i = 0;
    for b in 0..k {
        while i < right[b] {
            flags[i] |= Cell::Dot;
            i += 1;
        }
        while i < right[b] + rule[b] {
            flags[i] |= Cell::Solid;
            i += 1;
        }
    }
    while i < len {
        flags[i] |= Cell::Dot;
        i += 1;
    }
    true
}

/// Tests one cell with a contrary guess. The result buffer doubles as the
/// trial line handed to push.
pub(crate) fn check_cell(
    task: &mut LineTask,
    rule: &[usize],
    waste: &mut [usize],
    pushspace: &mut [Option<usize>],
    flags: &mut [Cell],
    at: usize,
    skip: Option<&mut bool>,
) {
    if task.line[at] != Cell::Blank {
        // Walking past a known cell re-arms guessing.
        if let Some(skip) = skip {
            *skip = false;
        }
        return;
    }
    if skip.as_ref().is_some_and(|s| **s) {
        return;
    }
    if flags[at] == Cell::Both {
        return;
    }

    task.result[at] = flags[at].flipped();
    if push(task.result, rule, false, waste, pushspace, task.log) {
        // The contrary guess still fits, so the cell is not forced. Make
        // sure the return sweep does not try it again.
        task.result[at] = Cell::Blank;
        flags[at] = Cell::Both;
        if let Some(skip) = skip {
            *skip = true;
        }
    } else {
        task.result[at] = task.result[at].flipped();
    }
}

impl LineSolver for Olsak {
    fn prep(&self, lim: &Limits, req: &mut Req) {
        contrary_prep(lim, req);
    }

    fn init(&self, ws: &mut Workspace, task: &mut LineTask) -> bool {
        let rule = effective_rule(task.rule);
        let len = task.len();
        let k = rule.len();

        if rule.is_empty() {
            *task.fits = fill_empty_rule(task);
            return false;
        }

        let (left, rest) = ws.positions.split_at_mut(k);
        let (right, rest) = rest.split_at_mut(k);
        let waste = &mut rest[..k];
        let pushspace = &mut ws.offsets[..k];
        let flags = &mut ws.cells[..len];

        *task.fits = 0;
        if !extreme_flags(task, rule, left, right, pushspace, flags) {
            return false;
        }
        *task.fits = 1;

        task.result.copy_from_slice(task.line);

        // Sweep left to right over the right-pushed boundaries, gap before
        // block, then back the other way; the skip flag lives per section.
        let mut bounds: Vec<usize> = Vec::with_capacity(2 * k + 2);
        bounds.push(0);
        for b in 0..k {
            bounds.push(right[b]);
            bounds.push(right[b] + rule[b]);
        }
        bounds.push(len);

        for window in bounds.windows(2) {
            let mut skip = false;
            for at in window[0]..window[1] {
                check_cell(task, rule, waste, pushspace, flags, at, Some(&mut skip));
            }
        }
        for window in bounds.windows(2).rev() {
            let mut skip = false;
            for at in (window[0]..window[1]).rev() {
                check_cell(task, rule, waste, pushspace, flags, at, Some(&mut skip));
            }
        }

        for cell in task.result.iter_mut() {
            if *cell == Cell::Blank {
                *cell = Cell::Both;
            }
        }
        false
    }

    fn step(&self, _ws: &mut Workspace, _task: &mut LineTask) -> bool {
        false
    }

    fn term(&self, _ws: &mut Workspace) {}
}
