//! The odd-ones strategy: the simpler ancestor of olsak. One left-to-right
//! pass of contrary guesses over the cells the two extremes agree on, with
//! no skip suppression; it tests more cells than olsak for the same
//! deductions.

use nonogram_core::Cell;

use crate::line::{LineSolver, LineTask, Limits, Req, Workspace, effective_rule};
use crate::olsak::{check_cell, contrary_prep, extreme_flags, fill_empty_rule};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct OddOnes;

impl LineSolver for OddOnes {
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
        for at in 0..len {
            check_cell(task, rule, waste, pushspace, flags, at, None);
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
