//! The fast strategy: push the blocks to both extremes and keep whatever
//! the two placements agree on. Cheap, single-shot, and partial — cells the
//! extremes disagree on stay undetermined.

use log::{Level, debug, log_enabled};
use nonogram_core::Cell;

use crate::line::{LineSolver, LineTask, Limits, Req, Workspace, effective_rule};
use crate::push::push;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Fast;

impl LineSolver for Fast {
    fn prep(&self, lim: &Limits, req: &mut Req) {
        // Left and right positions, plus push's covered-solid scratch.
        req.positions += lim.max_rule * 2;
        req.offsets += lim.max_rule;
    }

    fn init(&self, ws: &mut Workspace, task: &mut LineTask) -> bool {
        let rule = effective_rule(task.rule);
        let len = task.len();
        let k = rule.len();

        let (lpos, rest) = ws.positions.split_at_mut(k);
        let rpos = &mut rest[..k];
        let solid = &mut ws.offsets[..k];

        *task.fits = 0;
        if !push(task.line, rule, false, lpos, solid, task.log) {
            return false;
        }
        if k > 0 && !push(task.line, rule, true, rpos, solid, task.log) {
            return false;
        }
        *task.fits = 1;

        // Right-push positions come back in the reversed frame; express
        // them as left edges in the forward frame.
        rpos.reverse();
        for (b, p) in rpos.iter_mut().enumerate() {
            *p = len - *p - rule[b];
        }

        // Lay down the intersection of the two extremes: a cell is solid
        // only if the same block covers it both ways, a dot only if it lies
        // outside every block both ways, and in between the two edges of a
        // block it stays open.
        let mut j = 0;
        for b in 0..k {
            fill(task.result, &mut j, lpos[b], Cell::Dot);
            fill(task.result, &mut j, rpos[b], Cell::Both);
            fill(task.result, &mut j, lpos[b] + rule[b], Cell::Solid);
            fill(task.result, &mut j, rpos[b] + rule[b], Cell::Both);
        }
        fill(task.result, &mut j, len, Cell::Dot);

        for (i, &cell) in task.line.iter().enumerate() {
            if cell != Cell::Blank {
                task.result[i] = cell;
            }
        }

        if task.log.level > 0 && log_enabled!(Level::Debug) {
            debug!(
                "{:ind$} Fast: >{}<",
                "",
                task.render_result(),
                ind = task.log.indent
            );
        }
        false
    }

    fn step(&self, _ws: &mut Workspace, _task: &mut LineTask) -> bool {
        false
    }

    fn term(&self, _ws: &mut Workspace) {}
}

fn fill(result: &mut [Cell], from: &mut usize, to: usize, value: Cell) {
    while *from < to {
        result[*from] = value;
        *from += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::solve_line;

    #[test]
    fn forced_centre() {
        // Length 7, rule [5]: only the middle three cells are common to
        // both extremes.
        let (result, fits) = solve_line(Fast.into(), "       ", &[5]);
        assert_eq!(fits, 1);
        assert_eq!(render(&result), "++###++");
    }

    #[test]
    fn known_solid_narrows() {
        let (result, fits) = solve_line(Fast.into(), "   #   ", &[3]);
        assert_eq!(fits, 1);
        assert_eq!(render(&result), "-++#++-");
    }

    #[test]
    fn full_line_is_exact() {
        let (result, fits) = solve_line(Fast.into(), "     ", &[5]);
        assert_eq!(fits, 1);
        assert_eq!(render(&result), "#####");
    }

    #[test]
    fn empty_rule_fills_dots() {
        let (result, fits) = solve_line(Fast.into(), "     ", &[]);
        assert_eq!(fits, 1);
        assert_eq!(render(&result), "-----");
        let (result, fits) = solve_line(Fast.into(), "     ", &[0]);
        assert_eq!(fits, 1);
        assert_eq!(render(&result), "-----");
    }

    #[test]
    fn contradiction_reports_zero_fits() {
        let (_, fits) = solve_line(Fast.into(), "#-#", &[3]);
        assert_eq!(fits, 0);
    }

    fn render(cells: &[Cell]) -> String {
        cells.iter().map(|c| c.glyph()).collect()
    }
}
