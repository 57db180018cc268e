//! The null strategy: reveal nothing, validate only. Useful to drive the
//! solver purely by guessing.

use nonogram_core::{Cell, LineCheck, Rule, check_line};

use crate::line::{LineSolver, LineTask, Limits, Req, Workspace, effective_rule};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Null;

impl LineSolver for Null {
    fn prep(&self, _lim: &Limits, _req: &mut Req) {}

    fn init(&self, _ws: &mut Workspace, task: &mut LineTask) -> bool {
        for (out, &cell) in task.result.iter_mut().zip(task.line) {
            *out = if cell.is_known() { cell } else { Cell::Both };
        }

        let rule = Rule::new(effective_rule(task.rule).to_vec());
        *task.fits = match check_line(&rule, task.line.iter().copied()) {
            LineCheck::Match | LineCheck::Indeterminate => 1,
            LineCheck::Mismatch => 0,
        };
        false
    }

    fn step(&self, _ws: &mut Workspace, _task: &mut LineTask) -> bool {
        false
    }

    fn term(&self, _ws: &mut Workspace) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{render, solve_line};

    #[test]
    fn reveals_nothing() {
        let (result, fits) = solve_line(Null.into(), " #- ", &[1, 1]);
        assert_eq!(fits, 1);
        assert_eq!(render(&result), "+#-+");
    }

    #[test]
    fn still_detects_mismatch() {
        let (_, fits) = solve_line(Null.into(), "##-", &[1]);
        assert_eq!(fits, 0);
    }
}
