//! Nonogram solving: the push primitive, six pluggable line-solver
//! strategies, and the driver that schedules them, accounts every deduced
//! cell, and guesses with backtracking when deduction stalls.

#![warn(clippy::pedantic)]
#![allow(clippy::similar_names, clippy::missing_errors_doc)]

mod complete;
mod fast;
mod fcomp;
mod null;
mod oddones;
mod olsak;

pub use complete::Complete;
pub use fast::Fast;
pub use fcomp::Fcomp;
pub use null::Null;
pub use oddones::OddOnes;
pub use olsak::Olsak;

mod line;
pub use line::{LineLog, LineSolver, LineTask, Limits, Req, Strategy, Workspace};

mod push;
pub use push::push;

mod driver;
pub use driver::{Algorithm, Solver, SolverError, Status};

mod observe;
pub use observe::{DisplayObserver, SolutionClient};

#[cfg(test)]
pub(crate) mod testutil {
    use nonogram_core::Cell;

    use crate::line::{LineLog, LineSolver, LineTask, Limits, Req, Strategy, Workspace};

    pub(crate) fn cells(text: &str) -> Vec<Cell> {
        text.chars()
            .map(|c| match c {
                '#' => Cell::Solid,
                '-' => Cell::Dot,
                '+' => Cell::Both,
                _ => Cell::Blank,
            })
            .collect()
    }

    pub(crate) fn render(cells: &[Cell]) -> String {
        cells.iter().map(|c| c.glyph()).collect()
    }

    /// Drives one strategy over one line to completion, the way the
    /// driver would.
    pub(crate) fn solve_line(strategy: Strategy, line: &str, rule: &[usize]) -> (Vec<Cell>, usize) {
        let line = cells(line);
        let lim = Limits {
            max_line: line.len(),
            max_rule: rule.len(),
        };
        let mut req = Req::default();
        strategy.prep(&lim, &mut req);
        let mut ws = Workspace::new();
        ws.ensure(&req);

        let mut result = vec![Cell::Blank; line.len()];
        let mut fits = 0;
        let mut task = LineTask {
            line: &line,
            rule,
            result: &mut result,
            fits: &mut fits,
            log: LineLog::default(),
        };
        let mut more = strategy.init(&mut ws, &mut task);
        let mut guard = 0u32;
        while more {
            more = strategy.step(&mut ws, &mut task);
            guard += 1;
            assert!(guard < 1_000_000, "strategy failed to terminate");
        }
        strategy.term(&mut ws);
        (result, fits)
    }
}
