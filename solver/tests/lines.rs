//! Randomized cross-checks between the line-solver strategies: `complete`
//! is the ground truth, `fcomp` must agree with it exactly, and the
//! cheaper strategies may only ever claim a subset of what it forces.

use nonogram_core::{Cell, Rule, runs_of};
use solver::{
    Complete, Fast, Fcomp, LineLog, LineSolver, LineTask, Limits, Null, OddOnes, Olsak, Req,
    Strategy, Workspace,
};

fn solve_line(strategy: Strategy, line: &[Cell], rule: &[usize]) -> (Vec<Cell>, usize) {
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
        line,
        rule,
        result: &mut result,
        fits: &mut fits,
        log: LineLog::default(),
    };
    let mut more = strategy.init(&mut ws, &mut task);
    let mut steps = 0u64;
    while more {
        more = strategy.step(&mut ws, &mut task);
        steps += 1;
        assert!(steps < 10_000_000, "strategy failed to terminate");
    }
    strategy.term(&mut ws);
    (result, fits)
}

fn render(cells: &[Cell]) -> String {
    cells.iter().map(|c| c.glyph()).collect()
}

/// A random fully-determined line and the rule it satisfies.
fn make_line(rng: &mut fastrand::Rng, max_len: usize) -> (Vec<Cell>, Rule) {
    let len = rng.usize(1..=max_len);
    let line: Vec<Cell> = (0..len)
        .map(|_| {
            if rng.u8(0..3) == 0 {
                Cell::Solid
            } else {
                Cell::Dot
            }
        })
        .collect();
    let rule = runs_of(line.iter().copied()).unwrap();
    (line, rule)
}

/// Hides a random subset of a determined line.
fn break_line(rng: &mut fastrand::Rng, line: &[Cell]) -> Vec<Cell> {
    line.iter()
        .map(|&c| if rng.bool() { c } else { Cell::Blank })
        .collect()
}

#[test_log::test]
fn strategies_agree_on_random_lines() {
    let mut rng = fastrand::Rng::with_seed(0x6e6f_6e6f);

    for round in 0..400 {
        let (solved, rule) = make_line(&mut rng, 24);
        let broken = break_line(&mut rng, &solved);
        let blocks = rule.blocks().to_vec();

        let (truth, truth_fits) = solve_line(Complete.into(), &broken, &blocks);
        // The line came from a real solution, so it must be satisfiable.
        assert!(truth_fits > 0, "round {round}: >{}<", render(&broken));

        // Whatever complete forces must hold in the solved line.
        for (i, &cell) in truth.iter().enumerate() {
            if cell.is_known() {
                assert_eq!(cell, solved[i], "round {round} cell {i}");
            }
        }

        // fcomp is exact: cell for cell the same deductions.
        let (fcomp, fcomp_fits) = solve_line(Fcomp.into(), &broken, &blocks);
        assert!(fcomp_fits > 0, "round {round}");
        assert_eq!(
            render(&fcomp),
            render(&truth),
            "round {round}: >{}< rule {rule}",
            render(&broken)
        );

        // The partial strategies must never claim more than the truth.
        for strategy in [
            Strategy::from(Fast),
            Strategy::from(Olsak),
            Strategy::from(OddOnes),
            Strategy::from(Null),
        ] {
            let (partial, fits) = solve_line(strategy, &broken, &blocks);
            assert!(fits > 0, "round {round} {strategy:?}");
            for (i, &cell) in partial.iter().enumerate() {
                if broken[i] == Cell::Blank && cell.is_known() {
                    assert_eq!(
                        cell, truth[i],
                        "round {round} {strategy:?} cell {i}: >{}< rule {rule}",
                        render(&broken)
                    );
                }
            }
        }
    }
}

#[test_log::test]
fn push_postconditions_on_random_lines() {
    let mut rng = fastrand::Rng::with_seed(0x7075_7368);

    for _ in 0..400 {
        let (solved, rule) = make_line(&mut rng, 24);
        let broken = break_line(&mut rng, &solved);
        let blocks = rule.blocks().to_vec();

        let mut pos = vec![0; blocks.len()];
        let mut solid = vec![None; blocks.len()];
        let ok = solver::push(
            &broken,
            &blocks,
            false,
            &mut pos,
            &mut solid,
            LineLog::default(),
        );
        assert!(ok, "feasible line must push: >{}<", render(&broken));

        for b in 0..blocks.len() {
            assert!(pos[b] + blocks[b] <= broken.len());
            if b + 1 < blocks.len() {
                assert!(pos[b] + blocks[b] + 1 <= pos[b + 1]);
            }
        }
        for (i, &cell) in broken.iter().enumerate() {
            let inside = (0..blocks.len()).any(|b| i >= pos[b] && i < pos[b] + blocks[b]);
            if inside {
                assert_ne!(cell, Cell::Dot);
            } else {
                assert_ne!(cell, Cell::Solid);
            }
        }
    }
}

#[test_log::test]
fn partially_solved_lines_round_trip() {
    // Feeding a strategy's own output back as the line must keep every
    // deduction stable.
    let mut rng = fastrand::Rng::with_seed(0x7374_6162);

    for _ in 0..100 {
        let (solved, rule) = make_line(&mut rng, 18);
        let broken = break_line(&mut rng, &solved);
        let blocks = rule.blocks().to_vec();

        let (first, _) = solve_line(Complete.into(), &broken, &blocks);
        // Keep known cells, re-open the undecided ones.
        let reopened: Vec<Cell> = first
            .iter()
            .map(|&c| if c.is_known() { c } else { Cell::Blank })
            .collect();
        let (second, fits) = solve_line(Complete.into(), &reopened, &blocks);
        assert!(fits > 0);
        for (a, b) in first.iter().zip(&second) {
            if a.is_known() {
                assert_eq!(a, b);
            }
        }
    }
}
