//! End-to-end driver scenarios: whole puzzles through load/tick/present,
//! with observers watching from the outside.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use nonogram_core::{Cell, Grid, Puzzle, Rect, Rule, format};
use solver::{Algorithm, DisplayObserver, SolutionClient, Solver, SolverError, Status};

#[derive(Default)]
struct Recorder {
    solutions: Rc<RefCell<Vec<Grid>>>,
}

impl SolutionClient for Recorder {
    fn present(&mut self, grid: &Grid) {
        self.solutions.borrow_mut().push(grid.clone());
    }
}

#[derive(Default, Clone)]
struct Events {
    redraws: Rc<RefCell<Vec<Rect>>>,
    focus_on: Rc<RefCell<usize>>,
    focus_off: Rc<RefCell<usize>>,
    marks: Rc<RefCell<usize>>,
}

impl DisplayObserver for Events {
    fn redraw_area(&mut self, _grid: &Grid, area: &Rect) {
        self.redraws.borrow_mut().push(*area);
    }
    fn row_focus(&mut self, _line: usize, active: bool) {
        *if active {
            self.focus_on.borrow_mut()
        } else {
            self.focus_off.borrow_mut()
        } += 1;
    }
    fn col_focus(&mut self, _line: usize, active: bool) {
        *if active {
            self.focus_on.borrow_mut()
        } else {
            self.focus_off.borrow_mut()
        } += 1;
    }
    fn row_mark(&mut self, _from: usize, _to: usize) {
        *self.marks.borrow_mut() += 1;
    }
    fn col_mark(&mut self, _from: usize, _to: usize) {
        *self.marks.borrow_mut() += 1;
    }
}

fn run_to_finish(solver: &mut Solver) -> Vec<Status> {
    let mut seen = Vec::new();
    for _ in 0..1_000_000 {
        let mut cycles = 1_000_000;
        let status = solver.run_cycles(&mut cycles);
        seen.push(status);
        if status == Status::Finished {
            return seen;
        }
        assert_ne!(status, Status::Unloaded);
    }
    panic!("solver failed to terminate");
}

const LANTERN: &str = "\
# rows 0, 2 and 4 full, a pillar on each side
width 5
height 5

rows
5
1,1
5
1,1
5

columns
5
1,1,1
1,1,1
1,1,1
5
";

fn lantern_solution() -> Grid {
    Grid::parse("#####\n#---#\n#####\n#---#\n#####\n", 5, 5, '#', '-')
}

#[test_log::test]
fn lantern_solves_without_guessing() {
    let puzzle = Arc::new(format::parse(LANTERN).unwrap());
    assert_eq!(puzzle.verify(), 0);

    let solutions = Rc::new(RefCell::new(Vec::new()));
    let mut solver = Solver::new();
    solver
        .set_client(Box::new(Recorder {
            solutions: Rc::clone(&solutions),
        }))
        .unwrap();
    solver
        .load(Arc::clone(&puzzle), Grid::new(5, 5))
        .unwrap();

    run_to_finish(&mut solver);

    assert_eq!(solver.guess_depth(), 0);
    let solutions = solutions.borrow();
    assert_eq!(solutions.len(), 1);
    assert_eq!(solutions[0], lantern_solution());
    assert!(puzzle.check_grid(&solutions[0]));
}

#[test_log::test]
fn lantern_under_every_algorithm() {
    for algorithm in [
        Algorithm::Fast,
        Algorithm::Complete,
        Algorithm::Hybrid,
        Algorithm::Olsak,
        Algorithm::FastOlsak,
        Algorithm::FastOddones,
        Algorithm::FastOlsakComplete,
        Algorithm::FastOddonesComplete,
        Algorithm::Fcomp,
        Algorithm::FastFcomp,
    ] {
        let puzzle = Arc::new(format::parse(LANTERN).unwrap());
        let solutions = Rc::new(RefCell::new(Vec::new()));
        let mut solver = Solver::new();
        solver.set_algorithm(algorithm).unwrap();
        solver
            .set_client(Box::new(Recorder {
                solutions: Rc::clone(&solutions),
            }))
            .unwrap();
        solver.load(puzzle, Grid::new(5, 5)).unwrap();
        run_to_finish(&mut solver);
        assert_eq!(
            *solutions.borrow(),
            vec![lantern_solution()],
            "{algorithm:?}"
        );
    }
}

#[test_log::test]
fn empty_rules_fill_with_dots() {
    let puzzle = Arc::new(Puzzle::new(
        vec![Rule::default()],
        vec![Rule::default(); 5],
    ));
    let solutions = Rc::new(RefCell::new(Vec::new()));
    let mut solver = Solver::new();
    solver
        .set_client(Box::new(Recorder {
            solutions: Rc::clone(&solutions),
        }))
        .unwrap();
    solver.load(puzzle, Grid::new(5, 1)).unwrap();

    run_to_finish(&mut solver);

    let solutions = solutions.borrow();
    assert_eq!(solutions.len(), 1);
    assert!(solutions[0].cells().iter().all(|&c| c == Cell::Dot));
}

#[test_log::test]
fn ambiguous_puzzle_yields_both_solutions() {
    // 2x2 with a single solid per line: the two diagonals.
    let puzzle = Arc::new(Puzzle::new(
        vec![Rule::from(vec![1]); 2],
        vec![Rule::from(vec![1]); 2],
    ));
    let solutions = Rc::new(RefCell::new(Vec::new()));
    let mut solver = Solver::new();
    solver
        .set_client(Box::new(Recorder {
            solutions: Rc::clone(&solutions),
        }))
        .unwrap();
    solver.load(puzzle, Grid::new(2, 2)).unwrap();

    let statuses = run_to_finish(&mut solver);
    assert!(statuses.contains(&Status::Found));

    let solutions = solutions.borrow();
    assert_eq!(solutions.len(), 2);
    let diag = Grid::parse("#-\n-#\n", 2, 2, '#', '-');
    let anti = Grid::parse("-#\n#-\n", 2, 2, '#', '-');
    assert!(solutions.contains(&diag));
    assert!(solutions.contains(&anti));
}

#[test_log::test]
fn null_algorithm_solves_by_guessing_alone() {
    let puzzle = Arc::new(Puzzle::new(
        vec![Rule::from(vec![1]); 2],
        vec![Rule::from(vec![1]); 2],
    ));
    let solutions = Rc::new(RefCell::new(Vec::new()));
    let mut solver = Solver::new();
    solver.set_algorithm(Algorithm::Null).unwrap();
    solver
        .set_client(Box::new(Recorder {
            solutions: Rc::clone(&solutions),
        }))
        .unwrap();
    solver.load(puzzle, Grid::new(2, 2)).unwrap();

    run_to_finish(&mut solver);
    assert_eq!(solutions.borrow().len(), 2);
}

#[test_log::test]
fn loading_a_solved_grid_changes_nothing() {
    let solved = lantern_solution();
    let puzzle = Arc::new(Puzzle::from_grid(&solved).unwrap());

    let solutions = Rc::new(RefCell::new(Vec::new()));
    let events = Events::default();
    let mut solver = Solver::new();
    solver
        .set_client(Box::new(Recorder {
            solutions: Rc::clone(&solutions),
        }))
        .unwrap();
    solver.set_display(Box::new(events.clone())).unwrap();
    solver.load(puzzle, solved.clone()).unwrap();

    run_to_finish(&mut solver);

    // Nothing redrawn: no cell changed and no guess was placed.
    assert!(events.redraws.borrow().is_empty());
    assert_eq!(solutions.borrow().len(), 1);
    let grid = solver.unload().unwrap();
    assert_eq!(grid, solved);
}

#[test_log::test]
fn line_counts_track_blank_cells() {
    let puzzle = Arc::new(format::parse(LANTERN).unwrap());
    let mut solver = Solver::new();
    solver.set_algorithm(Algorithm::Fast).unwrap();
    solver
        .load(Arc::clone(&puzzle), Grid::new(5, 5))
        .unwrap();

    for _ in 0..1_000_000 {
        let mut cycles = 1_000_000;
        let status = solver.run_cycles(&mut cycles);

        let grid = solver.grid().unwrap();
        for y in 0..puzzle.height() {
            let blanks = grid.row(y).iter().filter(|&&c| c == Cell::Blank).count() as i64;
            let (dot, solid) = solver.row_remaining(y).unwrap();
            assert_eq!(dot + solid, blanks, "row {y}");
        }
        for x in 0..puzzle.width() {
            let blanks = grid.column(x).filter(|&c| c == Cell::Blank).count() as i64;
            let (dot, solid) = solver.col_remaining(x).unwrap();
            assert_eq!(dot + solid, blanks, "column {x}");
        }

        if status == Status::Finished {
            break;
        }
    }
}

#[test_log::test]
fn focus_events_come_in_pairs() {
    let puzzle = Arc::new(format::parse(LANTERN).unwrap());
    let events = Events::default();
    let mut solver = Solver::new();
    solver.set_display(Box::new(events.clone())).unwrap();
    solver.load(puzzle, Grid::new(5, 5)).unwrap();

    run_to_finish(&mut solver);

    assert_eq!(*events.focus_on.borrow(), *events.focus_off.borrow());
    assert!(*events.focus_on.borrow() > 0);
    assert!(*events.marks.borrow() > 0);
    assert!(!events.redraws.borrow().is_empty());
}

#[test_log::test]
fn configuration_is_locked_while_loaded() {
    let puzzle = Arc::new(Puzzle::new(
        vec![Rule::from(vec![1])],
        vec![Rule::from(vec![1])],
    ));
    let mut solver = Solver::new();
    solver.load(puzzle, Grid::new(1, 1)).unwrap();

    assert_eq!(
        solver.set_algorithm(Algorithm::Fast),
        Err(SolverError::AlreadyLoaded)
    );
    assert_eq!(solver.set_log(0, 1), Err(SolverError::AlreadyLoaded));

    solver.unload().unwrap();
    assert!(solver.set_algorithm(Algorithm::Fast).is_ok());
    assert_eq!(solver.unload().unwrap_err(), SolverError::NotLoaded);
}

#[test_log::test]
fn bad_loads_are_rejected() {
    let puzzle = Arc::new(Puzzle::new(
        vec![Rule::from(vec![1])],
        vec![Rule::from(vec![1])],
    ));
    let mut solver = Solver::new();
    assert!(matches!(
        solver.load(Arc::clone(&puzzle), Grid::new(2, 2)),
        Err(SolverError::SizeMismatch { .. })
    ));
    assert_eq!(
        solver.load(Arc::new(Puzzle::new(vec![], vec![])), Grid::new(0, 0)),
        Err(SolverError::EmptyPuzzle)
    );

    let mut cycles = 10;
    assert_eq!(solver.run_cycles(&mut cycles), Status::Unloaded);

    solver.load(puzzle, Grid::new(1, 1)).unwrap();
    assert_eq!(solver.load(
        Arc::new(Puzzle::new(vec![Rule::default()], vec![Rule::default()])),
        Grid::new(1, 1),
    ), Err(SolverError::AlreadyLoaded));
}

#[test_log::test]
fn partial_grid_is_respected() {
    // Pre-seed the lantern's centre row; the solver keeps it and solves
    // the rest around it.
    let puzzle = Arc::new(format::parse(LANTERN).unwrap());
    let mut grid = Grid::new(5, 5);
    for x in 0..5 {
        grid.set(x, 2, Cell::Solid);
    }
    let solutions = Rc::new(RefCell::new(Vec::new()));
    let mut solver = Solver::new();
    solver
        .set_client(Box::new(Recorder {
            solutions: Rc::clone(&solutions),
        }))
        .unwrap();
    solver.load(puzzle, grid).unwrap();

    run_to_finish(&mut solver);
    assert_eq!(*solutions.borrow(), vec![lantern_solution()]);
}
