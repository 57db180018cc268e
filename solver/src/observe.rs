//! Observer interfaces between a solver session and its surroundings.
//! Callbacks receive read-only views and must not call back into the
//! solver; every callback has a no-op default so implementors pick what
//! they care about.

use nonogram_core::{Grid, Rect};

/// Progress notifications for a display front-end.
pub trait DisplayObserver {
    /// Cells inside `area` changed.
    fn redraw_area(&mut self, _grid: &Grid, _area: &Rect) {}

    /// Row `line` became (or stopped being) the active solve target.
    fn row_focus(&mut self, _line: usize, _active: bool) {}

    /// Column `line` became (or stopped being) the active solve target.
    fn col_focus(&mut self, _line: usize, _active: bool) {}

    /// Pending-work flags changed for rows `from..to`.
    fn row_mark(&mut self, _from: usize, _to: usize) {}

    /// Pending-work flags changed for columns `from..to`.
    fn col_mark(&mut self, _from: usize, _to: usize) {}
}

/// Consumer of complete solutions.
pub trait SolutionClient {
    /// Called once per complete, consistent grid.
    fn present(&mut self, grid: &Grid);
}
