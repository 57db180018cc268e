use std::cmp::Ordering;
use std::collections::BTreeMap;

use thiserror::Error;

use crate::cell::Grid;
use crate::rule::{self, LineCheck, Rule};

/// A grid could not be turned into a puzzle.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridError {
    #[error("indeterminate cell at ({x}, {y})")]
    Indeterminate { x: usize, y: usize },
}

/// A nonogram: a rule per row and per column, plus free-form notes keyed by
/// name (the title is just the `title` note).
///
/// The puzzle is read-only while a solver session references it; sessions
/// share it behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    rows: Vec<Rule>,
    cols: Vec<Rule>,
    notes: BTreeMap<String, String>,
}

impl Puzzle {
    /// Builds a puzzle from its row and column rules. The dimensions are the
    /// lengths of the two vectors.
    #[must_use]
    pub fn new(rows: Vec<Rule>, cols: Vec<Rule>) -> Self {
        Puzzle {
            rows,
            cols,
            notes: BTreeMap::new(),
        }
    }

    /// Derives the puzzle whose unique trivial solution is `grid`.
    ///
    /// # Errors
    ///
    /// Fails on the first `Blank`/`Both` cell; rules can only be read off a
    /// fully-determined grid.
    pub fn from_grid(grid: &Grid) -> Result<Self, GridError> {
        let mut rows = Vec::with_capacity(grid.height());
        for y in 0..grid.height() {
            let rule = rule::runs_of(grid.row(y).iter().copied()).ok_or_else(|| {
                let x = grid.row(y).iter().position(|c| !c.is_known()).unwrap_or(0);
                GridError::Indeterminate { x, y }
            })?;
            rows.push(rule);
        }
        let mut cols = Vec::with_capacity(grid.width());
        for x in 0..grid.width() {
            let rule = rule::runs_of(grid.column(x)).ok_or_else(|| {
                let y = grid.column(x).position(|c| !c.is_known()).unwrap_or(0);
                GridError::Indeterminate { x, y }
            })?;
            cols.push(rule);
        }
        Ok(Puzzle::new(rows, cols))
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.cols.len()
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn rows(&self) -> &[Rule] {
        &self.rows
    }

    #[must_use]
    pub fn cols(&self) -> &[Rule] {
        &self.cols
    }

    #[must_use]
    pub fn row(&self, y: usize) -> &Rule {
        &self.rows[y]
    }

    #[must_use]
    pub fn col(&self, x: usize) -> &Rule {
        &self.cols[x]
    }

    /// The longest rule in either dimension, at least 1.
    #[must_use]
    pub fn max_rule_len(&self) -> usize {
        self.rows
            .iter()
            .chain(&self.cols)
            .map(Rule::len)
            .max()
            .unwrap_or(0)
            .max(1)
    }

    /// Sum of row block lengths minus sum of column block lengths; zero for
    /// any well-formed puzzle.
    #[must_use]
    pub fn verify(&self) -> i64 {
        let rows: i64 = self.rows.iter().map(|r| r.solid_total() as i64).sum();
        let cols: i64 = self.cols.iter().map(|r| r.solid_total() as i64).sum();
        rows - cols
    }

    /// True if every fully-determined line of `grid` satisfies its rule.
    /// Indeterminate lines are not counted against the grid.
    #[must_use]
    pub fn check_grid(&self, grid: &Grid) -> bool {
        for (x, rule) in self.cols.iter().enumerate() {
            if rule::check_line(rule, grid.column(x)) == LineCheck::Mismatch {
                return false;
            }
        }
        for (y, rule) in self.rows.iter().enumerate() {
            if rule::check_line(rule, grid.row(y).iter().copied()) == LineCheck::Mismatch {
                return false;
            }
        }
        true
    }

    /// A difficulty estimate derived from rule density: roughly, how little
    /// of the grid the clues pin down directly, scaled by the grid area.
    /// Returns `0.0` for a blank puzzle and `f64::INFINITY` when the row and
    /// column totals disagree (no solution can exist).
    #[must_use]
    pub fn judge(&self) -> f64 {
        let mut row_needed = 0i64;
        let mut row_known = 0i64;
        for rule in &self.rows {
            row_needed += rule.solid_total() as i64;
            row_known += rule::density_score(rule, self.width());
        }
        let mut col_needed = 0i64;
        let mut col_known = 0i64;
        for rule in &self.cols {
            col_needed += rule.solid_total() as i64;
            col_known += rule::density_score(rule, self.height());
        }

        let area = (self.width() * self.height()) as f64;
        if row_needed != col_needed {
            f64::INFINITY
        } else if row_needed == 0 {
            0.0
        } else {
            let known = (col_known + row_known) as f64 / 2.0 / row_needed as f64;
            (1.0 - known) * area
        }
    }

    /// Orders puzzles by dimensions, then column rules, then row rules.
    /// Notes do not participate.
    #[must_use]
    pub fn compare(&self, other: &Puzzle) -> Ordering {
        self.width()
            .cmp(&other.width())
            .then_with(|| self.height().cmp(&other.height()))
            .then_with(|| self.cols.cmp(&other.cols))
            .then_with(|| self.rows.cmp(&other.rows))
    }

    #[must_use]
    pub fn note(&self, name: &str) -> Option<&str> {
        self.notes.get(name).map(String::as_str)
    }

    pub fn set_note(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.notes.insert(name.into(), value.into());
    }

    pub fn unset_note(&mut self, name: &str) -> Option<String> {
        self.notes.remove(name)
    }

    /// Notes in name order.
    pub fn notes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.notes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.note("title")
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.set_note("title", title);
    }
}
