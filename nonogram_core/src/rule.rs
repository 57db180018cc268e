use std::fmt;

use itertools::Itertools;

use crate::cell::Cell;

/// The clue for one line: an ordered sequence of strictly positive block
/// lengths. An empty rule means the line is all dots.
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rule {
    blocks: Vec<usize>,
}

impl Rule {
    #[must_use]
    pub fn new(blocks: Vec<usize>) -> Self {
        Rule { blocks }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[must_use]
    pub fn blocks(&self) -> &[usize] {
        &self.blocks
    }

    #[must_use]
    pub fn block(&self, i: usize) -> usize {
        self.blocks[i]
    }

    /// Total number of solid cells the rule demands.
    #[must_use]
    pub fn solid_total(&self) -> usize {
        self.blocks.iter().sum()
    }

    /// The shortest line this rule fits on: all blocks plus one-cell gaps.
    #[must_use]
    pub fn min_span(&self) -> usize {
        self.solid_total() + self.blocks.len().saturating_sub(1)
    }
}

impl From<Vec<usize>> for Rule {
    fn from(blocks: Vec<usize>) -> Self {
        Rule::new(blocks)
    }
}

impl FromIterator<usize> for Rule {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        Rule::new(iter.into_iter().collect())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.blocks.is_empty() {
            f.write_str("0")
        } else {
            write!(f, "{}", self.blocks.iter().join(","))
        }
    }
}

/// Outcome of validating a line against its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineCheck {
    /// Every cell determined and the solid runs equal the rule in order.
    Match,
    /// A determined line that deviates from the rule.
    Mismatch,
    /// At least one cell is still `Blank` or `Both`.
    Indeterminate,
}

/// Validates a fully-determined line against `rule`.
pub fn check_line<I>(rule: &Rule, cells: I) -> LineCheck
where
    I: IntoIterator<Item = Cell>,
{
    let mut block = 0;
    let mut run = 0usize;
    for cell in cells {
        match cell {
            Cell::Solid => {
                if run == 0 && block >= rule.len() {
                    return LineCheck::Mismatch;
                }
                run += 1;
                if run > rule.block(block) {
                    return LineCheck::Mismatch;
                }
            }
            Cell::Dot => {
                if run > 0 {
                    if run != rule.block(block) {
                        return LineCheck::Mismatch;
                    }
                    block += 1;
                    run = 0;
                }
            }
            Cell::Blank | Cell::Both => return LineCheck::Indeterminate,
        }
    }
    if run > 0 {
        if run != rule.block(block) {
            return LineCheck::Mismatch;
        }
        block += 1;
    }
    if block == rule.len() {
        LineCheck::Match
    } else {
        LineCheck::Mismatch
    }
}

/// Extracts the run-length rule from a fully-determined line, or `None` if
/// any cell is still indeterminate.
pub fn runs_of<I>(cells: I) -> Option<Rule>
where
    I: IntoIterator<Item = Cell>,
{
    let mut blocks = Vec::new();
    let mut run = 0usize;
    for cell in cells {
        match cell {
            Cell::Solid => run += 1,
            Cell::Dot => {
                if run > 0 {
                    blocks.push(run);
                    run = 0;
                }
            }
            Cell::Blank | Cell::Both => return None,
        }
    }
    if run > 0 {
        blocks.push(run);
    }
    Some(Rule::new(blocks))
}

/// The rule-density score shared by the line heuristic and puzzle judging:
/// `solids * (k + 1) + k * (k - L - 1)` for a rule of `k` blocks on a line
/// of length `len`.
#[must_use]
pub fn density_score(rule: &Rule, len: usize) -> i64 {
    let k = rule.len() as i64;
    let solids = rule.solid_total() as i64;
    solids * (k + 1) + k * (k - len as i64 - 1)
}
