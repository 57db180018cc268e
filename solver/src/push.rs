//! The push primitive: the extreme leftward placement of a line's blocks
//! under its current cell constraints. Pushing the reversed line with the
//! reversed rule yields the extreme rightward placement, so every strategy
//! that needs both extremes goes through this one routine.

use itertools::Itertools;
use log::{Level, log_enabled, trace};
use nonogram_core::Cell;

use crate::line::LineLog;

/// A forward view of a slice that may be read back to front. Reversal is a
/// flag here, never index arithmetic at the call sites.
#[derive(Clone, Copy)]
pub(crate) struct Tape<'a, T> {
    data: &'a [T],
    reversed: bool,
}

impl<'a, T: Copy> Tape<'a, T> {
    pub(crate) fn new(data: &'a [T], reversed: bool) -> Self {
        Tape { data, reversed }
    }

    pub(crate) fn len(&self) -> usize {
        self.data.len()
    }

    pub(crate) fn get(&self, i: usize) -> T {
        if self.reversed {
            self.data[self.data.len() - 1 - i]
        } else {
            self.data[i]
        }
    }
}

/// Places every block of `rule` as far towards the start of `line` as it
/// will go: blocks stay in order with at least one gap, no dot is covered,
/// and no solid is left outside a block. Returns `false` if the line admits
/// no such placement.
///
/// `pos[i]` receives the start of block `i`; `solid[i]` is scratch space
/// recording the offset within block `i` of the left-most solid it covers.
/// With `reversed` set, both views read back to front and the positions are
/// expressed in the reversed coordinate system.
pub fn push(
    line: &[Cell],
    rule: &[usize],
    reversed: bool,
    pos: &mut [usize],
    solid: &mut [Option<usize>],
    log: LineLog,
) -> bool {
    let line = Tape::new(line, reversed);
    let rule = Tape::new(rule, reversed);
    push_tapes(line, rule, pos, solid, log)
}

pub(crate) fn push_tapes(
    line: Tape<'_, Cell>,
    rule: Tape<'_, usize>,
    pos: &mut [usize],
    solid: &mut [Option<usize>],
    log: LineLog,
) -> bool {
    let len = line.len();

    if log.level > 1 && log_enabled!(Level::Trace) {
        let rule_text = (0..rule.len()).map(|b| rule.get(b)).join(" ");
        let line_text: String = (0..len).map(|i| line.get(i).glyph()).collect();
        trace!("{:ind$}Pushing rule: {rule_text}", "", ind = log.indent);
        trace!("{:ind$}Pushing line: >{line_text}<", "", ind = log.indent);
    }

    // With no blocks to place there is nothing to cover stray solids.
    if rule.len() == 0 {
        return (0..len).all(|i| line.get(i) != Cell::Solid);
    }

    pos[0] = 0;
    let mut block = 0;
    while block < rule.len() {
        let rulev = rule.get(block);
        let mut posv = pos[block];

        // Find the first position past leading dots where the block still
        // fits on the line.
        while posv + rulev < len && line.get(posv) == Cell::Dot {
            posv += 1;
        }
        pos[block] = posv;
        if posv + rulev > len || line.get(posv) == Cell::Dot {
            return false;
        }

        // Scan the block's span for a dot, noting the first covered solid.
        solid[block] = None;
        let mut i = 0;
        while i < rulev && line.get(posv + i) != Cell::Dot {
            if solid[block].is_none() && line.get(posv + i) == Cell::Solid {
                solid[block] = Some(i);
            }
            i += 1;
        }

        if i < rulev {
            // A dot lies under the block.
            if let Some(own) = solid[block] {
                // A solid is covered before the dot, so this block cannot
                // jump it; some earlier block must come up for the solid.
                match pull_back(rule, pos, solid, block, posv + own) {
                    Some(earlier) => block = earlier,
                    None => return false,
                }
                continue;
            }
            // Nothing covered yet: resume just past the dot.
            pos[block] = posv + i;
            continue;
        }

        // Shuffle right while a solid touches the block's end, as long as
        // that exposes no solid at the start.
        let mut posv = pos[block];
        if posv + rulev < len && line.get(posv + rulev) == Cell::Solid && solid[block].is_none() {
            solid[block] = Some(rulev);
        }
        while posv + rulev < len
            && line.get(posv + rulev) == Cell::Solid
            && line.get(posv) != Cell::Solid
        {
            posv += 1;
            solid[block] = solid[block].map(|s| s - 1);
        }
        pos[block] = posv;

        if posv + rulev < len && line.get(posv + rulev) == Cell::Solid {
            // Still a solid hard against the end: the block is stretched
            // between two solids it cannot span.
            let own = pos[block] + solid[block].unwrap_or(0);
            match pull_back(rule, pos, solid, block, own) {
                Some(earlier) => block = earlier,
                None => return false,
            }
            continue;
        }

        // The block is in place; move on.
        let next = pos[block] + rulev + 1;
        if block + 1 < rule.len() {
            block += 1;
            pos[block] = next;
        } else {
            // Final block: nothing beyond it may be solid.
            let mut p = next;
            while p < len && line.get(p) != Cell::Solid {
                p += 1;
            }
            if p < len {
                if let Some(own) = solid[block] {
                    if p + 1 > pos[block] + own + rulev {
                        // Covering the trailing solid would expose our own.
                        match pull_back(rule, pos, solid, block, pos[block] + own) {
                            Some(earlier) => block = earlier,
                            None => return false,
                        }
                        continue;
                    }
                }
                pos[block] = p + 1 - rulev;
                continue;
            }
            block += 1;
        }
    }
    true
}

/// Walks back from `block` to the nearest earlier block that can be moved
/// up to cover the solid at absolute position `chase` without exposing a
/// solid of its own, repositions it, and returns its index. `None` means no
/// block can do it and the line is infeasible.
fn pull_back(
    rule: Tape<'_, usize>,
    pos: &mut [usize],
    solid: &[Option<usize>],
    mut block: usize,
    mut chase: usize,
) -> Option<usize> {
    loop {
        if block == 0 {
            return None;
        }
        block -= 1;
        match solid[block] {
            None => break,
            Some(own) => {
                let own_abs = pos[block] + own;
                if chase + 1 <= own_abs + rule.get(block) {
                    break;
                }
                chase = own_abs;
            }
        }
    }
    pos[block] = (chase + 1).checked_sub(rule.get(block))?;
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(text: &str) -> Vec<Cell> {
        text.chars()
            .map(|c| match c {
                '#' => Cell::Solid,
                '-' => Cell::Dot,
                _ => Cell::Blank,
            })
            .collect()
    }

    fn run(line: &str, rule: &[usize]) -> Option<Vec<usize>> {
        let line = cells(line);
        let mut pos = vec![0; rule.len()];
        let mut solid = vec![None; rule.len()];
        push(&line, rule, false, &mut pos, &mut solid, LineLog::default()).then_some(pos)
    }

    fn run_rev(line: &str, rule: &[usize]) -> Option<Vec<usize>> {
        let line = cells(line);
        let mut pos = vec![0; rule.len()];
        let mut solid = vec![None; rule.len()];
        push(&line, rule, true, &mut pos, &mut solid, LineLog::default()).then_some(pos)
    }

    #[test]
    fn blank_line_packs_left() {
        assert_eq!(run("          ", &[3, 2]), Some(vec![0, 4]));
    }

    #[test]
    fn dots_are_skipped() {
        assert_eq!(run("--        ", &[3]), Some(vec![2]));
        assert_eq!(run("  -       ", &[3]), Some(vec![3]));
    }

    #[test]
    fn solids_drag_blocks_right() {
        // The block must cover the lone solid.
        assert_eq!(run("   #   ", &[3]), Some(vec![1]));
        // A trailing solid pulls the final block onto it.
        assert_eq!(run("      #", &[2]), Some(vec![5]));
    }

    #[test]
    fn earlier_block_pulled_up() {
        // The second block hits a dot with a covered solid; the first must
        // come up to cover that solid instead.
        assert_eq!(run("   ##-    ", &[2, 3]), Some(vec![3, 6]));
    }

    #[test]
    fn infeasible_lines() {
        assert!(run("-#-#-", &[3]).is_none());
        assert!(run("##", &[1]).is_none());
        assert!(run("   ", &[4]).is_none());
        assert!(run("#--#", &[1]).is_none());
        // Two spaced solids and a dot leave nowhere for two blocks of two.
        assert!(run("  # #-   ", &[2, 2]).is_none());
    }

    #[test]
    fn empty_rule() {
        assert_eq!(run("----", &[]), Some(vec![]));
        assert_eq!(run("    ", &[]), Some(vec![]));
        assert!(run(" # ", &[]).is_none());
    }

    #[test]
    fn reversed_mirrors_forward() {
        // Pushing the mirror image right is pushing the original left.
        assert_eq!(run_rev("   #   ", &[3]), run("   #   ", &[3]));
        assert_eq!(run_rev("--     ", &[2]), run("     --", &[2]));
    }

    #[test]
    fn postconditions_hold() {
        let line = cells("  # -  #  ");
        let rule = [2usize, 3];
        let mut pos = vec![0; 2];
        let mut solid = vec![None; 2];
        assert!(push(
            &line,
            &rule,
            false,
            &mut pos,
            &mut solid,
            LineLog::default()
        ));
        // Blocks in order with gaps, on the line.
        assert!(pos[0] + rule[0] + 1 <= pos[1]);
        assert!(pos[1] + rule[1] <= line.len());
        // No dot covered, no solid outside a block.
        for (i, &cell) in line.iter().enumerate() {
            let inside = (0..2).any(|b| i >= pos[b] && i < pos[b] + rule[b]);
            if inside {
                assert_ne!(cell, Cell::Dot);
            } else {
                assert_ne!(cell, Cell::Solid);
            }
        }
    }
}
