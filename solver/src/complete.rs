//! The complete strategy: depth-first enumeration of every legal placement,
//! merging each one into the result. Exact but slow, so it cooperates: one
//! `step` is one block advance or one full placement.

use log::{Level, log_enabled, trace};
use nonogram_core::{Cell, LineCheck, Rule, check_line};

use crate::line::{
    LineSolver, LineTask, Limits, Req, StrategyState, Workspace, effective_rule,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Complete;

/// Enumeration state across `step` calls. Block positions and their upper
/// bounds live in the workspace position arena, split as `pos` then
/// `limit`.
#[derive(Debug, Default)]
pub(crate) struct CompleteState {
    block: usize,
    remunk: usize,
    move_back: bool,
}

impl LineSolver for Complete {
    fn prep(&self, lim: &Limits, req: &mut Req) {
        req.positions += lim.max_rule * 2;
    }

    fn init(&self, ws: &mut Workspace, task: &mut LineTask) -> bool {
        let rule = effective_rule(task.rule);
        let len = task.len();
        let k = rule.len();

        task.result.copy_from_slice(task.line);
        let remunk = task.line.iter().filter(|&&c| c == Cell::Blank).count();

        if remunk == 0 {
            // Fully determined already; enumeration degenerates to a check.
            let rule = Rule::new(rule.to_vec());
            *task.fits = usize::from(matches!(
                check_line(&rule, task.line.iter().copied()),
                LineCheck::Match
            ));
            return false;
        }
        *task.fits = 0;

        let (pos, rest) = ws.positions.split_at_mut(k);
        let limit = &mut rest[..k];
        if k > 0 {
            pos[0] = 0;
            // Upper bounds per block; a bound falling off the line means
            // the rule cannot fit at all.
            let mut bound = len as i64 - rule[k - 1] as i64 + 1;
            for b in (0..k).rev() {
                if b < k - 1 {
                    bound = limit[b + 1] as i64 - rule[b] as i64 - 1;
                }
                if bound < 1 {
                    return false;
                }
                limit[b] = bound as usize;
            }
        }

        ws.state = StrategyState::Complete(CompleteState {
            block: 0,
            remunk,
            move_back: false,
        });
        true
    }

    fn step(&self, ws: &mut Workspace, task: &mut LineTask) -> bool {
        let rule = effective_rule(task.rule);
        let len = task.len();
        let k = rule.len();
        let (pos, rest) = ws.positions.split_at_mut(k);
        let limit = &rest[..k];
        let StrategyState::Complete(st) = &mut ws.state else {
            return false;
        };
        let line = task.line;

        if st.move_back || st.remunk == 0 {
            st.move_back = false;
            if st.block == 0 {
                return false;
            }
            st.block -= 1;
            if st.remunk == 0 || line[pos[st.block]] == Cell::Solid {
                // Sliding this block right would abandon a solid (or there
                // is nothing left to learn); keep unwinding.
                st.move_back = true;
                return true;
            }
            pos[st.block] += 1;
        }

        if st.block == k {
            // Every block has a tentative position; any solid beyond the
            // last one vetoes the placement.
            let mut p = if k > 0 { pos[k - 1] + rule[k - 1] + 1 } else { 0 };
            while p < len {
                if line[p] == Cell::Solid {
                    st.move_back = true;
                    return true;
                }
                p += 1;
            }

            if task.log.level > 1 && log_enabled!(Level::Trace) {
                trace!(
                    "{:ind$}   Fit: >{}<",
                    "",
                    render_placement(len, rule, pos),
                    ind = task.log.indent
                );
            }

            merge(task.result, len, &mut st.remunk, rule, pos);
            *task.fits += 1;
            st.move_back = true;
            return true;
        }

        // Find the first non-dot position within this block's limit.
        while pos[st.block] < limit[st.block] && line[pos[st.block]] == Cell::Dot {
            pos[st.block] += 1;
        }
        if pos[st.block] >= limit[st.block] {
            st.move_back = true;
            return true;
        }

        // Look for a covered dot, noting any solid before it.
        let mut dot = pos[st.block];
        let mut covered_solid = false;
        let mut last = pos[st.block] + rule[st.block];
        while dot < last && line[dot] != Cell::Dot {
            covered_solid = covered_solid || line[dot] == Cell::Solid;
            dot += 1;
        }

        if dot < last {
            if covered_solid {
                // A solid and then a dot under one block: dead end.
                st.move_back = true;
            } else {
                pos[st.block] = dot + 1;
            }
            return true;
        }

        // Shuffle right while a solid touches the block's end and none
        // shows at its start.
        while pos[st.block] < limit[st.block] - 1
            && last < len
            && line[last] == Cell::Solid
            && line[pos[st.block]] != Cell::Solid
        {
            last += 1;
            pos[st.block] += 1;
        }

        if last < len && line[last] == Cell::Solid {
            pos[st.block] += 1;
            st.move_back = true;
            return true;
        }

        st.block += 1;
        if st.block < k {
            pos[st.block] = last + 1;
        }
        true
    }

    fn term(&self, ws: &mut Workspace) {
        ws.state = StrategyState::Idle;
    }
}

/// ORs one placement into the result: dots outside blocks, solids inside.
/// Each previously-open cell that reaches `Both` means one less cell this
/// line can ever say anything about.
fn merge(result: &mut [Cell], len: usize, remunk: &mut usize, rule: &[usize], pos: &[usize]) {
    let mut i = 0;
    let mut or_into = |result: &mut [Cell], i: usize, v: Cell, remunk: &mut usize| {
        let old = result[i];
        result[i] |= v;
        if result[i] == Cell::Both && old != Cell::Both {
            *remunk -= 1;
        }
    };
    for (b, &width) in rule.iter().enumerate() {
        while i < pos[b] {
            or_into(result, i, Cell::Dot, remunk);
            i += 1;
        }
        while i < pos[b] + width {
            or_into(result, i, Cell::Solid, remunk);
            i += 1;
        }
    }
    while i < len {
        or_into(result, i, Cell::Dot, remunk);
        i += 1;
    }
}

fn render_placement(len: usize, rule: &[usize], pos: &[usize]) -> String {
    let mut out = vec!['-'; len];
    for (b, &width) in rule.iter().enumerate() {
        for cell in &mut out[pos[b]..pos[b] + width] {
            *cell = '#';
        }
    }
    out.into_iter().collect()
}
