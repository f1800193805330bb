//! Breakpoint registry
//!
//! Per-session breakpoints, kept sorted by file then line with at most one
//! entry per `(file, line)`. Matching is always by location; the back-end
//! `id` never identifies a breakpoint.

use std::sync::Arc;

use super::action::Action;
use super::state::{Breakpoint, BreakpointState};

/// Position of the breakpoint at `(file, line)`
pub fn index_of(breakpoints: &[Breakpoint], file: &str, line: u32) -> Option<usize> {
    breakpoints.iter().position(|bp| bp.is_at(file, line))
}

fn sort(breakpoints: &mut [Breakpoint]) {
    breakpoints.sort_by(|a, b| a.file.cmp(&b.file).then(a.line.cmp(&b.line)));
}

/// Reset every breakpoint to `NotStarted`, dropping back-end metadata.
/// Returns the same allocation when nothing would change.
fn reset(state: &Arc<Vec<Breakpoint>>) -> Arc<Vec<Breakpoint>> {
    let clean = state
        .iter()
        .all(|bp| bp.state == BreakpointState::NotStarted && bp.id.is_none() && bp.message.is_none());
    if clean {
        return Arc::clone(state);
    }
    Arc::new(
        state
            .iter()
            .map(|bp| Breakpoint::new(bp.file.clone(), bp.line, BreakpointState::NotStarted))
            .collect(),
    )
}

/// Breakpoint sub-reducer
pub fn reduce(state: &Arc<Vec<Breakpoint>>, action: &Action) -> Arc<Vec<Breakpoint>> {
    match action {
        Action::AddBreakpoint { bp, .. } => {
            let mut next = state.as_ref().clone();
            match index_of(state, &bp.file, bp.line) {
                Some(index) => next[index] = bp.clone(),
                None => {
                    next.push(bp.clone());
                    sort(&mut next);
                }
            }
            Arc::new(next)
        }

        Action::RemoveBreakpoint { bp, .. } => {
            let Some(index) = index_of(state, &bp.file, bp.line) else {
                return Arc::clone(state);
            };
            let mut next = state.as_ref().clone();
            if bp.state == BreakpointState::Removed {
                next.remove(index);
            } else {
                next[index] = bp.clone();
            }
            Arc::new(next)
        }

        Action::UpdateBreakpointLine {
            file,
            line,
            new_line,
            ..
        } => {
            let Some(index) = index_of(state, file, *line) else {
                return Arc::clone(state);
            };
            if line == new_line {
                return Arc::clone(state);
            }
            let mut next = state.as_ref().clone();
            if index_of(state, file, *new_line).is_some() {
                // another breakpoint already sits on the target line
                next.remove(index);
            } else {
                next[index].line = *new_line;
                sort(&mut next);
            }
            Arc::new(next)
        }

        Action::Stop { .. } | Action::RemoveDebugger { .. } | Action::InitStore => reset(state),

        _ => Arc::clone(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(state: &Arc<Vec<Breakpoint>>, file: &str, line: u32, bp_state: BreakpointState) -> Arc<Vec<Breakpoint>> {
        reduce(
            state,
            &Action::AddBreakpoint {
                name: "py".to_string(),
                bp: Breakpoint::new(file, line, bp_state),
            },
        )
    }

    fn remove(state: &Arc<Vec<Breakpoint>>, file: &str, line: u32, bp_state: BreakpointState) -> Arc<Vec<Breakpoint>> {
        reduce(
            state,
            &Action::RemoveBreakpoint {
                name: "py".to_string(),
                bp: Breakpoint::new(file, line, bp_state),
            },
        )
    }

    fn locations(state: &[Breakpoint]) -> Vec<(&str, u32)> {
        state.iter().map(|bp| (bp.file.as_str(), bp.line)).collect()
    }

    #[test]
    fn test_add_keeps_sorted_and_unique() {
        let mut state = Arc::new(Vec::new());
        for (file, line) in [("/b.py", 3), ("/a.py", 10), ("/a.py", 2), ("/b.py", 3), ("/a.py", 10)] {
            state = add(&state, file, line, BreakpointState::NotStarted);
        }
        assert_eq!(locations(&state), vec![("/a.py", 2), ("/a.py", 10), ("/b.py", 3)]);
    }

    #[test]
    fn test_line_order_is_numeric() {
        let mut state = Arc::new(Vec::new());
        for line in [100, 9, 20] {
            state = add(&state, "/a.py", line, BreakpointState::NotStarted);
        }
        assert_eq!(locations(&state), vec![("/a.py", 9), ("/a.py", 20), ("/a.py", 100)]);
    }

    #[test]
    fn test_add_existing_replaces_whole_entry() {
        let state = Arc::new(vec![Breakpoint::invalid("/a.py", 1, "denied".to_string())]);
        let next = add(&state, "/a.py", 1, BreakpointState::Busy);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].state, BreakpointState::Busy);
        assert_eq!(next[0].message, None);
    }

    #[test]
    fn test_remove_only_deletes_on_removed_state() {
        let state = add(&Arc::new(Vec::new()), "/a.py", 1, BreakpointState::Valid);

        let busy = remove(&state, "/a.py", 1, BreakpointState::Busy);
        assert_eq!(busy[0].state, BreakpointState::Busy);

        let invalid = remove(&busy, "/a.py", 1, BreakpointState::Invalid);
        assert_eq!(invalid.len(), 1);
        assert_eq!(invalid[0].state, BreakpointState::Invalid);

        let removed = remove(&invalid, "/a.py", 1, BreakpointState::Removed);
        assert!(removed.is_empty());
    }

    #[test]
    fn test_remove_missing_is_identity() {
        let state = add(&Arc::new(Vec::new()), "/a.py", 1, BreakpointState::Valid);
        let next = remove(&state, "/a.py", 2, BreakpointState::Removed);
        assert!(Arc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_stop_resets_state_and_drops_id() {
        let state = Arc::new(vec![
            Breakpoint::valid("/a.py", 1, "7".to_string()),
            Breakpoint::invalid("/a.py", 2, "denied".to_string()),
        ]);
        let next = reduce(&state, &Action::Stop { name: "py".to_string() });
        assert_eq!(
            *next,
            vec![
                Breakpoint::new("/a.py", 1, BreakpointState::NotStarted),
                Breakpoint::new("/a.py", 2, BreakpointState::NotStarted),
            ]
        );
        // already clean: no new allocation
        let again = reduce(&next, &Action::Stop { name: "py".to_string() });
        assert!(Arc::ptr_eq(&next, &again));
    }

    #[test]
    fn test_update_line_resorts_and_merges() {
        let mut state = Arc::new(Vec::new());
        for line in [1, 5, 9] {
            state = add(&state, "/a.py", line, BreakpointState::NotStarted);
        }
        let moved = reduce(
            &state,
            &Action::UpdateBreakpointLine {
                name: "py".to_string(),
                file: "/a.py".to_string(),
                line: 1,
                new_line: 7,
            },
        );
        assert_eq!(locations(&moved), vec![("/a.py", 5), ("/a.py", 7), ("/a.py", 9)]);

        let merged = reduce(
            &moved,
            &Action::UpdateBreakpointLine {
                name: "py".to_string(),
                file: "/a.py".to_string(),
                line: 5,
                new_line: 9,
            },
        );
        assert_eq!(locations(&merged), vec![("/a.py", 7), ("/a.py", 9)]);
    }

    #[test]
    fn test_unrelated_action_is_identity() {
        let state = add(&Arc::new(Vec::new()), "/a.py", 1, BreakpointState::Valid);
        let next = reduce(&state, &Action::CleanOutput);
        assert!(Arc::ptr_eq(&state, &next));
    }
}
