use std::sync::Arc;

use log::warn;

use super::host::{StepInfo, VariableStore};
use crate::config::StepDepth;

/// One live level of the interpreter's nesting.
#[derive(Clone)]
pub enum CallEntry {
    Container {
        name: String,
        source: String,
    },
    Scenario {
        name: String,
        source: String,
        line: u32,
    },
    Step {
        step: Arc<dyn StepInfo>,
        variables: Arc<dyn VariableStore>,
        source: String,
        line: u32,
    },
}

impl CallEntry {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Container { .. } => "container",
            Self::Scenario { .. } => "scenario",
            Self::Step { .. } => "step",
        }
    }

    pub fn is_step(&self) -> bool {
        matches!(self, Self::Step { .. })
    }
}

impl std::fmt::Debug for CallEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Container { name, source } => f
                .debug_struct("Container")
                .field("name", name)
                .field("source", source)
                .finish(),
            Self::Scenario { name, source, line } => f
                .debug_struct("Scenario")
                .field("name", name)
                .field("source", source)
                .field("line", line)
                .finish(),
            Self::Step { source, line, .. } => f
                .debug_struct("Step")
                .field("source", source)
                .field("line", line)
                .finish_non_exhaustive(),
        }
    }
}

/// Live chain of entries, outermost first. Only the worker thread mutates it.
#[derive(Debug, Default)]
pub struct CallHierarchy {
    entries: Vec<CallEntry>,
    steps: usize,
}

impl CallHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: CallEntry) {
        if entry.is_step() {
            self.steps += 1;
        }
        self.entries.push(entry);
    }

    /// Pop the innermost entry. `expected` is the kind the exit hook thinks it
    /// is closing; a mismatch is logged but the pop still happens.
    pub fn pop(&mut self, expected: &str) -> Option<CallEntry> {
        let Some(entry) = self.entries.pop() else {
            warn!("Exit of {} with an empty call hierarchy", expected);
            return None;
        };
        if entry.is_step() {
            self.steps -= 1;
        }
        if entry.kind_name() != expected {
            warn!(
                "Exit of {} popped a {} entry; hooks are out of order",
                expected,
                entry.kind_name()
            );
        }
        Some(entry)
    }

    pub fn depth(&self) -> usize {
        self.entries.len()
    }

    pub fn stepping_depth(&self, mode: StepDepth) -> usize {
        match mode {
            StepDepth::AllEntries => self.entries.len(),
            StepDepth::StepsOnly => self.steps,
        }
    }

    /// Copy of the live chain, innermost first.
    pub fn snapshot_for_pause(&self) -> Vec<CallEntry> {
        self.entries.iter().rev().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn container(name: &str) -> CallEntry {
        CallEntry::Container {
            name: name.to_string(),
            source: "suite.robot".to_string(),
        }
    }

    fn scenario(name: &str, line: u32) -> CallEntry {
        CallEntry::Scenario {
            name: name.to_string(),
            source: "suite.robot".to_string(),
            line,
        }
    }

    #[test]
    fn test_snapshot_is_innermost_first() {
        let mut hierarchy = CallHierarchy::new();
        hierarchy.push(container("Suite"));
        hierarchy.push(scenario("Login", 4));

        let entries = hierarchy.snapshot_for_pause();
        assert_eq!(entries.len(), 2);
        assert!(matches!(&entries[0], CallEntry::Scenario { name, .. } if name == "Login"));
        assert!(matches!(&entries[1], CallEntry::Container { name, .. } if name == "Suite"));
    }

    #[test]
    fn test_pop_on_empty_is_noop() {
        let mut hierarchy = CallHierarchy::new();
        assert!(hierarchy.pop("step").is_none());
        assert_eq!(hierarchy.depth(), 0);
    }

    #[test]
    fn test_mismatched_pop_still_pops() {
        let mut hierarchy = CallHierarchy::new();
        hierarchy.push(container("Suite"));
        let popped = hierarchy.pop("scenario");
        assert!(matches!(popped, Some(CallEntry::Container { .. })));
        assert_eq!(hierarchy.depth(), 0);
    }

    #[test]
    fn test_steps_only_depth_ignores_containers() {
        let mut hierarchy = CallHierarchy::new();
        hierarchy.push(container("Suite"));
        hierarchy.push(scenario("Login", 4));
        assert_eq!(hierarchy.stepping_depth(StepDepth::AllEntries), 2);
        assert_eq!(hierarchy.stepping_depth(StepDepth::StepsOnly), 0);
    }

    proptest! {
        #[test]
        fn depth_tracks_pushes_minus_pops(ops in proptest::collection::vec(any::<bool>(), 0..64)) {
            let mut hierarchy = CallHierarchy::new();
            let mut expected = 0usize;
            for push in ops {
                if push {
                    hierarchy.push(container("Suite"));
                    expected += 1;
                } else if expected > 0 {
                    hierarchy.pop("container");
                    expected -= 1;
                }
                prop_assert_eq!(hierarchy.depth(), expected);
                prop_assert_eq!(hierarchy.snapshot_for_pause().len(), expected);
            }
        }
    }
}
