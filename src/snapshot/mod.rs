//! Inspectable view of the call hierarchy, frozen at the start of a pause.

mod frames;
mod render;

use std::collections::HashMap;
use std::sync::Arc;

use log::{debug, warn};

pub use frames::{
    FrameId, FrameKind, FrameView, IdAllocator, Scope, SourceRef, Variable, VariablesReference,
};
pub use render::render_value;

use crate::debugger::{CallEntry, StepInfo, VariableStore};

/// What a frame id resolves to.
pub enum FrameInfo {
    Container,
    Scenario,
    Step {
        step: Arc<dyn StepInfo>,
        variables: Arc<dyn VariableStore>,
        scopes: Vec<Scope>,
    },
}

impl FrameInfo {
    pub fn kind(&self) -> FrameKind {
        match self {
            Self::Container => FrameKind::Container,
            Self::Scenario => FrameKind::Scenario,
            Self::Step { .. } => FrameKind::Step,
        }
    }
}

/// Deferred computation behind a variables reference.
enum ScopeSource {
    Arguments(Arc<dyn StepInfo>),
    Variables(Arc<dyn VariableStore>),
}

impl ScopeSource {
    fn compute(&self, max_value_len: usize) -> Vec<Variable> {
        match self {
            Self::Arguments(step) => render::render_args(step.as_ref(), max_value_len),
            Self::Variables(store) => render::render_variables(store.as_ref(), max_value_len),
        }
    }
}

/// Frames of one pause. `frames[0]` is the innermost (topmost) frame.
pub struct StackSnapshot {
    frames: Vec<FrameView>,
    frame_info: HashMap<FrameId, FrameInfo>,
    references: HashMap<VariablesReference, ScopeSource>,
    max_value_len: usize,
}

impl StackSnapshot {
    /// Build a snapshot from `entries`, innermost first.
    pub fn build(entries: &[CallEntry], ids: &IdAllocator, max_value_len: usize) -> Self {
        let mut snapshot = Self {
            frames: Vec::with_capacity(entries.len()),
            frame_info: HashMap::with_capacity(entries.len()),
            references: HashMap::new(),
            max_value_len,
        };

        for entry in entries {
            let frame_id = ids.next_id();
            match entry {
                CallEntry::Container { name, source } => {
                    snapshot.push_frame(
                        frame_id,
                        format!("Container: {}", name),
                        source,
                        1,
                        FrameInfo::Container,
                    );
                }
                CallEntry::Scenario { name, source, line } => {
                    snapshot.push_frame(
                        frame_id,
                        format!("Scenario: {}", name),
                        source,
                        *line,
                        FrameInfo::Scenario,
                    );
                }
                CallEntry::Step {
                    step,
                    variables,
                    source,
                    line,
                } => {
                    let name = step_display_name(step.as_ref());
                    let scopes = snapshot.register_step_scopes(step, variables, ids);
                    snapshot.push_frame(
                        frame_id,
                        name,
                        source,
                        (*line).max(1),
                        FrameInfo::Step {
                            step: step.clone(),
                            variables: variables.clone(),
                            scopes,
                        },
                    );
                }
            }
        }

        debug!("Built stack snapshot with {} frames", snapshot.frames.len());
        snapshot
    }

    fn push_frame(&mut self, id: FrameId, name: String, source: &str, line: u32, info: FrameInfo) {
        self.frames.push(FrameView {
            id,
            name,
            source: SourceRef::from_path(source),
            line,
            column: 0,
            kind: info.kind(),
        });
        self.frame_info.insert(id, info);
    }

    fn register_step_scopes(
        &mut self,
        step: &Arc<dyn StepInfo>,
        variables: &Arc<dyn VariableStore>,
        ids: &IdAllocator,
    ) -> Vec<Scope> {
        let vars_reference = ids.next_id();
        let args_reference = ids.next_id();
        self.references
            .insert(vars_reference, ScopeSource::Variables(variables.clone()));
        self.references
            .insert(args_reference, ScopeSource::Arguments(step.clone()));

        vec![
            Scope {
                name: "Variables".to_string(),
                variables_reference: vars_reference,
                expensive: false,
                presentation_hint: None,
            },
            Scope {
                name: "Arguments".to_string(),
                variables_reference: args_reference,
                expensive: false,
                presentation_hint: Some("locals".to_string()),
            },
        ]
    }

    pub fn frames(&self) -> &[FrameView] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn top_frame_id(&self) -> Option<FrameId> {
        self.frames.first().map(|frame| frame.id)
    }

    pub fn frame_info(&self, frame_id: FrameId) -> Option<&FrameInfo> {
        self.frame_info.get(&frame_id)
    }

    /// Scopes of a frame; empty for container and scenario frames, `None` for
    /// ids outside this snapshot.
    pub fn get_scopes(&self, frame_id: FrameId) -> Option<Vec<Scope>> {
        match self.frame_info.get(&frame_id)? {
            FrameInfo::Step { scopes, .. } => Some(scopes.clone()),
            FrameInfo::Container | FrameInfo::Scenario => Some(Vec::new()),
        }
    }

    /// Render the list behind a variables reference. Computed on every call so
    /// the live store is shown as it is now.
    pub fn get_variables(&self, reference: VariablesReference) -> Option<Vec<Variable>> {
        self.references
            .get(&reference)
            .map(|source| source.compute(self.max_value_len))
    }
}

fn step_display_name(step: &dyn StepInfo) -> String {
    match step.name() {
        Ok(name) => {
            let name = name.trim();
            if name.is_empty() {
                "Step".to_string()
            } else {
                name.to_string()
            }
        }
        Err(e) => {
            warn!("Unable to get step name: {:#}", e);
            "<Unable to get step name>".to_string()
        }
    }
}
