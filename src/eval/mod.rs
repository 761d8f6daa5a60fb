//! Expression evaluation inside a paused frame.

mod expression;
mod handle;

use log::{info, warn};
use serde_json::Value;

pub use expression::{parse_step_call, variable_name, StepCall};
pub use handle::{EvalResult, EvaluationHandle};

use crate::debugger::StepInvoker;
use crate::error::EvalError;
use crate::snapshot::{FrameId, FrameInfo, StackSnapshot};
use handle::{evaluation_channel, Fulfiller};

/// A queued evaluation. Owned by the pause state until the worker drains it.
#[derive(Debug)]
pub struct EvaluationRequest {
    frame_id: FrameId,
    expression: String,
    fulfiller: Fulfiller,
}

impl EvaluationRequest {
    pub fn new(frame_id: FrameId, expression: impl Into<String>) -> (Self, EvaluationHandle) {
        let (fulfiller, handle) = evaluation_channel();
        let request = Self {
            frame_id,
            expression: expression.into(),
            fulfiller,
        };
        (request, handle)
    }

    pub fn frame_id(&self) -> FrameId {
        self.frame_id
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluate against `snapshot` and answer the handle. Never fails: every
    /// error goes to the handle.
    pub fn evaluate(self, snapshot: &StackSnapshot, invoker: Option<&dyn StepInvoker>) {
        let result = self.resolve(snapshot, invoker);
        if let Err(e) = &result {
            warn!("Error evaluating `{}`: {}", self.expression, e);
        }
        self.fulfiller.fulfill(result);
    }

    fn resolve(
        &self,
        snapshot: &StackSnapshot,
        invoker: Option<&dyn StepInvoker>,
    ) -> Result<Value, EvalError> {
        let frame_id = self.frame_id;
        let info = snapshot
            .frame_info(frame_id)
            .ok_or(EvalError::InvalidFrameId(frame_id))?;

        let FrameInfo::Step { variables, .. } = info else {
            return Err(EvalError::InvalidFrameKind(info.kind()));
        };

        if let Some(name) = variable_name(&self.expression) {
            if let Some(value) = variables.get(name) {
                return Ok(value);
            }
        }

        let call = parse_step_call(&self.expression)?;

        if snapshot.top_frame_id() != Some(frame_id) {
            return Err(EvalError::UnableToEvaluate(
                "Step calls may only be evaluated at the topmost frame.".to_string(),
            ));
        }

        let invoker = invoker.ok_or_else(|| {
            EvalError::UnableToEvaluate("No step invoker is registered".to_string())
        })?;

        info!("Evaluating step call `{}` in frame {}", call.name, frame_id);
        invoker
            .invoke(&call.name, &call.args)
            .map_err(|e| EvalError::StepFailed {
                name: call.name.clone(),
                message: format!("{:#}", e),
            })
    }
}
