use thiserror::Error;

use crate::snapshot::{FrameId, FrameKind};

/// Failure of an evaluation request. Only ever delivered through an
/// [`EvaluationHandle`](crate::EvaluationHandle), never raised into the host.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    #[error("Unable to find frame id for evaluation: {0}")]
    InvalidFrameId(FrameId),

    #[error("Can only evaluate at a step context (current context: {0})")]
    InvalidFrameKind(FrameKind),

    #[error("{0}")]
    UnableToEvaluate(String),

    #[error("step `{name}` failed: {message}")]
    StepFailed { name: String, message: String },

    #[error("evaluation was abandoned before a result was produced")]
    Abandoned,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid launch arguments: {0}")]
    InvalidLaunchArgs(#[from] serde_json::Error),
}
