//! Collaborator traits implemented by the host interpreter.
//!
//! Handles passed to the hooks are read from controller threads while the
//! worker is paused, so they must be `Send + Sync`.

use anyhow::Result;
use serde_json::Value;

/// The step about to run, as seen by the debugger.
pub trait StepInfo: Send + Sync {
    /// Display name, usually the step's own source text.
    fn name(&self) -> Result<String>;

    /// Resolved argument values.
    fn args(&self) -> Result<Vec<Value>>;
}

/// Live variable store visible to a step.
pub trait VariableStore: Send + Sync {
    /// Look up a variable by its bare name (without `${...}` decoration).
    fn get(&self, name: &str) -> Option<Value>;

    /// All variables, in the order the host wants them shown.
    fn entries(&self) -> Result<Vec<(String, Value)>>;
}

/// The host's normal step invocation machinery, used to evaluate step calls
/// while paused. Called on the worker thread, re-entrantly from inside the
/// `on_before_step` hook.
pub trait StepInvoker: Send + Sync {
    fn invoke(&self, name: &str, args: &[String]) -> Result<Value>;
}
