use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ConfigError;

/// Which call-hierarchy entries count toward the depth used by step-over and
/// step-out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StepDepth {
    /// Containers, scenarios and steps all count.
    #[default]
    AllEntries,
    /// Only step entries count.
    StepsOnly,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DebuggerConfig {
    /// Pause on the first step of the run (and of every session after `reset`).
    pub stop_on_entry: bool,
    pub step_depth: StepDepth,
    /// Rendered variable values longer than this are truncated.
    pub max_value_len: usize,
}

impl Default for DebuggerConfig {
    fn default() -> Self {
        Self {
            stop_on_entry: false,
            step_depth: StepDepth::AllEntries,
            max_value_len: 256,
        }
    }
}

impl DebuggerConfig {
    /// Build a config from launch/attach request arguments.
    ///
    /// Missing keys take their defaults and unknown keys are ignored, so the
    /// whole launch object can be passed straight through.
    pub fn from_launch_args(args: &Value) -> Result<Self, ConfigError> {
        if args.is_null() {
            return Ok(Self::default());
        }
        let config = Self::deserialize(args)?;
        Ok(config)
    }
}
