//! Execution-control core for a hierarchical script interpreter.
//!
//! The host interpreter calls the hook methods on [`Debugger`] from its own
//! thread; controllers (usually a debug-adapter transport) call the control
//! surface from any other thread to set breakpoints, step, inspect the paused
//! stack and evaluate expressions.

pub mod config;
pub mod debugger;
pub mod error;
pub mod eval;
pub mod snapshot;

pub use config::{DebuggerConfig, StepDepth};
pub use debugger::{
    Breakpoint, CallEntry, Debugger, RunState, StepCommand, StepInfo, StepInvoker, StopReason,
    VariableStore,
};
pub use error::{ConfigError, EvalError};
pub use eval::EvaluationHandle;
pub use snapshot::{FrameId, FrameKind, FrameView, Scope, SourceRef, Variable, VariablesReference};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize the logging system.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging(level: log::LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .filter_module("suite_debugger", level)
        .format_timestamp_secs()
        .try_init();
}
