mod breakpoints;
mod context;
mod gate;
mod hierarchy;
mod host;
mod stepping;

pub use breakpoints::{Breakpoint, BreakpointTable};
pub use context::Debugger;
pub use gate::SuspensionGate;
pub use hierarchy::{CallEntry, CallHierarchy};
pub use host::{StepInfo, StepInvoker, VariableStore};
pub use stepping::{RunState, StepCommand, SteppingState, StopReason};
