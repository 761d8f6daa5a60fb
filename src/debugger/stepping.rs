use std::fmt;

use serde::Serialize;

/// Whether the worker is executing or parked in the pause loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RunState {
    #[default]
    Running,
    Paused,
}

/// Why the worker paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StopReason {
    Breakpoint,
    Step,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Breakpoint => f.write_str("breakpoint"),
            Self::Step => f.write_str("step"),
        }
    }
}

/// Step commands issued by a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepCommand {
    #[default]
    None,
    Continue,
    StepIn,
    StepNext,
    StepOut,
}

/// Active step command plus the depth threshold used by next/out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SteppingState {
    command: StepCommand,
    stop_on_stack_len: usize,
}

impl SteppingState {
    pub fn new(command: StepCommand) -> Self {
        Self {
            command,
            stop_on_stack_len: 0,
        }
    }

    pub fn command(&self) -> StepCommand {
        self.command
    }

    pub fn stop_on_stack_len(&self) -> usize {
        self.stop_on_stack_len
    }

    pub fn set_command(&mut self, command: StepCommand) {
        self.command = command;
    }

    /// Decide whether a step about to run at `depth` should pause.
    ///
    /// Breakpoints win over any step command.
    pub fn decide(&self, at_breakpoint: bool, depth: usize) -> Option<StopReason> {
        if at_breakpoint {
            return Some(StopReason::Breakpoint);
        }
        match self.command {
            StepCommand::StepIn => Some(StopReason::Step),
            StepCommand::StepNext | StepCommand::StepOut if depth <= self.stop_on_stack_len => {
                Some(StopReason::Step)
            }
            _ => None,
        }
    }

    /// Record the resume point. `depth` is the stepping depth of the frame the
    /// worker was paused in.
    pub fn on_resume(&mut self, depth: usize) {
        match self.command {
            StepCommand::StepNext => self.stop_on_stack_len = depth,
            StepCommand::StepOut => self.stop_on_stack_len = depth.saturating_sub(1),
            _ => {}
        }
    }
}
