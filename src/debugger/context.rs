use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};

use super::breakpoints::{Breakpoint, BreakpointTable};
use super::gate::SuspensionGate;
use super::hierarchy::{CallEntry, CallHierarchy};
use super::host::{StepInfo, StepInvoker, VariableStore};
use super::stepping::{RunState, StepCommand, SteppingState, StopReason};
use crate::config::DebuggerConfig;
use crate::eval::{EvaluationHandle, EvaluationRequest};
use crate::snapshot::{
    FrameId, FrameView, IdAllocator, Scope, StackSnapshot, Variable, VariablesReference,
};

/// State shared between the worker and controllers, guarded by the gate.
struct PauseState {
    run_state: RunState,
    reason: Option<StopReason>,
    stepping: SteppingState,
    /// Present exactly while paused.
    snapshot: Option<Arc<StackSnapshot>>,
    evaluations: VecDeque<EvaluationRequest>,
}

impl PauseState {
    fn new(command: StepCommand) -> Self {
        Self {
            run_state: RunState::Running,
            reason: None,
            stepping: SteppingState::new(command),
            snapshot: None,
            evaluations: VecDeque::new(),
        }
    }
}

fn same_step(a: &Arc<dyn StepInfo>, b: &Arc<dyn StepInfo>) -> bool {
    Arc::as_ptr(a) as *const () == Arc::as_ptr(b) as *const ()
}

/// Keeps breakpoint pausing off while an evaluation runs on the worker.
struct SkipBreakpoints<'a>(&'a AtomicUsize);

impl<'a> SkipBreakpoints<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for SkipBreakpoints<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Debugger attached to one interpreter run.
///
/// The `on_*` hooks are called by the host interpreter on its worker thread;
/// everything else is the control surface and may be called from any thread.
pub struct Debugger {
    config: DebuggerConfig,
    breakpoints: BreakpointTable,
    gate: SuspensionGate<PauseState>,
    hierarchy: Mutex<CallHierarchy>,
    ids: IdAllocator,
    skip_breakpoints: AtomicUsize,
    invoker: Mutex<Option<Arc<dyn StepInvoker>>>,
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new(DebuggerConfig::default())
    }
}

impl Debugger {
    pub fn new(config: DebuggerConfig) -> Self {
        let initial = Self::initial_command(&config);
        info!("{} {} attached: {:?}", crate::PKG_NAME, crate::VERSION, config);
        Self {
            config,
            breakpoints: BreakpointTable::new(),
            gate: SuspensionGate::new(PauseState::new(initial)),
            hierarchy: Mutex::new(CallHierarchy::new()),
            ids: IdAllocator::default(),
            skip_breakpoints: AtomicUsize::new(0),
            invoker: Mutex::new(None),
        }
    }

    fn initial_command(config: &DebuggerConfig) -> StepCommand {
        if config.stop_on_entry {
            StepCommand::StepIn
        } else {
            StepCommand::None
        }
    }

    pub fn config(&self) -> &DebuggerConfig {
        &self.config
    }

    /// Register the host machinery used to evaluate step calls.
    pub fn set_step_invoker(&self, invoker: Arc<dyn StepInvoker>) {
        *self.invoker.lock().unwrap_or_else(PoisonError::into_inner) = Some(invoker);
    }

    fn hierarchy(&self) -> MutexGuard<'_, CallHierarchy> {
        self.hierarchy.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stepping_depth(&self) -> usize {
        self.hierarchy().stepping_depth(self.config.step_depth)
    }

    pub fn on_enter_container(&self, name: &str, source: &str) {
        self.hierarchy().push(CallEntry::Container {
            name: name.to_string(),
            source: source.to_string(),
        });
    }

    pub fn on_exit_container(&self) {
        self.hierarchy().pop("container");
    }

    pub fn on_enter_scenario(&self, name: &str, source: &str, line: u32) {
        self.hierarchy().push(CallEntry::Scenario {
            name: name.to_string(),
            source: source.to_string(),
            line,
        });
    }

    pub fn on_exit_scenario(&self) {
        self.hierarchy().pop("scenario");
    }

    /// Called before each step runs. Blocks the calling thread while paused.
    pub fn on_before_step(
        &self,
        step: Arc<dyn StepInfo>,
        source: &str,
        line: u32,
        variables: Arc<dyn VariableStore>,
    ) {
        self.hierarchy().push(CallEntry::Step {
            step,
            variables,
            source: source.to_string(),
            line,
        });
        if self.skip_breakpoints.load(Ordering::SeqCst) > 0 {
            return;
        }

        let depth = self.stepping_depth();
        let at_breakpoint = self.breakpoints.hit(source, line);
        let reason = {
            let state = self.gate.lock();
            debug!(
                "before step {}:{} - depth {} - {:?}",
                source,
                line,
                depth,
                state.stepping.command()
            );
            state.stepping.decide(at_breakpoint, depth)
        };

        if let Some(reason) = reason {
            self.wait_suspended(reason, depth);
        }
    }

    pub fn on_after_step(&self, step: &Arc<dyn StepInfo>) {
        let popped = self.hierarchy().pop("step");
        if let Some(CallEntry::Step { step: live, .. }) = popped {
            if !same_step(&live, step) {
                warn!("Step finished out of order; the innermost step was a different one");
            }
        }
    }

    /// The pause loop. Returns once a controller resumes execution.
    fn wait_suspended(&self, reason: StopReason, depth: usize) {
        let entries = self.hierarchy().snapshot_for_pause();
        let snapshot = Arc::new(StackSnapshot::build(
            &entries,
            &self.ids,
            self.config.max_value_len,
        ));
        info!("Paused ({}) with {} frames", reason, snapshot.len());

        {
            let mut state = self.gate.lock();
            state.run_state = RunState::Paused;
            state.reason = Some(reason);
            state.snapshot = Some(snapshot.clone());
            state.stepping.set_command(StepCommand::None);
        }
        self.gate.pre_wait();

        loop {
            let request = {
                let mut state = self.gate.lock();
                while state.evaluations.is_empty() && state.run_state == RunState::Paused {
                    state = self.gate.wait(state);
                }
                // Anything still queued waits for the next pause.
                if state.run_state == RunState::Running {
                    state.stepping.on_resume(depth);
                    debug!(
                        "Resumed with {:?}, stop on stack len {}",
                        state.stepping.command(),
                        state.stepping.stop_on_stack_len()
                    );
                    return;
                }
                match state.evaluations.pop_front() {
                    Some(request) => request,
                    None => continue,
                }
            };

            debug!(
                "Evaluating `{}` in frame {}",
                request.expression(),
                request.frame_id()
            );
            let invoker = self
                .invoker
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            let _skip = SkipBreakpoints::enter(&self.skip_breakpoints);
            request.evaluate(&snapshot, invoker.as_deref());
        }
    }

    pub fn set_breakpoints(&self, source: &str, lines: &[u32]) {
        self.breakpoints.set_breakpoints(source, lines.iter().copied());
    }

    pub fn set_breakpoint_records(&self, source: &str, breakpoints: Vec<Breakpoint>) {
        self.breakpoints.set_breakpoints(source, breakpoints);
    }

    pub fn breakpoints(&self) -> &BreakpointTable {
        &self.breakpoints
    }

    fn resume(&self, command: StepCommand) {
        let resumed = self.gate.proceed_with(|state| {
            if state.run_state != RunState::Paused {
                return false;
            }
            state.stepping.set_command(command);
            state.run_state = RunState::Running;
            state.reason = None;
            state.snapshot = None;
            true
        });
        if resumed {
            debug!("Resume requested: {:?}", command);
        } else {
            debug!("Ignoring {:?}: not paused", command);
        }
    }

    pub fn continue_(&self) {
        self.resume(StepCommand::Continue);
    }

    pub fn step_in(&self) {
        self.resume(StepCommand::StepIn);
    }

    pub fn step_next(&self) {
        self.resume(StepCommand::StepNext);
    }

    pub fn step_out(&self) {
        self.resume(StepCommand::StepOut);
    }

    /// Queue an evaluation. It runs the next time the worker is paused (right
    /// away if it is paused now).
    pub fn evaluate(&self, frame_id: FrameId, expression: &str) -> EvaluationHandle {
        let (request, handle) = EvaluationRequest::new(frame_id, expression);
        self.gate.lock().evaluations.push_back(request);
        self.gate.proceed();
        handle
    }

    /// Back to a fresh session: running, no stepping state, no breakpoints.
    /// Queued evaluations are dropped and their handles report `Abandoned`.
    pub fn reset(&self) {
        let initial = Self::initial_command(&self.config);
        self.breakpoints.clear();
        let dropped = self.gate.proceed_with(|state| {
            let dropped = state.evaluations.len();
            *state = PauseState::new(initial);
            dropped
        });
        info!("Debugger reset ({} queued evaluations dropped)", dropped);
    }

    fn current_snapshot(&self) -> Option<Arc<StackSnapshot>> {
        self.gate.lock().snapshot.clone()
    }

    /// Frames of the current pause, innermost first. Empty while running.
    pub fn get_frames(&self) -> Vec<FrameView> {
        self.current_snapshot()
            .map(|snapshot| snapshot.frames().to_vec())
            .unwrap_or_default()
    }

    pub fn get_scopes(&self, frame_id: FrameId) -> Option<Vec<Scope>> {
        self.current_snapshot()?.get_scopes(frame_id)
    }

    pub fn get_variables(&self, reference: VariablesReference) -> Option<Vec<Variable>> {
        self.current_snapshot()?.get_variables(reference)
    }

    pub fn run_state(&self) -> RunState {
        self.gate.lock().run_state
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        self.gate.lock().reason
    }

    /// Number of live call-hierarchy entries.
    pub fn depth(&self) -> usize {
        self.hierarchy().depth()
    }

    /// Run `callback` on the worker each time it is about to park. The pause
    /// is fully visible (state, reason, frames) when the callback runs.
    pub fn add_before_wait<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.gate.add_before_wait(callback);
    }

    pub fn waited(&self) -> usize {
        self.gate.waited()
    }

    pub fn proceeded(&self) -> usize {
        self.gate.proceeded()
    }
}
