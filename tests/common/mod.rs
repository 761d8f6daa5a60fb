// Scripted host interpreter used by the integration tests.
#![allow(dead_code)]

use std::sync::mpsc::{channel, Receiver};
use std::sync::{Arc, Mutex, Weak};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use serde_json::Value;
use suite_debugger::{Debugger, StepInfo, StepInvoker, StopReason, VariableStore};

pub const SOURCE: &str = "/work/suites/a.robot";

/// Line reported for steps run by an evaluation.
pub const EVAL_LINE: u32 = 1;

pub const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone)]
pub enum Action {
    Set { var: String, value: Value },
    Log(String),
    Call(Vec<StepDef>),
}

#[derive(Debug, Clone)]
pub struct StepDef {
    pub name: String,
    pub line: u32,
    pub args: Vec<Value>,
    pub action: Action,
}

pub fn set(line: u32, var: &str, value: Value) -> StepDef {
    StepDef {
        name: "Set Variable".to_string(),
        line,
        args: vec![Value::String(format!("${{{}}}", var)), value.clone()],
        action: Action::Set {
            var: var.to_string(),
            value,
        },
    }
}

pub fn log(line: u32, message: &str) -> StepDef {
    StepDef {
        name: "Log".to_string(),
        line,
        args: vec![Value::String(message.to_string())],
        action: Action::Log(message.to_string()),
    }
}

pub fn call(line: u32, name: &str, children: Vec<StepDef>) -> StepDef {
    StepDef {
        name: name.to_string(),
        line,
        args: Vec::new(),
        action: Action::Call(children),
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Container { name: String, children: Vec<Node> },
    Scenario { name: String, line: u32, steps: Vec<StepDef> },
}

pub fn container(name: &str, children: Vec<Node>) -> Node {
    Node::Container {
        name: name.to_string(),
        children,
    }
}

pub fn scenario(name: &str, line: u32, steps: Vec<StepDef>) -> Node {
    Node::Scenario {
        name: name.to_string(),
        line,
        steps,
    }
}

/// Ordered variable store shared by every step of the run.
#[derive(Debug, Default)]
pub struct SharedStore {
    vars: Mutex<Vec<(String, Value)>>,
}

impl SharedStore {
    pub fn set(&self, name: &str, value: Value) {
        let key = format!("${{{}}}", name);
        let mut vars = self.vars.lock().unwrap();
        match vars.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => vars.push((key, value)),
        }
    }
}

impl VariableStore for SharedStore {
    fn get(&self, name: &str) -> Option<Value> {
        let key = format!("${{{}}}", name);
        self.vars
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.clone())
    }

    fn entries(&self) -> Result<Vec<(String, Value)>> {
        Ok(self.vars.lock().unwrap().clone())
    }
}

struct StepHandle {
    name: String,
    args: Vec<Value>,
}

impl StepInfo for StepHandle {
    fn name(&self) -> Result<String> {
        Ok(self.name.clone())
    }

    fn args(&self) -> Result<Vec<Value>> {
        Ok(self.args.clone())
    }
}

pub struct ScriptHost {
    debugger: Arc<Debugger>,
    variables: Arc<SharedStore>,
    trace: Mutex<Vec<String>>,
}

impl ScriptHost {
    pub fn new(debugger: Arc<Debugger>) -> Arc<Self> {
        let host = Arc::new(Self {
            debugger: debugger.clone(),
            variables: Arc::new(SharedStore::default()),
            trace: Mutex::new(Vec::new()),
        });
        debugger.set_step_invoker(host.clone());
        host
    }

    pub fn variables(&self) -> &SharedStore {
        &self.variables
    }

    pub fn trace(&self) -> Vec<String> {
        self.trace.lock().unwrap().clone()
    }

    pub fn run(&self, node: &Node) {
        match node {
            Node::Container { name, children } => {
                self.debugger.on_enter_container(name, SOURCE);
                for child in children {
                    self.run(child);
                }
                self.debugger.on_exit_container();
            }
            Node::Scenario { name, line, steps } => {
                self.debugger.on_enter_scenario(name, SOURCE, *line);
                for step in steps {
                    self.run_step(step);
                }
                self.debugger.on_exit_scenario();
            }
        }
    }

    fn run_step(&self, step: &StepDef) -> Value {
        let handle: Arc<dyn StepInfo> = Arc::new(StepHandle {
            name: step.name.clone(),
            args: step.args.clone(),
        });
        self.debugger
            .on_before_step(handle.clone(), SOURCE, step.line, self.variables.clone());
        let result = self.execute(step);
        self.debugger.on_after_step(&handle);
        result
    }

    fn execute(&self, step: &StepDef) -> Value {
        match &step.action {
            Action::Set { var, value } => {
                self.variables.set(var, value.clone());
                value.clone()
            }
            Action::Log(message) => {
                self.trace.lock().unwrap().push(message.clone());
                Value::Null
            }
            Action::Call(children) => {
                for child in children {
                    self.run_step(child);
                }
                Value::Null
            }
        }
    }
}

impl StepInvoker for ScriptHost {
    fn invoke(&self, name: &str, args: &[String]) -> Result<Value> {
        let step = match name {
            "Set Variable" => {
                let [var, value] = args else {
                    bail!("Set Variable expects 2 arguments, got {}", args.len());
                };
                let var = var.trim_start_matches("${").trim_end_matches('}');
                let value = serde_json::from_str(value).unwrap_or(Value::String(value.clone()));
                set(EVAL_LINE, var, value)
            }
            "Log" => log(EVAL_LINE, &args.join(" ")),
            other => return Err(anyhow!("No keyword with name '{}' found.", other)),
        };
        Ok(self.run_step(&step))
    }
}

/// A pause as seen by the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct Stop {
    pub reason: StopReason,
    pub line: u32,
    pub depth: usize,
    pub top_name: String,
}

/// Report every pause on a channel, from the worker's pre-wait callback.
pub fn watch_stops(debugger: &Arc<Debugger>) -> Receiver<Stop> {
    let (tx, rx) = channel();
    let tx = Mutex::new(tx);
    let weak: Weak<Debugger> = Arc::downgrade(debugger);
    debugger.add_before_wait(move || {
        let Some(debugger) = weak.upgrade() else {
            return;
        };
        let frames = debugger.get_frames();
        let stop = Stop {
            reason: debugger.stop_reason().expect("paused with a reason"),
            line: frames.first().map_or(0, |f| f.line),
            depth: frames.len(),
            top_name: frames.first().map(|f| f.name.clone()).unwrap_or_default(),
        };
        let _ = tx.lock().unwrap().send(stop);
    });
    rx
}

pub fn next_stop(stops: &Receiver<Stop>) -> Stop {
    stops
        .recv_timeout(STOP_TIMEOUT)
        .expect("worker should have paused")
}

pub fn spawn_run(host: &Arc<ScriptHost>, suite: Node) -> JoinHandle<()> {
    let host = host.clone();
    thread::spawn(move || host.run(&suite))
}

pub fn finish(worker: JoinHandle<()>, stops: &Receiver<Stop>) {
    worker.join().expect("worker thread panicked");
    assert!(
        stops.try_recv().is_err(),
        "no pause expected after the final resume"
    );
}
