use std::sync::mpsc::{sync_channel, Receiver, RecvTimeoutError, SyncSender, TryRecvError};
use std::time::Duration;

use log::debug;
use serde_json::Value;

use crate::error::EvalError;

pub type EvalResult = Result<Value, EvalError>;

/// Controller side of an evaluation. The result arrives once, the next time
/// the worker is paused.
#[derive(Debug)]
pub struct EvaluationHandle {
    rx: Receiver<EvalResult>,
}

/// Worker side. Consumed by [`fulfill`](Self::fulfill), so a request can only
/// be answered once.
#[derive(Debug)]
pub(crate) struct Fulfiller {
    tx: SyncSender<EvalResult>,
}

pub(crate) fn evaluation_channel() -> (Fulfiller, EvaluationHandle) {
    let (tx, rx) = sync_channel(1);
    (Fulfiller { tx }, EvaluationHandle { rx })
}

impl Fulfiller {
    pub(crate) fn fulfill(self, result: EvalResult) {
        if self.tx.send(result).is_err() {
            debug!("Evaluation result dropped: the handle was abandoned");
        }
    }
}

impl EvaluationHandle {
    /// Block until the result arrives.
    pub fn wait(self) -> EvalResult {
        self.rx.recv().unwrap_or(Err(EvalError::Abandoned))
    }

    /// Block for at most `timeout`. `None` means nothing arrived yet; the
    /// handle can be waited on again.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<EvalResult> {
        match self.rx.recv_timeout(timeout) {
            Ok(result) => Some(result),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Err(EvalError::Abandoned)),
        }
    }

    pub fn try_result(&self) -> Option<EvalResult> {
        match self.rx.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(EvalError::Abandoned)),
        }
    }
}
