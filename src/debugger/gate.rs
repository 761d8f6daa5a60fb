use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

type BeforeWait = Box<dyn Fn() + Send + Sync>;

/// Monitor the worker parks on while paused.
///
/// `T` is the state shared between the worker and controllers; every change a
/// controller makes through [`proceed_with`](Self::proceed_with) happens under
/// the same lock the worker checks before blocking, so no wake-up is lost and
/// no half-applied command is ever observed.
pub struct SuspensionGate<T> {
    state: Mutex<T>,
    condition: Condvar,
    before_wait: Mutex<Vec<BeforeWait>>,
    waited: AtomicUsize,
    proceeded: AtomicUsize,
}

impl<T> SuspensionGate<T> {
    pub fn new(state: T) -> Self {
        Self {
            state: Mutex::new(state),
            condition: Condvar::new(),
            before_wait: Mutex::new(Vec::new()),
            waited: AtomicUsize::new(0),
            proceeded: AtomicUsize::new(0),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, T> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a callback run each time the worker is about to park.
    pub fn add_before_wait<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.before_wait
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }

    pub fn pre_wait(&self) {
        let callbacks = self.before_wait.lock().unwrap_or_else(PoisonError::into_inner);
        for callback in callbacks.iter() {
            callback();
        }
    }

    /// Release the lock and block until notified.
    pub fn wait<'a>(&self, guard: MutexGuard<'a, T>) -> MutexGuard<'a, T> {
        self.waited.fetch_add(1, Ordering::Relaxed);
        self.condition
            .wait(guard)
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn proceed(&self) {
        self.proceed_with(|_| ());
    }

    /// Apply `update` under the lock, then wake every waiter.
    pub fn proceed_with<R>(&self, update: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut state = self.lock();
            let result = update(&mut state);
            self.proceeded.fetch_add(1, Ordering::Relaxed);
            result
        };
        self.condition.notify_all();
        result
    }

    pub fn waited(&self) -> usize {
        self.waited.load(Ordering::Relaxed)
    }

    pub fn proceeded(&self) -> usize {
        self.proceeded.load(Ordering::Relaxed)
    }
}
