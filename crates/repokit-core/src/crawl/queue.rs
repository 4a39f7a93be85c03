//! Bounded task queue.
//!
//! Tasks wait in a FIFO list and at most `concurrency` of them run at once on
//! the tokio runtime. Every time a task finishes the queue starts the next
//! pending one, so a task that adds more tasks keeps the queue going without
//! any outer driver. [`TaskQueue::wait_all`] resolves once nothing is pending
//! or running, including tasks added while waiting.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::BoxFuture;
use tokio::runtime::Handle;
use tokio::sync::Notify;

/// A unit of work.
pub type Task = BoxFuture<'static, ()>;

#[derive(Default)]
struct State {
    pending: VecDeque<Task>,
    running: usize,
}

struct Inner {
    concurrency: usize,
    state: Mutex<State>,
    idle: Notify,
}

/// FIFO work queue that runs a bounded number of tasks at once.
///
/// Cloning yields another handle to the same queue.
#[derive(Clone)]
pub struct TaskQueue {
    inner: Arc<Inner>,
}

impl TaskQueue {
    /// Create a queue running at most `concurrency` tasks (minimum 1).
    #[must_use]
    pub fn new(concurrency: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                concurrency: concurrency.max(1),
                state: Mutex::new(State::default()),
                idle: Notify::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Enqueue `task` and start as many pending tasks as the limit allows.
    ///
    /// Must be called from within a tokio runtime.
    pub fn add<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.state().pending.push_back(Box::pin(task));
        self.pump();
    }

    fn pump(&self) {
        let Ok(runtime) = Handle::try_current() else {
            return;
        };
        loop {
            let task = {
                let mut state = self.state();
                if state.running >= self.inner.concurrency {
                    return;
                }
                let Some(task) = state.pending.pop_front() else {
                    return;
                };
                state.running += 1;
                task
            };

            let done = Finished(self.clone());
            runtime.spawn(async move {
                let _done = done;
                task.await;
            });
        }
    }

    fn finish(&self) {
        {
            let mut state = self.state();
            state.running = state.running.saturating_sub(1);
        }
        self.pump();
        self.inner.idle.notify_waiters();
    }

    /// Number of tasks not started yet.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.state().pending.len()
    }

    /// Number of tasks currently running.
    #[must_use]
    pub fn running(&self) -> usize {
        self.state().running
    }

    /// Whether nothing is pending or running.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        let state = self.state();
        state.pending.is_empty() && state.running == 0
    }

    /// Wait until the queue is idle.
    pub async fn wait_all(&self) {
        loop {
            let mut notified = pin!(self.inner.idle.notified());
            notified.as_mut().enable();
            if self.is_idle() {
                return;
            }
            notified.await;
        }
    }
}

/// Marks a running task as finished when dropped, panics included.
struct Finished(TaskQueue);

impl Drop for Finished {
    fn drop(&mut self) {
        self.0.finish();
    }
}
