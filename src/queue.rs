use crate::command::{Arguments, Handler};
use crate::session::Status;
use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use thiserror::Error;

/// A handler bound to the arguments it will run with.
pub struct QueueItem {
    name: String,
    handler: Handler,
    arguments: Arguments,
}

impl QueueItem {
    /// Bind `handler` to the arguments it will be called with.
    pub fn new(name: impl Into<String>, handler: Handler, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            handler,
            arguments,
        }
    }

    /// Name the command was dispatched under, for diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The capability to invoke.
    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// The argument snapshot taken at dispatch time.
    pub fn arguments(&self) -> &Arguments {
        &self.arguments
    }
}

/// Returned by [`ExecutionQueue::push`] once the queue is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("the execution queue no longer accepts commands")]
pub struct QueueClosed;

struct State {
    items: VecDeque<QueueItem>,
    status: Status,
}

/// FIFO of pending commands, shared by one producer and one consumer.
///
/// The session status lives under the same lock as the items, so "is there work" and
/// "should the worker keep waiting" are always answered from one consistent snapshot.
pub struct ExecutionQueue {
    state: Mutex<State>,
    ready: Condvar,
}

impl ExecutionQueue {
    /// An empty queue in the `Init` state.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                items: VecDeque::new(),
                status: Status::Init,
            }),
            ready: Condvar::new(),
        }
    }

    /// Current session status.
    pub fn status(&self) -> Status {
        self.lock().status
    }

    /// `Init -> Running`. Returns `false` if the queue was already started or stopped.
    pub fn start(&self) -> bool {
        let mut state = self.lock();
        if state.status != Status::Init {
            return false;
        }
        state.status = Status::Running;
        true
    }

    /// Move to `Terminal` and wake the consumer. Items already queued are still handed out.
    pub fn shutdown(&self) {
        self.lock().status = Status::Terminal;
        self.ready.notify_all();
    }

    /// Append `item` and wake the consumer. Rejected once the queue is terminal.
    pub fn push(&self, item: QueueItem) -> Result<(), QueueClosed> {
        let mut state = self.lock();
        if state.status == Status::Terminal {
            return Err(QueueClosed);
        }
        state.items.push_back(item);
        drop(state);
        self.ready.notify_one();
        Ok(())
    }

    /// Block until an item is available; `None` once the queue is terminal and drained.
    pub fn pop(&self) -> Option<QueueItem> {
        let mut state = self.lock();
        loop {
            if let Some(item) = state.items.pop_front() {
                return Some(item);
            }
            if state.status == Status::Terminal {
                return None;
            }
            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Number of items waiting to run.
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// `true` when nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ExecutionQueue {
    fn default() -> Self {
        Self::new()
    }
}
