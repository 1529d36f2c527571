use crate::command::Invocation;
use crate::queue::{ExecutionQueue, QueueItem};
use crate::session::Shared;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

pub const EXECUTION_FAILED: &str =
    "An error was generated by the executable command. The command can't be executed.";

/// The single background thread that drains the [`ExecutionQueue`].
///
/// Commands run strictly one at a time in submission order. The thread exits once the
/// queue is terminal and empty, so joining it means everything queued before the
/// shutdown has run.
pub struct Worker {
    handle: JoinHandle<()>,
}

impl Worker {
    pub(crate) fn spawn(queue: Arc<ExecutionQueue>, shared: Arc<Shared>) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name("inter-worker".to_string())
            .spawn(move || run(&queue, &shared))?;
        Ok(Self { handle })
    }

    pub fn join(self) {
        if self.handle.join().is_err() {
            log::error!("worker thread panicked outside of a command");
        }
    }
}

fn run(queue: &ExecutionQueue, shared: &Shared) {
    log::debug!("worker started");
    while let Some(item) = queue.pop() {
        execute(&item, shared);
    }
    log::debug!("worker drained the queue and stopped");
}

/// Run one item, turning an `Err` or a panic into a console error.
pub(crate) fn execute(item: &QueueItem, shared: &Shared) {
    log::debug!("executing '{}' {:?}", item.name(), item.arguments().as_slice());
    let invocation = Invocation::new(
        item.arguments(),
        &shared.console,
        &shared.env,
        &shared.registry,
    );
    let handler = item.handler();
    match panic::catch_unwind(AssertUnwindSafe(|| handler(&invocation))) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            log::error!("'{}' failed: {e:#}", item.name());
            shared.console.error(EXECUTION_FAILED);
        }
        Err(_) => {
            log::error!("'{}' panicked", item.name());
            shared.console.error(EXECUTION_FAILED);
        }
    }
}
