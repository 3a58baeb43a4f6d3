//! Running the console on its own thread.

use super::{Repl, TASK_NAME};
use crate::editor::LineEditor;
use crate::history::HistoryStore;
use crate::repl::WorkingDirectory;
use crate::transport::{IoError, SerialIo};
use core::fmt;
use core::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Smallest stack given to the console thread on hosted targets.
pub const MIN_HOST_STACK_SIZE: usize = 256 * 1024;

type Finished<S, E, H, W> = (Repl<S, E, H, W>, Result<(), IoError>);

/// Handle to a console running on its own thread.
pub struct ReplHandle<S, E, H, W> {
    cancel: Arc<AtomicBool>,
    thread: JoinHandle<Finished<S, E, H, W>>,
}

impl<S, E, H, W> Repl<S, E, H, W>
where
    S: SerialIo + Send + 'static,
    E: LineEditor + Send + 'static,
    H: HistoryStore + Send + 'static,
    W: WorkingDirectory + Send + 'static,
{
    /// Start the loop on a thread named [`TASK_NAME`].
    ///
    /// The thread gets the configured stack size, but never less than
    /// [`MIN_HOST_STACK_SIZE`].
    pub fn spawn(self) -> std::io::Result<ReplHandle<S, E, H, W>> {
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancel);
        let stack_size = self.settings.task_stack_size.max(MIN_HOST_STACK_SIZE);

        let thread = thread::Builder::new()
            .name(TASK_NAME.into())
            .stack_size(stack_size)
            .spawn(move || {
                let mut repl = self;
                let result = repl.run(&flag);
                (repl, result)
            })?;

        info!("console thread started");
        Ok(ReplHandle { cancel, thread })
    }
}

impl<S, E, H, W> ReplHandle<S, E, H, W> {
    /// Ask the loop to stop. It does so at its next poll.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    /// Whether the loop has ended.
    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the loop to end and take the console back.
    ///
    /// A panic on the console thread is resumed on the caller's.
    pub fn join(self) -> (Repl<S, E, H, W>, Result<(), IoError>) {
        match self.thread.join() {
            Ok(finished) => finished,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }

    /// Cancel the loop and wait for it to end.
    pub fn shutdown(self) -> (Repl<S, E, H, W>, Result<(), IoError>) {
        self.cancel();
        self.join()
    }
}

impl<S, E, H, W> fmt::Debug for ReplHandle<S, E, H, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReplHandle")
            .field("cancelled", &self.cancel.load(Ordering::Relaxed))
            .field("thread", &self.thread.thread().name())
            .finish()
    }
}
