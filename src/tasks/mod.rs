//! Long-running tasks.
//!
//! Every loop runs on its own OS thread and owns exactly one blocking
//! resource (the queue, a timer, the transport, or a socket).  Tasks talk
//! to each other only through the [`CommandQueue`](crate::app::queue::CommandQueue).
//!
//! ```text
//!  subscriber ──┐
//!  ticker ──────┼──▶ CommandQueue ──▶ dispatch ──▶ Controller
//!  scanners ────┘
//! ```
//!
//! Stopping a task clears its [`RunFlag`].  The loop notices at the top of
//! its next iteration; a blocking call already in flight completes first.

pub mod dispatch;
pub mod scanner;
pub mod subscriber;
pub mod ticker;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use log::{debug, info, warn};

use crate::error::Result;

/// Shared "keep going" flag for one task.
#[derive(Debug, Clone)]
pub struct RunFlag(Arc<AtomicBool>);

impl Default for RunFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl RunFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Extra step run by [`Task::stop`] after the flag is cleared, used to
/// unblock a thread parked in a receive.
pub type Unblock = Box<dyn Fn() + Send + Sync>;

/// A named thread with its own run flag.  `T` is what the loop hands back
/// on exit.
pub struct Task<T = ()> {
    name: String,
    flag: RunFlag,
    handle: Option<JoinHandle<T>>,
    unblock: Option<Unblock>,
}

impl<T: Send + 'static> Task<T> {
    /// Spawn `body` on a new thread named `name`.
    pub fn spawn<F>(name: &str, body: F) -> Result<Self>
    where
        F: FnOnce(RunFlag) -> T + Send + 'static,
    {
        let flag = RunFlag::new();
        let thread_flag = flag.clone();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || body(thread_flag))?;
        info!("Task '{name}' started");
        Ok(Self {
            name: name.to_string(),
            flag,
            handle: Some(handle),
            unblock: None,
        })
    }

    /// Attach an unblock step run on [`stop`](Self::stop).
    #[must_use]
    pub fn with_unblock(mut self, unblock: Unblock) -> Self {
        self.unblock = Some(unblock);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_running(&self) -> bool {
        self.flag.is_running()
    }

    /// Ask the loop to exit after its current iteration.
    pub fn stop(&self) {
        debug!("Stopping task '{}'", self.name);
        self.flag.stop();
        if let Some(unblock) = &self.unblock {
            unblock();
        }
    }

    /// Wait for the thread to exit.  Returns `None` if it panicked.
    pub fn join(mut self) -> Option<T> {
        let handle = self.handle.take()?;
        match handle.join() {
            Ok(value) => {
                info!("Task '{}' stopped", self.name);
                Some(value)
            }
            Err(_) => {
                warn!("Task '{}' panicked", self.name);
                None
            }
        }
    }

    /// [`stop`](Self::stop) then [`join`](Self::join).
    pub fn shutdown(self) -> Option<T> {
        self.stop();
        self.join()
    }
}
