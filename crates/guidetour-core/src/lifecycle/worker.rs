//! Handle to the runtime that runs background work.
//!
//! Every component that needs a background task receives a [`WorkerPool`]
//! at construction; the host calls [`WorkerPool::shutdown`] once to stop
//! everything spawned through it.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::runtime::Handle;
use tokio::task::{AbortHandle, JoinHandle};

struct Worker {
    name: String,
    handle: JoinHandle<()>,
}

struct PoolInner {
    runtime: Handle,
    workers: Mutex<Vec<Worker>>,
    closed: AtomicBool,
}

/// Cloneable handle; clones share the same task list.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl WorkerPool {
    pub fn new(runtime: Handle) -> Self {
        Self {
            inner: Arc::new(PoolInner {
                runtime,
                workers: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Pool on the runtime the caller is running in, if any.
    pub fn current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }

    fn register(&self, name: &str, handle: JoinHandle<()>) -> AbortHandle {
        let abort = handle.abort_handle();
        let mut workers = self
            .inner
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        workers.retain(|w| !w.handle.is_finished());
        workers.push(Worker {
            name: name.to_string(),
            handle,
        });
        abort
    }

    /// Spawn an async task. `None` once the pool is shut down.
    pub fn spawn<F>(&self, name: &str, task: F) -> Option<AbortHandle>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if self.is_closed() {
            tracing::debug!(worker = name, "pool closed, not spawning");
            return None;
        }
        let handle = self.inner.runtime.spawn(task);
        Some(self.register(name, handle))
    }

    /// Run blocking work on the runtime's blocking threads.
    pub fn spawn_blocking<F>(&self, name: &str, work: F) -> Option<AbortHandle>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_closed() {
            tracing::debug!(worker = name, "pool closed, not spawning");
            return None;
        }
        let handle = self.inner.runtime.spawn_blocking(work);
        Some(self.register(name, handle))
    }

    /// Tasks spawned and not yet finished.
    pub fn active(&self) -> usize {
        self.inner
            .workers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|w| !w.handle.is_finished())
            .count()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Abort every task and refuse new ones. Returns how many were still
    /// running.
    pub fn shutdown(&self) -> usize {
        self.inner.closed.store(true, Ordering::Release);
        let workers: Vec<Worker> = std::mem::take(
            &mut *self
                .inner
                .workers
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let mut running = 0;
        for worker in workers {
            if !worker.handle.is_finished() {
                running += 1;
                tracing::debug!(worker = %worker.name, "aborting background task");
            }
            worker.handle.abort();
        }
        running
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("active", &self.active())
            .field("closed", &self.is_closed())
            .finish()
    }
}
