//! The designated execution context.
//!
//! Positioning providers require every call to happen on one thread (the
//! platform's main thread). `MainContext` owns such a thread and runs queued
//! jobs on it in FIFO order. Event bus deliveries use the same queue so that
//! subscribers observe updates in the order provider calls were made.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, ThreadId};

use tokio::sync::{mpsc, oneshot};

use crate::types::LocationError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Handle to a dedicated job thread.
///
/// Cloning the `Arc` shares the same thread. The thread exits once every
/// handle has been dropped and the queue is drained.
pub struct MainContext {
    name: String,
    sender: mpsc::UnboundedSender<Job>,
    thread_id: ThreadId,
}

impl MainContext {
    /// Spawn the context thread.
    pub fn spawn(name: &str) -> Result<Arc<Self>, LocationError> {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Job>();
        let thread_name = name.to_string();

        let handle = thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || {
                tracing::debug!("Execution context '{}' started", thread_name);
                while let Some(job) = receiver.blocking_recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        tracing::error!("Job panicked on execution context '{}'", thread_name);
                    }
                }
                tracing::debug!("Execution context '{}' stopped", thread_name);
            })
            .map_err(|e| {
                LocationError::SetupFailure(format!("failed to spawn execution context: {}", e))
            })?;

        Ok(Arc::new(Self {
            name: name.to_string(),
            sender,
            thread_id: handle.thread().id(),
        }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// True when called from the context thread.
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }

    /// Queue a job without waiting for it. Returns false if the context is gone.
    pub fn dispatch<F>(&self, job: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        if self.sender.send(Box::new(job)).is_err() {
            tracing::warn!("Execution context '{}' is closed; job dropped", self.name);
            return false;
        }
        true
    }

    /// Run a job on the context and wait for its result.
    pub async fn run<F, R>(&self, job: F) -> Result<R, LocationError>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let queued = self.dispatch(move || {
            let _ = tx.send(job());
        });
        if !queued {
            return Err(LocationError::SetupFailure(format!(
                "execution context '{}' is closed",
                self.name
            )));
        }

        rx.await.map_err(|_| {
            LocationError::SetupFailure(format!(
                "job on execution context '{}' did not complete",
                self.name
            ))
        })
    }

    /// Wait until every job queued before this call has run.
    pub async fn flush(&self) {
        let _ = self.run(|| ()).await;
    }
}

impl std::fmt::Debug for MainContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MainContext")
            .field("name", &self.name)
            .field("thread_id", &self.thread_id)
            .finish()
    }
}
