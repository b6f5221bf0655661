//! Background batches.
//!
//! A batch (indexing a roster, annotating it, running a pay period) runs whole
//! on its own named thread and hands back its result once, through a channel.
//! Callers either poll from a UI/progress loop or block on [`BatchHandle::wait`].
//! Whatever the job captures is moved into it, so an engine's index and
//! threshold cannot change while the batch runs.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread::JoinHandle;

use crate::error::ReconError;

pub enum BatchStatus<'a, T> {
    InProgress,
    Complete(&'a T),
    /// The job panicked; no result will arrive.
    Panicked,
}

pub struct BatchHandle<T> {
    label: String,
    rx: Receiver<T>,
    thread: Option<JoinHandle<()>>,
    result: Option<T>,
    panicked: bool,
}

/// Run `job` on a background thread named after `label`.
pub fn spawn<T, F>(label: impl Into<String>, job: F) -> Result<BatchHandle<T>, ReconError>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let label = label.into();
    let (tx, rx) = mpsc::channel::<T>();

    let thread_label = label.clone();
    let thread = std::thread::Builder::new()
        .name(format!("batch-{label}"))
        .spawn(move || {
            log::debug!("batch '{thread_label}' started");
            let result = job();
            // The handle may already be gone; nobody is left to care.
            let _ = tx.send(result);
            log::debug!("batch '{thread_label}' finished");
        })
        .map_err(|e| ReconError::Io(format!("failed to spawn batch '{label}': {e}")))?;

    Ok(BatchHandle {
        label,
        rx,
        thread: Some(thread),
        result: None,
        panicked: false,
    })
}

impl<T> BatchHandle<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Non-blocking check. Once `Complete`, stays `Complete`.
    pub fn poll(&mut self) -> BatchStatus<'_, T> {
        if self.result.is_none() && !self.panicked {
            match self.rx.try_recv() {
                Ok(value) => self.result = Some(value),
                Err(TryRecvError::Empty) => return BatchStatus::InProgress,
                Err(TryRecvError::Disconnected) => self.panicked = true,
            }
        }
        match &self.result {
            Some(value) => BatchStatus::Complete(value),
            None => BatchStatus::Panicked,
        }
    }

    /// Block until the batch finishes.
    pub fn wait(mut self) -> Result<T, ReconError> {
        let outcome = match self.result.take() {
            Some(value) => Ok(value),
            None if self.panicked => Err(ReconError::WorkerPanicked(self.label.clone())),
            None => self
                .rx
                .recv()
                .map_err(|_| ReconError::WorkerPanicked(self.label.clone())),
        };
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        outcome
    }
}
