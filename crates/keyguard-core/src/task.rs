//! Background execution for CPU-heavy operations.
//!
//! Argon2id hashing and RSA key generation take hundreds of milliseconds to
//! seconds. [`BackgroundTask`] runs them on Tokio's blocking pool so they never
//! stall an async executor thread.
//!
//! A task either resolves to a complete result or to an error. Cancelling or
//! dropping it discards the worker's output; the worker owns every
//! intermediate value, so nothing partial escapes.

use crate::error::CryptoError;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

/// Handle to work running on the blocking pool.
///
/// Await it for the result. Dropping it abandons the work.
#[must_use = "a background task does nothing useful unless awaited"]
#[derive(Debug)]
pub struct BackgroundTask<T> {
    handle: JoinHandle<Result<T, CryptoError>>,
    cancelled: Arc<AtomicBool>,
    label: &'static str,
}

impl<T: Send + 'static> BackgroundTask<T> {
    /// Schedule `work` on the current runtime's blocking pool.
    pub(crate) fn spawn<F>(label: &'static str, work: F) -> Result<Self, CryptoError>
    where
        F: FnOnce() -> Result<T, CryptoError> + Send + 'static,
    {
        let runtime = Handle::try_current()
            .map_err(|e| CryptoError::Task(format!("{label}: no Tokio runtime: {e}")))?;
        tracing::debug!(task = label, "scheduling background work");
        let handle = runtime.spawn_blocking(work);
        Ok(Self {
            handle,
            cancelled: Arc::new(AtomicBool::new(false)),
            label,
        })
    }
}

impl<T> BackgroundTask<T> {
    /// Request cancellation.
    ///
    /// Work that has not started yet never runs. Work already running on a
    /// blocking thread cannot be interrupted and runs to completion, but from
    /// this call on the task resolves to `CryptoError::Cancelled` and the
    /// worker's output is dropped unseen.
    pub fn cancel(&self) {
        tracing::debug!(task = self.label, "cancelling background work");
        self.cancelled.store(true, Ordering::Release);
        self.handle.abort();
    }

    /// Whether [`Self::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Whether the worker has finished (successfully, with an error, or by
    /// cancellation).
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<T> Future for BackgroundTask<T> {
    type Output = Result<T, CryptoError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.is_cancelled() {
            return Poll::Ready(Err(CryptoError::Cancelled));
        }
        let label = self.label;
        Pin::new(&mut self.handle).poll(cx).map(|joined| match joined {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(CryptoError::Cancelled),
            Err(e) => Err(CryptoError::Task(format!("{label}: worker panicked: {e}"))),
        })
    }
}
