//! Lifecycle hooks for the retry executor and the batch orchestrator
//!
//! Hooks are observability callbacks. Every method has a no-op default, so an
//! implementation only overrides the events it cares about. They never change
//! control flow: a hook that panics is caught, logged and otherwise ignored.
//!
//! # Example
//!
//! ```
//! use oh_no_again::error::Error;
//! use oh_no_again::hooks::{BatchHooks, RetryHooks};
//! use oh_no_again::transport::TransportResponse;
//! use std::sync::atomic::{AtomicU32, Ordering};
//!
//! #[derive(Default)]
//! struct RetryCounter(AtomicU32);
//!
//! impl RetryHooks<TransportResponse> for RetryCounter {
//!     fn on_retry(&self, _error: &Error, _attempt: u32) {
//!         self.0.fetch_add(1, Ordering::Relaxed);
//!     }
//! }
//!
//! impl BatchHooks<u32> for RetryCounter {}
//! ```

use crate::batch::BatchResult;
use crate::error::Error;
use crate::transport::TransportResponse;
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Callbacks fired by [`run_with_retry`](crate::retry::run_with_retry)
pub trait RetryHooks<T>: Send + Sync {
    /// An attempt failed and another one will follow after the backoff delay.
    ///
    /// `attempt` is the zero-based index of the attempt that failed.
    fn on_retry(&self, _error: &Error, _attempt: u32) {}

    /// An attempt failed because it timed out or was cancelled
    fn on_abort(&self, _error: &Error) {}

    /// An attempt succeeded
    fn on_success(&self, _result: &T) {}

    /// The final attempt failed; `error` is what the executor returns
    fn on_failure(&self, _error: &Error) {}
}

/// Callbacks fired by the [`RequestBatcher`](crate::batch::RequestBatcher)
///
/// Extends [`RetryHooks`], which fire for every item that goes through the
/// retry executor.
pub trait BatchHooks<I>: RetryHooks<TransportResponse> {
    /// A group is about to be dispatched
    fn on_batch_start(&self, _index: usize, _group: &[I]) {}

    /// Every item of a group has settled
    fn on_batch_complete(&self, _index: usize, _results: &[BatchResult<I>]) {}
}

/// Hooks that do nothing
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl<T> RetryHooks<T> for NoopHooks {}

impl<I> BatchHooks<I> for NoopHooks {}

/// Run a hook, containing any panic it raises
pub(crate) fn fire(hook: &'static str, call: impl FnOnce()) {
    if catch_unwind(AssertUnwindSafe(call)).is_err() {
        tracing::warn!(hook, "lifecycle hook panicked, ignoring");
    }
}
