//! Per-item execution: skip check, then the transport call with or without retry.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::config::RetryConfig;
use crate::error::Error;
use crate::hooks::BatchHooks;
use crate::retry::run_with_retry;
use crate::transport::{RequestDescriptor, Transport};

use super::ItemOutcome;

/// Shared task function: builds the request for an item, `None` skips it
pub(super) type TaskFn<I> = Arc<dyn Fn(&I) -> Option<RequestDescriptor> + Send + Sync>;

/// Everything an item task needs, owned so the task can be spawned
pub(super) struct ItemContext<I> {
    /// Task function producing the request
    pub(super) task: TaskFn<I>,
    /// Transport performing the request
    pub(super) transport: Arc<dyn Transport>,
    /// Lifecycle hooks (retry hooks fire per item)
    pub(super) hooks: Arc<dyn BatchHooks<I>>,
    /// Retry settings
    pub(super) retry: RetryConfig,
}

/// Process one item to completion.
///
/// The first request built by the task function decides between skip and
/// dispatch and is used for the first attempt; later attempts call the task
/// function again. With `retries == 0` the transport is called exactly once,
/// without timeout and without retry hooks.
pub(super) async fn process_item<I>(ctx: ItemContext<I>, item: I) -> ItemOutcome<I>
where
    I: Send + Sync + 'static,
{
    let Some(request) = (ctx.task)(&item) else {
        tracing::debug!("task produced no request, skipping item");
        return ItemOutcome::Skipped { item };
    };

    let result = if ctx.retry.retries > 0 {
        let mut first = Some(request);
        run_with_retry(&ctx.retry, ctx.hooks.as_ref(), |cancel| {
            let request = first.take().or_else(|| (ctx.task)(&item));
            let transport = Arc::clone(&ctx.transport);
            async move {
                let request = request.ok_or(Error::TaskWithdrawn)?;
                transport.send(request, cancel).await
            }
        })
        .await
    } else {
        ctx.transport.send(request, CancellationToken::new()).await
    };

    match result {
        Ok(response) => ItemOutcome::Succeeded { item, response },
        Err(error) => ItemOutcome::Failed { item, error },
    }
}
