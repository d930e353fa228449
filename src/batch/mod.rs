//! Concurrency-limited batch execution of HTTP requests
//!
//! The input is split into groups of `concurrency` items. Every item of a
//! group runs as its own task; groups run one after another. Each item goes
//! through the task function, which yields a [`RequestDescriptor`] or `None`
//! to skip the item, and then through [`run_with_retry`](crate::retry::run_with_retry)
//! around the [`Transport`].
//!
//! Results keep the input order regardless of completion order.
//!
//! # Example
//!
//! ```no_run
//! use oh_no_again::batch::RequestBatcher;
//! use oh_no_again::config::BatchConfig;
//! use oh_no_again::transport::RequestDescriptor;
//!
//! # async fn example() -> oh_no_again::Result<()> {
//! let config = BatchConfig {
//!     return_meta: true,
//!     ..Default::default()
//! };
//! let batcher = RequestBatcher::new(config)?;
//!
//! let ids = vec![1u32, 2, 3, 4];
//! let results = batcher
//!     .run(&ids, 2, |id| {
//!         Some(RequestDescriptor::get(format!("https://api.example.com/users/{id}")))
//!     })
//!     .await?;
//!
//! for entry in &results {
//!     println!("{}", serde_json::to_string(entry)?);
//! }
//! # Ok(())
//! # }
//! ```

mod item;


use crate::chunk::create_batches;
use crate::config::BatchConfig;
use crate::error::{Error, Result};
use crate::hooks::{BatchHooks, NoopHooks, fire};
use crate::transport::{HttpTransport, RequestDescriptor, Transport, TransportResponse};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use item::{ItemContext, TaskFn, process_item};

/// Error message recorded for items whose task function returned `None`
pub const SKIPPED_MESSAGE: &str = "Skipped: false or invalid task";

/// One entry of a batch result, in input order
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BatchResult<I> {
    /// Raw mode: the response body, or `None` for skipped and failed items
    Raw(Option<Value>),
    /// Metadata mode: the outcome together with the item
    Meta(BatchRecord<I>),
}

impl<I> BatchResult<I> {
    /// The metadata record, if this is a metadata-mode entry
    pub fn as_record(&self) -> Option<&BatchRecord<I>> {
        match self {
            BatchResult::Meta(record) => Some(record),
            BatchResult::Raw(_) => None,
        }
    }

    /// The response body, in either mode
    pub fn body(&self) -> Option<&Value> {
        match self {
            BatchResult::Raw(body) => body.as_ref(),
            BatchResult::Meta(record) => record.result.as_ref(),
        }
    }
}

/// Metadata-mode outcome for one item
///
/// Serializes as `{item, result, status, success: true}` on success,
/// `{item, error, status?, success: false}` on failure and
/// `{item, error, success: false, skipped: true}` for skipped items.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord<I> {
    /// The input item
    pub item: I,

    /// Response body, present on success
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error message, present on failure and skip
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// HTTP status, when one was received
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,

    /// Whether the request succeeded
    pub success: bool,

    /// Set when the task function opted the item out
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub skipped: bool,
}

impl<I> BatchRecord<I> {
    fn succeeded(item: I, response: TransportResponse) -> Self {
        Self {
            item,
            result: Some(response.data),
            error: None,
            status: Some(response.status),
            success: true,
            skipped: false,
        }
    }

    fn failed(item: I, error: &Error) -> Self {
        Self {
            item,
            result: None,
            error: Some(error.to_string()),
            status: error.status(),
            success: false,
            skipped: false,
        }
    }

    fn skipped(item: I) -> Self {
        Self {
            item,
            result: None,
            error: Some(SKIPPED_MESSAGE.to_string()),
            status: None,
            success: false,
            skipped: true,
        }
    }
}

/// How a single item ended
#[derive(Debug)]
pub(crate) enum ItemOutcome<I> {
    Succeeded { item: I, response: TransportResponse },
    Failed { item: I, error: Error },
    Skipped { item: I },
}

impl<I> ItemOutcome<I> {
    fn into_result(self, return_meta: bool) -> BatchResult<I> {
        match (self, return_meta) {
            (ItemOutcome::Succeeded { item, response }, true) => {
                BatchResult::Meta(BatchRecord::succeeded(item, response))
            }
            (ItemOutcome::Succeeded { response, .. }, false) => BatchResult::Raw(Some(response.data)),
            (ItemOutcome::Failed { item, error }, true) => {
                BatchResult::Meta(BatchRecord::failed(item, &error))
            }
            (ItemOutcome::Skipped { item }, true) => BatchResult::Meta(BatchRecord::skipped(item)),
            (ItemOutcome::Failed { .. } | ItemOutcome::Skipped { .. }, false) => {
                BatchResult::Raw(None)
            }
        }
    }
}

/// Runs request batches with retry, timeout and bounded concurrency
pub struct RequestBatcher<I> {
    config: BatchConfig,
    transport: Arc<dyn Transport>,
    hooks: Arc<dyn BatchHooks<I>>,
}

impl<I> RequestBatcher<I>
where
    I: Clone + Send + Sync + 'static,
{
    /// Create a batcher that sends requests with [`HttpTransport`]
    pub fn new(config: BatchConfig) -> Result<Self> {
        Ok(Self::with_transport(config, Arc::new(HttpTransport::new()?)))
    }

    /// Create a batcher around a custom transport
    pub fn with_transport(config: BatchConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            config,
            transport,
            hooks: Arc::new(NoopHooks),
        }
    }

    /// Attach lifecycle hooks
    pub fn with_hooks(mut self, hooks: Arc<dyn BatchHooks<I>>) -> Self {
        self.hooks = hooks;
        self
    }

    /// Current configuration
    pub fn config(&self) -> &BatchConfig {
        &self.config
    }

    /// Process `items` in groups of `concurrency`
    ///
    /// `task` is called once per item to build its request (or `None` to skip
    /// it) and again before every retry attempt, so a request can pick up
    /// fresh state between attempts.
    ///
    /// # Errors
    ///
    /// Fails before any work starts when `concurrency` is zero or the
    /// configuration is invalid. With `fail_fast`, returns the error of the
    /// first item that fails after all its attempts; groups after it never
    /// start, items of its own group keep running detached.
    pub async fn run<F>(
        &self,
        items: &[I],
        concurrency: usize,
        task: F,
    ) -> Result<Vec<BatchResult<I>>>
    where
        F: Fn(&I) -> Option<RequestDescriptor> + Send + Sync + 'static,
    {
        self.config.validate()?;
        let groups = create_batches(items, concurrency)?;
        let task: TaskFn<I> = Arc::new(task);

        let mut results = Vec::with_capacity(items.len());

        for (index, group) in groups.iter().enumerate() {
            tracing::debug!(batch = index, size = group.len(), "starting batch");
            fire("on_batch_start", || self.hooks.on_batch_start(index, group));

            let group_results = self.run_group(group, &task).await?;

            fire("on_batch_complete", || {
                self.hooks.on_batch_complete(index, &group_results)
            });
            tracing::debug!(batch = index, "batch complete");

            results.extend(group_results);
        }

        tracing::info!(
            items = items.len(),
            batches = groups.len(),
            "all batches processed"
        );

        Ok(results)
    }

    /// Run every item of one group concurrently and collect results by position
    async fn run_group(&self, group: &[I], task: &TaskFn<I>) -> Result<Vec<BatchResult<I>>> {
        let mut pending: FuturesUnordered<_> = group
            .iter()
            .cloned()
            .enumerate()
            .map(|(slot, item)| {
                let ctx = ItemContext {
                    task: Arc::clone(task),
                    transport: Arc::clone(&self.transport),
                    hooks: Arc::clone(&self.hooks),
                    retry: self.config.retry.clone(),
                };
                let handle = tokio::spawn(process_item(ctx, item));
                async move { (slot, handle.await) }
            })
            .collect();

        let mut slots: Vec<Option<BatchResult<I>>> =
            std::iter::repeat_with(|| None).take(group.len()).collect();

        while let Some((slot, joined)) = pending.next().await {
            let outcome = joined.unwrap_or_else(|e| ItemOutcome::Failed {
                item: group[slot].clone(),
                error: Error::TaskPanicked(e.to_string()),
            });

            let outcome = match outcome {
                ItemOutcome::Failed { error, .. } if self.config.fail_fast => {
                    // Dropping the remaining join handles detaches those tasks
                    tracing::warn!(
                        error = %error,
                        in_flight = pending.len(),
                        "item failed, stopping batch (fail-fast)"
                    );
                    return Err(error);
                }
                ItemOutcome::Failed { item, error } => {
                    tracing::warn!(error = %error, "item failed");
                    ItemOutcome::Failed { item, error }
                }
                other => other,
            };

            slots[slot] = Some(outcome.into_result(self.config.return_meta));
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

/// Run a batch with the default [`HttpTransport`] and no hooks
///
/// Shorthand for [`RequestBatcher::new`] followed by [`RequestBatcher::run`].
pub async fn request_batcher<I, F>(
    items: &[I],
    concurrency: usize,
    task: F,
    config: BatchConfig,
) -> Result<Vec<BatchResult<I>>>
where
    I: Clone + Send + Sync + 'static,
    F: Fn(&I) -> Option<RequestDescriptor> + Send + Sync + 'static,
{
    RequestBatcher::new(config)?
        .run(items, concurrency, task)
        .await
}
