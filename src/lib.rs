//! # oh-no-again
//!
//! Retry, timeout and concurrency-limited batching for async tasks and HTTP
//! requests.
//!
//! ## Building blocks
//!
//! - [`retry::run_with_retry`] runs one cancellable operation with a
//!   per-attempt timeout and exponential backoff.
//! - [`batch::RequestBatcher`] splits its input into groups of `concurrency`
//!   items, runs each group's requests concurrently through the retry
//!   executor, and returns results in input order.
//! - [`hooks`] lets callers observe retries, aborts and batch progress.
//!
//! ## Quick Start
//!
//! ```no_run
//! use oh_no_again::{BatchConfig, RequestBatcher, RequestDescriptor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BatchConfig {
//!         return_meta: true,
//!         fail_fast: false,
//!         ..Default::default()
//!     };
//!
//!     let users = vec![1u32, 2, 3];
//!     let results = RequestBatcher::new(config)?
//!         .run(&users, 2, |id| {
//!             Some(RequestDescriptor::get(format!(
//!                 "https://jsonplaceholder.typicode.com/users/{id}"
//!             )))
//!         })
//!         .await?;
//!
//!     println!("{}", serde_json::to_string_pretty(&results)?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Concurrency-limited batch orchestration
pub mod batch;
/// Fixed-size partitioning of inputs
pub mod chunk;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Lifecycle hooks
pub mod hooks;
/// Retry logic with timeout and exponential backoff
pub mod retry;
/// URL template expansion
pub mod template;
/// HTTP transport
pub mod transport;

// Re-export commonly used types
pub use batch::{BatchRecord, BatchResult, RequestBatcher, request_batcher};
pub use chunk::create_batches;
pub use config::{BatchConfig, RetryConfig};
pub use error::{Error, Result};
pub use hooks::{BatchHooks, NoopHooks, RetryHooks};
pub use retry::run_with_retry;
pub use transport::{HttpTransport, RequestDescriptor, Transport, TransportResponse};
