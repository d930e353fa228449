//! oha - batch HTTP requests with retry, timeout and bounded concurrency
//!
//! Reads a JSON array, expands a URL template for every element and prints
//! the batch results as JSON.
//!
//! ```text
//! oha --input users.json --url "https://api.example.com/user/{{id}}" -c 5 -r 2
//! ```
//!
//! Metadata records are the default; `--no-meta` (alias `--raw`) prints bare
//! bodies. The HTTP method has no short flag since `-m` is `--meta`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use oh_no_again::template::expand_template;
use oh_no_again::{BatchConfig, RequestBatcher, RequestDescriptor, RetryConfig};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

/// Batch HTTP requests with retry, timeout and bounded concurrency
#[derive(Parser, Debug)]
#[command(name = "oha", author, version, about)]
struct Args {
    /// JSON file holding an array of items
    #[arg(short, long)]
    input: PathBuf,

    /// URL template; `{{key}}` is replaced with the item's field
    #[arg(short, long)]
    url: String,

    /// Requests in flight at once (also the group size)
    #[arg(short, long, default_value_t = 3)]
    concurrency: usize,

    /// Attempts per item; 0 sends each request once without timeout
    #[arg(short, long, default_value_t = 3)]
    retries: u32,

    /// Per-attempt timeout in milliseconds
    #[arg(short, long, default_value_t = 1000)]
    timeout: u64,

    /// Base backoff delay in milliseconds
    #[arg(short, long, default_value_t = 300)]
    delay: u64,

    /// Stop at the first item that fails after all retries
    #[arg(short, long)]
    fail_fast: bool,

    /// Print {item, result|error, success} records (the default)
    #[arg(short, long, overrides_with = "no_meta")]
    meta: bool,

    /// Print bare response bodies instead of metadata records
    #[arg(long = "no-meta", visible_alias = "raw", overrides_with = "meta")]
    no_meta: bool,

    /// HTTP method
    #[arg(long, default_value = "GET")]
    method: String,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "warn")]
    log_level: String,
}

impl Args {
    fn batch_config(&self) -> BatchConfig {
        BatchConfig {
            retry: RetryConfig {
                retries: self.retries,
                delay: Duration::from_millis(self.delay),
                timeout: Duration::from_millis(self.timeout),
                jitter: false,
            },
            fail_fast: self.fail_fast,
            return_meta: self.meta || !self.no_meta,
        }
    }
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_items(path: &Path) -> Result<Vec<Value>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read input file {}", path.display()))?;
    let parsed: Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse input file {}", path.display()))?;

    match parsed {
        Value::Array(items) => Ok(items),
        _ => bail!("input file {} must contain a JSON array", path.display()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level);

    let items = read_items(&args.input)?;
    tracing::info!(items = items.len(), concurrency = args.concurrency, "starting batch run");

    let template = args.url.clone();
    let method = args.method.clone();
    let batcher = RequestBatcher::new(args.batch_config())?;

    let results = batcher
        .run(&items, args.concurrency, move |item| {
            Some(
                RequestDescriptor::get(expand_template(&template, item))
                    .method(method.as_str())
                    .header("Content-Type", "application/json"),
            )
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
