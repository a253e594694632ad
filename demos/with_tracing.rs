//! Example: Using tracing and observers for observability.
//!
//! This example demonstrates how to enable structured logging using
//! the `tracing` ecosystem, and how to receive the same progress as
//! [`PollEvent`]s through an observer.
//!
//! # Usage
//!
//! ```bash
//! export MAILPOOL_BASE_URL="http://mail-pool.internal:8000"
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=mailpool_client=debug
//!
//! cargo run --example with_tracing
//! ```

use mailpool_client::{MailPoolClient, MailPoolConfig, PollEvent};
use std::env;
use std::time::Duration;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> mailpool_client::Result<()> {
    // Use RUST_LOG to control log levels
    // Example: RUST_LOG=mailpool_client=debug,info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mailpool_client=info")),
        )
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let base_url =
        env::var("MAILPOOL_BASE_URL").expect("MAILPOOL_BASE_URL environment variable required");

    tracing::info!(base_url = %base_url, "Starting mailpool-client example");

    let config = MailPoolConfig::builder()
        .base_url(base_url)
        .poll_interval(Duration::from_secs(5))
        .max_wait(Duration::from_secs(30))
        .build()?;

    // Observer output goes to stdout next to the tracing output on stderr
    let mut client = MailPoolClient::builder(config)
        .observer(|event: &PollEvent| println!("[event] {event}"))
        .build()?;

    // Emits the register_account and api::fetch_all_accounts spans
    client.register_account().await?;

    // Emits the poll_for_code span with one fetch_verification_code span per attempt
    match client.poll_for_code_default(None).await {
        Ok(code) => {
            tracing::info!(otp = %code, "Found OTP code");
            println!("\nFound OTP: {code}");
        }
        Err(e) => {
            tracing::warn!(error = %e, category = %e.category(), "No OTP code found");
            println!("\nNo OTP found: {e}");
        }
    }

    tracing::info!("Example completed");
    Ok(())
}
