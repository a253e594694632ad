//! Basic example: Take an inbox from the pool and wait for an OTP code.
//!
//! This example demonstrates the most common use case - registering the next
//! mailbox from the pool and polling it for a 6-digit code.
//!
//! # Usage
//!
//! ```bash
//! export MAILPOOL_BASE_URL="http://mail-pool.internal:8000"
//! cargo run --example basic_otp
//! ```

use mailpool_client::{MailPoolClient, MailPoolConfig};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> mailpool_client::Result<()> {
    let base_url =
        env::var("MAILPOOL_BASE_URL").expect("MAILPOOL_BASE_URL environment variable required");

    let config = MailPoolConfig::builder().base_url(base_url).build()?;
    let mut client = MailPoolClient::new(config)?;

    // Pick the next inbox in rotation
    let account = client.register_account().await?;
    println!("Registered mailbox #{}: {}", account.id, account.email);
    println!("Use this address to sign up, then wait for the code...");

    // Only accept mail that arrives from now on
    let since = chrono::Utc::now();

    let code = client
        .poll_for_code(Duration::from_secs(120), Duration::from_secs(4), Some(since))
        .await?;

    println!("Got OTP code: {code}");
    Ok(())
}
