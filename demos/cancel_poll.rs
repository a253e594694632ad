//! Example: Stop polling early with Ctrl+C or a deadline.
//!
//! `poll_for_code_until` takes any future as a cancellation signal. Here the
//! poll stops on Ctrl+C or after 30 seconds, whichever comes first, even
//! though the poll itself would wait for five minutes.
//!
//! # Usage
//!
//! ```bash
//! export MAILPOOL_BASE_URL="http://mail-pool.internal:8000"
//! cargo run --example cancel_poll
//! ```

use mailpool_client::{Error, MailPoolClient, MailPoolConfig};
use std::env;
use std::time::Duration;

#[tokio::main]
async fn main() -> mailpool_client::Result<()> {
    let base_url =
        env::var("MAILPOOL_BASE_URL").expect("MAILPOOL_BASE_URL environment variable required");

    let config = MailPoolConfig::builder().base_url(base_url).build()?;
    let mut client = MailPoolClient::new(config)?;

    let account = client.register_account().await?;
    println!("Waiting for a code at {} (Ctrl+C to stop)...", account.email);

    let stop = async {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => println!("\nInterrupted"),
            () = tokio::time::sleep(Duration::from_secs(30)) => println!("\nDeadline reached"),
        }
    };

    match client
        .poll_for_code_until(Duration::from_secs(300), Duration::from_secs(5), None, stop)
        .await
    {
        Ok(code) => println!("Got OTP code: {code}"),
        Err(Error::Cancelled) => println!("Polling cancelled, no code"),
        Err(e) => return Err(e),
    }

    Ok(())
}
