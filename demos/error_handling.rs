//! Example: Proper error handling with retries.
//!
//! This example demonstrates how to handle errors properly, including
//! implementing retry logic based on error retryability.
//!
//! # Usage
//!
//! ```bash
//! export MAILPOOL_BASE_URL="http://mail-pool.internal:8000"
//! cargo run --example error_handling
//! ```

use mailpool_client::{Account, Error, ErrorCategory, MailPoolClient, MailPoolConfig};
use std::env;
use std::time::Duration;

const MAX_RETRIES: u32 = 3;
const INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Register with automatic retry for transient failures
async fn register_with_retry(client: &mut MailPoolClient) -> Result<Account, Error> {
    let mut backoff = INITIAL_BACKOFF;
    let mut attempt = 1;

    loop {
        println!("Registration attempt {attempt}/{MAX_RETRIES}...");

        match client.register_account().await {
            Ok(account) => {
                println!("Registered {}", account.email);
                return Ok(account);
            }
            Err(e) => {
                println!("  Error: {e}");
                println!("  Category: {}", e.category());
                println!("  Retryable: {}", e.is_retryable());

                if !e.is_retryable() || attempt >= MAX_RETRIES {
                    return Err(e);
                }

                println!("  Retrying in {backoff:?}...");
                tokio::time::sleep(backoff).await;
                backoff *= 2; // Exponential backoff
                attempt += 1;
            }
        }
    }
}

/// Poll with error classification
async fn poll_with_error_handling(client: &MailPoolClient) -> Result<Option<String>, Error> {
    match client
        .poll_for_code(Duration::from_secs(30), Duration::from_secs(5), None)
        .await
    {
        Ok(code) => Ok(Some(code)),
        Err(e) => match e.category() {
            ErrorCategory::Timeout => {
                // Nothing arrived in time - not a failure of the service
                println!("No code arrived within the time budget");
                Ok(None)
            }
            ErrorCategory::Network | ErrorCategory::Protocol => {
                println!("Service error: {e}");
                Err(e)
            }
            ErrorCategory::Parse => {
                println!("Service returned an unexpected payload: {e}");
                Err(e)
            }
            ErrorCategory::Configuration | ErrorCategory::NotFound | ErrorCategory::Cancelled => {
                println!("Cannot poll: {e}");
                Err(e)
            }
        },
    }
}

#[tokio::main]
async fn main() {
    let base_url =
        env::var("MAILPOOL_BASE_URL").expect("MAILPOOL_BASE_URL environment variable required");

    println!("mailpool-client - Error Handling Example\n");
    println!("========================================\n");

    let config = match MailPoolConfig::builder()
        .base_url(base_url)
        .request_timeout(Duration::from_secs(10))
        .build()
    {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            eprintln!("This error is NOT retryable - fix your configuration");
            std::process::exit(1);
        }
    };

    let mut client = match MailPoolClient::new(config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Could not build client: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = register_with_retry(&mut client).await {
        eprintln!("\nFailed to register after {MAX_RETRIES} attempts");
        eprintln!("Final error: {e}");
        std::process::exit(1);
    }

    println!("\nPolling for OTP codes...");
    match poll_with_error_handling(&client).await {
        Ok(Some(code)) => println!("Found OTP: {code}"),
        Ok(None) => println!("No OTP received"),
        Err(e) => eprintln!("Polling failed: {e}"),
    }

    println!("Done!");
}
