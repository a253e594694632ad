//! # mailpool-client
//!
//! Async client for mailbox-pool HTTP services: hand out inboxes round-robin
//! and poll them for verification codes.
//!
//! This crate provides a high-level, async API for:
//! - Fetching the account pool and selecting the next mailbox in rotation
//! - Scanning an inbox once for a code (OTP digits, labelled codes, custom patterns)
//! - Polling an inbox until a code arrives, with timeout and cancellation
//!
//! ## Features
//!
//! - **`observability`**: Enables OpenTelemetry integration for distributed tracing.
//!   Without this feature, tracing spans are still emitted but require no OTEL dependencies.
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailpool_client::{MailPoolClient, MailPoolConfig};
//! use std::time::Duration;
//!
//! # async fn example() -> mailpool_client::Result<()> {
//! let config = MailPoolConfig::builder()
//!     .base_url("http://mail-pool.internal:8000")
//!     .build()?;
//!
//! let mut client = MailPoolClient::new(config)?;
//!
//! // Take the next inbox from the pool
//! let account = client.register_account().await?;
//! println!("Sign up with {}", account.email);
//!
//! // Wait up to two minutes for a 6-digit code
//! let code = client
//!     .poll_for_code(Duration::from_secs(120), Duration::from_secs(4), None)
//!     .await?;
//! println!("Got code: {code}");
//! # Ok(())
//! # }
//! ```
//!
//! ## Sharing a Pool
//!
//! Rotation state lives in an [`AccountPool`]. Clients built with the same
//! `Arc<AccountPool>` continue one rotation instead of each starting at the
//! first account:
//!
//! ```no_run
//! use mailpool_client::{AccountPool, MailPoolClient, MailPoolConfig};
//! use std::sync::Arc;
//!
//! # async fn example() -> mailpool_client::Result<()> {
//! let pool = Arc::new(AccountPool::new());
//! let config = MailPoolConfig::default();
//!
//! let mut a = MailPoolClient::builder(config.clone()).pool(Arc::clone(&pool)).build()?;
//! let mut b = MailPoolClient::builder(config).pool(pool).build()?;
//!
//! let first = a.register_account().await?;
//! let second = b.register_account().await?;
//! assert_ne!(first.id, second.id);
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom Pattern Matching
//!
//! ```
//! use mailpool_client::matcher::{ClosureMatcher, Matcher, RegexMatcher};
//! use std::borrow::Cow;
//!
//! // Extract a token from a link
//! let matcher = RegexMatcher::new(r"token=([a-f0-9]{32})").unwrap();
//!
//! // Or use a closure for complex logic
//! let custom = ClosureMatcher::new(
//!     |text| {
//!         text.lines()
//!             .find(|line| line.starts_with("PIN:"))
//!             .map(|line| Cow::Owned(line.trim_start_matches("PIN:").trim().to_string()))
//!     },
//!     "pin line",
//! );
//! assert_eq!(custom.find_match("hello\nPIN: 4821").as_deref(), Some("4821"));
//! ```
//!
//! ## Error Handling
//!
//! All errors implement `std::error::Error` and provide context. Use [`Error::is_retryable`]
//! to determine if an operation can be retried:
//!
//! ```
//! use mailpool_client::Error;
//!
//! fn handle_error(error: &Error) {
//!     if error.is_retryable() {
//!         println!("Transient error, can retry: {}", error);
//!     } else {
//!         println!("Permanent error ({}): {}", error.category(), error);
//!     }
//! }
//! ```
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. All major operations emit spans with
//! structured fields suitable for distributed tracing. The same progress is
//! available programmatically through an [`Observer`].
//!
//! ### Span Naming Convention
//!
//! - `MailPoolClient::register_account` - Pool refresh and selection
//! - `MailPoolClient::fetch_verification_code` - Single inbox scan
//! - `MailPoolClient::poll_for_code` - Polling loop
//! - `api::fetch_all_accounts` - Account pagination
//! - `api::fetch_accounts_page` - One account page
//! - `api::list_messages` - Inbox listing
//!
//! ### Standard Fields
//!
//! - `email` - Mailbox address
//! - `matcher` - Matcher description
//! - `attempt` / `max_attempts` - Poll progress
//! - `status` - HTTP status code
//!
//! Enable the `observability` feature for OpenTelemetry integration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod matcher;
pub mod models;
pub mod pool;
pub mod proxy;

// Internal modules
mod client;
mod scan;
mod telemetry;

// Re-exports for ergonomic API
pub use api::{HttpMailApi, MailApi};
pub use client::{MailPoolClient, MailPoolClientBuilder, Mailbox};
pub use config::{MailPoolConfig, MailPoolConfigBuilder, PollingConfig};
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use events::{Observer, PollEvent};
pub use models::{Account, Message};
pub use pool::{AccountPool, Selection};
pub use proxy::HttpProxy;
