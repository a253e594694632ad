//! Structured progress events.
//!
//! Every step of registration and polling is reported through `tracing`.
//! Callers that want the same information programmatically (for a UI, or to
//! forward into their own log pipeline) can attach an [`Observer`] to the
//! client. Any `Fn(&PollEvent) + Send + Sync` closure is an observer.
//!
//! ```
//! use mailpool_client::{PollEvent, Observer};
//! use std::sync::{Arc, Mutex};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = Arc::clone(&seen);
//! let observer = move |event: &PollEvent| sink.lock().unwrap().push(event.to_string());
//!
//! observer.on_event(&PollEvent::InboxEmpty { email: "a@b.c".into() });
//! assert_eq!(seen.lock().unwrap()[0], "inbox of a@b.c is empty");
//! ```

use std::time::Duration;

/// One step of a registration or poll.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PollEvent {
    /// A request is about to be sent.
    RequestSent {
        /// HTTP method.
        method: &'static str,
        /// Target URL.
        url: String,
    },
    /// A response arrived.
    ResponseReceived {
        /// Target URL.
        url: String,
        /// HTTP status code.
        status: u16,
    },
    /// An account was picked from the pool.
    AccountSelected {
        /// The account's mailbox.
        email: String,
        /// Zero-based position in the pool.
        index: usize,
        /// Pool size at selection time.
        total: usize,
    },
    /// The inbox had no messages.
    InboxEmpty {
        /// The mailbox.
        email: String,
    },
    /// The inbox listed `count` messages.
    MessagesReceived {
        /// The mailbox.
        email: String,
        /// Number of listed messages.
        count: usize,
    },
    /// Messages older than the `since` cut-off were ignored.
    MessagesSkipped {
        /// Number of skipped messages.
        count: usize,
    },
    /// A code was found.
    CodeFound {
        /// The extracted code.
        code: String,
    },
    /// No listed message contained a code.
    CodeNotFound,
    /// A poll attempt is starting.
    AttemptStarted {
        /// One-based attempt number.
        attempt: u64,
        /// Attempt limit.
        max_attempts: u64,
    },
    /// A poll attempt failed with a retryable error.
    AttemptFailed {
        /// One-based attempt number.
        attempt: u64,
        /// Error message.
        error: String,
    },
    /// Polling gave up.
    TimedOut {
        /// The configured time budget.
        timeout: Duration,
    },
    /// Polling was cancelled by the caller.
    Cancelled,
}

impl std::fmt::Display for PollEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PollEvent::RequestSent { method, url } => write!(f, "sending {method} {url}"),
            PollEvent::ResponseReceived { url, status } => {
                write!(f, "received HTTP {status} from {url}")
            }
            PollEvent::AccountSelected {
                email,
                index,
                total,
            } => write!(f, "selected account #{}/{total}: {email}", index + 1),
            PollEvent::InboxEmpty { email } => write!(f, "inbox of {email} is empty"),
            PollEvent::MessagesReceived { email, count } => {
                write!(f, "{count} messages in {email}, scanning for a code")
            }
            PollEvent::MessagesSkipped { count } => write!(f, "skipped {count} older messages"),
            PollEvent::CodeFound { code } => write!(f, "found verification code {code}"),
            PollEvent::CodeNotFound => write!(f, "no verification code in any message"),
            PollEvent::AttemptStarted {
                attempt,
                max_attempts,
            } => write!(f, "poll attempt {attempt}/{max_attempts}"),
            PollEvent::AttemptFailed { attempt, error } => {
                write!(f, "poll attempt {attempt} failed: {error}")
            }
            PollEvent::TimedOut { timeout } => {
                write!(f, "timed out waiting for a verification code ({timeout:?})")
            }
            PollEvent::Cancelled => write!(f, "polling cancelled"),
        }
    }
}

/// Receives [`PollEvent`]s from a client.
pub trait Observer: Send + Sync {
    /// Called synchronously for each event.
    fn on_event(&self, event: &PollEvent);
}

impl<F> Observer for F
where
    F: Fn(&PollEvent) + Send + Sync,
{
    fn on_event(&self, event: &PollEvent) {
        self(event);
    }
}
