//! Error types for the mailpool-client crate.
//!
//! All errors implement [`std::error::Error`] and provide context about what went wrong.
//! Errors are categorized by their retryability - see [`Error::is_retryable`].

use std::time::Duration;
use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the mailbox pool service.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / usage errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid email address format.
    #[error("invalid email format: {email}")]
    InvalidEmailFormat {
        /// The invalid email address.
        email: String,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// The proxy URL could not be turned into a reqwest proxy.
    #[error("invalid proxy URL")]
    InvalidProxy {
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// An operation needed a mailbox but none was selected yet.
    #[error("no mailbox selected; call register_account or use_mailbox first")]
    NoMailboxSelected,

    // ─────────────────────────────────────────────────────────────────────────
    // Transport / API errors (mostly RETRYABLE)
    // ─────────────────────────────────────────────────────────────────────────
    /// The HTTP request failed before a response was received.
    #[error("HTTP request to {url} failed")]
    Http {
        /// The requested URL.
        url: String,
        /// The underlying reqwest error.
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status code.
    #[error("HTTP {status} from {url}")]
    HttpStatus {
        /// The returned status code.
        status: u16,
        /// The requested URL.
        url: String,
    },

    /// The service answered 200 but flagged the payload with `success: false`.
    #[error("service rejected request to {url} (success=false)")]
    ApiRejected {
        /// The requested URL.
        url: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Parse errors (RETRYABLE - often a gateway page in place of JSON)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to decode the JSON response body.
    #[error("failed to decode response from {url}")]
    Decode {
        /// The requested URL.
        url: String,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Outcome errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// The account pool came back empty.
    #[error("account pool is empty")]
    EmptyPool,

    /// Polling ran out of attempts without finding a code.
    #[error("no verification code after {attempts} attempts ({timeout:?})")]
    WaitTimeout {
        /// The configured overall timeout.
        timeout: Duration,
        /// Number of attempts that were made.
        attempts: u64,
    },

    /// Polling was stopped by the caller's cancellation signal.
    #[error("polling cancelled")]
    Cancelled,
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might succeed on retry.
    ///
    /// The polling loop uses this to decide whether a failed attempt counts as
    /// "no code yet" or ends the poll. Transport failures, 429/5xx,
    /// `success=false` and undecodable bodies are retried: a proxy or gateway
    /// that briefly serves an HTML error page with status 200 shows up as a
    /// [`Error::Decode`], and the next attempt usually gets JSON again. Other
    /// 4xx statuses mean the request itself is wrong (unknown mailbox, bad
    /// base URL) and end the poll:
    ///
    /// ```
    /// use mailpool_client::Error;
    ///
    /// let err = Error::HttpStatus { status: 503, url: "http://x/accounts".into() };
    /// assert!(err.is_retryable());
    ///
    /// let err = Error::HttpStatus { status: 404, url: "http://x/accounts".into() };
    /// assert!(!err.is_retryable());
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http { .. } | Error::ApiRejected { .. } | Error::Decode { .. } => true,

            Error::HttpStatus { status, .. } => *status == 429 || *status >= 500,

            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::InvalidProxy { .. }
            | Error::NoMailboxSelected
            | Error::EmptyPool
            | Error::WaitTimeout { .. }
            | Error::Cancelled => false,
        }
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::InvalidProxy { .. }
            | Error::NoMailboxSelected => ErrorCategory::Configuration,

            Error::Http { .. } => ErrorCategory::Network,

            Error::HttpStatus { .. } | Error::ApiRejected { .. } => ErrorCategory::Protocol,

            Error::Decode { .. } => ErrorCategory::Parse,

            Error::EmptyPool => ErrorCategory::NotFound,

            Error::WaitTimeout { .. } => ErrorCategory::Timeout,

            Error::Cancelled => ErrorCategory::Cancelled,
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or usage errors.
    Configuration,
    /// Network connectivity errors.
    Network,
    /// Timeout errors.
    Timeout,
    /// The service answered, but not with what we asked for.
    Protocol,
    /// Response decoding errors.
    Parse,
    /// Nothing to work with (empty pool).
    NotFound,
    /// Stopped by the caller.
    Cancelled,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Parse => write!(f, "parse"),
            ErrorCategory::NotFound => write!(f, "not_found"),
            ErrorCategory::Cancelled => write!(f, "cancelled"),
        }
    }
}
