//! OpenTelemetry attributes on the current span.
//!
//! Without the `observability` feature these are no-ops; the plain `tracing`
//! fields on the same spans are always recorded.

use crate::error::Error;

/// Tags the current span with the error's category and retryability.
#[cfg(feature = "observability")]
pub(crate) fn record_error(error: &Error) {
    use opentelemetry::Value;
    use tracing_opentelemetry::OpenTelemetrySpanExt;

    let span = tracing::Span::current();
    span.set_attribute("error.category", Value::from(error.category().to_string()));
    span.set_attribute("error.retryable", Value::from(error.is_retryable()));
}

#[cfg(not(feature = "observability"))]
pub(crate) fn record_error(_error: &Error) {}

/// Tags the current span with the number of poll attempts made.
#[cfg(feature = "observability")]
pub(crate) fn record_attempts(attempts: u64) {
    use tracing_opentelemetry::OpenTelemetrySpanExt;

    let attempts = i64::try_from(attempts).unwrap_or(i64::MAX);
    tracing::Span::current().set_attribute("poll.attempts", attempts);
}

#[cfg(not(feature = "observability"))]
pub(crate) fn record_attempts(_attempts: u64) {}
