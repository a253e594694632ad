//! Configuration for the mailbox pool client.
//!
//! Use [`MailPoolConfigBuilder`] to create a configuration with sensible defaults:
//!
//! ```
//! use mailpool_client::MailPoolConfig;
//!
//! let config = MailPoolConfig::builder()
//!     .base_url("http://mail-pool.internal:8000/")
//!     .build()
//!     .expect("valid config");
//!
//! assert_eq!(config.base_url(), "http://mail-pool.internal:8000");
//! ```

use crate::error::{Error, Result};
use crate::proxy::HttpProxy;
use std::time::Duration;

/// Base URL used when none (or a blank one) is configured.
pub const DEFAULT_BASE_URL: &str = "http://your-outlook-api.com";

/// Accounts requested per page when fetching the pool.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Mail folder listed when scanning for codes.
pub const DEFAULT_FOLDER: &str = "inbox";

/// Configuration for talking to a mailbox pool service.
///
/// Create using [`MailPoolConfig::builder()`].
#[derive(Debug, Clone)]
pub struct MailPoolConfig {
    base_url: String,
    /// Optional HTTP/HTTPS proxy for every request.
    pub proxy: Option<HttpProxy>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Page size used when paginating the account list.
    pub page_size: usize,
    /// Folder listed when scanning messages.
    pub folder: String,
    /// Polling configuration for [`poll_for_code_default`](crate::MailPoolClient::poll_for_code_default).
    pub polling: PollingConfig,
}

impl MailPoolConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> MailPoolConfigBuilder {
        MailPoolConfigBuilder::default()
    }

    /// Returns the base URL without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of one page of the account list.
    #[must_use]
    pub fn accounts_url(&self, page: u32, page_size: usize) -> String {
        format!(
            "{}/accounts?page={page}&page_size={page_size}",
            self.base_url
        )
    }

    /// URL listing the configured folder of `email`.
    #[must_use]
    pub fn messages_url(&self, email: &str) -> String {
        format!(
            "{}/emails/by-email/{email}?folder={}",
            self.base_url, self.folder
        )
    }
}

impl Default for MailPoolConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            proxy: None,
            request_timeout: Duration::from_secs(120),
            page_size: DEFAULT_PAGE_SIZE,
            folder: DEFAULT_FOLDER.to_string(),
            polling: PollingConfig::default(),
        }
    }
}

/// Polling configuration for wait operations.
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Interval between polling attempts.
    pub interval: Duration,
    /// Overall time budget; together with `interval` it fixes the attempt count.
    pub max_wait: Duration,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(4),
            max_wait: Duration::from_secs(120),
        }
    }
}

impl PollingConfig {
    /// Number of attempts a poll makes: `max(1, max_wait / interval)`.
    ///
    /// The division uses the full durations, so sub-second and fractional
    /// intervals never push the total wait past `max_wait`.
    ///
    /// ```
    /// use mailpool_client::PollingConfig;
    /// use std::time::Duration;
    ///
    /// let polling = PollingConfig {
    ///     interval: Duration::from_secs(5),
    ///     max_wait: Duration::from_secs(10),
    /// };
    /// assert_eq!(polling.max_attempts(), 2);
    /// ```
    #[must_use]
    pub fn max_attempts(&self) -> u64 {
        max_attempts(self.max_wait, self.interval)
    }
}

pub(crate) fn max_attempts(timeout: Duration, interval: Duration) -> u64 {
    let interval = interval.as_nanos();
    if interval == 0 {
        return 1;
    }
    u64::try_from(timeout.as_nanos() / interval)
        .unwrap_or(u64::MAX)
        .max(1)
}

/// Builder for [`MailPoolConfig`].
#[derive(Debug, Default)]
pub struct MailPoolConfigBuilder {
    base_url: Option<String>,
    proxy: Option<HttpProxy>,
    request_timeout: Option<Duration>,
    page_size: Option<usize>,
    folder: Option<String>,
    polling: Option<PollingConfig>,
}

impl MailPoolConfigBuilder {
    /// Sets the service base URL. Blank input keeps the default.
    #[must_use]
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Routes all requests through an HTTP proxy.
    #[must_use]
    pub fn proxy(mut self, proxy: HttpProxy) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Sets the proxy from a URL string; blank input means no proxy.
    #[must_use]
    pub fn proxy_url(mut self, url: &str) -> Self {
        self.proxy = HttpProxy::from_optional(Some(url));
        self
    }

    /// Sets the per-request timeout (default 120 seconds).
    #[must_use]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Sets the account page size (default 100).
    #[must_use]
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    /// Sets the folder to scan (default `inbox`).
    #[must_use]
    pub fn folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Sets polling configuration.
    #[must_use]
    pub fn polling(mut self, polling: PollingConfig) -> Self {
        self.polling = Some(polling);
        self
    }

    /// Sets the polling interval.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .interval = interval;
        self
    }

    /// Sets the maximum time to wait for a code.
    #[must_use]
    pub fn max_wait(mut self, max_wait: Duration) -> Self {
        self.polling
            .get_or_insert_with(PollingConfig::default)
            .max_wait = max_wait;
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the base URL is not an http(s) URL,
    /// the page size is zero or the folder is blank, and
    /// [`Error::InvalidProxy`] if the proxy URL is rejected.
    pub fn build(self) -> Result<MailPoolConfig> {
        let base_url = normalize_base_url(self.base_url.as_deref());

        let parsed = reqwest::Url::parse(&base_url).map_err(|e| Error::InvalidConfig {
            message: format!("base_url '{base_url}' is not a valid URL: {e}"),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig {
                message: format!("base_url '{base_url}' must use http or https"),
            });
        }

        let page_size = self.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(Error::InvalidConfig {
                message: "page_size must be > 0".into(),
            });
        }

        let folder = self.folder.unwrap_or_else(|| DEFAULT_FOLDER.to_string());
        if folder.trim().is_empty() {
            return Err(Error::InvalidConfig {
                message: "folder must not be blank".into(),
            });
        }

        if let Some(proxy) = &self.proxy {
            proxy.to_reqwest()?;
        }

        Ok(MailPoolConfig {
            base_url,
            proxy: self.proxy,
            request_timeout: self.request_timeout.unwrap_or(Duration::from_secs(120)),
            page_size,
            folder,
            polling: self.polling.unwrap_or_default(),
        })
    }
}

fn normalize_base_url(raw: Option<&str>) -> String {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    let url = if trimmed.is_empty() {
        DEFAULT_BASE_URL
    } else {
        trimmed
    };
    url.trim_end_matches('/').to_string()
}
