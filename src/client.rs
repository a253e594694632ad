//! Mailbox pool client: account selection and verification code polling.
//!
//! The [`MailPoolClient`] is the main entry point for this crate. It provides
//! async methods to:
//!
//! - Pick the next mailbox from a shared pool ([`register_account`](MailPoolClient::register_account))
//! - Scan the selected inbox once ([`fetch_verification_code`](MailPoolClient::fetch_verification_code))
//! - Poll until a code arrives ([`poll_for_code`](MailPoolClient::poll_for_code))
//!
//! # Example
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
//! let account = client.register_account().await?;
//! println!("Sign up with {}", account.email);
//!
//! let code = client
//!     .poll_for_code(Duration::from_secs(120), Duration::from_secs(4), None)
//!     .await?;
//! println!("Got code: {code}");
//! # Ok(())
//! # }
//! ```

use crate::api::{self, HttpMailApi, MailApi};
use crate::config::{self, MailPoolConfig};
use crate::error::{Error, Result};
use crate::events::{Observer, PollEvent};
use crate::matcher::{Matcher, OtpMatcher};
use crate::models::{Account, Message};
use crate::pool::AccountPool;
use crate::scan::{self, ScanOutcome};
use crate::telemetry;
use chrono::{DateTime, Utc};
use email_address::EmailAddress;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// The mailbox a client currently works with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    /// Mailbox address.
    pub email: String,
    /// Pool account id; `None` when set through [`MailPoolClient::use_mailbox`].
    pub account_id: Option<u64>,
}

/// Async client for a mailbox pool service.
///
/// Create using [`MailPoolClient::new`] or [`MailPoolClient::builder`].
///
/// # Lifecycle
///
/// 1. Select a mailbox with [`register_account`](Self::register_account) or
///    [`use_mailbox`](Self::use_mailbox)
/// 2. Use [`poll_for_code`](Self::poll_for_code) or
///    [`fetch_verification_code`](Self::fetch_verification_code)
///
/// Clients that should rotate through the same pool must share one
/// [`AccountPool`] via [`MailPoolClientBuilder::pool`].
pub struct MailPoolClient<A: MailApi = HttpMailApi> {
    api: A,
    config: MailPoolConfig,
    pool: Arc<AccountPool>,
    matcher: Arc<dyn Matcher>,
    observer: Option<Arc<dyn Observer>>,
    mailbox: Option<Mailbox>,
}

impl MailPoolClient<HttpMailApi> {
    /// Creates an HTTP client with its own pool and the default 6-digit matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built (e.g. invalid proxy).
    pub fn new(config: MailPoolConfig) -> Result<Self> {
        MailPoolClientBuilder::new(config).build()
    }

    /// Creates a builder for customizing pool, matcher and observer.
    #[must_use]
    pub fn builder(config: MailPoolConfig) -> MailPoolClientBuilder {
        MailPoolClientBuilder::new(config)
    }
}

impl<A: MailApi> MailPoolClient<A> {
    /// Fetches the account pool and selects the next account in rotation.
    ///
    /// The shared pool cache is replaced with whatever was fetched, even when
    /// that is nothing.
    ///
    /// # Errors
    ///
    /// - [`Error::EmptyPool`] if the service returned no accounts
    /// - the first-page error if the very first page could not be fetched
    #[instrument(name = "MailPoolClient::register_account", skip(self))]
    pub async fn register_account(&mut self) -> Result<Account> {
        info!("Fetching account pool");

        let (accounts, failure) =
            match api::fetch_all_accounts(&self.api, self.config.page_size).await {
                Ok(accounts) => (accounts, None),
                Err(e) => {
                    warn!(error = %e, "Failed to fetch account pool");
                    (Vec::new(), Some(e))
                }
            };

        let Some(selection) = self.pool.refresh_and_next(accounts).await else {
            let err = failure.unwrap_or(Error::EmptyPool);
            warn!(error = %err, "No account available");
            telemetry::record_error(&err);
            return Err(err);
        };

        info!(
            email = %selection.account.email,
            index = selection.index + 1,
            total = selection.total,
            "Selected account"
        );
        self.emit(PollEvent::AccountSelected {
            email: selection.account.email.clone(),
            index: selection.index,
            total: selection.total,
        });

        self.mailbox = Some(Mailbox {
            email: selection.account.email.clone(),
            account_id: Some(selection.account.id),
        });

        Ok(selection.account)
    }

    /// Works with an existing address instead of one from the pool.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEmailFormat`] if `email` is not a valid address.
    pub fn use_mailbox(&mut self, email: &str) -> Result<()> {
        let email = validate_email(email)?;
        debug!(email = %email, "Using mailbox");
        self.mailbox = Some(Mailbox {
            email: email.to_string(),
            account_id: None,
        });
        Ok(())
    }

    /// Lists the messages of `email` without scanning them.
    ///
    /// # Errors
    ///
    /// Returns transport, status, `success=false` or decode errors.
    pub async fn list_messages(&self, email: &str) -> Result<Vec<Message>> {
        self.api.list_messages(email).await
    }

    /// Scans the selected inbox once for a verification code.
    ///
    /// Messages are checked newest first. With `since`, messages whose
    /// timestamp parses to an earlier instant are ignored; messages without a
    /// usable timestamp are always checked.
    ///
    /// Returns `Ok(None)` when the inbox is empty or nothing matched.
    ///
    /// # Errors
    ///
    /// - [`Error::NoMailboxSelected`] if no mailbox was selected
    /// - any error from listing the inbox
    #[instrument(
        name = "MailPoolClient::fetch_verification_code",
        skip(self),
        fields(matcher = %self.matcher.description())
    )]
    pub async fn fetch_verification_code(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Option<String>> {
        let email = self.require_email()?;

        debug!(email = %email, "Fetching messages");
        let messages = self.api.list_messages(email).await?;

        if messages.is_empty() {
            debug!(email = %email, "Inbox is empty");
            self.emit(PollEvent::InboxEmpty {
                email: email.to_string(),
            });
            return Ok(None);
        }

        debug!(count = messages.len(), "Scanning messages");
        self.emit(PollEvent::MessagesReceived {
            email: email.to_string(),
            count: messages.len(),
        });

        match scan::scan_messages(messages, since, self.matcher.as_ref()) {
            ScanOutcome::Found { code, position } => {
                info!(position, "Found verification code");
                self.emit(PollEvent::CodeFound { code: code.clone() });
                Ok(Some(code))
            }
            ScanOutcome::NotFound { skipped } => {
                if skipped > 0 {
                    debug!(skipped, "Skipped older messages");
                    self.emit(PollEvent::MessagesSkipped { count: skipped });
                }
                warn!("No verification code in any message");
                self.emit(PollEvent::CodeNotFound);
                Ok(None)
            }
        }
    }

    /// Polls the selected inbox until a code arrives or attempts run out.
    ///
    /// Makes `max(1, timeout / interval)` attempts, waiting `interval`
    /// between them, so the total wait never exceeds `timeout`. Retryable errors count as "no code yet".
    ///
    /// # Errors
    ///
    /// - [`Error::NoMailboxSelected`] if no mailbox was selected
    /// - [`Error::WaitTimeout`] when every attempt came back empty
    /// - the first non-retryable error from an attempt
    pub async fn poll_for_code(
        &self,
        timeout: Duration,
        interval: Duration,
        since: Option<DateTime<Utc>>,
    ) -> Result<String> {
        self.poll_for_code_until(timeout, interval, since, std::future::pending())
            .await
    }

    /// [`poll_for_code`](Self::poll_for_code) using the configured [`PollingConfig`](crate::PollingConfig).
    ///
    /// # Errors
    ///
    /// Same as [`poll_for_code`](Self::poll_for_code).
    pub async fn poll_for_code_default(&self, since: Option<DateTime<Utc>>) -> Result<String> {
        let polling = &self.config.polling;
        self.poll_for_code(polling.max_wait, polling.interval, since)
            .await
    }

    /// Like [`poll_for_code`](Self::poll_for_code), but stops as soon as
    /// `cancel` resolves, whether mid-request or mid-wait.
    ///
    /// # Errors
    ///
    /// Everything [`poll_for_code`](Self::poll_for_code) returns, plus
    /// [`Error::Cancelled`].
    ///
    /// # Example
    ///
    /// ```no_run
    /// use mailpool_client::{MailPoolClient, MailPoolConfig};
    /// use std::time::Duration;
    ///
    /// # async fn example(client: MailPoolClient) -> mailpool_client::Result<()> {
    /// let (stop, stopped) = tokio::sync::oneshot::channel::<()>();
    /// # drop(stop);
    /// let code = client
    ///     .poll_for_code_until(
    ///         Duration::from_secs(300),
    ///         Duration::from_secs(5),
    ///         None,
    ///         async move {
    ///             let _ = stopped.await;
    ///         },
    ///     )
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(
        name = "MailPoolClient::poll_for_code",
        skip(self, since, cancel),
        fields(
            timeout_secs = timeout.as_secs(),
            interval_secs = interval.as_secs(),
            since = ?since
        )
    )]
    pub async fn poll_for_code_until<F>(
        &self,
        timeout: Duration,
        interval: Duration,
        since: Option<DateTime<Utc>>,
        cancel: F,
    ) -> Result<String>
    where
        F: Future<Output = ()>,
    {
        let email = self.require_email()?;
        let max_attempts = config::max_attempts(timeout, interval);

        info!(email = %email, max_attempts, "Polling for verification code");

        tokio::pin!(cancel);

        for attempt in 1..=max_attempts {
            debug!(attempt, max_attempts, "Poll attempt");
            self.emit(PollEvent::AttemptStarted {
                attempt,
                max_attempts,
            });

            let result = tokio::select! {
                biased;
                () = &mut cancel => return Err(self.cancelled(attempt)),
                result = self.fetch_verification_code(since) => result,
            };

            match result {
                Ok(Some(code)) => {
                    info!(attempt, "Verification code received");
                    telemetry::record_attempts(attempt);
                    return Ok(code);
                }
                Ok(None) => {}
                Err(e) if e.is_retryable() => {
                    warn!(attempt, error = %e, "Poll attempt failed, will retry");
                    self.emit(PollEvent::AttemptFailed {
                        attempt,
                        error: e.to_string(),
                    });
                }
                Err(e) => {
                    warn!(attempt, error = %e, category = %e.category(), "Poll aborted");
                    telemetry::record_attempts(attempt);
                    telemetry::record_error(&e);
                    return Err(e);
                }
            }

            if attempt < max_attempts {
                tokio::select! {
                    biased;
                    () = &mut cancel => return Err(self.cancelled(attempt)),
                    () = tokio::time::sleep(interval) => {}
                }
            }
        }

        error!(
            timeout_secs = timeout.as_secs(),
            max_attempts, "Timed out waiting for verification code"
        );
        self.emit(PollEvent::TimedOut { timeout });

        let err = Error::WaitTimeout {
            timeout,
            attempts: max_attempts,
        };
        telemetry::record_attempts(max_attempts);
        telemetry::record_error(&err);
        Err(err)
    }

    /// Returns the selected mailbox, if any.
    #[must_use]
    pub fn mailbox(&self) -> Option<&Mailbox> {
        self.mailbox.as_ref()
    }

    /// Returns the selected email address, if any.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.mailbox.as_ref().map(|m| m.email.as_str())
    }

    /// Returns the pool account id of the selected mailbox, if any.
    #[must_use]
    pub fn account_id(&self) -> Option<u64> {
        self.mailbox.as_ref().and_then(|m| m.account_id)
    }

    /// Returns the shared account pool.
    #[must_use]
    pub fn pool(&self) -> &Arc<AccountPool> {
        &self.pool
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &MailPoolConfig {
        &self.config
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private methods
    // ─────────────────────────────────────────────────────────────────────────

    fn require_email(&self) -> Result<&str> {
        match self.email() {
            Some(email) => Ok(email),
            None => {
                warn!("No mailbox selected");
                Err(Error::NoMailboxSelected)
            }
        }
    }

    fn cancelled(&self, attempt: u64) -> Error {
        info!(attempt, "Polling cancelled");
        self.emit(PollEvent::Cancelled);
        Error::Cancelled
    }

    fn emit(&self, event: PollEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }
}

impl<A: MailApi> std::fmt::Debug for MailPoolClient<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailPoolClient")
            .field("base_url", &self.config.base_url())
            .field("mailbox", &self.mailbox)
            .field("matcher", &self.matcher.description())
            .finish_non_exhaustive()
    }
}

/// Validates an email address format.
fn validate_email(email: &str) -> Result<EmailAddress> {
    EmailAddress::parse_with_options(email.trim(), email_address::Options::default()).map_err(
        |_| Error::InvalidEmailFormat {
            email: email.to_string(),
        },
    )
}

/// Builder for [`MailPoolClient`].
pub struct MailPoolClientBuilder {
    config: MailPoolConfig,
    pool: Option<Arc<AccountPool>>,
    matcher: Option<Arc<dyn Matcher>>,
    observer: Option<Arc<dyn Observer>>,
}

impl MailPoolClientBuilder {
    /// Starts a builder from a configuration.
    #[must_use]
    pub fn new(config: MailPoolConfig) -> Self {
        Self {
            config,
            pool: None,
            matcher: None,
            observer: None,
        }
    }

    /// Shares an account pool (and its rotation index) with other clients.
    #[must_use]
    pub fn pool(mut self, pool: Arc<AccountPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// Sets the code extractor (default: [`OtpMatcher::six_digit`]).
    #[must_use]
    pub fn matcher(mut self, matcher: impl Matcher + 'static) -> Self {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// Receives structured progress events.
    #[must_use]
    pub fn observer(mut self, observer: impl Observer + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Builds a client that talks HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build(self) -> Result<MailPoolClient<HttpMailApi>> {
        let mut api = HttpMailApi::new(self.config.clone())?;
        if let Some(observer) = &self.observer {
            api = api.with_observer(Arc::clone(observer));
        }
        Ok(self.build_with_api(api))
    }

    /// Builds a client over any [`MailApi`] implementation.
    #[must_use]
    pub fn build_with_api<A: MailApi>(self, api: A) -> MailPoolClient<A> {
        MailPoolClient {
            api,
            config: self.config,
            pool: self.pool.unwrap_or_default(),
            matcher: self
                .matcher
                .unwrap_or_else(|| Arc::new(OtpMatcher::six_digit())),
            observer: self.observer,
            mailbox: None,
        }
    }
}

impl std::fmt::Debug for MailPoolClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailPoolClientBuilder")
            .field("config", &self.config)
            .field("shared_pool", &self.pool.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::RegexMatcher;
    use std::collections::{HashSet, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeApi {
        accounts: Mutex<Vec<Account>>,
        inbox: Mutex<VecDeque<Result<Vec<Message>>>>,
        list_calls: AtomicUsize,
    }

    impl FakeApi {
        fn with_accounts(n: u64) -> Self {
            let api = Self::default();
            *api.accounts.lock().unwrap() = (0..n)
                .map(|id| Account {
                    id,
                    email: format!("user{id}@outlook.com"),
                })
                .collect();
            api
        }

        fn push(&self, response: Result<Vec<Message>>) {
            self.inbox.lock().unwrap().push_back(response);
        }

        fn list_calls(&self) -> usize {
            self.list_calls.load(Ordering::SeqCst)
        }
    }

    impl MailApi for FakeApi {
        async fn fetch_accounts_page(&self, page: u32, page_size: usize) -> Result<Vec<Account>> {
            let all = self.accounts.lock().unwrap().clone();
            Ok(all
                .into_iter()
                .skip((page as usize - 1) * page_size)
                .take(page_size)
                .collect())
        }

        async fn list_messages(&self, _email: &str) -> Result<Vec<Message>> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let next = self.inbox.lock().unwrap().pop_front();
            next.unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    fn message(received: &str, body: &str) -> Message {
        Message {
            subject: Some("Verify your account".into()),
            body: Some(body.into()),
            body_preview: None,
            received_time: Some(received.into()),
        }
    }

    fn client(api: Arc<FakeApi>) -> MailPoolClient<Arc<FakeApi>> {
        MailPoolClientBuilder::new(MailPoolConfig::default()).build_with_api(api)
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[tokio::test]
    async fn test_register_cycles_through_pool() {
        let api = Arc::new(FakeApi::with_accounts(4));
        let mut client = client(Arc::clone(&api));

        let mut seen = HashSet::new();
        for _ in 0..4 {
            let account = client.register_account().await.unwrap();
            assert_eq!(client.email(), Some(account.email.as_str()));
            assert_eq!(client.account_id(), Some(account.id));
            assert!(seen.insert(account.id));
        }
        assert_eq!(client.register_account().await.unwrap().id, 0);
    }

    #[tokio::test]
    async fn test_register_paginates_past_first_page() {
        let api = Arc::new(FakeApi::with_accounts(250));
        let mut client = client(api);
        client.register_account().await.unwrap();
        assert_eq!(client.pool().len().await, 250);
    }

    #[tokio::test]
    async fn test_register_fails_on_empty_pool() {
        let mut client = client(Arc::new(FakeApi::default()));
        let err = client.register_account().await.unwrap_err();
        assert!(matches!(err, Error::EmptyPool));
        assert!(client.email().is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_zero_page_size() {
        let mut config = MailPoolConfig::default();
        config.page_size = 0;
        let mut client =
            MailPoolClientBuilder::new(config).build_with_api(Arc::new(FakeApi::with_accounts(3)));

        let err = client.register_account().await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert!(client.email().is_none());
    }

    #[tokio::test]
    async fn test_clients_sharing_a_pool_rotate_together() {
        let api = Arc::new(FakeApi::with_accounts(2));
        let pool = Arc::new(AccountPool::new());
        let mut a = MailPoolClientBuilder::new(MailPoolConfig::default())
            .pool(Arc::clone(&pool))
            .build_with_api(Arc::clone(&api));
        let mut b = MailPoolClientBuilder::new(MailPoolConfig::default())
            .pool(pool)
            .build_with_api(api);

        let first = a.register_account().await.unwrap();
        let second = b.register_account().await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_use_mailbox_validates() {
        let mut client = client(Arc::new(FakeApi::default()));
        assert!(matches!(
            client.use_mailbox("not-an-email"),
            Err(Error::InvalidEmailFormat { .. })
        ));

        client.use_mailbox("someone@outlook.com").unwrap();
        assert_eq!(client.email(), Some("someone@outlook.com"));
        assert_eq!(client.account_id(), None);
    }

    #[tokio::test]
    async fn test_fetch_requires_mailbox() {
        let api = Arc::new(FakeApi::default());
        api.push(Ok(vec![message("2026-01-01T00:00:00Z", "123456")]));
        let client = client(Arc::clone(&api));

        let err = client.fetch_verification_code(None).await.unwrap_err();
        assert!(matches!(err, Error::NoMailboxSelected));
        assert_eq!(api.list_calls(), 0);
    }

    #[tokio::test]
    async fn test_fetch_empty_inbox_is_none() {
        let api = Arc::new(FakeApi::default());
        let mut client = client(api);
        client.use_mailbox("a@outlook.com").unwrap();
        assert_eq!(client.fetch_verification_code(None).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_fetch_prefers_newest_message_with_code() {
        let api = Arc::new(FakeApi::default());
        api.push(Ok(vec![
            message("2026-01-01T10:00:00Z", "Your code is 123456"),
            message("2026-01-01T10:05:00Z", "Thanks for signing up"),
        ]));
        let mut client = client(api);
        client.use_mailbox("a@outlook.com").unwrap();

        let code = client.fetch_verification_code(None).await.unwrap();
        assert_eq!(code.as_deref(), Some("123456"));
    }

    #[tokio::test]
    async fn test_fetch_propagates_service_errors() {
        let api = Arc::new(FakeApi::default());
        api.push(Err(Error::ApiRejected {
            url: "http://pool/emails/by-email/a@outlook.com".into(),
        }));
        let mut client = client(api);
        client.use_mailbox("a@outlook.com").unwrap();

        let err = client.fetch_verification_code(None).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_custom_matcher_is_used() {
        let api = Arc::new(FakeApi::default());
        api.push(Ok(vec![message("2026-01-01T10:00:00Z", "token=ab12 123456")]));
        let mut client = MailPoolClientBuilder::new(MailPoolConfig::default())
            .matcher(RegexMatcher::new(r"token=(\w+)").unwrap())
            .build_with_api(api);
        client.use_mailbox("a@outlook.com").unwrap();

        let code = client.fetch_verification_code(None).await.unwrap();
        assert_eq!(code.as_deref(), Some("ab12"));
    }

    #[tokio::test]
    async fn test_poll_requires_mailbox() {
        let api = Arc::new(FakeApi::default());
        let client = client(Arc::clone(&api));
        let err = client.poll_for_code(secs(10), secs(5), None).await.unwrap_err();
        assert!(matches!(err, Error::NoMailboxSelected));
        assert_eq!(api.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_times_out_after_two_attempts_and_one_sleep() {
        let api = Arc::new(FakeApi::default());
        let mut client = client(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let start = tokio::time::Instant::now();
        let err = client.poll_for_code(secs(10), secs(5), None).await.unwrap_err();

        assert!(matches!(err, Error::WaitTimeout { attempts: 2, .. }));
        assert_eq!(api.list_calls(), 2);
        assert_eq!(start.elapsed(), secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_sub_second_interval_keeps_polling() {
        let api = Arc::new(FakeApi::default());
        let mut client = client(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let start = tokio::time::Instant::now();
        let err = client
            .poll_for_code(secs(10), Duration::from_millis(500), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::WaitTimeout { attempts: 20, .. }));
        assert_eq!(api.list_calls(), 20);
        assert_eq!(start.elapsed(), Duration::from_millis(9500));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_fractional_interval_stays_within_timeout() {
        let api = Arc::new(FakeApi::default());
        let mut client = client(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let start = tokio::time::Instant::now();
        let err = client
            .poll_for_code(secs(10), Duration::from_millis(1900), None)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::WaitTimeout { attempts: 5, .. }));
        assert_eq!(api.list_calls(), 5);
        assert_eq!(start.elapsed(), Duration::from_millis(7600));
        assert!(start.elapsed() <= secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_retries_through_garbled_listing() {
        let api = Arc::new(FakeApi::default());
        api.push(Err(Error::Decode {
            url: "http://pool/emails".into(),
            source: serde_json::from_str::<serde_json::Value>("<html>").unwrap_err(),
        }));
        api.push(Ok(vec![message("2026-01-01T10:00:00Z", "code 135790")]));
        let mut client = client(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let code = client.poll_for_code(secs(60), secs(4), None).await.unwrap();
        assert_eq!(code, "135790");
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_makes_at_least_one_attempt() {
        let api = Arc::new(FakeApi::default());
        let mut client = client(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let start = tokio::time::Instant::now();
        let err = client.poll_for_code(secs(2), secs(5), None).await.unwrap_err();

        assert!(matches!(err, Error::WaitTimeout { attempts: 1, .. }));
        assert_eq!(api.list_calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_returns_code_on_later_attempt() {
        let api = Arc::new(FakeApi::default());
        api.push(Ok(Vec::new()));
        api.push(Ok(vec![message("2026-01-01T10:00:00Z", "code 424242")]));
        let mut client = client(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let code = client.poll_for_code(secs(60), secs(4), None).await.unwrap();
        assert_eq!(code, "424242");
        assert_eq!(api.list_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_retries_through_retryable_errors() {
        let api = Arc::new(FakeApi::default());
        api.push(Err(Error::HttpStatus {
            status: 503,
            url: "http://pool/emails".into(),
        }));
        api.push(Ok(vec![message("2026-01-01T10:00:00Z", "code 424242")]));
        let mut client = client(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let code = client.poll_for_code(secs(60), secs(4), None).await.unwrap();
        assert_eq!(code, "424242");
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_aborts_on_fatal_error() {
        let api = Arc::new(FakeApi::default());
        api.push(Err(Error::HttpStatus {
            status: 404,
            url: "http://pool/emails".into(),
        }));
        let mut client = client(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let err = client.poll_for_code(secs(60), secs(4), None).await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 404, .. }));
        assert_eq!(api.list_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_cancellation_interrupts_wait() {
        let api = Arc::new(FakeApi::default());
        let mut client = client(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let start = tokio::time::Instant::now();
        let err = client
            .poll_for_code_until(secs(60), secs(5), None, tokio::time::sleep(secs(7)))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(api.list_calls(), 2);
        assert_eq!(start.elapsed(), secs(7));
    }

    #[tokio::test]
    async fn test_poll_already_cancelled_makes_no_request() {
        let api = Arc::new(FakeApi::default());
        let mut client = client(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let err = client
            .poll_for_code_until(secs(60), secs(5), None, std::future::ready(()))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Cancelled));
        assert_eq!(api.list_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observer_sees_poll_progress() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&events);

        let api = Arc::new(FakeApi::with_accounts(1));
        api.push(Ok(Vec::new()));
        api.push(Ok(vec![message("2026-01-01T10:00:00Z", "code 777888")]));

        let mut client = MailPoolClientBuilder::new(MailPoolConfig::default())
            .observer(move |event: &PollEvent| sink.lock().unwrap().push(event.clone()))
            .build_with_api(api);

        client.register_account().await.unwrap();
        client.poll_for_code(secs(20), secs(5), None).await.unwrap();

        let events = events.lock().unwrap();
        assert!(matches!(events[0], PollEvent::AccountSelected { index: 0, total: 1, .. }));
        assert!(events.contains(&PollEvent::AttemptStarted {
            attempt: 1,
            max_attempts: 4
        }));
        assert!(events.contains(&PollEvent::InboxEmpty {
            email: "user0@outlook.com".into()
        }));
        assert_eq!(
            events.last(),
            Some(&PollEvent::CodeFound {
                code: "777888".into()
            })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_polling_config() {
        let api = Arc::new(FakeApi::default());
        let config = MailPoolConfig::builder()
            .poll_interval(secs(3))
            .max_wait(secs(9))
            .build()
            .unwrap();
        let mut client = MailPoolClientBuilder::new(config).build_with_api(Arc::clone(&api));
        client.use_mailbox("a@outlook.com").unwrap();

        let err = client.poll_for_code_default(None).await.unwrap_err();
        assert!(matches!(err, Error::WaitTimeout { attempts: 3, .. }));
        assert_eq!(api.list_calls(), 3);
    }
}
