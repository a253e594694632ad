//! HTTP access to the pool service.
//!
//! [`MailApi`] is the seam between the polling logic and the wire. The
//! production implementation is [`HttpMailApi`]; tests substitute an
//! in-memory fake.

use crate::config::MailPoolConfig;
use crate::error::{Error, Result};
use crate::events::{Observer, PollEvent};
use crate::models::{Account, Message, MessageList};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Operations the client needs from the pool service.
pub trait MailApi: Send + Sync {
    /// Fetches one page (1-based) of the account list.
    fn fetch_accounts_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> impl Future<Output = Result<Vec<Account>>> + Send;

    /// Lists the messages of `email`.
    ///
    /// An empty inbox is `Ok(vec![])`; transport failures, error statuses and
    /// `success: false` payloads are errors.
    fn list_messages(&self, email: &str) -> impl Future<Output = Result<Vec<Message>>> + Send;
}

impl<A: MailApi> MailApi for Arc<A> {
    fn fetch_accounts_page(
        &self,
        page: u32,
        page_size: usize,
    ) -> impl Future<Output = Result<Vec<Account>>> + Send {
        (**self).fetch_accounts_page(page, page_size)
    }

    fn list_messages(&self, email: &str) -> impl Future<Output = Result<Vec<Message>>> + Send {
        (**self).list_messages(email)
    }
}

/// Fetches the whole account pool page by page.
///
/// Pagination stops on an empty page, a short page, or the first error.
/// Accounts retrieved before an error are kept; the error is only returned
/// when it happened on the first page.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] if `page_size` is zero, and the first
/// page's error if that page could not be fetched.
#[instrument(name = "api::fetch_all_accounts", skip(api))]
pub async fn fetch_all_accounts<A: MailApi>(
    api: &A,
    page_size: usize,
) -> Result<Vec<Account>> {
    if page_size == 0 {
        return Err(Error::InvalidConfig {
            message: "page_size must be > 0".into(),
        });
    }

    let mut accounts = Vec::new();
    let mut page = 1u32;

    loop {
        match api.fetch_accounts_page(page, page_size).await {
            Ok(batch) => {
                let len = batch.len();
                accounts.extend(batch);
                if len == 0 || len < page_size {
                    break;
                }
                let Some(next) = page.checked_add(1) else {
                    warn!(page, "Account pagination reached the last page number");
                    break;
                };
                page = next;
            }
            Err(e) if page == 1 => return Err(e),
            Err(e) => {
                warn!(page, error = %e, kept = accounts.len(), "Account pagination stopped early");
                break;
            }
        }
    }

    debug!(total = accounts.len(), pages = page, "Fetched account pool");
    Ok(accounts)
}

/// [`MailApi`] over HTTP using `reqwest`.
#[derive(Clone)]
pub struct HttpMailApi {
    http: reqwest::Client,
    config: MailPoolConfig,
    observer: Option<Arc<dyn Observer>>,
}

impl HttpMailApi {
    /// Builds the HTTP client with the configured timeout and proxy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidProxy`] if the proxy is rejected and
    /// [`Error::InvalidConfig`] if the HTTP client cannot be constructed.
    pub fn new(config: MailPoolConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout);

        if let Some(proxy) = &config.proxy {
            debug!(proxy = %proxy, "Routing requests through proxy");
            builder = builder.proxy(proxy.to_reqwest()?);
        }

        let http = builder.build().map_err(|e| Error::InvalidConfig {
            message: format!("failed to build HTTP client: {e}"),
        })?;

        Ok(Self {
            http,
            config,
            observer: None,
        })
    }

    /// Reports request/response events to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Returns the configuration this API was built from.
    #[must_use]
    pub fn config(&self) -> &MailPoolConfig {
        &self.config
    }

    fn emit(&self, event: PollEvent) {
        if let Some(observer) = &self.observer {
            observer.on_event(&event);
        }
    }

    /// GETs `url` and decodes the JSON body; an empty body is `None`.
    async fn get_json<T>(&self, url: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        debug!(url = %url, "Sending GET request");
        self.emit(PollEvent::RequestSent {
            method: "GET",
            url: url.to_string(),
        });

        let response = self.http.get(url).send().await.map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        debug!(url = %url, status = status.as_u16(), "Received response");
        self.emit(PollEvent::ResponseReceived {
            url: url.to_string(),
            status: status.as_u16(),
        });

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.bytes().await.map_err(|source| Error::Http {
            url: url.to_string(),
            source,
        })?;

        if body.iter().all(u8::is_ascii_whitespace) {
            debug!(url = %url, "Empty response body");
            return Ok(None);
        }

        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|source| Error::Decode {
                url: url.to_string(),
                source,
            })
    }
}

impl MailApi for HttpMailApi {
    #[instrument(name = "api::fetch_accounts_page", skip(self))]
    async fn fetch_accounts_page(&self, page: u32, page_size: usize) -> Result<Vec<Account>> {
        let url = self.config.accounts_url(page, page_size);
        let accounts: Vec<Account> = self.get_json(&url).await?.unwrap_or_default();
        debug!(count = accounts.len(), "Fetched account page");
        Ok(accounts)
    }

    #[instrument(name = "api::list_messages", skip(self), fields(email = %email))]
    async fn list_messages(&self, email: &str) -> Result<Vec<Message>> {
        let url = self.config.messages_url(email);
        let Some(list) = self.get_json::<MessageList>(&url).await? else {
            return Ok(Vec::new());
        };

        if !list.success {
            return Err(Error::ApiRejected { url });
        }

        Ok(list.emails.unwrap_or_default())
    }
}

impl std::fmt::Debug for HttpMailApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMailApi")
            .field("config", &self.config)
            .field("observer", &self.observer.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serves pre-baked pages; `None` entries fail with a retryable error.
    struct Pages {
        pages: Vec<Option<Vec<Account>>>,
        requested: Mutex<Vec<u32>>,
    }

    impl MailApi for Pages {
        async fn fetch_accounts_page(&self, page: u32, _page_size: usize) -> Result<Vec<Account>> {
            self.requested.lock().unwrap().push(page);
            match self.pages.get(page as usize - 1) {
                Some(Some(batch)) => Ok(batch.clone()),
                Some(None) => Err(Error::HttpStatus {
                    status: 502,
                    url: format!("http://pool/accounts?page={page}"),
                }),
                None => Ok(Vec::new()),
            }
        }

        async fn list_messages(&self, _email: &str) -> Result<Vec<Message>> {
            Ok(Vec::new())
        }
    }

    fn accounts(range: std::ops::Range<u64>) -> Vec<Account> {
        range
            .map(|id| Account {
                id,
                email: format!("user{id}@outlook.com"),
            })
            .collect()
    }

    fn pages(pages: Vec<Option<Vec<Account>>>) -> Pages {
        Pages {
            pages,
            requested: Mutex::new(Vec::new()),
        }
    }

    #[tokio::test]
    async fn test_stops_on_short_page() {
        let api = pages(vec![Some(accounts(0..2)), Some(accounts(2..3))]);
        let all = fetch_all_accounts(&api, 2).await.unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(*api.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_stops_on_empty_page() {
        let api = pages(vec![Some(accounts(0..2)), Some(Vec::new())]);
        let all = fetch_all_accounts(&api, 2).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(*api.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_zero_page_size_is_rejected_without_requests() {
        let api = pages(vec![Some(Vec::new()); 3]);
        let err = fetch_all_accounts(&api, 0).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfig { .. }));
        assert!(api.requested.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_error_after_first_page_keeps_partial_pool() {
        let api = pages(vec![Some(accounts(0..2)), None, Some(accounts(4..6))]);
        let all = fetch_all_accounts(&api, 2).await.unwrap();
        assert_eq!(all, accounts(0..2));
        assert_eq!(*api.requested.lock().unwrap(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_error_on_first_page_is_returned() {
        let api = pages(vec![None]);
        let err = fetch_all_accounts(&api, 2).await.unwrap_err();
        assert!(matches!(err, Error::HttpStatus { status: 502, .. }));
    }

    #[test]
    fn test_http_api_builds_with_proxy() {
        let config = MailPoolConfig::builder()
            .proxy_url("http://127.0.0.1:3128")
            .build()
            .unwrap();
        let api = HttpMailApi::new(config).unwrap();
        assert!(format!("{api:?}").contains("HttpMailApi"));
    }
}
