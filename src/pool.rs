//! Shared account pool with round-robin selection.
//!
//! An [`AccountPool`] is owned by the caller and shared between clients with
//! an `Arc`. Each registration replaces the cached account list wholesale and
//! takes the next account in rotation. The index is always reduced modulo the
//! current pool size, so a pool that grows or shrinks between refreshes
//! simply continues the cycle from wherever the index lands.

use crate::models::Account;
use tokio::sync::Mutex;
use tracing::debug;

/// An account handed out by [`AccountPool::refresh_and_next`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    /// The chosen account.
    pub account: Account,
    /// Its zero-based position in the pool.
    pub index: usize,
    /// Pool size at selection time.
    pub total: usize,
}

#[derive(Debug, Default)]
struct PoolState {
    accounts: Vec<Account>,
    next_index: usize,
}

/// Process-local cache of the account pool plus the rotation index.
///
/// Refresh and selection happen under one lock, so clients sharing a pool
/// never receive the same rotation slot twice in a row.
#[derive(Debug, Default)]
pub struct AccountPool {
    state: Mutex<PoolState>,
}

impl AccountPool {
    /// Creates an empty pool with the index at 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached accounts and returns the next one in rotation.
    ///
    /// Returns `None` (and leaves the index untouched) when `accounts` is empty.
    pub async fn refresh_and_next(&self, accounts: Vec<Account>) -> Option<Selection> {
        let mut state = self.state.lock().await;
        state.accounts = accounts;

        let total = state.accounts.len();
        if total == 0 {
            return None;
        }

        let index = state.next_index % total;
        state.next_index = (index + 1) % total;
        let account = state.accounts[index].clone();

        debug!(index, total, email = %account.email, "Selected pool account");

        Some(Selection {
            account,
            index,
            total,
        })
    }

    /// Returns a copy of the most recently fetched accounts.
    pub async fn snapshot(&self) -> Vec<Account> {
        self.state.lock().await.accounts.clone()
    }

    /// Number of cached accounts.
    pub async fn len(&self) -> usize {
        self.state.lock().await.accounts.len()
    }

    /// Returns `true` if no accounts are cached.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
