//! The bank: every operation the API exposes, over one embedded database.
//!
//! Operations are synchronous and return [`BankResult`]. Anything that reads
//! a balance and then writes it holds `ledger_lock` for the whole
//! read-check-commit sequence; the commit itself is a single sled
//! transaction.
//!
//! `user_lock` guards user records and everything created on a user's
//! behalf against concurrent deletion of that user. When both are needed,
//! `user_lock` is taken first.

mod accounts;
mod auth;
mod bills;
mod budgets;
mod categories;
mod profile;
mod transactions;

pub use accounts::AccountUpdate;
pub use auth::{AccessToken, TokenPair};

use serde::Serialize;
use std::sync::{Mutex, MutexGuard};

use crate::account::{Account, AccountId, AccountStore};
use crate::auth::{LockoutPolicy, PasswordHasher, Principal, TokenIssuer};
use crate::bill::BillStore;
use crate::budget::BudgetStore;
use crate::category::CategoryStore;
use crate::config::{BankConfig, LimitsConfig};
use crate::error::{BankError, BankResult};
use crate::ledger::LedgerStore;
use crate::storage::Storage;
use crate::user::UserStore;

const DEFAULT_PAGE_SIZE: usize = 10;
const MAX_PAGE_SIZE: usize = 100;

pub struct Bank {
    storage: Storage,
    users: UserStore,
    accounts: AccountStore,
    ledger: LedgerStore,
    categories: CategoryStore,
    budgets: BudgetStore,
    bills: BillStore,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    lockout: LockoutPolicy,
    limits: LimitsConfig,
    ledger_lock: Mutex<()>,
    user_lock: Mutex<()>,
}

/// Lock a mutex, mapping poisoning to an internal error.
fn safe_lock<T>(mutex: &Mutex<T>) -> BankResult<MutexGuard<'_, T>> {
    mutex.lock().map_err(|e| {
        tracing::error!("Mutex poisoned: {}", e);
        BankError::Internal("mutex poisoned".to_string())
    })
}

/// One page of a listing.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub pages: usize,
    pub current_page: usize,
}

impl<T> Page<T> {
    /// Slice `items` into page `page` (1-based) of `per_page` entries.
    pub fn paginate(items: Vec<T>, page: Option<usize>, per_page: Option<usize>) -> Self {
        let per_page = per_page.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let current_page = page.unwrap_or(1).max(1);
        let total = items.len();
        let pages = total.div_ceil(per_page);
        let items = items
            .into_iter()
            .skip((current_page - 1).saturating_mul(per_page))
            .take(per_page)
            .collect();
        Page { items, total, pages, current_page }
    }
}

impl Bank {
    /// Open the database at `config.storage.db_path`.
    pub fn open(config: &BankConfig) -> BankResult<Self> {
        let storage = Storage::open(&config.storage.db_path)?;
        tracing::info!(path = %config.storage.db_path, "database opened");
        Self::with_storage(storage, config)
    }

    /// Bank over a throwaway database.
    pub fn temporary(config: &BankConfig) -> BankResult<Self> {
        Self::with_storage(Storage::temporary()?, config)
    }

    fn with_storage(storage: Storage, config: &BankConfig) -> BankResult<Self> {
        let bank = Bank {
            users: UserStore::new(storage.clone()),
            accounts: AccountStore::new(storage.clone()),
            ledger: LedgerStore::new(storage.clone()),
            categories: CategoryStore::new(storage.clone()),
            budgets: BudgetStore::new(storage.clone()),
            bills: BillStore::new(storage.clone()),
            hasher: PasswordHasher::from_config(&config.auth)?,
            tokens: TokenIssuer::from_config(&config.auth),
            lockout: LockoutPolicy::from_config(&config.auth),
            limits: config.limits.clone(),
            ledger_lock: Mutex::new(()),
            user_lock: Mutex::new(()),
            storage,
        };
        bank.categories.seed(&config.bank.default_categories)?;
        Ok(bank)
    }

    pub fn flush(&self) -> BankResult<()> {
        self.storage.flush()
    }

    /// Hold `user_lock` while the principal's user record still exists.
    fn lock_owner(&self, principal: &Principal) -> BankResult<MutexGuard<'_, ()>> {
        let guard = safe_lock(&self.user_lock)?;
        self.users.require(principal.user_id)?;
        Ok(guard)
    }

    /// Load an account the principal owns. Missing → 404, foreign → 403.
    fn owned_account(&self, principal: &Principal, id: AccountId) -> BankResult<Account> {
        let account = self.accounts.get(id)?.ok_or(BankError::NotFound("Account"))?;
        if !account.is_owned_by(principal.user_id) {
            tracing::warn!(user_id = principal.user_id, account_id = id, "foreign account access");
            return Err(BankError::forbidden("Unauthorized access to account"));
        }
        Ok(account)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate() {
        let page = Page::paginate((1..=25).collect::<Vec<_>>(), Some(3), Some(10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total, 25);
        assert_eq!(page.pages, 3);
        assert_eq!(page.current_page, 3);

        let page = Page::paginate((1..=5).collect::<Vec<_>>(), None, Some(1000));
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.pages, 1);

        let empty = Page::paginate(Vec::<u8>::new(), Some(0), None);
        assert_eq!(empty.current_page, 1);
        assert_eq!(empty.pages, 0);
        assert!(empty.items.is_empty());

        let past_end = Page::paginate(vec![1, 2], Some(9), None);
        assert!(past_end.items.is_empty());
    }

    #[test]
    fn test_default_categories_seeded() {
        let bank = test_support::bank();
        let names: Vec<String> = bank.list_categories().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, BankConfig::default().bank.default_categories);
    }
}
