//! Account storage and management

use rand::Rng;
use sled::transaction::abort;
use sled::Transactional;

use super::types::{Account, AccountId};
use crate::error::{BankError, BankResult};
use crate::storage::{encode, id_key, Storage, TxResult};
use crate::user::UserId;

const ACCOUNT_NUMBER_DIGITS: usize = 12;
const MAX_NUMBER_ATTEMPTS: usize = 8;

#[derive(Clone)]
pub struct AccountStore {
    storage: Storage,
}

/// Random 12-digit account number without a leading zero.
pub fn generate_account_number() -> String {
    let mut rng = rand::thread_rng();
    let first = rng.gen_range(1..=9u8);
    let mut number = first.to_string();
    for _ in 1..ACCOUNT_NUMBER_DIGITS {
        number.push(char::from(b'0' + rng.gen_range(0..=9u8)));
    }
    number
}

impl AccountStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    fn insert_with_number(&self, account: &Account) -> BankResult<()> {
        let bytes = encode(account)?;
        let number = account.account_number.clone();
        let s = &self.storage;

        (&s.accounts, &s.accounts_by_number).transaction(|(accounts, by_number)| -> TxResult {
            if by_number.get(number.as_bytes())?.is_some() {
                return abort(BankError::Conflict("Account number already exists".to_string()));
            }
            by_number.insert(number.as_bytes(), &id_key(account.id)[..])?;
            accounts.insert(&id_key(account.id)[..], bytes.as_slice())?;
            Ok(())
        })?;
        Ok(())
    }

    /// Insert a new account, drawing a fresh number on collision.
    pub fn insert(&self, mut account: Account) -> BankResult<Account> {
        for _ in 0..MAX_NUMBER_ATTEMPTS {
            match self.insert_with_number(&account) {
                Ok(()) => return Ok(account),
                Err(BankError::Conflict(_)) => {
                    tracing::debug!(number = %account.account_number, "account number collision");
                    account.account_number = generate_account_number();
                }
                Err(e) => return Err(e),
            }
        }
        Err(BankError::Internal("could not allocate a unique account number".to_string()))
    }

    pub fn get(&self, id: AccountId) -> BankResult<Option<Account>> {
        self.storage.get(&self.storage.accounts, id)
    }

    pub fn find_by_number(&self, number: &str) -> BankResult<Option<Account>> {
        match self.storage.lookup(&self.storage.accounts_by_number, number)? {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    /// All accounts of a user, oldest first.
    pub fn list_for_user(&self, user_id: UserId) -> BankResult<Vec<Account>> {
        let all: Vec<Account> = self.storage.all(&self.storage.accounts)?;
        Ok(all.into_iter().filter(|a| a.user_id == user_id).collect())
    }

    pub fn save(&self, account: &Account) -> BankResult<()> {
        self.storage.put(&self.storage.accounts, account.id, account)
    }

    pub fn delete(&self, account: &Account) -> BankResult<()> {
        let number = account.account_number.clone();
        let s = &self.storage;

        (&s.accounts, &s.accounts_by_number).transaction(|(accounts, by_number)| -> TxResult {
            accounts.remove(&id_key(account.id)[..])?;
            by_number.remove(number.as_bytes())?;
            Ok(())
        })?;
        Ok(())
    }
}
