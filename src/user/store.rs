//! User storage with unique username / email indexes

use sled::transaction::{abort, TransactionalTree};
use sled::Transactional;

use super::types::{User, UserId};
use crate::account::Account;
use crate::bill::BillId;
use crate::budget::BudgetId;
use crate::error::{BankError, BankResult};
use crate::storage::{encode, id_key, Storage, TxResult};

#[derive(Clone)]
pub struct UserStore {
    storage: Storage,
}

fn username_key(username: &str) -> String {
    username.to_lowercase()
}

fn email_key(email: &str) -> String {
    email.to_lowercase()
}

fn claim(index: &TransactionalTree, key: &str, id: UserId, taken: &str) -> TxResult {
    if let Some(existing) = index.get(key.as_bytes())? {
        if existing.as_ref() != &id_key(id)[..] {
            return abort(BankError::Conflict(taken.to_string()));
        }
    }
    index.insert(key.as_bytes(), &id_key(id)[..])?;
    Ok(())
}

/// Aborts when the user record is gone, so a late write cannot bring back
/// a deleted user.
fn ensure_present(users: &TransactionalTree, id: UserId) -> TxResult {
    if users.get(&id_key(id)[..])?.is_none() {
        return abort(BankError::NotFound("User"));
    }
    Ok(())
}

/// Everything removed together with a user.
#[derive(Debug, Clone, Default)]
pub struct Holdings {
    pub accounts: Vec<Account>,
    pub budgets: Vec<BudgetId>,
    pub bills: Vec<BillId>,
}

impl UserStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Insert a new user, failing with `Conflict` if the username or email is taken.
    pub fn insert(&self, user: &User) -> BankResult<()> {
        let bytes = encode(user)?;
        let name = username_key(&user.username);
        let email = email_key(&user.email);
        let s = &self.storage;

        (&s.users, &s.users_by_username, &s.users_by_email)
            .transaction(|(users, by_name, by_email)| -> TxResult {
                claim(by_name, &name, user.id, "Username already exists")?;
                claim(by_email, &email, user.id, "Email already exists")?;
                users.insert(&id_key(user.id)[..], bytes.as_slice())?;
                Ok(())
            })?;
        Ok(())
    }

    pub fn get(&self, id: UserId) -> BankResult<Option<User>> {
        self.storage.get(&self.storage.users, id)
    }

    pub fn require(&self, id: UserId) -> BankResult<User> {
        self.get(id)?.ok_or(BankError::NotFound("User"))
    }

    pub fn find_by_username(&self, username: &str) -> BankResult<Option<User>> {
        match self.storage.lookup(&self.storage.users_by_username, &username_key(username))? {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    pub fn find_by_email(&self, email: &str) -> BankResult<Option<User>> {
        match self.storage.lookup(&self.storage.users_by_email, &email_key(email))? {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    /// Write back an existing user whose username and email are unchanged.
    pub fn save(&self, user: &User) -> BankResult<()> {
        let bytes = encode(user)?;
        self.storage.users.transaction(|users| -> TxResult {
            ensure_present(users, user.id)?;
            users.insert(&id_key(user.id)[..], bytes.as_slice())?;
            Ok(())
        })?;
        Ok(())
    }

    /// Write back a user whose username or email may have changed, moving
    /// the index entries in the same commit.
    pub fn save_with_identity(&self, previous: &User, user: &User) -> BankResult<()> {
        let bytes = encode(user)?;
        let old_name = username_key(&previous.username);
        let old_email = email_key(&previous.email);
        let name = username_key(&user.username);
        let email = email_key(&user.email);
        let s = &self.storage;

        (&s.users, &s.users_by_username, &s.users_by_email)
            .transaction(|(users, by_name, by_email)| -> TxResult {
                ensure_present(users, user.id)?;
                if name != old_name {
                    claim(by_name, &name, user.id, "Username already exists")?;
                    by_name.remove(old_name.as_bytes())?;
                }
                if email != old_email {
                    claim(by_email, &email, user.id, "Email already exists")?;
                    by_email.remove(old_email.as_bytes())?;
                }
                users.insert(&id_key(user.id)[..], bytes.as_slice())?;
                Ok(())
            })?;
        Ok(())
    }

    /// Remove a user, its index entries and its holdings in one commit.
    pub fn delete(&self, user: &User, holdings: &Holdings) -> BankResult<()> {
        let name = username_key(&user.username);
        let email = email_key(&user.email);
        let s = &self.storage;

        (
            &s.users,
            &s.users_by_username,
            &s.users_by_email,
            &s.accounts,
            &s.accounts_by_number,
            &s.budgets,
            &s.bills,
        )
            .transaction(
                |(users, by_name, by_email, accounts, by_number, budgets, bills)| -> TxResult {
                    ensure_present(users, user.id)?;
                    users.remove(&id_key(user.id)[..])?;
                    by_name.remove(name.as_bytes())?;
                    by_email.remove(email.as_bytes())?;
                    for account in &holdings.accounts {
                        accounts.remove(&id_key(account.id)[..])?;
                        by_number.remove(account.account_number.as_bytes())?;
                    }
                    for id in &holdings.budgets {
                        budgets.remove(&id_key(*id)[..])?;
                    }
                    for id in &holdings.bills {
                        bills.remove(&id_key(*id)[..])?;
                    }
                    Ok(())
                },
            )?;
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.storage.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use chrono::Utc;

    fn user(storage: &Storage, username: &str, email: &str) -> User {
        User {
            id: storage.next_id().unwrap(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: None,
            phone_number: None,
            role: Role::User,
            is_active: true,
            login: Default::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let storage = Storage::temporary().unwrap();
        let store = UserStore::new(storage.clone());
        let alice = user(&storage, "alice", "alice@example.com");
        store.insert(&alice).unwrap();

        assert_eq!(store.find_by_username("Alice").unwrap().unwrap().id, alice.id);
        assert_eq!(store.find_by_email("ALICE@example.com").unwrap().unwrap().id, alice.id);
        assert!(store.find_by_username("bob").unwrap().is_none());
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_duplicates_rejected() {
        let storage = Storage::temporary().unwrap();
        let store = UserStore::new(storage.clone());
        store.insert(&user(&storage, "alice", "alice@example.com")).unwrap();

        let err = store.insert(&user(&storage, "ALICE", "other@example.com")).unwrap_err();
        assert_eq!(err.to_string(), "Username already exists");
        let err = store.insert(&user(&storage, "bob", "alice@example.com")).unwrap_err();
        assert_eq!(err.to_string(), "Email already exists");

        // the failed inserts left nothing behind
        assert_eq!(store.count(), 1);
        assert!(store.find_by_username("bob").unwrap().is_none());
    }

    #[test]
    fn test_identity_change_moves_indexes() {
        let storage = Storage::temporary().unwrap();
        let store = UserStore::new(storage.clone());
        let alice = user(&storage, "alice", "alice@example.com");
        store.insert(&alice).unwrap();
        let bob = user(&storage, "bob", "bob@example.com");
        store.insert(&bob).unwrap();

        let mut renamed = alice.clone();
        renamed.username = "alicia".to_string();
        store.save_with_identity(&alice, &renamed).unwrap();
        assert!(store.find_by_username("alice").unwrap().is_none());
        assert_eq!(store.find_by_username("alicia").unwrap().unwrap().id, alice.id);

        let mut clash = renamed.clone();
        clash.email = "bob@example.com".to_string();
        assert!(matches!(
            store.save_with_identity(&renamed, &clash),
            Err(BankError::Conflict(_))
        ));
    }

    #[test]
    fn test_delete_frees_names() {
        let storage = Storage::temporary().unwrap();
        let store = UserStore::new(storage.clone());
        let alice = user(&storage, "alice", "alice@example.com");
        store.insert(&alice).unwrap();
        store.delete(&alice, &Holdings::default()).unwrap();
        assert!(store.get(alice.id).unwrap().is_none());
        store.insert(&user(&storage, "alice", "alice@example.com")).unwrap();
    }

    #[test]
    fn test_delete_takes_holdings_along() {
        let storage = Storage::temporary().unwrap();
        let store = UserStore::new(storage.clone());
        let alice = user(&storage, "alice", "alice@example.com");
        store.insert(&alice).unwrap();
        storage.accounts.insert(id_key(10), &b"{}"[..]).unwrap();
        storage.accounts_by_number.insert("123456789012", &id_key(10)[..]).unwrap();
        storage.budgets.insert(id_key(11), &b"{}"[..]).unwrap();
        storage.bills.insert(id_key(12), &b"{}"[..]).unwrap();
        storage.bills.insert(id_key(13), &b"{}"[..]).unwrap();

        let account = Account {
            id: 10,
            user_id: alice.id,
            account_number: "123456789012".to_string(),
            account_type: crate::account::AccountType::Savings,
            balance: rust_decimal::Decimal::ZERO,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let holdings = Holdings {
            accounts: vec![account],
            budgets: vec![11],
            bills: vec![12],
        };
        store.delete(&alice, &holdings).unwrap();

        assert!(storage.accounts.get(id_key(10)).unwrap().is_none());
        assert!(storage.accounts_by_number.get("123456789012").unwrap().is_none());
        assert!(storage.budgets.get(id_key(11)).unwrap().is_none());
        assert!(storage.bills.get(id_key(12)).unwrap().is_none());
        assert!(storage.bills.get(id_key(13)).unwrap().is_some());

        assert!(matches!(store.delete(&alice, &holdings), Err(BankError::NotFound("User"))));
    }

    #[test]
    fn test_save_does_not_resurrect() {
        let storage = Storage::temporary().unwrap();
        let store = UserStore::new(storage.clone());
        let alice = user(&storage, "alice", "alice@example.com");
        store.insert(&alice).unwrap();
        store.delete(&alice, &Holdings::default()).unwrap();

        assert!(matches!(store.save(&alice), Err(BankError::NotFound("User"))));
        let mut renamed = alice.clone();
        renamed.username = "alicia".to_string();
        assert!(matches!(
            store.save_with_identity(&alice, &renamed),
            Err(BankError::NotFound("User"))
        ));
        assert!(store.get(alice.id).unwrap().is_none());
        assert!(store.find_by_username("alicia").unwrap().is_none());
    }
}
