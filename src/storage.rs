use serde::{de::DeserializeOwned, Serialize};
use sled::{Db, Tree};
use std::path::Path;

use crate::error::{BankError, BankResult};

/// Result type for bodies of multi-tree sled transactions.
pub type TxResult<T = ()> = sled::transaction::ConflictableTransactionResult<T, BankError>;

/// Embedded database with one tree per record kind plus the unique indexes.
#[derive(Clone)]
pub struct Storage {
    db: Db,
    pub users: Tree,
    pub users_by_username: Tree,
    pub users_by_email: Tree,
    pub accounts: Tree,
    pub accounts_by_number: Tree,
    pub transactions: Tree,
    /// account id ++ transaction id -> ()
    pub account_transactions: Tree,
    pub categories: Tree,
    pub categories_by_name: Tree,
    pub budgets: Tree,
    pub bills: Tree,
    /// token jti -> expiry (unix seconds, big endian)
    pub revoked_tokens: Tree,
}

impl Storage {
    pub fn open(path: impl AsRef<Path>) -> BankResult<Self> {
        let db = sled::open(path)?;
        Self::from_db(db)
    }

    /// Throwaway database, removed on drop.
    pub fn temporary() -> BankResult<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> BankResult<Self> {
        Ok(Storage {
            users: db.open_tree("users")?,
            users_by_username: db.open_tree("users_by_username")?,
            users_by_email: db.open_tree("users_by_email")?,
            accounts: db.open_tree("accounts")?,
            accounts_by_number: db.open_tree("accounts_by_number")?,
            transactions: db.open_tree("transactions")?,
            account_transactions: db.open_tree("account_transactions")?,
            categories: db.open_tree("categories")?,
            categories_by_name: db.open_tree("categories_by_name")?,
            budgets: db.open_tree("budgets")?,
            bills: db.open_tree("bills")?,
            revoked_tokens: db.open_tree("revoked_tokens")?,
            db,
        })
    }

    /// Monotonic id, starting at 1.
    pub fn next_id(&self) -> BankResult<u64> {
        Ok(self.db.generate_id()? + 1)
    }

    pub fn flush(&self) -> BankResult<()> {
        self.db.flush()?;
        Ok(())
    }

    // Generic Helper: Put
    pub fn put<T: Serialize>(&self, tree: &Tree, id: u64, value: &T) -> BankResult<()> {
        tree.insert(id_key(id), encode(value)?)?;
        Ok(())
    }

    // Generic Helper: Get
    pub fn get<T: DeserializeOwned>(&self, tree: &Tree, id: u64) -> BankResult<Option<T>> {
        match tree.get(id_key(id))? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    pub fn all<T: DeserializeOwned>(&self, tree: &Tree) -> BankResult<Vec<T>> {
        tree.iter()
            .values()
            .map(|value| decode(&value?))
            .collect()
    }

    /// Resolve a unique index entry to the id it points at.
    pub fn lookup(&self, index: &Tree, key: &str) -> BankResult<Option<u64>> {
        match index.get(key.as_bytes())? {
            Some(bytes) => Ok(Some(read_id(&bytes)?)),
            None => Ok(None),
        }
    }
}

pub fn id_key(id: u64) -> [u8; 8] {
    id.to_be_bytes()
}

pub fn pair_key(first: u64, second: u64) -> [u8; 16] {
    let mut key = [0u8; 16];
    key[..8].copy_from_slice(&first.to_be_bytes());
    key[8..].copy_from_slice(&second.to_be_bytes());
    key
}

pub fn read_id(bytes: &[u8]) -> BankResult<u64> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| BankError::Database(format!("corrupt id of {} bytes", bytes.len())))?;
    Ok(u64::from_be_bytes(raw))
}

pub fn encode<T: Serialize>(value: &T) -> BankResult<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> BankResult<T> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, Debug, PartialEq)]
    struct Row {
        name: String,
    }

    #[test]
    fn test_put_get_all() {
        let storage = Storage::temporary().unwrap();
        let a = storage.next_id().unwrap();
        let b = storage.next_id().unwrap();
        assert!(a >= 1 && b > a);

        storage.put(&storage.budgets, b, &Row { name: "b".into() }).unwrap();
        storage.put(&storage.budgets, a, &Row { name: "a".into() }).unwrap();

        let row: Option<Row> = storage.get(&storage.budgets, a).unwrap();
        assert_eq!(row.unwrap().name, "a");

        // big-endian keys iterate in id order
        let rows: Vec<Row> = storage.all(&storage.budgets).unwrap();
        assert_eq!(rows[0].name, "a");
        assert_eq!(rows[1].name, "b");

        let missing: Option<Row> = storage.get(&storage.budgets, 999).unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_lookup_index() {
        let storage = Storage::temporary().unwrap();
        storage.users_by_username.insert("alice", &id_key(7)[..]).unwrap();
        assert_eq!(storage.lookup(&storage.users_by_username, "alice").unwrap(), Some(7));
        assert_eq!(storage.lookup(&storage.users_by_username, "bob").unwrap(), None);
    }

    #[test]
    fn test_pair_key_prefix() {
        let key = pair_key(3, 9);
        assert_eq!(&key[..8], &id_key(3));
        assert_eq!(read_id(&key[8..]).unwrap(), 9);
    }
}
