//! Transaction categories
//!
//! A flat, bank-wide catalog. Names are unique ignoring case.

use serde::{Deserialize, Serialize};
use sled::transaction::abort;
use sled::Transactional;

use crate::error::{BankError, BankResult};
use crate::storage::{encode, id_key, Storage, TxResult};
use crate::validation::required_text;

pub type CategoryId = u64;

const MAX_NAME_LEN: usize = 50;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

#[derive(Clone)]
pub struct CategoryStore {
    storage: Storage,
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

impl CategoryStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, name: &str) -> BankResult<Category> {
        let name = required_text(name, "Category name", MAX_NAME_LEN)?;
        let category = Category {
            id: self.storage.next_id()?,
            name,
        };
        let bytes = encode(&category)?;
        let key = name_key(&category.name);
        let s = &self.storage;

        (&s.categories, &s.categories_by_name).transaction(|(categories, by_name)| -> TxResult {
            if by_name.get(key.as_bytes())?.is_some() {
                return abort(BankError::Conflict("Category already exists".to_string()));
            }
            by_name.insert(key.as_bytes(), &id_key(category.id)[..])?;
            categories.insert(&id_key(category.id)[..], bytes.as_slice())?;
            Ok(())
        })?;
        Ok(category)
    }

    pub fn get(&self, id: CategoryId) -> BankResult<Option<Category>> {
        self.storage.get(&self.storage.categories, id)
    }

    pub fn find_by_name(&self, name: &str) -> BankResult<Option<Category>> {
        match self.storage.lookup(&self.storage.categories_by_name, &name_key(name))? {
            Some(id) => self.get(id),
            None => Ok(None),
        }
    }

    /// All categories in creation order.
    pub fn list(&self) -> BankResult<Vec<Category>> {
        self.storage.all(&self.storage.categories)
    }

    /// Create `names` when the catalog is empty. Returns how many were added.
    pub fn seed(&self, names: &[String]) -> BankResult<usize> {
        if !self.storage.categories.is_empty() {
            return Ok(0);
        }
        let mut added = 0;
        for name in names {
            match self.create(name) {
                Ok(_) => added += 1,
                // repeated name in the configured list
                Err(BankError::Conflict(_)) => {}
                Err(e) => return Err(e),
            }
        }
        tracing::info!(added, "seeded default categories");
        Ok(added)
    }
}
