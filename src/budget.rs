//! Spending budgets

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BankError, BankResult};
use crate::storage::Storage;
use crate::user::UserId;

pub type BudgetId = u64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Budget {
    pub id: BudgetId,
    pub user_id: UserId,
    pub name: String,
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewBudget {
    pub name: String,
    pub amount: Decimal,
    pub start_date: String,
    pub end_date: String,
}

/// Partial update; absent fields are kept.
#[derive(Deserialize, Clone, Debug, Default)]
pub struct BudgetUpdate {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
}

impl Budget {
    pub fn check_period(&self) -> BankResult<()> {
        if self.end_date <= self.start_date {
            return Err(BankError::validation("End date must be after start date"));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct BudgetStore {
    storage: Storage,
}

impl BudgetStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn next_id(&self) -> BankResult<BudgetId> {
        self.storage.next_id()
    }

    pub fn save(&self, budget: &Budget) -> BankResult<()> {
        self.storage.put(&self.storage.budgets, budget.id, budget)
    }

    pub fn get(&self, id: BudgetId) -> BankResult<Option<Budget>> {
        self.storage.get(&self.storage.budgets, id)
    }

    pub fn list_for_user(&self, user_id: UserId) -> BankResult<Vec<Budget>> {
        let all: Vec<Budget> = self.storage.all(&self.storage.budgets)?;
        Ok(all.into_iter().filter(|b| b.user_id == user_id).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn budget(store: &BudgetStore, user_id: UserId) -> Budget {
        Budget {
            id: store.next_id().unwrap(),
            user_id,
            name: "Groceries".to_string(),
            amount: Decimal::from(300),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_period_check() {
        let store = BudgetStore::new(Storage::temporary().unwrap());
        let mut b = budget(&store, 1);
        assert!(b.check_period().is_ok());
        b.end_date = b.start_date;
        assert!(matches!(b.check_period(), Err(BankError::Validation(_))));
    }

    #[test]
    fn test_list_per_user() {
        let store = BudgetStore::new(Storage::temporary().unwrap());
        let mine = budget(&store, 1);
        store.save(&mine).unwrap();
        store.save(&budget(&store, 1)).unwrap();
        store.save(&budget(&store, 2)).unwrap();

        assert_eq!(store.list_for_user(1).unwrap().len(), 2);
        assert_eq!(store.get(mine.id).unwrap().unwrap(), mine);
        assert_eq!(store.list_for_user(2).unwrap().len(), 1);
    }
}
