//! Scheduled bills
//!
//! A bill starts `pending`. Paying it goes through the ledger (see
//! `Bank::update_bill`); cancelling is a soft delete.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::error::{BankError, BankResult};
use crate::ledger::TransactionId;
use crate::storage::Storage;
use crate::user::UserId;

pub type BillId = u64;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BillStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Pending => "pending",
            BillStatus::Paid => "paid",
            BillStatus::Cancelled => "cancelled",
        }
    }
}

impl std::str::FromStr for BillStatus {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(BillStatus::Pending),
            "paid" => Ok(BillStatus::Paid),
            "cancelled" => Ok(BillStatus::Cancelled),
            _ => Err(BankError::validation(
                "Invalid status. Must be one of: pending, paid, cancelled",
            )),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Bill {
    pub id: BillId,
    pub user_id: UserId,
    pub account_id: AccountId,
    pub biller_name: String,
    pub due_date: NaiveDate,
    pub amount: Decimal,
    pub status: BillStatus,
    /// Ledger entry that paid this bill
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct NewBill {
    pub biller_name: String,
    pub due_date: String,
    pub amount: Decimal,
    pub account_id: AccountId,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct BillUpdate {
    #[serde(default)]
    pub biller_name: Option<String>,
    #[serde(default)]
    pub due_date: Option<String>,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    #[serde(default)]
    pub status: Option<String>,
}

impl Bill {
    /// Paid bills are settled history and reject any change.
    pub fn ensure_mutable(&self) -> BankResult<()> {
        if self.status == BillStatus::Paid {
            return Err(BankError::validation("Bill has already been paid"));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct BillStore {
    storage: Storage,
}

impl BillStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn next_id(&self) -> BankResult<BillId> {
        self.storage.next_id()
    }

    pub fn save(&self, bill: &Bill) -> BankResult<()> {
        self.storage.put(&self.storage.bills, bill.id, bill)
    }

    pub fn get(&self, id: BillId) -> BankResult<Option<Bill>> {
        self.storage.get(&self.storage.bills, id)
    }

    pub fn list_for_user(&self, user_id: UserId) -> BankResult<Vec<Bill>> {
        let all: Vec<Bill> = self.storage.all(&self.storage.bills)?;
        Ok(all.into_iter().filter(|b| b.user_id == user_id).collect())
    }
}
