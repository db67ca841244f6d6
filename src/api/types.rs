// Request and response bodies of the HTTP API
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::Account;
use crate::bank::Page;
use crate::bill::Bill;
use crate::budget::Budget;
use crate::ledger::Transaction;
use crate::user::User;

#[derive(Deserialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct LogoutRequest {
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct PasswordChangeRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Deserialize, Debug)]
pub struct PasswordConfirmation {
    pub password: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct OpenAccountRequest {
    #[serde(default)]
    pub account_type: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct CategoryRequest {
    pub name: String,
}

#[derive(Deserialize, Debug, Default)]
pub struct PageQuery {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
}

#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

/// Public view of a user; the hash and login counters stay inside.
#[derive(Serialize, Debug)]
pub struct UserView {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub full_name: Option<String>,
    pub phone_number: Option<String>,
    pub role: crate::auth::Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        UserView {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            phone_number: user.phone_number,
            role: user.role,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct AccountView {
    pub id: u64,
    pub user_id: u64,
    pub account_number: String,
    pub account_type: crate::account::AccountType,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountView {
    fn from(a: Account) -> Self {
        AccountView {
            id: a.id,
            user_id: a.user_id,
            account_number: a.account_number,
            account_type: a.account_type,
            balance: a.balance,
            is_active: a.is_active,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct TransactionView {
    pub id: u64,
    pub account_id: u64,
    pub transaction_type: crate::ledger::TransactionType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub description: String,
    pub category_id: Option<u64>,
    pub source_account_id: Option<u64>,
    pub destination_account_id: Option<u64>,
    pub status: crate::ledger::TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl From<Transaction> for TransactionView {
    fn from(t: Transaction) -> Self {
        TransactionView {
            id: t.id,
            account_id: t.account_id,
            transaction_type: t.transaction_type,
            amount: t.amount,
            description: t.description,
            category_id: t.category_id,
            source_account_id: t.source_account_id,
            destination_account_id: t.destination_account_id,
            status: t.status,
            created_at: t.created_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct BudgetView {
    pub id: u64,
    pub user_id: u64,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Budget> for BudgetView {
    fn from(b: Budget) -> Self {
        BudgetView {
            id: b.id,
            user_id: b.user_id,
            name: b.name,
            amount: b.amount,
            start_date: b.start_date,
            end_date: b.end_date,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Serialize, Debug)]
pub struct BillView {
    pub id: u64,
    pub user_id: u64,
    pub account_id: u64,
    pub biller_name: String,
    pub due_date: NaiveDate,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub status: crate::bill::BillStatus,
    pub transaction_id: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Bill> for BillView {
    fn from(b: Bill) -> Self {
        BillView {
            id: b.id,
            user_id: b.user_id,
            account_id: b.account_id,
            biller_name: b.biller_name,
            due_date: b.due_date,
            amount: b.amount,
            status: b.status,
            transaction_id: b.transaction_id,
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

/// A page of results under a resource-specific key, e.g. `{"accounts": [...], "total": 3, ...}`.
pub fn page_json<T, V>(key: &str, page: Page<T>) -> serde_json::Value
where
    V: Serialize + From<T>,
{
    let items: Vec<V> = page.items.into_iter().map(V::from).collect();
    let mut body = serde_json::json!({
        "total": page.total,
        "pages": page.pages,
        "current_page": page.current_page,
    });
    body[key] = serde_json::json!(items);
    body
}
