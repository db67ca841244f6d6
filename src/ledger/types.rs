use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::AccountId;
use crate::error::BankError;
use crate::validation::parse_date;

pub type TransactionId = u64;

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    BillPayment,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "deposit",
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Transfer => "transfer",
            TransactionType::BillPayment => "bill_payment",
        }
    }

    /// Money leaving the source account; subject to the outflow limits.
    pub fn is_outflow(&self) -> bool {
        !matches!(self, TransactionType::Deposit)
    }
}

impl std::str::FromStr for TransactionType {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deposit" => Ok(TransactionType::Deposit),
            "withdrawal" => Ok(TransactionType::Withdrawal),
            "transfer" => Ok(TransactionType::Transfer),
            "bill_payment" => Ok(TransactionType::BillPayment),
            _ => Err(BankError::validation("Invalid transaction type")),
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    #[default]
    Completed,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Transaction {
    pub id: TransactionId,
    /// The account that initiated the transaction
    pub account_id: AccountId,
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub description: String,
    pub category_id: Option<u64>,
    pub source_account_id: Option<AccountId>,
    pub destination_account_id: Option<AccountId>,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Every account whose balance this transaction touched.
    pub fn involved_accounts(&self) -> Vec<AccountId> {
        let mut ids = vec![self.account_id];
        if let Some(dest) = self.destination_account_id {
            if dest != self.account_id {
                ids.push(dest);
            }
        }
        ids
    }

    pub fn involves(&self, account_id: AccountId) -> bool {
        self.account_id == account_id
            || self.source_account_id == Some(account_id)
            || self.destination_account_id == Some(account_id)
    }
}

/// Request to move money
#[derive(Deserialize, Clone, Debug)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub transaction_type: String,
    pub amount: Decimal,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub destination_account_id: Option<AccountId>,
    #[serde(default)]
    pub category_id: Option<u64>,
}

#[derive(Deserialize, Clone, Debug, Default)]
pub struct TransactionFilter {
    #[serde(default, rename = "type")]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub min_amount: Option<Decimal>,
    #[serde(default)]
    pub max_amount: Option<Decimal>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub per_page: Option<usize>,
}

/// Parsed form of [`TransactionFilter`].
#[derive(Clone, Debug, Default)]
pub struct TransactionQuery {
    pub transaction_type: Option<TransactionType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub account_id: Option<AccountId>,
}

impl TransactionFilter {
    pub fn parse(&self) -> Result<TransactionQuery, BankError> {
        let transaction_type = match &self.transaction_type {
            Some(raw) => Some(raw.parse::<TransactionType>()?),
            None => None,
        };
        let start_date = self.start_date.as_deref().map(parse_date).transpose()?;
        let end_date = self.end_date.as_deref().map(parse_date).transpose()?;
        Ok(TransactionQuery {
            transaction_type,
            start_date,
            end_date,
            min_amount: self.min_amount,
            max_amount: self.max_amount,
            account_id: self.account_id,
        })
    }
}

impl TransactionQuery {
    pub fn matches(&self, tx: &Transaction) -> bool {
        let day = tx.created_at.date_naive();
        self.transaction_type.map_or(true, |t| tx.transaction_type == t)
            && self.start_date.map_or(true, |d| day >= d)
            && self.end_date.map_or(true, |d| day <= d)
            && self.min_amount.map_or(true, |m| tx.amount >= m)
            && self.max_amount.map_or(true, |m| tx.amount <= m)
            && self.account_id.map_or(true, |a| tx.involves(a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tx(kind: TransactionType, amount: i64, day: u32) -> Transaction {
        Transaction {
            id: 1,
            account_id: 10,
            transaction_type: kind,
            amount: Decimal::from(amount),
            description: String::new(),
            category_id: None,
            source_account_id: None,
            destination_account_id: None,
            status: TransactionStatus::Completed,
            created_at: Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_type_parsing_is_case_insensitive() {
        assert_eq!("DEPOSIT".parse::<TransactionType>().unwrap(), TransactionType::Deposit);
        assert_eq!("Transfer".parse::<TransactionType>().unwrap(), TransactionType::Transfer);
        assert!("refund".parse::<TransactionType>().is_err());
        assert!(!TransactionType::Deposit.is_outflow());
        assert!(TransactionType::BillPayment.is_outflow());
    }

    #[test]
    fn test_query_matching() {
        let query = TransactionQuery {
            transaction_type: Some(TransactionType::Withdrawal),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 5),
            end_date: NaiveDate::from_ymd_opt(2024, 3, 10),
            min_amount: Some(Decimal::from(10)),
            max_amount: None,
            account_id: None,
        };
        assert!(query.matches(&tx(TransactionType::Withdrawal, 50, 10)));
        assert!(!query.matches(&tx(TransactionType::Withdrawal, 50, 11)));
        assert!(!query.matches(&tx(TransactionType::Withdrawal, 5, 6)));
        assert!(!query.matches(&tx(TransactionType::Deposit, 50, 6)));
    }

    #[test]
    fn test_filter_parsing() {
        let filter = TransactionFilter {
            transaction_type: Some("withdrawal".to_string()),
            start_date: Some("2024-03-01".to_string()),
            ..Default::default()
        };
        let query = filter.parse().unwrap();
        assert_eq!(query.transaction_type, Some(TransactionType::Withdrawal));
        assert_eq!(query.start_date, NaiveDate::from_ymd_opt(2024, 3, 1));
        assert!(query.end_date.is_none());

        let bad = TransactionFilter {
            end_date: Some("03/01/2024".to_string()),
            ..Default::default()
        };
        assert_eq!(bad.parse().unwrap_err().to_string(), "Invalid date format. Use YYYY-MM-DD");
    }

    #[test]
    fn test_involved_accounts() {
        let mut t = tx(TransactionType::Transfer, 5, 1);
        t.source_account_id = Some(10);
        t.destination_account_id = Some(20);
        assert_eq!(t.involved_accounts(), vec![10, 20]);
        assert!(t.involves(20));
        assert!(!t.involves(30));
    }
}
