//! Account type definitions

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::BankError;
use crate::user::UserId;

pub type AccountId = u64;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub user_id: UserId,
    /// 12 digits, unique
    pub account_number: String,
    pub account_type: AccountType,
    pub balance: Decimal,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Savings,
    Checking,
    Business,
}

impl AccountType {
    pub const ALL: [AccountType; 3] = [AccountType::Savings, AccountType::Checking, AccountType::Business];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "savings",
            AccountType::Checking => "checking",
            AccountType::Business => "business",
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "savings" => Ok(AccountType::Savings),
            "checking" => Ok(AccountType::Checking),
            "business" => Ok(AccountType::Business),
            _ => Err(BankError::validation(
                "Invalid account type. Must be one of ['savings', 'checking', 'business']",
            )),
        }
    }
}

impl Account {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    pub fn has_funds(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_type() {
        assert_eq!("Checking".parse::<AccountType>().unwrap(), AccountType::Checking);
        assert_eq!(" business ".parse::<AccountType>().unwrap(), AccountType::Business);
        assert!("crypto".parse::<AccountType>().is_err());
        for t in AccountType::ALL {
            assert_eq!(t.as_str().parse::<AccountType>().unwrap(), t);
        }
    }
}
