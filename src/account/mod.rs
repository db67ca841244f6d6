//! Bank accounts
//!
//! - Account records and types
//! - Balance arithmetic (credit / debit / transfer)
//! - Storage with the account-number index

pub mod balance;
pub mod store;
pub mod types;

pub use store::AccountStore;
pub use types::{Account, AccountId, AccountType};
