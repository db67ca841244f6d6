//! Ledger: transaction records and atomic postings

pub mod store;
pub mod types;

pub use store::{LedgerStore, Posting};
pub use types::{
    NewTransaction, Transaction, TransactionFilter, TransactionId, TransactionQuery, TransactionStatus,
    TransactionType,
};
