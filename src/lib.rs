pub mod account;
pub mod api;
pub mod auth;
pub mod bank;
pub mod bill;
pub mod budget;
pub mod category;
pub mod cli;
pub mod config;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod storage;
pub mod user;
pub mod validation;

pub use bank::Bank;
pub use config::BankConfig;
pub use error::{BankError, BankResult};
