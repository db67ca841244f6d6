//! Transaction storage and atomic postings

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sled::Transactional;
use std::collections::BTreeSet;

use super::types::{Transaction, TransactionId};
use crate::account::{Account, AccountId};
use crate::bill::Bill;
use crate::error::BankResult;
use crate::storage::{encode, id_key, pair_key, read_id, Storage, TxResult};

/// Everything one ledger operation writes. Committed as a unit.
#[derive(Debug, Clone)]
pub struct Posting {
    /// Post-change snapshots of every account whose balance moved
    pub accounts: Vec<Account>,
    pub transaction: Transaction,
    /// Bill settled by this posting, if any
    pub bill: Option<Bill>,
}

#[derive(Clone)]
pub struct LedgerStore {
    storage: Storage,
}

impl LedgerStore {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn commit(&self, posting: &Posting) -> BankResult<()> {
        let accounts = posting
            .accounts
            .iter()
            .map(|a| Ok((id_key(a.id), encode(a)?)))
            .collect::<BankResult<Vec<_>>>()?;
        let tx = &posting.transaction;
        let tx_bytes = encode(tx)?;
        let index_keys: Vec<[u8; 16]> = tx
            .involved_accounts()
            .into_iter()
            .map(|account_id| pair_key(account_id, tx.id))
            .collect();
        let bill = match &posting.bill {
            Some(bill) => Some((id_key(bill.id), encode(bill)?)),
            None => None,
        };
        let empty: &[u8] = &[];
        let s = &self.storage;

        (&s.accounts, &s.transactions, &s.account_transactions, &s.bills).transaction(
            |(account_tree, tx_tree, index_tree, bill_tree)| -> TxResult {
                for (key, bytes) in &accounts {
                    account_tree.insert(&key[..], bytes.as_slice())?;
                }
                tx_tree.insert(&id_key(tx.id)[..], tx_bytes.as_slice())?;
                for key in &index_keys {
                    index_tree.insert(&key[..], empty)?;
                }
                if let Some((key, bytes)) = &bill {
                    bill_tree.insert(&key[..], bytes.as_slice())?;
                }
                Ok(())
            },
        )?;

        tracing::debug!(
            transaction_id = tx.id,
            kind = tx.transaction_type.as_str(),
            amount = %tx.amount,
            "posting committed"
        );
        Ok(())
    }

    pub fn get(&self, id: TransactionId) -> BankResult<Option<Transaction>> {
        self.storage.get(&self.storage.transactions, id)
    }

    pub fn ids_for_account(&self, account_id: AccountId) -> BankResult<Vec<TransactionId>> {
        self.storage
            .account_transactions
            .scan_prefix(id_key(account_id))
            .keys()
            .map(|key| read_id(&key?[8..]))
            .collect()
    }

    /// Transactions touching any of `account_ids`, newest first, without duplicates.
    pub fn for_accounts(&self, account_ids: &[AccountId]) -> BankResult<Vec<Transaction>> {
        let mut ids = BTreeSet::new();
        for account_id in account_ids {
            ids.extend(self.ids_for_account(*account_id)?);
        }
        let mut transactions = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(tx) = self.get(id)? {
                transactions.push(tx);
            }
        }
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(transactions)
    }

    /// Sum of money that left `account_id` at or after `since`.
    pub fn outflow_since(&self, account_id: AccountId, since: DateTime<Utc>) -> BankResult<Decimal> {
        let mut total = Decimal::ZERO;
        for id in self.ids_for_account(account_id)? {
            if let Some(tx) = self.get(id)? {
                if tx.account_id == account_id && tx.transaction_type.is_outflow() && tx.created_at >= since {
                    total += tx.amount;
                }
            }
        }
        Ok(total)
    }
}
