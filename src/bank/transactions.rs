use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;

use super::{safe_lock, Bank, Page};
use crate::account::balance::{credit, debit, transfer};
use crate::account::{Account, AccountId};
use crate::auth::{Permission, Principal};
use crate::error::{BankError, BankResult};
use crate::ledger::{
    NewTransaction, Posting, Transaction, TransactionFilter, TransactionId, TransactionStatus,
    TransactionType,
};
use crate::validation::validate_amount;

const MAX_DESCRIPTION_LEN: usize = 255;

impl Bank {
    /// Outflow limits: one transaction may not exceed the single limit, and
    /// the last 24h of outflows plus this one may not exceed the daily limit.
    /// Callers hold the ledger lock.
    pub(super) fn check_outflow_limits(
        &self,
        account_id: AccountId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> BankResult<()> {
        if amount > self.limits.max_single_transaction {
            return Err(BankError::LimitExceeded(
                "Transaction exceeds single transaction limit".to_string(),
            ));
        }
        let spent = self.ledger.outflow_since(account_id, now - Duration::hours(24))?;
        if spent + amount > self.limits.daily_outflow_limit {
            tracing::warn!(account_id, %spent, %amount, "daily outflow limit reached");
            return Err(BankError::LimitExceeded("Transaction exceeds daily limit".to_string()));
        }
        Ok(())
    }

    pub fn create_transaction(&self, principal: &Principal, new: NewTransaction) -> BankResult<Transaction> {
        principal.require(Permission::TransactionCreate)?;
        let kind: TransactionType = new.transaction_type.parse()?;
        let amount = validate_amount(new.amount, self.limits.max_transaction_amount, "Transaction")?;
        let description = new
            .description
            .map(|d| d.trim().to_string())
            .unwrap_or_default();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(BankError::validation(format!(
                "Description must be at most {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }
        if let Some(category_id) = new.category_id {
            self.categories.get(category_id)?.ok_or(BankError::NotFound("Category"))?;
        }

        let _ledger = safe_lock(&self.ledger_lock)?;
        let now = Utc::now();
        let mut account = match self.accounts.get(new.account_id)? {
            Some(account) if account.is_owned_by(principal.user_id) => account,
            _ => return Err(BankError::forbidden("Invalid or unauthorized account")),
        };
        if !account.is_active {
            return Err(BankError::validation("Account is inactive"));
        }

        let mut destination: Option<Account> = None;
        match kind {
            TransactionType::Deposit => {
                credit(&mut account, amount)?;
            }
            TransactionType::Withdrawal => {
                self.check_outflow_limits(account.id, amount, now)?;
                debit(&mut account, amount)?;
            }
            TransactionType::Transfer => {
                let dest_id = new.destination_account_id.ok_or_else(|| {
                    BankError::validation("Destination account is required for transfers")
                })?;
                if dest_id == account.id {
                    return Err(BankError::validation("Cannot transfer to the same account"));
                }
                let mut dest = self
                    .accounts
                    .get(dest_id)?
                    .ok_or(BankError::NotFound("Destination account"))?;
                if !dest.is_active {
                    return Err(BankError::validation("Destination account is inactive"));
                }
                self.check_outflow_limits(account.id, amount, now)?;
                transfer(&mut account, &mut dest, amount)?;
                dest.updated_at = now;
                destination = Some(dest);
            }
            TransactionType::BillPayment => {
                return Err(BankError::validation(
                    "Bill payments are made by marking a bill as paid",
                ));
            }
        }
        account.updated_at = now;

        let transaction = Transaction {
            id: self.storage.next_id()?,
            account_id: account.id,
            transaction_type: kind,
            amount,
            description,
            category_id: new.category_id,
            source_account_id: destination.as_ref().map(|_| account.id),
            destination_account_id: destination.as_ref().map(|d| d.id),
            status: TransactionStatus::Completed,
            created_at: now,
        };
        let mut accounts = vec![account];
        accounts.extend(destination);
        self.ledger.commit(&Posting {
            accounts,
            transaction: transaction.clone(),
            bill: None,
        })?;

        tracing::info!(
            user_id = principal.user_id,
            transaction_id = transaction.id,
            kind = kind.as_str(),
            %amount,
            "transaction completed"
        );
        Ok(transaction)
    }

    /// Transactions touching any of the caller's accounts, newest first.
    pub fn list_transactions(&self, principal: &Principal, filter: TransactionFilter) -> BankResult<Page<Transaction>> {
        principal.require(Permission::TransactionList)?;
        let query = filter.parse()?;
        let account_ids: Vec<AccountId> = self
            .accounts
            .list_for_user(principal.user_id)?
            .into_iter()
            .map(|a| a.id)
            .collect();
        let matching = self
            .ledger
            .for_accounts(&account_ids)?
            .into_iter()
            .filter(|tx| query.matches(tx))
            .collect();
        Ok(Page::paginate(matching, filter.page, filter.per_page))
    }

    pub fn get_transaction(&self, principal: &Principal, id: TransactionId) -> BankResult<Transaction> {
        principal.require(Permission::TransactionRead)?;
        let transaction = self.ledger.get(id)?.ok_or(BankError::NotFound("Transaction"))?;
        for account_id in transaction.involved_accounts() {
            if let Some(account) = self.accounts.get(account_id)? {
                if account.is_owned_by(principal.user_id) {
                    return Ok(transaction);
                }
            }
        }
        Err(BankError::forbidden("Unauthorized access to transaction"))
    }
}
