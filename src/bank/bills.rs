use chrono::{DateTime, Utc};

use super::{safe_lock, Bank};
use crate::account::balance::debit;
use crate::auth::Principal;
use crate::bill::{Bill, BillId, BillStatus, BillUpdate, NewBill};
use crate::error::{BankError, BankResult};
use crate::ledger::{Posting, Transaction, TransactionStatus, TransactionType};
use crate::validation::{parse_date, required_text, validate_amount};

const MAX_BILLER_LEN: usize = 100;

impl Bank {
    pub fn create_bill(&self, principal: &Principal, new: NewBill) -> BankResult<Bill> {
        let biller_name = required_text(&new.biller_name, "Biller name", MAX_BILLER_LEN)?;
        let amount = validate_amount(new.amount, self.limits.max_transaction_amount, "Bill")?;
        let due_date = parse_date(&new.due_date)?;
        let _owner = self.lock_owner(principal)?;
        let account = self.owned_account(principal, new.account_id)?;
        if !account.has_funds(amount) {
            return Err(BankError::validation("Insufficient balance for bill payment"));
        }

        let now = Utc::now();
        let bill = Bill {
            id: self.bills.next_id()?,
            user_id: principal.user_id,
            account_id: account.id,
            biller_name,
            due_date,
            amount,
            status: BillStatus::Pending,
            transaction_id: None,
            created_at: now,
            updated_at: now,
        };
        self.bills.save(&bill)?;
        tracing::info!(user_id = principal.user_id, bill_id = bill.id, %amount, "bill scheduled");
        Ok(bill)
    }

    pub fn list_bills(&self, principal: &Principal) -> BankResult<Vec<Bill>> {
        self.bills.list_for_user(principal.user_id)
    }

    fn owned_bill(&self, principal: &Principal, id: BillId) -> BankResult<Bill> {
        let bill = self.bills.get(id)?.ok_or(BankError::NotFound("Bill"))?;
        if bill.user_id != principal.user_id {
            return Err(BankError::forbidden("Unauthorized access to bill"));
        }
        Ok(bill)
    }

    /// Partial update. Moving a pending bill to `paid` debits its account
    /// through the ledger in the same commit that stores the bill.
    pub fn update_bill(&self, principal: &Principal, id: BillId, update: BillUpdate) -> BankResult<Bill> {
        let status = update.status.as_deref().map(str::parse::<BillStatus>).transpose()?;

        let _owner = self.lock_owner(principal)?;
        let _ledger = safe_lock(&self.ledger_lock)?;
        let mut bill = self.owned_bill(principal, id)?;
        bill.ensure_mutable()?;

        if let Some(name) = update.biller_name {
            bill.biller_name = required_text(&name, "Biller name", MAX_BILLER_LEN)?;
        }
        if let Some(due) = update.due_date {
            bill.due_date = parse_date(&due)?;
        }
        if let Some(amount) = update.amount {
            bill.amount = validate_amount(amount, self.limits.max_transaction_amount, "Bill")?;
        }
        if let Some(account_id) = update.account_id {
            let account = self.owned_account(principal, account_id)?;
            if !account.has_funds(bill.amount) {
                return Err(BankError::validation("Insufficient balance for bill payment"));
            }
            bill.account_id = account.id;
        }

        let now = Utc::now();
        bill.updated_at = now;
        match status {
            Some(BillStatus::Paid) => {
                if bill.status == BillStatus::Cancelled {
                    return Err(BankError::validation("Cancelled bills cannot be paid"));
                }
                return self.pay_bill(principal, bill, now);
            }
            Some(other) => bill.status = other,
            None => {}
        }
        self.bills.save(&bill)?;
        Ok(bill)
    }

    /// Caller holds the ledger lock.
    fn pay_bill(&self, principal: &Principal, mut bill: Bill, now: DateTime<Utc>) -> BankResult<Bill> {
        let mut account = self.owned_account(principal, bill.account_id)?;
        if !account.is_active {
            return Err(BankError::validation("Account is inactive"));
        }
        self.check_outflow_limits(account.id, bill.amount, now)?;
        debit(&mut account, bill.amount)?;
        account.updated_at = now;

        let transaction = Transaction {
            id: self.storage.next_id()?,
            account_id: account.id,
            transaction_type: TransactionType::BillPayment,
            amount: bill.amount,
            description: format!("Bill payment to {}", bill.biller_name),
            category_id: None,
            source_account_id: None,
            destination_account_id: None,
            status: TransactionStatus::Completed,
            created_at: now,
        };
        bill.status = BillStatus::Paid;
        bill.transaction_id = Some(transaction.id);

        self.ledger.commit(&Posting {
            accounts: vec![account],
            transaction,
            bill: Some(bill.clone()),
        })?;
        tracing::info!(bill_id = bill.id, amount = %bill.amount, "bill paid");
        Ok(bill)
    }

    /// Soft delete.
    pub fn cancel_bill(&self, principal: &Principal, id: BillId) -> BankResult<Bill> {
        let _owner = self.lock_owner(principal)?;
        let _ledger = safe_lock(&self.ledger_lock)?;
        let mut bill = self.owned_bill(principal, id)?;
        if bill.status == BillStatus::Paid {
            return Err(BankError::validation("Paid bills cannot be cancelled"));
        }
        bill.status = BillStatus::Cancelled;
        bill.updated_at = Utc::now();
        self.bills.save(&bill)?;
        tracing::info!(bill_id = id, "bill cancelled");
        Ok(bill)
    }
}
