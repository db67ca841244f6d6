use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;

use super::{safe_lock, Bank, Page};
use crate::account::store::generate_account_number;
use crate::account::{Account, AccountId, AccountType};
use crate::auth::{Permission, Principal};
use crate::error::{BankError, BankResult};

#[derive(Deserialize, Clone, Debug, Default)]
pub struct AccountUpdate {
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl Bank {
    pub fn list_accounts(
        &self,
        principal: &Principal,
        page: Option<usize>,
        per_page: Option<usize>,
    ) -> BankResult<Page<Account>> {
        principal.require(Permission::AccountList)?;
        let accounts = self.accounts.list_for_user(principal.user_id)?;
        Ok(Page::paginate(accounts, page, per_page))
    }

    /// Open an account; `account_type` defaults to savings.
    pub fn open_account(&self, principal: &Principal, account_type: Option<&str>) -> BankResult<Account> {
        principal.require(Permission::AccountCreate)?;
        let account_type = match account_type {
            Some(raw) => raw.parse::<AccountType>()?,
            None => AccountType::default(),
        };
        let _owner = self.lock_owner(principal)?;

        let now = Utc::now();
        let account = self.accounts.insert(Account {
            id: self.storage.next_id()?,
            user_id: principal.user_id,
            account_number: generate_account_number(),
            account_type,
            balance: Decimal::ZERO,
            is_active: true,
            created_at: now,
            updated_at: now,
        })?;
        tracing::info!(
            user_id = principal.user_id,
            account_id = account.id,
            account_type = account_type.as_str(),
            "account opened"
        );
        Ok(account)
    }

    pub fn get_account(&self, principal: &Principal, id: AccountId) -> BankResult<Account> {
        principal.require(Permission::AccountRead)?;
        self.owned_account(principal, id)
    }

    pub fn update_account(&self, principal: &Principal, id: AccountId, update: AccountUpdate) -> BankResult<Account> {
        principal.require(Permission::AccountUpdate)?;
        // the record carries the balance, so writes go through the ledger lock
        let _ledger = safe_lock(&self.ledger_lock)?;
        let mut account = self.owned_account(principal, id)?;
        if let Some(is_active) = update.is_active {
            account.is_active = is_active;
        }
        account.updated_at = Utc::now();
        self.accounts.save(&account)?;
        tracing::info!(account_id = id, is_active = account.is_active, "account updated");
        Ok(account)
    }

    /// Close an account. Admins may close any account, owners their own.
    pub fn close_account(&self, principal: &Principal, id: AccountId) -> BankResult<()> {
        principal.require(Permission::AccountDelete)?;
        let _ledger = safe_lock(&self.ledger_lock)?;
        let account = self.accounts.get(id)?.ok_or(BankError::NotFound("Account"))?;
        if !account.is_owned_by(principal.user_id) && !principal.role.is_admin() {
            return Err(BankError::forbidden("Unauthorized access to account"));
        }
        if account.balance != Decimal::ZERO {
            return Err(BankError::validation("Cannot delete account with remaining balance"));
        }
        self.accounts.delete(&account)?;
        tracing::info!(account_id = id, closed_by = principal.user_id, "account closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{bank, funded_account, new_user, principal};
    use super::*;
    use crate::auth::Role;

    fn admin(bank: &Bank) -> Principal {
        let user = bank.create_admin(new_user("root")).unwrap();
        Principal { user_id: user.id, role: Role::Admin }
    }

    #[test]
    fn test_open_and_list() {
        let bank = bank();
        let alice = principal(&bank, "alice");
        let savings = bank.open_account(&alice, None).unwrap();
        assert_eq!(savings.account_type, AccountType::Savings);
        assert_eq!(savings.balance, Decimal::ZERO);
        assert_eq!(savings.account_number.len(), 12);

        let business = bank.open_account(&alice, Some("Business")).unwrap();
        assert_eq!(business.account_type, AccountType::Business);
        assert!(matches!(bank.open_account(&alice, Some("crypto")), Err(BankError::Validation(_))));

        let page = bank.list_accounts(&alice, Some(1), Some(1)).unwrap();
        assert_eq!(page.total, 2);
        assert_eq!(page.pages, 2);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn test_foreign_account_is_forbidden() {
        let bank = bank();
        let alice = principal(&bank, "alice");
        let bob = principal(&bank, "bob");
        let account = bank.open_account(&alice, None).unwrap();

        assert_eq!(bank.get_account(&alice, account.id).unwrap(), account);
        let err = bank.get_account(&bob, account.id).unwrap_err();
        assert_eq!(err.to_string(), "Unauthorized access to account");
        assert!(matches!(bank.get_account(&bob, 9999), Err(BankError::NotFound("Account"))));
        assert!(bank.update_account(&bob, account.id, AccountUpdate { is_active: Some(false) }).is_err());
    }

    #[test]
    fn test_update_keeps_balance() {
        let bank = bank();
        let alice = principal(&bank, "alice");
        let account = funded_account(&bank, &alice, 80);

        let updated = bank
            .update_account(&alice, account.id, AccountUpdate { is_active: Some(false) })
            .unwrap();
        assert!(!updated.is_active);
        assert_eq!(updated.balance, Decimal::from(80));
    }

    #[test]
    fn test_close_rules() {
        let bank = bank();
        let alice = principal(&bank, "alice");
        let root = admin(&bank);
        let empty = bank.open_account(&alice, None).unwrap();
        let funded = funded_account(&bank, &alice, 10);

        // plain users lack account:delete
        let err = bank.close_account(&alice, empty.id).unwrap_err();
        assert_eq!(err.to_string(), "Insufficient permissions");

        let err = bank.close_account(&root, funded.id).unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete account with remaining balance");

        bank.close_account(&root, empty.id).unwrap();
        assert!(matches!(bank.get_account(&alice, empty.id), Err(BankError::NotFound(_))));
    }
}
