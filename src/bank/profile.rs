use chrono::Utc;
use rust_decimal::Decimal;

use super::auth::{check_full_name, optional_text};
use super::{safe_lock, Bank};
use crate::auth::{Permission, Principal};
use crate::error::{BankError, BankResult};
use crate::logging::{security_event, SecurityEvent};
use crate::user::{Holdings, ProfileUpdate, User};
use crate::validation::{validate_email, validate_password, validate_phone, validate_username};

impl Bank {
    pub fn profile(&self, principal: &Principal) -> BankResult<User> {
        principal.require(Permission::UserReadProfile)?;
        self.users.require(principal.user_id)
    }

    pub fn update_profile(&self, principal: &Principal, update: ProfileUpdate) -> BankResult<User> {
        principal.require(Permission::UserUpdateProfile)?;
        let _guard = safe_lock(&self.user_lock)?;
        let previous = self.users.require(principal.user_id)?;
        let mut user = previous.clone();

        if let Some(username) = update.username {
            let username = username.trim().to_string();
            validate_username(&username)?;
            user.username = username;
        }
        if let Some(email) = update.email {
            let email = email.trim().to_lowercase();
            validate_email(&email)?;
            user.email = email;
        }
        if update.full_name.is_some() {
            user.full_name = optional_text(update.full_name);
            check_full_name(&user.full_name)?;
        }
        if update.phone_number.is_some() {
            user.phone_number = optional_text(update.phone_number);
            if let Some(phone) = &user.phone_number {
                validate_phone(phone)?;
            }
        }
        user.updated_at = Utc::now();

        self.users.save_with_identity(&previous, &user)?;
        tracing::info!(user_id = user.id, "profile updated");
        Ok(user)
    }

    pub fn change_password(&self, principal: &Principal, current: &str, new: &str) -> BankResult<()> {
        principal.require(Permission::UserUpdateProfile)?;
        let user = self.users.require(principal.user_id)?;
        if !self.hasher.verify(current, &user.password_hash)? {
            return Err(BankError::validation("Current password is incorrect"));
        }
        validate_password(new)?;
        if current == new {
            return Err(BankError::validation("New password must differ from the current password"));
        }
        let password_hash = self.hasher.hash(new)?;

        let _guard = safe_lock(&self.user_lock)?;
        let mut user = self.users.require(principal.user_id)?;
        user.password_hash = password_hash;
        user.updated_at = Utc::now();
        self.users.save(&user)?;
        security_event(SecurityEvent::PasswordChanged, Some(user.id), "");
        Ok(())
    }

    /// Delete the caller. Accounts must be empty; their transactions stay
    /// behind as history.
    pub fn delete_user(&self, principal: &Principal, password: &str) -> BankResult<()> {
        let user = self.users.require(principal.user_id)?;
        if !self.hasher.verify(password, &user.password_hash)? {
            return Err(BankError::validation("Password is incorrect"));
        }

        let _users = safe_lock(&self.user_lock)?;
        let _ledger = safe_lock(&self.ledger_lock)?;
        let user = self.users.require(user.id)?;
        let accounts = self.accounts.list_for_user(user.id)?;
        if accounts.iter().any(|a| a.balance != Decimal::ZERO) {
            return Err(BankError::validation(
                "Cannot delete user with remaining account balance",
            ));
        }
        let holdings = Holdings {
            accounts,
            budgets: self.budgets.list_for_user(user.id)?.iter().map(|b| b.id).collect(),
            bills: self.bills.list_for_user(user.id)?.iter().map(|b| b.id).collect(),
        };
        self.users.delete(&user, &holdings)?;

        tracing::info!(
            user_id = user.id,
            accounts = holdings.accounts.len(),
            budgets = holdings.budgets.len(),
            bills = holdings.bills.len(),
            "user deleted"
        );
        security_event(SecurityEvent::UserDeleted, Some(user.id), "");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{bank, funded_account, principal, PASSWORD};
    use super::*;
    use crate::bank::AccountUpdate;

    #[test]
    fn test_update_profile() {
        let bank = bank();
        let alice = principal(&bank, "alice");
        principal(&bank, "bob");

        let updated = bank
            .update_profile(
                &alice,
                ProfileUpdate {
                    email: Some("New@Example.com".to_string()),
                    full_name: Some("Alice A".to_string()),
                    phone_number: Some("+15551234567".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.email, "new@example.com");
        assert_eq!(updated.full_name.as_deref(), Some("Alice A"));
        assert_eq!(bank.users.find_by_email("new@example.com").unwrap().unwrap().id, alice.user_id);
        assert!(bank.users.find_by_email("alice@example.com").unwrap().is_none());

        let taken = ProfileUpdate {
            username: Some("bob".to_string()),
            ..Default::default()
        };
        assert!(matches!(bank.update_profile(&alice, taken), Err(BankError::Conflict(_))));

        let bad_phone = ProfileUpdate {
            phone_number: Some("phone".to_string()),
            ..Default::default()
        };
        assert!(matches!(bank.update_profile(&alice, bad_phone), Err(BankError::Validation(_))));
        assert_eq!(bank.profile(&alice).unwrap().username, "alice");
    }

    #[test]
    fn test_change_password() {
        let bank = bank();
        let alice = principal(&bank, "alice");

        assert!(bank.change_password(&alice, "Wrong#1234", "Fresh#4567").is_err());
        assert!(bank.change_password(&alice, PASSWORD, "weak").is_err());
        bank.change_password(&alice, PASSWORD, "Fresh#4567").unwrap();

        assert!(matches!(bank.login("alice", PASSWORD), Err(BankError::InvalidCredentials)));
        bank.login("alice", "Fresh#4567").unwrap();
    }

    #[test]
    fn test_delete_requires_empty_accounts() {
        let bank = bank();
        let alice = principal(&bank, "alice");
        let account = funded_account(&bank, &alice, 50);

        assert!(bank.delete_user(&alice, "Wrong#1234").is_err());
        let err = bank.delete_user(&alice, PASSWORD).unwrap_err();
        assert_eq!(err.to_string(), "Cannot delete user with remaining account balance");

        bank.create_transaction(
            &alice,
            crate::ledger::NewTransaction {
                account_id: account.id,
                transaction_type: "withdrawal".to_string(),
                amount: Decimal::from(50),
                description: None,
                destination_account_id: None,
                category_id: None,
            },
        )
        .unwrap();
        bank.update_account(&alice, account.id, AccountUpdate { is_active: Some(false) })
            .unwrap();
        bank.delete_user(&alice, PASSWORD).unwrap();

        assert!(bank.users.get(alice.user_id).unwrap().is_none());
        assert!(bank.accounts.get(account.id).unwrap().is_none());
        // history survives
        assert_eq!(bank.ledger.ids_for_account(account.id).unwrap().len(), 2);
        assert!(matches!(bank.login("alice", PASSWORD), Err(BankError::InvalidCredentials)));
    }

    #[test]
    fn test_delete_is_final_under_concurrent_profile_updates() {
        for _ in 0..20 {
            let bank = bank();
            let alice = principal(&bank, "alice");
            let tokens = bank.login("alice", PASSWORD).unwrap();
            let (shared, who) = (&bank, &alice);

            std::thread::scope(|scope| {
                let updater = scope.spawn(move || {
                    let mut n = 0;
                    loop {
                        let update = ProfileUpdate {
                            full_name: Some(format!("Alice {}", n)),
                            ..Default::default()
                        };
                        match shared.update_profile(who, update) {
                            Ok(_) => n += 1,
                            Err(BankError::NotFound("User")) => break,
                            Err(e) => panic!("unexpected error: {}", e),
                        }
                    }
                });
                shared.delete_user(who, PASSWORD).unwrap();
                updater.join().unwrap();
            });

            assert!(bank.users.get(alice.user_id).unwrap().is_none());
            assert!(matches!(
                bank.authenticate(&tokens.access_token),
                Err(BankError::Unauthorized(_))
            ));
            assert!(matches!(bank.login("alice", PASSWORD), Err(BankError::InvalidCredentials)));
        }
    }

    #[test]
    fn test_delete_leaves_nothing_behind_concurrent_creates() {
        for _ in 0..20 {
            let bank = bank();
            let alice = principal(&bank, "alice");
            let (shared, who) = (&bank, &alice);

            std::thread::scope(|scope| {
                let creator = scope.spawn(move || loop {
                    let opened = shared.open_account(who, None);
                    let budgeted = shared.create_budget(
                        who,
                        crate::budget::NewBudget {
                            name: "Rent".to_string(),
                            amount: Decimal::from(900),
                            start_date: "2024-01-01".to_string(),
                            end_date: "2024-01-31".to_string(),
                        },
                    );
                    match (opened, budgeted) {
                        (Ok(_), Ok(_)) => {}
                        (Err(BankError::NotFound("User")), _) | (_, Err(BankError::NotFound("User"))) => break,
                        (Err(e), _) | (_, Err(e)) => panic!("unexpected error: {}", e),
                    }
                });
                shared.delete_user(who, PASSWORD).unwrap();
                creator.join().unwrap();
            });

            assert!(bank.accounts.list_for_user(alice.user_id).unwrap().is_empty());
            assert!(bank.budgets.list_for_user(alice.user_id).unwrap().is_empty());
        }
    }
}
