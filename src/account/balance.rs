//! Balance arithmetic on account records

use rust_decimal::Decimal;

use super::types::Account;

#[derive(Debug, Clone, PartialEq)]
pub enum BalanceError {
    InsufficientFunds,
    InvalidAmount,
    Overflow,
}

/// Credit (add) to an account, returning the new balance.
pub fn credit(account: &mut Account, amount: Decimal) -> Result<Decimal, BalanceError> {
    if amount <= Decimal::ZERO {
        return Err(BalanceError::InvalidAmount);
    }
    let new_balance = account
        .balance
        .checked_add(amount)
        .ok_or(BalanceError::Overflow)?;
    account.balance = new_balance;
    Ok(new_balance)
}

/// Debit (subtract) from an account, returning the new balance.
pub fn debit(account: &mut Account, amount: Decimal) -> Result<Decimal, BalanceError> {
    if amount <= Decimal::ZERO {
        return Err(BalanceError::InvalidAmount);
    }
    if account.balance < amount {
        return Err(BalanceError::InsufficientFunds);
    }
    account.balance -= amount;
    Ok(account.balance)
}

/// Move funds between two accounts. Either both balances change or neither does.
pub fn transfer(from: &mut Account, to: &mut Account, amount: Decimal) -> Result<(), BalanceError> {
    debit(from, amount)?;

    if let Err(e) = credit(to, amount) {
        // Rollback on error
        from.balance += amount;
        return Err(e);
    }

    Ok(())
}
