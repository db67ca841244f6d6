use chrono::Utc;

use super::Bank;
use crate::auth::Principal;
use crate::budget::{Budget, BudgetId, BudgetUpdate, NewBudget};
use crate::error::{BankError, BankResult};
use crate::validation::{parse_date, required_text, validate_amount};

const MAX_NAME_LEN: usize = 100;

impl Bank {
    pub fn create_budget(&self, principal: &Principal, new: NewBudget) -> BankResult<Budget> {
        let name = required_text(&new.name, "Budget name", MAX_NAME_LEN)?;
        let amount = validate_amount(new.amount, self.limits.max_transaction_amount, "Budget")?;
        let _owner = self.lock_owner(principal)?;
        let now = Utc::now();
        let budget = Budget {
            id: self.budgets.next_id()?,
            user_id: principal.user_id,
            name,
            amount,
            start_date: parse_date(&new.start_date)?,
            end_date: parse_date(&new.end_date)?,
            created_at: now,
            updated_at: now,
        };
        budget.check_period()?;
        self.budgets.save(&budget)?;
        tracing::info!(user_id = principal.user_id, budget_id = budget.id, "budget created");
        Ok(budget)
    }

    pub fn list_budgets(&self, principal: &Principal) -> BankResult<Vec<Budget>> {
        self.budgets.list_for_user(principal.user_id)
    }

    pub fn update_budget(&self, principal: &Principal, id: BudgetId, update: BudgetUpdate) -> BankResult<Budget> {
        let _owner = self.lock_owner(principal)?;
        let mut budget = self.budgets.get(id)?.ok_or(BankError::NotFound("Budget"))?;
        if budget.user_id != principal.user_id {
            return Err(BankError::forbidden("Unauthorized access to budget"));
        }
        if let Some(name) = update.name {
            budget.name = required_text(&name, "Budget name", MAX_NAME_LEN)?;
        }
        if let Some(amount) = update.amount {
            budget.amount = validate_amount(amount, self.limits.max_transaction_amount, "Budget")?;
        }
        if let Some(start) = update.start_date {
            budget.start_date = parse_date(&start)?;
        }
        if let Some(end) = update.end_date {
            budget.end_date = parse_date(&end)?;
        }
        budget.check_period()?;
        budget.updated_at = Utc::now();
        self.budgets.save(&budget)?;
        Ok(budget)
    }
}
