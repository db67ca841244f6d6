use super::Bank;
use crate::auth::{Permission, Principal};
use crate::category::Category;
use crate::error::BankResult;

impl Bank {
    pub fn list_categories(&self) -> BankResult<Vec<Category>> {
        self.categories.list()
    }

    pub fn create_category(&self, principal: &Principal, name: &str) -> BankResult<Category> {
        principal.require(Permission::CategoryManage)?;
        let category = self.categories.create(name)?;
        tracing::info!(category_id = category.id, name = %category.name, "category created");
        Ok(category)
    }
}
