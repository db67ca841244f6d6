use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Permission {
    UserReadProfile,
    UserUpdateProfile,
    AccountList,
    AccountCreate,
    AccountRead,
    AccountUpdate,
    AccountDelete,
    TransactionList,
    TransactionCreate,
    TransactionRead,
    CategoryManage,
}

const USER_PERMISSIONS: &[Permission] = &[
    Permission::UserReadProfile,
    Permission::UserUpdateProfile,
    Permission::AccountList,
    Permission::AccountCreate,
    Permission::AccountRead,
    Permission::AccountUpdate,
    Permission::TransactionList,
    Permission::TransactionCreate,
    Permission::TransactionRead,
];

const ADMIN_PERMISSIONS: &[Permission] = &[
    Permission::UserReadProfile,
    Permission::UserUpdateProfile,
    Permission::AccountList,
    Permission::AccountCreate,
    Permission::AccountRead,
    Permission::AccountUpdate,
    Permission::AccountDelete,
    Permission::TransactionList,
    Permission::TransactionCreate,
    Permission::TransactionRead,
    Permission::CategoryManage,
];

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::UserReadProfile => "user:read_profile",
            Permission::UserUpdateProfile => "user:update_profile",
            Permission::AccountList => "account:list",
            Permission::AccountCreate => "account:create",
            Permission::AccountRead => "account:read",
            Permission::AccountUpdate => "account:update",
            Permission::AccountDelete => "account:delete",
            Permission::TransactionList => "transaction:list",
            Permission::TransactionCreate => "transaction:create",
            Permission::TransactionRead => "transaction:read",
            Permission::CategoryManage => "category:manage",
        }
    }
}

impl Role {
    pub fn permissions(&self) -> &'static [Permission] {
        match self {
            Role::User => USER_PERMISSIONS,
            Role::Admin => ADMIN_PERMISSIONS,
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_cannot_delete_accounts() {
        assert!(Role::User.allows(Permission::AccountCreate));
        assert!(!Role::User.allows(Permission::AccountDelete));
        assert!(!Role::User.allows(Permission::CategoryManage));
    }

    #[test]
    fn test_admin_has_everything_users_have() {
        for p in Role::User.permissions() {
            assert!(Role::Admin.allows(*p), "admin missing {}", p.as_str());
        }
        assert!(Role::Admin.allows(Permission::AccountDelete));
    }

    #[test]
    fn test_role_serde() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        let role: Role = serde_json::from_str("\"user\"").unwrap();
        assert_eq!(role, Role::User);
    }
}
