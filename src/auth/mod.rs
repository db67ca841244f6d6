//! Authentication and authorization
//!
//! - Argon2id password hashing
//! - HS256 bearer tokens (access + refresh)
//! - Role based permissions
//! - Failed-login lockout

pub mod lockout;
pub mod password;
pub mod permissions;
pub mod token;

pub use lockout::LockoutPolicy;
pub use password::PasswordHasher;
pub use permissions::{Permission, Role};
pub use token::{Claims, TokenIssuer, TokenKind};

/// The authenticated caller of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub user_id: u64,
    pub role: Role,
}

impl Principal {
    pub fn can(&self, permission: Permission) -> bool {
        self.role.allows(permission)
    }

    pub fn require(&self, permission: Permission) -> crate::error::BankResult<()> {
        if self.can(permission) {
            Ok(())
        } else {
            tracing::warn!(user_id = self.user_id, role = ?self.role, permission = permission.as_str(), "permission denied");
            Err(crate::error::BankError::forbidden("Insufficient permissions"))
        }
    }
}
