use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{safe_lock, Bank};
use crate::auth::{Claims, Principal, Role, TokenKind};
use crate::error::{BankError, BankResult};
use crate::logging::{security_event, SecurityEvent};
use crate::user::{NewUser, User, UserId};
use crate::validation::{validate_email, validate_password, validate_phone, validate_username};

const MAX_FULL_NAME_LEN: usize = 100;

#[derive(Serialize, Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub user_id: UserId,
}

#[derive(Serialize, Debug, Clone)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

pub(super) fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub(super) fn check_full_name(full_name: &Option<String>) -> BankResult<()> {
    match full_name {
        Some(name) if name.chars().count() > MAX_FULL_NAME_LEN => Err(BankError::validation(format!(
            "Full name must be at most {} characters",
            MAX_FULL_NAME_LEN
        ))),
        _ => Ok(()),
    }
}

impl Bank {
    pub fn register(&self, new: NewUser) -> BankResult<User> {
        let username = new.username.trim().to_string();
        let email = new.email.trim().to_lowercase();
        validate_username(&username)?;
        validate_email(&email)?;
        validate_password(&new.password)?;
        let phone_number = optional_text(new.phone_number);
        if let Some(phone) = &phone_number {
            validate_phone(phone)?;
        }
        let full_name = optional_text(new.full_name);
        check_full_name(&full_name)?;

        let now = Utc::now();
        let user = User {
            id: self.storage.next_id()?,
            username,
            email,
            password_hash: self.hasher.hash(&new.password)?,
            full_name,
            phone_number,
            role: Role::User,
            is_active: true,
            login: Default::default(),
            created_at: now,
            updated_at: now,
        };
        self.users.insert(&user)?;
        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(user)
    }

    /// Register a user and give them the admin role.
    pub fn create_admin(&self, new: NewUser) -> BankResult<User> {
        let mut user = self.register(new)?;
        let _guard = safe_lock(&self.user_lock)?;
        user.role = Role::Admin;
        user.updated_at = Utc::now();
        self.users.save(&user)?;
        tracing::info!(user_id = user.id, "admin created");
        Ok(user)
    }

    pub fn login(&self, username: &str, password: &str) -> BankResult<TokenPair> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(BankError::validation("Missing username or password"));
        }
        let now = Utc::now();
        let user = match self.users.find_by_username(username.trim())? {
            Some(user) => user,
            None => {
                self.hasher.verify_decoy(password);
                security_event(SecurityEvent::LoginFailed, None, "unknown username");
                return Err(BankError::InvalidCredentials);
            }
        };

        // A locked user is refused before the password is even looked at.
        let mut state = user.login.clone();
        if let Err(e) = self.lockout.check(&mut state, now) {
            security_event(SecurityEvent::AccountLocked, Some(user.id), "login attempt while locked");
            return Err(e);
        }

        let verified = self.hasher.verify(password, &user.password_hash)?;

        // Re-read under the lock so concurrent attempts all count.
        let guard = safe_lock(&self.user_lock)?;
        let mut user = self.users.get(user.id)?.ok_or(BankError::InvalidCredentials)?;
        self.lockout.check(&mut user.login, now)?;

        if !verified {
            let locked = self.lockout.record_failure(&mut user.login, now);
            self.users.save(&user)?;
            if locked {
                security_event(SecurityEvent::AccountLocked, Some(user.id), "too many failed attempts");
            } else {
                security_event(SecurityEvent::LoginFailed, Some(user.id), "wrong password");
            }
            return Err(BankError::InvalidCredentials);
        }
        if !user.is_active {
            return Err(BankError::forbidden("User account is inactive"));
        }
        if user.login != Default::default() {
            self.lockout.record_success(&mut user.login);
            self.users.save(&user)?;
        }
        drop(guard);

        let access = self.tokens.issue(user.id, user.role, TokenKind::Access, now)?;
        let refresh = self.tokens.issue(user.id, user.role, TokenKind::Refresh, now)?;
        security_event(SecurityEvent::LoginSucceeded, Some(user.id), "");
        Ok(TokenPair {
            access_token: access.token,
            refresh_token: refresh.token,
            token_type: "Bearer",
            expires_in: self.tokens.access_ttl_secs(),
            user_id: user.id,
        })
    }

    /// Swap a refresh token for a new access token.
    pub fn refresh(&self, refresh_token: &str) -> BankResult<AccessToken> {
        let now = Utc::now();
        let claims = self.tokens.decode(refresh_token, TokenKind::Refresh, now)?;
        self.ensure_not_revoked(&claims)?;
        let user = self.active_user(claims.sub)?;
        let access = self.tokens.issue(user.id, user.role, TokenKind::Access, now)?;
        tracing::debug!(user_id = user.id, "access token refreshed");
        Ok(AccessToken {
            access_token: access.token,
            token_type: "Bearer",
            expires_in: self.tokens.access_ttl_secs(),
        })
    }

    /// Revoke an access token and, optionally, the refresh token issued with it.
    pub fn logout(&self, access_token: &str, refresh_token: Option<&str>) -> BankResult<()> {
        let now = Utc::now();
        let access = self.tokens.decode(access_token, TokenKind::Access, now)?;
        self.ensure_not_revoked(&access)?;
        let refresh = match refresh_token {
            Some(token) => {
                let claims = self.tokens.decode(token, TokenKind::Refresh, now)?;
                if claims.sub != access.sub {
                    return Err(BankError::Unauthorized("Invalid or expired token".to_string()));
                }
                Some(claims)
            }
            None => None,
        };

        self.revoke(&access)?;
        if let Some(claims) = &refresh {
            self.revoke(claims)?;
        }
        self.purge_revoked(now)?;
        security_event(SecurityEvent::TokenRevoked, Some(access.sub), "logout");
        Ok(())
    }

    /// Resolve an access token to the caller. The role is read from the
    /// stored user, so a promotion applies without a new login.
    pub fn authenticate(&self, access_token: &str) -> BankResult<Principal> {
        let claims = self.tokens.decode(access_token, TokenKind::Access, Utc::now())?;
        self.ensure_not_revoked(&claims)?;
        let user = self.active_user(claims.sub)?;
        Ok(Principal {
            user_id: user.id,
            role: user.role,
        })
    }

    fn active_user(&self, id: UserId) -> BankResult<User> {
        match self.users.get(id)? {
            Some(user) if user.is_active => Ok(user),
            _ => Err(BankError::Unauthorized("User not found or inactive".to_string())),
        }
    }

    fn ensure_not_revoked(&self, claims: &Claims) -> BankResult<()> {
        if self.storage.revoked_tokens.contains_key(claims.jti.as_bytes())? {
            return Err(BankError::Unauthorized("Token has been revoked".to_string()));
        }
        Ok(())
    }

    fn revoke(&self, claims: &Claims) -> BankResult<()> {
        self.storage
            .revoked_tokens
            .insert(claims.jti.as_bytes(), &claims.exp.to_be_bytes()[..])?;
        Ok(())
    }

    /// Drop revocations whose token has expired anyway.
    fn purge_revoked(&self, now: DateTime<Utc>) -> BankResult<usize> {
        let mut purged = 0;
        for entry in self.storage.revoked_tokens.iter() {
            let (jti, exp) = entry?;
            let exp = <[u8; 8]>::try_from(exp.as_ref())
                .map(i64::from_be_bytes)
                .map_err(|_| BankError::Database(format!("corrupt revocation expiry of {} bytes", exp.len())))?;
            if exp < now.timestamp() {
                self.storage.revoked_tokens.remove(jti)?;
                purged += 1;
            }
        }
        if purged > 0 {
            tracing::debug!(purged, "expired revocations removed");
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{bank, new_user, PASSWORD};
    use super::*;
    use crate::auth::TokenIssuer;
    use crate::config::BankConfig;

    #[test]
    fn test_register_normalizes_and_rejects_duplicates() {
        let bank = bank();
        let mut new = new_user("alice");
        new.email = " Alice@Example.COM ".to_string();
        new.phone_number = Some("  ".to_string());
        let user = bank.register(new).unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert!(user.phone_number.is_none());
        assert_ne!(user.password_hash, PASSWORD);

        let err = bank.register(new_user("ALICE")).unwrap_err();
        assert!(matches!(err, BankError::Conflict(_)));
    }

    #[test]
    fn test_register_validates() {
        let bank = bank();
        let mut weak = new_user("bob");
        weak.password = "password".to_string();
        assert!(matches!(bank.register(weak), Err(BankError::Validation(_))));

        let mut bad_phone = new_user("carol");
        bad_phone.phone_number = Some("12ab".to_string());
        assert!(matches!(bank.register(bad_phone), Err(BankError::Validation(_))));
    }

    #[test]
    fn test_login_and_authenticate() {
        let bank = bank();
        let user = bank.register(new_user("alice")).unwrap();
        let pair = bank.login("alice", PASSWORD).unwrap();
        assert_eq!(pair.token_type, "Bearer");
        assert_eq!(pair.user_id, user.id);

        let principal = bank.authenticate(&pair.access_token).unwrap();
        assert_eq!(principal.user_id, user.id);
        assert_eq!(principal.role, Role::User);

        // refresh tokens are not access tokens
        assert!(matches!(bank.authenticate(&pair.refresh_token), Err(BankError::Unauthorized(_))));
    }

    #[test]
    fn test_bad_credentials() {
        let bank = bank();
        bank.register(new_user("alice")).unwrap();
        assert!(matches!(bank.login("alice", "Wrong#1234"), Err(BankError::InvalidCredentials)));
        assert!(matches!(bank.login("nobody", PASSWORD), Err(BankError::InvalidCredentials)));
        assert!(matches!(bank.login("", PASSWORD), Err(BankError::Validation(_))));
    }

    #[test]
    fn test_lockout_after_repeated_failures() {
        let bank = bank();
        bank.register(new_user("alice")).unwrap();
        for _ in 0..5 {
            assert!(matches!(bank.login("alice", "Wrong#1234"), Err(BankError::InvalidCredentials)));
        }
        // right password, still locked
        match bank.login("alice", PASSWORD) {
            Err(BankError::Locked { minutes }) => assert!(minutes >= 14 && minutes <= 15),
            other => panic!("expected lockout, got {:?}", other.map(|p| p.user_id)),
        }
    }

    #[test]
    fn test_success_resets_failures() {
        let bank = bank();
        bank.register(new_user("alice")).unwrap();
        for _ in 0..4 {
            let _ = bank.login("alice", "Wrong#1234");
        }
        bank.login("alice", PASSWORD).unwrap();
        for _ in 0..4 {
            let _ = bank.login("alice", "Wrong#1234");
        }
        assert!(bank.login("alice", PASSWORD).is_ok());
    }

    #[test]
    fn test_inactive_user_is_forbidden() {
        let bank = bank();
        let mut user = bank.register(new_user("alice")).unwrap();
        user.is_active = false;
        bank.users.save(&user).unwrap();
        assert!(matches!(bank.login("alice", PASSWORD), Err(BankError::Forbidden(_))));
    }

    #[test]
    fn test_refresh_and_logout() {
        let bank = bank();
        bank.register(new_user("alice")).unwrap();
        let pair = bank.login("alice", PASSWORD).unwrap();

        let fresh = bank.refresh(&pair.refresh_token).unwrap();
        bank.authenticate(&fresh.access_token).unwrap();
        assert!(bank.refresh(&pair.access_token).is_err());

        bank.logout(&pair.access_token, Some(&pair.refresh_token)).unwrap();
        assert!(matches!(bank.authenticate(&pair.access_token), Err(BankError::Unauthorized(_))));
        assert!(matches!(bank.refresh(&pair.refresh_token), Err(BankError::Unauthorized(_))));
        // the separately refreshed token is still good
        bank.authenticate(&fresh.access_token).unwrap();
    }

    #[test]
    fn test_tokens_from_other_secret_rejected() {
        let bank = bank();
        let user = bank.register(new_user("alice")).unwrap();
        let config = BankConfig::for_tests();
        let other = TokenIssuer::new(b"some-other-secret-of-decent-length", config.auth.access_token_ttl_secs, 60);
        let forged = other.issue(user.id, Role::Admin, TokenKind::Access, Utc::now()).unwrap();
        assert!(bank.authenticate(&forged.token).is_err());
    }

    #[test]
    fn test_create_admin() {
        let bank = bank();
        let admin = bank.create_admin(new_user("root")).unwrap();
        assert!(admin.is_admin());
        let pair = bank.login("root", PASSWORD).unwrap();
        assert_eq!(bank.authenticate(&pair.access_token).unwrap().role, Role::Admin);
    }

    #[test]
    fn test_purge_drops_expired_revocations() {
        let bank = bank();
        bank.storage.revoked_tokens.insert("old", &0i64.to_be_bytes()[..]).unwrap();
        bank.storage
            .revoked_tokens
            .insert("live", &i64::MAX.to_be_bytes()[..])
            .unwrap();
        assert_eq!(bank.purge_revoked(Utc::now()).unwrap(), 1);
        assert!(bank.storage.revoked_tokens.contains_key("live").unwrap());
    }

    #[test]
    fn test_purge_refuses_corrupt_expiry() {
        let bank = bank();
        bank.storage.revoked_tokens.insert("bad", &b"xyz"[..]).unwrap();
        assert!(matches!(bank.purge_revoked(Utc::now()), Err(BankError::Database(_))));
        assert!(bank.storage.revoked_tokens.contains_key("bad").unwrap());
    }
}
